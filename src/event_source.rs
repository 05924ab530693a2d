//! Owns the kernel notification handle, the Creation Set, and the raw-event
//! classification algorithm that turns inotify bits into logical events.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use inotify::{EventMask, EventOwned, Inotify, WatchMask};

use crate::error::{Error, Result};
use crate::event::Event;
use crate::event_queue::EventQueue;
use crate::logger::Logger;
use crate::watch_table::WatchTable;

/// Sized generously so a single `read_events_blocking` call drains many
/// events per syscall rather than trickling one at a time.
const EVENT_BUFFER_BYTES: usize = 16 * 1024;

pub struct EventSource {
    inotify: Inotify,
    table: WatchTable,
    creating: HashSet<PathBuf>,
    max_depth_bound: Option<i32>,
    event_mask: WatchMask,
    queue: Arc<EventQueue>,
    logger: Arc<dyn Logger>,
    shutdown: Arc<AtomicBool>,
    captured_error: Arc<Mutex<Option<Error>>>,
}

fn separator_count(path: &Path) -> i32 {
    path.to_string_lossy()
        .chars()
        .filter(|&c| c == MAIN_SEPARATOR)
        .count() as i32
}

fn ensure_trailing_separator(path: &mut PathBuf) {
    if !path.to_string_lossy().ends_with(MAIN_SEPARATOR) {
        path.push("");
    }
}

impl EventSource {
    /// Opens the kernel handle and watches `root`.
    pub fn initialize(
        root: &Path,
        max_depth: i32,
        event_mask: WatchMask,
        queue: Arc<EventQueue>,
        logger: Arc<dyn Logger>,
        shutdown: Arc<AtomicBool>,
        captured_error: Arc<Mutex<Option<Error>>>,
    ) -> Result<Self> {
        let inotify = Inotify::init().map_err(Error::ResourceInit)?;

        let max_depth_bound = if max_depth < 0 {
            None
        } else {
            Some(separator_count(root) + max_depth)
        };

        let mut source = EventSource {
            inotify,
            table: WatchTable::new(),
            creating: HashSet::new(),
            max_depth_bound,
            event_mask,
            queue,
            logger,
            shutdown,
            captured_error,
        };

        source.add_watch(root.to_path_buf())?;
        Ok(source)
    }

    fn is_watchable(&self, path: &Path) -> bool {
        match self.max_depth_bound {
            None => true,
            Some(bound) => separator_count(path) <= bound,
        }
    }

    /// Silent no-op beyond `max_depth`.
    pub fn add_watch(&mut self, path: PathBuf) -> Result<()> {
        if !self.is_watchable(&path) {
            return Ok(());
        }

        let wd = self
            .inotify
            .watches()
            .add(&path, self.event_mask)
            .map_err(|source| Error::WatchAdd {
                path: path.to_string_lossy().into_owned(),
                source,
            })?;

        self.logger.info(&format!("watching {}", path.display()));
        self.table.insert(wd, path);
        Ok(())
    }

    pub fn remove_watch(&mut self, path: PathBuf) -> Result<()> {
        let wd = match self.table.remove_by_path(&path) {
            Some(wd) => wd,
            None => {
                self.logger
                    .info(&format!("watch for {} already gone", path.display()));
                return Ok(());
            }
        };

        match self.inotify.watches().remove(wd) {
            Ok(()) => {}
            // The kernel auto-removed this watch (directory gone, etc) before
            // we got to it; a benign race, not an error.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => {}
            Err(err) => {
                return Err(Error::WatchRemove {
                    path: path.to_string_lossy().into_owned(),
                    source: err,
                })
            }
        }

        if self.table.is_empty() {
            self.trigger_stop();
        }

        Ok(())
    }

    /// Detaches every remaining watch and clears both tables. Idempotent.
    pub fn destroy(&mut self) {
        for path in self.table.paths() {
            if let Some(wd) = self.table.remove_by_path(&path) {
                let _ = self.inotify.watches().remove(wd);
            }
        }
        self.table.clear();
        self.creating.clear();
    }

    fn trigger_stop(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.queue.stop();
    }

    /// Classifies one raw kernel event, mutating the watch set as a side
    /// effect when the classification calls for it.
    fn classify(&mut self, raw: EventOwned) -> Result<Option<Event>> {
        if raw.mask.contains(EventMask::IGNORED) {
            return Ok(None);
        }

        let base = match self.table.lookup_path(&raw.wd).cloned() {
            Some(p) => p,
            None => return Ok(None), // stale descriptor; kernel beat us to it
        };

        let child = raw.name.as_ref().map(|name| {
            let mut p = base.clone();
            p.push(name);
            p
        });

        if raw.mask.contains(EventMask::ISDIR) {
            return self.classify_dir(raw.mask, &base, child);
        }

        self.classify_file(raw.mask, child)
    }

    fn classify_dir(
        &mut self,
        mask: EventMask,
        base: &Path,
        child: Option<PathBuf>,
    ) -> Result<Option<Event>> {
        let is_create = mask.contains(EventMask::CREATE) || mask.contains(EventMask::MOVED_TO);
        let is_remove = mask.contains(EventMask::MOVED_FROM)
            || mask.contains(EventMask::DELETE)
            || mask.contains(EventMask::DELETE_SELF);

        if is_create {
            let mut path = child.ok_or_else(|| {
                Error::Protocol("directory create event arrived without a name".into())
            })?;
            ensure_trailing_separator(&mut path);
            let payload = path.to_string_lossy().into_owned();

            // Emit first, then subscribe, so a consumer sees the directory
            // appear before any `added` event for a file inside it.
            self.queue.enqueue(Event::dir_added(payload));
            self.add_watch(path)?;
            return Ok(None);
        }

        if is_remove {
            let mut path = child.unwrap_or_else(|| base.to_path_buf());
            ensure_trailing_separator(&mut path);
            let payload = path.to_string_lossy().into_owned();

            self.queue.enqueue(Event::dir_removed(payload));
            self.remove_watch(path)?;
            return Ok(None);
        }

        Ok(None)
    }

    fn classify_file(&mut self, mask: EventMask, child: Option<PathBuf>) -> Result<Option<Event>> {
        let path = match child {
            Some(p) => p,
            None => return Ok(None),
        };
        let payload = path.to_string_lossy().into_owned();

        if mask.contains(EventMask::CREATE) {
            self.creating.insert(path);
            return Ok(None);
        }

        if mask.contains(EventMask::CLOSE_WRITE) {
            return Ok(Some(if self.creating.remove(&path) {
                Event::added(payload)
            } else {
                Event::changed(payload)
            }));
        }

        if mask.contains(EventMask::MOVED_TO) {
            // A moved-in file is atomically complete regardless of whether
            // we ever saw a `create` for it.
            self.creating.remove(&path);
            return Ok(Some(Event::added(payload)));
        }

        if mask.contains(EventMask::MODIFY) {
            return Ok(if self.creating.contains(&path) {
                None
            } else {
                Some(Event::changed(payload))
            });
        }

        if mask.contains(EventMask::DELETE) {
            self.creating.remove(&path);
            return Ok(Some(Event::removed(payload)));
        }

        Ok(None)
    }

    /// The watch loop. Runs until shutdown is observed or a fatal read
    /// error occurs; always tears down on the way out.
    pub fn run(&mut self) -> Result<()> {
        let outcome = self.run_inner();

        if let Err(ref err) = outcome {
            self.queue.enqueue(Event::error(err.to_string()));
        }

        if !self.shutdown.load(Ordering::Acquire) {
            self.trigger_stop();
        }

        self.destroy();

        if let Err(err) = outcome {
            *self.captured_error.lock().unwrap() = Some(err);
            return Err(Error::Protocol(
                "event source terminated; see captured error".into(),
            ));
        }

        Ok(())
    }

    fn run_inner(&mut self) -> Result<()> {
        let mut buffer = vec![0u8; EVENT_BUFFER_BYTES];

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return Ok(());
            }

            let events = match self.inotify.read_events_blocking(&mut buffer) {
                Ok(events) => events,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Read(err)),
            };

            let owned: Vec<EventOwned> = events.map(|e| e.into_owned()).collect();
            for raw in owned {
                if let Some(event) = self.classify(raw)? {
                    self.queue.enqueue(event);
                }
            }
        }
    }
}
