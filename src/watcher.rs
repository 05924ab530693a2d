//! Public façade over the watch core: the event source running on its own
//! thread, reporting through a shared [`EventQueue`], with a captured-once
//! error slot and a cooperative shutdown flag.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use inotify::WatchMask;

use crate::config::WatcherConfig;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::event_queue::EventQueue;
use crate::event_source::EventSource;
use crate::logger::Logger;

fn ensure_trailing_separator(path: &mut PathBuf) {
    if !path.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR) {
        path.push("");
    }
}

pub struct Watcher {
    root: PathBuf,
    max_depth: i32,
    event_mask: WatchMask,
    queue: Arc<EventQueue>,
    logger: Arc<dyn Logger>,
    shutdown: Arc<AtomicBool>,
    captured_error: Arc<Mutex<Option<Error>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Watcher {
    pub fn new(config: WatcherConfig, logger: Arc<dyn Logger>) -> Result<Self> {
        if config.root.is_empty() {
            return Err(Error::Build("root must not be empty".into()));
        }
        if config.max_depth < -1 {
            return Err(Error::Build("max_depth must be -1 or greater".into()));
        }

        let mut root = PathBuf::from(&config.root);
        ensure_trailing_separator(&mut root);

        Ok(Watcher {
            root,
            max_depth: config.max_depth,
            event_mask: config.event_mask,
            queue: Arc::new(EventQueue::new(config.queue_capacity)),
            logger,
            shutdown: Arc::new(AtomicBool::new(false)),
            captured_error: Arc::new(Mutex::new(None)),
            handle: Mutex::new(None),
        })
    }

    /// Opens the kernel handle, watches `root`, and starts the watch thread.
    /// The initial watch is established on the calling thread so a bad root
    /// path is reported synchronously rather than through `take_error`.
    pub fn watch(&self) -> Result<()> {
        let mut source = EventSource::initialize(
            &self.root,
            self.max_depth,
            self.event_mask,
            self.queue.clone(),
            self.logger.clone(),
            self.shutdown.clone(),
            self.captured_error.clone(),
        )?;

        let handle = thread::Builder::new()
            .name("filewatchd-watch".into())
            .spawn(move || {
                let _ = source.run();
            })
            .map_err(Error::ResourceInit)?;

        *self.handle.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Signals shutdown and wakes any blocked producer/consumer. Safe to
    /// call from any thread, any number of times.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.queue.stop();
    }

    /// Blocks until the watch thread has exited. A no-op if `watch` was
    /// never called or the thread already finished.
    pub fn join(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Blocks for the next logical event. Returns `Event::none()` once the
    /// watcher has stopped and the queue is drained.
    pub fn next_event(&self) -> Event {
        self.queue.dequeue_blocking()
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
    }

    /// Takes the captured error, if any, leaving `None` behind. A second
    /// call after the first returns `None` even if the underlying failure
    /// is still in effect (spec's captured-error-once semantics).
    pub fn take_error(&self) -> Option<Error> {
        self.captured_error.lock().unwrap().take()
    }
}
