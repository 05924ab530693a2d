//! Bidirectional mapping between kernel watch descriptors and the
//! directories they watch.
//!
//! Owned entirely by the event-source thread; no lock is required (spec
//! single thread at a time.

use std::collections::HashMap;
use std::path::PathBuf;

use inotify::WatchDescriptor;

#[derive(Default)]
pub struct WatchTable {
    by_id: HashMap<WatchDescriptor, PathBuf>,
    by_path: HashMap<PathBuf, WatchDescriptor>,
}

impl WatchTable {
    pub fn new() -> Self {
        WatchTable::default()
    }

    /// Inserts an entry, keeping both directions coherent. Any prior entry
    /// under either key is dropped first.
    pub fn insert(&mut self, id: WatchDescriptor, path: PathBuf) {
        if let Some(old_path) = self.by_id.remove(&id) {
            self.by_path.remove(&old_path);
        }
        if let Some(old_id) = self.by_path.remove(&path) {
            self.by_id.remove(&old_id);
        }

        self.by_id.insert(id.clone(), path.clone());
        self.by_path.insert(path, id);
    }

    pub fn remove_by_path(&mut self, path: &PathBuf) -> Option<WatchDescriptor> {
        let id = self.by_path.remove(path)?;
        self.by_id.remove(&id);
        Some(id)
    }

    #[allow(dead_code)]
    pub fn remove_by_id(&mut self, id: &WatchDescriptor) -> Option<PathBuf> {
        let path = self.by_id.remove(id)?;
        self.by_path.remove(&path);
        Some(path)
    }

    pub fn lookup_path(&self, id: &WatchDescriptor) -> Option<&PathBuf> {
        self.by_id.get(id)
    }

    pub fn lookup_id(&self, path: &PathBuf) -> Option<&WatchDescriptor> {
        self.by_path.get(path)
    }

    pub fn contains_path(&self, path: &PathBuf) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn size(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_path.clear();
    }

    /// Snapshot of every watched path, for teardown.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.by_path.keys().cloned().collect()
    }
}
