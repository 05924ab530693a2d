//! The logical event taxonomy that is the boundary between the watch core's
//! two halves.

use std::fmt;

/// One of the seven logical event kinds. `None` is the sentinel returned
/// when draining a stopped, empty queue — it is never produced by
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    None,
    Added,
    Changed,
    Removed,
    DirAdded,
    DirRemoved,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::None => "none",
            EventKind::Added => "added",
            EventKind::Changed => "changed",
            EventKind::Removed => "removed",
            EventKind::DirAdded => "dir-added",
            EventKind::DirRemoved => "dir-removed",
            EventKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// A classified, high-level event. `payload` is an absolute path for file
/// and directory events, a human-readable message for `Error`, and empty
/// for the `None` sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub payload: String,
}

impl Event {
    pub fn new(kind: EventKind, payload: impl Into<String>) -> Self {
        Event {
            kind,
            payload: payload.into(),
        }
    }

    /// The `{none, ""}` sentinel dequeued when a stopped queue has nothing
    /// left to give.
    pub fn none() -> Self {
        Event {
            kind: EventKind::None,
            payload: String::new(),
        }
    }

    pub fn added(path: impl Into<String>) -> Self {
        Event::new(EventKind::Added, path)
    }

    pub fn changed(path: impl Into<String>) -> Self {
        Event::new(EventKind::Changed, path)
    }

    pub fn removed(path: impl Into<String>) -> Self {
        Event::new(EventKind::Removed, path)
    }

    pub fn dir_added(path: impl Into<String>) -> Self {
        Event::new(EventKind::DirAdded, path)
    }

    pub fn dir_removed(path: impl Into<String>) -> Self {
        Event::new(EventKind::DirRemoved, path)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Event::new(EventKind::Error, message)
    }
}
