//! Immutable configuration records for the watch core and the task runner.
//!
//! Neither struct is constructable directly — use the generated builders,
//! which enforce the preconditions in [`WatcherConfigBuilder::validate`] and
//! [`RunnerConfigBuilder::validate`] at `build()` time.

use derive_builder::Builder;
use inotify::WatchMask;

fn default_event_mask() -> WatchMask {
    WatchMask::CREATE
        | WatchMask::MODIFY
        | WatchMask::CLOSE_WRITE
        | WatchMask::MOVED_TO
        | WatchMask::MOVED_FROM
        | WatchMask::DELETE
        | WatchMask::DELETE_SELF
}

/// Arguments to the watch core.
#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option))]
#[builder(build_fn(validate = "Self::validate"))]
pub struct WatcherConfig {
    /// Directory tree to watch. Normalized to end in a path separator.
    pub root: String,
    /// How many levels below `root` to recurse into; `-1` is unbounded.
    #[builder(default = "-1")]
    pub max_depth: i32,
    /// Raw kernel event bits the event source subscribes each watch with.
    #[builder(default = "default_event_mask()")]
    pub event_mask: WatchMask,
    /// Bound on the event queue between the two watch-core threads.
    #[builder(default = "1024")]
    pub queue_capacity: usize,
}

impl WatcherConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.root.as_ref().map_or(true, String::is_empty) {
            return Err("root must not be empty".into());
        }

        if let Some(depth) = self.max_depth {
            if depth < -1 {
                return Err("max_depth must be -1 or greater".into());
            }
        }

        if let Some(capacity) = self.queue_capacity {
            if capacity == 0 {
                return Err("queue_capacity must be at least 1".into());
            }
        }

        Ok(())
    }
}

/// Arguments to the task runner.
#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option))]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RunnerConfig {
    /// Name used in log lines to identify this runner.
    pub task_name: String,
    /// Stop the watcher after this many successful actions; `0` is unbounded.
    #[builder(default = "0")]
    pub kill_count: u64,
}

impl RunnerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.task_name.as_ref().map_or(true, String::is_empty) {
            return Err("task_name must not be empty".into());
        }

        Ok(())
    }
}
