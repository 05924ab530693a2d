//! Injectable logging interface.
//!
//! The watch-core history this crate grew out of logged through a pair of
//! free-standing `info!`/`error!` calls wired straight to a global logger.
//! That made the core untestable without capturing global state. `Logger`
//! replaces it: the core takes a handle at construction and calls through it
//! exclusively.

use std::sync::Mutex;

/// Two methods, line-oriented, thread-safe. Nothing else.
pub trait Logger: Send + Sync {
    fn info(&self, line: &str);
    fn error(&self, line: &str);
}

/// Default logger: forwards to the `log` crate, which `env_logger` (wired up
/// in `main`) renders to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl Logger for StdLogger {
    fn info(&self, line: &str) {
        log::info!("{}", line);
    }

    fn error(&self, line: &str) {
        log::error!("{}", line);
    }
}

/// Collects lines in memory; used by tests that need to assert on what was
/// logged without scraping stderr.
#[derive(Default)]
pub struct RecordingLogger {
    info: Mutex<Vec<String>>,
    error: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info_lines(&self) -> Vec<String> {
        self.info.lock().unwrap().clone()
    }

    pub fn error_lines(&self) -> Vec<String> {
        self.error.lock().unwrap().clone()
    }
}

impl Logger for RecordingLogger {
    fn info(&self, line: &str) {
        self.info.lock().unwrap().push(line.to_owned());
    }

    fn error(&self, line: &str) {
        self.error.lock().unwrap().push(line.to_owned());
    }
}
