//! Drives the watch core to completion, dispatching every `added` event to
//! a pluggable [`Action`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::action::{Action, SharedConfig};
use crate::config::{RunnerConfig, WatcherConfig};
use crate::error::{Error, Result};
use crate::event::EventKind;
use crate::logger::Logger;
use crate::watcher::Watcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Init,
    Running,
    Stopping,
    Stopped,
}

pub struct TaskRunner {
    task_name: String,
    kill_count: u64,
    watcher: Watcher,
    action: Arc<dyn Action>,
    shared_config: SharedConfig,
    logger: Arc<dyn Logger>,
    successes: AtomicUsize,
    state: std::sync::Mutex<RunnerState>,
}

impl TaskRunner {
    pub fn new(
        runner_config: RunnerConfig,
        watcher_config: WatcherConfig,
        action: Arc<dyn Action>,
        shared_config: SharedConfig,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        if runner_config.task_name.is_empty() {
            return Err(Error::Build("task_name must not be empty".into()));
        }

        let watcher = Watcher::new(watcher_config, logger.clone())?;

        Ok(TaskRunner {
            task_name: runner_config.task_name,
            kill_count: runner_config.kill_count,
            watcher,
            action,
            shared_config,
            logger,
            successes: AtomicUsize::new(0),
            state: std::sync::Mutex::new(RunnerState::Init),
        })
    }

    pub fn state(&self) -> RunnerState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: RunnerState) {
        *self.state.lock().unwrap() = state;
    }

    /// Starts the watch core and drives events until the watcher stops,
    /// either because `kill_count` actions were dispatched, the watched root
    /// disappeared, or an external caller invoked `stop`.
    pub fn monitor(&self) -> Result<()> {
        self.set_state(RunnerState::Running);
        self.watcher.watch()?;

        let mut remaining = self.kill_count;
        while self.watcher.is_running() {
            let event = self.watcher.next_event();
            match event.kind {
                EventKind::Added if !event.payload.is_empty() => {
                    let path = std::path::PathBuf::from(&event.payload);
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        self.action.run(&path, &self.shared_config)
                    }));

                    match outcome {
                        Ok(true) => {
                            self.successes.fetch_add(1, Ordering::SeqCst);
                            self.logger
                                .info(&format!("{}: completed {}", self.task_name, event.payload));
                        }
                        Ok(false) => {
                            self.logger.error(&format!(
                                "{}: action failed for {}",
                                self.task_name, event.payload
                            ));
                        }
                        Err(_) => {
                            self.set_state(RunnerState::Stopping);
                            self.watcher.stop();
                            self.watcher.join();
                            self.set_state(RunnerState::Stopped);
                            return Err(Error::Action(format!(
                                "action panicked while processing {}",
                                event.payload
                            )));
                        }
                    }

                    if remaining > 0 {
                        remaining -= 1;
                        if remaining == 0 {
                            self.set_state(RunnerState::Stopping);
                            self.watcher.stop();
                            break;
                        }
                    }
                }
                EventKind::Error if !event.payload.is_empty() => {
                    self.logger
                        .error(&format!("{}: watch core error: {}", self.task_name, event.payload));
                }
                EventKind::None => continue,
                _ => {}
            }
        }

        self.set_state(RunnerState::Stopping);
        self.watcher.stop();
        self.watcher.join();
        self.set_state(RunnerState::Stopped);

        if let Some(err) = self.watcher.take_error() {
            return Err(err);
        }
        Ok(())
    }

    /// Requests shutdown from outside the `monitor` loop; safe from any
    /// thread.
    pub fn stop(&self) {
        self.set_state(RunnerState::Stopping);
        self.watcher.stop();
    }

    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }
}
