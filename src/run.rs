//! Wires the CLI, configuration, watch core, and task runner together; the
//! crate's one public entry point.

use std::io::Write;
use std::sync::Arc;

use crate::cli;
use crate::error::Result;
use crate::logger::StdLogger;
use crate::runner::TaskRunner;

fn init_logger(level: log::LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| writeln!(buf, "*** {}: {}", record.level(), record.args()))
        .filter(None, level)
        .init();
}

pub fn run() -> Result<()> {
    let invocation = cli::parse()?;
    init_logger(invocation.log_level);

    let runner = TaskRunner::new(
        invocation.runner_config,
        invocation.watcher_config,
        invocation.action,
        invocation.shared_config,
        Arc::new(StdLogger),
    )?;

    runner.monitor()
}
