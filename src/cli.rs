//! Command-line surface: populates the watcher, runner, and action
//! configuration records from `std::env::args` or an explicit list.

use std::ffi::OsString;
use std::sync::Arc;

use clap::{App, Arg};
use log::LevelFilter;

use crate::action::{Action, CommandAction, CopyAction, SharedConfig, TranscodeAction};
use crate::config::{RunnerConfigBuilder, WatcherConfigBuilder};
use crate::error::{Error, Result};
use crate::logger::{Logger, StdLogger};

pub struct Invocation {
    pub watcher_config: crate::config::WatcherConfig,
    pub runner_config: crate::config::RunnerConfig,
    pub shared_config: SharedConfig,
    pub action: Arc<dyn Action>,
    pub log_level: LevelFilter,
}

pub fn parse() -> Result<Invocation> {
    parse_from(std::env::args_os())
}

pub fn parse_from<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let app = App::new("filewatchd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watches a directory tree and runs a pluggable action on every file that appears in it")
        .arg(Arg::with_name("watch")
                 .help("Directory to observe")
                 .long("watch")
                 .takes_value(true)
                 .required(true)
                 .value_name("path"))
        .arg(Arg::with_name("destination")
                 .help("Output root")
                 .long("destination")
                 .takes_value(true)
                 .required(true)
                 .value_name("path"))
        .arg(Arg::with_name("maxdepth")
                 .help("Maximum recursion depth below the watched root; -1 is unbounded")
                 .long("maxdepth")
                 .takes_value(true)
                 .allow_hyphen_values(true)
                 .value_name("depth"))
        .arg(Arg::with_name("copy")
                 .help("Copy each new file to the destination")
                 .long("copy"))
        .arg(Arg::with_name("video")
                 .help("Transcode each new file, producing .mp4 by default")
                 .long("video"))
        .arg(Arg::with_name("command")
                 .help("Run a command for each new file; %1%/%2% are source/destination")
                 .long("command")
                 .takes_value(true)
                 .value_name("template"))
        .arg(Arg::with_name("delete")
                 .help("Remove the source file after a successful action")
                 .long("delete"))
        .arg(Arg::with_name("extension")
                 .help("Override the output extension used by --video")
                 .long("extension")
                 .takes_value(true)
                 .value_name("ext"))
        .arg(Arg::with_name("kill-count")
                 .help("Exit after this many successful actions; 0 is unbounded")
                 .long("kill-count")
                 .takes_value(true)
                 .value_name("count"))
        .arg(Arg::with_name("quiet")
                 .help("Suppress non-error logging")
                 .long("quiet"));

    let matches = app.get_matches_from(args);

    let copy = matches.is_present("copy");
    let video = matches.is_present("video");
    let command = matches.is_present("command");

    if [copy, video, command].iter().filter(|&&flag| flag).count() > 1 {
        return Err(Error::Build("More than one task specified".into()));
    }

    let watch_root = matches.value_of("watch").unwrap_or_default().to_string();
    let destination_root = matches
        .value_of("destination")
        .unwrap_or_default()
        .to_string();

    let max_depth = match matches.value_of("maxdepth") {
        Some(raw) => raw
            .parse::<i32>()
            .map_err(|_| Error::Build(format!("invalid --maxdepth value: {}", raw)))?,
        None => -1,
    };

    let kill_count = match matches.value_of("kill-count") {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| Error::Build(format!("invalid --kill-count value: {}", raw)))?,
        None => 0,
    };

    let command_template = matches.value_of("command").unwrap_or_default().to_string();
    let extension_override = matches.value_of("extension").map(str::to_string);
    let delete_source_on_success = matches.is_present("delete");
    let quiet = matches.is_present("quiet");

    // No action flag given: defaults to copying the new file as-is.
    let (action, task_name): (Arc<dyn Action>, &'static str) = if video {
        (Arc::new(TranscodeAction), "video")
    } else if command {
        (Arc::new(CommandAction), "command")
    } else {
        (Arc::new(CopyAction), "copy")
    };

    let logger: Arc<dyn Logger> = Arc::new(StdLogger);

    let watcher_config = WatcherConfigBuilder::default()
        .root(watch_root.clone())
        .max_depth(max_depth)
        .build()
        .map_err(|e| Error::Build(e.to_string()))?;

    let runner_config = RunnerConfigBuilder::default()
        .task_name(task_name)
        .kill_count(kill_count)
        .build()
        .map_err(|e| Error::Build(e.to_string()))?;

    let shared_config = SharedConfig {
        watch_root: watch_root.into(),
        destination_root: destination_root.into(),
        command_template,
        delete_source_on_success,
        extension_override,
        logger,
    };

    let log_level = if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };

    Ok(Invocation {
        watcher_config,
        runner_config,
        shared_config,
        action,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Vec<String> {
        let mut v = vec!["filewatchd".to_string()];
        v.extend(extra.iter().map(|s| s.to_string()));
        v
    }

    #[test]
    fn defaults_to_copy_when_no_action_flag_given() {
        let invocation = parse_from(args(&["--watch", "/tmp/watch", "--destination", "/tmp/dest"])).unwrap();
        assert_eq!(invocation.watcher_config.max_depth, -1);
        assert_eq!(invocation.runner_config.kill_count, 0);
    }

    #[test]
    fn rejects_more_than_one_action_flag() {
        let result = parse_from(args(&[
            "--watch",
            "/tmp/watch",
            "--destination",
            "/tmp/dest",
            "--copy",
            "--video",
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn parses_maxdepth_and_kill_count() {
        let invocation = parse_from(args(&[
            "--watch",
            "/tmp/watch",
            "--destination",
            "/tmp/dest",
            "--maxdepth",
            "0",
            "--kill-count",
            "5",
        ]))
        .unwrap();
        assert_eq!(invocation.watcher_config.max_depth, 0);
        assert_eq!(invocation.runner_config.kill_count, 5);
    }
}
