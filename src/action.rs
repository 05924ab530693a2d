//! Pluggable behaviour run against every file the watch core reports as
//! `added`.
//!
//! The history this crate grew out of baked one fixed behaviour (spawn a
//! command, passing the changed paths as environment variables) straight
//! into the runner. [`Action`] pulls that behaviour out to a trait object so
//! the runner stays the same for "copy a file", "transcode a file", or "run
//! an arbitrary command".

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::logger::Logger;

/// Read-only context an [`Action`] needs to turn a watched path into work.
/// Shared (via `Arc`) between the runner and every action invocation.
pub struct SharedConfig {
    pub watch_root: PathBuf,
    pub destination_root: PathBuf,
    pub command_template: String,
    pub delete_source_on_success: bool,
    pub extension_override: Option<String>,
    pub logger: Arc<dyn Logger>,
}

/// One unit of work triggered by an `added` event. Implementations must not
/// panic: a failing action should return `false` so the runner can log it
/// and move on to the next event.
pub trait Action: Send + Sync {
    fn run(&self, path: &Path, config: &SharedConfig) -> bool;
}

/// `path` relative to `watch_root`, joined under `destination_root`. Falls
/// back to the file name alone if `path` isn't under `watch_root` (e.g. it
/// was passed in absolute but outside the watched tree by a test harness).
fn destination_for(path: &Path, config: &SharedConfig) -> PathBuf {
    let relative = path.strip_prefix(&config.watch_root).unwrap_or(
        path.file_name()
            .map(Path::new)
            .unwrap_or_else(|| Path::new("")),
    );
    config.destination_root.join(relative)
}

fn ensure_parent_dir(path: &Path, config: &SharedConfig) -> bool {
    let parent = match path.parent() {
        Some(p) => p,
        None => return true,
    };
    if let Err(err) = fs::create_dir_all(parent) {
        config
            .logger
            .error(&format!("could not create {}: {}", parent.display(), err));
        return false;
    }
    true
}

fn maybe_delete_source(path: &Path, config: &SharedConfig) {
    if !config.delete_source_on_success {
        return;
    }
    if let Err(err) = fs::remove_file(path) {
        config
            .logger
            .error(&format!("could not remove {}: {}", path.display(), err));
    }
}

/// Substitutes `%1%` with the source path and `%2%` with the destination
/// path, then hands the result to `sh -c` — same "wrap in a shell" idiom a
/// restart-driven command runner would use, minus the restart machinery.
fn substitute_and_run(template: &str, source: &Path, destination: &Path) -> bool {
    let command_line = template
        .replace("%1%", &source.to_string_lossy())
        .replace("%2%", &destination.to_string_lossy());

    match Command::new("sh").arg("-c").arg(&command_line).status() {
        Ok(status) => status.success(),
        Err(_) => false,
    }
}

/// Copies the file verbatim into `destination_root`, mirroring its path
/// relative to `watch_root`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyAction;

impl Action for CopyAction {
    fn run(&self, path: &Path, config: &SharedConfig) -> bool {
        let destination = destination_for(path, config);
        if !ensure_parent_dir(&destination, config) {
            return false;
        }

        match fs::copy(path, &destination) {
            Ok(_) => {
                config.logger.info(&format!(
                    "copied {} to {}",
                    path.display(),
                    destination.display()
                ));
                maybe_delete_source(path, config);
                true
            }
            Err(err) => {
                config
                    .logger
                    .error(&format!("copy of {} failed: {}", path.display(), err));
                false
            }
        }
    }
}

/// Runs `config.command_template` with `%1%`/`%2%` substituted for the
/// source and destination paths. The destination directory is created but
/// nothing is written to it directly — the command is responsible for that.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandAction;

impl Action for CommandAction {
    fn run(&self, path: &Path, config: &SharedConfig) -> bool {
        let destination = destination_for(path, config);
        if !ensure_parent_dir(&destination, config) {
            return false;
        }

        let ok = substitute_and_run(&config.command_template, path, &destination);
        if ok {
            config
                .logger
                .info(&format!("ran command for {}", path.display()));
            maybe_delete_source(path, config);
        } else {
            config
                .logger
                .error(&format!("command failed for {}", path.display()));
        }
        ok
    }
}

const DEFAULT_TRANSCODE_TEMPLATE: &str = "ffmpeg -y -i %1% %2%";

/// Runs an ffmpeg-style transcode, rewriting the destination's extension
/// when `extension_override` is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranscodeAction;

impl Action for TranscodeAction {
    fn run(&self, path: &Path, config: &SharedConfig) -> bool {
        let mut destination = destination_for(path, config);
        let ext = config.extension_override.as_deref().unwrap_or("mp4");
        destination.set_extension(ext);
        if !ensure_parent_dir(&destination, config) {
            return false;
        }

        let template = if config.command_template.is_empty() {
            DEFAULT_TRANSCODE_TEMPLATE
        } else {
            &config.command_template
        };

        let ok = substitute_and_run(template, path, &destination);
        if ok {
            config.logger.info(&format!(
                "transcoded {} to {}",
                path.display(),
                destination.display()
            ));
            maybe_delete_source(path, config);
        } else {
            config
                .logger
                .error(&format!("transcode failed for {}", path.display()));
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::RecordingLogger;
    use mktemp::Temp;
    use std::fs::File;
    use std::io::Write;

    fn shared_config(watch_root: PathBuf, destination_root: PathBuf) -> SharedConfig {
        SharedConfig {
            watch_root,
            destination_root,
            command_template: String::new(),
            delete_source_on_success: false,
            extension_override: None,
            logger: Arc::new(RecordingLogger::new()),
        }
    }

    #[test]
    fn copy_action_mirrors_relative_path() {
        let watch_dir = Temp::new_dir().unwrap();
        let dest_dir = Temp::new_dir().unwrap();

        let src = watch_dir.as_ref().join("sub").join("file.txt");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        File::create(&src).unwrap().write_all(b"hello").unwrap();

        let config = shared_config(
            watch_dir.as_ref().to_path_buf(),
            dest_dir.as_ref().to_path_buf(),
        );

        assert!(CopyAction.run(&src, &config));
        let expected = dest_dir.as_ref().join("sub").join("file.txt");
        assert_eq!(fs::read_to_string(expected).unwrap(), "hello");
    }

    #[test]
    fn copy_action_deletes_source_when_configured() {
        let watch_dir = Temp::new_dir().unwrap();
        let dest_dir = Temp::new_dir().unwrap();
        let src = watch_dir.as_ref().join("file.txt");
        File::create(&src).unwrap().write_all(b"x").unwrap();

        let mut config = shared_config(
            watch_dir.as_ref().to_path_buf(),
            dest_dir.as_ref().to_path_buf(),
        );
        config.delete_source_on_success = true;

        assert!(CopyAction.run(&src, &config));
        assert!(!src.exists());
    }

    #[test]
    fn copy_action_fails_cleanly_on_missing_source() {
        let watch_dir = Temp::new_dir().unwrap();
        let dest_dir = Temp::new_dir().unwrap();
        let config = shared_config(
            watch_dir.as_ref().to_path_buf(),
            dest_dir.as_ref().to_path_buf(),
        );

        assert!(!CopyAction.run(&watch_dir.as_ref().join("missing.txt"), &config));
    }

    #[test]
    fn command_action_substitutes_placeholders() {
        let watch_dir = Temp::new_dir().unwrap();
        let dest_dir = Temp::new_dir().unwrap();
        let src = watch_dir.as_ref().join("in.txt");
        File::create(&src).unwrap().write_all(b"x").unwrap();

        let mut config = shared_config(
            watch_dir.as_ref().to_path_buf(),
            dest_dir.as_ref().to_path_buf(),
        );
        config.command_template = "cp %1% %2%".to_string();

        assert!(CommandAction.run(&src, &config));
        assert!(dest_dir.as_ref().join("in.txt").exists());
    }

    #[test]
    fn transcode_action_defaults_to_mp4_extension_without_override() {
        let watch_dir = Temp::new_dir().unwrap();
        let dest_dir = Temp::new_dir().unwrap();
        let src = watch_dir.as_ref().join("clip.mov");
        File::create(&src).unwrap().write_all(b"x").unwrap();

        let mut config = shared_config(
            watch_dir.as_ref().to_path_buf(),
            dest_dir.as_ref().to_path_buf(),
        );
        // `cp` stands in for `ffmpeg` so the test doesn't depend on it being installed.
        config.command_template = "cp %1% %2%".to_string();

        assert!(TranscodeAction.run(&src, &config));
        assert!(dest_dir.as_ref().join("clip.mp4").exists());
    }

    #[test]
    fn transcode_action_honors_extension_override() {
        let watch_dir = Temp::new_dir().unwrap();
        let dest_dir = Temp::new_dir().unwrap();
        let src = watch_dir.as_ref().join("clip.mov");
        File::create(&src).unwrap().write_all(b"x").unwrap();

        let mut config = shared_config(
            watch_dir.as_ref().to_path_buf(),
            dest_dir.as_ref().to_path_buf(),
        );
        config.command_template = "cp %1% %2%".to_string();
        config.extension_override = Some("webm".to_string());

        assert!(TranscodeAction.run(&src, &config));
        assert!(dest_dir.as_ref().join("clip.webm").exists());
    }
}
