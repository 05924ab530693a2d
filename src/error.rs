//! Crate-wide error taxonomy.

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// All the ways `filewatchd` can fail, from kernel watch setup down to CLI
/// parsing. Boundary errors (`Io`, `Clap`, `Build`) sit alongside the
/// watch-core error variants.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The kernel notification handle could not be opened.
    #[error("could not initialize the filesystem watch facility: {0}")]
    ResourceInit(#[source] io::Error),

    /// The kernel refused to add a watch on a directory.
    #[error("could not watch {path}: {source}")]
    WatchAdd { path: String, source: io::Error },

    /// The kernel refused to remove a watch (benign "invalid argument" races
    /// are swallowed before this variant is ever constructed).
    #[error("could not stop watching {path}: {source}")]
    WatchRemove { path: String, source: io::Error },

    /// A read of raw kernel events failed.
    #[error("error reading filesystem events: {0}")]
    Read(#[source] io::Error),

    /// The user-supplied action panicked or otherwise could not run.
    #[error("action failed: {0}")]
    Action(String),

    /// An internal invariant was violated; always a bug.
    #[error("internal error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("argument error: {0}")]
    Clap(#[from] clap::Error),

    #[error("invalid configuration: {0}")]
    Build(String),
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Build(message)
    }
}
