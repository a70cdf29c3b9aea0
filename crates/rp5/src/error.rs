use std::ffi::OsString;
use std::path::PathBuf;

use rp5config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Couldn't find: {}", .0.display())]
    SketchNotFound(PathBuf),

    #[error("{} does not exist\nTry running `rp5 setup install`", .0.display())]
    JarMissing(PathBuf),

    #[error("unknown os: {0:?}")]
    UnknownPlatform(String),

    #[error("That file already exists! ({})", .0.display())]
    SketchExists(PathBuf),

    #[error("argument is not valid UTF-8: {}", .0.to_string_lossy())]
    NonUtf8Argument(OsString),

    #[error("invalid create arguments: {0}")]
    InvalidCreateArgs(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Errors that end the invocation with a remediation message instead of a
    /// propagated error chain.
    pub fn is_missing_resource(&self) -> bool {
        matches!(
            self,
            Self::SketchNotFound(_) | Self::JarMissing(_) | Self::SketchExists(_)
        )
    }
}
