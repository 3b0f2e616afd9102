use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures the player reports back to whoever triggered the operation.
///
/// Storage problems are not part of this taxonomy: the registry and the
/// preference store are advisory and their errors are logged and absorbed.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The directory capability failed while the scanner was walking it.
    #[error("failed to read folder '{}': {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Re-granting read access to a saved folder was refused.
    #[error("read permission for folder '{0}' was denied")]
    PermissionDenied(String),

    /// The host has no way to pick a folder.
    #[error("folder picking is not supported here")]
    UnsupportedCapability,

    #[error("no saved folder with id '{0}'")]
    UnknownFolder(String),
}
