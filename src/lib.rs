// OnlyPlayer Library - Core modules for the local folder media player
// The player core never touches a device directly; outputs plug in behind a trait

pub mod config;  // settings and preferences file
pub mod error;   // domain error taxonomy
pub mod media;   // directory access, scanning, playable references
pub mod player;  // state machine, queue rules, playback binder
pub mod storage; // saved folders + persisted preferences
pub mod ui;      // status formatting, notices, key bindings

// Export the stuff other modules actually use
pub use config::Config;
pub use error::PlayerError;
pub use media::{
    DirectoryAccess, FolderScanner, LocalDirectory, MediaItem, MediaKind, ObjectUrls, PlayableRef,
};
pub use player::{Action, MediaOutput, PlaybackBinder, PlayerState, QueueMode, Session};
pub use storage::{FolderRecord, FolderRegistry, PreferenceStore, Preferences};
