// Persistence - the folders you opened before and the few settings worth keeping
// Both are advisory: a broken store never stops playback

pub mod folders; // SQLite registry of saved folders
pub mod prefs;   // playback rate + queue mode in a key-value area

pub use folders::{FolderRecord, FolderRegistry};
pub use prefs::{
    KeyValueArea, LocalArea, PartialPreferences, PreferenceStore, Preferences, ProfileArea,
};
