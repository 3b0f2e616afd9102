use super::directory::FileHandle;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

/// Revocable handle an output uses to fetch a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayableRef(String);

impl PlayableRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Allocates playable references and keeps them resolvable until revoked.
///
/// The player is single-threaded, so the table sits behind a `RefCell` and is
/// shared with outputs through `Rc`.
#[derive(Debug, Default)]
pub struct ObjectUrls {
    live: RefCell<HashMap<PlayableRef, PathBuf>>,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, file: &FileHandle) -> PlayableRef {
        let url = PlayableRef(format!("blob:onlyplayer/{}", Uuid::new_v4()));
        self.live.borrow_mut().insert(url.clone(), file.path().to_path_buf());
        url
    }

    /// Returns false when the reference was not live (already revoked or foreign).
    pub fn revoke(&self, url: &PlayableRef) -> bool {
        let removed = self.live.borrow_mut().remove(url).is_some();
        if !removed {
            warn!("Revoking a reference that is not live: {}", url);
        }
        removed
    }

    pub fn resolve(&self, url: &PlayableRef) -> Option<PathBuf> {
        self.live.borrow().get(url).cloned()
    }

    pub fn is_live(&self, url: &PlayableRef) -> bool {
        self.live.borrow().contains_key(url)
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }
}
