use super::binder::{MediaOutput, OutputError, PlaybackBinder};
use super::state::{Action, PlayerState, Transition};
use crate::error::PlayerError;
use crate::media::{DirectoryAccess, FolderPicker, FolderScanner, ObjectUrls, PermissionState};
use crate::storage::{FolderRegistry, PreferenceStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Owns the player state and coordinates everything that changes it.
///
/// Every mutation goes through [`Session::dispatch`]: the state is reduced,
/// the binder mirrors the new snapshot onto the output, references that left
/// the library are revoked, and changed preferences are persisted.
pub struct Session<O: MediaOutput> {
    state: PlayerState,
    rng: StdRng,
    urls: Rc<ObjectUrls>,
    scanner: FolderScanner,
    folders: Option<FolderRegistry>,
    prefs: PreferenceStore,
    binder: PlaybackBinder<O>,
}

impl<O: MediaOutput> Session<O> {
    pub fn new(
        output: O,
        urls: Rc<ObjectUrls>,
        prefs: PreferenceStore,
        folders: Option<FolderRegistry>,
    ) -> Self {
        Self {
            state: PlayerState::default(),
            rng: StdRng::from_entropy(),
            scanner: FolderScanner::new(urls.clone()),
            urls,
            folders,
            prefs,
            binder: PlaybackBinder::new(output),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_scan_limit(mut self, max_items: usize) -> Self {
        self.scanner = self.scanner.with_limit(max_items);
        self
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn binder(&self) -> &PlaybackBinder<O> {
        &self.binder
    }

    pub fn binder_mut(&mut self) -> &mut PlaybackBinder<O> {
        &mut self.binder
    }

    pub fn urls(&self) -> &Rc<ObjectUrls> {
        &self.urls
    }

    pub async fn dispatch(&mut self, action: Action) {
        let mut pending = VecDeque::from([action]);

        while let Some(action) = pending.pop_front() {
            let Transition { state, released } = self.state.reduce(action, &mut self.rng);
            let previous = std::mem::replace(&mut self.state, state);

            pending.extend(self.binder.sync(&self.state));

            // The binder has moved off anything released, so revoking is safe now
            for item in &released {
                debug_assert!(self.binder.bound() != Some(&item.url));
                self.urls.revoke(&item.url);
            }

            if self.state.prefs_ready
                && (previous.playback_rate != self.state.playback_rate
                    || previous.queue_mode != self.state.queue_mode
                    || !previous.prefs_ready)
            {
                self.prefs.save(&self.state.preferences()).await;
            }
        }
    }

    /// Load stored preferences once; from then on every change is saved.
    pub async fn restore_preferences(&mut self) {
        let partial = self.prefs.load().await;
        if partial.is_empty() {
            debug!("No stored preferences, keeping defaults");
        }
        self.dispatch(Action::HydratePreferences(partial)).await;
    }

    pub async fn refresh_folders(&mut self) {
        let Some(registry) = &self.folders else {
            return;
        };
        match registry.list_all().await {
            Ok(folders) => self.dispatch(Action::FoldersLoaded(folders)).await,
            Err(e) => warn!("Failed to list saved folders: {:#}", e),
        }
    }

    /// Scan `dir` and make it the library. Returns how many items were found.
    pub async fn load_from_directory(
        &mut self,
        dir: &dyn DirectoryAccess,
    ) -> Result<usize, PlayerError> {
        self.dispatch(Action::ScanStarted).await;

        let items = match self.scanner.scan(dir).await {
            Ok(items) => items,
            Err(err) => {
                warn!("Scan of '{}' failed: {}", dir.name(), err);
                self.dispatch(Action::ScanFailed(err.to_string())).await;
                return Err(err);
            }
        };

        let count = items.len();
        self.dispatch(Action::ScanFinished(items)).await;

        if let Some(registry) = &self.folders {
            if let Err(e) = registry.upsert(dir).await {
                warn!("Failed to remember folder '{}': {:#}", dir.name(), e);
            }
        }
        self.refresh_folders().await;

        info!("Library now holds {} items from '{}'", count, dir.name());
        Ok(count)
    }

    /// Reopen a saved folder, asking for read access again when needed.
    pub async fn load_from_saved_folder(&mut self, id: &str) -> Result<usize, PlayerError> {
        let record = match &self.folders {
            Some(registry) => registry.get(id).await.unwrap_or_else(|e| {
                warn!("Failed to look up saved folder '{}': {:#}", id, e);
                None
            }),
            None => None,
        };
        let record = record.ok_or_else(|| PlayerError::UnknownFolder(id.to_string()))?;

        let dir = record.open();
        if dir.query_permission() != PermissionState::Granted
            && dir.request_permission() != PermissionState::Granted
        {
            warn!("Read access to '{}' was not granted", record.name);
            return Err(PlayerError::PermissionDenied(record.name));
        }

        self.load_from_directory(&dir).await
    }

    /// `Ok(None)` when the user cancelled the pick.
    pub async fn pick_and_load(
        &mut self,
        picker: &mut dyn FolderPicker,
    ) -> Result<Option<usize>, PlayerError> {
        match picker.pick()? {
            Some(dir) => self.load_from_directory(dir.as_ref()).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn forget_folder(&mut self, id: &str) -> bool {
        let Some(registry) = &self.folders else {
            return false;
        };
        let removed = registry.remove(id).await.unwrap_or_else(|e| {
            warn!("Failed to forget folder '{}': {:#}", id, e);
            false
        });
        self.refresh_folders().await;
        removed
    }

    /// Feed output events (progress, end of media) back into the state.
    pub async fn pump(&mut self) {
        for action in self.binder.pump(&self.state) {
            self.dispatch(action).await;
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        self.binder.seek(seconds);
    }

    pub fn picture_in_picture(&mut self) -> Result<(), OutputError> {
        self.binder.picture_in_picture(&self.state)
    }

    pub fn snapshot(&self, dir: &Path) -> Result<PathBuf, OutputError> {
        self.binder.snapshot(&self.state, dir)
    }

    /// Release every playable reference before going away.
    pub async fn shutdown(&mut self) {
        self.dispatch(Action::ClearLibrary).await;
    }
}
