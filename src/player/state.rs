use super::queue::{QueueNavigator, Step};
use super::{PlayerMode, PlayerView, QueueMode, SPEED_STEPS};
use crate::media::MediaItem;
use crate::storage::{FolderRecord, PartialPreferences, Preferences};
use rand::Rng;
use std::mem;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScanStatus {
    #[default]
    Idle,
    Loading,
    Error(String),
}

/// Everything the player knows for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub library: Vec<MediaItem>,
    pub now_playing_id: Option<Uuid>,
    pub playing: bool,
    pub view: PlayerView,
    pub mode: PlayerMode,
    pub playback_rate: f32,
    pub queue_mode: QueueMode,
    pub status: ScanStatus,
    pub volume: f32,
    pub muted: bool,
    pub current_time: f64,
    pub duration: f64,
    pub folders: Vec<FolderRecord>,
    /// Bumped whenever the output should jump back to zero on the same item.
    pub rewind_epoch: u64,
    /// Preferences were hydrated and are now the source of truth.
    pub prefs_ready: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            library: Vec::new(),
            now_playing_id: None,
            playing: false,
            view: PlayerView::default(),
            mode: PlayerMode::default(),
            playback_rate: 1.0,
            queue_mode: QueueMode::default(),
            status: ScanStatus::default(),
            volume: 1.0,
            muted: false,
            current_time: 0.0,
            duration: 0.0,
            folders: Vec::new(),
            rewind_epoch: 0,
            prefs_ready: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetView(PlayerView),
    SetMode(PlayerMode),
    FocusItem(Uuid),
    TogglePlay,
    SetPlaying(bool),
    Stop,
    SetPlaybackRate(f32),
    CycleSpeed,
    CycleQueueMode,
    HydratePreferences(PartialPreferences),
    SetVolume(f32),
    ToggleMute,
    ScanStarted,
    ScanFinished(Vec<MediaItem>),
    ScanFailed(String),
    FoldersLoaded(Vec<FolderRecord>),
    ClearLibrary,
    PlayNext,
    PlayPrevious,
    Progress { current_time: f64, duration: f64 },
}

/// Result of reducing one action.
#[derive(Debug)]
pub struct Transition {
    pub state: PlayerState,
    /// Items that left the library; their references still need revoking.
    pub released: Vec<MediaItem>,
}

impl PlayerState {
    /// The focused item, if its id is still in the library.
    pub fn now_playing(&self) -> Option<&MediaItem> {
        let id = self.now_playing_id?;
        self.library.iter().find(|item| item.id == id)
    }

    pub fn now_playing_index(&self) -> Option<usize> {
        let id = self.now_playing_id?;
        self.library.iter().position(|item| item.id == id)
    }

    fn navigator(&self) -> QueueNavigator {
        QueueNavigator::new(self.library.len(), self.now_playing_index(), self.queue_mode)
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &MediaItem> + '_ {
        self.library.iter().filter(move |item| self.mode.admits(item.kind))
    }

    pub fn is_loading(&self) -> bool {
        self.status == ScanStatus::Loading
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.status {
            ScanStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            playback_rate: self.playback_rate,
            queue_mode: self.queue_mode,
        }
    }

    /// Output volume once mute is taken into account.
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Produce the next snapshot. `self` is left untouched.
    pub fn reduce<R: Rng + ?Sized>(&self, action: Action, rng: &mut R) -> Transition {
        let mut state = self.clone();
        let released = state.apply(action, rng);
        Transition { state, released }
    }

    fn apply<R: Rng + ?Sized>(&mut self, action: Action, rng: &mut R) -> Vec<MediaItem> {
        match action {
            Action::SetView(view) => self.view = view,
            Action::SetMode(mode) => self.mode = mode,
            Action::FocusItem(id) => {
                let known = self.library.iter().any(|item| item.id == id);
                if self.now_playing_id != Some(id) && known {
                    self.focus(id);
                    self.playing = true;
                }
            }
            Action::TogglePlay => self.playing = !self.playing,
            Action::SetPlaying(playing) => self.playing = playing,
            Action::Stop => {
                self.playing = false;
                self.current_time = 0.0;
                self.rewind_epoch += 1;
            }
            Action::SetPlaybackRate(rate) => self.playback_rate = rate,
            Action::CycleSpeed => {
                self.playback_rate = SPEED_STEPS
                    .iter()
                    .copied()
                    .find(|&step| step > self.playback_rate)
                    .unwrap_or(SPEED_STEPS[0]);
            }
            Action::CycleQueueMode => self.queue_mode = self.queue_mode.cycle(),
            Action::HydratePreferences(partial) => self.hydrate(partial),
            Action::SetVolume(volume) => {
                if !volume.is_nan() {
                    self.volume = volume.clamp(0.0, 1.0);
                    if self.volume > 0.0 {
                        self.muted = false;
                    }
                }
            }
            Action::ToggleMute => self.muted = !self.muted,
            Action::ScanStarted => self.status = ScanStatus::Loading,
            Action::ScanFinished(items) => {
                let released = mem::replace(&mut self.library, items);
                self.now_playing_id = self.library.first().map(|item| item.id);
                self.playing = false;
                self.current_time = 0.0;
                self.duration = 0.0;
                self.status = ScanStatus::Idle;
                return released;
            }
            Action::ScanFailed(message) => self.status = ScanStatus::Error(message),
            Action::FoldersLoaded(folders) => self.folders = folders,
            Action::ClearLibrary => {
                self.now_playing_id = None;
                self.playing = false;
                self.current_time = 0.0;
                self.duration = 0.0;
                return mem::take(&mut self.library);
            }
            Action::PlayNext => {
                let step = self.navigator().next(rng);
                self.step(step);
            }
            Action::PlayPrevious => {
                let step = self.navigator().previous();
                self.step(step);
            }
            Action::Progress { current_time, duration } => {
                if current_time.is_finite() {
                    self.current_time = current_time.max(0.0);
                }
                if duration.is_finite() {
                    self.duration = duration.max(0.0);
                }
            }
        }

        Vec::new()
    }

    fn focus(&mut self, id: Uuid) {
        self.now_playing_id = Some(id);
        self.current_time = 0.0;
        self.duration = 0.0;
    }

    fn step(&mut self, step: Step) {
        debug!("Queue step {:?} in {} mode", step, self.queue_mode);
        match step {
            Step::Focus(idx) => {
                let id = self.library[idx].id;
                self.focus(id);
                self.playing = true;
            }
            Step::Replay => {
                self.current_time = 0.0;
                self.rewind_epoch += 1;
                self.playing = true;
            }
            Step::Stop => self.playing = false,
            Step::Stay => {}
        }
    }

    fn hydrate(&mut self, partial: PartialPreferences) {
        // Narrow first: values outside f32 range turn into inf or 0
        if let Some(rate) = partial.playback_rate.map(|rate| rate as f32) {
            if rate.is_finite() && rate > 0.0 {
                self.playback_rate = rate;
            }
        }
        if let Some(mode) = partial.queue_mode.as_deref().and_then(QueueMode::from_stored) {
            self.queue_mode = mode;
        }
        self.prefs_ready = true;
    }
}
