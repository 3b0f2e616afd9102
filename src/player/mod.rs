// Player core - one state snapshot, pure transitions, and a binder that
// pushes each new snapshot onto whatever output device is plugged in

pub mod binder;  // state -> output device synchronisation
pub mod output;  // concrete outputs (rodio, null)
pub mod queue;   // next/previous rules per queue mode
pub mod session; // async operations tying scanner, storage and binder together
pub mod state;   // PlayerState + Action reducer

pub use binder::{snapshot_file_name, Frame, MediaOutput, OutputError, OutputEvent, PlaybackBinder};
pub use output::NullOutput;
#[cfg(feature = "audio")]
pub use output::RodioOutput;
pub use queue::{QueueNavigator, Step};
pub use session::Session;
pub use state::{Action, PlayerState, ScanStatus, Transition};

use crate::media::MediaKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speed deck steps offered by `Action::CycleSpeed`.
pub const SPEED_STEPS: [f32; 4] = [0.5, 1.0, 1.5, 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    #[default]
    Loop,
    Shuffle,
    Single,
}

impl QueueMode {
    /// loop -> shuffle -> single -> loop
    pub fn cycle(self) -> Self {
        match self {
            QueueMode::Loop => QueueMode::Shuffle,
            QueueMode::Shuffle => QueueMode::Single,
            QueueMode::Single => QueueMode::Loop,
        }
    }

    /// Parse a stored mode name, accepting the legacy "sequence" alias.
    pub fn from_stored(name: &str) -> Option<Self> {
        match name {
            "loop" | "sequence" => Some(QueueMode::Loop),
            "shuffle" => Some(QueueMode::Shuffle),
            "single" => Some(QueueMode::Single),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueMode::Loop => "loop",
            QueueMode::Shuffle => "shuffle",
            QueueMode::Single => "single",
        }
    }
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerView {
    #[default]
    Library,
    Player,
    Settings,
}

/// Which media kinds the library view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerMode {
    #[default]
    Hybrid,
    Audio,
    Video,
}

impl PlayerMode {
    pub fn admits(&self, kind: MediaKind) -> bool {
        match self {
            PlayerMode::Hybrid => true,
            PlayerMode::Audio => kind == MediaKind::Audio,
            PlayerMode::Video => kind == MediaKind::Video,
        }
    }
}
