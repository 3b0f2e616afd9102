use super::state::{Action, PlayerState};
use super::QueueMode;
use crate::media::{MediaKind, PlayableRef};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("playback was rejected: {0}")]
    Rejected(String),
    #[error("not available: {0}")]
    Unavailable(String),
    #[error("no decoded video frame is available")]
    NoFrame,
    #[error("failed to encode frame: {0}")]
    Encode(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Things the output device reports on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    TimeUpdate { current_time: f64, duration: f64 },
    Ended,
}

/// One decoded RGBA video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// The media-rendering element the binder drives.
pub trait MediaOutput {
    /// Swap the source and reload. `None` empties the element.
    fn load(&mut self, source: Option<(&PlayableRef, MediaKind)>);
    fn play(&mut self) -> Result<(), OutputError>;
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_playback_rate(&mut self, rate: f32);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn poll_events(&mut self) -> Vec<OutputEvent>;

    fn has_video_frame(&self) -> bool {
        false
    }

    fn enter_picture_in_picture(&mut self) -> Result<(), OutputError> {
        Err(OutputError::Unavailable("picture-in-picture".into()))
    }

    fn capture_frame(&self) -> Result<Frame, OutputError> {
        Err(OutputError::NoFrame)
    }
}

impl<T: MediaOutput + ?Sized> MediaOutput for Box<T> {
    fn load(&mut self, source: Option<(&PlayableRef, MediaKind)>) {
        (**self).load(source)
    }
    fn play(&mut self) -> Result<(), OutputError> {
        (**self).play()
    }
    fn pause(&mut self) {
        (**self).pause()
    }
    fn seek(&mut self, seconds: f64) {
        (**self).seek(seconds)
    }
    fn set_playback_rate(&mut self, rate: f32) {
        (**self).set_playback_rate(rate)
    }
    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume)
    }
    fn set_muted(&mut self, muted: bool) {
        (**self).set_muted(muted)
    }
    fn poll_events(&mut self) -> Vec<OutputEvent> {
        (**self).poll_events()
    }
    fn has_video_frame(&self) -> bool {
        (**self).has_video_frame()
    }
    fn enter_picture_in_picture(&mut self) -> Result<(), OutputError> {
        (**self).enter_picture_in_picture()
    }
    fn capture_frame(&self) -> Result<Frame, OutputError> {
        (**self).capture_frame()
    }
}

/// What the output currently reflects.
#[derive(Debug, Clone, PartialEq)]
struct Applied {
    source: Option<PlayableRef>,
    playing: bool,
    playback_rate: f32,
    volume: f32,
    muted: bool,
    rewind_epoch: u64,
}

impl Applied {
    fn from_state(state: &PlayerState) -> Self {
        Self {
            source: state.now_playing().map(|item| item.url.clone()),
            playing: state.playing && state.now_playing().is_some(),
            playback_rate: state.playback_rate,
            volume: state.volume,
            muted: state.muted,
            rewind_epoch: state.rewind_epoch,
        }
    }
}

/// Observes state snapshots and mirrors them onto a `MediaOutput`.
///
/// The binder never mutates state itself; anything it learns from the device
/// comes back as actions for the session to dispatch.
pub struct PlaybackBinder<O> {
    output: O,
    applied: Option<Applied>,
}

impl<O: MediaOutput> PlaybackBinder<O> {
    pub fn new(output: O) -> Self {
        Self { output, applied: None }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Reference currently loaded into the output.
    pub fn bound(&self) -> Option<&PlayableRef> {
        self.applied.as_ref().and_then(|a| a.source.as_ref())
    }

    /// Apply whatever changed since the last snapshot.
    pub fn sync(&mut self, state: &PlayerState) -> Vec<Action> {
        let next = Applied::from_state(state);
        let prev = self.applied.take();
        let mut follow_up = Vec::new();

        let first = prev.is_none();
        let source_changed = first || prev.as_ref().map(|p| &p.source) != Some(&next.source);
        let rewound = prev.as_ref().is_some_and(|p| p.rewind_epoch != next.rewind_epoch);

        if source_changed {
            let kind = state.now_playing().map(|item| item.kind);
            debug!("Binding source {:?}", next.source.as_ref().map(|s| s.as_str()));
            self.output.load(next.source.as_ref().zip(kind));
        } else if rewound {
            self.output.seek(0.0);
        }

        // A reload resets element properties, so reapply them with the source
        if source_changed || prev.as_ref().is_some_and(|p| p.playback_rate != next.playback_rate) {
            self.output.set_playback_rate(next.playback_rate);
        }
        if source_changed || prev.as_ref().is_some_and(|p| p.volume != next.volume) {
            self.output.set_volume(next.volume);
        }
        if source_changed || prev.as_ref().is_some_and(|p| p.muted != next.muted) {
            self.output.set_muted(next.muted);
        }

        let play_changed = prev.as_ref().is_some_and(|p| p.playing != next.playing);
        if source_changed || rewound || play_changed {
            if next.playing {
                if let Err(e) = self.output.play() {
                    warn!("Playback did not start: {}", e);
                    follow_up.push(Action::SetPlaying(false));
                }
            } else if next.source.is_some() || play_changed {
                self.output.pause();
            }
        }

        self.applied = Some(next);
        follow_up
    }

    /// Drain device events and turn them into actions.
    pub fn pump(&mut self, state: &PlayerState) -> Vec<Action> {
        let mut actions = Vec::new();

        for event in self.output.poll_events() {
            match event {
                OutputEvent::TimeUpdate { current_time, duration } => {
                    actions.push(Action::Progress { current_time, duration });
                }
                OutputEvent::Ended if state.queue_mode == QueueMode::Single => {
                    debug!("Track ended, repeating it");
                    self.output.seek(0.0);
                    if let Err(e) = self.output.play() {
                        warn!("Replay did not start: {}", e);
                        actions.push(Action::SetPlaying(false));
                    }
                }
                OutputEvent::Ended => actions.push(Action::PlayNext),
            }
        }

        actions
    }

    pub fn seek(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.output.seek(seconds.max(0.0));
        }
    }

    fn ensure_video_frame(&self, state: &PlayerState) -> Result<(), OutputError> {
        let is_video = state.now_playing().is_some_and(|item| item.kind == MediaKind::Video);
        if is_video && self.output.has_video_frame() {
            Ok(())
        } else {
            Err(OutputError::NoFrame)
        }
    }

    pub fn picture_in_picture(&mut self, state: &PlayerState) -> Result<(), OutputError> {
        self.ensure_video_frame(state)?;
        self.output.enter_picture_in_picture()
    }

    /// Export the current video frame as a PNG inside `dir`.
    pub fn snapshot(&self, state: &PlayerState, dir: &Path) -> Result<PathBuf, OutputError> {
        self.ensure_video_frame(state)?;
        let frame = self.output.capture_frame()?;

        let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba)
            .ok_or_else(|| {
                OutputError::Encode("frame buffer does not match its dimensions".into())
            })?;

        fs::create_dir_all(dir)?;
        let path = dir.join(snapshot_file_name(Utc::now()));
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| OutputError::Encode(e.to_string()))?;

        info!("Saved frame snapshot to {}", path.display());
        Ok(path)
    }
}

/// `onlyplayer-frame-<ISO-8601 with colons dashed>.png`
pub fn snapshot_file_name(at: DateTime<Utc>) -> String {
    format!(
        "onlyplayer-frame-{}.png",
        at.to_rfc3339_opts(SecondsFormat::Millis, true).replace(':', "-")
    )
}

#[cfg(test)]
pub(crate) mod recording {
    //! Output double that records every command it receives.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Load(Option<PlayableRef>),
        Play,
        Pause,
        Seek(f64),
        Rate(f32),
        Volume(f32),
        Muted(bool),
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingOutput {
        pub calls: Vec<Call>,
        pub events: Vec<OutputEvent>,
        pub reject_play: bool,
        pub frame: Option<Frame>,
    }

    impl RecordingOutput {
        pub fn take(&mut self) -> Vec<Call> {
            std::mem::take(&mut self.calls)
        }
    }

    impl MediaOutput for RecordingOutput {
        fn load(&mut self, source: Option<(&PlayableRef, MediaKind)>) {
            self.calls.push(Call::Load(source.map(|(url, _)| url.clone())));
        }
        fn play(&mut self) -> Result<(), OutputError> {
            self.calls.push(Call::Play);
            if self.reject_play {
                Err(OutputError::Rejected("decode failure".into()))
            } else {
                Ok(())
            }
        }
        fn pause(&mut self) {
            self.calls.push(Call::Pause);
        }
        fn seek(&mut self, seconds: f64) {
            self.calls.push(Call::Seek(seconds));
        }
        fn set_playback_rate(&mut self, rate: f32) {
            self.calls.push(Call::Rate(rate));
        }
        fn set_volume(&mut self, volume: f32) {
            self.calls.push(Call::Volume(volume));
        }
        fn set_muted(&mut self, muted: bool) {
            self.calls.push(Call::Muted(muted));
        }
        fn poll_events(&mut self) -> Vec<OutputEvent> {
            std::mem::take(&mut self.events)
        }
        fn has_video_frame(&self) -> bool {
            self.frame.is_some()
        }
        fn enter_picture_in_picture(&mut self) -> Result<(), OutputError> {
            Ok(())
        }
        fn capture_frame(&self) -> Result<Frame, OutputError> {
            self.frame.clone().ok_or(OutputError::NoFrame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{Call, RecordingOutput};
    use super::*;
    use crate::media::{FileHandle, MediaItem, ObjectUrls};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn item(urls: &ObjectUrls, name: &str, kind: MediaKind) -> MediaItem {
        let handle = FileHandle::new(name.to_string(), PathBuf::from("/m").join(name), 1);
        MediaItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            url: urls.create(&handle),
            size: 1,
            ext: "x".to_string(),
            handle,
        }
    }

    fn run(state: &PlayerState, action: Action) -> PlayerState {
        state.reduce(action, &mut StdRng::seed_from_u64(3)).state
    }

    fn loaded(kinds: &[MediaKind]) -> PlayerState {
        let urls = ObjectUrls::new();
        let items = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| item(&urls, &format!("{}", i), *kind))
            .collect();
        run(&PlayerState::default(), Action::ScanFinished(items))
    }

    #[test]
    fn test_first_sync_loads_and_applies_properties() {
        let state = loaded(&[MediaKind::Audio]);
        let mut binder = PlaybackBinder::new(RecordingOutput::default());

        assert!(binder.sync(&state).is_empty());

        let url = state.library[0].url.clone();
        assert_eq!(
            binder.output_mut().take(),
            vec![
                Call::Load(Some(url.clone())),
                Call::Rate(1.0),
                Call::Volume(1.0),
                Call::Muted(false),
                Call::Pause,
            ]
        );
        assert_eq!(binder.bound(), Some(&url));
    }

    #[test]
    fn test_play_flag_drives_play_and_pause() {
        let state = loaded(&[MediaKind::Audio]);
        let mut binder = PlaybackBinder::new(RecordingOutput::default());
        binder.sync(&state);
        binder.output_mut().take();

        let playing = run(&state, Action::TogglePlay);
        binder.sync(&playing);
        assert_eq!(binder.output_mut().take(), vec![Call::Play]);

        binder.sync(&run(&playing, Action::TogglePlay));
        assert_eq!(binder.output_mut().take(), vec![Call::Pause]);
    }

    #[test]
    fn test_rejected_play_falls_back_to_pause() {
        let state = run(&loaded(&[MediaKind::Audio]), Action::SetPlaying(true));
        let mut binder = PlaybackBinder::new(RecordingOutput {
            reject_play: true,
            ..Default::default()
        });

        assert_eq!(binder.sync(&state), vec![Action::SetPlaying(false)]);
    }

    #[test]
    fn test_property_changes_are_forwarded_alone() {
        let state = loaded(&[MediaKind::Audio]);
        let mut binder = PlaybackBinder::new(RecordingOutput::default());
        binder.sync(&state);
        binder.output_mut().take();

        let faster = run(&state, Action::SetPlaybackRate(1.5));
        binder.sync(&faster);
        assert_eq!(binder.output_mut().take(), vec![Call::Rate(1.5)]);

        let muted = run(&faster, Action::ToggleMute);
        binder.sync(&muted);
        assert_eq!(binder.output_mut().take(), vec![Call::Muted(true)]);

        let quieter = run(&muted, Action::SetVolume(0.25));
        binder.sync(&quieter);
        assert_eq!(binder.output_mut().take(), vec![Call::Volume(0.25), Call::Muted(false)]);
    }

    #[test]
    fn test_focus_change_reloads_and_plays() {
        let state = loaded(&[MediaKind::Audio, MediaKind::Audio]);
        let mut binder = PlaybackBinder::new(RecordingOutput::default());
        binder.sync(&state);
        binder.output_mut().take();

        let next = run(&state, Action::PlayNext);
        binder.sync(&next);

        let calls = binder.output_mut().take();
        assert_eq!(calls.first(), Some(&Call::Load(Some(next.library[1].url.clone()))));
        assert_eq!(calls.last(), Some(&Call::Play));
    }

    #[test]
    fn test_rewind_seeks_to_zero() {
        let state = run(&loaded(&[MediaKind::Audio]), Action::SetPlaying(true));
        let mut binder = PlaybackBinder::new(RecordingOutput::default());
        binder.sync(&state);
        binder.output_mut().take();

        binder.sync(&run(&state, Action::Stop));
        assert_eq!(binder.output_mut().take(), vec![Call::Seek(0.0), Call::Pause]);
    }

    #[test]
    fn test_clearing_unbinds() {
        let state = loaded(&[MediaKind::Audio]);
        let mut binder = PlaybackBinder::new(RecordingOutput::default());
        binder.sync(&state);
        binder.output_mut().take();

        binder.sync(&run(&state, Action::ClearLibrary));
        assert_eq!(binder.output_mut().take().first(), Some(&Call::Load(None)));
        assert_eq!(binder.bound(), None);
    }

    #[test]
    fn test_pump_translates_events() {
        let state = loaded(&[MediaKind::Audio, MediaKind::Audio]);
        let mut binder = PlaybackBinder::new(RecordingOutput::default());
        binder.output_mut().events = vec![
            OutputEvent::TimeUpdate { current_time: 1.0, duration: 9.0 },
            OutputEvent::Ended,
        ];

        assert_eq!(
            binder.pump(&state),
            vec![Action::Progress { current_time: 1.0, duration: 9.0 }, Action::PlayNext]
        );
    }

    #[test]
    fn test_ended_in_single_mode_restarts() {
        let mut state = loaded(&[MediaKind::Audio, MediaKind::Audio]);
        state.queue_mode = QueueMode::Single;
        let mut binder = PlaybackBinder::new(RecordingOutput::default());
        binder.output_mut().events = vec![OutputEvent::Ended];

        assert!(binder.pump(&state).is_empty());
        assert_eq!(binder.output_mut().take(), vec![Call::Seek(0.0), Call::Play]);
    }

    #[test]
    fn test_frame_affordances_need_video() {
        let audio = loaded(&[MediaKind::Audio]);
        let mut binder = PlaybackBinder::new(RecordingOutput {
            frame: Some(Frame { width: 1, height: 1, rgba: vec![0, 0, 0, 255] }),
            ..Default::default()
        });
        assert!(matches!(binder.picture_in_picture(&audio), Err(OutputError::NoFrame)));

        let video = loaded(&[MediaKind::Video]);
        assert!(binder.picture_in_picture(&video).is_ok());

        binder.output_mut().frame = None;
        assert!(matches!(binder.picture_in_picture(&video), Err(OutputError::NoFrame)));
    }

    #[test]
    fn test_snapshot_writes_png() {
        let dir = tempdir().unwrap();
        let video = loaded(&[MediaKind::Video]);
        let binder = PlaybackBinder::new(RecordingOutput {
            frame: Some(Frame { width: 2, height: 1, rgba: vec![255, 0, 0, 255, 0, 255, 0, 255] }),
            ..Default::default()
        });

        let path = binder.snapshot(&video, dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("onlyplayer-frame-"));
        assert!(name.ends_with(".png"));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_snapshot_rejects_bad_buffer() {
        let dir = tempdir().unwrap();
        let video = loaded(&[MediaKind::Video]);
        let binder = PlaybackBinder::new(RecordingOutput {
            frame: Some(Frame { width: 4, height: 4, rgba: vec![0; 3] }),
            ..Default::default()
        });
        assert!(matches!(binder.snapshot(&video, dir.path()), Err(OutputError::Encode(_))));
    }

    #[test]
    fn test_snapshot_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(snapshot_file_name(at), "onlyplayer-frame-2024-03-09T14-05-07.000Z.png");
    }
}
