use super::binder::{MediaOutput, OutputError, OutputEvent};
use crate::media::{MediaKind, PlayableRef};
use tracing::debug;

/// Output for hosts without an audio device: accepts sources, never plays.
#[derive(Debug, Default)]
pub struct NullOutput {
    source: Option<PlayableRef>,
}

impl MediaOutput for NullOutput {
    fn load(&mut self, source: Option<(&PlayableRef, MediaKind)>) {
        self.source = source.map(|(url, _)| url.clone());
    }

    fn play(&mut self) -> Result<(), OutputError> {
        match &self.source {
            Some(_) => Err(OutputError::Rejected("no audio output available".into())),
            None => Ok(()),
        }
    }

    fn pause(&mut self) {}

    fn seek(&mut self, seconds: f64) {
        debug!("Null output ignoring seek to {:.1}s", seconds);
    }

    fn set_playback_rate(&mut self, _rate: f32) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn poll_events(&mut self) -> Vec<OutputEvent> {
        Vec::new()
    }
}

#[cfg(feature = "audio")]
pub use rodio_output::RodioOutput;

#[cfg(feature = "audio")]
mod rodio_output {
    use super::*;
    use crate::media::ObjectUrls;
    use anyhow::Result;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use std::fs::File;
    use std::io::BufReader;
    use std::rc::Rc;
    use std::time::Duration;
    use tracing::warn;

    /// Audio output on the default sound device.
    ///
    /// Video sources are accepted but refuse to play: there is no surface to
    /// render them on.
    pub struct RodioOutput {
        _stream: OutputStream,
        stream_handle: OutputStreamHandle,
        urls: Rc<ObjectUrls>,
        sink: Option<Sink>,
        source: Option<(PlayableRef, MediaKind)>,
        duration: Option<Duration>,
        playback_rate: f32,
        volume: f32,
        muted: bool,
        ended_reported: bool,
    }

    impl RodioOutput {
        pub fn new(urls: Rc<ObjectUrls>) -> Result<Self> {
            let (stream, stream_handle) = OutputStream::try_default()?;

            Ok(Self {
                _stream: stream,
                stream_handle,
                urls,
                sink: None,
                source: None,
                duration: None,
                playback_rate: 1.0,
                volume: 1.0,
                muted: false,
                ended_reported: false,
            })
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.volume
            }
        }

        /// Decode the current source into a fresh, paused sink.
        fn open_sink(&mut self) -> Result<(), OutputError> {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
            self.ended_reported = false;
            self.duration = None;

            let Some((url, kind)) = self.source.clone() else {
                return Ok(());
            };
            if kind == MediaKind::Video {
                return Err(OutputError::Rejected("video needs a display surface".into()));
            }

            let path = self
                .urls
                .resolve(&url)
                .ok_or_else(|| OutputError::Rejected(format!("{} was revoked", url)))?;
            let file = File::open(&path)?;
            let decoder = Decoder::new(BufReader::new(file)).map_err(|e| {
                OutputError::Rejected(format!("cannot decode {}: {}", path.display(), e))
            })?;
            self.duration = decoder.total_duration();

            let sink = Sink::try_new(&self.stream_handle)
                .map_err(|e| OutputError::Rejected(e.to_string()))?;
            sink.pause();
            sink.set_speed(self.playback_rate);
            sink.set_volume(self.effective_volume());
            sink.append(decoder);
            self.sink = Some(sink);

            Ok(())
        }

        fn is_drained(&self) -> bool {
            self.sink.as_ref().map_or(true, |sink| sink.empty())
        }
    }

    impl MediaOutput for RodioOutput {
        fn load(&mut self, source: Option<(&PlayableRef, MediaKind)>) {
            self.source = source.map(|(url, kind)| (url.clone(), kind));
            if let Err(e) = self.open_sink() {
                // play() reports the failure; loading itself stays silent
                debug!("Source not loaded: {}", e);
            }
        }

        fn play(&mut self) -> Result<(), OutputError> {
            if self.source.is_none() {
                return Ok(());
            }
            if self.is_drained() {
                self.open_sink()?;
            }
            match &self.sink {
                Some(sink) => {
                    sink.play();
                    Ok(())
                }
                None => Err(OutputError::Rejected("nothing decodable is loaded".into())),
            }
        }

        fn pause(&mut self) {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
        }

        fn seek(&mut self, seconds: f64) {
            if self.is_drained() {
                let was_playing = self.sink.as_ref().is_some_and(|sink| !sink.is_paused());
                if let Err(e) = self.open_sink() {
                    warn!("Cannot reopen source for seeking: {}", e);
                    return;
                }
                if was_playing {
                    if let Some(sink) = &self.sink {
                        sink.play();
                    }
                }
            }
            if let Some(sink) = &self.sink {
                if let Err(e) = sink.try_seek(Duration::from_secs_f64(seconds.max(0.0))) {
                    warn!("Seek to {:.1}s failed: {}", seconds, e);
                }
            }
            self.ended_reported = false;
        }

        fn set_playback_rate(&mut self, rate: f32) {
            self.playback_rate = rate;
            if let Some(sink) = &self.sink {
                sink.set_speed(rate);
            }
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
            let effective = self.effective_volume();
            if let Some(sink) = &self.sink {
                sink.set_volume(effective);
            }
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            let effective = self.effective_volume();
            if let Some(sink) = &self.sink {
                sink.set_volume(effective);
            }
        }

        fn poll_events(&mut self) -> Vec<OutputEvent> {
            let Some(sink) = &self.sink else {
                return Vec::new();
            };

            if sink.empty() {
                if self.ended_reported {
                    return Vec::new();
                }
                self.ended_reported = true;
                return vec![OutputEvent::Ended];
            }

            vec![OutputEvent::TimeUpdate {
                current_time: sink.get_pos().as_secs_f64(),
                duration: self.duration.map(|d| d.as_secs_f64()).unwrap_or(0.0),
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{FileHandle, ObjectUrls};
    use std::path::PathBuf;

    #[test]
    fn test_null_output_rejects_loaded_source() {
        let urls = ObjectUrls::new();
        let url = urls.create(&FileHandle::new("a.mp3".into(), PathBuf::from("/a.mp3"), 1));
        let mut output = NullOutput::default();

        assert!(output.play().is_ok());
        output.load(Some((&url, MediaKind::Audio)));
        assert!(matches!(output.play(), Err(OutputError::Rejected(_))));
        assert!(output.poll_events().is_empty());
    }
}
