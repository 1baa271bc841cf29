//! WAV-backed media element
//!
//! Decodes a local WAV file with hound and replays it through the cooperative
//! element contract: load decodes eagerly, but the element still reports
//! readiness asynchronously through staged `Progress` events so the transport
//! sees the same event shape a network-backed element would produce.
//!
//! Network fetch is out of scope for the core; a host with HTTP-addressable
//! recordings supplies its own `ElementFactory` over its fetch/cache layer.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use super::{ElementFactory, MediaElement, MediaEvent, MediaStream, StreamSlot};
use crate::error::{ClaroError, Result};

/// How much source time each staged progress event adds while "buffering".
/// Local decode is instant; the staging keeps buffered_fraction observable
/// as a ramp instead of jumping straight to 1.0.
const BUFFER_CHUNK_SECS: f64 = 15.0;

/// One WAV decode path.
pub struct FileElement {
    duration: Option<f64>,
    position: f64,
    playing: bool,
    volume: f64,
    muted: bool,
    buffered_to: f64,
    events: Vec<MediaEvent>,
    slot: StreamSlot,
    failed: bool,
}

impl FileElement {
    pub fn new() -> Self {
        Self {
            duration: None,
            position: 0.0,
            playing: false,
            volume: 1.0,
            muted: false,
            buffered_to: 0.0,
            events: Vec::new(),
            slot: StreamSlot::default(),
            failed: false,
        }
    }

    /// Current element volume as last applied by the host.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Current element mute flag as last applied by the host.
    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Decode the WAV into a mono-mixed f32 stream.
    fn decode(path: &Path) -> Result<MediaStream> {
        if !path.exists() {
            return Err(ClaroError::Load {
                uri: path.display().to_string(),
                reason: "file not found".to_string(),
                source: None,
            });
        }

        let mut reader = WavReader::open(path).map_err(|e| ClaroError::Load {
            uri: path.display().to_string(),
            reason: format!("not a readable WAV file: {}", e),
            source: None,
        })?;

        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 || channels > 2 {
            return Err(ClaroError::UnsupportedFormat {
                format: format!("{}-channel audio (only mono/stereo supported)", channels),
            });
        }

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| decode_error(path, e))?,
            (SampleFormat::Int, bits) => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| decode_error(path, e))?
            }
            (format, bits) => {
                return Err(ClaroError::UnsupportedFormat {
                    format: format!("{:?} {}-bit", format, bits),
                });
            }
        };

        // Mono mix: the graph and the element clock only need one channel
        let samples: Vec<f32> = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(2)
                .map(|frame| (frame[0] + frame[1]) * 0.5)
                .collect()
        };

        Ok(MediaStream::new(spec.sample_rate, Arc::new(samples)))
    }
}

fn decode_error(path: &Path, e: hound::Error) -> ClaroError {
    ClaroError::Load {
        uri: path.display().to_string(),
        reason: format!("sample decode failed: {}", e),
        source: None,
    }
}

impl Default for FileElement {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement for FileElement {
    fn load(&mut self, uri: &str) {
        match Self::decode(Path::new(uri)) {
            Ok(stream) => {
                let duration = stream.len_seconds();
                self.duration = Some(duration);
                self.slot.fill(stream);
                self.events.push(MediaEvent::MetadataLoaded { duration });
                debug!(uri, duration, "wav element loaded");
            }
            Err(e) => {
                self.failed = true;
                self.events.push(MediaEvent::Error {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn play(&mut self) -> Result<()> {
        if self.failed || self.duration.is_none() {
            return Err(ClaroError::StreamUnavailable {
                reason: "no loaded source".to_string(),
            });
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_position(&mut self, secs: f64) {
        let max = self.duration.unwrap_or(0.0);
        self.position = secs.clamp(0.0, max);
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn buffered_to(&self) -> f64 {
        self.buffered_to
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn tick(&mut self, dt: Duration) {
        let Some(duration) = self.duration else {
            return;
        };

        // Stage buffer progress until the whole file is "buffered"
        if self.buffered_to < duration {
            let was_ready = self.buffered_to > 0.0;
            self.buffered_to = (self.buffered_to + BUFFER_CHUNK_SECS).min(duration);
            self.events.push(MediaEvent::Progress {
                buffered_to: self.buffered_to,
            });
            if !was_ready {
                self.events.push(MediaEvent::CanPlay);
            }
        }

        if self.playing {
            self.position += dt.as_secs_f64();
            if self.position >= duration {
                self.position = duration;
                self.playing = false;
                self.events.push(MediaEvent::Ended);
            }
        }
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.events)
    }

    fn capture_stream(&mut self) -> Result<MediaStream> {
        self.slot.take()
    }
}

/// Factory producing independent WAV decode paths.
#[derive(Debug, Clone, Default)]
pub struct FileFactory;

impl ElementFactory for FileFactory {
    fn create(&self) -> Box<dyn MediaElement> {
        Box::new(FileElement::new())
    }
}
