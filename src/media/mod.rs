//! Media element seam
//!
//! The playback core drives decode paths through the `MediaElement` trait.
//! An element owns one decode of one source and reports progress through
//! polled events; the host drives time cooperatively via `tick`, so there are
//! no callbacks and no threads — everything mutates on the caller's thread.
//!
//! The decoded sample stream behind an element is a single-consumption
//! resource: `capture_stream` hands it out exactly once per element lifetime
//! and fails with `StreamAlreadyCaptured` afterwards. This is why the player
//! keeps a second (shadow) element around for the processing graph instead of
//! attaching the graph to the audible primary.

pub mod file;
pub mod mock;

pub use file::{FileElement, FileFactory};
pub use mock::{MockElement, MockFactory, MockScript};

use crate::error::{ClaroError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Asynchronous notifications from a decode path, drained via `poll_events`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Duration is known; the element is seekable from here on
    MetadataLoaded { duration: f64 },
    /// Furthest contiguous buffered range end advanced (seconds)
    Progress { buffered_to: f64 },
    /// Enough is decoded to start playback and to host a processing graph
    CanPlay,
    /// Playback reached the end of the source
    Ended,
    /// Load or decode failed; the element is unusable for this source
    Error { reason: String },
}

/// One decode path of one source.
///
/// Object-safe so primary and shadow paths can be held as `Box<dyn
/// MediaElement>` regardless of backend.
pub trait MediaElement {
    /// Begin loading a source. Completion or failure arrives via events.
    fn load(&mut self, uri: &str);

    /// Start playback from the current position.
    ///
    /// Fails if the element has no loaded source; the caller decides whether
    /// that is user-visible (primary) or swallowed (shadow mirror).
    fn play(&mut self) -> Result<()>;

    /// Halt playback, keeping the current position.
    fn pause(&mut self);

    /// Move the playhead. Values outside the source are clamped by the element.
    fn set_position(&mut self, secs: f64);

    /// Current playhead position in seconds.
    fn position(&self) -> f64;

    /// Source duration, `None` until metadata has loaded.
    fn duration(&self) -> Option<f64>;

    /// Furthest contiguous buffered range end, in seconds.
    fn buffered_to(&self) -> f64;

    /// Set output volume `[0, 1]`.
    fn set_volume(&mut self, volume: f64);

    /// Mute or unmute output.
    fn set_muted(&mut self, muted: bool);

    /// Whether the playhead is currently advancing.
    fn is_playing(&self) -> bool;

    /// Cooperative clock: advance element time by `dt`.
    ///
    /// While playing, the position advances (never past duration; reaching
    /// duration emits `Ended` and stops). Load/buffer progress is also staged
    /// from here.
    fn tick(&mut self, dt: Duration);

    /// Drain pending events in the order they occurred.
    fn poll_events(&mut self) -> Vec<MediaEvent>;

    /// Capture the decoded sample stream for graph processing.
    ///
    /// Single-consumption: succeeds at most once per element. A second call
    /// fails with `StreamAlreadyCaptured` for the rest of the element's life.
    fn capture_stream(&mut self) -> Result<MediaStream>;
}

/// Creates independent decode paths for the same source.
///
/// The player needs two (primary + shadow), so element construction is a
/// factory concern rather than a constructor call on a concrete type.
pub trait ElementFactory {
    fn create(&self) -> Box<dyn MediaElement>;
}

/// Decoded audio handle captured from an element.
///
/// Mono-mixed samples shared with the element that produced them; the graph
/// pulls blocks by position so filter state survives seeks without copies.
#[derive(Debug, Clone)]
pub struct MediaStream {
    sample_rate: u32,
    samples: Arc<Vec<f32>>,
}

impl MediaStream {
    pub fn new(sample_rate: u32, samples: Arc<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stream length in seconds.
    pub fn len_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Read samples starting at `position_secs` into `out`.
    ///
    /// Returns the number of samples written; short reads happen at the end
    /// of the stream. Positions past the end read zero samples.
    pub fn read_at(&self, position_secs: f64, out: &mut [f32]) -> usize {
        let start = (position_secs.max(0.0) * self.sample_rate as f64) as usize;
        if start >= self.samples.len() {
            return 0;
        }
        let available = self.samples.len() - start;
        let n = out.len().min(available);
        out[..n].copy_from_slice(&self.samples[start..start + n]);
        n
    }
}

/// Guard for the single-consumption constraint on an element's stream.
///
/// Attach-or-fail, never retried: once taken (or once the element failed),
/// no further capture can succeed.
#[derive(Debug, Default)]
pub struct StreamSlot {
    stream: Option<MediaStream>,
    taken: bool,
}

impl StreamSlot {
    /// Arm the slot with a freshly decoded stream.
    pub fn fill(&mut self, stream: MediaStream) {
        if !self.taken {
            self.stream = Some(stream);
        }
    }

    /// Take the stream, at most once.
    pub fn take(&mut self) -> Result<MediaStream> {
        if self.taken {
            return Err(ClaroError::StreamAlreadyCaptured);
        }
        match self.stream.take() {
            Some(stream) => {
                self.taken = true;
                Ok(stream)
            }
            None => Err(ClaroError::StreamUnavailable {
                reason: "no source decoded".to_string(),
            }),
        }
    }
}
