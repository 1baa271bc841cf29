//! Scripted media element for tests and headless use
//!
//! Behaves like a decode path over a synthetic tone, with failure injection
//! points for everything that can go wrong at the platform boundary: load
//! failure, play rejection, and stream-capture failure. A shared command log
//! lets tests assert cross-element command ordering (primary before shadow).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ElementFactory, MediaElement, MediaEvent, MediaStream, StreamSlot};
use crate::error::{ClaroError, Result};

/// Behaviour script shared by every element a `MockFactory` creates.
#[derive(Debug, Clone)]
pub struct MockScript {
    /// Reported source duration in seconds
    pub duration: f64,
    /// Sample rate of the synthetic stream
    pub sample_rate: u32,
    /// Seconds of source "buffered" per tick
    pub buffer_chunk_secs: f64,
    /// Emit an `Error` event instead of loading
    pub fail_load: bool,
    /// Reject `play()` calls
    pub fail_play: bool,
    /// Fail `capture_stream()` as if the stream were already claimed
    pub fail_capture: bool,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            duration: 120.0,
            sample_rate: 8000,
            buffer_chunk_secs: 30.0,
            fail_load: false,
            fail_play: false,
            fail_capture: false,
        }
    }
}

/// Shared command log, keyed by element index in creation order.
pub type CommandLog = Arc<Mutex<Vec<String>>>;

/// One scripted decode path.
pub struct MockElement {
    script: MockScript,
    tag: String,
    log: Option<CommandLog>,
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

impl MockElement {
    pub fn new(script: MockScript) -> Self {
        Self::tagged(script, "e0", None)
    }

    fn tagged(script: MockScript, tag: &str, log: Option<CommandLog>) -> Self {
        Self {
            script,
            tag: tag.to_string(),
            log,
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

    fn record(&self, command: &str) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(format!("{}:{}", self.tag, command));
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

    fn synth_stream(&self) -> MediaStream {
        let n = (self.script.duration * self.script.sample_rate as f64) as usize;
        let rate = self.script.sample_rate as f64;
        let samples: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f64 / rate;
                (0.5 * (2.0 * std::f64::consts::PI * 240.0 * t).sin()) as f32
            })
            .collect();
        MediaStream::new(self.script.sample_rate, Arc::new(samples))
    }
}

impl MediaElement for MockElement {
    fn load(&mut self, uri: &str) {
        self.record(&format!("load {}", uri));
        if self.script.fail_load {
            self.failed = true;
            self.events.push(MediaEvent::Error {
                reason: format!("scripted load failure for '{}'", uri),
            });
            return;
        }
        self.duration = Some(self.script.duration);
        self.slot.fill(self.synth_stream());
        self.events.push(MediaEvent::MetadataLoaded {
            duration: self.script.duration,
        });
    }

    fn play(&mut self) -> Result<()> {
        self.record("play");
        if self.script.fail_play || self.failed || self.duration.is_none() {
            return Err(ClaroError::StreamUnavailable {
                reason: "scripted play rejection".to_string(),
            });
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.record("pause");
        self.playing = false;
    }

    fn set_position(&mut self, secs: f64) {
        self.record(&format!("seek {:.3}", secs));
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
        self.record(&format!("volume {:.3}", volume));
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(&format!("muted {}", muted));
        self.muted = muted;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn tick(&mut self, dt: Duration) {
        let Some(duration) = self.duration else {
            return;
        };

        if self.buffered_to < duration {
            let was_ready = self.buffered_to > 0.0;
            self.buffered_to = (self.buffered_to + self.script.buffer_chunk_secs).min(duration);
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
        if self.script.fail_capture {
            return Err(ClaroError::StreamAlreadyCaptured);
        }
        self.slot.take()
    }
}

/// Factory producing scripted elements, tagged `e0`, `e1`, ... in creation
/// order so command logs distinguish primary from shadow.
pub struct MockFactory {
    script: MockScript,
    log: CommandLog,
    created: Mutex<usize>,
}

impl MockFactory {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            log: Arc::new(Mutex::new(Vec::new())),
            created: Mutex::new(0),
        }
    }

    /// Handle to the shared command log.
    pub fn log(&self) -> CommandLog {
        Arc::clone(&self.log)
    }

    /// Number of elements created so far (primary = 1, with shadow = 2).
    pub fn created_count(&self) -> usize {
        *self.created.lock().unwrap()
    }
}

impl Default for MockFactory {
    fn default() -> Self {
        Self::new(MockScript::default())
    }
}

impl ElementFactory for MockFactory {
    fn create(&self) -> Box<dyn MediaElement> {
        let mut count = self.created.lock().unwrap();
        let tag = format!("e{}", *count);
        *count += 1;
        Box::new(MockElement::tagged(
            self.script.clone(),
            &tag,
            Some(Arc::clone(&self.log)),
        ))
    }
}
