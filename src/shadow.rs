//! Shadow decode path
//!
//! The processing graph needs a decoded stream, but a stream can feed at
//! most one graph, and the primary path must stay free of the graph so plain
//! playback keeps working even when graph construction fails. The shadow is
//! a second, never-audible decode of the same source, kept in lockstep with
//! the primary by replaying every transport command onto it immediately
//! after the primary command succeeds.
//!
//! Mirroring is best-effort: a shadow failure is logged and swallowed, never
//! propagated into the user-facing path. Any failure latches the shadow as
//! disabled for the rest of the session; the latch resets only because the
//! next session constructs a fresh `ShadowSync`.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;
use crate::media::{ElementFactory, MediaElement, MediaEvent, MediaStream};

/// State the shadow must mirror at creation time.
#[derive(Debug, Clone, Copy)]
pub struct MirrorState {
    pub position: f64,
    pub playing: bool,
    pub volume: f64,
    pub muted: bool,
}

/// Secondary decode path hosting the processing graph. One per session.
pub struct ShadowSync {
    element: Option<Box<dyn MediaElement>>,
    disabled: bool,
}

impl ShadowSync {
    pub fn new() -> Self {
        Self {
            element: None,
            disabled: false,
        }
    }

    /// Whether a shadow element exists.
    pub fn is_attached(&self) -> bool {
        self.element.is_some()
    }

    /// Whether shadow creation has been given up for this session.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Latch the shadow off for the rest of the session.
    pub fn mark_disabled(&mut self) {
        self.disabled = true;
        self.element = None;
    }

    /// Create the shadow path, once, after the primary reports it is ready
    /// for processing. No-op if already attached or disabled.
    pub fn attach(&mut self, factory: &dyn ElementFactory, uri: &str, state: MirrorState) {
        if self.disabled || self.element.is_some() {
            return;
        }

        let mut element = factory.create();
        element.load(uri);

        // Shadow loads are synchronous enough to judge immediately: a load
        // that reports an error here will never become usable.
        let failed = element
            .poll_events()
            .iter()
            .any(|e| matches!(e, MediaEvent::Error { .. }));
        if failed {
            warn!(uri, "shadow path load failed; enhancement disabled for this session");
            self.disabled = true;
            return;
        }

        element.set_position(state.position);
        element.set_volume(state.volume);
        element.set_muted(state.muted);
        if state.playing {
            if let Err(e) = element.play() {
                warn!(error = %e, "shadow play failed during attach");
            }
        }
        debug!(uri, "shadow path attached");
        self.element = Some(element);
    }

    /// Capture the shadow's decoded stream for the graph. On failure the
    /// shadow is latched off.
    pub fn capture_stream(&mut self) -> Result<MediaStream> {
        let result = match &mut self.element {
            Some(element) => element.capture_stream(),
            None => Err(crate::error::ClaroError::StreamUnavailable {
                reason: "no shadow path".to_string(),
            }),
        };
        if result.is_err() {
            self.mark_disabled();
        }
        result
    }

    // Mirrored transport commands, issued strictly after the primary.

    pub fn mirror_play(&mut self) {
        if let Some(element) = &mut self.element {
            if let Err(e) = element.play() {
                warn!(error = %e, "shadow play failed");
            }
        }
    }

    pub fn mirror_pause(&mut self) {
        if let Some(element) = &mut self.element {
            element.pause();
        }
    }

    pub fn mirror_seek(&mut self, secs: f64) {
        if let Some(element) = &mut self.element {
            element.set_position(secs);
        }
    }

    pub fn mirror_volume(&mut self, volume: f64) {
        if let Some(element) = &mut self.element {
            element.set_volume(volume);
        }
    }

    pub fn mirror_mute(&mut self, muted: bool) {
        if let Some(element) = &mut self.element {
            element.set_muted(muted);
        }
    }

    /// Shadow playhead position, used by the graph to pull source blocks.
    pub fn position(&self) -> f64 {
        self.element.as_ref().map_or(0.0, |e| e.position())
    }

    /// Advance the shadow clock. Shadow events are drained and dropped: the
    /// shadow is not user-facing, so its Ended/Progress carry no state.
    pub fn tick(&mut self, dt: Duration) {
        if let Some(element) = &mut self.element {
            element.tick(dt);
            element.poll_events();
        }
    }

    /// Release shadow resources ahead of a source change.
    pub fn release(&mut self) {
        self.element = None;
    }
}

impl Default for ShadowSync {
    fn default() -> Self {
        Self::new()
    }
}
