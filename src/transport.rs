//! Transport controller
//!
//! `Player` is the single source of truth for what playback should be doing.
//! It owns the session, the primary decode path, the shadow path and the
//! processing graph, and it is the only component that mutates playback
//! position directly. Everything downstream (shadow, graph, tracker)
//! observes or replays what happens here.
//!
//! Every public operation is defensive: with no session loaded, or from a
//! state where an operation is invalid, it is a logged no-op. Nothing on
//! this surface panics or returns an error to the caller; primary-path
//! failures surface through `state = Errored` plus a user-visible message,
//! enhancement-path failures degrade silently per the containment policy.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::graph::GraphManager;
use crate::media::{ElementFactory, MediaElement, MediaEvent};
use crate::session::{PlaybackSession, PlaybackState};
use crate::shadow::{MirrorState, ShadowSync};
use crate::timestamp::{resolve, RawTimestamp};
use crate::tracker::ProgressTracker;

/// Observable state republished to the presentation surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub position: f64,
    pub duration: f64,
    pub buffered_fraction: f64,
    pub volume: f64,
    pub muted: bool,
    pub graph_available: bool,
    /// User-visible message when `state == Errored`
    pub error_message: Option<String>,
}

type SeekCallback = Box<dyn FnMut(f64)>;

/// Playback facade over one recording at a time.
pub struct Player {
    factory: Box<dyn ElementFactory>,
    session: Option<PlaybackSession>,
    primary: Option<Box<dyn MediaElement>>,
    shadow: ShadowSync,
    graph: GraphManager,
    tracker: ProgressTracker,
    on_seeked: Option<SeekCallback>,
}

impl Player {
    pub fn new(factory: Box<dyn ElementFactory>) -> Self {
        Self {
            factory,
            session: None,
            primary: None,
            shadow: ShadowSync::new(),
            graph: GraphManager::new(),
            tracker: ProgressTracker::default(),
            on_seeked: None,
        }
    }

    /// Register the seeked callback, invoked with the resolved target
    /// seconds after every seek so annotation lists can highlight the jump.
    pub fn on_seeked(&mut self, callback: impl FnMut(f64) + 'static) {
        self.on_seeked = Some(Box::new(callback));
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Select a recording. Tears down any previous session synchronously
    /// (graph, shadow, primary, in that order) before allocating anything
    /// for the new one.
    pub fn load(&mut self, uri: &str, duration_hint: Option<f64>) {
        // Release order matters: graph nodes detach before the shadow path
        // they are attached to, shadow before primary.
        self.graph = GraphManager::new();
        self.shadow.release();
        self.shadow = ShadowSync::new();
        self.primary = None;

        self.session = Some(PlaybackSession::new(uri, duration_hint));
        self.tracker = ProgressTracker::default();

        let mut primary = self.factory.create();
        primary.load(uri);
        self.primary = Some(primary);
        debug!(uri, "session created, loading");
    }

    /// Cooperative pump: advance element clocks, drain platform events into
    /// session state, keep the shadow and graph fed, and poll progress.
    pub fn tick(&mut self, dt: Duration) {
        let Some(primary) = self.primary.as_mut() else {
            return;
        };

        // Graph pulls from where the shadow was at the start of the interval
        let render_from = self.shadow.position();

        primary.tick(dt);
        let events = primary.poll_events();
        self.shadow.tick(dt);

        for event in events {
            self.handle_event(event);
        }

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return,
        };

        if session.state == PlaybackState::Playing && self.graph.is_active() {
            self.graph.render_elapsed(render_from, dt);
        }

        if let Some(primary) = self.primary.as_deref() {
            if let Some(sample) = self.tracker.poll(dt, primary) {
                if session.state == PlaybackState::Playing
                    || session.state == PlaybackState::Loading
                {
                    session.position = sample.position;
                    session.buffered_fraction = sample.buffered_fraction;
                } else {
                    session.buffered_fraction = sample.buffered_fraction;
                }
            }
        }
    }

    fn handle_event(&mut self, event: MediaEvent) {
        if matches!(event, MediaEvent::CanPlay) {
            self.ensure_processing_path();
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event {
            MediaEvent::MetadataLoaded { duration } => {
                session.duration = duration;
                if session.state == PlaybackState::Loading {
                    session.state = PlaybackState::Ready;
                    debug!(duration, "session ready");
                }
            }
            MediaEvent::Progress { .. } => {
                // Buffered ranges are read by the tracker poll; the event
                // itself carries nothing else we keep.
            }
            // Handled before the session borrow above
            MediaEvent::CanPlay => {}
            MediaEvent::Ended => {
                session.position = session.duration;
                session.state = PlaybackState::Ended;
                self.shadow.mirror_pause();
                debug!("playback ended");
            }
            MediaEvent::Error { reason } => {
                if session.state != PlaybackState::Errored {
                    warn!(%reason, "primary media error");
                    session.fail(reason);
                }
            }
        }
    }

    /// First "ready for processing" signal: create the shadow path and build
    /// the graph, once per session. Any failure latches enhancement off.
    fn ensure_processing_path(&mut self) {
        if self.graph.build_attempted() {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };

        if !self.shadow.is_disabled() {
            self.shadow.attach(
                self.factory.as_ref(),
                &session.source_uri,
                MirrorState {
                    position: session.position,
                    playing: session.state == PlaybackState::Playing,
                    volume: session.volume,
                    muted: session.muted,
                },
            );
        }

        if self.shadow.is_attached() {
            let capture = self.shadow.capture_stream();
            self.graph.build(capture);
        } else {
            // No shadow path means no stream to attach; latch availability
            self.graph.build(Err(crate::error::ClaroError::StreamUnavailable {
                reason: "shadow path unavailable".to_string(),
            }));
        }

        if self.graph.is_active() {
            // Volume authority moves to the graph's master gain
            self.apply_output_volume();
        }
    }

    // ========================================================================
    // Transport commands
    // ========================================================================

    /// Start playback. Valid from `Ready | Paused` (no-op while `Playing`
    /// and from every other state).
    pub fn play(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.state.accepts_transport() {
            debug!(state = %session.state, "play ignored");
            return;
        }
        if session.state == PlaybackState::Playing {
            return;
        }

        let Some(primary) = self.primary.as_mut() else {
            return;
        };
        match primary.play() {
            Ok(()) => {
                session.state = PlaybackState::Playing;
                debug!(position = session.position, "playing");
                self.shadow.mirror_play();
            }
            Err(e) => {
                // Not yet decoded far enough; stay in the current state
                warn!(error = %e, "primary play rejected");
            }
        }
    }

    /// Pause playback. Valid from `Playing` (no-op otherwise).
    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state != PlaybackState::Playing {
            debug!(state = %session.state, "pause ignored");
            return;
        }
        if let Some(primary) = self.primary.as_mut() {
            primary.pause();
        }
        session.state = PlaybackState::Paused;
        debug!(position = session.position, "paused");
        self.shadow.mirror_pause();
    }

    /// Play if paused/ready, pause if playing.
    pub fn toggle(&mut self) {
        match self.state() {
            PlaybackState::Playing => self.pause(),
            _ => self.play(),
        }
    }

    /// Seek to a fraction of the duration, `[0, 1]`.
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.duration <= 0.0 {
            return;
        }
        let target = fraction.clamp(0.0, 1.0) * session.duration;
        self.apply_seek(target);
    }

    /// Jump to an annotation timestamp. Malformed timestamps resolve to the
    /// start of the recording; out-of-range ones clamp to the duration.
    pub fn seek_to_timestamp(&mut self, raw: impl Into<RawTimestamp>) {
        let resolved = resolve(&raw.into());
        self.apply_seek(resolved);
    }

    /// Skip forward/backward by a fixed amount of seconds.
    pub fn skip(&mut self, delta_secs: f64) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let target = session.position + delta_secs;
        self.apply_seek(target);
    }

    fn apply_seek(&mut self, target_secs: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.state.is_seekable() {
            debug!(state = %session.state, "seek ignored");
            return;
        }

        let clamped = session.clamp_position(target_secs);
        if let Some(primary) = self.primary.as_mut() {
            primary.set_position(clamped);
        }
        session.position = clamped;
        // Seeking away from the end re-arms the transport
        if session.state == PlaybackState::Ended {
            session.state = PlaybackState::Paused;
        }
        debug!(target = clamped, "seeked");
        self.shadow.mirror_seek(clamped);

        if let Some(callback) = self.on_seeked.as_mut() {
            callback(target_secs);
        }
    }

    // ========================================================================
    // Volume
    // ========================================================================

    /// Set output volume `[0, 1]`.
    ///
    /// While the graph is active the graph's master gain is the single
    /// authoritative control point; otherwise the primary element is driven
    /// directly. The shadow path receives the identical command either way.
    pub fn set_volume(&mut self, volume: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.volume = volume.clamp(0.0, 1.0);
        if session.muted {
            // Takes effect on unmute
            session.volume_before_mute = session.volume;
        }
        self.apply_output_volume();
    }

    /// Mute, or unmute restoring exactly the pre-mute volume.
    pub fn toggle_mute(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.muted {
            session.muted = false;
            session.volume = session.volume_before_mute;
        } else {
            session.volume_before_mute = session.volume;
            session.muted = true;
        }
        self.apply_output_volume();
    }

    fn apply_output_volume(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if self.graph.is_active() {
            let effective = if session.muted { 0.0 } else { session.volume };
            self.graph.set_master_volume(effective);
        } else if let Some(primary) = self.primary.as_mut() {
            primary.set_volume(session.volume);
            primary.set_muted(session.muted);
        }
        self.shadow.mirror_volume(session.volume);
        self.shadow.mirror_mute(session.muted);
    }

    // ========================================================================
    // Enhancement
    // ========================================================================

    /// Switch noise reduction on or off. No-op (reported unsupported once)
    /// when the graph is unavailable for this session.
    pub fn set_enhancement_enabled(&mut self, enabled: bool) {
        if self.session.is_none() {
            return;
        }
        self.graph.set_enabled(enabled);
    }

    /// Move the high-pass cutoff (Hz, clamped to its range), live.
    pub fn set_high_pass_hz(&mut self, hz: f64) {
        if self.session.is_none() {
            return;
        }
        self.graph.set_high_pass(hz);
    }

    /// Move the low-pass cutoff (Hz, clamped to its range), live.
    pub fn set_low_pass_hz(&mut self, hz: f64) {
        if self.session.is_none() {
            return;
        }
        self.graph.set_low_pass(hz);
    }

    // ========================================================================
    // Observable state
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map_or(PlaybackState::Idle, |s| s.state)
    }

    pub fn position(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |s| s.position)
    }

    pub fn duration(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |s| s.duration)
    }

    pub fn graph_available(&self) -> bool {
        self.graph.graph_available()
    }

    /// Whether the graph exists and is processing the shadow stream.
    pub fn enhancement_active(&self) -> bool {
        self.graph.is_active() && self.graph.is_enabled()
    }

    /// Graph parameters as JSON, for diagnostics surfaces.
    pub fn graph_params(&self) -> serde_json::Value {
        self.graph.params()
    }

    /// Frames pushed through the graph this session (diagnostics/tests).
    pub fn graph_frames_rendered(&self) -> u64 {
        self.graph.frames_rendered()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        match self.session.as_ref() {
            Some(session) => PlayerSnapshot {
                state: session.state,
                position: session.position,
                duration: session.duration,
                buffered_fraction: session.buffered_fraction,
                volume: session.volume,
                muted: session.muted,
                graph_available: self.graph.graph_available(),
                error_message: session.error_message.clone(),
            },
            None => PlayerSnapshot {
                state: PlaybackState::Idle,
                position: 0.0,
                duration: 0.0,
                buffered_fraction: 0.0,
                volume: 1.0,
                muted: false,
                graph_available: self.graph.graph_available(),
                error_message: None,
            },
        }
    }
}
