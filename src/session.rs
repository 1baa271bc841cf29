//! Playback session state
//!
//! One `PlaybackSession` exists per loaded recording. It is the unit of
//! lifetime for playback state and is owned exclusively by the transport
//! controller; everything else reads it through snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Playback states for a session
///
/// Transitions: `Idle -> Loading -> Ready -> Playing <-> Paused -> Ended`.
/// Any state may transition to `Errored` on load failure; `Errored` is
/// terminal for the session (a new session must be created to retry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No recording selected yet (default state)
    #[default]
    Idle,
    /// Metadata/decode in flight
    Loading,
    /// Loaded and seekable, not yet started
    Ready,
    /// Audio is audible and the position is advancing
    Playing,
    /// Halted at the current position
    Paused,
    /// Position reached the end of the recording
    Ended,
    /// Load or decode failed; terminal for this session
    Errored,
}

impl PlaybackState {
    /// States from which play/pause transport commands are accepted
    pub fn accepts_transport(&self) -> bool {
        matches!(
            self,
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused
        )
    }

    /// States in which seeking is meaningful (duration is known)
    pub fn is_seekable(&self) -> bool {
        matches!(
            self,
            PlaybackState::Ready
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::Ended
        )
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Loading => write!(f, "Loading"),
            PlaybackState::Ready => write!(f, "Ready"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
            PlaybackState::Ended => write!(f, "Ended"),
            PlaybackState::Errored => write!(f, "Errored"),
        }
    }
}

/// Per-recording playback state, one per loaded recording
///
/// Created when a recording is selected, destroyed when the player is
/// dropped or a new recording replaces it.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    /// Unique session identifier
    pub id: Uuid,
    /// Resolved network/file location of the recording
    pub source_uri: String,
    /// Current playback state
    pub state: PlaybackState,
    /// Playback position in seconds, within `[0, duration]`
    pub position: f64,
    /// Recording duration in seconds (0 until metadata arrives, unless hinted)
    pub duration: f64,
    /// Fraction of the recording buffered, `[0, 1]`, monotone while loading
    pub buffered_fraction: f64,
    /// Volume in `[0, 1]`
    pub volume: f64,
    /// Whether output is muted
    pub muted: bool,
    /// Volume to restore on unmute
    pub volume_before_mute: f64,
    /// User-visible message when `state == Errored`
    pub error_message: Option<String>,
}

impl PlaybackSession {
    /// Create a session for a newly selected recording.
    ///
    /// `duration_hint` lets metadata fetched out-of-band (the record screen
    /// usually already knows the length) populate the seek bar before the
    /// element reports its own duration.
    pub fn new(source_uri: impl Into<String>, duration_hint: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_uri: source_uri.into(),
            state: PlaybackState::Loading,
            position: 0.0,
            duration: duration_hint.unwrap_or(0.0).max(0.0),
            buffered_fraction: 0.0,
            volume: 1.0,
            muted: false,
            volume_before_mute: 1.0,
            error_message: None,
        }
    }

    /// Clamp a target position into this session's valid range.
    pub fn clamp_position(&self, secs: f64) -> f64 {
        if self.duration > 0.0 {
            secs.clamp(0.0, self.duration)
        } else {
            secs.max(0.0)
        }
    }

    /// Mark the session errored with a user-visible message. Terminal.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = PlaybackState::Errored;
        self.error_message = Some(message.into());
    }
}
