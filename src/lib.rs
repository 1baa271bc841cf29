//! Claro - Archived-Recording Playback Core
//!
//! Claro plays back archived voice recordings with standard transport
//! controls, annotation-timestamp seeking, and optional real-time noise
//! reduction (gate, high-pass, low-pass) on a parallel wet/dry graph.
//!
//! # Architecture
//!
//! The transport controller ([`Player`]) is the single source of truth. A
//! decoded media stream can feed at most one processing graph, so the graph
//! lives on a secondary "shadow" decode path that replays every transport
//! command; the user-audible primary path never carries the graph and keeps
//! working even when graph construction fails. All timing is cooperative:
//! the host drives `Player::tick` and no threads are spawned.

pub mod dsp;
pub mod error;
pub mod graph;
pub mod media;
pub mod session;
pub mod shadow;
pub mod timestamp;
pub mod tracker;
pub mod transport;

pub use error::{ClaroError, Result};
pub use session::{PlaybackSession, PlaybackState};
pub use timestamp::RawTimestamp;
pub use transport::{Player, PlayerSnapshot};
