//! Noise-reduction signal graph
//!
//! Fixed topology, built once per session on the shadow path's captured
//! stream:
//!
//! ```text
//! source -> gain(master) -> gate -> highpass -> lowpass -> gain(wet) -> sink
//!                        \_______________________________ gain(dry) _/
//! ```
//!
//! Exactly one of the wet/dry entry gains sits at full level at any time;
//! enabling or disabling enhancement flips them through a short ramp (the
//! atomic, click-free switch). Filter cutoffs and the master level change in
//! place; no node is ever disconnected or rebuilt after `build`.
//!
//! Build is attach-or-fail, never retried: if the stream capture or graph
//! construction fails once, the manager latches `graph_available = false`
//! for the rest of the session and every enhancement call degrades to a
//! logged no-op.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::dsp::{Biquad, FilterMode, GateNode, GateParams, RampedGain};
use crate::error::Result;
use crate::media::MediaStream;

// Parameter ranges
pub const HIGH_PASS_MIN_HZ: f64 = 20.0;
pub const HIGH_PASS_MAX_HZ: f64 = 500.0;
pub const LOW_PASS_MIN_HZ: f64 = 1000.0;
pub const LOW_PASS_MAX_HZ: f64 = 20000.0;

// Defaults for voice cleanup
const DEFAULT_HIGH_PASS_HZ: f64 = 100.0;
const DEFAULT_LOW_PASS_HZ: f64 = 8000.0;

/// Live-tunable graph parameters.
#[derive(Debug, Clone, Copy)]
pub struct GraphParams {
    pub high_pass_hz: f64,
    pub low_pass_hz: f64,
    pub enabled: bool,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            high_pass_hz: DEFAULT_HIGH_PASS_HZ,
            low_pass_hz: DEFAULT_LOW_PASS_HZ,
            enabled: false,
        }
    }
}

/// The wired node graph. Exists only after a successful build.
struct SignalGraph {
    stream: MediaStream,
    master: RampedGain,
    gate: GateNode,
    high_pass: Biquad,
    low_pass: Biquad,
    wet_entry: RampedGain,
    dry_entry: RampedGain,
    /// Last rendered output block (the in-crate sink)
    sink: Vec<f32>,
    frames_rendered: u64,
    wet_scratch: Vec<f32>,
}

impl SignalGraph {
    fn build(stream: MediaStream, params: &GraphParams) -> Self {
        let sample_rate = stream.sample_rate() as f64;

        let mut master = RampedGain::new(1.0);
        let mut gate = GateNode::new(GateParams::default());
        let mut high_pass = Biquad::new(FilterMode::HighPass, params.high_pass_hz);
        let mut low_pass = Biquad::new(FilterMode::LowPass, params.low_pass_hz);
        let (wet_level, dry_level) = if params.enabled { (1.0, 0.0) } else { (0.0, 1.0) };
        let mut wet_entry = RampedGain::new(wet_level);
        let mut dry_entry = RampedGain::new(dry_level);

        master.prepare(sample_rate);
        gate.prepare(sample_rate);
        high_pass.prepare(sample_rate);
        low_pass.prepare(sample_rate);
        wet_entry.prepare(sample_rate);
        dry_entry.prepare(sample_rate);

        Self {
            stream,
            master,
            gate,
            high_pass,
            low_pass,
            wet_entry,
            dry_entry,
            sink: Vec::new(),
            frames_rendered: 0,
            wet_scratch: Vec::new(),
        }
    }

    /// Pull `frames` samples at `position_secs` and run them through the
    /// wet and dry paths into the sink.
    fn render(&mut self, position_secs: f64, frames: usize) {
        self.sink.resize(frames, 0.0);
        self.sink.fill(0.0);
        let n = self.stream.read_at(position_secs, &mut self.sink);
        let dry = &mut self.sink[..n];

        self.master.process(dry);

        // Wet path works on a copy; dry continues in place
        self.wet_scratch.clear();
        self.wet_scratch.extend_from_slice(dry);
        let wet = &mut self.wet_scratch[..];
        self.gate.process(wet);
        self.high_pass.process(wet);
        self.low_pass.process(wet);
        self.wet_entry.process(wet);

        self.dry_entry.process(dry);
        for (out, w) in dry.iter_mut().zip(wet.iter()) {
            *out += *w;
        }

        self.frames_rendered += n as u64;
    }
}

/// Owns the graph and the session-scoped availability latch.
pub struct GraphManager {
    graph: Option<SignalGraph>,
    params: GraphParams,
    master_level: f32,
    /// False only after a failed build attempt; latched for the session
    available: bool,
    attempted: bool,
    unavailable_reason: Option<String>,
    /// Unsupported-call warning is logged once, not per call
    reported_unsupported: bool,
}

impl GraphManager {
    pub fn new() -> Self {
        Self {
            graph: None,
            params: GraphParams::default(),
            master_level: 1.0,
            available: true,
            attempted: false,
            unavailable_reason: None,
            reported_unsupported: false,
        }
    }

    /// Attempt to attach the captured stream and wire the graph.
    ///
    /// One attempt per session: a failed capture or a repeated call latches
    /// unavailability permanently. Returns whether the graph is active.
    pub fn build(&mut self, capture: Result<MediaStream>) -> bool {
        if self.attempted {
            return self.is_active();
        }
        self.attempted = true;

        match capture {
            Ok(stream) => {
                let mut graph = SignalGraph::build(stream, &self.params);
                graph.master.set_level(self.master_level);
                debug!(
                    sample_rate = graph.stream.sample_rate(),
                    "signal graph built"
                );
                self.graph = Some(graph);
                true
            }
            Err(e) => {
                self.available = false;
                self.unavailable_reason = Some(e.to_string());
                warn!(reason = %e, "signal graph unavailable; enhancement disabled for this session");
                false
            }
        }
    }

    /// Whether a build succeeded and the graph is processing.
    pub fn is_active(&self) -> bool {
        self.graph.is_some()
    }

    /// Whether enhancement is still offered for this session.
    ///
    /// True until a build attempt fails; false is permanent for the session.
    pub fn graph_available(&self) -> bool {
        self.available
    }

    /// Whether a build has been attempted (success or failure).
    pub fn build_attempted(&self) -> bool {
        self.attempted
    }

    /// Diagnostic reason when unavailable.
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.params.enabled
    }

    /// Switch the wet/dry mix. No reconnects; only entry gain targets move.
    pub fn set_enabled(&mut self, on: bool) {
        if !self.guard_available("set_enabled") {
            return;
        }
        self.params.enabled = on;
        if let Some(graph) = &mut self.graph {
            let (wet, dry) = if on { (1.0, 0.0) } else { (0.0, 1.0) };
            graph.wet_entry.set_level(wet);
            graph.dry_entry.set_level(dry);
            debug!(enabled = on, "wet/dry mix switched");
        }
    }

    /// Move the high-pass cutoff, clamped to its range. Live, no rebuild.
    pub fn set_high_pass(&mut self, hz: f64) {
        if !self.guard_available("set_high_pass") {
            return;
        }
        self.params.high_pass_hz = hz.clamp(HIGH_PASS_MIN_HZ, HIGH_PASS_MAX_HZ);
        if let Some(graph) = &mut self.graph {
            graph.high_pass.set_frequency(self.params.high_pass_hz);
        }
    }

    /// Move the low-pass cutoff, clamped to its range. Live, no rebuild.
    pub fn set_low_pass(&mut self, hz: f64) {
        if !self.guard_available("set_low_pass") {
            return;
        }
        self.params.low_pass_hz = hz.clamp(LOW_PASS_MIN_HZ, LOW_PASS_MAX_HZ);
        if let Some(graph) = &mut self.graph {
            graph.low_pass.set_frequency(self.params.low_pass_hz);
        }
    }

    /// The authoritative volume point while the graph is active.
    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_level = volume.clamp(0.0, 1.0) as f32;
        if let Some(graph) = &mut self.graph {
            graph.master.set_level(self.master_level);
        }
    }

    /// Render the next block from the shadow position.
    pub fn render(&mut self, position_secs: f64, frames: usize) {
        if let Some(graph) = &mut self.graph {
            if frames > 0 {
                graph.render(position_secs, frames);
            }
        }
    }

    /// Render however many frames `dt` spans at the stream's sample rate.
    pub fn render_elapsed(&mut self, position_secs: f64, dt: std::time::Duration) {
        if let Some(graph) = &mut self.graph {
            let frames = (dt.as_secs_f64() * graph.stream.sample_rate() as f64) as usize;
            if frames > 0 {
                graph.render(position_secs, frames);
            }
        }
    }

    /// Total frames pushed through the graph this session.
    pub fn frames_rendered(&self) -> u64 {
        self.graph.as_ref().map_or(0, |g| g.frames_rendered)
    }

    /// Last rendered sink block (for hosts that tap the processed output).
    pub fn sink(&self) -> &[f32] {
        self.graph.as_ref().map_or(&[], |g| g.sink.as_slice())
    }

    /// Current parameters as JSON (UI/diagnostics surface).
    pub fn params(&self) -> Value {
        json!({
            "enabled": self.params.enabled,
            "high_pass_hz": self.params.high_pass_hz,
            "low_pass_hz": self.params.low_pass_hz,
            "master_volume": self.master_level,
            "graph_available": self.available,
            "active": self.is_active(),
            "unavailable_reason": self.unavailable_reason.as_deref(),
        })
    }

    fn guard_available(&mut self, op: &str) -> bool {
        if self.available {
            return true;
        }
        if !self.reported_unsupported {
            warn!(op, "enhancement unsupported for this session");
            self.reported_unsupported = true;
        }
        false
    }
}

impl Default for GraphManager {
    fn default() -> Self {
        Self::new()
    }
}
