//! Integration Tests
//!
//! End-to-end tests for the Claro playback core: a WAV fixture played
//! through the file-backed element, plus scripted-element runs for the
//! degradation paths.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use claro::media::{FileFactory, MockFactory, MockScript};
use claro::{PlaybackState, Player};

const TICK: Duration = Duration::from_millis(250);

/// Write a sine-tone WAV fixture and return its path.
fn write_recording(dir: &TempDir, secs: f64) -> String {
    let path = dir.path().join("recording.wav");
    let rate = 8000u32;
    let spec = WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    let n = (secs * rate as f64) as usize;
    for i in 0..n {
        let t = i as f64 / rate as f64;
        let v = (2.0 * std::f64::consts::PI * 220.0 * t).sin();
        writer
            .write_sample((v * i16::MAX as f64 * 0.5) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
    path.display().to_string()
}

fn file_player(uri: &str) -> Player {
    let mut player = Player::new(Box::new(FileFactory));
    player.load(uri, None);
    player.tick(TICK); // metadata, first buffer chunk, CanPlay
    player
}

// === End-to-end transport over a real WAV ===

#[test]
fn test_annotation_jump_and_skip_sequence() {
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 120.0);
    let mut player = file_player(&uri);
    assert_eq!(player.state(), PlaybackState::Ready);
    assert!((player.duration() - 120.0).abs() < 0.01);

    player.seek_to_timestamp("00:01:30");
    assert_eq!(player.position(), 90.0);

    player.skip(-5.0);
    assert_eq!(player.position(), 85.0);

    player.skip(-1000.0);
    assert_eq!(player.position(), 0.0);
}

#[test]
fn test_seek_never_leaves_valid_range() {
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 30.0);
    let mut player = file_player(&uri);

    for raw in ["99:59:59", "-20", "garbage", "0:45", "00:00:10"] {
        player.seek_to_timestamp(raw);
        let position = player.position();
        assert!(
            (0.0..=player.duration()).contains(&position),
            "timestamp {:?} put position at {}",
            raw,
            position
        );
    }
    // Out-of-range clamps to duration, not to zero
    player.seek_to_timestamp("99:59:59");
    assert!((player.position() - player.duration()).abs() < 1e-9);
}

#[test]
fn test_playback_to_end_over_file() {
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 2.0);
    let mut player = file_player(&uri);

    player.play();
    for _ in 0..12 {
        player.tick(TICK);
    }
    assert_eq!(player.state(), PlaybackState::Ended);
    assert!((player.position() - 2.0).abs() < 0.01);
}

#[test]
fn test_seeked_callback_for_annotation_highlighting() {
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 120.0);
    let seen: Rc<RefCell<Vec<f64>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let mut player = file_player(&uri);
    player.on_seeked(move |secs| sink.borrow_mut().push(secs));

    player.seek_to_timestamp("01:00");
    player.skip(5.0);
    assert_eq!(*seen.borrow(), vec![60.0, 65.0]);
}

// === Enhancement over a real WAV ===

#[test]
fn test_enhancement_toggle_preserves_transport() {
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 60.0);
    let mut player = file_player(&uri);
    assert!(player.graph_available());

    player.play();
    player.tick(TICK);
    let position = player.position();
    let state = player.state();

    player.set_enhancement_enabled(true);
    player.set_enhancement_enabled(false);

    assert_eq!(player.state(), state);
    assert_eq!(player.position(), position);
}

#[test]
fn test_live_filter_changes_while_playing() {
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 60.0);
    let mut player = file_player(&uri);

    player.set_enhancement_enabled(true);
    player.play();
    player.tick(TICK);
    let before = player.position();
    let frames_before = player.graph_frames_rendered();

    player.set_high_pass_hz(300.0);
    player.set_low_pass_hz(2000.0);
    assert_eq!(player.state(), PlaybackState::Playing);

    player.tick(TICK);
    // Position progressed continuously across the parameter change
    assert!((player.position() - before - TICK.as_secs_f64()).abs() < 1e-9);
    // And the graph kept rendering
    assert!(player.graph_frames_rendered() > frames_before);
}

#[test]
fn test_graph_renders_wet_audio() {
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 30.0);
    let mut player = file_player(&uri);

    player.set_enhancement_enabled(true);
    player.play();
    for _ in 0..8 {
        player.tick(TICK);
    }
    assert!(player.graph_frames_rendered() > 0);
    let params = player.graph_params();
    assert_eq!(params["enabled"], true);
    assert_eq!(params["active"], true);
}

// === Degradation paths (scripted element) ===

#[test]
fn test_graph_failure_degrades_not_breaks() {
    let factory = MockFactory::new(MockScript {
        fail_capture: true,
        ..MockScript::default()
    });
    let log = factory.log();
    let mut player = Player::new(Box::new(factory));
    player.load("mock://recording", None);
    player.tick(TICK);

    // Enhancement is gone for the session...
    assert!(!player.graph_available());
    player.set_enhancement_enabled(true);
    assert!(!player.enhancement_active());

    // ...but baseline playback is untouched
    player.play();
    assert_eq!(player.state(), PlaybackState::Playing);
    player.tick(TICK);
    assert!(player.position() > 0.0);

    // Volume control falls back to the primary element
    log.lock().unwrap().clear();
    player.set_volume(0.4);
    assert!(log
        .lock()
        .unwrap()
        .contains(&"e0:volume 0.400".to_string()));
}

#[test]
fn test_mute_unmute_restores_volume_exactly() {
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 30.0);
    let mut player = file_player(&uri);

    player.set_volume(0.63);
    player.toggle_mute();
    assert!(player.snapshot().muted);
    player.toggle_mute();
    let snap = player.snapshot();
    assert!(!snap.muted);
    assert_eq!(snap.volume, 0.63);
}

#[test]
fn test_load_failure_is_terminal_and_contained() {
    let mut player = Player::new(Box::new(FileFactory));
    player.load("/nonexistent/recording.wav", None);
    player.tick(TICK);

    let snap = player.snapshot();
    assert_eq!(snap.state, PlaybackState::Errored);
    assert!(snap.error_message.is_some());

    // Errored is terminal: every operation is a defensive no-op
    player.play();
    player.seek_to_timestamp("01:00");
    player.skip(10.0);
    assert_eq!(player.state(), PlaybackState::Errored);
    assert_eq!(player.position(), 0.0);

    // A new session retries cleanly
    let dir = TempDir::new().unwrap();
    let uri = write_recording(&dir, 10.0);
    player.load(&uri, None);
    player.tick(TICK);
    assert_eq!(player.state(), PlaybackState::Ready);
}

#[test]
fn test_buffered_fraction_monotone_over_session() {
    let mut player = Player::new(Box::new(MockFactory::new(MockScript {
        duration: 120.0,
        buffer_chunk_secs: 20.0,
        ..MockScript::default()
    })));
    player.load("mock://recording", None);

    let mut last = 0.0;
    for _ in 0..10 {
        player.tick(TICK);
        let fraction = player.snapshot().buffered_fraction;
        assert!(fraction >= last);
        assert!((0.0..=1.0).contains(&fraction));
        last = fraction;
    }
    assert_eq!(last, 1.0);
}

#[test]
fn test_switching_recordings_releases_and_rebuilds() {
    let dir = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    let first = write_recording(&dir, 20.0);
    let second = write_recording(&other, 40.0);

    let mut player = Player::new(Box::new(FileFactory));
    player.load(&first, None);
    player.tick(TICK);
    player.set_enhancement_enabled(true);
    player.play();
    player.tick(TICK);

    player.load(&second, None);
    player.tick(TICK);
    assert_eq!(player.state(), PlaybackState::Ready);
    assert!((player.duration() - 40.0).abs() < 0.01);
    assert_eq!(player.position(), 0.0);
    // Fresh session, fresh graph
    assert!(player.graph_available());
    assert_eq!(player.graph_params()["active"], true);
}
