//! Claro CLI - Archived-Recording Playback Core
//!
//! Headless demonstration driver: loads a WAV recording, runs a scripted
//! transport session against it (seek to an annotation, skip, toggle noise
//! reduction) and prints the observable snapshots.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use claro::media::FileFactory;
use claro::Player;

#[derive(Parser)]
#[command(name = "claro-cli", version, about = "Playback core demo driver")]
struct Cli {
    /// Path to a WAV recording
    recording: String,

    /// Annotation timestamp to jump to (SS, MM:SS, or HH:MM:SS)
    #[arg(long, default_value = "00:00:05")]
    annotation: String,

    /// Enable the noise-reduction graph
    #[arg(long)]
    enhance: bool,

    /// High-pass cutoff in Hz
    #[arg(long, default_value_t = 100.0)]
    high_pass: f64,

    /// Low-pass cutoff in Hz
    #[arg(long, default_value_t = 8000.0)]
    low_pass: f64,

    /// Seconds of playback to simulate
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let tick = Duration::from_millis(250);

    let mut player = Player::new(Box::new(FileFactory));
    player.on_seeked(|secs| println!("seeked -> {:.1}s", secs));

    player.load(&cli.recording, None);
    player.tick(tick);

    let snapshot = player.snapshot();
    if let Some(message) = &snapshot.error_message {
        anyhow::bail!("load failed: {}", message);
    }
    println!(
        "loaded: {} ({:.1}s, graph_available={})",
        cli.recording, snapshot.duration, snapshot.graph_available
    );

    if cli.enhance {
        player.set_enhancement_enabled(true);
        player.set_high_pass_hz(cli.high_pass);
        player.set_low_pass_hz(cli.low_pass);
    }

    player.seek_to_timestamp(cli.annotation.as_str());
    player.play();

    let ticks = (cli.seconds / tick.as_secs_f64()).ceil() as usize;
    for i in 0..ticks {
        player.tick(tick);
        if i % 4 == 3 {
            let s = player.snapshot();
            println!(
                "t={:>6.2}s  state={}  buffered={:.0}%  volume={:.2}",
                s.position,
                s.state,
                s.buffered_fraction * 100.0,
                s.volume
            );
        }
    }

    let s = player.snapshot();
    println!(
        "done: state={} position={:.2}s graph_frames={}",
        s.state,
        s.position,
        player.graph_frames_rendered()
    );
    Ok(())
}
