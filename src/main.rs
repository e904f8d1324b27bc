use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::info;
use voicescribe::{is_silent, rms_energy, AudioFile, Config};

/// Voice dictation pipeline: configuration check and audio inspection
#[derive(Parser, Debug)]
#[command(name = "voicescribe", version)]
struct Args {
    /// Configuration file (optional; env vars prefixed VOICESCRIBE_ override)
    #[arg(long, default_value = "config/voicescribe")]
    config: String,

    /// Inspect a WAV file: report duration, energy, and silence verdict
    #[arg(long)]
    inspect: Option<String>,

    /// Emit the inspection report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct InspectReport {
    path: String,
    duration_seconds: f64,
    sample_rate: u32,
    channels: u16,
    rms_energy: f32,
    silent: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("voicescribe v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Audio: {}Hz, {} channel(s)",
        cfg.audio.sample_rate, cfg.audio.channels
    );
    info!(
        "Recording: {:.1}s min, {}s max",
        cfg.recording.min_duration_secs, cfg.recording.max_duration_secs
    );
    info!(
        "Chunking: enabled={}, {}s chunks + {}s overlap ({} + {} samples), poll every {}ms",
        cfg.chunking.enabled,
        cfg.chunking.chunk_duration_secs,
        cfg.chunking.overlap_secs,
        cfg.chunk_size(),
        cfg.overlap(),
        cfg.chunking.poll_interval_ms
    );

    if let Some(path) = args.inspect {
        let audio = AudioFile::open(&path)?;
        let mono = audio.to_mono();
        let energy = rms_energy(&mono);
        let silent = is_silent(&mono, cfg.silence.energy_threshold);

        if args.json {
            let report = InspectReport {
                path: audio.path.clone(),
                duration_seconds: audio.duration_seconds,
                sample_rate: audio.sample_rate,
                channels: audio.channels,
                rms_energy: energy,
                silent,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            info!("Duration: {:.1} seconds", audio.duration_seconds);
            info!("Sample rate: {} Hz", audio.sample_rate);
            info!("Channels: {}", audio.channels);
            info!(
                "RMS energy: {:.4} (silent at threshold {}: {})",
                energy, cfg.silence.energy_threshold, silent
            );
        }
    } else {
        info!("No --inspect file given; configuration check only");
    }

    Ok(())
}
