// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use recital::config::{validate_config, PlayerConfig};
use recital::music::{note_name, PitchClass};
use recital::recording::wire;
use recital::{smf, Anomaly, Outputs, Player, Recording};

#[derive(Parser, Debug)]
#[command(
    name = "recital",
    version,
    about = "Decode, convert and replay recorded piano performances"
)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a recorder wire capture and write it as a MIDI file
    Ingest {
        /// Raw 5-byte record stream
        input: PathBuf,
        /// MIDI file to write (defaults to the input with a .mid extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the recording as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Wall-clock time the performance was recorded
        #[arg(long)]
        recorded_at: Option<String>,
        /// Recording title
        #[arg(long)]
        title: Option<String>,
    },
    /// Print a recording's statistics
    Info {
        /// .mid file, .json recording, or raw wire capture
        file: PathBuf,
        /// List the paired note intervals
        #[arg(long)]
        notes: bool,
    },
    /// Encode a JSON recording as a MIDI file
    Export {
        /// Recording as JSON
        json: PathBuf,
        /// MIDI file to write
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Play a recording through the configured outputs
    Play {
        /// .mid file, .json recording, or raw wire capture
        file: PathBuf,
        /// Player configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List available MIDI destinations
    ListMidi,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "recital=info",
        1 => "recital=debug",
        _ => "recital=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Load a recording from any supported file, with decoder anomalies
fn load_recording(path: &Path) -> Result<(Recording, Vec<Anomaly>)> {
    if has_extension(path, &["mid", "midi"]) {
        let decoded = smf::import(path)?;
        return Ok((decoded.recording, decoded.anomalies));
    }

    if has_extension(path, &["json"]) {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording: {}", path.display()))?;
        let recording = Recording::from_json(&contents)
            .with_context(|| format!("Failed to load recording: {}", path.display()))?;
        return Ok((recording, Vec::new()));
    }

    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read wire capture: {}", path.display()))?;
    let recording = wire::decode_recording(&bytes, None)
        .with_context(|| format!("Failed to decode wire capture: {}", path.display()))?;
    Ok((recording, Vec::new()))
}

fn write_json(recording: &Recording, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(recording).context("Failed to serialize recording")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn ingest(
    input: &Path,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    recorded_at: Option<String>,
    title: Option<String>,
) -> Result<()> {
    let bytes = fs::read(input)
        .with_context(|| format!("Failed to read wire capture: {}", input.display()))?;
    let mut recording = wire::decode_recording(&bytes, recorded_at)
        .with_context(|| format!("Failed to decode wire capture: {}", input.display()))?;
    recording.title = title;

    let output = output.unwrap_or_else(|| input.with_extension("mid"));
    smf::export(&recording, &output)
        .with_context(|| format!("Failed to write MIDI file: {}", output.display()))?;
    info!(
        "Wrote {} messages ({:.1}s) to {}",
        recording.messages.len(),
        recording.duration(),
        output.display()
    );

    if let Some(path) = json {
        write_json(&recording, &path)?;
        info!("Wrote recording JSON to {}", path.display());
    }

    Ok(())
}

fn print_info(recording: &Recording, anomalies: &[Anomaly], show_notes: bool) {
    let meta = &recording.metadata;

    if let Some(ref title) = recording.title {
        println!("Title:            {}", title);
    }
    if let Some(ref recorded_at) = recording.recorded_at {
        println!("Recorded:         {}", recorded_at);
    }
    println!("Duration:         {:.3}s", meta.duration);
    println!("Messages:         {}", meta.message_count);
    println!("Notes:            {}", meta.note_count);
    println!("Average velocity: {:.1}", meta.average_velocity);
    println!("Velocity spread:  {:.1}", meta.velocity_spread);
    println!("Pitch classes:");
    for pc in PitchClass::ALL {
        let fraction = meta.semitones[pc.index()];
        println!(
            "  {:<2} {:>5.1}% {}",
            pc,
            fraction * 100.0,
            "#".repeat((fraction * 40.0).round() as usize)
        );
    }

    let intervals = if show_notes {
        Some(recording.notes())
    } else {
        None
    };

    let pairing_anomalies = intervals.iter().flat_map(|i| i.anomalies.iter());
    let all_anomalies: Vec<&Anomaly> = anomalies.iter().chain(pairing_anomalies).collect();
    if !all_anomalies.is_empty() {
        println!("Anomalies:");
        for anomaly in all_anomalies {
            println!("  {}", anomaly);
        }
    }

    if let Some(mut intervals) = intervals {
        intervals
            .notes
            .sort_by(|a, b| a.on_time.total_cmp(&b.on_time).then(a.pitch.cmp(&b.pitch)));
        println!("Note intervals:");
        for note in &intervals.notes {
            println!(
                "  {:>9.3}s  {:>9.3}s  {:<4} vel {:>3}",
                note.on_time,
                note.off_time.unwrap_or(note.on_time),
                note_name(note.pitch),
                note.velocity
            );
        }
    }
}

fn export(json: &Path, output: &Path) -> Result<()> {
    let (recording, _) = load_recording(json)?;
    smf::export(&recording, output)
        .with_context(|| format!("Failed to write MIDI file: {}", output.display()))?;
    info!("Wrote {}", output.display());
    Ok(())
}

fn build_outputs(config: &PlayerConfig) -> Result<Outputs> {
    #[allow(unused_mut)]
    let mut outputs = Outputs::new().with_channel(config.channel_index());

    #[cfg(feature = "midi-device")]
    if let Some(ref name) = config.midi_output {
        let midi = recital::midi::MidirOutput::new_by_name(name)?;
        info!("MIDI output: {} (channel {})", midi.name(), config.midi_channel);
        outputs.midi = Some(Box::new(midi));
    }

    #[cfg(feature = "synth")]
    if config.soundfont.is_some() {
        let engine = recital::audio::AudioEngine::from_config(config)
            .context("Failed to start software synth")?;
        outputs.synth = Some(Box::new(engine));
    }

    #[cfg(not(feature = "midi-device"))]
    if config.midi_output.is_some() {
        warn!("midi_output is set but this build has no MIDI device support");
    }

    #[cfg(not(feature = "synth"))]
    if config.soundfont.is_some() {
        warn!("soundfont is set but this build has no software synth");
    }

    if outputs.is_empty() {
        warn!("No outputs configured, playing silently");
    }

    Ok(outputs)
}

/// Drive frames until the recording ends or Ctrl-C
async fn drive(mut player: Player, frame_interval: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let clock = Instant::now();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    player.play();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now_ms = clock.elapsed().as_secs_f64() * 1000.0;
                if !player.tick(now_ms).is_continue() {
                    info!("Playback finished");
                    break;
                }
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                warn!("Interrupted, stopping playback");
                player.stop();
                break;
            }
        }
    }

    Ok(())
}

fn play(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => validate_config(path)?,
        None => PlayerConfig::default(),
    };

    let (recording, anomalies) = load_recording(file)?;
    for anomaly in &anomalies {
        warn!("{}", anomaly);
    }

    let mut player = Player::new(build_outputs(&config)?);

    let duration = recording.duration();
    let mut last_second = None;
    player.set_time_listener(move |t| {
        let second = t.floor() as i64;
        if last_second != Some(second) {
            last_second = Some(second);
            debug!("{:>6.1}s / {:.1}s", t, duration);
        }
    });
    player.load(recording);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start frame clock")?;
    runtime.block_on(drive(player, config.frame_interval()))
}

fn list_midi() -> Result<()> {
    #[cfg(feature = "midi-device")]
    {
        recital::midi::print_destinations();
        Ok(())
    }

    #[cfg(not(feature = "midi-device"))]
    {
        anyhow::bail!("this build has no MIDI device support (enable the midi-device feature)")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Ingest {
            input,
            output,
            json,
            recorded_at,
            title,
        } => ingest(&input, output, json, recorded_at, title),
        Command::Info { file, notes } => {
            let (recording, anomalies) = load_recording(&file)?;
            print_info(&recording, &anomalies, notes);
            Ok(())
        }
        Command::Export { json, output } => export(&json, &output),
        Command::Play { file, config } => play(&file, config.as_deref()),
        Command::ListMidi => list_midi(),
    }
}
