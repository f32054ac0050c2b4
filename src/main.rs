//! conversation-analyzer: turn-taking report for a stereo conversation WAV.
//!
//! Left channel is speaker A, right channel is speaker B. Progress lines go
//! to stdout, logs to stderr (and optionally a log directory).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use conversation_analyzer::config::read_analyzer_config;
use conversation_analyzer::report::{write_html, write_json};
use conversation_analyzer::{analyze, load_wav, logger, AnalysisConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Analyze a stereo WAV recording of a two-person conversation", long_about = None)]
struct Args {
    /// Stereo WAV file (left = speaker A, right = speaker B)
    wav_file: PathBuf,

    /// Output HTML report path (default: <input>_report.html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the full analysis as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// RMS energy threshold (default: auto-detect)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Label for the left channel
    #[arg(short = 'a', long)]
    speaker_a: Option<String>,

    /// Label for the right channel
    #[arg(short = 'b', long)]
    speaker_b: Option<String>,

    /// VAD frame size in ms
    #[arg(long)]
    frame_size: Option<u32>,

    /// Min speech segment duration in ms
    #[arg(long)]
    min_speech: Option<u32>,

    /// Min silence duration to split segments in ms
    #[arg(long)]
    min_silence: Option<u32>,

    /// Analyzer config JSON (default: analyzer_config.json in the data dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write daily rolling log files to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration.
    fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(t) = self.threshold {
            config.threshold = Some(t);
        }
        if let Some(label) = &self.speaker_a {
            config.speaker_a = label.clone();
        }
        if let Some(label) = &self.speaker_b {
            config.speaker_b = label.clone();
        }
        if let Some(ms) = self.frame_size {
            config.frame_ms = ms;
        }
        if let Some(ms) = self.min_speech {
            config.min_speech_ms = ms;
        }
        if let Some(ms) = self.min_silence {
            config.min_silence_ms = ms;
        }
        config
    }
}

fn default_output(wav: &Path) -> PathBuf {
    let mut name = wav.with_extension("").into_os_string();
    name.push("_report.html");
    PathBuf::from(name)
}

fn main() -> Result<()> {
    let args = Args::parse();

    logger::init(args.log_dir.as_deref(), logger::DEFAULT_FILTER)
        .map_err(anyhow::Error::msg)?;

    let config = args.apply(read_analyzer_config(args.config.as_deref()));
    info!(?config, "Configuration loaded");
    config.validate().context("Invalid analysis settings")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.wav_file));

    let file_name = args
        .wav_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.wav_file.display().to_string());
    println!("Loading {}...", file_name);
    let recording = load_wav(&args.wav_file, &config.speaker_a, &config.speaker_b)
        .with_context(|| format!("Failed to load {}", args.wav_file.display()))?;
    println!("  Sample rate: {} Hz", recording.sample_rate());
    println!("  Duration: {:.1}s", recording.duration_secs());

    println!("Running voice activity detection...");
    let analysis = analyze(&recording, &config).context("Analysis failed")?;
    println!(
        "  {}: {} speech segments",
        config.speaker_a,
        analysis.segments_a.len()
    );
    println!(
        "  {}: {} speech segments",
        config.speaker_b,
        analysis.segments_b.len()
    );
    println!(
        "  {} turns, {} interruptions",
        analysis.timeline.turns.len(),
        analysis.statistics.interruption_count
    );

    println!("Generating report...");
    write_html(&analysis, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Report written to {}", output.display());

    if let Some(json) = &args.json {
        write_json(&analysis, json)
            .with_context(|| format!("Failed to write {}", json.display()))?;
        println!("Statistics written to {}", json.display());
    }

    Ok(())
}
