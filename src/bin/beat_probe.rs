use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use aubio_wrapper::analysis::signals::click_track;
use aubio_wrapper::{facade, AnalysisParams, Method, OnsetDetector, TempoTracker};
use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.log {
        aubio_wrapper::init_logging();
    }
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("beat_probe error: {err:?}");
            ExitCode::from(1)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "beat_probe",
    about = "Run the tempo tracker and onset detector over a signal and report"
)]
struct Cli {
    /// Install the stderr log subscriber (level from AUBIO_WRAPPER_LOG).
    #[arg(long, global = true, default_value_t = false)]
    log: bool,
    /// Pretty-print the JSON report.
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn execute(self) -> Result<()> {
        let report = match self.command {
            Command::Click(args) => click_command(args)?,
            Command::Wav(args) => wav_command(args)?,
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{json}");
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesise a click track and analyse it.
    Click(ClickArgs),
    /// Analyse a WAV file (multi-channel input is mixed to mono).
    Wav(WavArgs),
}

#[derive(Args, Debug, Clone)]
struct ClickArgs {
    /// Tempo of the synthesised clicks.
    #[arg(long, default_value_t = 120.0)]
    bpm: f32,
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,
    /// Track length in seconds.
    #[arg(long, default_value_t = 10.0)]
    seconds: f32,
    /// Peak amplitude of added white noise (0 disables).
    #[arg(long, default_value_t = 0.0)]
    noise: f32,
    /// Seed for the noise generator.
    #[arg(long, default_value_t = 0x5A5A_FFF0)]
    seed: u64,
    #[command(flatten)]
    analysis: AnalysisArgs,
}

#[derive(Args, Debug, Clone)]
struct WavArgs {
    /// Path to the WAV file.
    path: PathBuf,
    #[command(flatten)]
    analysis: AnalysisArgs,
}

#[derive(Args, Debug, Clone)]
struct AnalysisArgs {
    /// Onset detection function (default, energy, hfc, complex, phase,
    /// wphase, specdiff, kl, mkl, specflux).
    #[arg(long, default_value = "default")]
    onset_method: Method,
}

#[derive(Debug, Serialize)]
struct Report {
    source: String,
    sample_rate: u32,
    duration_s: f32,
    onset_method: Method,
    beats: usize,
    beat_times_s: Vec<f32>,
    onsets: usize,
    onset_times_s: Vec<f32>,
    bpm: f32,
    confidence: f32,
}

fn click_command(args: ClickArgs) -> Result<Report> {
    if !(args.bpm > 0.0 && args.seconds > 0.0) {
        bail!("--bpm and --seconds must be positive");
    }

    let mut signal = click_track(args.sample_rate, args.bpm, args.seconds);
    if args.noise > 0.0 {
        let mut rng = StdRng::seed_from_u64(args.seed);
        for sample in &mut signal {
            *sample += rng.gen_range(-args.noise..args.noise);
        }
    }

    analyse(
        format!("click:{}bpm", args.bpm),
        &signal,
        args.sample_rate,
        args.analysis.onset_method,
    )
}

fn wav_command(args: WavArgs) -> Result<Report> {
    let (signal, sample_rate) = read_wav(&args.path)?;
    analyse(
        args.path.display().to_string(),
        &signal,
        sample_rate,
        args.analysis.onset_method,
    )
}

/// Run both analysers hop by hop over `signal`
fn analyse(source: String, signal: &[f32], sample_rate: u32, onset_method: Method) -> Result<Report> {
    let mut tracker = TempoTracker::new(AnalysisParams::realtime(Method::Default, sample_rate))?;
    let mut detector = OnsetDetector::new(AnalysisParams::realtime(onset_method, sample_rate))?;
    let hop = tracker.params().hop_size;

    let mut beat_times_s = Vec::new();
    let mut onset_times_s = Vec::new();
    for block in signal.chunks_exact(hop) {
        if facade::process_tempo(&mut tracker, block)?.beat {
            beat_times_s.push(tracker.last_s());
        }
        if facade::process_onset(&mut detector, block)? {
            onset_times_s.push(detector.last_s());
        }
    }

    Ok(Report {
        source,
        sample_rate,
        duration_s: signal.len() as f32 / sample_rate as f32,
        onset_method,
        beats: beat_times_s.len(),
        beat_times_s,
        onsets: onset_times_s.len(),
        onset_times_s,
        bpm: tracker.bpm(),
        confidence: tracker.confidence(),
    })
}

fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        bail!("{} declares zero channels", path.display());
    }

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| anyhow!(err)))
            .collect::<Result<Vec<f32>>>()?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if !(8..=32).contains(&bits) {
                bail!("Unsupported bits per sample {} in {}", bits, path.display());
            }
            let max = ((1i64 << (bits - 1)) - 1) as f32;
            reader
                .samples::<i32>()
                .map(|sample| {
                    sample
                        .map(|value| value as f32 / max)
                        .map_err(|err| anyhow!(err))
                })
                .collect::<Result<Vec<f32>>>()?
        }
    };

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}
