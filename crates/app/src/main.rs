use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use syncframe_core::{
    evaluate_store, AudioBuffer, EngineConfig, FrameExporter, FrequencySampler, KeyframeStore,
    ReactiveMapping, Result,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate { keyframes, time } => run_evaluate(&keyframes, time),
        Commands::Spectrum {
            audio,
            time,
            config,
        } => run_spectrum(&audio, time, config.as_deref()),
        Commands::Export {
            audio,
            keyframes,
            output,
            config,
            fps,
            mappings,
        } => run_export(ExportArgs {
            audio: &audio,
            keyframes: &keyframes,
            output: &output,
            config: config.as_deref(),
            fps,
            mappings: mappings.as_deref(),
        }),
    }
}

fn run_evaluate(keyframes: &Path, time: f64) -> Result<()> {
    let store = KeyframeStore::load(keyframes)?;
    tracing::info!(time, groups = store.groups().count(), "evaluating keyframes");

    let updates = evaluate_store(&store, time);
    println!("{}", serde_json::to_string_pretty(&updates)?);
    Ok(())
}

fn run_spectrum(audio: &Path, time: f64, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let audio = AudioBuffer::from_wav_path(audio)?.into_shared();

    let mut sampler = FrequencySampler::new(audio, config.sampler)?;
    let spectrum = sampler.sample(time)?;
    println!("{}", serde_json::to_string(&spectrum)?);
    Ok(())
}

struct ExportArgs<'a> {
    audio: &'a Path,
    keyframes: &'a Path,
    output: &'a Path,
    config: Option<&'a Path>,
    fps: Option<u32>,
    mappings: Option<&'a Path>,
}

fn run_export(args: ExportArgs<'_>) -> Result<()> {
    let mut config = load_config(args.config)?;
    if let Some(fps) = args.fps {
        config.export.fps = fps;
    }
    let mappings: Vec<ReactiveMapping> = match args.mappings {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let store = KeyframeStore::load(args.keyframes)?;
    let audio = AudioBuffer::from_wav_path(args.audio)?.into_shared();
    let mut exporter = FrameExporter::new(
        audio,
        config.sampler,
        config.export,
        config.duration_override,
        mappings,
    )?;

    tracing::info!(output = ?args.output, frames = exporter.frame_count(), "exporting");
    let frames = exporter.run(&store)?;
    fs::write(args.output, serde_json::to_string(&frames)?)?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Audio-synchronised keyframe animation engine",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every keyframed property value at a point in time.
    Evaluate {
        /// Keyframe collection saved as JSON.
        #[arg(short, long)]
        keyframes: PathBuf,
        /// Time in seconds.
        #[arg(short, long)]
        time: f64,
    },
    /// Print the byte frequency spectrum of an audio file at a point in time.
    Spectrum {
        /// PCM WAV file to analyse.
        #[arg(short, long)]
        audio: PathBuf,
        /// Time in seconds.
        #[arg(short, long)]
        time: f64,
        /// Engine configuration in JSON.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Step through the timeline at a fixed frame rate and write every frame.
    Export {
        /// PCM WAV file that drives the timeline.
        #[arg(short, long)]
        audio: PathBuf,
        /// Keyframe collection saved as JSON.
        #[arg(short, long)]
        keyframes: PathBuf,
        /// Destination for the frame states.
        #[arg(short, long)]
        output: PathBuf,
        /// Engine configuration in JSON.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides the configured frame rate.
        #[arg(long)]
        fps: Option<u32>,
        /// Audio-reactive mappings in JSON.
        #[arg(short, long)]
        mappings: Option<PathBuf>,
    },
}
