use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sotto_session::{FileReplay, StreamSession};
use sotto_stt::{DecodeOptions, SpeechEngine, Task};
use sotto_transcript::TranscriptWriter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Streaming and batch speech transcription", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Transcribe an audio file and save the text to the output directory
    Transcribe {
        /// Model name (e.g. "base.en") or path to a GGML weights file
        model: String,

        /// The audio input file, wav format
        audio: PathBuf,

        /// Output directory for transcriptions
        #[arg(short, long, default_value = "transcriptions")]
        output_dir: PathBuf,

        /// Beam size to use for transcription
        #[arg(short, long, default_value_t = 5)]
        beam_size: usize,

        /// The language spoken in the audio, as a code such as 'en' or 'fr'.
        /// Detected from the audio when not set.
        #[arg(short, long)]
        language: Option<String>,

        /// Task to execute
        #[arg(long, value_enum, default_value_t = TaskArg::Transcribe)]
        task: TaskArg,

        /// Temperature for sampling
        #[arg(short, long, default_value_t = 0.0)]
        temperature: f32,
    },
    /// Replay an audio file at real-time pace, printing partial transcripts
    Stream {
        /// Model name (e.g. "base.en") or path to a GGML weights file
        model: String,

        /// The audio input file, wav format
        audio: PathBuf,

        /// Seconds of audio fed to the session per step
        #[arg(long, default_value_t = 1.0)]
        chunk_secs: f64,

        /// Print events as JSON lines instead of formatted text
        #[arg(long)]
        json: bool,

        /// Beam size to use for transcription
        #[arg(short, long, default_value_t = 5)]
        beam_size: usize,

        /// The language spoken in the audio, as a code such as 'en' or 'fr'.
        /// Detected from the audio when not set.
        #[arg(short, long)]
        language: Option<String>,

        /// Task to execute
        #[arg(long, value_enum, default_value_t = TaskArg::Transcribe)]
        task: TaskArg,

        /// Temperature for sampling
        #[arg(short, long, default_value_t = 0.0)]
        temperature: f32,
    },
    /// Transcribe files interactively, prompting for paths on stdin
    Run {
        /// Model name (e.g. "base.en") or path to a GGML weights file
        model: String,

        /// Output directory for transcriptions
        #[arg(short, long, default_value = "transcriptions")]
        output_dir: PathBuf,

        /// Beam size to use for transcription
        #[arg(short, long, default_value_t = 5)]
        beam_size: usize,

        /// The language spoken in the audio, as a code such as 'en' or 'fr'.
        /// Detected from the audio when not set.
        #[arg(short, long)]
        language: Option<String>,

        /// Task to execute
        #[arg(long, value_enum, default_value_t = TaskArg::Transcribe)]
        task: TaskArg,

        /// Temperature for sampling
        #[arg(short, long, default_value_t = 0.0)]
        temperature: f32,
    },
    /// List known models and their download status
    Models,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TaskArg {
    Transcribe,
    Translate,
}

impl From<TaskArg> for Task {
    fn from(task: TaskArg) -> Self {
        match task {
            TaskArg::Transcribe => Task::Transcribe,
            TaskArg::Translate => Task::Translate,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sotto=debug")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Transcribe {
            model,
            audio,
            output_dir,
            beam_size,
            language,
            task,
            temperature,
        } => {
            let weights = resolve_weights(&model).await?;
            let mut engine = load_engine(&weights)?;
            let options = decode_options(language, task, beam_size, temperature);
            let writer = TranscriptWriter::new(output_dir);
            let text = transcribe_and_save(engine.as_mut(), &audio, &options, &writer)?;
            println!("Transcription: {text}");
            Ok(())
        }
        Commands::Stream {
            model,
            audio,
            chunk_secs,
            json,
            beam_size,
            language,
            task,
            temperature,
        } => {
            let weights = resolve_weights(&model).await?;
            let engine = load_engine(&weights)?;
            let options = decode_options(language, task, beam_size, temperature);
            run_stream(engine, &audio, options, chunk_secs, json)
        }
        Commands::Run {
            model,
            output_dir,
            beam_size,
            language,
            task,
            temperature,
        } => {
            let weights = resolve_weights(&model).await?;
            let mut engine = load_engine(&weights)?;
            let options = decode_options(language, task, beam_size, temperature);
            run_interactive(engine.as_mut(), &options, &output_dir)
        }
        Commands::Models => {
            list_models();
            Ok(())
        }
    }
}

fn decode_options(
    language: Option<String>,
    task: TaskArg,
    beam_size: usize,
    temperature: f32,
) -> DecodeOptions {
    DecodeOptions {
        language,
        task: task.into(),
        beam_size,
        temperature,
        ..DecodeOptions::default()
    }
}

/// Treat the identifier as a local weights file first, then as a model
/// name to fetch from the registry.
async fn resolve_weights(identifier: &str) -> Result<PathBuf> {
    let as_path = Path::new(identifier);
    if as_path.is_file() {
        return Ok(as_path.to_path_buf());
    }
    let model = sotto_models::WhisperModel::resolve(identifier)?;
    let cached = sotto_models::is_downloaded(model);
    let weights = sotto_models::ensure_available(model, print_progress).await?;
    if !cached {
        eprintln!();
    }
    Ok(weights)
}

fn print_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = downloaded as f64 / total as f64 * 100.0;
        eprint!(
            "\rDownloading: {:5.1}% ({} / {})",
            pct,
            human_size(downloaded),
            human_size(total)
        );
    } else {
        eprint!("\rDownloading: {}", human_size(downloaded));
    }
    let _ = io::stderr().flush();
}

#[cfg(feature = "whisper")]
fn load_engine(weights: &Path) -> Result<Box<dyn SpeechEngine>> {
    let engine = sotto_stt::WhisperEngine::load(weights)?;
    tracing::info!(model = engine.model_name(), "speech engine loaded");
    Ok(Box::new(engine))
}

#[cfg(not(feature = "whisper"))]
fn load_engine(weights: &Path) -> Result<Box<dyn SpeechEngine>> {
    let _ = weights;
    anyhow::bail!("built without a speech engine; rebuild with `--features whisper`")
}

fn transcribe_and_save(
    engine: &mut dyn SpeechEngine,
    audio: &Path,
    options: &DecodeOptions,
    writer: &TranscriptWriter,
) -> Result<String> {
    let text = sotto_session::transcribe_file(engine, audio, options)?;
    writer.save(&text)?;
    Ok(text)
}

fn run_stream(
    engine: Box<dyn SpeechEngine>,
    audio: &Path,
    options: DecodeOptions,
    chunk_secs: f64,
    json: bool,
) -> Result<()> {
    let session = StreamSession::with_options(engine, options);
    let replay = FileReplay::new(session, audio)?.chunk_secs(chunk_secs);
    tracing::info!(
        duration_secs = replay.duration_secs(),
        chunk_secs,
        "replaying file at real-time pace"
    );
    for event in replay {
        let event = event?;
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            let beg = event.segment_start_ms / 1000.0;
            let end = event.segment_end_ms / 1000.0;
            if event.is_final {
                println!("[{beg:7.2}-{end:7.2}] {} (final)", event.text);
            } else {
                println!("[{beg:7.2}-{end:7.2}] {}", event.text);
            }
        }
    }
    Ok(())
}

fn run_interactive(
    engine: &mut dyn SpeechEngine,
    options: &DecodeOptions,
    output_dir: &Path,
) -> Result<()> {
    let writer = TranscriptWriter::new(output_dir);
    let mut line = String::new();
    loop {
        print!("Enter the path to your audio file: ");
        io::stdout().flush()?;
        line.clear();
        if io::stdin().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "/exit" | "/quit" | "/bye") {
            return Ok(());
        }
        match transcribe_and_save(engine, Path::new(input), options, &writer) {
            Ok(text) => println!("Transcription: {text}"),
            Err(e) => tracing::error!("Error during transcription: {e}"),
        }
    }
}

fn list_models() {
    for model in sotto_models::WhisperModel::ALL {
        let status = if sotto_models::is_downloaded(model) {
            "downloaded"
        } else {
            "-"
        };
        println!(
            "{:<26} {:>8}  {}",
            model.name(),
            human_size(model.size_bytes()),
            status
        );
    }
}

fn human_size(bytes: u64) -> String {
    const GB: u64 = 1_000_000_000;
    const MB: u64 = 1_000_000;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else {
        format!("{} MB", bytes / MB)
    }
}
