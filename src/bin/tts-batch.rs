use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use tts_batch::audio::write_atomic;
use tts_batch::batch::{run_batch, BatchObserver, BatchOptionsBuilder, ConversionJob, JobResult};
use tts_batch::config::Settings;
use tts_batch::credits::aggregate_credits;
use tts_batch::engines::elevenlabs::{ClientConfigBuilder, ElevenLabsClient, DEFAULT_BASE_URL};
use tts_batch::text::{read_text_file, TextStats};
use tts_batch::{BatchError, CancelToken, OutputFormat, SpeechApi};

/// Environment variable consulted when no key is given or stored.
const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Convert text files to speech with ElevenLabs
#[derive(Parser)]
#[command(name = "tts-batch", version, about)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage stored API keys
    #[command(subcommand)]
    Keys(KeysCommand),
    /// Show remaining credits summed over all unique keys
    Credits {
        /// Extra keys to include besides the stored ones
        #[arg(long = "key")]
        keys: Vec<String>,
    },
    /// Convert files or text to audio, one output file per input
    Convert(ConvertArgs),
    /// Count characters, words and synthesis requests
    Count {
        files: Vec<PathBuf>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// List voices available to the account
    Voices {
        #[arg(long)]
        key: Option<String>,
    },
    /// List text-to-speech models
    Models {
        #[arg(long)]
        key: Option<String>,
    },
    /// Save a short sample spoken by a voice
    Preview {
        #[arg(long)]
        voice: String,
        /// Sample text (a built-in greeting when omitted)
        #[arg(long)]
        text: Option<String>,
        /// Output file (defaults to `<voice>_preview.mp3`)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Subcommand)]
enum KeysCommand {
    Add {
        key: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Remove a key by value or label
    Remove { key: String },
    List,
    /// Select the key used for conversions
    Use { key: String },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input text files
    files: Vec<PathBuf>,
    /// Convert this text instead of (or in addition to) files
    #[arg(long)]
    text: Option<String>,
    /// Output name for --text
    #[arg(long, default_value = "text")]
    name: String,
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    voice: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// mp3, wav, mp3_<rate>_<kbps> or pcm_<rate>
    #[arg(long)]
    format: Option<OutputFormat>,
    #[arg(long)]
    stability: Option<f32>,
    #[arg(long)]
    similarity: Option<f32>,
    #[arg(long)]
    style: Option<f32>,
    #[arg(long)]
    speaker_boost: Option<bool>,
    #[arg(long)]
    speed: Option<f32>,
    /// Maximum characters per request
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Key to use instead of the current stored key
    #[arg(long)]
    key: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

/// Prints batch progress to stderr.
struct ProgressPrinter {
    total: usize,
}

impl BatchObserver for ProgressPrinter {
    fn job_started(&mut self, index: usize, job: &ConversionJob, chunks: usize) {
        eprintln!("[{}/{}] {} ({chunks} chunks)", index + 1, self.total, job.label());
    }

    fn chunk_synthesized(&mut self, index: usize, chunk: usize, chunks: usize) {
        if chunks > 1 {
            eprintln!("[{}/{}]   chunk {}/{chunks}", index + 1, self.total, chunk + 1);
        }
    }

    fn job_finished(&mut self, result: &JobResult) {
        println!("{result}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings_path = match cli.settings {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load(&settings_path)?;

    match cli.command {
        Command::Keys(cmd) => keys(cmd, &mut settings, &settings_path)?,
        Command::Credits { keys } => credits(keys, &mut settings, &settings_path)?,
        Command::Convert(args) => convert(args, &mut settings, &settings_path)?,
        Command::Count {
            files,
            text,
            chunk_size,
        } => count(
            files,
            text,
            chunk_size.unwrap_or(settings.conversion.chunk_size),
        )?,
        Command::Voices { key } => {
            let key = resolve_key(key, &settings)?;
            for voice in client(&settings, None)?.voices(&key)? {
                let category = voice.category.unwrap_or_default();
                println!("{}\t{}\t{category}", voice.voice_id, voice.name);
            }
        }
        Command::Models { key } => {
            let key = resolve_key(key, &settings)?;
            for model in client(&settings, None)?.models(&key)? {
                println!("{}\t{}", model.model_id, model.name);
            }
        }
        Command::Preview {
            voice,
            text,
            out,
            key,
        } => {
            let key = resolve_key(key, &settings)?;
            let audio = client(&settings, None)?.voice_sample(&key, &voice, text.as_deref())?;
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{voice}_preview.mp3")));
            write_atomic(&out, &audio)?;
            println!("Saved sample of {voice} to {}", out.display());
        }
    }

    Ok(())
}

fn client(
    settings: &Settings,
    timeout: Option<u64>,
) -> Result<ElevenLabsClient, Box<dyn std::error::Error>> {
    let config = ClientConfigBuilder::default()
        .base_url(
            settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )
        .timeout(
            timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| settings.request_timeout()),
        )
        .build()?;
    Ok(ElevenLabsClient::new(config)?)
}

/// Explicit key, else the current stored key, else the environment.
fn resolve_key(explicit: Option<String>, settings: &Settings) -> Result<String, BatchError> {
    explicit
        .or_else(|| settings.api_keys.current().map(|k| k.key.clone()))
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty())
        .ok_or(BatchError::NoApiKeys)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn keys(
    cmd: KeysCommand,
    settings: &mut Settings,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = &mut settings.api_keys;
    match cmd {
        KeysCommand::Add { key, label } => {
            if store.add(&key, label.as_deref())? {
                println!("Added key {}", store.list()[store.len() - 1]);
            } else {
                println!("Key already stored");
                return Ok(());
            }
        }
        KeysCommand::Remove { key } => match store.remove(&key) {
            Some(removed) => println!("Removed key {removed}"),
            None => {
                println!("No key matches '{key}'");
                return Ok(());
            }
        },
        KeysCommand::List => {
            let current = store.current().map(|k| k.key.clone());
            for k in store.list() {
                let marker = if current.as_deref() == Some(k.key.as_str()) { "*" } else { " " };
                match k.last_validated {
                    Some(at) => println!("{marker} {k}  (checked at {at})"),
                    None => println!("{marker} {k}"),
                }
            }
            return Ok(());
        }
        KeysCommand::Use { key } => {
            if !store.set_current(&key) {
                println!("No key matches '{key}'");
                return Ok(());
            }
        }
    }
    settings.save(path)?;
    Ok(())
}

fn credits(
    extra: Vec<String>,
    settings: &mut Settings,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = client(settings, None)?;
    let keys: Vec<String> = settings
        .api_keys
        .list()
        .iter()
        .map(|k| k.key.clone())
        .chain(extra)
        .collect();

    let total = aggregate_credits(&api, &keys)?;
    for entry in &total.balances {
        println!(
            "{}\t{} / {} credits",
            tts_batch::credentials::mask(&entry.key),
            entry.balance.remaining(),
            entry.balance.character_limit
        );
    }
    for entry in &total.unreachable {
        println!("unreachable: {entry}");
    }
    println!(
        "Total: {} credits from {} unique key(s), {} duplicate(s) skipped",
        total.total_remaining, total.unique_keys, total.duplicates
    );

    let now = unix_now();
    for entry in &total.balances {
        settings.api_keys.mark_validated(&entry.key, now);
    }
    settings.save(path)?;
    Ok(())
}

fn convert(
    args: ConvertArgs,
    settings: &mut Settings,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = &mut settings.conversion;
    let params = &mut defaults.params;
    if let Some(voice) = args.voice {
        params.voice_id = voice;
    }
    if let Some(model) = args.model {
        params.model_id = model;
    }
    if let Some(format) = args.format {
        params.output_format = format;
    }
    let vs = &mut params.voice_settings;
    vs.stability = args.stability.unwrap_or(vs.stability);
    vs.similarity_boost = args.similarity.unwrap_or(vs.similarity_boost);
    vs.style = args.style.unwrap_or(vs.style);
    vs.use_speaker_boost = args.speaker_boost.unwrap_or(vs.use_speaker_boost);
    vs.speed = args.speed.unwrap_or(vs.speed);
    if let Some(size) = args.chunk_size {
        defaults.chunk_size = size;
    }
    if let Some(dir) = args.out_dir {
        defaults.output_directory = Some(dir);
    }

    let mut jobs: Vec<ConversionJob> = args.files.into_iter().map(ConversionJob::file).collect();
    if let Some(text) = args.text {
        jobs.push(ConversionJob::text(args.name, text));
    }
    if jobs.is_empty() {
        return Err("nothing to convert: pass input files or --text".into());
    }

    let options = BatchOptionsBuilder::default()
        .params(defaults.params.clone())
        .max_chunk_chars(defaults.chunk_size)
        .output_dir(
            defaults
                .output_directory
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
        )
        .build()?;

    let key = resolve_key(args.key, settings)?;
    let api = client(settings, args.timeout)?;
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("Interrupted, stopping after the current request");
        on_interrupt.cancel();
    })?;

    let mut progress = ProgressPrinter { total: jobs.len() };
    let report = run_batch(&api, &key, &jobs, &options, &cancel, &mut progress)?;

    settings.save(path)?;

    println!(
        "{} completed, {} failed, {} cancelled",
        report.completed(),
        report.failed(),
        report.cancelled()
    );
    match api.credit_balance(&key) {
        Ok(balance) => log::info!(
            "Key has {} / {} credits left",
            balance.remaining(),
            balance.character_limit
        ),
        Err(e) => log::warn!("Could not refresh credits: {e}"),
    }

    if report.failed() > 0 {
        std::process::exit(1);
    }
    if report.cancelled() > 0 {
        std::process::exit(130);
    }
    Ok(())
}

fn count(
    files: Vec<PathBuf>,
    text: Option<String>,
    chunk_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut inputs = Vec::new();
    for file in files {
        let content = read_text_file(&file)?;
        inputs.push((file.display().to_string(), content));
    }
    if let Some(text) = text {
        inputs.push(("text".to_string(), text));
    }

    for (name, content) in inputs {
        let stats = TextStats::of(&content, chunk_size)?;
        println!(
            "{name}: {} words, {} characters, {} paragraphs, {} request(s) at {chunk_size} chars",
            stats.words, stats.characters, stats.paragraphs, stats.chunks
        );
    }
    Ok(())
}
