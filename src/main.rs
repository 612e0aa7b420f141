//! readingtown-tts - command line front end
//!
//! Lists voices, compiles requests, and saves synthesized speech as MP3.

use clap::{Args, Parser, Subcommand};
use readingtown_tts::backends::{create_backend, SpeechBackend};
use readingtown_tts::catalog::{CatalogCache, VoiceCatalog, DEFAULT_VOICE_ID};
use readingtown_tts::config_loader::Settings;
use readingtown_tts::error::{Error, SynthesisError, ValidationError};
use readingtown_tts::i18n::{messages, Messages, UiLanguage};
use readingtown_tts::naming::NamingScheme;
use readingtown_tts::{compile, Artifact, Delivery, RequestParams, Session, SynthesisRequest};
use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Generate speech MP3s with neural voices
#[derive(Parser)]
#[command(name = "readingtown-tts")]
#[command(version)]
#[command(about = "Generate speech MP3s with neural voices", long_about = None)]
struct Cli {
    /// Extra configuration file, merged over the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend to use: azure or edge-cli
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Interface language: en, ko, zh
    #[arg(long, global = true)]
    lang: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct VoiceArgs {
    /// Voice label or backend id (default: the catalog's recommendation)
    #[arg(short, long)]
    voice: Option<String>,

    /// Speed adjustment in percent (-50..=50)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    speed: i32,

    /// Pitch adjustment in Hz (-50..=50)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pitch: i32,

    /// Volume adjustment in percent (-50..=50), plain style only
    #[arg(long, allow_negative_numbers = true)]
    volume: Option<i32>,

    /// Delivery style, e.g. cheerful, sad, whispering
    #[arg(short, long, default_value = "general")]
    style: String,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// File name prefix for the counter naming scheme
    #[arg(long)]
    prefix: Option<String>,

    /// Directory to save audio into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available voices
    Voices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Synthesize text and save it
    Speak {
        /// Text to speak (read from stdin when omitted)
        text: Option<String>,
        #[command(flatten)]
        voice: VoiceArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// Write the MP3 to stdout instead of a file
        #[arg(long)]
        stdout: bool,
    },

    /// Print the payload that would be sent, without calling a backend
    Compile {
        /// Text to compile
        text: String,
        #[command(flatten)]
        voice: VoiceArgs,
    },

    /// Read lines from stdin and synthesize each one in a single session
    Repl {
        #[command(flatten)]
        voice: VoiceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

impl VoiceArgs {
    fn params(&self, text: String, voice_id: String) -> RequestParams {
        RequestParams {
            text,
            voice_id,
            speed: self.speed,
            pitch: self.pitch,
            volume: self.volume,
            style: Some(self.style.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", messages(UiLanguage::En).error, e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(backend) = &cli.backend {
        settings.backend = backend.clone();
    }
    if let Some(lang) = &cli.lang {
        settings.ui_language = lang.clone();
    }
    let msgs = messages(settings.language().unwrap_or_default());
    if let Err(e) = settings.validate() {
        eprintln!("{}: {}", msgs.error, e);
        return ExitCode::FAILURE;
    }

    match run(cli.command, &settings, msgs).await {
        Ok(code) => code,
        Err(e) => {
            report(&e, msgs);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, settings: &Settings, msgs: &Messages) -> Result<ExitCode, Error> {
    match command {
        Commands::Compile { text, voice } => {
            let voice_id = voice
                .voice
                .clone()
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string());
            let request = SynthesisRequest::new(voice.params(text, voice_id))?;
            let payload = compile(request);
            println!("{}", to_json(&payload)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Voices { json } => {
            let backend = create_backend(settings)?;
            let catalog = catalog_cache(backend, settings).get().await;
            if catalog.is_empty() {
                return Err(Error::NoVoices);
            }
            if json {
                println!("{}", to_json(catalog.voices())?);
            } else {
                print_catalog(&catalog, msgs);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Speak {
            text,
            voice,
            output,
            stdout,
        } => {
            let text = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let backend = create_backend(settings)?;
            let cache = catalog_cache(backend.clone(), settings);
            let delivery = if stdout {
                Delivery::Memory
            } else {
                Delivery::File {
                    dir: output.output_dir.clone().unwrap_or_else(|| settings.output_path()),
                }
            };
            let mut session = new_session(backend, settings, &output, delivery)?;

            eprintln!("{}", msgs.processing);
            let artifact = session
                .speak(&cache, voice.voice.as_deref(), voice.params(text, String::new()))
                .await?;
            deliver(artifact, msgs)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Repl { voice, output } => {
            // Options are fixed for the whole loop; reject them before any backend call.
            voice.params(String::new(), String::new()).check_options()?;

            let backend = create_backend(settings)?;
            let cache = catalog_cache(backend.clone(), settings);
            let catalog = cache.get().await;
            if catalog.is_empty() {
                return Err(Error::NoVoices);
            }
            catalog.select(voice.voice.as_deref())?;

            let delivery = Delivery::File {
                dir: output.output_dir.clone().unwrap_or_else(|| settings.output_path()),
            };
            let mut session = new_session(backend, settings, &output, delivery)?;

            eprintln!("{}", msgs.title);
            eprintln!("{}", msgs.repl_prompt);
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    break;
                }
                let params = voice.params(line, String::new());
                match session.speak(&cache, voice.voice.as_deref(), params).await {
                    Ok(artifact) => deliver(artifact, msgs)?,
                    Err(e) => report(&e, msgs),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn catalog_cache(backend: Arc<dyn SpeechBackend>, settings: &Settings) -> CatalogCache {
    CatalogCache::new(
        backend,
        settings.catalog_options(),
        Duration::from_secs(settings.catalog_timeout_secs),
    )
}

fn new_session(
    backend: Arc<dyn SpeechBackend>,
    settings: &Settings,
    output: &OutputArgs,
    delivery: Delivery,
) -> Result<Session, Error> {
    let session = match &output.prefix {
        Some(prefix) => Session::new(
            backend,
            NamingScheme::Counter {
                prefix: prefix.clone(),
            },
            delivery,
            Duration::from_secs(settings.synthesis_timeout_secs),
        ),
        None => Session::from_settings(backend, settings, delivery)?,
    };
    Ok(session)
}

fn deliver(artifact: Artifact, msgs: &Messages) -> Result<(), Error> {
    match artifact {
        Artifact::Saved { path, size, .. } => {
            println!("{}: {} ({} bytes)", msgs.saved, path.display(), size);
        }
        Artifact::InMemory { filename, audio } => {
            let mut out = std::io::stdout().lock();
            out.write_all(&audio)?;
            out.flush()?;
            eprintln!("{}: {}", msgs.saved, filename);
        }
    }
    Ok(())
}

fn print_catalog(catalog: &VoiceCatalog, msgs: &Messages) {
    let default_id = catalog.default_voice().map(|v| v.id.as_str());
    println!("{}", msgs.title);
    println!("{}:", msgs.voice_label);
    for voice in catalog.voices() {
        let marker = if Some(voice.id.as_str()) == default_id {
            msgs.default_marker
        } else {
            ""
        };
        println!("  {:<40} {:<36} {}", voice.label, voice.id, marker);
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::Io(std::io::Error::new(ErrorKind::InvalidData, e)))
}

fn report(err: &Error, msgs: &Messages) {
    match err {
        Error::Validation(ValidationError::EmptyText) => eprintln!("{}", msgs.err_empty),
        Error::NoVoices => eprintln!("{}", msgs.no_voices),
        Error::Validation(ValidationError::UnknownVoice(voice)) => {
            eprintln!("{}: {}", msgs.err_unknown_voice, voice)
        }
        Error::Synthesis(e @ SynthesisError::Rejected { style: Some(_), .. }) => {
            eprintln!("{}: {}", msgs.error, e);
            eprintln!("{}", msgs.style_hint);
        }
        other => eprintln!("{}: {}", msgs.error, other),
    }
}
