//! polly-studio - type text, pick a language and voice, hear it via Amazon Polly.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use polly_studio::client::{PollyClient, SpeechService};
use polly_studio::config_loader::Settings;
use polly_studio::engine::AudioEngine;
use polly_studio::language::LanguageCode;
use polly_studio::playback::{AudioSink, PlaybackEvent, PlaybackState};
use polly_studio::studio::Studio;
use polly_studio::view;
use polly_studio::voices::VoiceCatalogLoader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Amazon Polly text-to-speech studio
#[derive(Parser)]
#[command(name = "polly-studio")]
#[command(author = "StarTuz")]
#[command(version)]
#[command(about = "Type text, pick a voice, and listen to it via Amazon Polly", long_about = None)]
struct Cli {
    /// Extra configuration file (toml, yaml or json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Run without audio output
    #[arg(long, global = true)]
    no_audio: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive form (default)
    Interactive,

    /// List supported language codes
    Languages,

    /// List neural voices for a language
    Voices {
        /// Language code (defaults to the configured one)
        #[arg(short, long)]
        language: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Speak text once and exit when playback ends
    Speak {
        /// Text to speak
        text: String,
        /// Language code (defaults to the configured one)
        #[arg(short, long)]
        language: Option<String>,
        /// Voice id; defaults to the first voice of the language
        #[arg(short, long)]
        voice: Option<String>,
    },
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_audio(
    settings: &Settings,
    no_audio: bool,
) -> (Option<Box<dyn AudioSink>>, UnboundedReceiver<PlaybackEvent>) {
    let (tx, rx) = unbounded_channel();
    if no_audio || !settings.enable_audio {
        info!("Audio output disabled");
        return (None, rx);
    }
    match AudioEngine::new(settings.playback_volume, tx) {
        Ok(engine) => {
            let sink: Box<dyn AudioSink> = Box::new(engine);
            (Some(sink), rx)
        }
        Err(e) => {
            warn!("No audio output: {}", e);
            (None, rx)
        }
    }
}

async fn connect(settings: &Settings) -> Arc<dyn SpeechService> {
    Arc::new(PollyClient::new(settings).await)
}

fn parse_language(code: Option<String>, settings: &Settings) -> anyhow::Result<LanguageCode> {
    match code {
        Some(code) => Ok(code.parse()?),
        None => Ok(settings.language()?),
    }
}

async fn speak(
    mut studio: Studio,
    mut events: UnboundedReceiver<PlaybackEvent>,
    text: String,
    language: LanguageCode,
    voice: Option<String>,
) -> anyhow::Result<()> {
    if !studio.playback().has_sink() {
        bail!("no audio output available");
    }

    studio.set_text(text);
    studio.set_language(language);
    studio.reload_voices().await;
    if studio.state().catalog.is_empty() {
        bail!("no voices available for {}", language);
    }
    if let Some(id) = voice {
        studio.select_voice(&id)?;
    }

    studio.listen().await;
    if studio.state().playback == PlaybackState::Idle {
        bail!("synthesis failed");
    }
    if let Some(voice) = studio.selected() {
        println!("Speaking as {}", voice.label());
    }

    while studio.state().playback != PlaybackState::Idle {
        match events.recv().await {
            Some(event) => studio.handle_playback_event(event),
            None => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Languages => {
            print!("{}", view::render_languages());
        }

        Commands::Voices { language, json } => {
            let language = parse_language(language, &settings)?;
            let voices = VoiceCatalogLoader::new(connect(&settings).await)
                .load_voices(language)
                .await
                .with_context(|| format!("Failed to list voices for {}", language))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&voices)?);
            } else if voices.is_empty() {
                println!("No neural voices for {}", language);
            } else {
                for voice in voices {
                    println!("{}\t{}", voice.id, voice.label());
                }
            }
        }

        Commands::Speak {
            text,
            language,
            voice,
        } => {
            let language = parse_language(language, &settings)?;
            let (sink, events) = open_audio(&settings, cli.no_audio);
            let studio = Studio::new(connect(&settings).await, sink, &settings)?;
            speak(studio, events, text, language, voice).await?;
        }

        Commands::Interactive => {
            let (sink, events) = open_audio(&settings, cli.no_audio);
            let studio = Studio::new(connect(&settings).await, sink, &settings)?;
            view::run(studio, events).await?;
        }
    }

    Ok(())
}
