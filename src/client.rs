//! Remote speech service: the two provider operations behind one `send`.

use crate::config_loader::Settings;
use crate::error::{Result, StudioError};
use crate::language::LanguageCode;
use crate::voices::{Gender, Voice};
use async_trait::async_trait;
use aws_sdk_polly::config::{Credentials, Region};
use aws_sdk_polly::error::DisplayErrorContext;
use aws_sdk_polly::types::{Engine, OutputFormat, TextType, Voice as SdkVoice, VoiceId};
use aws_sdk_polly::Client;
use tracing::{debug, info};

pub const MPEG_MIME: &str = "audio/mpeg";

/// Synthesis quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEngine {
    Standard,
    Neural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    OggVorbis,
    Pcm,
}

impl AudioFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => MPEG_MIME,
            AudioFormat::OggVorbis => "audio/ogg",
            AudioFormat::Pcm => "audio/pcm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTextType {
    Text,
    Ssml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeVoicesInput {
    pub engine: SpeechEngine,
    pub language: LanguageCode,
    pub include_additional_language_codes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizeSpeechInput {
    pub engine: SpeechEngine,
    pub output_format: AudioFormat,
    pub text: String,
    pub text_type: InputTextType,
    pub voice_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechRequest {
    DescribeVoices(DescribeVoicesInput),
    SynthesizeSpeech(SynthesizeSpeechInput),
}

/// Synthesized audio, fully collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn mpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, MPEG_MIME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechResponse {
    Voices(Vec<Voice>),
    Audio(AudioClip),
}

/// Anything that can answer DescribeVoices and SynthesizeSpeech requests.
/// Production uses [`PollyClient`]; tests plug in a mock.
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn send(&self, request: SpeechRequest) -> Result<SpeechResponse>;
}

pub struct PollyClient {
    client: Client,
}

impl PollyClient {
    /// Builds the SDK client once from settings. Static keys win over the
    /// default credential chain when both are present.
    pub async fn new(settings: &Settings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }

        if let (Some(key_id), Some(secret)) =
            (&settings.access_key_id, &settings.secret_access_key)
        {
            debug!("Using static credentials from configuration");
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "polly-studio",
            ));
        }

        let aws_config = loader.load().await;
        info!("Polly client configured for region {}", settings.region);

        Self {
            client: Client::new(&aws_config),
        }
    }

    async fn describe_voices(&self, input: DescribeVoicesInput) -> Result<Vec<Voice>> {
        let response = self
            .client
            .describe_voices()
            .engine(sdk_engine(input.engine))
            .language_code(aws_sdk_polly::types::LanguageCode::from(
                input.language.as_str(),
            ))
            .include_additional_language_codes(input.include_additional_language_codes)
            .send()
            .await
            .map_err(|e| StudioError::Service(DisplayErrorContext(&e).to_string()))?;

        Ok(voices_from_sdk(response.voices.unwrap_or_default()))
    }

    async fn synthesize_speech(&self, input: SynthesizeSpeechInput) -> Result<AudioClip> {
        let response = self
            .client
            .synthesize_speech()
            .engine(sdk_engine(input.engine))
            .output_format(sdk_output_format(input.output_format))
            .text(input.text)
            .text_type(match input.text_type {
                InputTextType::Text => TextType::Text,
                InputTextType::Ssml => TextType::Ssml,
            })
            .voice_id(VoiceId::from(input.voice_id.as_str()))
            .send()
            .await
            .map_err(|e| StudioError::Service(DisplayErrorContext(&e).to_string()))?;

        let bytes = response
            .audio_stream
            .collect()
            .await
            .map_err(|e| StudioError::Service(format!("audio stream interrupted: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok(AudioClip::new(
            bytes,
            clip_mime_type(input.output_format, response.content_type.as_deref()),
        ))
    }
}

/// Drops voices the provider returned without an id or a name.
fn voices_from_sdk(voices: Vec<SdkVoice>) -> Vec<Voice> {
    voices.into_iter().filter_map(voice_from_sdk).collect()
}

fn voice_from_sdk(voice: SdkVoice) -> Option<Voice> {
    let id = voice.id?.as_str().to_string();
    let name = voice.name?;
    let gender = voice
        .gender
        .map(|g| Gender::from(g.as_str()))
        .unwrap_or_default();
    Some(Voice { id, name, gender })
}

// The provider's Content-Type wins; otherwise the requested format decides.
fn clip_mime_type(format: AudioFormat, content_type: Option<&str>) -> String {
    match content_type {
        Some(ct) if !ct.is_empty() => ct.to_string(),
        _ => format.mime_type().to_string(),
    }
}

fn sdk_engine(engine: SpeechEngine) -> Engine {
    match engine {
        SpeechEngine::Standard => Engine::Standard,
        SpeechEngine::Neural => Engine::Neural,
    }
}

fn sdk_output_format(format: AudioFormat) -> OutputFormat {
    match format {
        AudioFormat::Mp3 => OutputFormat::Mp3,
        AudioFormat::OggVorbis => OutputFormat::OggVorbis,
        AudioFormat::Pcm => OutputFormat::Pcm,
    }
}

#[async_trait]
impl SpeechService for PollyClient {
    async fn send(&self, request: SpeechRequest) -> Result<SpeechResponse> {
        match request {
            SpeechRequest::DescribeVoices(input) => {
                self.describe_voices(input).await.map(SpeechResponse::Voices)
            }
            SpeechRequest::SynthesizeSpeech(input) => {
                self.synthesize_speech(input).await.map(SpeechResponse::Audio)
            }
        }
    }
}
