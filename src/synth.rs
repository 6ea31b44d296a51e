use crate::client::{
    AudioClip, AudioFormat, InputTextType, SpeechEngine, SpeechRequest, SpeechResponse,
    SpeechService, SynthesizeSpeechInput,
};
use crate::error::{Result, StudioError};
use std::sync::Arc;
use tracing::info;

/// Turns text into MP3 bytes via the remote service.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    service: Arc<dyn SpeechService>,
}

impl SpeechSynthesizer {
    pub fn new(service: Arc<dyn SpeechService>) -> Self {
        Self { service }
    }

    pub async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioClip> {
        if text.is_empty() {
            return Err(StudioError::EmptyText);
        }

        info!("Synthesizing {} chars with voice {}", text.chars().count(), voice_id);

        let request = SpeechRequest::SynthesizeSpeech(SynthesizeSpeechInput {
            engine: SpeechEngine::Neural,
            output_format: AudioFormat::Mp3,
            text: text.to_string(),
            text_type: InputTextType::Text,
            voice_id: voice_id.to_string(),
        });

        match self.service.send(request).await? {
            SpeechResponse::Audio(clip) => Ok(clip),
            SpeechResponse::Voices(_) => Err(StudioError::UnexpectedResponse("SynthesizeSpeech")),
        }
    }
}
