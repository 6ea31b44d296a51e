use crate::client::{
    DescribeVoicesInput, SpeechEngine, SpeechRequest, SpeechResponse, SpeechService,
};
use crate::error::{Result, StudioError};
use crate::language::LanguageCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unspecified,
    Other(String),
}

impl From<&str> for Gender {
    fn from(value: &str) -> Self {
        match value {
            "Female" => Gender::Female,
            "Male" => Gender::Male,
            "" => Gender::Unspecified,
            other => Gender::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Female => f.write_str("Female"),
            Gender::Male => f.write_str("Male"),
            Gender::Unspecified => f.write_str("Unspecified"),
            Gender::Other(s) => f.write_str(s),
        }
    }
}

/// Represents a synthesizer voice as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub gender: Gender,
}

impl Voice {
    /// Selector label, e.g. `Kevin - Male`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.gender)
    }
}

/// Voices for one language, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn first(&self) -> Option<&Voice> {
        self.voices.first()
    }

    pub fn get(&self, id: &str) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }
}

/// Fetches the neural voices available for a language.
#[derive(Clone)]
pub struct VoiceCatalogLoader {
    service: Arc<dyn SpeechService>,
}

impl VoiceCatalogLoader {
    pub fn new(service: Arc<dyn SpeechService>) -> Self {
        Self { service }
    }

    pub async fn load_voices(&self, language: LanguageCode) -> Result<Vec<Voice>> {
        info!("Loading voices for {}", language);

        let request = SpeechRequest::DescribeVoices(DescribeVoicesInput {
            engine: SpeechEngine::Neural,
            language,
            include_additional_language_codes: false,
        });

        match self.service.send(request).await? {
            SpeechResponse::Voices(voices) => Ok(voices),
            SpeechResponse::Audio(_) => Err(StudioError::UnexpectedResponse("DescribeVoices")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn voice(id: &str, gender: Gender) -> Voice {
        Voice {
            id: id.to_string(),
            name: id.to_string(),
            gender,
        }
    }

    struct CannedService {
        seen: Mutex<Vec<SpeechRequest>>,
        reply: SpeechResponse,
    }

    #[async_trait]
    impl SpeechService for CannedService {
        async fn send(&self, request: SpeechRequest) -> Result<SpeechResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_gender_parsing() {
        assert_eq!(Gender::from("Female"), Gender::Female);
        assert_eq!(Gender::from("Male"), Gender::Male);
        assert_eq!(Gender::from(""), Gender::Unspecified);
        assert_eq!(Gender::from("Neutral"), Gender::Other("Neutral".into()));
    }

    #[test]
    fn test_label() {
        assert_eq!(voice("Kevin", Gender::Male).label(), "Kevin - Male");
    }

    #[test]
    fn test_catalog_keeps_order() {
        let catalog = VoiceCatalog::new(vec![
            voice("Ruth", Gender::Female),
            voice("Kevin", Gender::Male),
        ]);
        assert_eq!(catalog.first().unwrap().id, "Ruth");
        assert!(catalog.contains("Kevin"));
        assert!(!catalog.contains("Lea"));
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_load_voices_sends_neural_request() {
        let service = Arc::new(CannedService {
            seen: Mutex::new(Vec::new()),
            reply: SpeechResponse::Voices(vec![voice("Lea", Gender::Female)]),
        });
        let loader = VoiceCatalogLoader::new(service.clone());

        let voices = loader.load_voices(LanguageCode::FrFr).await.unwrap();
        assert_eq!(voices, vec![voice("Lea", Gender::Female)]);

        let seen = service.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[SpeechRequest::DescribeVoices(DescribeVoicesInput {
                engine: SpeechEngine::Neural,
                language: LanguageCode::FrFr,
                include_additional_language_codes: false,
            })]
        );
    }

    #[tokio::test]
    async fn test_wrong_response_kind_is_an_error() {
        let service = Arc::new(CannedService {
            seen: Mutex::new(Vec::new()),
            reply: SpeechResponse::Audio(crate::client::AudioClip::mpeg(vec![1])),
        });
        let loader = VoiceCatalogLoader::new(service);

        let err = loader.load_voices(LanguageCode::EnUs).await.unwrap_err();
        assert!(matches!(err, StudioError::UnexpectedResponse("DescribeVoices")));
    }
}
