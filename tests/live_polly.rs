//! Tests against the real Amazon Polly service.
//!
//! They need credentials (POLLY_ACCESS_KEY_ID / POLLY_SECRET_ACCESS_KEY or the
//! usual AWS chain) and are ignored by default:
//!
//! ```sh
//! cargo test --test live_polly -- --ignored
//! ```

use polly_studio::client::PollyClient;
use polly_studio::config_loader::Settings;
use polly_studio::language::LanguageCode;
use polly_studio::synth::SpeechSynthesizer;
use polly_studio::voices::VoiceCatalogLoader;
use std::sync::Arc;

#[tokio::test]
#[ignore]
async fn test_live_describe_and_synthesize() {
    let settings = Settings::load(None).expect("Failed to load settings");
    let service = Arc::new(PollyClient::new(&settings).await);

    let voices = VoiceCatalogLoader::new(service.clone())
        .load_voices(LanguageCode::EnUs)
        .await
        .expect("DescribeVoices failed");
    assert!(voices.iter().any(|v| v.id == "Kevin"));

    let clip = SpeechSynthesizer::new(service)
        .synthesize("Hello there.", "Kevin")
        .await
        .expect("SynthesizeSpeech failed");
    assert_eq!(clip.mime_type, "audio/mpeg");
    assert!(!clip.bytes.is_empty());
}
