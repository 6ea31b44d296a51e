use thiserror::Error;

/// Everything that can go wrong between the form and the speaker.
#[derive(Debug, Error)]
pub enum StudioError {
    /// The provider call failed (network, credentials, throttling...).
    #[error("speech service request failed: {0}")]
    Service(String),

    #[error("unexpected response to {0} request")]
    UnexpectedResponse(&'static str),

    #[error("text is empty")]
    EmptyText,

    #[error("no audio output available")]
    MissingAudioSink,

    #[error("unknown language code: {0}")]
    UnknownLanguage(String),

    #[error("voice {0} is not in the current catalog")]
    UnknownVoice(String),

    #[error("audio output error: {0}")]
    Audio(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, StudioError>;
