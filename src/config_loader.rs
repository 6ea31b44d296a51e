use crate::language::LanguageCode;
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // Provider
    pub region: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    // Initial form values
    pub default_text: String,
    pub default_language: String,
    pub default_voice: String,
    // Output
    pub enable_audio: bool,
    pub playback_volume: f32, // 0.0 - 1.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: "eu-west-3".to_string(),
            access_key_id: None,
            secret_access_key: None,
            profile: None,
            default_text: "Hello there.".to_string(),
            default_language: "en-US".to_string(),
            default_voice: "Kevin".to_string(),
            enable_audio: true,
            playback_volume: 1.0,
        }
    }
}

impl Settings {
    /// Defaults, then `PollyStudio.*` in the working directory, then the
    /// user config dir, then `explicit` (must exist if given), then `POLLY_*`
    /// environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("region", "eu-west-3")?
            .set_default("default_text", "Hello there.")?
            .set_default("default_language", "en-US")?
            .set_default("default_voice", "Kevin")?
            .set_default("enable_audio", true)?
            .set_default("playback_volume", 1.0)?
            .add_source(File::with_name("PollyStudio").required(false));

        if let Some(dir) = dirs::config_dir() {
            let user_file = dir.join("polly-studio").join("PollyStudio");
            builder = builder.add_source(File::from(user_file).required(false));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        // e.g. POLLY_REGION, POLLY_ACCESS_KEY_ID, POLLY_SECRET_ACCESS_KEY
        builder = builder.add_source(config::Environment::with_prefix("POLLY"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.playback_volume < 0.0 || self.playback_volume > 1.0 {
            return Err(config::ConfigError::Message(format!(
                "Invalid playback_volume: {}. Must be between 0.0 and 1.0",
                self.playback_volume
            )));
        }
        if self.region.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "region must not be empty".to_string(),
            ));
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(config::ConfigError::Message(
                "access_key_id and secret_access_key must be set together".to_string(),
            ));
        }
        self.language()?;
        Ok(())
    }

    pub fn language(&self) -> Result<LanguageCode, config::ConfigError> {
        self.default_language
            .parse()
            .map_err(|e: crate::error::StudioError| config::ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_KEYS: &[&str] = &[
        "POLLY_REGION",
        "POLLY_ACCESS_KEY_ID",
        "POLLY_SECRET_ACCESS_KEY",
        "POLLY_PLAYBACK_VOLUME",
        "POLLY_DEFAULT_LANGUAGE",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_load() {
        clear_env();
        let settings = Settings::load(None).expect("Failed to load settings");
        assert!(!settings.region.is_empty());
        assert!(settings.playback_volume <= 1.0);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("POLLY_REGION", "us-west-2");
        std::env::set_var("POLLY_ACCESS_KEY_ID", "AKIDEXAMPLE");
        std::env::set_var("POLLY_SECRET_ACCESS_KEY", "secret");

        let settings = Settings::load(None);
        clear_env();

        let settings = settings.unwrap();
        assert_eq!(settings.region, "us-west-2");
        assert_eq!(settings.access_key_id.as_deref(), Some("AKIDEXAMPLE"));
        assert_eq!(settings.secret_access_key.as_deref(), Some("secret"));
    }

    #[test]
    #[serial]
    fn test_explicit_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "default_language = \"fr_FR\"").unwrap();
        writeln!(file, "default_voice = \"Lea\"").unwrap();
        writeln!(file, "playback_volume = 0.5").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.language().unwrap(), LanguageCode::FrFr);
        assert_eq!(settings.default_voice, "Lea");
        assert_eq!(settings.playback_volume, 0.5);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_fails() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.playback_volume = 1.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.access_key_id = Some("AKID".into());
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.default_language = "klingon".into();
        assert!(settings.validate().is_err());
    }
}
