//! Form state and the setters that drive it.
//!
//! Network calls are split into `begin_*` / `finish_*` halves so a caller
//! can run the request on another task and apply the result later. Each
//! request carries a generation; a result whose generation is no longer
//! current is dropped.

use crate::client::{AudioClip, SpeechService};
use crate::config_loader::Settings;
use crate::error::{Result, StudioError};
use crate::language::LanguageCode;
use crate::playback::{AudioSink, PlaybackController, PlaybackEvent, PlaybackState};
use crate::synth::SpeechSynthesizer;
use crate::voices::{Voice, VoiceCatalog, VoiceCatalogLoader};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq)]
pub struct StudioState {
    pub text: String,
    pub language: LanguageCode,
    pub catalog: VoiceCatalog,
    pub selected_voice: Option<String>,
    pub voices_loading: bool,
    pub playback: PlaybackState,
}

impl StudioState {
    pub fn listen_enabled(&self) -> bool {
        !self.text.is_empty()
            && !self.voices_loading
            && self.playback == PlaybackState::Idle
            && self
                .selected_voice
                .as_deref()
                .is_some_and(|id| self.catalog.contains(id))
    }

    pub fn stop_visible(&self) -> bool {
        matches!(
            self.playback,
            PlaybackState::Loading | PlaybackState::Playing
        )
    }

    pub fn voice_selector_enabled(&self) -> bool {
        !self.voices_loading
    }
}

/// A voice catalog request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceLoad {
    pub generation: u64,
    pub language: LanguageCode,
}

/// A synthesis request in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenRequest {
    pub generation: u64,
    pub text: String,
    pub voice_id: String,
}

pub struct Studio {
    state: StudioState,
    loader: VoiceCatalogLoader,
    synthesizer: SpeechSynthesizer,
    playback: PlaybackController,
    voice_generation: u64,
    listen_generation: u64,
}

impl Studio {
    pub fn new(
        service: Arc<dyn SpeechService>,
        sink: Option<Box<dyn AudioSink>>,
        settings: &Settings,
    ) -> Result<Self> {
        let language = settings.language()?;
        Ok(Self {
            state: StudioState {
                text: settings.default_text.clone(),
                language,
                catalog: VoiceCatalog::default(),
                selected_voice: Some(settings.default_voice.clone()),
                voices_loading: false,
                playback: PlaybackState::Idle,
            },
            loader: VoiceCatalogLoader::new(service.clone()),
            synthesizer: SpeechSynthesizer::new(service),
            playback: PlaybackController::new(sink),
            voice_generation: 0,
            listen_generation: 0,
        })
    }

    pub fn state(&self) -> &StudioState {
        &self.state
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn loader(&self) -> VoiceCatalogLoader {
        self.loader.clone()
    }

    pub fn synthesizer(&self) -> SpeechSynthesizer {
        self.synthesizer.clone()
    }

    pub fn selected(&self) -> Option<&Voice> {
        self.state
            .selected_voice
            .as_deref()
            .and_then(|id| self.state.catalog.get(id))
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.state.text = text.into();
    }

    /// Returns true if the language actually changed; the caller then owes
    /// a voice reload.
    pub fn set_language(&mut self, language: LanguageCode) -> bool {
        if self.state.language == language {
            return false;
        }
        self.state.language = language;
        true
    }

    pub fn select_voice(&mut self, id: &str) -> Result<()> {
        if !self.state.catalog.contains(id) {
            return Err(StudioError::UnknownVoice(id.to_string()));
        }
        self.state.selected_voice = Some(id.to_string());
        Ok(())
    }

    pub fn begin_voice_load(&mut self) -> VoiceLoad {
        self.voice_generation += 1;
        self.state.voices_loading = true;
        VoiceLoad {
            generation: self.voice_generation,
            language: self.state.language,
        }
    }

    /// Applies a finished catalog load. Returns false if it was stale.
    pub fn finish_voice_load(&mut self, load: VoiceLoad, result: Result<Vec<Voice>>) -> bool {
        if load.generation != self.voice_generation {
            debug!(
                "Discarding stale voice list for {} (generation {}, current {})",
                load.language, load.generation, self.voice_generation
            );
            return false;
        }

        self.state.voices_loading = false;
        match result {
            Ok(voices) => {
                info!("Loaded {} voices for {}", voices.len(), load.language);
                self.state.catalog = VoiceCatalog::new(voices);
                self.state.selected_voice = self.state.catalog.first().map(|v| v.id.clone());
            }
            Err(e) => {
                error!("Failed to load voices for {}: {}", load.language, e);
                self.state.catalog = VoiceCatalog::default();
                self.state.selected_voice = None;
            }
        }
        true
    }

    pub async fn reload_voices(&mut self) {
        let load = self.begin_voice_load();
        let result = self.loader.load_voices(load.language).await;
        self.finish_voice_load(load, result);
    }

    /// Moves playback to Loading and hands back what to synthesize. `None`
    /// when Listen is disabled or there is no audio output.
    pub fn begin_listen(&mut self) -> Option<ListenRequest> {
        if !self.playback.has_sink() {
            debug!("Listen ignored: no audio output");
            return None;
        }
        if !self.state.listen_enabled() {
            debug!("Listen ignored: disabled");
            return None;
        }
        let voice_id = self.state.selected_voice.clone()?;
        if !self.playback.begin_loading() {
            return None;
        }
        self.sync_playback();

        self.listen_generation += 1;
        Some(ListenRequest {
            generation: self.listen_generation,
            text: self.state.text.clone(),
            voice_id,
        })
    }

    pub fn finish_listen(&mut self, request: ListenRequest, result: Result<AudioClip>) {
        if request.generation != self.listen_generation
            || self.playback.state() != PlaybackState::Loading
        {
            debug!("Discarding synthesis result for request {}", request.generation);
            return;
        }

        match result {
            Ok(clip) => {
                if let Err(e) = self.playback.start(clip) {
                    error!("Playback failed: {}", e);
                }
            }
            Err(e) => {
                error!("Synthesis failed: {}", e);
                self.playback.fail_loading();
            }
        }
        self.sync_playback();
    }

    pub async fn listen(&mut self) {
        let Some(request) = self.begin_listen() else {
            return;
        };
        let result = self
            .synthesizer
            .synthesize(&request.text, &request.voice_id)
            .await;
        self.finish_listen(request, result);
    }

    /// Pauses playback and returns to Idle. A synthesis still in flight is
    /// dropped when it arrives.
    pub fn stop(&mut self) {
        if !self.playback.has_sink() {
            return;
        }
        self.listen_generation += 1;
        self.playback.stop();
        self.sync_playback();
    }

    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        self.playback.handle_event(event);
        self.sync_playback();
    }

    fn sync_playback(&mut self) {
        self.state.playback = self.playback.state();
    }
}
