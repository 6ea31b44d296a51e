//! Playback state machine over an injected audio sink.
//!
//! ```text
//!   Idle --begin_loading--> Loading --start / Played--> Playing
//!    ^                         |                           |
//!    +------ fail_loading -----+                           |
//!    +-------------------- Ended / stop -------------------+
//! ```

use crate::client::AudioClip;
use crate::error::{Result, StudioError};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
}

/// Reported by a sink when the output actually starts or runs dry. Carries
/// the id of the [`AudioResource`] it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Played(u64),
    Ended(u64),
}

/// A playable handle derived from one synthesized clip.
#[derive(Debug, Clone)]
pub struct AudioResource {
    pub id: u64,
    pub clip: Arc<AudioClip>,
}

/// Platform audio output. Implementations report `Played`/`Ended` through
/// whatever event channel they were built with.
pub trait AudioSink: Send {
    /// Replace whatever is loaded with `resource`, paused.
    fn load(&mut self, resource: AudioResource) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    /// Pause without rewinding.
    fn pause(&mut self) -> Result<()>;
}

pub struct PlaybackController {
    sink: Option<Box<dyn AudioSink>>,
    state: PlaybackState,
    current: Option<AudioResource>,
    // resource started since the last begin_loading/stop; events for any
    // other id are stale
    live: Option<u64>,
    next_resource_id: u64,
    loads: u64,
}

impl PlaybackController {
    pub fn new(sink: Option<Box<dyn AudioSink>>) -> Self {
        Self {
            sink,
            state: PlaybackState::Idle,
            current: None,
            live: None,
            next_resource_id: 1,
            loads: 0,
        }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current(&self) -> Option<&AudioResource> {
        self.current.as_ref()
    }

    /// How many resources have been handed to the sink so far.
    pub fn loads(&self) -> u64 {
        self.loads
    }

    pub fn begin_loading(&mut self) -> bool {
        if self.sink.is_none() || self.state != PlaybackState::Idle {
            return false;
        }
        self.state = PlaybackState::Loading;
        self.live = None;
        true
    }

    pub fn fail_loading(&mut self) {
        if self.state == PlaybackState::Loading {
            self.state = PlaybackState::Idle;
        }
    }

    /// Load the clip as a fresh resource and start it. The previous resource
    /// is released once the sink has taken the new one.
    pub fn start(&mut self, clip: AudioClip) -> Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            self.state = PlaybackState::Idle;
            return Err(StudioError::MissingAudioSink);
        };

        let resource = AudioResource {
            id: self.next_resource_id,
            clip: Arc::new(clip),
        };
        self.next_resource_id += 1;

        let loaded = sink.load(resource.clone());
        self.loads += 1;
        if let Err(e) = loaded {
            error!("Failed to load audio resource {}: {}", resource.id, e);
            self.state = PlaybackState::Idle;
            return Err(e);
        }

        let id = resource.id;
        if let Some(old) = self.current.replace(resource) {
            debug!("Released audio resource {}", old.id);
        }
        self.live = Some(id);

        if let Err(e) = sink.play() {
            error!("Failed to start playback: {}", e);
            self.state = PlaybackState::Idle;
            self.live = None;
            return Err(e);
        }

        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Pause and go Idle. No-op without a sink.
    pub fn stop(&mut self) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(e) = sink.pause() {
            warn!("Failed to pause playback: {}", e);
        }
        self.state = PlaybackState::Idle;
        self.live = None;
    }

    pub fn handle_event(&mut self, event: PlaybackEvent) {
        match (event, self.state) {
            (PlaybackEvent::Played(id), PlaybackState::Loading) if self.live == Some(id) => {
                self.state = PlaybackState::Playing
            }
            (PlaybackEvent::Ended(id), PlaybackState::Playing) if self.live == Some(id) => {
                self.state = PlaybackState::Idle;
                self.live = None;
            }
            (event, state) => debug!("Ignoring {:?} while {:?}", event, state),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum SinkCall {
        Load(u64),
        Play,
        Pause,
    }

    /// Records every call; optionally fails loads.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        pub calls: Arc<Mutex<Vec<SinkCall>>>,
        pub fail_load: bool,
    }

    impl AudioSink for RecordingSink {
        fn load(&mut self, resource: AudioResource) -> Result<()> {
            self.calls.lock().unwrap().push(SinkCall::Load(resource.id));
            if self.fail_load {
                return Err(StudioError::Audio("cannot decode".into()));
            }
            Ok(())
        }

        fn play(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push(SinkCall::Play);
            Ok(())
        }

        fn pause(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push(SinkCall::Pause);
            Ok(())
        }
    }

    fn controller() -> (PlaybackController, Arc<Mutex<Vec<SinkCall>>>) {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        (PlaybackController::new(Some(Box::new(sink))), calls)
    }

    #[test]
    fn test_full_cycle() {
        let (mut pc, calls) = controller();
        assert!(pc.begin_loading());
        assert_eq!(pc.state(), PlaybackState::Loading);

        pc.start(AudioClip::mpeg(vec![0xff])).unwrap();
        assert_eq!(pc.state(), PlaybackState::Playing);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![SinkCall::Load(1), SinkCall::Play]
        );

        pc.handle_event(PlaybackEvent::Ended(1));
        assert_eq!(pc.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_begin_loading_refused_when_busy_or_sinkless() {
        let (mut pc, _) = controller();
        assert!(pc.begin_loading());
        assert!(!pc.begin_loading());

        let mut sinkless = PlaybackController::new(None);
        assert!(!sinkless.begin_loading());
        assert_eq!(sinkless.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_new_clip_replaces_resource() {
        let (mut pc, _) = controller();
        pc.begin_loading();
        pc.start(AudioClip::mpeg(vec![1])).unwrap();
        pc.stop();
        pc.begin_loading();
        pc.start(AudioClip::mpeg(vec![2])).unwrap();

        let current = pc.current().unwrap();
        assert_eq!(current.id, 2);
        assert_eq!(current.clip.bytes, vec![2]);
        assert_eq!(pc.loads(), 2);
    }

    #[test]
    fn test_load_failure_returns_to_idle() {
        let sink = RecordingSink {
            fail_load: true,
            ..Default::default()
        };
        let mut pc = PlaybackController::new(Some(Box::new(sink)));
        pc.begin_loading();
        assert!(pc.start(AudioClip::mpeg(vec![1])).is_err());
        assert_eq!(pc.state(), PlaybackState::Idle);
        assert!(pc.current().is_none());
    }

    #[test]
    fn test_stop_pauses_and_idles() {
        let (mut pc, calls) = controller();
        pc.begin_loading();
        pc.start(AudioClip::mpeg(vec![1])).unwrap();
        pc.stop();
        assert_eq!(pc.state(), PlaybackState::Idle);
        assert_eq!(calls.lock().unwrap().last(), Some(&SinkCall::Pause));
    }

    #[test]
    fn test_stop_without_sink_is_noop() {
        let mut pc = PlaybackController::new(None);
        pc.stop();
        assert_eq!(pc.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_events_only_apply_in_matching_state() {
        let (mut pc, _) = controller();
        pc.handle_event(PlaybackEvent::Played(1));
        assert_eq!(pc.state(), PlaybackState::Idle);

        pc.begin_loading();
        pc.handle_event(PlaybackEvent::Ended(1));
        assert_eq!(pc.state(), PlaybackState::Loading);

        pc.start(AudioClip::mpeg(vec![1])).unwrap();
        pc.handle_event(PlaybackEvent::Played(1));
        assert_eq!(pc.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_events_from_previous_resource_are_ignored() {
        let (mut pc, _) = controller();
        pc.begin_loading();
        pc.start(AudioClip::mpeg(vec![1])).unwrap();
        pc.stop();

        // resource 1 reported Played before the pause reached the sink
        pc.begin_loading();
        pc.handle_event(PlaybackEvent::Played(1));
        assert_eq!(pc.state(), PlaybackState::Loading);

        pc.start(AudioClip::mpeg(vec![2])).unwrap();
        assert_eq!(pc.state(), PlaybackState::Playing);
        assert_eq!(pc.loads(), 2);

        pc.handle_event(PlaybackEvent::Ended(1));
        assert_eq!(pc.state(), PlaybackState::Playing);
        pc.handle_event(PlaybackEvent::Ended(2));
        assert_eq!(pc.state(), PlaybackState::Idle);
    }
}
