use crate::error::{Result, StudioError};
use crate::playback::{AudioResource, AudioSink, PlaybackEvent};
use rodio::{Decoder, OutputStream, Sink};
use std::io::Cursor;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

const END_POLL_INTERVAL: Duration = Duration::from_millis(50);

enum EngineCommand {
    Load(AudioResource),
    Play,
    Pause,
}

/// rodio-backed [`AudioSink`]. The output stream lives on its own thread.
pub struct AudioEngine {
    tx: Sender<EngineCommand>,
}

impl AudioEngine {
    /// Opens the default output device. Fails if there is none.
    pub fn new(volume: f32, events: UnboundedSender<PlaybackEvent>) -> Result<Self> {
        let (tx, rx) = channel::<EngineCommand>();
        let (ready_tx, ready_rx) = channel::<Result<()>>();

        thread::Builder::new()
            .name("polly-audio".into())
            .spawn(move || {
                // Audio stream must live on this thread
                let (_stream, stream_handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(StudioError::Audio(e.to_string())));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                run_audio_thread(rx, &stream_handle, volume, events);
            })
            .map_err(|e| StudioError::Audio(format!("failed to spawn audio thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| StudioError::Audio("audio thread exited during start-up".into()))??;

        info!("Audio output ready");
        Ok(Self { tx })
    }

    fn send(&self, cmd: EngineCommand) -> Result<()> {
        self.tx
            .send(cmd)
            .map_err(|_| StudioError::Audio("audio thread is gone".into()))
    }
}

fn run_audio_thread(
    rx: Receiver<EngineCommand>,
    stream_handle: &rodio::OutputStreamHandle,
    volume: f32,
    events: UnboundedSender<PlaybackEvent>,
) {
    let mut sink: Option<Sink> = None;
    // id of the last resource handed over, even if it failed to decode
    let mut loaded: Option<u64> = None;
    let mut watching = false;

    loop {
        match rx.recv_timeout(END_POLL_INTERVAL) {
            Ok(EngineCommand::Load(resource)) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                watching = false;
                loaded = Some(resource.id);

                let cursor = Cursor::new(resource.clip.bytes.clone());
                let source = match Decoder::new(cursor) {
                    Ok(source) => source,
                    Err(e) => {
                        error!("Failed to decode resource {}: {}", resource.id, e);
                        continue;
                    }
                };
                match Sink::try_new(stream_handle) {
                    Ok(new_sink) => {
                        new_sink.pause();
                        new_sink.set_volume(volume);
                        new_sink.append(source);
                        debug!("Loaded resource {}", resource.id);
                        sink = Some(new_sink);
                    }
                    Err(e) => error!("Failed to create sink: {}", e),
                }
            }
            Ok(EngineCommand::Play) => {
                let Some(id) = loaded else {
                    continue;
                };
                if let Some(s) = &sink {
                    s.play();
                    watching = true;
                    let _ = events.send(PlaybackEvent::Played(id));
                } else {
                    // Nothing decodable was loaded
                    let _ = events.send(PlaybackEvent::Ended(id));
                }
            }
            Ok(EngineCommand::Pause) => {
                if let Some(s) = &sink {
                    s.pause();
                }
                watching = false;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if watching {
            if let (Some(s), Some(id)) = (&sink, loaded) {
                if s.empty() {
                    watching = false;
                    let _ = events.send(PlaybackEvent::Ended(id));
                }
            }
        }
    }

    debug!("Audio thread shutting down");
}

impl AudioSink for AudioEngine {
    fn load(&mut self, resource: AudioResource) -> Result<()> {
        self.send(EngineCommand::Load(resource))
    }

    fn play(&mut self) -> Result<()> {
        self.send(EngineCommand::Play)
    }

    fn pause(&mut self) -> Result<()> {
        self.send(EngineCommand::Pause)
    }
}
