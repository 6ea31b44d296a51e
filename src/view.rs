//! Terminal rendition of the form: one command per line on stdin, the form
//! redrawn on stdout after anything changes.

use crate::client::AudioClip;
use crate::error::Result;
use crate::language::LanguageCode;
use crate::playback::PlaybackEvent;
use crate::studio::{ListenRequest, Studio, StudioState, VoiceLoad};
use crate::voices::Voice;
use std::fmt::Write as _;
use std::io::ErrorKind;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::warn;

pub const HELP: &str = "\
Commands:
  text <utterance>   replace the text to speak
  lang <code>        switch language (e.g. en-US, fr_FR)
  voice <id>         pick a voice from the list
  listen             synthesize and play
  stop               pause playback
  languages          list language codes
  show               redraw the form
  help               this message
  quit               leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Text(String),
    Language(String),
    Voice(String),
    Listen,
    Stop,
    Languages,
    Show,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            return None;
        }

        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest),
            None => (trimmed, ""),
        };

        let cmd = match word.to_lowercase().as_str() {
            // text keeps inner and trailing whitespace; an empty argument clears it
            "text" => Command::Text(rest.to_string()),
            "lang" | "language" => Command::Language(rest.trim().to_string()),
            "voice" => Command::Voice(rest.trim().to_string()),
            "listen" | "play" => Command::Listen,
            "stop" => Command::Stop,
            "languages" => Command::Languages,
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        };
        Some(cmd)
    }
}

/// Results of spawned network calls, applied back on the view loop.
#[derive(Debug)]
pub enum StudioEvent {
    VoicesLoaded(VoiceLoad, Result<Vec<Voice>>),
    SpeechReady(ListenRequest, Result<AudioClip>),
}

pub fn render(state: &StudioState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Text:     {}", state.text);
    let _ = writeln!(out, "Language: {}", state.language);

    if state.voices_loading {
        let _ = writeln!(out, "Voices:   (loading...)");
    } else if state.catalog.is_empty() {
        let _ = writeln!(out, "Voices:   (none)");
    } else {
        let _ = writeln!(out, "Voices:");
        for voice in state.catalog.voices() {
            let marker = if state.selected_voice.as_deref() == Some(voice.id.as_str()) {
                '*'
            } else {
                ' '
            };
            let _ = writeln!(out, "  {} {:<12} {}", marker, voice.id, voice.label());
        }
    }

    let listen = if state.listen_enabled() {
        "[Listen]"
    } else {
        "[Listen (disabled)]"
    };
    if state.stop_visible() {
        let _ = writeln!(out, "{}  [Stop]  {:?}", listen, state.playback);
    } else {
        let _ = writeln!(out, "{}", listen);
    }
    out
}

pub fn render_languages() -> String {
    LanguageCode::ALL
        .iter()
        .map(|code| code.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

fn spawn_voice_load(studio: &mut Studio, tx: &UnboundedSender<StudioEvent>) {
    let load = studio.begin_voice_load();
    let loader = studio.loader();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = loader.load_voices(load.language).await;
        let _ = tx.send(StudioEvent::VoicesLoaded(load, result));
    });
}

fn spawn_listen(studio: &mut Studio, tx: &UnboundedSender<StudioEvent>) {
    let Some(request) = studio.begin_listen() else {
        return;
    };
    let synthesizer = studio.synthesizer();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = synthesizer
            .synthesize(&request.text, &request.voice_id)
            .await;
        let _ = tx.send(StudioEvent::SpeechReady(request, result));
    });
}

/// Applies one command. Returns text to print, or `None` to quit.
pub fn apply_command(
    studio: &mut Studio,
    command: Command,
    tx: &UnboundedSender<StudioEvent>,
) -> Option<String> {
    let reply = match command {
        Command::Text(text) => {
            studio.set_text(text);
            render(studio.state())
        }
        Command::Language(code) => match code.parse::<LanguageCode>() {
            Ok(language) => {
                if studio.set_language(language) {
                    spawn_voice_load(studio, tx);
                }
                render(studio.state())
            }
            Err(e) => format!("{}\n", e),
        },
        Command::Voice(id) => {
            if !studio.state().voice_selector_enabled() {
                "Voice list is loading\n".to_string()
            } else {
                match studio.select_voice(&id) {
                    Ok(()) => render(studio.state()),
                    Err(e) => format!("{}\n", e),
                }
            }
        }
        Command::Listen => {
            spawn_listen(studio, tx);
            render(studio.state())
        }
        Command::Stop => {
            studio.stop();
            render(studio.state())
        }
        Command::Languages => render_languages(),
        Command::Show => render(studio.state()),
        Command::Help => HELP.to_string(),
        Command::Quit => return None,
        Command::Unknown(line) => {
            warn!("Ignoring unknown command: {}", line);
            format!("Unknown command: {}\n{}", line, HELP)
        }
    };
    Some(reply)
}

pub fn apply_event(studio: &mut Studio, event: StudioEvent) {
    match event {
        StudioEvent::VoicesLoaded(load, result) => {
            studio.finish_voice_load(load, result);
        }
        StudioEvent::SpeechReady(request, result) => studio.finish_listen(request, result),
    }
}

/// Interactive loop over stdin. Loads the initial catalog first.
pub async fn run(
    studio: Studio,
    playback_events: UnboundedReceiver<PlaybackEvent>,
) -> std::io::Result<()> {
    run_with(
        studio,
        playback_events,
        tokio::io::stdin(),
        tokio::io::stdout(),
    )
    .await
}

/// Same loop as [`run`] over any reader and writer. A line that is not
/// valid UTF-8 is skipped; other read errors end the loop.
pub async fn run_with<R, W>(
    mut studio: Studio,
    mut playback_events: UnboundedReceiver<PlaybackEvent>,
    input: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = unbounded_channel::<StudioEvent>();
    let mut lines = BufReader::new(input).lines();

    spawn_voice_load(&mut studio, &tx);
    writer.write_all(HELP.as_bytes()).await?;
    writer.write_all(render(studio.state()).as_bytes()).await?;
    writer.flush().await?;

    loop {
        let output = tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break, // EOF
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        warn!("Skipping unreadable input line: {}", e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                match apply_command(&mut studio, command, &tx) {
                    Some(reply) => reply,
                    None => break,
                }
            }
            Some(event) = rx.recv() => {
                apply_event(&mut studio, event);
                render(studio.state())
            }
            Some(event) = playback_events.recv() => {
                let before = studio.state().playback;
                studio.handle_playback_event(event);
                if studio.state().playback == before {
                    continue;
                }
                render(studio.state())
            }
        };

        writer.write_all(output.as_bytes()).await?;
        writer.flush().await?;
    }

    studio.stop();
    Ok(())
}
