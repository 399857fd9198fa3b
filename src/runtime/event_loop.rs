use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::audio::{AnalyserHandle, PlaybackState, TransportState};
use crate::config;
use crate::engine::EnginePlayer;
use crate::library::CatalogPoller;
use crate::queue::RepeatMode;

use super::keys::{KeyAction, map_key};

const METER_WIDTH: usize = 10;

/// Read keys, forward them to the engine and keep a one-line status
/// display current. Returns once quit was requested and the engine has
/// faded out.
pub fn run(
    settings: &config::Settings,
    player: &EnginePlayer,
    poller: &CatalogPoller,
    analyser: &AnalyserHandle,
) -> Result<(), Box<dyn std::error::Error>> {
    let playback = player.playback_handle();
    let mut shown = String::new();

    loop {
        let line = match playback.lock() {
            Ok(state) => status_line(&state, analyser.rms()),
            Err(_) => break,
        };
        if line != shown {
            draw(&line)?;
            shown = line;
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match map_key(key, &settings.controls) {
            Some(KeyAction::Intent(intent)) => {
                if player.send(intent).is_err() {
                    break;
                }
            }
            Some(KeyAction::RefreshLibrary) => poller.refresh(),
            Some(KeyAction::Quit) => {
                player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
                break;
            }
            None => {}
        }
    }

    draw("")?;
    Ok(())
}

fn draw(line: &str) -> io::Result<()> {
    let mut out = io::stdout();
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line))?;
    out.flush()
}

fn clock(secs: f64) -> String {
    let s = secs.max(0.0) as u64;
    format!("{}:{:02}", s / 60, s % 60)
}

pub fn status_line(state: &PlaybackState, level: f32) -> String {
    let icon = match state.transport {
        TransportState::Playing => ">",
        TransportState::Paused => "||",
        TransportState::Loading => "..",
        _ => "[]",
    };
    let mut line = match &state.current {
        Some(track) => format!(
            "{icon} {}  {}/{}",
            track.label(),
            clock(state.position),
            clock(state.duration)
        ),
        None => format!("{icon} nothing loaded"),
    };

    if state.muted {
        line.push_str("  muted");
    } else {
        line.push_str(&format!("  vol {:.0}%", state.volume * 100.0));
    }
    if state.shuffle {
        line.push_str("  shuffle");
    }
    match state.repeat {
        RepeatMode::Off => {}
        RepeatMode::All => line.push_str("  repeat all"),
        RepeatMode::One => line.push_str("  repeat one"),
    }
    if state.playing {
        let bars = ((level.clamp(0.0, 1.0) * METER_WIDTH as f32).round() as usize).min(METER_WIDTH);
        line.push_str(&format!("  {}{}", "#".repeat(bars), ".".repeat(METER_WIDTH - bars)));
    }
    if let Some(e) = &state.error {
        line.push_str(&format!("  ! {e}"));
    }
    line
}
