use clap::Subcommand;
use studymate_core::music::MusicState;
use studymate_core::{Config, SystemOpenerSink, PLAYLIST};

use super::{open_companion, print_json, CmdResult};

#[derive(Subcommand)]
pub enum MusicAction {
    /// List the ambient tracks
    List,
    /// Play track N (1-based)
    Play { track: usize },
    /// Pause playback
    Pause,
    /// Resume playback
    Resume,
    /// Stop and unload the track
    Stop,
}

pub async fn run(action: MusicAction) -> CmdResult {
    let app = open_companion(&Config::load()?).await?;
    let session = app.session();
    let mut sink = SystemOpenerSink;

    let event = match action {
        MusicAction::List => {
            let current = session.snapshot().music;
            for (i, track) in PLAYLIST.iter().enumerate() {
                let marker = match (current.loaded && current.current_track == i, current.active) {
                    (true, true) => "▶",
                    (true, false) => "⏸",
                    _ => " ",
                };
                println!("{marker} {}. {} {}", i + 1, track.emoji, track.name);
            }
            return Ok(());
        }
        MusicAction::Play { track } => {
            let index = track.checked_sub(1).ok_or("tracks start at 1")?;
            Some(session.play_music(index, &mut sink)?)
        }
        MusicAction::Pause => session.music(&mut sink, MusicState::pause),
        MusicAction::Resume => session.music(&mut sink, MusicState::resume),
        MusicAction::Stop => session.music(&mut sink, MusicState::stop),
    };

    app.save_session()?;
    match event {
        Some(event) => print_json(&event),
        None => {
            println!("nothing to do");
            Ok(())
        }
    }
}
