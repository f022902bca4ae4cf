//! Ambient study music.
//!
//! The playlist is fixed. Playback itself happens in an [`AudioSink`]; this
//! module only tracks which track is loaded and whether it is playing.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::Event;

/// Volume used for every track (0.0 ..= 1.0).
pub const DEFAULT_VOLUME: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Track {
    pub name: &'static str,
    pub url: &'static str,
    pub emoji: &'static str,
}

/// Royalty-free ambient loops.
pub static PLAYLIST: [Track; 4] = [
    Track {
        name: "Soft Rain",
        url: "https://assets.mixkit.co/active_storage/sfx/2390/2390-preview.mp3",
        emoji: "🌧️",
    },
    Track {
        name: "Dark",
        url: "https://assets.mixkit.co/active_storage/sfx/2500/2500-preview.mp3",
        emoji: "🌙",
    },
    Track {
        name: "Ocean Waves",
        url: "https://assets.mixkit.co/active_storage/sfx/2393/2393-preview.mp3",
        emoji: "🌊",
    },
    Track {
        name: "Nature",
        url: "https://assets.mixkit.co/active_storage/sfx/2473/2473-preview.mp3",
        emoji: "🌿",
    },
];

/// Something that can actually make noise.
pub trait AudioSink: Send {
    /// Unload whatever is loaded and start `url`.
    fn load(
        &mut self,
        url: &str,
        looping: bool,
        volume: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn pause(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn resume(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Hands the track URL to the OS default handler. Pause/resume/stop are left
/// to that external player.
#[derive(Debug, Default)]
pub struct SystemOpenerSink;

impl AudioSink for SystemOpenerSink {
    fn load(
        &mut self,
        url: &str,
        _looping: bool,
        _volume: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        open::that(url)?;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        debug!("pause requested; external player owns playback");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        debug!("resume requested; external player owns playback");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        debug!("stop requested; external player owns playback");
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum MusicError {
    #[error("No track #{index} (playlist has {len})")]
    UnknownTrack { index: usize, len: usize },

    #[error("Could not play \"{track}\". The URL may be unavailable; try another track. ({reason})")]
    Playback { track: String, reason: String },
}

/// What the music panel shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicState {
    pub active: bool,
    pub current_track: usize,
    pub loaded: bool,
}

impl MusicState {
    pub fn current(&self) -> Option<&'static Track> {
        self.loaded.then(|| &PLAYLIST[self.current_track.min(PLAYLIST.len() - 1)])
    }

    /// Load and start a track. On sink failure the state is left untouched.
    pub fn play(&mut self, index: usize, sink: &mut dyn AudioSink) -> Result<Event, MusicError> {
        let track = PLAYLIST.get(index).ok_or(MusicError::UnknownTrack {
            index,
            len: PLAYLIST.len(),
        })?;
        if self.loaded {
            if let Err(e) = sink.stop() {
                warn!(error = %e, "failed to unload previous track");
            }
        }
        sink.load(track.url, true, DEFAULT_VOLUME).map_err(|e| {
            warn!(track = track.name, error = %e, "failed to start music");
            MusicError::Playback {
                track: track.name.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.current_track = index;
        self.loaded = true;
        self.active = true;
        Ok(Event::MusicStarted {
            track: index,
            name: track.name.to_string(),
            at: Utc::now(),
        })
    }

    /// Nothing happens when no track is loaded.
    pub fn pause(&mut self, sink: &mut dyn AudioSink) -> Option<Event> {
        if !self.loaded {
            return None;
        }
        if let Err(e) = sink.pause() {
            warn!(error = %e, "failed to pause music");
            return None;
        }
        self.active = false;
        Some(Event::MusicPaused { at: Utc::now() })
    }

    pub fn resume(&mut self, sink: &mut dyn AudioSink) -> Option<Event> {
        if !self.loaded {
            return None;
        }
        if let Err(e) = sink.resume() {
            warn!(error = %e, "failed to resume music");
            return None;
        }
        self.active = true;
        Some(Event::MusicResumed { at: Utc::now() })
    }

    pub fn stop(&mut self, sink: &mut dyn AudioSink) -> Option<Event> {
        if !self.loaded {
            return None;
        }
        if let Err(e) = sink.stop() {
            warn!(error = %e, "failed to stop music");
            return None;
        }
        self.loaded = false;
        self.active = false;
        Some(Event::MusicStopped { at: Utc::now() })
    }
}
