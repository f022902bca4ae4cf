//! Shared study-session state.
//!
//! The timer and music selection outlive any single screen or command, so
//! they live in one observable container. Readers subscribe to a
//! `watch::Receiver`; every write goes through [`SessionHandle::update`] and
//! notifies them. Events produced by timer/music commands are also published
//! on the app-wide broadcast channel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use crate::events::Event;
use crate::music::{AudioSink, MusicError, MusicState};
use crate::timer::CycleTimer;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub timer: CycleTimer,
    #[serde(default)]
    pub music: MusicState,
}

/// Cheap-to-clone handle on the single study session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<watch::Sender<StudySession>>,
    events: broadcast::Sender<Event>,
}

impl SessionHandle {
    pub fn new(session: StudySession, events: broadcast::Sender<Event>) -> Self {
        let (state, _) = watch::channel(session);
        Self {
            state: Arc::new(state),
            events,
        }
    }

    /// Observe every change to the session.
    pub fn subscribe(&self) -> watch::Receiver<StudySession> {
        self.state.subscribe()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> StudySession {
        self.state.borrow().clone()
    }

    /// Mutate the session. Subscribers are notified only when something
    /// actually changed.
    pub fn update<T>(&self, f: impl FnOnce(&mut StudySession) -> T) -> T {
        let mut out = None;
        self.state.send_if_modified(|session| {
            let before = session.clone();
            out = Some(f(session));
            *session != before
        });
        match out {
            Some(value) => value,
            None => unreachable!("send_if_modified always runs its closure"),
        }
    }

    /// Run a timer command and publish its event.
    pub fn timer(&self, command: impl FnOnce(&mut CycleTimer) -> Option<Event>) -> Option<Event> {
        let event = self.update(|session| command(&mut session.timer));
        self.publish(event.as_ref());
        event
    }

    pub fn play_music(&self, index: usize, sink: &mut dyn AudioSink) -> Result<Event, MusicError> {
        let event = self.update(|session| session.music.play(index, sink))?;
        self.publish(Some(&event));
        Ok(event)
    }

    /// Run a pause/resume/stop music command and publish its event.
    pub fn music(
        &self,
        sink: &mut dyn AudioSink,
        command: impl FnOnce(&mut MusicState, &mut dyn AudioSink) -> Option<Event>,
    ) -> Option<Event> {
        let event = self.update(|session| command(&mut session.music, sink));
        self.publish(event.as_ref());
        event
    }

    fn publish(&self, event: Option<&Event>) {
        if let Some(event) = event {
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
    }
}
