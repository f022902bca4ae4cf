use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::subject::SubjectId;
use crate::timer::Phase;

/// Every state change in the system produces an Event.
/// Front ends subscribe to them through [`crate::Companion::subscribe`] or
/// read them back from timer commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// The countdown hit zero while running and the other phase began.
    PhaseChanged {
        from: Phase,
        to: Phase,
        seconds_remaining: u32,
        completed_cycles: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    DurationsAdjusted {
        study_minutes: u32,
        break_minutes: u32,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        running: bool,
        clock: String,
        seconds_remaining: u32,
        study_minutes: u32,
        break_minutes: u32,
        completed_cycles: u32,
        at: DateTime<Utc>,
    },
    MusicStarted {
        track: usize,
        name: String,
        at: DateTime<Utc>,
    },
    MusicPaused {
        at: DateTime<Utc>,
    },
    MusicResumed {
        at: DateTime<Utc>,
    },
    MusicStopped {
        at: DateTime<Utc>,
    },
    StreakUpdated {
        days: u32,
        at: DateTime<Utc>,
    },
    SubjectCreated {
        id: SubjectId,
        name: String,
        synced: bool,
        at: DateTime<Utc>,
    },
    SubjectUpdated {
        id: SubjectId,
        at: DateTime<Utc>,
    },
    SubjectRemoved {
        id: SubjectId,
        name: String,
        at: DateTime<Utc>,
    },
    SubjectImported {
        id: SubjectId,
        name: String,
        replaced: bool,
        at: DateTime<Utc>,
    },
    TaskAdded {
        id: String,
        day: String,
        notification_scheduled: bool,
        at: DateTime<Utc>,
    },
    TaskRemoved {
        id: String,
        day: String,
        at: DateTime<Utc>,
    },
    SignedIn {
        user_id: String,
        at: DateTime<Utc>,
    },
    SignedOut {
        at: DateTime<Utc>,
    },
}
