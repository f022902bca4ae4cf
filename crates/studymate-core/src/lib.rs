//! # Studymate Core Library
//!
//! This library provides the core logic for Studymate, a study companion.
//! All operations are available through the standalone `studymate` CLI; any
//! other front end is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer**: A tick-driven study/break state machine. [`TimerDriver`]
//!   supplies the one-second ticks from a scoped tokio task.
//! - **Session**: An observable container for the timer and music state
//!   shared by every view.
//! - **Subjects**: Notes, images, files and content sections per subject,
//!   addressed by stable id.
//! - **Storage**: SQLite-backed preference store and TOML configuration
//! - **Remote**: Supabase auth and subject rows behind [`RemoteStore`]
//! - **Quiz**: Prompt building and a Gemini client behind [`GenerativeModel`]
//!
//! ## Key Components
//!
//! - [`Companion`]: Root state owner for profile, subjects, streak and tasks
//! - [`CycleTimer`]: Core timer state machine
//! - [`SessionHandle`]: Shared timer/music state with change notification
//! - [`Config`]: Application configuration management

pub mod app;
pub mod calendar;
pub mod error;
pub mod events;
pub mod music;
pub mod quiz;
pub mod remote;
pub mod session;
pub mod share;
pub mod storage;
pub mod streak;
pub mod subject;
pub mod timer;

pub use app::{Companion, ImportChoice, ImportOutcome, PendingImport, UserProfile};
pub use calendar::{LogNotifier, MutedNotifier, Notifier, ScheduledTask, TaskCalendar};
pub use error::{ConfigError, CoreError, QuizError, RemoteError, ShareError, StoreError, ValidationError};
pub use events::Event;
pub use music::{AudioSink, MusicState, SystemOpenerSink, PLAYLIST};
pub use quiz::{GeminiClient, GenerativeModel, QuizConfig, QuizGenerator};
pub use remote::{AuthUser, InMemoryRemote, RemoteStore, SupabaseClient};
pub use session::{SessionHandle, StudySession};
pub use storage::{Config, MemoryPrefs, PreferenceStore, SqlitePrefs};
pub use streak::{StreakOutcome, StreakRecord};
pub use subject::{FileAttachment, Subject, SubjectId, SubjectList};
pub use timer::{CycleTimer, Phase, TimerDriver};
