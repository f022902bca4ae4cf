//! The companion: single owner of everything the user sees.
//!
//! `Companion` holds the profile, subject list, streak, task calendar and
//! auth state, mirrors them to the preference store after every change, and
//! talks to the remote store when a user is signed in. Remote failures never
//! fail a local operation; they are logged and the local change stands.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::calendar::{Notifier, ScheduledTask, TaskCalendar};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::quiz::{GenerativeModel, QuizGenerator};
use crate::remote::{AuthUser, RemoteStore, RemoteSubject};
use crate::session::{SessionHandle, StudySession};
use crate::share::{self, SharedSubject};
use crate::storage::{keys, load_json, save_json, PreferenceStore};
use crate::streak::{self, StreakOutcome, StreakRecord};
use crate::subject::{FileAttachment, Subject, SubjectId, SubjectList};
use crate::timer::CycleTimer;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
}

impl UserProfile {
    pub fn new(name: &str, age: &str) -> std::result::Result<Self, ValidationError> {
        let name = required("name", name)?;
        let age = required("age", age)?;
        let age = age.parse::<u32>().map_err(|_| ValidationError::InvalidValue {
            field: "age".into(),
            message: format!("'{age}' is not a whole number"),
        })?;
        Ok(Self {
            name: name.to_string(),
            age,
        })
    }
}

/// An import that collided with an existing subject of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImport {
    incoming: SharedSubject,
    existing: SubjectId,
}

impl PendingImport {
    pub fn name(&self) -> &str {
        &self.incoming.name
    }

    pub fn existing(&self) -> &SubjectId {
        &self.existing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Added(SubjectId),
    /// Nothing changed; call [`Companion::resolve_import`].
    Conflict(PendingImport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportChoice {
    Overwrite,
    Discard,
}

pub struct Companion {
    prefs: Box<dyn PreferenceStore + Send>,
    remote: Arc<dyn RemoteStore>,
    notifier: Box<dyn Notifier + Send>,
    auth_rx: watch::Receiver<Option<AuthUser>>,
    events: broadcast::Sender<Event>,
    session: SessionHandle,
    timer_defaults: (u32, u32),
    profile: Option<UserProfile>,
    subjects: SubjectList,
    streak: Option<StreakRecord>,
    calendar: TaskCalendar,
    user: Option<AuthUser>,
}

impl Companion {
    pub fn new(
        prefs: Box<dyn PreferenceStore + Send>,
        remote: Arc<dyn RemoteStore>,
        notifier: Box<dyn Notifier + Send>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let auth_rx = remote.subscribe_auth();
        let defaults = CycleTimer::default();
        Self {
            prefs,
            remote,
            notifier,
            auth_rx,
            session: SessionHandle::new(StudySession::default(), events.clone()),
            events,
            timer_defaults: (defaults.study_minutes(), defaults.break_minutes()),
            profile: None,
            subjects: SubjectList::new(),
            streak: None,
            calendar: TaskCalendar::new(),
            user: None,
        }
    }

    /// Durations for a session that was never saved.
    pub fn with_timer_defaults(mut self, study_minutes: u32, break_minutes: u32) -> Self {
        self.timer_defaults = (study_minutes, break_minutes);
        self
    }

    /// Load persisted state and count today's launch toward the streak.
    pub fn launch(&mut self, today: NaiveDate) -> Result<StreakOutcome> {
        let store = self.prefs.as_ref();
        self.profile = load_json(store, keys::PROFILE)?;
        self.subjects = load_json(store, keys::SUBJECTS)?.unwrap_or_default();
        self.calendar = load_json(store, keys::TASKS)?.unwrap_or_default();
        let previous: Option<StreakRecord> = load_json(store, keys::STREAK)?;
        let session = load_json(store, keys::SESSION)?.unwrap_or_else(|| StudySession {
            timer: CycleTimer::new(self.timer_defaults.0, self.timer_defaults.1),
            ..StudySession::default()
        });
        self.session.update(|s| *s = session);

        let outcome = streak::advance(previous.as_ref(), today);
        let record = outcome.record();
        self.streak = Some(record);
        if outcome.changed() {
            save_json(self.prefs.as_ref(), keys::STREAK, &record)?;
            self.emit(Event::StreakUpdated {
                days: record.days,
                at: Utc::now(),
            });
        }
        info!(
            subjects = self.subjects.len(),
            streak = record.days,
            "companion launched"
        );
        Ok(outcome)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn subjects(&self) -> &SubjectList {
        &self.subjects
    }

    pub fn subject(&self, id: &SubjectId) -> Result<&Subject> {
        self.subjects
            .get(id)
            .ok_or_else(|| ValidationError::SubjectNotFound(id.to_string()).into())
    }

    pub fn streak(&self) -> Option<&StreakRecord> {
        self.streak.as_ref()
    }

    pub fn calendar(&self) -> &TaskCalendar {
        &self.calendar
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// Write the study session so the next run picks it up.
    pub fn save_session(&self) -> Result<()> {
        save_json(self.prefs.as_ref(), keys::SESSION, &self.session.snapshot())
    }

    // --- account ---------------------------------------------------------

    /// Create a remote account and store the profile locally.
    pub async fn register(&mut self, email: &str, password: &str, name: &str, age: &str) -> Result<()> {
        let email = required("email", email)?;
        let password = required("password", password)?;
        let profile = UserProfile::new(name, age)?;

        self.remote.sign_up(email, password).await?;
        save_json(self.prefs.as_ref(), keys::PROFILE, &profile)?;
        info!(name = %profile.name, "registered");
        self.profile = Some(profile);
        Ok(())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthUser> {
        let email = required("email", email)?;
        let password = required("password", password)?;
        let user = self.remote.sign_in(email, password).await?;
        self.auth_rx.mark_unchanged();
        self.handle_auth_change(Some(user.clone())).await?;
        Ok(user)
    }

    /// Resume a session the remote store already holds.
    pub async fn resume(&mut self) -> Result<Option<AuthUser>> {
        let user = match self.remote.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "could not check remote session");
                None
            }
        };
        self.auth_rx.mark_unchanged();
        if user.is_some() {
            self.handle_auth_change(user.clone()).await?;
        }
        Ok(user)
    }

    /// Apply an auth change the remote store announced since the last call.
    /// Returns whether there was one.
    pub async fn poll_auth(&mut self) -> Result<bool> {
        if !self.auth_rx.has_changed().unwrap_or(false) {
            return Ok(false);
        }
        let user = self.auth_rx.borrow_and_update().clone();
        self.handle_auth_change(user).await?;
        Ok(true)
    }

    pub async fn handle_auth_change(&mut self, user: Option<AuthUser>) -> Result<()> {
        match user {
            Some(user) => {
                self.emit(Event::SignedIn {
                    user_id: user.id.clone(),
                    at: Utc::now(),
                });
                match self.remote.list_subjects(&user).await {
                    Ok(rows) => {
                        self.commit_subjects(|list| {
                            merge_remote(list, rows);
                            Ok(())
                        })?;
                        debug!(count = self.subjects.len(), "subjects loaded from remote");
                    }
                    Err(e) => warn!(error = %e, "could not load remote subjects"),
                }
                self.user = Some(user);
            }
            None => {
                self.user = None;
                self.subjects.clear();
                self.emit(Event::SignedOut { at: Utc::now() });
            }
        }
        Ok(())
    }

    /// Sign out and forget everything stored locally.
    pub async fn logout(&mut self) -> Result<()> {
        if let Err(e) = self.remote.sign_out().await {
            warn!(error = %e, "remote sign-out failed");
        }
        self.auth_rx.mark_unchanged();
        self.prefs.clear()?;
        self.profile = None;
        self.streak = None;
        self.calendar = TaskCalendar::new();
        let (study, brk) = self.timer_defaults;
        self.session.update(|s| {
            *s = StudySession {
                timer: CycleTimer::new(study, brk),
                ..StudySession::default()
            }
        });
        self.handle_auth_change(None).await
    }

    pub fn update_profile(&mut self, name: &str, age: &str) -> Result<()> {
        let profile = UserProfile::new(name, age)?;
        save_json(self.prefs.as_ref(), keys::PROFILE, &profile)?;
        self.profile = Some(profile);
        Ok(())
    }

    // --- subjects --------------------------------------------------------

    /// Create a subject, remotely when signed in. Falls back to a local-only
    /// subject on any remote failure.
    pub async fn create_subject(&mut self, name: &str, emoji: &str) -> Result<SubjectId> {
        let mut subject = Subject::new(name, emoji)?;
        if let Some(user) = &self.user {
            match self
                .remote
                .create_subject(user, &subject.name, &subject.emoji)
                .await
            {
                Ok(row) => subject = subject.with_remote_id(row.id),
                Err(e) => warn!(name = %subject.name, error = %e, "remote create failed, keeping subject local"),
            }
        }
        let name = subject.name.clone();
        let remote_id = subject.remote_id.clone();
        let id = match self.commit_subjects(|list| Ok(list.push(subject))) {
            Ok(id) => id,
            Err(e) => {
                if let Some(remote_id) = &remote_id {
                    if let Err(undo) = self.remote.delete_subject(remote_id).await {
                        warn!(%remote_id, error = %undo, "could not undo remote create");
                    }
                }
                return Err(e);
            }
        };
        self.emit(Event::SubjectCreated {
            id: id.clone(),
            name,
            synced: remote_id.is_some(),
            at: Utc::now(),
        });
        Ok(id)
    }

    pub async fn remove_subject(&mut self, id: &SubjectId) -> Result<Subject> {
        let removed = self.commit_subjects(|list| list.remove(id))?;
        if let Some(remote_id) = &removed.remote_id {
            if let Err(e) = self.remote.delete_subject(remote_id).await {
                warn!(%remote_id, error = %e, "remote delete failed");
            }
        }
        self.emit(Event::SubjectRemoved {
            id: removed.id.clone(),
            name: removed.name.clone(),
            at: Utc::now(),
        });
        Ok(removed)
    }

    pub async fn add_note(&mut self, id: &SubjectId, text: &str) -> Result<String> {
        let note = self.commit_subjects(|list| list.add_note(id, text))?;
        let remote_id = self.subjects.get(id).and_then(|s| s.remote_id.clone());
        if let (Some(user), Some(remote_id)) = (&self.user, remote_id) {
            if let Err(e) = self.remote.add_note(user, &remote_id, &note).await {
                warn!(%remote_id, error = %e, "remote note failed");
            }
        }
        self.updated(id);
        Ok(note)
    }

    pub fn add_images(&mut self, id: &SubjectId, uris: Vec<String>) -> Result<()> {
        self.commit_subjects(|list| list.add_images(id, uris))?;
        self.updated(id);
        Ok(())
    }

    pub fn add_files(&mut self, id: &SubjectId, files: Vec<FileAttachment>) -> Result<()> {
        self.commit_subjects(|list| list.add_files(id, files))?;
        self.updated(id);
        Ok(())
    }

    pub fn remove_image(&mut self, id: &SubjectId, index: usize) -> Result<String> {
        let uri = self.commit_subjects(|list| list.remove_image(id, index))?;
        self.updated(id);
        Ok(uri)
    }

    pub fn remove_file(&mut self, id: &SubjectId, index: usize) -> Result<FileAttachment> {
        let file = self.commit_subjects(|list| list.remove_file(id, index))?;
        self.updated(id);
        Ok(file)
    }

    pub fn remove_note(&mut self, id: &SubjectId, index: usize) -> Result<String> {
        let note = self.commit_subjects(|list| list.remove_note(id, index))?;
        self.updated(id);
        Ok(note)
    }

    pub fn add_section(&mut self, id: &SubjectId, name: &str) -> Result<()> {
        self.commit_subjects(|list| list.add_section(id, name))?;
        self.updated(id);
        Ok(())
    }

    pub fn rename_section(&mut self, id: &SubjectId, index: usize, name: &str) -> Result<()> {
        self.commit_subjects(|list| list.rename_section(id, index, name))?;
        self.updated(id);
        Ok(())
    }

    /// Quiz text for a subject, or the fixed failure message.
    pub async fn quiz<M: GenerativeModel>(
        &self,
        id: &SubjectId,
        generator: &QuizGenerator<M>,
    ) -> Result<String> {
        let subject = self.subject(id)?;
        Ok(generator.generate(subject).await)
    }

    // --- sharing ---------------------------------------------------------

    pub fn export(&self, id: &SubjectId) -> Result<String> {
        Ok(share::encode(self.subject(id)?))
    }

    /// Decode a payload and add it, unless a subject with the same name
    /// already exists.
    pub fn import(&mut self, payload: &str) -> Result<ImportOutcome> {
        let incoming = share::decode(payload)?;
        if let Some(existing) = self.subjects.find_by_name(&incoming.name) {
            debug!(name = %incoming.name, "import conflicts with existing subject");
            return Ok(ImportOutcome::Conflict(PendingImport {
                existing: existing.id.clone(),
                incoming,
            }));
        }
        let id = self.add_imported(incoming, None)?;
        Ok(ImportOutcome::Added(id))
    }

    /// Finish a conflicting import. Overwrite replaces the existing subject
    /// in place with the incoming one.
    pub fn resolve_import(
        &mut self,
        pending: PendingImport,
        choice: ImportChoice,
    ) -> Result<Option<SubjectId>> {
        match choice {
            ImportChoice::Discard => Ok(None),
            ImportChoice::Overwrite => {
                let id = self.add_imported(pending.incoming, Some(&pending.existing))?;
                Ok(Some(id))
            }
        }
    }

    fn add_imported(&mut self, incoming: SharedSubject, replace: Option<&SubjectId>) -> Result<SubjectId> {
        let subject = incoming.into_subject();
        let name = subject.name.clone();
        let id = subject.id.clone();
        let replaced = self.commit_subjects(|list| match replace {
            Some(existing) if list.get(existing).is_some() => {
                list.replace(existing, subject).map(|_| true)
            }
            _ => {
                list.push(subject);
                Ok(false)
            }
        })?;
        info!(%name, replaced, "subject imported");
        self.emit(Event::SubjectImported {
            id: id.clone(),
            name,
            replaced,
            at: Utc::now(),
        });
        Ok(id)
    }

    // --- calendar --------------------------------------------------------

    pub fn add_task(
        &mut self,
        title: &str,
        description: Option<&str>,
        due_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ScheduledTask> {
        let mut next = self.calendar.clone();
        let (task, scheduled) = next.add(title, description, due_at, now, self.notifier.as_mut())?;
        save_json(self.prefs.as_ref(), keys::TASKS, &next)?;
        self.calendar = next;
        self.emit(Event::TaskAdded {
            id: task.id.clone(),
            day: task.day_key(),
            notification_scheduled: scheduled,
            at: Utc::now(),
        });
        Ok(task)
    }

    pub fn remove_task(&mut self, id: &str, day: &str) -> Result<ScheduledTask> {
        let mut next = self.calendar.clone();
        let task = next.remove(id, day)?;
        save_json(self.prefs.as_ref(), keys::TASKS, &next)?;
        self.calendar = next;
        self.emit(Event::TaskRemoved {
            id: task.id.clone(),
            day: day.to_string(),
            at: Utc::now(),
        });
        Ok(task)
    }

    // --- internals -------------------------------------------------------

    /// Apply `change` to a copy of the list, store the copy, then make it
    /// current. On any error the list in memory is left as it was.
    fn commit_subjects<T>(
        &mut self,
        change: impl FnOnce(&mut SubjectList) -> std::result::Result<T, ValidationError>,
    ) -> Result<T> {
        let mut next = self.subjects.clone();
        let out = change(&mut next)?;
        save_json(self.prefs.as_ref(), keys::SUBJECTS, &next)?;
        self.subjects = next;
        Ok(out)
    }

    fn updated(&self, id: &SubjectId) {
        self.emit(Event::SubjectUpdated {
            id: id.clone(),
            at: Utc::now(),
        });
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Rebuild the list from the remote rows. Subjects already linked to a row
/// keep their local content; subjects that never reached the remote store
/// (imports, offline fallbacks) are kept after the remote ones.
fn merge_remote(list: &mut SubjectList, rows: Vec<RemoteSubject>) {
    let mut local = std::mem::take(list);
    let mut merged: Vec<Subject> = rows
        .into_iter()
        .map(|row| {
            let linked = local
                .iter()
                .find(|s| s.remote_id.as_deref() == Some(row.id.as_str()))
                .map(|s| s.id.clone());
            match linked.and_then(|id| local.remove(&id).ok()) {
                Some(mut subject) => {
                    subject.name = row.name;
                    subject.emoji = row.emoji;
                    subject
                }
                None => Subject {
                    id: SubjectId::new(),
                    remote_id: Some(row.id),
                    name: row.name,
                    emoji: row.emoji,
                    images: row.images,
                    files: Vec::new(),
                    notes: Vec::new(),
                    sections: Vec::new(),
                },
            }
        })
        .collect();
    merged.extend(local.into_iter().filter(|s| s.remote_id.is_none()));
    *list = SubjectList::from_vec(merged);
}

fn required<'a>(field: &str, value: &'a str) -> std::result::Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field.to_string()));
    }
    Ok(value)
}
