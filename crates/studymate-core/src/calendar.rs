//! Task calendar with due-date reminders.
//!
//! Tasks are grouped by the local `YYYY-MM-DD` day of their due time. A
//! reminder is scheduled only when the task is created with a due time in the
//! future; deleting a task does not cancel it.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn day_key(&self) -> String {
        day_key(&self.due_at)
    }
}

/// Local calendar day of `at`, as `YYYY-MM-DD`.
pub fn day_key(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).date_naive().format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// Schedules a local reminder.
pub trait Notifier {
    fn schedule(
        &mut self,
        content: NotificationContent,
        trigger_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Records reminders in the log only.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn schedule(
        &mut self,
        content: NotificationContent,
        trigger_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(title = %content.title, body = %content.body, %trigger_at, "reminder scheduled");
        Ok(())
    }
}

/// Used when reminders are turned off; every schedule request is refused.
#[derive(Debug, Default)]
pub struct MutedNotifier;

impl Notifier for MutedNotifier {
    fn schedule(
        &mut self,
        _content: NotificationContent,
        _trigger_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("notifications are disabled".into())
    }
}

/// Tasks keyed by calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCalendar {
    days: BTreeMap<String, Vec<ScheduledTask>>,
}

impl TaskCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task and schedule its reminder if `due_at` is after `now`.
    /// Returns the task and whether a reminder was scheduled.
    pub fn add(
        &mut self,
        title: &str,
        description: Option<&str>,
        due_at: DateTime<Utc>,
        now: DateTime<Utc>,
        notifier: &mut dyn Notifier,
    ) -> Result<(ScheduledTask, bool), ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::Required("title".into()));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let task = ScheduledTask {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description,
            due_at,
        };
        self.days
            .entry(task.day_key())
            .or_default()
            .push(task.clone());

        let scheduled = schedule_reminder(&task, now, notifier);
        Ok((task, scheduled))
    }

    /// Remove a task from a day. Any reminder already scheduled stays.
    pub fn remove(&mut self, id: &str, day: &str) -> Result<ScheduledTask, ValidationError> {
        let not_found = || ValidationError::TaskNotFound {
            id: id.to_string(),
            day: day.to_string(),
        };
        let tasks = self.days.get_mut(day).ok_or_else(not_found)?;
        let index = tasks.iter().position(|t| t.id == id).ok_or_else(not_found)?;
        let task = tasks.remove(index);
        if tasks.is_empty() {
            self.days.remove(day);
        }
        Ok(task)
    }

    pub fn tasks_on(&self, day: &str) -> &[ScheduledTask] {
        self.days.get(day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Days that have at least one task, in order.
    pub fn marked_days(&self) -> impl Iterator<Item = &str> {
        self.days
            .iter()
            .filter(|(_, tasks)| !tasks.is_empty())
            .map(|(day, _)| day.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.days.values().flatten()
    }
}

fn schedule_reminder(task: &ScheduledTask, now: DateTime<Utc>, notifier: &mut dyn Notifier) -> bool {
    if task.due_at <= now {
        return false;
    }
    let local = task.due_at.with_timezone(&Local);
    let content = NotificationContent {
        title: "Task due soon".into(),
        body: format!("{} is due {}", task.title, local.format("%Y-%m-%d %H:%M")),
    };
    match notifier.schedule(content, task.due_at) {
        Ok(()) => true,
        Err(e) => {
            warn!(task = %task.id, error = %e, "failed to schedule reminder");
            false
        }
    }
}
