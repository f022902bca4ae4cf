pub mod auth;
pub mod calendar;
pub mod config;
pub mod music;
pub mod profile;
pub mod quiz;
pub mod share;
pub mod streak;
pub mod subject;
pub mod timer;

use std::error::Error;
use std::sync::Arc;

use chrono::Local;
use studymate_core::{
    Companion, Config, InMemoryRemote, LogNotifier, MutedNotifier, Notifier, RemoteStore,
    SqlitePrefs, SubjectId, SupabaseClient,
};
use tracing::warn;

pub type CmdResult = Result<(), Box<dyn Error>>;

/// Open local state, count today's launch and pick up a saved remote
/// session when a backend is configured.
pub async fn open_companion(config: &Config) -> Result<Companion, Box<dyn Error>> {
    let prefs = Box::new(SqlitePrefs::open()?);
    let notifier: Box<dyn Notifier + Send> = if config.notifications.enabled {
        Box::new(LogNotifier)
    } else {
        Box::new(MutedNotifier)
    };

    let supabase = if config.remote.is_configured() {
        Some(Arc::new(SupabaseClient::from_config(&config.remote)?.with_keyring()))
    } else {
        None
    };
    let remote: Arc<dyn RemoteStore> = match &supabase {
        Some(client) => client.clone(),
        None => Arc::new(InMemoryRemote::offline()),
    };

    let mut app = Companion::new(prefs, remote, notifier)
        .with_timer_defaults(config.timer.study_minutes, config.timer.break_minutes);
    app.launch(Local::now().date_naive())?;

    if let Some(client) = supabase {
        if let Err(e) = client.restore().await {
            warn!(error = %e, "could not restore saved session");
        }
        app.poll_auth().await?;
    }
    Ok(app)
}

/// Resolve a subject argument: a full id, a unique id prefix, or a 1-based
/// position in the list.
pub fn resolve_subject(app: &Companion, arg: &str) -> Result<SubjectId, Box<dyn Error>> {
    let arg = arg.trim();
    if let Some(subject) = app.subjects().iter().find(|s| s.id.as_str() == arg) {
        return Ok(subject.id.clone());
    }
    if let Ok(position) = arg.parse::<usize>() {
        if let Some(subject) = position
            .checked_sub(1)
            .and_then(|i| app.subjects().iter().nth(i))
        {
            return Ok(subject.id.clone());
        }
    }
    let mut matches = app
        .subjects()
        .iter()
        .filter(|s| !arg.is_empty() && s.id.as_str().starts_with(arg));
    match (matches.next(), matches.next()) {
        (Some(subject), None) => Ok(subject.id.clone()),
        (Some(_), Some(_)) => Err(format!("subject id prefix '{arg}' is ambiguous").into()),
        (None, _) => Err(format!("no subject matches '{arg}'").into()),
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
