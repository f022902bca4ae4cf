use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use super::{AuthUser, RemoteStore, RemoteSubject};
use crate::error::RemoteError;

const SERVICE: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    pub subject_id: String,
    pub user_id: String,
    pub content: String,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, (String, AuthUser)>,
    current: Option<AuthUser>,
    subjects: Vec<(String, RemoteSubject)>,
    notes: Vec<StoredNote>,
}

/// Process-local remote store. Can be switched offline to make every call
/// fail, which is also how the CLI runs when no backend is configured.
pub struct InMemoryRemote {
    state: Mutex<State>,
    auth: watch::Sender<Option<AuthUser>>,
    offline: AtomicBool,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        let (auth, _) = watch::channel(None);
        Self {
            state: Mutex::new(State::default()),
            auth,
            offline: AtomicBool::new(false),
        }
    }
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where every call fails.
    pub fn offline() -> Self {
        let store = Self::default();
        store.set_offline(true);
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Notes stored for a subject row, in insertion order.
    pub fn notes_for(&self, remote_id: &str) -> Vec<StoredNote> {
        self.state()
            .notes
            .iter()
            .filter(|n| n.subject_id == remote_id)
            .cloned()
            .collect()
    }

    pub fn subject_count(&self) -> usize {
        self.state().subjects.len()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected {
                service: SERVICE.into(),
                status: 503,
                message: "offline".into(),
            });
        }
        Ok(())
    }

    fn ensure_signed_in(&self, user: &AuthUser) -> Result<(), RemoteError> {
        match &self.state().current {
            Some(current) if current.id == user.id => Ok(()),
            _ => Err(RemoteError::NotAuthenticated),
        }
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), RemoteError> {
        self.ensure_online()?;
        let mut state = self.state();
        if state.accounts.contains_key(email) {
            return Err(RemoteError::Rejected {
                service: SERVICE.into(),
                status: 422,
                message: "User already registered".into(),
            });
        }
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), user));
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        self.ensure_online()?;
        let user = {
            let mut state = self.state();
            let user = match state.accounts.get(email) {
                Some((stored, user)) if stored == password => user.clone(),
                _ => {
                    return Err(RemoteError::Rejected {
                        service: SERVICE.into(),
                        status: 400,
                        message: "Invalid login credentials".into(),
                    })
                }
            };
            state.current = Some(user.clone());
            user
        };
        self.auth.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, RemoteError> {
        self.ensure_online()?;
        Ok(self.state().current.clone())
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.state().current = None;
        self.auth.send_replace(None);
        self.ensure_online()
    }

    fn subscribe_auth(&self) -> watch::Receiver<Option<AuthUser>> {
        self.auth.subscribe()
    }

    async fn list_subjects(&self, user: &AuthUser) -> Result<Vec<RemoteSubject>, RemoteError> {
        self.ensure_online()?;
        self.ensure_signed_in(user)?;
        let mut rows: Vec<RemoteSubject> = self
            .state()
            .subjects
            .iter()
            .filter(|(owner, _)| owner == &user.id)
            .map(|(_, row)| row.clone())
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn create_subject(
        &self,
        user: &AuthUser,
        name: &str,
        emoji: &str,
    ) -> Result<RemoteSubject, RemoteError> {
        self.ensure_online()?;
        self.ensure_signed_in(user)?;
        let mut state = self.state();
        // Strictly increasing timestamps keep creation order stable.
        let created_at = Utc::now() + Duration::microseconds(state.subjects.len() as i64);
        let row = RemoteSubject {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            images: Vec::new(),
            created_at: Some(created_at),
        };
        state.subjects.push((user.id.clone(), row.clone()));
        Ok(row)
    }

    async fn delete_subject(&self, remote_id: &str) -> Result<(), RemoteError> {
        self.ensure_online()?;
        let mut state = self.state();
        state.subjects.retain(|(_, row)| row.id != remote_id);
        state.notes.retain(|n| n.subject_id != remote_id);
        Ok(())
    }

    async fn add_note(
        &self,
        user: &AuthUser,
        remote_id: &str,
        content: &str,
    ) -> Result<(), RemoteError> {
        self.ensure_online()?;
        self.ensure_signed_in(user)?;
        self.state().notes.push(StoredNote {
            subject_id: remote_id.to_string(),
            user_id: user.id.clone(),
            content: content.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn account_lifecycle() {
        let remote = InMemoryRemote::new();
        let rx = remote.subscribe_auth();
        remote.sign_up("a@b.c", "pw").await.unwrap();
        assert!(remote.sign_up("a@b.c", "pw").await.is_err());
        assert!(remote.sign_in("a@b.c", "nope").await.is_err());

        let user = remote.sign_in("a@b.c", "pw").await.unwrap();
        assert_eq!(rx.borrow().as_ref(), Some(&user));
        assert_eq!(remote.current_user().await.unwrap(), Some(user));

        remote.sign_out().await.unwrap();
        assert!(rx.borrow().is_none());
        assert_eq!(remote.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn subjects_are_per_user_and_ordered() {
        let remote = InMemoryRemote::new();
        remote.sign_up("a@b.c", "pw").await.unwrap();
        let user = remote.sign_in("a@b.c", "pw").await.unwrap();
        let first = remote.create_subject(&user, "Math", "📐").await.unwrap();
        remote.create_subject(&user, "Art", "🎨").await.unwrap();
        remote.add_note(&user, &first.id, "limits").await.unwrap();

        let names: Vec<_> = remote
            .list_subjects(&user)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Math", "Art"]);
        assert_eq!(remote.notes_for(&first.id).len(), 1);

        remote.delete_subject(&first.id).await.unwrap();
        assert_eq!(remote.subject_count(), 1);
        assert!(remote.notes_for(&first.id).is_empty());
    }

    #[tokio::test]
    async fn offline_fails_every_call() {
        let remote = InMemoryRemote::offline();
        assert!(matches!(
            remote.sign_up("a@b.c", "pw").await,
            Err(RemoteError::Rejected { status: 503, .. })
        ));
        assert!(remote.current_user().await.is_err());
    }

    #[tokio::test]
    async fn writes_require_the_signed_in_user() {
        let remote = InMemoryRemote::new();
        let stranger = AuthUser {
            id: "x".into(),
            email: None,
        };
        assert!(matches!(
            remote.create_subject(&stranger, "Math", "📐").await,
            Err(RemoteError::NotAuthenticated)
        ));
    }
}
