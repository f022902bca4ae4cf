//! Remote subject store.
//!
//! Signed-in users keep their subjects and notes in a hosted backend. The
//! client is constructed once and handed to [`crate::Companion`]; nothing in
//! the crate reaches for a global instance.

mod memory;
mod supabase;

pub mod keyring_store;

pub use memory::{InMemoryRemote, StoredNote};
pub use supabase::SupabaseClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::watch;

use crate::error::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A row of the `materias` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubject {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub emoji: String,
    #[serde(rename = "imagenes", default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Authentication plus subject/note rows.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create an account. Does not sign in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), RemoteError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError>;

    async fn current_user(&self) -> Result<Option<AuthUser>, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// Observe sign-in and sign-out.
    fn subscribe_auth(&self) -> watch::Receiver<Option<AuthUser>>;

    /// The user's subjects, oldest first.
    async fn list_subjects(&self, user: &AuthUser) -> Result<Vec<RemoteSubject>, RemoteError>;

    async fn create_subject(
        &self,
        user: &AuthUser,
        name: &str,
        emoji: &str,
    ) -> Result<RemoteSubject, RemoteError>;

    async fn delete_subject(&self, remote_id: &str) -> Result<(), RemoteError>;

    async fn add_note(
        &self,
        user: &AuthUser,
        remote_id: &str,
        content: &str,
    ) -> Result<(), RemoteError>;
}
