//! Supabase adapter: GoTrue auth plus PostgREST rows.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use super::{keyring_store, AuthUser, RemoteStore, RemoteSubject};
use crate::error::{ConfigError, RemoteError};
use crate::storage::RemoteConfig;

const SERVICE: &str = "supabase";
const SESSION_KEY: &str = "supabase_session";
const SUBJECT_COLUMNS: &str = "id,nombre,emoji,imagenes,created_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

pub struct SupabaseClient {
    http: Client,
    base: Url,
    anon_key: String,
    session: Mutex<Option<StoredSession>>,
    auth: watch::Sender<Option<AuthUser>>,
    persist: bool,
}

impl SupabaseClient {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
        let normalized = format!("{}/", url.trim().trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
            key: "remote.url".into(),
            message: e.to_string(),
        })?;
        let (auth, _) = watch::channel(None);
        Ok(Self {
            http: Client::new(),
            base,
            anon_key: anon_key.into(),
            session: Mutex::new(None),
            auth,
            persist: false,
        })
    }

    pub fn from_config(cfg: &RemoteConfig) -> Result<Self, ConfigError> {
        if cfg.url.is_empty() {
            return Err(ConfigError::MissingKey("remote.url".into()));
        }
        if cfg.anon_key.is_empty() {
            return Err(ConfigError::MissingKey("remote.anon_key".into()));
        }
        Self::new(&cfg.url, &cfg.anon_key)
    }

    /// Keep the session in the OS keyring so it survives restarts.
    pub fn with_keyring(mut self) -> Self {
        self.persist = true;
        self
    }

    /// Load a session saved by a previous run and check it is still valid.
    pub async fn restore(&self) -> Result<Option<AuthUser>, RemoteError> {
        if !self.persist {
            return Ok(None);
        }
        let Some(raw) = keyring_store::get(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => *self.session() = Some(stored),
            Err(e) => {
                warn!(error = %e, "discarding unreadable saved session");
                keyring_store::delete(SESSION_KEY)?;
                return Ok(None);
            }
        }
        let user = self.current_user().await?;
        if user.is_some() {
            self.auth.send_replace(user.clone());
        }
        Ok(user)
    }

    fn session(&self) -> MutexGuard<'_, Option<StoredSession>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn access_token(&self) -> Option<String> {
        self.session().as_ref().map(|s| s.access_token.clone())
    }

    fn set_session(&self, session: Option<StoredSession>) {
        if self.persist {
            let saved = match &session {
                Some(s) => serde_json::to_string(s)
                    .map_err(|e| RemoteError::Credentials(e.to_string()))
                    .and_then(|raw| keyring_store::set(SESSION_KEY, &raw)),
                None => keyring_store::delete(SESSION_KEY),
            };
            if let Err(e) = saved {
                warn!(error = %e, "failed to update saved session");
            }
        }
        let user = session.as_ref().map(|s| s.user.clone());
        *self.session() = session;
        self.auth.send_replace(user);
    }

    fn request(&self, method: Method, path: &str, bearer: &str) -> Result<RequestBuilder, RemoteError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| RemoteError::UnexpectedResponse(e.to_string()))?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer))
    }

    /// A request on behalf of the signed-in user.
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let token = self.access_token().ok_or(RemoteError::NotAuthenticated)?;
        self.request(method, path, &token)
    }
}

async fn check(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or(body);
    Err(RemoteError::Rejected {
        service: SERVICE.into(),
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), RemoteError> {
        let resp = self
            .request(Method::POST, "auth/v1/signup", &self.anon_key)?
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        check(resp).await?;
        info!(email, "account created");
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        let resp = self
            .request(Method::POST, "auth/v1/token", &self.anon_key)?
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let token: TokenResponse = check(resp).await?.json().await?;
        let user = token.user.clone();
        self.set_session(Some(StoredSession {
            access_token: token.access_token,
            user: token.user,
        }));
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, RemoteError> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };
        let resp = self
            .request(Method::GET, "auth/v1/user", &token)?
            .send()
            .await?;
        match check(resp).await {
            Ok(resp) => Ok(Some(resp.json().await?)),
            Err(RemoteError::Rejected { status: 401 | 403, .. }) => {
                debug!("saved session expired");
                self.set_session(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let Some(token) = self.access_token() else {
            return Ok(());
        };
        let result = match self.request(Method::POST, "auth/v1/logout", &token)?.send().await {
            Ok(resp) => check(resp).await.map(drop),
            Err(e) => Err(e.into()),
        };
        // The local session ends even if the server call failed.
        self.set_session(None);
        result
    }

    fn subscribe_auth(&self) -> watch::Receiver<Option<AuthUser>> {
        self.auth.subscribe()
    }

    async fn list_subjects(&self, user: &AuthUser) -> Result<Vec<RemoteSubject>, RemoteError> {
        let user_filter = format!("eq.{}", user.id);
        let resp = self
            .authed(Method::GET, "rest/v1/materias")?
            .query(&[
                ("select", SUBJECT_COLUMNS),
                ("user_id", user_filter.as_str()),
                ("order", "created_at.asc"),
            ])
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn create_subject(
        &self,
        user: &AuthUser,
        name: &str,
        emoji: &str,
    ) -> Result<RemoteSubject, RemoteError> {
        let resp = self
            .authed(Method::POST, "rest/v1/materias")?
            .header("Prefer", "return=representation")
            .json(&json!([{ "user_id": user.id, "nombre": name, "emoji": emoji }]))
            .send()
            .await?;
        let rows: Vec<RemoteSubject> = check(resp).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::UnexpectedResponse("insert returned no rows".into()))
    }

    async fn delete_subject(&self, remote_id: &str) -> Result<(), RemoteError> {
        let id_filter = format!("eq.{remote_id}");
        let resp = self
            .authed(Method::DELETE, "rest/v1/materias")?
            .query(&[("id", id_filter.as_str())])
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn add_note(
        &self,
        user: &AuthUser,
        remote_id: &str,
        content: &str,
    ) -> Result<(), RemoteError> {
        let resp = self
            .authed(Method::POST, "rest/v1/notas")?
            .json(&json!([{ "materia_id": remote_id, "user_id": user.id, "contenido": content }]))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}
