use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Bearer-token session for a signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Holds the current session in memory and mirrors it to a local file so
/// it survives process restarts.
pub struct SessionStore {
    path: PathBuf,
    session: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open the store, loading any session persisted by a previous run.
    pub fn open(path: PathBuf) -> Self {
        let session = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok());
        if session.is_some() {
            info!("Restored session from {}", path.display());
        }
        Self {
            path,
            session: RwLock::new(session),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn put(&self, session: Session) {
        if let Ok(raw) = serde_json::to_string(&session) {
            if let Err(e) = fs::write(&self.path, raw) {
                warn!("Could not persist session: {e}");
            }
        }
        *self.session.write() = Some(session);
    }

    pub fn clear(&self) {
        *self.session.write() = None;
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("Could not remove persisted session: {e}");
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

/// Email/password auth against the backend's GoTrue endpoints.
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    sessions: std::sync::Arc<SessionStore>,
}

impl AuthClient {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        sessions: std::sync::Arc<SessionStore>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            sessions,
        }
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.base_url)
    }

    pub fn sessions(&self) -> std::sync::Arc<SessionStore> {
        std::sync::Arc::clone(&self.sessions)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
        full_name: &str,
        bio: Option<&str>,
    ) -> Result<Session, EngineError> {
        if email.is_empty() || password.is_empty() || username.is_empty() {
            return Err(EngineError::Validation(
                "email, password and username are required".into(),
            ));
        }
        let body = json!({
            "email": email,
            "password": password,
            "data": {
                "username": username,
                "full_name": full_name,
                "bio": bio.unwrap_or(""),
            },
        });
        let session = self.token_request("signup", &body).await?;
        self.sessions.put(session.clone());
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, EngineError> {
        if email.is_empty() || password.is_empty() {
            return Err(EngineError::Validation("email and password are required".into()));
        }
        let body = json!({ "email": email, "password": password });
        let session = self
            .token_request("token?grant_type=password", &body)
            .await?;
        self.sessions.put(session.clone());
        Ok(session)
    }

    /// Signing out with no active session is a successful no-op, as is
    /// the backend reporting the session already gone.
    pub async fn sign_out(&self) -> Result<(), EngineError> {
        let Some(session) = self.sessions.current() else {
            debug!("No active session to sign out from");
            return Ok(());
        };

        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await;

        self.sessions.clear();

        match response {
            Ok(r) if r.status().is_success() || r.status().as_u16() == 401 => Ok(()),
            Ok(r) => Err(EngineError::Auth(format!("sign-out failed: {}", r.status()))),
            Err(e) => Err(EngineError::Auth(e.to_string())),
        }
    }

    async fn token_request(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<Session, EngineError> {
        let response = self
            .http
            .post(self.auth_url(endpoint))
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| EngineError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Auth(format!("auth returned {status}: {body}")));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| EngineError::Auth(e.to_string()))?;

        let meta = &token.user.user_metadata;
        Ok(Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email,
            username: meta
                .get("username")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            full_name: meta
                .get("full_name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            bio: meta.get("bio").and_then(|v| v.as_str()).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session_path() -> PathBuf {
        std::env::temp_dir().join(format!("session_{}.json", uuid::Uuid::new_v4()))
    }

    fn session() -> Session {
        Session {
            access_token: "tok".into(),
            user_id: "u1".into(),
            email: "a@b.c".into(),
            username: "dancer".into(),
            full_name: "A Dancer".into(),
            bio: None,
        }
    }

    #[test]
    fn session_survives_reopen() {
        let path = temp_session_path();
        let store = SessionStore::open(path.clone());
        assert!(store.current().is_none());
        store.put(session());

        let reopened = SessionStore::open(path.clone());
        let restored = reopened.current().unwrap();
        assert_eq!(restored.user_id, "u1");
        assert_eq!(restored.access_token, "tok");

        reopened.clear();
        assert!(!path.exists());
    }

    #[test]
    fn clear_without_file_is_fine() {
        let store = SessionStore::open(temp_session_path());
        store.clear();
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn sign_out_without_session_is_a_noop() {
        let sessions = std::sync::Arc::new(SessionStore::open(temp_session_path()));
        // Unroutable backend: sign_out must not even attempt the call
        let auth = AuthClient::new("http://127.0.0.1:1", "anon", sessions);
        auth.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn sign_in_rejects_empty_credentials_before_any_remote_call() {
        let sessions = std::sync::Arc::new(SessionStore::open(temp_session_path()));
        let auth = AuthClient::new("http://127.0.0.1:1", "anon", sessions);
        let err = auth.sign_in("", "pw").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
