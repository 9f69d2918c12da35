//! GoTrue-backed `AuthProvider` — password-grant sign-in against the hosted
//! auth REST API, with an in-process session cell and event broadcast.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::provider::{AuthProvider, Session, SessionEvent};
use crate::error::AuthError;

/// Session event fan-out capacity. Listeners that lag re-resolve anyway.
const SESSION_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Auth provider speaking the GoTrue password grant.
pub struct GoTrueAuth {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl GoTrueAuth {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        let (events, _rx) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            base_url: base_url.into(),
            api_key,
            client: reqwest::Client::new(),
            session: RwLock::new(None),
            events,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url.trim_end_matches('/'))
    }

    /// Sign in with email and password. On success the session is stored and
    /// a `SignedIn` event is broadcast.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.api_key.expose_secret())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::UnexpectedResponse {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;

        let session = Session {
            user_id: token.user.id,
            email: token.user.email,
            access_token: SecretString::from(token.access_token),
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        };

        {
            let mut current = self.session.write().await;
            *current = Some(session.clone());
        }
        info!(user_id = %session.user_id, "Signed in");
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));

        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuth {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let session = self.session.read().await;
        Ok(session.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let taken = {
            let mut session = self.session.write().await;
            session.take()
        };
        let Some(session) = taken else {
            return Ok(());
        };

        // Server-side revoke is best-effort; the local session is already
        // cleared either way.
        let result = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(session.access_token.expose_secret())
            .send()
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Logout request failed");
        }

        info!(user_id = %session.user_id, "Signed out");
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_url_handles_trailing_slash() {
        let auth = GoTrueAuth::new(
            "https://example.supabase.co/",
            SecretString::from("anon-key"),
        );
        assert_eq!(
            auth.auth_url("token"),
            "https://example.supabase.co/auth/v1/token"
        );
    }

    #[test]
    fn token_response_parses() {
        let json = r#"{
            "access_token": "jwt-here",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-here",
            "user": {
                "id": "b2f9c6c2-9f37-4f3e-9f2e-0a6a8a0d6f54",
                "email": "owner@example.com"
            }
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.expires_in, Some(3600));
        assert_eq!(token.user.email.as_deref(), Some("owner@example.com"));
    }

    #[tokio::test]
    async fn sign_out_without_session_is_a_noop() {
        let auth = GoTrueAuth::new("https://example.supabase.co", SecretString::from("key"));
        let mut events = auth.subscribe();
        auth.sign_out().await.unwrap();
        assert!(events.try_recv().is_err(), "no event without a session");
    }
}
