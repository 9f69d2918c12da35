//! `AuthProvider` trait — the authentication collaborator seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AuthError;

/// An authenticated session issued by the auth collaborator.
///
/// The gate only keys off `user_id`; the rest rides along for the store
/// backend (bearer token) and display.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Authentication-state change signal.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}

/// Backend-agnostic authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, if any. Absence is a state, not an error.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Subscribe to session-change events. Every event must trigger a fresh
    /// sequencer resolve; decisions are never carried across events.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Terminate the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}
