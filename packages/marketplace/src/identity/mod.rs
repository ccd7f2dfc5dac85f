//! Boundary to the external identity provider.
//!
//! The provider authenticates credentials, issues sessions, and notifies
//! listeners on session change. Provider-specific error shapes stop here:
//! everything is mapped into the closed [`AuthError`] set before it reaches
//! the session tracker.

pub mod local;
pub mod password;
pub mod token;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors an identity provider can surface.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already in use")]
    EmailInUse,
    #[error("password too weak")]
    WeakPassword,
    #[error("account disabled")]
    AccountDisabled,
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    #[error("identity provider error: {0}")]
    Unknown(String),
}

/// An authenticated provider session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub uid: String,
    pub email: String,
    /// Signed token attesting the session; opaque to this layer.
    pub id_token: String,
}

/// Session-change notification pushed to subscribers.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn { uid: String, email: String },
    SignedOut,
}

/// Callback invoked on every session change.
pub type AuthListener = Arc<dyn Fn(AuthEvent) + Send + Sync>;

/// Handle for an active session-change subscription.
///
/// Dropping the handle (or calling [`unsubscribe`](Subscription::unsubscribe))
/// detaches the listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// External identity provider contract.
///
/// Implementations must invoke a freshly registered listener once with the
/// current session state, then on every subsequent change.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Authenticate an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Trigger the provider's password-reset flow for an email.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Register a session-change listener.
    fn subscribe(&self, listener: AuthListener) -> Subscription;
}
