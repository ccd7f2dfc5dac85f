use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    AuthError, AuthEvent, AuthListener, AuthSession, IdentityProvider, Subscription, password,
    token,
};

/// Failed sign-in attempts allowed per email within the rate window.
const MAX_FAILED_ATTEMPTS: usize = 5;

/// Rate-limit window for failed sign-ins.
const RATE_WINDOW_SECS: i64 = 60;

struct AccountRecord {
    uid: String,
    email: String,
    password_hash: String,
    disabled: bool,
}

/// In-process identity provider for local development and tests.
///
/// Implements the same observable behavior as the hosted provider: argon2
/// password hashes, signed session tokens, per-email rate limiting on
/// failed sign-ins, and session-change events (including the initial
/// callback on subscribe).
pub struct LocalIdentityProvider {
    accounts: DashMap<String, AccountRecord>,
    listeners: Arc<DashMap<u64, AuthListener>>,
    next_listener_id: AtomicU64,
    current: RwLock<Option<(String, String)>>,
    failed_attempts: DashMap<String, Vec<DateTime<Utc>>>,
    token_secret: String,
    token_ttl_hours: i64,
}

impl LocalIdentityProvider {
    pub fn new(token_secret: impl Into<String>, token_ttl_hours: i64) -> Self {
        Self {
            accounts: DashMap::new(),
            listeners: Arc::new(DashMap::new()),
            next_listener_id: AtomicU64::new(0),
            current: RwLock::new(None),
            failed_attempts: DashMap::new(),
            token_secret: token_secret.into(),
            token_ttl_hours,
        }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Create an account without signing it in. Used for seeding.
    pub async fn create_account(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = Self::normalize_email(email);
        if password.len() < 8 {
            return Err(AuthError::WeakPassword);
        }

        let hash = password::hash_password(password)
            .map_err(|e| AuthError::Unknown(e.to_string()))?;
        let uid = Uuid::now_v7().to_string();

        match self.accounts.entry(email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AuthError::EmailInUse),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(AccountRecord {
                    uid: uid.clone(),
                    email,
                    password_hash: hash,
                    disabled: false,
                });
                Ok(uid)
            }
        }
    }

    /// Disable an account so further sign-ins fail with `AccountDisabled`.
    pub fn set_disabled(&self, email: &str, disabled: bool) -> bool {
        let email = Self::normalize_email(email);
        match self.accounts.get_mut(&email) {
            Some(mut record) => {
                record.disabled = disabled;
                true
            }
            None => false,
        }
    }

    fn emit(&self, event: AuthEvent) {
        let listeners: Vec<AuthListener> = self
            .listeners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    fn set_current(&self, session: Option<(String, String)>) {
        let event = match &session {
            Some((uid, email)) => AuthEvent::SignedIn {
                uid: uid.clone(),
                email: email.clone(),
            },
            None => AuthEvent::SignedOut,
        };
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = session;
        self.emit(event);
    }

    fn check_rate_limit(&self, email: &str) -> Result<(), AuthError> {
        let cutoff = Utc::now() - Duration::seconds(RATE_WINDOW_SECS);
        if let Some(mut attempts) = self.failed_attempts.get_mut(email) {
            attempts.retain(|t| *t > cutoff);
            if attempts.len() >= MAX_FAILED_ATTEMPTS {
                let retry_after = attempts
                    .first()
                    .map(|oldest| {
                        let expires = *oldest + Duration::seconds(RATE_WINDOW_SECS);
                        (expires - Utc::now()).num_seconds().max(1) as u64
                    })
                    .unwrap_or(RATE_WINDOW_SECS as u64);
                return Err(AuthError::RateLimited { retry_after });
            }
        }
        Ok(())
    }

    fn record_failure(&self, email: &str) {
        self.failed_attempts
            .entry(email.to_string())
            .or_default()
            .push(Utc::now());
    }

    fn issue_session(&self, uid: &str, email: &str) -> Result<AuthSession, AuthError> {
        let id_token = token::sign(uid, email, &self.token_secret, self.token_ttl_hours)
            .map_err(|e| AuthError::Unknown(e.to_string()))?;
        Ok(AuthSession {
            uid: uid.to_string(),
            email: email.to_string(),
            id_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let uid = self.create_account(email, password).await?;
        let email = Self::normalize_email(email);

        let session = self.issue_session(&uid, &email)?;
        info!(%uid, "Account created");
        self.set_current(Some((uid, email)));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = Self::normalize_email(email);
        self.check_rate_limit(&email)?;

        let Some(record) = self.accounts.get(&email) else {
            self.record_failure(&email);
            return Err(AuthError::InvalidCredentials);
        };

        if record.disabled {
            return Err(AuthError::AccountDisabled);
        }

        let valid = password::verify_password(password, &record.password_hash)
            .map_err(|e| AuthError::Unknown(e.to_string()))?;
        if !valid {
            drop(record);
            self.record_failure(&email);
            return Err(AuthError::InvalidCredentials);
        }

        let uid = record.uid.clone();
        drop(record);

        self.failed_attempts.remove(&email);
        let session = self.issue_session(&uid, &email)?;
        self.set_current(Some((uid, email)));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Self::normalize_email(email);
        // Whether the account exists is deliberately not revealed.
        if !self.accounts.contains_key(&email) {
            warn!("Password reset requested for unknown email");
        }
        Ok(())
    }

    fn subscribe(&self, listener: AuthListener) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.insert(id, listener.clone());

        // Initial callback with the current session state.
        let current = self
            .current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        let event = match current {
            Some((uid, email)) => AuthEvent::SignedIn { uid, email },
            None => AuthEvent::SignedOut,
        };
        listener(event);

        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            listeners.remove(&id);
        })
    }
}
