use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

use common::Role;
use docstore::DocumentStore;
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::{info, instrument, warn};

use crate::envelope::OpResult;
use crate::error::DomainError;
use crate::identity::{AuthEvent, IdentityProvider, Subscription};
use crate::models::Principal;
use crate::repos::collections;

/// How long guards wait by default for the first identity-provider
/// callback: 15 ticks of 100ms.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(15 * 100);

/// The tracker's view of the current session.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No identity-provider callback has been processed yet.
    Loading,
    SignedOut,
    SignedIn(Principal),
    /// Authenticated with the provider but missing a `users` record; a
    /// recoverable inconsistency, repaired via
    /// [`SessionTracker::repair_account`].
    NeedsRecovery { uid: String, email: String },
}

impl SessionState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::SignedIn(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Fields accepted by the registration form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
}

struct SessionInner {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    state: RwLock<SessionState>,
    ready: Notify,
}

impl SessionInner {
    fn set_state(&self, state: SessionState) {
        *self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = state;
        self.ready.notify_waiters();
    }

    fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve a provider session to a principal and update the state cell.
    async fn load_principal(&self, uid: &str, email: &str) -> Result<Principal, DomainError> {
        match self.store.get(collections::USERS, uid).await {
            Ok(Some(value)) => match serde_json::from_value::<Principal>(value) {
                Ok(principal) => {
                    self.set_state(SessionState::SignedIn(principal.clone()));
                    Ok(principal)
                }
                Err(e) => {
                    warn!(%uid, error = %e, "User record is unreadable; flagging for recovery");
                    self.set_state(SessionState::NeedsRecovery {
                        uid: uid.to_string(),
                        email: email.to_string(),
                    });
                    Err(DomainError::NeedsRecovery)
                }
            },
            Ok(None) => {
                // A registration in flight may already have resolved this
                // uid; don't clobber its state with a stale read.
                if let SessionState::SignedIn(principal) = self.snapshot()
                    && principal.uid == uid
                {
                    return Ok(principal);
                }
                warn!(%uid, "Authenticated principal has no user record");
                self.set_state(SessionState::NeedsRecovery {
                    uid: uid.to_string(),
                    email: email.to_string(),
                });
                Err(DomainError::NeedsRecovery)
            }
            Err(e) => {
                // Fail closed: an unreachable store must not leave the
                // session looking authenticated.
                warn!(%uid, error = %e, "Could not load user record");
                self.set_state(SessionState::SignedOut);
                Err(e.into())
            }
        }
    }
}

/// Wraps the identity provider: holds the single "current principal" cell,
/// owns the one provider subscription, and maps every provider error to the
/// stable user-facing set.
///
/// The cell has exactly one writer path (the provider listener plus the
/// operations below, all running on the driving runtime) and many readers.
pub struct SessionTracker {
    inner: Arc<SessionInner>,
    _subscription: Subscription,
}

impl SessionTracker {
    /// Subscribe to the provider and start tracking. Must be called from
    /// within a tokio runtime; signed-in callbacks fetch the user record on
    /// a spawned task.
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let inner = Arc::new(SessionInner {
            provider: Arc::clone(&provider),
            store,
            state: RwLock::new(SessionState::Loading),
            ready: Notify::new(),
        });

        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        let subscription = provider.subscribe(Arc::new(move |event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match event {
                AuthEvent::SignedOut => inner.set_state(SessionState::SignedOut),
                AuthEvent::SignedIn { uid, email } => {
                    tokio::spawn(async move {
                        let _ = inner.load_principal(&uid, &email).await;
                    });
                }
            }
        }));

        Self {
            inner,
            _subscription: subscription,
        }
    }

    /// The current authenticated principal, if any. Never blocks.
    pub fn current_principal(&self) -> Option<Principal> {
        self.inner.snapshot().principal().cloned()
    }

    /// True until the provider's first callback has been processed.
    pub fn is_loading(&self) -> bool {
        matches!(self.inner.snapshot(), SessionState::Loading)
    }

    /// Snapshot of the full session state.
    pub fn state(&self) -> SessionState {
        self.inner.snapshot()
    }

    /// Wait until the tracker has left its loading state. Returns `false`
    /// if the timeout expired first.
    pub async fn wait_until_ready(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.inner.ready.notified();
            if !self.is_loading() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return !self.is_loading();
            }
        }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> OpResult<Principal> {
        self.try_login(email, password).await.into()
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<Principal, DomainError> {
        let session = self.inner.provider.sign_in(email, password).await?;
        let principal = self
            .inner
            .load_principal(&session.uid, &session.email)
            .await?;
        info!(uid = %principal.uid, "Signed in");
        Ok(principal)
    }

    #[instrument(skip(self, input), fields(role = %input.role))]
    pub async fn register(&self, input: RegisterInput) -> OpResult<Principal> {
        self.try_register(input).await.into()
    }

    async fn try_register(&self, input: RegisterInput) -> Result<Principal, DomainError> {
        if input.display_name.trim().is_empty() || input.display_name.chars().count() > 64 {
            return Err(DomainError::Validation(
                "Display name must be 1-64 characters".into(),
            ));
        }
        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::Validation(
                "A valid email address is required".into(),
            ));
        }
        if input.role == Role::Admin {
            return Err(DomainError::Validation(
                "Admin accounts cannot be self-registered".into(),
            ));
        }

        let session = self.inner.provider.sign_up(email, &input.password).await?;
        let principal = Principal::new(
            &session.uid,
            &session.email,
            input.display_name.trim(),
            input.role,
        );

        let value = serde_json::to_value(&principal)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if let Err(e) = self
            .inner
            .store
            .insert(collections::USERS, &principal.uid, value)
            .await
        {
            // The provider account exists but the user record does not:
            // the recoverable inconsistency the recovery flow repairs.
            warn!(uid = %principal.uid, error = %e, "Registered account has no user record yet");
            self.inner.set_state(SessionState::NeedsRecovery {
                uid: session.uid,
                email: session.email,
            });
            return Err(e.into());
        }

        info!(uid = %principal.uid, role = %principal.role, "Account registered");
        self.inner
            .set_state(SessionState::SignedIn(principal.clone()));
        Ok(principal)
    }

    /// Recreate the missing user record for a session flagged
    /// [`SessionState::NeedsRecovery`].
    #[instrument(skip(self, display_name))]
    pub async fn repair_account(&self, display_name: &str, role: Role) -> OpResult<Principal> {
        self.try_repair_account(display_name, role).await.into()
    }

    async fn try_repair_account(
        &self,
        display_name: &str,
        role: Role,
    ) -> Result<Principal, DomainError> {
        let SessionState::NeedsRecovery { uid, email } = self.inner.snapshot() else {
            return Err(DomainError::Conflict(
                "This account does not need recovery".into(),
            ));
        };
        if role == Role::Admin {
            return Err(DomainError::Validation(
                "Admin accounts cannot be self-registered".into(),
            ));
        }

        let principal = Principal::new(&uid, &email, display_name.trim(), role);
        let value = serde_json::to_value(&principal)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        self.inner
            .store
            .insert(collections::USERS, &uid, value)
            .await?;

        info!(%uid, "Account repaired");
        self.inner
            .set_state(SessionState::SignedIn(principal.clone()));
        Ok(principal)
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> OpResult<()> {
        match self.inner.provider.sign_out().await {
            Ok(()) => {
                self.inner.set_state(SessionState::SignedOut);
                OpResult::ok_with_message((), "Signed out")
            }
            Err(e) => OpResult::err(e.into()),
        }
    }

    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> OpResult<()> {
        match self.inner.provider.send_password_reset(email).await {
            Ok(()) => OpResult::ok_with_message((), "Password reset email sent"),
            Err(e) => OpResult::err(e.into()),
        }
    }
}
