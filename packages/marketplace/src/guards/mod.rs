//! Navigation guards: pure decision functions evaluated per navigation.
//!
//! Every guard resolves to exactly one of `Allow` or `RedirectTo(path)`
//! after a bounded wait for the session tracker; it never hangs and never
//! panics. Any lookup error is denial with a redirect to a safe default,
//! never a silent allow.

pub mod router;

use std::sync::Arc;
use std::time::Duration;

use common::Role;
use tracing::{instrument, warn};

use crate::repos::{ProfileRepo, ProjectRepo};
use crate::session::{DEFAULT_READY_TIMEOUT, SessionState, SessionTracker};

/// Fixed redirect targets guards can resolve to.
pub mod paths {
    pub const LOGIN: &str = "/auth/login";
    pub const RECOVERY: &str = "/auth/recovery";
    pub const DASHBOARD: &str = "/dashboard";
    pub const PROJECTS: &str = "/projects";
}

/// Outcome of evaluating a guard for a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Let the navigation proceed.
    Allow,
    /// Cancel the navigation and send the user to `path`.
    RedirectTo(String),
}

impl GuardOutcome {
    pub fn redirect(path: impl Into<String>) -> Self {
        Self::RedirectTo(path.into())
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// The guard set, wired to the session tracker and the repositories some
/// guards need for lookups.
pub struct Guards {
    session: Arc<SessionTracker>,
    profiles: Arc<ProfileRepo>,
    projects: Arc<ProjectRepo>,
    ready_timeout: Duration,
}

impl Guards {
    pub fn new(
        session: Arc<SessionTracker>,
        profiles: Arc<ProfileRepo>,
        projects: Arc<ProjectRepo>,
    ) -> Self {
        Self {
            session,
            profiles,
            projects,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Wait for the session tracker to settle. A timeout fails closed.
    async fn settled(&self) -> Result<SessionState, GuardOutcome> {
        if !self.session.wait_until_ready(self.ready_timeout).await {
            warn!("Session tracker did not settle in time; failing closed");
            return Err(GuardOutcome::redirect(paths::LOGIN));
        }
        Ok(self.session.state())
    }

    /// Allow any authenticated principal with a role; the roleless land in
    /// recovery, the anonymous at login.
    #[instrument(skip(self))]
    pub async fn auth(&self) -> GuardOutcome {
        match self.settled().await {
            Err(redirect) => redirect,
            Ok(SessionState::SignedIn(_)) => GuardOutcome::Allow,
            Ok(SessionState::NeedsRecovery { .. }) => GuardOutcome::redirect(paths::RECOVERY),
            Ok(_) => GuardOutcome::redirect(paths::LOGIN),
        }
    }

    /// Allow only the anonymous (login and registration pages).
    #[instrument(skip(self))]
    pub async fn guest(&self) -> GuardOutcome {
        match self.settled().await {
            Err(redirect) => redirect,
            Ok(SessionState::SignedOut) => GuardOutcome::Allow,
            Ok(SessionState::SignedIn(principal)) => {
                GuardOutcome::redirect(principal.role.home_path())
            }
            Ok(SessionState::NeedsRecovery { .. }) => GuardOutcome::redirect(paths::RECOVERY),
            Ok(SessionState::Loading) => GuardOutcome::redirect(paths::LOGIN),
        }
    }

    /// Allow principals whose role is in `allowed`; others bounce to their
    /// own dashboard.
    #[instrument(skip(self))]
    pub async fn role(&self, allowed: &[Role]) -> GuardOutcome {
        match self.settled().await {
            Err(redirect) => redirect,
            Ok(SessionState::SignedIn(principal)) => {
                if allowed.contains(&principal.role) {
                    GuardOutcome::Allow
                } else {
                    GuardOutcome::redirect(principal.role.home_path())
                }
            }
            Ok(SessionState::NeedsRecovery { .. }) => GuardOutcome::redirect(paths::RECOVERY),
            Ok(_) => GuardOutcome::redirect(paths::LOGIN),
        }
    }

    /// Allow admins only; other signed-in users land on the dashboard
    /// root.
    #[instrument(skip(self))]
    pub async fn admin(&self) -> GuardOutcome {
        match self.settled().await {
            Err(redirect) => redirect,
            Ok(SessionState::SignedIn(principal)) if principal.is_admin() => GuardOutcome::Allow,
            Ok(SessionState::SignedIn(_)) | Ok(SessionState::NeedsRecovery { .. }) => {
                GuardOutcome::redirect(paths::DASHBOARD)
            }
            Ok(_) => GuardOutcome::redirect(paths::LOGIN),
        }
    }

    /// Require a complete profile for the principal's role; the incomplete
    /// are sent to their setup flow. Admins carry no profile and pass.
    #[instrument(skip(self))]
    pub async fn profile_setup(&self) -> GuardOutcome {
        let state = match self.settled().await {
            Err(redirect) => return redirect,
            Ok(state) => state,
        };
        let principal = match state {
            SessionState::SignedIn(principal) => principal,
            SessionState::NeedsRecovery { .. } => {
                return GuardOutcome::redirect(paths::RECOVERY);
            }
            _ => return GuardOutcome::redirect(paths::LOGIN),
        };

        let Some(setup_path) = principal.role.profile_setup_path() else {
            return GuardOutcome::Allow;
        };

        let complete = match principal.role {
            Role::Client => self
                .profiles
                .find_client_profile(&principal.uid)
                .await
                .map(|profile| profile.is_some_and(|p| p.is_complete())),
            Role::Freelancer => self
                .profiles
                .find_freelancer_profile(&principal.uid)
                .await
                .map(|profile| profile.is_some_and(|p| p.is_complete())),
            Role::Admin => return GuardOutcome::Allow,
        };

        match complete {
            Ok(true) => GuardOutcome::Allow,
            Ok(false) => GuardOutcome::redirect(setup_path),
            Err(e) => {
                warn!(uid = %principal.uid, error = %e, "Profile lookup failed; failing closed");
                GuardOutcome::redirect(setup_path)
            }
        }
    }

    /// Allow the project's owning client, its assigned freelancer, or an
    /// admin; everyone else (and every lookup problem) goes back to the
    /// project list.
    #[instrument(skip(self))]
    pub async fn project_owner(&self, project_id: Option<&str>) -> GuardOutcome {
        let state = match self.settled().await {
            Err(redirect) => return redirect,
            Ok(state) => state,
        };
        let principal = match state {
            SessionState::SignedIn(principal) => principal,
            SessionState::NeedsRecovery { .. } => {
                return GuardOutcome::redirect(paths::RECOVERY);
            }
            _ => return GuardOutcome::redirect(paths::LOGIN),
        };

        let Some(project_id) = project_id else {
            return GuardOutcome::redirect(paths::PROJECTS);
        };

        let project = match self.projects.find(project_id).await {
            Ok(Some(project)) => project,
            Ok(None) => return GuardOutcome::redirect(paths::PROJECTS),
            Err(e) => {
                warn!(%project_id, error = %e, "Project lookup failed; failing closed");
                return GuardOutcome::redirect(paths::PROJECTS);
            }
        };

        let is_assigned = project
            .assigned_freelancer_id
            .as_deref()
            .is_some_and(|f| f == principal.uid);
        if principal.is_admin() || principal.uid == project.client_id || is_assigned {
            GuardOutcome::Allow
        } else {
            GuardOutcome::redirect(paths::PROJECTS)
        }
    }
}
