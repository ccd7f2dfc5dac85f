use std::sync::Arc;

use common::Role;
use matchit::Router;
use tracing::instrument;

use super::{GuardOutcome, Guards};

/// A guard to run for a matched route.
#[derive(Debug, Clone)]
pub enum GuardKind {
    Auth,
    Guest,
    Role(Vec<Role>),
    Admin,
    ProfileSetup,
    /// Reads the `{id}` route parameter.
    ProjectOwner,
}

/// Maps navigation paths to guard chains.
///
/// Chains run in order; the first non-allow outcome wins. Paths with no
/// registered route are public.
pub struct GuardRouter {
    routes: Router<Vec<GuardKind>>,
    guards: Arc<Guards>,
}

impl GuardRouter {
    pub fn new(guards: Arc<Guards>) -> Self {
        Self {
            routes: Router::new(),
            guards,
        }
    }

    /// Register a guard chain for a route pattern (matchit syntax, e.g.
    /// `/projects/{id}/edit`).
    pub fn route(
        &mut self,
        pattern: &str,
        chain: Vec<GuardKind>,
    ) -> Result<(), matchit::InsertError> {
        self.routes.insert(pattern, chain)
    }

    /// The application's route table.
    pub fn with_default_routes(guards: Arc<Guards>) -> Self {
        let mut router = Self::new(guards);
        let table: &[(&str, Vec<GuardKind>)] = &[
            ("/auth/login", vec![GuardKind::Guest]),
            ("/auth/register", vec![GuardKind::Guest]),
            ("/dashboard", vec![GuardKind::Auth, GuardKind::ProfileSetup]),
            (
                "/dashboard/client",
                vec![
                    GuardKind::Auth,
                    GuardKind::Role(vec![Role::Client]),
                    GuardKind::ProfileSetup,
                ],
            ),
            (
                "/dashboard/freelancer",
                vec![
                    GuardKind::Auth,
                    GuardKind::Role(vec![Role::Freelancer]),
                    GuardKind::ProfileSetup,
                ],
            ),
            ("/dashboard/admin", vec![GuardKind::Admin]),
            ("/projects", vec![GuardKind::Auth]),
            (
                "/projects/new",
                vec![
                    GuardKind::Auth,
                    GuardKind::Role(vec![Role::Client]),
                    GuardKind::ProfileSetup,
                ],
            ),
            ("/projects/{id}", vec![GuardKind::Auth]),
            (
                "/projects/{id}/edit",
                vec![GuardKind::Auth, GuardKind::ProjectOwner],
            ),
            (
                "/projects/{id}/manage",
                vec![GuardKind::Auth, GuardKind::ProjectOwner],
            ),
            (
                "/proposals",
                vec![GuardKind::Auth, GuardKind::Role(vec![Role::Freelancer])],
            ),
            (
                "/profile/client/setup",
                vec![GuardKind::Auth, GuardKind::Role(vec![Role::Client])],
            ),
            (
                "/profile/freelancer/setup",
                vec![GuardKind::Auth, GuardKind::Role(vec![Role::Freelancer])],
            ),
        ];

        for (pattern, chain) in table {
            router
                .route(pattern, chain.clone())
                .expect("default route table is valid");
        }
        router
    }

    async fn run(&self, kind: &GuardKind, id_param: Option<&str>) -> GuardOutcome {
        match kind {
            GuardKind::Auth => self.guards.auth().await,
            GuardKind::Guest => self.guards.guest().await,
            GuardKind::Role(allowed) => self.guards.role(allowed).await,
            GuardKind::Admin => self.guards.admin().await,
            GuardKind::ProfileSetup => self.guards.profile_setup().await,
            GuardKind::ProjectOwner => self.guards.project_owner(id_param).await,
        }
    }

    /// Evaluate all guards registered for a navigation path.
    #[instrument(skip(self))]
    pub async fn evaluate(&self, path: &str) -> GuardOutcome {
        let Ok(matched) = self.routes.at(path) else {
            return GuardOutcome::Allow;
        };
        let id_param = matched.params.get("id");

        for kind in matched.value {
            let outcome = self.run(kind, id_param).await;
            if !outcome.is_allow() {
                return outcome;
            }
        }
        GuardOutcome::Allow
    }
}
