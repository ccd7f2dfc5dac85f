#![allow(dead_code)]

use std::sync::Arc;

use common::storage::memory::MemoryObjectStore;
use common::{Budget, FileCategory, Role, Timeline, Visibility};
use docstore::MemoryStore;
use marketplace::guards::Guards;
use marketplace::identity::local::LocalIdentityProvider;
use marketplace::models::{
    CreateClientProfileInput, CreateFreelancerProfileInput, CreateProjectInput, Principal, Project,
    Proposal, SubmitProposalInput, UploadFileInput,
};
use marketplace::repos::{FileRepo, ProfileRepo, ProjectRepo, ProposalRepo};
use marketplace::session::{RegisterInput, SessionTracker};

pub const PASSWORD: &str = "password123";

static TRACING: std::sync::Once = std::sync::Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Everything a test needs: in-memory backends wired to the full domain
/// layer.
pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub provider: Arc<LocalIdentityProvider>,
    pub session: Arc<SessionTracker>,
    pub projects: Arc<ProjectRepo>,
    pub proposals: Arc<ProposalRepo>,
    pub profiles: Arc<ProfileRepo>,
    pub files: Arc<FileRepo>,
    pub guards: Arc<Guards>,
}

impl TestEnv {
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let provider = Arc::new(LocalIdentityProvider::new("test-secret", 1));

        let session = Arc::new(SessionTracker::new(
            provider.clone() as Arc<dyn marketplace::identity::IdentityProvider>,
            store.clone() as Arc<dyn docstore::DocumentStore>,
        ));

        let projects = Arc::new(ProjectRepo::new(store.clone()));
        let proposals = Arc::new(ProposalRepo::new(store.clone(), projects.clone()));
        let profiles = Arc::new(ProfileRepo::new(store.clone()));
        let files = Arc::new(FileRepo::new(store.clone(), objects.clone()));

        let guards = Arc::new(Guards::new(
            session.clone(),
            profiles.clone(),
            projects.clone(),
        ));

        Self {
            store,
            objects,
            provider,
            session,
            projects,
            proposals,
            profiles,
            files,
            guards,
        }
    }

    /// Register an account with the given role and return its principal.
    pub async fn register(&self, email: &str, display_name: &str, role: Role) -> Principal {
        self.session
            .register(RegisterInput {
                email: email.into(),
                password: PASSWORD.into(),
                display_name: display_name.into(),
                role,
            })
            .await
            .expect_data("register")
    }

    pub async fn register_client(&self, email: &str) -> Principal {
        self.register(email, "Test Client", Role::Client).await
    }

    pub async fn register_freelancer(&self, email: &str) -> Principal {
        self.register(email, "Test Freelancer", Role::Freelancer)
            .await
    }

    /// Seed an admin principal directly (admins cannot self-register).
    pub async fn seed_admin(&self, email: &str) -> Principal {
        marketplace::seed::seed_admin(
            &self.provider,
            &*self.store,
            email,
            PASSWORD,
            "Test Admin",
        )
        .await
        .expect("seed admin")
    }

    /// Sign the session in as an existing account.
    pub async fn login(&self, email: &str) -> Principal {
        self.session
            .login(email, PASSWORD)
            .await
            .expect_data("login")
    }

    pub fn project_input(title: &str) -> CreateProjectInput {
        CreateProjectInput {
            title: title.into(),
            description: "A well-scoped piece of work".into(),
            category: "Web Development".into(),
            subcategory: None,
            budget: Budget::Fixed { amount: 500.0 },
            timeline: Timeline::Weeks { duration: 2 },
            skills: vec!["rust".into(), "sql".into()],
            visibility: Visibility::Public,
            milestones: vec![],
        }
    }

    /// Create a project and publish it so proposals can target it.
    pub async fn create_published_project(&self, client: &Principal, title: &str) -> Project {
        let project = self
            .projects
            .create(client, Self::project_input(title))
            .await
            .expect_data("create project");
        self.projects
            .publish(client, &project.id)
            .await
            .expect_data("publish project")
    }

    pub fn proposal_input(project_id: &str) -> SubmitProposalInput {
        SubmitProposalInput {
            project_id: project_id.into(),
            cover_letter: "I can do this".into(),
            budget: Budget::Fixed { amount: 450.0 },
            timeline: Timeline::Weeks { duration: 2 },
            milestones: vec![],
        }
    }

    pub async fn submit_proposal(&self, freelancer: &Principal, project_id: &str) -> Proposal {
        self.proposals
            .submit(freelancer, Self::proposal_input(project_id))
            .await
            .expect_data("submit proposal")
    }

    pub fn client_profile_input() -> CreateClientProfileInput {
        CreateClientProfileInput {
            company_name: "Acme Corp".into(),
            industry: "Software".into(),
            company_size: None,
            website: None,
            location: "Berlin".into(),
            description: "We build things".into(),
        }
    }

    pub fn freelancer_profile_input() -> CreateFreelancerProfileInput {
        CreateFreelancerProfileInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            title: "Engineer".into(),
            bio: "I build things".into(),
            location: "London".into(),
            hourly_rate: Some(90.0),
            skills: vec!["rust".into()],
            portfolio_links: vec![],
        }
    }

    /// Give a principal a complete profile so profile-setup guards pass.
    pub async fn complete_profile(&self, principal: &Principal) {
        match principal.role {
            Role::Client => {
                self.profiles
                    .create_client_profile(principal, Self::client_profile_input())
                    .await
                    .expect_data("create client profile");
            }
            Role::Freelancer => {
                self.profiles
                    .create_freelancer_profile(principal, Self::freelancer_profile_input())
                    .await
                    .expect_data("create freelancer profile");
            }
            Role::Admin => {}
        }
    }

    pub fn upload_input(name: &str, bytes: &[u8], category: FileCategory) -> UploadFileInput {
        UploadFileInput::new(bytes.to_vec(), name, category)
    }

    /// Raw document read, bypassing the repositories.
    pub async fn raw_doc(&self, collection: &str, id: &str) -> serde_json::Value {
        docstore::DocumentStore::get(&*self.store, collection, id)
            .await
            .expect("raw get")
            .expect("document exists")
    }
}
