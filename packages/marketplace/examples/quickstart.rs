//! End-to-end walk through the domain layer against the in-process
//! backends: register a client and a freelancer, post and publish a
//! project, submit and accept a proposal, and inspect the results.
//!
//! Run with: `cargo run -p marketplace --example quickstart`

use std::sync::Arc;

use common::storage::memory::MemoryObjectStore;
use common::{FileCategory, ProposalStatus, Role};
use docstore::{DocumentStore, MemoryStore};
use marketplace::config::AppConfig;
use marketplace::guards::Guards;
use marketplace::guards::router::GuardRouter;
use marketplace::identity::IdentityProvider;
use marketplace::identity::local::LocalIdentityProvider;
use marketplace::models::UploadFileInput;
use marketplace::repos::{FileRepo, ProfileRepo, ProjectRepo, ProposalRepo};
use marketplace::session::{RegisterInput, SessionTracker};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let objects = Arc::new(MemoryObjectStore::with_max_size(
        config.storage.max_object_size,
    ));
    let provider = Arc::new(LocalIdentityProvider::new(
        &config.auth.token_secret,
        config.auth.token_ttl_hours,
    ));

    let session = Arc::new(SessionTracker::new(
        provider.clone() as Arc<dyn IdentityProvider>,
        store.clone(),
    ));
    let projects = Arc::new(ProjectRepo::new(store.clone()));
    let proposals = ProposalRepo::new(store.clone(), projects.clone());
    let profiles = Arc::new(ProfileRepo::new(store.clone()));
    let files = FileRepo::new(store.clone(), objects);

    let admin =
        marketplace::seed::seed_admin(&provider, &*store, "admin@gigboard.dev", "admin-password", "Operator")
            .await?;
    println!("seeded admin {}", admin.email);

    // A client signs up and posts a project.
    let client = session
        .register(RegisterInput {
            email: "client@gigboard.dev".into(),
            password: "client-password".into(),
            display_name: "Acme Corp".into(),
            role: Role::Client,
        })
        .await
        .expect_data("register client");

    let project = projects
        .create(
            &client,
            serde_json::from_value(serde_json::json!({
                "title": "Marketing site revamp",
                "description": "Rebuild our landing pages",
                "category": "Web Development",
                "budget": { "type": "Range", "min": 2000.0, "max": 5000.0 },
                "timeline": { "type": "Weeks", "duration": 6 },
                "skills": ["rust", "design"],
            }))?,
        )
        .await
        .expect_data("create project");
    let project = projects
        .publish(&client, &project.id)
        .await
        .expect_data("publish project");
    println!("project {} is {}", project.title, project.status);

    // A freelancer signs up and bids.
    let freelancer = session
        .register(RegisterInput {
            email: "ada@gigboard.dev".into(),
            password: "ada-password".into(),
            display_name: "Ada".into(),
            role: Role::Freelancer,
        })
        .await
        .expect_data("register freelancer");

    let proposal = proposals
        .submit(
            &freelancer,
            serde_json::from_value(serde_json::json!({
                "projectId": project.id,
                "coverLetter": "Six weeks is plenty.",
                "budget": { "type": "Fixed", "amount": 4200.0 },
                "timeline": { "type": "Weeks", "duration": 6 },
            }))?,
        )
        .await
        .expect_data("submit proposal");

    let attachment = files
        .upload(
            &freelancer,
            UploadFileInput::new(
                b"portfolio bytes".to_vec(),
                "portfolio.pdf",
                FileCategory::ProposalAttachment,
            ),
        )
        .await
        .expect_data("upload attachment");
    println!("attachment stored at {}", attachment.storage_key);

    // The client accepts; the project is assigned as a side effect.
    let accepted = proposals
        .update_status(&client, &proposal.id, ProposalStatus::Accepted, None)
        .await;
    println!(
        "accept: success={} message={:?}",
        accepted.success, accepted.message
    );

    let assigned = projects
        .get_by_id(Some(&client), &project.id)
        .await
        .expect_data("reload project");
    println!(
        "project is now {} and assigned to {:?}",
        assigned.status, assigned.assigned_freelancer_id
    );

    // Guards decide navigation for whoever is currently signed in.
    let guards = Arc::new(Guards::new(session.clone(), profiles, projects.clone()));
    let router = GuardRouter::with_default_routes(guards);
    println!(
        "navigating to /dashboard/freelancer -> {:?}",
        router.evaluate("/dashboard/freelancer").await
    );

    Ok(())
}
