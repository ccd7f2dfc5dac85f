mod support;

use common::{ProjectStatus, Visibility};
use marketplace::models::ProjectPatch;
use marketplace::repos::collections;
use support::TestEnv;

#[tokio::test]
async fn create_requires_the_client_role() {
    let env = TestEnv::new();
    let freelancer = env.register_freelancer("free@example.com").await;

    let result = env
        .projects
        .create(&freelancer, TestEnv::project_input("Nope"))
        .await;
    assert!(!result.success);
    assert_eq!(result.code, Some("PERMISSION_DENIED"));
}

#[tokio::test]
async fn create_starts_as_draft_with_zeroed_counters() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;

    let project = env
        .projects
        .create(&client, TestEnv::project_input("Site"))
        .await
        .expect_data("create");

    assert_eq!(project.status, ProjectStatus::Draft);
    assert_eq!(project.client_id, client.uid);
    assert_eq!(project.proposal_count, 0);
    assert_eq!(project.view_count, 0);
    assert!(project.assigned_freelancer_id.is_none());
}

#[tokio::test]
async fn update_stamps_updated_at_and_respects_ownership() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let other = env.register_client("other@example.com").await;
    let project = env
        .projects
        .create(&client, TestEnv::project_input("Site"))
        .await
        .expect_data("create");

    // A different client cannot touch it.
    let denied = env
        .projects
        .update(
            &other,
            &project.id,
            ProjectPatch {
                title: Some("Hijacked".into()),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(denied.code, Some("PERMISSION_DENIED"));

    let updated = env
        .projects
        .update(
            &client,
            &project.id,
            ProjectPatch {
                title: Some("Bigger site".into()),
                visibility: Some(Visibility::Private),
                ..Default::default()
            },
        )
        .await
        .expect_data("update");
    assert_eq!(updated.title, "Bigger site");
    assert_eq!(updated.visibility, Visibility::Private);
    assert!(updated.updated_at > project.updated_at);
    // Untouched fields survive.
    assert_eq!(updated.description, project.description);

    // An admin may update anyone's project.
    let admin = env.seed_admin("admin@example.com").await;
    let admin_edit = env
        .projects
        .update(
            &admin,
            &project.id,
            ProjectPatch {
                title: Some("Admin edit".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(admin_edit.success);
}

#[tokio::test]
async fn patch_can_null_out_the_subcategory() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let mut input = TestEnv::project_input("Site");
    input.subcategory = Some("Frontend".into());
    let project = env.projects.create(&client, input).await.expect_data("create");
    assert_eq!(project.subcategory.as_deref(), Some("Frontend"));

    let patch: ProjectPatch = serde_json::from_str(r#"{"subcategory": null}"#).unwrap();
    let updated = env
        .projects
        .update(&client, &project.id, patch)
        .await
        .expect_data("update");
    assert_eq!(updated.subcategory, None);
}

#[tokio::test]
async fn status_machine_rejects_illegal_transitions() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let project = env
        .projects
        .create(&client, TestEnv::project_input("Site"))
        .await
        .expect_data("create");

    // Draft cannot jump straight to InProgress.
    let result = env
        .projects
        .update_status(&client, &project.id, ProjectStatus::InProgress)
        .await;
    assert_eq!(result.code, Some("CONFLICT"));

    // Draft -> Published -> Paused -> Published is legal.
    env.projects
        .publish(&client, &project.id)
        .await
        .expect_data("publish");
    env.projects
        .pause(&client, &project.id)
        .await
        .expect_data("pause");
    let resumed = env
        .projects
        .resume(&client, &project.id)
        .await
        .expect_data("resume");
    assert_eq!(resumed.status, ProjectStatus::Published);
}

#[tokio::test]
async fn completing_a_project_stamps_the_end_date() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    let assigned = env
        .projects
        .assign_freelancer(&client, &project.id, &freelancer.uid)
        .await
        .expect_data("assign");
    assert_eq!(assigned.status, ProjectStatus::InProgress);
    assert_eq!(assigned.assigned_freelancer_id.as_deref(), Some(freelancer.uid.as_str()));
    assert!(assigned.start_date.is_some());

    env.projects
        .update_status(&client, &project.id, ProjectStatus::UnderReview)
        .await
        .expect_data("review");
    let completed = env
        .projects
        .update_status(&client, &project.id, ProjectStatus::Completed)
        .await
        .expect_data("complete");
    assert_eq!(completed.status, ProjectStatus::Completed);
    assert!(completed.end_date.is_some());
}

#[tokio::test]
async fn assign_freelancer_requires_the_owning_client() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    let denied = env
        .projects
        .assign_freelancer(&freelancer, &project.id, &freelancer.uid)
        .await;
    assert_eq!(denied.code, Some("PERMISSION_DENIED"));
}

#[tokio::test]
async fn delete_is_blocked_once_work_started() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;
    env.projects
        .assign_freelancer(&client, &project.id, &freelancer.uid)
        .await
        .expect_data("assign");

    let result = env.projects.delete(&client, &project.id).await;
    assert!(!result.success);
    assert_eq!(result.code, Some("CONFLICT"));
    assert_eq!(
        result.error.as_deref(),
        Some("Cannot delete projects that are in progress or completed")
    );

    // Admins may still remove it.
    let admin = env.seed_admin("admin@example.com").await;
    let result = env.projects.delete(&admin, &project.id).await;
    assert!(result.success);
}

#[tokio::test]
async fn delete_always_fails_for_non_owners() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let stranger = env.register_client("other@example.com").await;
    let project = env
        .projects
        .create(&client, TestEnv::project_input("Draft"))
        .await
        .expect_data("create");

    // Deletable status, wrong caller: still denied.
    let result = env.projects.delete(&stranger, &project.id).await;
    assert_eq!(result.code, Some("PERMISSION_DENIED"));

    // The owner can delete a draft.
    let result = env.projects.delete(&client, &project.id).await;
    assert!(result.success);
}

#[tokio::test]
async fn non_owner_reads_bump_the_view_count_once_each() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    env.projects
        .get_by_id(Some(&freelancer), &project.id)
        .await
        .expect_data("read");
    env.projects
        .get_by_id(None, &project.id)
        .await
        .expect_data("anonymous read");

    let doc = env.raw_doc(collections::PROJECTS, &project.id).await;
    assert_eq!(doc["viewCount"], 2);
}

#[tokio::test]
async fn owner_reads_never_bump_the_view_count() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    for _ in 0..3 {
        env.projects
            .get_by_id(Some(&client), &project.id)
            .await
            .expect_data("owner read");
    }

    let doc = env.raw_doc(collections::PROJECTS, &project.id).await;
    assert_eq!(doc["viewCount"], 0);
}

#[tokio::test]
async fn failed_view_count_bump_does_not_fail_the_read() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    env.store.inject_update_fault(collections::PROJECTS, &project.id);
    let result = env.projects.get_by_id(Some(&freelancer), &project.id).await;
    assert!(result.success);
}

#[tokio::test]
async fn queries_filter_and_order_newest_first() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;

    let first = env.create_published_project(&client, "First").await;
    let second = env.create_published_project(&client, "Second").await;
    let draft = env
        .projects
        .create(&client, TestEnv::project_input("Hidden draft"))
        .await
        .expect_data("create");

    let published = env.projects.published().await.expect_data("published");
    let ids: Vec<_> = published.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    assert!(!ids.contains(&draft.id.as_str()));

    let mine = env.projects.by_client(&client.uid).await.expect_data("by_client");
    assert_eq!(mine.len(), 3);
    assert_eq!(mine[0].id, draft.id);
}

#[tokio::test]
async fn by_skills_matches_any_requested_skill() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;

    let mut rust_input = TestEnv::project_input("Rust work");
    rust_input.skills = vec!["rust".into()];
    let rust_project = env.projects.create(&client, rust_input).await.expect_data("create");
    env.projects.publish(&client, &rust_project.id).await.expect_data("publish");

    let mut design_input = TestEnv::project_input("Design work");
    design_input.skills = vec!["figma".into()];
    let design_project = env.projects.create(&client, design_input).await.expect_data("create");
    env.projects.publish(&client, &design_project.id).await.expect_data("publish");

    let matches = env
        .projects
        .by_skills(&["rust".into(), "go".into()])
        .await
        .expect_data("by_skills");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, rust_project.id);
}

#[tokio::test]
async fn fallback_mode_yields_the_same_result_set() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let first = env.create_published_project(&client, "First").await;
    let second = env.create_published_project(&client, "Second").await;

    let indexed = env.projects.published().await.expect_data("indexed");

    // Drop the index: the repo must fall back to a client-side sort.
    env.store.mark_unindexed(collections::PROJECTS);
    let fallback = env.projects.published().await.expect_data("fallback");

    let indexed_ids: Vec<_> = indexed.iter().map(|p| p.id.as_str()).collect();
    let fallback_ids: Vec<_> = fallback.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(indexed_ids, fallback_ids);
    assert_eq!(fallback_ids, vec![second.id.as_str(), first.id.as_str()]);
}

#[tokio::test]
async fn featured_ranks_by_view_count() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let viewer = env.register_freelancer("free@example.com").await;

    let quiet = env.create_published_project(&client, "Quiet").await;
    let popular = env.create_published_project(&client, "Popular").await;
    for _ in 0..3 {
        env.projects
            .get_by_id(Some(&viewer), &popular.id)
            .await
            .expect_data("view");
    }

    let featured = env.projects.featured(1).await.expect_data("featured");
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].id, popular.id);
    assert_ne!(featured[0].id, quiet.id);
}
