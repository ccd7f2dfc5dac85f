mod support;

use common::{ProjectStatus, ProposalStatus};
use marketplace::repos::collections;
use marketplace::repos::proposal::OUTBID_FEEDBACK;
use support::TestEnv;

#[tokio::test]
async fn submit_requires_the_freelancer_role() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    let result = env
        .proposals
        .submit(&client, TestEnv::proposal_input(&project.id))
        .await;
    assert_eq!(result.code, Some("PERMISSION_DENIED"));
}

#[tokio::test]
async fn submit_only_targets_published_projects() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let draft = env
        .projects
        .create(&client, TestEnv::project_input("Draft"))
        .await
        .expect_data("create");

    let result = env
        .proposals
        .submit(&freelancer, TestEnv::proposal_input(&draft.id))
        .await;
    assert!(!result.success);
    assert_eq!(result.code, Some("CONFLICT"));
}

#[tokio::test]
async fn one_proposal_per_freelancer_per_project() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    env.submit_proposal(&freelancer, &project.id).await;

    // Scenario: the second submission is rejected.
    let result = env
        .proposals
        .submit(&freelancer, TestEnv::proposal_input(&project.id))
        .await;
    assert!(!result.success);
    assert_eq!(result.code, Some("CONFLICT"));
    assert!(result.error.as_deref().unwrap().contains("already submitted"));

    // A different freelancer is unaffected.
    let other = env.register_freelancer("other@example.com").await;
    let result = env
        .proposals
        .submit(&other, TestEnv::proposal_input(&project.id))
        .await;
    assert!(result.success);
}

#[tokio::test]
async fn withdrawing_frees_the_pair_for_resubmission() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    let proposal = env.submit_proposal(&freelancer, &project.id).await;
    env.proposals
        .update_status(&freelancer, &proposal.id, ProposalStatus::Withdrawn, None)
        .await
        .expect_data("withdraw");

    let result = env
        .proposals
        .submit(&freelancer, TestEnv::proposal_input(&project.id))
        .await;
    assert!(result.success, "withdrawn proposals do not block resubmission");
}

#[tokio::test]
async fn submit_bumps_the_project_proposal_count() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    env.submit_proposal(&freelancer, &project.id).await;

    let doc = env.raw_doc(collections::PROJECTS, &project.id).await;
    assert_eq!(doc["proposalCount"], 1);
}

#[tokio::test]
async fn client_read_marks_the_proposal_viewed() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;
    let proposal = env.submit_proposal(&freelancer, &project.id).await;

    // The owning freelancer's reads leave the flag alone.
    env.proposals
        .get_by_id(&freelancer, &proposal.id)
        .await
        .expect_data("freelancer read");
    let doc = env.raw_doc(collections::PROPOSALS, &proposal.id).await;
    assert_eq!(doc["viewedByClient"], false);

    // The project's client flips it as a side effect of reading.
    env.proposals
        .get_by_id(&client, &proposal.id)
        .await
        .expect_data("client read");
    let doc = env.raw_doc(collections::PROPOSALS, &proposal.id).await;
    assert_eq!(doc["viewedByClient"], true);
}

#[tokio::test]
async fn strangers_cannot_see_proposals() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let stranger = env.register_freelancer("stranger@example.com").await;
    let project = env.create_published_project(&client, "Site").await;
    let proposal = env.submit_proposal(&freelancer, &project.id).await;

    let result = env.proposals.get_by_id(&stranger, &proposal.id).await;
    assert_eq!(result.code, Some("NOT_FOUND"));
}

#[tokio::test]
async fn status_authorization_depends_on_the_target() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;
    let proposal = env.submit_proposal(&freelancer, &project.id).await;

    // The freelancer cannot shortlist their own proposal.
    let result = env
        .proposals
        .update_status(&freelancer, &proposal.id, ProposalStatus::Shortlisted, None)
        .await;
    assert_eq!(result.code, Some("PERMISSION_DENIED"));

    // The client cannot withdraw someone else's proposal.
    let result = env
        .proposals
        .update_status(&client, &proposal.id, ProposalStatus::Withdrawn, None)
        .await;
    assert_eq!(result.code, Some("PERMISSION_DENIED"));

    // The client shortlists; the flag follows.
    let shortlisted = env
        .proposals
        .update_status(&client, &proposal.id, ProposalStatus::Shortlisted, None)
        .await
        .expect_data("shortlist");
    assert_eq!(shortlisted.status, ProposalStatus::Shortlisted);
    assert!(shortlisted.is_shortlisted);
}

#[tokio::test]
async fn rejecting_stamps_feedback_and_responded_at() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;
    let proposal = env.submit_proposal(&freelancer, &project.id).await;

    let rejected = env
        .proposals
        .update_status(
            &client,
            &proposal.id,
            ProposalStatus::Rejected,
            Some("Budget mismatch".into()),
        )
        .await
        .expect_data("reject");
    assert_eq!(rejected.status, ProposalStatus::Rejected);
    assert_eq!(rejected.feedback.as_deref(), Some("Budget mismatch"));
    assert!(rejected.responded_at.is_some());

    // Final statuses accept no further transitions.
    let result = env
        .proposals
        .update_status(&client, &proposal.id, ProposalStatus::Accepted, None)
        .await;
    assert_eq!(result.code, Some("CONFLICT"));
}

#[tokio::test]
async fn accepting_assigns_the_project_and_rejects_siblings() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let winner = env.register_freelancer("winner@example.com").await;
    let loser = env.register_freelancer("loser@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    let winning = env.submit_proposal(&winner, &project.id).await;
    let losing = env.submit_proposal(&loser, &project.id).await;

    let accepted = env
        .proposals
        .update_status(&client, &winning.id, ProposalStatus::Accepted, None)
        .await
        .expect_data("accept");
    assert_eq!(accepted.status, ProposalStatus::Accepted);
    assert!(accepted.responded_at.is_some());

    // The project was assigned and moved to InProgress.
    let project_doc = env.raw_doc(collections::PROJECTS, &project.id).await;
    assert_eq!(project_doc["status"], ProjectStatus::InProgress.as_str());
    assert_eq!(project_doc["assignedFreelancerId"], winner.uid.as_str());
    assert!(project_doc["startDate"].is_i64());

    // The sibling was rejected with the standard feedback.
    let losing_doc = env.raw_doc(collections::PROPOSALS, &losing.id).await;
    assert_eq!(losing_doc["status"], ProposalStatus::Rejected.as_str());
    assert_eq!(losing_doc["feedback"], OUTBID_FEEDBACK);
}

#[tokio::test]
async fn only_the_project_owner_can_accept() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;
    let proposal = env.submit_proposal(&freelancer, &project.id).await;

    let result = env
        .proposals
        .update_status(&freelancer, &proposal.id, ProposalStatus::Accepted, None)
        .await;
    assert_eq!(result.code, Some("PERMISSION_DENIED"));

    // Admins may act for the client.
    let admin = env.seed_admin("admin@example.com").await;
    let result = env
        .proposals
        .update_status(&admin, &proposal.id, ProposalStatus::Accepted, None)
        .await;
    assert!(result.success);
}

#[tokio::test]
async fn sibling_rejection_failures_do_not_roll_back_acceptance() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let winner = env.register_freelancer("winner@example.com").await;
    let loser = env.register_freelancer("loser@example.com").await;
    let project = env.create_published_project(&client, "Site").await;

    let winning = env.submit_proposal(&winner, &project.id).await;
    let losing = env.submit_proposal(&loser, &project.id).await;

    // The fan-out write to the losing proposal will fail.
    env.store.inject_update_fault(collections::PROPOSALS, &losing.id);

    let result = env
        .proposals
        .update_status(&client, &winning.id, ProposalStatus::Accepted, None)
        .await;
    assert!(result.success, "primary step must survive fan-out failures");
    assert!(
        result.message.as_deref().unwrap().contains("1 rejection(s) failed"),
        "partial failure is reported: {:?}",
        result.message
    );

    // Accepted and assigned despite the failure...
    let winning_doc = env.raw_doc(collections::PROPOSALS, &winning.id).await;
    assert_eq!(winning_doc["status"], ProposalStatus::Accepted.as_str());
    let project_doc = env.raw_doc(collections::PROJECTS, &project.id).await;
    assert_eq!(project_doc["status"], ProjectStatus::InProgress.as_str());

    // ...while the sibling legitimately remains Submitted.
    let losing_doc = env.raw_doc(collections::PROPOSALS, &losing.id).await;
    assert_eq!(losing_doc["status"], ProposalStatus::Submitted.as_str());
}

#[tokio::test]
async fn listings_are_scoped_to_their_audiences() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;
    let project = env.create_published_project(&client, "Site").await;
    env.submit_proposal(&freelancer, &project.id).await;

    // The project owner lists proposals for the project.
    let listed = env
        .proposals
        .by_project(&client, &project.id)
        .await
        .expect_data("by_project");
    assert_eq!(listed.len(), 1);

    // The freelancer cannot.
    let result = env.proposals.by_project(&freelancer, &project.id).await;
    assert_eq!(result.code, Some("PERMISSION_DENIED"));

    // Freelancers list their own proposals; strangers cannot.
    let own = env
        .proposals
        .by_freelancer(&freelancer, &freelancer.uid)
        .await
        .expect_data("by_freelancer");
    assert_eq!(own.len(), 1);

    let result = env.proposals.by_freelancer(&client, &freelancer.uid).await;
    assert_eq!(result.code, Some("PERMISSION_DENIED"));
}

#[tokio::test]
async fn stats_fold_over_own_proposals() {
    let env = TestEnv::new();
    let client = env.register_client("client@example.com").await;
    let freelancer = env.register_freelancer("free@example.com").await;

    let first = env.create_published_project(&client, "First").await;
    let second = env.create_published_project(&client, "Second").await;

    let accepted = env.submit_proposal(&freelancer, &first.id).await;
    env.submit_proposal(&freelancer, &second.id).await;
    env.proposals
        .update_status(&client, &accepted.id, ProposalStatus::Accepted, None)
        .await
        .expect_data("accept");

    let stats = env
        .proposals
        .stats_for_freelancer(&freelancer, &freelancer.uid)
        .await
        .expect_data("stats");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.submitted, 1);
    assert_eq!(stats.success_rate, 50);

    let empty = env.register_freelancer("new@example.com").await;
    let stats = env
        .proposals
        .stats_for_freelancer(&empty, &empty.uid)
        .await
        .expect_data("empty stats");
    assert_eq!(stats.total, 0);
    assert_eq!(stats.success_rate, 0);
}
