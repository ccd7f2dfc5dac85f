use std::sync::Arc;

use chrono::Utc;
use common::{ProjectStatus, ProposalStatus, Role};
use docstore::{DocumentStore, Filter, OrderBy, Query};
use futures::future::join_all;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::envelope::OpResult;
use crate::error::DomainError;
use crate::models::proposal::{
    Proposal, ProposalStats, SubmitProposalInput, validate_submit_proposal,
};
use crate::models::{Principal, ts};

use super::project::ProjectRepo;
use super::{collections, fetch_desc};

/// Feedback stamped on proposals rejected as a side effect of another
/// proposal being accepted.
pub const OUTBID_FEEDBACK: &str = "Another freelancer was selected for this project.";

/// Repository for the `proposals` collection: one live proposal per
/// (project, freelancer) pair, status machine, and the acceptance saga.
pub struct ProposalRepo {
    store: Arc<dyn DocumentStore>,
    projects: Arc<ProjectRepo>,
}

impl ProposalRepo {
    pub fn new(store: Arc<dyn DocumentStore>, projects: Arc<ProjectRepo>) -> Self {
        Self { store, projects }
    }

    async fn find(&self, id: &str) -> Result<Option<Proposal>, DomainError> {
        match self.store.get(collections::PROPOSALS, id).await? {
            Some(value) => {
                let proposal = serde_json::from_value(value)
                    .map_err(|e| DomainError::Internal(e.to_string()))?;
                Ok(Some(proposal))
            }
            None => Ok(None),
        }
    }

    async fn require(&self, id: &str) -> Result<Proposal, DomainError> {
        self.find(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Proposal not found".into()))
    }

    #[instrument(skip(self, caller, input), fields(freelancer_id = %caller.uid, project_id = %input.project_id))]
    pub async fn submit(&self, caller: &Principal, input: SubmitProposalInput) -> OpResult<Proposal> {
        self.try_submit(caller, input).await.into()
    }

    async fn try_submit(
        &self,
        caller: &Principal,
        input: SubmitProposalInput,
    ) -> Result<Proposal, DomainError> {
        if caller.role != Role::Freelancer {
            return Err(DomainError::PermissionDenied);
        }
        validate_submit_proposal(&input)?;

        let project = self
            .projects
            .find(&input.project_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Project not found".into()))?;
        if project.status != ProjectStatus::Published {
            return Err(DomainError::Conflict(
                "Proposals can only be submitted to published projects".into(),
            ));
        }

        // One live proposal per (project, freelancer); a withdrawn one may
        // be replaced.
        let existing = self
            .store
            .query(
                collections::PROPOSALS,
                &Query::new()
                    .filter(Filter::eq("projectId", input.project_id.as_str()))
                    .filter(Filter::eq("freelancerId", caller.uid.as_str()))
                    .filter(Filter::ne("status", ProposalStatus::Withdrawn.as_str())),
            )
            .await?;
        if !existing.is_empty() {
            return Err(DomainError::Conflict(
                "You have already submitted a proposal for this project".into(),
            ));
        }

        let proposal = Proposal {
            id: Uuid::now_v7().to_string(),
            project_id: input.project_id,
            freelancer_id: caller.uid.clone(),
            cover_letter: input.cover_letter.trim().to_string(),
            budget: input.budget,
            timeline: input.timeline,
            milestones: input.milestones,
            status: ProposalStatus::Submitted,
            viewed_by_client: false,
            is_shortlisted: false,
            feedback: None,
            submitted_at: Utc::now(),
            responded_at: None,
        };

        let value =
            serde_json::to_value(&proposal).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.store
            .insert(collections::PROPOSALS, &proposal.id, value)
            .await?;

        if let Err(e) = self
            .store
            .increment(collections::PROJECTS, &proposal.project_id, "proposalCount", 1)
            .await
        {
            warn!(project_id = %proposal.project_id, error = %e, "Failed to bump proposal count");
        }

        info!(proposal_id = %proposal.id, "Proposal submitted");
        Ok(proposal)
    }

    /// Fetch a proposal. When the project's client reads it for the first
    /// time, `viewedByClient` is flipped as a best-effort side effect; the
    /// returned snapshot does not reflect the flip.
    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn get_by_id(&self, caller: &Principal, id: &str) -> OpResult<Proposal> {
        self.try_get_by_id(caller, id).await.into()
    }

    async fn try_get_by_id(&self, caller: &Principal, id: &str) -> Result<Proposal, DomainError> {
        let proposal = self.require(id).await?;
        let project = self.projects.find(&proposal.project_id).await?;

        let is_project_client = project
            .as_ref()
            .is_some_and(|p| p.client_id == caller.uid);
        let allowed =
            caller.uid == proposal.freelancer_id || caller.is_admin() || is_project_client;
        if !allowed {
            // Hidden rather than forbidden, so ids cannot be probed.
            return Err(DomainError::NotFound("Proposal not found".into()));
        }

        if is_project_client && !proposal.viewed_by_client {
            let patch = json!({ "viewedByClient": true });
            if let Err(e) = self.store.update(collections::PROPOSALS, id, patch).await {
                warn!(proposal_id = %id, error = %e, "Failed to mark proposal as viewed");
            }
        }

        Ok(proposal)
    }

    /// Move a proposal through its status machine.
    ///
    /// Accepting runs the non-atomic hire sequence: assign the freelancer
    /// to the project, accept this proposal, then best-effort reject every
    /// other submitted proposal for the same project. Fan-out failures do
    /// not roll anything back; they are reported in the envelope message.
    #[instrument(skip(self, caller, feedback), fields(caller = %caller.uid, status = %status))]
    pub async fn update_status(
        &self,
        caller: &Principal,
        id: &str,
        status: ProposalStatus,
        feedback: Option<String>,
    ) -> OpResult<Proposal> {
        match self.try_update_status(caller, id, status, feedback).await {
            Ok((proposal, Some(message))) => OpResult::ok_with_message(proposal, message),
            Ok((proposal, None)) => OpResult::ok(proposal),
            Err(e) => OpResult::err(e),
        }
    }

    async fn try_update_status(
        &self,
        caller: &Principal,
        id: &str,
        status: ProposalStatus,
        feedback: Option<String>,
    ) -> Result<(Proposal, Option<String>), DomainError> {
        let proposal = self.require(id).await?;

        if !proposal.status.can_transition_to(status) {
            return Err(DomainError::Conflict(format!(
                "Cannot change proposal status from {} to {}",
                proposal.status, status
            )));
        }

        match status {
            ProposalStatus::Shortlisted | ProposalStatus::Accepted | ProposalStatus::Rejected => {
                let project = self
                    .projects
                    .find(&proposal.project_id)
                    .await?
                    .ok_or_else(|| DomainError::NotFound("Project not found".into()))?;
                if !caller.can_act_for(&project.client_id) {
                    return Err(DomainError::PermissionDenied);
                }
            }
            ProposalStatus::Withdrawn => {
                if !caller.can_act_for(&proposal.freelancer_id) {
                    return Err(DomainError::PermissionDenied);
                }
            }
            ProposalStatus::Submitted => {
                // Unreachable: no legal transition back to Submitted.
                return Err(DomainError::Conflict(
                    "Proposals cannot return to Submitted".into(),
                ));
            }
        }

        if status == ProposalStatus::Accepted {
            return self.accept(caller, proposal, feedback).await;
        }

        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("status".into(), json!(status.as_str()));
        match status {
            ProposalStatus::Shortlisted => {
                fields.insert("isShortlisted".into(), json!(true));
            }
            ProposalStatus::Rejected | ProposalStatus::Withdrawn => {
                fields.insert("respondedAt".into(), ts(now));
            }
            _ => {}
        }
        if let Some(feedback) = &feedback {
            fields.insert("feedback".into(), json!(feedback));
        }

        self.store
            .update(collections::PROPOSALS, id, Value::Object(fields))
            .await?;

        let updated = self.require(id).await?;
        Ok((updated, None))
    }

    /// The acceptance saga. The project assignment and the acceptance are
    /// the primary steps; sibling rejections are unordered best-effort
    /// fan-out, and a crash in between can legitimately leave siblings
    /// still submitted.
    async fn accept(
        &self,
        caller: &Principal,
        proposal: Proposal,
        feedback: Option<String>,
    ) -> Result<(Proposal, Option<String>), DomainError> {
        self.projects
            .try_assign_freelancer(caller, &proposal.project_id, &proposal.freelancer_id)
            .await?;

        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("status".into(), json!(ProposalStatus::Accepted.as_str()));
        fields.insert("respondedAt".into(), ts(now));
        if let Some(feedback) = &feedback {
            fields.insert("feedback".into(), json!(feedback));
        }
        self.store
            .update(collections::PROPOSALS, &proposal.id, Value::Object(fields))
            .await?;

        let siblings = self
            .store
            .query(
                collections::PROPOSALS,
                &Query::new()
                    .filter(Filter::eq("projectId", proposal.project_id.as_str()))
                    .filter(Filter::eq("status", ProposalStatus::Submitted.as_str())),
            )
            .await?;

        let rejections = siblings
            .iter()
            .filter(|doc| doc.id != proposal.id)
            .map(|doc| {
                let sibling_id = doc.id.clone();
                let patch = json!({
                    "status": ProposalStatus::Rejected.as_str(),
                    "respondedAt": ts(Utc::now()),
                    "feedback": OUTBID_FEEDBACK,
                });
                async move {
                    let result = self
                        .store
                        .update(collections::PROPOSALS, &sibling_id, patch)
                        .await;
                    (sibling_id, result)
                }
            });
        let outcomes = join_all(rejections).await;

        let mut rejected = 0usize;
        let mut failed = 0usize;
        for (sibling_id, result) in outcomes {
            match result {
                Ok(()) => rejected += 1,
                Err(e) => {
                    failed += 1;
                    warn!(proposal_id = %sibling_id, error = %e, "Failed to reject sibling proposal");
                }
            }
        }

        let mut message = format!("Proposal accepted; {rejected} other proposal(s) rejected");
        if failed > 0 {
            message.push_str(&format!(", {failed} rejection(s) failed"));
        }

        info!(
            proposal_id = %proposal.id,
            project_id = %proposal.project_id,
            rejected,
            failed,
            "Proposal accepted"
        );

        let updated = self.require(&proposal.id).await?;
        Ok((updated, Some(message)))
    }

    /// All proposals for a project, newest first. Restricted to the
    /// project's owner.
    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn by_project(&self, caller: &Principal, project_id: &str) -> OpResult<Vec<Proposal>> {
        self.try_by_project(caller, project_id).await.into()
    }

    async fn try_by_project(
        &self,
        caller: &Principal,
        project_id: &str,
    ) -> Result<Vec<Proposal>, DomainError> {
        let project = self
            .projects
            .find(project_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Project not found".into()))?;
        if !caller.can_act_for(&project.client_id) {
            return Err(DomainError::PermissionDenied);
        }

        let query = Query::new()
            .filter(Filter::eq("projectId", project_id))
            .order_by(OrderBy::desc("submittedAt"));
        fetch_desc(&*self.store, collections::PROPOSALS, query, |p: &Proposal| {
            p.submitted_at
        })
        .await
        .map_err(DomainError::from)
    }

    /// A freelancer's own proposals, newest first.
    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn by_freelancer(
        &self,
        caller: &Principal,
        freelancer_id: &str,
    ) -> OpResult<Vec<Proposal>> {
        self.try_by_freelancer(caller, freelancer_id).await.into()
    }

    async fn try_by_freelancer(
        &self,
        caller: &Principal,
        freelancer_id: &str,
    ) -> Result<Vec<Proposal>, DomainError> {
        if !caller.can_act_for(freelancer_id) {
            return Err(DomainError::PermissionDenied);
        }
        let query = Query::new()
            .filter(Filter::eq("freelancerId", freelancer_id))
            .order_by(OrderBy::desc("submittedAt"));
        fetch_desc(&*self.store, collections::PROPOSALS, query, |p: &Proposal| {
            p.submitted_at
        })
        .await
        .map_err(DomainError::from)
    }

    /// Per-status counts over a freelancer's proposals.
    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn stats_for_freelancer(
        &self,
        caller: &Principal,
        freelancer_id: &str,
    ) -> OpResult<ProposalStats> {
        self.try_stats_for_freelancer(caller, freelancer_id)
            .await
            .into()
    }

    async fn try_stats_for_freelancer(
        &self,
        caller: &Principal,
        freelancer_id: &str,
    ) -> Result<ProposalStats, DomainError> {
        if !caller.can_act_for(freelancer_id) {
            return Err(DomainError::PermissionDenied);
        }
        let docs = self
            .store
            .query(
                collections::PROPOSALS,
                &Query::new().filter(Filter::eq("freelancerId", freelancer_id)),
            )
            .await?;
        let proposals = docs
            .iter()
            .map(|d| d.decode::<Proposal>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProposalStats::from_statuses(
            proposals.into_iter().map(|p| p.status),
        ))
    }
}
