use chrono::{DateTime, Utc};
use common::{Budget, ProposalStatus, Timeline};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A delivery step proposed by the freelancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalMilestone {
    pub title: String,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub duration_days: Option<u32>,
}

/// A freelancer's bid on a project, as stored in the `proposals`
/// collection. At most one non-withdrawn proposal exists per
/// (project, freelancer) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub project_id: String,
    pub freelancer_id: String,
    pub cover_letter: String,
    pub budget: Budget,
    pub timeline: Timeline,
    #[serde(default)]
    pub milestones: Vec<ProposalMilestone>,
    pub status: ProposalStatus,
    pub viewed_by_client: bool,
    pub is_shortlisted: bool,
    pub feedback: Option<String>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub responded_at: Option<DateTime<Utc>>,
}

/// Fields required to submit a proposal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProposalInput {
    pub project_id: String,
    pub cover_letter: String,
    pub budget: Budget,
    pub timeline: Timeline,
    #[serde(default)]
    pub milestones: Vec<ProposalMilestone>,
}

pub fn validate_submit_proposal(input: &SubmitProposalInput) -> Result<(), DomainError> {
    if input.project_id.trim().is_empty() {
        return Err(DomainError::Validation("Project id is required".into()));
    }
    let cover = input.cover_letter.trim();
    if cover.is_empty() || cover.chars().count() > 4000 {
        return Err(DomainError::Validation(
            "Cover letter must be 1-4000 characters".into(),
        ));
    }
    if !input.budget.is_valid() {
        return Err(DomainError::Validation(
            "Budget amounts must be positive and ranges ordered".into(),
        ));
    }
    if !input.timeline.is_valid() {
        return Err(DomainError::Validation(
            "Timeline duration must be greater than zero".into(),
        ));
    }
    for milestone in &input.milestones {
        if milestone.title.trim().is_empty() {
            return Err(DomainError::Validation(
                "Milestone titles must not be empty".into(),
            ));
        }
        if milestone.amount <= 0.0 {
            return Err(DomainError::Validation(
                "Milestone amounts must be positive".into(),
            ));
        }
    }
    Ok(())
}

/// Per-status counts over a freelancer's proposals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalStats {
    pub total: u64,
    pub submitted: u64,
    pub shortlisted: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub withdrawn: u64,
    /// `round(accepted / total * 100)`; 0 when there are no proposals.
    pub success_rate: u32,
}

impl ProposalStats {
    /// Pure fold over proposal statuses.
    pub fn from_statuses<I: IntoIterator<Item = ProposalStatus>>(statuses: I) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            stats.total += 1;
            match status {
                ProposalStatus::Submitted => stats.submitted += 1,
                ProposalStatus::Shortlisted => stats.shortlisted += 1,
                ProposalStatus::Accepted => stats.accepted += 1,
                ProposalStatus::Rejected => stats.rejected += 1,
                ProposalStatus::Withdrawn => stats.withdrawn += 1,
            }
        }
        if stats.total > 0 {
            stats.success_rate =
                ((stats.accepted as f64 / stats.total as f64) * 100.0).round() as u32;
        }
        stats
    }
}
