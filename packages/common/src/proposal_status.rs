use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a proposal from submission to resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ProposalStatus {
    /// Submitted by the freelancer, awaiting the client.
    Submitted,
    /// Marked as a candidate by the client.
    Shortlisted,
    /// Chosen for the project.
    Accepted,
    /// Declined by the client.
    Rejected,
    /// Retracted by the freelancer.
    Withdrawn,
}

impl ProposalStatus {
    /// All possible status values.
    pub const ALL: &'static [ProposalStatus] = &[
        Self::Submitted,
        Self::Shortlisted,
        Self::Accepted,
        Self::Rejected,
        Self::Withdrawn,
    ];

    /// Statuses a proposal can no longer leave.
    pub const FINAL: &'static [ProposalStatus] =
        &[Self::Accepted, Self::Rejected, Self::Withdrawn];

    /// Returns true if the proposal has reached a final status.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Withdrawn)
    }

    /// Returns true if the transition `self -> target` is legal.
    pub fn can_transition_to(&self, target: ProposalStatus) -> bool {
        match (self, target) {
            (Self::Submitted, Self::Shortlisted) => true,
            (Self::Submitted | Self::Shortlisted, Self::Accepted) => true,
            (Self::Submitted | Self::Shortlisted, Self::Rejected) => true,
            (Self::Submitted | Self::Shortlisted, Self::Withdrawn) => true,
            _ => false,
        }
    }

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Shortlisted => "Shortlisted",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ProposalStatus {
    fn default() -> Self {
        Self::Submitted
    }
}

/// Error when parsing an invalid proposal status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProposalStatusError {
    invalid: String,
}

impl fmt::Display for ParseProposalStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid proposal status '{}'. Valid values: {}",
            self.invalid,
            ProposalStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseProposalStatusError {}

impl FromStr for ProposalStatus {
    type Err = ParseProposalStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Submitted" => Ok(Self::Submitted),
            "Shortlisted" => Ok(Self::Shortlisted),
            "Accepted" => Ok(Self::Accepted),
            "Rejected" => Ok(Self::Rejected),
            "Withdrawn" => Ok(Self::Withdrawn),
            _ => Err(ParseProposalStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
