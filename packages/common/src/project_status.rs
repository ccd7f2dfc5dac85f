use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a project during its lifecycle.
///
/// The main path is one-directional: Draft → Published → InProgress →
/// UnderReview → Completed. Cancelled is reachable from any non-final
/// status; Paused toggles with Published/InProgress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ProjectStatus {
    /// Created but not visible to freelancers.
    Draft,
    /// Open for proposals.
    Published,
    /// A freelancer has been assigned and work has started.
    InProgress,
    /// Work delivered, awaiting the client's review.
    UnderReview,
    /// Accepted and closed.
    Completed,
    /// Closed without completion.
    Cancelled,
    /// Temporarily suspended by the client.
    Paused,
}

impl ProjectStatus {
    /// All possible status values.
    pub const ALL: &'static [ProjectStatus] = &[
        Self::Draft,
        Self::Published,
        Self::InProgress,
        Self::UnderReview,
        Self::Completed,
        Self::Cancelled,
        Self::Paused,
    ];

    /// Returns true if no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if a project in this status may be deleted.
    pub fn is_deletable(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::Published | Self::Cancelled | Self::Paused
        )
    }

    /// Returns true if the transition `self -> target` is legal.
    pub fn can_transition_to(&self, target: ProjectStatus) -> bool {
        match (self, target) {
            (Self::Draft, Self::Published) => true,
            (Self::Published, Self::InProgress) => true,
            (Self::InProgress, Self::UnderReview) => true,
            (Self::UnderReview, Self::Completed) => true,
            // Pause/resume toggles.
            (Self::Published | Self::InProgress, Self::Paused) => true,
            (Self::Paused, Self::Published | Self::InProgress) => true,
            // Cancellation from any non-final status.
            (s, Self::Cancelled) if !s.is_terminal() => true,
            _ => false,
        }
    }

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Published => "Published",
            Self::InProgress => "InProgress",
            Self::UnderReview => "UnderReview",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Paused => "Paused",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// Error when parsing an invalid project status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProjectStatusError {
    invalid: String,
}

impl fmt::Display for ParseProjectStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid project status '{}'. Valid values: {}",
            self.invalid,
            ProjectStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseProjectStatusError {}

impl FromStr for ProjectStatus {
    type Err = ParseProjectStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "Published" => Ok(Self::Published),
            "InProgress" => Ok(Self::InProgress),
            "UnderReview" => Ok(Self::UnderReview),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            "Paused" => Ok(Self::Paused),
            _ => Err(ParseProjectStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
