pub mod file;
pub mod principal;
pub mod profile;
pub mod project;
pub mod proposal;

pub use file::{BatchDeleteFailure, BatchDeleteOutcome, FilePatch, FileRecord, UploadFileInput};
pub use principal::Principal;
pub use profile::{
    ClientProfile, ClientProfilePatch, ClientStats, ClientStatsDelta, CreateClientProfileInput,
    CreateFreelancerProfileInput, FreelancerProfile, FreelancerProfilePatch, FreelancerStats,
    FreelancerStatsDelta,
};
pub use project::{CreateProjectInput, Milestone, Project, ProjectPatch};
pub use proposal::{Proposal, ProposalMilestone, ProposalStats, SubmitProposalInput};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Encode a timestamp the way stored documents carry them (microseconds
/// since the epoch). Patch builders must use this to stay consistent with
/// the models' serde representation.
pub(crate) fn ts(dt: DateTime<Utc>) -> Value {
    Value::from(dt.timestamp_micros())
}
