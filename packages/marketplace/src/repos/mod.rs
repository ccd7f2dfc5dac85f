pub mod file;
pub mod profile;
pub mod project;
pub mod proposal;

pub use file::FileRepo;
pub use profile::ProfileRepo;
pub use project::ProjectRepo;
pub use proposal::ProposalRepo;

use docstore::{DocumentStore, Query, StoreError};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Collection names in the document store.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CLIENT_PROFILES: &str = "client_profiles";
    pub const FREELANCER_PROFILES: &str = "freelancer_profiles";
    pub const PROJECTS: &str = "projects";
    pub const PROPOSALS: &str = "proposals";
    pub const FILES: &str = "files";
}

/// Run an ordered query, falling back to the unordered form with a
/// client-side sort when the store is missing the ordering index.
///
/// Both modes yield the same result set; only the ordering source differs.
/// `query` must carry a descending `order_by` matching `sort_key`.
pub(crate) async fn fetch_desc<T, K, F>(
    store: &dyn DocumentStore,
    collection: &str,
    query: Query,
    sort_key: F,
) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
    K: Ord,
    F: Fn(&T) -> K,
{
    match store.query(collection, &query).await {
        Ok(docs) => docs.iter().map(|d| d.decode()).collect(),
        Err(StoreError::IndexRequired { collection: c, field }) => {
            warn!(
                collection = %c,
                field = %field,
                "Ordered query needs a missing index; sorting client-side"
            );
            let docs = store.query(collection, &query.unordered()).await?;
            let mut items = docs
                .iter()
                .map(|d| d.decode())
                .collect::<Result<Vec<T>, _>>()?;
            items.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
            if let Some(limit) = query.limit {
                items.truncate(limit);
            }
            Ok(items)
        }
        Err(e) => Err(e),
    }
}
