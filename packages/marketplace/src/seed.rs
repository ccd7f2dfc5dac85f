use common::Role;
use docstore::{DocumentStore, Filter, Query};
use tracing::info;

use crate::error::DomainError;
use crate::identity::local::LocalIdentityProvider;
use crate::models::Principal;
use crate::repos::collections;

/// Ensure a bootstrap admin exists: a provider account plus its `users`
/// record. Idempotent; an already-seeded store is left untouched.
pub async fn seed_admin(
    provider: &LocalIdentityProvider,
    store: &dyn DocumentStore,
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<Principal, DomainError> {
    let existing = store
        .query(
            collections::USERS,
            &Query::new().filter(Filter::eq("role", Role::Admin.as_str())),
        )
        .await?;
    if let Some(doc) = existing.first() {
        let admin: Principal = doc
            .decode()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        info!(uid = %admin.uid, "Admin already seeded");
        return Ok(admin);
    }

    let uid = provider.create_account(email, password).await?;
    let admin = Principal::new(&uid, email.trim().to_lowercase(), display_name, Role::Admin);

    let value = serde_json::to_value(&admin).map_err(|e| DomainError::Internal(e.to_string()))?;
    store.insert(collections::USERS, &admin.uid, value).await?;

    info!(uid = %admin.uid, "Seeded bootstrap admin");
    Ok(admin)
}
