use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

/// The authenticated actor, as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: display_name.into(),
            role,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The universal mutation rule: owners act on their own records, admins
    /// act on anything.
    pub fn can_act_for(&self, owner_id: &str) -> bool {
        self.uid == owner_id || self.is_admin()
    }
}
