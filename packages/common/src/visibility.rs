use serde::{Deserialize, Serialize};
use std::fmt;

/// Who can discover a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Visibility {
    /// Listed in public browse and search results.
    Public,
    /// Visible only to the owner and the assigned freelancer.
    Private,
    /// Visible to freelancers the client invites.
    InviteOnly,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Private => "Private",
            Self::InviteOnly => "InviteOnly",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}
