use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an authenticated principal.
///
/// Roles are assigned at registration and never change through this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Role {
    /// Posts projects and hires freelancers.
    Client,
    /// Submits proposals and works on projects.
    Freelancer,
    /// Platform operator; bypasses ownership checks.
    Admin,
}

impl Role {
    /// All possible role values.
    pub const ALL: &'static [Role] = &[Self::Client, Self::Freelancer, Self::Admin];

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Freelancer => "Freelancer",
            Self::Admin => "Admin",
        }
    }

    /// Dashboard path users of this role land on after login.
    pub fn home_path(&self) -> &'static str {
        match self {
            Self::Client => "/dashboard/client",
            Self::Freelancer => "/dashboard/freelancer",
            Self::Admin => "/dashboard/admin",
        }
    }

    /// Path of the profile-setup flow for this role, if the role has one.
    pub fn profile_setup_path(&self) -> Option<&'static str> {
        match self {
            Self::Client => Some("/profile/client/setup"),
            Self::Freelancer => Some("/profile/freelancer/setup"),
            Self::Admin => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid role '{}'. Valid values: {}",
            self.invalid,
            Role::ALL
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Client" => Ok(Self::Client),
            "Freelancer" => Ok(Self::Freelancer),
            "Admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError {
                invalid: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        for role in Role::ALL {
            let json = serde_json::to_string(role).unwrap();
            let parsed: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(*role, parsed);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        assert_eq!("Client".parse::<Role>().unwrap(), Role::Client);
        assert!("client".parse::<Role>().is_err());
        assert!("Owner".parse::<Role>().is_err());
    }

    #[test]
    fn home_paths_are_distinct() {
        let mut paths: Vec<_> = Role::ALL.iter().map(|r| r.home_path()).collect();
        paths.dedup();
        assert_eq!(paths.len(), Role::ALL.len());
    }
}
