use common::storage::StorageError;
use docstore::StoreError;

use crate::identity::AuthError;

/// Application-level error type.
///
/// Every failure a repository, guard, or session operation can produce is
/// one of these variants; each maps to a stable machine-readable code and a
/// user-facing message. Provider- and store-specific details never cross
/// this boundary except inside `Internal`/`Unavailable`, whose details are
/// logged rather than shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    Validation(String),
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    InvalidCredentials,
    EmailInUse,
    WeakPassword,
    AccountDisabled,
    RateLimited,
    /// The principal is authenticated but has no user record; the account
    /// must be repaired before continuing.
    NeedsRecovery,
    Unavailable(String),
    Internal(String),
}

impl DomainError {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `PERMISSION_DENIED`, `NOT_FOUND`, `CONFLICT`, `INVALID_CREDENTIALS`,
    /// `EMAIL_IN_USE`, `WEAK_PASSWORD`, `ACCOUNT_DISABLED`, `RATE_LIMITED`,
    /// `NEEDS_RECOVERY`, `UNAVAILABLE`, `INTERNAL_ERROR`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::RateLimited => "RATE_LIMITED",
            Self::NeedsRecovery => "NEEDS_RECOVERY",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable error description, safe to show to users.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::Conflict(msg) => msg.clone(),
            Self::PermissionDenied => {
                "You do not have permission to perform this action".into()
            }
            Self::InvalidCredentials => "Invalid email or password".into(),
            Self::EmailInUse => "An account with this email already exists".into(),
            Self::WeakPassword => "Password must be at least 8 characters".into(),
            Self::AccountDisabled => "This account has been disabled".into(),
            Self::RateLimited => "Too many attempts. Please try again later".into(),
            Self::NeedsRecovery => {
                "Your account needs to be repaired before continuing".into()
            }
            Self::Unavailable(_) => "The service is temporarily unavailable".into(),
            Self::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "An unexpected error occurred".into()
            }
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for DomainError {}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                DomainError::NotFound(format!("Document {collection}/{id} not found"))
            }
            StoreError::AlreadyExists { collection, id } => {
                DomainError::Conflict(format!("Document {collection}/{id} already exists"))
            }
            StoreError::IndexRequired { .. } => {
                // Repositories handle this with their unordered fallback;
                // reaching here means a query had no fallback path.
                DomainError::Internal(err.to_string())
            }
            StoreError::Serialization(detail) => DomainError::Internal(detail),
            StoreError::Unavailable(detail) => DomainError::Unavailable(detail),
        }
    }
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { .. } => DomainError::Validation(err.to_string()),
            StorageError::NotFound(key) => {
                DomainError::NotFound(format!("Stored object {key} not found"))
            }
            StorageError::InvalidKey(msg) | StorageError::InvalidHash(msg) => {
                DomainError::Internal(msg)
            }
            StorageError::Io(e) => DomainError::Unavailable(e.to_string()),
        }
    }
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => DomainError::InvalidCredentials,
            AuthError::EmailInUse => DomainError::EmailInUse,
            AuthError::WeakPassword => DomainError::WeakPassword,
            AuthError::AccountDisabled => DomainError::AccountDisabled,
            AuthError::RateLimited { .. } => DomainError::RateLimited,
            AuthError::Unavailable(detail) => DomainError::Unavailable(detail),
            AuthError::Unknown(detail) => DomainError::Internal(detail),
        }
    }
}
