use serde::Serialize;

use crate::error::DomainError;

/// Uniform result envelope returned by every public domain operation.
///
/// This shape is the contract between the domain layer and whatever renders
/// it: `success` always present, `data` on success, `error`/`code` on
/// failure, `message` for human-readable notes in either direction.
#[derive(Debug, Serialize)]
pub struct OpResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> OpResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            code: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    pub fn err(error: DomainError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.message()),
            message: None,
            code: Some(error.code()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.success
    }

    /// Unwrap the payload, panicking with the error text if the operation
    /// failed. Intended for tests and examples.
    pub fn expect_data(self, context: &str) -> T {
        match self.data {
            Some(data) => data,
            None => panic!(
                "{context}: operation failed: {} ({})",
                self.error.as_deref().unwrap_or("no error message"),
                self.code.unwrap_or("no code"),
            ),
        }
    }
}

impl<T> From<Result<T, DomainError>> for OpResult<T> {
    fn from(result: Result<T, DomainError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}
