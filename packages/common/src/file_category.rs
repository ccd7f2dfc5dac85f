use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum size of an uploaded file: 50 MiB.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: &'static [&'static str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "application/zip",
];

/// Returns true if the MIME type is accepted for upload.
pub fn is_allowed_mime_type(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.iter().any(|m| *m == mime)
}

/// What an uploaded file is for. Determines storage prefix and public
/// visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FileCategory {
    ProfilePhoto,
    PortfolioImage,
    ProjectAttachment,
    ProposalAttachment,
    MessageAttachment,
}

impl FileCategory {
    /// All possible category values.
    pub const ALL: &'static [FileCategory] = &[
        Self::ProfilePhoto,
        Self::PortfolioImage,
        Self::ProjectAttachment,
        Self::ProposalAttachment,
        Self::MessageAttachment,
    ];

    /// Files in public categories are readable by anyone.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::ProfilePhoto | Self::PortfolioImage)
    }

    /// Key prefix under which objects of this category are stored.
    pub fn storage_prefix(&self) -> &'static str {
        match self {
            Self::ProfilePhoto => "profile-photos",
            Self::PortfolioImage => "portfolio",
            Self::ProjectAttachment => "project-attachments",
            Self::ProposalAttachment => "proposal-attachments",
            Self::MessageAttachment => "message-attachments",
        }
    }

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfilePhoto => "ProfilePhoto",
            Self::PortfolioImage => "PortfolioImage",
            Self::ProjectAttachment => "ProjectAttachment",
            Self::ProposalAttachment => "ProposalAttachment",
            Self::MessageAttachment => "MessageAttachment",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid file category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFileCategoryError {
    invalid: String,
}

impl fmt::Display for ParseFileCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid file category '{}'. Valid values: {}",
            self.invalid,
            FileCategory::ALL
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseFileCategoryError {}

impl FromStr for FileCategory {
    type Err = ParseFileCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ProfilePhoto" => Ok(Self::ProfilePhoto),
            "PortfolioImage" => Ok(Self::PortfolioImage),
            "ProjectAttachment" => Ok(Self::ProjectAttachment),
            "ProposalAttachment" => Ok(Self::ProposalAttachment),
            "MessageAttachment" => Ok(Self::MessageAttachment),
            _ => Err(ParseFileCategoryError {
                invalid: s.to_string(),
            }),
        }
    }
}
