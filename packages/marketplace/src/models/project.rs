use chrono::{DateTime, Utc};
use common::{Budget, ProjectStatus, Timeline, Visibility};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::double_option;

/// A deliverable chunk of a project, defined by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub title: String,
    pub description: String,
    pub amount: f64,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
}

/// A client's job posting, as stored in the `projects` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub budget: Budget,
    pub timeline: Timeline,
    pub skills: Vec<String>,
    pub status: ProjectStatus,
    pub visibility: Visibility,
    pub assigned_freelancer_id: Option<String>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    pub proposal_count: i64,
    pub view_count: i64,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Fields required to post a new project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub budget: Budget,
    pub timeline: Timeline,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

/// Partial update to a project. Absent fields are left untouched;
/// `subcategory` distinguishes "absent" from "set to null".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub subcategory: Option<Option<String>>,
    pub budget: Option<Budget>,
    pub timeline: Option<Timeline>,
    pub skills: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub milestones: Option<Vec<Milestone>>,
}

/// Validate a trimmed title (1-120 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), DomainError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 120 {
        return Err(DomainError::Validation(
            "Title must be 1-120 characters".into(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), DomainError> {
    let description = description.trim();
    if description.is_empty() || description.chars().count() > 5000 {
        return Err(DomainError::Validation(
            "Description must be 1-5000 characters".into(),
        ));
    }
    Ok(())
}

fn validate_skills(skills: &[String]) -> Result<(), DomainError> {
    if skills.len() > 20 {
        return Err(DomainError::Validation(
            "A project can list at most 20 skills".into(),
        ));
    }
    if skills.iter().any(|s| s.trim().is_empty()) {
        return Err(DomainError::Validation("Skills must not be empty".into()));
    }
    Ok(())
}

fn validate_budget(budget: &Budget) -> Result<(), DomainError> {
    if !budget.is_valid() {
        return Err(DomainError::Validation(
            "Budget amounts must be positive and ranges ordered".into(),
        ));
    }
    Ok(())
}

fn validate_timeline(timeline: &Timeline) -> Result<(), DomainError> {
    if !timeline.is_valid() {
        return Err(DomainError::Validation(
            "Timeline duration must be greater than zero".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_project(input: &CreateProjectInput) -> Result<(), DomainError> {
    validate_title(&input.title)?;
    validate_description(&input.description)?;
    if input.category.trim().is_empty() {
        return Err(DomainError::Validation("Category is required".into()));
    }
    validate_budget(&input.budget)?;
    validate_timeline(&input.timeline)?;
    validate_skills(&input.skills)?;
    Ok(())
}

pub fn validate_project_patch(patch: &ProjectPatch) -> Result<(), DomainError> {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }
    if let Some(category) = &patch.category
        && category.trim().is_empty()
    {
        return Err(DomainError::Validation("Category is required".into()));
    }
    if let Some(budget) = &patch.budget {
        validate_budget(budget)?;
    }
    if let Some(timeline) = &patch.timeline {
        validate_timeline(timeline)?;
    }
    if let Some(skills) = &patch.skills {
        validate_skills(skills)?;
    }
    Ok(())
}
