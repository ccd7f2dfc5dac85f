use std::sync::Arc;

use chrono::Utc;
use common::{ProjectStatus, Role, Visibility};
use docstore::{DocumentStore, Filter, OrderBy, Query};
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::envelope::OpResult;
use crate::error::DomainError;
use crate::models::project::{
    CreateProjectInput, Project, ProjectPatch, validate_create_project, validate_project_patch,
};
use crate::models::{Principal, ts};

use super::{collections, fetch_desc};

/// Repository for the `projects` collection: enforces ownership and the
/// project status machine before any write reaches the store.
pub struct ProjectRepo {
    store: Arc<dyn DocumentStore>,
}

impl ProjectRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Plain lookup without side effects. Used by guards and sibling
    /// repositories; presentation code goes through [`get_by_id`].
    ///
    /// [`get_by_id`]: ProjectRepo::get_by_id
    pub(crate) async fn find(&self, id: &str) -> Result<Option<Project>, DomainError> {
        match self.store.get(collections::PROJECTS, id).await? {
            Some(value) => {
                let project = serde_json::from_value(value)
                    .map_err(|e| DomainError::Internal(e.to_string()))?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    async fn require(&self, id: &str) -> Result<Project, DomainError> {
        self.find(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Project not found".into()))
    }

    #[instrument(skip(self, caller, input), fields(client_id = %caller.uid))]
    pub async fn create(&self, caller: &Principal, input: CreateProjectInput) -> OpResult<Project> {
        self.try_create(caller, input).await.into()
    }

    async fn try_create(
        &self,
        caller: &Principal,
        input: CreateProjectInput,
    ) -> Result<Project, DomainError> {
        if caller.role != Role::Client {
            return Err(DomainError::PermissionDenied);
        }
        validate_create_project(&input)?;

        let now = Utc::now();
        let project = Project {
            id: Uuid::now_v7().to_string(),
            client_id: caller.uid.clone(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            category: input.category.trim().to_string(),
            subcategory: input.subcategory,
            budget: input.budget,
            timeline: input.timeline,
            skills: input.skills,
            status: ProjectStatus::Draft,
            visibility: input.visibility,
            assigned_freelancer_id: None,
            milestones: input.milestones,
            proposal_count: 0,
            view_count: 0,
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
        };

        let value =
            serde_json::to_value(&project).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.store
            .insert(collections::PROJECTS, &project.id, value)
            .await?;

        info!(project_id = %project.id, "Project created");
        Ok(project)
    }

    /// Fetch a project. Reading someone else's project bumps its view
    /// counter as a best-effort side effect; the returned snapshot does not
    /// reflect the bump.
    #[instrument(skip(self, caller))]
    pub async fn get_by_id(&self, caller: Option<&Principal>, id: &str) -> OpResult<Project> {
        self.try_get_by_id(caller, id).await.into()
    }

    async fn try_get_by_id(
        &self,
        caller: Option<&Principal>,
        id: &str,
    ) -> Result<Project, DomainError> {
        let project = self.require(id).await?;

        let is_owner = caller.is_some_and(|c| c.uid == project.client_id);
        if !is_owner
            && let Err(e) = self
                .store
                .increment(collections::PROJECTS, id, "viewCount", 1)
                .await
        {
            warn!(project_id = %id, error = %e, "Failed to increment view count");
        }

        Ok(project)
    }

    #[instrument(skip(self, caller, patch), fields(caller = %caller.uid))]
    pub async fn update(
        &self,
        caller: &Principal,
        id: &str,
        patch: ProjectPatch,
    ) -> OpResult<Project> {
        self.try_update(caller, id, patch).await.into()
    }

    async fn try_update(
        &self,
        caller: &Principal,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Project, DomainError> {
        let project = self.require(id).await?;
        if !caller.can_act_for(&project.client_id) {
            return Err(DomainError::PermissionDenied);
        }
        validate_project_patch(&patch)?;

        let mut fields = Map::new();
        if let Some(title) = &patch.title {
            fields.insert("title".into(), json!(title.trim()));
        }
        if let Some(description) = &patch.description {
            fields.insert("description".into(), json!(description.trim()));
        }
        if let Some(category) = &patch.category {
            fields.insert("category".into(), json!(category.trim()));
        }
        if let Some(subcategory) = &patch.subcategory {
            fields.insert("subcategory".into(), json!(subcategory));
        }
        if let Some(budget) = &patch.budget {
            let value =
                serde_json::to_value(budget).map_err(|e| DomainError::Internal(e.to_string()))?;
            fields.insert("budget".into(), value);
        }
        if let Some(timeline) = &patch.timeline {
            let value =
                serde_json::to_value(timeline).map_err(|e| DomainError::Internal(e.to_string()))?;
            fields.insert("timeline".into(), value);
        }
        if let Some(skills) = &patch.skills {
            fields.insert("skills".into(), json!(skills));
        }
        if let Some(visibility) = &patch.visibility {
            fields.insert("visibility".into(), json!(visibility.as_str()));
        }
        if let Some(milestones) = &patch.milestones {
            let value = serde_json::to_value(milestones)
                .map_err(|e| DomainError::Internal(e.to_string()))?;
            fields.insert("milestones".into(), value);
        }
        fields.insert("updatedAt".into(), ts(Utc::now()));

        self.store
            .update(collections::PROJECTS, id, Value::Object(fields))
            .await?;
        self.require(id).await
    }

    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn delete(&self, caller: &Principal, id: &str) -> OpResult<()> {
        self.try_delete(caller, id).await.into()
    }

    async fn try_delete(&self, caller: &Principal, id: &str) -> Result<(), DomainError> {
        let project = self.require(id).await?;
        if !caller.can_act_for(&project.client_id) {
            return Err(DomainError::PermissionDenied);
        }
        // Admins may remove projects in any state.
        if !caller.is_admin() && !project.status.is_deletable() {
            return Err(DomainError::Conflict(
                "Cannot delete projects that are in progress or completed".into(),
            ));
        }

        self.store.delete(collections::PROJECTS, id).await?;
        info!(project_id = %id, "Project deleted");
        Ok(())
    }

    /// Hire a freelancer: moves the project to `InProgress`, records the
    /// assignee, and stamps the start date.
    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn assign_freelancer(
        &self,
        caller: &Principal,
        id: &str,
        freelancer_id: &str,
    ) -> OpResult<Project> {
        self.try_assign_freelancer(caller, id, freelancer_id)
            .await
            .into()
    }

    pub(crate) async fn try_assign_freelancer(
        &self,
        caller: &Principal,
        id: &str,
        freelancer_id: &str,
    ) -> Result<Project, DomainError> {
        let project = self.require(id).await?;
        let is_owning_client = caller.role == Role::Client && caller.uid == project.client_id;
        if !caller.is_admin() && !is_owning_client {
            return Err(DomainError::PermissionDenied);
        }
        if !project.status.can_transition_to(ProjectStatus::InProgress) {
            return Err(DomainError::Conflict(format!(
                "Cannot assign a freelancer to a {} project",
                project.status
            )));
        }

        let now = Utc::now();
        let patch = json!({
            "status": ProjectStatus::InProgress.as_str(),
            "assignedFreelancerId": freelancer_id,
            "startDate": ts(now),
            "updatedAt": ts(now),
        });
        self.store.update(collections::PROJECTS, id, patch).await?;

        info!(project_id = %id, %freelancer_id, "Freelancer assigned");
        self.require(id).await
    }

    /// Move a project through its status machine. Completing a project
    /// stamps the end date.
    #[instrument(skip(self, caller), fields(caller = %caller.uid, status = %status))]
    pub async fn update_status(
        &self,
        caller: &Principal,
        id: &str,
        status: ProjectStatus,
    ) -> OpResult<Project> {
        self.try_update_status(caller, id, status).await.into()
    }

    async fn try_update_status(
        &self,
        caller: &Principal,
        id: &str,
        status: ProjectStatus,
    ) -> Result<Project, DomainError> {
        let project = self.require(id).await?;
        if !caller.can_act_for(&project.client_id) {
            return Err(DomainError::PermissionDenied);
        }
        if !project.status.can_transition_to(status) {
            return Err(DomainError::Conflict(format!(
                "Cannot change project status from {} to {}",
                project.status, status
            )));
        }

        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("status".into(), json!(status.as_str()));
        fields.insert("updatedAt".into(), ts(now));
        if status == ProjectStatus::Completed {
            fields.insert("endDate".into(), ts(now));
        }

        self.store
            .update(collections::PROJECTS, id, Value::Object(fields))
            .await?;
        self.require(id).await
    }

    /// Open a draft for proposals.
    pub async fn publish(&self, caller: &Principal, id: &str) -> OpResult<Project> {
        self.update_status(caller, id, ProjectStatus::Published)
            .await
    }

    /// Suspend an open or running project.
    pub async fn pause(&self, caller: &Principal, id: &str) -> OpResult<Project> {
        self.update_status(caller, id, ProjectStatus::Paused).await
    }

    /// Resume a paused project: back to `InProgress` if a freelancer is
    /// assigned, otherwise back to `Published`.
    pub async fn resume(&self, caller: &Principal, id: &str) -> OpResult<Project> {
        self.try_resume(caller, id).await.into()
    }

    async fn try_resume(&self, caller: &Principal, id: &str) -> Result<Project, DomainError> {
        let project = self.require(id).await?;
        if project.status != ProjectStatus::Paused {
            return Err(DomainError::Conflict("Project is not paused".into()));
        }
        let target = if project.assigned_freelancer_id.is_some() {
            ProjectStatus::InProgress
        } else {
            ProjectStatus::Published
        };
        self.try_update_status(caller, id, target).await
    }

    /// Projects owned by a client, newest first.
    #[instrument(skip(self))]
    pub async fn by_client(&self, client_id: &str) -> OpResult<Vec<Project>> {
        let query = Query::new()
            .filter(Filter::eq("clientId", client_id))
            .order_by(OrderBy::desc("createdAt"));
        fetch_desc(&*self.store, collections::PROJECTS, query, |p: &Project| {
            p.created_at
        })
        .await
        .map_err(DomainError::from)
        .into()
    }

    /// Publicly browsable open projects, newest first.
    #[instrument(skip(self))]
    pub async fn published(&self) -> OpResult<Vec<Project>> {
        let query = Query::new()
            .filter(Filter::eq("status", ProjectStatus::Published.as_str()))
            .filter(Filter::eq("visibility", Visibility::Public.as_str()))
            .order_by(OrderBy::desc("createdAt"));
        fetch_desc(&*self.store, collections::PROJECTS, query, |p: &Project| {
            p.created_at
        })
        .await
        .map_err(DomainError::from)
        .into()
    }

    /// The most-viewed open public projects.
    #[instrument(skip(self))]
    pub async fn featured(&self, limit: usize) -> OpResult<Vec<Project>> {
        let query = Query::new()
            .filter(Filter::eq("status", ProjectStatus::Published.as_str()))
            .filter(Filter::eq("visibility", Visibility::Public.as_str()))
            .order_by(OrderBy::desc("viewCount"))
            .limit(limit);
        fetch_desc(&*self.store, collections::PROJECTS, query, |p: &Project| {
            p.view_count
        })
        .await
        .map_err(DomainError::from)
        .into()
    }

    /// Open public projects requiring any of the given skills, newest
    /// first.
    #[instrument(skip(self))]
    pub async fn by_skills(&self, skills: &[String]) -> OpResult<Vec<Project>> {
        if skills.is_empty() {
            return OpResult::err(DomainError::Validation(
                "At least one skill is required".into(),
            ));
        }
        let candidates = skills.iter().map(|s| Value::from(s.as_str())).collect();
        let query = Query::new()
            .filter(Filter::eq("status", ProjectStatus::Published.as_str()))
            .filter(Filter::eq("visibility", Visibility::Public.as_str()))
            .filter(Filter::array_contains_any("skills", candidates))
            .order_by(OrderBy::desc("createdAt"));
        fetch_desc(&*self.store, collections::PROJECTS, query, |p: &Project| {
            p.created_at
        })
        .await
        .map_err(DomainError::from)
        .into()
    }
}
