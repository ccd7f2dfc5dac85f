use std::sync::Arc;

use chrono::Utc;
use common::file_category::{MAX_FILE_SIZE, is_allowed_mime_type};
use common::storage::{ContentHash, ObjectStore};
use docstore::{DocumentStore, Filter, OrderBy, Query};
use futures::future::join_all;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::envelope::OpResult;
use crate::error::DomainError;
use crate::models::file::{
    BatchDeleteFailure, BatchDeleteOutcome, FilePatch, FileRecord, UploadFileInput,
};
use crate::models::{Principal, ts};
use crate::utils::filename::{generate_stored_name, validate_original_name};

use super::collections;

/// Repository for uploaded files: metadata in the `files` collection, bytes
/// in the object store. Deleting treats the pair as one logical record even
/// though it is two physical calls; a crash in between leaves an orphan
/// object, which [`cleanup_orphans`](FileRepo::cleanup_orphans) sweeps.
pub struct FileRepo {
    store: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
}

impl FileRepo {
    pub fn new(store: Arc<dyn DocumentStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    async fn find(&self, id: &str) -> Result<Option<FileRecord>, DomainError> {
        match self.store.get(collections::FILES, id).await? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(|e| DomainError::Internal(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    async fn require(&self, id: &str) -> Result<FileRecord, DomainError> {
        self.find(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("File not found".into()))
    }

    /// Validate and store an upload. Size and MIME checks run before any
    /// store call.
    #[instrument(skip(self, caller, input), fields(owner_id = %caller.uid, category = %input.category))]
    pub async fn upload(&self, caller: &Principal, input: UploadFileInput) -> OpResult<FileRecord> {
        self.try_upload(caller, input).await.into()
    }

    async fn try_upload(
        &self,
        caller: &Principal,
        input: UploadFileInput,
    ) -> Result<FileRecord, DomainError> {
        if input.data.len() as u64 > MAX_FILE_SIZE {
            return Err(DomainError::Validation(
                "File exceeds the 50 MB size limit".into(),
            ));
        }

        let original_name = validate_original_name(&input.original_name)
            .map_err(|e| DomainError::Validation(e.message().into()))?
            .to_string();

        let mime_type = match input.content_type {
            Some(ref mime) => mime.clone(),
            None => mime_guess::from_path(&original_name)
                .first()
                .map(|m| m.to_string())
                .ok_or_else(|| {
                    DomainError::Validation("Could not determine the file type".into())
                })?,
        };
        if !is_allowed_mime_type(&mime_type) {
            return Err(DomainError::Validation(format!(
                "File type '{mime_type}' is not allowed"
            )));
        }

        let stored_name = generate_stored_name(&original_name, Utc::now());
        let storage_key = format!("{}/{}", input.category.storage_prefix(), stored_name);
        let checksum = ContentHash::compute(&input.data).to_hex();

        self.objects.put(&storage_key, &input.data).await?;

        let record = FileRecord {
            id: Uuid::now_v7().to_string(),
            owner_id: caller.uid.clone(),
            stored_name,
            storage_key: storage_key.clone(),
            original_name,
            size: input.data.len() as u64,
            mime_type,
            category: input.category,
            is_public: input.category.is_public(),
            checksum,
            project_id: input.project_id,
            proposal_id: input.proposal_id,
            message_id: input.message_id,
            uploaded_at: Utc::now(),
        };

        let value =
            serde_json::to_value(&record).map_err(|e| DomainError::Internal(e.to_string()))?;
        if let Err(e) = self.store.insert(collections::FILES, &record.id, value).await {
            // Don't leave the object behind if its record never landed.
            if let Err(cleanup) = self.objects.delete(&storage_key).await {
                warn!(key = %storage_key, error = %cleanup, "Failed to remove object after metadata failure");
            }
            return Err(e.into());
        }

        info!(file_id = %record.id, key = %record.storage_key, "File uploaded");
        Ok(record)
    }

    fn can_view(caller: Option<&Principal>, record: &FileRecord) -> bool {
        record.is_public || caller.is_some_and(|c| c.can_act_for(&record.owner_id))
    }

    #[instrument(skip(self, caller))]
    pub async fn get_by_id(&self, caller: Option<&Principal>, id: &str) -> OpResult<FileRecord> {
        self.try_get_by_id(caller, id).await.into()
    }

    async fn try_get_by_id(
        &self,
        caller: Option<&Principal>,
        id: &str,
    ) -> Result<FileRecord, DomainError> {
        let record = self.require(id).await?;
        if !Self::can_view(caller, &record) {
            return Err(DomainError::NotFound("File not found".into()));
        }
        Ok(record)
    }

    /// Fetch the stored bytes for a file the caller may view.
    #[instrument(skip(self, caller))]
    pub async fn read(&self, caller: Option<&Principal>, id: &str) -> OpResult<Vec<u8>> {
        self.try_read(caller, id).await.into()
    }

    async fn try_read(&self, caller: Option<&Principal>, id: &str) -> Result<Vec<u8>, DomainError> {
        let record = self.try_get_by_id(caller, id).await?;
        Ok(self.objects.get(&record.storage_key).await?)
    }

    /// A principal's uploads, newest first.
    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn by_owner(&self, caller: &Principal, owner_id: &str) -> OpResult<Vec<FileRecord>> {
        self.try_by_owner(caller, owner_id).await.into()
    }

    async fn try_by_owner(
        &self,
        caller: &Principal,
        owner_id: &str,
    ) -> Result<Vec<FileRecord>, DomainError> {
        if !caller.can_act_for(owner_id) {
            return Err(DomainError::PermissionDenied);
        }
        let query = Query::new()
            .filter(Filter::eq("ownerId", owner_id))
            .order_by(OrderBy::desc("uploadedAt"));
        super::fetch_desc(&*self.store, collections::FILES, query, |f: &FileRecord| {
            f.uploaded_at
        })
        .await
        .map_err(DomainError::from)
    }

    #[instrument(skip(self, caller, patch), fields(caller = %caller.uid))]
    pub async fn update(
        &self,
        caller: &Principal,
        id: &str,
        patch: FilePatch,
    ) -> OpResult<FileRecord> {
        self.try_update(caller, id, patch).await.into()
    }

    async fn try_update(
        &self,
        caller: &Principal,
        id: &str,
        patch: FilePatch,
    ) -> Result<FileRecord, DomainError> {
        let record = self.require(id).await?;
        if !caller.can_act_for(&record.owner_id) {
            return Err(DomainError::PermissionDenied);
        }

        let mut fields = Map::new();
        if let Some(original_name) = &patch.original_name {
            let name = validate_original_name(original_name)
                .map_err(|e| DomainError::Validation(e.message().into()))?;
            fields.insert("originalName".into(), json!(name));
        }
        if let Some(category) = patch.category {
            fields.insert("category".into(), json!(category.as_str()));
            fields.insert("isPublic".into(), json!(category.is_public()));
        }
        if fields.is_empty() {
            return Ok(record);
        }

        self.store
            .update(collections::FILES, id, Value::Object(fields))
            .await?;
        self.require(id).await
    }

    /// Delete a file: metadata first, then the stored object. An object
    /// that survives a failed second step is swept later by
    /// [`cleanup_orphans`](FileRepo::cleanup_orphans).
    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn delete(&self, caller: &Principal, id: &str) -> OpResult<()> {
        self.try_delete(caller, id).await.into()
    }

    async fn try_delete(&self, caller: &Principal, id: &str) -> Result<(), DomainError> {
        let record = self.require(id).await?;
        if !caller.can_act_for(&record.owner_id) {
            return Err(DomainError::PermissionDenied);
        }

        self.store.delete(collections::FILES, id).await?;

        if let Err(e) = self.objects.delete(&record.storage_key).await {
            warn!(key = %record.storage_key, error = %e, "Failed to delete stored object; leaving orphan");
        }

        info!(file_id = %id, "File deleted");
        Ok(())
    }

    /// Delete several files. Unordered best-effort fan-out with per-item
    /// results; one failure does not stop the rest.
    #[instrument(skip(self, caller, ids), fields(caller = %caller.uid, count = ids.len()))]
    pub async fn delete_many(
        &self,
        caller: &Principal,
        ids: &[String],
    ) -> OpResult<BatchDeleteOutcome> {
        let deletions = ids.iter().map(|id| async move {
            let result = self.try_delete(caller, id).await;
            (id.clone(), result)
        });

        let mut outcome = BatchDeleteOutcome::default();
        for (id, result) in join_all(deletions).await {
            match result {
                Ok(()) => outcome.deleted.push(id),
                Err(e) => outcome.failed.push(BatchDeleteFailure {
                    id,
                    error: e.message(),
                }),
            }
        }

        let message = format!(
            "Deleted {} file(s), {} failed",
            outcome.deleted.len(),
            outcome.failed.len()
        );
        OpResult::ok_with_message(outcome, message)
    }

    /// Sweep stored objects whose metadata record is gone. Best-effort:
    /// individual failures are logged and skipped. Admin only.
    #[instrument(skip(self, caller), fields(caller = %caller.uid))]
    pub async fn cleanup_orphans(&self, caller: &Principal) -> OpResult<u64> {
        self.try_cleanup_orphans(caller).await.into()
    }

    async fn try_cleanup_orphans(&self, caller: &Principal) -> Result<u64, DomainError> {
        if !caller.is_admin() {
            return Err(DomainError::PermissionDenied);
        }

        let keys = self.objects.list("").await?;
        let mut removed = 0u64;

        for key in keys {
            let referenced = self
                .store
                .query(
                    collections::FILES,
                    &Query::new().filter(Filter::eq("storageKey", key.as_str())),
                )
                .await?;
            if !referenced.is_empty() {
                continue;
            }

            match self.objects.delete(&key).await {
                Ok(true) => {
                    removed += 1;
                    info!(%key, "Removed orphaned object");
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(%key, error = %e, "Failed to remove orphaned object");
                }
            }
        }

        Ok(removed)
    }
}
