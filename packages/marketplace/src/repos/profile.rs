use std::sync::Arc;

use chrono::Utc;
use common::Role;
use docstore::DocumentStore;
use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use crate::envelope::OpResult;
use crate::error::DomainError;
use crate::models::profile::{
    ClientProfile, ClientProfilePatch, ClientStats, ClientStatsDelta, CreateClientProfileInput,
    CreateFreelancerProfileInput, FreelancerProfile, FreelancerProfilePatch, FreelancerStats,
    FreelancerStatsDelta, validate_rating,
};
use crate::models::{Principal, ts};

use super::collections;

/// Repository for the `client_profiles` and `freelancer_profiles`
/// collections. Profiles are keyed by the owning principal's uid and
/// created exactly once; stats are only ever changed through the folding
/// helpers.
pub struct ProfileRepo {
    store: Arc<dyn DocumentStore>,
}

impl ProfileRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub(crate) async fn find_client_profile(
        &self,
        id: &str,
    ) -> Result<Option<ClientProfile>, DomainError> {
        match self.store.get(collections::CLIENT_PROFILES, id).await? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(|e| DomainError::Internal(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub(crate) async fn find_freelancer_profile(
        &self,
        id: &str,
    ) -> Result<Option<FreelancerProfile>, DomainError> {
        match self.store.get(collections::FREELANCER_PROFILES, id).await? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(|e| DomainError::Internal(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, caller, input), fields(uid = %caller.uid))]
    pub async fn create_client_profile(
        &self,
        caller: &Principal,
        input: CreateClientProfileInput,
    ) -> OpResult<ClientProfile> {
        self.try_create_client_profile(caller, input).await.into()
    }

    async fn try_create_client_profile(
        &self,
        caller: &Principal,
        input: CreateClientProfileInput,
    ) -> Result<ClientProfile, DomainError> {
        if caller.role != Role::Client {
            return Err(DomainError::PermissionDenied);
        }
        // Create-once, not upsert.
        if self.find_client_profile(&caller.uid).await?.is_some() {
            return Err(DomainError::Conflict("Profile already exists".into()));
        }

        let now = Utc::now();
        let profile = ClientProfile {
            id: caller.uid.clone(),
            company_name: input.company_name.trim().to_string(),
            industry: input.industry.trim().to_string(),
            company_size: input.company_size,
            website: input.website,
            location: input.location.trim().to_string(),
            description: input.description.trim().to_string(),
            stats: ClientStats::default(),
            created_at: now,
            updated_at: now,
        };

        let value =
            serde_json::to_value(&profile).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.store
            .insert(collections::CLIENT_PROFILES, &profile.id, value)
            .await?;

        info!(uid = %profile.id, "Client profile created");
        Ok(profile)
    }

    #[instrument(skip(self, caller, input), fields(uid = %caller.uid))]
    pub async fn create_freelancer_profile(
        &self,
        caller: &Principal,
        input: CreateFreelancerProfileInput,
    ) -> OpResult<FreelancerProfile> {
        self.try_create_freelancer_profile(caller, input)
            .await
            .into()
    }

    async fn try_create_freelancer_profile(
        &self,
        caller: &Principal,
        input: CreateFreelancerProfileInput,
    ) -> Result<FreelancerProfile, DomainError> {
        if caller.role != Role::Freelancer {
            return Err(DomainError::PermissionDenied);
        }
        if self.find_freelancer_profile(&caller.uid).await?.is_some() {
            return Err(DomainError::Conflict("Profile already exists".into()));
        }

        let now = Utc::now();
        let profile = FreelancerProfile {
            id: caller.uid.clone(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            title: input.title.trim().to_string(),
            bio: input.bio.trim().to_string(),
            location: input.location.trim().to_string(),
            hourly_rate: input.hourly_rate,
            skills: input.skills,
            portfolio_links: input.portfolio_links,
            stats: FreelancerStats::default(),
            created_at: now,
            updated_at: now,
        };

        let value =
            serde_json::to_value(&profile).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.store
            .insert(collections::FREELANCER_PROFILES, &profile.id, value)
            .await?;

        info!(uid = %profile.id, "Freelancer profile created");
        Ok(profile)
    }

    #[instrument(skip(self))]
    pub async fn get_client_profile(&self, id: &str) -> OpResult<ClientProfile> {
        match self.find_client_profile(id).await {
            Ok(Some(profile)) => OpResult::ok(profile),
            Ok(None) => OpResult::err(DomainError::NotFound("Client profile not found".into())),
            Err(e) => OpResult::err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_freelancer_profile(&self, id: &str) -> OpResult<FreelancerProfile> {
        match self.find_freelancer_profile(id).await {
            Ok(Some(profile)) => OpResult::ok(profile),
            Ok(None) => {
                OpResult::err(DomainError::NotFound("Freelancer profile not found".into()))
            }
            Err(e) => OpResult::err(e),
        }
    }

    #[instrument(skip(self, caller, patch), fields(caller = %caller.uid))]
    pub async fn update_client_profile(
        &self,
        caller: &Principal,
        id: &str,
        patch: ClientProfilePatch,
    ) -> OpResult<ClientProfile> {
        self.try_update_client_profile(caller, id, patch)
            .await
            .into()
    }

    async fn try_update_client_profile(
        &self,
        caller: &Principal,
        id: &str,
        patch: ClientProfilePatch,
    ) -> Result<ClientProfile, DomainError> {
        if !caller.can_act_for(id) {
            return Err(DomainError::PermissionDenied);
        }
        if self.find_client_profile(id).await?.is_none() {
            return Err(DomainError::NotFound("Client profile not found".into()));
        }

        let mut fields = Map::new();
        if let Some(company_name) = &patch.company_name {
            fields.insert("companyName".into(), json!(company_name.trim()));
        }
        if let Some(industry) = &patch.industry {
            fields.insert("industry".into(), json!(industry.trim()));
        }
        if let Some(company_size) = &patch.company_size {
            fields.insert("companySize".into(), json!(company_size));
        }
        if let Some(website) = &patch.website {
            fields.insert("website".into(), json!(website));
        }
        if let Some(location) = &patch.location {
            fields.insert("location".into(), json!(location.trim()));
        }
        if let Some(description) = &patch.description {
            fields.insert("description".into(), json!(description.trim()));
        }
        fields.insert("updatedAt".into(), ts(Utc::now()));

        self.store
            .update(collections::CLIENT_PROFILES, id, Value::Object(fields))
            .await?;
        self.find_client_profile(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Client profile not found".into()))
    }

    #[instrument(skip(self, caller, patch), fields(caller = %caller.uid))]
    pub async fn update_freelancer_profile(
        &self,
        caller: &Principal,
        id: &str,
        patch: FreelancerProfilePatch,
    ) -> OpResult<FreelancerProfile> {
        self.try_update_freelancer_profile(caller, id, patch)
            .await
            .into()
    }

    async fn try_update_freelancer_profile(
        &self,
        caller: &Principal,
        id: &str,
        patch: FreelancerProfilePatch,
    ) -> Result<FreelancerProfile, DomainError> {
        if !caller.can_act_for(id) {
            return Err(DomainError::PermissionDenied);
        }
        if self.find_freelancer_profile(id).await?.is_none() {
            return Err(DomainError::NotFound("Freelancer profile not found".into()));
        }

        let mut fields = Map::new();
        if let Some(first_name) = &patch.first_name {
            fields.insert("firstName".into(), json!(first_name.trim()));
        }
        if let Some(last_name) = &patch.last_name {
            fields.insert("lastName".into(), json!(last_name.trim()));
        }
        if let Some(title) = &patch.title {
            fields.insert("title".into(), json!(title.trim()));
        }
        if let Some(bio) = &patch.bio {
            fields.insert("bio".into(), json!(bio.trim()));
        }
        if let Some(location) = &patch.location {
            fields.insert("location".into(), json!(location.trim()));
        }
        if let Some(hourly_rate) = patch.hourly_rate {
            if hourly_rate <= 0.0 {
                return Err(DomainError::Validation(
                    "Hourly rate must be positive".into(),
                ));
            }
            fields.insert("hourlyRate".into(), json!(hourly_rate));
        }
        if let Some(skills) = &patch.skills {
            fields.insert("skills".into(), json!(skills));
        }
        if let Some(portfolio_links) = &patch.portfolio_links {
            fields.insert("portfolioLinks".into(), json!(portfolio_links));
        }
        fields.insert("updatedAt".into(), ts(Utc::now()));

        self.store
            .update(collections::FREELANCER_PROFILES, id, Value::Object(fields))
            .await?;
        self.find_freelancer_profile(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Freelancer profile not found".into()))
    }

    /// Fold a delta into a client profile's aggregate stats.
    #[instrument(skip(self, caller, delta), fields(caller = %caller.uid))]
    pub async fn update_client_stats(
        &self,
        caller: &Principal,
        id: &str,
        delta: ClientStatsDelta,
    ) -> OpResult<ClientProfile> {
        self.try_update_client_stats(caller, id, delta).await.into()
    }

    async fn try_update_client_stats(
        &self,
        caller: &Principal,
        id: &str,
        delta: ClientStatsDelta,
    ) -> Result<ClientProfile, DomainError> {
        if !caller.can_act_for(id) {
            return Err(DomainError::PermissionDenied);
        }
        if let Some(rating) = delta.new_rating {
            validate_rating(rating)?;
        }

        let mut profile = self
            .find_client_profile(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Client profile not found".into()))?;
        profile.stats.apply(&delta);
        profile.updated_at = Utc::now();

        let stats = serde_json::to_value(&profile.stats)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let patch = json!({ "stats": stats, "updatedAt": ts(profile.updated_at) });
        self.store
            .update(collections::CLIENT_PROFILES, id, patch)
            .await?;
        Ok(profile)
    }

    /// Fold a delta into a freelancer profile's aggregate stats.
    #[instrument(skip(self, caller, delta), fields(caller = %caller.uid))]
    pub async fn update_freelancer_stats(
        &self,
        caller: &Principal,
        id: &str,
        delta: FreelancerStatsDelta,
    ) -> OpResult<FreelancerProfile> {
        self.try_update_freelancer_stats(caller, id, delta)
            .await
            .into()
    }

    async fn try_update_freelancer_stats(
        &self,
        caller: &Principal,
        id: &str,
        delta: FreelancerStatsDelta,
    ) -> Result<FreelancerProfile, DomainError> {
        if !caller.can_act_for(id) {
            return Err(DomainError::PermissionDenied);
        }
        if let Some(rating) = delta.new_rating {
            validate_rating(rating)?;
        }

        let mut profile = self
            .find_freelancer_profile(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Freelancer profile not found".into()))?;
        profile.stats.apply(&delta);
        profile.updated_at = Utc::now();

        let stats = serde_json::to_value(&profile.stats)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let patch = json!({ "stats": stats, "updatedAt": ts(profile.updated_at) });
        self.store
            .update(collections::FREELANCER_PROFILES, id, patch)
            .await?;
        Ok(profile)
    }
}
