use uuid::Uuid;

use super::{require_text, validate_email};
use crate::api::{ApiClient, QueryParams};
use crate::error::ApiError;
use crate::models::{NewOwner, Owner, OwnerUpdate, Property};

#[derive(Clone)]
pub struct OwnerService {
    api: ApiClient,
}

impl OwnerService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Owner>, ApiError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.api
            .get("/api/owners", &QueryParams::new().with_opt("search", search))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Owner, ApiError> {
        self.api.get(&format!("/api/owners/{}", id), &QueryParams::new()).await
    }

    #[tracing::instrument(skip(self, owner), fields(email = %owner.email))]
    pub async fn create(&self, owner: &NewOwner) -> Result<Owner, ApiError> {
        let payload = NewOwner {
            full_name: require_text("full name", &owner.full_name)?,
            email: validate_email(&owner.email)?,
            phone: owner.phone.clone(),
            company: owner.company.clone(),
        };
        self.api.post("/api/owners", &payload).await
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: &OwnerUpdate) -> Result<Owner, ApiError> {
        let mut payload = update.clone();
        if let Some(name) = update.full_name.as_deref() {
            payload.full_name = Some(require_text("full name", name)?);
        }
        if let Some(email) = update.email.as_deref() {
            payload.email = Some(validate_email(email)?);
        }
        if payload.full_name.is_none()
            && payload.email.is_none()
            && payload.phone.is_none()
            && payload.company.is_none()
        {
            return Err(ApiError::validation("nothing to update"));
        }
        self.api.put(&format!("/api/owners/{}", id), &payload).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn properties(&self, owner_id: Uuid) -> Result<Vec<Property>, ApiError> {
        self.api
            .get(&format!("/api/owners/{}/properties", owner_id), &QueryParams::new())
            .await
    }
}
