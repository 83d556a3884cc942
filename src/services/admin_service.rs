use uuid::Uuid;

use crate::api::{ApiClient, ListQuery, QueryParams};
use crate::error::ApiError;
use crate::models::{AdminStats, Property, User};
use crate::types::Role;

/// Staff-only operations. Every call checks the session role locally first
/// so a non-admin never reaches the network.
#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
}

impl AdminService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn ensure_admin(&self) -> Result<(), ApiError> {
        match self.api.claims().await? {
            Some(claims) if claims.is_admin() => Ok(()),
            Some(_) => Err(ApiError::forbidden("administrator role required")),
            None => Err(ApiError::NotAuthenticated),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.ensure_admin().await?;
        self.api.get("/api/admin/users", &QueryParams::new()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<User, ApiError> {
        self.ensure_admin().await?;
        self.api
            .put(
                &format!("/api/admin/users/{}/role", user_id),
                &serde_json::json!({ "role": role }),
            )
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn properties(&self, query: &ListQuery) -> Result<Vec<Property>, ApiError> {
        self.ensure_admin().await?;
        self.api.get("/api/admin/properties", &query.to_params()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn assign_owner(&self, property_id: Uuid, owner_id: Uuid) -> Result<Property, ApiError> {
        self.ensure_admin().await?;
        self.api
            .post(
                &format!("/api/admin/properties/{}/owner", property_id),
                &serde_json::json!({ "owner_id": owner_id }),
            )
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> Result<AdminStats, ApiError> {
        self.ensure_admin().await?;
        self.api.get("/api/admin/stats", &QueryParams::new()).await
    }
}
