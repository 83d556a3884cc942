use serde_json::json;

use super::auth_service::MIN_PASSWORD_LEN;
use crate::api::{ApiClient, QueryParams};
use crate::error::ApiError;
use crate::models::{ProfileUpdate, User};

#[derive(Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        self.api.get("/api/users/me", &QueryParams::new()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        if update.full_name.is_none() && update.phone.is_none() {
            return Err(ApiError::validation("nothing to update"));
        }
        if update.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::validation("full name cannot be blank"));
        }
        self.api.put("/api/users/me", update).await
    }

    #[tracing::instrument(skip(self, current, new))]
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "new password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if new == current {
            return Err(ApiError::validation("new password must differ from the current one"));
        }

        let _: serde_json::Value = self
            .api
            .put(
                "/api/users/me/password",
                &json!({ "current_password": current, "new_password": new }),
            )
            .await?;
        Ok(())
    }
}
