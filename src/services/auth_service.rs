use serde_json::json;

use super::{require_text, validate_email};
use crate::api::ApiClient;
use crate::auth::{Claims, Session, TokenResponse};
use crate::error::ApiError;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Sign in and store the resulting session
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(ApiError::validation("password is required"));
        }

        let tokens: TokenResponse = self
            .api
            .public_post("/auth/login", &json!({ "email": email, "password": password }))
            .await?;

        let session = Session::from_token_response(tokens);
        self.api.save_session(&session).await?;
        tracing::info!("signed in");
        Ok(session)
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> Result<Session, ApiError> {
        let email = validate_email(email)?;
        let full_name = require_text("full name", full_name)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let tokens: TokenResponse = self
            .api
            .public_post(
                "/auth/register",
                &json!({ "email": email, "password": password, "full_name": full_name }),
            )
            .await?;

        let session = Session::from_token_response(tokens);
        self.api.save_session(&session).await?;
        Ok(session)
    }

    /// Tell the backend, then drop the local session whatever it said
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.api.session().await?.is_some() {
            if let Err(e) = self.api.post_empty::<serde_json::Value>("/auth/logout").await {
                tracing::warn!("backend logout failed, clearing local session anyway: {}", e);
            }
        }
        self.api.clear_session().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Session, ApiError> {
        self.api.refresh().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let email = validate_email(email)?;
        let _: serde_json::Value = self
            .api
            .public_post("/auth/password-reset", &json!({ "email": email }))
            .await?;
        Ok(())
    }

    pub async fn session(&self) -> Result<Option<Session>, ApiError> {
        self.api.session().await
    }

    pub async fn claims(&self) -> Result<Option<Claims>, ApiError> {
        self.api.claims().await
    }

    /// A stored session exists. It may still need a refresh before use.
    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        Ok(self.api.session().await?.is_some())
    }
}
