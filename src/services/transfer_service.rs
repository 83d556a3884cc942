use chrono::Utc;
use uuid::Uuid;

use super::changelog_service::ChangeLogService;
use super::validate_email;
use crate::api::{ApiClient, QueryParams};
use crate::auth::Claims;
use crate::error::ApiError;
use crate::models::{NewTransfer, Transfer, TransferDirection};
use crate::types::{ChangeAction, EntityType};

/// Which party may perform a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Accept,
    Reject,
    Cancel,
}

impl Resolution {
    fn as_str(&self) -> &'static str {
        match self {
            Resolution::Accept => "accept",
            Resolution::Reject => "reject",
            Resolution::Cancel => "cancel",
        }
    }
}

/// Property ownership hand-overs between users
#[derive(Clone)]
pub struct TransferService {
    api: ApiClient,
    changelog: ChangeLogService,
}

impl TransferService {
    pub fn new(api: ApiClient, changelog: ChangeLogService) -> Self {
        Self { api, changelog }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, direction: Option<TransferDirection>) -> Result<Vec<Transfer>, ApiError> {
        let query = QueryParams::new().with_opt("direction", direction.map(|d| d.as_str()));
        self.api.get("/api/transfers", &query).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Transfer, ApiError> {
        self.api.get(&format!("/api/transfers/{}", id), &QueryParams::new()).await
    }

    #[tracing::instrument(skip(self, message))]
    pub async fn initiate(
        &self,
        property_id: Uuid,
        recipient_email: &str,
        message: Option<String>,
    ) -> Result<Transfer, ApiError> {
        let recipient_email = validate_email(recipient_email)?;
        let claims = self.require_claims().await?;
        if claims
            .email
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(&recipient_email))
        {
            return Err(ApiError::validation("cannot transfer a property to yourself"));
        }

        let payload = NewTransfer {
            property_id,
            recipient_email,
            message: message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        };
        let transfer: Transfer = self.api.post("/api/transfers", &payload).await?;

        self.changelog
            .record_quietly(
                property_id,
                EntityType::Transfer,
                transfer.id,
                ChangeAction::Transfer,
                format!("Offered ownership to {}", transfer.recipient_email),
            )
            .await;
        Ok(transfer)
    }

    pub async fn accept(&self, id: Uuid) -> Result<Transfer, ApiError> {
        self.resolve(id, Resolution::Accept).await
    }

    pub async fn reject(&self, id: Uuid) -> Result<Transfer, ApiError> {
        self.resolve(id, Resolution::Reject).await
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Transfer, ApiError> {
        self.resolve(id, Resolution::Cancel).await
    }

    #[tracing::instrument(skip(self), fields(action = resolution.as_str()))]
    async fn resolve(&self, id: Uuid, resolution: Resolution) -> Result<Transfer, ApiError> {
        let claims = self.require_claims().await?;
        let transfer = self.get(id).await?;
        check_resolution(&transfer, &claims, resolution)?;

        let resolved: Transfer = self
            .api
            .post_empty(&format!("/api/transfers/{}/{}", id, resolution.as_str()))
            .await?;

        let description = match resolution {
            Resolution::Accept => format!("Ownership accepted by {}", resolved.recipient_email),
            Resolution::Reject => format!("Transfer rejected by {}", resolved.recipient_email),
            Resolution::Cancel => "Transfer cancelled by sender".to_string(),
        };
        self.changelog
            .record_quietly(
                resolved.property_id,
                EntityType::Transfer,
                id,
                ChangeAction::Transfer,
                description,
            )
            .await;
        Ok(resolved)
    }

    async fn require_claims(&self) -> Result<Claims, ApiError> {
        self.api.claims().await?.ok_or(ApiError::NotAuthenticated)
    }
}

fn check_resolution(transfer: &Transfer, claims: &Claims, resolution: Resolution) -> Result<(), ApiError> {
    let now = Utc::now();
    if !transfer.is_open(now) {
        return Err(ApiError::invalid_state(format!(
            "transfer is {}",
            transfer.effective_status(now).as_str()
        )));
    }

    match resolution {
        Resolution::Accept | Resolution::Reject => {
            let is_recipient = claims
                .email
                .as_deref()
                .is_some_and(|email| transfer.is_recipient(email));
            if !is_recipient {
                return Err(ApiError::forbidden(format!(
                    "only the recipient can {} this transfer",
                    resolution.as_str()
                )));
            }
        }
        Resolution::Cancel => {
            if claims.user_id() != Some(transfer.from_user_id) {
                return Err(ApiError::forbidden("only the sender can cancel this transfer"));
            }
        }
    }
    Ok(())
}
