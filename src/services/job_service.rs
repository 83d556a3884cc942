use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use uuid::Uuid;

use super::changelog_service::ChangeLogService;
use super::require_text;
use crate::api::{ApiClient, QueryParams};
use crate::config::JobConfig;
use crate::error::ApiError;
use crate::models::{Job, JobAccess, JobStatus, NewJob};
use crate::types::{ChangeAction, EntityType};

pub const MIN_PIN_LEN: usize = 4;
pub const MAX_PIN_LEN: usize = 8;

/// What a caller asks for; missing times and PIN are filled in from config
#[derive(Debug, Clone)]
pub struct NewJobRequest {
    pub property_id: Uuid,
    pub title: String,
    pub asset_ids: Vec<Uuid>,
    pub contractor_name: Option<String>,
    pub notes: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub pin: Option<String>,
}

impl NewJobRequest {
    pub fn new(property_id: Uuid, title: impl Into<String>, asset_ids: Vec<Uuid>) -> Self {
        Self {
            property_id,
            title: title.into(),
            asset_ids,
            contractor_name: None,
            notes: None,
            starts_at: None,
            expires_at: None,
            pin: None,
        }
    }
}

#[derive(Clone)]
pub struct JobService {
    api: ApiClient,
    config: JobConfig,
    changelog: ChangeLogService,
}

impl JobService {
    pub fn new(api: ApiClient, config: JobConfig, changelog: ChangeLogService) -> Self {
        Self { api, config, changelog }
    }

    /// Random numeric PIN of the configured length
    pub fn generate_pin(&self) -> String {
        let len = self.config.pin_length.clamp(MIN_PIN_LEN, MAX_PIN_LEN);
        let mut rng = rand::rng();
        (0..len)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    /// Resolve defaults and check the request before anything is sent
    pub(crate) fn prepare(&self, request: &NewJobRequest, now: DateTime<Utc>) -> Result<NewJob, ApiError> {
        let title = require_text("title", &request.title)?;

        if request.asset_ids.is_empty() {
            return Err(ApiError::validation("a job needs at least one asset"));
        }

        let pin = match request.pin.as_deref() {
            Some(pin) => {
                let pin = pin.trim();
                validate_pin(pin)?;
                pin.to_string()
            }
            None => self.generate_pin(),
        };

        let starts_at = request.starts_at.unwrap_or(now);
        let expires_at = match request.expires_at {
            Some(expires_at) => expires_at,
            None => starts_at
                .checked_add_signed(hours(self.config.default_duration_hours)?)
                .ok_or_else(|| ApiError::validation("job start is out of range"))?,
        };
        self.check_window(starts_at, expires_at)?;

        let mut asset_ids = request.asset_ids.clone();
        asset_ids.sort();
        asset_ids.dedup();

        Ok(NewJob {
            property_id: request.property_id,
            title,
            pin,
            asset_ids,
            contractor_name: trimmed(&request.contractor_name),
            notes: trimmed(&request.notes),
            starts_at,
            expires_at,
        })
    }

    fn check_window(&self, starts_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Result<(), ApiError> {
        if expires_at <= starts_at {
            return Err(ApiError::validation("job must expire after it starts"));
        }
        if expires_at - starts_at > hours(self.config.max_duration_hours)? {
            return Err(ApiError::validation(format!(
                "job cannot last longer than {} hours",
                self.config.max_duration_hours
            )));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, property_id: Uuid) -> Result<Vec<Job>, ApiError> {
        self.api
            .get(&format!("/api/properties/{}/jobs", property_id), &QueryParams::new())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Job, ApiError> {
        self.api.get(&format!("/api/jobs/{}", id), &QueryParams::new()).await
    }

    #[tracing::instrument(skip(self, request), fields(property_id = %request.property_id))]
    pub async fn create(&self, request: NewJobRequest) -> Result<Job, ApiError> {
        let payload = self.prepare(&request, Utc::now())?;
        let job: Job = self.api.post("/api/jobs", &payload).await?;

        self.changelog
            .record_quietly(
                job.property_id,
                EntityType::Job,
                job.id,
                ChangeAction::Create,
                format!("Issued job '{}' ({} assets)", job.title, job.asset_ids.len()),
            )
            .await;
        Ok(job)
    }

    /// Move the expiry of a job that has not ended yet
    #[tracing::instrument(skip(self))]
    pub async fn extend(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<Job, ApiError> {
        let job = self.get(id).await?;
        let now = Utc::now();
        let status = job.status(now);
        if matches!(status, JobStatus::Expired | JobStatus::Revoked) {
            return Err(ApiError::invalid_state(format!(
                "job is {} and cannot be extended",
                status.as_str()
            )));
        }
        if expires_at <= job.expires_at {
            return Err(ApiError::validation("new expiry must be later than the current one"));
        }
        self.check_window(job.starts_at, expires_at)?;

        let updated: Job = self
            .api
            .put(
                &format!("/api/jobs/{}/extend", id),
                &serde_json::json!({ "expires_at": expires_at }),
            )
            .await?;
        self.changelog
            .record_quietly(
                updated.property_id,
                EntityType::Job,
                id,
                ChangeAction::Update,
                format!("Extended job '{}' to {}", updated.title, updated.expires_at.to_rfc3339()),
            )
            .await;
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn revoke(&self, id: Uuid) -> Result<Job, ApiError> {
        let job: Job = self.api.post_empty(&format!("/api/jobs/{}/revoke", id)).await?;
        self.changelog
            .record_quietly(
                job.property_id,
                EntityType::Job,
                id,
                ChangeAction::Revoke,
                format!("Revoked job '{}'", job.title),
            )
            .await;
        Ok(job)
    }

    /// Unauthenticated lookup used by contractors holding a PIN
    #[tracing::instrument(skip(self, pin))]
    pub async fn access(&self, pin: &str) -> Result<JobAccess, ApiError> {
        let pin = pin.trim();
        validate_pin(pin)?;

        let access: JobAccess = self.api.public_get(&format!("/access/{}", pin)).await?;
        let now = Utc::now();
        if !access.job.is_active(now) {
            return Err(ApiError::forbidden(format!(
                "access for this PIN is {}",
                access.job.status(now).as_str()
            )));
        }
        Ok(access)
    }
}

pub fn validate_pin(pin: &str) -> Result<(), ApiError> {
    let ok = (MIN_PIN_LEN..=MAX_PIN_LEN).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit());
    if !ok {
        return Err(ApiError::validation(format!(
            "PIN must be {} to {} digits",
            MIN_PIN_LEN, MAX_PIN_LEN
        )));
    }
    Ok(())
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn hours(count: i64) -> Result<TimeDelta, ApiError> {
    TimeDelta::try_hours(count)
        .filter(|delta| *delta > TimeDelta::zero())
        .ok_or_else(|| ApiError::Config(format!("job duration of {} hours is out of range", count)))
}
