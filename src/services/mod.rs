pub mod admin_service;
pub mod auth_service;
pub mod changelog_service;
pub mod image_service;
pub mod job_service;
pub mod owner_service;
pub mod property_service;
pub mod report_service;
pub mod transfer_service;
pub mod user_service;

use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::error::ApiError;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use changelog_service::ChangeLogService;
pub use image_service::ImageService;
pub use job_service::{JobService, NewJobRequest};
pub use owner_service::OwnerService;
pub use property_service::PropertyService;
pub use report_service::ReportService;
pub use transfer_service::TransferService;
pub use user_service::UserService;

/// All domain services over one shared `ApiClient`
#[derive(Clone)]
pub struct Propman {
    api: ApiClient,
    auth: AuthService,
    users: UserService,
    properties: PropertyService,
    images: ImageService,
    jobs: JobService,
    transfers: TransferService,
    changelog: ChangeLogService,
    owners: OwnerService,
    admin: AdminService,
    reports: ReportService,
}

impl Propman {
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(config, store)?;

        let changelog = ChangeLogService::new(api.clone());
        let properties = PropertyService::new(api.clone(), changelog.clone());
        let images = ImageService::new(api.clone(), config.uploads.clone(), changelog.clone());
        let jobs = JobService::new(api.clone(), config.jobs.clone(), changelog.clone());

        Ok(Self {
            auth: AuthService::new(api.clone()),
            users: UserService::new(api.clone()),
            transfers: TransferService::new(api.clone(), changelog.clone()),
            owners: OwnerService::new(api.clone()),
            admin: AdminService::new(api.clone()),
            reports: ReportService::new(properties.clone(), images.clone(), jobs.clone()),
            properties,
            images,
            jobs,
            changelog,
            api,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn properties(&self) -> &PropertyService {
        &self.properties
    }

    pub fn images(&self) -> &ImageService {
        &self.images
    }

    pub fn jobs(&self) -> &JobService {
        &self.jobs
    }

    pub fn transfers(&self) -> &TransferService {
        &self.transfers
    }

    pub fn changelog(&self) -> &ChangeLogService {
        &self.changelog
    }

    pub fn owners(&self) -> &OwnerService {
        &self.owners
    }

    pub fn admin(&self) -> &AdminService {
        &self.admin
    }

    pub fn reports(&self) -> &ReportService {
        &self.reports
    }
}

/// Trimmed, non-blank text or a validation error naming the field
pub(crate) fn require_text(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Shape check only; the backend owns real verification
pub(crate) fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ApiError::validation(format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}
