use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
    pub jobs: JobConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Project key sent as the `apikey` header on every request
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Refresh this many seconds before the access token actually expires
    pub refresh_skew_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_image_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

/// Upper bound accepted for job duration overrides (one year)
pub const MAX_JOB_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub pin_length: usize,
    pub default_duration_hours: i64,
    pub max_duration_hours: i64,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("PROPMAN_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Development defaults pointed at an explicit backend, used by tests and the CLI
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("PROPMAN_API_URL") {
            if !v.trim().is_empty() {
                self.api.base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = env::var("PROPMAN_API_KEY") {
            self.api.api_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Ok(v) = env::var("PROPMAN_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }
        if let Ok(v) = env::var("PROPMAN_CONNECT_TIMEOUT_SECS") {
            self.api.connect_timeout_secs = v.parse().unwrap_or(self.api.connect_timeout_secs);
        }

        // Auth overrides
        if let Ok(v) = env::var("PROPMAN_REFRESH_SKEW_SECS") {
            self.auth.refresh_skew_secs = v.parse().unwrap_or(self.auth.refresh_skew_secs);
        }

        // Upload overrides
        if let Ok(v) = env::var("PROPMAN_MAX_IMAGE_BYTES") {
            self.uploads.max_image_bytes = v.parse().unwrap_or(self.uploads.max_image_bytes);
        }

        // Job overrides
        if let Ok(v) = env::var("PROPMAN_PIN_LENGTH") {
            self.jobs.pin_length = v.parse().unwrap_or(self.jobs.pin_length);
        }
        if let Ok(v) = env::var("PROPMAN_JOB_DEFAULT_HOURS") {
            self.jobs.default_duration_hours =
                parse_job_hours(&v).unwrap_or(self.jobs.default_duration_hours);
        }
        if let Ok(v) = env::var("PROPMAN_JOB_MAX_HOURS") {
            self.jobs.max_duration_hours = parse_job_hours(&v).unwrap_or(self.jobs.max_duration_hours);
        }

        self
    }

    fn default_content_types() -> Vec<String> {
        ["image/jpeg", "image/png", "image/webp", "image/gif"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:54321".to_string(),
                api_key: None,
                request_timeout_secs: 30,
                connect_timeout_secs: 10,
            },
            auth: AuthConfig {
                refresh_skew_secs: 30,
            },
            uploads: UploadConfig {
                max_image_bytes: 10 * 1024 * 1024, // 10MB
                allowed_content_types: Self::default_content_types(),
            },
            jobs: JobConfig {
                pin_length: 6,
                default_duration_hours: 8,
                max_duration_hours: 24 * 30,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging-api.propman.app".to_string(),
                api_key: None,
                request_timeout_secs: 20,
                connect_timeout_secs: 5,
            },
            auth: AuthConfig {
                refresh_skew_secs: 60,
            },
            uploads: UploadConfig {
                max_image_bytes: 8 * 1024 * 1024, // 8MB
                allowed_content_types: Self::default_content_types(),
            },
            jobs: JobConfig {
                pin_length: 6,
                default_duration_hours: 8,
                max_duration_hours: 24 * 14,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://api.propman.app".to_string(),
                api_key: None,
                request_timeout_secs: 15,
                connect_timeout_secs: 5,
            },
            auth: AuthConfig {
                refresh_skew_secs: 60,
            },
            uploads: UploadConfig {
                max_image_bytes: 5 * 1024 * 1024, // 5MB
                allowed_content_types: Self::default_content_types(),
            },
            jobs: JobConfig {
                pin_length: 6,
                default_duration_hours: 8,
                max_duration_hours: 24 * 7,
            },
        }
    }
}

/// Positive hour counts up to `MAX_JOB_HOURS`; anything else keeps the default
fn parse_job_hours(value: &str) -> Option<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| (1..=MAX_JOB_HOURS).contains(hours))
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<ClientConfig> = Lazy::new(ClientConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static ClientConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
