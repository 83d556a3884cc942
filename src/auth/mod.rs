pub mod store;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::Role;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Lifetime assumed when the backend sends neither `expires_in` nor a JWT `exp`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Access token claims the client cares about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    /// Application role ("owner" / "admin")
    pub role: Option<String>,
    pub exp: i64,
    pub iat: Option<i64>,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn app_role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }

    pub fn is_admin(&self) -> bool {
        self.app_role() == Some(Role::Admin)
    }
}

/// Read the claims out of an access token.
///
/// The signature is not checked here; the backend verifies every token it
/// receives. The client only needs `exp`, `sub` and `role`.
pub fn decode_claims(token: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| ApiError::Decode(format!("access token: {}", e)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Body returned by login, register and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    pub user: Option<SessionUser>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

fn offset_from_now(secs: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(secs).and_then(|delta| Utc::now().checked_add_signed(delta))
}

impl Session {
    pub fn from_token_response(response: TokenResponse) -> Self {
        let claims = decode_claims(&response.access_token).ok();

        let expires_at = claims
            .as_ref()
            .and_then(|c| Utc.timestamp_opt(c.exp, 0).single())
            .unwrap_or_else(|| {
                let lifetime = response.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
                offset_from_now(lifetime)
                    .unwrap_or_else(|| Utc::now() + Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS))
            });

        let user_id = response
            .user
            .as_ref()
            .map(|u| u.id)
            .or_else(|| claims.as_ref().and_then(|c| c.user_id()));
        let email = response
            .user
            .and_then(|u| u.email)
            .or_else(|| claims.and_then(|c| c.email));

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            user_id,
            email,
        }
    }

    pub fn claims(&self) -> Option<Claims> {
        decode_claims(&self.access_token).ok()
    }

    /// True when the access token expires within `skew_secs` from now
    pub fn is_expired(&self, skew_secs: i64) -> bool {
        offset_from_now(skew_secs).map_or(true, |deadline| deadline >= self.expires_at)
    }

    pub fn role(&self) -> Option<Role> {
        self.claims().and_then(|c| c.app_role())
    }
}

// Tokens stay out of logs
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}
