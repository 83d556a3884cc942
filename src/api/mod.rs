pub mod query;
pub mod response;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use crate::auth::{Claims, Session, TokenResponse, TokenStore};
use crate::config::ClientConfig;
use crate::error::ApiError;

pub use query::{ListQuery, QueryParams};
pub use response::read_json;

const API_KEY_HEADER: &str = "apikey";
const REFRESH_PATH: &str = "/auth/refresh";

type RefreshFuture = Shared<BoxFuture<'static, Result<Session, ApiError>>>;

enum RequestBody {
    Json(Vec<u8>),
    Raw { content_type: String, bytes: Vec<u8> },
}

/// Everything needed to send (and re-send) one request
struct PendingRequest {
    method: Method,
    url: Url,
    body: Option<RequestBody>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    refresh_skew_secs: i64,
    inflight: Mutex<Option<RefreshFuture>>,
}

impl Inner {
    fn url(&self, path: &str, query: &QueryParams) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        Ok(url)
    }

    async fn dispatch(&self, req: &PendingRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let mut request = self.http.request(req.method.clone(), req.url.clone());

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request = match &req.body {
            Some(RequestBody::Json(bytes)) => request
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            Some(RequestBody::Raw { content_type, bytes }) => request
                .header(CONTENT_TYPE, content_type.as_str())
                .body(bytes.clone()),
            None => request,
        };

        tracing::debug!(method = %req.method, path = req.url.path(), "dispatching request");
        Ok(request.send().await?)
    }

    /// Exchange the stored refresh token for a new session.
    ///
    /// If the stored session was already replaced since `stale_access` was
    /// handed out, the stored one is returned without a network call.
    async fn run_refresh(self: Arc<Self>, stale_access: String) -> Result<Session, ApiError> {
        let current = self.store.load().await?.ok_or(ApiError::NotAuthenticated)?;

        if current.access_token != stale_access && !current.is_expired(self.refresh_skew_secs) {
            tracing::debug!("session already refreshed by another request");
            return Ok(current);
        }

        tracing::debug!("refreshing access token");
        let req = PendingRequest {
            method: Method::POST,
            url: self.url(REFRESH_PATH, &QueryParams::new())?,
            body: Some(RequestBody::Json(serde_json::to_vec(
                &json!({ "refresh_token": current.refresh_token }),
            )?)),
        };
        let response = self.dispatch(&req, None).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status, &body);
            tracing::warn!(status = status.as_u16(), "token refresh rejected: {}", err);
            if let Err(e) = self.store.clear().await {
                tracing::warn!("failed to clear rejected session: {}", e);
            }
            return Err(ApiError::unauthorized(format!("Session expired, please sign in again ({})", err)));
        }

        let tokens: TokenResponse = read_json(response).await?;
        let session = Session::from_token_response(tokens);
        self.store.save(&session).await?;
        tracing::debug!(expires_at = %session.expires_at, "access token refreshed");
        Ok(session)
    }
}

/// HTTP client shared by every service.
///
/// Authenticated calls attach the bearer token, refresh ahead of expiry, and
/// on a 401 refresh once and retry once. Concurrent refreshes share a single
/// in-flight future.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api.api_key.as_deref() {
            let value = HeaderValue::from_str(key)
                .map_err(|_| ApiError::Config("api key contains invalid header characters".to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.api.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::Config(format!("unable to build HTTP client: {}", e)))?;

        let base_url = config.api.base_url.trim_end_matches('/').to_string();
        // Fail early on a malformed base URL
        Url::parse(&base_url)?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                store,
                refresh_skew_secs: config.auth.refresh_skew_secs,
                inflight: Mutex::new(None),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    // ---- session -------------------------------------------------------

    pub async fn session(&self) -> Result<Option<Session>, ApiError> {
        self.inner.store.load().await
    }

    pub async fn save_session(&self, session: &Session) -> Result<(), ApiError> {
        self.inner.store.save(session).await
    }

    pub async fn clear_session(&self) -> Result<(), ApiError> {
        self.inner.store.clear().await
    }

    /// Claims of the stored access token, if any
    pub async fn claims(&self) -> Result<Option<Claims>, ApiError> {
        Ok(self.session().await?.and_then(|s| s.claims()))
    }

    /// Force a refresh regardless of expiry
    pub async fn refresh(&self) -> Result<Session, ApiError> {
        let session = self.session().await?.ok_or(ApiError::NotAuthenticated)?;
        self.refresh_from(&session.access_token).await
    }

    // ---- authenticated verbs -------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &QueryParams) -> Result<T, ApiError> {
        let req = self.pending(Method::GET, path, query, None)?;
        read_json(self.execute(&req).await?).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.pending(Method::POST, path, &QueryParams::new(), Some(json_body(body)?))?;
        read_json(self.execute(&req).await?).await
    }

    /// POST with no request body (state transitions such as revoke/accept)
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.pending(Method::POST, path, &QueryParams::new(), None)?;
        read_json(self.execute(&req).await?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.pending(Method::PUT, path, &QueryParams::new(), Some(json_body(body)?))?;
        read_json(self.execute(&req).await?).await
    }

    /// DELETE; whatever the backend echoes back is discarded
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let req = self.pending(Method::DELETE, path, &QueryParams::new(), None)?;
        let _: serde_json::Value = read_json(self.execute(&req).await?).await?;
        Ok(())
    }

    /// Raw-body upload (images)
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<T, ApiError> {
        let body = RequestBody::Raw {
            content_type: content_type.to_string(),
            bytes,
        };
        let req = self.pending(Method::POST, path, query, Some(body))?;
        read_json(self.execute(&req).await?).await
    }

    // ---- public verbs (no bearer, no refresh) ----------------------------

    pub async fn public_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.pending(Method::GET, path, &QueryParams::new(), None)?;
        read_json(self.inner.dispatch(&req, None).await?).await
    }

    pub async fn public_post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.pending(Method::POST, path, &QueryParams::new(), Some(json_body(body)?))?;
        read_json(self.inner.dispatch(&req, None).await?).await
    }

    // ---- internals -------------------------------------------------------

    fn pending(
        &self,
        method: Method,
        path: &str,
        query: &QueryParams,
        body: Option<RequestBody>,
    ) -> Result<PendingRequest, ApiError> {
        Ok(PendingRequest {
            method,
            url: self.inner.url(path, query)?,
            body,
        })
    }

    async fn execute(&self, req: &PendingRequest) -> Result<Response, ApiError> {
        let session = self.active_session().await?;
        let response = self.inner.dispatch(req, Some(&session.access_token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(path = req.url.path(), "request rejected with 401, refreshing and retrying once");
        let refreshed = self.refresh_from(&session.access_token).await?;
        let retry = self.inner.dispatch(req, Some(&refreshed.access_token)).await?;
        if retry.status() != StatusCode::UNAUTHORIZED {
            return Ok(retry);
        }

        let body = retry.text().await.unwrap_or_default();
        tracing::warn!(path = req.url.path(), "request still unauthorized after refresh");
        if let Err(e) = self.inner.store.clear().await {
            tracing::warn!("failed to clear rejected session: {}", e);
        }
        Err(ApiError::from_status(StatusCode::UNAUTHORIZED, &body))
    }

    async fn active_session(&self) -> Result<Session, ApiError> {
        let session = self.session().await?.ok_or(ApiError::NotAuthenticated)?;
        if session.is_expired(self.inner.refresh_skew_secs) {
            tracing::debug!("access token expired or about to, refreshing before request");
            return self.refresh_from(&session.access_token).await;
        }
        Ok(session)
    }

    async fn refresh_from(&self, stale_access: &str) -> Result<Session, ApiError> {
        let refresh = {
            let mut slot = self.lock_inflight()?;
            match slot.as_ref() {
                Some(inflight) => inflight.clone(),
                None => {
                    let fut = self
                        .inner
                        .clone()
                        .run_refresh(stale_access.to_string())
                        .boxed()
                        .shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let result = refresh.clone().await;

        // First finisher empties the slot; later refresh needs start a new one
        let mut slot = self.lock_inflight()?;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&refresh)) {
            *slot = None;
        }
        drop(slot);

        result
    }

    fn lock_inflight(&self) -> Result<std::sync::MutexGuard<'_, Option<RefreshFuture>>, ApiError> {
        self.inner
            .inflight
            .lock()
            .map_err(|_| ApiError::Storage("refresh lock poisoned".to_string()))
    }
}

fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<RequestBody, ApiError> {
    Ok(RequestBody::Json(serde_json::to_vec(body)?))
}
