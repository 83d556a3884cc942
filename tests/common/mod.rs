#![allow(dead_code)]

//! In-process stand-in for the property backend.
//!
//! Every test starts its own server on a free port, so state never leaks
//! between tests. Responses use the `{"success": .., "data": ..}` envelope.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use propman::auth::MemoryTokenStore;
use propman::config::ClientConfig;
use propman::models::*;
use propman::types::{EntityType, Role};
use propman::Propman;

pub const PASSWORD: &str = "correct horse battery";
pub const API_KEY: &str = "test-anon-key";
const JWT_SECRET: &[u8] = b"mock-backend-secret";

type Shared = Arc<MockState>;
type Reply = Result<Response, Response>;

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MockUser {
    pub user: User,
    pub password: String,
}

#[derive(Default)]
pub struct Db {
    pub users: Vec<MockUser>,
    pub access_tokens: HashMap<String, Uuid>,
    pub refresh_tokens: HashMap<String, Uuid>,
    pub password_resets: Vec<String>,
    pub properties: Vec<Property>,
    pub spaces: Vec<Space>,
    pub assets: Vec<Asset>,
    pub features: Vec<Feature>,
    pub images: Vec<Image>,
    pub jobs: Vec<Job>,
    pub transfers: Vec<Transfer>,
    pub changelog: Vec<ChangeLogEntry>,
    pub owners: Vec<Owner>,
    tick: i64,
}

impl Db {
    /// Strictly increasing timestamps so "oldest first" is deterministic
    fn stamp(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        Utc::now() + Duration::milliseconds(self.tick)
    }

    fn property(&self, id: Uuid) -> Result<Property, Response> {
        self.properties
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| fail(StatusCode::NOT_FOUND, "property not found"))
    }

    fn property_mut(&mut self, id: Uuid) -> Result<&mut Property, Response> {
        self.properties
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| fail(StatusCode::NOT_FOUND, "property not found"))
    }

    fn user(&self, id: Uuid) -> Option<User> {
        self.users.iter().find(|u| u.user.id == id).map(|u| u.user.clone())
    }

    fn issue_tokens(&mut self, user: &User, ttl_secs: i64) -> Value {
        let now = Utc::now().timestamp();
        let claims = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "role": user.role.as_str(),
            "iat": now,
            "exp": now + ttl_secs,
            "jti": Uuid::new_v4().to_string(),
        });
        let access = encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET))
            .expect("encode test token");
        let refresh = Uuid::new_v4().to_string();
        self.access_tokens.insert(access.clone(), user.id);
        self.refresh_tokens.insert(refresh.clone(), user.id);

        json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": ttl_secs,
            "token_type": "bearer",
            "user": { "id": user.id, "email": user.email },
        })
    }
}

pub struct MockState {
    db: Mutex<Db>,
    seen: Mutex<Vec<SeenRequest>>,
    refresh_calls: AtomicUsize,
    refresh_delay_ms: AtomicU64,
    token_ttl_secs: AtomicI64,
    reject_refresh: AtomicBool,
    always_unauthorized: AtomicBool,
    fail_changelog: AtomicBool,
}

impl MockState {
    fn new() -> Self {
        Self {
            db: Mutex::new(Db::default()),
            seen: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            refresh_delay_ms: AtomicU64::new(0),
            token_ttl_secs: AtomicI64::new(3600),
            reject_refresh: AtomicBool::new(false),
            always_unauthorized: AtomicBool::new(false),
            fail_changelog: AtomicBool::new(false),
        }
    }

    fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock().expect("mock db lock")
    }

    fn ttl(&self) -> i64 {
        self.token_ttl_secs.load(Ordering::SeqCst)
    }

    fn caller(&self, headers: &HeaderMap) -> Result<User, Response> {
        if self.always_unauthorized.load(Ordering::SeqCst) {
            return Err(fail(StatusCode::UNAUTHORIZED, "JWT expired"));
        }
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "missing bearer token"))?;

        let db = self.db();
        let user_id = db
            .access_tokens
            .get(token)
            .copied()
            .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "invalid or expired token"))?;
        db.user(user_id)
            .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "user no longer exists"))
    }

    fn admin(&self, headers: &HeaderMap) -> Result<User, Response> {
        let user = self.caller(headers)?;
        if user.role != Role::Admin {
            return Err(fail(StatusCode::FORBIDDEN, "admin only"));
        }
        Ok(user)
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

fn page<T>(items: Vec<T>, q: &HashMap<String, String>) -> Vec<T> {
    let offset = q.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit = q.get("limit").and_then(|v| v.parse().ok()).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ---- server ---------------------------------------------------------------

pub struct MockBackend {
    pub base_url: String,
    pub state: Shared,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let addr = format!("127.0.0.1:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        let state = Arc::new(MockState::new());
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
        })
    }

    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_base_url(&self.base_url);
        config.api.api_key = Some(API_KEY.to_string());
        config
    }

    /// Fresh client with an empty in-memory session
    pub fn client(&self) -> Propman {
        Propman::new(&self.config(), Arc::new(MemoryTokenStore::new())).expect("client")
    }

    pub fn add_user(&self, email: &str, role: Role) -> User {
        let mut db = self.state.db();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: Some(email.split('@').next().unwrap_or(email).to_string()),
            phone: None,
            role,
            created_at: db.stamp(),
        };
        db.users.push(MockUser {
            user: user.clone(),
            password: PASSWORD.to_string(),
        });
        user
    }

    /// New user, logged in on a fresh client
    pub async fn signed_in(&self, email: &str, role: Role) -> Result<(Propman, User)> {
        let user = self.add_user(email, role);
        let client = self.client();
        client.auth().login(email, PASSWORD).await?;
        Ok((client, user))
    }

    pub fn add_owner(&self, user: &User) -> Owner {
        let mut db = self.state.db();
        let owner = Owner {
            id: Uuid::new_v4(),
            user_id: Some(user.id),
            full_name: user.display_name().to_string(),
            email: user.email.clone(),
            phone: None,
            company: None,
            created_at: db.stamp(),
        };
        db.owners.push(owner.clone());
        owner
    }

    /// Property with a Kitchen (Oven, Fridge), a Hallway (Meter) and an empty Garage
    pub fn seed_property(&self, owner_id: Uuid, name: &str) -> PropertyDetail {
        let mut db = self.state.db();
        let now = db.stamp();
        let property = Property {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            address: format!("{} Station Road", db.properties.len() + 4),
            city: Some("York".to_string()),
            postcode: Some("YO1 7HH".to_string()),
            description: None,
            status: PropertyStatus::Active,
            splash_image_id: None,
            created_at: now,
            updated_at: now,
        };
        db.properties.push(property.clone());

        let layout: [(&str, &[&str]); 3] = [("Kitchen", &["Oven", "Fridge"]), ("Hallway", &["Meter"]), ("Garage", &[])];
        for (position, (space_name, assets)) in layout.iter().enumerate() {
            let space = Space {
                id: Uuid::new_v4(),
                property_id: property.id,
                name: space_name.to_string(),
                kind: None,
                floor: Some("Ground".to_string()),
                description: None,
                position: position as i32,
            };
            for (i, asset_name) in assets.iter().enumerate() {
                db.assets.push(Asset {
                    id: Uuid::new_v4(),
                    space_id: space.id,
                    name: asset_name.to_string(),
                    category: None,
                    make: None,
                    model: None,
                    serial_number: None,
                    notes: None,
                    installed_on: None,
                    position: i as i32,
                });
            }
            db.spaces.push(space);
        }
        db.features.push(Feature {
            id: Uuid::new_v4(),
            property_id: property.id,
            name: "Garden".to_string(),
            value: Some("South facing".to_string()),
        });

        detail_of(&db, property.id).ok().expect("seeded detail")
    }

    pub fn db(&self) -> MutexGuard<'_, Db> {
        self.state.db()
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().expect("seen lock").clone()
    }

    /// Requests whose method matches and whose path starts with `prefix`
    pub fn count(&self, method: &str, prefix: &str) -> usize {
        self.seen()
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .count()
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    /// Make every outstanding access token unknown, as if they had expired server-side
    pub fn revoke_access_tokens(&self) {
        self.state.db().access_tokens.clear();
    }

    pub fn set_refresh_delay(&self, ms: u64) {
        self.state.refresh_delay_ms.store(ms, Ordering::SeqCst);
    }

    pub fn set_token_ttl(&self, secs: i64) {
        self.state.token_ttl_secs.store(secs, Ordering::SeqCst);
    }

    pub fn set_reject_refresh(&self, on: bool) {
        self.state.reject_refresh.store(on, Ordering::SeqCst);
    }

    pub fn set_always_unauthorized(&self, on: bool) {
        self.state.always_unauthorized.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_changelog(&self, on: bool) {
        self.state.fail_changelog.store(on, Ordering::SeqCst);
    }
}

/// Tiny valid-looking JPEG payload
pub fn jpeg(seed: u8) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend(std::iter::repeat(seed).take(64));
    bytes.extend([0xFF, 0xD9]);
    bytes
}

async fn record(State(state): State<Shared>, req: Request, next: Next) -> Response {
    // The borrow of `req` must end before the await below
    let seen = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        SeenRequest {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(str::to_string),
            api_key: header("apikey"),
            bearer: header(AUTHORIZATION.as_str())
                .and_then(|v| v.strip_prefix("Bearer ").map(str::to_string)),
        }
    };
    state.seen.lock().expect("seen lock").push(seen);
    next.run(req).await
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/health", get(|| async { ok(json!({ "status": "ok" })) }))
        // auth
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/password-reset", post(password_reset))
        // users
        .route("/api/users/me", get(me).put(update_me))
        .route("/api/users/me/password", put(change_password))
        // properties
        .route("/api/properties", get(list_properties).post(create_property))
        .route(
            "/api/properties/:id",
            get(get_property).put(update_property).delete(delete_property),
        )
        .route("/api/properties/:id/detail", get(property_detail))
        .route("/api/properties/:id/splash", put(set_splash))
        .route("/api/properties/:id/spaces", get(list_spaces).post(create_space))
        .route("/api/properties/:id/features", get(list_features).post(create_feature))
        .route("/api/properties/:id/jobs", get(property_jobs))
        .route("/api/properties/:id/changelog", get(property_changelog))
        .route("/api/spaces/:id", put(update_space).delete(delete_space))
        .route("/api/spaces/:id/assets", get(list_assets).post(create_asset))
        .route("/api/assets/:id", put(update_asset).delete(delete_asset))
        .route("/api/features/:id", delete(delete_feature))
        // images
        .route("/api/images", get(list_images).post(upload_image))
        .route("/api/images/:id", delete(delete_image))
        // jobs
        .route("/api/jobs", post(create_job))
        .route("/api/jobs/:id", get(get_job))
        .route("/api/jobs/:id/extend", put(extend_job))
        .route("/api/jobs/:id/revoke", post(revoke_job))
        .route("/access/:pin", get(access))
        // transfers
        .route("/api/transfers", get(list_transfers).post(create_transfer))
        .route("/api/transfers/:id", get(get_transfer))
        .route("/api/transfers/:id/:action", post(resolve_transfer))
        // changelog
        .route("/api/changelog", post(record_change))
        // owners
        .route("/api/owners", get(list_owners).post(create_owner))
        .route("/api/owners/:id", get(get_owner).put(update_owner))
        .route("/api/owners/:id/properties", get(owner_properties))
        // admin
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/users/:id/role", put(admin_set_role))
        .route("/api/admin/properties", get(admin_properties))
        .route("/api/admin/properties/:id/owner", post(admin_assign_owner))
        .route("/api/admin/stats", get(admin_stats))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

// ---- auth -----------------------------------------------------------------

async fn login(State(s): State<Shared>, Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default().to_lowercase();
    let password = body["password"].as_str().unwrap_or_default();

    let ttl = s.ttl();
    let mut db = s.db();
    let user = db
        .users
        .iter()
        .find(|u| u.user.email == email && u.password == password)
        .map(|u| u.user.clone())
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "Invalid login credentials"))?;
    Ok(ok(db.issue_tokens(&user, ttl)))
}

async fn register(State(s): State<Shared>, Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default().to_lowercase();
    let ttl = s.ttl();
    let mut db = s.db();
    if db.users.iter().any(|u| u.user.email == email) {
        return Err(fail(StatusCode::CONFLICT, "User already registered"));
    }
    let user = User {
        id: Uuid::new_v4(),
        email,
        full_name: body["full_name"].as_str().map(str::to_string),
        phone: None,
        role: Role::Owner,
        created_at: db.stamp(),
    };
    db.users.push(MockUser {
        user: user.clone(),
        password: body["password"].as_str().unwrap_or_default().to_string(),
    });
    Ok(ok(db.issue_tokens(&user, ttl)))
}

async fn refresh(State(s): State<Shared>, Json(body): Json<Value>) -> Reply {
    s.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = s.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
    if s.reject_refresh.load(Ordering::SeqCst) {
        return Err(fail(StatusCode::UNAUTHORIZED, "Invalid Refresh Token"));
    }

    let token = body["refresh_token"].as_str().unwrap_or_default();
    let ttl = s.ttl();
    let mut db = s.db();
    let user_id = db
        .refresh_tokens
        .remove(token)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Invalid Refresh Token: Already Used"))?;
    let user = db
        .user(user_id)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "user no longer exists"))?;
    Ok(ok(db.issue_tokens(&user, ttl)))
}

async fn logout(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    s.caller(&headers)?;
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        s.db().access_tokens.remove(token);
    }
    Ok(ok(Value::Null))
}

async fn password_reset(State(s): State<Shared>, Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    s.db().password_resets.push(email);
    Ok(ok(json!({ "sent": true })))
}

// ---- users ----------------------------------------------------------------

async fn me(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    Ok(ok(s.caller(&headers)?))
}

async fn update_me(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<ProfileUpdate>) -> Reply {
    let caller = s.caller(&headers)?;
    let mut db = s.db();
    let entry = db
        .users
        .iter_mut()
        .find(|u| u.user.id == caller.id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "user not found"))?;
    if body.full_name.is_some() {
        entry.user.full_name = body.full_name;
    }
    if body.phone.is_some() {
        entry.user.phone = body.phone;
    }
    Ok(ok(entry.user.clone()))
}

async fn change_password(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let caller = s.caller(&headers)?;
    let mut db = s.db();
    let entry = db
        .users
        .iter_mut()
        .find(|u| u.user.id == caller.id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "user not found"))?;
    if body["current_password"].as_str() != Some(entry.password.as_str()) {
        return Err(fail(StatusCode::BAD_REQUEST, "current password is incorrect"));
    }
    entry.password = body["new_password"].as_str().unwrap_or_default().to_string();
    Ok(ok(Value::Null))
}

// ---- properties -------------------------------------------------------------

fn filter_properties(db: &Db, q: &HashMap<String, String>) -> Vec<Property> {
    let items = db
        .properties
        .iter()
        .filter(|p| match q.get("search") {
            Some(term) => contains(&p.name, term) || contains(&p.address, term),
            None => true,
        })
        .filter(|p| q.get("status").map_or(true, |st| p.status.as_str() == st))
        .filter(|p| q.get("owner_id").map_or(true, |o| p.owner_id.to_string() == *o))
        .cloned()
        .collect();
    page(items, q)
}

fn detail_of(db: &Db, id: Uuid) -> Result<PropertyDetail, Response> {
    let property = db.property(id)?;
    let mut spaces: Vec<Space> = db.spaces.iter().filter(|s| s.property_id == id).cloned().collect();
    spaces.sort_by_key(|s| s.position);
    let spaces = spaces
        .into_iter()
        .map(|space| {
            let mut assets: Vec<Asset> = db.assets.iter().filter(|a| a.space_id == space.id).cloned().collect();
            assets.sort_by_key(|a| a.position);
            SpaceDetail { space, assets }
        })
        .collect();
    let features = db.features.iter().filter(|f| f.property_id == id).cloned().collect();
    Ok(PropertyDetail {
        property,
        spaces,
        features,
    })
}

async fn list_properties(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    s.caller(&headers)?;
    Ok(ok(filter_properties(&s.db(), &q)))
}

async fn create_property(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<NewProperty>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    let now = db.stamp();
    let property = Property {
        id: Uuid::new_v4(),
        owner_id: body.owner_id,
        name: body.name,
        address: body.address,
        city: body.city,
        postcode: body.postcode,
        description: body.description,
        status: body.status,
        splash_image_id: None,
        created_at: now,
        updated_at: now,
    };
    db.properties.push(property.clone());
    Ok(ok(property))
}

async fn get_property(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    Ok(ok(s.db().property(id)?))
}

async fn update_property(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<PropertyUpdate>,
) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    let now = db.stamp();
    let p = db.property_mut(id)?;
    if let Some(v) = body.name {
        p.name = v;
    }
    if let Some(v) = body.address {
        p.address = v;
    }
    if body.city.is_some() {
        p.city = body.city;
    }
    if body.postcode.is_some() {
        p.postcode = body.postcode;
    }
    if body.description.is_some() {
        p.description = body.description;
    }
    if let Some(v) = body.status {
        p.status = v;
    }
    p.updated_at = now;
    Ok(ok(p.clone()))
}

async fn delete_property(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    db.property(id)?;
    let space_ids: Vec<Uuid> = db.spaces.iter().filter(|sp| sp.property_id == id).map(|sp| sp.id).collect();
    db.properties.retain(|p| p.id != id);
    db.spaces.retain(|sp| sp.property_id != id);
    db.assets.retain(|a| !space_ids.contains(&a.space_id));
    db.features.retain(|f| f.property_id != id);
    db.changelog.retain(|c| c.property_id != id);
    Ok(ok(Value::Null))
}

async fn property_detail(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    Ok(ok(detail_of(&s.db(), id)?))
}

async fn set_splash(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Reply {
    s.caller(&headers)?;
    let image_id: Option<Uuid> =
        serde_json::from_value(body["image_id"].clone()).map_err(|_| fail(StatusCode::BAD_REQUEST, "bad image_id"))?;
    let mut db = s.db();
    let p = db.property_mut(id)?;
    p.splash_image_id = image_id;
    Ok(ok(p.clone()))
}

async fn list_spaces(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let spaces: Vec<Space> = db.spaces.iter().filter(|sp| sp.property_id == id).cloned().collect();
    Ok(ok(spaces))
}

async fn create_space(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<NewSpace>,
) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    db.property(id)?;
    let position = db.spaces.iter().filter(|sp| sp.property_id == id).count() as i32;
    let space = Space {
        id: Uuid::new_v4(),
        property_id: id,
        name: body.name,
        kind: body.kind,
        floor: body.floor,
        description: body.description,
        position,
    };
    db.spaces.push(space.clone());
    Ok(ok(space))
}

async fn update_space(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<SpaceUpdate>,
) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    let space = db
        .spaces
        .iter_mut()
        .find(|sp| sp.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "space not found"))?;
    if let Some(v) = body.name {
        space.name = v;
    }
    if body.kind.is_some() {
        space.kind = body.kind;
    }
    if body.floor.is_some() {
        space.floor = body.floor;
    }
    if body.description.is_some() {
        space.description = body.description;
    }
    if let Some(v) = body.position {
        space.position = v;
    }
    Ok(ok(space.clone()))
}

async fn delete_space(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    if !db.spaces.iter().any(|sp| sp.id == id) {
        return Err(fail(StatusCode::NOT_FOUND, "space not found"));
    }
    db.spaces.retain(|sp| sp.id != id);
    db.assets.retain(|a| a.space_id != id);
    Ok(ok(Value::Null))
}

async fn list_assets(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let assets: Vec<Asset> = db.assets.iter().filter(|a| a.space_id == id).cloned().collect();
    Ok(ok(assets))
}

async fn create_asset(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<NewAsset>,
) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    if !db.spaces.iter().any(|sp| sp.id == id) {
        return Err(fail(StatusCode::NOT_FOUND, "space not found"));
    }
    let position = db.assets.iter().filter(|a| a.space_id == id).count() as i32;
    let asset = Asset {
        id: Uuid::new_v4(),
        space_id: id,
        name: body.name,
        category: body.category,
        make: body.make,
        model: body.model,
        serial_number: body.serial_number,
        notes: body.notes,
        installed_on: body.installed_on,
        position,
    };
    db.assets.push(asset.clone());
    Ok(ok(asset))
}

async fn update_asset(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<AssetUpdate>,
) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    let asset = db
        .assets
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "asset not found"))?;
    if let Some(v) = body.name {
        asset.name = v;
    }
    if body.make.is_some() {
        asset.make = body.make;
    }
    if body.model.is_some() {
        asset.model = body.model;
    }
    if body.serial_number.is_some() {
        asset.serial_number = body.serial_number;
    }
    if body.notes.is_some() {
        asset.notes = body.notes;
    }
    Ok(ok(asset.clone()))
}

async fn delete_asset(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    if !db.assets.iter().any(|a| a.id == id) {
        return Err(fail(StatusCode::NOT_FOUND, "asset not found"));
    }
    db.assets.retain(|a| a.id != id);
    Ok(ok(Value::Null))
}

async fn list_features(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let features: Vec<Feature> = db.features.iter().filter(|f| f.property_id == id).cloned().collect();
    Ok(ok(features))
}

async fn create_feature(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<NewFeature>,
) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    db.property(id)?;
    let feature = Feature {
        id: Uuid::new_v4(),
        property_id: id,
        name: body.name,
        value: body.value,
    };
    db.features.push(feature.clone());
    Ok(ok(feature))
}

async fn delete_feature(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    if !db.features.iter().any(|f| f.id == id) {
        return Err(fail(StatusCode::NOT_FOUND, "feature not found"));
    }
    db.features.retain(|f| f.id != id);
    Ok(ok(Value::Null))
}

async fn property_jobs(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let jobs: Vec<Job> = db.jobs.iter().filter(|j| j.property_id == id).cloned().collect();
    Ok(ok(jobs))
}

async fn property_changelog(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let mut entries: Vec<ChangeLogEntry> = db.changelog.iter().filter(|c| c.property_id == id).cloned().collect();
    entries.reverse();
    Ok(ok(page(entries, &q)))
}

// ---- images -----------------------------------------------------------------

fn entity_type(raw: Option<&String>) -> Result<EntityType, Response> {
    raw.and_then(|v| serde_json::from_value(Value::String(v.clone())).ok())
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "bad entity_type"))
}

fn entity_id(raw: Option<&String>) -> Result<Uuid, Response> {
    raw.and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "bad entity_id"))
}

async fn upload_image(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
    body: Bytes,
) -> Reply {
    s.caller(&headers)?;
    let entity_type = entity_type(q.get("entity_type"))?;
    let entity_id = entity_id(q.get("entity_id"))?;

    let mut hasher = Sha256::new();
    hasher.update(&body);
    let checksum = format!("{:x}", hasher.finalize());
    if q.get("checksum") != Some(&checksum) {
        return Err(fail(StatusCode::BAD_REQUEST, "checksum mismatch"));
    }

    let file_name = q.get("file_name").cloned().unwrap_or_default();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut db = s.db();
    let id = Uuid::new_v4();
    let image = Image {
        id,
        entity_type,
        entity_id,
        url: format!("https://storage.test/images/{}/{}", id, file_name),
        file_name,
        content_type,
        size_bytes: body.len() as u64,
        checksum,
        created_at: db.stamp(),
    };
    db.images.push(image.clone());
    Ok(ok(image))
}

async fn list_images(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    s.caller(&headers)?;
    let entity_type = entity_type(q.get("entity_type"))?;
    let entity_id = entity_id(q.get("entity_id"))?;
    let db = s.db();
    let images: Vec<Image> = db
        .images
        .iter()
        .filter(|i| i.entity_type == entity_type && i.entity_id == entity_id)
        .cloned()
        .collect();
    Ok(ok(images))
}

async fn delete_image(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    if !db.images.iter().any(|i| i.id == id) {
        return Err(fail(StatusCode::NOT_FOUND, "image not found"));
    }
    db.images.retain(|i| i.id != id);
    Ok(ok(json!({ "id": id })))
}

// ---- jobs -------------------------------------------------------------------

async fn create_job(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<NewJob>) -> Reply {
    let caller = s.caller(&headers)?;
    let mut db = s.db();
    db.property(body.property_id)?;
    let job = Job {
        id: Uuid::new_v4(),
        property_id: body.property_id,
        title: body.title,
        pin: body.pin,
        asset_ids: body.asset_ids,
        contractor_name: body.contractor_name,
        notes: body.notes,
        starts_at: body.starts_at,
        expires_at: body.expires_at,
        revoked_at: None,
        created_by: caller.id,
        created_at: db.stamp(),
    };
    db.jobs.push(job.clone());
    Ok(ok(job))
}

fn job_mut(db: &mut Db, id: Uuid) -> Result<&mut Job, Response> {
    db.jobs
        .iter_mut()
        .find(|j| j.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "job not found"))
}

async fn get_job(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    Ok(ok(job_mut(&mut db, id)?.clone()))
}

async fn extend_job(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Reply {
    s.caller(&headers)?;
    let expires_at: DateTime<Utc> = serde_json::from_value(body["expires_at"].clone())
        .map_err(|_| fail(StatusCode::BAD_REQUEST, "bad expires_at"))?;
    let mut db = s.db();
    let job = job_mut(&mut db, id)?;
    job.expires_at = expires_at;
    Ok(ok(job.clone()))
}

async fn revoke_job(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    let job = job_mut(&mut db, id)?;
    job.revoked_at = Some(Utc::now());
    Ok(ok(job.clone()))
}

/// Public; returns the job whatever its state so the client decides
async fn access(State(s): State<Shared>, Path(pin): Path<String>) -> Reply {
    let db = s.db();
    let job = db
        .jobs
        .iter()
        .rev()
        .find(|j| j.pin == pin)
        .cloned()
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "unknown PIN"))?;
    let property = db.property(job.property_id)?;
    let assets: Vec<Asset> = db.assets.iter().filter(|a| job.asset_ids.contains(&a.id)).cloned().collect();
    Ok(ok(JobAccess {
        job,
        property_name: property.name,
        assets,
    }))
}

// ---- transfers --------------------------------------------------------------

async fn list_transfers(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    let caller = s.caller(&headers)?;
    let db = s.db();
    let incoming = |t: &&Transfer| t.recipient_email.eq_ignore_ascii_case(&caller.email);
    let outgoing = |t: &&Transfer| t.from_user_id == caller.id;
    let items: Vec<Transfer> = db
        .transfers
        .iter()
        .filter(|t| match q.get("direction").map(String::as_str) {
            Some("incoming") => incoming(t),
            Some("outgoing") => outgoing(t),
            _ => incoming(t) || outgoing(t),
        })
        .cloned()
        .collect();
    Ok(ok(items))
}

async fn create_transfer(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<NewTransfer>) -> Reply {
    let caller = s.caller(&headers)?;
    let mut db = s.db();
    db.property(body.property_id)?;
    let now = db.stamp();
    let transfer = Transfer {
        id: Uuid::new_v4(),
        property_id: body.property_id,
        from_user_id: caller.id,
        recipient_email: body.recipient_email,
        message: body.message,
        status: TransferStatus::Pending,
        created_at: now,
        expires_at: now + Duration::days(7),
        resolved_at: None,
    };
    db.transfers.push(transfer.clone());
    Ok(ok(transfer))
}

async fn get_transfer(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let transfer = db
        .transfers
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "transfer not found"))?;
    Ok(ok(transfer))
}

async fn resolve_transfer(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path((id, action)): Path<(Uuid, String)>,
) -> Reply {
    s.caller(&headers)?;
    let status = match action.as_str() {
        "accept" => TransferStatus::Accepted,
        "reject" => TransferStatus::Rejected,
        "cancel" => TransferStatus::Cancelled,
        _ => return Err(fail(StatusCode::NOT_FOUND, "unknown action")),
    };

    let mut db = s.db();
    let transfer = db
        .transfers
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "transfer not found"))?;
    if transfer.status != TransferStatus::Pending {
        return Err(fail(StatusCode::CONFLICT, "transfer already resolved"));
    }
    transfer.status = status;
    transfer.resolved_at = Some(Utc::now());
    let transfer = transfer.clone();

    if status == TransferStatus::Accepted {
        let new_owner = db
            .owners
            .iter()
            .find(|o| o.email.eq_ignore_ascii_case(&transfer.recipient_email))
            .map(|o| o.id);
        if let Some(owner_id) = new_owner {
            db.property_mut(transfer.property_id)?.owner_id = owner_id;
        }
    }
    Ok(ok(transfer))
}

// ---- changelog --------------------------------------------------------------

async fn record_change(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<NewChangeLogEntry>) -> Reply {
    let caller = s.caller(&headers)?;
    if s.fail_changelog.load(Ordering::SeqCst) {
        return Err(fail(StatusCode::INTERNAL_SERVER_ERROR, "changelog unavailable"));
    }
    let mut db = s.db();
    let entry = ChangeLogEntry {
        id: Uuid::new_v4(),
        property_id: body.property_id,
        entity_type: body.entity_type,
        entity_id: body.entity_id,
        action: body.action,
        description: body.description,
        actor_id: Some(caller.id),
        created_at: db.stamp(),
    };
    db.changelog.push(entry.clone());
    Ok(ok(entry))
}

// ---- owners -----------------------------------------------------------------

async fn list_owners(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let owners: Vec<Owner> = db
        .owners
        .iter()
        .filter(|o| match q.get("search") {
            Some(term) => contains(&o.full_name, term) || contains(&o.email, term),
            None => true,
        })
        .cloned()
        .collect();
    Ok(ok(owners))
}

async fn create_owner(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<NewOwner>) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    if db.owners.iter().any(|o| o.email == body.email) {
        return Err(fail(StatusCode::CONFLICT, "owner with this email exists"));
    }
    let user_id = db.users.iter().find(|u| u.user.email == body.email).map(|u| u.user.id);
    let owner = Owner {
        id: Uuid::new_v4(),
        user_id,
        full_name: body.full_name,
        email: body.email,
        phone: body.phone,
        company: body.company,
        created_at: db.stamp(),
    };
    db.owners.push(owner.clone());
    Ok(ok(owner))
}

async fn get_owner(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let owner = db
        .owners
        .iter()
        .find(|o| o.id == id)
        .cloned()
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "owner not found"))?;
    Ok(ok(owner))
}

async fn update_owner(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<OwnerUpdate>,
) -> Reply {
    s.caller(&headers)?;
    let mut db = s.db();
    let owner = db
        .owners
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "owner not found"))?;
    if let Some(v) = body.full_name {
        owner.full_name = v;
    }
    if let Some(v) = body.email {
        owner.email = v;
    }
    if body.phone.is_some() {
        owner.phone = body.phone;
    }
    if body.company.is_some() {
        owner.company = body.company;
    }
    Ok(ok(owner.clone()))
}

async fn owner_properties(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Reply {
    s.caller(&headers)?;
    let db = s.db();
    let properties: Vec<Property> = db.properties.iter().filter(|p| p.owner_id == id).cloned().collect();
    Ok(ok(properties))
}

// ---- admin ------------------------------------------------------------------

async fn admin_users(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    s.admin(&headers)?;
    let users: Vec<User> = s.db().users.iter().map(|u| u.user.clone()).collect();
    Ok(ok(users))
}

async fn admin_set_role(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Reply {
    s.admin(&headers)?;
    let role: Role =
        serde_json::from_value(body["role"].clone()).map_err(|_| fail(StatusCode::BAD_REQUEST, "bad role"))?;
    let mut db = s.db();
    let entry = db
        .users
        .iter_mut()
        .find(|u| u.user.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "user not found"))?;
    entry.user.role = role;
    Ok(ok(entry.user.clone()))
}

async fn admin_properties(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    s.admin(&headers)?;
    Ok(ok(filter_properties(&s.db(), &q)))
}

async fn admin_assign_owner(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Reply {
    s.admin(&headers)?;
    let owner_id: Uuid =
        serde_json::from_value(body["owner_id"].clone()).map_err(|_| fail(StatusCode::BAD_REQUEST, "bad owner_id"))?;
    let mut db = s.db();
    if !db.owners.iter().any(|o| o.id == owner_id) {
        return Err(fail(StatusCode::NOT_FOUND, "owner not found"));
    }
    let property = db.property_mut(id)?;
    property.owner_id = owner_id;
    Ok(ok(property.clone()))
}

async fn admin_stats(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    s.admin(&headers)?;
    let db = s.db();
    let now = Utc::now();
    Ok(ok(AdminStats {
        properties: db.properties.len() as u64,
        owners: db.owners.len() as u64,
        active_jobs: db.jobs.iter().filter(|j| j.is_active(now)).count() as u64,
        pending_transfers: db.transfers.iter().filter(|t| t.is_open(now)).count() as u64,
    }))
}
