use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{
    sync::{RwLock, Semaphore},
    time::Instant,
};
use tower_http::services::{ServeDir, ServeFile};
use url::Url;

const DEFAULT_CONTENT_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_CONTENT_REQUEST_TIMEOUT_MS: u64 = 6_000;
const DEFAULT_CONTENT_CONNECT_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 4_000;
const DEFAULT_REFRESH_CONCURRENCY: usize = 2;
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

const CONTENT_CACHE_TTL_SECONDS_BOUNDS: (u64, u64) = (1, 86_400);
const CONTENT_REQUEST_TIMEOUT_MS_BOUNDS: (u64, u64) = (100, 120_000);
const CONTENT_CONNECT_TIMEOUT_MS_BOUNDS: (u64, u64) = (100, 30_000);
const NOTIFY_TIMEOUT_MS_BOUNDS: (u64, u64) = (100, 30_000);
const REFRESH_CONCURRENCY_BOUNDS: (usize, usize) = (1, 4);

const MAX_COLLECTION_ITEMS: usize = 24;
const MAX_NAME_CHARS: usize = 200;
const MAX_EMAIL_CHARS: usize = 200;
const MAX_SUBJECT_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 5_000;

const USER_AGENT: &str = "layo-portfolio/1.0";
const REQUEST_ID_HEADER: &str = "x-request-id";

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Debug,
    Info,
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(level: LogLevel) -> u8 {
            match level {
                LogLevel::Debug => 0,
                LogLevel::Info => 1,
            }
        }

        rank(*self).cmp(&rank(*other))
    }
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
        }
    }
}

/// The three read-only collections served to the page, each mapped to a path
/// on the hosted content service.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Collection {
    Projects,
    Posts,
    Testimonials,
}

impl Collection {
    const ALL: [Collection; 3] = [Self::Projects, Self::Posts, Self::Testimonials];

    fn name(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Posts => "posts",
            Self::Testimonials => "testimonials",
        }
    }

    fn service_path(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Posts => "blog_posts",
            Self::Testimonials => "testimonials",
        }
    }

    /// Query parameters forwarded to the content service. Posts are limited
    /// to published entries; ordering matches what the page expects.
    fn service_query(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Projects => &[("order", "order_index.asc,created_at.desc"), ("limit", "24")],
            Self::Posts => &[
                ("status", "eq.published"),
                ("order", "published_at.desc"),
                ("limit", "24"),
            ],
            Self::Testimonials => &[("order", "featured.desc,created_at.desc"), ("limit", "24")],
        }
    }
}

#[derive(Clone)]
struct ContentRuntimeConfig {
    service_base_url: Option<Url>,
    service_api_key: Option<String>,
    cache_ttl_seconds: u64,
    request_timeout: Duration,
    connect_timeout: Duration,
    notify_webhook_url: Option<Url>,
    notify_timeout: Duration,
    refresh_token: Option<String>,
    refresh_concurrency: usize,
    log_level: LogLevel,
}

impl ContentRuntimeConfig {
    fn from_env() -> Self {
        let cache_ttl_seconds = parse_env_u64_with_bounds(
            "CONTENT_CACHE_TTL_SECONDS",
            DEFAULT_CONTENT_CACHE_TTL_SECONDS,
            CONTENT_CACHE_TTL_SECONDS_BOUNDS,
        );
        let request_timeout_ms = parse_env_u64_with_bounds(
            "CONTENT_REQUEST_TIMEOUT_MS",
            DEFAULT_CONTENT_REQUEST_TIMEOUT_MS,
            CONTENT_REQUEST_TIMEOUT_MS_BOUNDS,
        );
        let connect_timeout_ms = parse_env_u64_with_bounds(
            "CONTENT_CONNECT_TIMEOUT_MS",
            DEFAULT_CONTENT_CONNECT_TIMEOUT_MS,
            CONTENT_CONNECT_TIMEOUT_MS_BOUNDS,
        );
        let notify_timeout_ms = parse_env_u64_with_bounds(
            "CONTACT_NOTIFY_TIMEOUT_MS",
            DEFAULT_NOTIFY_TIMEOUT_MS,
            NOTIFY_TIMEOUT_MS_BOUNDS,
        );
        let refresh_concurrency = parse_env_usize_with_bounds(
            "CONTENT_REFRESH_CONCURRENCY",
            DEFAULT_REFRESH_CONCURRENCY,
            REFRESH_CONCURRENCY_BOUNDS,
        );

        Self {
            service_base_url: parse_env_http_url("CONTENT_SERVICE_URL"),
            service_api_key: parse_env_non_empty_string("CONTENT_SERVICE_API_KEY"),
            cache_ttl_seconds,
            request_timeout: Duration::from_millis(request_timeout_ms),
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            notify_webhook_url: parse_env_http_url("CONTACT_NOTIFY_WEBHOOK_URL"),
            notify_timeout: Duration::from_millis(notify_timeout_ms),
            refresh_token: parse_env_non_empty_string("CONTENT_REFRESH_TOKEN"),
            refresh_concurrency,
            log_level: parse_log_level("LOG_LEVEL", DEFAULT_LOG_LEVEL),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    cache: Arc<RwLock<HashMap<Collection, CacheEntry>>>,
    client: reqwest::Client,
    config: ContentRuntimeConfig,
}

#[derive(Clone)]
struct CacheEntry {
    expires_at: Instant,
    value: CollectionPayload,
}

#[derive(Clone, Serialize)]
struct CollectionPayload {
    ok: bool,
    items: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CollectionPayload {
    fn from_items(items: Vec<serde_json::Value>) -> Self {
        Self {
            ok: true,
            items,
            error: None,
        }
    }

    /// Degraded payload: the page renders an empty section instead of
    /// breaking.
    fn unavailable(message: &str) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

#[derive(Clone, Serialize)]
struct ContactOutcome {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ContactOutcome {
    fn accepted() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn rejected(message: &str) -> Self {
        Self {
            ok: false,
            error: Some(message.to_string()),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ContactSubmission {
    name: String,
    email: String,
    #[serde(default)]
    subject: String,
    message: String,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let bind_address = format!("0.0.0.0:{port}");
    let config = ContentRuntimeConfig::from_env();

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(USER_AGENT)
        .build()?;

    let state = AppState {
        cache: Arc::new(RwLock::new(HashMap::new())),
        client,
        config,
    };

    let static_service = ServeDir::new("dist").not_found_service(ServeFile::new("dist/index.html"));

    let app = Router::new()
        .route("/api/projects", get(get_projects))
        .route("/api/posts", get(get_posts))
        .route("/api/testimonials", get(get_testimonials))
        .route("/api/contact", post(submit_contact))
        .route("/internal/refresh-content", post(refresh_content_endpoint))
        .fallback_service(static_service)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    println!("server listening on http://127.0.0.1:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn get_projects(state: State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    serve_collection(state.0, Collection::Projects, &headers).await
}

async fn get_posts(state: State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    serve_collection(state.0, Collection::Posts, &headers).await
}

async fn get_testimonials(state: State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    serve_collection(state.0, Collection::Testimonials, &headers).await
}

async fn serve_collection(
    state: AppState,
    collection: Collection,
    headers: &HeaderMap,
) -> axum::response::Response {
    let request_started_at = Instant::now();
    let request_id = resolve_request_id(headers);

    log_event(
        &state.config,
        LogLevel::Info,
        "collection_request_start",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "collection": collection.name(),
        }),
    );

    let cache_hit = read_cached_collection(&state, collection).await;
    log_event(
        &state.config,
        LogLevel::Debug,
        "collection_cache_decision",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "collection": collection.name(),
            "memory_cache": if cache_hit.is_some() { "hit" } else { "miss" },
        }),
    );

    if let Some(payload) = cache_hit {
        log_event(
            &state.config,
            LogLevel::Info,
            "collection_request_complete",
            serde_json::json!({
                "request_id": request_id.as_str(),
                "collection": collection.name(),
                "duration_ms": request_started_at.elapsed().as_millis(),
                "cache": "memory_hit",
            }),
        );
        return json_response(
            StatusCode::OK,
            payload,
            cache_control(&format!(
                "public, max-age={}",
                state.config.cache_ttl_seconds
            )),
            &request_id,
        );
    }

    let payload = match fetch_collection_from_service(&state, collection).await {
        Ok(items) => {
            let payload = CollectionPayload::from_items(items);
            write_cached_collection(&state, collection, payload.clone()).await;
            payload
        }
        Err(error_message) => {
            log_event(
                &state.config,
                LogLevel::Info,
                "collection_fetch_failed_recoverable",
                serde_json::json!({
                    "request_id": request_id.as_str(),
                    "collection": collection.name(),
                    "message": error_message,
                }),
            );
            CollectionPayload::unavailable(error_message)
        }
    };

    log_event(
        &state.config,
        LogLevel::Info,
        "collection_request_complete",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "collection": collection.name(),
            "duration_ms": request_started_at.elapsed().as_millis(),
            "cache": "memory_miss",
            "ok": payload.ok,
        }),
    );

    let cache_header = if payload.ok {
        cache_control(&format!(
            "public, max-age={}",
            state.config.cache_ttl_seconds
        ))
    } else {
        cache_control("no-store")
    };

    json_response(StatusCode::OK, payload, cache_header, &request_id)
}

async fn fetch_collection_from_service(
    state: &AppState,
    collection: Collection,
) -> Result<Vec<serde_json::Value>, &'static str> {
    let base_url = state
        .config
        .service_base_url
        .as_ref()
        .ok_or("content service is not configured")?;
    let request_url = base_url
        .join(collection.service_path())
        .map_err(|_| "invalid collection path")?;

    let mut request = state
        .client
        .get(request_url)
        .query(collection.service_query());
    if let Some(api_key) = state.config.service_api_key.as_deref() {
        request = request.header("apikey", api_key).bearer_auth(api_key);
    }

    let response = request
        .send()
        .await
        .map_err(|_| "failed to reach content service")?;
    if !response.status().is_success() {
        return Err("content service returned an error");
    }

    let items = response
        .json::<Vec<serde_json::Value>>()
        .await
        .map_err(|_| "content service returned invalid data")?;

    Ok(normalize_collection_items(items))
}

/// Keeps only object records and bounds the list so a misbehaving service
/// cannot balloon the page payload.
fn normalize_collection_items(items: Vec<serde_json::Value>) -> Vec<serde_json::Value> {
    items
        .into_iter()
        .filter(serde_json::Value::is_object)
        .take(MAX_COLLECTION_ITEMS)
        .collect()
}

async fn submit_contact(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(submission): Json<ContactSubmission>,
) -> impl IntoResponse {
    let request_started_at = Instant::now();
    let request_id = resolve_request_id(&headers);

    log_event(
        &state.config,
        LogLevel::Info,
        "contact_request_start",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "method": method.as_str(),
            "path": uri.path(),
        }),
    );

    let submission = match validate_contact(submission) {
        Ok(submission) => submission,
        Err(error_message) => {
            log_event(
                &state.config,
                LogLevel::Info,
                "contact_request_failed",
                serde_json::json!({
                    "request_id": request_id.as_str(),
                    "error_class": "invalid_submission",
                    "message": error_message,
                    "duration_ms": request_started_at.elapsed().as_millis(),
                }),
            );
            return json_response(
                StatusCode::BAD_REQUEST,
                ContactOutcome::rejected(error_message),
                cache_control("no-store"),
                &request_id,
            );
        }
    };

    if let Err(error_message) = store_contact_message(&state, &submission).await {
        log_event(
            &state.config,
            LogLevel::Info,
            "contact_request_failed",
            serde_json::json!({
                "request_id": request_id.as_str(),
                "error_class": "store_failed",
                "message": error_message,
                "duration_ms": request_started_at.elapsed().as_millis(),
            }),
        );
        return json_response(
            StatusCode::BAD_GATEWAY,
            ContactOutcome::rejected("message could not be saved"),
            cache_control("no-store"),
            &request_id,
        );
    }

    // The notification is best effort: its failure is logged and swallowed,
    // and it never rolls back or delays the stored message.
    start_background_notification(state.clone(), submission, request_id.clone());

    log_event(
        &state.config,
        LogLevel::Info,
        "contact_request_complete",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "status": StatusCode::OK.as_u16(),
            "duration_ms": request_started_at.elapsed().as_millis(),
        }),
    );

    json_response(
        StatusCode::OK,
        ContactOutcome::accepted(),
        cache_control("no-store"),
        &request_id,
    )
}

fn validate_contact(submission: ContactSubmission) -> Result<ContactSubmission, &'static str> {
    let name = submission.name.trim().to_string();
    let email = submission.email.trim().to_string();
    let subject = submission.subject.trim().to_string();
    let message = submission.message.trim().to_string();

    if name.is_empty() {
        return Err("name is required");
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err("name is too long");
    }
    if email.chars().count() > MAX_EMAIL_CHARS || !is_plausible_email(&email) {
        return Err("a valid email address is required");
    }
    if subject.chars().count() > MAX_SUBJECT_CHARS {
        return Err("subject is too long");
    }
    if message.is_empty() {
        return Err("message is required");
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err("message is too long");
    }

    Ok(ContactSubmission {
        name,
        email,
        subject,
        message,
    })
}

fn is_plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty() && domain.contains('.') && domain.split('.').all(|part| !part.is_empty())
}

async fn store_contact_message(
    state: &AppState,
    submission: &ContactSubmission,
) -> Result<(), &'static str> {
    let base_url = state
        .config
        .service_base_url
        .as_ref()
        .ok_or("content service is not configured")?;
    let request_url = base_url
        .join("contact_messages")
        .map_err(|_| "invalid collection path")?;

    let mut request = state.client.post(request_url).json(submission);
    if let Some(api_key) = state.config.service_api_key.as_deref() {
        request = request.header("apikey", api_key).bearer_auth(api_key);
    }

    let response = request
        .send()
        .await
        .map_err(|_| "failed to reach content service")?;
    if !response.status().is_success() {
        return Err("content service rejected the message");
    }

    Ok(())
}

fn start_background_notification(
    state: AppState,
    submission: ContactSubmission,
    request_id: String,
) {
    tokio::spawn(async move {
        let delivered = send_contact_notification(&state, &submission).await;
        log_event(
            &state.config,
            LogLevel::Info,
            "contact_notification_result",
            serde_json::json!({
                "request_id": request_id.as_str(),
                "delivered": delivered.is_ok(),
                "error_class": delivered.err(),
            }),
        );
    });
}

async fn send_contact_notification(
    state: &AppState,
    submission: &ContactSubmission,
) -> Result<(), &'static str> {
    let webhook_url = state
        .config
        .notify_webhook_url
        .as_ref()
        .ok_or("notify_unconfigured")?;

    let response = state
        .client
        .post(webhook_url.clone())
        .timeout(state.config.notify_timeout)
        .json(submission)
        .send()
        .await
        .map_err(|_| "notify_unreachable")?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err("notify_rejected")
    }
}

#[derive(Serialize)]
struct RefreshSummary {
    ok: bool,
    requested: usize,
    refreshed: usize,
    failed: usize,
}

async fn refresh_content_endpoint(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    let request_started_at = Instant::now();
    let request_id = resolve_request_id(&headers);

    log_event(
        &state.config,
        LogLevel::Info,
        "refresh_request_start",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "method": method.as_str(),
            "path": uri.path(),
        }),
    );

    if state.config.refresh_token.is_none() {
        log_event(
            &state.config,
            LogLevel::Info,
            "refresh_request_failed",
            serde_json::json!({
                "request_id": request_id.as_str(),
                "error_class": "config_missing",
                "message": "refresh token is not configured",
                "duration_ms": request_started_at.elapsed().as_millis(),
            }),
        );
        return json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ContactOutcome::rejected("refresh token is not configured"),
            cache_control("no-store"),
            &request_id,
        );
    }

    if !is_refresh_authorized(&headers, &state.config) {
        log_event(
            &state.config,
            LogLevel::Info,
            "refresh_request_failed",
            serde_json::json!({
                "request_id": request_id.as_str(),
                "error_class": "auth_failed",
                "message": "unauthorized",
                "duration_ms": request_started_at.elapsed().as_millis(),
            }),
        );
        return json_response(
            StatusCode::UNAUTHORIZED,
            ContactOutcome::rejected("unauthorized"),
            cache_control("no-store"),
            &request_id,
        );
    }

    let semaphore = Arc::new(Semaphore::new(state.config.refresh_concurrency));
    let mut tasks = futures_util::stream::FuturesUnordered::new();

    for collection in Collection::ALL {
        let state = state.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return false;
            };

            match fetch_collection_from_service(&state, collection).await {
                Ok(items) => {
                    let payload = CollectionPayload::from_items(items);
                    write_cached_collection(&state, collection, payload).await;
                    true
                }
                Err(_) => false,
            }
        }));
    }

    let mut refreshed = 0usize;
    let mut failed = 0usize;

    while let Some(join_result) = tasks.next().await {
        match join_result {
            Ok(true) => refreshed += 1,
            Ok(false) | Err(_) => failed += 1,
        }
    }

    let summary = RefreshSummary {
        ok: true,
        requested: Collection::ALL.len(),
        refreshed,
        failed,
    };

    log_event(
        &state.config,
        LogLevel::Info,
        "refresh_request_complete",
        serde_json::json!({
            "request_id": request_id.as_str(),
            "status": StatusCode::OK.as_u16(),
            "duration_ms": request_started_at.elapsed().as_millis(),
            "refreshed": summary.refreshed,
            "failed": summary.failed,
        }),
    );

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::CACHE_CONTROL, cache_control("no-store"));
    response_headers.insert(header::VARY, HeaderValue::from_static("Authorization"));
    response_with_request_id(StatusCode::OK, response_headers, Json(summary), &request_id)
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let authorization = headers.get(AUTHORIZATION)?;
    let value = authorization.to_str().ok()?;
    let prefix = "Bearer ";

    if !value.starts_with(prefix) {
        return None;
    }

    Some(value[prefix.len()..].trim())
}

fn is_refresh_authorized(headers: &HeaderMap, config: &ContentRuntimeConfig) -> bool {
    let Some(expected_token) = config.refresh_token.as_deref() else {
        return false;
    };

    let Some(provided_token) = read_bearer_token(headers) else {
        return false;
    };

    !provided_token.is_empty() && provided_token == expected_token
}

async fn read_cached_collection(
    state: &AppState,
    collection: Collection,
) -> Option<CollectionPayload> {
    let now = Instant::now();
    {
        let cache = state.cache.read().await;
        let entry = cache.get(&collection)?;

        if entry.expires_at > now {
            return Some(entry.value.clone());
        }
    }

    // The entry under this key has expired; sweep out every stale entry
    // while holding the write lock once.
    let mut cache = state.cache.write().await;
    cache.retain(|_, entry| entry.expires_at > now);
    None
}

async fn write_cached_collection(state: &AppState, collection: Collection, value: CollectionPayload) {
    let mut cache = state.cache.write().await;
    cache.insert(
        collection,
        CacheEntry {
            expires_at: Instant::now() + Duration::from_secs(state.config.cache_ttl_seconds),
            value,
        },
    );
}

fn json_response(
    status: StatusCode,
    payload: impl Serialize,
    cache_control: HeaderValue,
    request_id: &str,
) -> axum::response::Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, cache_control);
    headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
    response_with_request_id(status, headers, Json(payload), request_id)
}

fn response_with_request_id(
    status: StatusCode,
    mut headers: HeaderMap,
    payload: impl IntoResponse,
    request_id: &str,
) -> axum::response::Response {
    if let Ok(request_id_header) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, request_id_header);
    }
    (status, headers, payload).into_response()
}

fn cache_control(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("no-store"))
}

fn parse_env_u64_with_bounds(name: &str, default: u64, bounds: (u64, u64)) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn parse_env_usize_with_bounds(name: &str, default: usize, bounds: (usize, usize)) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn parse_env_non_empty_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env_http_url(name: &str) -> Option<Url> {
    let value = parse_env_non_empty_string(name)?;
    let parsed = Url::parse(&value).ok()?;

    if parsed.scheme() == "http" || parsed.scheme() == "https" {
        Some(parsed)
    } else {
        None
    }
}

fn parse_log_level(name: &str, default: LogLevel) -> LogLevel {
    match parse_env_non_empty_string(name)
        .unwrap_or_else(|| default.as_str().to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "debug" => LogLevel::Debug,
        "info" => LogLevel::Info,
        _ => default,
    }
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}

fn now_unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis())
        .unwrap_or(0)
}

fn generate_request_id() -> String {
    let counter = REQUEST_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    format!("req-{}-{counter}", now_unix_millis())
}

fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|raw| raw.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(generate_request_id)
}

fn log_event(
    config: &ContentRuntimeConfig,
    level: LogLevel,
    event: &str,
    fields: serde_json::Value,
) {
    if level < config.log_level {
        return;
    }

    let mut payload = serde_json::Map::new();
    payload.insert(
        "ts".to_string(),
        serde_json::Value::Number(serde_json::Number::from(now_unix_seconds())),
    );
    payload.insert(
        "level".to_string(),
        serde_json::Value::String(level.as_str().to_string()),
    );
    payload.insert(
        "event".to_string(),
        serde_json::Value::String(event.to_string()),
    );

    if let serde_json::Value::Object(extra) = fields {
        for (key, value) in extra {
            payload.insert(key, value);
        }
    }

    println!("{}", serde_json::Value::Object(payload));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_runtime_config() -> ContentRuntimeConfig {
        ContentRuntimeConfig {
            service_base_url: Url::parse("https://content.example.com/rest/v1/").ok(),
            service_api_key: Some("key".to_string()),
            cache_ttl_seconds: DEFAULT_CONTENT_CACHE_TTL_SECONDS,
            request_timeout: Duration::from_millis(DEFAULT_CONTENT_REQUEST_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONTENT_CONNECT_TIMEOUT_MS),
            notify_webhook_url: None,
            notify_timeout: Duration::from_millis(DEFAULT_NOTIFY_TIMEOUT_MS),
            refresh_token: Some("token".to_string()),
            refresh_concurrency: DEFAULT_REFRESH_CONCURRENCY,
            log_level: DEFAULT_LOG_LEVEL,
        }
    }

    fn test_state() -> AppState {
        AppState {
            cache: Arc::new(RwLock::new(HashMap::new())),
            client: reqwest::Client::new(),
            config: test_runtime_config(),
        }
    }

    fn submission(name: &str, email: &str, message: &str) -> ContactSubmission {
        ContactSubmission {
            name: name.to_string(),
            email: email.to_string(),
            subject: String::new(),
            message: message.to_string(),
        }
    }

    #[test]
    fn valid_submission_is_normalized() {
        let validated = validate_contact(submission(
            "  Ada Lovelace ",
            " ada@example.com ",
            "  Let's build something.  ",
        ))
        .expect("submission should validate");

        assert_eq!(validated.name, "Ada Lovelace");
        assert_eq!(validated.email, "ada@example.com");
        assert_eq!(validated.message, "Let's build something.");
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = validate_contact(submission("   ", "ada@example.com", "Hello"));
        assert_eq!(result.err(), Some("name is required"));
    }

    #[test]
    fn implausible_emails_are_rejected() {
        for email in ["", "ada", "ada@", "@example.com", "ada@example", "a b@example.com"] {
            let result = validate_contact(submission("Ada", email, "Hello"));
            assert!(result.is_err(), "email {email:?} should be rejected");
        }
    }

    #[test]
    fn plausible_email_shapes_are_accepted() {
        for email in ["ada@example.com", "a.b+c@sub.example.org"] {
            assert!(is_plausible_email(email), "email {email:?} should pass");
        }
        assert!(!is_plausible_email("ada@example..com"));
    }

    #[test]
    fn overlong_message_is_rejected() {
        let long_message = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let result = validate_contact(submission("Ada", "ada@example.com", &long_message));
        assert_eq!(result.err(), Some("message is too long"));
    }

    #[test]
    fn collections_map_to_service_paths() {
        assert_eq!(Collection::Projects.service_path(), "projects");
        assert_eq!(Collection::Posts.service_path(), "blog_posts");
        assert_eq!(Collection::Testimonials.service_path(), "testimonials");

        // Only published posts are exposed.
        assert!(Collection::Posts
            .service_query()
            .contains(&("status", "eq.published")));
    }

    #[test]
    fn normalization_drops_non_objects_and_bounds_the_list() {
        let mut items = vec![
            serde_json::json!({"id": "1"}),
            serde_json::json!("stray string"),
            serde_json::json!(42),
        ];
        items.extend((0..MAX_COLLECTION_ITEMS * 2).map(|index| serde_json::json!({"id": index})));

        let normalized = normalize_collection_items(items);

        assert_eq!(normalized.len(), MAX_COLLECTION_ITEMS);
        assert!(normalized.iter().all(serde_json::Value::is_object));
    }

    #[tokio::test]
    async fn expired_cache_entries_are_not_served() {
        let state = test_state();

        {
            let mut cache = state.cache.write().await;
            cache.insert(
                Collection::Projects,
                CacheEntry {
                    expires_at: Instant::now() - Duration::from_secs(1),
                    value: CollectionPayload::from_items(vec![serde_json::json!({"id": "1"})]),
                },
            );
        }

        assert!(read_cached_collection(&state, Collection::Projects)
            .await
            .is_none());
        // The expired entry is purged on the way out.
        assert!(state.cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn fresh_cache_entries_are_served() {
        let state = test_state();
        write_cached_collection(
            &state,
            Collection::Posts,
            CollectionPayload::from_items(vec![serde_json::json!({"id": "post-1"})]),
        )
        .await;

        let cached = read_cached_collection(&state, Collection::Posts)
            .await
            .expect("fresh entry should be served");
        assert!(cached.ok);
        assert_eq!(cached.items.len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_service_degrades_to_unavailable_payload() {
        let mut state = test_state();
        state.config.service_base_url = None;

        let result = fetch_collection_from_service(&state, Collection::Projects).await;
        let payload = CollectionPayload::unavailable(result.expect_err("must fail"));

        assert!(!payload.ok);
        assert!(payload.items.is_empty());
    }

    #[test]
    fn refresh_requires_a_matching_bearer_token() {
        let config = test_runtime_config();

        let mut headers = HeaderMap::new();
        assert!(!is_refresh_authorized(&headers, &config));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer wrong"));
        assert!(!is_refresh_authorized(&headers, &config));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token"));
        assert!(is_refresh_authorized(&headers, &config));
    }

    #[test]
    fn refresh_is_denied_when_no_token_is_configured() {
        let mut config = test_runtime_config();
        config.refresh_token = None;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token"));
        assert!(!is_refresh_authorized(&headers, &config));
    }
}
