//! API Handlers
//!
//! HTTP request handlers for each backend endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::admission::AdmissionConfig;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{ApiError, ApiResult, Result};
use crate::models::{
    validate_key, CounterResponse, GetResponse, HealthResponse, HomeResponse, IncrementRequest,
    MessageResponse, SetRequest, StatsResponse,
};
use crate::ratelimit::{LimiterStore, RateLimitRule, RateLimiter};

/// Application state shared across all handlers.
///
/// Both stores synchronize internally, so the state is plain `Arc`s.
#[derive(Debug, Clone)]
pub struct AppState {
    /// JSON cache behind `/api/v1/cache`
    pub cache: Arc<CacheStore<Value>>,
    /// Counter store shared by every rate limiter
    pub limits: Arc<LimiterStore>,
    /// Process-wide admission settings
    pub admission: Arc<AdmissionConfig>,
}

impl AppState {
    pub fn new(
        cache: CacheStore<Value>,
        limits: LimiterStore,
        admission: Arc<AdmissionConfig>,
    ) -> Self {
        Self {
            cache: Arc::new(cache),
            limits: Arc::new(limits),
            admission,
        }
    }

    /// Creates both stores from configuration.
    ///
    /// The admission config starts uninitialized; the caller decides when
    /// to `init` it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let policy = config.eviction_policy();
        let cache = CacheStore::new(config.max_entries, policy)?;
        let limits = CacheStore::new(config.max_entries, policy)?;
        Ok(Self::new(cache, limits, Arc::new(AdmissionConfig::new())))
    }

    /// A limiter for `rule` backed by the shared counter store.
    pub fn limiter(&self, rule: RateLimitRule) -> RateLimiter {
        RateLimiter::new(rule, self.limits.clone(), self.admission.clone())
    }
}

/// Handler for GET /api/v1/
pub async fn home_handler() -> Json<HomeResponse> {
    Json(HomeResponse::ok())
}

/// Handler for PUT /api/v1/cache
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    state.cache.set(&req.key, req.value);
    Ok(Json(MessageResponse::set(req.key)))
}

/// Handler for GET /api/v1/cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<GetResponse>> {
    checked_key(&key)?;
    let value = state
        .cache
        .get(&key)
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;
    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /api/v1/cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    checked_key(&key)?;
    if !state.cache.delete(&key) {
        return Err(ApiError::NotFound(key));
    }
    Ok(Json(MessageResponse::deleted(key)))
}

/// Handler for POST /api/v1/cache/:key/incr
///
/// An empty body increments by one. A missing key starts from zero. Any
/// other body must be a valid JSON `IncrementRequest`.
pub async fn increment_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<CounterResponse>> {
    checked_key(&key)?;
    let req = increment_request(&headers, &body)?;
    let value = state.cache.increment(&key, req.amount)?;
    debug!("Counter {} updated by {} to {}", key, req.amount, value);
    Ok(Json(CounterResponse { key, value }))
}

fn increment_request(headers: &HeaderMap, body: &Bytes) -> ApiResult<IncrementRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(IncrementRequest::default());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if !is_json {
        return Err(ApiError::InvalidRequest(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }

    Json::<IncrementRequest>::from_bytes(body)
        .map(|Json(req)| req)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        cache: state.cache.stats().into(),
        rate_limits: state.limits.stats().into(),
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let active = state.admission.is_active();
    if !active {
        info!("Health check while admission config is inactive");
    }
    Json(HealthResponse::healthy(active))
}

fn checked_key(key: &str) -> ApiResult<()> {
    match validate_key(key) {
        Some(msg) => Err(ApiError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AdmissionSettings;
    use crate::cache::EvictionPolicy;
    use crate::error::CacheError;
    use serde_json::json;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        headers
    }

    fn test_state() -> AppState {
        let state = AppState::new(
            CacheStore::new(100, EvictionPolicy::CapacityOnly).unwrap(),
            CacheStore::new(100, EvictionPolicy::CapacityOnly).unwrap(),
            Arc::new(AdmissionConfig::new()),
        );
        state.admission.init(AdmissionSettings::default());
        state
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();
        let req = SetRequest {
            key: "user".to_string(),
            value: json!({"name": "ada"}),
        };

        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let Json(resp) = get_handler(State(state), Path("user".to_string()))
            .await
            .unwrap();
        assert_eq!(resp.value, json!({"name": "ada"}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();
        let result = get_handler(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        state.cache.set("gone", json!(1));

        let result = delete_handler(State(state.clone()), Path("gone".to_string())).await;
        assert!(result.is_ok());

        let again = delete_handler(State(state), Path("gone".to_string())).await;
        assert!(matches!(again, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_increment_handler() {
        let state = test_state();

        let Json(first) = increment_handler(
            State(state.clone()),
            Path("hits".to_string()),
            HeaderMap::new(),
            Bytes::new(),
        )
        .await
        .unwrap();
        assert_eq!(first.value, 1);

        let Json(second) = increment_handler(
            State(state.clone()),
            Path("hits".to_string()),
            json_headers(),
            Bytes::from_static(br#"{"amount": 5}"#),
        )
        .await
        .unwrap();
        assert_eq!(second.value, 6);
        assert_eq!(state.cache.get("hits"), Some(json!(6)));
    }

    #[test]
    fn test_increment_request_parsing() {
        assert_eq!(increment_request(&HeaderMap::new(), &Bytes::new()).unwrap().amount, 1);
        assert_eq!(
            increment_request(&json_headers(), &Bytes::from_static(b"  \n")).unwrap().amount,
            1
        );
        assert_eq!(
            increment_request(&json_headers(), &Bytes::from_static(b"{}")).unwrap().amount,
            1
        );

        let invalid: [(HeaderMap, &'static [u8]); 3] = [
            (json_headers(), br#"{"amount": "five"}"#),
            (json_headers(), br#"{"amount": 5"#),
            (HeaderMap::new(), br#"{"amount": 5}"#),
        ];
        for (headers, body) in invalid {
            let result = increment_request(&headers, &Bytes::from_static(body));
            assert!(
                matches!(result, Err(ApiError::InvalidRequest(_))),
                "body {:?} should be rejected",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[tokio::test]
    async fn test_increment_invalid_body_leaves_value_untouched() {
        let state = test_state();
        state.cache.set("n", json!(7));

        let result = increment_handler(
            State(state.clone()),
            Path("n".to_string()),
            json_headers(),
            Bytes::from_static(br#"{"amount": "five"}"#),
        )
        .await;

        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
        assert_eq!(state.cache.get("n"), Some(json!(7)));
    }

    #[tokio::test]
    async fn test_increment_non_numeric() {
        let state = test_state();
        state.cache.set("name", json!("ada"));

        let result = increment_handler(
            State(state),
            Path("name".to_string()),
            HeaderMap::new(),
            Bytes::new(),
        )
        .await;
        assert!(matches!(
            result,
            Err(ApiError::Cache(CacheError::NotNumeric(_)))
        ));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        state.cache.set("a", json!(1));
        state.cache.get("a");
        state.cache.get("b");

        let Json(stats) = stats_handler(State(state)).await;
        assert_eq!(stats.cache.hits, 1);
        assert_eq!(stats.cache.misses, 1);
        assert_eq!(stats.cache.total_entries, 1);
        assert_eq!(stats.rate_limits.total_entries, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let state = test_state();
        let Json(health) = health_handler(State(state.clone())).await;
        assert_eq!(health.status, "healthy");
        assert!(health.admission_active);

        state.admission.close();
        let Json(health) = health_handler(State(state)).await;
        assert!(!health.admission_active);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();
        let req = SetRequest {
            key: String::new(),
            value: json!(null),
        };

        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn test_from_config_rejects_zero_capacity() {
        let config = Config {
            max_entries: 0,
            ..Config::default()
        };
        assert_eq!(
            AppState::from_config(&config).unwrap_err(),
            CacheError::InvalidCapacity(0)
        );
    }
}
