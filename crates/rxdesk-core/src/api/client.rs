//! API client for the pharmacy REST backend.
//!
//! This module provides the `ApiClient` struct for the auth, analytics,
//! alerts and safety endpoints. Inventory endpoints live behind the
//! `InventoryBackend` trait in `api::inventory`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::{AuthGrant, AuthProvider};
use crate::models::analytics::SupplierPerformance;
use crate::models::{
    Alert, AlertFilter, AlertStats, CategoryDistribution, DashboardStats, SafetyCheckRequest,
    SalesTrend, Supplier, UnreadCount, User,
};

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when neither config nor environment provides one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of retries for rate-limited (429) GET requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Query string for endpoints that take no parameters.
pub(crate) const NO_QUERY: &[(&str, &str)] = &[];

/// Default look-back window for sales trends, in days.
pub const DEFAULT_TREND_DAYS: u32 = 30;

/// Default number of entries for the top-medicines ranking.
pub const DEFAULT_TOP_LIMIT: u32 = 5;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    refresh_token: Option<String>,
    user: User,
}

/// API client for the pharmacy backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client for `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            initial_backoff: self.initial_backoff,
        }
    }

    /// Override the first rate-limit backoff delay.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// GET `path` with query parameters, retrying rate-limited responses.
    pub(crate) async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(
                        url = %url,
                        retry = retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Send a JSON body with `method` and parse the JSON reply. Not retried.
    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;
        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Send a bodiless request and ignore whatever the server replies with.
    pub(crate) async fn send_empty(&self, method: Method, path: &str) -> Result<()> {
        let url = self.url(path);
        let response = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;
        Self::check_response(response).await?;
        Ok(())
    }

    async fn authenticate<B: Serialize>(&self, path: &str, body: &B) -> Result<AuthGrant> {
        let response: AuthResponse = self
            .send_json(Method::POST, path, Some(body))
            .await
            .context("Authentication request failed")?;

        if let Some(ref kind) = response.token_type {
            if !kind.eq_ignore_ascii_case("bearer") {
                warn!(token_type = %kind, "Unexpected token type");
            }
        }

        Ok(AuthGrant {
            token: response.access_token,
            user: response.user,
        })
    }

    // ===== Analytics =====

    pub async fn fetch_dashboard(&self) -> Result<DashboardStats> {
        self.get("/analytics/dashboard", NO_QUERY).await
    }

    pub async fn fetch_sales_trends(&self, days: u32) -> Result<Vec<SalesTrend>> {
        self.get("/analytics/sales-trends", &[("days", days)]).await
    }

    pub async fn fetch_category_distribution(&self) -> Result<Vec<CategoryDistribution>> {
        self.get("/analytics/category-distribution", NO_QUERY).await
    }

    pub async fn fetch_inventory_value(&self) -> Result<Value> {
        self.get("/analytics/inventory-value", NO_QUERY).await
    }

    pub async fn fetch_top_medicines(&self, limit: u32) -> Result<Value> {
        self.get("/analytics/top-medicines", &[("limit", limit)]).await
    }

    pub async fn fetch_supplier_performance(&self) -> Result<Vec<Supplier>> {
        let envelope: SupplierPerformance =
            self.get("/analytics/supplier-performance", NO_QUERY).await?;
        debug!(
            count = envelope.suppliers.len(),
            total = envelope.total_suppliers,
            "Fetched supplier performance"
        );
        Ok(envelope.suppliers)
    }

    // ===== Alerts =====

    pub async fn fetch_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>> {
        let alerts: Vec<Alert> = self.get("/alerts/", filter).await?;
        debug!(count = alerts.len(), "Fetched alerts");
        Ok(alerts)
    }

    pub async fn fetch_unread_count(&self) -> Result<UnreadCount> {
        self.get("/alerts/unread-count", NO_QUERY).await
    }

    pub async fn fetch_alert_stats(&self) -> Result<AlertStats> {
        self.get("/alerts/stats", NO_QUERY).await
    }

    pub async fn fetch_alert(&self, id: i64) -> Result<Alert> {
        self.get(&format!("/alerts/{}", id), NO_QUERY).await
    }

    pub async fn acknowledge_alert(&self, id: i64) -> Result<Value> {
        self.send_json::<_, ()>(Method::PUT, &format!("/alerts/{}/acknowledge", id), None)
            .await
    }

    pub async fn resolve_alert(&self, id: i64) -> Result<Value> {
        self.send_json::<_, ()>(Method::PUT, &format!("/alerts/{}/resolve", id), None)
            .await
    }

    pub async fn dismiss_alert(&self, id: i64) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/alerts/{}", id))
            .await
    }

    pub async fn fetch_alert_types(&self) -> Result<Value> {
        self.get("/alerts/types/info", NO_QUERY).await
    }

    // ===== Safety =====

    /// Run the drug safety check. The reply is passed through untouched.
    pub async fn check_safety(&self, request: &SafetyCheckRequest) -> Result<Value> {
        self.send_json(Method::POST, "/safety/check", Some(request))
            .await
    }

    pub async fn search_drugs(&self, query: &str) -> Result<Value> {
        self.get("/safety/search-drugs", &[("q", query)]).await
    }
}

#[async_trait]
impl AuthProvider for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        self.authenticate("/auth/login", &LoginRequest { email, password })
            .await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthGrant> {
        self.authenticate(
            "/auth/register",
            &RegisterRequest {
                name,
                email,
                password,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertPriority, AlertStatus, Role};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&format!("{}/api/v1/", server.uri()), Duration::from_secs(5))
            .unwrap()
            .with_initial_backoff(Duration::from_millis(1))
    }

    fn user_json() -> Value {
        json!({ "id": 9, "email": "ana@example.com", "name": "Ana", "role": "admin" })
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "h.p.s",
                "token_type": "bearer",
                "user": user_json(),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = client_for(&server).login("ana@example.com", "pw").await.unwrap();
        assert_eq!(grant.token, "h.p.s");
        assert_eq!(grant.user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_register_posts_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/register"))
            .and(body_json(json!({ "name": "Ana", "email": "ana@example.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "access_token": "h.p.s",
                "user": user_json(),
            })))
            .mount(&server)
            .await;

        let grant = client_for(&server)
            .register("Ana", "ana@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(grant.user.id, 9);
    }

    #[tokio::test]
    async fn test_login_rejection_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).login("a@b.c", "bad").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_alert_filters_and_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/alerts/"))
            .and(query_param("status", "unread"))
            .and(query_param("priority", "high"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).with_token("tok".to_string());
        let filter = AlertFilter {
            status: Some(AlertStatus::Unread),
            priority: Some(AlertPriority::High),
            alert_type: None,
        };
        assert!(client.fetch_alerts(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_get_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/analytics/dashboard"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/analytics/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_medicines": 120,
                "total_inventory_value": 5400.5,
                "low_stock_items": 7,
                "expiring_soon": 3,
            })))
            .mount(&server)
            .await;

        let stats = client_for(&server).fetch_dashboard().await.unwrap();
        assert_eq!(stats.total_medicines, 120);
        assert_eq!(stats.low_stock_items, 7);
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/alerts/stats"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_alert_stats().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_supplier_performance_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/analytics/supplier-performance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "suppliers": [
                    { "id": 1, "name": "Apex Pharma", "rating": 4.8, "on_time_delivery": 95 },
                    { "id": 2, "name": "Zen Meds", "rating": 3.9, "avg_delivery_days": 5 },
                ],
                "total_suppliers": 2,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let suppliers = client_for(&server).fetch_supplier_performance().await.unwrap();
        assert_eq!(suppliers.len(), 2);
        assert_eq!(suppliers[0].name, "Apex Pharma");
        assert_eq!(suppliers[0].on_time_delivery, Some(95.0));
        assert_eq!(suppliers[1].avg_delivery_days, Some(5.0));
    }

    #[tokio::test]
    async fn test_alert_stats_and_top_medicine_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/alerts/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 9, "unread": 4, "critical": 1, "high": 2, "medium": 3, "low": 3,
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/analytics/top-medicines"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let stats = client.fetch_alert_stats().await.unwrap();
        assert_eq!(stats.unread, 4);
        assert_eq!(stats.critical, 1);
        let top = client.fetch_top_medicines(DEFAULT_TOP_LIMIT).await.unwrap();
        assert_eq!(top, json!([]));
    }

    #[tokio::test]
    async fn test_safety_check_passes_reply_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/safety/check"))
            .and(body_json(json!({
                "drug_name": "Warfarin",
                "conditions": ["pregnancy"],
                "current_medications": ["Aspirin"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "score": 32 })))
            .mount(&server)
            .await;

        let request = SafetyCheckRequest {
            drug_name: "Warfarin".to_string(),
            conditions: vec!["pregnancy".to_string()],
            current_medications: vec!["Aspirin".to_string()],
        };
        let reply = client_for(&server).check_safety(&request).await.unwrap();
        assert_eq!(reply["score"], 32);
    }
}
