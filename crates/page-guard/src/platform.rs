//! Remote platform API abstraction for testability.
//!
//! The [`PlatformClient`] trait abstracts the social platform's REST API,
//! allowing production code to use [`HttpPlatformClient`] while tests use
//! `MockPlatformClient`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   PageGuard  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌───────────────┐
//! │PlatformClient │ (trait)
//! └───────────────┘
//!      │      │
//!      ▼      ▼
//! ┌──────┐ ┌──────┐
//! │ Http │ │ Mock │
//! └──┬───┘ └──────┘
//!    │
//!    ▼
//!  Platform REST API
//! ```
//!
//! # Page ID Validation
//!
//! All methods that accept page IDs validate them before building request
//! paths, to prevent path injection:
//! - Must be 1-64 characters
//! - Must contain only ASCII alphanumerics, `-` and `_`
//!
//! # Error Mapping
//!
//! - **401 / 403**: `PlatformError::Auth` (the trigger for `technical_access` issues)
//! - **404**: `PlatformError::NotFound`
//! - **429**: `PlatformError::RateLimited` (with `Retry-After` when present)
//! - **everything else**: `PlatformError::Other`

use std::future::Future;
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use tracing::debug;

use pagewarden_core::error::PlatformError;
use pagewarden_core::types::{PageInfo, RawMetrics};

/// Validates a page ID before it is interpolated into a request path.
fn validate_page_id(id: &str) -> Result<(), PlatformError> {
    if id.is_empty() || id.len() > 64 {
        return Err(PlatformError::Other(format!(
            "invalid page ID: length {} (must be 1-64)",
            id.len()
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(PlatformError::Other(
            "invalid page ID: contains characters outside [A-Za-z0-9_-]".to_owned(),
        ));
    }
    Ok(())
}

/// Trait abstracting the remote platform API.
///
/// All platform calls go through this trait, enabling testability via mocking.
/// The trait is `Send + Sync + 'static`, allowing safe sharing across async
/// contexts.
///
/// # Implementations
///
/// - [`HttpPlatformClient`]: Production implementation using `reqwest`
/// - `MockPlatformClient`: Test implementation with scriptable responses
///   (available in tests only)
pub trait PlatformClient: Send + Sync + 'static {
    /// Fetches the current raw metrics for a page.
    ///
    /// An `Auth` error from this call is the trigger condition for the
    /// `technical_access` issue type.
    fn fetch_metrics(
        &self,
        page: &PageInfo,
    ) -> impl Future<Output = Result<RawMetrics, PlatformError>> + Send;

    /// Publishes a post to the page feed.
    fn publish_post(
        &self,
        page: &PageInfo,
        body: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Refreshes the page's access credentials.
    ///
    /// Deterministic remediation path for `technical_access` issues.
    fn refresh_credentials(
        &self,
        page: &PageInfo,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Adjusts the page's posting schedule (posts per day).
    fn adjust_schedule(
        &self,
        page: &PageInfo,
        posts_per_day: u8,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Checks platform API reachability.
    ///
    /// Used by `PageGuard`'s `Pipeline::health_check()` implementation.
    fn ping(&self) -> impl Future<Output = Result<(), PlatformError>> + Send;
}

/// Insights payload returned by the metrics endpoint.
#[derive(Debug, Deserialize)]
struct InsightsResponse {
    engagement_rate: f64,
    #[serde(default)]
    response_latency_secs: u64,
    content_quality: f64,
    compliance: f64,
    #[serde(default)]
    followers: u64,
}

/// Production platform client implementation using `reqwest`.
///
/// Communicates with a Graph-style REST API. The exact wire format is kept
/// out of the controller: this client is the only place that knows URLs and
/// payload shapes.
pub struct HttpPlatformClient {
    http: reqwest::Client,
    api_base: String,
}

impl HttpPlatformClient {
    /// Creates a client against the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Other` if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(api_base: impl Into<String>, request_timeout: Duration) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PlatformError::Other(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Maps an HTTP response status to the typed platform error taxonomy.
    fn classify_status(status: reqwest::StatusCode, retry_after: Option<u64>, context: &str) -> PlatformError {
        match status.as_u16() {
            401 | 403 => PlatformError::Auth(format!("{context}: http {status}")),
            404 => PlatformError::NotFound(context.to_owned()),
            429 => PlatformError::RateLimited {
                retry_after_secs: retry_after,
            },
            _ => PlatformError::Other(format!("{context}: http {status}")),
        }
    }

    async fn check_status(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        Err(Self::classify_status(status, retry_after, context))
    }
}

impl PlatformClient for HttpPlatformClient {
    async fn fetch_metrics(&self, page: &PageInfo) -> Result<RawMetrics, PlatformError> {
        validate_page_id(&page.id)?;

        let url = format!("{}/{}/insights", self.api_base, page.id);
        debug!(page_id = %page.id, "fetching page metrics");

        let response = self
            .http
            .get(&url)
            .query(&[("access_token", page.access_token.as_str())])
            .send()
            .await
            .map_err(|e| PlatformError::Other(format!("metrics request failed: {e}")))?;

        let response = Self::check_status(response, "fetch metrics").await?;
        let insights: InsightsResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Other(format!("metrics response malformed: {e}")))?;

        Ok(RawMetrics {
            engagement_rate: insights.engagement_rate,
            response_latency_secs: insights.response_latency_secs,
            content_quality: insights.content_quality,
            compliance: insights.compliance,
            followers: insights.followers,
            fetched_at: SystemTime::now(),
        })
    }

    async fn publish_post(&self, page: &PageInfo, body: &str) -> Result<(), PlatformError> {
        validate_page_id(&page.id)?;

        let url = format!("{}/{}/feed", self.api_base, page.id);
        let response = self
            .http
            .post(&url)
            .query(&[("access_token", page.access_token.as_str())])
            .json(&serde_json::json!({ "message": body }))
            .send()
            .await
            .map_err(|e| PlatformError::Other(format!("publish request failed: {e}")))?;

        Self::check_status(response, "publish post").await?;
        Ok(())
    }

    async fn refresh_credentials(&self, page: &PageInfo) -> Result<(), PlatformError> {
        validate_page_id(&page.id)?;

        let url = format!("{}/{}/refresh_access", self.api_base, page.id);
        let response = self
            .http
            .post(&url)
            .query(&[("access_token", page.access_token.as_str())])
            .send()
            .await
            .map_err(|e| PlatformError::Other(format!("credential refresh failed: {e}")))?;

        Self::check_status(response, "refresh credentials").await?;
        Ok(())
    }

    async fn adjust_schedule(&self, page: &PageInfo, posts_per_day: u8) -> Result<(), PlatformError> {
        validate_page_id(&page.id)?;

        let url = format!("{}/{}/posting_schedule", self.api_base, page.id);
        let response = self
            .http
            .post(&url)
            .query(&[("access_token", page.access_token.as_str())])
            .json(&serde_json::json!({ "posts_per_day": posts_per_day }))
            .send()
            .await
            .map_err(|e| PlatformError::Other(format!("schedule adjust failed: {e}")))?;

        Self::check_status(response, "adjust schedule").await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        let url = format!("{}/ping", self.api_base);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PlatformError::Other(format!("ping failed: {e}")))?;

        Self::check_status(response, "ping").await?;
        Ok(())
    }
}

/// 테스트용 Mock 플랫폼 클라이언트
///
/// 설정 가능한 응답을 반환하여 네트워크 없이도 테스트할 수 있습니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockPlatformClient {
    /// fetch_metrics가 반환할 메트릭 (페이지 무관)
    pub metrics: Option<RawMetrics>,
    /// fetch_metrics 호출 시 인증 실패를 시뮬레이션할지 여부
    pub fail_auth: bool,
    /// 액션 호출(publish/refresh/adjust) 실패를 시뮬레이션할지 여부
    pub fail_actions: bool,
    /// ping 실패를 시뮬레이션할지 여부
    pub fail_ping: bool,
}

#[cfg(test)]
impl MockPlatformClient {
    /// 빈 mock 클라이언트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 반환할 메트릭을 설정합니다.
    pub fn with_metrics(mut self, metrics: RawMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// 메트릭 수집 시 인증 실패하도록 설정합니다.
    pub fn with_auth_failure(mut self) -> Self {
        self.fail_auth = true;
        self
    }

    /// 액션 호출 시 실패하도록 설정합니다.
    pub fn with_failing_actions(mut self) -> Self {
        self.fail_actions = true;
        self
    }
}

#[cfg(test)]
impl PlatformClient for MockPlatformClient {
    async fn fetch_metrics(&self, page: &PageInfo) -> Result<RawMetrics, PlatformError> {
        if self.fail_auth {
            return Err(PlatformError::Auth("mock token expired".to_owned()));
        }
        self.metrics
            .clone()
            .ok_or_else(|| PlatformError::NotFound(page.id.clone()))
    }

    async fn publish_post(&self, page: &PageInfo, _body: &str) -> Result<(), PlatformError> {
        if self.fail_actions {
            return Err(PlatformError::Other(format!(
                "mock publish failure for {}",
                page.id
            )));
        }
        Ok(())
    }

    async fn refresh_credentials(&self, page: &PageInfo) -> Result<(), PlatformError> {
        if self.fail_actions {
            return Err(PlatformError::Other(format!(
                "mock refresh failure for {}",
                page.id
            )));
        }
        Ok(())
    }

    async fn adjust_schedule(&self, page: &PageInfo, _posts_per_day: u8) -> Result<(), PlatformError> {
        if self.fail_actions {
            return Err(PlatformError::Other(format!(
                "mock schedule failure for {}",
                page.id
            )));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        if self.fail_ping {
            return Err(PlatformError::Other("mock ping failure".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_page() -> PageInfo {
        PageInfo {
            id: "page-1".to_owned(),
            name: "Acme Coffee".to_owned(),
            access_token: "tok".to_owned(),
        }
    }

    pub(crate) fn sample_metrics() -> RawMetrics {
        RawMetrics {
            engagement_rate: 4.5,
            response_latency_secs: 600,
            content_quality: 82.0,
            compliance: 95.0,
            followers: 12_000,
            fetched_at: SystemTime::now(),
        }
    }

    #[test]
    fn page_id_validation_accepts_normal_ids() {
        assert!(validate_page_id("page-1").is_ok());
        assert!(validate_page_id("123456789").is_ok());
        assert!(validate_page_id("acme_coffee").is_ok());
    }

    #[test]
    fn page_id_validation_rejects_bad_ids() {
        assert!(validate_page_id("").is_err());
        assert!(validate_page_id(&"x".repeat(65)).is_err());
        assert!(validate_page_id("../etc/passwd").is_err());
        assert!(validate_page_id("page 1").is_err());
    }

    #[test]
    fn status_mapping_auth() {
        let err = HttpPlatformClient::classify_status(
            reqwest::StatusCode::UNAUTHORIZED,
            None,
            "fetch metrics",
        );
        assert!(err.is_auth());

        let err = HttpPlatformClient::classify_status(
            reqwest::StatusCode::FORBIDDEN,
            None,
            "fetch metrics",
        );
        assert!(err.is_auth());
    }

    #[test]
    fn status_mapping_rate_limited_carries_retry_after() {
        let err = HttpPlatformClient::classify_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            Some(120),
            "fetch metrics",
        );
        assert!(matches!(
            err,
            PlatformError::RateLimited {
                retry_after_secs: Some(120)
            }
        ));
    }

    #[test]
    fn status_mapping_not_found_and_other() {
        assert!(matches!(
            HttpPlatformClient::classify_status(reqwest::StatusCode::NOT_FOUND, None, "x"),
            PlatformError::NotFound(_)
        ));
        assert!(matches!(
            HttpPlatformClient::classify_status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                None,
                "x"
            ),
            PlatformError::Other(_)
        ));
    }

    #[tokio::test]
    async fn mock_client_returns_configured_metrics() {
        let client = MockPlatformClient::new().with_metrics(sample_metrics());
        let metrics = client.fetch_metrics(&sample_page()).await.unwrap();
        assert!((metrics.engagement_rate - 4.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn mock_client_auth_failure() {
        let client = MockPlatformClient::new()
            .with_metrics(sample_metrics())
            .with_auth_failure();
        let err = client.fetch_metrics(&sample_page()).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn mock_client_not_found_without_metrics() {
        let client = MockPlatformClient::new();
        let err = client.fetch_metrics(&sample_page()).await.unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));
    }

    #[tokio::test]
    async fn mock_client_actions_succeed_by_default() {
        let client = MockPlatformClient::new();
        let page = sample_page();
        client.publish_post(&page, "hello").await.unwrap();
        client.refresh_credentials(&page).await.unwrap();
        client.adjust_schedule(&page, 2).await.unwrap();
        client.ping().await.unwrap();
    }

    #[tokio::test]
    async fn mock_client_failing_actions() {
        let client = MockPlatformClient::new().with_failing_actions();
        let page = sample_page();
        assert!(client.publish_post(&page, "hello").await.is_err());
        assert!(client.refresh_credentials(&page).await.is_err());
        assert!(client.adjust_schedule(&page, 2).await.is_err());
    }

    #[test]
    fn http_client_construction() {
        let client = HttpPlatformClient::new(
            "https://graph.example.test/v1/",
            Duration::from_secs(10),
        )
        .unwrap();
        // trailing slash는 정규화됨
        assert_eq!(client.api_base, "https://graph.example.test/v1");
    }

    #[test]
    fn insights_response_parses_with_defaults() {
        let json = r#"{"engagement_rate": 3.2, "content_quality": 70.0, "compliance": 88.5}"#;
        let parsed: InsightsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response_latency_secs, 0);
        assert_eq!(parsed.followers, 0);
    }
}
