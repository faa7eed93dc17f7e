//! API client for communicating with the counseling dashboard REST API.
//!
//! This module provides the `ApiClient` struct for the login/logout calls
//! and for authenticated requests that read dashboard data and read or
//! change student, meeting and activity records.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Activity, ActivityFilter, ActivityInput, DashboardStats, LoginData, LoginRequest, Meeting,
    MeetingFilter, MeetingInput, Student, StudentInput, User,
};

use super::{ApiEnvelope, ApiError, ApiResult};

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// `data` of a successful create: the new record's id.
#[derive(Deserialize)]
struct Created {
    id: i64,
}

/// API client for the counseling dashboard.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://host/api`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Read a response body as an envelope regardless of HTTP status.
    ///
    /// Non-2xx responses usually still carry an envelope (e.g. a 401 from
    /// `/auth/login` with `success: false`). Only when the body is not an
    /// envelope does the status decide the error.
    async fn read_envelope<T: DeserializeOwned>(response: Response) -> ApiResult<ApiEnvelope<T>> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => {
                Err(ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
            }
            Err(_) => Err(ApiError::from_status(status, &body)),
        }
    }

    /// Authenticated request returning the endpoint's envelope.
    /// A 401 means the server rejected the token and is surfaced as
    /// [`ApiError::Unauthorized`] rather than as a rejected envelope.
    async fn send_envelope<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        if self.token.is_none() {
            return Err(ApiError::NotAuthenticated);
        }

        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self.client.request(method.clone(), &url).query(query);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = self.authorize(request).send().await?;

            match response.status() {
                StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
                StatusCode::TOO_MANY_REQUESTS => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
                _ => return Self::read_envelope(response).await,
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        debug!(path = path, "GET");
        self.send_envelope::<T, ()>(Method::GET, path, query, None)
            .await?
            .into_result()
    }

    /// POST a new record and return the id the server assigned
    async fn create<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<i64> {
        debug!(path = path, "POST");
        let created: Created = self
            .send_envelope(Method::POST, path, &[], Some(body))
            .await?
            .into_result()?;
        Ok(created.id)
    }

    /// PUT or DELETE a record; a successful envelope carries only a message
    async fn modify<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<Option<String>> {
        debug!(path = path, method = %method, "Modify");
        let envelope: ApiEnvelope<IgnoredAny> =
            self.send_envelope(method, path, &[], body).await?;
        if !envelope.success {
            return Err(ApiError::Rejected(envelope.error_message().to_string()));
        }
        Ok(envelope.message)
    }

    // ===== Authentication =====

    /// Send credentials to `/auth/login`.
    ///
    /// Business failures come back as `Ok` with `success: false`; only
    /// transport problems are `Err`.
    pub async fn login(&self, request: &LoginRequest<'_>) -> ApiResult<ApiEnvelope<LoginData>> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await?;

        Self::read_envelope(response).await
    }

    /// Notify `/auth/logout`. The response payload is not used.
    pub async fn logout(&self) -> ApiResult<ApiEnvelope<IgnoredAny>> {
        let response = self
            .authorize(self.client.post(self.url("/auth/logout")))
            .send()
            .await?;

        Self::read_envelope(response).await
    }

    /// Fetch the profile of the token's owner
    pub async fn me(&self) -> ApiResult<User> {
        self.get("/auth/me", &[]).await
    }

    // ===== Dashboard =====

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.get("/dashboard/stats", &[]).await
    }

    /// Fetch the most recently added students shown on the dashboard
    pub async fn recent_students(&self) -> ApiResult<Vec<Student>> {
        self.get("/dashboard/recent-students", &[]).await
    }

    // ===== Records =====

    /// Fetch students, optionally limited to one class (e.g. "9-A")
    pub async fn students(&self, class_name: Option<&str>) -> ApiResult<Vec<Student>> {
        let query: Vec<(&str, String)> = class_name
            .map(|c| vec![("sinif", c.to_string())])
            .unwrap_or_default();
        self.get("/ogrenciler", &query).await
    }

    pub async fn student(&self, id: i64) -> ApiResult<Student> {
        self.get(&format!("/ogrenciler/{}", id), &[]).await
    }

    pub async fn meetings(&self, filter: &MeetingFilter) -> ApiResult<Vec<Meeting>> {
        self.get("/gorusmeler", &filter.query()).await
    }

    pub async fn activities(&self, filter: &ActivityFilter) -> ApiResult<Vec<Activity>> {
        self.get("/etkinlikler", &filter.query()).await
    }

    // ===== Record changes =====
    //
    // Create returns the new id. Update and delete return the server's
    // confirmation message, if any. Validation failures come back as
    // `ApiError::Rejected` with the server's text.

    pub async fn create_student(&self, student: &StudentInput) -> ApiResult<i64> {
        self.create("/ogrenciler", student).await
    }

    pub async fn update_student(
        &self,
        id: i64,
        student: &StudentInput,
    ) -> ApiResult<Option<String>> {
        self.modify(Method::PUT, &format!("/ogrenciler/{}", id), Some(student)).await
    }

    pub async fn delete_student(&self, id: i64) -> ApiResult<Option<String>> {
        self.modify::<()>(Method::DELETE, &format!("/ogrenciler/{}", id), None).await
    }

    pub async fn create_meeting(&self, meeting: &MeetingInput) -> ApiResult<i64> {
        self.create("/gorusmeler", meeting).await
    }

    /// Fields left `None` in `meeting` keep their stored value
    pub async fn update_meeting(
        &self,
        id: i64,
        meeting: &MeetingInput,
    ) -> ApiResult<Option<String>> {
        self.modify(Method::PUT, &format!("/gorusmeler/{}", id), Some(meeting)).await
    }

    pub async fn delete_meeting(&self, id: i64) -> ApiResult<Option<String>> {
        self.modify::<()>(Method::DELETE, &format!("/gorusmeler/{}", id), None).await
    }

    pub async fn create_activity(&self, activity: &ActivityInput) -> ApiResult<i64> {
        self.create("/etkinlikler", activity).await
    }

    pub async fn update_activity(
        &self,
        id: i64,
        activity: &ActivityInput,
    ) -> ApiResult<Option<String>> {
        self.modify(Method::PUT, &format!("/etkinlikler/{}", id), Some(activity)).await
    }

    pub async fn delete_activity(&self, id: i64) -> ApiResult<Option<String>> {
        self.modify::<()>(Method::DELETE, &format!("/etkinlikler/{}", id), None).await
    }
}

// ============================================================================
// Tests
// ============================================================================
