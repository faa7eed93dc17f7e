//! Login and logout against the API, kept in step with the session store.
//!
//! Every operation here resolves to an [`ApiEnvelope`] (or to nothing, for
//! logout); transport errors are turned into `success: false` envelopes and
//! never reach the caller.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiEnvelope, ApiError, ApiResult};
use crate::models::{LoginData, LoginRequest, User};

use super::session::{AuthState, SessionStore};

/// Returned without a network call when email or password is blank
const MISSING_CREDENTIALS_MESSAGE: &str = "Email and password are required";

/// Fallback when a login fails without a usable error message
const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Clears the session store when dropped.
///
/// Held across the remote logout call so the store is cleared on every
/// exit path, including the caller dropping the future mid-request.
struct ClearOnDrop<'a, S: SessionStore + ?Sized>(&'a S);

impl<S: SessionStore + ?Sized> Drop for ClearOnDrop<'_, S> {
    fn drop(&mut self) {
        self.0.clear();
    }
}

/// Bridges remote authentication to a [`SessionStore`].
///
/// Login, logout and profile refresh on one client are serialized, so a
/// logout issued after a login always observes that login's outcome.
pub struct AuthClient<S: ?Sized> {
    api: ApiClient,
    op_lock: Mutex<()>,
    store: Arc<S>,
}

impl<S: SessionStore + ?Sized> AuthClient<S> {
    /// `api` must not carry a token; the token is always taken from `store`.
    pub fn new(api: ApiClient, store: Arc<S>) -> Self {
        Self {
            api,
            op_lock: Mutex::new(()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn state(&self) -> AuthState {
        self.store.state()
    }

    /// An API client carrying the stored token, for authenticated calls
    pub fn authorized_api(&self) -> ApiResult<ApiClient> {
        self.store
            .token()
            .map(|token| self.api.with_token(token))
            .ok_or(ApiError::NotAuthenticated)
    }

    /// Run `request` with an API client carrying the stored token.
    ///
    /// A 401 means the server no longer accepts the token, so the session
    /// is cleared, unless a login has replaced the token in the meantime.
    pub async fn authorized<T, F, Fut>(&self, request: F) -> ApiResult<T>
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let token = self.store.token().ok_or(ApiError::NotAuthenticated)?;
        let result = request(self.api.with_token(token.clone())).await;

        if matches!(result, Err(ApiError::Unauthorized)) {
            self.invalidate(&token).await;
        }
        result
    }

    /// Clear the session if it still holds `rejected`
    async fn invalidate(&self, rejected: &str) {
        let _op = self.op_lock.lock().await;
        if self.store.token().as_deref() == Some(rejected) {
            info!("Token rejected by server, clearing session");
            self.store.clear();
        } else {
            debug!("Rejected token was already replaced, keeping session");
        }
    }

    /// Log in and, on success, persist the returned token and user.
    ///
    /// - `success: true` with data: session saved, envelope returned as is
    /// - `success: true` with data the store refuses (empty token, write
    ///   error): synthesized failure envelope, session untouched
    /// - `success: false`: returned as is, session untouched
    /// - transport failure: synthesized failure envelope, session untouched
    pub async fn login(&self, email: &str, password: &str) -> ApiEnvelope<LoginData> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return ApiEnvelope::failure(MISSING_CREDENTIALS_MESSAGE);
        }

        let _op = self.op_lock.lock().await;

        let request = LoginRequest { email, password };
        let envelope = match self.api.login(&request).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                return ApiEnvelope::failure(login_failure_message(&e));
            }
        };

        if !envelope.success {
            info!(error = envelope.error_message(), "Login rejected");
            return envelope;
        }

        match envelope.data {
            Some(ref data) => {
                if let Err(e) = self.store.save(&data.token, &data.user) {
                    warn!(error = %e, "Failed to save session");
                    return ApiEnvelope::failure(format!("Could not save session: {}", e));
                }
                info!(user_id = data.user.id, "Login successful");
            }
            None => warn!("Login succeeded without session data, session left unchanged"),
        }

        envelope
    }

    /// Notify the API and end the local session.
    ///
    /// The session is cleared whatever happens to the remote call, and no
    /// error is reported.
    pub async fn logout(&self) {
        let _op = self.op_lock.lock().await;
        let _clear = ClearOnDrop(self.store.as_ref());

        let Some(token) = self.store.token() else {
            debug!("No stored token, clearing local session only");
            return;
        };

        // The outcome is observed for logging and then dropped on purpose
        match self.api.with_token(token).logout().await {
            Ok(envelope) if envelope.success => debug!("Remote logout acknowledged"),
            Ok(envelope) => {
                debug!(error = envelope.error_message(), "Remote logout rejected, ignoring")
            }
            Err(e) => debug!(error = %e, "Remote logout failed, ignoring"),
        }

        info!("Logged out");
    }

    /// Re-fetch the signed-in user's profile and replace the stored user.
    ///
    /// A 401 means the server no longer accepts the token, so the session
    /// is cleared.
    pub async fn refresh_user(&self) -> ApiEnvelope<User> {
        let _op = self.op_lock.lock().await;

        let Some(token) = self.store.token() else {
            return ApiEnvelope::failure(ApiError::NotAuthenticated.user_message());
        };

        match self.api.with_token(token.clone()).me().await {
            Ok(user) => {
                if let Err(e) = self.store.save(&token, &user) {
                    warn!(error = %e, "Failed to store refreshed user");
                }
                ApiEnvelope::ok(user)
            }
            Err(ApiError::Unauthorized) => {
                info!("Token rejected by server, clearing session");
                self.store.clear();
                ApiEnvelope::failure(ApiError::Unauthorized.user_message())
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh user");
                ApiEnvelope::failure(e.user_message())
            }
        }
    }
}

/// Best-effort message for a login that never produced an envelope
fn login_failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => "Invalid email or password".to_string(),
        ApiError::InvalidResponse(_) => LOGIN_FAILED_MESSAGE.to_string(),
        other => other.user_message(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::storage::{KeyValueStore, MemoryStore};
    use crate::auth::session::{Session, USER_KEY};

    type TestClient = AuthClient<Session<MemoryStore>>;

    fn ada() -> User {
        User {
            id: 1,
            email: "a@b.com".to_string(),
            full_name: "Ada".to_string(),
        }
    }

    fn auth_client(base_url: &str, timeout: Duration) -> TestClient {
        let api = ApiClient::new(base_url, timeout).unwrap();
        AuthClient::new(api, Arc::new(Session::new(MemoryStore::new())))
    }

    fn for_server(server: &MockServer) -> TestClient {
        auth_client(&server.uri(), Duration::from_secs(5))
    }

    async fn mount_login_success(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"token": "tok1", "user": {"id": 1, "email": "a@b.com", "tam_ad": "Ada"}}
            })))
            .mount(server)
            .await;
    }

    /// Nothing listens on port 1, so connections are refused
    const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

    // -------------------------------------------------------------------------
    // Login
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_success_saves_session() {
        let server = MockServer::start().await;
        mount_login_success(&server).await;
        let auth = for_server(&server);

        let envelope = auth.login("a@b.com", "pw").await;

        assert!(envelope.success);
        assert_eq!(
            envelope.data,
            Some(LoginData {
                token: "tok1".to_string(),
                user: ada()
            })
        );
        assert!(auth.is_authenticated());
        assert_eq!(auth.store().token().as_deref(), Some("tok1"));
        assert_eq!(auth.current_user().unwrap().full_name, "Ada");
        assert_eq!(auth.state(), AuthState::Authenticated(ada()));
    }

    #[tokio::test]
    async fn test_login_rejection_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "Invalid credentials"
            })))
            .mount(&server)
            .await;
        let auth = for_server(&server);

        let envelope = auth.login("a@b.com", "wrong").await;

        assert_eq!(envelope, ApiEnvelope::failure("Invalid credentials"));
        assert!(!auth.is_authenticated());
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_existing_session_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "success": false,
                "error": "Hesabınız aktif değil"
            })))
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.store().save("existing", &ada()).unwrap();

        let envelope = auth.login("other@b.com", "pw").await;

        assert!(!envelope.success);
        assert_eq!(envelope.error_message(), "Hesabınız aktif değil");
        assert_eq!(auth.store().token().as_deref(), Some("existing"));
        assert_eq!(auth.current_user(), Some(ada()));
    }

    #[tokio::test]
    async fn test_login_transport_failure_becomes_envelope() {
        let auth = auth_client(UNREACHABLE_URL, Duration::from_secs(5));

        let envelope = auth.login("a@b.com", "pw").await;

        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert!(envelope.error.is_some());
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_malformed_body_becomes_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        let auth = for_server(&server);

        let envelope = auth.login("a@b.com", "pw").await;

        assert_eq!(envelope.error_message(), LOGIN_FAILED_MESSAGE);
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_success_without_data_leaves_store_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;
        let auth = for_server(&server);

        let envelope = auth.login("a@b.com", "pw").await;

        assert!(envelope.success);
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_with_empty_token_is_not_saved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"token": "", "user": {"id": 1, "email": "a@b.com", "tam_ad": "Ada"}}
            })))
            .mount(&server)
            .await;
        let auth = for_server(&server);

        let envelope = auth.login("a@b.com", "pw").await;

        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert!(envelope.error_message().starts_with("Could not save session"));
        assert!(!auth.is_authenticated());
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_login_blank_credentials_skip_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let auth = for_server(&server);

        let envelope = auth.login("   ", "pw").await;
        assert_eq!(envelope.error_message(), MISSING_CREDENTIALS_MESSAGE);

        let envelope = auth.login("a@b.com", "").await;
        assert!(!envelope.success);
    }

    // -------------------------------------------------------------------------
    // Logout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_logout_notifies_server_and_clears() {
        let server = MockServer::start().await;
        mount_login_success(&server).await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Başarıyla çıkış yapıldı"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.login("a@b.com", "pw").await;

        auth.logout().await;

        assert!(!auth.is_authenticated());
        assert!(auth.current_user().is_none());
        assert_eq!(auth.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_logout_clears_when_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.store().save("tok1", &ada()).unwrap();

        auth.logout().await;

        assert!(!auth.is_authenticated());
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_when_server_rejects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "error": "Token süresi dolmuş"
            })))
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.store().save("tok1", &ada()).unwrap();

        auth.logout().await;

        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_when_network_unreachable() {
        let auth = auth_client(UNREACHABLE_URL, Duration::from_secs(5));
        auth.store().save("tok1", &ada()).unwrap();

        auth.logout().await;

        assert!(!auth.is_authenticated());
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_on_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        let auth = auth_client(&server.uri(), Duration::from_millis(200));
        auth.store().save("tok1", &ada()).unwrap();

        auth.logout().await;

        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_dropped_logout_still_clears() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.store().save("tok1", &ada()).unwrap();

        let abandoned = tokio::time::timeout(Duration::from_millis(200), auth.logout()).await;

        assert!(abandoned.is_err());
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_without_session_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let auth = for_server(&server);

        auth.logout().await;
        auth.logout().await;

        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_corrupted_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.store().save("tok1", &ada()).unwrap();
        auth.store().storage().set(USER_KEY, "{{{").unwrap();
        assert_eq!(auth.state(), AuthState::Anonymous);

        auth.logout().await;

        assert!(!auth.is_authenticated());
        assert!(auth.store().storage().get(USER_KEY).unwrap().is_none());
    }

    // -------------------------------------------------------------------------
    // Session-backed calls
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_authorized_api_requires_session() {
        let server = MockServer::start().await;
        let auth = for_server(&server);

        assert!(matches!(auth.authorized_api(), Err(ApiError::NotAuthenticated)));

        auth.store().save("tok1", &ada()).unwrap();
        assert!(auth.authorized_api().unwrap().has_token());
    }

    #[tokio::test]
    async fn test_authorized_clears_session_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/stats"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "error": "Token süresi dolmuş"
            })))
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.store().save("tok1", &ada()).unwrap();

        let result = auth
            .authorized(|api| async move { api.dashboard_stats().await })
            .await;

        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert!(!auth.is_authenticated());
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_authorized_keeps_session_replaced_during_request() {
        let auth = auth_client(UNREACHABLE_URL, Duration::from_secs(5));
        auth.store().save("tok1", &ada()).unwrap();
        let store = Arc::clone(auth.store());

        let result: ApiResult<()> = auth
            .authorized(|_api| async move {
                store.save("tok2", &ada()).unwrap();
                Err(ApiError::Unauthorized)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(auth.store().token().as_deref(), Some("tok2"));
    }

    #[tokio::test]
    async fn test_authorized_keeps_session_on_other_errors() {
        let auth = auth_client(UNREACHABLE_URL, Duration::from_secs(5));
        assert!(matches!(
            auth.authorized(|api| async move { api.me().await }).await,
            Err(ApiError::NotAuthenticated)
        ));

        auth.store().save("tok1", &ada()).unwrap();
        let result = auth.authorized(|api| async move { api.me().await }).await;

        assert!(matches!(result, Err(ApiError::NetworkError(_))));
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_user_replaces_stored_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 1, "email": "a@b.com", "tam_ad": "Ada Lovelace"}
            })))
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.store().save("tok1", &ada()).unwrap();

        let envelope = auth.refresh_user().await;

        assert!(envelope.success);
        assert_eq!(auth.current_user().unwrap().full_name, "Ada Lovelace");
        assert_eq!(auth.store().token().as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn test_refresh_user_clears_rejected_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "error": "Token geçersiz"
            })))
            .mount(&server)
            .await;
        let auth = for_server(&server);
        auth.store().save("tok1", &ada()).unwrap();

        let envelope = auth.refresh_user().await;

        assert!(!envelope.success);
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_user_keeps_session_on_network_error() {
        let auth = auth_client(UNREACHABLE_URL, Duration::from_secs(5));
        auth.store().save("tok1", &ada()).unwrap();

        let envelope = auth.refresh_user().await;

        assert!(!envelope.success);
        assert!(auth.is_authenticated());
        assert_eq!(auth.current_user(), Some(ada()));
    }

    #[tokio::test]
    async fn test_login_then_logout_in_sequence() {
        let server = MockServer::start().await;
        mount_login_success(&server).await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;
        let auth = for_server(&server);

        let (envelope, ()) = tokio::join!(auth.login("a@b.com", "pw"), async {
            tokio::task::yield_now().await;
            auth.logout().await
        });

        assert!(envelope.success);
        // Serialized: logout ran after the login and cleared its session
        assert!(!auth.is_authenticated());
    }
}
