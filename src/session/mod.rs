//! Session store: bearer token, current user and authenticated requests
//!
//! The store is cheap to clone; every clone shares one session. Token and
//! user are written together under a single lock, so no observer can see a
//! user without a token or a confirmed session with its user missing.

mod token_store;

pub use token_store::{FileTokenStore, TokenStore};

#[cfg(test)]
pub use token_store::MemoryTokenStore;

use crate::api::wire::{self, RegisterBody, TokenResponse};
use crate::api::{
    join_url, ClientError, HttpRequest, HttpTransport, RequestBody, GENERIC_LOGIN_FAILURE,
};
use crate::model::UserProfile;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Session {
    /// A user is only present once the backend has confirmed the token
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Method and body for [`SessionStore::authenticated_request`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: RequestBody::Json(body),
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

struct Inner {
    api_url: String,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
    state: Mutex<Session>,
    /// Flips to true once the persisted-session check has settled
    ready: watch::Sender<bool>,
}

/// Shared handle to the authentication state
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Build a store. The persisted token (if any) is read here, once.
    pub fn new(
        api_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let token = tokens.load();
        let (ready, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                api_url: api_url.into(),
                transport,
                tokens,
                state: Mutex::new(Session { token, user: None }),
                ready,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, Session> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.inner.api_url, path)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    pub fn snapshot(&self) -> Session {
        self.state().clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// True until [`check_persisted_session`](Self::check_persisted_session) settles
    pub fn is_loading(&self) -> bool {
        !*self.inner.ready.borrow()
    }

    fn mark_ready(&self) {
        // Only the first transition notifies watchers
        self.inner.ready.send_if_modified(|ready| {
            let changed = !*ready;
            *ready = true;
            changed
        });
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Validate a token left over from a previous run against `/auth/me`.
    ///
    /// Any failure clears the token (persisted and in memory). Loading is
    /// marked complete whatever the outcome.
    pub async fn check_persisted_session(&self) {
        let token = self.state().token.clone();

        if let Some(token) = token {
            match self.fetch_identity(&token).await {
                Ok(user) => {
                    let mut state = self.state();
                    // A login may have replaced the token while we were waiting
                    if state.token.as_deref() == Some(token.as_str()) {
                        tracing::info!("Restored session for {}", user.display_name());
                        state.user = Some(user);
                    }
                }
                Err(e) => {
                    tracing::warn!("Persisted session rejected: {}", e);
                    self.forget_token(&token);
                }
            }
        } else {
            tracing::debug!("No persisted token");
        }

        self.mark_ready();
    }

    async fn fetch_identity(&self, token: &str) -> Result<UserProfile, ClientError> {
        let request = HttpRequest::new(Method::GET, self.url(wire::ME_PATH))
            .with_bearer(Some(token.to_string()));
        let response = self.inner.transport.send(request).await?;

        if !response.is_success() {
            return Err(ClientError::Auth(response.into_request_error().to_string()));
        }
        response.json()
    }

    /// Drop `token` if it is still the active one
    fn forget_token(&self, token: &str) {
        let mut state = self.state();
        if state.token.as_deref() != Some(token) {
            return;
        }
        if let Err(e) = self.inner.tokens.clear() {
            tracing::warn!("Failed to clear persisted token: {}", e);
        }
        *state = Session::default();
    }

    /// Exchange credentials for a token (form-encoded, OAuth2 password flow)
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = HttpRequest::new(Method::POST, self.url(wire::LOGIN_PATH))
            .with_body(RequestBody::Form(wire::login_form(email, password)));
        let response = self.inner.transport.send(request).await?;

        if !response.is_success() {
            let message = response
                .detail()
                .unwrap_or_else(|| GENERIC_LOGIN_FAILURE.to_string());
            tracing::info!("Login rejected ({}): {}", response.status, message);
            return Err(ClientError::Auth(message));
        }

        let body: TokenResponse = response.json()?;
        Ok(self.establish(body))
    }

    /// Create an account and sign in with it
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, ClientError> {
        let body = serde_json::to_value(RegisterBody {
            email,
            password,
            full_name: display_name,
        })?;
        let request = HttpRequest::new(Method::POST, self.url(wire::REGISTER_PATH))
            .with_body(RequestBody::Json(body));
        let response = self.inner.transport.send(request).await?;

        if !response.is_success() {
            let err = response.into_request_error();
            tracing::info!("Registration rejected: {}", err);
            return Err(ClientError::Auth(err.to_string()));
        }

        let body: TokenResponse = response.json()?;
        Ok(self.establish(body))
    }

    /// Persist and adopt a freshly issued token
    fn establish(&self, body: TokenResponse) -> Session {
        if let Err(e) = self.inner.tokens.save(&body.access_token) {
            // The in-memory session still works; it just won't survive a restart
            tracing::warn!("Failed to persist token: {}", e);
        }

        let mut state = self.state();
        *state = Session {
            token: Some(body.access_token),
            user: Some(body.user),
        };
        if let Some(user) = &state.user {
            tracing::info!("Signed in as {}", user.display_name());
        }
        state.clone()
    }

    /// Forget everything. Never fails.
    pub fn logout(&self) {
        let mut state = self.state();
        if let Err(e) = self.inner.tokens.clear() {
            tracing::warn!("Failed to clear persisted token: {}", e);
        }
        *state = Session::default();
        tracing::info!("Signed out");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Authenticated requests
    // ─────────────────────────────────────────────────────────────────────

    /// Call the backend with the current token (if any) and return its JSON.
    ///
    /// Non-2xx responses become [`ClientError::Request`] carrying the
    /// backend's `detail`, or "Request failed" when there is none.
    pub async fn authenticated_request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<serde_json::Value, ClientError> {
        let token = self.state().token.clone();
        let request = HttpRequest::new(options.method, self.url(path))
            .with_bearer(token)
            .with_body(options.body);

        let response = self.inner.transport.send(request).await?;
        if !response.is_success() {
            return Err(response.into_request_error());
        }
        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        response.json()
    }

    /// GET and deserialize
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let value = self.authenticated_request(path, RequestOptions::get()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST a JSON body and deserialize the reply
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = RequestOptions::post_json(serde_json::to_value(body)?);
        let value = self.authenticated_request(path, options).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockTransport, MOCK_BASE};
    use serde_json::json;

    fn store(transport: &Arc<MockTransport>, tokens: &Arc<MemoryTokenStore>) -> SessionStore {
        SessionStore::new(MOCK_BASE, transport.clone(), tokens.clone())
    }

    fn user_json() -> serde_json::Value {
        json!({"id": 1, "email": "asha@firm.in", "full_name": "Asha Rao"})
    }

    #[tokio::test]
    async fn test_check_restores_valid_token() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, "/auth/me", 200, user_json());
        let tokens = Arc::new(MemoryTokenStore::with_token("jwt"));
        let session = store(&transport, &tokens);

        assert!(session.is_loading());
        session.check_persisted_session().await;

        assert!(!session.is_loading());
        assert!(session.is_authenticated());
        assert_eq!(session.snapshot().token.as_deref(), Some("jwt"));

        let sent = transport.requests_to(Method::GET, "/auth/me");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].authorization().as_deref(), Some("Bearer jwt"));
    }

    #[tokio::test]
    async fn test_check_clears_rejected_token() {
        let transport = MockTransport::new();
        transport.reply(
            Method::GET,
            "/auth/me",
            401,
            json!({"detail": "Could not validate credentials"}),
        );
        let tokens = Arc::new(MemoryTokenStore::with_token("stale"));
        let session = store(&transport, &tokens);

        session.check_persisted_session().await;

        assert!(!session.is_loading());
        assert_eq!(session.snapshot(), Session::default());
        assert_eq!(tokens.load(), None);
    }

    #[tokio::test]
    async fn test_check_clears_token_on_network_failure() {
        let transport = MockTransport::new();
        transport.fail(
            Method::GET,
            "/auth/me",
            ClientError::Network("connection refused".into()),
        );
        let tokens = Arc::new(MemoryTokenStore::with_token("jwt"));
        let session = store(&transport, &tokens);

        session.check_persisted_session().await;

        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
        assert_eq!(tokens.load(), None);
    }

    #[tokio::test]
    async fn test_check_without_token_skips_backend() {
        let transport = MockTransport::new();
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = store(&transport, &tokens);

        session.check_persisted_session().await;

        assert!(!session.is_loading());
        assert!(transport.requests().is_empty());

        // Checking again is harmless and stays complete
        session.check_persisted_session().await;
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_login_success_persists_token() {
        let transport = MockTransport::new();
        transport.reply(
            Method::POST,
            "/auth/login",
            200,
            json!({"access_token": "jwt-new", "user": user_json()}),
        );
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = store(&transport, &tokens);

        let result = session.login("asha@firm.in", "hunter2").await.unwrap();

        assert_eq!(result.token.as_deref(), Some("jwt-new"));
        assert_eq!(result.user.as_ref().map(|u| u.email.as_str()), Some("asha@firm.in"));
        assert_eq!(tokens.load().as_deref(), Some("jwt-new"));
        assert!(session.is_authenticated());

        let sent = &transport.requests_to(Method::POST, "/auth/login")[0];
        assert_eq!(
            sent.body,
            RequestBody::Form(vec![
                ("username".to_string(), "asha@firm.in".to_string()),
                ("password".to_string(), "hunter2".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_login_rejected_leaves_state_untouched() {
        let transport = MockTransport::new();
        transport.reply(
            Method::POST,
            "/auth/login",
            401,
            json!({"detail": "Incorrect email or password"}),
        );
        transport.reply(Method::POST, "/auth/login", 401, json!({}));
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = store(&transport, &tokens);

        let err = session.login("a@b.in", "wrong").await.unwrap_err();
        assert_eq!(err, ClientError::Auth("Incorrect email or password".into()));

        let err = session.login("a@b.in", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Login failed");

        assert_eq!(session.snapshot(), Session::default());
        assert_eq!(tokens.load(), None);
    }

    #[tokio::test]
    async fn test_login_network_failure() {
        let transport = MockTransport::new();
        transport.fail(
            Method::POST,
            "/auth/login",
            ClientError::Network("offline".into()),
        );
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = store(&transport, &tokens);

        let err = session.login("a@b.in", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_sends_json() {
        let transport = MockTransport::new();
        transport.reply(
            Method::POST,
            "/auth/register",
            201,
            json!({"accessToken": "jwt-reg", "user": user_json()}),
        );
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = store(&transport, &tokens);

        session
            .register("asha@firm.in", "pw", "Asha Rao")
            .await
            .unwrap();

        let sent = &transport.requests_to(Method::POST, "/auth/register")[0];
        assert_eq!(
            sent.body,
            RequestBody::Json(json!({
                "email": "asha@firm.in",
                "password": "pw",
                "full_name": "Asha Rao"
            }))
        );
        assert_eq!(tokens.load().as_deref(), Some("jwt-reg"));
    }

    #[tokio::test]
    async fn test_register_conflict_is_auth_error() {
        let transport = MockTransport::new();
        transport.reply(
            Method::POST,
            "/auth/register",
            400,
            json!({"detail": "Email already registered"}),
        );
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = store(&transport, &tokens);

        let err = session.register("a@b.in", "pw", "A").await.unwrap_err();
        assert_eq!(err, ClientError::Auth("Email already registered".into()));
        assert_eq!(session.snapshot(), Session::default());
    }

    #[tokio::test]
    async fn test_logout_drops_bearer() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, "/auth/me", 200, user_json());
        transport.reply(Method::GET, "/chat/conversations", 200, json!([]));
        let tokens = Arc::new(MemoryTokenStore::with_token("jwt"));
        let session = store(&transport, &tokens);
        session.check_persisted_session().await;
        assert!(session.is_authenticated());

        session.logout();

        assert_eq!(session.snapshot(), Session::default());
        assert_eq!(tokens.load(), None);

        session
            .authenticated_request("/chat/conversations", RequestOptions::get())
            .await
            .unwrap();
        let sent = transport.requests_to(Method::GET, "/chat/conversations");
        assert_eq!(sent[0].authorization(), None);
    }

    #[tokio::test]
    async fn test_request_error_uses_backend_detail() {
        let transport = MockTransport::new();
        transport.reply(
            Method::GET,
            "/chat/conversations",
            401,
            json!({"detail": "Token expired"}),
        );
        let tokens = Arc::new(MemoryTokenStore::with_token("jwt"));
        let session = store(&transport, &tokens);

        let err = session
            .authenticated_request("/chat/conversations", RequestOptions::get())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Token expired");
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            transport.requests()[0].authorization().as_deref(),
            Some("Bearer jwt")
        );
    }

    #[tokio::test]
    async fn test_request_error_without_body() {
        let transport = MockTransport::new();
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = store(&transport, &tokens);

        // Unscripted routes answer 404 with a detail; script one without
        transport.reply(Method::GET, "/broken", 500, serde_json::Value::Null);
        let err = session
            .authenticated_request("/broken", RequestOptions::get())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed");
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let transport = MockTransport::new();
        transport.reply(
            Method::GET,
            "/chat/conversations",
            200,
            json!([{"id": "c1", "title": "NDA", "message_count": 2}]),
        );
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = store(&transport, &tokens);

        let list: Vec<crate::model::ConversationSummary> =
            session.get_json("/chat/conversations").await.unwrap();
        assert_eq!(list.len(), 1);

        // Shape mismatch is a decode error, not a request error
        transport.reply(Method::GET, "/chat/conversations", 200, json!({"oops": 1}));
        let err = session
            .get_json::<Vec<crate::model::ConversationSummary>>("/chat/conversations")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
