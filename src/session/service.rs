//! Session Service
//!
//! Owns the authenticated-user state. The current user is published on a
//! watch channel so screens can observe login and logout without polling.

use reqwest::Client;
use std::sync::Arc;
use tokio::sync::watch;

use super::error::{SessionError, SessionResult};
use super::store::TokenStore;
use super::token::{self, TokenPayload};
use crate::api::schema::{LoginEnvelope, LoginRequest, LOGIN_SUCCESS};
use crate::shell::{Navigator, Route};

/// What the server said about a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Token stored, user published
    Authenticated { user: String },
    /// The server answered but refused; state is untouched
    Rejected { status_code: i64, message: String },
}

pub struct SessionService {
    http: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    current_user: watch::Sender<Option<String>>,
}

impl SessionService {
    /// Create the service and restore any still-valid stored session.
    ///
    /// An expired stored token is cleared on the spot, which also sends the
    /// client to `/login`.
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (current_user, _) = watch::channel(None);
        let service = Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            navigator,
            current_user,
        };
        service.restore();
        service
    }

    fn restore(&self) {
        let Some(stored) = self.store.read() else {
            return;
        };

        match token::decode(&stored) {
            Some(payload) if !payload.is_expired() => {
                tracing::info!(user = ?payload.sub, "Restored session");
                self.current_user.send_replace(payload.sub);
            }
            _ => {
                tracing::info!("Stored token expired or unreadable, logging out");
                self.logout();
            }
        }
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, identifier: &str, secret: &str) -> SessionResult<LoginOutcome> {
        let url = format!("{}/login", self.base_url);
        let body = LoginRequest {
            username: identifier,
            password: secret,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::Authentication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Login request failed");
            return Err(SessionError::Authentication(format!(
                "login returned HTTP {}",
                status
            )));
        }

        let envelope: LoginEnvelope = response
            .json()
            .await
            .map_err(|e| SessionError::Authentication(format!("unreadable login response: {}", e)))?;

        if envelope.status_code != LOGIN_SUCCESS {
            let message = envelope.int_data.message.unwrap_or_default();
            tracing::info!(status_code = envelope.status_code, %message, "Login rejected");
            return Ok(LoginOutcome::Rejected {
                status_code: envelope.status_code,
                message,
            });
        }

        let token = envelope
            .int_data
            .token
            .ok_or_else(|| SessionError::Authentication("login response carried no token".into()))?;

        self.store.save(&token)?;
        self.current_user.send_replace(Some(identifier.to_string()));
        tracing::info!(user = identifier, "Logged in");

        Ok(LoginOutcome::Authenticated {
            user: identifier.to_string(),
        })
    }

    /// Drop the session and go to `/login`. Safe to call any number of times.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!("Failed to clear stored token: {}", e);
        }
        self.current_user.send_replace(None);
        tracing::info!("Logged out");
        self.navigator.navigate(Route::Login);
    }

    /// True only with a stored, decodable, unexpired token.
    pub fn is_authenticated(&self) -> bool {
        match self.store.read() {
            None => false,
            Some(stored) => !token::is_token_expired(token::decode(&stored).as_ref()),
        }
    }

    /// Raw stored token, if any
    pub fn token(&self) -> Option<String> {
        self.store.read()
    }

    pub fn decode(token: &str) -> Option<TokenPayload> {
        token::decode(token)
    }

    pub fn current_user(&self) -> Option<String> {
        self.current_user.borrow().clone()
    }

    /// Watch the current user change
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.current_user.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::MemoryTokenStore;
    use crate::session::token::testing::{expired_token, live_token};
    use crate::shell::Router;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_with(
        base_url: &str,
        store: Arc<MemoryTokenStore>,
    ) -> (SessionService, Arc<Router>) {
        let router = Arc::new(Router::new());
        let service = SessionService::new(Client::new(), base_url, store, router.clone());
        (service, router)
    }

    #[tokio::test]
    async fn test_login_success_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(serde_json::json!({"username": "ana", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 200,
                "intData": {"token": "a.b.c", "message": "ok"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let (service, _) = service_with(&server.uri(), store.clone());
        let mut users = service.subscribe();

        let outcome = service.login("ana", "pw").await.unwrap();

        assert_eq!(outcome, LoginOutcome::Authenticated { user: "ana".into() });
        assert_eq!(store.read().as_deref(), Some("a.b.c"));
        assert_eq!(service.current_user().as_deref(), Some("ana"));
        users.changed().await.unwrap();
        assert_eq!(users.borrow().as_deref(), Some("ana"));
    }

    #[tokio::test]
    async fn test_login_rejected_leaves_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 401,
                "intData": {"message": "Credenciales inválidas"}
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let (service, _) = service_with(&server.uri(), store.clone());

        let outcome = service.login("ana", "wrong").await.unwrap();

        assert_eq!(
            outcome,
            LoginOutcome::Rejected {
                status_code: 401,
                message: "Credenciales inválidas".into()
            }
        );
        assert_eq!(store.read(), None);
        assert_eq!(service.current_user(), None);
    }

    #[tokio::test]
    async fn test_login_http_error_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (service, _) = service_with(&server.uri(), Arc::new(MemoryTokenStore::new()));
        let err = service.login("ana", "pw").await.unwrap_err();
        assert!(matches!(err, SessionError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_login_network_failure_is_authentication_error() {
        // Nothing listens on port 9 of localhost
        let (service, _) = service_with("http://127.0.0.1:9", Arc::new(MemoryTokenStore::new()));
        let err = service.login("ana", "pw").await.unwrap_err();
        assert!(matches!(err, SessionError::Authentication(_)));
        assert_eq!(service.current_user(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_is_idempotent() {
        let store = Arc::new(MemoryTokenStore::with_token(&live_token("ana")));
        let (service, router) = service_with("http://unused", store.clone());
        assert_eq!(service.current_user().as_deref(), Some("ana"));

        service.logout();
        assert_eq!(store.read(), None);
        assert_eq!(service.current_user(), None);
        assert_eq!(router.current(), Route::Login);

        service.logout();
        assert_eq!(store.read(), None);
        assert_eq!(router.current(), Route::Login);
    }

    #[test]
    fn test_restore_live_session() {
        let store = Arc::new(MemoryTokenStore::with_token(&live_token("luis")));
        let (service, router) = service_with("http://unused", store);

        assert!(service.is_authenticated());
        assert_eq!(service.current_user().as_deref(), Some("luis"));
        assert!(router.history().is_empty());
    }

    #[test]
    fn test_expired_session_cleans_itself() {
        let store = Arc::new(MemoryTokenStore::with_token(&expired_token("luis")));
        let (service, router) = service_with("http://unused", store.clone());

        assert!(!service.is_authenticated());
        assert_eq!(service.current_user(), None);
        assert_eq!(store.read(), None);
        assert_eq!(router.current(), Route::Login);
    }

    #[test]
    fn test_malformed_token_is_not_authenticated() {
        let store = Arc::new(MemoryTokenStore::new());
        let (service, _) = service_with("http://unused", store.clone());

        assert!(!service.is_authenticated());
        store.save("a.b.c").unwrap();
        assert!(!service.is_authenticated());
        assert!(SessionService::decode("a.b.c").is_none());
        store.save(&live_token("ana")).unwrap();
        assert!(service.is_authenticated());
    }
}
