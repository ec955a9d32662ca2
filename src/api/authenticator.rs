//! Request Authenticator
//!
//! Every data call goes through here. The stored token is attached as a
//! bearer header at request construction; a 401 ends the session before the
//! error is handed back.

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::error::{ClientError, ClientResult};
use crate::session::SessionService;

pub struct RequestAuthenticator {
    http: Client,
    session: Arc<SessionService>,
}

impl RequestAuthenticator {
    pub fn new(http: Client, session: Arc<SessionService>) -> Self {
        Self { http, session }
    }

    pub fn session(&self) -> &Arc<SessionService> {
        &self.session
    }

    /// Add the JSON content type and, with a stored token, the bearer header.
    pub fn authorize(&self, mut request: Request) -> Request {
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    tracing::warn!("Stored token is not a valid header value, sending without it");
                }
            }
        }

        request
    }

    /// Send an authorized request and classify the response status.
    pub async fn execute(&self, request: Request) -> ClientResult<Response> {
        let request = self.authorize(request);
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.http.execute(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, %url, "Authorization rejected, ending session");
            self.session.logout();
            return Err(ClientError::Unauthorized);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(%method, %url, status = status.as_u16(), "Request failed");
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ClientResult<T> {
        let request = self.http.get(url).build()?;
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get_bytes(&self, url: &str) -> ClientResult<Vec<u8>> {
        let request = self.http.get(url).build()?;
        let response = self.execute(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// POST a JSON body; the response body is ignored.
    pub async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> ClientResult<()> {
        let request = self.http.post(url).json(body).build()?;
        self.execute(request).await?;
        Ok(())
    }
}
