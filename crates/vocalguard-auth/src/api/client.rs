//! API client for the VocalGuard authentication endpoints.
//!
//! This module provides the `AuthClient` struct, which turns each auth call into
//! one transport exchange and normalizes the response into either a parsed
//! payload or an [`ApiError`].

use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const SIGNUP_PATH: &str = "/api/auth/signup";
const LOGIN_PATH: &str = "/api/auth/login";
const GOOGLE_LOGIN_PATH: &str = "/api/auth/google";
const CURRENT_USER_PATH: &str = "/api/auth/me";

pub const SIGNUP_FAILED: &str = "Signup failed";
pub const LOGIN_FAILED: &str = "Login failed";
pub const GOOGLE_LOGIN_FAILED: &str = "Google login failed";
pub const FETCH_USER_FAILED: &str = "Failed to fetch user";

/// Successful signup/login body: the issued token and the user profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: Value,
}

#[derive(Debug, Deserialize)]
struct CurrentUserResponse {
    user: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<Value>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct GoogleCredential<'a> {
    credential: &'a str,
}

/// Client for the auth API. Clone is cheap; the transport is shared.
#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        let body = serde_json::to_value(Credentials { email, password })?;
        self.post_for_session(SIGNUP_PATH, body, SIGNUP_FAILED).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        let body = serde_json::to_value(Credentials { email, password })?;
        self.post_for_session(LOGIN_PATH, body, LOGIN_FAILED).await
    }

    pub async fn google_login(&self, credential: &str) -> Result<AuthPayload, ApiError> {
        let body = serde_json::to_value(GoogleCredential { credential })?;
        self.post_for_session(GOOGLE_LOGIN_PATH, body, GOOGLE_LOGIN_FAILED)
            .await
    }

    /// Fetch the profile for `token`. A 401 comes back as an error for which
    /// [`ApiError::is_unauthorized`] is true.
    pub async fn current_user(&self, token: &str) -> Result<Value, ApiError> {
        let request = HttpRequest::get(self.url(CURRENT_USER_PATH)).with_bearer(token);
        let response = self.transport.send(request).await?;
        let body: CurrentUserResponse = Self::parse_response(response, FETCH_USER_FAILED)?;
        Ok(body.user)
    }

    async fn post_for_session(
        &self,
        path: &str,
        body: Value,
        default_message: &str,
    ) -> Result<AuthPayload, ApiError> {
        let request = HttpRequest::post_json(self.url(path), body);
        let response = self.transport.send(request).await?;
        Self::parse_response(response, default_message)
    }

    /// Parse the body as JSON whatever the status, then either pull the
    /// `error` field out of a non-2xx body or decode the success payload.
    fn parse_response<T: DeserializeOwned>(
        response: HttpResponse,
        default_message: &str,
    ) -> Result<T, ApiError> {
        let status = response.status;
        let body: Value = serde_json::from_str(&response.body)?;

        if !response.is_success() {
            let body_error = Self::error_message(&body);
            debug!(status, has_message = body_error.is_some(), "Auth request rejected");
            return Err(ApiError::from_status(status, body_error, default_message));
        }

        Ok(serde_json::from_value(body)?)
    }

    /// The body's `error` field if it is a non-empty string.
    fn error_message(body: &Value) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_value(body.clone()).ok()?;
        match parsed.error? {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
