//! The single seam between the auth client and the network.
//!
//! `AuthClient` only ever needs one request/response exchange at a time, so the
//! transport is deliberately small: send a request, get back the status and the
//! raw body. Body parsing stays in the client so every transport gets the same
//! error semantics.

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde_json::Value;
use tracing::debug;

use super::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer_token: Option<String>,
    pub json_body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            bearer_token: None,
            json_body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            bearer_token: None,
            json_body: Some(body),
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one exchange. Only transport-level failures are errors here;
    /// any HTTP status, including 4xx/5xx, comes back as a response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Production transport backed by `reqwest`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Reuse an existing client and its connection pool.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "Sending auth request");

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .header(header::ACCEPT, "application/json");

        if let Some(ref token) = request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.json_body {
            // .json() also sets Content-Type: application/json
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, bytes = body.len(), "Auth response received");
        Ok(HttpResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let req = HttpRequest::get("http://localhost:5000/api/auth/me").with_bearer("t1");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.bearer_token.as_deref(), Some("t1"));
        assert!(req.json_body.is_none());

        let req = HttpRequest::post_json("http://x/api/auth/login", json!({"email": "a@b.c"}));
        assert_eq!(req.method, Method::POST);
        assert!(req.bearer_token.is_none());
        assert_eq!(req.json_body, Some(json!({"email": "a@b.c"})));
    }

    #[test]
    fn test_response_is_success() {
        assert!(HttpResponse::new(200, "{}").is_success());
        assert!(HttpResponse::new(201, "{}").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
    }
}
