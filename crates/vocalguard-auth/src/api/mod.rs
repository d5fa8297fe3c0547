//! HTTP client module for the VocalGuard auth API.
//!
//! This module provides the `AuthClient` for the signup, login, Google login
//! and current-user endpoints, the `HttpTransport` seam it sends requests
//! through, and the `ApiError` taxonomy every failure is reported with.
//!
//! Authenticated requests use a JWT bearer token issued by the login endpoints.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{AuthClient, AuthPayload};
pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
