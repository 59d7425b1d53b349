// HTTP transport - the only place that touches the network
//
// The session store builds `HttpRequest`s and hands them to a transport.
// Production uses reqwest; tests swap in a scripted transport so the managers
// can be driven without a backend.

use super::error::ClientError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Request body variants the backend understands
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// `application/json`
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
}

/// A fully resolved request (absolute URL, credentials already attached)
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Bearer token, sent as `Authorization: Bearer <token>`
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Value of the `Authorization` header this request will carry
    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(|t| format!("Bearer {}", t))
    }
}

/// Status and raw body of a completed exchange
#[derive(Debug, Clone)]
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

    /// Parse the body into a wire type
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// The backend's `detail` field, if the body is JSON and carries one
    pub fn detail(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        match value.get("detail")? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            // FastAPI validation errors come back as a list of objects
            serde_json::Value::Array(items) => items
                .iter()
                .find_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string),
            _ => None,
        }
    }

    /// Turn a non-2xx response into a `ClientError::Request`
    pub fn into_request_error(self) -> ClientError {
        let message = self
            .detail()
            .unwrap_or_else(|| super::error::GENERIC_REQUEST_FAILURE.to_string());
        ClientError::Request {
            status: self.status,
            message,
        }
    }
}

/// Anything that can carry an `HttpRequest` to the backend
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform the exchange. Only failures to complete the request are errors;
    /// non-2xx responses come back as `Ok`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lawpilot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(ACCEPT, "application/json");

        if let Some(auth) = request.authorization() {
            builder = builder.header(AUTHORIZATION, auth);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        tracing::debug!("{} {}", request.method, request.url);

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!("{} {} -> {}", request.method, request.url, status);

        Ok(HttpResponse::new(status, body))
    }
}
