//! Transport adapter.
//!
//! Issues one HTTP request and reduces whatever comes back to a
//! [`NormalizedResult`]. HTTP error statuses and unparseable bodies are
//! data, not errors; only a request that could not complete at all is
//! returned as [`ClientError::Transport`].

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::errors::ClientError;
use crate::models::{DataEnvelope, ErrorBody};

/// HTTP methods the backup API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_reqwest().as_str())
    }
}

/// Response body after the parse attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Empty,
}

impl ResponseBody {
    /// Parse a raw body: empty stays empty, invalid JSON is kept as text.
    pub fn parse(text: String) -> Self {
        if text.is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Human-readable error text from an error body: the envelope's
    /// `message`, then `error`, then `error.message`.
    pub fn server_message(&self) -> Option<String> {
        let value = self.json()?;
        let as_text = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);
        serde_json::from_value::<ErrorBody>(value.clone())
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.is_empty())
            .or_else(|| value.get("error").and_then(as_text))
            .or_else(|| {
                value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(as_text)
            })
    }
}

/// The uniform outcome of one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    /// Transport completed and the status is 2xx
    pub succeeded: bool,
    pub status: u16,
    pub body: ResponseBody,
}

impl NormalizedResult {
    /// A result standing in for a request that was never sent.
    pub fn refused(reason: &str) -> Self {
        Self {
            succeeded: false,
            status: 400,
            body: ResponseBody::Json(serde_json::json!({ "error": reason })),
        }
    }

    /// Decode the `data` member of a success envelope.
    ///
    /// Returns `None` when the body is not JSON or does not have the
    /// expected shape.
    pub fn data<T: DeserializeOwned>(&self) -> Option<T> {
        let value = self.body.json()?.clone();
        match serde_json::from_value::<DataEnvelope<T>>(value) {
            Ok(envelope) => Some(envelope.data),
            Err(e) => {
                tracing::warn!("Unexpected response shape: {}", e);
                None
            }
        }
    }

    /// Convert a failed result into an application error.
    pub fn into_error(self) -> ClientError {
        ClientError::Application {
            status: self.status,
            message: self.body.server_message(),
        }
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Request executor the coordinator talks to.
pub trait Transport {
    /// Send one request. `path` is server-relative (e.g. `/api/v1/games`).
    fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
    ) -> impl Future<Output = Result<NormalizedResult, ClientError>> + Send;
}

/// Pick the override when it is non-blank, else the origin. One trailing
/// slash is removed so paths can be appended directly.
pub fn resolve_base_url(base_url_override: Option<&str>, origin: &str) -> String {
    let chosen = base_url_override
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(origin);
    chosen.strip_suffix('/').unwrap_or(chosen).to_string()
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    origin: String,
    base_url_override: RwLock<Option<String>>,
}

impl HttpTransport {
    /// No timeout is configured: each call is a single best-effort attempt.
    pub fn new(origin: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), origin)
    }

    pub fn with_client(client: reqwest::Client, origin: impl Into<String>) -> Self {
        Self {
            client,
            origin: origin.into(),
            base_url_override: RwLock::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let transport = Self::new(config.origin.clone());
        transport.set_base_url_override(config.base_url.clone());
        transport
    }

    /// Change the override; takes effect on the next call.
    pub fn set_base_url_override(&self, base_url: Option<String>) {
        *self
            .base_url_override
            .write()
            .unwrap_or_else(PoisonError::into_inner) = base_url;
    }

    pub fn base_url(&self) -> String {
        let guard = self
            .base_url_override
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        resolve_base_url(guard.as_deref(), &self.origin)
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
    ) -> Result<NormalizedResult, ClientError> {
        let url = format!("{}{}", self.base_url(), path);

        let mut request = self.client.request(method.as_reqwest(), &url);
        if let Some(body) = &payload {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!("{} {} -> {}", method, url, status.as_u16());

        Ok(NormalizedResult {
            succeeded: status.is_success(),
            status: status.as_u16(),
            body: ResponseBody::parse(text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        http::{header, HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn test_router() -> Router {
        Router::new()
            .route("/json", get(|| async { Json(json!({ "data": [1, 2] })) }))
            .route("/text", get(|| async { "plain words" }))
            .route("/empty", get(|| async { StatusCode::NO_CONTENT }))
            .route(
                "/missing",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "code": "not_found", "message": "game not found" })),
                    )
                }),
            )
            .route(
                "/echo",
                post(|headers: HeaderMap, body: String| async move {
                    let content_type = headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    Json(json!({ "content_type": content_type, "body": body }))
                }),
            )
    }

    #[test]
    fn test_resolve_base_url() {
        assert_eq!(
            resolve_base_url(None, "http://localhost:8080"),
            "http://localhost:8080"
        );
        assert_eq!(
            resolve_base_url(Some("  http://api.local:9000/ "), "http://localhost:8080"),
            "http://api.local:9000"
        );
        assert_eq!(
            resolve_base_url(Some("   "), "http://localhost:8080/"),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_body_parse_degrades() {
        assert_eq!(ResponseBody::parse(String::new()), ResponseBody::Empty);
        assert_eq!(
            ResponseBody::parse("<html>oops</html>".to_string()),
            ResponseBody::Text("<html>oops</html>".to_string())
        );
        assert_eq!(
            ResponseBody::parse("{\"ok\":true}".to_string()),
            ResponseBody::Json(json!({ "ok": true }))
        );
    }

    #[test]
    fn test_server_message_lookup_order() {
        let body = ResponseBody::Json(json!({ "message": "m", "error": "e" }));
        assert_eq!(body.server_message().as_deref(), Some("m"));
        let body = ResponseBody::Json(json!({ "error": "no fields to update" }));
        assert_eq!(body.server_message().as_deref(), Some("no fields to update"));
        let body = ResponseBody::Json(json!({ "error": { "message": "nested" } }));
        assert_eq!(body.server_message().as_deref(), Some("nested"));
        assert!(ResponseBody::Text("boom".to_string()).server_message().is_none());
    }

    #[tokio::test]
    async fn test_send_normalizes_bodies() {
        let base = serve(test_router()).await;
        let transport = HttpTransport::new(base);

        let res = transport.send(Method::Get, "/json", None).await.unwrap();
        assert!(res.succeeded);
        assert_eq!(res.status, 200);
        assert_eq!(res.data::<Vec<i64>>(), Some(vec![1, 2]));

        let res = transport.send(Method::Get, "/text", None).await.unwrap();
        assert!(res.succeeded);
        assert_eq!(res.body, ResponseBody::Text("plain words".to_string()));

        let res = transport.send(Method::Get, "/empty", None).await.unwrap();
        assert!(res.succeeded);
        assert_eq!(res.status, 204);
        assert_eq!(res.body, ResponseBody::Empty);

        let res = transport.send(Method::Get, "/missing", None).await.unwrap();
        assert!(!res.succeeded);
        assert_eq!(res.status, 404);
        assert_eq!(res.body.server_message().as_deref(), Some("game not found"));
    }

    #[tokio::test]
    async fn test_payload_is_sent_as_json() {
        let base = serve(test_router()).await;
        let transport = HttpTransport::new(base);

        let res = transport
            .send(Method::Post, "/echo", Some(json!({ "name": null })))
            .await
            .unwrap();
        let body = res.body.json().unwrap();
        assert_eq!(body["content_type"], "application/json");
        assert_eq!(body["body"], "{\"name\":null}");
    }

    #[tokio::test]
    async fn test_override_applies_per_call() {
        let base = serve(test_router()).await;
        let transport = HttpTransport::new("http://127.0.0.1:1");
        transport.set_base_url_override(Some(format!("{}/", base)));

        let res = transport.send(Method::Get, "/json", None).await.unwrap();
        assert!(res.succeeded);
        assert_eq!(transport.base_url(), base);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(format!("http://{}", addr));
        let err = transport.send(Method::Get, "/healthz", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
