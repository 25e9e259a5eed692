use gotour_core::{ApiError, ApiResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app_config::ApiConfig;
use crate::session::Session;

/// The one HTTP client every facade goes through.
///
/// Attaches the session's bearer token and clears the session on 401.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<Session>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn from_config(config: &ApiConfig, session: Arc<Session>) -> ApiResult<Self> {
        Self::new(&config.base_url, config.timeout(), session)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.client.request(method, url)
    }

    pub async fn get(&self, path: &str) -> ApiResult<Value> {
        self.execute(self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ApiResult<Value> {
        self.execute(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        self.execute(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    /// Non-2xx responses become typed errors
    async fn execute(&self, request: RequestBuilder) -> ApiResult<Value> {
        let (status, body) = self.send(request).await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(status_error(status, &body))
        }
    }

    /// Send and hand back any status with its body. Only 401 and transport
    /// failures are errors here.
    pub async fn send(&self, request: RequestBuilder) -> ApiResult<(StatusCode, Value)> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(ApiError::Unauthorized);
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        if bytes.is_empty() {
            return Ok((status, Value::Null));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => Ok((status, body)),
            Err(e) if status.is_success() => {
                warn!("Malformed JSON body: {}", e);
                Err(ApiError::Malformed(e.to_string()))
            }
            // Error pages are often HTML; the status alone is enough
            Err(_) => Ok((status, Value::Null)),
        }
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        warn!("Request timed out: {}", err);
        ApiError::Timeout
    } else {
        warn!("Network error: {}", err);
        ApiError::Network(err.to_string())
    }
}

/// Message the backend attached to an error body, if any
pub fn backend_message(body: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn status_error(status: StatusCode, body: &Value) -> ApiError {
    let message = backend_message(body);
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message.unwrap_or_else(|| "resource".to_string())),
        s if s.is_server_error() => ApiError::Server(s.as_u16()),
        s => ApiError::Validation {
            status: s.as_u16(),
            message: message.unwrap_or_else(|| {
                s.canonical_reason().unwrap_or("Request rejected").to_string()
            }),
        },
    }
}
