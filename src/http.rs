//! Thin wrapper over `reqwest` that joins endpoint paths onto the backend
//! base URL, attaches the session token and maps failures onto [`ApiError`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can hand out the current session token.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl ApiClient {
    /// `timeout` bounds every request end to end; a stalled backend comes back
    /// as [`ApiError::Transport`].
    pub fn new(
        base_url: impl Into<String>,
        tokens: Option<Arc<dyn TokenSource>>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.tokens.as_ref().and_then(|source| source.token()) {
            Some(token) => builder.header(AUTHORIZATION, format!("Token {}", token)),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: Option<&CancellationToken>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path).query(query);
        cancelable(cancel, async move { decode(send(request).await?).await }).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        cancelable(cancel, async move { decode(send(request).await?).await }).await
    }

    /// POST with no request body whose response payload is ignored.
    pub async fn post_empty(&self, path: &str, cancel: Option<&CancellationToken>) -> Result<(), ApiError> {
        let request = self.request(Method::POST, path);
        cancelable(cancel, async move { send(request).await.map(|_| ()) }).await
    }

    /// POST whose response payload, if any, is ignored.
    pub async fn post_discarding<B>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path).json(body);
        cancelable(cancel, async move { send(request).await.map(|_| ()) }).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, path).json(body);
        cancelable(cancel, async move { decode(send(request).await?).await }).await
    }

    pub async fn delete(&self, path: &str, cancel: Option<&CancellationToken>) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, path);
        cancelable(cancel, async move { send(request).await.map(|_| ()) }).await
    }
}

async fn cancelable<F, T>(cancel: Option<&CancellationToken>, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(ApiError::Canceled),
            res = fut => res,
        },
        None => fut.await,
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = error_detail(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });
    log::debug!("{} from backend: {}", status, detail);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized { detail }),
        _ => Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        }),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        // empty body decodes as JSON null
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pulls a human-readable message out of a backend error body:
/// `{"detail": "..."}` first, then the first message of a field error map.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
        return Some(detail.to_string());
    }
    value.as_object()?.iter().find_map(|(field, messages)| {
        let message = match messages {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => items.first().and_then(|m| m.as_str()).map(String::from),
            _ => None,
        }?;
        Some(format!("{}: {}", field, message))
    })
}
