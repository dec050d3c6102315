//! HTTP client for the telemetry server, plus the [`VitalsApi`] seam the
//! sync engine is written against.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use vitalsync_model::{PredictionPayload, TelemetryColumns};

use crate::error::{SyncError, SyncResult};

/// The server operations the sync engine depends on.
///
/// [`ApiClient`] is the production implementation; tests script their own.
#[async_trait]
pub trait VitalsApi: Send + Sync {
    /// Authenticate and return the access token. Does not install it.
    async fn login(&self, username: &str, password: &str) -> SyncResult<String>;

    /// Install or clear the bearer token used by subsequent fetches.
    async fn set_token(&self, token: Option<String>);

    /// `GET /data` — columnar telemetry payload.
    async fn fetch_telemetry(&self) -> SyncResult<TelemetryColumns>;

    /// `GET /prediction` — efficiency prediction payload.
    async fn fetch_prediction(&self) -> SyncResult<PredictionPayload>;

    /// `GET /plot` — rendered graph image bytes.
    async fn fetch_plot(&self) -> SyncResult<Vec<u8>>;
}

/// API client with authentication support
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token_store: Arc<RwLock<Option<String>>>,
}

#[derive(serde::Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(serde::Deserialize)]
struct LoginResponse {
    access_token: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        log::info!("[ApiClient] Creating new API client with base URL: {}", base_url);

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_store: Arc::new(RwLock::new(None)),
        }
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request with authentication headers
    async fn build_request(&self, builder: RequestBuilder) -> RequestBuilder {
        if let Some(token) = self.token_store.read().await.as_ref() {
            builder.header("Authorization", format!("Bearer {}", token))
        } else {
            builder
        }
    }

    /// Execute a request and decode a JSON body
    async fn execute_request<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> SyncResult<T> {
        let response = self.execute_raw(request).await?;
        Ok(response.json().await?)
    }

    /// Execute a request and handle common errors
    async fn execute_raw(&self, request: RequestBuilder) -> SyncResult<Response> {
        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => Ok(response),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(SyncError::Network(format!(
                    "request failed with status {}: {}",
                    status, error_text
                )))
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        let url = self.build_url(path);
        log::debug!("[ApiClient] GET request to: {}", url);
        let request = self.client.get(&url);
        let request = self.build_request(request).await;
        self.execute_request(request).await
    }
}

#[async_trait]
impl VitalsApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> SyncResult<String> {
        let url = self.build_url("login");
        let body = LoginRequest { username, password };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Auth(format!(
                "login failed with status {}",
                response.status()
            )));
        }

        let payload: LoginResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Auth(format!("malformed login response: {e}")))?;
        Ok(payload.access_token)
    }

    async fn set_token(&self, token: Option<String>) {
        *self.token_store.write().await = token;
    }

    async fn fetch_telemetry(&self) -> SyncResult<TelemetryColumns> {
        self.get("data").await
    }

    async fn fetch_prediction(&self) -> SyncResult<PredictionPayload> {
        self.get("prediction").await
    }

    async fn fetch_plot(&self) -> SyncResult<Vec<u8>> {
        let url = self.build_url("plot");
        log::debug!("[ApiClient] GET request to: {}", url);
        let request = self.client.get(&url);
        let request = self.build_request(request).await;
        let response = self.execute_raw(request).await?;

        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(SyncError::Decode(
                "plot response is not an image payload".to_string(),
            ));
        }

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(SyncError::Decode("plot response is empty".to_string()));
        }
        Ok(bytes)
    }
}
