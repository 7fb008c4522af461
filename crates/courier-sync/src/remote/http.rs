//! Reqwest-backed implementation of the delivery API.
//!
//! This adapter owns transport details only: URL construction, the bearer
//! token, timeout and HTTP error mapping, and JSON decoding.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{DeliveryApi, RemoteError};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::route::{DeliveryConfirmation, DeliveryPoint, LocationPing, Route};

/// Longest response body excerpt kept in a status error.
const BODY_PREVIEW_CHARS: usize = 160;

/// Body of the batch confirmation endpoint.
#[derive(Serialize)]
struct BatchRequest<'a> {
    confirmations: &'a [DeliveryConfirmation],
}

/// HTTP client for the courier backend.
#[derive(Debug)]
pub struct HttpDeliveryApi {
    client: Client,
    base_url: Url,
    auth_token: RwLock<Option<String>>,
}

impl HttpDeliveryApi {
    /// Build a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an absolute http(s) URL or the
    /// underlying client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidBaseUrl {
            url: base_url.to_string(),
            message: message.to_string(),
        };

        let parsed = Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(header::HeaderMap::from_iter([(
                header::ACCEPT,
                header::HeaderValue::from_static("application/json"),
            )]))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            auth_token: RwLock::new(None),
        })
    }

    /// Build a client from the API section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL is invalid or the client cannot
    /// be constructed.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let api = Self::new(&config.base_url, config.timeout())?;
        if let Some(token) = &config.auth_token {
            api.set_auth_token(token.clone());
        }
        Ok(api)
    }

    /// Attach `token` as a bearer token to every subsequent request.
    pub fn set_auth_token(&self, token: impl Into<String>) {
        *self
            .auth_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    /// Stop sending a bearer token.
    pub fn clear_auth_token(&self) {
        *self
            .auth_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The API root all endpoints hang off.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .auth_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, RemoteError> {
        debug!("GET {}", url);
        let body = self.send(self.client.get(url)).await?;
        serde_json::from_slice(&body).map_err(|e| RemoteError::decode(e.to_string()))
    }

    async fn post_json<B: Serialize + Sync + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> std::result::Result<(), RemoteError> {
        debug!("POST {}", url);
        self.send(self.client.post(url).json(body)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> std::result::Result<Vec<u8>, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DeliveryApi for HttpDeliveryApi {
    async fn fetch_current_route(&self, courier_id: &str) -> std::result::Result<Route, RemoteError> {
        self.get_json(self.endpoint(&["routes", courier_id, "current"]))
            .await
    }

    async fn confirm_delivery(
        &self,
        confirmation: &DeliveryConfirmation,
    ) -> std::result::Result<(), RemoteError> {
        self.post_json(self.endpoint(&["deliveries", "confirm"]), confirmation)
            .await
    }

    async fn confirm_batch(
        &self,
        confirmations: &[DeliveryConfirmation],
    ) -> std::result::Result<(), RemoteError> {
        self.post_json(
            self.endpoint(&["deliveries", "confirm", "batch"]),
            &BatchRequest { confirmations },
        )
        .await
    }

    async fn send_location(&self, ping: &LocationPing) -> std::result::Result<(), RemoteError> {
        self.post_json(self.endpoint(&["couriers", "location"]), ping)
            .await
    }

    async fn fetch_delivery_point(
        &self,
        point_id: &str,
    ) -> std::result::Result<DeliveryPoint, RemoteError> {
        self.get_json(self.endpoint(&["delivery-points", point_id]))
            .await
    }
}

fn map_transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout {
            message: error.to_string(),
        }
    } else if error.is_builder() {
        RemoteError::InvalidRequest {
            message: error.to_string(),
        }
    } else {
        RemoteError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteError {
    RemoteError::Status {
        status: status.as_u16(),
        body: body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if compact.chars().count() > BODY_PREVIEW_CHARS {
        let preview: String = compact.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{preview}...")
    } else {
        compact
    }
}
