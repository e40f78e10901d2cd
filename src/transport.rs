//! Real HTTP transport for the platform API.

use color_eyre::{eyre::eyre, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{classify_request_error, classify_status, ApiError, ErrorKind};
use crate::resource::{Params, ResourceDescriptor};

/// Stateless HTTP client for the platform API.
///
/// One call performs exactly one round trip; there is no retry or caching at
/// this layer. The client may be cloned and invoked concurrently without
/// coordination — de-duplication of identical requests is the query cache's
/// job.
#[derive(Clone)]
pub struct TransportClient {
  http: Client,
  base: Url,
}

impl TransportClient {
  /// Build a transport from the API configuration.
  ///
  /// An unparseable base URL or an unbuildable client are startup errors,
  /// not request-time failures.
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let mut base = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid api.base_url `{}`: {}", config.base_url, e))?;

    // Url::join treats a base without a trailing slash as a file, dropping
    // the last segment.
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = Client::builder()
      .timeout(Duration::from_millis(config.timeout_ms))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  /// Issue one request for `descriptor` and deserialize the response body.
  ///
  /// Every failure path resolves to a classified [`ApiError`]; no raw
  /// transport error escapes.
  pub async fn get<T>(&self, descriptor: &ResourceDescriptor, params: &Params) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
  {
    let fallback = descriptor.fallback_message;
    let resolved = descriptor.resolve(params)?;

    let url = self
      .base
      .join(resolved.path.trim_start_matches('/'))
      .map_err(|e| {
        ApiError::new(
          ErrorKind::Unknown,
          format!("{}: could not build request URL", descriptor.id),
        )
        .with_cause(e)
      })?;

    debug!(resource = descriptor.id, %url, "sending request");

    let response = self
      .http
      .request(descriptor.method.into(), url)
      .query(&resolved.query)
      .send()
      .await
      .map_err(|e| {
        warn!(resource = descriptor.id, error = %e, "transport failure");
        classify_request_error(e, fallback)
      })?;

    let status = response.status();
    let body = response
      .bytes()
      .await
      .map_err(|e| classify_request_error(e, fallback))?;

    if !status.is_success() {
      warn!(resource = descriptor.id, status = status.as_u16(), "error response");
      return Err(classify_status(status.as_u16(), &body, fallback));
    }

    serde_json::from_slice(&body).map_err(|e| ApiError::new(ErrorKind::Parse, fallback).with_cause(e))
  }
}
