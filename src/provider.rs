//! Per-resource selection between the real transport and mock datasets.
//!
//! The strategy for each resource is fixed when the provider set is built
//! from configuration; call sites never branch on mock-vs-real. Moving a
//! resource from the mock column to the real one is a configuration change,
//! not a code change.

use color_eyre::Result;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::Config;
use crate::error::ApiError;
use crate::mock::MockProvider;
use crate::resource::{Params, ResourceDescriptor};
use crate::transport::TransportClient;

/// Strategy for one resource, chosen at configuration time.
#[derive(Clone)]
pub enum Provider {
  /// Delegate to the real HTTP transport.
  Real(TransportClient),
  /// Serve the canned in-memory dataset.
  Mock(MockProvider),
}

impl Provider {
  /// Fetch and deserialize one response. Identical contract for both
  /// branches.
  pub async fn get<T>(&self, descriptor: &ResourceDescriptor, params: &Params) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
  {
    match self {
      Provider::Real(transport) => transport.get(descriptor, params).await,
      Provider::Mock(mock) => mock.get(descriptor, params).await,
    }
  }
}

/// The resolved provider for every known resource.
#[derive(Clone)]
pub struct ProviderSet {
  transport: TransportClient,
  providers: HashMap<&'static str, Provider>,
}

impl ProviderSet {
  /// Build the per-resource providers from configuration.
  ///
  /// Every descriptor gets the real transport unless its id is listed under
  /// `mock.resources`. Configuration validation has already rejected unknown
  /// ids in that list.
  pub fn from_config(config: &Config, descriptors: &[&'static ResourceDescriptor]) -> Result<Self> {
    let transport = TransportClient::new(&config.api)?;
    let mock = MockProvider::new(Duration::from_millis(config.mock.latency_ms));

    let providers = descriptors
      .iter()
      .map(|descriptor| {
        let provider = if config.mock.resources.contains(descriptor.id) {
          Provider::Mock(mock.clone())
        } else {
          Provider::Real(transport.clone())
        };
        (descriptor.id, provider)
      })
      .collect();

    Ok(Self { transport, providers })
  }

  /// Provider for a resource. Descriptors outside the configured table fall
  /// back to the real transport.
  pub fn provider(&self, descriptor: &ResourceDescriptor) -> Provider {
    self
      .providers
      .get(descriptor.id)
      .cloned()
      .unwrap_or_else(|| Provider::Real(self.transport.clone()))
  }
}
