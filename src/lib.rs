//! Client-side data layer for a training-simulation admin console.
//!
//! The crate issues typed requests against the platform's admin REST API,
//! normalizes failures into a closed error taxonomy, and caches responses
//! in memory with time-based staleness, request coalescing, and
//! subscription-based delivery. Endpoints the server does not implement yet
//! are served from canned datasets, selected per resource in configuration,
//! without changing the calling contract.
//!
//! # Example
//!
//! ```ignore
//! use simadm::{CachedPlatformClient, Config, QueryCache};
//!
//! let config = Config::load(None)?;
//! let cache = QueryCache::new();
//! let client = CachedPlatformClient::new(&config, cache.clone())?;
//!
//! // First access fetches; later accesses within the stale window answer
//! // from cache without touching the network.
//! let skills = client.skills(None).settled().await?;
//!
//! // Subscription-style consumption.
//! let mut handle = client.organizations(Some("lab"));
//! while handle.snapshot().is_loading {
//!     handle.changed().await;
//! }
//!
//! cache.teardown();
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod mock;
pub mod platform;
pub mod provider;
pub mod resource;
pub mod transport;

pub use cache::{EntryState, Freshness, QueryCache, QueryHandle, QuerySnapshot};
pub use config::Config;
pub use error::{ApiError, ErrorKind};
pub use platform::{CachedPlatformClient, PlatformClient, Resource};
pub use resource::{Params, RequestKey, ResourceDescriptor};
pub use transport::TransportClient;
