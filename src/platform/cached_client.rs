//! Cached admin API client.

use color_eyre::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::cache::{QueryCache, QueryHandle};
use crate::config::Config;
use crate::error::{ApiError, ErrorKind};
use crate::resource::{params, Params};

use super::client::PlatformClient;
use super::resources::Resource;
use super::types::{Action, EnumCatalog, Organization, Skill, SkillCategory};

/// Admin API client with the query cache threaded through.
///
/// Methods mirror [`PlatformClient`] but return live [`QueryHandle`]
/// subscriptions: a fresh entry answers immediately without a fetch, a stale
/// one answers with last-known data while a single coalesced refetch runs.
/// The cache is passed in rather than owned so several clients (or tests)
/// can share one, and so its teardown stays in the caller's hands.
#[derive(Clone)]
pub struct CachedPlatformClient {
  inner: PlatformClient,
  cache: QueryCache,
  stale_time: Duration,
}

impl CachedPlatformClient {
  pub fn new(config: &Config, cache: QueryCache) -> Result<Self> {
    Ok(Self {
      inner: PlatformClient::new(config)?,
      cache,
      stale_time: Duration::from_millis(config.cache.stale_time_ms),
    })
  }

  /// The cache this client resolves through.
  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  fn resolve<T, F, Fut>(&self, resource: Resource, p: Params, fetcher: F) -> QueryHandle<T>
  where
    T: DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
  {
    self.cache.resolve(resource.key(&p), self.stale_time, fetcher)
  }

  pub fn enum_catalog(&self) -> QueryHandle<EnumCatalog> {
    let inner = self.inner.clone();
    self.resolve(Resource::EnumList, Params::new(), move || async move {
      encode(inner.enum_catalog().await?)
    })
  }

  pub fn skill_categories(&self) -> QueryHandle<Vec<SkillCategory>> {
    let inner = self.inner.clone();
    self.resolve(Resource::SkillCategories, Params::new(), move || async move {
      encode(inner.skill_categories().await?)
    })
  }

  /// Skills, optionally narrowed to one category. Each narrowing caches
  /// under its own key.
  pub fn skills(&self, category_id: Option<u64>) -> QueryHandle<Vec<Skill>> {
    let p = params([("skillCategoryId", category_id.map(|id| id.to_string()))]);
    let inner = self.inner.clone();
    self.resolve(Resource::Skills, p, move || async move {
      encode(inner.skills(category_id).await?)
    })
  }

  /// Actions belonging to one skill.
  pub fn actions(&self, skill_id: u64) -> QueryHandle<Vec<Action>> {
    let p = params([("skillId", Some(skill_id.to_string()))]);
    let inner = self.inner.clone();
    self.resolve(Resource::Actions, p, move || async move {
      encode(inner.actions(skill_id).await?)
    })
  }

  /// Organizations in simplified form, optionally filtered by name.
  pub fn organizations(&self, name: Option<&str>) -> QueryHandle<Vec<Organization>> {
    let p = params([("name", name.map(str::to_string))]);
    let name = name.map(str::to_string);
    let inner = self.inner.clone();
    self.resolve(Resource::Organizations, p, move || async move {
      encode(inner.organizations(name.as_deref()).await?)
    })
  }

  /// Invalidate every cached skill list (all category narrowings).
  pub fn invalidate_skills(&self) {
    self.cache.invalidate_resource(Resource::Skills.id());
  }

  /// Invalidate everything this client has cached.
  pub fn invalidate_all(&self) {
    self.cache.invalidate_where(|_| true);
  }
}

/// Serialize a fetched value into the cache's stored representation.
fn encode<T: Serialize>(data: T) -> Result<Value, ApiError> {
  serde_json::to_value(data)
    .map_err(|e| ApiError::new(ErrorKind::Parse, "failed to encode response for caching").with_cause(e))
}
