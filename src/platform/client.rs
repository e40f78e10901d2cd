//! Direct (uncached) client for the admin API.

use color_eyre::Result;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::ApiError;
use crate::provider::ProviderSet;
use crate::resource::{params, Params};

use super::api_types::{ApiAction, ApiEnumCatalog, ApiOrganization, ApiSkill, ApiSkillCategory};
use super::resources::Resource;
use super::types::{Action, EnumCatalog, Organization, Skill, SkillCategory};

/// Typed client for the admin API, one method per endpoint.
///
/// Each resource is served by the provider chosen for it at configuration
/// time — the real transport or the mock dataset — behind an identical
/// calling contract.
#[derive(Clone)]
pub struct PlatformClient {
  providers: ProviderSet,
}

impl PlatformClient {
  /// Validate the configuration and build the per-resource providers.
  pub fn new(config: &Config) -> Result<Self> {
    config.validate(&Resource::ids())?;
    let providers = ProviderSet::from_config(config, &Resource::descriptors())?;
    Ok(Self { providers })
  }

  async fn fetch<A>(&self, resource: Resource, params: &Params) -> Result<A, ApiError>
  where
    A: DeserializeOwned,
  {
    let descriptor = resource.descriptor();
    self.providers.provider(descriptor).get(descriptor, params).await
  }

  /// Enumeration catalog used to label scenario fields.
  pub async fn enum_catalog(&self) -> Result<EnumCatalog, ApiError> {
    let api: ApiEnumCatalog = self.fetch(Resource::EnumList, &Params::new()).await?;
    Ok(api.into())
  }

  pub async fn skill_categories(&self) -> Result<Vec<SkillCategory>, ApiError> {
    let api: Vec<ApiSkillCategory> = self.fetch(Resource::SkillCategories, &Params::new()).await?;
    Ok(api.into_iter().map(Into::into).collect())
  }

  /// Skills, optionally narrowed to one category.
  pub async fn skills(&self, category_id: Option<u64>) -> Result<Vec<Skill>, ApiError> {
    let p = params([("skillCategoryId", category_id.map(|id| id.to_string()))]);
    let api: Vec<ApiSkill> = self.fetch(Resource::Skills, &p).await?;
    Ok(api.into_iter().map(Into::into).collect())
  }

  /// Actions belonging to one skill. The endpoint requires the skill id.
  pub async fn actions(&self, skill_id: u64) -> Result<Vec<Action>, ApiError> {
    let p = params([("skillId", Some(skill_id.to_string()))]);
    let api: Vec<ApiAction> = self.fetch(Resource::Actions, &p).await?;
    Ok(api.into_iter().map(Into::into).collect())
  }

  /// Organizations in simplified form, optionally filtered by a
  /// case-insensitive name substring.
  pub async fn organizations(&self, name: Option<&str>) -> Result<Vec<Organization>, ApiError> {
    let p = params([("name", name.map(str::to_string))]);
    let api: Vec<ApiOrganization> = self.fetch(Resource::Organizations, &p).await?;
    Ok(api.into_iter().map(Into::into).collect())
  }
}
