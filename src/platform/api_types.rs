//! Serde-deserializable types matching the admin API's wire format.
//!
//! These types are separate from domain types so wire quirks — camelCase
//! foreign keys, endpoints that say `title` where others say `name` — stay
//! at the boundary.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::types::{Action, EnumCatalog, Organization, Skill, SkillCategory};

#[derive(Debug, Deserialize)]
pub struct ApiSkillCategory {
  pub id: u64,
  #[serde(alias = "title")]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiSkill {
  pub id: u64,
  #[serde(rename = "skillCategoryId", default)]
  pub skill_category_id: Option<u64>,
  #[serde(alias = "title")]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiAction {
  pub id: u64,
  #[serde(rename = "skillId", default)]
  pub skill_id: Option<u64>,
  #[serde(alias = "title")]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiOrganization {
  pub id: u64,
  pub name: String,
}

/// Wire shape of `/enum`: category name to ordered labels.
#[derive(Debug, Deserialize)]
pub struct ApiEnumCatalog(pub BTreeMap<String, Vec<String>>);

impl From<ApiSkillCategory> for SkillCategory {
  fn from(api: ApiSkillCategory) -> Self {
    Self {
      id: api.id,
      name: api.name,
    }
  }
}

impl From<ApiSkill> for Skill {
  fn from(api: ApiSkill) -> Self {
    Self {
      id: api.id,
      category_id: api.skill_category_id,
      name: api.name,
    }
  }
}

impl From<ApiAction> for Action {
  fn from(api: ApiAction) -> Self {
    Self {
      id: api.id,
      skill_id: api.skill_id,
      name: api.name,
    }
  }
}

impl From<ApiOrganization> for Organization {
  fn from(api: ApiOrganization) -> Self {
    Self {
      id: api.id,
      name: api.name,
    }
  }
}

impl From<ApiEnumCatalog> for EnumCatalog {
  fn from(api: ApiEnumCatalog) -> Self {
    Self(api.0)
  }
}
