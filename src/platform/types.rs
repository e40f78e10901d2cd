//! Domain types for the admin console.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A skill category grouping related skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
  pub id: u64,
  pub name: String,
}

/// A trainable skill, optionally assigned to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
  pub id: u64,
  pub category_id: Option<u64>,
  pub name: String,
}

/// A concrete action practiced within a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
  pub id: u64,
  pub skill_id: Option<u64>,
  pub name: String,
}

/// An organization in simplified form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
  pub id: u64,
  pub name: String,
}

/// Enumeration catalog: category name mapped to its labels in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumCatalog(pub BTreeMap<String, Vec<String>>);

impl EnumCatalog {
  /// Labels for one category, in display order.
  pub fn labels(&self, category: &str) -> Option<&[String]> {
    self.0.get(category).map(Vec::as_slice)
  }

  pub fn categories(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }
}
