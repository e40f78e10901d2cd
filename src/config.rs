//! Configuration for the data layer.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub mock: MockConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base URL of the admin API.
  pub base_url: String,
  /// Per-request ceiling enforced by the transport.
  pub timeout_ms: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080/api/".to_string(),
      timeout_ms: 10_000,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// How long a completed fetch counts as fresh.
  pub stale_time_ms: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { stale_time_ms: 600_000 }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockConfig {
  /// Resource ids served from canned datasets instead of the network
  /// (case-insensitive).
  #[serde(deserialize_with = "deserialize_lowercase_set")]
  pub resources: BTreeSet<String>,
  /// Artificial latency applied to mock responses.
  pub latency_ms: u64,
}

impl Default for MockConfig {
  fn default() -> Self {
    Self {
      resources: BTreeSet::from(["org.simple".to_string()]),
      latency_ms: 150,
    }
  }
}

fn deserialize_lowercase_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let v: Vec<String> = Vec::deserialize(deserializer)?;
  Ok(v.into_iter().map(|s| s.to_lowercase()).collect())
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./simadm.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/simadm/config.yaml
  /// 4. ~/.config/simadm/config.yaml
  ///
  /// Falls back to defaults when no file exists and no explicit path was
  /// given.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("simadm.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("simadm").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Validate startup invariants.
  ///
  /// A malformed base URL, a zero timeout, or a mock entry naming no known
  /// resource are deployment errors surfaced here rather than as runtime
  /// failures.
  pub fn validate(&self, known_resources: &[&str]) -> Result<()> {
    Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url `{}`: {}", self.api.base_url, e))?;

    if self.api.timeout_ms == 0 {
      return Err(eyre!("api.timeout_ms must be positive"));
    }

    for id in &self.mock.resources {
      if !known_resources.contains(&id.as_str()) {
        return Err(eyre!(
          "mock.resources entry `{}` does not name a known resource (known: {})",
          id,
          known_resources.join(", ")
        ));
      }
    }

    Ok(())
  }
}
