//! Canned datasets served in place of endpoints the server does not
//! implement yet.
//!
//! A mocked resource goes through the same descriptor validation as a real
//! one, waits an artificial latency, and filters its dataset the way the
//! eventual endpoint is expected to: `name` parameters match as a
//! case-insensitive substring, id-like parameters match exactly. Flipping a
//! resource to the real transport later changes nothing for callers.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{ApiError, ErrorKind};
use crate::resource::{Params, ResourceDescriptor};

/// Serves fixed in-memory datasets with simulated latency.
#[derive(Debug, Clone)]
pub struct MockProvider {
  latency: Duration,
}

impl MockProvider {
  pub fn new(latency: Duration) -> Self {
    Self { latency }
  }

  /// Same contract as [`TransportClient::get`](crate::transport::TransportClient::get).
  pub async fn get<T>(&self, descriptor: &ResourceDescriptor, params: &Params) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
  {
    let resolved = descriptor.resolve(params)?;

    sleep(self.latency).await;

    let data = dataset(descriptor.id).ok_or_else(|| {
      ApiError::new(
        ErrorKind::Unknown,
        format!("no mock dataset for resource `{}`", descriptor.id),
      )
    })?;

    let filtered = apply_query(data, &resolved.query);
    debug!(resource = descriptor.id, "served mock response");

    serde_json::from_value(filtered)
      .map_err(|e| ApiError::new(ErrorKind::Parse, descriptor.fallback_message).with_cause(e))
  }
}

/// Filter a list dataset the way the real endpoint would. Non-list datasets
/// pass through untouched.
fn apply_query(data: Value, query: &[(String, String)]) -> Value {
  let Value::Array(items) = data else {
    return data;
  };

  let filtered = items
    .into_iter()
    .filter(|item| query.iter().all(|(name, wanted)| matches(item, name, wanted)))
    .collect();

  Value::Array(filtered)
}

fn matches(item: &Value, param: &str, wanted: &str) -> bool {
  if param == "name" {
    return item
      .get("name")
      .and_then(Value::as_str)
      .map(|name| name.to_lowercase().contains(&wanted.to_lowercase()))
      .unwrap_or(false);
  }

  match item.get(param) {
    Some(Value::Number(n)) => n.to_string() == wanted,
    Some(Value::String(s)) => s == wanted,
    _ => false,
  }
}

/// The canned dataset for one resource, in the wire shape the real endpoint
/// would produce.
fn dataset(resource: &str) -> Option<Value> {
  match resource {
    "enum.list" => Some(json!({
      "difficulty": ["Easy", "Normal", "Hard"],
      "scenarioStatus": ["Draft", "Published", "Archived"],
      "sessionMode": ["Solo", "Team", "Instructor-led"],
    })),
    "skill.category.list" => Some(json!([
      { "id": 1, "name": "Communication" },
      { "id": 2, "name": "Decision Making" },
      { "id": 3, "name": "Technical Operation" },
    ])),
    "skill.list" => Some(json!([
      { "id": 11, "skillCategoryId": 1, "name": "Radio Procedure" },
      { "id": 12, "skillCategoryId": 1, "name": "Incident Briefing" },
      { "id": 21, "skillCategoryId": 2, "name": "Triage Prioritization" },
      { "id": 22, "skillCategoryId": 2, "name": "Resource Allocation" },
      { "id": 31, "skillCategoryId": 3, "name": "Console Diagnostics" },
    ])),
    "action.list" => Some(json!([
      { "id": 101, "skillId": 11, "name": "Open the net" },
      { "id": 102, "skillId": 11, "name": "Acknowledge message" },
      { "id": 103, "skillId": 21, "name": "Tag casualty" },
    ])),
    "org.simple" => Some(json!([
      { "id": 1, "name": "Headquarters" },
      { "id": 2, "name": "Field Training Center" },
      { "id": 3, "name": "Simulation Lab West" },
      { "id": 4, "name": "Simulation Lab East" },
    ])),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::resources::Resource;
  use crate::resource::params;

  fn provider() -> MockProvider {
    MockProvider::new(Duration::ZERO)
  }

  #[tokio::test]
  async fn name_filter_is_case_insensitive_substring() {
    let p = params([("name", Some("lab".into()))]);
    let orgs: Value = provider()
      .get(Resource::Organizations.descriptor(), &p)
      .await
      .unwrap();

    let names: Vec<&str> = orgs
      .as_array()
      .unwrap()
      .iter()
      .filter_map(|o| o.get("name").and_then(Value::as_str))
      .collect();
    assert_eq!(names, vec!["Simulation Lab West", "Simulation Lab East"]);
  }

  #[tokio::test]
  async fn id_parameters_filter_by_equality() {
    let p = params([("skillCategoryId", Some("2".into()))]);
    let skills: Value = provider().get(Resource::Skills.descriptor(), &p).await.unwrap();
    assert_eq!(skills.as_array().unwrap().len(), 2);

    let p = params([("skillId", Some("11".into()))]);
    let actions: Value = provider().get(Resource::Actions.descriptor(), &p).await.unwrap();
    assert_eq!(actions.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn map_shaped_dataset_passes_through() {
    let catalog: Value = provider()
      .get(Resource::EnumList.descriptor(), &Params::new())
      .await
      .unwrap();
    assert!(catalog.get("difficulty").is_some());
  }

  #[tokio::test]
  async fn required_parameter_is_enforced_before_serving() {
    let err = provider()
      .get::<Value>(Resource::Actions.descriptor(), &Params::new())
      .await
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
    assert!(err.message.contains("skillId"));
  }
}
