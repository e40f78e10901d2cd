//! Static endpoint contracts and request identity.
//!
//! A [`ResourceDescriptor`] describes one logical endpoint: verb, path
//! template, and declared parameter shape. Descriptors are defined once in a
//! static table and never change at runtime. Resolving a descriptor against
//! concrete parameters validates the shape *before any network activity* and
//! yields both the concrete request and the [`RequestKey`] the cache indexes
//! by.

use std::collections::BTreeMap;

use crate::error::{ApiError, ErrorKind};

/// Request verb for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
}

impl From<Method> for reqwest::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
    }
  }
}

/// One declared parameter of a resource.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
  pub name: &'static str,
  pub required: bool,
}

/// Immutable description of one logical endpoint, defined at process start.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
  /// Stable identifier; also the prefix of every request key ("skill.list").
  pub id: &'static str,
  pub method: Method,
  /// Path template relative to the API base; `{name}` segments are
  /// substituted from parameters.
  pub path: &'static str,
  pub params: &'static [ParamSpec],
  /// User-facing message when a failure for this resource carries no text.
  pub fallback_message: &'static str,
}

/// Parameter map. BTreeMap ordering makes composed keys independent of the
/// order call sites insert parameters in.
pub type Params = BTreeMap<String, String>;

/// Build a parameter map from optional values, skipping the absent ones.
pub fn params<const N: usize>(pairs: [(&str, Option<String>); N]) -> Params {
  pairs
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
    .collect()
}

/// A descriptor resolved against concrete parameters, ready to send.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
  /// Concrete path with template segments substituted.
  pub path: String,
  /// Parameters not consumed by the path, in key order.
  pub query: Vec<(String, String)>,
  pub key: RequestKey,
}

/// Deterministic identity of one resource + parameter combination.
///
/// Structurally equal parameter sets always produce equal keys; the resource
/// id is kept separate so whole families can be matched for invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
  resource: String,
  params: String,
}

impl RequestKey {
  fn compose(resource: &str, params: &Params) -> Self {
    let params = params
      .iter()
      .map(|(name, value)| format!("{name}={value}"))
      .collect::<Vec<_>>()
      .join("&");

    Self {
      resource: resource.to_string(),
      params,
    }
  }

  /// The resource family this key belongs to.
  pub fn resource(&self) -> &str {
    &self.resource
  }
}

impl std::fmt::Display for RequestKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.params.is_empty() {
      write!(f, "{}", self.resource)
    } else {
      write!(f, "{}?{}", self.resource, self.params)
    }
  }
}

impl ResourceDescriptor {
  /// Cache key for this resource with the given parameters.
  pub fn key(&self, params: &Params) -> RequestKey {
    RequestKey::compose(self.id, params)
  }

  /// Validate parameters and build the concrete request.
  ///
  /// Missing required parameters and undeclared parameters are rejected
  /// here, before the request can reach a provider.
  pub fn resolve(&self, params: &Params) -> Result<ResolvedRequest, ApiError> {
    for spec in self.params {
      if spec.required && !params.contains_key(spec.name) {
        return Err(ApiError::new(
          ErrorKind::Unknown,
          format!("{}: missing required parameter `{}`", self.id, spec.name),
        ));
      }
    }

    for name in params.keys() {
      if !self.params.iter().any(|spec| spec.name == name) {
        return Err(ApiError::new(
          ErrorKind::Unknown,
          format!("{}: unknown parameter `{}`", self.id, name),
        ));
      }
    }

    let mut path = String::from(self.path);
    let mut query = Vec::new();
    for (name, value) in params {
      let placeholder = format!("{{{name}}}");
      if path.contains(&placeholder) {
        path = path.replace(&placeholder, value);
      } else {
        query.push((name.clone(), value.clone()));
      }
    }

    Ok(ResolvedRequest {
      path,
      query,
      key: self.key(params),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const LIST: ResourceDescriptor = ResourceDescriptor {
    id: "scenario.list",
    method: Method::Get,
    path: "/scenario/list",
    params: &[
      ParamSpec { name: "ownerId", required: true },
      ParamSpec { name: "status", required: false },
    ],
    fallback_message: "Failed to load scenarios.",
  };

  const DETAIL: ResourceDescriptor = ResourceDescriptor {
    id: "scenario.detail",
    method: Method::Get,
    path: "/scenario/{scenarioId}",
    params: &[ParamSpec { name: "scenarioId", required: true }],
    fallback_message: "Failed to load the scenario.",
  };

  #[test]
  fn key_is_independent_of_insertion_order() {
    let mut forward = Params::new();
    forward.insert("ownerId".into(), "7".into());
    forward.insert("status".into(), "Published".into());

    let mut reverse = Params::new();
    reverse.insert("status".into(), "Published".into());
    reverse.insert("ownerId".into(), "7".into());

    assert_eq!(LIST.key(&forward), LIST.key(&reverse));
    assert_eq!(
      LIST.key(&forward).to_string(),
      "scenario.list?ownerId=7&status=Published"
    );
  }

  #[test]
  fn missing_required_parameter_is_rejected() {
    let err = LIST.resolve(&Params::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
    assert!(err.message.contains("ownerId"));
  }

  #[test]
  fn undeclared_parameter_is_rejected() {
    let p = params([("ownerId", Some("7".into())), ("color", Some("red".into()))]);
    let err = LIST.resolve(&p).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
    assert!(err.message.contains("color"));
  }

  #[test]
  fn template_segments_are_substituted() {
    let p = params([("scenarioId", Some("42".into()))]);
    let resolved = DETAIL.resolve(&p).unwrap();
    assert_eq!(resolved.path, "/scenario/42");
    assert!(resolved.query.is_empty());
  }

  #[test]
  fn unconsumed_parameters_become_query_pairs() {
    let p = params([("ownerId", Some("7".into())), ("status", None)]);
    let resolved = LIST.resolve(&p).unwrap();
    assert_eq!(resolved.path, "/scenario/list");
    assert_eq!(resolved.query, vec![("ownerId".to_string(), "7".to_string())]);
    assert_eq!(resolved.key.resource(), "scenario.list");
  }
}
