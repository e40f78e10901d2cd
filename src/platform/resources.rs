//! Static endpoint table for the admin API.

use crate::resource::{Method, ParamSpec, Params, RequestKey, ResourceDescriptor};

/// Logical endpoints of the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
  /// Enumeration catalog used to label scenario fields.
  EnumList,
  SkillCategories,
  Skills,
  Actions,
  /// Simplified organization list. Served from the mock dataset until the
  /// endpoint lands server-side.
  Organizations,
}

static ENUM_LIST: ResourceDescriptor = ResourceDescriptor {
  id: "enum.list",
  method: Method::Get,
  path: "/enum",
  params: &[],
  fallback_message: "Failed to load the enumeration catalog.",
};

static SKILL_CATEGORIES: ResourceDescriptor = ResourceDescriptor {
  id: "skill.category.list",
  method: Method::Get,
  path: "/skill/category/list",
  params: &[],
  fallback_message: "Failed to load skill categories.",
};

static SKILLS: ResourceDescriptor = ResourceDescriptor {
  id: "skill.list",
  method: Method::Get,
  path: "/skill/list",
  params: &[ParamSpec {
    name: "skillCategoryId",
    required: false,
  }],
  fallback_message: "Failed to load skills.",
};

static ACTIONS: ResourceDescriptor = ResourceDescriptor {
  id: "action.list",
  method: Method::Get,
  path: "/action/list",
  params: &[ParamSpec {
    name: "skillId",
    required: true,
  }],
  fallback_message: "Failed to load actions.",
};

static ORGANIZATIONS: ResourceDescriptor = ResourceDescriptor {
  id: "org.simple",
  method: Method::Get,
  path: "/organizations/simple",
  params: &[ParamSpec {
    name: "name",
    required: false,
  }],
  fallback_message: "Failed to load organizations.",
};

impl Resource {
  /// All resources, in table order.
  pub const ALL: [Resource; 5] = [
    Resource::EnumList,
    Resource::SkillCategories,
    Resource::Skills,
    Resource::Actions,
    Resource::Organizations,
  ];

  /// The static descriptor for this resource.
  pub fn descriptor(self) -> &'static ResourceDescriptor {
    match self {
      Resource::EnumList => &ENUM_LIST,
      Resource::SkillCategories => &SKILL_CATEGORIES,
      Resource::Skills => &SKILLS,
      Resource::Actions => &ACTIONS,
      Resource::Organizations => &ORGANIZATIONS,
    }
  }

  pub fn id(self) -> &'static str {
    self.descriptor().id
  }

  /// Cache key for this resource with the given parameters.
  pub fn key(self, params: &Params) -> RequestKey {
    self.descriptor().key(params)
  }

  /// Every descriptor, for provider construction and config validation.
  pub fn descriptors() -> [&'static ResourceDescriptor; 5] {
    Resource::ALL.map(Resource::descriptor)
  }

  /// Every resource id, for config validation.
  pub fn ids() -> [&'static str; 5] {
    Resource::ALL.map(Resource::id)
  }
}
