//! Typed client surface for the training-platform admin API.

pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod resources;
pub mod types;

pub use cached_client::CachedPlatformClient;
pub use client::PlatformClient;
pub use resources::Resource;
pub use types::{Action, EnumCatalog, Organization, Skill, SkillCategory};
