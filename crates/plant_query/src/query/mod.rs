//! Group addressing, the traversal engine and the public query facade.
pub mod group;
pub mod instance;
pub mod template;
pub(crate) mod traverse;
pub(crate) mod visit;

#[cfg(test)]
pub(crate) mod testing;

pub use group::{count_qualifying, group_count, groups, is_qualifying, resolve_group};
pub use instance::{PlantInstance, OFFSET_COMPONENTS, ORIENTATION_COMPONENTS, SCALE_COMPONENTS};
pub use template::PlantTemplate;
