#![forbid(unsafe_code)]
//! plant_query: Deterministic instance queries over hierarchical plant templates.
//!
//! Modules:
//! - model: the read-only template tree and the stem/branching contracts it is built from
//! - query: group addressing, the depth-first traversal engine and the template/instance facade
//! - layout: destination descriptors for separate, interleaved and per-group vertex buffers
//! - builtin: tube and quad stems, fixed and random branching
//! - rng: the seeded stream threaded through a traversal
//!
//! For examples, see the `plant_query_examples` crate.
pub mod builtin;
pub mod error;
pub mod layout;
pub mod model;
pub mod query;
pub mod rng;

/// Convenient re-exports for common types. Import with `use plant_query::prelude::*;`.
pub mod prelude {
    pub use crate::builtin::{FixedBranching, QuadStem, RandomBranching, TubeStem};
    pub use crate::error::{Error, Result};
    pub use crate::layout::{AttrTarget, VAttrBufferSet, VAttrBuffers, VAttrFormat};
    pub use crate::model::{
        Aabb, AttrKind, BranchModel, BranchingAlg, BranchingFactory, IndexBuffer, IndexTopology, MaterialDef,
        ModelFlags, ModelMetaInfo, PlantModel, PrimitiveType, StemInstance, StemModel, VisRange, ATTR_COUNT,
    };
    pub use crate::query::{PlantInstance, PlantTemplate};
}
