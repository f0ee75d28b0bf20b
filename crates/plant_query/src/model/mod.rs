//! Read-only contracts of the plant template: the branch tree, stem geometry generators
//! and branching algorithms, plus the value types they exchange with the query engine.
pub mod attr;
pub mod bounds;
pub mod branching;
pub mod stem;
pub mod tree;

pub use attr::{AttrKind, IndexBuffer, IndexTopology, PrimitiveType, ATTR_COUNT};
pub use bounds::Aabb;
pub use branching::{BranchingAlg, BranchingFactory};
pub use stem::{StemInstance, StemModel};
pub use tree::{BranchModel, MaterialDef, ModelFlags, ModelMetaInfo, PlantModel, VisRange};
