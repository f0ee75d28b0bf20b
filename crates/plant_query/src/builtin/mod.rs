//! Ready-made stem models and branching algorithms.
//!
//! These cover the common shapes of a simple plant (tapered tubes for trunks and branches,
//! flat or billboard quads for leaves) and two placement strategies. They are also the
//! fixtures the engine is tested and benchmarked with.
use glam::Mat4;

use crate::model::{IndexBuffer, IndexTopology, StemInstance};

pub mod branching;
pub mod quad;
pub mod tube;

pub use branching::{FixedBranching, RandomBranching};
pub use quad::QuadStem;
pub use tube::TubeStem;

/// World frame children are placed in.
pub(crate) fn parent_frame(parent: Option<&dyn StemInstance>) -> Mat4 {
    parent.map_or(Mat4::IDENTITY, |p| p.world_transform())
}

/// Writes one quad `[v00, v10, v11, v01]` at slot `at` and returns the next free slot.
/// Slots past the end of `dst` are skipped.
pub(crate) fn write_topology(
    dst: &mut IndexBuffer<'_>,
    at: usize,
    topology: IndexTopology,
    quad: &[u32; 4],
    index_base: u32,
) -> usize {
    let [a, b, c, d] = *quad;
    let triangles = [a, b, c, a, c, d];
    let quads = [a, b, c, d];
    let order: &[u32] = match topology {
        IndexTopology::TriangleList => &triangles,
        IndexTopology::QuadList => &quads,
    };
    for (i, v) in order.iter().enumerate() {
        if at + i < dst.len() {
            dst.set(at + i, index_base.saturating_add(*v));
        }
    }
    at + order.len()
}
