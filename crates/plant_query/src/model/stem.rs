//! Stem geometry contracts.
//!
//! A [`StemModel`] is the template-level geometry generator attached to a branch node. For
//! every branch the traversal produces, it creates one transient [`StemInstance`] placed in
//! the parent's frame. The instance lives exactly as long as the traversal frame that
//! created it: it is handed by reference to the active visitor and to the children's
//! branching algorithms, then dropped.
//!
//! Attribute values come in two flavours. The plain accessors (`vattr_count`,
//! `vattr_value`) index each attribute independently, so positions and texture
//! coordinates may have different counts. The `_i` accessors use one unified vertex
//! index in which every attribute has exactly one value per vertex, which is the layout
//! used for interleaved and instanced buffers.
use glam::{Mat4, Quat, Vec3};
use rand::Rng as RngCore;

use crate::model::{Aabb, AttrKind, IndexBuffer, IndexTopology, PrimitiveType};

/// Template-level stem geometry generator.
pub trait StemModel: Send + Sync {
    /// Creates the instance for one generated branch. `offset` and `orientation` are
    /// relative to `parent`'s frame, or to the plant origin when there is no parent.
    /// With `rng == None` the result must be fully deterministic.
    fn create_instance(
        &self,
        rng: Option<&mut dyn RngCore>,
        parent: Option<&dyn StemInstance>,
        offset: Vec3,
        orientation: Quat,
    ) -> Box<dyn StemInstance + '_>;

    /// Per-instance value count of `attr` (independent indexing).
    fn vattr_count(&self, attr: AttrKind) -> usize;

    /// Per-instance vertex count in unified indexing.
    fn vattr_count_i(&self) -> usize;

    fn primitive_count(&self) -> usize;

    fn primitive_type(&self, primitive: usize) -> PrimitiveType;

    /// Number of indices [`StemModel::fill_index_buffer`] writes for `topology`.
    fn index_count(&self, topology: IndexTopology) -> usize;

    /// Writes unified-vertex indices (offset by `index_base`) for one instance.
    fn fill_index_buffer(&self, dst: &mut IndexBuffer<'_>, topology: IndexTopology, index_base: u32);

    /// Writes per-attribute indices (offset by `index_base`) for one instance.
    fn fill_vattr_index_buffer(
        &self,
        dst: &mut IndexBuffer<'_>,
        attr: AttrKind,
        topology: IndexTopology,
        index_base: u32,
    );

    /// Writes `vattr_count(attr)` tightly packed values of an untransformed copy.
    fn fill_clone_vattr_buffer(&self, dst: &mut [f32], attr: AttrKind);

    /// Writes `vattr_count_i()` values of an untransformed copy, the first one at byte
    /// `offset` and each following one `stride` bytes further.
    fn fill_clone_vattr_buffer_i(&self, dst: &mut [u8], offset: usize, stride: usize, attr: AttrKind);

    /// Whether every instance is a rigid transform of the clone geometry.
    fn is_cloneable(&self, _allow_scaling: bool) -> bool {
        false
    }

    /// `(width, height)` for billboard quads, `None` for any other stem.
    fn billboard_size(&self) -> Option<(f32, f32)> {
        None
    }
}

/// One concrete realisation of a [`StemModel`] for a single traversal visit.
pub trait StemInstance {
    /// Instance-to-world transform.
    fn world_transform(&self) -> Mat4;

    fn scale(&self) -> f32;

    /// Length along the stem's local axis, used by branching algorithms to place children.
    fn length(&self) -> f32 {
        0.0
    }

    fn bound_box(&self) -> Aabb;

    fn vattr_count(&self, attr: AttrKind) -> usize;

    /// World-space value; only the first `attr.components()` entries are meaningful.
    fn vattr_value(&self, attr: AttrKind, index: usize) -> [f32; 3];

    fn vattr_count_i(&self) -> usize;

    /// World-space value in unified indexing.
    fn vattr_value_i(&self, attr: AttrKind, index: usize) -> [f32; 3];
}
