//! Single quad stem for leaves and billboards.
use glam::{Mat4, Quat, Vec3};
use rand::Rng as RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::builtin::{parent_frame, write_topology};
use crate::error::{Error, Result};
use crate::model::{Aabb, AttrKind, IndexBuffer, IndexTopology, PrimitiveType, StemInstance, StemModel};
use crate::rng::rand01_or;

const CORNERS: [(f32, f32); 4] = [(-0.5, 0.0), (0.5, 0.0), (0.5, 1.0), (-0.5, 1.0)];

/// Quad of `width` x `length` in the local XY plane, growing along +Y, facing +Z.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct QuadStem {
    pub width: f32,
    pub length: f32,
    /// Rendered camera-facing; reported through the billboard size query.
    pub billboard: bool,
    /// Relative random uniform scale in `[0, 1)`.
    pub scale_variation: f32,
}

impl Default for QuadStem {
    fn default() -> Self {
        Self {
            width: 0.2,
            length: 0.3,
            billboard: false,
            scale_variation: 0.0,
        }
    }
}

impl QuadStem {
    pub fn new(width: f32, length: f32) -> Self {
        Self {
            width,
            length,
            ..Default::default()
        }
    }

    pub fn billboard(width: f32, length: f32) -> Self {
        Self::new(width, length).with_billboard(true)
    }

    pub fn with_billboard(mut self, billboard: bool) -> Self {
        self.billboard = billboard;
        self
    }

    pub fn with_scale_variation(mut self, scale_variation: f32) -> Self {
        self.scale_variation = scale_variation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width.is_nan() || self.length.is_nan() || self.width <= 0.0 || self.length <= 0.0 {
            return Err(Error::Other("quad width and length must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.scale_variation) {
            return Err(Error::Other("scale_variation must be in [0, 1)".into()));
        }
        Ok(())
    }
}

impl StemModel for QuadStem {
    fn create_instance(
        &self,
        rng: Option<&mut dyn RngCore>,
        parent: Option<&dyn StemInstance>,
        offset: Vec3,
        orientation: Quat,
    ) -> Box<dyn StemInstance + '_> {
        let r = rand01_or(rng, 0.5);
        Box::new(QuadInstance {
            model: self,
            world: parent_frame(parent) * Mat4::from_rotation_translation(orientation, offset),
            scale: 1.0 + self.scale_variation * (2.0 * r - 1.0),
        })
    }

    fn vattr_count(&self, _attr: AttrKind) -> usize {
        4
    }

    fn vattr_count_i(&self) -> usize {
        4
    }

    fn primitive_count(&self) -> usize {
        1
    }

    fn primitive_type(&self, _primitive: usize) -> PrimitiveType {
        PrimitiveType::Quad
    }

    fn index_count(&self, topology: IndexTopology) -> usize {
        match topology {
            IndexTopology::TriangleList => 6,
            IndexTopology::QuadList => 4,
        }
    }

    fn fill_index_buffer(&self, dst: &mut IndexBuffer<'_>, topology: IndexTopology, index_base: u32) {
        write_topology(dst, 0, topology, &[0, 1, 2, 3], index_base);
    }

    fn fill_vattr_index_buffer(
        &self,
        dst: &mut IndexBuffer<'_>,
        _attr: AttrKind,
        topology: IndexTopology,
        index_base: u32,
    ) {
        write_topology(dst, 0, topology, &[0, 1, 2, 3], index_base);
    }

    fn fill_clone_vattr_buffer(&self, dst: &mut [f32], attr: AttrKind) {
        let clone = QuadInstance {
            model: self,
            world: Mat4::IDENTITY,
            scale: 1.0,
        };
        let n = attr.components();
        for (i, chunk) in dst.chunks_exact_mut(n).take(4).enumerate() {
            chunk.copy_from_slice(&clone.vattr_value(attr, i)[..n]);
        }
    }

    fn fill_clone_vattr_buffer_i(&self, dst: &mut [u8], offset: usize, stride: usize, attr: AttrKind) {
        let clone = QuadInstance {
            model: self,
            world: Mat4::IDENTITY,
            scale: 1.0,
        };
        let size = attr.byte_size();
        for i in 0..4 {
            let start = offset + i * stride;
            let value = clone.vattr_value_i(attr, i);
            if let Some(out) = dst.get_mut(start..start + size) {
                out.copy_from_slice(bytemuck::cast_slice(&value[..attr.components()]));
            }
        }
    }

    fn is_cloneable(&self, allow_scaling: bool) -> bool {
        allow_scaling || self.scale_variation == 0.0
    }

    fn billboard_size(&self) -> Option<(f32, f32)> {
        self.billboard.then_some((self.width, self.length))
    }
}

struct QuadInstance<'m> {
    model: &'m QuadStem,
    world: Mat4,
    scale: f32,
}

impl QuadInstance<'_> {
    fn local_corner(&self, index: usize) -> Vec3 {
        let (x, y) = CORNERS[index % 4];
        Vec3::new(x * self.model.width, y * self.model.length, 0.0) * self.scale
    }
}

impl StemInstance for QuadInstance<'_> {
    fn world_transform(&self) -> Mat4 {
        self.world
    }

    fn scale(&self) -> f32 {
        self.scale
    }

    fn length(&self) -> f32 {
        self.model.length * self.scale
    }

    fn bound_box(&self) -> Aabb {
        Aabb::from_points((0..4).map(|i| self.world.transform_point3(self.local_corner(i))))
    }

    fn vattr_count(&self, _attr: AttrKind) -> usize {
        4
    }

    fn vattr_value(&self, attr: AttrKind, index: usize) -> [f32; 3] {
        match attr {
            AttrKind::Vertex => self.world.transform_point3(self.local_corner(index)).to_array(),
            AttrKind::Normal => self.world.transform_vector3(Vec3::Z).normalize_or_zero().to_array(),
            AttrKind::TexCoord0 => {
                let (u, v) = CORNERS[index % 4];
                [u + 0.5, v, 0.0]
            }
            AttrKind::Tangent => self.world.transform_vector3(Vec3::X).normalize_or_zero().to_array(),
            AttrKind::Binormal => self.world.transform_vector3(Vec3::Y).normalize_or_zero().to_array(),
            AttrKind::BillboardPos => {
                let center = Vec3::Y * (0.5 * self.model.length * self.scale);
                self.world.transform_point3(center).to_array()
            }
        }
    }

    fn vattr_count_i(&self) -> usize {
        4
    }

    fn vattr_value_i(&self, attr: AttrKind, index: usize) -> [f32; 3] {
        self.vattr_value(attr, index)
    }
}
