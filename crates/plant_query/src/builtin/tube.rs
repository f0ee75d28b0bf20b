//! Tapered tube stem along the local +Y axis.
use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};
use rand::Rng as RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::builtin::{parent_frame, write_topology};
use crate::error::{Error, Result};
use crate::model::{Aabb, AttrKind, IndexBuffer, IndexTopology, PrimitiveType, StemInstance, StemModel};
use crate::rng::rand01_or;

/// Tube made of `axis_segments` rings of quads, `sections` quads around.
///
/// Per-attribute indexing stores one value per ring vertex, except texture coordinates,
/// which duplicate the seam column. The unified (`_i`) indexing duplicates the seam for
/// every attribute.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TubeStem {
    pub length: f32,
    pub radius: f32,
    pub tip_radius: f32,
    pub axis_segments: u32,
    pub sections: u32,
    /// Relative random length change in `[0, 1)`; `0` makes every instance identical.
    pub length_variation: f32,
}

impl Default for TubeStem {
    fn default() -> Self {
        Self {
            length: 1.0,
            radius: 0.1,
            tip_radius: 0.05,
            axis_segments: 1,
            sections: 4,
            length_variation: 0.0,
        }
    }
}

impl TubeStem {
    pub fn new(length: f32, radius: f32) -> Self {
        Self {
            length,
            radius,
            tip_radius: radius,
            ..Default::default()
        }
    }

    pub fn with_tip_radius(mut self, tip_radius: f32) -> Self {
        self.tip_radius = tip_radius;
        self
    }

    pub fn with_axis_segments(mut self, axis_segments: u32) -> Self {
        self.axis_segments = axis_segments;
        self
    }

    pub fn with_sections(mut self, sections: u32) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_length_variation(mut self, length_variation: f32) -> Self {
        self.length_variation = length_variation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.length.is_nan() || self.length <= 0.0 {
            return Err(Error::Other("tube length must be > 0".into()));
        }
        if self.radius < 0.0 || self.tip_radius < 0.0 {
            return Err(Error::Other("tube radii must be >= 0".into()));
        }
        if self.axis_segments == 0 {
            return Err(Error::Other("tube needs at least one axis segment".into()));
        }
        if self.sections < 3 {
            return Err(Error::Other("tube needs at least three sections".into()));
        }
        if !(0.0..1.0).contains(&self.length_variation) {
            return Err(Error::Other("length_variation must be in [0, 1)".into()));
        }
        Ok(())
    }

    fn rings(&self) -> usize {
        self.axis_segments as usize + 1
    }

    fn sections(&self) -> usize {
        self.sections as usize
    }

    fn quad_corners(&self, seg: usize, sec: usize, columns: usize, wrap: bool) -> [u32; 4] {
        let next = if wrap { (sec + 1) % columns } else { sec + 1 };
        let v00 = seg * columns + sec;
        let v01 = seg * columns + next;
        let v10 = (seg + 1) * columns + sec;
        let v11 = (seg + 1) * columns + next;
        [v00 as u32, v10 as u32, v11 as u32, v01 as u32]
    }

    fn write_indices(&self, dst: &mut IndexBuffer<'_>, topology: IndexTopology, index_base: u32, seam: bool) {
        let columns = if seam { self.sections() + 1 } else { self.sections() };
        let mut at = 0;
        for seg in 0..self.axis_segments as usize {
            for sec in 0..self.sections() {
                let quad = self.quad_corners(seg, sec, columns, !seam);
                at = write_topology(dst, at, topology, &quad, index_base);
            }
        }
    }

    fn geometry(&self, world: Mat4, length: f32) -> TubeGeometry<'_> {
        TubeGeometry {
            model: self,
            world,
            length,
        }
    }
}

impl StemModel for TubeStem {
    fn create_instance(
        &self,
        rng: Option<&mut dyn RngCore>,
        parent: Option<&dyn StemInstance>,
        offset: Vec3,
        orientation: Quat,
    ) -> Box<dyn StemInstance + '_> {
        let r = rand01_or(rng, 0.5);
        let length = self.length * (1.0 + self.length_variation * (2.0 * r - 1.0));
        let world = parent_frame(parent) * Mat4::from_rotation_translation(orientation, offset);
        Box::new(self.geometry(world, length))
    }

    fn vattr_count(&self, attr: AttrKind) -> usize {
        match attr {
            AttrKind::TexCoord0 => self.rings() * (self.sections() + 1),
            _ => self.rings() * self.sections(),
        }
    }

    fn vattr_count_i(&self) -> usize {
        self.rings() * (self.sections() + 1)
    }

    fn primitive_count(&self) -> usize {
        self.axis_segments as usize * self.sections()
    }

    fn primitive_type(&self, _primitive: usize) -> PrimitiveType {
        PrimitiveType::Quad
    }

    fn index_count(&self, topology: IndexTopology) -> usize {
        match topology {
            IndexTopology::TriangleList => self.primitive_count() * 6,
            IndexTopology::QuadList => self.primitive_count() * 4,
        }
    }

    fn fill_index_buffer(&self, dst: &mut IndexBuffer<'_>, topology: IndexTopology, index_base: u32) {
        self.write_indices(dst, topology, index_base, true);
    }

    fn fill_vattr_index_buffer(
        &self,
        dst: &mut IndexBuffer<'_>,
        attr: AttrKind,
        topology: IndexTopology,
        index_base: u32,
    ) {
        self.write_indices(dst, topology, index_base, attr == AttrKind::TexCoord0);
    }

    fn fill_clone_vattr_buffer(&self, dst: &mut [f32], attr: AttrKind) {
        let clone = self.geometry(Mat4::IDENTITY, self.length);
        let n = attr.components();
        for (i, chunk) in dst.chunks_exact_mut(n).take(self.vattr_count(attr)).enumerate() {
            chunk.copy_from_slice(&clone.vattr_value(attr, i)[..n]);
        }
    }

    fn fill_clone_vattr_buffer_i(&self, dst: &mut [u8], offset: usize, stride: usize, attr: AttrKind) {
        let clone = self.geometry(Mat4::IDENTITY, self.length);
        let size = attr.byte_size();
        for i in 0..self.vattr_count_i() {
            let start = offset + i * stride;
            let value = clone.vattr_value_i(attr, i);
            if let Some(out) = dst.get_mut(start..start + size) {
                out.copy_from_slice(bytemuck::cast_slice(&value[..attr.components()]));
            }
        }
    }

    fn is_cloneable(&self, _allow_scaling: bool) -> bool {
        self.length_variation == 0.0
    }
}

struct TubeGeometry<'m> {
    model: &'m TubeStem,
    world: Mat4,
    length: f32,
}

impl TubeGeometry<'_> {
    fn local_point(&self, ring: usize, column: usize) -> (Vec3, Vec3) {
        let segments = self.model.axis_segments.max(1) as f32;
        let t = ring as f32 / segments;
        let radius = self.model.radius + (self.model.tip_radius - self.model.radius) * t;
        let angle = column as f32 / self.model.sections.max(1) as f32 * TAU;
        let (sin, cos) = angle.sin_cos();
        let normal = Vec3::new(cos, 0.0, sin);
        (normal * radius + Vec3::Y * (t * self.length), normal)
    }

    fn value(&self, attr: AttrKind, ring: usize, column: usize) -> [f32; 3] {
        let (point, normal) = self.local_point(ring, column);
        match attr {
            AttrKind::Vertex => self.world.transform_point3(point).to_array(),
            AttrKind::Normal => self.world.transform_vector3(normal).normalize_or_zero().to_array(),
            AttrKind::TexCoord0 => {
                let u = column as f32 / self.model.sections.max(1) as f32;
                let v = ring as f32 / self.model.axis_segments.max(1) as f32;
                [u, v, 0.0]
            }
            AttrKind::Tangent => {
                let tangent = Vec3::new(-normal.z, 0.0, normal.x);
                self.world.transform_vector3(tangent).normalize_or_zero().to_array()
            }
            AttrKind::Binormal => self.world.transform_vector3(Vec3::Y).normalize_or_zero().to_array(),
            AttrKind::BillboardPos => self.world.transform_point3(Vec3::ZERO).to_array(),
        }
    }
}

impl StemInstance for TubeGeometry<'_> {
    fn world_transform(&self) -> Mat4 {
        self.world
    }

    fn scale(&self) -> f32 {
        1.0
    }

    fn length(&self) -> f32 {
        self.length
    }

    fn bound_box(&self) -> Aabb {
        Aabb::from_points((0..self.vattr_count_i()).map(|i| Vec3::from(self.vattr_value_i(AttrKind::Vertex, i))))
    }

    fn vattr_count(&self, attr: AttrKind) -> usize {
        self.model.vattr_count(attr)
    }

    fn vattr_value(&self, attr: AttrKind, index: usize) -> [f32; 3] {
        let columns = match attr {
            AttrKind::TexCoord0 => self.model.sections() + 1,
            _ => self.model.sections(),
        };
        self.value(attr, index / columns, index % columns)
    }

    fn vattr_count_i(&self) -> usize {
        self.model.vattr_count_i()
    }

    fn vattr_value_i(&self, attr: AttrKind, index: usize) -> [f32; 3] {
        let columns = self.model.sections() + 1;
        self.value(attr, index / columns, index % columns)
    }
}
