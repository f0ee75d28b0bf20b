//! Stateless, group-addressed queries over a shared plant model.
use std::sync::Arc;

use tracing::debug;

use crate::error::{ensure_capacity, Error, Result};
use crate::layout::VAttrBuffers;
use crate::model::{
    AttrKind, BranchModel, IndexBuffer, IndexTopology, MaterialDef, ModelMetaInfo, PlantModel, PrimitiveType,
    StemModel,
};
use crate::query::group::{group_count, groups, resolve_group};
use crate::query::instance::PlantInstance;

/// A plant model plus the dummies policy used to number its groups.
///
/// Every query here resolves the group index against the template tree and answers from
/// the node or its stem model alone; nothing is generated. Cloning is cheap: the model is
/// shared.
#[derive(Clone, Debug)]
pub struct PlantTemplate {
    model: Arc<PlantModel>,
    dummies_enabled: bool,
}

impl PlantTemplate {
    /// Wraps `model`; dummies start out disabled.
    pub fn new(model: PlantModel) -> Self {
        Self::from_shared(Arc::new(model))
    }

    pub fn from_shared(model: Arc<PlantModel>) -> Self {
        Self {
            model,
            dummies_enabled: false,
        }
    }

    pub fn model(&self) -> &PlantModel {
        &self.model
    }

    pub fn meta_info(&self) -> &ModelMetaInfo {
        &self.model.meta_info
    }

    /// Changes group numbering for this template and every instance created afterwards.
    pub fn set_dummies_enabled(&mut self, enabled: bool) {
        self.dummies_enabled = enabled;
    }

    pub fn dummies_enabled(&self) -> bool {
        self.dummies_enabled
    }

    pub fn group_count(&self) -> usize {
        group_count(self.model.plant_base(), self.dummies_enabled)
    }

    /// Group names in index order.
    pub fn group_names(&self) -> Vec<&str> {
        groups(self.model.plant_base(), self.dummies_enabled)
            .into_iter()
            .map(|node| node.name.as_str())
            .collect()
    }

    pub fn group_name(&self, group: usize) -> Result<&str> {
        Ok(self.resolve(group)?.name.as_str())
    }

    /// Whether `group` is a dummy node. Always `false` while dummies are disabled, since
    /// dummies are then not addressable at all.
    pub fn is_dummy(&self, group: usize) -> Result<bool> {
        let node = self.resolve(group)?;
        Ok(self.dummies_enabled && node.is_dummy())
    }

    pub fn material(&self, group: usize) -> Result<&MaterialDef> {
        Ok(&self.resolve(group)?.material)
    }

    /// `(width, height)` of a billboard group.
    pub fn billboard_size(&self, group: usize) -> Result<(f32, f32)> {
        self.resolve(group)?
            .stem_model()
            .and_then(|stem| stem.billboard_size())
            .ok_or(Error::NotABillboard { group })
    }

    /// Whether every instance of `group` is a rigid (or, with `allow_scaling`, uniformly
    /// scaled) copy of the clone geometry.
    pub fn is_cloneable(&self, group: usize, allow_scaling: bool) -> Result<bool> {
        Ok(self.stem(group)?.is_cloneable(allow_scaling))
    }

    pub fn lod_vis_range_enabled(&self, group: usize) -> Result<bool> {
        Ok(self.resolve(group)?.vis_range.enabled)
    }

    pub fn lod_vis_range(&self, group: usize) -> Result<(f32, f32)> {
        let range = self.resolve(group)?.vis_range;
        Ok((range.min, range.max))
    }

    /// Values of `attr` in one instance of `group`.
    pub fn vattr_count(&self, group: usize, attr: AttrKind) -> Result<usize> {
        Ok(self.stem(group)?.vattr_count(attr))
    }

    /// Writes the untransformed clone geometry of `group`, tightly packed.
    pub fn fill_clone_vattr_buffer(&self, group: usize, attr: AttrKind, dst: &mut [f32]) -> Result<()> {
        let stem = self.stem(group)?;
        ensure_capacity(stem.vattr_count(attr) * attr.components(), dst.len())?;
        stem.fill_clone_vattr_buffer(dst, attr);
        Ok(())
    }

    pub fn primitive_count(&self, group: usize) -> Result<usize> {
        Ok(self.stem(group)?.primitive_count())
    }

    pub fn primitive_type(&self, group: usize, primitive: usize) -> Result<PrimitiveType> {
        let stem = self.stem(group)?;
        if primitive >= stem.primitive_count() {
            return Err(Error::Other(format!(
                "primitive {primitive} out of range for group {group} ({} primitives)",
                stem.primitive_count()
            )));
        }
        Ok(stem.primitive_type(primitive))
    }

    pub fn index_count(&self, group: usize, topology: IndexTopology) -> Result<usize> {
        Ok(self.stem(group)?.index_count(topology))
    }

    /// Writes unified-vertex indices of one instance, offset by `index_base`.
    pub fn fill_index_buffer(
        &self,
        group: usize,
        topology: IndexTopology,
        dst: &mut IndexBuffer<'_>,
        index_base: u32,
    ) -> Result<()> {
        let stem = self.stem(group)?;
        ensure_capacity(stem.index_count(topology), dst.len())?;
        check_index_range(index_base, stem.vattr_count_i(), dst)?;
        stem.fill_index_buffer(dst, topology, index_base);
        Ok(())
    }

    /// Writes per-attribute indices of one instance, offset by `index_base`.
    pub fn fill_vattr_index_buffer(
        &self,
        group: usize,
        attr: AttrKind,
        topology: IndexTopology,
        dst: &mut IndexBuffer<'_>,
        index_base: u32,
    ) -> Result<()> {
        let stem = self.stem(group)?;
        ensure_capacity(stem.index_count(topology), dst.len())?;
        check_index_range(index_base, stem.vattr_count(attr), dst)?;
        stem.fill_vattr_index_buffer(dst, attr, topology, index_base);
        Ok(())
    }

    /// Vertices of one instance of `group` in unified indexing.
    pub fn vattr_count_i(&self, group: usize) -> Result<usize> {
        Ok(self.stem(group)?.vattr_count_i())
    }

    /// Writes the clone geometry of `group` in unified indexing, one strided buffer per
    /// attribute.
    pub fn fill_clone_vattr_buffers_i(&self, group: usize, buffers: VAttrBuffers<'_>) -> Result<()> {
        let stem = self.stem(group)?;
        buffers.validate()?;
        buffers.ensure_capacity(stem.vattr_count_i())?;

        for (attr, target) in AttrKind::ALL.into_iter().zip(buffers.into_targets()) {
            if let Some(target) = target {
                stem.fill_clone_vattr_buffer_i(target.data, target.offset, target.stride, attr);
            }
        }
        Ok(())
    }

    /// Creates an instance for `base_seed`; `0` selects the model's own base seed.
    pub fn create_instance(&self, base_seed: u32) -> PlantInstance {
        let seed = if base_seed == 0 {
            debug!("Seed 0 requested; using model seed {}.", self.model.base_seed);
            self.model.base_seed
        } else {
            base_seed
        };
        PlantInstance::new(self.clone(), seed)
    }

    pub(crate) fn resolve(&self, group: usize) -> Result<&BranchModel> {
        resolve_group(self.model.plant_base(), self.dummies_enabled, group)
    }

    /// Stem model of `group`, failing for stem-less groups.
    pub(crate) fn stem(&self, group: usize) -> Result<&dyn StemModel> {
        self.resolve(group)?
            .stem_model()
            .ok_or(Error::MissingStemModel { group })
    }
}

/// Fails unless `index_base + vertex_count - 1` fits the element width of `dst`.
fn check_index_range(index_base: u32, vertex_count: usize, dst: &IndexBuffer<'_>) -> Result<()> {
    let Some(last) = vertex_count.checked_sub(1) else {
        return Ok(());
    };
    let top = u32::try_from(last).ok().and_then(|last| index_base.checked_add(last));
    match top {
        Some(top) if top <= dst.max_index() => Ok(()),
        _ => Err(Error::InvalidLayout(format!(
            "indices {index_base}..{index_base}+{vertex_count} exceed the index width (max {})",
            dst.max_index()
        ))),
    }
}

impl From<PlantModel> for PlantTemplate {
    fn from(model: PlantModel) -> Self {
        Self::new(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::testing::{counting_tree, fixture_model, scenario_model};

    #[test]
    fn scenario_without_dummies_exposes_only_a() {
        let template = PlantTemplate::new(scenario_model());
        assert_eq!(template.group_count(), 1);
        assert_eq!(template.group_name(0), Ok("A"));
        assert!(matches!(
            template.group_name(1),
            Err(Error::GroupIndexOutOfRange { index: 1, group_count: 1 })
        ));
    }

    #[test]
    fn scenario_with_dummies_lists_a_then_b() {
        let mut template = PlantTemplate::new(scenario_model());
        template.set_dummies_enabled(true);
        assert_eq!(template.group_count(), 2);
        assert_eq!(template.group_names(), vec!["A", "B"]);
        assert_eq!(template.is_dummy(1), Ok(true));
    }

    #[test]
    fn group_names_are_a_bijection_over_non_dummies() {
        let template = PlantTemplate::new(fixture_model(false));
        let count = template.group_count();
        let names: Vec<_> = (0..count).map(|g| template.group_name(g).unwrap()).collect();
        assert_eq!(names, vec!["trunk", "branch", "leaf", "bud"]);
        assert!(template.group_name(count).is_err());
    }

    #[test]
    fn is_dummy_is_false_while_dummies_are_disabled() {
        let mut template = PlantTemplate::new(counting_tree());
        assert!((0..template.group_count()).all(|g| template.is_dummy(g) == Ok(false)));
        template.set_dummies_enabled(true);
        assert_eq!(template.group_name(3), Ok("twig"));
        assert_eq!(template.is_dummy(3), Ok(true));
    }

    #[test]
    fn stem_less_group_reports_missing_stem() {
        let mut template = PlantTemplate::new(counting_tree());
        template.set_dummies_enabled(true);
        assert_eq!(
            template.vattr_count(3, AttrKind::Vertex),
            Err(Error::MissingStemModel { group: 3 })
        );
        assert_eq!(template.billboard_size(3), Err(Error::NotABillboard { group: 3 }));
    }

    #[test]
    fn billboard_size_only_for_billboards() {
        let template = PlantTemplate::new(counting_tree());
        assert_eq!(template.billboard_size(3), Ok((0.4, 0.4)));
        assert_eq!(template.billboard_size(0), Err(Error::NotABillboard { group: 0 }));
    }

    #[test]
    fn material_and_vis_range_come_from_the_node() {
        let template = PlantTemplate::new(fixture_model(false));
        let leaf = template.group_names().iter().position(|n| *n == "leaf").unwrap();
        assert!(template.material(leaf).unwrap().billboard);
        assert_eq!(template.lod_vis_range_enabled(leaf), Ok(true));
        assert_eq!(template.lod_vis_range(leaf), Ok((0.0, 0.6)));
        assert_eq!(template.lod_vis_range_enabled(0), Ok(false));
    }

    #[test]
    fn static_geometry_queries_delegate_to_stem() {
        let template = PlantTemplate::new(counting_tree());
        // trunk: 2 axis segments x 4 sections
        assert_eq!(template.primitive_count(0), Ok(8));
        assert_eq!(template.primitive_type(0, 7), Ok(PrimitiveType::Quad));
        assert!(template.primitive_type(0, 8).is_err());
        assert_eq!(template.index_count(0, IndexTopology::TriangleList), Ok(48));
        assert_eq!(template.vattr_count(0, AttrKind::Vertex), Ok(12));
        assert_eq!(template.vattr_count(0, AttrKind::TexCoord0), Ok(15));
        assert_eq!(template.vattr_count_i(0), Ok(15));
        assert_eq!(template.is_cloneable(0, false), Ok(true));
    }

    #[test]
    fn index_fill_checks_capacity_first() {
        let template = PlantTemplate::new(counting_tree());
        let mut short = [0u16; 5];
        assert_eq!(
            template.fill_index_buffer(0, IndexTopology::TriangleList, &mut IndexBuffer::U16(&mut short), 0),
            Err(Error::BufferTooSmall {
                required: 48,
                provided: 5
            })
        );
        assert_eq!(short, [0; 5]);

        let mut quads = [0u32; 4];
        template
            .fill_vattr_index_buffer(2, AttrKind::Vertex, IndexTopology::QuadList, &mut IndexBuffer::U32(&mut quads), 8)
            .unwrap();
        assert_eq!(quads, [8, 9, 10, 11]);
    }

    #[test]
    fn index_base_must_fit_the_element_width() {
        let template = PlantTemplate::new(counting_tree());
        let mut narrow = [0u16; 4];
        let result = template.fill_index_buffer(2, IndexTopology::QuadList, &mut IndexBuffer::U16(&mut narrow), 65_535);
        assert!(matches!(result, Err(Error::InvalidLayout(_))));
        assert_eq!(narrow, [0; 4]);

        template
            .fill_index_buffer(2, IndexTopology::QuadList, &mut IndexBuffer::U16(&mut narrow), 65_532)
            .unwrap();
        assert_eq!(narrow, [65_532, 65_533, 65_534, 65_535]);

        let mut wide = [0u32; 4];
        assert!(matches!(
            template.fill_vattr_index_buffer(
                2,
                AttrKind::Normal,
                IndexTopology::QuadList,
                &mut IndexBuffer::U32(&mut wide),
                u32::MAX
            ),
            Err(Error::InvalidLayout(_))
        ));
        assert_eq!(wide, [0; 4]);

        let highest_base = u32::MAX - template.vattr_count_i(0).unwrap() as u32 + 1;
        let mut trunk = vec![0u32; template.index_count(0, IndexTopology::QuadList).unwrap()];
        let mut fill = |base| {
            template.fill_index_buffer(0, IndexTopology::QuadList, &mut IndexBuffer::U32(&mut trunk), base)
        };
        assert!(fill(highest_base).is_ok());
        assert!(matches!(fill(highest_base + 1), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn clone_buffers_are_written_per_attribute() {
        let template = PlantTemplate::new(counting_tree());
        let leaf = 2;
        let count = template.vattr_count_i(leaf).unwrap();
        let mut positions = vec![0u8; count * 12];
        let mut normals = vec![0u8; 4 + count * 16];
        template
            .fill_clone_vattr_buffers_i(
                leaf,
                VAttrBuffers::new()
                    .with_attr(AttrKind::Vertex, &mut positions, 0, 12)
                    .with_attr(AttrKind::Normal, &mut normals, 4, 16),
            )
            .unwrap();

        let floats = |bytes: &[u8]| -> Vec<f32> {
            bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned::<f32>).collect()
        };
        assert_eq!(&floats(&positions)[..3], &[-0.1, 0.0, 0.0]);
        assert_eq!(&floats(&normals[4..16]), &[0.0, 0.0, 1.0]);

        let mut packed = vec![0.0f32; count * 3];
        template.fill_clone_vattr_buffer(leaf, AttrKind::Vertex, &mut packed).unwrap();
        assert_eq!(floats(&positions), packed);
    }

    #[test]
    fn zero_seed_selects_model_seed() {
        let template = PlantTemplate::new(counting_tree());
        assert_eq!(template.create_instance(0).base_seed(), 17);
        assert_eq!(template.create_instance(3).base_seed(), 3);
    }
}
