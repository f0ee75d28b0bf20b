//! Seeded queries that replay the generated plant structure.
//!
//! Each query seeds a fresh random stream from the instance seed and runs one traversal
//! with the visitor for that query. Required output sizes are established (by a counting
//! pass where needed) and checked before the filling pass starts, so a failing query never
//! writes to its destinations.
use tracing::{debug, warn};

use crate::error::{ensure_capacity, Error, Result};
use crate::layout::{VAttrBufferSet, VAttrBuffers, VAttrFormat};
use crate::model::{Aabb, AttrKind, PlantModel, StemModel};
use crate::query::template::PlantTemplate;
use crate::query::traverse::{run, BranchVisitor};
use crate::query::visit::{
    AttrFiller, BoundsAccumulator, BranchCounter, GroupCounter, InterleavedFiller, MultiBufferFiller,
    MultiGroupFiller, TransformExtractor,
};

/// Floats per instance written by [`PlantInstance::fill_clone_transform_buffer`].
pub const OFFSET_COMPONENTS: usize = 3;
pub const ORIENTATION_COMPONENTS: usize = 4;
pub const SCALE_COMPONENTS: usize = 1;

/// A template paired with a base seed; the unit of reproducibility.
///
/// The dummies policy is the template's at creation time. Every query replays the same
/// structure.
#[derive(Clone, Debug)]
pub struct PlantInstance {
    template: PlantTemplate,
    base_seed: u32,
}

impl PlantInstance {
    pub(crate) fn new(template: PlantTemplate, base_seed: u32) -> Self {
        Self { template, base_seed }
    }

    pub fn template(&self) -> &PlantTemplate {
        &self.template
    }

    pub fn base_seed(&self) -> u32 {
        self.base_seed
    }

    pub fn group_count(&self) -> usize {
        self.template.group_count()
    }

    fn model(&self) -> &PlantModel {
        self.template.model()
    }

    fn traverse<V: BranchVisitor>(&self, visitor: &mut V) {
        run(self.model(), self.base_seed, self.template.dummies_enabled(), visitor);
    }

    /// Number of generated instances of `group`.
    pub fn branch_count(&self, group: usize) -> Result<usize> {
        let node = self.template.resolve(group)?;
        let mut counter = BranchCounter::new(node);
        self.traverse(&mut counter);
        debug!("Group {} has {} branches (seed {}).", group, counter.count, self.base_seed);
        Ok(counter.count)
    }

    /// Instance counts of all groups, indexed by group, from a single traversal.
    pub fn branch_count_multi(&self) -> Vec<usize> {
        let mut counter = GroupCounter::new(self.group_count());
        self.traverse(&mut counter);
        counter.counts
    }

    /// Union of all numbered instance boxes. Always contains the origin.
    pub fn bounding_box(&self) -> Aabb {
        let mut acc = BoundsAccumulator::default();
        self.traverse(&mut acc);
        acc.bounds
    }

    fn stem_and_count(&self, group: usize) -> Result<(&dyn StemModel, usize)> {
        let stem = self.template.stem(group)?;
        Ok((stem, self.branch_count(group)?))
    }

    /// Writes per-instance offsets (xyz), orientations (quaternion xyzw) and scales of
    /// `group`. Each destination is optional and must hold `branch_count` records.
    pub fn fill_clone_transform_buffer(
        &self,
        group: usize,
        offsets: Option<&mut [f32]>,
        orientations: Option<&mut [f32]>,
        scales: Option<&mut [f32]>,
    ) -> Result<()> {
        let (_, count) = self.stem_and_count(group)?;
        for (dst, width) in [
            (&offsets, OFFSET_COMPONENTS),
            (&orientations, ORIENTATION_COMPONENTS),
            (&scales, SCALE_COMPONENTS),
        ] {
            if let Some(dst) = dst {
                ensure_capacity(count * width, dst.len())?;
            }
        }

        let node = self.template.resolve(group)?;
        let mut extractor = TransformExtractor::new(node, offsets, orientations, scales);
        self.traverse(&mut extractor);
        extractor.finish()
    }

    /// Values of `attr` across all instances of `group`.
    pub fn vattr_count(&self, group: usize, attr: AttrKind) -> Result<usize> {
        let (stem, count) = self.stem_and_count(group)?;
        Ok(count * stem.vattr_count(attr))
    }

    /// Writes `attr` of every instance of `group` as tightly packed native-endian floats.
    pub fn fill_vattr_buffer(&self, group: usize, attr: AttrKind, dst: &mut [u8]) -> Result<()> {
        let total = self.vattr_count(group, attr)?;
        ensure_capacity(total * attr.byte_size(), dst.len())?;
        debug!("Filling {:?} of group {} ({} values).", attr, group, total);

        let node = self.template.resolve(group)?;
        let mut filler = AttrFiller::new(node, attr, dst);
        self.traverse(&mut filler);
        filler.finish()
    }

    /// Vertices across all instances of `group` in unified indexing.
    pub fn vattr_count_i(&self, group: usize) -> Result<usize> {
        let (stem, count) = self.stem_and_count(group)?;
        Ok(count * stem.vattr_count_i())
    }

    /// Writes every instance of `group` into one interleaved buffer laid out by `format`.
    pub fn fill_vattr_buffer_i(&self, group: usize, format: &VAttrFormat, dst: &mut [u8]) -> Result<()> {
        format.validate()?;
        let total = self.vattr_count_i(group)?;
        ensure_capacity(format.required_len(total)?, dst.len())?;
        debug!("Filling {} interleaved vertices of group {}.", total, group);

        let node = self.template.resolve(group)?;
        let mut filler = InterleavedFiller::new(node, format, dst);
        self.traverse(&mut filler);
        filler.finish()
    }

    /// Writes every instance of `group` into separate strided buffers, one per attribute.
    pub fn fill_vattr_buffers_i(&self, group: usize, buffers: VAttrBuffers<'_>) -> Result<()> {
        buffers.validate()?;
        let total = self.vattr_count_i(group)?;
        buffers.ensure_capacity(total)?;
        debug!("Filling {} vertices of group {} into separate buffers.", total, group);

        let node = self.template.resolve(group)?;
        let mut filler = MultiBufferFiller::new(node, buffers);
        self.traverse(&mut filler);
        filler.finish()
    }

    /// Fills the packed buffer set of every group in one traversal. `sets[g]` receives
    /// group `g`; there must be exactly one set per group.
    pub fn fill_vattr_buffers_i_multi(&self, sets: Vec<VAttrBufferSet<'_>>) -> Result<()> {
        let group_count = self.group_count();
        if sets.len() != group_count {
            return Err(Error::InvalidLayout(format!(
                "{} buffer sets for {} groups",
                sets.len(),
                group_count
            )));
        }

        let counts = self.branch_count_multi();
        for (group, (set, count)) in sets.iter().zip(&counts).enumerate() {
            match self.template.stem(group) {
                Ok(stem) => set.ensure_capacity(count * stem.vattr_count_i())?,
                Err(Error::MissingStemModel { .. }) => {
                    if AttrKind::ALL.into_iter().any(|attr| set.has_attr(attr)) {
                        warn!("Group {} has no stem model; its buffers stay untouched.", group);
                    }
                }
                Err(err) => return Err(err),
            }
        }
        debug!("Filling {} groups in one pass (seed {}).", group_count, self.base_seed);

        let mut filler = MultiGroupFiller::new(sets);
        self.traverse(&mut filler);
        filler.finish()
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::layout::strided_len;
    use crate::query::testing::{counting_tree, fixture_model, scenario_model};

    fn instance(model: PlantModel, seed: u32) -> PlantInstance {
        PlantTemplate::new(model).create_instance(seed)
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned::<f32>).collect()
    }

    #[test]
    fn scenario_counts_two_instances_of_a() {
        let inst = instance(scenario_model(), 9);
        assert_eq!(inst.group_count(), 1);
        assert_eq!(inst.branch_count(0), Ok(2));
        assert_eq!(inst.branch_count_multi(), vec![2]);
    }

    #[test]
    fn scenario_with_dummies_counts_nothing_for_b() {
        let mut template = PlantTemplate::new(scenario_model());
        template.set_dummies_enabled(true);
        let inst = template.create_instance(9);
        assert_eq!(inst.branch_count_multi(), vec![2, 0]);
        assert_eq!(inst.vattr_count(1, AttrKind::Vertex), Err(Error::MissingStemModel { group: 1 }));
    }

    #[test]
    fn queries_are_deterministic() {
        let inst = instance(fixture_model(false), 1234);
        let total = inst.vattr_count(2, AttrKind::Vertex).unwrap();
        let mut a = vec![0u8; total * 12];
        let mut b = vec![0u8; total * 12];
        inst.fill_vattr_buffer(2, AttrKind::Vertex, &mut a).unwrap();
        inst.fill_vattr_buffer(2, AttrKind::Vertex, &mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(inst.bounding_box(), inst.bounding_box());

        let again = instance(fixture_model(false), 1234);
        assert_eq!(inst.branch_count_multi(), again.branch_count_multi());
    }

    #[test]
    fn seeds_change_the_structure() {
        let template = PlantTemplate::new(fixture_model(false));
        let distinct: std::collections::HashSet<_> = (1..=32)
            .map(|seed| template.create_instance(seed).branch_count_multi())
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn fills_write_exactly_the_counted_values() {
        const SENTINEL: u8 = 0xA5;
        let inst = instance(fixture_model(false), 77);
        for group in 0..inst.group_count() {
            for attr in AttrKind::ALL {
                let total = inst.vattr_count(group, attr).unwrap();
                let used = total * attr.byte_size();
                let mut buf = vec![SENTINEL; used + 32];
                inst.fill_vattr_buffer(group, attr, &mut buf).unwrap();
                assert!(buf[used..].iter().all(|b| *b == SENTINEL), "{attr:?} of group {group} overran");

                let mut exact = vec![SENTINEL; used];
                inst.fill_vattr_buffer(group, attr, &mut exact).unwrap();
                assert_eq!(exact, buf[..used]);
            }
        }
    }

    #[test]
    fn undersized_destination_is_rejected_before_writing() {
        let inst = instance(counting_tree(), 3);
        let mut buf = vec![0xEEu8; 10];
        assert_eq!(
            inst.fill_vattr_buffer(2, AttrKind::Vertex, &mut buf),
            Err(Error::BufferTooSmall {
                required: 4 * 4 * 12,
                provided: 10
            })
        );
        assert!(buf.iter().all(|b| *b == 0xEE));
        assert!(matches!(
            inst.fill_vattr_buffer(9, AttrKind::Vertex, &mut buf),
            Err(Error::GroupIndexOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn multi_group_pass_matches_per_group_fills() {
        let inst = instance(fixture_model(false), 4242);
        let attrs = [AttrKind::Vertex, AttrKind::TexCoord0, AttrKind::BillboardPos];
        let groups = inst.group_count();
        let totals: Vec<usize> = (0..groups).map(|g| inst.vattr_count_i(g).unwrap()).collect();

        let mut packed: Vec<Vec<Vec<f32>>> = totals
            .iter()
            .map(|n| attrs.iter().map(|a| vec![0.0; n * a.components()]).collect())
            .collect();
        let sets = packed
            .iter_mut()
            .map(|per_attr| {
                let mut set = VAttrBufferSet::new();
                for (attr, buf) in attrs.iter().zip(per_attr.iter_mut()) {
                    set.add_attr(*attr, buf);
                }
                set
            })
            .collect();
        inst.fill_vattr_buffers_i_multi(sets).unwrap();

        for (group, total) in totals.iter().enumerate() {
            let mut bytes: Vec<Vec<u8>> = attrs.iter().map(|a| vec![0; total * a.byte_size()]).collect();
            let mut buffers = VAttrBuffers::new();
            for (attr, buf) in attrs.iter().zip(bytes.iter_mut()) {
                buffers.add_attr(*attr, buf, 0, attr.byte_size());
            }
            inst.fill_vattr_buffers_i(group, buffers).unwrap();

            for (i, buf) in bytes.iter().enumerate() {
                assert_eq!(floats(buf), packed[group][i], "group {group}, {:?}", attrs[i]);
            }
        }
    }

    #[test]
    fn multi_group_requires_one_set_per_group() {
        let inst = instance(counting_tree(), 3);
        assert!(matches!(
            inst.fill_vattr_buffers_i_multi(Vec::new()),
            Err(Error::InvalidLayout(_))
        ));
    }

    #[test]
    fn no_randomness_ignores_the_seed() {
        let template = PlantTemplate::new(fixture_model(true));
        let reference = template.create_instance(1);
        let expected: Vec<_> = (0..template.group_count())
            .map(|g| reference.branch_count(g).unwrap())
            .collect();
        for seed in [2, 99, 123_456, u32::MAX] {
            let inst = template.create_instance(seed);
            for (g, count) in expected.iter().enumerate().rev() {
                assert_eq!(inst.branch_count(g), Ok(*count));
            }
            assert_eq!(inst.bounding_box(), reference.bounding_box());
        }
    }

    #[test]
    fn vertices_lie_inside_the_bounding_box() {
        for seed in [5, 6, 7] {
            let inst = instance(fixture_model(false), seed);
            let aabb = inst.bounding_box();
            assert!(aabb.contains(Vec3::ZERO, 0.0));
            for group in 0..inst.group_count() {
                let total = inst.vattr_count(group, AttrKind::Vertex).unwrap();
                let mut buf = vec![0u8; total * 12];
                inst.fill_vattr_buffer(group, AttrKind::Vertex, &mut buf).unwrap();
                for p in floats(&buf).chunks_exact(3) {
                    assert!(aabb.contains(Vec3::from_slice(p), 1e-4), "{p:?} outside {aabb:?}");
                }
            }
        }
    }

    #[test]
    fn interleaved_fill_matches_separate_buffers() {
        let inst = instance(fixture_model(false), 31);
        let format = VAttrFormat::new(40)
            .with_attr(AttrKind::Vertex, 0)
            .with_attr(AttrKind::Normal, 12)
            .with_attr(AttrKind::TexCoord0, 28);
        let group = 1;
        let total = inst.vattr_count_i(group).unwrap();
        let mut interleaved = vec![0u8; format.required_len(total).unwrap()];
        inst.fill_vattr_buffer_i(group, &format, &mut interleaved).unwrap();

        let mut normals = vec![0u8; strided_len(total, 0, 12, 12).unwrap()];
        inst.fill_vattr_buffers_i(group, VAttrBuffers::new().with_attr(AttrKind::Normal, &mut normals, 0, 12))
            .unwrap();

        for (v, normal) in floats(&normals).chunks_exact(3).enumerate() {
            let record = &interleaved[v * 40..];
            assert_eq!(floats(&record[12..24]), normal);
        }
    }

    #[test]
    fn interleaved_format_is_validated() {
        let inst = instance(counting_tree(), 3);
        let bad = VAttrFormat::new(8).with_attr(AttrKind::Vertex, 0);
        let mut buf = vec![0u8; 1024];
        assert!(matches!(
            inst.fill_vattr_buffer_i(0, &bad, &mut buf),
            Err(Error::InvalidLayout(_))
        ));
    }

    #[test]
    fn transforms_decompose_instance_frames() {
        let inst = instance(counting_tree(), 3);
        let mut offsets = [f32::NAN; 3];
        let mut orientations = [f32::NAN; 4];
        let mut scales = [f32::NAN; 1];
        inst.fill_clone_transform_buffer(0, Some(&mut offsets), Some(&mut orientations), Some(&mut scales))
            .unwrap();
        assert_eq!(offsets, [0.0, 0.0, 0.0]);
        assert_eq!(orientations, Quat::IDENTITY.to_array());
        assert_eq!(scales, [1.0]);

        // branches sit at the trunk base and tip
        let mut branch_offsets = [0.0f32; 6];
        inst.fill_clone_transform_buffer(1, Some(&mut branch_offsets), None, None)
            .unwrap();
        assert!(Vec3::from_slice(&branch_offsets[..3]).abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!(Vec3::from_slice(&branch_offsets[3..]).abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5));

        let mut short = [0.0f32; 3];
        assert_eq!(
            inst.fill_clone_transform_buffer(1, None, Some(&mut short), None),
            Err(Error::BufferTooSmall {
                required: 8,
                provided: 3
            })
        );
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn facade_types_are_send_and_sync() {
        assert_send_sync::<PlantTemplate>();
        assert_send_sync::<PlantInstance>();
    }

    #[test]
    fn shared_instance_answers_the_same_on_every_thread() {
        let inst = instance(counting_tree(), 5);
        let expected = inst.branch_count_multi();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| inst.branch_count_multi())).collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
