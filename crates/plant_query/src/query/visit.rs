//! Per-query visitors driven by [`crate::query::traverse::run`].
//!
//! Group-addressed visitors act on the one template node the group index resolved to,
//! compared by identity. Multi-group visitors act on every numbered node and pick their
//! output slot by the group index the traversal hands them.
use std::ptr;

use glam::Vec3;

use crate::error::{Error, Result};
use crate::layout::cursor::{ByteCursor, FloatCursor};
use crate::layout::{AttrTarget, VAttrBufferSet, VAttrBuffers, VAttrFormat};
use crate::model::{Aabb, AttrKind, BranchModel, StemInstance, ATTR_COUNT};
use crate::query::traverse::BranchVisitor;

/// Maps a recorded cursor overflow to [`Error::BufferTooSmall`].
pub(crate) fn check_overflow(overflow: Option<(usize, usize)>) -> Result<()> {
    match overflow {
        Some((required, provided)) => Err(Error::BufferTooSmall { required, provided }),
        None => Ok(()),
    }
}

#[inline]
fn is_target(target: &BranchModel, node: &BranchModel) -> bool {
    ptr::eq(target, node)
}

/// Counts the generated instances of one node.
pub(crate) struct BranchCounter<'m> {
    target: &'m BranchModel,
    pub(crate) count: usize,
}

impl<'m> BranchCounter<'m> {
    pub(crate) fn new(target: &'m BranchModel) -> Self {
        Self { target, count: 0 }
    }
}

impl BranchVisitor for BranchCounter<'_> {
    fn visit(&mut self, node: &BranchModel, _group: Option<usize>, _instance: Option<&dyn StemInstance>) {
        if is_target(self.target, node) {
            self.count += 1;
        }
    }
}

/// Counts generated instances of every group in one pass.
pub(crate) struct GroupCounter {
    pub(crate) counts: Vec<usize>,
}

impl GroupCounter {
    pub(crate) fn new(group_count: usize) -> Self {
        Self {
            counts: vec![0; group_count],
        }
    }
}

impl BranchVisitor for GroupCounter {
    fn visit(&mut self, _node: &BranchModel, group: Option<usize>, _instance: Option<&dyn StemInstance>) {
        if let Some(slot) = group.and_then(|g| self.counts.get_mut(g)) {
            *slot += 1;
        }
    }
}

/// Decomposes each instance transform into offset, orientation and scale.
pub(crate) struct TransformExtractor<'m, 'b> {
    target: &'m BranchModel,
    offsets: Option<FloatCursor<'b>>,
    orientations: Option<FloatCursor<'b>>,
    scales: Option<FloatCursor<'b>>,
}

impl<'m, 'b> TransformExtractor<'m, 'b> {
    pub(crate) fn new(
        target: &'m BranchModel,
        offsets: Option<&'b mut [f32]>,
        orientations: Option<&'b mut [f32]>,
        scales: Option<&'b mut [f32]>,
    ) -> Self {
        Self {
            target,
            offsets: offsets.map(FloatCursor::new),
            orientations: orientations.map(FloatCursor::new),
            scales: scales.map(FloatCursor::new),
        }
    }

    pub(crate) fn finish(&self) -> Result<()> {
        for cursor in [&self.offsets, &self.orientations, &self.scales].into_iter().flatten() {
            check_overflow(cursor.overflow())?;
        }
        Ok(())
    }
}

impl BranchVisitor for TransformExtractor<'_, '_> {
    fn visit(&mut self, node: &BranchModel, _group: Option<usize>, instance: Option<&dyn StemInstance>) {
        let Some(instance) = instance.filter(|_| is_target(self.target, node)) else {
            return;
        };
        let (_, rotation, translation) = instance.world_transform().to_scale_rotation_translation();
        if let Some(cursor) = &mut self.offsets {
            cursor.push(&translation.to_array());
        }
        if let Some(cursor) = &mut self.orientations {
            cursor.push(&rotation.to_array());
        }
        if let Some(cursor) = &mut self.scales {
            cursor.push(&[instance.scale()]);
        }
    }
}

/// Writes one attribute of each instance, values tightly packed.
pub(crate) struct AttrFiller<'m, 'b> {
    target: &'m BranchModel,
    attr: AttrKind,
    cursor: ByteCursor<'b>,
}

impl<'m, 'b> AttrFiller<'m, 'b> {
    pub(crate) fn new(target: &'m BranchModel, attr: AttrKind, dst: &'b mut [u8]) -> Self {
        Self {
            target,
            attr,
            cursor: ByteCursor::new(dst),
        }
    }

    pub(crate) fn finish(&self) -> Result<()> {
        check_overflow(self.cursor.overflow())
    }
}

impl BranchVisitor for AttrFiller<'_, '_> {
    fn visit(&mut self, node: &BranchModel, _group: Option<usize>, instance: Option<&dyn StemInstance>) {
        let Some(instance) = instance.filter(|_| is_target(self.target, node)) else {
            return;
        };
        let n = self.attr.components();
        for i in 0..instance.vattr_count(self.attr) {
            self.cursor.write_at(0, &instance.vattr_value(self.attr, i)[..n]);
            self.cursor.advance(self.attr.byte_size());
        }
    }
}

/// Writes every enabled attribute into fixed-stride interleaved records.
pub(crate) struct InterleavedFiller<'m, 'f, 'b> {
    target: &'m BranchModel,
    format: &'f VAttrFormat,
    cursor: ByteCursor<'b>,
}

impl<'m, 'f, 'b> InterleavedFiller<'m, 'f, 'b> {
    pub(crate) fn new(target: &'m BranchModel, format: &'f VAttrFormat, dst: &'b mut [u8]) -> Self {
        Self {
            target,
            format,
            cursor: ByteCursor::new(dst),
        }
    }

    pub(crate) fn finish(&self) -> Result<()> {
        check_overflow(self.cursor.overflow())
    }
}

impl BranchVisitor for InterleavedFiller<'_, '_, '_> {
    fn visit(&mut self, node: &BranchModel, _group: Option<usize>, instance: Option<&dyn StemInstance>) {
        let Some(instance) = instance.filter(|_| is_target(self.target, node)) else {
            return;
        };
        for i in 0..instance.vattr_count_i() {
            for (attr, offset) in self.format.attrs() {
                self.cursor
                    .write_at(offset, &instance.vattr_value_i(attr, i)[..attr.components()]);
            }
            self.cursor.advance(self.format.stride());
        }
    }
}

/// Strided cursor of one attribute destination.
struct StridedCursor<'b> {
    cursor: ByteCursor<'b>,
    stride: usize,
}

impl<'b> From<AttrTarget<'b>> for StridedCursor<'b> {
    fn from(target: AttrTarget<'b>) -> Self {
        let mut cursor = ByteCursor::new(target.data);
        cursor.advance(target.offset);
        Self {
            cursor,
            stride: target.stride,
        }
    }
}

/// Writes each attribute into its own strided buffer.
pub(crate) struct MultiBufferFiller<'m, 'b> {
    target: &'m BranchModel,
    cursors: [Option<StridedCursor<'b>>; ATTR_COUNT],
}

impl<'m, 'b> MultiBufferFiller<'m, 'b> {
    pub(crate) fn new(target: &'m BranchModel, buffers: VAttrBuffers<'b>) -> Self {
        Self {
            target,
            cursors: buffers.into_targets().map(|t| t.map(StridedCursor::from)),
        }
    }

    pub(crate) fn finish(&self) -> Result<()> {
        for strided in self.cursors.iter().flatten() {
            check_overflow(strided.cursor.overflow())?;
        }
        Ok(())
    }
}

impl BranchVisitor for MultiBufferFiller<'_, '_> {
    fn visit(&mut self, node: &BranchModel, _group: Option<usize>, instance: Option<&dyn StemInstance>) {
        let Some(instance) = instance.filter(|_| is_target(self.target, node)) else {
            return;
        };
        for attr in AttrKind::ALL {
            let Some(strided) = &mut self.cursors[attr.index()] else {
                continue;
            };
            for i in 0..instance.vattr_count_i() {
                strided
                    .cursor
                    .write_at(0, &instance.vattr_value_i(attr, i)[..attr.components()]);
                strided.cursor.advance(strided.stride);
            }
        }
    }
}

/// Fills the packed buffer set of every group in a single pass.
pub(crate) struct MultiGroupFiller<'b> {
    banks: Vec<[Option<FloatCursor<'b>>; ATTR_COUNT]>,
}

impl<'b> MultiGroupFiller<'b> {
    pub(crate) fn new(sets: Vec<VAttrBufferSet<'b>>) -> Self {
        Self {
            banks: sets
                .into_iter()
                .map(|set| set.into_buffers().map(|b| b.map(FloatCursor::new)))
                .collect(),
        }
    }

    pub(crate) fn finish(&self) -> Result<()> {
        for cursor in self.banks.iter().flatten().flatten() {
            check_overflow(cursor.overflow())?;
        }
        Ok(())
    }
}

impl BranchVisitor for MultiGroupFiller<'_> {
    fn visit(&mut self, _node: &BranchModel, group: Option<usize>, instance: Option<&dyn StemInstance>) {
        let (Some(group), Some(instance)) = (group, instance) else {
            return;
        };
        let Some(bank) = self.banks.get_mut(group) else {
            return;
        };
        for attr in AttrKind::ALL {
            let Some(cursor) = &mut bank[attr.index()] else {
                continue;
            };
            for i in 0..instance.vattr_count_i() {
                cursor.push(&instance.vattr_value_i(attr, i)[..attr.components()]);
            }
        }
    }
}

/// Union of the bound boxes of every numbered instance, seeded with the origin.
pub(crate) struct BoundsAccumulator {
    pub(crate) bounds: Aabb,
}

impl Default for BoundsAccumulator {
    fn default() -> Self {
        Self {
            bounds: Aabb::new(Vec3::ZERO, Vec3::ZERO),
        }
    }
}

impl BranchVisitor for BoundsAccumulator {
    fn visit(&mut self, _node: &BranchModel, group: Option<usize>, instance: Option<&dyn StemInstance>) {
        if let (Some(_), Some(instance)) = (group, instance) {
            self.bounds.union(&instance.bound_box());
        }
    }
}
