//! Destination layouts for vertex attribute buffers.
//!
//! Three descriptors cover the supported physical layouts:
//! - [`VAttrFormat`]: one interleaved buffer, every enabled attribute at a fixed byte offset
//!   inside a fixed-stride vertex record.
//! - [`VAttrBuffers`]: one buffer per attribute, each with its own offset and stride.
//! - [`VAttrBufferSet`]: tightly packed `f32` buffers per attribute, one set per group, for
//!   filling every group in a single traversal.
//!
//! The descriptors only borrow caller memory; the engine never allocates destinations.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{AttrKind, ATTR_COUNT};

pub(crate) mod cursor;

/// Bytes needed to store `count` records of `size` bytes, the first at `offset`,
/// successive ones `stride` apart. Fails with [`Error::InvalidLayout`] when the length
/// does not fit in `usize`.
#[inline]
pub fn strided_len(count: usize, offset: usize, stride: usize, size: usize) -> Result<usize> {
    if count == 0 {
        return Ok(0);
    }
    (count - 1)
        .checked_mul(stride)
        .and_then(|n| n.checked_add(offset))
        .and_then(|n| n.checked_add(size))
        .ok_or_else(|| {
            Error::InvalidLayout(format!(
                "{count} records of stride {stride} at offset {offset} overflow the address space"
            ))
        })
}

/// Interleaved vertex format: a fixed stride and per-attribute byte offsets.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VAttrFormat {
    stride: usize,
    offsets: [Option<usize>; ATTR_COUNT],
}

impl VAttrFormat {
    /// Creates an empty format with the given vertex stride in bytes.
    pub fn new(stride: usize) -> Self {
        Self {
            stride,
            offsets: [None; ATTR_COUNT],
        }
    }

    /// Tightly packed format holding `attrs` in the given order.
    pub fn packed(attrs: &[AttrKind]) -> Self {
        let mut format = Self::new(0);
        let mut offset = 0;
        for attr in attrs {
            format.add_attr(*attr, offset);
            offset += attr.byte_size();
        }
        format.stride = offset;
        format
    }

    /// Enables `attr` at `offset` bytes into each vertex record.
    pub fn with_attr(mut self, attr: AttrKind, offset: usize) -> Self {
        self.add_attr(attr, offset);
        self
    }

    pub fn add_attr(&mut self, attr: AttrKind, offset: usize) -> &mut Self {
        self.offsets[attr.index()] = Some(offset);
        self
    }

    /// Like [`VAttrFormat::add_attr`] for a raw attribute id.
    pub fn add_attr_id(&mut self, attr: u32, offset: usize) -> Result<&mut Self> {
        let attr = AttrKind::try_from(attr)?;
        Ok(self.add_attr(attr, offset))
    }

    pub fn has_attr(&self, attr: AttrKind) -> bool {
        self.offsets[attr.index()].is_some()
    }

    pub fn attr_offset(&self, attr: AttrKind) -> Option<usize> {
        self.offsets[attr.index()]
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Enabled attributes with their offsets, in canonical attribute order.
    pub fn attrs(&self) -> impl Iterator<Item = (AttrKind, usize)> + '_ {
        AttrKind::ALL
            .iter()
            .filter_map(|a| self.offsets[a.index()].map(|o| (*a, o)))
    }

    /// Bytes needed for `vertex_count` records.
    pub fn required_len(&self, vertex_count: usize) -> Result<usize> {
        self.attrs().try_fold(0, |len, (attr, offset)| {
            Ok(len.max(strided_len(vertex_count, offset, self.stride, attr.byte_size())?))
        })
    }

    /// Checks that every enabled attribute fits inside one record and that no two
    /// attributes share a byte.
    pub fn validate(&self) -> Result<()> {
        let mut ranges: Vec<(usize, usize, AttrKind)> = Vec::with_capacity(ATTR_COUNT);
        for (attr, offset) in self.attrs() {
            match offset.checked_add(attr.byte_size()) {
                Some(end) if end <= self.stride => ranges.push((offset, end, attr)),
                _ => {
                    return Err(Error::InvalidLayout(format!(
                        "{attr:?} at offset {offset} exceeds stride {}",
                        self.stride
                    )))
                }
            }
        }
        ranges.sort_unstable_by_key(|&(start, _, _)| start);
        for pair in ranges.windows(2) {
            let (_, prev_end, prev) = pair[0];
            let (start, _, attr) = pair[1];
            if start < prev_end {
                return Err(Error::InvalidLayout(format!(
                    "{attr:?} at offset {start} overlaps {prev:?}, which ends at {prev_end}"
                )));
            }
        }
        Ok(())
    }
}

/// One per-attribute destination of [`VAttrBuffers`].
#[derive(Debug)]
pub struct AttrTarget<'a> {
    pub data: &'a mut [u8],
    /// Byte offset of the first value.
    pub offset: usize,
    /// Byte distance between consecutive values.
    pub stride: usize,
}

impl AttrTarget<'_> {
    fn required_len(&self, attr: AttrKind, count: usize) -> Result<usize> {
        strided_len(count, self.offset, self.stride, attr.byte_size())
    }
}

/// Separate destination buffer per attribute.
#[derive(Debug, Default)]
pub struct VAttrBuffers<'a> {
    targets: [Option<AttrTarget<'a>>; ATTR_COUNT],
}

impl<'a> VAttrBuffers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, attr: AttrKind, data: &'a mut [u8], offset: usize, stride: usize) -> Self {
        self.add_attr(attr, data, offset, stride);
        self
    }

    pub fn add_attr(&mut self, attr: AttrKind, data: &'a mut [u8], offset: usize, stride: usize) -> &mut Self {
        self.targets[attr.index()] = Some(AttrTarget {
            data,
            offset,
            stride,
        });
        self
    }

    /// Like [`VAttrBuffers::add_attr`] for a raw attribute id.
    pub fn add_attr_id(&mut self, attr: u32, data: &'a mut [u8], offset: usize, stride: usize) -> Result<&mut Self> {
        let attr = AttrKind::try_from(attr)?;
        Ok(self.add_attr(attr, data, offset, stride))
    }

    pub fn has_attr(&self, attr: AttrKind) -> bool {
        self.targets[attr.index()].is_some()
    }

    pub fn target(&self, attr: AttrKind) -> Option<&AttrTarget<'a>> {
        self.targets[attr.index()].as_ref()
    }

    /// Checks strides against attribute sizes.
    pub fn validate(&self) -> Result<()> {
        for attr in AttrKind::ALL {
            if let Some(t) = self.target(attr) {
                if t.stride < attr.byte_size() {
                    return Err(Error::InvalidLayout(format!(
                        "{attr:?} stride {} is smaller than its size {}",
                        t.stride,
                        attr.byte_size()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Fails unless every target can hold `count` values.
    pub fn ensure_capacity(&self, count: usize) -> Result<()> {
        for attr in AttrKind::ALL {
            if let Some(t) = self.target(attr) {
                crate::error::ensure_capacity(t.required_len(attr, count)?, t.data.len())?;
            }
        }
        Ok(())
    }

    pub(crate) fn into_targets(self) -> [Option<AttrTarget<'a>>; ATTR_COUNT] {
        self.targets
    }
}

/// Tightly packed `f32` destinations of one group for the multi-group filler.
#[derive(Debug, Default)]
pub struct VAttrBufferSet<'a> {
    buffers: [Option<&'a mut [f32]>; ATTR_COUNT],
}

impl<'a> VAttrBufferSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, attr: AttrKind, data: &'a mut [f32]) -> Self {
        self.add_attr(attr, data);
        self
    }

    pub fn add_attr(&mut self, attr: AttrKind, data: &'a mut [f32]) -> &mut Self {
        self.buffers[attr.index()] = Some(data);
        self
    }

    pub fn has_attr(&self, attr: AttrKind) -> bool {
        self.buffers[attr.index()].is_some()
    }

    /// Fails unless every buffer can hold `count` values.
    pub fn ensure_capacity(&self, count: usize) -> Result<()> {
        for attr in AttrKind::ALL {
            if let Some(buf) = &self.buffers[attr.index()] {
                let required = count.checked_mul(attr.components()).ok_or_else(|| {
                    Error::InvalidLayout(format!("{count} {attr:?} values overflow the address space"))
                })?;
                crate::error::ensure_capacity(required, buf.len())?;
            }
        }
        Ok(())
    }

    pub(crate) fn into_buffers(self) -> [Option<&'a mut [f32]>; ATTR_COUNT] {
        self.buffers
    }
}
