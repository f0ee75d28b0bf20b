//! Vertex attribute kinds, primitive kinds and index buffer targets.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of distinct [`AttrKind`]s.
pub const ATTR_COUNT: usize = 6;

/// Vertex attribute produced by stem instances.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Vertex,
    Normal,
    TexCoord0,
    Tangent,
    Binormal,
    /// Billboard anchor position, shared by all vertices of one billboard.
    BillboardPos,
}

impl AttrKind {
    /// All attribute kinds in their canonical (buffer-fill) order.
    pub const ALL: [AttrKind; ATTR_COUNT] = [
        AttrKind::Vertex,
        AttrKind::Normal,
        AttrKind::TexCoord0,
        AttrKind::Tangent,
        AttrKind::Binormal,
        AttrKind::BillboardPos,
    ];

    /// Number of `f32` components of one attribute value.
    #[inline]
    pub const fn components(self) -> usize {
        match self {
            AttrKind::TexCoord0 => 2,
            _ => 3,
        }
    }

    /// Size in bytes of one attribute value.
    #[inline]
    pub const fn byte_size(self) -> usize {
        self.components() * std::mem::size_of::<f32>()
    }

    /// Position of this kind in [`AttrKind::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for AttrKind {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self> {
        AttrKind::ALL
            .get(raw as usize)
            .copied()
            .ok_or(Error::InvalidAttribute(raw))
    }
}

/// Kind of a single stem primitive.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Triangle,
    Quad,
}

/// Index layout requested from a stem model.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexTopology {
    /// Three indices per triangle; quads are split in two.
    TriangleList,
    /// Four indices per quad; triangles are not emitted.
    QuadList,
}

/// Caller-owned index destination in one of the supported element widths.
#[derive(Debug)]
pub enum IndexBuffer<'a> {
    U16(&'a mut [u16]),
    U32(&'a mut [u32]),
}

impl IndexBuffer<'_> {
    /// Number of index slots available.
    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(b) => b.len(),
            IndexBuffer::U32(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest index the element width can hold.
    pub fn max_index(&self) -> u32 {
        match self {
            IndexBuffer::U16(_) => u32::from(u16::MAX),
            IndexBuffer::U32(_) => u32::MAX,
        }
    }

    /// Stores `value` at slot `at`, clamped to [`Self::max_index`]. The template checks
    /// the index range before any write, so clamping only affects direct stem calls.
    #[inline]
    pub fn set(&mut self, at: usize, value: u32) {
        match self {
            IndexBuffer::U16(b) => b[at] = u16::try_from(value).unwrap_or(u16::MAX),
            IndexBuffer::U32(b) => b[at] = value,
        }
    }
}
