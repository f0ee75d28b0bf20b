//! Advancing write positions over caller-owned buffers.
//!
//! A cursor owns the mutable borrow of its destination and is threaded through the
//! recursive traversal by `&mut`, so every visited branch continues where the previous one
//! stopped. Writes past the end are dropped and remembered; the facade reports them as
//! [`crate::error::Error::BufferTooSmall`] once the traversal finishes.

/// Byte-addressed cursor; values are stored as native-endian `f32`s.
#[derive(Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
    overflow: Option<usize>,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            overflow: None,
        }
    }

    /// Writes `values` at `rel` bytes past the current position.
    #[inline]
    pub(crate) fn write_at(&mut self, rel: usize, values: &[f32]) {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        let start = self.pos + rel;
        let end = start + bytes.len();
        match self.buf.get_mut(start..end) {
            Some(dst) => dst.copy_from_slice(bytes),
            None => self.note_overflow(end),
        }
    }

    #[inline]
    pub(crate) fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn note_overflow(&mut self, end: usize) {
        self.overflow = Some(self.overflow.map_or(end, |e| e.max(end)));
    }

    /// Smallest buffer length that would have held every attempted write, if any failed.
    pub(crate) fn overflow(&self) -> Option<(usize, usize)> {
        self.overflow.map(|end| (end, self.buf.len()))
    }
}

/// Tightly packed `f32` cursor.
#[derive(Debug)]
pub(crate) struct FloatCursor<'a> {
    buf: &'a mut [f32],
    pos: usize,
    overflow: Option<usize>,
}

impl<'a> FloatCursor<'a> {
    pub(crate) fn new(buf: &'a mut [f32]) -> Self {
        Self {
            buf,
            pos: 0,
            overflow: None,
        }
    }

    /// Appends `values` and advances past them.
    #[inline]
    pub(crate) fn push(&mut self, values: &[f32]) {
        let end = self.pos + values.len();
        match self.buf.get_mut(self.pos..end) {
            Some(dst) => dst.copy_from_slice(values),
            None => self.overflow = Some(self.overflow.map_or(end, |e| e.max(end))),
        }
        self.pos = end;
    }

    pub(crate) fn overflow(&self) -> Option<(usize, usize)> {
        self.overflow.map(|end| (end, self.buf.len()))
    }
}
