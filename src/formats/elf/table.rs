//! Bounds-checked views onto fixed-stride header tables

use std::marker::PhantomData;

use crate::formats::elf::types::Record;
use crate::formats::elf::utils::check_bounds;

/// A non-owning view of `count` records of type `R` starting at `offset`.
///
/// Records are always indexed with `R::SIZE`, never with the stride the file
/// declares. A view only exists if its first record fits in the buffer;
/// later records are checked individually on access.
#[derive(Debug, Clone, Copy)]
pub struct RecordTable<'a, R> {
    data: &'a [u8],
    offset: usize,
    count: usize,
    _record: PhantomData<R>,
}

impl<'a, R: Record> RecordTable<'a, R> {
    /// Create a view, or `None` if `offset + R::SIZE` exceeds `data.len()`.
    pub fn new(data: &'a [u8], offset: usize, count: usize) -> Option<Self> {
        if !check_bounds(offset, R::SIZE, data.len()) {
            return None;
        }
        Some(Self {
            data,
            offset,
            count,
            _record: PhantomData,
        })
    }

    /// File offset of the first record
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of records declared by the ELF header
    pub fn declared_count(&self) -> usize {
        self.count
    }

    /// Number of leading records that lie completely inside the buffer
    pub fn available_count(&self) -> usize {
        let room = (self.data.len() - self.offset) / R::SIZE;
        room.min(self.count)
    }

    /// Decode record `index`, or `None` if it is past the declared count or
    /// would extend past the end of the buffer.
    pub fn get(&self, index: usize) -> Option<R> {
        if index >= self.count {
            return None;
        }
        let offset = index
            .checked_mul(R::SIZE)
            .and_then(|rel| rel.checked_add(self.offset))?;
        R::parse(self.data, offset)
    }

    /// Iterate records in table order, stopping at the first unreadable one.
    pub fn iter(&self) -> impl Iterator<Item = R> + '_ {
        (0..self.count).map_while(move |i| self.get(i))
    }

    pub(crate) fn data(&self) -> &'a [u8] {
        self.data
    }
}
