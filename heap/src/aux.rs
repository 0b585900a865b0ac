//! Readers for the two aux files of a processed heap dump.
//!
//! ```text
//! offsets: [u32 BE offset of id 0] [u32 BE offset of id 1] ...
//! aux:     [LEB128 class id] [payload] [LEB128 class id] [payload] ...
//! ```
//!
//! Records have no length prefix, a record ends where the payload its
//! class prescribes ends.

use crate::{AuxError, leb128};

/// Size of one offset table entry.
pub const OFFSET_ENTRY_SIZE: usize = 4;

/// Object id to aux buffer offset.
///
/// Entries are 4 bytes, which caps the aux buffer at 4 GiB.
#[derive(Debug, Clone, Copy)]
pub struct OffsetTable<'a> {
    bytes: &'a [u8],
}

impl<'a> OffsetTable<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of ids the table covers, including the null id 0.
    pub fn len(&self) -> u64 {
        (self.bytes.len() / OFFSET_ENTRY_SIZE) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn offset_of(&self, id: u64) -> Result<usize, AuxError> {
        let start = usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_mul(OFFSET_ENTRY_SIZE))
            .ok_or(AuxError::MissingOffset { id })?;
        let end = start
            .checked_add(OFFSET_ENTRY_SIZE)
            .ok_or(AuxError::MissingOffset { id })?;
        let entry = self
            .bytes
            .get(start..end)
            .ok_or(AuxError::MissingOffset { id })?;
        let mut raw = [0u8; OFFSET_ENTRY_SIZE];
        raw.copy_from_slice(entry);
        Ok(u32::from_be_bytes(raw) as usize)
    }
}

/// Forward-only cursor over the aux buffer.
#[derive(Debug, Clone)]
pub struct AuxReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> AuxReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::at(bytes, 0)
    }

    pub fn at(bytes: &'a [u8], position: usize) -> Self {
        Self { bytes, position }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, AuxError> {
        let byte = *self.bytes.get(self.position).ok_or(AuxError::UnexpectedEof {
            offset: self.position,
            needed: 1,
        })?;
        self.position += 1;
        Ok(byte)
    }

    #[inline]
    pub fn read_leb128(&mut self) -> Result<u64, AuxError> {
        let tail = self.bytes.get(self.position..).unwrap_or(&[]);
        let (value, len) = leb128::decode_u64(tail, self.position)?;
        self.position += len;
        Ok(value)
    }

    /// Object and class ids are plain LEB128 values.
    #[inline]
    pub fn read_id(&mut self) -> Result<u64, AuxError> {
        self.read_leb128()
    }

    /// A LEB128 count that must fit a non-negative `i32`.
    #[inline]
    pub fn read_count(&mut self) -> Result<u32, AuxError> {
        let offset = self.position;
        let value = self.read_leb128()?;
        if value > i32::MAX as u64 {
            return Err(AuxError::CountOutOfRange { offset, value });
        }
        Ok(value as u32)
    }

    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], AuxError> {
        let eof = AuxError::UnexpectedEof {
            offset: self.position,
            needed: len.saturating_sub(self.remaining()),
        };
        let end = self.position.checked_add(len).ok_or(eof.clone())?;
        let bytes = self.bytes.get(self.position..end).ok_or(eof)?;
        self.position = end;
        Ok(bytes)
    }
}

/// The offset table together with the aux buffer it indexes.
#[derive(Debug, Clone, Copy)]
pub struct AuxFiles<'a> {
    offsets: OffsetTable<'a>,
    aux: &'a [u8],
}

impl<'a> AuxFiles<'a> {
    pub fn new(offsets: &'a [u8], aux: &'a [u8]) -> Self {
        Self {
            offsets: OffsetTable::new(offsets),
            aux,
        }
    }

    #[inline]
    pub fn offsets(&self) -> OffsetTable<'a> {
        self.offsets
    }

    #[inline]
    pub fn aux(&self) -> &'a [u8] {
        self.aux
    }

    /// Reader positioned at the start of `id`'s record.
    #[inline]
    pub fn record(&self, id: u64) -> Result<AuxReader<'a>, AuxError> {
        let offset = self.offsets.offset_of(id)?;
        Ok(AuxReader::at(self.aux, offset))
    }
}
