use thiserror::Error;

/// Failure while reading the aux files.
///
/// None of these are recoverable: they mean the aux data is corrupt or was
/// produced for a different dump.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuxError {
    #[error("unexpected end of aux data at offset {offset}, needed {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("LEB128 value at offset {offset} does not fit in 64 bits")]
    Leb128Overflow { offset: usize },

    #[error("count {value} at offset {offset} exceeds i32::MAX")]
    CountOutOfRange { offset: usize, value: u64 },

    #[error("object id {id} has no entry in the offset table")]
    MissingOffset { id: u64 },

    #[error("aux offset {offset} does not fit a 4-byte offset table entry")]
    OffsetOverflow { offset: usize },
}
