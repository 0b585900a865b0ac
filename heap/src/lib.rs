//! On-disk side of a processed heap dump.
//!
//! The dump pass (not part of this crate) produces three files:
//! - the offset table, one 4-byte entry per object id,
//! - the aux buffer with one LEB128 encoded record per object,
//! - the heap index with the class store and the GC roots.
//!
//! This crate maps and reads them. [`AuxWriter`] produces the aux files for
//! tests and tooling.

mod aux;
mod error;
mod index;
pub mod leb128;
mod system;
mod writer;

pub use aux::{AuxFiles, AuxReader, OFFSET_ENTRY_SIZE, OffsetTable};
pub use error::AuxError;
pub use index::{HeapIndex, load_index, read_index, save_index, write_index};
pub use system::MappedFile;
pub use writer::{AuxWriter, InstanceExtra};
