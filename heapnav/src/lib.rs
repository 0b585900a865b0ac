//! Cursor navigation over a processed JVM heap dump.
//!
//! [`HeapDump`] opens the index and maps the aux files; its
//! [`AuxNavigator`] moves from object to object with
//! [`ObjectNavigator::go_to`], decoding class, size and outgoing references
//! of one object at a time. [`mark_strongly_reachable`] drives a navigator
//! over the whole heap.

mod aux_navigator;
mod decode;
mod dump;
mod error;
mod mark;
mod navigator;
mod roots;
pub mod strings;

#[cfg(test)]
mod fixtures;

pub use aux_navigator::AuxNavigator;
pub use decode::{DecodedObject, Decoder, ObjectShape, REFERENT_FIELD_NAME};
pub use dump::{AUX_EXTENSION, DumpPaths, HeapDump, OFFSETS_EXTENSION};
pub use error::NavigatorError;
pub use mark::{MarkBits, MarkResult, mark_strongly_reachable};
pub use navigator::{ObjectNavigator, ReferenceResolution, RootObject};
pub use roots::RootReasons;
