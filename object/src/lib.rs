//! Class model of a JVM heap dump.
//!
//! Holds what the navigator needs to interpret aux records: class
//! definitions with their reference fields, the store that resolves class
//! ids and well-known classes, and the reasons an object can be a GC root.

mod basic_type;
mod class;
mod root;
mod store;

pub use basic_type::BasicType;
pub use class::{
    ARRAY_PREAMBLE_SIZE, ClassDefinition, InstanceField, PrimitiveStaticField,
    StaticField,
};
pub use root::RootReason;
pub use store::{
    CLASS_CLASS_NAME, ClassKind, ClassStore, DIRECT_BYTE_BUFFER_CLASS_NAME,
    SOFT_REFERENCE_CLASS_NAME, STRING_CLASS_NAME, SuperChain,
    WEAK_REFERENCE_CLASS_NAME, WellKnownClasses,
};
