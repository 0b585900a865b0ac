use heap::AuxError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigatorError {
    #[error(transparent)]
    Aux(#[from] AuxError),

    #[error("navigator is not positioned on an object")]
    NotPositioned,

    #[error("current object is null")]
    NullObject,

    #[error("references of object {id} were not computed")]
    ReferencesNotComputed { id: u64 },

    #[error("object id {id} is above the instance count {instance_count}")]
    IdOutOfRange { id: u64, instance_count: u64 },

    #[error("object {id} has unknown class id {class_id}")]
    UnknownClass { id: u64, class_id: u64 },

    #[error("no class named {name}")]
    ClassNotFound { name: String },

    #[error("class {class} has no field named {field}")]
    FieldNotFound { class: String, field: String },

    #[error("expected an instance of {expected}, found {actual}")]
    ClassMismatch { expected: String, actual: String },

    #[error("object {id} of class {class} cannot back a string")]
    NotAString { id: u64, class: String },

    #[error("unsupported string coder {coder}")]
    UnsupportedStringCoder { coder: u64 },
}
