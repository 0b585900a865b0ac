use std::fmt;

use crate::ClassDefinition;

/// Why an object is considered reachable from a GC root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootReason {
    Unknown,
    GlobalJni,
    LocalJni,
    JavaFrame,
    NativeStack,
    StickyClass,
    ThreadBlock,
    ThreadObject,
    MonitorUsed,
    /// Referenced from the constant pool of a class.
    ClassConstant { class_name: String, index: usize },
    /// Value of an object-typed static field.
    StaticField {
        class_name: String,
        field_name: String,
    },
    /// The object is a class definition.
    ClassDefinition { class_name: String },
}

impl RootReason {
    // HPROF heap dump sub-record tags of the root kinds.
    pub const TAG_UNKNOWN: u8 = 0xFF;
    pub const TAG_JNI_GLOBAL: u8 = 0x01;
    pub const TAG_JNI_LOCAL: u8 = 0x02;
    pub const TAG_JAVA_FRAME: u8 = 0x03;
    pub const TAG_NATIVE_STACK: u8 = 0x04;
    pub const TAG_STICKY_CLASS: u8 = 0x05;
    pub const TAG_THREAD_BLOCK: u8 = 0x06;
    pub const TAG_MONITOR_USED: u8 = 0x07;
    pub const TAG_THREAD_OBJECT: u8 = 0x08;

    pub fn from_tag(tag: u8) -> Option<Self> {
        let reason = match tag {
            Self::TAG_UNKNOWN => Self::Unknown,
            Self::TAG_JNI_GLOBAL => Self::GlobalJni,
            Self::TAG_JNI_LOCAL => Self::LocalJni,
            Self::TAG_JAVA_FRAME => Self::JavaFrame,
            Self::TAG_NATIVE_STACK => Self::NativeStack,
            Self::TAG_STICKY_CLASS => Self::StickyClass,
            Self::TAG_THREAD_BLOCK => Self::ThreadBlock,
            Self::TAG_MONITOR_USED => Self::MonitorUsed,
            Self::TAG_THREAD_OBJECT => Self::ThreadObject,
            _ => return None,
        };
        Some(reason)
    }

    /// Sub-record tag of a canned reason. Class derived reasons have none.
    pub fn tag(&self) -> Option<u8> {
        match self {
            Self::Unknown => Some(Self::TAG_UNKNOWN),
            Self::GlobalJni => Some(Self::TAG_JNI_GLOBAL),
            Self::LocalJni => Some(Self::TAG_JNI_LOCAL),
            Self::JavaFrame => Some(Self::TAG_JAVA_FRAME),
            Self::NativeStack => Some(Self::TAG_NATIVE_STACK),
            Self::StickyClass => Some(Self::TAG_STICKY_CLASS),
            Self::ThreadBlock => Some(Self::TAG_THREAD_BLOCK),
            Self::MonitorUsed => Some(Self::TAG_MONITOR_USED),
            Self::ThreadObject => Some(Self::TAG_THREAD_OBJECT),
            Self::ClassConstant { .. }
            | Self::StaticField { .. }
            | Self::ClassDefinition { .. } => None,
        }
    }

    pub fn class_constant(class: &ClassDefinition, index: usize) -> Self {
        Self::ClassConstant {
            class_name: class.pretty_name(),
            index,
        }
    }

    pub fn static_field(class: &ClassDefinition, field_name: &str) -> Self {
        Self::StaticField {
            class_name: class.pretty_name(),
            field_name: field_name.to_string(),
        }
    }

    pub fn class_definition(class: &ClassDefinition) -> Self {
        Self::ClassDefinition {
            class_name: class.pretty_name(),
        }
    }
}

impl fmt::Display for RootReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            Self::GlobalJni => f.write_str("Global JNI"),
            Self::LocalJni => f.write_str("Local JNI"),
            Self::JavaFrame => f.write_str("Java frame"),
            Self::NativeStack => f.write_str("Native stack"),
            Self::StickyClass => f.write_str("Sticky class"),
            Self::ThreadBlock => f.write_str("Thread block"),
            Self::ThreadObject => f.write_str("Thread object"),
            Self::MonitorUsed => f.write_str("Monitor used"),
            Self::ClassConstant { class_name, index } => {
                write!(f, "Class constant: {class_name}, index: {index}")
            }
            Self::StaticField {
                class_name,
                field_name,
            } => write!(f, "Static field: {class_name}.{field_name}"),
            Self::ClassDefinition { class_name } => {
                write!(f, "Class definition: {class_name}")
            }
        }
    }
}
