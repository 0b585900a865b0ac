/// HPROF basic type of a field or array element.
///
/// The discriminants are the tags HPROF writes in class dump and array
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BasicType {
    Object = 2,
    Boolean = 4,
    Char = 5,
    Float = 6,
    Double = 7,
    Byte = 8,
    Short = 9,
    Int = 10,
    Long = 11,
}

impl BasicType {
    #[inline]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            2 => Some(Self::Object),
            4 => Some(Self::Boolean),
            5 => Some(Self::Char),
            6 => Some(Self::Float),
            7 => Some(Self::Double),
            8 => Some(Self::Byte),
            9 => Some(Self::Short),
            10 => Some(Self::Int),
            11 => Some(Self::Long),
            _ => None,
        }
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Size in bytes of one value. Object references take `id_size`.
    #[inline]
    pub fn size(self, id_size: u32) -> u32 {
        match self {
            Self::Object => id_size,
            Self::Boolean | Self::Byte => 1,
            Self::Char | Self::Short => 2,
            Self::Float | Self::Int => 4,
            Self::Double | Self::Long => 8,
        }
    }

    /// Element type of a primitive array class name such as `[B`.
    pub fn from_array_descriptor(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() != 2 || bytes[0] != b'[' {
            return None;
        }
        match bytes[1] {
            b'Z' => Some(Self::Boolean),
            b'C' => Some(Self::Char),
            b'F' => Some(Self::Float),
            b'D' => Some(Self::Double),
            b'B' => Some(Self::Byte),
            b'S' => Some(Self::Short),
            b'I' => Some(Self::Int),
            b'J' => Some(Self::Long),
            _ => None,
        }
    }

    /// Java source name, `None` for object references.
    pub fn java_name(self) -> Option<&'static str> {
        match self {
            Self::Object => None,
            Self::Boolean => Some("boolean"),
            Self::Char => Some("char"),
            Self::Float => Some("float"),
            Self::Double => Some("double"),
            Self::Byte => Some("byte"),
            Self::Short => Some("short"),
            Self::Int => Some("int"),
            Self::Long => Some("long"),
        }
    }
}
