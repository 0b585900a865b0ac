use crate::BasicType;

/// Size of the array header (object header plus length) added on top of
/// the element payload.
pub const ARRAY_PREAMBLE_SIZE: u64 = 16;

/// A non-static field declared by a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceField {
    pub name: String,
    /// Byte offset of the value inside an instance of the declaring class.
    pub offset: u32,
    pub field_type: BasicType,
}

/// An object-typed static field together with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticField {
    pub name: String,
    pub value: u64,
}

/// A primitive static field. Only the declaration is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveStaticField {
    pub name: String,
    pub field_type: BasicType,
}

/// Everything the navigator knows about one class.
///
/// `id` is the object id of the class object, which is also the class id
/// written into aux records of its instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    pub name: String,
    pub id: u64,
    /// `0` for `java.lang.Object` and for interfaces' roots.
    pub super_class_id: u64,
    pub class_loader_id: u64,
    pub instance_size: u32,
    /// Reference-typed instance fields declared by this class, in
    /// declaration order. Inherited fields live on the super classes.
    pub ref_instance_fields: Vec<InstanceField>,
    pub primitive_instance_fields: Vec<InstanceField>,
    /// Constant pool entries that are object references.
    pub constant_fields: Vec<u64>,
    pub static_fields: Vec<StaticField>,
    pub primitive_static_fields: Vec<PrimitiveStaticField>,
}

impl ClassDefinition {
    /// A class with no fields. Mostly useful to start building one.
    pub fn new(name: impl Into<String>, id: u64, super_class_id: u64) -> Self {
        Self {
            name: name.into(),
            id,
            super_class_id,
            class_loader_id: 0,
            instance_size: 0,
            ref_instance_fields: Vec::new(),
            primitive_instance_fields: Vec::new(),
            constant_fields: Vec::new(),
            static_fields: Vec::new(),
            primitive_static_fields: Vec::new(),
        }
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.name.starts_with('[')
    }

    #[inline]
    pub fn is_primitive_array(&self) -> bool {
        self.primitive_array_element_type().is_some()
    }

    #[inline]
    pub fn primitive_array_element_type(&self) -> Option<BasicType> {
        BasicType::from_array_descriptor(self.undecorated_name())
    }

    /// Name without the `!N` suffix the producer appends when several
    /// loaders define classes with the same name.
    pub fn undecorated_name(&self) -> &str {
        match self.name.rfind('!') {
            Some(index) => &self.name[..index],
            None => &self.name,
        }
    }

    /// Java source spelling of the class name.
    ///
    /// ```text
    /// [B                   -> byte[]
    /// [[Ljava.lang.String; -> java.lang.String[][]
    /// java.util.HashMap    -> java.util.HashMap
    /// ```
    pub fn pretty_name(&self) -> String {
        let name = self.undecorated_name();
        let dimensions = name.bytes().take_while(|&b| b == b'[').count();
        if dimensions == 0 {
            return name.to_string();
        }

        let element = &name[dimensions..];
        let base = match element.strip_prefix('L') {
            Some(rest) => rest.strip_suffix(';').unwrap_or(rest).to_string(),
            None => {
                let descriptor = format!("[{element}");
                match BasicType::from_array_descriptor(&descriptor)
                    .and_then(BasicType::java_name)
                {
                    Some(java_name) => java_name.to_string(),
                    None => element.to_string(),
                }
            }
        };

        let mut pretty = base;
        for _ in 0..dimensions {
            pretty.push_str("[]");
        }
        pretty
    }

    pub fn static_field(&self, name: &str) -> Option<&StaticField> {
        self.static_fields.iter().find(|field| field.name == name)
    }
}
