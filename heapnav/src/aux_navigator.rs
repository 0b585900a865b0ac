use heap::AuxFiles;
use object::{ClassDefinition, ClassKind, ClassStore, RootReason, STRING_CLASS_NAME};

use crate::{
    DecodedObject, Decoder, NavigatorError, ObjectNavigator, ObjectShape,
    ReferenceResolution, RootObject, RootReasons, strings,
};

/// Field of `java.lang.String` that holds the backing array.
const STRING_VALUE_FIELD_NAME: &str = "value";

/// [`ObjectNavigator`] over memory-mapped aux files.
pub struct AuxNavigator<'a> {
    decoder: Decoder<'a>,
    roots: &'a RootReasons,
    instance_count: u64,
    current: Option<DecodedObject<'a>>,
}

impl<'a> AuxNavigator<'a> {
    pub fn new(
        files: AuxFiles<'a>,
        classes: &'a ClassStore,
        roots: &'a RootReasons,
        id_size: u32,
        instance_count: u64,
    ) -> Self {
        Self {
            decoder: Decoder::new(files, classes, id_size),
            roots,
            instance_count,
            current: None,
        }
    }

    /// The decoded record under the cursor.
    pub fn current(&self) -> Option<&DecodedObject<'a>> {
        self.current.as_ref()
    }

    fn positioned(&self) -> Result<&DecodedObject<'a>, NavigatorError> {
        self.current.as_ref().ok_or(NavigatorError::NotPositioned)
    }
}

impl ObjectNavigator for AuxNavigator<'_> {
    fn classes(&self) -> &ClassStore {
        self.decoder.classes()
    }

    fn instance_count(&self) -> u64 {
        self.instance_count
    }

    fn id(&self) -> u64 {
        self.current.as_ref().map_or(0, |current| current.id)
    }

    fn go_to(&mut self, id: u64, resolution: ReferenceResolution) -> Result<(), NavigatorError> {
        // decode first so a failure leaves the cursor where it was
        let decoded = self.decoder.decode(id, resolution)?;
        self.current = Some(decoded);
        Ok(())
    }

    fn is_null(&self) -> bool {
        self.current.as_ref().is_none_or(DecodedObject::is_null)
    }

    fn class(&self) -> Result<&ClassDefinition, NavigatorError> {
        self.positioned()?.class.ok_or(NavigatorError::NullObject)
    }

    fn references(&self) -> Result<&[u64], NavigatorError> {
        let current = self.positioned()?;
        current
            .references
            .as_deref()
            .ok_or(NavigatorError::ReferencesNotComputed { id: current.id })
    }

    fn object_size(&self) -> Result<u64, NavigatorError> {
        Ok(self.positioned()?.size)
    }

    fn soft_reference_id(&self) -> u64 {
        self.current.as_ref().map_or(0, |c| c.soft_reference_id)
    }

    fn weak_reference_id(&self) -> u64 {
        self.current.as_ref().map_or(0, |c| c.weak_reference_id)
    }

    fn soft_weak_reference_index(&self) -> Option<usize> {
        self.current.as_ref()?.soft_weak_reference_index
    }

    fn extra_data(&self) -> u64 {
        self.current.as_ref().map_or(0, |c| c.extra_data)
    }

    fn array_length(&self) -> Option<u64> {
        self.current.as_ref()?.array_length()
    }

    fn primitive_array_bytes(&self) -> Result<&[u8], NavigatorError> {
        let current = self.positioned()?;
        match current.shape {
            ObjectShape::PrimitiveArray { data, .. } => Ok(data),
            ObjectShape::Null => Err(NavigatorError::NullObject),
            _ => Err(NavigatorError::ClassMismatch {
                expected: "primitive array".to_string(),
                actual: self.class()?.name.clone(),
            }),
        }
    }

    fn class_for_object_id(&self, id: u64) -> Result<&ClassDefinition, NavigatorError> {
        self.decoder.class_of(id)?.ok_or(NavigatorError::NullObject)
    }

    fn root_reason_for_object_id(&self, id: u64) -> Option<&RootReason> {
        self.roots.reason_for(id)
    }

    fn roots(&self) -> Box<dyn Iterator<Item = RootObject<'_>> + '_> {
        Box::new(self.roots.gc_roots())
    }

    fn string_instance_field_value(&self) -> Result<Option<String>, NavigatorError> {
        let current = self.positioned()?;
        let class = self.class()?;
        if self.classes().kind(class.id) != ClassKind::String {
            return Err(NavigatorError::ClassMismatch {
                expected: STRING_CLASS_NAME.to_string(),
                actual: class.name.clone(),
            });
        }

        let value_id = self.instance_field_object_id(None, STRING_VALUE_FIELD_NAME)?;
        if value_id == 0 {
            return Ok(None);
        }

        // decoded on the side, the cursor stays on the string
        let array = self.decoder.decode(value_id, ReferenceResolution::NoReferences)?;
        let (Some(array_class), ObjectShape::PrimitiveArray { data, .. }) =
            (array.class, &array.shape)
        else {
            return Err(NavigatorError::NotAString {
                id: value_id,
                class: array.class.map(|c| c.name.clone()).unwrap_or_default(),
            });
        };
        strings::decode_backing_array(value_id, array_class, data, current.extra_data)
            .map(Some)
    }
}
