//! Decoding of single aux records.
//!
//! Record layout after the LEB128 class id:
//!
//! ```text
//! class id 0       class object, no payload
//! primitive array  [count] [element_size * count raw bytes]
//! object array     [null count] [non-null count] [non-null ids...]
//! instance         [one id per reference field, concrete class first]
//!                  [String: coder byte | DirectByteBuffer: LEB128 capacity]
//! ```

use heap::{AuxError, AuxFiles, AuxReader};
use object::{ARRAY_PREAMBLE_SIZE, BasicType, ClassDefinition, ClassKind, ClassStore};

use crate::{NavigatorError, ReferenceResolution};

/// Field of `java.lang.ref.Reference` that holds the soft/weak referent.
pub const REFERENT_FIELD_NAME: &str = "referent";

/// What kind of record an object was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectShape<'a> {
    Null,
    /// The object is a class. Its definition is `store.get(id)`.
    Class,
    PrimitiveArray {
        element_type: BasicType,
        length: u64,
        data: &'a [u8],
    },
    ObjectArray {
        length: u64,
        null_count: u64,
    },
    Instance,
}

/// Everything decoded for one object. Produced fresh by every
/// [`Decoder::decode`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedObject<'a> {
    pub id: u64,
    /// `None` only for the null object. Class objects get the class of
    /// classes.
    pub class: Option<&'a ClassDefinition>,
    pub shape: ObjectShape<'a>,
    /// `None` when decoded with [`ReferenceResolution::NoReferences`].
    pub references: Option<Vec<u64>>,
    pub soft_reference_id: u64,
    pub weak_reference_id: u64,
    /// Slot of the referent in `references` for soft/weak references.
    pub soft_weak_reference_index: Option<usize>,
    /// String coder or direct buffer capacity, 0 otherwise.
    pub extra_data: u64,
    pub size: u64,
}

impl DecodedObject<'_> {
    pub fn null() -> Self {
        Self {
            id: 0,
            class: None,
            shape: ObjectShape::Null,
            references: Some(Vec::new()),
            soft_reference_id: 0,
            weak_reference_id: 0,
            soft_weak_reference_index: None,
            extra_data: 0,
            size: 0,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.id == 0
    }

    pub fn array_length(&self) -> Option<u64> {
        match self.shape {
            ObjectShape::PrimitiveArray { length, .. }
            | ObjectShape::ObjectArray { length, .. } => Some(length),
            _ => None,
        }
    }
}

/// Stateless decoder over the aux files of one dump.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    files: AuxFiles<'a>,
    classes: &'a ClassStore,
    id_size: u32,
}

impl<'a> Decoder<'a> {
    pub fn new(files: AuxFiles<'a>, classes: &'a ClassStore, id_size: u32) -> Self {
        Self {
            files,
            classes,
            id_size,
        }
    }

    #[inline]
    pub fn classes(&self) -> &'a ClassStore {
        self.classes
    }

    #[inline]
    pub fn id_size(&self) -> u32 {
        self.id_size
    }

    #[inline]
    pub fn files(&self) -> AuxFiles<'a> {
        self.files
    }

    /// Class of `id` without decoding the rest of its record.
    pub fn class_of(&self, id: u64) -> Result<Option<&'a ClassDefinition>, NavigatorError> {
        if id == 0 {
            return Ok(None);
        }
        let class_id = self.files.record(id)?.read_id()?;
        self.resolve_class(id, class_id).map(Some)
    }

    pub fn decode(
        &self,
        id: u64,
        resolution: ReferenceResolution,
    ) -> Result<DecodedObject<'a>, NavigatorError> {
        if id == 0 {
            return Ok(DecodedObject::null());
        }

        let mut reader = self.files.record(id)?;
        let class_id = reader.read_id()?;
        let class = self.resolve_class(id, class_id)?;

        let decoded = if class_id == 0 {
            self.decode_class_object(id, class, resolution)?
        } else if let Some(element_type) = class.primitive_array_element_type() {
            self.decode_primitive_array(id, class, element_type, &mut reader, resolution)?
        } else if class.is_array() {
            self.decode_object_array(id, class, &mut reader, resolution)?
        } else {
            self.decode_instance(id, class, &mut reader, resolution)?
        };

        log::trace!(
            "decoded object {id}: {} ({} bytes, {} references)",
            class.name,
            decoded.size,
            decoded.references.as_ref().map_or(0, Vec::len)
        );
        Ok(decoded)
    }

    fn resolve_class(&self, id: u64, class_id: u64) -> Result<&'a ClassDefinition, NavigatorError> {
        if class_id == 0 {
            // the object is itself a class, it must be in the store
            self.classes
                .get(id)
                .ok_or(NavigatorError::UnknownClass { id, class_id: id })?;
            return Ok(self.classes.class_class());
        }
        self.classes
            .get(class_id)
            .ok_or(NavigatorError::UnknownClass { id, class_id })
    }

    fn decode_class_object(
        &self,
        id: u64,
        class_class: &'a ClassDefinition,
        resolution: ReferenceResolution,
    ) -> Result<DecodedObject<'a>, NavigatorError> {
        let described = self
            .classes
            .get(id)
            .ok_or(NavigatorError::UnknownClass { id, class_id: id })?;

        let references = resolution.computes_references().then(|| {
            let mut references = Vec::with_capacity(
                described.constant_fields.len() + described.static_fields.len() + 1,
            );
            references.extend_from_slice(&described.constant_fields);
            references.extend(described.static_fields.iter().map(|f| f.value));
            references.push(described.class_loader_id);
            references
        });

        Ok(DecodedObject {
            id,
            class: Some(class_class),
            shape: ObjectShape::Class,
            references,
            soft_reference_id: 0,
            weak_reference_id: 0,
            soft_weak_reference_index: None,
            extra_data: 0,
            size: class_class.instance_size as u64,
        })
    }

    fn decode_primitive_array(
        &self,
        id: u64,
        class: &'a ClassDefinition,
        element_type: BasicType,
        reader: &mut AuxReader<'a>,
        resolution: ReferenceResolution,
    ) -> Result<DecodedObject<'a>, NavigatorError> {
        let offset = reader.position();
        let length = reader.read_count()? as u64;
        let element_size = element_type.size(self.id_size) as u64;
        let byte_len = usize::try_from(element_size * length)
            .map_err(|_| AuxError::CountOutOfRange { offset, value: length })?;
        let data = reader.read_bytes(byte_len)?;

        Ok(DecodedObject {
            id,
            class: Some(class),
            shape: ObjectShape::PrimitiveArray {
                element_type,
                length,
                data,
            },
            references: resolution.computes_references().then(Vec::new),
            soft_reference_id: 0,
            weak_reference_id: 0,
            soft_weak_reference_index: None,
            extra_data: 0,
            size: array_size(class, element_size, length),
        })
    }

    fn decode_object_array(
        &self,
        id: u64,
        class: &'a ClassDefinition,
        reader: &mut AuxReader<'a>,
        resolution: ReferenceResolution,
    ) -> Result<DecodedObject<'a>, NavigatorError> {
        let null_count = reader.read_count()? as u64;
        let non_null_count = reader.read_count()? as u64;

        // every id takes at least one byte, a larger count is corrupt
        let capacity = non_null_count.min(reader.remaining() as u64) as usize;
        let mut references = resolution
            .computes_references()
            .then(|| Vec::with_capacity(capacity));
        for _ in 0..non_null_count {
            let element = reader.read_id()?;
            if let Some(references) = references.as_mut() {
                references.push(element);
            }
        }

        let length = null_count + non_null_count;
        Ok(DecodedObject {
            id,
            class: Some(class),
            shape: ObjectShape::ObjectArray { length, null_count },
            references,
            soft_reference_id: 0,
            weak_reference_id: 0,
            soft_weak_reference_index: None,
            extra_data: 0,
            size: array_size(class, self.id_size as u64, length),
        })
    }

    fn decode_instance(
        &self,
        id: u64,
        class: &'a ClassDefinition,
        reader: &mut AuxReader<'a>,
        resolution: ReferenceResolution,
    ) -> Result<DecodedObject<'a>, NavigatorError> {
        let kind = self.classes.kind(class.id);
        let is_soft_or_weak =
            matches!(kind, ClassKind::SoftReference | ClassKind::WeakReference);

        let mut references = resolution.computes_references().then(Vec::new);
        let mut slot = 0usize;
        let mut soft_weak_reference_index = None;
        let mut referent_id = 0;

        for declaring in self.classes.super_chain(class) {
            for field in &declaring.ref_instance_fields {
                let mut value = reader.read_id()?;
                if is_soft_or_weak
                    && soft_weak_reference_index.is_none()
                    && field.name == REFERENT_FIELD_NAME
                {
                    soft_weak_reference_index = Some(slot);
                    referent_id = value;
                    // soft/weak referents must not keep objects alive
                    if resolution != ReferenceResolution::AllReferences {
                        value = 0;
                    }
                }
                if let Some(references) = references.as_mut() {
                    references.push(value);
                }
                slot += 1;
            }
        }
        if let Some(references) = references.as_mut() {
            references.push(class.id);
        }

        let extra_data = match kind {
            ClassKind::String => reader.read_u8()? as u64,
            ClassKind::DirectByteBuffer => reader.read_leb128()?,
            _ => 0,
        };

        let (soft_reference_id, weak_reference_id) = match kind {
            ClassKind::SoftReference => (referent_id, 0),
            ClassKind::WeakReference => (0, referent_id),
            _ => (0, 0),
        };

        Ok(DecodedObject {
            id,
            class: Some(class),
            shape: ObjectShape::Instance,
            references,
            soft_reference_id,
            weak_reference_id,
            soft_weak_reference_index,
            extra_data,
            size: class.instance_size as u64,
        })
    }
}

#[inline]
fn array_size(class: &ClassDefinition, element_size: u64, length: u64) -> u64 {
    class.instance_size as u64 + element_size * length + ARRAY_PREAMBLE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use heap::{AuxWriter, InstanceExtra, OFFSET_ENTRY_SIZE};
    use object::{InstanceField, StaticField};

    fn classes() -> ClassStore {
        let mut node = ClassDefinition::new("com.example.Node", 2, 1);
        node.instance_size = 24;
        node.ref_instance_fields = ["left", "right"]
            .iter()
            .enumerate()
            .map(|(i, name)| InstanceField {
                name: name.to_string(),
                offset: 12 + 4 * i as u32,
                field_type: BasicType::Object,
            })
            .collect();
        node.static_fields = vec![StaticField {
            name: "ROOT".to_string(),
            value: 5,
        }];
        ClassStore::new([
            ClassDefinition::new("java.lang.Object", 1, 0),
            node,
            ClassDefinition::new("[Ljava.lang.Object;", 3, 1),
            ClassDefinition::new("[I", 4, 1),
        ])
    }

    /// Offset table where every id up to `id` starts at aux offset 0.
    fn single_record(id: u64) -> Vec<u8> {
        vec![0u8; (id as usize + 1) * OFFSET_ENTRY_SIZE]
    }

    fn decode(
        offsets: &[u8],
        aux: &[u8],
        id: u64,
    ) -> Result<(Option<String>, Option<Vec<u64>>), NavigatorError> {
        let classes = classes();
        let decoder = Decoder::new(AuxFiles::new(offsets, aux), &classes, 4);
        let decoded = decoder.decode(id, ReferenceResolution::AllReferences)?;
        Ok((decoded.class.map(|c| c.name.clone()), decoded.references))
    }

    #[test]
    fn well_formed_records() {
        let mut writer = AuxWriter::new();
        writer.write_class_object(2).unwrap();
        writer.write_instance(5, 2, &[0, 2], InstanceExtra::None).unwrap();
        writer.write_object_array(6, 3, &[5, 0]).unwrap();
        let (offsets, aux) = writer.finish();

        assert_eq!(
            decode(&offsets, &aux, 5),
            Ok((Some("com.example.Node".to_string()), Some(vec![0, 2, 2])))
        );
        assert_eq!(
            decode(&offsets, &aux, 6),
            Ok((Some("[Ljava.lang.Object;".to_string()), Some(vec![5])))
        );
        // ROOT static, then the zero class loader
        assert_eq!(
            decode(&offsets, &aux, 2),
            Ok((Some("java.lang.Class".to_string()), Some(vec![5, 0])))
        );
    }

    #[test]
    fn huge_object_array_count_is_eof_not_allocation() {
        // class 3, no nulls, i32::MAX non-null elements, no ids
        let aux = [0x03, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x07];
        assert_eq!(
            decode(&single_record(7), &aux, 7),
            Err(NavigatorError::Aux(AuxError::UnexpectedEof {
                offset: aux.len(),
                needed: 1
            }))
        );
    }

    #[test]
    fn huge_primitive_array_count_is_eof() {
        // class [I with i32::MAX elements and four bytes of payload
        let aux = [0x04, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 1, 2, 3, 4];
        assert!(matches!(
            decode(&single_record(7), &aux, 7),
            Err(NavigatorError::Aux(AuxError::UnexpectedEof { offset: 6, .. }))
        ));
    }

    #[test]
    fn unknown_class_id() {
        let aux = [0x09, 0x00];
        assert_eq!(
            decode(&single_record(7), &aux, 7),
            Err(NavigatorError::UnknownClass { id: 7, class_id: 9 })
        );
    }

    #[test]
    fn class_object_missing_from_store() {
        let aux = [0x00];
        assert_eq!(
            decode(&single_record(7), &aux, 7),
            Err(NavigatorError::UnknownClass { id: 7, class_id: 7 })
        );
    }

    #[test]
    fn instance_cut_short_mid_field() {
        // Node declares two fields, the record holds one and half of another
        let aux = [0x02, 0x05, 0x80];
        assert_eq!(
            decode(&single_record(7), &aux, 7),
            Err(NavigatorError::Aux(AuxError::UnexpectedEof {
                offset: 3,
                needed: 1
            }))
        );
    }

    #[test]
    fn class_lookup_reports_unknown_class() {
        let aux = [0x09];
        let offsets = single_record(7);
        let classes = classes();
        let decoder = Decoder::new(AuxFiles::new(&offsets, &aux), &classes, 4);
        assert_eq!(
            decoder.class_of(7),
            Err(NavigatorError::UnknownClass { id: 7, class_id: 9 })
        );
        assert_eq!(decoder.class_of(0), Ok(None));
    }
}
