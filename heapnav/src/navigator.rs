use object::{ClassDefinition, ClassStore, RootReason};

use crate::NavigatorError;

/// Which references [`ObjectNavigator::go_to`] collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceResolution {
    /// Every reference, including soft/weak referents.
    AllReferences,
    /// Soft/weak referent slots are reported as 0.
    #[default]
    OnlyStrongReferences,
    /// No references are collected at all.
    NoReferences,
}

impl ReferenceResolution {
    #[inline]
    pub fn computes_references(self) -> bool {
        self != Self::NoReferences
    }
}

/// A GC root and why it is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootObject<'a> {
    pub id: u64,
    pub reason: &'a RootReason,
}

/// Cursor over the objects of a heap dump.
///
/// The cursor sits on exactly one object at a time. [`go_to`] replaces all
/// decoded state of the previous object; there is no history.
///
/// [`go_to`]: ObjectNavigator::go_to
pub trait ObjectNavigator {
    fn classes(&self) -> &ClassStore;

    fn instance_count(&self) -> u64;

    /// Id of the current object. 0 when null or not positioned yet.
    fn id(&self) -> u64;

    fn go_to(&mut self, id: u64, resolution: ReferenceResolution) -> Result<(), NavigatorError>;

    /// True on the null object, and before the first `go_to`.
    fn is_null(&self) -> bool;

    fn class(&self) -> Result<&ClassDefinition, NavigatorError>;

    /// References of the current object in decode order.
    fn references(&self) -> Result<&[u64], NavigatorError>;

    fn object_size(&self) -> Result<u64, NavigatorError>;

    /// Referent of the current object if it is a soft reference, else 0.
    fn soft_reference_id(&self) -> u64;

    /// Referent of the current object if it is a weak reference, else 0.
    fn weak_reference_id(&self) -> u64;

    /// Slot of the referent in [`references`](Self::references).
    fn soft_weak_reference_index(&self) -> Option<usize>;

    /// String coder or direct buffer capacity of the current object.
    fn extra_data(&self) -> u64;

    fn array_length(&self) -> Option<u64>;

    /// Raw payload of the current primitive array.
    fn primitive_array_bytes(&self) -> Result<&[u8], NavigatorError>;

    /// Class of any object, without moving the cursor.
    fn class_for_object_id(&self, id: u64) -> Result<&ClassDefinition, NavigatorError>;

    fn root_reason_for_object_id(&self, id: u64) -> Option<&RootReason>;

    /// GC roots in ascending id order.
    fn roots(&self) -> Box<dyn Iterator<Item = RootObject<'_>> + '_>;

    /// Text of the current `java.lang.String`, `None` if its value is null.
    fn string_instance_field_value(&self) -> Result<Option<String>, NavigatorError>;

    fn references_copy(&self) -> Result<Vec<u64>, NavigatorError> {
        Ok(self.references()?.to_vec())
    }

    /// Replaces the contents of `out` with the current references.
    fn copy_references_to(&self, out: &mut Vec<u64>) -> Result<(), NavigatorError> {
        let references = self.references()?;
        out.clear();
        out.extend_from_slice(references);
        Ok(())
    }

    /// Value of a reference field of the current instance.
    ///
    /// When `class_name` is given, the current object must be an instance
    /// of exactly that class.
    fn instance_field_object_id(
        &self,
        class_name: Option<&str>,
        field_name: &str,
    ) -> Result<u64, NavigatorError> {
        let class = self.class()?;
        if let Some(expected) = class_name {
            if class.undecorated_name() != expected {
                return Err(NavigatorError::ClassMismatch {
                    expected: expected.to_string(),
                    actual: class.name.clone(),
                });
            }
        }

        let not_found = || NavigatorError::FieldNotFound {
            class: class.name.clone(),
            field: field_name.to_string(),
        };
        let index = self
            .classes()
            .all_ref_field_names(class)
            .iter()
            .position(|&name| name == field_name)
            .ok_or_else(not_found)?;
        self.references()?.get(index).copied().ok_or_else(not_found)
    }

    fn go_to_instance_field(
        &mut self,
        class_name: Option<&str>,
        field_name: &str,
    ) -> Result<(), NavigatorError> {
        let id = self.instance_field_object_id(class_name, field_name)?;
        self.go_to(id, ReferenceResolution::AllReferences)
    }

    /// Like [`go_to_instance_field`](Self::go_to_instance_field), but a
    /// missing field moves to null instead of failing.
    fn go_to_nullable_instance_field(
        &mut self,
        class_name: Option<&str>,
        field_name: &str,
    ) -> Result<(), NavigatorError> {
        let id = match self.instance_field_object_id(class_name, field_name) {
            Ok(id) => id,
            Err(NavigatorError::FieldNotFound { .. }) => 0,
            Err(err) => return Err(err),
        };
        self.go_to(id, ReferenceResolution::AllReferences)
    }

    fn static_field_object_id(
        &self,
        class_name: &str,
        field_name: &str,
    ) -> Result<u64, NavigatorError> {
        let class = self.classes().by_name(class_name).ok_or_else(|| {
            NavigatorError::ClassNotFound {
                name: class_name.to_string(),
            }
        })?;
        class
            .static_field(field_name)
            .map(|field| field.value)
            .ok_or_else(|| NavigatorError::FieldNotFound {
                class: class.name.clone(),
                field: field_name.to_string(),
            })
    }

    fn go_to_static_field(
        &mut self,
        class_name: &str,
        field_name: &str,
    ) -> Result<(), NavigatorError> {
        let id = self.static_field_object_id(class_name, field_name)?;
        self.go_to(id, ReferenceResolution::AllReferences)
    }
}
