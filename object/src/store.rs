use std::collections::{BTreeMap, HashMap};

use crate::ClassDefinition;

pub const CLASS_CLASS_NAME: &str = "java.lang.Class";
pub const SOFT_REFERENCE_CLASS_NAME: &str = "java.lang.ref.SoftReference";
pub const WEAK_REFERENCE_CLASS_NAME: &str = "java.lang.ref.WeakReference";
pub const STRING_CLASS_NAME: &str = "java.lang.String";
pub const DIRECT_BYTE_BUFFER_CLASS_NAME: &str = "java.nio.DirectByteBuffer";

/// How the decoder has to treat instances of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Plain,
    /// Is or extends `java.lang.ref.SoftReference`.
    SoftReference,
    /// Is or extends `java.lang.ref.WeakReference`.
    WeakReference,
    /// `java.lang.String`, carries a coder byte.
    String,
    /// Is or extends `java.nio.DirectByteBuffer`, carries a capacity.
    DirectByteBuffer,
}

/// Ids of the classes the decoder special-cases, if the dump has them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WellKnownClasses {
    pub soft_reference: Option<u64>,
    pub weak_reference: Option<u64>,
    pub string: Option<u64>,
    pub direct_byte_buffer: Option<u64>,
}

/// All class definitions of one heap dump.
#[derive(Debug, Clone)]
pub struct ClassStore {
    classes: BTreeMap<u64, ClassDefinition>,
    by_name: HashMap<String, u64>,
    kinds: HashMap<u64, ClassKind>,
    well_known: WellKnownClasses,
    class_class: ClassDefinition,
}

impl ClassStore {
    pub fn new(classes: impl IntoIterator<Item = ClassDefinition>) -> Self {
        let classes: BTreeMap<u64, ClassDefinition> = classes
            .into_iter()
            .map(|class| (class.id, class))
            .collect();
        let by_name = classes
            .values()
            .map(|class| (class.name.clone(), class.id))
            .collect::<HashMap<_, _>>();

        let well_known = WellKnownClasses {
            soft_reference: by_name.get(SOFT_REFERENCE_CLASS_NAME).copied(),
            weak_reference: by_name.get(WEAK_REFERENCE_CLASS_NAME).copied(),
            string: by_name.get(STRING_CLASS_NAME).copied(),
            direct_byte_buffer: by_name
                .get(DIRECT_BYTE_BUFFER_CLASS_NAME)
                .copied(),
        };

        let class_class = by_name
            .get(CLASS_CLASS_NAME)
            .and_then(|id| classes.get(id))
            .cloned()
            .unwrap_or_else(|| ClassDefinition::new(CLASS_CLASS_NAME, 0, 0));

        let mut store = Self {
            classes,
            by_name,
            kinds: HashMap::new(),
            well_known,
            class_class,
        };
        store.kinds = store
            .classes
            .keys()
            .map(|&id| (id, store.resolve_kind(id)))
            .collect();
        store
    }

    #[inline]
    pub fn get(&self, id: u64) -> Option<&ClassDefinition> {
        self.classes.get(&id)
    }

    /// Lookup by full (possibly `!N` decorated) name.
    pub fn by_name(&self, name: &str) -> Option<&ClassDefinition> {
        self.by_name.get(name).and_then(|id| self.classes.get(id))
    }

    /// Definition used for objects that are themselves classes.
    #[inline]
    pub fn class_class(&self) -> &ClassDefinition {
        &self.class_class
    }

    #[inline]
    pub fn well_known(&self) -> &WellKnownClasses {
        &self.well_known
    }

    #[inline]
    pub fn kind(&self, id: u64) -> ClassKind {
        self.kinds.get(&id).copied().unwrap_or(ClassKind::Plain)
    }

    /// Classes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassDefinition> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// `class`, then its super classes up to the root.
    pub fn super_chain<'a>(&'a self, class: &'a ClassDefinition) -> SuperChain<'a> {
        SuperChain {
            store: self,
            next: Some(class),
            remaining: self.classes.len() + 1,
        }
    }

    /// Names of all reference fields of an instance of `class`, in the
    /// order the aux decoder emits their values.
    pub fn all_ref_field_names<'a>(&'a self, class: &'a ClassDefinition) -> Vec<&'a str> {
        self.super_chain(class)
            .flat_map(|c| c.ref_instance_fields.iter())
            .map(|field| field.name.as_str())
            .collect()
    }

    fn resolve_kind(&self, id: u64) -> ClassKind {
        let Some(class) = self.classes.get(&id) else {
            return ClassKind::Plain;
        };
        let wk = self.well_known;
        for c in self.super_chain(class) {
            let id = Some(c.id);
            if id == wk.soft_reference {
                return ClassKind::SoftReference;
            }
            if id == wk.weak_reference {
                return ClassKind::WeakReference;
            }
            if id == wk.string {
                return ClassKind::String;
            }
            if id == wk.direct_byte_buffer {
                return ClassKind::DirectByteBuffer;
            }
        }
        ClassKind::Plain
    }
}

/// Iterator returned by [`ClassStore::super_chain`].
///
/// Stops at a zero or unknown super class id. A cyclic chain in corrupt
/// data stops after `len + 1` steps.
pub struct SuperChain<'a> {
    store: &'a ClassStore,
    next: Option<&'a ClassDefinition>,
    remaining: usize,
}

impl<'a> Iterator for SuperChain<'a> {
    type Item = &'a ClassDefinition;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next.take()?;
        if current.super_class_id != 0 {
            self.next = self.store.get(current.super_class_id);
        }
        Some(current)
    }
}
