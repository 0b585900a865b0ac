use std::collections::{BTreeMap, HashMap, hash_map::Entry};

use object::{ClassStore, RootReason};

use crate::RootObject;

/// Answers why an object is a root.
///
/// GC roots from the dump pass take precedence. Any other id is looked up
/// in an index derived from the class store, where the first class in
/// ascending id order wins, and within a class the class object itself
/// beats its static fields, which beat its constant pool.
#[derive(Debug, Clone, Default)]
pub struct RootReasons {
    gc_roots: BTreeMap<u64, RootReason>,
    class_derived: HashMap<u64, RootReason>,
}

impl RootReasons {
    pub fn new(gc_roots: BTreeMap<u64, RootReason>, classes: &ClassStore) -> Self {
        let mut class_derived = HashMap::new();
        for class in classes.iter() {
            insert_first(&mut class_derived, class.id, || {
                RootReason::class_definition(class)
            });
            for field in &class.static_fields {
                insert_first(&mut class_derived, field.value, || {
                    RootReason::static_field(class, &field.name)
                });
            }
            for (index, &constant) in class.constant_fields.iter().enumerate() {
                insert_first(&mut class_derived, constant, || {
                    RootReason::class_constant(class, index)
                });
            }
        }

        log::debug!(
            "root reasons: {} gc roots, {} class derived",
            gc_roots.len(),
            class_derived.len()
        );
        Self {
            gc_roots,
            class_derived,
        }
    }

    pub fn reason_for(&self, id: u64) -> Option<&RootReason> {
        self.gc_roots
            .get(&id)
            .or_else(|| self.class_derived.get(&id))
    }

    pub fn is_gc_root(&self, id: u64) -> bool {
        self.gc_roots.contains_key(&id)
    }

    /// GC roots in ascending id order.
    pub fn gc_roots(&self) -> impl Iterator<Item = RootObject<'_>> {
        self.gc_roots
            .iter()
            .map(|(&id, reason)| RootObject { id, reason })
    }

    pub fn gc_root_count(&self) -> usize {
        self.gc_roots.len()
    }
}

fn insert_first(
    reasons: &mut HashMap<u64, RootReason>,
    id: u64,
    reason: impl FnOnce() -> RootReason,
) {
    if id == 0 {
        return;
    }
    if let Entry::Vacant(entry) = reasons.entry(id) {
        entry.insert(reason());
    }
}
