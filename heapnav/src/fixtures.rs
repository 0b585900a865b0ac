//! A small hand-built heap shared by the navigator tests.

use std::collections::BTreeMap;

use heap::{AuxError, AuxFiles, AuxWriter, InstanceExtra};
use object::{
    BasicType, ClassDefinition, ClassStore, InstanceField, RootReason, StaticField,
};

use crate::{AuxNavigator, RootReasons};

pub const ID_SIZE: u32 = 8;
pub const CLASS_INSTANCE_SIZE: u64 = 96;
pub const INSTANCE_COUNT: u64 = ids::LOADER;
pub const BUFFER_CAPACITY: u64 = 4096;
pub const BYTES_PAYLOAD: [u8; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

pub mod ids {
    pub const OBJECT_CLASS: u64 = 1;
    pub const CLASS_CLASS: u64 = 2;
    pub const REFERENCE_CLASS: u64 = 3;
    pub const SOFT_CLASS: u64 = 4;
    pub const WEAK_CLASS: u64 = 5;
    pub const STRING_CLASS: u64 = 6;
    pub const BYTES_CLASS: u64 = 7;
    pub const CHARS_CLASS: u64 = 8;
    pub const OBJECTS_CLASS: u64 = 9;
    pub const NODE_CLASS: u64 = 10;
    pub const BASE_CLASS: u64 = 11;
    pub const BUFFER_CLASS: u64 = 12;
    pub const WEAK_ENTRY_CLASS: u64 = 13;

    pub const NODE_A: u64 = 14;
    pub const NODE_B: u64 = 15;
    pub const BYTES: u64 = 16;
    pub const OBJECTS: u64 = 17;
    pub const SOFT: u64 = 18;
    pub const SOFT_REFERENT: u64 = 19;
    pub const WEAK_ENTRY: u64 = 20;
    pub const WEAK_REFERENT: u64 = 21;
    pub const LATIN1: u64 = 22;
    pub const LATIN1_BYTES: u64 = 23;
    pub const UTF16: u64 = 24;
    pub const UTF16_BYTES: u64 = 25;
    pub const LEGACY: u64 = 26;
    pub const CHARS: u64 = 27;
    pub const NULL_VALUE: u64 = 28;
    pub const BUFFER: u64 = 29;
    pub const LOADER: u64 = 30;
}

pub struct SampleHeap {
    pub classes: ClassStore,
    pub roots: RootReasons,
    pub offsets: Vec<u8>,
    pub aux: Vec<u8>,
}

impl SampleHeap {
    pub fn build() -> Self {
        let classes = classes();
        let roots = RootReasons::new(gc_roots(), &classes);
        let (offsets, aux) = sample_writer().finish();
        Self {
            classes,
            roots,
            offsets,
            aux,
        }
    }

    pub fn navigator(&self) -> AuxNavigator<'_> {
        AuxNavigator::new(
            AuxFiles::new(&self.offsets, &self.aux),
            &self.classes,
            &self.roots,
            ID_SIZE,
            INSTANCE_COUNT,
        )
    }
}

pub fn gc_roots() -> BTreeMap<u64, RootReason> {
    BTreeMap::from([
        (ids::NODE_A, RootReason::JavaFrame),
        (ids::OBJECTS, RootReason::GlobalJni),
        (ids::SOFT, RootReason::StickyClass),
        (ids::WEAK_ENTRY, RootReason::Unknown),
    ])
}

fn ref_field(name: &str, offset: u32) -> InstanceField {
    InstanceField {
        name: name.to_string(),
        offset,
        field_type: BasicType::Object,
    }
}

fn class(name: &str, id: u64, super_class_id: u64, instance_size: u32) -> ClassDefinition {
    let mut class = ClassDefinition::new(name, id, super_class_id);
    class.instance_size = instance_size;
    class
}

fn classes() -> ClassStore {
    let mut reference = class("java.lang.ref.Reference", ids::REFERENCE_CLASS, 1, 32);
    reference.ref_instance_fields = vec![ref_field("referent", 12), ref_field("queue", 16)];

    let mut string = class("java.lang.String", ids::STRING_CLASS, 1, 24);
    string.ref_instance_fields = vec![ref_field("value", 12)];

    let mut node = class("com.example.Node", ids::NODE_CLASS, ids::BASE_CLASS, 24);
    node.ref_instance_fields = vec![ref_field("next", 16), ref_field("payload", 20)];

    let mut base = class("com.example.Base", ids::BASE_CLASS, 1, 16);
    base.ref_instance_fields = vec![ref_field("owner", 12)];
    base.class_loader_id = ids::LOADER;
    base.constant_fields = vec![ids::NODE_B];
    base.static_fields = vec![
        StaticField {
            name: "INSTANCE".to_string(),
            value: ids::NODE_A,
        },
        StaticField {
            name: "CACHE".to_string(),
            value: ids::LATIN1,
        },
    ];

    let mut buffer = class("java.nio.DirectByteBuffer", ids::BUFFER_CLASS, 1, 64);
    buffer.ref_instance_fields = vec![ref_field("att", 40)];

    let mut weak_entry = class(
        "java.util.WeakHashMap$Entry",
        ids::WEAK_ENTRY_CLASS,
        ids::WEAK_CLASS,
        40,
    );
    weak_entry.ref_instance_fields = vec![ref_field("value", 32)];

    ClassStore::new([
        class("java.lang.Object", ids::OBJECT_CLASS, 0, 16),
        class("java.lang.Class", ids::CLASS_CLASS, 1, CLASS_INSTANCE_SIZE as u32),
        reference,
        class("java.lang.ref.SoftReference", ids::SOFT_CLASS, ids::REFERENCE_CLASS, 32),
        class("java.lang.ref.WeakReference", ids::WEAK_CLASS, ids::REFERENCE_CLASS, 32),
        string,
        class("[B", ids::BYTES_CLASS, 1, 0),
        class("[C", ids::CHARS_CLASS, 1, 0),
        class("[Ljava.lang.Object;", ids::OBJECTS_CLASS, 1, 0),
        node,
        base,
        buffer,
        weak_entry,
    ])
}

fn utf16(text: &str, to_bytes: fn(u16) -> [u8; 2]) -> (u32, Vec<u8>) {
    let units: Vec<u16> = text.encode_utf16().collect();
    let data = units.iter().copied().flat_map(to_bytes).collect();
    (units.len() as u32, data)
}

/// Writer holding every record of the sample heap.
pub fn sample_writer() -> AuxWriter {
    let mut writer = AuxWriter::new();
    if let Err(err) = write_objects(&mut writer) {
        panic!("sample heap records: {err}");
    }
    writer
}

fn write_objects(writer: &mut AuxWriter) -> Result<(), AuxError> {
    for id in ids::OBJECT_CLASS..=ids::WEAK_ENTRY_CLASS {
        writer.write_class_object(id)?;
    }

    // Node: next, payload, then Base.owner
    writer.write_instance(
        ids::NODE_A,
        ids::NODE_CLASS,
        &[ids::NODE_B, ids::BYTES, 0],
        InstanceExtra::None,
    )?;
    writer.write_instance(
        ids::NODE_B,
        ids::NODE_CLASS,
        &[0, 0, ids::NODE_A],
        InstanceExtra::None,
    )?;
    writer.write_primitive_array(
        ids::BYTES,
        ids::BYTES_CLASS,
        BYTES_PAYLOAD.len() as u32,
        &BYTES_PAYLOAD,
    )?;
    writer.write_object_array(
        ids::OBJECTS,
        ids::OBJECTS_CLASS,
        &[0, ids::NODE_A, 0, ids::NODE_B, ids::BYTES],
    )?;

    writer.write_instance(
        ids::SOFT,
        ids::SOFT_CLASS,
        &[ids::SOFT_REFERENT, 0],
        InstanceExtra::None,
    )?;
    writer.write_instance(ids::SOFT_REFERENT, ids::OBJECT_CLASS, &[], InstanceExtra::None)?;
    // WeakHashMap$Entry.value, then Reference.referent and queue
    writer.write_instance(
        ids::WEAK_ENTRY,
        ids::WEAK_ENTRY_CLASS,
        &[ids::NODE_A, ids::WEAK_REFERENT, 0],
        InstanceExtra::None,
    )?;
    writer.write_instance(ids::WEAK_REFERENT, ids::OBJECT_CLASS, &[], InstanceExtra::None)?;

    writer.write_instance(
        ids::LATIN1,
        ids::STRING_CLASS,
        &[ids::LATIN1_BYTES],
        InstanceExtra::StringCoder(0),
    )?;
    writer.write_primitive_array(ids::LATIN1_BYTES, ids::BYTES_CLASS, 5, b"hello")?;

    let (units, data) = utf16("héλ", u16::to_le_bytes);
    writer.write_instance(
        ids::UTF16,
        ids::STRING_CLASS,
        &[ids::UTF16_BYTES],
        InstanceExtra::StringCoder(1),
    )?;
    writer.write_primitive_array(ids::UTF16_BYTES, ids::BYTES_CLASS, units * 2, &data)?;

    let (units, data) = utf16("chars", u16::to_be_bytes);
    writer.write_instance(
        ids::LEGACY,
        ids::STRING_CLASS,
        &[ids::CHARS],
        InstanceExtra::StringCoder(0),
    )?;
    writer.write_primitive_array(ids::CHARS, ids::CHARS_CLASS, units, &data)?;

    writer.write_instance(
        ids::NULL_VALUE,
        ids::STRING_CLASS,
        &[0],
        InstanceExtra::StringCoder(0),
    )?;
    writer.write_instance(
        ids::BUFFER,
        ids::BUFFER_CLASS,
        &[0],
        InstanceExtra::Capacity(BUFFER_CAPACITY),
    )?;
    writer.write_instance(ids::LOADER, ids::OBJECT_CLASS, &[], InstanceExtra::None)
}
