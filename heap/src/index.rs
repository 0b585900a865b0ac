//! Heap index file: the class store and GC roots of a processed dump.
//!
//! ```text
//! magic "HEAPNAVX" | u32 version | u32 id size | u64 instance count
//! u64 class count  | class records (ascending id)
//! u64 root count   | (u64 object id, u8 root tag) records (ascending id)
//! ```
//!
//! Integers are little-endian, strings are a `u32` byte length followed by
//! UTF-8.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use object::{
    BasicType, ClassDefinition, ClassStore, InstanceField, PrimitiveStaticField,
    RootReason, StaticField,
};

const INDEX_MAGIC: &[u8; 8] = b"HEAPNAVX";
const INDEX_VERSION: u32 = 1;

/// Everything about a dump that is not stored in the aux files.
#[derive(Debug, Clone)]
pub struct HeapIndex {
    /// Size of an object reference in the original dump (4 or 8).
    pub id_size: u32,
    /// Number of objects, which is also the highest object id.
    pub instance_count: u64,
    pub classes: ClassStore,
    /// GC roots found by the dump pass. Only canned reasons.
    pub roots: BTreeMap<u64, RootReason>,
}

pub fn save_index(index: &HeapIndex, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_index(&mut writer, index)?;
    writer.flush()?;
    Ok(())
}

pub fn load_index(path: &Path) -> io::Result<HeapIndex> {
    let mut reader = BufReader::new(File::open(path)?);
    let index = read_index(&mut reader)?;
    log::debug!(
        "loaded heap index {}: {} classes, {} roots, {} instances",
        path.display(),
        index.classes.len(),
        index.roots.len(),
        index.instance_count
    );
    Ok(index)
}

pub fn write_index(w: &mut dyn Write, index: &HeapIndex) -> io::Result<()> {
    w.write_all(INDEX_MAGIC)?;
    write_u32(w, INDEX_VERSION)?;
    write_u32(w, index.id_size)?;
    write_u64(w, index.instance_count)?;

    write_u64(w, index.classes.len() as u64)?;
    for class in index.classes.iter() {
        write_class(w, class)?;
    }

    write_u64(w, index.roots.len() as u64)?;
    for (&id, reason) in &index.roots {
        let tag = reason.tag().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "only GC root kinds can be stored in a heap index",
            )
        })?;
        write_u64(w, id)?;
        write_u8(w, tag)?;
    }
    Ok(())
}

pub fn read_index(r: &mut dyn Read) -> io::Result<HeapIndex> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic)?;
    if &magic != INDEX_MAGIC {
        return Err(invalid_data("invalid heap index magic"));
    }

    let version = read_u32(r)?;
    if version != INDEX_VERSION {
        return Err(invalid_data("unsupported heap index version"));
    }

    let id_size = read_u32(r)?;
    if id_size != 4 && id_size != 8 {
        return Err(invalid_data("id size must be 4 or 8"));
    }
    let instance_count = read_u64(r)?;

    let class_count = read_len(r)?;
    let mut classes = Vec::with_capacity(class_count.min(PREALLOCATE_LIMIT));
    for _ in 0..class_count {
        classes.push(read_class(r)?);
    }

    let root_count = read_len(r)?;
    let mut roots = BTreeMap::new();
    for _ in 0..root_count {
        let id = read_u64(r)?;
        let reason = RootReason::from_tag(read_u8(r)?)
            .ok_or_else(|| invalid_data("invalid root tag in heap index"))?;
        roots.insert(id, reason);
    }

    Ok(HeapIndex {
        id_size,
        instance_count,
        classes: ClassStore::new(classes),
        roots,
    })
}

// Counts come from the file, don't trust them for allocation sizes.
const PREALLOCATE_LIMIT: usize = 4096;

fn write_class(w: &mut dyn Write, class: &ClassDefinition) -> io::Result<()> {
    write_string(w, &class.name)?;
    write_u64(w, class.id)?;
    write_u64(w, class.super_class_id)?;
    write_u64(w, class.class_loader_id)?;
    write_u32(w, class.instance_size)?;

    write_fields(w, &class.ref_instance_fields)?;
    write_fields(w, &class.primitive_instance_fields)?;

    write_u64(w, class.constant_fields.len() as u64)?;
    for &constant in &class.constant_fields {
        write_u64(w, constant)?;
    }

    write_u64(w, class.static_fields.len() as u64)?;
    for field in &class.static_fields {
        write_string(w, &field.name)?;
        write_u64(w, field.value)?;
    }

    write_u64(w, class.primitive_static_fields.len() as u64)?;
    for field in &class.primitive_static_fields {
        write_string(w, &field.name)?;
        write_u8(w, field.field_type.tag())?;
    }
    Ok(())
}

fn read_class(r: &mut dyn Read) -> io::Result<ClassDefinition> {
    let name = read_string(r)?;
    let id = read_u64(r)?;
    let super_class_id = read_u64(r)?;
    let class_loader_id = read_u64(r)?;
    let instance_size = read_u32(r)?;

    let ref_instance_fields = read_fields(r)?;
    let primitive_instance_fields = read_fields(r)?;

    let constant_count = read_len(r)?;
    let mut constant_fields =
        Vec::with_capacity(constant_count.min(PREALLOCATE_LIMIT));
    for _ in 0..constant_count {
        constant_fields.push(read_u64(r)?);
    }

    let static_count = read_len(r)?;
    let mut static_fields = Vec::with_capacity(static_count.min(PREALLOCATE_LIMIT));
    for _ in 0..static_count {
        static_fields.push(StaticField {
            name: read_string(r)?,
            value: read_u64(r)?,
        });
    }

    let primitive_static_count = read_len(r)?;
    let mut primitive_static_fields =
        Vec::with_capacity(primitive_static_count.min(PREALLOCATE_LIMIT));
    for _ in 0..primitive_static_count {
        primitive_static_fields.push(PrimitiveStaticField {
            name: read_string(r)?,
            field_type: read_basic_type(r)?,
        });
    }

    Ok(ClassDefinition {
        name,
        id,
        super_class_id,
        class_loader_id,
        instance_size,
        ref_instance_fields,
        primitive_instance_fields,
        constant_fields,
        static_fields,
        primitive_static_fields,
    })
}

fn write_fields(w: &mut dyn Write, fields: &[InstanceField]) -> io::Result<()> {
    write_u64(w, fields.len() as u64)?;
    for field in fields {
        write_string(w, &field.name)?;
        write_u32(w, field.offset)?;
        write_u8(w, field.field_type.tag())?;
    }
    Ok(())
}

fn read_fields(r: &mut dyn Read) -> io::Result<Vec<InstanceField>> {
    let count = read_len(r)?;
    let mut fields = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
    for _ in 0..count {
        fields.push(InstanceField {
            name: read_string(r)?,
            offset: read_u32(r)?,
            field_type: read_basic_type(r)?,
        });
    }
    Ok(fields)
}

fn read_basic_type(r: &mut dyn Read) -> io::Result<BasicType> {
    BasicType::from_tag(read_u8(r)?)
        .ok_or_else(|| invalid_data("invalid basic type tag in heap index"))
}

fn read_len(r: &mut dyn Read) -> io::Result<usize> {
    usize::try_from(read_u64(r)?)
        .map_err(|_| invalid_data("length does not fit in memory"))
}

fn write_u8(w: &mut dyn Write, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

fn read_u8(r: &mut dyn Read) -> io::Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn write_u32(w: &mut dyn Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u32(r: &mut dyn Read) -> io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn write_u64(w: &mut dyn Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u64(r: &mut dyn Read) -> io::Result<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_le_bytes(b))
}

fn write_string(w: &mut dyn Write, s: &str) -> io::Result<()> {
    let bytes = s.as_bytes();
    write_u32(w, bytes.len() as u32)?;
    w.write_all(bytes)
}

fn read_string(r: &mut dyn Read) -> io::Result<String> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| invalid_data("invalid utf-8 in heap index"))
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
