use std::{fs, io, path::Path};

use crate::{AuxError, OFFSET_ENTRY_SIZE, leb128};

/// Trailing data of an instance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceExtra {
    #[default]
    None,
    /// Coder byte of a `java.lang.String`.
    StringCoder(u8),
    /// Capacity of a `java.nio.DirectByteBuffer`.
    Capacity(u64),
}

/// Builds an offset table and aux buffer record by record.
///
/// Ids may be written in any order. Ids that are never written point at
/// offset 0.
#[derive(Debug, Default)]
pub struct AuxWriter {
    offsets: Vec<u8>,
    aux: Vec<u8>,
}

impl AuxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record of a class object (class id 0). Its references come from the
    /// class store, so the record has no payload.
    pub fn write_class_object(&mut self, id: u64) -> Result<(), AuxError> {
        self.begin(id)?;
        leb128::encode_u64(&mut self.aux, 0);
        Ok(())
    }

    /// `data` is the raw element payload, `element_size * count` bytes.
    pub fn write_primitive_array(
        &mut self,
        id: u64,
        class_id: u64,
        count: u32,
        data: &[u8],
    ) -> Result<(), AuxError> {
        self.begin(id)?;
        leb128::encode_u64(&mut self.aux, class_id);
        leb128::encode_u64(&mut self.aux, count as u64);
        self.aux.extend_from_slice(data);
        Ok(())
    }

    /// `elements` in array order, `0` for null slots.
    pub fn write_object_array(
        &mut self,
        id: u64,
        class_id: u64,
        elements: &[u64],
    ) -> Result<(), AuxError> {
        self.begin(id)?;
        let non_null: Vec<u64> =
            elements.iter().copied().filter(|&e| e != 0).collect();
        let null_count = elements.len() - non_null.len();
        leb128::encode_u64(&mut self.aux, class_id);
        leb128::encode_u64(&mut self.aux, null_count as u64);
        leb128::encode_u64(&mut self.aux, non_null.len() as u64);
        for element in non_null {
            leb128::encode_u64(&mut self.aux, element);
        }
        Ok(())
    }

    /// `fields` holds one id per reference field, concrete class first.
    pub fn write_instance(
        &mut self,
        id: u64,
        class_id: u64,
        fields: &[u64],
        extra: InstanceExtra,
    ) -> Result<(), AuxError> {
        self.begin(id)?;
        leb128::encode_u64(&mut self.aux, class_id);
        for &field in fields {
            leb128::encode_u64(&mut self.aux, field);
        }
        match extra {
            InstanceExtra::None => {}
            InstanceExtra::StringCoder(coder) => self.aux.push(coder),
            InstanceExtra::Capacity(capacity) => {
                leb128::encode_u64(&mut self.aux, capacity)
            }
        }
        Ok(())
    }

    pub fn offsets(&self) -> &[u8] {
        &self.offsets
    }

    pub fn aux(&self) -> &[u8] {
        &self.aux
    }

    pub fn finish(self) -> (Vec<u8>, Vec<u8>) {
        (self.offsets, self.aux)
    }

    pub fn write_files(&self, offsets_path: &Path, aux_path: &Path) -> io::Result<()> {
        fs::write(offsets_path, &self.offsets)?;
        fs::write(aux_path, &self.aux)?;
        Ok(())
    }

    fn begin(&mut self, id: u64) -> Result<(), AuxError> {
        let offset = self.aux.len();
        let entry = u32::try_from(offset)
            .map_err(|_| AuxError::OffsetOverflow { offset })?;
        let start = usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_mul(OFFSET_ENTRY_SIZE))
            .ok_or(AuxError::MissingOffset { id })?;
        let end = start
            .checked_add(OFFSET_ENTRY_SIZE)
            .ok_or(AuxError::MissingOffset { id })?;
        if self.offsets.len() < end {
            self.offsets.resize(end, 0);
        }
        self.offsets[start..end].copy_from_slice(&entry.to_be_bytes());
        Ok(())
    }
}
