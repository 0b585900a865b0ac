use std::{
    io,
    path::{Path, PathBuf},
};

use heap::{AuxFiles, HeapIndex, MappedFile, OFFSET_ENTRY_SIZE, load_index};

use crate::{AuxNavigator, RootReasons};

pub const AUX_EXTENSION: &str = "aux";
pub const OFFSETS_EXTENSION: &str = "auxoffsets";

/// Locations of the three files of a processed dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpPaths {
    pub index: PathBuf,
    pub aux: PathBuf,
    pub offsets: PathBuf,
}

impl DumpPaths {
    /// `dump.idx` -> `dump.aux`, `dump.auxoffsets`.
    pub fn from_index(index: impl Into<PathBuf>) -> Self {
        let index = index.into();
        Self {
            aux: index.with_extension(AUX_EXTENSION),
            offsets: index.with_extension(OFFSETS_EXTENSION),
            index,
        }
    }
}

/// An opened dump: the loaded index plus the mapped aux files.
pub struct HeapDump {
    index: HeapIndex,
    roots: RootReasons,
    offsets: MappedFile,
    aux: MappedFile,
}

impl HeapDump {
    pub fn open(paths: &DumpPaths) -> io::Result<Self> {
        let index = load_index(&paths.index)?;
        let offsets = open_mapped(&paths.offsets)?;
        let aux = open_mapped(&paths.aux)?;
        Ok(Self::from_parts(index, offsets, aux))
    }

    pub fn from_parts(index: HeapIndex, offsets: MappedFile, aux: MappedFile) -> Self {
        let entries = (offsets.len() / OFFSET_ENTRY_SIZE) as u64;
        if entries <= index.instance_count {
            log::warn!(
                "offset table has {entries} entries for {} objects",
                index.instance_count
            );
        }
        let roots = RootReasons::new(index.roots.clone(), &index.classes);
        Self {
            index,
            roots,
            offsets,
            aux,
        }
    }

    pub fn index(&self) -> &HeapIndex {
        &self.index
    }

    pub fn root_reasons(&self) -> &RootReasons {
        &self.roots
    }

    pub fn navigator(&self) -> AuxNavigator<'_> {
        AuxNavigator::new(
            AuxFiles::new(&self.offsets, &self.aux),
            &self.index.classes,
            &self.roots,
            self.index.id_size,
            self.index.instance_count,
        )
    }
}

fn open_mapped(path: &Path) -> io::Result<MappedFile> {
    MappedFile::open(path).map_err(|err| {
        io::Error::new(err.kind(), format!("{}: {err}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ObjectNavigator, ReferenceResolution,
        fixtures::{self, SampleHeap, ids},
    };
    use heap::save_index;

    fn temp_index_path() -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock before unix epoch")
            .as_nanos();
        path.push(format!("heapnav-dump-test-{}-{nanos}.idx", std::process::id()));
        path
    }

    fn sample_index(heap: &SampleHeap) -> HeapIndex {
        HeapIndex {
            id_size: fixtures::ID_SIZE,
            instance_count: fixtures::INSTANCE_COUNT,
            classes: heap.classes.clone(),
            roots: fixtures::gc_roots(),
        }
    }

    #[test]
    fn default_aux_paths_sit_next_to_the_index() {
        let paths = DumpPaths::from_index("/tmp/heap/dump.idx");
        assert_eq!(paths.aux, PathBuf::from("/tmp/heap/dump.aux"));
        assert_eq!(paths.offsets, PathBuf::from("/tmp/heap/dump.auxoffsets"));
        assert_eq!(paths.index, PathBuf::from("/tmp/heap/dump.idx"));
    }

    #[test]
    fn opens_dump_from_disk() {
        let heap = SampleHeap::build();
        let paths = DumpPaths::from_index(temp_index_path());
        save_index(&sample_index(&heap), &paths.index).expect("save index");
        fixtures::sample_writer()
            .write_files(&paths.offsets, &paths.aux)
            .expect("write aux files");

        let dump = HeapDump::open(&paths).expect("open dump");
        let mut nav = dump.navigator();
        nav.go_to(ids::NODE_A, ReferenceResolution::OnlyStrongReferences)
            .expect("go to node");
        assert_eq!(
            nav.references_copy(),
            Ok(vec![ids::NODE_B, ids::BYTES, 0, ids::NODE_CLASS])
        );
        nav.go_to(ids::LATIN1, ReferenceResolution::OnlyStrongReferences)
            .expect("go to string");
        assert_eq!(
            nav.string_instance_field_value(),
            Ok(Some("hello".to_string()))
        );
        assert_eq!(dump.root_reasons().gc_root_count(), 4);

        drop(nav);
        drop(dump);
        for path in [&paths.index, &paths.aux, &paths.offsets] {
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn missing_aux_file_names_the_path() {
        let heap = SampleHeap::build();
        let paths = DumpPaths::from_index(temp_index_path());
        save_index(&sample_index(&heap), &paths.index).expect("save index");

        let err = HeapDump::open(&paths).err().expect("open must fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("auxoffsets"));

        let _ = std::fs::remove_file(&paths.index);
    }

    #[test]
    fn in_memory_parts() {
        let heap = SampleHeap::build();
        let dump = HeapDump::from_parts(
            sample_index(&heap),
            MappedFile::from_vec(heap.offsets.clone()),
            MappedFile::from_vec(heap.aux.clone()),
        );
        let mut nav = dump.navigator();
        nav.go_to(ids::BUFFER, ReferenceResolution::NoReferences)
            .expect("go to buffer");
        assert_eq!(nav.extra_data(), fixtures::BUFFER_CAPACITY);
        assert_eq!(dump.index().instance_count, fixtures::INSTANCE_COUNT);
    }
}
