use std::{fs::File, io, ops::Deref, path::Path, ptr::NonNull};

#[cfg(unix)]
#[allow(unused)]
mod unix {
    use core::ffi::c_void;

    pub const PROT_READ: i32 = 0x1;

    pub const MAP_PRIVATE: i32 = 0x02;

    pub const MAP_FAILED: isize = -1;

    /// posix mmap and munmap
    /// # Safety
    /// see valid mmap and munmap usage online
    unsafe extern "C" {
        pub fn mmap(
            addr: *mut c_void,
            length: usize,
            prot: i32,
            flags: i32,
            fd: i32,
            offset: isize,
        ) -> *mut c_void;

        pub fn munmap(addr: *mut c_void, length: usize) -> i32;
    }

    /// read-only private mapping of a whole file
    /// # Safety
    /// `fd` must be an open, readable file of at least `len` bytes.
    /// null must be checked
    #[inline]
    pub unsafe fn file_mmap(fd: i32, len: usize) -> *mut u8 {
        // SAFETY: safe if contract holds
        let p = unsafe {
            mmap(
                core::ptr::null_mut(),
                len,
                PROT_READ,
                MAP_PRIVATE,
                fd,
                0,
            )
        };
        if (p as isize) == MAP_FAILED {
            core::ptr::null_mut()
        } else {
            p as *mut u8
        }
    }

    /// posix memory deallocation using munmap
    /// # Safety
    /// must be allocated by mmmap
    #[inline]
    pub unsafe fn file_munmap(ptr: *mut u8, len: usize) {
        // SAFETY: safe if contract holds
        let _ = unsafe { munmap(ptr.cast(), len) };
    }
}

/// A read-only view of a file's bytes.
///
/// On unix the file is memory mapped and unmapped on drop. Elsewhere, and
/// for empty files (which cannot be mapped), the bytes are read into memory.
pub struct MappedFile {
    inner: Backing,
}

enum Backing {
    #[cfg(unix)]
    Mapped { ptr: NonNull<u8>, len: usize },
    Owned(Vec<u8>),
}

// SAFETY: the mapping is private and read-only, nothing writes through it.
unsafe impl Send for MappedFile {}
// SAFETY: see above.
unsafe impl Sync for MappedFile {}

impl MappedFile {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = usize::try_from(file.metadata()?.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "file too large to map")
        })?;
        if len == 0 {
            return Ok(Self::from_vec(Vec::new()));
        }
        Self::map(file, len)
    }

    #[cfg(unix)]
    fn map(file: File, len: usize) -> io::Result<Self> {
        use std::os::fd::AsRawFd;

        // SAFETY: the file is open for reading and has `len` bytes
        let ptr = unsafe { unix::file_mmap(file.as_raw_fd(), len) };
        let ptr = NonNull::new(ptr).ok_or_else(io::Error::last_os_error)?;
        // the mapping stays valid after the descriptor is closed
        drop(file);
        Ok(Self {
            inner: Backing::Mapped { ptr, len },
        })
    }

    #[cfg(not(unix))]
    fn map(mut file: File, len: usize) -> io::Result<Self> {
        use std::io::Read;

        let mut bytes = Vec::with_capacity(len);
        file.read_to_end(&mut bytes)?;
        Ok(Self::from_vec(bytes))
    }

    /// Wrap bytes that are already in memory.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            inner: Backing::Owned(bytes),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.inner {
            #[cfg(unix)]
            // SAFETY: ptr/len describe a live read-only mapping owned by self
            Backing::Mapped { ptr, len } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), *len)
            },
            Backing::Owned(bytes) => bytes,
        }
    }

    pub fn is_mapped(&self) -> bool {
        match self.inner {
            #[cfg(unix)]
            Backing::Mapped { .. } => true,
            Backing::Owned(_) => false,
        }
    }
}

impl Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            if let Backing::Mapped { ptr, len } = self.inner {
                // SAFETY: ptr must be from mmap allocation
                unsafe { unix::file_munmap(ptr.as_ptr(), len) };
            }
        }
    }
}
