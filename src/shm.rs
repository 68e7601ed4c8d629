// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named POSIX shared memory mapping.
// Unmapping happens on drop; removing the name is a separate, explicit step
// owned by whoever created the segment.

use std::ffi::CString;
use std::io;
use std::ptr;

/// Open mode for shared memory segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShmOpenMode {
    /// Create exclusively, fail if already exists. The segment is sized and
    /// zero-filled by `ftruncate`.
    Create,
    /// Open existing, fail if it does not exist or is smaller than requested.
    Open,
}

/// A mapped, named, inter-process shared memory region.
pub struct ShmHandle {
    mem: *mut u8,
    size: usize,
    name: String,
}

// Safety: the mapping is process-shared by design; synchronisation of its
// contents is the caller's responsibility.
unsafe impl Send for ShmHandle {}
unsafe impl Sync for ShmHandle {}

impl ShmHandle {
    /// Map `size` bytes of the segment `name` (POSIX form, leading '/').
    pub fn acquire(name: &str, size: usize, mode: ShmOpenMode) -> io::Result<Self> {
        if size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "size is 0"));
        }
        let c_name = CString::new(name.as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let perms: libc::mode_t = 0o600;
        let flags = match mode {
            ShmOpenMode::Create => libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
            ShmOpenMode::Open => libc::O_RDWR,
        };
        let fd = unsafe { libc::shm_open(c_name.as_ptr(), flags, perms as libc::c_uint) };
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }

        match mode {
            ShmOpenMode::Create => {
                let ret = unsafe { libc::ftruncate(fd, size as libc::off_t) };
                if ret != 0 {
                    let err = io::Error::last_os_error();
                    unsafe {
                        libc::close(fd);
                        libc::shm_unlink(c_name.as_ptr());
                    }
                    return Err(err);
                }
            }
            ShmOpenMode::Open => {
                // A short segment means the creator has not finished sizing it
                // (or it belongs to an incompatible build); mapping it would fault.
                let mut st: libc::stat = unsafe { std::mem::zeroed() };
                if unsafe { libc::fstat(fd, &mut st) } != 0 {
                    let err = io::Error::last_os_error();
                    unsafe { libc::close(fd) };
                    return Err(err);
                }
                if (st.st_size as u64) < size as u64 {
                    unsafe { libc::close(fd) };
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("segment is {} bytes, expected {size}", st.st_size),
                    ));
                }
            }
        }

        let mem = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        let map_err = (mem == libc::MAP_FAILED).then(io::Error::last_os_error);
        unsafe { libc::close(fd) };

        if let Some(err) = map_err {
            if mode == ShmOpenMode::Create {
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
            }
            return Err(err);
        }

        Ok(Self {
            mem: mem as *mut u8,
            size,
            name: name.to_owned(),
        })
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.mem
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.mem
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Remove the name from the namespace. Existing mappings stay valid.
    pub fn unlink(&self) -> io::Result<()> {
        Self::unlink_by_name(&self.name)
    }

    /// Remove a named segment without an open handle. A missing name is not
    /// an error.
    pub fn unlink_by_name(name: &str) -> io::Result<()> {
        let c_name = CString::new(name.as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        if unsafe { libc::shm_unlink(c_name.as_ptr()) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ENOENT) => Ok(()),
            _ => Err(err),
        }
    }

    /// Unmap explicitly, reporting failure. Drop does the same silently.
    pub fn close(mut self) -> io::Result<()> {
        self.unmap()
    }

    fn unmap(&mut self) -> io::Result<()> {
        if self.mem.is_null() {
            return Ok(());
        }
        let ret = unsafe { libc::munmap(self.mem as *mut libc::c_void, self.size) };
        self.mem = ptr::null_mut();
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Drop for ShmHandle {
    fn drop(&mut self) {
        let _ = self.unmap();
    }
}
