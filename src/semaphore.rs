// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named POSIX counting semaphore (sem_open family).
// The handle is closed on drop; the name is removed only by `unlink`.

use std::ffi::CString;
use std::io;
use std::time::Duration;
#[cfg(target_os = "macos")]
use std::time::Instant;

/// How a blocking [`NamedSemaphore::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// One unit was taken.
    Acquired,
    /// A signal handler ran before a unit became available; nothing was taken.
    Interrupted,
    /// The timeout passed first; nothing was taken.
    TimedOut,
}

pub struct NamedSemaphore {
    sem: *mut libc::sem_t,
    name: String,
}

// Safety: sem_t operations are thread-safe and the handle is process-shared.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Create a new semaphore with `initial` units. Fails with `EEXIST` if
    /// the name is taken.
    pub fn create(name: &str, initial: u32) -> io::Result<Self> {
        let c_name = c_name(name)?;
        let perms: libc::mode_t = 0o600;
        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                perms as libc::c_uint,
                initial as libc::c_uint,
            )
        };
        Self::from_raw(sem, name)
    }

    /// Open an existing semaphore. Fails with `ENOENT` if nobody created it.
    pub fn open(name: &str) -> io::Result<Self> {
        let c_name = c_name(name)?;
        let sem = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        Self::from_raw(sem, name)
    }

    fn from_raw(sem: *mut libc::sem_t, name: &str) -> io::Result<Self> {
        if sem == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            sem,
            name: name.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until a unit is available.
    ///
    /// Returns [`WaitOutcome::Interrupted`] on `EINTR`, which only happens if a
    /// handler was installed without `SA_RESTART`.
    pub fn wait(&self) -> io::Result<WaitOutcome> {
        if unsafe { libc::sem_wait(self.sem) } == 0 {
            return Ok(WaitOutcome::Acquired);
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => Ok(WaitOutcome::Interrupted),
            _ => Err(err),
        }
    }

    /// Like [`wait`](Self::wait), but gives up with [`WaitOutcome::TimedOut`]
    /// once `timeout` has passed.
    pub fn wait_timeout(&self, timeout: Duration) -> io::Result<WaitOutcome> {
        #[cfg(target_os = "macos")]
        {
            // macOS has no sem_timedwait: poll with sem_trywait.
            let deadline = Instant::now() + timeout;
            loop {
                if self.try_wait()? {
                    return Ok(WaitOutcome::Acquired);
                }
                if Instant::now() >= deadline {
                    return Ok(WaitOutcome::TimedOut);
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        }
        #[cfg(not(target_os = "macos"))]
        {
            let abstime = deadline_after(timeout);
            if unsafe { libc::sem_timedwait(self.sem, &abstime) } == 0 {
                return Ok(WaitOutcome::Acquired);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => Ok(WaitOutcome::Interrupted),
                Some(libc::ETIMEDOUT) => Ok(WaitOutcome::TimedOut),
                _ => Err(err),
            }
        }
    }

    /// Take a unit if one is available without blocking.
    pub fn try_wait(&self) -> io::Result<bool> {
        loop {
            if unsafe { libc::sem_trywait(self.sem) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EAGAIN) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => return Err(err),
            }
        }
    }

    /// Release one unit.
    pub fn post(&self) -> io::Result<()> {
        if unsafe { libc::sem_post(self.sem) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Close the handle, reporting failure. Drop does the same silently.
    pub fn close(mut self) -> io::Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> io::Result<()> {
        if self.sem.is_null() {
            return Ok(());
        }
        let ret = unsafe { libc::sem_close(self.sem) };
        self.sem = std::ptr::null_mut();
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Remove a semaphore name. Already-removed names count as success.
    pub fn unlink(name: &str) -> io::Result<()> {
        let c_name = c_name(name)?;
        if unsafe { libc::sem_unlink(c_name.as_ptr()) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ENOENT) => Ok(()),
            _ => Err(err),
        }
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        let _ = self.close_inner();
    }
}

/// Absolute CLOCK_REALTIME deadline `timeout` from now, as sem_timedwait wants.
#[cfg(not(target_os = "macos"))]
fn deadline_after(timeout: Duration) -> libc::timespec {
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
    let nsec = ts.tv_nsec as u64 + u64::from(timeout.subsec_nanos());
    ts.tv_sec += timeout.as_secs() as libc::time_t + (nsec / 1_000_000_000) as libc::time_t;
    ts.tv_nsec = (nsec % 1_000_000_000) as libc::c_long;
    ts
}

fn c_name(name: &str) -> io::Result<CString> {
    CString::new(name.as_bytes()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
