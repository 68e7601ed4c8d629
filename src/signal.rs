// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// SIGINT / SIGTERM -> termination flag.
// The handler only stores to an atomic. It is installed without SA_RESTART
// so a blocked sem_wait returns EINTR and the caller gets to look at the flag.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SIGNALLED: AtomicBool = AtomicBool::new(false);

/// A shutdown request observed between blocking operations.
#[derive(Debug, Clone, Copy)]
pub struct TerminationFlag(&'static AtomicBool);

impl TerminationFlag {
    /// A flag not connected to any signal, for embedding and tests.
    pub fn detached() -> Self {
        Self(Box::leak(Box::new(AtomicBool::new(false))))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

extern "C" fn on_signal(_: libc::c_int) {
    SIGNALLED.store(true, Ordering::Release);
}

/// Route SIGINT and SIGTERM to the process-wide termination flag.
pub fn install() -> io::Result<TerminationFlag> {
    for signo in [libc::SIGINT, libc::SIGTERM] {
        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            sa.sa_sigaction = on_signal as *const () as libc::sighandler_t;
            sa.sa_flags = 0;
            libc::sigemptyset(&mut sa.sa_mask);
            if libc::sigaction(signo, &sa, std::ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    Ok(TerminationFlag(&SIGNALLED))
}
