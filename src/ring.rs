// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Multi-producer / single-consumer ring of result sets in named shared
// memory, guarded by three named semaphores:
//
//   free   (initial BUFSZ) : slots a producer may fill
//   used   (initial 0)     : slots the consumer may drain
//   wmutex (initial 1)     : serialises the shared write cursor
//
// The supervisor creates everything; generators attach. Shutdown is one-way:
// the supervisor flips `state` to TERMINATING and posts one extra `free` unit
// so a producer parked on `free` wakes up and sees it.

use std::cell::UnsafeCell;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::BUFSZ;
use crate::conflict::ResultSet;
use crate::error::{Error, Result};
use crate::names::ResourceNames;
use crate::scoped_access::ScopedAccess;
use crate::semaphore::{NamedSemaphore, WaitOutcome};
use crate::shm::{ShmHandle, ShmOpenMode};
use crate::signal::TerminationFlag;

// ---------------------------------------------------------------------------
// Shared memory layout
// ---------------------------------------------------------------------------

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Running = 0,
    Terminating = 1,
}

/// The mapped region. A freshly `ftruncate`d segment is all zeroes, which is
/// already `Running` with the cursor at slot 0.
#[repr(C)]
pub struct SharedRegion {
    state: AtomicU32,
    write_pos: AtomicU32,
    slots: UnsafeCell<[ResultSet; BUFSZ]>,
}

impl SharedRegion {
    pub const SIZE: usize = std::mem::size_of::<SharedRegion>();

    pub fn state(&self) -> RegionState {
        match self.state.load(Ordering::Acquire) {
            0 => RegionState::Running,
            _ => RegionState::Terminating,
        }
    }

    /// Flip to `Terminating`. Returns `true` for the call that made the change.
    fn set_terminating(&self) -> bool {
        self.state.swap(RegionState::Terminating as u32, Ordering::AcqRel)
            == RegionState::Running as u32
    }

    pub(crate) fn write_pos(&self) -> usize {
        self.write_pos.load(Ordering::Relaxed) as usize % BUFSZ
    }

    pub(crate) fn advance_write_pos(&self) {
        let next = (self.write_pos() + 1) % BUFSZ;
        self.write_pos.store(next as u32, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.state.store(RegionState::Running as u32, Ordering::Relaxed);
        self.write_pos.store(0, Ordering::Relaxed);
    }

    /// # Safety
    /// The caller must exclusively own slot `idx` (write mutex + `free` unit).
    pub(crate) unsafe fn store_slot(&self, idx: usize, value: &ResultSet) {
        let base = self.slots.get() as *mut ResultSet;
        std::ptr::write(base.add(idx % BUFSZ), *value);
    }

    /// # Safety
    /// The caller must hold the `used` unit for slot `idx`.
    unsafe fn load_slot(&self, idx: usize) -> ResultSet {
        let base = self.slots.get() as *const ResultSet;
        std::ptr::read(base.add(idx % BUFSZ))
    }
}

/// Longest a single semaphore wait blocks before `stop` is looked at again.
/// Bounds the delay when a signal lands between the flag check and the wait.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait on `sem` until a unit is held or `stop` is set.
///
/// Interrupted and timed-out waits retry while `stop` is clear. Returns
/// `Ok(true)` once a unit is held, `Ok(false)` if `stop` was set while none
/// was available.
pub(crate) fn acquire(sem: &NamedSemaphore, stop: TerminationFlag) -> io::Result<bool> {
    loop {
        match sem.wait_timeout(POLL_INTERVAL)? {
            WaitOutcome::Acquired => return Ok(true),
            WaitOutcome::Interrupted | WaitOutcome::TimedOut if stop.is_set() => return Ok(false),
            WaitOutcome::Interrupted | WaitOutcome::TimedOut => continue,
        }
    }
}

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// Result of one producer publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// Stored in the given slot.
    Written(usize),
    /// The supervisor is shutting down; nothing was written.
    Terminating,
    /// A local termination signal arrived during a wait; nothing was written.
    Interrupted,
}

/// Handles to the shared region and its semaphores.
///
/// Field order is drop order: the region is unmapped before any semaphore
/// handle is closed.
pub struct RingBuffer {
    shm: ShmHandle,
    free: NamedSemaphore,
    used: NamedSemaphore,
    wmutex: NamedSemaphore,
}

impl RingBuffer {
    /// Create the region and all three semaphores with exclusive-create
    /// semantics. Anything created before a failure is removed again.
    pub fn create(names: &ResourceNames) -> Result<Self> {
        let mut rollback = Rollback::default();

        let shm = ShmHandle::acquire(&names.shm, SharedRegion::SIZE, ShmOpenMode::Create)
            .map_err(Error::create("shm_open"))?;
        rollback.shm = Some(names.shm.as_str());

        let free = NamedSemaphore::create(&names.free, BUFSZ as u32)
            .map_err(Error::create("sem_open free"))?;
        rollback.sems.push(&names.free);

        let used =
            NamedSemaphore::create(&names.used, 0).map_err(Error::create("sem_open used"))?;
        rollback.sems.push(&names.used);

        let wmutex = NamedSemaphore::create(&names.wmutex, 1)
            .map_err(Error::create("sem_open wmutex"))?;

        rollback.commit();
        let ring = Self {
            shm,
            free,
            used,
            wmutex,
        };
        ring.region().reset();
        info!(shm = %names.shm, slots = BUFSZ, "created ring buffer");
        Ok(ring)
    }

    /// Attach to resources a supervisor already created.
    pub fn attach(names: &ResourceNames) -> Result<Self> {
        let shm = ShmHandle::acquire(&names.shm, SharedRegion::SIZE, ShmOpenMode::Open)
            .map_err(Error::attach("shm_open"))?;
        let free = NamedSemaphore::open(&names.free).map_err(Error::attach("sem_open free"))?;
        let used = NamedSemaphore::open(&names.used).map_err(Error::attach("sem_open used"))?;
        let wmutex =
            NamedSemaphore::open(&names.wmutex).map_err(Error::attach("sem_open wmutex"))?;
        debug!(shm = %names.shm, "attached to ring buffer");
        Ok(Self {
            shm,
            free,
            used,
            wmutex,
        })
    }

    fn region(&self) -> &SharedRegion {
        // Safety: the mapping is SharedRegion::SIZE bytes, page aligned, and
        // lives as long as `self.shm`.
        unsafe { &*(self.shm.as_ptr() as *const SharedRegion) }
    }

    pub fn state(&self) -> RegionState {
        self.region().state()
    }

    /// Producer protocol: publish one candidate into the next free slot.
    ///
    /// Holds the write mutex across the `free` wait so the cursor can only be
    /// claimed by one producer at a time. `state` is checked both before and
    /// after the `free` wait; the second check catches the extra unit posted
    /// by [`terminate`](Self::terminate).
    pub fn publish(&self, candidate: &ResultSet, stop: TerminationFlag) -> Result<Publish> {
        let region = self.region();
        let access = match ScopedAccess::acquire(region, &self.wmutex, stop)
            .map_err(Error::protocol("sem_wait wmutex"))?
        {
            Some(access) => access,
            None => return Ok(Publish::Interrupted),
        };

        if access.state() == RegionState::Terminating {
            return Ok(Publish::Terminating);
        }

        if !acquire(&self.free, stop).map_err(Error::protocol("sem_wait free"))? {
            return Ok(Publish::Interrupted);
        }
        if access.state() == RegionState::Terminating {
            return Ok(Publish::Terminating);
        }

        let slot = access.write(candidate);
        self.used.post().map_err(Error::protocol("sem_post used"))?;
        access.advance();
        Ok(Publish::Written(slot))
    }

    /// The single consumer of this ring, reading from slot 0.
    pub fn consumer(&self) -> Consumer<'_> {
        Consumer {
            ring: self,
            read_pos: 0,
        }
    }

    /// Flip the region to `Terminating` and post one extra `free` unit.
    /// Only the first call has any effect.
    pub fn terminate(&self) -> Result<()> {
        if self.region().set_terminating() {
            info!("ring buffer terminating");
            self.free.post().map_err(Error::protocol("sem_post free"))?;
        }
        Ok(())
    }

    /// Unmap the region, then close the semaphore handles, reporting every
    /// failure without stopping early.
    pub fn close(self) -> Vec<Error> {
        let Self {
            shm,
            free,
            used,
            wmutex,
        } = self;
        let mut errors = Vec::new();
        if let Err(e) = shm.close() {
            errors.push(Error::teardown("munmap")(e));
        }
        for sem in [free, used, wmutex] {
            if let Err(e) = sem.close() {
                errors.push(Error::teardown("sem_close")(e));
            }
        }
        errors
    }

    /// Remove every name in `names`, reporting every failure without
    /// stopping early. Names that are already gone count as removed.
    pub fn unlink(names: &ResourceNames) -> Vec<Error> {
        let mut errors = Vec::new();
        if let Err(e) = ShmHandle::unlink_by_name(&names.shm) {
            errors.push(Error::teardown("shm_unlink")(e));
        }
        for sem in [&names.free, &names.used, &names.wmutex] {
            if let Err(e) = NamedSemaphore::unlink(sem) {
                errors.push(Error::teardown("sem_unlink")(e));
            }
        }
        errors
    }
}

/// Names created so far by [`RingBuffer::create`]; unlinked on drop unless
/// committed.
#[derive(Default)]
struct Rollback<'a> {
    shm: Option<&'a str>,
    sems: Vec<&'a str>,
}

impl Rollback<'_> {
    fn commit(&mut self) {
        self.shm = None;
        self.sems.clear();
    }

    /// Unlink everything still recorded, collecting every failure.
    fn undo(&mut self) -> Vec<Error> {
        let mut errors = Vec::new();
        if let Some(name) = self.shm.take() {
            if let Err(e) = ShmHandle::unlink_by_name(name) {
                errors.push(Error::teardown("shm_unlink")(e));
            }
        }
        for name in self.sems.drain(..) {
            if let Err(e) = NamedSemaphore::unlink(name) {
                errors.push(Error::teardown("sem_unlink")(e));
            }
        }
        errors
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        for e in self.undo() {
            warn!("rolling back partial create: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Consumer
// ---------------------------------------------------------------------------

/// Single-consumer view with a private read cursor.
///
/// The cursor is never shared: the `used`/`free` counts keep it in lock-step
/// with the producers' shared write cursor.
pub struct Consumer<'a> {
    ring: &'a RingBuffer,
    read_pos: usize,
}

impl Consumer<'_> {
    /// Block for the next published candidate and copy it out.
    ///
    /// Returns `Ok(None)` if the wait was interrupted with `stop` set.
    pub fn recv(&mut self, stop: TerminationFlag) -> Result<Option<ResultSet>> {
        if !acquire(&self.ring.used, stop).map_err(Error::protocol("sem_wait used"))? {
            return Ok(None);
        }
        // Safety: the `used` unit we hold belongs to slot `read_pos`.
        let candidate = unsafe { self.ring.region().load_slot(self.read_pos) };
        self.ring
            .free
            .post()
            .map_err(Error::protocol("sem_post free"))?;
        self.read_pos = (self.read_pos + 1) % BUFSZ;
        Ok(Some(candidate))
    }

    pub fn read_pos(&self) -> usize {
        self.read_pos
    }
}
