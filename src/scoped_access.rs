// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RAII guard over the write mutex. While it is alive the holder is the only
// producer allowed to read the shared cursor, fill the slot under it and
// advance it.

use std::io;

use tracing::warn;

use crate::conflict::ResultSet;
use crate::ring::{acquire, RegionState, SharedRegion};
use crate::semaphore::NamedSemaphore;
use crate::signal::TerminationFlag;

/// Holds one unit of the write-mutex semaphore; posts it back on drop.
pub(crate) struct ScopedAccess<'a> {
    region: &'a SharedRegion,
    lock: &'a NamedSemaphore,
}

impl<'a> ScopedAccess<'a> {
    /// Block on the write mutex. Returns `None` if the wait was interrupted
    /// with `stop` set.
    pub(crate) fn acquire(
        region: &'a SharedRegion,
        lock: &'a NamedSemaphore,
        stop: TerminationFlag,
    ) -> io::Result<Option<Self>> {
        if !acquire(lock, stop)? {
            return Ok(None);
        }
        Ok(Some(Self { region, lock }))
    }

    pub(crate) fn state(&self) -> RegionState {
        self.region.state()
    }

    /// Current shared write cursor.
    pub(crate) fn write_pos(&self) -> usize {
        self.region.write_pos()
    }

    /// Copy `candidate` into the slot under the cursor and return its index.
    ///
    /// The caller must hold a `free` unit for that slot.
    pub(crate) fn write(&self, candidate: &ResultSet) -> usize {
        let pos = self.write_pos();
        // Safety: we hold the write mutex, so no other producer targets `pos`,
        // and the `free` unit guarantees the consumer is done with it.
        unsafe { self.region.store_slot(pos, candidate) };
        pos
    }

    /// Move the cursor to the next slot, wrapping at the buffer size.
    pub(crate) fn advance(&self) {
        self.region.advance_write_pos();
    }
}

impl Drop for ScopedAccess<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.post() {
            warn!(sem = self.lock.name(), "releasing write mutex failed: {e}");
        }
    }
}
