// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Consumer side: owns the named resources, drains candidates, keeps the best
// one and shuts everyone down on success or interrupt.

use std::io;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::conflict::ResultSet;
use crate::error::{Error, Result};
use crate::names::ResourceNames;
use crate::ring::RingBuffer;
use crate::signal::TerminationFlag;

// ---------------------------------------------------------------------------
// Best-solution tracking
// ---------------------------------------------------------------------------

/// What [`BestTracker::observe`] made of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// No conflicts: the graph is 3-colorable.
    Colorable,
    /// Strictly fewer edges than any earlier candidate.
    Improved,
    /// Not better, or truncated (its real size is unknown).
    Ignored,
}

#[derive(Debug, Default, Clone)]
pub struct BestTracker {
    best: Option<ResultSet>,
    consumed: u64,
    truncated: u64,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one candidate in. Reported bests are strictly decreasing in size.
    pub fn observe(&mut self, candidate: &ResultSet) -> Observation {
        self.consumed += 1;
        if candidate.is_truncated() {
            self.truncated += 1;
            return Observation::Ignored;
        }
        let better = self.best.map_or(true, |b| candidate.len() < b.len());
        if !better {
            return Observation::Ignored;
        }
        self.best = Some(*candidate);
        if candidate.is_proper_coloring() {
            Observation::Colorable
        } else {
            Observation::Improved
        }
    }

    pub fn best(&self) -> Option<&ResultSet> {
        self.best.as_ref()
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn truncated(&self) -> u64 {
        self.truncated
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Receives the supervisor's user-facing events.
pub trait Reporter {
    fn improved(&mut self, best: &ResultSet);
    fn colorable(&mut self);
}

/// Prints reports on stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn improved(&mut self, best: &ResultSet) {
        println!("Solution with {} edges: {best}", best.len());
    }

    fn colorable(&mut self) {
        println!("The graph is 3-colorable!");
    }
}

// ---------------------------------------------------------------------------
// SupervisorContext
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A conflict-free coloring was found.
    Colorable,
    /// SIGINT/SIGTERM arrived first.
    Interrupted,
}

/// Sole owner of the shared region and semaphores.
///
/// Teardown runs on every exit path: explicitly via [`teardown`](Self::teardown)
/// or implicitly on drop.
pub struct SupervisorContext {
    names: ResourceNames,
    ring: Option<RingBuffer>,
    stop: TerminationFlag,
    tracker: BestTracker,
}

impl SupervisorContext {
    /// Create all named resources. Fails if another supervisor holds them.
    pub fn create(config: &Config, stop: TerminationFlag) -> Result<Self> {
        let names = config.resource_names();
        let ring = RingBuffer::create(&names)?;
        Ok(Self {
            names,
            ring: Some(ring),
            stop,
            tracker: BestTracker::new(),
        })
    }

    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    pub fn tracker(&self) -> &BestTracker {
        &self.tracker
    }

    /// Consume candidates until success or interrupt, then mark the region
    /// terminating so producers stop.
    pub fn run(&mut self, reporter: &mut dyn Reporter) -> Result<Outcome> {
        let ring = self.ring.as_ref().ok_or_else(|| Error::Protocol {
            op: "run",
            source: io::Error::new(io::ErrorKind::NotConnected, "resources already released"),
        })?;
        let tracker = &mut self.tracker;
        let stop = self.stop;

        let mut consumer = ring.consumer();
        let outcome = loop {
            if stop.is_set() {
                break Outcome::Interrupted;
            }
            let Some(candidate) = consumer.recv(stop)? else {
                break Outcome::Interrupted;
            };
            match tracker.observe(&candidate) {
                Observation::Colorable => {
                    reporter.colorable();
                    break Outcome::Colorable;
                }
                Observation::Improved => {
                    debug!(edges = candidate.len(), "new best");
                    reporter.improved(&candidate);
                }
                Observation::Ignored => {}
            }
        };

        ring.terminate()?;
        info!(
            ?outcome,
            consumed = tracker.consumed(),
            truncated = tracker.truncated(),
            best = ?tracker.best().map(|b| b.len()),
            "supervisor finished"
        );
        Ok(outcome)
    }

    /// Release everything: terminate, unmap, close, then unlink.
    ///
    /// Idempotent. Failures are logged and returned, never fatal.
    pub fn teardown(&mut self) -> Vec<Error> {
        let Some(ring) = self.ring.take() else {
            return Vec::new();
        };
        let mut errors = Vec::new();
        if let Err(e) = ring.terminate() {
            errors.push(e);
        }
        errors.extend(ring.close());
        errors.extend(RingBuffer::unlink(&self.names));
        for e in &errors {
            warn!("{e}");
        }
        debug!(shm = %self.names.shm, "teardown complete");
        errors
    }
}

impl Drop for SupervisorContext {
    fn drop(&mut self) {
        self.teardown();
    }
}
