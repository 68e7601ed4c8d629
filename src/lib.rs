// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Randomized search for a small set of edges whose removal makes a graph
// 3-colorable. Generator processes publish candidates into a named
// shared-memory ring buffer; one supervisor process drains it and keeps the
// best candidate.

pub mod config;
pub mod error;
pub mod logging;
pub mod names;
pub mod signal;

mod shm;
pub use shm::{ShmHandle, ShmOpenMode};

mod semaphore;
pub use semaphore::{NamedSemaphore, WaitOutcome};

mod scoped_access;

pub mod conflict;
pub mod generator;
pub mod graph;
pub mod ring;
pub mod supervisor;

pub use config::{Config, BUFSZ, CAP};
pub use conflict::{find_conflicts, Coloring, EncodedEdge, ResultSet};
pub use error::{Error, Result};
pub use generator::{GeneratorContext, GeneratorExit};
pub use graph::Graph;
pub use ring::{Consumer, Publish, RegionState, RingBuffer, SharedRegion};
pub use signal::TerminationFlag;
pub use supervisor::{BestTracker, ConsoleReporter, Observation, Outcome, Reporter, SupervisorContext};
