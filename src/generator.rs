// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Producer side: color, scan, publish, until the supervisor says stop.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::Config;
use crate::conflict::{find_conflicts, Coloring, ResultSet};
use crate::error::Result;
use crate::graph::Graph;
use crate::ring::{Publish, RegionState, RingBuffer};
use crate::signal::TerminationFlag;

/// Why [`GeneratorContext::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorExit {
    /// The supervisor flipped the region to terminating.
    SupervisorDone,
    /// This process received SIGINT/SIGTERM.
    Interrupted,
}

/// Everything one generator process owns.
pub struct GeneratorContext {
    graph: Graph,
    coloring: Coloring,
    rng: SmallRng,
    ring: RingBuffer,
    stop: TerminationFlag,
    published: u64,
}

impl GeneratorContext {
    /// Attach to the supervisor's ring buffer named by `config`.
    pub fn attach(config: &Config, graph: Graph, stop: TerminationFlag) -> Result<Self> {
        let ring = RingBuffer::attach(&config.resource_names())?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Self {
            coloring: Coloring::new(graph.vertex_count()),
            graph,
            rng,
            ring,
            stop,
            published: 0,
        })
    }

    /// Number of result sets written so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Sample a fresh coloring and return its conflicting edges.
    pub fn sample(&mut self) -> ResultSet {
        self.coloring.randomize(&mut self.rng);
        find_conflicts(&self.graph, &self.coloring)
    }

    /// One iteration: sample, then publish.
    pub fn step(&mut self) -> Result<Publish> {
        let candidate = self.sample();
        let outcome = self.ring.publish(&candidate, self.stop)?;
        if let Publish::Written(slot) = outcome {
            self.published += 1;
            debug!(slot, edges = candidate.len(), "published candidate");
        }
        Ok(outcome)
    }

    /// Loop until the supervisor terminates or this process is interrupted.
    pub fn run(&mut self) -> Result<GeneratorExit> {
        let exit = loop {
            if self.stop.is_set() {
                break GeneratorExit::Interrupted;
            }
            if self.ring.state() == RegionState::Terminating {
                break GeneratorExit::SupervisorDone;
            }
            match self.step()? {
                Publish::Written(_) => {}
                Publish::Terminating => break GeneratorExit::SupervisorDone,
                Publish::Interrupted => break GeneratorExit::Interrupted,
            }
        };
        info!(published = self.published, ?exit, "generator stopping");
        Ok(exit)
    }
}
