// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Runtime configuration shared by both binaries.

use crate::error::{Error, Result};
use crate::names::ResourceNames;

/// Capacity of the ring buffer, in result sets.
pub const BUFSZ: usize = 100;

/// Maximum number of conflicting edges recorded per result set.
pub const CAP: usize = 8;

/// Upper bound on vertex indices. Well inside the 16-bit halves of an
/// encoded edge, and keeps the dense matrix (and its startup dump) small.
pub const MAX_VERTICES: usize = 1 << 10;

pub const DEFAULT_NAMESPACE: &str = "tricolor";

pub const ENV_NAMESPACE: &str = "TRICOLOR_NAMESPACE";
pub const ENV_SEED: &str = "TRICOLOR_SEED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix of every named OS resource.
    pub namespace: String,
    /// Fixed RNG seed for reproducible generator runs.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            seed: None,
        }
    }
}

impl Config {
    /// Read `TRICOLOR_NAMESPACE` and `TRICOLOR_SEED` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(ns) = lookup(ENV_NAMESPACE) {
            let ns = ns.trim();
            if ns.is_empty() || ns.contains('/') {
                return Err(Error::Usage(format!(
                    "{ENV_NAMESPACE} must be non-empty and must not contain '/'"
                )));
            }
            cfg.namespace = ns.to_owned();
        }
        if let Some(seed) = lookup(ENV_SEED) {
            let seed = seed.trim().parse::<u64>().map_err(|e| {
                Error::Usage(format!("{ENV_SEED} must be an unsigned integer: {e}"))
            })?;
            cfg.seed = Some(seed);
        }
        Ok(cfg)
    }

    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            ..Self::default()
        }
    }

    pub fn resource_names(&self) -> ResourceNames {
        ResourceNames::new(&self.namespace)
    }
}
