// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error taxonomy shared by the generator and supervisor.

use std::io;

use thiserror::Error;

/// Errors surfaced by graph parsing and the shared-memory protocol.
///
/// The OS-backed variants carry the name of the failing operation so a
/// single `Display` line is enough for the fatal diagnostic.
#[derive(Debug, Error)]
pub enum Error {
    /// An edge token is not a pair of non-negative integers.
    #[error("edge parsing error: `{token}`: {reason}")]
    Parse { token: String, reason: String },

    /// Opening resources created by a supervisor failed.
    #[error("{op} failed, Error: {source}")]
    Attach {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Creating resources (or registering signal handlers) failed.
    #[error("{op} failed, Error: {source}")]
    Create {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// A semaphore or shared memory operation failed while running.
    #[error("{op} failed, Error: {source}")]
    Protocol {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Releasing or unlinking a resource failed during shutdown.
    #[error("{op} failed during teardown, Error: {source}")]
    Teardown {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Bad command line or environment.
    #[error("{0}")]
    Usage(String),
}

impl Error {
    pub(crate) fn attach(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Attach { op, source }
    }

    pub(crate) fn create(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Create { op, source }
    }

    pub(crate) fn protocol(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Protocol { op, source }
    }

    pub(crate) fn teardown(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Teardown { op, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
