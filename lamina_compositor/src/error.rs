// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;
use std::io;

/// Errors from [`ThreadedHost`](crate::ThreadedHost) operations.
#[derive(Debug)]
pub enum HostError {
    /// The compositor thread could not be spawned.
    Spawn(io::Error),
    /// The compositor thread has exited.
    Disconnected,
    /// The layer tree has no host attached.
    Detached,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to spawn compositor thread: {err}"),
            Self::Disconnected => f.write_str("compositor thread has exited"),
            Self::Detached => f.write_str("layer tree has no host"),
        }
    }
}

impl core::error::Error for HostError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::Disconnected | Self::Detached => None,
        }
    }
}
