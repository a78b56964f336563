// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// Per-instance options of a host.
///
/// # Example
/// ```yaml
/// options:
///   caching_allowed: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostOptions {
    /// When false, reads always reach the device and writes are never skipped.
    pub caching_allowed: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            caching_allowed: true,
        }
    }
}

impl HostOptions {
    pub fn without_cache() -> Self {
        Self {
            caching_allowed: false,
        }
    }
}
