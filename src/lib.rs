// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod actions;       // validated device methods
pub mod assembly;      // class builder + ancestor order
pub mod attributes;    // declarations and the access pipeline
pub mod backends;      // bundled drivers
pub mod checks;        // assertion expressions
pub mod config;        // host options + class files
pub mod errors;        // error handling
pub mod host;          // per-instance runtime
pub mod limits;        // numeric bounds
pub mod observability;
pub mod traits;        // driver abstraction
pub mod units;         // pluggable unit registry
pub mod value;         // dynamic values
