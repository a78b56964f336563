// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Driver implementations shipped with the crate.
//!
//! Real instruments are reached through user supplied [`Driver`]s; this
//! module only provides collaborators that keep device state in memory.
//!
//! # Available Backends
//!
//! ## Memory Backend
//! A simulated device storing the last written value of every token:
//! - **Routing**: Channel calls are stored per `ch_id`
//! - **Failure Injection**: The next N calls can be made to time out
//! - **Counters**: Reads, writes and reconnects are counted
//! - **Use Case**: The CLI, documentation examples, testing hosts
//!
//! ## Stub Backend (Test-Only)
//! Testing utilities for pipeline development (only available in test builds):
//! - **RefusingDriver**: Rejects every write confirmation
//! - **FailingDriver**: Fails every call, retryable or not
//!
//! # Example
//!
//! ```rust
//! use the_featureset::backends::MemoryDriver;
//! use the_featureset::value::Value;
//!
//! let driver = MemoryDriver::new().with_value("VOLT", Value::Float(1.5));
//! assert_eq!(driver.value("VOLT?", None), Some(Value::Float(1.5)));
//! ```
//!
//! [`Driver`]: crate::traits::Driver

pub mod memory;
#[cfg(test)]
pub mod stub;

pub use memory::MemoryDriver;
