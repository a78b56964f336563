// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and
//! operational logging of the attribute framework. Message types follow a
//! struct-based pattern with a `Display` implementation so that log lines
//! never carry magic strings and every event is emitted with the same
//! structured fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::attribute` - cache hits, skipped writes, retries and refused operations
//! * `messages::assembly` - class assembly and attribute cloning
//! * `messages::host` - host instances, channels, limits and cache control
//! * `messages::config` - declarative class files
//!
//! # Usage
//!
//! ```rust
//! use the_featureset::observability::messages::host::CacheCleared;
//! use the_featureset::observability::messages::StructuredLog;
//!
//! CacheCleared {
//!     container: "PowerSupply",
//!     scope: "all",
//! }
//! .log();
//! ```

pub mod messages;
