// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human readable line and
//! [`StructuredLog`] to emit it with its fields at the right level.
//!
//! # Organization
//!
//! * `action` - action calls and host instance reuse
//! * `attribute` - access pipeline events
//! * `assembly` - class assembly events
//! * `host` - host runtime events
//! * `config` - class file loading events
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_featureset::observability::messages::attribute::CacheHit;
//!
//! let msg = CacheHit {
//!     container: "PowerSupply",
//!     attribute: "voltage",
//! };
//!
//! tracing::trace!("{}", msg);
//! ```

pub mod action;
pub mod assembly;
pub mod attribute;
pub mod config;
pub mod host;

use tracing::Span;

/// A message that knows its log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message fields.
    fn span(&self, name: &str) -> Span;
}
