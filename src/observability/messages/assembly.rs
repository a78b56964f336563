// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for class assembly events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A host class was assembled.
///
/// # Log Level
/// `debug!` - Diagnostic event
///
/// # Example
/// ```
/// use the_featureset::observability::messages::assembly::ClassAssembled;
///
/// let msg = ClassAssembled {
///     class: "PowerSupply",
///     kind: "root",
///     attributes: 4,
///     owned: 2,
///     subsystems: 1,
///     channels: 0,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Assembled root class PowerSupply: 4 attributes (2 owned), 1 subsystems, 0 channels"
/// );
/// ```
pub struct ClassAssembled<'a> {
    pub class: &'a str,
    pub kind: &'a str,
    pub attributes: usize,
    pub owned: usize,
    pub subsystems: usize,
    pub channels: usize,
}

impl Display for ClassAssembled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Assembled {} class {}: {} attributes ({} owned), {} subsystems, {} channels",
            self.kind, self.class, self.attributes, self.owned, self.subsystems, self.channels
        )
    }
}

impl StructuredLog for ClassAssembled<'_> {
    fn log(&self) {
        tracing::debug!(
            class = self.class,
            kind = self.kind,
            attributes = self.attributes,
            owned = self.owned,
            subsystems = self.subsystems,
            channels = self.channels,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "assembly",
            span_name = name,
            class = self.class,
            kind = self.kind,
        )
    }
}

/// An inherited attribute was copied so that the class can customize it.
///
/// # Log Level
/// `trace!` - Detailed diagnostic event
pub struct AttributeCloned<'a> {
    pub class: &'a str,
    pub attribute: &'a str,
    pub member: &'a str,
}

impl Display for AttributeCloned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} copies inherited attribute '{}' to apply '{}'",
            self.class, self.attribute, self.member
        )
    }
}

impl StructuredLog for AttributeCloned<'_> {
    fn log(&self) {
        tracing::trace!(
            class = self.class,
            attribute = self.attribute,
            member = self.member,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "attribute_cloned",
            span_name = name,
            class = self.class,
            attribute = self.attribute,
        )
    }
}

/// An inherited attribute was rebuilt from an edited declaration.
///
/// # Log Level
/// `trace!` - Detailed diagnostic event
pub struct AttributeAltered<'a> {
    pub class: &'a str,
    pub attribute: &'a str,
    pub replayed: usize,
}

impl Display for AttributeAltered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} rebuilt attribute '{}' replaying {} customizations",
            self.class, self.attribute, self.replayed
        )
    }
}

impl StructuredLog for AttributeAltered<'_> {
    fn log(&self) {
        tracing::trace!(
            class = self.class,
            attribute = self.attribute,
            replayed = self.replayed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "attribute_altered",
            span_name = name,
            class = self.class,
            attribute = self.attribute,
        )
    }
}
