// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for action calls and host instance reuse.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An action passed validation and its body is about to run.
///
/// # Log Level
/// `debug!` - Diagnostic event
///
/// # Example
/// ```
/// use the_featureset::observability::messages::action::ActionInvoked;
///
/// let msg = ActionInvoked {
///     container: "PowerSupply",
///     action: "ramp",
///     arguments: 2,
/// };
///
/// assert_eq!(msg.to_string(), "Calling ramp of PowerSupply with 2 validated arguments");
/// ```
pub struct ActionInvoked<'a> {
    pub container: &'a str,
    pub action: &'a str,
    pub arguments: usize,
}

impl Display for ActionInvoked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Calling {} of {} with {} validated arguments",
            self.action, self.container, self.arguments
        )
    }
}

impl StructuredLog for ActionInvoked<'_> {
    fn log(&self) {
        tracing::debug!(
            container = self.container,
            action = self.action,
            arguments = self.arguments,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "action",
            span_name = name,
            container = self.container,
            action = self.action,
        )
    }
}

/// A host was requested for a connection that already has a live instance.
///
/// # Log Level
/// `debug!` - Diagnostic event
pub struct InstanceReused<'a> {
    pub class: &'a str,
    pub connection: &'a str,
}

impl Display for InstanceReused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reusing the {} host already open on '{}'",
            self.class, self.connection
        )
    }
}

impl StructuredLog for InstanceReused<'_> {
    fn log(&self) {
        tracing::debug!(
            class = self.class,
            connection = self.connection,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "instance",
            span_name = name,
            class = self.class,
            connection = self.connection,
        )
    }
}
