// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for host runtime events.
//!
//! This module contains message types for logging events related to:
//! * Host instantiation and lazily created channels
//! * Limits resolution
//! * Cache control and reconnections

use crate::observability::messages::StructuredLog;
use crate::value::ChannelId;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A root host and its subsystems were instantiated.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_featureset::observability::messages::host::HostCreated;
///
/// let msg = HostCreated {
///     class: "PowerSupply",
///     subsystems: 2,
///     channel_kinds: 1,
///     caching_allowed: true,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct HostCreated<'a> {
    pub class: &'a str,
    pub subsystems: usize,
    pub channel_kinds: usize,
    pub caching_allowed: bool,
}

impl Display for HostCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created {} host: {} subsystems, {} channel kinds, caching={}",
            self.class, self.subsystems, self.channel_kinds, self.caching_allowed
        )
    }
}

impl StructuredLog for HostCreated<'_> {
    fn log(&self) {
        tracing::info!(
            class = self.class,
            subsystems = self.subsystems,
            channel_kinds = self.channel_kinds,
            caching_allowed = self.caching_allowed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "host",
            span_name = name,
            class = self.class,
            caching_allowed = self.caching_allowed,
        )
    }
}

/// A channel was created on first access.
///
/// # Log Level
/// `debug!` - Diagnostic event
pub struct ChannelInstantiated<'a> {
    pub channel: &'a str,
    pub class: &'a str,
    pub id: &'a ChannelId,
}

impl Display for ChannelInstantiated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Instantiated channel '{}' #{} as {}",
            self.channel, self.id, self.class
        )
    }
}

impl StructuredLog for ChannelInstantiated<'_> {
    fn log(&self) {
        tracing::debug!(
            channel = self.channel,
            class = self.class,
            id = %self.id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "channel",
            span_name = name,
            channel = self.channel,
            id = %self.id,
        )
    }
}

/// A limits accessor was evaluated and its result cached.
///
/// # Log Level
/// `debug!` - Diagnostic event
pub struct LimitsResolved<'a> {
    pub container: &'a str,
    pub id: &'a str,
    pub bounds: &'a str,
}

impl Display for LimitsResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Resolved limits '{}' of {}: {}",
            self.id, self.container, self.bounds
        )
    }
}

impl StructuredLog for LimitsResolved<'_> {
    fn log(&self) {
        tracing::debug!(
            container = self.container,
            id = self.id,
            bounds = self.bounds,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "limits",
            span_name = name,
            container = self.container,
            id = self.id,
        )
    }
}

/// Cached values were dropped.
///
/// # Log Level
/// `debug!` - Diagnostic event
pub struct CacheCleared<'a> {
    pub container: &'a str,
    pub scope: &'a str,
}

impl Display for CacheCleared<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cleared {} cache entries of {}", self.scope, self.container)
    }
}

impl StructuredLog for CacheCleared<'_> {
    fn log(&self) {
        tracing::debug!(container = self.container, scope = self.scope, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "cache_cleared",
            span_name = name,
            container = self.container,
            scope = self.scope,
        )
    }
}

/// The driver is asked to reopen its connection.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConnectionReopened<'a> {
    pub container: &'a str,
}

impl Display for ConnectionReopened<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Reopening the connection of {}", self.container)
    }
}

impl StructuredLog for ConnectionReopened<'_> {
    fn log(&self) {
        tracing::info!(container = self.container, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("reconnect", span_name = name, container = self.container)
    }
}
