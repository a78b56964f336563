// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for attribute access events.
//!
//! This module contains message types for logging events related to:
//! * Cache hits on reads and skipped identical writes
//! * Retries after communication failures
//! * Write confirmations refused by the device

use crate::errors::Error;
use crate::observability::messages::StructuredLog;
use crate::value::Value;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A read was answered from the host cache.
///
/// # Log Level
/// `trace!` - Hot path event
pub struct CacheHit<'a> {
    pub container: &'a str,
    pub attribute: &'a str,
}

impl Display for CacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Serving '{}' of {} from the cache",
            self.attribute, self.container
        )
    }
}

impl StructuredLog for CacheHit<'_> {
    fn log(&self) {
        tracing::trace!(
            container = self.container,
            attribute = self.attribute,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "cache_hit",
            span_name = name,
            container = self.container,
            attribute = self.attribute,
        )
    }
}

/// A write was skipped because the cache already holds the value.
///
/// # Log Level
/// `debug!` - Diagnostic event
///
/// # Example
/// ```
/// use the_featureset::observability::messages::attribute::WriteSkipped;
/// use the_featureset::value::Value;
///
/// let value = Value::Float(1.5);
/// let msg = WriteSkipped {
///     container: "PowerSupply",
///     attribute: "voltage",
///     value: &value,
/// };
///
/// assert!(msg.to_string().contains("already 1.5"));
/// ```
pub struct WriteSkipped<'a> {
    pub container: &'a str,
    pub attribute: &'a str,
    pub value: &'a Value,
}

impl Display for WriteSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Skipping write of '{}' on {}: already {}",
            self.attribute, self.container, self.value
        )
    }
}

impl StructuredLog for WriteSkipped<'_> {
    fn log(&self) {
        tracing::debug!(
            container = self.container,
            attribute = self.attribute,
            value = %self.value,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "write_skipped",
            span_name = name,
            container = self.container,
            attribute = self.attribute,
            value = %self.value,
        )
    }
}

/// An access failed and will be attempted again after a reconnect.
///
/// # Log Level
/// `warn!` - Recoverable failure
pub struct RetryingAfterFailure<'a> {
    pub attribute: &'a str,
    pub operation: &'a str,
    pub attempt: u32,
    pub retries: u32,
    pub error: &'a Error,
}

impl Display for RetryingAfterFailure<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to {} '{}' ({}), reconnecting for retry {}/{}",
            self.operation, self.attribute, self.error, self.attempt, self.retries
        )
    }
}

impl StructuredLog for RetryingAfterFailure<'_> {
    fn log(&self) {
        tracing::warn!(
            attribute = self.attribute,
            operation = self.operation,
            attempt = self.attempt,
            retries = self.retries,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "retry",
            span_name = name,
            attribute = self.attribute,
            operation = self.operation,
            attempt = self.attempt,
            retries = self.retries,
        )
    }
}

/// Every allowed attempt failed.
///
/// # Log Level
/// `error!` - The failure is returned to the caller
pub struct RetriesExhausted<'a> {
    pub attribute: &'a str,
    pub operation: &'a str,
    pub attempts: u32,
    pub error: &'a Error,
}

impl Display for RetriesExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Giving up to {} '{}' after {} attempts: {}",
            self.operation, self.attribute, self.attempts, self.error
        )
    }
}

impl StructuredLog for RetriesExhausted<'_> {
    fn log(&self) {
        tracing::error!(
            attribute = self.attribute,
            operation = self.operation,
            attempts = self.attempts,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "retries_exhausted",
            span_name = name,
            attribute = self.attribute,
            operation = self.operation,
            attempts = self.attempts,
        )
    }
}

/// The device did not confirm a write.
///
/// # Log Level
/// `error!` - The write is reported as failed
pub struct OperationRefused<'a> {
    pub attribute: &'a str,
    pub value: &'a Value,
    pub transformed: &'a Value,
    pub detail: Option<&'a str>,
}

impl Display for OperationRefused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Device refused to set '{}' to {} (sent {})",
            self.attribute, self.value, self.transformed
        )?;
        if let Some(detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl StructuredLog for OperationRefused<'_> {
    fn log(&self) {
        tracing::error!(
            attribute = self.attribute,
            value = %self.value,
            transformed = %self.transformed,
            detail = self.detail,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "operation_refused",
            span_name = name,
            attribute = self.attribute,
            value = %self.value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_messages() {
        let error = Error::timeout("no answer");
        let retry = RetryingAfterFailure {
            attribute: "voltage",
            operation: "read",
            attempt: 1,
            retries: 3,
            error: &error,
        };
        assert_eq!(
            retry.to_string(),
            "Failed to read 'voltage' (communication timeout: no answer), reconnecting for retry 1/3"
        );

        let exhausted = RetriesExhausted {
            attribute: "voltage",
            operation: "write",
            attempts: 4,
            error: &error,
        };
        assert!(exhausted.to_string().starts_with("Giving up to write 'voltage' after 4 attempts"));
    }

    #[test]
    fn test_operation_refused_detail() {
        let value = Value::Int(3);
        let refused = OperationRefused {
            attribute: "mode",
            value: &value,
            transformed: &value,
            detail: Some("locked"),
        };
        assert_eq!(refused.to_string(), "Device refused to set 'mode' to 3 (sent 3): locked");
    }
}
