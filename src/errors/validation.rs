// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::value::Value;
use thiserror::Error;

/// A value (or the host state) was rejected before reaching the device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The value is not part of the declared set.
    #[error("allowed values for {attribute} are {}, {value} not allowed", join(.allowed))]
    NotAllowed {
        attribute: String,
        value: Value,
        allowed: Vec<Value>,
    },

    /// The value is outside the declared limits or off step.
    #[error("the provided value {value} is out of bound for {attribute}.{bounds}")]
    OutOfLimits {
        attribute: String,
        value: Value,
        bounds: String,
    },

    /// An action was called with the wrong number of arguments.
    #[error("{action} takes {expected} arguments, {found} given")]
    WrongArity {
        action: String,
        expected: usize,
        found: usize,
    },

    /// A declared check evaluated to false.
    #[error("assertion '{assertion}' failed for {attribute}")]
    CheckFailed { attribute: String, assertion: String },

    /// A mapping table has no entry for the value.
    #[error("no {direction} mapping for {value} on {attribute}")]
    NoMapping {
        attribute: String,
        direction: &'static str,
        value: Value,
    },

    /// The value cannot be converted to the expected type.
    #[error("{attribute} expects {expected}, got {value}")]
    InvalidType {
        attribute: String,
        expected: &'static str,
        value: Value,
    },

    /// A quantity cannot be converted to the declared unit.
    #[error("cannot convert {from} to {to} for {attribute}")]
    UnitMismatch {
        attribute: String,
        from: String,
        to: String,
    },
}

fn join(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}
