// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for attribute access.
//!
//! Four families of failure exist and they are handled differently by the
//! access pipeline:
//!
//! * [`ConfigurationError`] - raised while assembling a class (or resolving a
//!   declaration lazily). Never retried.
//! * [`ValidationError`] - raised by pre-read/pre-write stages when a value or
//!   the host state is not acceptable. Never retried.
//! * [`CommunicationError`] - raised by the transport collaborator. Retried
//!   with a reconnect in between, up to the attribute's retry count.
//! * [`Error::OperationFailed`] - raised by the default post-write stage when
//!   the collaborator refuses to confirm a write.
//!
//! Anything else produced by a user hook travels as [`Error::Hook`] and is
//! propagated untouched.

mod communication;
mod config;
mod validation;

pub use communication::{CommunicationError, CommunicationKind};
pub use config::ConfigurationError;
pub use validation::ValidationError;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top level error returned by every attribute access.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid declaration or class assembly.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A value or the host state was rejected before talking to the device.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Retryable failure of the communication channel.
    #[error(transparent)]
    Communication(#[from] CommunicationError),

    /// The collaborator reported that a write did not take effect.
    #[error(
        "the device did not succeed to set {attribute} to {value} ({transformed}){}",
        detail_suffix(.detail)
    )]
    OperationFailed {
        attribute: String,
        value: String,
        transformed: String,
        detail: Option<String>,
    },

    /// The attribute has no read token and no custom read stage.
    #[error("attribute '{0}' is not readable")]
    NotReadable(String),

    /// The attribute has no write token and no custom write stage.
    #[error("attribute '{0}' is not writable")]
    NotWritable(String),

    /// No attribute with that name exists on the host class.
    #[error("'{class}' has no attribute '{name}'")]
    UnknownAttribute { class: String, name: String },

    /// No action with that name exists on the host class.
    #[error("'{class}' has no action '{name}'")]
    UnknownAction { class: String, name: String },

    /// No subsystem or channel with that name exists on the host class.
    #[error("'{class}' has no sub-container '{name}'")]
    UnknownContainer { class: String, name: String },

    /// The parent of a sub-container was dropped while the child is still in use.
    #[error("the parent of '{0}' is no longer alive")]
    Detached(String),

    /// Any other failure raised by a user supplied hook.
    #[error(transparent)]
    Hook(#[from] anyhow::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(": {}", d),
        _ => ".".to_string(),
    }
}

impl Error {
    /// Shorthand for a connection-lost communication failure.
    pub fn communication(message: impl Into<String>) -> Self {
        Error::Communication(CommunicationError::new(
            CommunicationKind::ConnectionLost,
            message,
        ))
    }

    /// Shorthand for a timed out communication.
    pub fn timeout(message: impl Into<String>) -> Self {
        Error::Communication(CommunicationError::new(CommunicationKind::Timeout, message))
    }

    /// Whether this error comes from the communication channel.
    pub fn is_communication(&self) -> bool {
        matches!(self, Error::Communication(_))
    }

    /// Whether this error was raised while validating a value.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Whether this error was raised while assembling a class.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_failed_message() {
        let with_detail = Error::OperationFailed {
            attribute: "voltage".to_string(),
            value: "1.5".to_string(),
            transformed: "1.5".to_string(),
            detail: Some("overload".to_string()),
        };
        assert_eq!(
            with_detail.to_string(),
            "the device did not succeed to set voltage to 1.5 (1.5): overload"
        );

        let without = Error::OperationFailed {
            attribute: "voltage".to_string(),
            value: "1.5".to_string(),
            transformed: "1.5".to_string(),
            detail: None,
        };
        assert!(without.to_string().ends_with("(1.5)."));
    }

    #[test]
    fn test_classification() {
        assert!(Error::timeout("no answer").is_communication());
        assert!(!Error::NotReadable("x".into()).is_communication());
        let hook: Error = anyhow::anyhow!("boom").into();
        assert_eq!(hook.to_string(), "boom");
    }
}
