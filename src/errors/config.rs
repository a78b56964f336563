// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while declaring attributes or assembling a host class.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// An override method or alteration targets an attribute that does not exist.
    #[error(
        "{class} has no attribute '{attribute}' whose behaviour can be customised (from '{member}')"
    )]
    UnknownAttribute {
        class: String,
        attribute: String,
        member: String,
    },

    /// The hook registered under a prefixed name belongs to another stage.
    #[error("method '{method}' customises the {expected} stage but provides a {found} hook")]
    StageMismatch {
        method: String,
        expected: String,
        found: String,
    },

    /// A hook method is not named after one of the six stages.
    #[error("method '{method}' of {class} does not start with a stage prefix")]
    InvalidMethodName { class: String, method: String },

    /// Two validation options target the written value.
    #[error("attribute '{attribute}' declares both '{first}' and '{second}'")]
    ConflictingValidation {
        attribute: String,
        first: &'static str,
        second: &'static str,
    },

    /// An option was given to a kind of attribute that does not use it.
    #[error("'{option}' is not supported by {kind} attributes ('{attribute}')")]
    UnsupportedOption {
        attribute: String,
        kind: String,
        option: &'static str,
    },

    /// Limits could not be built from the given bounds.
    #[error("invalid limits: {0}")]
    InvalidLimits(String),

    /// Register bit names are malformed.
    #[error("invalid register declaration for '{attribute}': {reason}")]
    InvalidRegister { attribute: String, reason: String },

    /// A brand new channel was declared without a way to list its ids.
    #[error("no way to identify the channels declared as '{channel}' on {class}")]
    MissingChannelListing { class: String, channel: String },

    /// A sub-container re-declares an inherited one with a different kind.
    #[error("'{name}' is inherited as a {inherited} and cannot be re-declared as a {declared}")]
    SubContainerKindMismatch {
        name: String,
        inherited: &'static str,
        declared: &'static str,
    },

    /// A composer operation referenced a hook id that is not present.
    #[error("no hook named '{0}' in the composer")]
    UnknownHook(String),

    /// A recorded customization could not be replayed on a reconstructed attribute.
    #[error("cannot replay customization '{hook}' on the {stage} stage of '{attribute}': {reason}")]
    ReplayFailed {
        attribute: String,
        stage: String,
        hook: String,
        reason: String,
    },

    /// An action declares validation for an argument it does not take.
    #[error("action '{action}' has no argument named '{argument}'")]
    UnknownArgument { action: String, argument: String },

    /// A checker expression could not be parsed.
    #[error("invalid check '{expression}': {reason}")]
    InvalidCheck { expression: String, reason: String },

    /// An extraction pattern could not be parsed.
    #[error("invalid extract pattern '{pattern}': {reason}")]
    InvalidExtract { pattern: String, reason: String },

    /// Two members of the same class body share a name.
    #[error("{class} declares '{name}' more than once")]
    DuplicateMember { class: String, name: String },

    /// The bases of a class cannot be linearized.
    #[error("cannot create a consistent ancestor order for {0}")]
    InconsistentHierarchy(String),

    /// A limits id was requested that no accessor declares.
    #[error("{class} declares no limits named '{id}'")]
    UndeclaredLimits { class: String, id: String },

    /// A channel listing refers to a method that does not exist.
    #[error("{class} has no listing method '{method}'")]
    UnknownListing { class: String, method: String },

    /// The unit registry can only be installed once per process.
    #[error("the unit registry cannot be changed once set")]
    UnitRegistryAlreadySet,

    /// A declarative class file could not be read.
    #[error("failed to read '{path}': {reason}")]
    Io { path: String, reason: String },

    /// A declarative class file could not be parsed.
    #[error("failed to parse '{path}': {reason}")]
    Parse { path: String, reason: String },
}
