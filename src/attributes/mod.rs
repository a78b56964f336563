// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Attribute declarations and their access pipeline.
//!
//! An [`Attribute`] describes how one property of a device is read and
//! written. Each access goes through six stages which can be customized
//! one by one: a stage is either the default behaviour, a single hook, or a
//! [`HookComposer`] holding an ordered list of named hooks.
//!
//! # Usage
//!
//! ```rust
//! use the_featureset::attributes::{Attribute, Declaration};
//!
//! let voltage = Attribute::new(
//!     "voltage",
//!     Declaration::float().with_getter("VOLT?").with_setter("VOLT {}").with_retries(2),
//! )
//! .unwrap();
//! assert!(voltage.is_readable());
//! assert_eq!(voltage.retries(), 2);
//! ```

mod attribute;
mod composer;
mod declaration;
mod extract;
mod hooks;
mod kinds;
mod pipeline;

#[cfg(test)]
mod integration_tests;

pub use attribute::Attribute;
pub use composer::HookComposer;
pub use declaration::{AttributeKind, Declaration, LimitsSpec, MappingTable, RegisterNames};
pub use extract::ExtractPattern;
pub use hooks::{
    Customization, Hook, Placement, PostWriteHook, PreReadHook, ReadHook, Stage, ValueHook,
};
pub use pipeline::{CONFIRM_ID, OLD_ID};
