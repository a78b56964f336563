// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Assembly of host classes.
//!
//! A [`ClassBuilder`] collects the members of a class body (attribute
//! declarations, alterations of inherited attributes, prefixed override
//! methods, limits accessors, channel listings and sub-container
//! declarations) and [`ClassBuilder::build`] turns them into an immutable
//! [`HostClass`]. Inheritance follows the C3 ancestor order: each ancestor
//! contributes the attributes it owns, and a class only copies an inherited
//! attribute when it customizes it, so a base class is never affected by its
//! subclasses.
//!
//! # Example
//!
//! ```rust
//! use the_featureset::assembly::ClassBuilder;
//! use the_featureset::attributes::{Declaration, Hook, Stage};
//! use the_featureset::value::Value;
//!
//! let base = ClassBuilder::new("Source")
//!     .attribute("level", Declaration::int().with_getter("LEV?").with_setter("LEV"))
//!     .build()
//!     .unwrap();
//!
//! let doubled = ClassBuilder::new("DoubledSource")
//!     .base(base.clone())
//!     .method(
//!         "_post_read_level",
//!         Hook::post_read(|_, _, value| Ok(Value::Int(value.as_i64().unwrap_or(0) * 2))),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let method = "_post_read_level".to_string();
//! let inherited = base.attribute("level").unwrap();
//! assert!(!inherited.stage_hooks(Stage::PostRead).contains(&method));
//! let customized = doubled.attribute("level").unwrap();
//! assert!(customized.stage_hooks(Stage::PostRead).contains(&method));
//! assert!(doubled.owns("level"));
//! ```

mod builder;
mod class;
mod mro;

pub use builder::ClassBuilder;
pub use class::{
    Available, ChannelDeclaration, ContainerKind, HostClass, LimitsMethod, ListingMethod,
};
