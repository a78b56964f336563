// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarative host class definitions.
//!
//! A class file describes the attributes of a device, its static limits and
//! its sub-containers. Code level hooks (override methods, computed limits,
//! channel listings) are attached afterwards on the [`ClassBuilder`]
//! returned by [`ClassConfig::to_builder`].

use super::HostOptions;
use crate::assembly::{Available, ClassBuilder, HostClass};
use crate::attributes::{AttributeKind, Declaration, LimitsSpec, MappingTable, RegisterNames};
use crate::errors::ConfigurationError;
use crate::limits::LimitsValidator;
use crate::value::{ChannelId, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Root of a class file.
///
/// # Example
/// ```yaml
/// name: PowerSupply
/// options:
///   caching_allowed: true
/// attributes:
///   voltage:
///     kind: float
///     getter: "VOLT?"
///     setter: "VOLT {}"
///     unit: V
///     limits: { min: 0, max: 30 }
/// channels:
///   output:
///     ids: [1, 2]
///     attributes:
///       enabled: { kind: bool, getter: "OUTP?", setter: "OUTP {}" }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClassConfig {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub options: HostOptions,
    #[serde(flatten)]
    pub body: ContainerConfig,
}

/// Members shared by classes, subsystems and channels.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ContainerConfig {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeConfig>,
    /// Limits ids resolved by `_limits_<id>` accessors returning fixed bounds.
    #[serde(default)]
    pub limits: BTreeMap<String, LimitsConfig>,
    #[serde(default)]
    pub subsystems: BTreeMap<String, ContainerConfig>,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

/// A channel kind with a fixed set of ids.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChannelConfig {
    #[serde(default)]
    pub ids: Vec<ChannelId>,
    #[serde(flatten)]
    pub body: ContainerConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KindConfig {
    #[default]
    Feature,
    Enumerable,
    LimitsValidated,
    Mapping,
    #[serde(alias = "boolean")]
    Bool,
    Register,
    #[serde(alias = "string")]
    Str,
    Int,
    Float,
}

impl From<KindConfig> for AttributeKind {
    fn from(kind: KindConfig) -> Self {
        match kind {
            KindConfig::Feature => AttributeKind::Feature,
            KindConfig::Enumerable => AttributeKind::Enumerable,
            KindConfig::LimitsValidated => AttributeKind::LimitsValidated,
            KindConfig::Mapping => AttributeKind::Mapping,
            KindConfig::Bool => AttributeKind::Bool,
            KindConfig::Register => AttributeKind::Register,
            KindConfig::Str => AttributeKind::Str,
            KindConfig::Int => AttributeKind::Int,
            KindConfig::Float => AttributeKind::Float,
        }
    }
}

/// One attribute of a class file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AttributeConfig {
    #[serde(default)]
    pub kind: KindConfig,
    #[serde(default)]
    pub getter: Option<Value>,
    #[serde(default)]
    pub setter: Option<Value>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub checks: Option<ChecksConfig>,
    #[serde(default)]
    pub discard: Option<DiscardConfig>,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub limits: Option<LimitsRef>,
    #[serde(default)]
    pub mapping: Option<MappingConfig>,
    #[serde(default)]
    pub aliases: Option<AliasesConfig>,
    #[serde(default)]
    pub names: Option<NamesConfig>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Assertions run before reading and writing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChecksConfig {
    Both(String),
    Split {
        #[serde(default)]
        read: Option<String>,
        #[serde(default)]
        write: Option<String>,
    },
}

/// Caches dropped after a write.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DiscardConfig {
    Attributes(Vec<String>),
    Split {
        #[serde(default)]
        attributes: Vec<String>,
        #[serde(default)]
        limits: Vec<String>,
    },
}

/// Either fixed bounds or the id of limits declared on the class.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LimitsRef {
    Named(String),
    Fixed(LimitsConfig),
}

/// Numeric bounds. Integer bounds without a unit give integer limits.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LimitsConfig {
    #[serde(default, alias = "min")]
    pub minimum: Option<Value>,
    #[serde(default, alias = "max")]
    pub maximum: Option<Value>,
    #[serde(default)]
    pub step: Option<Value>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// `[user, device]` pairs, or one table per direction.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MappingConfig {
    Symmetric(Vec<(Value, Value)>),
    Asymmetric {
        to_device: Vec<(Value, Value)>,
        from_device: Vec<(Value, Value)>,
    },
}

/// Extra user values accepted for a boolean.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AliasesConfig {
    #[serde(default)]
    pub truthy: Vec<Value>,
    #[serde(default)]
    pub falsy: Vec<Value>,
}

/// Register bit names, as a sequence or as name to index.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NamesConfig {
    Sequence(Vec<Option<String>>),
    Indexed(BTreeMap<String, u32>),
}

impl ClassConfig {
    /// Builder holding every declared member, ready for code level hooks.
    pub fn to_builder(&self) -> Result<ClassBuilder, ConfigurationError> {
        self.body.apply(ClassBuilder::new(self.name.as_str()))
    }

    pub fn build(&self) -> Result<Arc<HostClass>, ConfigurationError> {
        self.to_builder()?.build()
    }

    /// Number of attributes declared in the file, sub-containers included.
    pub fn attribute_count(&self) -> usize {
        self.body.attribute_count()
    }
}

impl ContainerConfig {
    fn apply(&self, mut builder: ClassBuilder) -> Result<ClassBuilder, ConfigurationError> {
        for (name, attribute) in &self.attributes {
            builder = builder.attribute(name, attribute.to_declaration()?);
        }
        for (id, limits) in &self.limits {
            let validator = limits.to_validator()?;
            builder = builder.limits(id, move |_| Ok(validator.clone()));
        }
        for (name, subsystem) in &self.subsystems {
            builder = builder.subsystem(name, subsystem.apply(ClassBuilder::anonymous())?);
        }
        for (name, channel) in &self.channels {
            let available = if channel.ids.is_empty() {
                None
            } else {
                Some(Available::Ids(channel.ids.clone()))
            };
            builder = builder.channel(
                name,
                channel.body.apply(ClassBuilder::anonymous())?,
                available,
            );
        }
        Ok(builder)
    }

    fn attribute_count(&self) -> usize {
        self.attributes.len()
            + self
                .subsystems
                .values()
                .map(ContainerConfig::attribute_count)
                .sum::<usize>()
            + self
                .channels
                .values()
                .map(|c| c.body.attribute_count())
                .sum::<usize>()
    }
}

impl AttributeConfig {
    pub fn to_declaration(&self) -> Result<Declaration, ConfigurationError> {
        let mut declaration = Declaration::of_kind(self.kind.into());
        declaration.getter = self.getter.clone();
        declaration.setter = self.setter.clone();
        declaration.retries = self.retries;
        match &self.checks {
            Some(ChecksConfig::Both(checks)) => {
                declaration.read_checks = Some(checks.clone());
                declaration.write_checks = Some(checks.clone());
            }
            Some(ChecksConfig::Split { read, write }) => {
                declaration.read_checks = read.clone();
                declaration.write_checks = write.clone();
            }
            None => {}
        }
        match &self.discard {
            Some(DiscardConfig::Attributes(attributes)) => {
                declaration.discard = attributes.clone();
            }
            Some(DiscardConfig::Split { attributes, limits }) => {
                declaration.discard = attributes.clone();
                declaration.discard_limits = limits.clone();
            }
            None => {}
        }
        declaration.extract = self.extract.clone();
        declaration.doc = self.doc.clone();
        declaration.values = self.values.clone();
        declaration.limits = match &self.limits {
            Some(LimitsRef::Named(id)) => Some(LimitsSpec::Named(id.clone())),
            Some(LimitsRef::Fixed(limits)) => Some(LimitsSpec::Fixed(limits.to_validator()?)),
            None => None,
        };
        declaration.mapping = self.mapping.as_ref().map(|mapping| match mapping {
            MappingConfig::Symmetric(pairs) => MappingTable::Symmetric(pairs.clone()),
            MappingConfig::Asymmetric {
                to_device,
                from_device,
            } => MappingTable::Asymmetric {
                to_device: to_device.clone(),
                from_device: from_device.clone(),
            },
        });
        if let Some(aliases) = &self.aliases {
            if !aliases.truthy.is_empty() {
                declaration.aliases.insert(true, aliases.truthy.clone());
            }
            if !aliases.falsy.is_empty() {
                declaration.aliases.insert(false, aliases.falsy.clone());
            }
        }
        declaration.names = self.names.as_ref().map(|names| match names {
            NamesConfig::Sequence(names) => RegisterNames::Sequence(names.clone()),
            NamesConfig::Indexed(names) => RegisterNames::Indexed(names.clone()),
        });
        declaration.unit = self.unit.clone();
        Ok(declaration)
    }
}

impl LimitsConfig {
    pub fn to_validator(&self) -> Result<LimitsValidator, ConfigurationError> {
        let bounds = [&self.minimum, &self.maximum, &self.step];
        let integral = self.unit.is_none()
            && bounds
                .iter()
                .all(|bound| matches!(bound, None | Some(Value::Int(_))));
        if integral {
            let int = |bound: &Option<Value>| bound.as_ref().and_then(Value::as_i64);
            return LimitsValidator::int(int(&self.minimum), int(&self.maximum), int(&self.step));
        }
        LimitsValidator::float(
            number("minimum", &self.minimum)?,
            number("maximum", &self.maximum)?,
            number("step", &self.step)?,
            self.unit.as_deref(),
        )
    }
}

fn number(field: &str, bound: &Option<Value>) -> Result<Option<f64>, ConfigurationError> {
    match bound {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            ConfigurationError::InvalidLimits(format!("{} must be a number, got {}", field, value))
        }),
    }
}
