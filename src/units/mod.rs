// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pluggable unit support.
//!
//! Unit arithmetic lives outside the crate: a [`UnitRegistry`] only has to
//! canonicalize unit expressions and give the scale factor between two
//! commensurable units. A single registry is installed per process with
//! [`set_unit_registry`]; when none is installed, attributes declared with a
//! unit behave as plain numbers.
//!
//! [`ScaledUnitRegistry`] is a small table driven implementation good enough
//! for linear units (SI prefixes and the like).

use crate::errors::{ConfigurationError, Result, ValidationError};
use crate::value::{Quantity, Value};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Unit collaborator used by unit aware attributes and limits.
pub trait UnitRegistry: Send + Sync {
    /// Canonical spelling of a unit expression, `None` when unknown.
    fn parse(&self, expr: &str) -> Option<String>;

    /// Multiplicative factor converting a magnitude in `from` into `to`.
    fn factor(&self, from: &str, to: &str) -> Option<f64>;
}

static UNIT_REGISTRY: OnceCell<Arc<dyn UnitRegistry>> = OnceCell::new();

/// Install the process wide unit registry.
///
/// Conversions only make sense inside a single registry, so it cannot be
/// replaced once installed.
pub fn set_unit_registry(registry: Arc<dyn UnitRegistry>) -> Result<(), ConfigurationError> {
    UNIT_REGISTRY
        .set(registry)
        .map_err(|_| ConfigurationError::UnitRegistryAlreadySet)?;
    tracing::debug!("unit registry installed");
    Ok(())
}

/// The installed unit registry, if any.
pub fn unit_registry() -> Option<Arc<dyn UnitRegistry>> {
    UNIT_REGISTRY.get().cloned()
}

/// Linear unit table: each unit belongs to a dimension and carries its scale
/// relative to the dimension's reference unit.
#[derive(Debug, Clone, Default)]
pub struct ScaledUnitRegistry {
    units: HashMap<String, (String, f64)>,
}

const SI_PREFIXES: &[(&str, f64)] = &[
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("m", 1e-3),
    ("u", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
];

impl ScaledUnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `unit` as `scale` times the reference unit of `dimension`.
    pub fn with_unit(mut self, unit: &str, dimension: &str, scale: f64) -> Self {
        self.units
            .insert(unit.to_string(), (dimension.to_string(), scale));
        self
    }

    /// Register `base` and its usual SI prefixed variants.
    pub fn with_si_unit(mut self, base: &str, dimension: &str) -> Self {
        self = self.with_unit(base, dimension, 1.0);
        for (prefix, scale) in SI_PREFIXES {
            self = self.with_unit(&format!("{}{}", prefix, base), dimension, *scale);
        }
        self
    }
}

impl UnitRegistry for ScaledUnitRegistry {
    fn parse(&self, expr: &str) -> Option<String> {
        let trimmed = expr.trim();
        self.units.contains_key(trimmed).then(|| trimmed.to_string())
    }

    fn factor(&self, from: &str, to: &str) -> Option<f64> {
        let (from_dim, from_scale) = self.units.get(from.trim())?;
        let (to_dim, to_scale) = self.units.get(to.trim())?;
        (from_dim == to_dim).then(|| from_scale / to_scale)
    }
}

/// Express a quantity as a plain magnitude in `unit`.
///
/// Plain values pass through. Without a registry the magnitude is kept as is.
pub fn convert(
    owner: &str,
    value: Value,
    unit: &str,
    registry: Option<&dyn UnitRegistry>,
) -> Result<Value> {
    let quantity = match value {
        Value::Quantity(q) => q,
        other => return Ok(other),
    };
    match registry {
        Some(registry) => quantity
            .to(unit, registry)
            .map(|q| Value::Float(q.magnitude))
            .ok_or_else(|| {
                ValidationError::UnitMismatch {
                    attribute: owner.to_string(),
                    from: quantity.unit.clone(),
                    to: unit.to_string(),
                }
                .into()
            }),
        None => Ok(Value::Float(quantity.magnitude)),
    }
}

/// A magnitude tagged with `unit` when a registry is available, a plain float otherwise.
pub fn with_unit(magnitude: f64, unit: Option<&str>, registry: Option<&dyn UnitRegistry>) -> Value {
    match (unit, registry) {
        (Some(unit), Some(registry)) => {
            let canonical = registry.parse(unit).unwrap_or_else(|| unit.to_string());
            Value::Quantity(Quantity::new(magnitude, canonical))
        }
        _ => Value::Float(magnitude),
    }
}

/// Install the registry shared by every unit aware test of the crate.
#[cfg(test)]
pub(crate) fn install_test_registry() {
    let registry = ScaledUnitRegistry::new()
        .with_si_unit("V", "voltage")
        .with_si_unit("A", "current")
        .with_si_unit("Hz", "frequency");
    let _ = set_unit_registry(Arc::new(registry));
}
