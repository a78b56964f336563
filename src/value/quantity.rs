// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::units::UnitRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A magnitude expressed in a physical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: impl Into<String>) -> Self {
        Self {
            magnitude,
            unit: unit.into(),
        }
    }

    /// Express the quantity in `target`, or `None` when the units are not
    /// commensurable in `registry`.
    pub fn to(&self, target: &str, registry: &dyn UnitRegistry) -> Option<Quantity> {
        if self.unit == target {
            return Some(self.clone());
        }
        let factor = registry.factor(&self.unit, target)?;
        Some(Quantity::new(self.magnitude * factor, target))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}
