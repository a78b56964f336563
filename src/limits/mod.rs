// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Range and step validation for numeric attributes.
//!
//! A validator needs at least one bound. When a step is given, accepted
//! values are the bound plus a whole number of steps: the minimum is the
//! reference when declared, the maximum otherwise.

use crate::errors::ConfigurationError;
use crate::units::{unit_registry, UnitRegistry};
use crate::value::Value;

/// Tolerance used when checking that a float lands on a step.
const STEP_TOLERANCE: f64 = 1e-9;

/// Stateless min/max/step validator.
#[derive(Debug, Clone, PartialEq)]
pub enum LimitsValidator {
    Int(IntLimits),
    Float(FloatLimits),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntLimits {
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub step: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatLimits {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub step: Option<f64>,
    /// Unit in which the bounds and the step are expressed.
    pub unit: Option<String>,
}

impl LimitsValidator {
    pub fn int(
        minimum: Option<i64>,
        maximum: Option<i64>,
        step: Option<i64>,
    ) -> Result<Self, ConfigurationError> {
        if minimum.is_none() && maximum.is_none() {
            return Err(ConfigurationError::InvalidLimits(
                "integer limits must have a minimum or a maximum".to_string(),
            ));
        }
        if let Some(s) = step {
            if s <= 0 {
                return Err(ConfigurationError::InvalidLimits(format!(
                    "step must be strictly positive, got {}",
                    s
                )));
            }
        }
        if let (Some(lo), Some(hi)) = (minimum, maximum) {
            if lo > hi {
                return Err(ConfigurationError::InvalidLimits(format!(
                    "minimum {} is larger than maximum {}",
                    lo, hi
                )));
            }
        }
        Ok(LimitsValidator::Int(IntLimits {
            minimum,
            maximum,
            step,
        }))
    }

    pub fn float(
        minimum: Option<f64>,
        maximum: Option<f64>,
        step: Option<f64>,
        unit: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        if minimum.is_none() && maximum.is_none() {
            return Err(ConfigurationError::InvalidLimits(
                "float limits must have a minimum or a maximum".to_string(),
            ));
        }
        if let Some(s) = step {
            if !(s > 0.0) || !s.is_finite() {
                return Err(ConfigurationError::InvalidLimits(format!(
                    "step must be strictly positive, got {}",
                    s
                )));
            }
        }
        if let (Some(lo), Some(hi)) = (minimum, maximum) {
            if lo > hi {
                return Err(ConfigurationError::InvalidLimits(format!(
                    "minimum {} is larger than maximum {}",
                    lo, hi
                )));
            }
        }
        Ok(LimitsValidator::Float(FloatLimits {
            minimum,
            maximum,
            step,
            unit: unit.map(str::to_string),
        }))
    }

    pub fn minimum(&self) -> Option<Value> {
        match self {
            LimitsValidator::Int(l) => l.minimum.map(Value::Int),
            LimitsValidator::Float(l) => l.minimum.map(Value::Float),
        }
    }

    pub fn maximum(&self) -> Option<Value> {
        match self {
            LimitsValidator::Int(l) => l.maximum.map(Value::Int),
            LimitsValidator::Float(l) => l.maximum.map(Value::Float),
        }
    }

    pub fn step(&self) -> Option<Value> {
        match self {
            LimitsValidator::Int(l) => l.step.map(Value::Int),
            LimitsValidator::Float(l) => l.step.map(Value::Float),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            LimitsValidator::Int(_) => None,
            LimitsValidator::Float(l) => l.unit.as_deref(),
        }
    }

    /// Validate a value using the installed unit registry for quantities.
    pub fn validate(&self, value: &Value) -> bool {
        let registry = unit_registry();
        self.validate_in(value, None, registry.as_deref())
    }

    /// Validate a value whose plain magnitude is expressed in `unit`.
    ///
    /// Quantities are always converted to the limits unit when both a unit
    /// and a registry are available.
    pub fn validate_in(
        &self,
        value: &Value,
        unit: Option<&str>,
        registry: Option<&dyn UnitRegistry>,
    ) -> bool {
        match self {
            LimitsValidator::Int(limits) => match value.as_i64() {
                Some(v) if !matches!(value, Value::Str(_)) => limits.accepts(v),
                _ => false,
            },
            LimitsValidator::Float(limits) => {
                match limits.magnitude_of(value, unit, registry) {
                    Some(v) => limits.accepts(v),
                    None => false,
                }
            }
        }
    }

    /// Human readable summary of the bounds, used in error messages.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(min) = self.minimum() {
            out.push_str(&format!(" Minimum {}.", min));
        }
        if let Some(max) = self.maximum() {
            out.push_str(&format!(" Maximum {}.", max));
        }
        if let Some(step) = self.step() {
            out.push_str(&format!(" Step {}.", step));
        }
        if let Some(unit) = self.unit() {
            out.push_str(&format!(" Unit {}.", unit));
        }
        out
    }
}

impl IntLimits {
    fn accepts(&self, value: i64) -> bool {
        if let Some(min) = self.minimum {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.maximum {
            if value > max {
                return false;
            }
        }
        let offset = match (self.minimum, self.maximum) {
            (Some(min), _) => i128::from(value) - i128::from(min),
            (None, Some(max)) => i128::from(max) - i128::from(value),
            (None, None) => return true,
        };
        match self.step {
            Some(step) => offset % i128::from(step) == 0,
            None => true,
        }
    }
}

impl FloatLimits {
    fn magnitude_of(
        &self,
        value: &Value,
        unit: Option<&str>,
        registry: Option<&dyn UnitRegistry>,
    ) -> Option<f64> {
        match (value, self.unit.as_deref(), registry) {
            (Value::Quantity(q), Some(target), Some(reg)) => q.to(target, reg).map(|q| q.magnitude),
            (Value::Quantity(q), _, _) => Some(q.magnitude),
            (Value::Int(_) | Value::Float(_), Some(target), Some(reg)) => {
                let magnitude = value.as_f64()?;
                match unit {
                    Some(from) if from != target => reg.factor(from, target).map(|f| magnitude * f),
                    _ => Some(magnitude),
                }
            }
            (Value::Int(_) | Value::Float(_), _, _) => value.as_f64(),
            _ => None,
        }
    }

    fn accepts(&self, value: f64) -> bool {
        if let Some(min) = self.minimum {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.maximum {
            if value > max {
                return false;
            }
        }
        let reference = self.minimum.or(self.maximum);
        match (self.step, reference) {
            (Some(step), Some(reference)) => {
                let ratio = ((value - reference) / step).abs();
                let rounded = (ratio * 1e9).round() / 1e9;
                rounded.fract().abs() < STEP_TOLERANCE
            }
            _ => true,
        }
    }
}
