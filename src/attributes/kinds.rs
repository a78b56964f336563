// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Internal hooks installed according to the attribute kind.
//!
//! Kind specific hooks are installed first, then the hooks shared by every
//! kind (checks, extraction and cache discarding), so checks and extraction
//! always run ahead of validation and conversions.

use super::declaration::{AttributeKind, Declaration, LimitsSpec, MappingTable, RegisterNames};
use super::extract::ExtractPattern;
use super::hooks::{Customization, Hook, Placement};
use super::Attribute;
use crate::checks::{CheckEnv, Checker};
use crate::errors::{ConfigurationError, Result, ValidationError};
use crate::host::{CacheSelector, Host};
use crate::limits::LimitsValidator;
use crate::units::{convert, unit_registry, with_unit, UnitRegistry};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(crate) const CHECKS: &str = "checks";
pub(crate) const EXTRACT: &str = "extract";
pub(crate) const DISCARD: &str = "discard";
pub(crate) const VALIDATE: &str = "validate";
pub(crate) const MAP: &str = "map";
pub(crate) const REVERSE_MAP: &str = "reverse_map";
pub(crate) const BYTE_TO_DICT: &str = "byte_to_dict";
pub(crate) const DICT_TO_BYTE: &str = "dict_to_byte";
pub(crate) const CAST: &str = "cast";
pub(crate) const CONVERT: &str = "convert";

pub(crate) fn install(attribute: &mut Attribute) -> Result<(), ConfigurationError> {
    let declaration = attribute.declaration().clone();

    match declaration.kind {
        AttributeKind::Feature => {}
        AttributeKind::Enumerable => install_values(attribute, &declaration.values)?,
        AttributeKind::LimitsValidated => install_limits(attribute, &declaration, None)?,
        AttributeKind::Mapping => install_mapping(attribute, mapping_or_empty(&declaration))?,
        AttributeKind::Bool => install_bool(attribute, &declaration)?,
        AttributeKind::Register => install_register(attribute, &declaration)?,
        AttributeKind::Str | AttributeKind::Int | AttributeKind::Float => {
            install_scalar(attribute, &declaration)?
        }
    }

    install_common(attribute, &declaration)
}

fn compose(
    attribute: &mut Attribute,
    hook: Hook,
    placement: Placement,
) -> Result<(), ConfigurationError> {
    attribute.modify_behavior(Customization::Compose { hook, placement }, true)
}

fn append(attribute: &mut Attribute, id: &str, hook: Hook) -> Result<(), ConfigurationError> {
    compose(attribute, hook, Placement::Append(id.to_string()))
}

fn prepend(attribute: &mut Attribute, id: &str, hook: Hook) -> Result<(), ConfigurationError> {
    compose(attribute, hook, Placement::Prepend(id.to_string()))
}

/// Checks environment backed by a live host.
struct HostEnv<'a> {
    host: &'a Host,
    candidate: Option<&'a Value>,
}

impl CheckEnv for HostEnv<'_> {
    fn attribute(&self, name: &str) -> Result<Value> {
        self.host.get_attribute(name)
    }

    fn candidate(&self) -> Option<&Value> {
        self.candidate
    }
}

fn install_common(
    attribute: &mut Attribute,
    declaration: &Declaration,
) -> Result<(), ConfigurationError> {
    if let Some(source) = &declaration.read_checks {
        let checker = Checker::parse(source, false)?;
        if !checker.is_empty() {
            prepend(
                attribute,
                CHECKS,
                Hook::pre_read(move |host, attr| {
                    checker.check(attr.name(), &HostEnv { host, candidate: None })
                }),
            )?;
        }
    }

    if let Some(source) = &declaration.write_checks {
        let checker = Checker::parse(source, true)?;
        if !checker.is_empty() {
            prepend(
                attribute,
                CHECKS,
                Hook::pre_write(move |host, attr, value| {
                    checker.check(
                        attr.name(),
                        &HostEnv {
                            host,
                            candidate: Some(&value),
                        },
                    )?;
                    Ok(value)
                }),
            )?;
        }
    }

    if let Some(pattern) = &declaration.extract {
        let pattern = ExtractPattern::parse(pattern)?;
        prepend(
            attribute,
            EXTRACT,
            Hook::post_read(move |_, attr, value| Ok(pattern.extract(attr.name(), &value)?)),
        )?;
    }

    if !declaration.discard.is_empty() || !declaration.discard_limits.is_empty() {
        let attributes = declaration.discard.clone();
        let limits = declaration.discard_limits.clone();
        append(
            attribute,
            DISCARD,
            Hook::post_write(move |host, _, _, _, _| {
                if !attributes.is_empty() {
                    host.clear_cache(&CacheSelector::attributes(attributes.iter().cloned()))?;
                }
                host.discard_limits(&limits);
                Ok(())
            }),
        )?;
    }

    Ok(())
}

fn install_values(attribute: &mut Attribute, values: &[Value]) -> Result<(), ConfigurationError> {
    if values.is_empty() {
        return Ok(());
    }
    let allowed = values.to_vec();
    append(
        attribute,
        VALIDATE,
        Hook::pre_write(move |_, attr, value| {
            if allowed.iter().any(|v| v.loosely_equals(&value)) {
                Ok(value)
            } else {
                Err(ValidationError::NotAllowed {
                    attribute: attr.name().to_string(),
                    value,
                    allowed: allowed.clone(),
                }
                .into())
            }
        }),
    )
}

fn check_limits(
    attribute: &str,
    limits: &LimitsValidator,
    value: Value,
    unit: Option<&str>,
) -> Result<Value> {
    let registry = unit_registry();
    if limits.validate_in(&value, unit, registry.as_deref()) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfLimits {
            attribute: attribute.to_string(),
            value,
            bounds: limits.describe(),
        }
        .into())
    }
}

fn install_limits(
    attribute: &mut Attribute,
    declaration: &Declaration,
    unit: Option<String>,
) -> Result<(), ConfigurationError> {
    let hook = match &declaration.limits {
        None => return Ok(()),
        Some(LimitsSpec::Fixed(limits)) => {
            let limits = limits.clone();
            Hook::pre_write(move |_, attr, value| {
                check_limits(attr.name(), &limits, value, unit.as_deref())
            })
        }
        Some(LimitsSpec::Named(id)) => {
            let id = id.clone();
            Hook::pre_write(move |host, attr, value| {
                let limits = host.get_limits(&id)?;
                check_limits(attr.name(), &limits, value, unit.as_deref())
            })
        }
    };
    append(attribute, VALIDATE, hook)
}

fn mapping_or_empty(declaration: &Declaration) -> MappingTable {
    declaration
        .mapping
        .clone()
        .unwrap_or_else(|| MappingTable::Symmetric(Vec::new()))
}

fn install_mapping(
    attribute: &mut Attribute,
    table: MappingTable,
) -> Result<(), ConfigurationError> {
    let table = Arc::new(table);

    let reverse = Arc::clone(&table);
    append(
        attribute,
        REVERSE_MAP,
        Hook::post_read(move |_, attr, value| match reverse.from_device(&value) {
            Some(user) => Ok(user.clone()),
            None => Err(ValidationError::NoMapping {
                attribute: attr.name().to_string(),
                direction: "device to user",
                value,
            }
            .into()),
        }),
    )?;

    append(
        attribute,
        MAP,
        Hook::pre_write(move |_, attr, value| match table.to_device(&value) {
            Some(device) => Ok(device.clone()),
            None => Err(ValidationError::NoMapping {
                attribute: attr.name().to_string(),
                direction: "user to device",
                value,
            }
            .into()),
        }),
    )
}

fn install_bool(
    attribute: &mut Attribute,
    declaration: &Declaration,
) -> Result<(), ConfigurationError> {
    let aliases: Arc<BTreeMap<bool, Vec<Value>>> = Arc::new(declaration.aliases.clone());
    let table = declaration.mapping.clone().map(Arc::new);

    let reverse = table.clone();
    append(
        attribute,
        REVERSE_MAP,
        Hook::post_read(move |_, attr, value| {
            let user = match &reverse {
                Some(table) => table.from_device(&value).cloned(),
                None => value.to_flag().map(Value::Bool),
            };
            user.ok_or_else(|| {
                ValidationError::NoMapping {
                    attribute: attr.name().to_string(),
                    direction: "device to user",
                    value,
                }
                .into()
            })
        }),
    )?;

    append(
        attribute,
        MAP,
        Hook::pre_write(move |_, attr, value| {
            let flag = match &value {
                Value::Bool(flag) => Some(*flag),
                other => aliases
                    .iter()
                    .find(|(_, accepted)| accepted.iter().any(|a| a.loosely_equals(other)))
                    .map(|(flag, _)| *flag),
            };
            let flag = flag.ok_or_else(|| ValidationError::InvalidType {
                attribute: attr.name().to_string(),
                expected: "a boolean or one of its aliases",
                value: value.clone(),
            })?;
            match &table {
                Some(table) => table.to_device(&Value::Bool(flag)).cloned().ok_or_else(|| {
                    ValidationError::NoMapping {
                        attribute: attr.name().to_string(),
                        direction: "user to device",
                        value: Value::Bool(flag),
                    }
                    .into()
                }),
                None => Ok(Value::Bool(flag)),
            }
        }),
    )
}

fn install_register(
    attribute: &mut Attribute,
    declaration: &Declaration,
) -> Result<(), ConfigurationError> {
    let names = declaration
        .names
        .clone()
        .unwrap_or_else(|| RegisterNames::Sequence(Vec::new()));
    let keys = Arc::new(names.resolve(attribute.name())?);

    let bits = Arc::clone(&keys);
    prepend(
        attribute,
        BYTE_TO_DICT,
        Hook::post_read(move |_, attr, value| {
            let raw = value.as_i64().ok_or_else(|| ValidationError::InvalidType {
                attribute: attr.name().to_string(),
                expected: "an integer register value",
                value: value.clone(),
            })? as u64;
            let flags = bits
                .iter()
                .enumerate()
                .map(|(i, key)| (key.clone(), Value::Bool(raw >> i & 1 == 1)))
                .collect::<BTreeMap<_, _>>();
            Ok(Value::Map(flags))
        }),
    )?;

    append(
        attribute,
        DICT_TO_BYTE,
        Hook::pre_write(move |_, attr, value| {
            let invalid = |value: Value| ValidationError::InvalidType {
                attribute: attr.name().to_string(),
                expected: "a map of register bits",
                value,
            };
            let flags = match &value {
                Value::Map(flags) => flags,
                Value::Int(_) => return Ok(value),
                _ => return Err(invalid(value).into()),
            };
            let mut byte: u64 = 0;
            for (key, set) in flags {
                let index = keys
                    .iter()
                    .position(|k| k == key)
                    .ok_or_else(|| invalid(Value::Str(key.clone())))?;
                if set.truthy() {
                    byte |= 1 << index;
                }
            }
            Ok(Value::Int(byte as i64))
        }),
    )
}

fn install_scalar(
    attribute: &mut Attribute,
    declaration: &Declaration,
) -> Result<(), ConfigurationError> {
    let unit = declaration.unit.clone();

    if declaration.mapping.is_some() {
        install_mapping(attribute, mapping_or_empty(declaration))?;
    } else if !declaration.values.is_empty() {
        install_values(attribute, &declaration.values)?;
    } else {
        install_limits(attribute, declaration, unit.clone())?;
    }

    let kind = declaration.kind;
    let cast_unit = unit.clone();
    append(
        attribute,
        CAST,
        Hook::post_read(move |_, attr, value| {
            let registry = unit_registry();
            cast(kind, attr.name(), value, cast_unit.as_deref(), registry.as_deref())
        }),
    )?;

    if let Some(unit) = unit {
        let hook = Hook::pre_write(move |_, attr, value| {
            let registry = unit_registry();
            convert(attr.name(), value, &unit, registry.as_deref())
        });
        let validating = !declaration.values.is_empty() || declaration.limits.is_some();
        let placement = if validating {
            Placement::AddBefore {
                anchor: VALIDATE.to_string(),
                id: CONVERT.to_string(),
            }
        } else {
            Placement::Prepend(CONVERT.to_string())
        };
        compose(attribute, hook, placement)?;
    }

    Ok(())
}

fn cast(
    kind: AttributeKind,
    attribute: &str,
    value: Value,
    unit: Option<&str>,
    registry: Option<&dyn UnitRegistry>,
) -> Result<Value> {
    let invalid = |expected: &'static str, value: Value| ValidationError::InvalidType {
        attribute: attribute.to_string(),
        expected,
        value,
    };
    match kind {
        AttributeKind::Str => Ok(match value {
            Value::Str(_) => value,
            other => Value::Str(other.to_string()),
        }),
        AttributeKind::Int => match value.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => Err(invalid("an integer", value).into()),
        },
        _ => {
            let magnitude = match value.as_f64() {
                Some(m) => m,
                None => return Err(invalid("a number", value).into()),
            };
            Ok(with_unit(magnitude, unit, registry))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::hooks::Stage;
    use crate::units::ScaledUnitRegistry;
    use crate::value::Quantity;

    fn build(declaration: Declaration) -> Attribute {
        Attribute::new("attr", declaration).unwrap()
    }

    #[test]
    fn test_internal_hook_layout() {
        let cases: Vec<(Declaration, Stage, Vec<&str>)> = vec![
            (
                Declaration::enumerable([1, 2]).with_write_checks("value > 0"),
                Stage::PreWrite,
                vec![CHECKS, VALIDATE],
            ),
            (
                Declaration::int().with_extract("V{:d}"),
                Stage::PostRead,
                vec![EXTRACT, CAST],
            ),
            (
                Declaration::mapping(MappingTable::Symmetric(vec![])),
                Stage::PreWrite,
                vec![MAP],
            ),
            (
                Declaration::register(RegisterNames::Sequence(vec![None; 8])).with_extract("{:d}"),
                Stage::PostRead,
                vec![EXTRACT, BYTE_TO_DICT],
            ),
            (
                Declaration::feature().with_discard(["other"]),
                Stage::PostWrite,
                vec!["confirm", DISCARD],
            ),
            (
                Declaration::float().with_unit("V").with_limits(LimitsSpec::Fixed(
                    LimitsValidator::float(Some(0.0), Some(5.0), None, Some("V")).unwrap(),
                )),
                Stage::PreWrite,
                vec![CONVERT, VALIDATE],
            ),
            (
                Declaration::float().with_unit("V").with_read_checks("{other} == 1"),
                Stage::PreWrite,
                vec![CONVERT],
            ),
        ];
        for (declaration, stage, expected) in cases {
            let attribute = build(declaration);
            assert_eq!(attribute.stage_hooks(stage), expected, "{:?}", attribute);
            assert!(attribute.customizations().is_empty());
        }
    }

    #[test]
    fn test_checks_are_parsed_at_declaration() {
        let err = Attribute::new("attr", Declaration::feature().with_read_checks("value > 1"));
        assert!(matches!(err, Err(ConfigurationError::InvalidCheck { .. })));
    }

    #[test]
    fn test_cast_conversions() {
        let cases = vec![
            (AttributeKind::Int, Value::from("12"), Value::Int(12)),
            (AttributeKind::Str, Value::Int(3), Value::from("3")),
            (AttributeKind::Float, Value::from("2.5"), Value::Float(2.5)),
        ];
        for (kind, raw, expected) in cases {
            assert_eq!(cast(kind, "a", raw, None, None).unwrap(), expected);
        }
        assert!(cast(AttributeKind::Int, "a", Value::from("x"), None, None).is_err());
    }

    #[test]
    fn test_units_with_registry() {
        let registry = ScaledUnitRegistry::new().with_si_unit("V", "voltage");
        let read = cast(AttributeKind::Float, "a", Value::from("1.5"), Some("V"), Some(&registry));
        assert_eq!(read.unwrap(), Value::Quantity(Quantity::new(1.5, "V")));

        let millivolts = Value::Quantity(Quantity::new(1500.0, "mV"));
        let converted = convert("a", millivolts, "V", Some(&registry)).unwrap();
        assert_eq!(converted, Value::Float(1.5));
        let amps = Value::Quantity(Quantity::new(1.0, "A"));
        assert!(convert("a", amps, "V", Some(&registry)).is_err());
        let plain = convert("a", Value::Float(2.0), "V", Some(&registry)).unwrap();
        assert_eq!(plain, Value::Float(2.0));
    }

    #[test]
    fn test_units_without_registry() {
        let read = cast(AttributeKind::Float, "a", Value::from("1.5"), Some("V"), None);
        assert_eq!(read.unwrap(), Value::Float(1.5));

        let millivolts = Value::Quantity(Quantity::new(1500.0, "mV"));
        let written = convert("a", millivolts, "V", None).unwrap();
        assert_eq!(written, Value::Float(1500.0));
    }
}
