// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The complete set of options an attribute is declared with.
//!
//! A [`Declaration`] is kept verbatim on the attribute so that a subclass can
//! alter a few options and rebuild an equivalent attribute from it.

use crate::errors::ConfigurationError;
use crate::limits::LimitsValidator;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Specialization of an attribute, deciding which internal hooks are installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeKind {
    #[default]
    Feature,
    Enumerable,
    LimitsValidated,
    Mapping,
    Bool,
    Register,
    Str,
    Int,
    Float,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Feature => "feature",
            AttributeKind::Enumerable => "enumerable",
            AttributeKind::LimitsValidated => "limits_validated",
            AttributeKind::Mapping => "mapping",
            AttributeKind::Bool => "bool",
            AttributeKind::Register => "register",
            AttributeKind::Str => "str",
            AttributeKind::Int => "int",
            AttributeKind::Float => "float",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits of a validated attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum LimitsSpec {
    /// Always the same validator.
    Fixed(LimitsValidator),
    /// Resolved at write time through the host limits accessor of that id.
    Named(String),
}

/// Correspondence between user values and device values.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingTable {
    /// `(user, device)` pairs used in both directions.
    Symmetric(Vec<(Value, Value)>),
    /// The device expects one form and answers with another.
    Asymmetric {
        to_device: Vec<(Value, Value)>,
        from_device: Vec<(Value, Value)>,
    },
}

impl MappingTable {
    /// Device value for a user value.
    pub fn to_device(&self, user: &Value) -> Option<&Value> {
        let pairs = match self {
            MappingTable::Symmetric(pairs) => pairs,
            MappingTable::Asymmetric { to_device, .. } => to_device,
        };
        pairs
            .iter()
            .find(|(u, _)| u.loosely_equals(user))
            .map(|(_, d)| d)
    }

    /// User value for a device answer.
    pub fn from_device(&self, device: &Value) -> Option<&Value> {
        match self {
            MappingTable::Symmetric(pairs) => pairs
                .iter()
                .find(|(_, d)| d.loosely_equals(device))
                .map(|(u, _)| u),
            MappingTable::Asymmetric { from_device, .. } => from_device
                .iter()
                .find(|(d, _)| d.loosely_equals(device))
                .map(|(_, u)| u),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MappingTable::Symmetric(pairs) => pairs.is_empty(),
            MappingTable::Asymmetric {
                to_device,
                from_device,
            } => to_device.is_empty() && from_device.is_empty(),
        }
    }
}

/// Names of the bits of a register.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterNames {
    /// One entry per bit, `None` for unused bits. The length is the register width.
    Sequence(Vec<Option<String>>),
    /// Name to bit index. The register is 8 bits wide unless an index needs more.
    Indexed(BTreeMap<String, u32>),
}

impl RegisterNames {
    /// Resolve to one key per bit; unnamed bits are keyed by their index.
    pub(crate) fn resolve(&self, attribute: &str) -> Result<Vec<String>, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidRegister {
            attribute: attribute.to_string(),
            reason,
        };
        match self {
            RegisterNames::Sequence(names) => {
                if ![8, 16, 32, 64].contains(&names.len()) {
                    return Err(invalid(format!(
                        "expected 8, 16, 32 or 64 names, got {}",
                        names.len()
                    )));
                }
                let keys: Vec<String> = names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| n.clone().unwrap_or_else(|| i.to_string()))
                    .collect();
                ensure_unique(&keys).map_err(invalid)?;
                Ok(keys)
            }
            RegisterNames::Indexed(map) => {
                let highest = map.values().copied().max().unwrap_or(0);
                let width = [8u32, 16, 32, 64]
                    .into_iter()
                    .find(|w| highest < *w)
                    .ok_or_else(|| invalid(format!("bit index {} out of range", highest)))?;
                let mut keys: Vec<String> = (0..width).map(|i| i.to_string()).collect();
                let mut seen = vec![false; width as usize];
                for (name, index) in map {
                    if seen[*index as usize] {
                        return Err(invalid(format!("bit {} is named twice", index)));
                    }
                    seen[*index as usize] = true;
                    keys[*index as usize] = name.clone();
                }
                ensure_unique(&keys).map_err(invalid)?;
                Ok(keys)
            }
        }
    }
}

fn ensure_unique(keys: &[String]) -> Result<(), String> {
    for (i, key) in keys.iter().enumerate() {
        if keys[..i].contains(key) {
            return Err(format!("'{}' names several bits", key));
        }
    }
    Ok(())
}

/// Every option an attribute was declared with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Declaration {
    pub kind: AttributeKind,
    /// Opaque read token handed to the collaborator; `None` means not readable.
    pub getter: Option<Value>,
    /// Opaque write token handed to the collaborator; `None` means not writable.
    pub setter: Option<Value>,
    pub retries: u32,
    pub read_checks: Option<String>,
    pub write_checks: Option<String>,
    /// Attributes whose cache is discarded after a write (dotted names allowed).
    pub discard: Vec<String>,
    /// Limits ids discarded after a write.
    pub discard_limits: Vec<String>,
    pub extract: Option<String>,
    pub doc: Option<String>,
    pub values: Vec<Value>,
    pub limits: Option<LimitsSpec>,
    pub mapping: Option<MappingTable>,
    /// Accepted user aliases for `true` and `false`.
    pub aliases: BTreeMap<bool, Vec<Value>>,
    pub names: Option<RegisterNames>,
    pub unit: Option<String>,
}

impl Declaration {
    pub fn of_kind(kind: AttributeKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn feature() -> Self {
        Self::of_kind(AttributeKind::Feature)
    }

    pub fn enumerable<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::of_kind(AttributeKind::Enumerable).with_values(values)
    }

    pub fn limits_validated(limits: LimitsSpec) -> Self {
        Self::of_kind(AttributeKind::LimitsValidated).with_limits(limits)
    }

    pub fn mapping(table: MappingTable) -> Self {
        Self::of_kind(AttributeKind::Mapping).with_mapping(table)
    }

    pub fn boolean() -> Self {
        Self::of_kind(AttributeKind::Bool)
    }

    pub fn register(names: RegisterNames) -> Self {
        Self {
            names: Some(names),
            ..Self::of_kind(AttributeKind::Register)
        }
    }

    pub fn string() -> Self {
        Self::of_kind(AttributeKind::Str)
    }

    pub fn int() -> Self {
        Self::of_kind(AttributeKind::Int)
    }

    pub fn float() -> Self {
        Self::of_kind(AttributeKind::Float)
    }

    pub fn with_getter(mut self, token: impl Into<Value>) -> Self {
        self.getter = Some(token.into());
        self
    }

    pub fn with_setter(mut self, token: impl Into<Value>) -> Self {
        self.setter = Some(token.into());
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Same assertions before reading and writing.
    pub fn with_checks(mut self, checks: &str) -> Self {
        self.read_checks = Some(checks.to_string());
        self.write_checks = Some(checks.to_string());
        self
    }

    pub fn with_read_checks(mut self, checks: &str) -> Self {
        self.read_checks = Some(checks.to_string());
        self
    }

    pub fn with_write_checks(mut self, checks: &str) -> Self {
        self.write_checks = Some(checks.to_string());
        self
    }

    pub fn with_discard<S: Into<String>>(
        mut self,
        attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.discard = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_discard_limits<S: Into<String>>(
        mut self,
        ids: impl IntoIterator<Item = S>,
    ) -> Self {
        self.discard_limits = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extract(mut self, pattern: &str) -> Self {
        self.extract = Some(pattern.to_string());
        self
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn with_values<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limits(mut self, limits: LimitsSpec) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_mapping(mut self, table: MappingTable) -> Self {
        self.mapping = Some(table);
        self
    }

    pub fn with_alias<V: Into<Value>>(
        mut self,
        flag: bool,
        aliases: impl IntoIterator<Item = V>,
    ) -> Self {
        self.aliases
            .entry(flag)
            .or_default()
            .extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Reject options the kind does not use and conflicting validations.
    pub(crate) fn validate(&self, attribute: &str) -> Result<(), ConfigurationError> {
        use AttributeKind::*;

        let unsupported = |option: &'static str| ConfigurationError::UnsupportedOption {
            attribute: attribute.to_string(),
            kind: self.kind.to_string(),
            option,
        };
        let has_values = !self.values.is_empty();
        let has_mapping = self.mapping.is_some();
        let has_limits = self.limits.is_some();

        let accepts_values = matches!(self.kind, Enumerable | Str | Int | Float);
        let accepts_limits = matches!(self.kind, LimitsValidated | Int | Float);
        let accepts_mapping = matches!(self.kind, Mapping | Bool | Str | Int | Float);

        if has_values && !accepts_values {
            return Err(unsupported("values"));
        }
        if has_limits && !accepts_limits {
            return Err(unsupported("limits"));
        }
        if has_mapping && !accepts_mapping {
            return Err(unsupported("mapping"));
        }
        if !self.aliases.is_empty() && self.kind != Bool {
            return Err(unsupported("aliases"));
        }
        if self.names.is_some() && self.kind != Register {
            return Err(unsupported("names"));
        }
        if self.unit.is_some() && self.kind != Float {
            return Err(unsupported("unit"));
        }
        if self.kind == Register && self.names.is_none() {
            return Err(ConfigurationError::InvalidRegister {
                attribute: attribute.to_string(),
                reason: "no bit names declared".to_string(),
            });
        }

        let conflict = |first, second| ConfigurationError::ConflictingValidation {
            attribute: attribute.to_string(),
            first,
            second,
        };
        if has_values && has_limits {
            return Err(conflict("values", "limits"));
        }
        if has_mapping && has_values {
            return Err(conflict("mapping", "values"));
        }
        if has_mapping && has_limits {
            return Err(conflict("mapping", "limits"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_sequence_names() {
        let mut names = vec![None; 8];
        names[1] = Some("ready".to_string());
        names[2] = Some("busy".to_string());
        let keys = RegisterNames::Sequence(names).resolve("status").unwrap();
        assert_eq!(keys[0], "0");
        assert_eq!(keys[1], "ready");
        assert_eq!(keys[2], "busy");
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn test_register_widths() {
        for width in [8usize, 16, 32, 64] {
            assert!(RegisterNames::Sequence(vec![None; width]).resolve("r").is_ok());
        }
        for width in [0usize, 7, 9, 12] {
            assert!(RegisterNames::Sequence(vec![None; width]).resolve("r").is_err());
        }
    }

    #[test]
    fn test_register_indexed_names() {
        let mut map = BTreeMap::new();
        map.insert("overflow".to_string(), 9);
        let keys = RegisterNames::Indexed(map).resolve("r").unwrap();
        assert_eq!(keys.len(), 16);
        assert_eq!(keys[9], "overflow");

        let mut clash = BTreeMap::new();
        clash.insert("3".to_string(), 4);
        assert!(RegisterNames::Indexed(clash).resolve("r").is_err());
    }

    #[test]
    fn test_mapping_directions() {
        let symmetric = MappingTable::Symmetric(vec![(Value::from("on"), Value::Int(1))]);
        assert_eq!(symmetric.to_device(&Value::from("on")), Some(&Value::Int(1)));
        assert_eq!(symmetric.from_device(&Value::Float(1.0)), Some(&Value::from("on")));

        let asymmetric = MappingTable::Asymmetric {
            to_device: vec![(Value::Bool(true), Value::from("CMD ON"))],
            from_device: vec![(Value::Int(1), Value::Bool(true))],
        };
        assert_eq!(asymmetric.to_device(&Value::Bool(true)), Some(&Value::from("CMD ON")));
        assert_eq!(asymmetric.from_device(&Value::Int(1)), Some(&Value::Bool(true)));
        assert_eq!(asymmetric.from_device(&Value::from("CMD ON")), None);
    }

    #[test]
    fn test_conflicting_validation() {
        let limits = LimitsSpec::Named("range".into());
        let cases = vec![
            Declaration::int().with_values([1, 2]).with_limits(limits.clone()),
            Declaration::float()
                .with_mapping(MappingTable::Symmetric(vec![]))
                .with_limits(limits),
            Declaration::string()
                .with_mapping(MappingTable::Symmetric(vec![]))
                .with_values(["a"]),
        ];
        for declaration in cases {
            assert!(matches!(
                declaration.validate("x"),
                Err(ConfigurationError::ConflictingValidation { .. })
            ));
        }
    }

    #[test]
    fn test_unsupported_options() {
        let cases = vec![
            (Declaration::feature().with_values([1]), "values"),
            (Declaration::int().with_unit("V"), "unit"),
            (Declaration::string().with_alias(true, ["yes"]), "aliases"),
            (
                Declaration::enumerable([1]).with_limits(LimitsSpec::Named("r".into())),
                "limits",
            ),
        ];
        for (declaration, expected) in cases {
            match declaration.validate("x") {
                Err(ConfigurationError::UnsupportedOption { option, .. }) => {
                    assert_eq!(option, expected)
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }
}
