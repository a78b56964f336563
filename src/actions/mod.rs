// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validated device methods.
//!
//! An [`Action`] wraps a user closure taking positional arguments. Before the
//! closure runs, the arguments go through the same machinery attributes use
//! for writes, in this order:
//!
//! 1. unit conversion of quantities to the argument unit;
//! 2. checks, where `{name}` is an argument or else a host attribute;
//! 3. allowed values;
//! 4. limits, fixed or resolved through `_limits_<id>`.
//!
//! An argument is validated by values or by limits, never both. When a
//! return unit is declared and a unit registry is installed, numeric results
//! come back as quantities.

use crate::attributes::LimitsSpec;
use crate::checks::{CheckEnv, Checker};
use crate::errors::{ConfigurationError, Result, ValidationError};
use crate::host::Host;
use crate::observability::messages::action::ActionInvoked;
use crate::observability::messages::StructuredLog;
use crate::units::{convert, unit_registry, with_unit, UnitRegistry};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[cfg(test)]
mod integration_tests;

/// Body of an action, called with the validated arguments.
pub type ActionMethod = Arc<dyn Fn(&Host, &[Value]) -> Result<Value> + Send + Sync>;

/// Everything an action is declared with, apart from its body.
///
/// # Example
/// ```
/// use the_featureset::actions::ActionDeclaration;
/// use the_featureset::attributes::LimitsSpec;
///
/// let declaration = ActionDeclaration::new(["channel", "level"])
///     .with_checks("{level} > 0")
///     .with_values("channel", [1, 2])
///     .with_limits("level", LimitsSpec::Named("level".into()));
/// assert_eq!(declaration.arguments.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionDeclaration {
    pub arguments: Vec<String>,
    pub checks: Option<String>,
    pub values: BTreeMap<String, Vec<Value>>,
    pub limits: BTreeMap<String, LimitsSpec>,
    pub units: BTreeMap<String, String>,
    pub return_unit: Option<String>,
}

impl ActionDeclaration {
    pub fn new<S: Into<String>>(arguments: impl IntoIterator<Item = S>) -> Self {
        Self {
            arguments: arguments.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_checks(mut self, checks: &str) -> Self {
        self.checks = Some(checks.to_string());
        self
    }

    pub fn with_values<V: Into<Value>>(
        mut self,
        argument: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.values.insert(
            argument.to_string(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_limits(mut self, argument: &str, limits: LimitsSpec) -> Self {
        self.limits.insert(argument.to_string(), limits);
        self
    }

    pub fn with_unit(mut self, argument: &str, unit: &str) -> Self {
        self.units.insert(argument.to_string(), unit.to_string());
        self
    }

    pub fn with_return_unit(mut self, unit: &str) -> Self {
        self.return_unit = Some(unit.to_string());
        self
    }
}

/// A declared, validated device method.
#[derive(Clone)]
pub struct Action {
    name: String,
    declaration: ActionDeclaration,
    checks: Option<Checker>,
    method: ActionMethod,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("declaration", &self.declaration)
            .finish()
    }
}

impl Action {
    pub fn new(
        name: &str,
        declaration: ActionDeclaration,
        method: ActionMethod,
    ) -> Result<Self, ConfigurationError> {
        let validated = declaration
            .values
            .keys()
            .chain(declaration.limits.keys())
            .chain(declaration.units.keys());
        for argument in validated {
            if !declaration.arguments.contains(argument) {
                return Err(ConfigurationError::UnknownArgument {
                    action: name.to_string(),
                    argument: argument.clone(),
                });
            }
        }
        if let Some(argument) = declaration
            .values
            .keys()
            .find(|argument| declaration.limits.contains_key(*argument))
        {
            return Err(ConfigurationError::ConflictingValidation {
                attribute: label(name, argument),
                first: "values",
                second: "limits",
            });
        }

        let checks = match &declaration.checks {
            Some(source) => Some(Checker::parse(source, false)?).filter(|c| !c.is_empty()),
            None => None,
        };

        Ok(Self {
            name: name.to_string(),
            declaration,
            checks,
            method,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaration(&self) -> &ActionDeclaration {
        &self.declaration
    }

    /// Validate the arguments then run the body under the host lock.
    pub fn call(&self, host: &Host, arguments: Vec<Value>) -> Result<Value> {
        let expected = self.declaration.arguments.len();
        if arguments.len() != expected {
            return Err(ValidationError::WrongArity {
                action: self.name.clone(),
                expected,
                found: arguments.len(),
            }
            .into());
        }

        let _guard = host.lock();
        let registry = unit_registry();
        let registry = registry.as_deref();

        let arguments = self
            .declaration
            .arguments
            .iter()
            .zip(arguments)
            .map(|(argument, value)| match self.declaration.units.get(argument) {
                Some(unit) => convert(&label(&self.name, argument), value, unit, registry),
                None => Ok(value),
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(checks) = &self.checks {
            let env = ArgumentsEnv {
                host,
                names: &self.declaration.arguments,
                values: &arguments,
            };
            checks.check(&self.name, &env)?;
        }

        for (argument, value) in self.declaration.arguments.iter().zip(&arguments) {
            self.validate(host, argument, value, registry)?;
        }

        ActionInvoked {
            container: host.class_name(),
            action: &self.name,
            arguments: arguments.len(),
        }
        .log();

        let result = (self.method)(host, &arguments)?;
        let numeric = matches!(result, Value::Int(_) | Value::Float(_));
        Ok(match (&self.declaration.return_unit, result.as_f64()) {
            (Some(unit), Some(magnitude)) if numeric => with_unit(magnitude, Some(unit), registry),
            _ => result,
        })
    }

    fn validate(
        &self,
        host: &Host,
        argument: &str,
        value: &Value,
        registry: Option<&dyn UnitRegistry>,
    ) -> Result<()> {
        if let Some(allowed) = self.declaration.values.get(argument) {
            if !allowed.iter().any(|v| v.loosely_equals(value)) {
                return Err(ValidationError::NotAllowed {
                    attribute: label(&self.name, argument),
                    value: value.clone(),
                    allowed: allowed.clone(),
                }
                .into());
            }
        }

        let limits = match self.declaration.limits.get(argument) {
            None => return Ok(()),
            Some(LimitsSpec::Fixed(limits)) => Arc::new(limits.clone()),
            Some(LimitsSpec::Named(id)) => host.get_limits(id)?,
        };
        let unit = self.declaration.units.get(argument).map(String::as_str);
        if limits.validate_in(value, unit, registry) {
            Ok(())
        } else {
            Err(ValidationError::OutOfLimits {
                attribute: label(&self.name, argument),
                value: value.clone(),
                bounds: limits.describe(),
            }
            .into())
        }
    }
}

fn label(action: &str, argument: &str) -> String {
    format!("{}({})", action, argument)
}

/// Checks environment where arguments shadow host attributes.
struct ArgumentsEnv<'a> {
    host: &'a Host,
    names: &'a [String],
    values: &'a [Value],
}

impl CheckEnv for ArgumentsEnv<'_> {
    fn attribute(&self, name: &str) -> Result<Value> {
        match self.names.iter().position(|n| n == name) {
            Some(index) => Ok(self.values[index].clone()),
            None => self.host.get_attribute(name),
        }
    }

    fn candidate(&self) -> Option<&Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> ActionMethod {
        Arc::new(|_, _| Ok(Value::None))
    }

    #[test]
    fn test_declaration_errors() {
        let cases = vec![
            ActionDeclaration::new(["a"]).with_values("b", [1]),
            ActionDeclaration::new(["a"]).with_unit("c", "V"),
            ActionDeclaration::new(["a"]).with_checks("{a} >"),
            ActionDeclaration::new(["a", "b"])
                .with_values("b", [1, 2, 3])
                .with_limits("b", LimitsSpec::Named("b".into())),
        ];
        for declaration in cases {
            let result = Action::new("test", declaration.clone(), noop());
            assert!(result.is_err(), "{:?}", declaration);
        }
    }

    #[test]
    fn test_overlap_names_the_argument() {
        let declaration = ActionDeclaration::new(["a", "b"])
            .with_values("b", [1, 2, 3])
            .with_limits("b", LimitsSpec::Named("b".into()));
        let err = Action::new("test", declaration, noop()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ConflictingValidation {
                attribute: "test(b)".to_string(),
                first: "values",
                second: "limits",
            }
        );
    }
}
