// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Actions called on live hosts.

use super::ActionDeclaration;
use crate::assembly::{ClassBuilder, HostClass};
use crate::attributes::{Declaration, LimitsSpec};
use crate::backends::MemoryDriver;
use crate::config::HostOptions;
use crate::errors::{ConfigurationError, Error, Result, ValidationError};
use crate::host::Host;
use crate::limits::LimitsValidator;
use crate::value::{Quantity, Value};
use std::sync::Arc;

fn product(_: &Host, arguments: &[Value]) -> Result<Value> {
    match (arguments[0].as_i64(), arguments[1].as_i64()) {
        (Some(a), Some(b)) => Ok(Value::Int(a * b)),
        _ => {
            let a = arguments[0].as_f64().unwrap_or_default();
            let b = arguments[1].as_f64().unwrap_or_default();
            Ok(Value::Float(a * b))
        }
    }
}

fn first(_: &Host, arguments: &[Value]) -> Result<Value> {
    Ok(arguments[0].clone())
}

fn host_of(class: Arc<HostClass>) -> Arc<Host> {
    let driver = MemoryDriver::new().with_value("REM", true).with_value("MAXB", 10);
    Host::new(class, Arc::new(driver), HostOptions::default())
}

fn one_action(declaration: ActionDeclaration) -> Arc<Host> {
    host_of(
        ClassBuilder::new("Device")
            .action("test", declaration, product)
            .build()
            .unwrap(),
    )
}

fn call(host: &Host, a: impl Into<Value>, b: impl Into<Value>) -> Result<Value> {
    host.call_action("test", vec![a.into(), b.into()])
}

#[test]
fn test_plain_action() {
    let host = one_action(ActionDeclaration::new(["a", "b"]));
    assert_eq!(call(&host, 2, 3).unwrap(), Value::Int(6));
    assert!(matches!(
        host.call_action("test", vec![Value::Int(1)]),
        Err(Error::Validation(ValidationError::WrongArity { expected: 2, found: 1, .. }))
    ));
    assert!(matches!(
        host.call_action("missing", vec![]),
        Err(Error::UnknownAction { .. })
    ));
}

#[test]
fn test_values_validation() {
    let host = one_action(ActionDeclaration::new(["a", "b"]).with_values("a", [1, 2, 3]));
    assert_eq!(call(&host, 1, 5).unwrap(), Value::Int(5));
    match call(&host, 5, 2) {
        Err(Error::Validation(ValidationError::NotAllowed { attribute, .. })) => {
            assert_eq!(attribute, "test(a)")
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_limits_validation() {
    let cases = vec![
        (
            LimitsSpec::Fixed(LimitsValidator::int(Some(1), Some(10), Some(2)).unwrap()),
            Value::Int(1),
            Value::Int(2),
        ),
        (
            LimitsSpec::Fixed(
                LimitsValidator::float(Some(1.0), Some(10.0), Some(0.1), None).unwrap(),
            ),
            Value::Int(1),
            Value::Float(1.05),
        ),
        (LimitsSpec::Named("b".into()), Value::Int(3), Value::Int(4)),
    ];
    for (limits, accepted, rejected) in cases {
        let class = ClassBuilder::new("Device")
            .limits("b", |_| Ok(LimitsValidator::int(Some(1), Some(10), Some(2))?))
            .action(
                "test",
                ActionDeclaration::new(["a", "b"]).with_limits("b", limits.clone()),
                first,
            )
            .build()
            .unwrap();
        let host = host_of(class);
        let result = call(&host, 7, accepted.clone());
        assert_eq!(result.unwrap(), Value::Int(7), "{:?}", limits);
        assert!(
            matches!(
                call(&host, 7, rejected.clone()),
                Err(Error::Validation(ValidationError::OutOfLimits { .. }))
            ),
            "{:?} should reject {}",
            limits,
            rejected
        );
    }
}

#[test]
fn test_named_limits_read_the_host() {
    let class = ClassBuilder::new("Device")
        .attribute("max_b", Declaration::int().with_getter("MAXB?"))
        .limits("b", |host| {
            let maximum = host.get_attribute("max_b")?.as_i64();
            Ok(LimitsValidator::int(Some(0), maximum, None)?)
        })
        .action(
            "test",
            ActionDeclaration::new(["a", "b"]).with_limits("b", LimitsSpec::Named("b".into())),
            first,
        )
        .build()
        .unwrap();
    let host = host_of(class);
    assert!(call(&host, 1, 10).is_ok());
    assert!(call(&host, 1, 11).is_err());
}

#[test]
fn test_values_and_limits_on_one_argument() {
    let result = ClassBuilder::new("Device")
        .action(
            "test",
            ActionDeclaration::new(["a", "b"])
                .with_limits("b", LimitsSpec::Named("b".into()))
                .with_values("b", [1, 2, 3]),
            first,
        )
        .build();
    assert!(matches!(
        result,
        Err(ConfigurationError::ConflictingValidation { .. })
    ));
}

#[test]
fn test_checks_on_arguments_and_attributes() {
    let host = one_action(ActionDeclaration::new(["r", "i"]).with_checks("{r} > {i}; {i} > 0"));
    assert_eq!(call(&host, 3, 2).unwrap(), Value::Int(6));
    for (r, i) in [(2, 2), (3, -1)] {
        assert!(
            matches!(
                call(&host, r, i),
                Err(Error::Validation(ValidationError::CheckFailed { .. }))
            ),
            "r={} i={}",
            r,
            i
        );
    }

    let class = ClassBuilder::new("Device")
        .attribute("remote", Declaration::boolean().with_getter("REM?"))
        .action(
            "test",
            ActionDeclaration::new(["a", "b"]).with_checks("{remote} and {a} != {b}"),
            product,
        )
        .build()
        .unwrap();
    let host = host_of(class);
    assert!(call(&host, 1, 2).is_ok());
    assert!(call(&host, 2, 2).is_err());
}

#[test]
fn test_units_are_converted_first() {
    crate::units::install_test_registry();
    let amps = LimitsValidator::float(Some(0.0), Some(1.0), None, Some("A")).unwrap();
    let host = one_action(
        ActionDeclaration::new(["r", "i"])
            .with_unit("i", "A")
            .with_limits("i", LimitsSpec::Fixed(amps))
            .with_return_unit("V"),
    );

    let result = call(&host, 2, Quantity::new(500.0, "mA")).unwrap();
    assert_eq!(result, Value::Quantity(Quantity::new(1.0, "V")));
    assert_eq!(
        call(&host, 2, 0.25).unwrap(),
        Value::Quantity(Quantity::new(0.5, "V"))
    );
    assert!(matches!(
        call(&host, 2, Quantity::new(2.0, "V")),
        Err(Error::Validation(ValidationError::UnitMismatch { .. }))
    ));
    assert!(matches!(
        call(&host, 2, Quantity::new(1500.0, "mA")),
        Err(Error::Validation(ValidationError::OutOfLimits { .. }))
    ));
}

#[test]
fn test_actions_are_inherited_and_routed() {
    let base = ClassBuilder::new("Base")
        .action("test", ActionDeclaration::new(["a", "b"]), product)
        .subsystem(
            "output",
            ClassBuilder::anonymous().action(
                "reset",
                ActionDeclaration::new(Vec::<String>::new()),
                |host, _| Ok(Value::Bool(host.is_locked())),
            ),
        )
        .build()
        .unwrap();
    let derived = ClassBuilder::new("Derived").base(base).build().unwrap();
    assert_eq!(derived.action_names().collect::<Vec<_>>(), vec!["test"]);

    let host = host_of(derived);
    assert_eq!(call(&host, 4, 5).unwrap(), Value::Int(20));
    assert_eq!(host.call_action("output.reset", vec![]).unwrap(), Value::Bool(true));
    let output = host.subsystem("output").unwrap();
    let parent = output.call_action(".test", vec![1.into(), 1.into()]);
    assert_eq!(parent.unwrap(), Value::Int(1));
}
