// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scenario tests running attributes against live hosts.

use crate::assembly::{ClassBuilder, HostClass};
use crate::attributes::{
    Customization, Declaration, Hook, LimitsSpec, MappingTable, Placement, RegisterNames, Stage,
    CONFIRM_ID,
};
use crate::backends::stub::{FailingDriver, RefusingDriver};
use crate::backends::MemoryDriver;
use crate::config::HostOptions;
use crate::errors::{Error, ValidationError};
use crate::host::Host;
use crate::limits::LimitsValidator;
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn single(name: &str, declaration: Declaration) -> Arc<HostClass> {
    ClassBuilder::new("Device")
        .attribute(name, declaration)
        .build()
        .unwrap()
}

fn memory_host(class: Arc<HostClass>, driver: &Arc<MemoryDriver>) -> Arc<Host> {
    Host::new(class, driver.clone(), HostOptions::default())
}

#[test]
fn test_read_retries_then_fails() {
    let cases = vec![(0, 1, 0), (1, 2, 1), (3, 4, 3)];
    for (retries, calls, reconnects) in cases {
        let class = single(
            "level",
            Declaration::int().with_getter("LEV?").with_retries(retries),
        );
        let driver = Arc::new(FailingDriver::retryable());
        let host = Host::new(class, driver.clone(), HostOptions::default());

        let err = host.get_attribute("level").unwrap_err();
        assert!(err.is_communication(), "retries {}", retries);
        assert_eq!(driver.calls(), calls, "retries {}", retries);
        assert_eq!(driver.reconnects(), reconnects, "retries {}", retries);
    }
}

#[test]
fn test_non_retryable_failure_is_not_retried() {
    let class = single(
        "level",
        Declaration::int().with_setter("LEV {}").with_retries(5),
    );
    let driver = Arc::new(FailingDriver::default());
    let host = Host::new(class, driver.clone(), HostOptions::default());

    assert!(host.set_attribute("level", 2).is_err());
    assert_eq!(driver.calls(), 1);
    assert_eq!(driver.reconnects(), 0);
}

#[test]
fn test_retry_recovers_after_reconnect() {
    let driver = Arc::new(MemoryDriver::new().with_value("LEV", 7));
    let host = memory_host(
        single("level", Declaration::int().with_getter("LEV?").with_retries(2)),
        &driver,
    );
    driver.fail_next(2);

    assert_eq!(host.get_attribute("level").unwrap(), Value::Int(7));
    assert_eq!(driver.reads(), 3);
    assert_eq!(driver.reconnects(), 2);
}

#[test]
fn test_validation_errors_never_reach_the_device() {
    let class = single(
        "mode",
        Declaration::string()
            .with_setter("MODE {}")
            .with_values(["CV", "CC"])
            .with_retries(3),
    );
    let driver = Arc::new(FailingDriver::retryable());
    let host = Host::new(class, driver.clone(), HostOptions::default());

    let err = host.set_attribute("mode", "XX").unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NotAllowed { .. })
    ));
    assert_eq!(driver.writes(), 0);
    assert_eq!(driver.reconnects(), 0);
}

#[test]
fn test_repeated_cached_write_runs_once() {
    let declaration = Declaration::int().with_getter("LEV?").with_setter("LEV {}");
    let driver = Arc::new(MemoryDriver::new());
    let host = memory_host(single("level", declaration.clone()), &driver);

    host.set_attribute("level", 2).unwrap();
    host.set_attribute("level", 2).unwrap();
    host.set_attribute("level", Value::Float(2.0)).unwrap();
    assert_eq!(driver.writes(), 1);
    assert_eq!(host.get_attribute("level").unwrap(), Value::Int(2));
    assert_eq!(driver.reads(), 0);

    let uncached_driver = Arc::new(MemoryDriver::new());
    let uncached = Host::new(
        single("level", declaration),
        uncached_driver.clone(),
        HostOptions::without_cache(),
    );
    uncached.set_attribute("level", 2).unwrap();
    uncached.set_attribute("level", 2).unwrap();
    assert_eq!(uncached_driver.writes(), 2);
}

#[test]
fn test_discard_forces_one_reread() {
    let class = ClassBuilder::new("Source")
        .attribute(
            "range",
            Declaration::int()
                .with_setter("RANGE {}")
                .with_discard(["reading"]),
        )
        .attribute("reading", Declaration::float().with_getter("READ?"))
        .build()
        .unwrap();
    let driver = Arc::new(MemoryDriver::new().with_value("READ", 1.5));
    let host = memory_host(class, &driver);

    host.get_attribute("reading").unwrap();
    host.get_attribute("reading").unwrap();
    assert_eq!(driver.reads(), 1);

    host.set_attribute("range", 2).unwrap();
    host.get_attribute("reading").unwrap();
    host.get_attribute("reading").unwrap();
    assert_eq!(driver.reads(), 2);
}

#[test]
fn test_limits_with_step() {
    let limits = LimitsValidator::int(Some(1), Some(4), Some(2)).unwrap();
    let driver = Arc::new(MemoryDriver::new());
    let host = memory_host(
        single(
            "level",
            Declaration::int()
                .with_setter("LEV {}")
                .with_limits(LimitsSpec::Fixed(limits)),
        ),
        &driver,
    );

    let accepted: Vec<i64> = (0..=4)
        .filter(|v| host.set_attribute("level", *v).is_ok())
        .collect();
    assert_eq!(accepted, vec![1, 3]);

    let err = host.set_attribute("level", 4).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the provided value 4 is out of bound for level. Minimum 1. Maximum 4. Step 2."
    );
}

#[test]
fn test_limits_reject_huge_values() {
    let limits = LimitsValidator::int(None, Some(10), Some(2)).unwrap();
    let driver = Arc::new(MemoryDriver::new());
    let host = memory_host(
        single(
            "level",
            Declaration::int()
                .with_setter("LEV {}")
                .with_limits(LimitsSpec::Fixed(limits)),
        ),
        &driver,
    );

    for value in [Value::Float(-1e300), Value::Int(i64::MIN + 1)] {
        let err = host.set_attribute("level", value.clone()).unwrap_err();
        assert!(
            matches!(err, Error::Validation(ValidationError::OutOfLimits { .. })),
            "{}: {}",
            value,
            err
        );
    }
    assert_eq!(driver.writes(), 0);
}

#[test]
fn test_register_round_trip() {
    let names = RegisterNames::Sequence(vec![
        Some("ready".into()),
        Some("armed".into()),
        Some("busy".into()),
        None,
        None,
        None,
        None,
        Some("fault".into()),
    ]);
    let class = single(
        "status",
        Declaration::register(names)
            .with_getter("STAT?")
            .with_setter("STAT {}"),
    );
    let driver = Arc::new(MemoryDriver::new().with_value("STAT", 0b0000_0110));
    let host = memory_host(class, &driver);

    let flags = host.get_attribute("status").unwrap();
    let map = flags.as_map().unwrap();
    assert_eq!(map.len(), 8);
    assert_eq!(map["ready"], Value::Bool(false));
    assert_eq!(map["armed"], Value::Bool(true));
    assert_eq!(map["busy"], Value::Bool(true));
    assert_eq!(map["fault"], Value::Bool(false));
    assert_eq!(map["3"], Value::Bool(false));

    let mut written: BTreeMap<String, Value> = BTreeMap::new();
    written.insert("fault".into(), Value::Bool(true));
    written.insert("ready".into(), Value::Bool(true));
    host.clear_cache(&Default::default()).unwrap();
    host.set_attribute("status", Value::Map(written)).unwrap();
    assert_eq!(driver.value("STAT", None), Some(Value::Int(0b1000_0001)));
}

#[test]
fn test_mapping_both_directions() {
    let table = MappingTable::Symmetric(vec![
        (Value::from("slow"), Value::Int(0)),
        (Value::from("fast"), Value::Int(1)),
    ]);
    let driver = Arc::new(MemoryDriver::new().with_value("SPD", 1));
    let host = memory_host(
        single(
            "speed",
            Declaration::mapping(table)
                .with_getter("SPD?")
                .with_setter("SPD {}"),
        ),
        &driver,
    );

    assert_eq!(host.get_attribute("speed").unwrap(), Value::from("fast"));
    host.set_attribute("speed", "slow").unwrap();
    assert_eq!(driver.value("SPD", None), Some(Value::Int(0)));
    assert!(matches!(
        host.set_attribute("speed", "warp").unwrap_err(),
        Error::Validation(ValidationError::NoMapping { .. })
    ));
}

#[test]
fn test_bool_aliases_reach_the_device_as_flags() {
    let driver = Arc::new(MemoryDriver::new());
    let host = memory_host(
        single(
            "enabled",
            Declaration::boolean()
                .with_getter("OUTP?")
                .with_setter("OUTP {}")
                .with_alias(true, ["on"])
                .with_alias(false, ["off"]),
        ),
        &driver,
    );

    host.set_attribute("enabled", "on").unwrap();
    assert_eq!(driver.value("OUTP", None), Some(Value::Bool(true)));
    host.clear_cache(&Default::default()).unwrap();
    assert_eq!(host.get_attribute("enabled").unwrap(), Value::Bool(true));
    assert!(host.set_attribute("enabled", "maybe").is_err());
}

#[test]
fn test_checks_guard_reads_and_writes() {
    let class = ClassBuilder::new("Source")
        .attribute(
            "remote",
            Declaration::boolean().with_getter("REM?").with_setter("REM {}"),
        )
        .attribute(
            "level",
            Declaration::int()
                .with_getter("LEV?")
                .with_setter("LEV {}")
                .with_read_checks("{remote}")
                .with_write_checks("{remote} and value % 2 == 0"),
        )
        .build()
        .unwrap();
    let driver = Arc::new(MemoryDriver::new().with_value("REM", false).with_value("LEV", 4));
    let host = memory_host(class, &driver);

    let err = host.get_attribute("level").unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::CheckFailed { .. })
    ));
    assert_eq!(driver.reads(), 1);

    host.set_attribute("remote", true).unwrap();
    assert_eq!(host.get_attribute("level").unwrap(), Value::Int(4));
    assert!(host.set_attribute("level", 3).is_err());
    host.set_attribute("level", 6).unwrap();
}

#[test]
fn test_extract_before_cast() {
    let driver = Arc::new(MemoryDriver::new().with_value("VOLT", "VOLT 12.5"));
    let host = memory_host(
        single(
            "voltage",
            Declaration::float()
                .with_getter("VOLT?")
                .with_extract("VOLT {:f}"),
        ),
        &driver,
    );
    assert_eq!(host.get_attribute("voltage").unwrap(), Value::Float(12.5));
}

#[test]
fn test_refused_confirmation_fails_the_write() {
    let class = single("level", Declaration::int().with_setter("LEV {}"));
    let driver = Arc::new(RefusingDriver::default());
    let host = Host::new(class, driver.clone(), HostOptions::default());

    let err = host.set_attribute("level", 3).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the device did not succeed to set level to 3 (3): device busy"
    );
    assert_eq!(driver.inner.writes(), 1);
    assert!(host.check_cache(&Default::default()).unwrap().is_empty());
}

#[test]
fn test_composed_post_write_keeps_confirmation() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let class = ClassBuilder::new("Device")
        .attribute("level", Declaration::int().with_setter("LEV {}"))
        .method(
            "_post_write_level",
            Hook::post_write(move |_, _, _, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .build()
        .unwrap();
    assert_eq!(
        class.attribute("level").unwrap().stage_hooks(Stage::PostWrite),
        vec![CONFIRM_ID.to_string(), "_post_write_level".to_string()]
    );

    let host = Host::new(class, Arc::new(RefusingDriver::default()), HostOptions::default());
    assert!(matches!(
        host.set_attribute("level", 1),
        Err(Error::OperationFailed { .. })
    ));
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}

#[test]
fn test_direct_pipeline_runs_under_the_lock() {
    let locked_write = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&locked_write);
    let class = ClassBuilder::new("Device")
        .attribute(
            "level",
            Declaration::feature().with_getter("LEV?").with_setter("LEV {}"),
        )
        .method(
            "_read_level",
            Hook::read(|host, _| Ok(Value::Bool(host.is_locked()))),
        )
        .method(
            "_write_level",
            Hook::write(move |host, _, value| {
                flag.store(host.is_locked(), Ordering::SeqCst);
                Ok(value)
            }),
        )
        .build()
        .unwrap();
    let host = Host::new(class, Arc::new(MemoryDriver::new()), HostOptions::default());
    let attribute = Arc::clone(host.attribute("level").unwrap());

    assert!(!host.is_locked());
    assert_eq!(attribute.read(&host).unwrap(), Value::Bool(true));
    attribute.write(&host, Value::Int(2)).unwrap();
    assert!(locked_write.load(Ordering::SeqCst));
    assert!(!host.is_locked());
}

#[test]
fn test_override_never_mutates_the_base() {
    let base = ClassBuilder::new("Source")
        .attribute("level", Declaration::int().with_getter("LEV?"))
        .build()
        .unwrap();
    let derived = ClassBuilder::new("DoublingSource")
        .base(base.clone())
        .method(
            "_post_read_level",
            Hook::post_read(|_, _, value| Ok(Value::Int(value.as_i64().unwrap_or(0) * 2))),
        )
        .build()
        .unwrap();

    let driver = Arc::new(MemoryDriver::new().with_value("LEV", 21));
    let plain = memory_host(base.clone(), &driver);
    let doubling = memory_host(derived, &driver);
    assert_eq!(plain.get_attribute("level").unwrap(), Value::Int(21));
    assert_eq!(doubling.get_attribute("level").unwrap(), Value::Int(42));
    assert!(base.attribute("level").unwrap().customizations().is_empty());
}

#[test]
fn test_alteration_replays_customizations() {
    let base = ClassBuilder::new("Source")
        .attribute("level", Declaration::int().with_getter("LEV?"))
        .method(
            "_post_read_level",
            Hook::post_read(|_, _, value| Ok(Value::Int(value.as_i64().unwrap_or(0) + 1))),
        )
        .build()
        .unwrap();
    let derived = ClassBuilder::new("PatientSource")
        .base(base.clone())
        .alter("level", |declaration| declaration.retries = 2)
        .build()
        .unwrap();

    let driver = Arc::new(MemoryDriver::new().with_value("LEV", 1));
    let original = memory_host(base, &driver);
    let altered = memory_host(derived, &driver);
    assert_eq!(
        original.get_attribute("level").unwrap(),
        altered.get_attribute("level").unwrap()
    );

    driver.fail_next(2);
    altered.clear_cache(&Default::default()).unwrap();
    assert_eq!(altered.get_attribute("level").unwrap(), Value::Int(2));
}

#[test]
fn test_replay_fails_when_anchor_disappears() {
    let mut attribute = crate::attributes::Attribute::new(
        "level",
        Declaration::int()
            .with_getter("LEV?")
            .with_setter("LEV {}")
            .with_values([1, 2]),
    )
    .unwrap();
    attribute
        .modify_behavior(
            Customization::Compose {
                hook: Hook::pre_write(|_, _, value| Ok(value)),
                placement: Placement::AddBefore {
                    anchor: "validate".into(),
                    id: "scale".into(),
                },
            },
            false,
        )
        .unwrap();

    let err = attribute
        .alter(|declaration| declaration.values.clear())
        .unwrap_err();
    assert!(err.to_string().contains("cannot replay customization 'scale'"));
}
