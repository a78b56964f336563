// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::attributes::Attribute;
use crate::errors::{Error, Result};
use crate::host::CHANNEL_ARG;
use crate::traits::Driver;
use crate::value::{CallArgs, Value};
use anyhow::anyhow;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Simulated device keeping its state in memory.
///
/// Read and write tokens address the same register once normalized: a
/// trailing `?` and a `{}` placeholder are dropped, so `VOLT?` and
/// `VOLT {}` both refer to `VOLT`. Channel calls are stored under
/// `<register>@<ch_id>`.
#[derive(Default)]
pub struct MemoryDriver {
    registers: Mutex<BTreeMap<String, Value>>,
    pending_failures: Mutex<usize>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    reconnects: AtomicUsize,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset the value of a register.
    pub fn with_value(self, token: &str, value: impl Into<Value>) -> Self {
        self.registers
            .lock()
            .insert(register(token, None), value.into());
        self
    }

    /// Preset the value of a register of one channel.
    pub fn with_channel_value(
        self,
        token: &str,
        ch_id: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Self {
        let ch_id = ch_id.into();
        self.registers
            .lock()
            .insert(register(token, Some(&ch_id)), value.into());
        self
    }

    pub fn value(&self, token: &str, ch_id: Option<&Value>) -> Option<Value> {
        self.registers.lock().get(&register(token, ch_id)).cloned()
    }

    /// Make the next `count` reads or writes time out.
    pub fn fail_next(&self, count: usize) {
        *self.pending_failures.lock() = count;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    fn injected_failure(&self, operation: &str, key: &str) -> Result<()> {
        let mut pending = self.pending_failures.lock();
        if *pending > 0 {
            *pending -= 1;
            return Err(Error::timeout(format!("{} of {} timed out", operation, key)));
        }
        Ok(())
    }
}

impl Driver for MemoryDriver {
    fn default_get(&self, attribute: &Attribute, token: &Value, args: &CallArgs) -> Result<Value> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let key = register(&token.to_string(), args.named(CHANNEL_ARG));
        self.injected_failure("read", &key)?;
        self.registers.lock().get(&key).cloned().ok_or_else(|| {
            Error::Hook(anyhow!(
                "nothing stored under '{}' for {}",
                key,
                attribute.name()
            ))
        })
    }

    fn default_set(
        &self,
        _attribute: &Attribute,
        token: &Value,
        value: &Value,
        args: &CallArgs,
    ) -> Result<Value> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let key = register(&token.to_string(), args.named(CHANNEL_ARG));
        self.injected_failure("write", &key)?;
        self.registers.lock().insert(key, value.clone());
        Ok(value.clone())
    }

    fn reconnect(&self) -> Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn register(token: &str, ch_id: Option<&Value>) -> String {
    let name = token.trim();
    let name = name.strip_suffix("{}").unwrap_or(name).trim_end();
    let name = name.strip_suffix('?').unwrap_or(name);
    match ch_id {
        Some(id) => format!("{}@{}", name, id),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Declaration;

    fn attribute() -> Attribute {
        let declaration = Declaration::int().with_getter("LEV?").with_setter("LEV {}");
        Attribute::new("level", declaration).unwrap()
    }

    #[test]
    fn test_register_normalization() {
        let cases = vec![
            ("VOLT?", None, "VOLT"),
            ("VOLT {}", None, "VOLT"),
            ("VOLT", None, "VOLT"),
            ("OUT:STATE?", Some(Value::Int(2)), "OUT:STATE@2"),
        ];
        for (token, ch_id, expected) in cases {
            assert_eq!(register(token, ch_id.as_ref()), expected, "token {}", token);
        }
    }

    #[test]
    fn test_write_then_read() {
        let driver = MemoryDriver::new();
        let attr = attribute();
        let args = CallArgs::new();
        driver
            .default_set(&attr, &Value::from("LEV {}"), &Value::Int(3), &args)
            .unwrap();
        assert_eq!(
            driver.default_get(&attr, &Value::from("LEV?"), &args).unwrap(),
            Value::Int(3)
        );
        assert_eq!((driver.reads(), driver.writes()), (1, 1));
    }

    #[test]
    fn test_channel_registers_are_separate() {
        let driver = MemoryDriver::new().with_channel_value("LEV", 1, 5);
        let attr = attribute();
        let first = CallArgs::new().with_named(CHANNEL_ARG, 1);
        let second = CallArgs::new().with_named(CHANNEL_ARG, 2);
        assert_eq!(driver.default_get(&attr, &Value::from("LEV?"), &first).unwrap(), Value::Int(5));
        assert!(driver.default_get(&attr, &Value::from("LEV?"), &second).is_err());
    }

    #[test]
    fn test_injected_failures() {
        let driver = MemoryDriver::new().with_value("LEV", 1);
        let attr = attribute();
        driver.fail_next(2);
        let token = Value::from("LEV?");
        for _ in 0..2 {
            let err = driver.default_get(&attr, &token, &CallArgs::new()).unwrap_err();
            assert!(err.is_communication());
        }
        assert_eq!(driver.default_get(&attr, &token, &CallArgs::new()).unwrap(), Value::Int(1));
        assert_eq!(driver.reads(), 3);
    }
}
