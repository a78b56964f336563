// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::MemoryDriver;
use crate::attributes::Attribute;
use crate::errors::{CommunicationError, CommunicationKind, Error, Result};
use crate::traits::{Confirmation, Driver};
use crate::value::{CallArgs, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A driver storing writes but refusing to confirm them
#[derive(Default)]
pub struct RefusingDriver {
    pub inner: MemoryDriver,
}

impl Driver for RefusingDriver {
    fn default_get(&self, attribute: &Attribute, token: &Value, args: &CallArgs) -> Result<Value> {
        self.inner.default_get(attribute, token, args)
    }

    fn default_set(
        &self,
        attribute: &Attribute,
        token: &Value,
        value: &Value,
        args: &CallArgs,
    ) -> Result<Value> {
        self.inner.default_set(attribute, token, value, args)
    }

    fn confirm_operation(
        &self,
        _attribute: &Attribute,
        _value: &Value,
        _transformed: &Value,
        _response: &Value,
    ) -> Result<Confirmation> {
        Ok(Confirmation::refused("device busy"))
    }

    fn reconnect(&self) -> Result<()> {
        self.inner.reconnect()
    }
}

/// A driver whose every call fails
#[derive(Default)]
pub struct FailingDriver {
    /// When false the failures are reported as not retryable.
    pub retryable: bool,
    pub calls: AtomicUsize,
    pub writes: AtomicUsize,
    pub reconnects: AtomicUsize,
}

impl FailingDriver {
    pub fn retryable() -> Self {
        Self {
            retryable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn fail(&self) -> Error {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CommunicationError::new(CommunicationKind::ConnectionLost, "link down").into()
    }
}

impl Driver for FailingDriver {
    fn default_get(
        &self,
        _attribute: &Attribute,
        _token: &Value,
        _args: &CallArgs,
    ) -> Result<Value> {
        Err(self.fail())
    }

    fn default_set(
        &self,
        _attribute: &Attribute,
        _token: &Value,
        _value: &Value,
        _args: &CallArgs,
    ) -> Result<Value> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(self.fail())
    }

    fn reconnect(&self) -> Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_retryable(&self, error: &Error) -> bool {
        self.retryable && error.is_communication()
    }
}
