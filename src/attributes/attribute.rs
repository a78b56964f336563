// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::declaration::{AttributeKind, Declaration};
use super::hooks::{Customization, Stage};
use super::kinds;
use super::pipeline::Pipeline;
use crate::errors::{ConfigurationError, Error, Result};
use crate::host::Host;
use crate::observability::messages::attribute::{
    CacheHit, RetriesExhausted, RetryingAfterFailure, WriteSkipped,
};
use crate::observability::messages::StructuredLog;
use crate::value::Value;
use std::fmt;

/// A remotely accessed property of a host class.
///
/// The attribute is shared by every instance of the class it is attached to
/// and never mutated once the class is built. Reading runs
/// `pre_read -> read -> post_read`, writing runs
/// `pre_write -> write -> post_write`; the read and write stages are retried
/// after a reconnect when the collaborator classifies the failure as
/// retryable.
#[derive(Clone)]
pub struct Attribute {
    name: String,
    declaration: Declaration,
    pipeline: Pipeline,
    customizations: Vec<Customization>,
}

impl Attribute {
    /// Build an attribute and install the internal hooks of its kind.
    pub fn new(name: &str, declaration: Declaration) -> Result<Self, ConfigurationError> {
        declaration.validate(name)?;
        let mut attribute = Self {
            name: name.to_string(),
            declaration,
            pipeline: Pipeline::default(),
            customizations: Vec::new(),
        };
        kinds::install(&mut attribute)?;
        Ok(attribute)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttributeKind {
        self.declaration.kind
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn read_token(&self) -> Option<&Value> {
        self.declaration.getter.as_ref()
    }

    pub fn write_token(&self) -> Option<&Value> {
        self.declaration.setter.as_ref()
    }

    pub fn retries(&self) -> u32 {
        self.declaration.retries
    }

    pub fn doc(&self) -> Option<&str> {
        self.declaration.doc.as_deref()
    }

    /// Every recorded (non internal) customization, oldest first.
    pub fn customizations(&self) -> &[Customization] {
        &self.customizations
    }

    pub fn is_readable(&self) -> bool {
        self.declaration.getter.is_some() || self.pipeline.has_custom_read()
    }

    pub fn is_writable(&self) -> bool {
        self.declaration.setter.is_some() || self.pipeline.has_custom_write()
    }

    /// Hook ids of a composed stage.
    pub fn stage_hooks(&self, stage: Stage) -> Vec<String> {
        self.pipeline.names(stage)
    }

    pub fn stage_summary(&self, stage: Stage) -> String {
        self.pipeline.summary(stage)
    }

    /// Apply a customization to the pipeline.
    ///
    /// Internal modifications (the hooks installed by the attribute kind) are
    /// not recorded since rebuilding from the declaration reinstalls them.
    pub fn modify_behavior(
        &mut self,
        customization: Customization,
        internal: bool,
    ) -> Result<(), ConfigurationError> {
        self.pipeline.apply(&customization)?;
        if !internal {
            tracing::trace!(
                attribute = %self.name,
                stage = %customization.stage(),
                hook = customization.hook_id(),
                "customization recorded"
            );
            self.customizations.push(customization);
        }
        Ok(())
    }

    /// Rebuild the attribute from `declaration` and replay the recorded
    /// customizations on it.
    ///
    /// A customization whose anchor, replace target or remove target does not
    /// exist on the rebuilt attribute is an error.
    pub fn reconstruct(&self, declaration: Declaration) -> Result<Attribute, ConfigurationError> {
        let mut rebuilt = Attribute::new(&self.name, declaration)?;
        for customization in &self.customizations {
            rebuilt
                .modify_behavior(customization.clone(), false)
                .map_err(|e| ConfigurationError::ReplayFailed {
                    attribute: self.name.clone(),
                    stage: customization.stage().to_string(),
                    hook: customization.hook_id().to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(rebuilt)
    }

    /// Edit a copy of the declaration and rebuild from it.
    pub fn alter<F>(&self, edit: F) -> Result<Attribute, ConfigurationError>
    where
        F: FnOnce(&mut Declaration),
    {
        let mut declaration = self.declaration.clone();
        edit(&mut declaration);
        self.reconstruct(declaration)
    }

    /// Run the read pipeline, bypassing the cache.
    pub fn read(&self, host: &Host) -> Result<Value> {
        if !self.is_readable() {
            return Err(Error::NotReadable(self.name.clone()));
        }
        let _guard = host.lock();
        self.pipeline.pre_read(host, self)?;
        let raw = self.with_retries(host, "read", || self.pipeline.read(host, self))?;
        self.pipeline.post_read(host, self, raw)
    }

    /// Run the write pipeline, bypassing the cache.
    pub fn write(&self, host: &Host, value: Value) -> Result<()> {
        if !self.is_writable() {
            return Err(Error::NotWritable(self.name.clone()));
        }
        let _guard = host.lock();
        let transformed = self.pipeline.pre_write(host, self, value.clone())?;
        let response = self.with_retries(host, "write", || {
            self.pipeline.write(host, self, transformed.clone())
        })?;
        self.pipeline
            .post_write(host, self, &value, &transformed, &response)
    }

    /// Cached read: a cached value is returned without touching the device.
    pub fn get(&self, host: &Host) -> Result<Value> {
        let _guard = host.lock();
        if let Some(entry) = host.cached(&self.name) {
            CacheHit {
                container: host.class_name(),
                attribute: &self.name,
            }
            .log();
            return Ok(entry.value);
        }
        let value = self.read(host)?;
        host.store(&self.name, &value);
        Ok(value)
    }

    /// Cached write: writing the cached value again is a no-op.
    pub fn set(&self, host: &Host, value: Value) -> Result<()> {
        let _guard = host.lock();
        if let Some(entry) = host.cached(&self.name) {
            if entry.matches(&value) {
                WriteSkipped {
                    container: host.class_name(),
                    attribute: &self.name,
                    value: &value,
                }
                .log();
                return Ok(());
            }
        }
        self.write(host, value.clone())?;
        host.store(&self.name, &value);
        Ok(())
    }

    fn with_retries<T, F>(&self, host: &Host, operation: &'static str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let retries = self.retries();
        let mut done = 0;
        loop {
            let error = match attempt() {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            let retryable =
                !error.is_configuration() && !error.is_validation() && host.is_retryable(&error);
            if !retryable {
                return Err(error);
            }
            if done >= retries {
                if retries > 0 {
                    RetriesExhausted {
                        attribute: &self.name,
                        operation,
                        attempts: done + 1,
                        error: &error,
                    }
                    .log();
                }
                return Err(error);
            }
            done += 1;
            RetryingAfterFailure {
                attribute: &self.name,
                operation,
                attempt: done,
                retries,
                error: &error,
            }
            .log();
            host.reconnect()?;
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("kind", &self.declaration.kind)
            .field("customizations", &self.customizations.len())
            .finish()
    }
}
