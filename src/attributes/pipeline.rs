// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The six stage slots of an attribute and their default behaviour.

use super::composer::HookComposer;
use super::hooks::{
    Customization, Hook, Placement, PostWriteHook, PreReadHook, ReadHook, Stage, ValueHook,
};
use crate::attributes::Attribute;
use crate::errors::{ConfigurationError, Error, Result};
use crate::host::Host;
use crate::observability::messages::attribute::OperationRefused;
use crate::observability::messages::StructuredLog;
use crate::value::Value;
use std::sync::Arc;

/// Id under which the default confirmation survives in a post-write composer.
pub const CONFIRM_ID: &str = "confirm";
/// Id under which a single custom hook survives when its stage becomes a composer.
pub const OLD_ID: &str = "old";

#[derive(Clone)]
pub(crate) enum Slot<H> {
    Default,
    Single(H),
    Composed(HookComposer<H>),
}

impl<H> Default for Slot<H> {
    fn default() -> Self {
        Slot::Default
    }
}

impl<H: Clone> Slot<H> {
    /// Turn the slot into a composer (keeping what it held) and place the hook.
    fn compose(
        &mut self,
        placement: &Placement,
        hook: H,
        default: Option<H>,
    ) -> Result<(), ConfigurationError> {
        let mut composer = match std::mem::take(self) {
            Slot::Composed(composer) => composer,
            Slot::Single(old) => {
                let mut composer = HookComposer::new();
                composer.append(OLD_ID, old);
                composer
            }
            Slot::Default => {
                let mut composer = HookComposer::new();
                if let Some(default) = default {
                    composer.append(CONFIRM_ID, default);
                }
                composer
            }
        };
        let result = composer.apply(placement, hook);
        *self = Slot::Composed(composer);
        result
    }

    fn remove(&mut self, id: &str) -> Result<(), ConfigurationError> {
        match self {
            Slot::Composed(composer) => composer.remove(id).map(|_| ()),
            _ => Err(ConfigurationError::UnknownHook(id.to_string())),
        }
    }

    fn summary(&self) -> String {
        match self {
            Slot::Default => "default".to_string(),
            Slot::Single(_) => "custom".to_string(),
            Slot::Composed(composer) => format!("[{}]", composer.names().join(", ")),
        }
    }

    fn names(&self) -> Vec<String> {
        match self {
            Slot::Composed(composer) => composer.names().to_vec(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct Pipeline {
    pre_read: Slot<PreReadHook>,
    read: Option<ReadHook>,
    post_read: Slot<ValueHook>,
    pre_write: Slot<ValueHook>,
    write: Option<ValueHook>,
    post_write: Slot<PostWriteHook>,
}

impl Pipeline {
    pub(crate) fn apply(
        &mut self,
        customization: &Customization,
    ) -> Result<(), ConfigurationError> {
        match customization {
            Customization::Replace(hook) => {
                match hook.clone() {
                    Hook::PreRead(h) => self.pre_read = Slot::Single(h),
                    Hook::Read(h) => self.read = Some(h),
                    Hook::PostRead(h) => self.post_read = Slot::Single(h),
                    Hook::PreWrite(h) => self.pre_write = Slot::Single(h),
                    Hook::Write(h) => self.write = Some(h),
                    Hook::PostWrite(h) => self.post_write = Slot::Single(h),
                }
                Ok(())
            }
            Customization::Compose { hook, placement } => match hook.clone() {
                Hook::Read(h) => {
                    self.read = Some(h);
                    Ok(())
                }
                Hook::Write(h) => {
                    self.write = Some(h);
                    Ok(())
                }
                Hook::PreRead(h) => self.pre_read.compose(placement, h, None),
                Hook::PostRead(h) => self.post_read.compose(placement, h, None),
                Hook::PreWrite(h) => self.pre_write.compose(placement, h, None),
                Hook::PostWrite(h) => self.post_write.compose(placement, h, Some(confirm_hook())),
            },
            Customization::Remove { stage, id } => match stage {
                Stage::PreRead => self.pre_read.remove(id),
                Stage::PostRead => self.post_read.remove(id),
                Stage::PreWrite => self.pre_write.remove(id),
                Stage::PostWrite => self.post_write.remove(id),
                Stage::Read | Stage::Write => Err(ConfigurationError::UnknownHook(id.to_string())),
            },
        }
    }

    pub(crate) fn has_custom_read(&self) -> bool {
        self.read.is_some()
    }

    pub(crate) fn has_custom_write(&self) -> bool {
        self.write.is_some()
    }

    /// Hook ids of a composed stage, empty otherwise.
    pub(crate) fn names(&self, stage: Stage) -> Vec<String> {
        match stage {
            Stage::PreRead => self.pre_read.names(),
            Stage::PostRead => self.post_read.names(),
            Stage::PreWrite => self.pre_write.names(),
            Stage::PostWrite => self.post_write.names(),
            Stage::Read | Stage::Write => Vec::new(),
        }
    }

    /// Short description of a stage: `default`, `custom` or the composer ids.
    pub(crate) fn summary(&self, stage: Stage) -> String {
        let single = |custom: bool| (if custom { "custom" } else { "default" }).to_string();
        match stage {
            Stage::PreRead => self.pre_read.summary(),
            Stage::Read => single(self.read.is_some()),
            Stage::PostRead => self.post_read.summary(),
            Stage::PreWrite => self.pre_write.summary(),
            Stage::Write => single(self.write.is_some()),
            Stage::PostWrite => self.post_write.summary(),
        }
    }

    pub(crate) fn pre_read(&self, host: &Host, attribute: &Attribute) -> Result<()> {
        match &self.pre_read {
            Slot::Default => Ok(()),
            Slot::Single(hook) => hook(host, attribute),
            Slot::Composed(composer) => composer.call(host, attribute),
        }
    }

    pub(crate) fn read(&self, host: &Host, attribute: &Attribute) -> Result<Value> {
        match &self.read {
            Some(hook) => hook(host, attribute),
            None => match attribute.read_token() {
                Some(token) => host.default_get(attribute, token),
                None => Err(Error::NotReadable(attribute.name().to_string())),
            },
        }
    }

    pub(crate) fn post_read(
        &self,
        host: &Host,
        attribute: &Attribute,
        value: Value,
    ) -> Result<Value> {
        transform(&self.post_read, host, attribute, value)
    }

    pub(crate) fn pre_write(
        &self,
        host: &Host,
        attribute: &Attribute,
        value: Value,
    ) -> Result<Value> {
        transform(&self.pre_write, host, attribute, value)
    }

    pub(crate) fn write(&self, host: &Host, attribute: &Attribute, value: Value) -> Result<Value> {
        match &self.write {
            Some(hook) => hook(host, attribute, value),
            None => match attribute.write_token() {
                Some(token) => host.default_set(attribute, token, &value),
                None => Err(Error::NotWritable(attribute.name().to_string())),
            },
        }
    }

    pub(crate) fn post_write(
        &self,
        host: &Host,
        attribute: &Attribute,
        value: &Value,
        transformed: &Value,
        response: &Value,
    ) -> Result<()> {
        match &self.post_write {
            Slot::Default => confirm(host, attribute, value, transformed, response),
            Slot::Single(hook) => hook(host, attribute, value, transformed, response),
            Slot::Composed(composer) => {
                composer.call(host, attribute, value, transformed, response)
            }
        }
    }
}

fn transform(
    slot: &Slot<ValueHook>,
    host: &Host,
    attribute: &Attribute,
    value: Value,
) -> Result<Value> {
    match slot {
        Slot::Default => Ok(value),
        Slot::Single(hook) => hook(host, attribute, value),
        Slot::Composed(composer) => composer.call(host, attribute, value),
    }
}

fn confirm_hook() -> PostWriteHook {
    Arc::new(confirm)
}

/// Default post-write: ask the collaborator whether the write took effect.
fn confirm(
    host: &Host,
    attribute: &Attribute,
    value: &Value,
    transformed: &Value,
    response: &Value,
) -> Result<()> {
    let confirmation = host.confirm_operation(attribute, value, transformed, response)?;
    if confirmation.ok {
        return Ok(());
    }
    OperationRefused {
        attribute: attribute.name(),
        value,
        transformed,
        detail: confirmation.detail.as_deref(),
    }
    .log();
    Err(Error::OperationFailed {
        attribute: attribute.name().to_string(),
        value: value.to_string(),
        transformed: transformed.to_string(),
        detail: confirmation.detail,
    })
}
