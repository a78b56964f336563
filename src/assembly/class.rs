// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::actions::Action;
use crate::attributes::{Attribute, Stage};
use crate::errors::Result;
use crate::host::Host;
use crate::limits::LimitsValidator;
use crate::value::ChannelId;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::sync::Arc;

/// Accessor computing the limits registered under an id.
pub type LimitsMethod = Arc<dyn Fn(&Host) -> Result<LimitsValidator> + Send + Sync>;

/// Method listing the ids of a channel kind.
pub type ListingMethod = Arc<dyn Fn(&Host) -> Result<Vec<ChannelId>> + Send + Sync>;

/// Position of a class in a container tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Root,
    SubSystem,
    Channel,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Root => "root",
            ContainerKind::SubSystem => "subsystem",
            ContainerKind::Channel => "channel",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the ids of a channel kind are known.
#[derive(Debug, Clone, PartialEq)]
pub enum Available {
    /// Fixed set of ids.
    Ids(Vec<ChannelId>),
    /// Name of a listing method of the parent class.
    Method(String),
}

/// A channel kind declared on a class.
#[derive(Clone)]
pub struct ChannelDeclaration {
    pub class: Arc<HostClass>,
    pub available: Available,
}

impl fmt::Debug for ChannelDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDeclaration")
            .field("class", &self.class.name())
            .field("available", &self.available)
            .finish()
    }
}

/// Everything a class contributes to its subclasses.
#[derive(Clone, Default)]
pub(crate) struct Members {
    pub(crate) attributes: BTreeMap<String, Arc<Attribute>>,
    pub(crate) limits: BTreeMap<String, LimitsMethod>,
    pub(crate) listings: BTreeMap<String, ListingMethod>,
    pub(crate) actions: BTreeMap<String, Arc<Action>>,
    pub(crate) subsystems: BTreeMap<String, Arc<HostClass>>,
    pub(crate) channels: BTreeMap<String, ChannelDeclaration>,
}

impl Members {
    /// Overlay `other` on top of these members.
    pub(crate) fn extend(&mut self, other: &Members) {
        self.attributes
            .extend(other.attributes.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        self.limits
            .extend(other.limits.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        self.listings
            .extend(other.listings.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        self.actions
            .extend(other.actions.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        self.subsystems
            .extend(other.subsystems.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        self.channels
            .extend(other.channels.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// An assembled, immutable host class.
pub struct HostClass {
    pub(crate) name: String,
    pub(crate) kind: ContainerKind,
    pub(crate) bases: Vec<Arc<HostClass>>,
    pub(crate) ancestors: Vec<Arc<HostClass>>,
    pub(crate) owned: Members,
    pub(crate) all: Members,
}

impl HostClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn bases(&self) -> &[Arc<HostClass>] {
        &self.bases
    }

    /// Ancestors in method resolution order, closest first.
    pub fn ancestors(&self) -> &[Arc<HostClass>] {
        &self.ancestors
    }

    pub fn is_subclass_of(&self, other: &Arc<HostClass>) -> bool {
        self.ancestors.iter().any(|a| Arc::ptr_eq(a, other))
    }

    pub fn attribute(&self, name: &str) -> Option<&Arc<Attribute>> {
        self.all.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Arc<Attribute>> {
        self.all.attributes.values()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.all.attributes.keys().map(String::as_str)
    }

    /// Whether the attribute was declared, altered or customized by this class.
    pub fn owns(&self, name: &str) -> bool {
        self.owned.attributes.contains_key(name)
    }

    pub fn owned(&self) -> impl Iterator<Item = &Arc<Attribute>> {
        self.owned.attributes.values()
    }

    pub(crate) fn members(&self) -> &Members {
        &self.owned
    }

    pub fn subsystems(&self) -> &BTreeMap<String, Arc<HostClass>> {
        &self.all.subsystems
    }

    pub fn channels(&self) -> &BTreeMap<String, ChannelDeclaration> {
        &self.all.channels
    }

    pub fn limits_accessor(&self, id: &str) -> Option<&LimitsMethod> {
        self.all.limits.get(id)
    }

    pub fn declared_limits(&self) -> Vec<String> {
        self.all.limits.keys().cloned().collect()
    }

    pub fn listing(&self, name: &str) -> Option<&ListingMethod> {
        self.all.listings.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&Arc<Action>> {
        self.all.actions.get(name)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.all.actions.keys().map(String::as_str)
    }

    /// Human readable outline of the class and its sub-containers.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        let _ = writeln!(out, "{}{} ({})", pad, self.name, self.kind);
        if !self.ancestors.is_empty() {
            let names: Vec<&str> = self.ancestors.iter().map(|a| a.name()).collect();
            let _ = writeln!(out, "{}  ancestors: {}", pad, names.join(" -> "));
        }
        for attribute in self.attributes() {
            let mut line = format!("{}  {} [{}]", pad, attribute.name(), attribute.kind());
            if let Some(token) = attribute.read_token() {
                let _ = write!(line, " get={}", token);
            }
            if let Some(token) = attribute.write_token() {
                let _ = write!(line, " set={}", token);
            }
            if attribute.retries() > 0 {
                let _ = write!(line, " retries={}", attribute.retries());
            }
            if self.owns(attribute.name()) {
                line.push_str(" *");
            }
            let _ = writeln!(out, "{}", line);
            for stage in Stage::ALL {
                let summary = attribute.stage_summary(stage);
                if summary != "default" {
                    let _ = writeln!(out, "{}      {}: {}", pad, stage, summary);
                }
            }
        }
        let limits = self.declared_limits();
        if !limits.is_empty() {
            let _ = writeln!(out, "{}  limits: {}", pad, limits.join(", "));
        }
        for (name, action) in &self.all.actions {
            let arguments = action.declaration().arguments.join(", ");
            let _ = writeln!(out, "{}  action {}({})", pad, name, arguments);
        }
        for (name, sub) in self.subsystems() {
            let _ = writeln!(out, "{}  subsystem {}:", pad, name);
            sub.describe_into(out, depth + 2);
        }
        for (name, channel) in self.channels() {
            let available = match &channel.available {
                Available::Ids(ids) => {
                    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                    format!("[{}]", ids.join(", "))
                }
                Available::Method(method) => format!("listed by {}", method),
            };
            let _ = writeln!(out, "{}  channel {} {}:", pad, name, available);
            channel.class.describe_into(out, depth + 2);
        }
    }
}

impl fmt::Debug for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostClass")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("attributes", &self.all.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}
