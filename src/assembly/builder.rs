// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::class::{
    Available, ChannelDeclaration, ContainerKind, HostClass, LimitsMethod, ListingMethod, Members,
};
use super::mro;
use crate::actions::{Action, ActionDeclaration, ActionMethod};
use crate::attributes::{Attribute, Customization, Declaration, Hook, Placement, Stage};
use crate::errors::{ConfigurationError, Result};
use crate::host::Host;
use crate::limits::LimitsValidator;
use crate::observability::messages::assembly::{AttributeAltered, AttributeCloned, ClassAssembled};
use crate::observability::messages::StructuredLog;
use crate::value::{ChannelId, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Prefix of the methods producing named limits.
const LIMITS_PREFIX: &str = "_limits_";

type Alteration = Box<dyn FnOnce(&mut Declaration)>;

enum Member {
    Attribute(Declaration),
    Alteration(Alteration),
    Hook {
        hook: Hook,
        placement: Option<Placement>,
    },
    Limits(LimitsMethod),
    Listing(ListingMethod),
    Action {
        declaration: ActionDeclaration,
        method: ActionMethod,
    },
    SubSystem(ClassBuilder),
    Channel {
        builder: ClassBuilder,
        available: Option<Available>,
    },
}

/// Collects the members of a class body.
///
/// Members are kept in declaration order; a name may only be used once per
/// body.
pub struct ClassBuilder {
    name: String,
    bases: Vec<Arc<HostClass>>,
    members: Vec<(String, Member)>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Body of a sub-container; its class name is derived from the parent.
    pub fn anonymous() -> Self {
        Self::new("")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(mut self, base: Arc<HostClass>) -> Self {
        self.bases.push(base);
        self
    }

    pub fn attribute(mut self, name: &str, declaration: Declaration) -> Self {
        self.members
            .push((name.to_string(), Member::Attribute(declaration)));
        self
    }

    /// Rebuild an inherited attribute from an edited copy of its declaration.
    pub fn alter<F>(mut self, name: &str, edit: F) -> Self
    where
        F: FnOnce(&mut Declaration) + 'static,
    {
        self.members
            .push((name.to_string(), Member::Alteration(Box::new(edit))));
        self
    }

    /// Register an override method such as `_post_read_voltage`.
    pub fn method(mut self, name: &str, hook: Hook) -> Self {
        self.members.push((
            name.to_string(),
            Member::Hook {
                hook,
                placement: None,
            },
        ));
        self
    }

    /// Register an override method placed explicitly in its stage composer.
    pub fn method_with(mut self, name: &str, hook: Hook, placement: Placement) -> Self {
        self.members.push((
            name.to_string(),
            Member::Hook {
                hook,
                placement: Some(placement),
            },
        ));
        self
    }

    /// Register the `_limits_<id>` accessor.
    pub fn limits<F>(mut self, id: &str, accessor: F) -> Self
    where
        F: Fn(&Host) -> Result<LimitsValidator> + Send + Sync + 'static,
    {
        self.members.push((
            format!("{}{}", LIMITS_PREFIX, id),
            Member::Limits(Arc::new(accessor)),
        ));
        self
    }

    /// Register a method listing channel ids.
    pub fn listing<F>(mut self, name: &str, listing: F) -> Self
    where
        F: Fn(&Host) -> Result<Vec<ChannelId>> + Send + Sync + 'static,
    {
        self.members
            .push((name.to_string(), Member::Listing(Arc::new(listing))));
        self
    }

    /// Register a device method whose arguments are validated before it runs.
    pub fn action<F>(mut self, name: &str, declaration: ActionDeclaration, method: F) -> Self
    where
        F: Fn(&Host, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.members.push((
            name.to_string(),
            Member::Action {
                declaration,
                method: Arc::new(method),
            },
        ));
        self
    }

    pub fn subsystem(mut self, name: &str, body: ClassBuilder) -> Self {
        self.members
            .push((name.to_string(), Member::SubSystem(body)));
        self
    }

    /// Declare a channel kind. Without `available` the listing is inherited.
    pub fn channel(mut self, name: &str, body: ClassBuilder, available: Option<Available>) -> Self {
        self.members.push((
            name.to_string(),
            Member::Channel {
                builder: body,
                available,
            },
        ));
        self
    }

    pub fn build(self) -> Result<Arc<HostClass>, ConfigurationError> {
        self.assemble(ContainerKind::Root)
    }

    fn assemble(self, kind: ContainerKind) -> Result<Arc<HostClass>, ConfigurationError> {
        let ClassBuilder {
            name,
            bases,
            members,
        } = self;

        let mut seen = BTreeSet::new();
        let mut declarations = Vec::new();
        let mut alterations = Vec::new();
        let mut hooks = Vec::new();
        let mut owned = Members::default();
        let mut subsystems = Vec::new();
        let mut channels = Vec::new();
        for (member, body) in members {
            if !seen.insert(member.clone()) {
                return Err(ConfigurationError::DuplicateMember {
                    class: name,
                    name: member,
                });
            }
            match body {
                Member::Attribute(declaration) => declarations.push((member, declaration)),
                Member::Alteration(edit) => alterations.push((member, edit)),
                Member::Hook { hook, placement } => {
                    let (stage, target) = split_method(&name, &member, &hook)?;
                    hooks.push((stage, target, member, hook, placement));
                }
                Member::Limits(accessor) => {
                    let id = member.trim_start_matches(LIMITS_PREFIX).to_string();
                    owned.limits.insert(id, accessor);
                }
                Member::Listing(listing) => {
                    owned.listings.insert(member, listing);
                }
                Member::Action {
                    declaration,
                    method,
                } => {
                    let action = Action::new(&member, declaration, method)?;
                    owned.actions.insert(member, Arc::new(action));
                }
                Member::SubSystem(builder) => subsystems.push((member, builder)),
                Member::Channel { builder, available } => {
                    channels.push((member, builder, available))
                }
            }
        }

        let ancestors = mro::linearize(&name, &bases)?;
        let mut all = Members::default();
        for ancestor in ancestors.iter().rev() {
            all.extend(ancestor.members());
        }
        all.limits
            .extend(owned.limits.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        all.listings
            .extend(owned.listings.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        all.actions
            .extend(owned.actions.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));

        let mut attributes = std::mem::take(&mut all.attributes);
        let mut owned_names = BTreeSet::new();
        for (attr_name, declaration) in declarations {
            let attribute = Attribute::new(&attr_name, declaration)?;
            attributes.insert(attr_name.clone(), Arc::new(attribute));
            owned_names.insert(attr_name);
        }

        for (attr_name, edit) in alterations {
            let current = attributes
                .get(&attr_name)
                .ok_or_else(|| ConfigurationError::UnknownAttribute {
                    class: name.clone(),
                    attribute: attr_name.clone(),
                    member: attr_name.clone(),
                })?;
            let rebuilt = current.alter(edit)?;
            AttributeAltered {
                class: &name,
                attribute: &attr_name,
                replayed: rebuilt.customizations().len(),
            }
            .log();
            attributes.insert(attr_name.clone(), Arc::new(rebuilt));
            owned_names.insert(attr_name);
        }

        hooks.sort_by_key(|(stage, ..)| *stage);
        for (stage, target, method, hook, placement) in hooks {
            let entry = attributes
                .get_mut(&target)
                .ok_or_else(|| ConfigurationError::UnknownAttribute {
                    class: name.clone(),
                    attribute: target.clone(),
                    member: method.clone(),
                })?;
            if owned_names.insert(target.clone()) {
                AttributeCloned {
                    class: &name,
                    attribute: &target,
                    member: &method,
                }
                .log();
            }
            let customization = if stage.is_composable() {
                Customization::Compose {
                    hook,
                    placement: placement.unwrap_or(Placement::Append(method)),
                }
            } else {
                Customization::Replace(hook)
            };
            Arc::make_mut(entry).modify_behavior(customization, false)?;
        }

        for (part, mut builder) in subsystems {
            if all.channels.contains_key(&part) {
                return Err(ConfigurationError::SubContainerKindMismatch {
                    name: part,
                    inherited: ContainerKind::Channel.as_str(),
                    declared: ContainerKind::SubSystem.as_str(),
                });
            }
            if let Some(inherited) = all.subsystems.get(&part) {
                builder.inherit(inherited);
            }
            builder.name_after(&name, &part);
            let class = builder.assemble(ContainerKind::SubSystem)?;
            owned.subsystems.insert(part, class);
        }

        for (part, mut builder, available) in channels {
            if all.subsystems.contains_key(&part) {
                return Err(ConfigurationError::SubContainerKindMismatch {
                    name: part,
                    inherited: ContainerKind::SubSystem.as_str(),
                    declared: ContainerKind::Channel.as_str(),
                });
            }
            let inherited = all.channels.get(&part);
            let available = match (available, inherited) {
                (Some(available), _) => available,
                (None, Some(declaration)) => declaration.available.clone(),
                (None, None) => {
                    return Err(ConfigurationError::MissingChannelListing {
                        class: name,
                        channel: part,
                    })
                }
            };
            if let Available::Method(method) = &available {
                if !all.listings.contains_key(method) {
                    return Err(ConfigurationError::UnknownListing {
                        class: name,
                        method: method.clone(),
                    });
                }
            }
            if let Some(declaration) = inherited {
                builder.inherit(&declaration.class);
            }
            builder.name_after(&name, &part);
            let class = builder.assemble(ContainerKind::Channel)?;
            owned
                .channels
                .insert(part, ChannelDeclaration { class, available });
        }

        owned.attributes = attributes
            .iter()
            .filter(|(attr_name, _)| owned_names.contains(*attr_name))
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        all.attributes = attributes;
        all.subsystems
            .extend(owned.subsystems.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        all.channels
            .extend(owned.channels.iter().map(|(k, v)| (k.clone(), v.clone())));

        let class = HostClass {
            name,
            kind,
            bases,
            ancestors,
            owned,
            all,
        };
        ClassAssembled {
            class: &class.name,
            kind: kind.as_str(),
            attributes: class.all.attributes.len(),
            owned: class.owned.attributes.len(),
            subsystems: class.all.subsystems.len(),
            channels: class.all.channels.len(),
        }
        .log();
        Ok(Arc::new(class))
    }

    /// Put the class generated for the same sub-container of an ancestor first.
    fn inherit(&mut self, inherited: &Arc<HostClass>) {
        if !self.bases.iter().any(|b| Arc::ptr_eq(b, inherited)) {
            self.bases.insert(0, Arc::clone(inherited));
        }
    }

    fn name_after(&mut self, parent: &str, part: &str) {
        if self.name.is_empty() {
            self.name = format!("{}{}", parent, capitalize(part));
        }
    }
}

fn split_method(
    class: &str,
    method: &str,
    hook: &Hook,
) -> Result<(Stage, String), ConfigurationError> {
    let (stage, target) =
        Stage::from_method_name(method).ok_or_else(|| ConfigurationError::InvalidMethodName {
            class: class.to_string(),
            method: method.to_string(),
        })?;
    if stage != hook.stage() {
        return Err(ConfigurationError::StageMismatch {
            method: method.to_string(),
            expected: stage.to_string(),
            found: hook.stage().to_string(),
        });
    }
    Ok((stage, target.to_string()))
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
