// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-instance runtime of a host class.
//!
//! A [`Host`] owns the value cache, the limits cache and the sub-containers
//! of one device. The root host talks to the [`Driver`]; subsystems and
//! channels forward every collaborator call to their parent and share the
//! root lock, a re-entrant mutex held for the whole duration of each cached
//! read or write so that checks may read other attributes.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use the_featureset::assembly::ClassBuilder;
//! use the_featureset::attributes::Declaration;
//! use the_featureset::backends::MemoryDriver;
//! use the_featureset::config::HostOptions;
//! use the_featureset::host::Host;
//! use the_featureset::value::Value;
//!
//! let class = ClassBuilder::new("Source")
//!     .attribute("mode", Declaration::string().with_getter("MODE").with_setter("MODE"))
//!     .build()
//!     .unwrap();
//! let driver = Arc::new(MemoryDriver::new());
//! let host = Host::new(class, driver, HostOptions::default());
//!
//! host.set_attribute("mode", Value::from("FAST")).unwrap();
//! assert_eq!(host.get_attribute("mode").unwrap(), Value::from("FAST"));
//! ```

mod cache;
mod channels;
mod instances;


pub use cache::{CacheEntry, CacheSelector, CacheSnapshot};
pub use instances::{InstanceRegistry, Opened};

use crate::assembly::{Available, ContainerKind, HostClass};
use crate::attributes::Attribute;
use crate::config::HostOptions;
use crate::errors::{ConfigurationError, Error, Result};
use crate::limits::LimitsValidator;
use crate::observability::messages::host::{
    CacheCleared, ConnectionReopened, HostCreated, LimitsResolved,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{Confirmation, Driver};
use crate::value::{CallArgs, ChannelId, Value};
use cache::{route, Route};
use channels::ChannelPool;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};

/// Named argument under which a channel passes its id to the collaborator.
pub const CHANNEL_ARG: &str = "ch_id";

pub(crate) enum Link {
    Root(Arc<dyn Driver>),
    SubSystem { parent: Weak<Host> },
    Channel { parent: Weak<Host>, id: ChannelId },
}

/// Live instance of a [`HostClass`].
pub struct Host {
    class: Arc<HostClass>,
    link: Link,
    options: HostOptions,
    lock: Arc<ReentrantMutex<()>>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    limits_cache: Mutex<HashMap<String, Arc<LimitsValidator>>>,
    subsystems: BTreeMap<String, Arc<Host>>,
    channels: BTreeMap<String, ChannelPool>,
    me: Weak<Host>,
}

impl Host {
    /// Instantiate a root host and all its subsystems.
    pub fn new(class: Arc<HostClass>, driver: Arc<dyn Driver>, options: HostOptions) -> Arc<Host> {
        let caching_allowed = options.caching_allowed;
        let host = Host::build(
            class,
            Link::Root(driver),
            options,
            Arc::new(ReentrantMutex::new(())),
        );
        HostCreated {
            class: host.class_name(),
            subsystems: host.subsystems.len(),
            channel_kinds: host.channels.len(),
            caching_allowed,
        }
        .log();
        host
    }

    pub(crate) fn build(
        class: Arc<HostClass>,
        link: Link,
        options: HostOptions,
        lock: Arc<ReentrantMutex<()>>,
    ) -> Arc<Host> {
        Arc::new_cyclic(|me: &Weak<Host>| {
            let subsystems = class
                .subsystems()
                .iter()
                .map(|(name, sub)| {
                    let child = Host::build(
                        Arc::clone(sub),
                        Link::SubSystem { parent: me.clone() },
                        options.clone(),
                        Arc::clone(&lock),
                    );
                    (name.clone(), child)
                })
                .collect();
            let channels = class
                .channels()
                .iter()
                .map(|(name, declaration)| {
                    (
                        name.clone(),
                        ChannelPool::new(name, declaration.clone(), me.clone()),
                    )
                })
                .collect();
            Host {
                class,
                link,
                options,
                lock,
                cache: Mutex::new(HashMap::new()),
                limits_cache: Mutex::new(HashMap::new()),
                subsystems,
                channels,
                me: me.clone(),
            }
        })
    }

    pub fn class(&self) -> &Arc<HostClass> {
        &self.class
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn kind(&self) -> ContainerKind {
        match self.link {
            Link::Root(_) => ContainerKind::Root,
            Link::SubSystem { .. } => ContainerKind::SubSystem,
            Link::Channel { .. } => ContainerKind::Channel,
        }
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    /// Id of a channel host.
    pub fn channel_id(&self) -> Option<&ChannelId> {
        match &self.link {
            Link::Channel { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Acquire the lock shared by the whole container tree.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Whether two hosts belong to the same container tree.
    pub fn shares_lock_with(&self, other: &Host) -> bool {
        Arc::ptr_eq(&self.lock, &other.lock)
    }

    pub fn parent(&self) -> Option<Arc<Host>> {
        match &self.link {
            Link::Root(_) => None,
            Link::SubSystem { parent } | Link::Channel { parent, .. } => parent.upgrade(),
        }
    }

    /// The root host of the container tree.
    pub fn root(&self) -> Result<Arc<Host>> {
        match &self.link {
            Link::Root(_) => self.upgrade(&self.me),
            Link::SubSystem { parent } | Link::Channel { parent, .. } => {
                self.upgrade(parent)?.root()
            }
        }
    }

    fn upgrade(&self, host: &Weak<Host>) -> Result<Arc<Host>> {
        host.upgrade()
            .ok_or_else(|| Error::Detached(self.class_name().to_string()))
    }

    fn parent_host(&self) -> Result<Arc<Host>> {
        match &self.link {
            Link::Root(_) => Err(Error::UnknownContainer {
                class: self.class_name().to_string(),
                name: "parent".to_string(),
            }),
            Link::SubSystem { parent } | Link::Channel { parent, .. } => self.upgrade(parent),
        }
    }

    // --- collaborator forwarding -------------------------------------------

    /// Find the driver of the tree, collecting the routing arguments on the way up.
    fn route(&self, mut args: CallArgs) -> Result<(Arc<dyn Driver>, CallArgs)> {
        match &self.link {
            Link::Root(driver) => Ok((Arc::clone(driver), args)),
            Link::SubSystem { parent } => self.upgrade(parent)?.route(args),
            Link::Channel { parent, id } => {
                args.named.insert(CHANNEL_ARG.to_string(), id.to_value());
                self.upgrade(parent)?.route(args)
            }
        }
    }

    pub fn driver(&self) -> Result<Arc<dyn Driver>> {
        self.route(CallArgs::new()).map(|(driver, _)| driver)
    }

    pub fn default_get(&self, attribute: &Attribute, token: &Value) -> Result<Value> {
        let (driver, args) = self.route(CallArgs::new())?;
        driver.default_get(attribute, token, &args)
    }

    pub fn default_set(
        &self,
        attribute: &Attribute,
        token: &Value,
        value: &Value,
    ) -> Result<Value> {
        let (driver, args) = self.route(CallArgs::new())?;
        driver.default_set(attribute, token, value, &args)
    }

    pub fn confirm_operation(
        &self,
        attribute: &Attribute,
        value: &Value,
        transformed: &Value,
        response: &Value,
    ) -> Result<Confirmation> {
        self.driver()?
            .confirm_operation(attribute, value, transformed, response)
    }

    pub fn reconnect(&self) -> Result<()> {
        let driver = self.driver()?;
        ConnectionReopened {
            container: self.class_name(),
        }
        .log();
        driver.reconnect()
    }

    pub fn is_retryable(&self, error: &Error) -> bool {
        self.driver()
            .map(|driver| driver.is_retryable(error))
            .unwrap_or(false)
    }

    // --- attribute access ----------------------------------------------------

    /// The attribute declared under `name` on this host class.
    pub fn attribute(&self, name: &str) -> Result<&Arc<Attribute>> {
        self.class
            .attribute(name)
            .ok_or_else(|| Error::UnknownAttribute {
                class: self.class_name().to_string(),
                name: name.to_string(),
            })
    }

    /// Read an attribute through the cache. Dotted names reach subsystems,
    /// a leading dot the parent container.
    pub fn get_attribute(&self, name: &str) -> Result<Value> {
        match route(name) {
            Route::Local(name) => self.attribute(name)?.get(self),
            Route::Parent(rest) => self.parent_host()?.get_attribute(rest),
            Route::Child(part, rest) => self.subsystem(part)?.get_attribute(rest),
        }
    }

    /// Write an attribute through the cache.
    pub fn set_attribute(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match route(name) {
            Route::Local(name) => self.attribute(name)?.set(self, value),
            Route::Parent(rest) => self.parent_host()?.set_attribute(rest, value),
            Route::Child(part, rest) => self.subsystem(part)?.set_attribute(rest, value),
        }
    }

    /// Call a declared action. Dotted names reach subsystems, a leading dot
    /// the parent container.
    pub fn call_action(&self, name: &str, arguments: Vec<Value>) -> Result<Value> {
        match route(name) {
            Route::Local(name) => {
                let action = self
                    .class
                    .action(name)
                    .ok_or_else(|| Error::UnknownAction {
                        class: self.class_name().to_string(),
                        name: name.to_string(),
                    })?;
                action.call(self, arguments)
            }
            Route::Parent(rest) => self.parent_host()?.call_action(rest, arguments),
            Route::Child(part, rest) => self.subsystem(part)?.call_action(rest, arguments),
        }
    }

    /// Read an attribute and strip the unit of a quantity.
    pub fn get_magnitude(&self, name: &str) -> Result<Value> {
        match self.get_attribute(name)? {
            Value::Quantity(q) => Ok(Value::Float(q.magnitude)),
            other => Ok(other),
        }
    }

    pub(crate) fn cached(&self, name: &str) -> Option<CacheEntry> {
        self.cache.lock().get(name).cloned()
    }

    pub(crate) fn store(&self, name: &str, value: &Value) {
        if self.options.caching_allowed {
            self.cache
                .lock()
                .insert(name.to_string(), CacheEntry::new(value.clone()));
        }
    }

    // --- cache control -------------------------------------------------------

    pub fn clear_cache(&self, selector: &CacheSelector) -> Result<()> {
        let _guard = self.lock();
        let names = match &selector.attributes {
            Some(names) => names,
            None => {
                self.cache.lock().clear();
                CacheCleared {
                    container: self.class_name(),
                    scope: "all",
                }
                .log();
                let nested = CacheSelector {
                    attributes: None,
                    subsystems: selector.subsystems,
                    channels: selector.channels,
                };
                if selector.subsystems {
                    for sub in self.subsystems.values() {
                        sub.clear_cache(&nested)?;
                    }
                }
                if selector.channels {
                    for pool in self.channels.values() {
                        for channel in pool.instantiated() {
                            channel.clear_cache(&nested)?;
                        }
                    }
                }
                return Ok(());
            }
        };

        let mut parent = Vec::new();
        let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        {
            let mut cache = self.cache.lock();
            for name in names {
                match route(name) {
                    Route::Local(name) => {
                        cache.remove(name);
                    }
                    Route::Parent(rest) => parent.push(rest),
                    Route::Child(part, rest) => children.entry(part).or_default().push(rest),
                }
            }
        }
        CacheCleared {
            container: self.class_name(),
            scope: "attributes",
        }
        .log();

        if !parent.is_empty() {
            self.parent_host()?
                .clear_cache(&CacheSelector::attributes(parent))?;
        }
        for (part, rest) in children {
            let nested = CacheSelector::attributes(rest);
            for target in self.containers_named(part)? {
                target.clear_cache(&nested)?;
            }
        }
        Ok(())
    }

    pub fn check_cache(&self, selector: &CacheSelector) -> Result<CacheSnapshot> {
        let _guard = self.lock();
        let mut snapshot = CacheSnapshot::default();

        let names = match &selector.attributes {
            Some(names) => names,
            None => {
                snapshot.values = self.cache_values();
                if selector.subsystems {
                    for (name, sub) in &self.subsystems {
                        snapshot
                            .subsystems
                            .insert(name.clone(), sub.check_cache(selector)?);
                    }
                }
                if selector.channels {
                    for (name, pool) in &self.channels {
                        let instantiated = pool.instantiated();
                        if instantiated.is_empty() {
                            continue;
                        }
                        let entry = snapshot.channels.entry(name.clone()).or_default();
                        for channel in instantiated {
                            if let Some(id) = channel.channel_id() {
                                entry.insert(id.clone(), channel.check_cache(selector)?);
                            }
                        }
                    }
                }
                return Ok(snapshot);
            }
        };

        let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        {
            let cache = self.cache.lock();
            for name in names {
                match route(name) {
                    Route::Local(name) => {
                        if let Some(entry) = cache.get(name) {
                            snapshot.values.insert(name.to_string(), entry.value.clone());
                        }
                    }
                    Route::Parent(_) => {
                        return Err(Error::UnknownContainer {
                            class: self.class_name().to_string(),
                            name: name.to_string(),
                        })
                    }
                    Route::Child(part, rest) => children.entry(part).or_default().push(rest),
                }
            }
        }

        for (part, rest) in children {
            let nested = CacheSelector::attributes(rest);
            if let Some(sub) = self.subsystems.get(part) {
                snapshot
                    .subsystems
                    .insert(part.to_string(), sub.check_cache(&nested)?);
                continue;
            }
            let pool = self.pool(part)?;
            let entry = snapshot.channels.entry(part.to_string()).or_default();
            for channel in pool.instantiated() {
                if let Some(id) = channel.channel_id() {
                    entry.insert(id.clone(), channel.check_cache(&nested)?);
                }
            }
        }
        Ok(snapshot)
    }

    fn cache_values(&self) -> BTreeMap<String, Value> {
        self.cache
            .lock()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value.clone()))
            .collect()
    }

    /// The subsystem, or every instantiated channel, declared as `part`.
    fn containers_named(&self, part: &str) -> Result<Vec<Arc<Host>>> {
        if let Some(sub) = self.subsystems.get(part) {
            return Ok(vec![Arc::clone(sub)]);
        }
        Ok(self.pool(part)?.instantiated())
    }

    // --- limits ---------------------------------------------------------------

    /// Limits produced by the `_limits_<id>` accessor, computed once and cached.
    pub fn get_limits(&self, id: &str) -> Result<Arc<LimitsValidator>> {
        let _guard = self.lock();
        if let Some(limits) = self.limits_cache.lock().get(id) {
            return Ok(Arc::clone(limits));
        }
        let accessor = self.class.limits_accessor(id).ok_or_else(|| {
            ConfigurationError::UndeclaredLimits {
                class: self.class_name().to_string(),
                id: id.to_string(),
            }
        })?;
        let limits = Arc::new(accessor(self)?);
        LimitsResolved {
            container: self.class_name(),
            id,
            bounds: &limits.describe(),
        }
        .log();
        self.limits_cache
            .lock()
            .insert(id.to_string(), Arc::clone(&limits));
        Ok(limits)
    }

    pub fn discard_limits<S: AsRef<str>>(&self, ids: &[S]) {
        let _guard = self.lock();
        let mut cache = self.limits_cache.lock();
        for id in ids {
            cache.remove(id.as_ref());
        }
    }

    /// Ids of every limits accessor of the class.
    pub fn declared_limits(&self) -> Vec<String> {
        self.class.declared_limits()
    }

    // --- sub-containers ---------------------------------------------------------

    pub fn subsystem(&self, name: &str) -> Result<Arc<Host>> {
        self.subsystems
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownContainer {
                class: self.class_name().to_string(),
                name: name.to_string(),
            })
    }

    pub fn subsystem_names(&self) -> impl Iterator<Item = &str> {
        self.subsystems.keys().map(String::as_str)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    fn pool(&self, name: &str) -> Result<&ChannelPool> {
        self.channels
            .get(name)
            .ok_or_else(|| Error::UnknownContainer {
                class: self.class_name().to_string(),
                name: name.to_string(),
            })
    }

    /// The channel `name` with the given id; the same id yields the same host.
    pub fn channel(&self, name: &str, id: impl Into<ChannelId>) -> Result<Arc<Host>> {
        let pool = self.pool(name)?;
        Ok(pool.get(id.into(), &self.options, &self.lock))
    }

    /// Channels of that kind created so far.
    pub fn instantiated_channels(&self, name: &str) -> Result<Vec<Arc<Host>>> {
        Ok(self.pool(name)?.instantiated())
    }

    /// Ids the device exposes for the channel kind `name`.
    pub fn available_channels(&self, name: &str) -> Result<Vec<ChannelId>> {
        match self.pool(name)?.available() {
            Available::Ids(ids) => Ok(ids.clone()),
            Available::Method(method) => {
                let listing = self.class.listing(method).ok_or_else(|| {
                    ConfigurationError::UnknownListing {
                        class: self.class_name().to_string(),
                        method: method.clone(),
                    }
                })?;
                listing(self)
            }
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("class", &self.class_name())
            .field("kind", &self.kind())
            .field("channel_id", &self.channel_id())
            .finish()
    }
}
