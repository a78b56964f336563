// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One live host per device connection.
//!
//! Opening the same class on the same connection twice hands back the host
//! already in use, so every caller shares its cache and lock. Entries are
//! weak: once the last handle is dropped the next open connects again.

use super::Host;
use crate::assembly::HostClass;
use crate::config::HostOptions;
use crate::errors::Result;
use crate::observability::messages::action::InstanceReused;
use crate::observability::messages::StructuredLog;
use crate::traits::Driver;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

static GLOBAL: Lazy<InstanceRegistry> = Lazy::new(InstanceRegistry::new);

/// Result of [`InstanceRegistry::open`].
pub struct Opened {
    pub host: Arc<Host>,
    /// False when the host was already open on that connection.
    pub newly_created: bool,
}

type InstanceKey = (usize, String);

/// Live hosts keyed by class and connection id.
#[derive(Default)]
pub struct InstanceRegistry {
    instances: Mutex<HashMap<InstanceKey, Weak<Host>>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by the whole process.
    pub fn global() -> &'static InstanceRegistry {
        &GLOBAL
    }

    /// Host of `class` on `connection`.
    ///
    /// `connect` and `options` are only used when no host is alive for that
    /// pair. Subclasses are distinct classes and get their own host.
    pub fn open<F>(
        &self,
        class: &Arc<HostClass>,
        connection: &str,
        options: HostOptions,
        connect: F,
    ) -> Result<Opened>
    where
        F: FnOnce() -> Result<Arc<dyn Driver>>,
    {
        let key = key(class, connection);
        let mut instances = self.instances.lock();
        instances.retain(|_, host| host.strong_count() > 0);

        if let Some(host) = instances.get(&key).and_then(Weak::upgrade) {
            InstanceReused {
                class: class.name(),
                connection,
            }
            .log();
            return Ok(Opened {
                host,
                newly_created: false,
            });
        }

        let host = Host::new(Arc::clone(class), connect()?, options);
        instances.insert(key, Arc::downgrade(&host));
        Ok(Opened {
            host,
            newly_created: true,
        })
    }

    /// The live host of `class` on `connection`, if any.
    pub fn get(&self, class: &Arc<HostClass>, connection: &str) -> Option<Arc<Host>> {
        self.instances
            .lock()
            .get(&key(class, connection))
            .and_then(Weak::upgrade)
    }

    /// Number of live hosts.
    pub fn len(&self) -> usize {
        self.instances
            .lock()
            .values()
            .filter(|host| host.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(class: &Arc<HostClass>, connection: &str) -> InstanceKey {
    (Arc::as_ptr(class) as usize, connection.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::ClassBuilder;
    use crate::attributes::Declaration;
    use crate::backends::MemoryDriver;
    use crate::errors::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn meter() -> Arc<HostClass> {
        ClassBuilder::new("Meter")
            .attribute("range", Declaration::int().with_getter("RANGE?"))
            .build()
            .unwrap()
    }

    fn counting(connects: &Arc<AtomicUsize>) -> impl FnOnce() -> Result<Arc<dyn Driver>> {
        let connects = Arc::clone(connects);
        move || {
            connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MemoryDriver::new()) as Arc<dyn Driver>)
        }
    }

    #[test]
    fn test_same_connection_shares_the_host() {
        let registry = InstanceRegistry::new();
        let class = meter();
        let connects = Arc::new(AtomicUsize::new(0));

        let first = registry
            .open(&class, "GPIB::5", HostOptions::default(), counting(&connects))
            .unwrap();
        assert!(first.newly_created);
        let second = registry
            .open(&class, "GPIB::5", HostOptions::without_cache(), counting(&connects))
            .unwrap();
        assert!(!second.newly_created);
        assert!(Arc::ptr_eq(&first.host, &second.host));
        assert!(second.host.options().caching_allowed);
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        let other = registry
            .open(&class, "GPIB::6", HostOptions::default(), counting(&connects))
            .unwrap();
        assert!(other.newly_created);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_subclass_gets_its_own_host() {
        let registry = InstanceRegistry::new();
        let class = meter();
        let sub = ClassBuilder::new("Aux").base(Arc::clone(&class)).build().unwrap();
        let connects = Arc::new(AtomicUsize::new(0));

        let base = registry
            .open(&class, "COM1", HostOptions::default(), counting(&connects))
            .unwrap();
        let derived = registry
            .open(&sub, "COM1", HostOptions::default(), counting(&connects))
            .unwrap();
        assert!(derived.newly_created);
        assert!(!Arc::ptr_eq(&base.host, &derived.host));
    }

    #[test]
    fn test_dropped_hosts_are_forgotten() {
        let registry = InstanceRegistry::new();
        let class = meter();
        let connects = Arc::new(AtomicUsize::new(0));

        let opened = registry
            .open(&class, "COM1", HostOptions::default(), counting(&connects))
            .unwrap();
        assert!(registry.get(&class, "COM1").is_some());
        drop(opened);
        assert!(registry.get(&class, "COM1").is_none());
        assert!(registry.is_empty());

        let reopened = registry
            .open(&class, "COM1", HostOptions::default(), counting(&connects))
            .unwrap();
        assert!(reopened.newly_created);
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_connection_is_not_registered() {
        let registry = InstanceRegistry::new();
        let class = meter();
        let result = registry.open(&class, "COM1", HostOptions::default(), || {
            Err(Error::communication("no device"))
        });
        assert!(matches!(result, Err(Error::Communication(_))));
        assert!(registry.is_empty());
    }
}
