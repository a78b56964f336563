// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::value::{ChannelId, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// A cached attribute value.
///
/// Quantities also keep their plain magnitude so that writing either form
/// back is recognized as a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub magnitude: Option<Value>,
}

impl CacheEntry {
    pub fn new(value: Value) -> Self {
        let magnitude = match &value {
            Value::Quantity(q) => Some(Value::Float(q.magnitude)),
            _ => None,
        };
        Self { value, magnitude }
    }

    /// Whether writing `value` would leave the device unchanged.
    pub fn matches(&self, value: &Value) -> bool {
        self.value.loosely_equals(value)
            || self
                .magnitude
                .as_ref()
                .map_or(false, |m| m.loosely_equals(value))
    }
}

/// Which caches a clear or inspection applies to.
///
/// Without attribute names the whole cache of the host is concerned,
/// recursing into subsystems and instantiated channels unless disabled.
/// Attribute names may be dotted: `sub.attr` reaches a subsystem (or every
/// instantiated channel of that name) and `.attr` the parent container.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSelector {
    pub attributes: Option<Vec<String>>,
    pub subsystems: bool,
    pub channels: bool,
}

impl Default for CacheSelector {
    fn default() -> Self {
        Self::all()
    }
}

impl CacheSelector {
    pub fn all() -> Self {
        Self {
            attributes: None,
            subsystems: true,
            channels: true,
        }
    }

    pub fn attributes<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            attributes: Some(names.into_iter().map(Into::into).collect()),
            ..Self::all()
        }
    }

    pub fn without_subsystems(mut self) -> Self {
        self.subsystems = false;
        self
    }

    pub fn without_channels(mut self) -> Self {
        self.channels = false;
        self
    }
}

/// Copy of the cached values of a host and of its sub-containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheSnapshot {
    pub values: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub subsystems: BTreeMap<String, CacheSnapshot>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub channels: BTreeMap<String, BTreeMap<ChannelId, CacheSnapshot>>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.subsystems.is_empty() && self.channels.is_empty()
    }
}

/// Split a possibly dotted attribute name.
#[derive(Debug, PartialEq)]
pub(crate) enum Route<'a> {
    Local(&'a str),
    Parent(&'a str),
    Child(&'a str, &'a str),
}

pub(crate) fn route(name: &str) -> Route<'_> {
    if let Some(rest) = name.strip_prefix('.') {
        return Route::Parent(rest);
    }
    match name.split_once('.') {
        Some((part, rest)) => Route::Child(part, rest),
        None => Route::Local(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Quantity;

    #[test]
    fn test_entry_matches_both_forms() {
        let entry = CacheEntry::new(Value::Quantity(Quantity::new(2.0, "V")));
        assert!(entry.matches(&Value::Quantity(Quantity::new(2.0, "V"))));
        assert!(entry.matches(&Value::Float(2.0)));
        assert!(entry.matches(&Value::Int(2)));
        assert!(!entry.matches(&Value::Float(2.5)));

        let plain = CacheEntry::new(Value::from("FAST"));
        assert!(plain.magnitude.is_none());
        assert!(plain.matches(&Value::from("FAST")));
    }

    #[test]
    fn test_routes() {
        assert_eq!(route("voltage"), Route::Local("voltage"));
        assert_eq!(route(".voltage"), Route::Parent("voltage"));
        assert_eq!(route("..voltage"), Route::Parent(".voltage"));
        assert_eq!(route("output.state"), Route::Child("output", "state"));
        assert_eq!(route("a.b.c"), Route::Child("a", "b.c"));
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut snapshot = CacheSnapshot::default();
        snapshot.values.insert("mode".into(), Value::from("FAST"));
        let mut channel = CacheSnapshot::default();
        channel.values.insert("state".into(), Value::Bool(true));
        snapshot
            .channels
            .entry("output".into())
            .or_default()
            .insert(ChannelId::Index(1), channel);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["values"]["mode"], "FAST");
        assert_eq!(json["channels"]["output"]["1"]["values"]["state"], true);
        assert!(json.get("subsystems").is_none());
    }
}
