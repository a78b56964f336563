// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ordered collection of uniquely named hooks for one stage.

use super::hooks::{Placement, PostWriteHook, PreReadHook, ValueHook};
use crate::attributes::Attribute;
use crate::errors::{ConfigurationError, Result};
use crate::host::Host;
use crate::value::Value;

/// Ordered list of hooks, each stored under a unique id.
///
/// Inserting under an id that already exists first removes the previous
/// entry, so an id never appears twice.
#[derive(Clone)]
pub struct HookComposer<H> {
    names: Vec<String>,
    hooks: Vec<H>,
}

impl<H> Default for HookComposer<H> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            hooks: Vec::new(),
        }
    }
}

impl<H: Clone> HookComposer<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepend(&mut self, id: &str, hook: H) {
        self.discard(id);
        self.names.insert(0, id.to_string());
        self.hooks.insert(0, hook);
    }

    pub fn append(&mut self, id: &str, hook: H) {
        self.discard(id);
        self.names.push(id.to_string());
        self.hooks.push(hook);
    }

    pub fn add_before(
        &mut self,
        anchor: &str,
        id: &str,
        hook: H,
    ) -> Result<(), ConfigurationError> {
        self.require_anchor(anchor, id)?;
        self.discard(id);
        let index = self.position(anchor)?;
        self.names.insert(index, id.to_string());
        self.hooks.insert(index, hook);
        Ok(())
    }

    pub fn add_after(&mut self, anchor: &str, id: &str, hook: H) -> Result<(), ConfigurationError> {
        self.require_anchor(anchor, id)?;
        self.discard(id);
        let index = self.position(anchor)? + 1;
        self.names.insert(index, id.to_string());
        self.hooks.insert(index, hook);
        Ok(())
    }

    /// Swap the hook stored under `id`, keeping its position.
    pub fn replace(&mut self, id: &str, hook: H) -> Result<(), ConfigurationError> {
        let index = self.position(id)?;
        self.hooks[index] = hook;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<H, ConfigurationError> {
        let index = self.position(id)?;
        self.names.remove(index);
        Ok(self.hooks.remove(index))
    }

    pub fn reset(&mut self) {
        self.names.clear();
        self.hooks.clear();
    }

    pub fn get(&self, id: &str) -> Option<&H> {
        self.names
            .iter()
            .position(|n| n == id)
            .map(|index| &self.hooks[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.names.iter().any(|n| n == id)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn apply(&mut self, placement: &Placement, hook: H) -> Result<(), ConfigurationError> {
        match placement {
            Placement::Append(id) => {
                self.append(id, hook);
                Ok(())
            }
            Placement::Prepend(id) => {
                self.prepend(id, hook);
                Ok(())
            }
            Placement::AddBefore { anchor, id } => self.add_before(anchor, id, hook),
            Placement::AddAfter { anchor, id } => self.add_after(anchor, id, hook),
            Placement::Replace(id) => self.replace(id, hook),
        }
    }

    fn position(&self, id: &str) -> Result<usize, ConfigurationError> {
        self.names
            .iter()
            .position(|n| n == id)
            .ok_or_else(|| ConfigurationError::UnknownHook(id.to_string()))
    }

    fn require_anchor(&self, anchor: &str, id: &str) -> Result<(), ConfigurationError> {
        if anchor == id || !self.contains(anchor) {
            return Err(ConfigurationError::UnknownHook(anchor.to_string()));
        }
        Ok(())
    }

    fn discard(&mut self, id: &str) {
        if let Some(index) = self.names.iter().position(|n| n == id) {
            self.names.remove(index);
            self.hooks.remove(index);
        }
    }
}

impl HookComposer<PreReadHook> {
    /// Every hook receives the same input.
    pub fn call(&self, host: &Host, attribute: &Attribute) -> Result<()> {
        for hook in &self.hooks {
            hook(host, attribute)?;
        }
        Ok(())
    }
}

impl HookComposer<ValueHook> {
    /// The value is threaded through the hooks in order.
    pub fn call(&self, host: &Host, attribute: &Attribute, value: Value) -> Result<Value> {
        self.hooks
            .iter()
            .try_fold(value, |value, hook| hook(host, attribute, value))
    }
}

impl HookComposer<PostWriteHook> {
    /// Every hook receives the same three values.
    pub fn call(
        &self,
        host: &Host,
        attribute: &Attribute,
        value: &Value,
        transformed: &Value,
        response: &Value,
    ) -> Result<()> {
        for hook in &self.hooks {
            hook(host, attribute, value, transformed, response)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(composer: &HookComposer<u8>) -> Vec<&str> {
        composer.names().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_insertions() {
        let mut composer = HookComposer::new();
        composer.append("b", 2);
        composer.prepend("a", 1);
        composer.append("d", 4);
        composer.add_before("d", "c", 3).unwrap();
        composer.add_after("d", "e", 5).unwrap();
        assert_eq!(names(&composer), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(composer.get("c"), Some(&3));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut composer = HookComposer::new();
        composer.append("a", 1);
        composer.append("b", 2);
        composer.append("a", 3);
        assert_eq!(names(&composer), vec!["b", "a"]);
        assert_eq!(composer.get("a"), Some(&3));
        assert_eq!(composer.len(), 2);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut composer = HookComposer::new();
        composer.append("a", 1);
        composer.append("b", 2);
        composer.replace("a", 9).unwrap();
        assert_eq!(names(&composer), vec!["a", "b"]);
        assert_eq!(composer.get("a"), Some(&9));
    }

    #[test]
    fn test_missing_ids() {
        let mut composer: HookComposer<u8> = HookComposer::new();
        composer.append("a", 1);
        assert_eq!(
            composer.add_before("zz", "b", 2),
            Err(ConfigurationError::UnknownHook("zz".to_string()))
        );
        assert!(composer.add_after("zz", "b", 2).is_err());
        assert!(composer.replace("zz", 2).is_err());
        assert!(composer.remove("zz").is_err());
        assert!(!composer.contains("b"));
    }

    #[test]
    fn test_remove_and_reset() {
        let mut composer = HookComposer::new();
        composer.append("a", 1);
        composer.append("b", 2);
        assert_eq!(composer.remove("a"), Ok(1));
        assert_eq!(names(&composer), vec!["b"]);
        composer.reset();
        assert!(composer.is_empty());
    }

    #[test]
    fn test_apply_placements() {
        let mut composer = HookComposer::new();
        composer.apply(&Placement::Append("b".into()), 2).unwrap();
        composer.apply(&Placement::Prepend("a".into()), 1).unwrap();
        composer
            .apply(
                &Placement::AddAfter {
                    anchor: "a".into(),
                    id: "ab".into(),
                },
                5,
            )
            .unwrap();
        composer.apply(&Placement::Replace("b".into()), 7).unwrap();
        assert_eq!(names(&composer), vec!["a", "ab", "b"]);
        assert_eq!(composer.get("b"), Some(&7));
    }
}
