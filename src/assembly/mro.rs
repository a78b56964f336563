// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! C3 linearization of class bases.

use super::HostClass;
use crate::errors::ConfigurationError;
use std::sync::Arc;

/// Ancestors of a class with the given bases, closest first, excluding the class itself.
pub(crate) fn linearize(
    class: &str,
    bases: &[Arc<HostClass>],
) -> Result<Vec<Arc<HostClass>>, ConfigurationError> {
    let mut sequences: Vec<Vec<Arc<HostClass>>> = bases
        .iter()
        .map(|base| {
            let mut seq = vec![Arc::clone(base)];
            seq.extend(base.ancestors().iter().cloned());
            seq
        })
        .collect();
    sequences.push(bases.to_vec());

    let mut result: Vec<Arc<HostClass>> = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Ok(result);
        }

        let head = sequences
            .iter()
            .map(|seq| &seq[0])
            .find(|candidate| {
                !sequences
                    .iter()
                    .any(|seq| seq[1..].iter().any(|c| Arc::ptr_eq(c, *candidate)))
            })
            .cloned()
            .ok_or_else(|| ConfigurationError::InconsistentHierarchy(class.to_string()))?;

        for seq in sequences.iter_mut() {
            if Arc::ptr_eq(&seq[0], &head) {
                seq.remove(0);
            }
        }
        result.push(head);
    }
}
