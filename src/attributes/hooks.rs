// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hook types for the six access stages and the customization records.

use crate::attributes::Attribute;
use crate::errors::Result;
use crate::host::Host;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// One of the six stages of the access pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    PreRead,
    Read,
    PostRead,
    PreWrite,
    Write,
    PostWrite,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Stage; 6] = [
        Stage::PreRead,
        Stage::Read,
        Stage::PostRead,
        Stage::PreWrite,
        Stage::Write,
        Stage::PostWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PreRead => "pre_read",
            Stage::Read => "read",
            Stage::PostRead => "post_read",
            Stage::PreWrite => "pre_write",
            Stage::Write => "write",
            Stage::PostWrite => "post_write",
        }
    }

    /// Method name prefix customizing this stage on a host class.
    pub fn prefix(&self) -> &'static str {
        match self {
            Stage::PreRead => "_pre_read_",
            Stage::Read => "_read_",
            Stage::PostRead => "_post_read_",
            Stage::PreWrite => "_pre_write_",
            Stage::Write => "_write_",
            Stage::PostWrite => "_post_write_",
        }
    }

    /// Split a prefixed method name into its stage and target attribute.
    pub fn from_method_name(name: &str) -> Option<(Stage, &str)> {
        Stage::ALL.iter().find_map(|stage| {
            name.strip_prefix(stage.prefix())
                .filter(|target| !target.is_empty())
                .map(|target| (*stage, target))
        })
    }

    /// Read and write are single hooks, the other stages accept a composer.
    pub fn is_composable(&self) -> bool {
        !matches!(self, Stage::Read | Stage::Write)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type PreReadHook = Arc<dyn Fn(&Host, &Attribute) -> Result<()> + Send + Sync>;
pub type ReadHook = Arc<dyn Fn(&Host, &Attribute) -> Result<Value> + Send + Sync>;
/// Shared shape of the post-read, pre-write and write stages.
pub type ValueHook = Arc<dyn Fn(&Host, &Attribute, Value) -> Result<Value> + Send + Sync>;
/// Receives the user value, the transformed value and the write response.
pub type PostWriteHook =
    Arc<dyn Fn(&Host, &Attribute, &Value, &Value, &Value) -> Result<()> + Send + Sync>;

/// A hook bound to the stage it customizes.
#[derive(Clone)]
pub enum Hook {
    PreRead(PreReadHook),
    Read(ReadHook),
    PostRead(ValueHook),
    PreWrite(ValueHook),
    Write(ValueHook),
    PostWrite(PostWriteHook),
}

impl Hook {
    pub fn pre_read<F>(f: F) -> Self
    where
        F: Fn(&Host, &Attribute) -> Result<()> + Send + Sync + 'static,
    {
        Hook::PreRead(Arc::new(f))
    }

    pub fn read<F>(f: F) -> Self
    where
        F: Fn(&Host, &Attribute) -> Result<Value> + Send + Sync + 'static,
    {
        Hook::Read(Arc::new(f))
    }

    pub fn post_read<F>(f: F) -> Self
    where
        F: Fn(&Host, &Attribute, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Hook::PostRead(Arc::new(f))
    }

    pub fn pre_write<F>(f: F) -> Self
    where
        F: Fn(&Host, &Attribute, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Hook::PreWrite(Arc::new(f))
    }

    pub fn write<F>(f: F) -> Self
    where
        F: Fn(&Host, &Attribute, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Hook::Write(Arc::new(f))
    }

    pub fn post_write<F>(f: F) -> Self
    where
        F: Fn(&Host, &Attribute, &Value, &Value, &Value) -> Result<()> + Send + Sync + 'static,
    {
        Hook::PostWrite(Arc::new(f))
    }

    pub fn stage(&self) -> Stage {
        match self {
            Hook::PreRead(_) => Stage::PreRead,
            Hook::Read(_) => Stage::Read,
            Hook::PostRead(_) => Stage::PostRead,
            Hook::PreWrite(_) => Stage::PreWrite,
            Hook::Write(_) => Stage::Write,
            Hook::PostWrite(_) => Stage::PostWrite,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({})", self.stage())
    }
}

/// Where a hook lands in a stage composer.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Append(String),
    Prepend(String),
    AddBefore { anchor: String, id: String },
    AddAfter { anchor: String, id: String },
    Replace(String),
}

impl Placement {
    /// Id under which the hook is stored.
    pub fn id(&self) -> &str {
        match self {
            Placement::Append(id) | Placement::Prepend(id) | Placement::Replace(id) => id,
            Placement::AddBefore { id, .. } | Placement::AddAfter { id, .. } => id,
        }
    }
}

/// A single modification of an attribute pipeline.
///
/// Non-internal customizations are recorded on the attribute so they can be
/// replayed when the attribute is rebuilt from an altered declaration.
#[derive(Debug, Clone)]
pub enum Customization {
    /// The stage becomes this single hook.
    Replace(Hook),
    /// The hook is placed in the stage composer (read/write are replaced).
    Compose { hook: Hook, placement: Placement },
    /// Remove a hook from a stage composer.
    Remove { stage: Stage, id: String },
}

impl Customization {
    pub fn stage(&self) -> Stage {
        match self {
            Customization::Replace(hook) | Customization::Compose { hook, .. } => hook.stage(),
            Customization::Remove { stage, .. } => *stage,
        }
    }

    /// Id of the hook concerned, `-` for whole stage replacements.
    pub fn hook_id(&self) -> &str {
        match self {
            Customization::Replace(_) => "-",
            Customization::Compose { placement, .. } => placement.id(),
            Customization::Remove { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_name_prefixes() {
        let cases = vec![
            ("_pre_read_voltage", Some((Stage::PreRead, "voltage"))),
            ("_read_voltage", Some((Stage::Read, "voltage"))),
            ("_post_read_output_enabled", Some((Stage::PostRead, "output_enabled"))),
            ("_pre_write_mode", Some((Stage::PreWrite, "mode"))),
            ("_write_mode", Some((Stage::Write, "mode"))),
            ("_post_write_mode", Some((Stage::PostWrite, "mode"))),
            ("_post_write_", None),
            ("voltage", None),
            ("_limits_range", None),
        ];
        for (name, expected) in cases {
            assert_eq!(Stage::from_method_name(name), expected, "{}", name);
        }
    }

    #[test]
    fn test_hook_stage() {
        let hook = Hook::post_read(|_, _, v| Ok(v));
        assert_eq!(hook.stage(), Stage::PostRead);
        let custom = Customization::Compose {
            hook,
            placement: Placement::AddAfter {
                anchor: "cast".into(),
                id: "scale".into(),
            },
        };
        assert_eq!(custom.stage(), Stage::PostRead);
        assert_eq!(custom.hook_id(), "scale");
    }
}
