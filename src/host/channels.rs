// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{Host, Link};
use crate::assembly::{Available, ChannelDeclaration};
use crate::config::HostOptions;
use crate::observability::messages::host::ChannelInstantiated;
use crate::observability::messages::StructuredLog;
use crate::value::ChannelId;
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Channels of one kind, created on first access and reused afterwards.
pub(crate) struct ChannelPool {
    name: String,
    declaration: ChannelDeclaration,
    parent: Weak<Host>,
    channels: Mutex<BTreeMap<ChannelId, Arc<Host>>>,
}

impl ChannelPool {
    pub(crate) fn new(name: &str, declaration: ChannelDeclaration, parent: Weak<Host>) -> Self {
        Self {
            name: name.to_string(),
            declaration,
            parent,
            channels: Mutex::new(BTreeMap::new()),
        }
    }

    pub(crate) fn available(&self) -> &Available {
        &self.declaration.available
    }

    /// The channel with that id, instantiating it when needed.
    pub(crate) fn get(
        &self,
        id: ChannelId,
        options: &HostOptions,
        lock: &Arc<ReentrantMutex<()>>,
    ) -> Arc<Host> {
        let mut channels = self.channels.lock();
        if let Some(channel) = channels.get(&id) {
            return Arc::clone(channel);
        }

        let channel = Host::build(
            Arc::clone(&self.declaration.class),
            Link::Channel {
                parent: self.parent.clone(),
                id: id.clone(),
            },
            options.clone(),
            Arc::clone(lock),
        );
        ChannelInstantiated {
            channel: &self.name,
            class: channel.class_name(),
            id: &id,
        }
        .log();
        channels.insert(id, Arc::clone(&channel));
        channel
    }

    /// Channels created so far, ordered by id.
    pub(crate) fn instantiated(&self) -> Vec<Arc<Host>> {
        self.channels.lock().values().cloned().collect()
    }
}
