// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod class;
mod loader;
mod options;


pub use class::{
    AliasesConfig, AttributeConfig, ChannelConfig, ChecksConfig, ClassConfig, ContainerConfig,
    DiscardConfig, KindConfig, LimitsConfig, LimitsRef, MappingConfig, NamesConfig,
};
pub use loader::{load_config, ConfigFormat};
pub use options::HostOptions;
