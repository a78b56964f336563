// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::ClassConfig;
use crate::errors::ConfigurationError;
use crate::observability::messages::config::{ClassFileLoaded, ClassFileRejected};
use crate::observability::messages::StructuredLog;
use std::fs;
use std::path::Path;

/// Serialization format of a class file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    pub fn parse(&self, content: &str) -> Result<ClassConfig, String> {
        match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Load a class file.
///
/// `.yaml`/`.yml`, `.toml` and `.json` files are supported.
///
/// # Arguments
/// * `path` - Path to the class file
///
/// # Returns
/// * `Ok(ClassConfig)` - Parsed class definition
/// * `Err(ConfigurationError::Io)` - The file could not be read
/// * `Err(ConfigurationError::Parse)` - Unknown extension or malformed content
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClassConfig, ConfigurationError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let result = read(path, &display);
    match &result {
        Ok((config, format)) => ClassFileLoaded {
            path: &display,
            format: format.as_str(),
            class: &config.name,
            attributes: config.attribute_count(),
        }
        .log(),
        Err(err) => ClassFileRejected {
            path: &display,
            reason: &err.to_string(),
        }
        .log(),
    }
    result.map(|(config, _)| config)
}

fn read(path: &Path, display: &str) -> Result<(ClassConfig, ConfigFormat), ConfigurationError> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigurationError::Parse {
        path: display.to_string(),
        reason: "unsupported extension, expected yaml, yml, toml or json".to_string(),
    })?;
    let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
        path: display.to_string(),
        reason: e.to_string(),
    })?;
    let config = format
        .parse(&content)
        .map_err(|reason| ConfigurationError::Parse {
            path: display.to_string(),
            reason,
        })?;
    Ok((config, format))
}
