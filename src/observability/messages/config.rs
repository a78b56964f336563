// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for declarative class files.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A class file was read and parsed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ClassFileLoaded<'a> {
    pub path: &'a str,
    pub format: &'a str,
    pub class: &'a str,
    pub attributes: usize,
}

impl Display for ClassFileLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded class {} from {} ({}): {} attributes",
            self.class, self.path, self.format, self.attributes
        )
    }
}

impl StructuredLog for ClassFileLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            format = self.format,
            class = self.class,
            attributes = self.attributes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "class_file",
            span_name = name,
            path = self.path,
            class = self.class,
        )
    }
}

/// A class file could not be used.
///
/// # Log Level
/// `error!` - The load is aborted
pub struct ClassFileRejected<'a> {
    pub path: &'a str,
    pub reason: &'a str,
}

impl Display for ClassFileRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected class file {}: {}", self.path, self.reason)
    }
}

impl StructuredLog for ClassFileRejected<'_> {
    fn log(&self) {
        tracing::error!(path = self.path, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("class_file_rejected", span_name = name, path = self.path)
    }
}
