// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Broad classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationKind {
    Timeout,
    ConnectionLost,
    Io,
}

impl fmt::Display for CommunicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CommunicationKind::Timeout => "timeout",
            CommunicationKind::ConnectionLost => "connection lost",
            CommunicationKind::Io => "i/o error",
        };
        f.write_str(label)
    }
}

/// Failure raised by the transport collaborator.
///
/// This is the only error family the access pipeline retries.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("communication {kind}: {message}")]
pub struct CommunicationError {
    pub kind: CommunicationKind,
    pub message: String,
}

impl CommunicationError {
    pub fn new(kind: CommunicationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CommunicationError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                CommunicationKind::Timeout
            }
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::NotConnected => CommunicationKind::ConnectionLost,
            _ => CommunicationKind::Io,
        };
        CommunicationError::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let cases = vec![
            (std::io::ErrorKind::TimedOut, CommunicationKind::Timeout),
            (std::io::ErrorKind::BrokenPipe, CommunicationKind::ConnectionLost),
            (std::io::ErrorKind::Other, CommunicationKind::Io),
        ];
        for (io_kind, expected) in cases {
            let err: CommunicationError = std::io::Error::new(io_kind, "x").into();
            assert_eq!(err.kind, expected, "io kind {:?}", io_kind);
        }
    }
}
