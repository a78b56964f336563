// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Extraction of the meaningful part of a raw device answer.
//!
//! A pattern holds a single placeholder surrounded by literal text, for
//! example `VOLT {:f} V`. The placeholder decides the conversion: `{}` keeps
//! the text, `{:d}` parses an integer and `{:f}` a float.

use crate::errors::{ConfigurationError, ValidationError};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Conversion {
    Text,
    Integer,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractPattern {
    source: String,
    prefix: String,
    suffix: String,
    conversion: Conversion,
}

impl ExtractPattern {
    pub fn parse(pattern: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidExtract {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let open = pattern.find('{').ok_or_else(|| invalid("no placeholder"))?;
        let close = pattern[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| invalid("unterminated placeholder"))?;
        let suffix = &pattern[close + 1..];
        if suffix.contains('{') || suffix.contains('}') {
            return Err(invalid("only one placeholder is supported"));
        }

        let conversion = match &pattern[open + 1..close] {
            "" | ":s" => Conversion::Text,
            ":d" => Conversion::Integer,
            ":f" | ":g" => Conversion::Float,
            _ => return Err(invalid("unknown conversion")),
        };

        Ok(Self {
            source: pattern.to_string(),
            prefix: pattern[..open].to_string(),
            suffix: suffix.to_string(),
            conversion,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Apply the pattern to an answer.
    pub fn extract(&self, attribute: &str, raw: &Value) -> Result<Value, ValidationError> {
        let mismatch = || ValidationError::InvalidType {
            attribute: attribute.to_string(),
            expected: "an answer matching its extract pattern",
            value: raw.clone(),
        };

        let text = match raw {
            Value::Str(s) => s.trim(),
            _ => return Err(mismatch()),
        };
        let inner = text
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
            .ok_or_else(mismatch)?;

        match self.conversion {
            Conversion::Text => Ok(Value::Str(inner.to_string())),
            Conversion::Integer => inner
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| mismatch()),
            Conversion::Float => inner
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| mismatch()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractions() {
        let cases = vec![
            ("VOLT {:f} V", "VOLT 1.25 V", Value::Float(1.25)),
            ("CH{:d}", "CH3", Value::Int(3)),
            ("{}", "  raw  ", Value::from("raw")),
            ("MODE={}", "MODE=FAST\n", Value::from("FAST")),
        ];
        for (pattern, raw, expected) in cases {
            let parsed = ExtractPattern::parse(pattern).unwrap();
            assert_eq!(parsed.extract("a", &Value::from(raw)).unwrap(), expected, "{}", pattern);
        }
    }

    #[test]
    fn test_mismatches() {
        let pattern = ExtractPattern::parse("VOLT {:f} V").unwrap();
        assert!(pattern.extract("a", &Value::from("CURR 1.0 A")).is_err());
        assert!(pattern.extract("a", &Value::from("VOLT abc V")).is_err());
        assert!(pattern.extract("a", &Value::Int(2)).is_err());
    }

    #[test]
    fn test_invalid_patterns() {
        for pattern in ["VOLT", "{:x}", "{} {}", "{:d"] {
            assert!(ExtractPattern::parse(pattern).is_err(), "{}", pattern);
        }
    }
}
