// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Assertions evaluated before reading or writing an attribute.
//!
//! A check source is a `;` separated list of boolean expressions. Each
//! expression may reference other attributes of the host as `{name}` (dotted
//! names reach sub-containers) and, for write checks, the candidate value as
//! `value`:
//!
//! ```text
//! {output_enabled} == False; value <= {max_voltage} * 2
//! ```
//!
//! Expressions are parsed once, when the attribute is declared, and compiled
//! into closures evaluated against a [`CheckEnv`].

mod lexer;
mod parser;

use crate::errors::{ConfigurationError, Error, Result, ValidationError};
use crate::value::Value;
use anyhow::anyhow;
use parser::{BinaryOp, Expr, Parser};
use std::fmt;
use std::sync::Arc;

/// What an assertion can observe while being evaluated.
pub trait CheckEnv {
    /// Current value of a host attribute (may go through the cache).
    fn attribute(&self, name: &str) -> Result<Value>;

    /// The value about to be written, if any.
    fn candidate(&self) -> Option<&Value>;
}

type Compiled = Arc<dyn Fn(&dyn CheckEnv) -> Result<Value> + Send + Sync>;

#[derive(Clone)]
struct Assertion {
    source: String,
    eval: Compiled,
}

/// A compiled set of assertions.
#[derive(Clone)]
pub struct Checker {
    assertions: Vec<Assertion>,
}

impl Checker {
    /// Parse a `;` separated source.
    ///
    /// `allow_value` is false for read checks, where no candidate exists.
    pub fn parse(source: &str, allow_value: bool) -> Result<Self, ConfigurationError> {
        let mut assertions = Vec::new();
        for part in source.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let invalid = |reason: String| ConfigurationError::InvalidCheck {
                expression: part.to_string(),
                reason,
            };
            let tokens = lexer::tokenize(part).map_err(invalid)?;
            let expr = Parser::new(tokens).parse().map_err(invalid)?;
            if !allow_value && expr.uses_candidate() {
                return Err(invalid("'value' is only available in write checks".to_string()));
            }
            assertions.push(Assertion {
                source: part.to_string(),
                eval: compile(expr),
            });
        }
        Ok(Self { assertions })
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// Source text of every assertion, in evaluation order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.assertions.iter().map(|a| a.source.as_str())
    }

    /// Evaluate every assertion, failing on the first false one.
    pub fn check(&self, attribute: &str, env: &dyn CheckEnv) -> Result<()> {
        for assertion in &self.assertions {
            if !(assertion.eval)(env)?.truthy() {
                return Err(ValidationError::CheckFailed {
                    attribute: attribute.to_string(),
                    assertion: assertion.source.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.sources()).finish()
    }
}

fn compile(expr: Expr) -> Compiled {
    match expr {
        Expr::Literal(value) => compiled(move |_| Ok(value.clone())),
        Expr::Field(name) => compiled(move |env| env.attribute(&name)),
        Expr::Candidate => compiled(|env| Ok(env.candidate().cloned().unwrap_or_default())),
        Expr::Negate(inner) => {
            let inner = compile(*inner);
            compiled(move |env| negate(inner(env)?))
        }
        Expr::Not(inner) => {
            let inner = compile(*inner);
            compiled(move |env| Ok(Value::Bool(!inner(env)?.truthy())))
        }
        Expr::And(left, right) => {
            let (left, right) = (compile(*left), compile(*right));
            compiled(move |env| Ok(Value::Bool(left(env)?.truthy() && right(env)?.truthy())))
        }
        Expr::Or(left, right) => {
            let (left, right) = (compile(*left), compile(*right));
            compiled(move |env| Ok(Value::Bool(left(env)?.truthy() || right(env)?.truthy())))
        }
        Expr::Binary(op, left, right) => {
            let (left, right) = (compile(*left), compile(*right));
            compiled(move |env| binary(op, &left(env)?, &right(env)?))
        }
    }
}

fn compiled<F>(eval: F) -> Compiled
where
    F: Fn(&dyn CheckEnv) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(eval)
}

fn negate(value: Value) -> Result<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(-i)),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(Error::Hook(anyhow!("cannot negate {}", other))),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(_) | Value::Float(_) | Value::Quantity(_) => value.as_f64(),
        _ => None,
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let mismatch = || {
        Error::Hook(anyhow!(
            "unsupported operand types for {:?}: {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))
    };

    match op {
        BinaryOp::Eq => return Ok(Value::Bool(equals(left, right))),
        BinaryOp::Ne => return Ok(Value::Bool(!equals(left, right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (left, right) {
                (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
                _ => match (numeric(left), numeric(right)) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => return Err(mismatch()),
                },
            };
            let ordering = ordering.ok_or_else(mismatch)?;
            let result = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    if let (BinaryOp::Add, Value::Str(a), Value::Str(b)) = (op, left, right) {
        return Ok(Value::Str(format!("{}{}", a, b)));
    }

    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Rem if b != 0 => Some(a.rem_euclid(b)),
            BinaryOp::Div if b != 0 => return Ok(Value::Float(a as f64 / b as f64)),
            _ => None,
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| Error::Hook(anyhow!("arithmetic error in {} {:?} {}", a, op, b)));
    }

    let (a, b) = match (numeric(left), numeric(right)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(mismatch()),
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b != 0.0 => a / b,
        BinaryOp::Rem if b != 0.0 => a.rem_euclid(b),
        _ => return Err(Error::Hook(anyhow!("division by zero"))),
    };
    Ok(Value::Float(result))
}

fn equals(left: &Value, right: &Value) -> bool {
    match (numeric(left), numeric(right)) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}
