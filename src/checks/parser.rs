// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Recursive descent parser for check assertions.
//!
//! ```text
//! or      := and ("or" and)*
//! and     := not ("and" not)*
//! not     := "not" not | compare
//! compare := sum (cmp_op sum)?
//! sum     := term (("+" | "-") term)*
//! term    := unary (("*" | "/" | "%") unary)*
//! unary   := "-" unary | atom
//! atom    := number | string | True | False | None | {name} | value | "(" or ")"
//! ```

use super::lexer::Token;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Field(String),
    Candidate,
    Negate(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub(crate) fn uses_candidate(&self) -> bool {
        match self {
            Expr::Candidate => true,
            Expr::Literal(_) | Expr::Field(_) => false,
            Expr::Negate(e) | Expr::Not(e) => e.uses_candidate(),
            Expr::And(a, b) | Expr::Or(a, b) | Expr::Binary(_, a, b) => {
                a.uses_candidate() || b.uses_candidate()
            }
        }
    }
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, String> {
        if self.tokens.is_empty() {
            return Err("empty assertion".to_string());
        }
        let expr = self.or()?;
        match self.peek() {
            None => Ok(expr),
            Some(t) => Err(format!("unexpected trailing token {:?}", t)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut left = self.not()?;
        while self.eat(&Token::And) {
            let right = self.not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.compare()
    }

    fn compare(&mut self) -> Result<Expr, String> {
        let left = self.sum()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            Some(Token::Is) => {
                self.pos += 1;
                let op = if self.eat(&Token::Not) {
                    BinaryOp::Ne
                } else {
                    BinaryOp::Eq
                };
                let right = self.sum()?;
                return Ok(Expr::Binary(op, Box::new(left), Box::new(right)));
            }
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.sum()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn sum(&mut self) -> Result<Expr, String> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Negate(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::Float(f))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::None) => Ok(Expr::Literal(Value::None)),
            Some(Token::Field(name)) => Ok(Expr::Field(name)),
            Some(Token::Candidate) => Ok(Expr::Candidate),
            Some(Token::LParen) => {
                let inner = self.or()?;
                if !self.eat(&Token::RParen) {
                    return Err("missing ')'".to_string());
                }
                Ok(inner)
            }
            Some(t) => Err(format!("unexpected token {:?}", t)),
            None => Err("unexpected end of assertion".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::lexer::tokenize;

    fn parse(src: &str) -> Result<Expr, String> {
        Parser::new(tokenize(src)?).parse()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3 == 7").unwrap();
        match expr {
            Expr::Binary(BinaryOp::Eq, left, _) => match *left {
                Expr::Binary(BinaryOp::Add, _, right) => {
                    assert!(matches!(*right, Expr::Binary(BinaryOp::Mul, _, _)))
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_is_not() {
        let expr = parse("{feat} is not None").unwrap();
        assert!(matches!(expr, Expr::Binary(BinaryOp::Ne, _, _)));
    }

    #[test]
    fn test_candidate_detection() {
        assert!(parse("value > {aux}").unwrap().uses_candidate());
        assert!(!parse("not ({aux} == 1)").unwrap().uses_candidate());
    }

    #[test]
    fn test_syntax_errors() {
        for src in ["", "1 +", "(1 == 1", "1 == 1 2"] {
            assert!(parse(src).is_err(), "'{}' should not parse", src);
        }
    }
}
