/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The template AST and its parser.
//!
//! The reference syntax is a deliberately small directive set: text,
//! `${expr}` interpolations, `<#if>/<#else>`, `<#list xs as x>` and
//! `<#attempt>/<#recover>`. Expressions cover variable paths, literals,
//! arithmetic, comparisons, method calls and the `!default` operator.
//! Numeric literals stay textual in the AST; the configured arithmetic
//! engine decides their representation at evaluation time.
//!
//! Inside a directive tag a bare `>` always closes the tag, so greater-than
//! comparisons there need `gt`/`gte` or parentheses; interpolations have no
//! such ambiguity.

use std::fmt;

use crate::error::{EngineError, EngineResult};

/// One node of a parsed template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Interpolation(Expr),
    If {
        condition: Expr,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    List {
        items: Expr,
        var: String,
        body: Vec<Node>,
    },
    Attempt {
        body: Vec<Node>,
        recover: Vec<Node>,
    },
}

/// Comparison and arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    StringLit(String),
    NumberLit(String),
    BoolLit(bool),
    Var(String),
    Dot(Box<Expr>, String),
    Call(Box<Expr>, Vec<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// `base!fallback`; a missing `fallback` means the empty string.
    Default(Box<Expr>, Option<Box<Expr>>),
}

impl Expr {
    /// A short, path-like description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Expr::StringLit(s) => format!("{s:?}"),
            Expr::NumberLit(n) => n.clone(),
            Expr::BoolLit(b) => b.to_string(),
            Expr::Var(name) => name.clone(),
            Expr::Dot(base, key) => format!("{}.{key}", base.describe()),
            Expr::Call(callee, _) => format!("{}(...)", callee.describe()),
            Expr::Binary(_, left, _) => left.describe(),
            Expr::Default(base, _) => base.describe(),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        };
        f.write_str(text)
    }
}

/// Parse a template body.
pub fn parse(template: &str, source: &str) -> EngineResult<Vec<Node>> {
    let mut parser = Parser {
        template,
        src: source,
        pos: 0,
        line: 1,
        in_tag: false,
        parens: 0,
    };
    let (nodes, terminator) = parser.parse_nodes()?;
    if let Some(tag) = terminator {
        return Err(parser.error(format!("unexpected closing tag \"{tag}\"")));
    }
    Ok(nodes)
}

struct Parser<'a> {
    template: &'a str,
    src: &'a str,
    pos: usize,
    line: usize,
    in_tag: bool,
    parens: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> EngineError {
        EngineError::Parse {
            template: self.template.to_string(),
            line: self.line,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn advance(&mut self, len: usize) {
        let taken = &self.src[self.pos..self.pos + len];
        self.line += taken.matches('\n').count();
        self.pos += len;
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.advance(prefix.len());
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let len = self.rest().len() - self.rest().trim_start().len();
        self.advance(len);
    }

    /// Parse nodes up to end-of-input or a block terminator tag
    /// (`<#else>`, `<#recover>`, `</#if>`, `</#list>`, `</#attempt>`),
    /// which is consumed and returned.
    fn parse_nodes(&mut self) -> EngineResult<(Vec<Node>, Option<String>)> {
        const TERMINATORS: [&str; 5] = ["else", "recover", "/if", "/list", "/attempt"];
        let mut nodes = Vec::new();
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Ok((nodes, None));
            }
            if rest.starts_with("${") {
                self.advance(2);
                let expr = self.parse_expr()?;
                self.skip_ws();
                if !self.eat("}") {
                    return Err(self.error("expected \"}\" after interpolation"));
                }
                nodes.push(Node::Interpolation(expr));
                continue;
            }
            if rest.starts_with("<#") || rest.starts_with("</#") {
                let closing = rest.starts_with("</#");
                let tag_start = if closing { 3 } else { 2 };
                let body = &rest[tag_start..];
                let name_len = body
                    .find(|c: char| !c.is_ascii_alphanumeric())
                    .unwrap_or(body.len());
                let tag = format!("{}{}", if closing { "/" } else { "" }, &body[..name_len]);
                if TERMINATORS.contains(&tag.as_str()) {
                    self.advance(tag_start + name_len);
                    self.skip_ws();
                    if !self.eat(">") {
                        return Err(self.error(format!("expected \">\" to close \"{tag}\"")));
                    }
                    return Ok((nodes, Some(tag)));
                }
                if !closing {
                    nodes.push(self.parse_directive(&body[..name_len])?);
                    continue;
                }
                return Err(self.error(format!("unknown closing tag \"{tag}\"")));
            }
            // Text runs to the next special sequence.
            let end = ["${", "<#", "</#"]
                .iter()
                .filter_map(|pat| rest.find(pat))
                .min()
                .unwrap_or(rest.len());
            if end == 0 {
                // A lone "<" that happened to prefix-match; take one char.
                nodes.push(Node::Text(rest[..1].to_string()));
                self.advance(1);
                continue;
            }
            nodes.push(Node::Text(rest[..end].to_string()));
            self.advance(end);
        }
    }

    fn parse_directive(&mut self, name: &str) -> EngineResult<Node> {
        match name {
            "if" => {
                self.advance(2 + name.len());
                let condition = self.parse_tag_expr()?;
                self.skip_ws();
                if !self.eat(">") {
                    return Err(self.error("expected \">\" after <#if condition"));
                }
                let (then_branch, terminator) = self.parse_nodes()?;
                let (else_branch, terminator) = match terminator.as_deref() {
                    Some("else") => {
                        let (nodes, terminator) = self.parse_nodes()?;
                        (nodes, terminator)
                    }
                    other => (Vec::new(), other.map(str::to_string)),
                };
                if terminator.as_deref() != Some("/if") {
                    return Err(self.error("<#if> is not closed by </#if>"));
                }
                Ok(Node::If {
                    condition,
                    then_branch,
                    else_branch,
                })
            }
            "list" => {
                self.advance(2 + name.len());
                let items = self.parse_tag_expr()?;
                self.skip_ws();
                if self.parse_ident()? != "as" {
                    return Err(self.error("expected \"as\" in <#list>"));
                }
                self.skip_ws();
                let var = self.parse_ident()?;
                self.skip_ws();
                if !self.eat(">") {
                    return Err(self.error("expected \">\" after <#list ... as var"));
                }
                let (body, terminator) = self.parse_nodes()?;
                if terminator.as_deref() != Some("/list") {
                    return Err(self.error("<#list> is not closed by </#list>"));
                }
                Ok(Node::List { items, var, body })
            }
            "attempt" => {
                self.advance(2 + name.len());
                self.skip_ws();
                if !self.eat(">") {
                    return Err(self.error("expected \">\" after <#attempt"));
                }
                let (body, terminator) = self.parse_nodes()?;
                if terminator.as_deref() != Some("recover") {
                    return Err(self.error("<#attempt> has no <#recover> branch"));
                }
                let (recover, terminator) = self.parse_nodes()?;
                if terminator.as_deref() != Some("/attempt") {
                    return Err(self.error("<#attempt> is not closed by </#attempt>"));
                }
                Ok(Node::Attempt { body, recover })
            }
            other => Err(self.error(format!("unknown directive \"<#{other}>\""))),
        }
    }

    fn parse_ident(&mut self) -> EngineResult<String> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error("expected an identifier"));
        }
        let ident = rest[..len].to_string();
        self.advance(len);
        Ok(ident)
    }

    /// Parse a directive parameter expression, where a bare `>` at paren
    /// depth zero closes the tag.
    fn parse_tag_expr(&mut self) -> EngineResult<Expr> {
        self.in_tag = true;
        let result = self.parse_expr();
        self.in_tag = false;
        result
    }

    fn parse_expr(&mut self) -> EngineResult<Expr> {
        let left = self.parse_additive()?;
        self.skip_ws();
        let angle_gt_allowed = !self.in_tag || self.parens > 0;
        let op = if self.eat("==") {
            BinOp::Eq
        } else if self.eat("!=") {
            BinOp::Ne
        } else if self.eat("<=") || self.eat("lte ") {
            BinOp::Le
        } else if self.eat("gte ") || (angle_gt_allowed && self.eat(">=")) {
            BinOp::Ge
        } else if self.rest().starts_with('<') && !self.rest().starts_with("<#") {
            self.advance(1);
            BinOp::Lt
        } else if self.eat("gt ") {
            BinOp::Gt
        } else if self.eat("lt ") {
            BinOp::Lt
        } else if angle_gt_allowed && self.rest().starts_with('>') {
            self.advance(1);
            BinOp::Gt
        } else {
            return Ok(left);
        };
        let right = self.parse_additive()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn parse_additive(&mut self) -> EngineResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            self.skip_ws();
            let op = if self.eat("+") {
                BinOp::Add
            } else if self.eat("-") {
                BinOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_multiplicative(&mut self) -> EngineResult<Expr> {
        let mut left = self.parse_postfix()?;
        loop {
            self.skip_ws();
            let op = if self.eat("*") {
                BinOp::Mul
            } else if self.eat("%") {
                BinOp::Mod
            } else if self.rest().starts_with('/') && !self.rest().starts_with("/#") {
                self.advance(1);
                BinOp::Div
            } else {
                return Ok(left);
            };
            let right = self.parse_postfix()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_postfix(&mut self) -> EngineResult<Expr> {
        self.skip_ws();
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(".") {
                let key = self.parse_ident()?;
                expr = Expr::Dot(Box::new(expr), key);
            } else if self.eat("(") {
                self.parens += 1;
                let args = self.parse_args();
                self.parens -= 1;
                expr = Expr::Call(Box::new(expr), args?);
            } else if self.rest().starts_with('!') && !self.rest().starts_with("!=") {
                self.advance(1);
                let default = if self.default_follows() {
                    Some(Box::new(self.parse_postfix()?))
                } else {
                    None
                };
                expr = Expr::Default(Box::new(expr), default);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_args(&mut self) -> EngineResult<Vec<Expr>> {
        let mut args = Vec::new();
        self.skip_ws();
        if self.eat(")") {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            self.skip_ws();
            if self.eat(",") {
                continue;
            }
            if self.eat(")") {
                return Ok(args);
            }
            return Err(self.error("expected \",\" or \")\" in argument list"));
        }
    }

    /// After `!`, a default operand is present only if the next character
    /// can start a primary expression.
    fn default_follows(&self) -> bool {
        self.rest().starts_with(|c: char| {
            c.is_ascii_alphanumeric() || c == '_' || c == '"' || c == '\'' || c == '(' || c == '-'
        })
    }

    fn parse_primary(&mut self) -> EngineResult<Expr> {
        self.skip_ws();
        let rest = self.rest();
        let Some(first) = rest.chars().next() else {
            return Err(self.error("unexpected end of expression"));
        };
        match first {
            '(' => {
                self.advance(1);
                self.parens += 1;
                let expr = self.parse_expr();
                self.parens -= 1;
                let expr = expr?;
                self.skip_ws();
                if !self.eat(")") {
                    return Err(self.error("expected \")\""));
                }
                Ok(expr)
            }
            '"' | '\'' => self.parse_string(first),
            '-' => {
                self.advance(1);
                let operand = self.parse_postfix()?;
                Ok(Expr::Binary(
                    BinOp::Sub,
                    Box::new(Expr::NumberLit("0".to_string())),
                    Box::new(operand),
                ))
            }
            c if c.is_ascii_digit() => {
                let len = rest
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .unwrap_or(rest.len());
                let literal = rest[..len].to_string();
                self.advance(len);
                Ok(Expr::NumberLit(literal))
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self.parse_ident()?;
                match ident.as_str() {
                    "true" => Ok(Expr::BoolLit(true)),
                    "false" => Ok(Expr::BoolLit(false)),
                    _ => Ok(Expr::Var(ident)),
                }
            }
            other => Err(self.error(format!("unexpected character {other:?} in expression"))),
        }
    }

    fn parse_string(&mut self, quote: char) -> EngineResult<Expr> {
        self.advance(1);
        let mut value = String::new();
        let mut chars = self.rest().char_indices();
        for (index, c) in chars.by_ref() {
            if c == quote {
                self.advance(index + 1);
                return Ok(Expr::StringLit(value));
            }
            value.push(c);
        }
        Err(self.error("unterminated string literal"))
    }
}
