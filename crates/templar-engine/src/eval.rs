/*
 * eval.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The template evaluator.
//!
//! Evaluation walks the parsed node tree against a data model, writing text
//! to an output buffer. Interpolated numbers and dates go through the
//! configured format factories; plain text goes through the active output
//! format's escaping when that format auto-escapes; markup values pass
//! through as-is. Attempt/recover blocks render their body into a side
//! buffer so a failing body leaves no partial output behind.

use std::sync::Arc;

use templar_arith::Number;
use templar_model::{
    expect_bool, expect_scalar, HashModel, Model, ModelError, SimpleBool, SimpleNumber,
    SimpleScalar,
};
use templar_output::MarkupFormat;

use crate::ast::{BinOp, Expr, Node};
use crate::config::{Configuration, TemplateConfig};
use crate::error::{EngineError, EngineResult};

pub(crate) struct Evaluator<'a> {
    config: &'a Configuration,
    template_config: &'a TemplateConfig,
    data: &'a Model,
    locals: Vec<(String, Model)>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        config: &'a Configuration,
        template_config: &'a TemplateConfig,
        data: &'a Model,
    ) -> Self {
        Self {
            config,
            template_config,
            data,
            locals: Vec::new(),
        }
    }

    fn output_format(&self) -> &Arc<dyn MarkupFormat> {
        self.template_config
            .output_format
            .as_ref()
            .unwrap_or(&self.config.output_format)
    }

    fn locale(&self) -> &templar_format::Locale {
        self.template_config
            .locale
            .as_ref()
            .unwrap_or(&self.config.locale)
    }

    fn number_format(&self) -> &str {
        self.template_config
            .number_format
            .as_deref()
            .unwrap_or(&self.config.number_format)
    }

    fn date_format(&self) -> &str {
        self.template_config
            .date_format
            .as_deref()
            .unwrap_or(&self.config.date_format)
    }

    pub(crate) fn render(&mut self, nodes: &[Node], out: &mut String) -> EngineResult<()> {
        for node in nodes {
            self.render_node(node, out)?;
        }
        Ok(())
    }

    fn render_node(&mut self, node: &Node, out: &mut String) -> EngineResult<()> {
        match node {
            Node::Text(text) => {
                out.push_str(text);
                Ok(())
            }
            Node::Interpolation(expr) => {
                let value = self.eval(expr)?;
                self.render_value(expr, &value, out)
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let value = self.eval(condition)?;
                if expect_bool(value.as_ref())? {
                    self.render(then_branch, out)
                } else {
                    self.render(else_branch, out)
                }
            }
            Node::List { items, var, body } => {
                let value = self.eval(items)?;
                let iterated = self.materialize_items(items, &value)?;
                for item in iterated {
                    self.locals.push((var.clone(), item));
                    let result = self.render(body, out);
                    self.locals.pop();
                    result?;
                }
                Ok(())
            }
            Node::Attempt { body, recover } => {
                let mut attempted = String::new();
                match self.render(body, &mut attempted) {
                    Ok(()) => {
                        out.push_str(&attempted);
                        Ok(())
                    }
                    Err(error) => {
                        // Exactly one report per caught error.
                        (self.config.attempt_reporter)(&error);
                        self.render(recover, out)
                    }
                }
            }
        }
    }

    fn materialize_items(&self, expr: &Expr, value: &Model) -> EngineResult<Vec<Model>> {
        if let Some(collection) = value.as_collection() {
            return Ok(collection.iterate()?);
        }
        if let Some(sequence) = value.as_sequence() {
            return Ok((0..sequence.len()).filter_map(|i| sequence.get(i)).collect());
        }
        Err(EngineError::Model(ModelError::TypeMismatch {
            expected: "sequence or collection".to_string(),
            actual: value.type_name().to_string(),
            hint: Some(format!("\"{}\" is not listable", expr.describe())),
        }))
    }

    fn render_value(&self, expr: &Expr, value: &Model, out: &mut String) -> EngineResult<()> {
        if let Some(markup) = value.as_markup() {
            // Already escaped; bypasses auto-escaping.
            out.push_str(markup.value().markup());
            return Ok(());
        }
        if let Some(number) = value.as_number() {
            let mut format = self
                .config
                .number_factory()
                .get(self.number_format(), self.locale())?;
            let text = format.format(&number.value())?;
            return self.write_text(&text, out);
        }
        if let Some(date) = value.as_date() {
            let value = date.value();
            let mut format = self.config.date_factory().get(
                self.date_format(),
                self.locale(),
                self.config.time_zone,
                value.kind,
            )?;
            let text = format.format(&value)?;
            return self.write_text(&text, out);
        }
        let scalar = expect_scalar(value.as_ref()).map_err(|e| match e {
            ModelError::TypeMismatch {
                expected, actual, ..
            } => EngineError::Model(ModelError::TypeMismatch {
                expected,
                actual,
                hint: Some(format!("while interpolating \"{}\"", expr.describe())),
            }),
            other => EngineError::Model(other),
        })?;
        self.write_text(&scalar.as_str(), out)
    }

    fn write_text(&self, text: &str, out: &mut String) -> EngineResult<()> {
        let format = self.output_format();
        if format.auto_escaping_by_default() {
            out.push_str(&format.escape(text));
        } else {
            out.push_str(text);
        }
        Ok(())
    }

    fn lookup_var(&self, name: &str) -> EngineResult<Option<Model>> {
        for (local, value) in self.locals.iter().rev() {
            if local == name {
                return Ok(Some(value.clone()));
            }
        }
        if let Some(hash) = self.data.as_hash() {
            if let Some(value) = hash.get(name)? {
                return Ok(Some(value));
            }
        }
        Ok(self.config.shared_vars.get(name).cloned())
    }

    fn eval(&self, expr: &Expr) -> EngineResult<Model> {
        match expr {
            Expr::StringLit(text) => Ok(Arc::new(SimpleScalar(text.clone()))),
            Expr::NumberLit(literal) => {
                let number = self.config.arithmetic.parse_number(literal)?;
                Ok(Arc::new(SimpleNumber(number)))
            }
            Expr::BoolLit(value) => Ok(Arc::new(SimpleBool(*value))),
            Expr::Var(name) => {
                self.lookup_var(name)?.ok_or_else(|| EngineError::MissingValue {
                    path: name.clone(),
                })
            }
            Expr::Dot(base, key) => {
                let base_value = self.eval(base)?;
                let hash = base_value
                    .as_hash()
                    .ok_or_else(|| ModelError::TypeMismatch {
                        expected: "hash".to_string(),
                        actual: base_value.type_name().to_string(),
                        hint: Some(format!("while reading \"{}\"", expr.describe())),
                    })?;
                hash.get(key)?.ok_or_else(|| EngineError::MissingValue {
                    path: expr.describe(),
                })
            }
            Expr::Call(callee, arg_exprs) => {
                let target = self.eval(callee)?;
                let callable = target
                    .as_callable()
                    .ok_or_else(|| ModelError::TypeMismatch {
                        expected: "method".to_string(),
                        actual: target.type_name().to_string(),
                        hint: Some(format!("while calling \"{}\"", callee.describe())),
                    })?;
                let args: Vec<Model> = arg_exprs
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<EngineResult<_>>()?;
                Ok(callable.call(&args)?)
            }
            Expr::Binary(op, left, right) => self.eval_binary(*op, left, right),
            Expr::Default(base, default) => match self.eval(base) {
                Err(EngineError::MissingValue { .. }) => match default {
                    Some(default) => self.eval(default),
                    None => Ok(Arc::new(SimpleScalar(String::new()))),
                },
                other => other,
            },
        }
    }

    fn eval_binary(&self, op: BinOp, left: &Expr, right: &Expr) -> EngineResult<Model> {
        let left_value = self.eval(left)?;
        let right_value = self.eval(right)?;

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                // `+` doubles as string/markup concatenation.
                if op == BinOp::Add && left_value.as_number().is_none() {
                    return self.concat(&left_value, &right_value);
                }
                let engine = &self.config.arithmetic;
                let a = self.numeric_operand(left, &left_value)?;
                let b = self.numeric_operand(right, &right_value)?;
                let result = match op {
                    BinOp::Add => engine.add(&a, &b)?,
                    BinOp::Sub => engine.subtract(&a, &b)?,
                    BinOp::Mul => engine.multiply(&a, &b)?,
                    BinOp::Div => engine.divide(&a, &b)?,
                    _ => engine.modulo(&a, &b)?,
                };
                Ok(Arc::new(SimpleNumber(result)))
            }
            BinOp::Eq | BinOp::Ne => {
                let equal = self.values_equal(&left_value, &right_value)?;
                Ok(Arc::new(SimpleBool(if op == BinOp::Eq {
                    equal
                } else {
                    !equal
                })))
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let a = self.numeric_operand(left, &left_value)?;
                let b = self.numeric_operand(right, &right_value)?;
                let ordering = self.config.arithmetic.cmp(&a, &b);
                let result = match op {
                    BinOp::Lt => ordering.is_lt(),
                    BinOp::Le => ordering.is_le(),
                    BinOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                };
                Ok(Arc::new(SimpleBool(result)))
            }
        }
    }

    fn numeric_operand(&self, expr: &Expr, value: &Model) -> EngineResult<Number> {
        match value.as_number() {
            Some(number) => Ok(number.value()),
            None => Err(EngineError::Model(ModelError::TypeMismatch {
                expected: "number".to_string(),
                actual: value.type_name().to_string(),
                hint: Some(format!("in arithmetic on \"{}\"", expr.describe())),
            })),
        }
    }

    fn concat(&self, left: &Model, right: &Model) -> EngineResult<Model> {
        if let (Some(a), Some(b)) = (left.as_markup(), right.as_markup()) {
            let joined = a.value().concat(b.value())?;
            return Ok(Arc::new(templar_model::SimpleMarkup(joined)));
        }
        let a = expect_scalar(left.as_ref())?;
        let b = expect_scalar(right.as_ref())?;
        Ok(Arc::new(SimpleScalar(format!("{}{}", a.as_str(), b.as_str()))))
    }

    fn values_equal(&self, left: &Model, right: &Model) -> EngineResult<bool> {
        if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
            return Ok(self.config.arithmetic.cmp(&a.value(), &b.value()).is_eq());
        }
        if let (Some(a), Some(b)) = (left.as_bool(), right.as_bool()) {
            return Ok(a.value() == b.value());
        }
        let a = expect_scalar(left.as_ref())?;
        let b = expect_scalar(right.as_ref())?;
        Ok(a.as_str() == b.as_str())
    }
}
