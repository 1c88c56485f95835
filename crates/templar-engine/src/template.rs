/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A parsed template and its entry point.

use templar_model::Model;

use crate::ast::{self, Node};
use crate::config::{Configuration, TemplateConfig};
use crate::error::EngineResult;
use crate::eval::Evaluator;

/// A parsed template bound to its effective per-template configuration.
#[derive(Debug)]
pub struct Template {
    name: String,
    source_name: String,
    nodes: Vec<Node>,
    config: TemplateConfig,
}

impl Template {
    /// Parse `content` under the given per-template configuration.
    ///
    /// `name` is the normalized name the template was requested as;
    /// `source_name` is the candidate name it was actually found under
    /// (they differ when a locale-suffixed candidate matched).
    pub fn parse(
        name: impl Into<String>,
        source_name: impl Into<String>,
        content: &str,
        config: TemplateConfig,
    ) -> EngineResult<Template> {
        let name = name.into();
        let nodes = ast::parse(&name, content)?;
        Ok(Template {
            name,
            source_name: source_name.into(),
            nodes,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The candidate name the source was found under.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Render this template against `data`, appending to `out`.
    pub fn process(
        &self,
        configuration: &Configuration,
        data: &Model,
        out: &mut String,
    ) -> EngineResult<()> {
        Evaluator::new(configuration, &self.config, data).render(&self.nodes, out)
    }
}
