/*
 * wrapper.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The object wrapper: host values in, template models out.
//!
//! `wrap` is deterministic and picks the smallest adapter covering every
//! capability the runtime shape supports; unknown shapes degrade to a
//! generic identity/string adapter rather than failing. Introspection
//! results are cached per class and invalidated only by an explicit
//! [`ObjectWrapper::clear_cache`]; the optional identity cache makes
//! repeated wraps of one instance hand back the same adapter.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use templar_arith::Number;

use crate::error::{ModelError, ModelResult};
use crate::introspect::{
    introspect, ClassIntrospection, ExposedMethod, IntrospectionSettings, PropertySource,
};
use crate::model::{CallableModel, HashModel, Model, ScalarModel, TemplateModel};
use crate::overload;
use crate::registry::{ClassId, ClassRegistry, HostObject, InstanceId};
use crate::simple::{GenericModel, SimpleBool, SimpleHash, SimpleNumber, SimpleScalar, SimpleSequence};

/// Wraps host values into template models.
pub struct ObjectWrapper {
    registry: Arc<ClassRegistry>,
    settings: IntrospectionSettings,
    shared_instances: bool,
    introspections: RwLock<HashMap<ClassId, Arc<ClassIntrospection>>>,
    instances: RwLock<HashMap<InstanceId, Model>>,
}

impl ObjectWrapper {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self {
            registry,
            settings: IntrospectionSettings::default(),
            shared_instances: false,
            introspections: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_settings(mut self, settings: IntrospectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Enable the identity-preserving wrap cache: wrapping the same instance
    /// repeatedly returns the same adapter.
    pub fn with_shared_instances(mut self) -> Self {
        self.shared_instances = true;
        self
    }

    /// Drop all cached introspection results and, with it, the identity
    /// wrap cache. The only invalidation path; class shape is otherwise
    /// assumed immutable for the life of the process.
    pub fn clear_cache(&self) {
        let mut introspections = self.introspections.write();
        let mut instances = self.instances.write();
        tracing::debug!(
            classes = introspections.len(),
            instances = instances.len(),
            "Clearing introspection and identity caches"
        );
        introspections.clear();
        instances.clear();
    }

    /// The memoized introspection result for a class.
    pub fn introspection(&self, class: ClassId) -> Arc<ClassIntrospection> {
        if let Some(cached) = self.introspections.read().get(&class) {
            return cached.clone();
        }
        let computed = Arc::new(introspect(&self.registry, class, &self.settings));
        self.introspections
            .write()
            .entry(class)
            .or_insert(computed)
            .clone()
    }

    /// Wrap a registered host object.
    pub fn wrap(&self, object: &Arc<HostObject>) -> Model {
        if self.shared_instances {
            if let Some(cached) = self.instances.read().get(&object.id) {
                return cached.clone();
            }
        }
        let model: Model = Arc::new(HostObjectModel {
            class_name: self.registry.class(object.class).name.clone(),
            introspection: self.introspection(object.class),
            object: object.clone(),
        });
        if self.shared_instances {
            return self
                .instances
                .write()
                .entry(object.id)
                .or_insert(model)
                .clone();
        }
        model
    }

    /// Wrap plain data. Never fails; shapes with no better adapter get the
    /// generic identity/string one.
    pub fn wrap_json(&self, value: &serde_json::Value) -> Model {
        match value {
            serde_json::Value::Null => Arc::new(GenericModel::new("null", "")),
            serde_json::Value::Bool(b) => Arc::new(SimpleBool(*b)),
            serde_json::Value::Number(n) => Arc::new(SimpleNumber(wrap_json_number(n))),
            serde_json::Value::String(s) => Arc::new(SimpleScalar(s.clone())),
            serde_json::Value::Array(items) => Arc::new(SimpleSequence::new(
                items.iter().map(|item| self.wrap_json(item)).collect(),
            )),
            serde_json::Value::Object(entries) => {
                let mut hash = SimpleHash::new();
                for (key, entry) in entries {
                    hash.insert(key.clone(), self.wrap_json(entry));
                }
                Arc::new(hash)
            }
        }
    }
}

fn wrap_json_number(n: &serde_json::Number) -> Number {
    if let Some(i) = n.as_i64() {
        return Number::narrowed_long(i);
    }
    if let Some(u) = n.as_u64() {
        // Above i64::MAX; promote.
        return Number::BigInt(u.into());
    }
    Number::Double(n.as_f64().unwrap_or(f64::NAN))
}

/// A wrapped host object: a hash of its exposed properties and methods,
/// plus a string form for diagnostics.
#[derive(Debug)]
struct HostObjectModel {
    object: Arc<HostObject>,
    class_name: String,
    introspection: Arc<ClassIntrospection>,
}

impl HostObjectModel {
    fn invoke_accessor(&self, accessor: &ExposedMethod) -> ModelResult<Model> {
        match &accessor.descriptor.body {
            Some(body) => body(&self.object, &[]),
            None => Err(ModelError::UnknownMember {
                class: self.class_name.clone(),
                member: accessor.descriptor.name.clone(),
            }),
        }
    }
}

impl TemplateModel for HostObjectModel {
    fn type_name(&self) -> &str {
        &self.class_name
    }

    fn as_hash(&self) -> Option<&dyn HashModel> {
        Some(self)
    }

    fn as_scalar(&self) -> Option<&dyn ScalarModel> {
        Some(self)
    }
}

impl ScalarModel for HostObjectModel {
    fn as_str(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.class_name)
    }
}

impl HashModel for HostObjectModel {
    fn get(&self, key: &str) -> ModelResult<Option<Model>> {
        if let Some(source) = self.introspection.properties.get(key) {
            return match source {
                PropertySource::Field { .. } => Ok(self.object.fields.get(key).cloned()),
                // A failing accessor is a real error, not a missing member.
                PropertySource::Accessor(accessor) => self.invoke_accessor(accessor).map(Some),
            };
        }
        let Some(overloads) = self.introspection.methods.get(key) else {
            return Ok(None);
        };
        Ok(Some(Arc::new(BoundMethod {
            name: key.to_string(),
            class_name: self.class_name.clone(),
            object: self.object.clone(),
            overloads: overloads.clone(),
        })))
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.introspection.properties.keys().cloned().collect();
        for name in self.introspection.methods.keys() {
            if !self.introspection.properties.contains_key(name) {
                keys.push(name.clone());
            }
        }
        keys
    }
}

/// A host method bound to its receiver, invocable from templates.
#[derive(Debug)]
struct BoundMethod {
    name: String,
    class_name: String,
    object: Arc<HostObject>,
    overloads: Vec<ExposedMethod>,
}

impl TemplateModel for BoundMethod {
    fn type_name(&self) -> &str {
        "method"
    }

    fn as_callable(&self) -> Option<&dyn CallableModel> {
        Some(self)
    }
}

impl CallableModel for BoundMethod {
    fn call(&self, args: &[Model]) -> ModelResult<Model> {
        let winner = overload::resolve(&self.name, &self.overloads, args)?;
        let coerced = overload::coerce_args(winner, args)?;
        match &winner.descriptor.body {
            Some(body) => body(&self.object, &coerced),
            None => Err(ModelError::UnknownMember {
                class: self.class_name.clone(),
                member: self.name.clone(),
            }),
        }
    }
}
