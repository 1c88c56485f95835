/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The host-class registry.
//!
//! There is no runtime reflection to lean on, so host classes are described
//! explicitly: an arena of class descriptors carrying supertypes, fields and
//! methods, with method bodies supplied as closures. Applications register
//! their classes once at startup; instances then reference their class by
//! [`ClassId`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ModelResult;
use crate::model::Model;

/// Index of a class in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) usize);

/// Unique identity of a host object instance, for the identity wrap cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        InstanceId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Declared parameter/argument shapes, used for overload scoring and
/// coercion checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Long,
    Double,
    BigNumber,
    Bool,
    Str,
    Date,
    Markup,
    Sequence,
    Hash,
    /// Accepts anything; the worst conversion target.
    Any,
}

impl ParamType {
    pub fn name(self) -> &'static str {
        match self {
            ParamType::Int => "int",
            ParamType::Long => "long",
            ParamType::Double => "double",
            ParamType::BigNumber => "big number",
            ParamType::Bool => "boolean",
            ParamType::Str => "string",
            ParamType::Date => "date",
            ParamType::Markup => "markup_output",
            ParamType::Sequence => "sequence",
            ParamType::Hash => "hash",
            ParamType::Any => "object",
        }
    }
}

/// Whether a member carries an explicit exposure annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exposure {
    /// No annotation; the member policy decides.
    #[default]
    Unspecified,
    /// Explicitly exposed regardless of policy.
    Expose,
    /// Explicitly hidden regardless of policy.
    Hide,
}

/// The body of a host method.
pub type MethodBody = Arc<dyn Fn(&HostObject, &[Model]) -> ModelResult<Model> + Send + Sync>;

/// One declared method of a host class.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ParamType>,
    /// Trailing parameter accepts zero or more arguments.
    pub varargs: bool,
    /// Compiler-synthesized (bridge) declaration rather than source code.
    pub synthetic: bool,
    /// For synthetic bridges, the method this one forwards to, as an index
    /// into the declaring class's method list. Metadata lookups follow this
    /// chain to the real declaration.
    pub bridge_of: Option<usize>,
    /// Declared abstract (interface accessor without a body).
    pub is_abstract: bool,
    pub exposure: Exposure,
    pub body: Option<MethodBody>,
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("varargs", &self.varargs)
            .field("synthetic", &self.synthetic)
            .field("is_abstract", &self.is_abstract)
            .finish_non_exhaustive()
    }
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, params: Vec<ParamType>, body: MethodBody) -> Self {
        Self {
            name: name.into(),
            params,
            varargs: false,
            synthetic: false,
            bridge_of: None,
            is_abstract: false,
            exposure: Exposure::Unspecified,
            body: Some(body),
        }
    }

    /// An abstract declaration, as found on interfaces.
    pub fn abstract_decl(name: impl Into<String>, params: Vec<ParamType>) -> Self {
        Self {
            name: name.into(),
            params,
            varargs: false,
            synthetic: false,
            bridge_of: None,
            is_abstract: true,
            exposure: Exposure::Unspecified,
            body: None,
        }
    }

    pub fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    pub fn bridge_to(mut self, real: usize) -> Self {
        self.synthetic = true;
        self.bridge_of = Some(real);
        self
    }

    pub fn exposure(mut self, exposure: Exposure) -> Self {
        self.exposure = exposure;
        self
    }
}

/// A declared field of a host class.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub exposure: Exposure,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exposure: Exposure::Unspecified,
        }
    }
}

/// Well-known base classes the Safe member policy treats specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownBase {
    /// The "everything inherits this" base with wait/notify-style members.
    GenericObject,
    /// The thread-like base whose lifecycle members are suppressed.
    Thread,
}

/// A registered host class.
#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: String,
    pub supertypes: Vec<ClassId>,
    pub is_interface: bool,
    /// Accessors of this class are unambiguously data (record semantics).
    pub is_record_like: bool,
    /// Declared by the platform/trusted code, as opposed to user code. The
    /// Safe policy's denylist only binds trusted declarations.
    pub trusted_origin: bool,
    pub well_known: Option<WellKnownBase>,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

/// Builder for [`ClassDescriptor`].
pub struct ClassBuilder {
    descriptor: ClassDescriptor,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: ClassDescriptor {
                name: name.into(),
                supertypes: Vec::new(),
                is_interface: false,
                is_record_like: false,
                trusted_origin: false,
                well_known: None,
                fields: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    pub fn extends(mut self, superclass: ClassId) -> Self {
        self.descriptor.supertypes.push(superclass);
        self
    }

    pub fn interface(mut self) -> Self {
        self.descriptor.is_interface = true;
        self
    }

    pub fn record_like(mut self) -> Self {
        self.descriptor.is_record_like = true;
        self
    }

    pub fn trusted(mut self) -> Self {
        self.descriptor.trusted_origin = true;
        self
    }

    pub fn well_known(mut self, base: WellKnownBase) -> Self {
        self.descriptor.well_known = Some(base);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.descriptor.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.descriptor.methods.push(method);
        self
    }

    pub fn register(self, registry: &mut ClassRegistry) -> ClassId {
        registry.register(self.descriptor)
    }
}

/// Arena of host class descriptors.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<ClassDescriptor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ClassDescriptor) -> ClassId {
        let id = ClassId(self.classes.len());
        self.classes.push(descriptor);
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.0]
    }

    /// The supertype closure of a class: the class itself first, then its
    /// supertypes breadth-first, each visited once. Most-derived
    /// declarations therefore come first in member walks.
    pub fn supertype_closure(&self, id: ClassId) -> Vec<ClassId> {
        let mut closure = vec![id];
        let mut cursor = 0;
        while cursor < closure.len() {
            let current = closure[cursor];
            for &supertype in &self.class(current).supertypes {
                if !closure.contains(&supertype) {
                    closure.push(supertype);
                }
            }
            cursor += 1;
        }
        closure
    }
}

/// An instance of a registered class.
#[derive(Debug)]
pub struct HostObject {
    pub class: ClassId,
    pub id: InstanceId,
    pub fields: IndexMap<String, Model>,
}

impl HostObject {
    pub fn new(class: ClassId, fields: IndexMap<String, Model>) -> Arc<Self> {
        Arc::new(Self {
            class,
            id: InstanceId::next(),
            fields,
        })
    }
}
