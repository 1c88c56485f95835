/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Object model adaptation: host values become template values.
//!
//! The evaluator sees only [`Model`] trait objects with capability probes.
//! Plain data (JSON, strings, numbers) wraps directly; structured host
//! objects are described once in a [`ClassRegistry`] and adapted through the
//! [`ObjectWrapper`], which handles member visibility, property extraction,
//! overload resolution and per-class caching.

pub mod error;
pub mod introspect;
pub mod model;
pub mod overload;
pub mod registry;
pub mod simple;
pub mod wrapper;

pub use error::{ModelError, ModelResult};
pub use introspect::{
    ClassIntrospection, ExposedMethod, IntrospectionSettings, MemberPolicy, PropertySource,
    ZeroArgPolicy,
};
pub use model::{
    expect_bool, expect_number, expect_scalar, BoolModel, CallableModel, CollectionModel,
    DateModel, HashModel, MarkupModel, Model, NumberModel, ScalarModel, SequenceModel,
    TemplateModel,
};
pub use registry::{
    ClassBuilder, ClassDescriptor, ClassId, ClassRegistry, Exposure, FieldDescriptor, HostObject,
    InstanceId, MethodBody, MethodDescriptor, ParamType, WellKnownBase,
};
pub use simple::{
    GenericModel, OneShotCollection, SimpleBool, SimpleCallable, SimpleDate, SimpleHash,
    SimpleMarkup, SimpleNumber, SimpleScalar, SimpleSequence,
};
pub use wrapper::ObjectWrapper;
