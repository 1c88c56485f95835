/*
 * introspect.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Class introspection: which members a template may see, and how.
//!
//! Introspection walks the full supertype closure of a class, because a
//! member can be declared abstract in an interface, implemented in a base
//! class and overridden in a subclass. The result (property table plus
//! overload tables) is a pure function of the class and the settings; the
//! wrapper memoizes it per class.

use indexmap::IndexMap;

use crate::registry::{ClassDescriptor, ClassId, ClassRegistry, Exposure, MethodDescriptor};

/// How members are admitted when they carry no explicit exposure annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberPolicy {
    /// Legacy default: suppress a fixed denylist of members inherited from
    /// the generic-object and thread base types, unless the declaring
    /// subtype is outside the trusted origin.
    #[default]
    Safe,
    /// Expose everything not explicitly hidden.
    ExposeAll,
}

/// Whether a zero-argument accessor shows up as a property, a method, or
/// both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroArgPolicy {
    PropertyOnly,
    MethodOnly,
    #[default]
    Both,
}

impl ZeroArgPolicy {
    fn as_property(self) -> bool {
        matches!(self, ZeroArgPolicy::PropertyOnly | ZeroArgPolicy::Both)
    }

    fn as_method(self) -> bool {
        matches!(self, ZeroArgPolicy::MethodOnly | ZeroArgPolicy::Both)
    }
}

/// Settings that shape introspection. Part of the memoization key in spirit:
/// changing them requires a cache clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrospectionSettings {
    pub member_policy: MemberPolicy,
    /// Policy for ordinary zero-arg accessors, which may have side effects.
    pub zero_arg_policy: ZeroArgPolicy,
    /// Policy for accessors of record-like classes, which are unambiguously
    /// data.
    pub record_accessor_policy: ZeroArgPolicy,
}

/// Members suppressed by the Safe policy when declared by trusted code.
/// These are the lifecycle/synchronization members of the generic-object and
/// thread base types.
const SAFE_DENYLIST: &[&str] = &[
    "wait",
    "notify",
    "notify_all",
    "get_class",
    "clone_instance",
    "finalize",
    "run",
    "start",
    "stop",
    "suspend",
    "resume",
    "interrupt",
    "join",
    "set_daemon",
    "set_priority",
];

/// A concrete method admitted into the overload table, with its effective
/// (bridge-resolved) exposure already applied.
#[derive(Debug, Clone)]
pub struct ExposedMethod {
    pub declaring: ClassId,
    pub descriptor: MethodDescriptor,
}

/// Where a property value comes from.
#[derive(Debug, Clone)]
pub enum PropertySource {
    /// An instance field.
    Field { declaring: ClassId },
    /// A zero-arg accessor method.
    Accessor(ExposedMethod),
}

/// The introspection result for one class.
#[derive(Debug, Default)]
pub struct ClassIntrospection {
    pub properties: IndexMap<String, PropertySource>,
    pub methods: IndexMap<String, Vec<ExposedMethod>>,
}

/// Compute the exposed members of `class` under `settings`.
pub fn introspect(
    registry: &ClassRegistry,
    class: ClassId,
    settings: &IntrospectionSettings,
) -> ClassIntrospection {
    let closure = registry.supertype_closure(class);
    let mut result = ClassIntrospection::default();

    // Abstract zero-arg accessors declared on interfaces in the closure;
    // implementations of these are structural-contract accessors and are
    // always properties.
    let mut contract_accessors: Vec<&str> = Vec::new();
    for &id in &closure {
        let descriptor = registry.class(id);
        if !descriptor.is_interface {
            continue;
        }
        for method in &descriptor.methods {
            if method.is_abstract && method.params.is_empty() && !method.varargs {
                contract_accessors.push(&method.name);
            }
        }
    }

    // Most-derived concrete declaration per signature. Synthetic bridges are
    // apparent overloads and collapse into their real declaration; one is
    // kept only when no non-synthetic declaration of that name exists at
    // all, with its metadata resolved through the bridge indirection.
    let mut kept: Vec<ExposedMethod> = Vec::new();
    for synthetic_pass in [false, true] {
        for &id in &closure {
            let descriptor = registry.class(id);
            for (index, method) in descriptor.methods.iter().enumerate() {
                if method.is_abstract || method.synthetic != synthetic_pass {
                    continue;
                }
                let already = kept.iter().any(|m| {
                    m.descriptor.name == method.name
                        && (synthetic_pass
                            || (m.descriptor.params == method.params
                                && m.descriptor.varargs == method.varargs))
                });
                if already {
                    // Overridden by a more derived class, or bridged.
                    continue;
                }
                let mut descriptor_out = method.clone();
                descriptor_out.exposure = effective_exposure(descriptor, index);
                kept.push(ExposedMethod {
                    declaring: id,
                    descriptor: descriptor_out,
                });
            }
        }
    }

    for method in kept {
        let declaring = registry.class(method.declaring);
        if !admitted(
            settings,
            &method.descriptor.name,
            method.descriptor.exposure,
            declaring,
        ) {
            continue;
        }
        let name = method.descriptor.name.clone();
        let zero_arg = method.descriptor.params.is_empty() && !method.descriptor.varargs;
        if zero_arg {
            let is_contract = contract_accessors.iter().any(|c| *c == name);
            let policy = if declaring.is_record_like {
                settings.record_accessor_policy
            } else {
                settings.zero_arg_policy
            };
            if is_contract || policy.as_property() {
                result
                    .properties
                    .entry(name.clone())
                    .or_insert_with(|| PropertySource::Accessor(method.clone()));
            }
            if !policy.as_method() {
                continue;
            }
        }
        result.methods.entry(name).or_default().push(method);
    }

    // Fields; the most derived declaration of a name wins.
    for &id in &closure {
        let descriptor = registry.class(id);
        for field in &descriptor.fields {
            if !admitted(settings, &field.name, field.exposure, descriptor) {
                continue;
            }
            result
                .properties
                .entry(field.name.clone())
                .or_insert_with(|| PropertySource::Field { declaring: id });
        }
    }

    result
}

/// Resolve a method's exposure annotation, following bridge indirections to
/// the real declaring member.
fn effective_exposure(class: &ClassDescriptor, index: usize) -> Exposure {
    let mut current = index;
    let mut hops = 0;
    loop {
        let method = &class.methods[current];
        if method.exposure != Exposure::Unspecified {
            return method.exposure;
        }
        match method.bridge_of {
            // A bridge cycle is a registration bug; the walk is bounded.
            Some(real) if hops < class.methods.len() => {
                current = real;
                hops += 1;
            }
            _ => return Exposure::Unspecified,
        }
    }
}

fn admitted(
    settings: &IntrospectionSettings,
    name: &str,
    exposure: Exposure,
    declaring: &ClassDescriptor,
) -> bool {
    match exposure {
        Exposure::Expose => true,
        Exposure::Hide => false,
        Exposure::Unspecified => match settings.member_policy {
            MemberPolicy::ExposeAll => true,
            MemberPolicy::Safe => {
                // The denylist binds trusted declarations only. A user
                // subclass that redeclares `run` gets it exposed even though
                // the thread base's own `run` is suppressed.
                !(declaring.trusted_origin && SAFE_DENYLIST.contains(&name))
            }
        },
    }
}
