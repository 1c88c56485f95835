/*
 * overload.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Overload resolution for host methods.
//!
//! Candidates are first bucketed by arity (exact, then variable-arity
//! compatible), then scored per argument position by conversion distance:
//! exact match 0, widening numeric 1, boxing-like conversions 2, anything to
//! the generic object type 3. The lowest total wins; no applicable candidate
//! or a tie between incompatible shapes is an error naming the attempted
//! argument types.

use templar_arith::{Number, NumericClass};

use crate::error::{ModelError, ModelResult};
use crate::introspect::ExposedMethod;
use crate::model::{Model, TemplateModel};
use crate::registry::ParamType;
use crate::simple::SimpleNumber;
use std::sync::Arc;

const EXACT: u32 = 0;
const WIDENING: u32 = 1;
const BOXING: u32 = 2;
const TO_OBJECT: u32 = 3;

/// Conversion distance from an argument to a declared parameter type, or
/// `None` when the argument cannot be converted at all.
fn distance(arg: &dyn TemplateModel, param: ParamType) -> Option<u32> {
    if param == ParamType::Any {
        return Some(TO_OBJECT);
    }
    if let Some(number) = arg.as_number() {
        return numeric_distance(number.value().class(), param);
    }
    if arg.as_markup().is_some() {
        // Markup never silently degrades to a plain string.
        return (param == ParamType::Markup).then_some(EXACT);
    }
    match param {
        ParamType::Bool => arg.as_bool().map(|_| EXACT),
        ParamType::Date => arg.as_date().map(|_| EXACT),
        ParamType::Str => arg.as_scalar().map(|_| EXACT),
        // Plain text promotes to markup by escaping.
        ParamType::Markup => arg.as_scalar().map(|_| WIDENING),
        ParamType::Sequence => arg.as_sequence().map(|_| EXACT),
        ParamType::Hash => arg.as_hash().map(|_| EXACT),
        _ => None,
    }
}

fn numeric_distance(class: NumericClass, param: ParamType) -> Option<u32> {
    match param {
        ParamType::Int => match class {
            NumericClass::Int => Some(EXACT),
            // Narrowing carries a runtime range check.
            _ => Some(BOXING),
        },
        ParamType::Long => match class {
            NumericClass::Long => Some(EXACT),
            NumericClass::Int => Some(WIDENING),
            _ => Some(BOXING),
        },
        ParamType::Double => match class {
            NumericClass::Double => Some(EXACT),
            NumericClass::Int | NumericClass::Long | NumericClass::Float => Some(WIDENING),
            _ => Some(BOXING),
        },
        ParamType::BigNumber => match class {
            NumericClass::BigInt | NumericClass::Decimal => Some(EXACT),
            _ => Some(BOXING),
        },
        // A number is also renderable as text, at boxing cost.
        ParamType::Str => Some(BOXING),
        _ => None,
    }
}

/// Total conversion distance of one candidate for the given arguments, or
/// `None` when it is not applicable.
fn candidate_score(method: &ExposedMethod, args: &[Model], varargs_pass: bool) -> Option<u32> {
    let params = &method.descriptor.params;
    if method.descriptor.varargs != varargs_pass {
        return None;
    }
    let mut total = 0;
    if varargs_pass {
        let fixed = params.len() - 1;
        if args.len() < fixed {
            return None;
        }
        let tail = *params.last()?;
        for (index, arg) in args.iter().enumerate() {
            let param = if index < fixed { params[index] } else { tail };
            total += distance(arg.as_ref(), param)?;
        }
    } else {
        if params.len() != args.len() {
            return None;
        }
        for (arg, &param) in args.iter().zip(params) {
            total += distance(arg.as_ref(), param)?;
        }
    }
    Some(total)
}

fn arg_type_names(args: &[Model]) -> Vec<String> {
    args.iter().map(|a| a.type_name().to_string()).collect()
}

/// Select the best overload of `name` for `args`.
///
/// Fixed-arity candidates are preferred; variable-arity ones are considered
/// only when no fixed-arity candidate applies.
pub fn resolve<'a>(
    name: &str,
    candidates: &'a [ExposedMethod],
    args: &[Model],
) -> ModelResult<&'a ExposedMethod> {
    for varargs_pass in [false, true] {
        let mut best: Option<(u32, &ExposedMethod)> = None;
        let mut ambiguous = false;
        for candidate in candidates {
            let Some(score) = candidate_score(candidate, args, varargs_pass) else {
                continue;
            };
            match &best {
                Some((best_score, _)) if score > *best_score => {}
                Some((best_score, _)) if score == *best_score => ambiguous = true,
                _ => {
                    best = Some((score, candidate));
                    ambiguous = false;
                }
            }
        }
        match best {
            Some(_) if ambiguous => {
                return Err(ModelError::NoCompatibleOverload {
                    name: name.to_string(),
                    arg_types: arg_type_names(args),
                })
            }
            Some((_, winner)) => return Ok(winner),
            None => {}
        }
    }
    Err(ModelError::NoCompatibleOverload {
        name: name.to_string(),
        arg_types: arg_type_names(args),
    })
}

/// Coerce arguments to the selected overload's parameter types.
///
/// Resolution already proved convertibility in shape; what can still fail
/// here is a value-dependent narrowing, which surfaces the exact expected
/// parameter type and the actual runtime type.
pub fn coerce_args(method: &ExposedMethod, args: &[Model]) -> ModelResult<Vec<Model>> {
    let params = &method.descriptor.params;
    let fixed = if method.descriptor.varargs {
        params.len() - 1
    } else {
        params.len()
    };
    args.iter()
        .enumerate()
        .map(|(index, arg)| {
            let param = if index < fixed {
                params[index]
            } else {
                *params.last().expect("varargs method has a tail parameter")
            };
            coerce_one(arg, param).ok_or_else(|| ModelError::ArgumentCoercion {
                method: method.descriptor.name.clone(),
                param_index: index,
                expected: param.name().to_string(),
                actual: arg.type_name().to_string(),
            })
        })
        .collect()
}

fn coerce_one(arg: &Model, param: ParamType) -> Option<Model> {
    let Some(number) = arg.as_number() else {
        return Some(arg.clone());
    };
    let value = number.value();
    let converted = match param {
        ParamType::Int => {
            let big = value.to_bigint_exact()?;
            Number::Int(i32::try_from(big).ok()?)
        }
        ParamType::Long => {
            let big = value.to_bigint_exact()?;
            Number::Long(i64::try_from(big).ok()?)
        }
        ParamType::Double => Number::Double(value.to_f64()),
        _ => return Some(arg.clone()),
    };
    Some(Arc::new(SimpleNumber(converted)) as Model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ClassId, HostObject, MethodBody, MethodDescriptor};
    use crate::simple::{SimpleMarkup, SimpleScalar};
    use pretty_assertions::assert_eq;
    use templar_output::{MarkupValue, HTML};

    fn noop_body() -> MethodBody {
        Arc::new(|_obj: &HostObject, _args: &[Model]| {
            Ok(Arc::new(SimpleScalar(String::new())) as Model)
        })
    }

    fn method(params: Vec<ParamType>) -> ExposedMethod {
        ExposedMethod {
            declaring: ClassId(0),
            descriptor: MethodDescriptor::new("f", params, noop_body()),
        }
    }

    fn varargs_method(params: Vec<ParamType>) -> ExposedMethod {
        ExposedMethod {
            declaring: ClassId(0),
            descriptor: MethodDescriptor::new("f", params, noop_body()).varargs(),
        }
    }

    fn int_arg(n: i32) -> Model {
        Arc::new(SimpleNumber(Number::Int(n)))
    }

    fn long_arg(n: i64) -> Model {
        Arc::new(SimpleNumber(Number::Long(n)))
    }

    fn str_arg(s: &str) -> Model {
        Arc::new(SimpleScalar(s.to_string()))
    }

    fn markup_arg(s: &str) -> Model {
        Arc::new(SimpleMarkup(MarkupValue::from_markup(HTML.clone(), s)))
    }

    #[test]
    fn test_exact_beats_widening() {
        let candidates = vec![method(vec![ParamType::Int]), method(vec![ParamType::Double])];
        let winner = resolve("f", &candidates, &[int_arg(1)]).unwrap();
        assert_eq!(winner.descriptor.params, vec![ParamType::Int]);
    }

    #[test]
    fn test_widening_beats_boxing() {
        let candidates = vec![
            method(vec![ParamType::Double]),
            method(vec![ParamType::BigNumber]),
        ];
        let winner = resolve("f", &candidates, &[int_arg(1)]).unwrap();
        assert_eq!(winner.descriptor.params, vec![ParamType::Double]);
    }

    #[test]
    fn test_markup_argument_selects_markup_overload() {
        let candidates = vec![method(vec![ParamType::Str]), method(vec![ParamType::Markup])];
        let winner = resolve("f", &candidates, &[markup_arg("<b>hi</b>")]).unwrap();
        assert_eq!(winner.descriptor.params, vec![ParamType::Markup]);
        // And a plain string prefers the string overload.
        let winner = resolve("f", &candidates, &[str_arg("hi")]).unwrap();
        assert_eq!(winner.descriptor.params, vec![ParamType::Str]);
    }

    #[test]
    fn test_markup_never_degrades_to_string() {
        let candidates = vec![method(vec![ParamType::Str])];
        let err = resolve("f", &candidates, &[markup_arg("<b>hi</b>")]).unwrap_err();
        assert_eq!(
            err,
            ModelError::NoCompatibleOverload {
                name: "f".to_string(),
                arg_types: vec!["markup_output".to_string()],
            }
        );
    }

    #[test]
    fn test_ambiguous_tie_is_an_error() {
        // Both need one widening step for an int argument.
        let candidates = vec![method(vec![ParamType::Long]), method(vec![ParamType::Double])];
        let err = resolve("f", &candidates, &[int_arg(1)]).unwrap_err();
        assert!(matches!(err, ModelError::NoCompatibleOverload { .. }));
    }

    #[test]
    fn test_fixed_arity_preferred_over_varargs() {
        let candidates = vec![
            varargs_method(vec![ParamType::Int]),
            method(vec![ParamType::Int]),
        ];
        let winner = resolve("f", &candidates, &[int_arg(1)]).unwrap();
        assert!(!winner.descriptor.varargs);
    }

    #[test]
    fn test_varargs_covers_excess_arguments() {
        let candidates = vec![varargs_method(vec![ParamType::Str, ParamType::Int])];
        let winner = resolve("f", &candidates, &[str_arg("x"), int_arg(1), int_arg(2)]).unwrap();
        assert!(winner.descriptor.varargs);
        // Zero trailing arguments is also compatible.
        resolve("f", &candidates, &[str_arg("x")]).unwrap();
    }

    #[test]
    fn test_narrowing_coercion_checks_the_value() {
        let target = method(vec![ParamType::Int]);
        let ok = coerce_args(&target, &[long_arg(7)]).unwrap();
        assert_eq!(ok[0].as_number().unwrap().value(), Number::Int(7));

        let err = coerce_args(&target, &[long_arg(1 << 40)]).unwrap_err();
        assert_eq!(
            err,
            ModelError::ArgumentCoercion {
                method: "f".to_string(),
                param_index: 0,
                expected: "int".to_string(),
                actual: "number".to_string(),
            }
        );
    }
}
