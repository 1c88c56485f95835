/*
 * host_objects.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! End-to-end tests for wrapped host objects.

use std::sync::Arc;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use templar_model::{
    expect_scalar, ClassBuilder, ClassRegistry, HostObject, MethodDescriptor, Model, ModelError,
    ObjectWrapper, ParamType, SimpleMarkup, SimpleScalar,
};
use templar_output::{MarkupValue, HTML};

fn renderer() -> (ObjectWrapper, Arc<HostObject>) {
    let mut registry = ClassRegistry::new();
    let class = ClassBuilder::new("Renderer")
        .method(MethodDescriptor::new(
            "render",
            vec![ParamType::Str],
            Arc::new(|_obj: &HostObject, args: &[Model]| {
                let text = expect_scalar(args[0].as_ref())?;
                Ok(Arc::new(SimpleScalar(format!("text:{}", text.as_str()))) as Model)
            }),
        ))
        .method(MethodDescriptor::new(
            "render",
            vec![ParamType::Markup],
            Arc::new(|_obj: &HostObject, args: &[Model]| {
                let markup = args[0].as_markup().expect("resolution picked markup");
                Ok(Arc::new(SimpleScalar(format!("markup:{}", markup.value().markup()))) as Model)
            }),
        ))
        .register(&mut registry);
    let object = HostObject::new(class, IndexMap::new());
    (ObjectWrapper::new(Arc::new(registry)), object)
}

fn call(model: &Model, name: &str, args: &[Model]) -> Result<Model, ModelError> {
    let method = model.as_hash().unwrap().get(name).unwrap().unwrap();
    let callable = method.as_callable().unwrap();
    callable.call(args)
}

#[test]
fn test_overload_choice_is_deterministic_by_argument_type() {
    let (wrapper, object) = renderer();
    let model = wrapper.wrap(&object);

    let plain: Model = Arc::new(SimpleScalar("a < b".to_string()));
    let result = call(&model, "render", &[plain]).unwrap();
    assert_eq!(result.as_scalar().unwrap().as_str(), "text:a < b");

    let markup: Model = Arc::new(SimpleMarkup(MarkupValue::from_markup(
        HTML.clone(),
        "<b>a</b>",
    )));
    let result = call(&model, "render", &[markup]).unwrap();
    assert_eq!(result.as_scalar().unwrap().as_str(), "markup:<b>a</b>");
}

#[test]
fn test_overload_failure_names_the_markup_type() {
    let mut registry = ClassRegistry::new();
    let class = ClassBuilder::new("Printer")
        .method(MethodDescriptor::new(
            "print",
            vec![ParamType::Str],
            Arc::new(|_obj: &HostObject, _args: &[Model]| {
                Ok(Arc::new(SimpleScalar(String::new())) as Model)
            }),
        ))
        .register(&mut registry);
    let object = HostObject::new(class, IndexMap::new());
    let wrapper = ObjectWrapper::new(Arc::new(registry));
    let model = wrapper.wrap(&object);

    let markup: Model = Arc::new(SimpleMarkup(MarkupValue::from_markup(
        HTML.clone(),
        "<b>a</b>",
    )));
    let err = call(&model, "print", &[markup]).unwrap_err();
    assert_eq!(
        err,
        ModelError::NoCompatibleOverload {
            name: "print".to_string(),
            arg_types: vec!["markup_output".to_string()],
        }
    );
}
