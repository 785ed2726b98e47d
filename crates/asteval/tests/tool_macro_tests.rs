//! Tests for the `#[tool]` proc macro.

use asteval::{Interpreter, PyValue, Tool};
use asteval_macros::tool;

/// Add two numbers together.
///
/// Args:
///     a: First number
///     b: Second number
#[tool]
fn add(a: i64, b: i64) -> i64 {
    a + b
}

/// Greet a person.
///
/// Args:
///     name: The person's name
///     prefix: Optional greeting prefix
#[tool]
fn greet(name: String, prefix: Option<String>) -> String {
    let p = prefix.unwrap_or_else(|| "Hello".to_string());
    format!("{}, {}!", p, name)
}

/// Return a dict with weather info.
#[tool]
fn get_weather(city: String) -> PyValue {
    PyValue::Dict(vec![
        (PyValue::Str("city".to_string()), PyValue::Str(city)),
        (PyValue::Str("temp".to_string()), PyValue::Int(22)),
        (PyValue::Str("unit".to_string()), PyValue::Str("celsius".to_string())),
    ])
}

#[test]
fn tool_info_generated_from_doc_comment() {
    assert_eq!(add::INFO.name, "add");
    assert_eq!(add::INFO.description, "Add two numbers together.");
    assert_eq!(add::INFO.args.len(), 2);
    assert_eq!(add::INFO.args[0].name, "a");
    assert_eq!(add::INFO.args[0].python_type, "int");
    assert!(add::INFO.args[0].required);
    assert_eq!(add::INFO.returns, "int");
}

#[test]
fn tool_info_marks_option_args_not_required() {
    assert_eq!(greet::INFO.name, "greet");
    assert_eq!(greet::INFO.args.len(), 2);
    assert_eq!(greet::INFO.args[0].name, "name");
    assert!(greet::INFO.args[0].required);
    assert_eq!(greet::INFO.args[1].name, "prefix");
    assert!(!greet::INFO.args[1].required);
    assert_eq!(greet::INFO.returns, "str");
}

#[test]
fn tool_info_arg_descriptions_from_args_section() {
    assert_eq!(greet::INFO.args[0].description, "The person's name");
    assert_eq!(greet::INFO.args[1].description, "Optional greeting prefix");
}

#[test]
fn tool_call_with_required_args() {
    let result = add::call(vec![PyValue::Int(10), PyValue::Int(20)]);
    assert_eq!(result, PyValue::Int(30));
}

#[test]
fn tool_call_with_optional_arg_provided() {
    let result = greet::call(vec![PyValue::Str("Alice".to_string()), PyValue::Str("Hi".to_string())]);
    assert_eq!(result, PyValue::Str("Hi, Alice!".to_string()));
}

#[test]
fn tool_call_with_optional_arg_omitted() {
    let result = greet::call(vec![PyValue::Str("Bob".to_string())]);
    assert_eq!(result, PyValue::Str("Hello, Bob!".to_string()));
}

#[test]
fn tool_call_missing_required_arg_reports_error_dict() {
    let result = add::call(vec![PyValue::Int(1)]);
    match result {
        PyValue::Dict(pairs) => {
            assert_eq!(pairs[0].0, PyValue::Str("error".to_string()));
        }
        other => panic!("expected an error dict, got {other:?}"),
    }
}

#[test]
fn tool_call_wrong_type_reports_error_dict() {
    let result = add::call(vec![PyValue::Str("not a number".to_string()), PyValue::Int(1)]);
    match result {
        PyValue::Dict(pairs) => {
            assert_eq!(pairs[0].0, PyValue::Str("error".to_string()));
        }
        other => panic!("expected an error dict, got {other:?}"),
    }
}

#[test]
fn tool_returning_pyvalue_directly() {
    let result = get_weather::call(vec![PyValue::Str("Paris".to_string())]);
    match result {
        PyValue::Dict(pairs) => {
            assert_eq!(pairs[0].1, PyValue::Str("Paris".to_string()));
        }
        other => panic!("expected a dict, got {other:?}"),
    }
}

#[test]
fn tool_type_registers_with_interpreter_and_is_callable_from_script() {
    let mut interp = Interpreter::default();
    interp.register_tool_type::<add::Tool>();
    let result = interp.eval("add(3, 4)", false, true).unwrap().unwrap();
    assert_eq!(result, PyValue::Int(7));
}

#[test]
fn tool_trait_impl_matches_module_level_call() {
    assert_eq!(add::Tool::info().name, "add");
    assert_eq!(add::Tool::call(vec![PyValue::Int(2), PyValue::Int(2)]), PyValue::Int(4));
}
