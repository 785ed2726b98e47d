use asteval::{Config, Interpreter, PyValue};
use std::time::Duration;

fn run(interp: &mut Interpreter, text: &str) -> PyValue {
    interp.eval(text, false, true).unwrap().unwrap_or(PyValue::None)
}

#[test]
fn basic_arithmetic() {
    let mut interp = Interpreter::default();
    assert_eq!(run(&mut interp, "2 + 2"), PyValue::Int(4));
    assert_eq!(run(&mut interp, "10 - 3"), PyValue::Int(7));
    assert_eq!(run(&mut interp, "4 * 5"), PyValue::Int(20));
    assert_eq!(run(&mut interp, "10 / 4"), PyValue::Float(2.5));
    assert_eq!(run(&mut interp, "10 // 3"), PyValue::Int(3));
    assert_eq!(run(&mut interp, "10 % 3"), PyValue::Int(1));
    assert_eq!(run(&mut interp, "2 ** 8"), PyValue::Int(256));
}

#[test]
fn variables_persist_across_eval_calls() {
    let mut interp = Interpreter::default();
    run(&mut interp, "x = 10");
    run(&mut interp, "y = 20");
    assert_eq!(run(&mut interp, "x + y"), PyValue::Int(30));
}

#[test]
fn strings_and_repetition() {
    let mut interp = Interpreter::default();
    assert_eq!(run(&mut interp, "'hello' + ' ' + 'world'"), PyValue::Str("hello world".to_string()));
    assert_eq!(run(&mut interp, "'ab' * 3"), PyValue::Str("ababab".to_string()));
}

#[test]
fn list_indexing_and_negative_index() {
    let mut interp = Interpreter::default();
    run(&mut interp, "nums = [10, 20, 30]");
    assert_eq!(run(&mut interp, "nums[0]"), PyValue::Int(10));
    assert_eq!(run(&mut interp, "nums[-1]"), PyValue::Int(30));
}

#[test]
fn list_slicing() {
    let mut interp = Interpreter::default();
    run(&mut interp, "nums = [0, 1, 2, 3, 4]");
    assert_eq!(
        run(&mut interp, "nums[1:4]"),
        PyValue::List(vec![PyValue::Int(1), PyValue::Int(2), PyValue::Int(3)])
    );
    assert_eq!(
        run(&mut interp, "nums[::-1]"),
        PyValue::List(vec![
            PyValue::Int(4), PyValue::Int(3), PyValue::Int(2), PyValue::Int(1), PyValue::Int(0)
        ])
    );
}

#[test]
fn dict_access() {
    let mut interp = Interpreter::default();
    run(&mut interp, "data = {'name': 'Alice', 'age': 30}");
    assert_eq!(run(&mut interp, "data['name']"), PyValue::Str("Alice".to_string()));
    assert_eq!(run(&mut interp, "data['age']"), PyValue::Int(30));
}

#[test]
fn chained_comparisons() {
    let mut interp = Interpreter::default();
    assert_eq!(run(&mut interp, "1 < 2 < 3"), PyValue::Bool(true));
    assert_eq!(run(&mut interp, "1 < 2 > 3"), PyValue::Bool(false));
}

#[test]
fn boolean_short_circuit() {
    let mut interp = Interpreter::default();
    assert_eq!(run(&mut interp, "True and False"), PyValue::Bool(false));
    assert_eq!(run(&mut interp, "0 or 'fallback'"), PyValue::Str("fallback".to_string()));
}

#[test]
fn if_elif_else() {
    let mut interp = Interpreter::default();
    run(&mut interp, "x = 5\nif x > 10:\n    r = 'big'\nelif x > 2:\n    r = 'medium'\nelse:\n    r = 'small'");
    assert_eq!(run(&mut interp, "r"), PyValue::Str("medium".to_string()));
}

#[test]
fn for_loop_accumulates() {
    let mut interp = Interpreter::default();
    run(&mut interp, "total = 0\nfor i in [1, 2, 3, 4]:\n    total += i");
    assert_eq!(run(&mut interp, "total"), PyValue::Int(10));
}

#[test]
fn for_loop_break_skips_else() {
    let mut interp = Interpreter::default();
    run(
        &mut interp,
        "found = None\nfor i in [1, 2, 3]:\n    if i == 2:\n        found = i\n        break\nelse:\n    found = -1",
    );
    assert_eq!(run(&mut interp, "found"), PyValue::Int(2));
}

#[test]
fn for_loop_else_runs_without_break() {
    let mut interp = Interpreter::default();
    run(&mut interp, "done = False\nfor i in [1, 2]:\n    pass\nelse:\n    done = True");
    assert_eq!(run(&mut interp, "done"), PyValue::Bool(true));
}

#[test]
fn while_loop_with_continue() {
    let mut interp = Interpreter::default();
    run(
        &mut interp,
        "i = 0\ntotal = 0\nwhile i < 5:\n    i += 1\n    if i % 2 == 0:\n        continue\n    total += i",
    );
    assert_eq!(run(&mut interp, "total"), PyValue::Int(9));
}

#[test]
fn list_comprehension_with_condition() {
    let mut interp = Interpreter::default();
    run(&mut interp, "evens = [x for x in range(10) if x % 2 == 0]");
    assert_eq!(
        run(&mut interp, "evens"),
        PyValue::List(vec![PyValue::Int(0), PyValue::Int(2), PyValue::Int(4), PyValue::Int(6), PyValue::Int(8)])
    );
}

#[test]
fn dict_comprehension() {
    let mut interp = Interpreter::default();
    run(&mut interp, "squares = {x: x * x for x in [1, 2, 3]}");
    assert_eq!(run(&mut interp, "squares[3]"), PyValue::Int(9));
}

#[test]
fn functions_with_defaults_and_varargs() {
    let mut interp = Interpreter::default();
    run(
        &mut interp,
        "def greet(name, greeting='hi'):\n    return greeting + ' ' + name",
    );
    assert_eq!(run(&mut interp, "greet('Ada')"), PyValue::Str("hi Ada".to_string()));
    assert_eq!(run(&mut interp, "greet('Ada', 'hello')"), PyValue::Str("hello Ada".to_string()));

    run(&mut interp, "def total(*nums):\n    s = 0\n    for n in nums:\n        s += n\n    return s");
    assert_eq!(run(&mut interp, "total(1, 2, 3)"), PyValue::Int(6));
}

#[test]
fn recursive_function() {
    let mut interp = Interpreter::default();
    run(
        &mut interp,
        "def fact(n):\n    if n <= 1:\n        return 1\n    return n * fact(n - 1)",
    );
    assert_eq!(run(&mut interp, "fact(6)"), PyValue::Int(720));
}

#[test]
fn try_except_else_finally_order() {
    let mut interp = Interpreter::default();
    run(
        &mut interp,
        "log = []\ntry:\n    x = 1\nexcept Exception as e:\n    log.append('except')\nelse:\n    log.append('else')\nfinally:\n    log.append('finally')",
    );
    assert_eq!(
        run(&mut interp, "log"),
        PyValue::List(vec![PyValue::Str("else".to_string()), PyValue::Str("finally".to_string())])
    );
}

#[test]
fn try_except_catches_zero_division_and_binds_name() {
    let mut interp = Interpreter::default();
    run(
        &mut interp,
        "caught = None\ntry:\n    1 / 0\nexcept ZeroDivisionError as e:\n    caught = str(e)",
    );
    match interp.get_symbol("caught") {
        Some(PyValue::Str(s)) => assert_eq!(s, "division by zero"),
        other => panic!("expected a caught message, got {other:?}"),
    }
}

#[test]
fn raised_value_error_is_caught_by_name_and_message_is_bare() {
    let mut interp = Interpreter::default();
    run(
        &mut interp,
        "caught = None\ntry:\n    raise ValueError('boom')\nexcept ValueError as e:\n    caught = str(e)",
    );
    assert_eq!(run(&mut interp, "caught"), PyValue::Str("boom".to_string()));
}

#[test]
fn try_aborts_remaining_body_on_raise() {
    let mut interp = Interpreter::default();
    run(
        &mut interp,
        "reached = False\ntry:\n    raise ValueError('boom')\n    reached = True\nexcept ValueError:\n    pass",
    );
    assert_eq!(run(&mut interp, "reached"), PyValue::Bool(false));
}

#[test]
fn assert_failure_raises_assertion_error() {
    let mut interp = Interpreter::default();
    let err = interp.eval("assert 1 == 2, 'nope'", false, true).unwrap_err();
    assert_eq!(err.kind(), "AssertionError");
}

#[test]
fn f_string_interpolates_expressions() {
    let mut interp = Interpreter::default();
    run(&mut interp, "name = 'Ada'\nn = 2 + 3");
    assert_eq!(run(&mut interp, "f'{name} has {n} items'"), PyValue::Str("Ada has 5 items".to_string()));
}

#[test]
fn math_module_functions() {
    let mut interp = Interpreter::default().with_writer(Box::new(std::io::sink()));
    assert_eq!(run(&mut interp, "math.sqrt(16)"), PyValue::Float(4.0));
    assert_eq!(run(&mut interp, "math.floor(3.7)"), PyValue::Int(3));
}

#[test]
fn safe_pow_rejects_oversized_exponent() {
    let mut interp = Interpreter::default();
    let err = interp.eval("2 ** 100000", false, true).unwrap_err();
    assert_eq!(err.kind(), "RuntimeError");
}

#[test]
fn safe_open_rejects_write_mode() {
    let mut interp = Interpreter::default();
    let err = interp.eval("open('/tmp/whatever', 'wb')", false, true).unwrap_err();
    assert_eq!(err.kind(), "RuntimeError");
}

#[test]
fn unsafe_attribute_access_is_rejected() {
    let mut interp = Interpreter::default();
    let err = interp.eval("math.__class__", false, true).unwrap_err();
    assert_eq!(err.kind(), "AttributeError");
}

#[test]
fn disabled_node_reports_not_implemented() {
    let config = Config::default().with_import(false);
    let mut interp = Interpreter::new(config);
    let err = interp.eval("import os", false, true).unwrap_err();
    assert_eq!(err.kind(), "ImportError");
}

#[test]
fn minimal_config_rejects_function_definitions() {
    let mut interp = Interpreter::new(Config::minimal());
    let err = interp.eval("def f():\n    return 1", false, true).unwrap_err();
    assert_eq!(err.kind(), "NotImplementedError");
}

#[test]
fn wallclock_budget_trips_runtime_error() {
    let config = Config::default().with_wallclock_budget(Duration::from_millis(1));
    let mut interp = Interpreter::new(config);
    let err = interp.eval("x = 0\nwhile True:\n    x += 1", false, true).unwrap_err();
    assert_eq!(err.kind(), "RuntimeError");
}

#[test]
fn recursion_depth_limit_trips_recursion_error() {
    let config = Config::default().with_max_recursion_depth(5);
    let mut interp = Interpreter::new(config);
    run(&mut interp, "def f(n):\n    return f(n + 1)");
    let err = interp.eval("f(0)", false, true).unwrap_err();
    assert_eq!(err.kind(), "RecursionError");
}

#[test]
fn readonly_symbols_cannot_be_reassigned() {
    let config = Config::default().with_readonly_symbols(["PI"]);
    let mut interp = Interpreter::new(config);
    interp.set_symbol("PI", PyValue::Float(std::f64::consts::PI));
    let err = interp.eval("PI = 0", false, true).unwrap_err();
    assert_eq!(err.kind(), "NameError");
}

#[test]
fn user_defined_symbols_excludes_preloaded_names() {
    let mut interp = Interpreter::default();
    run(&mut interp, "x = 1\ny = 2");
    let mut names = interp.user_defined_symbols();
    names.sort();
    assert_eq!(names, vec!["x".to_string(), "y".to_string()]);
}

#[test]
fn error_msg_reports_last_evaluation_failure() {
    let mut interp = Interpreter::default();
    let _ = interp.eval("1 / 0", false, false);
    assert!(interp.error_msg().contains("ZeroDivisionError"));
}
