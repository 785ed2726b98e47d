//! Preloaded `math` module.
//!
//! Scripts reference these as `math.sqrt(x)` etc; the symbol table binds a
//! single `math` name to a `Host` object whose attributes are the functions
//! below, rather than modelling a real module system.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::{HostObject, NamedNative, PyValue};

struct MathModule;

impl HostObject for MathModule {
    fn type_name(&self) -> &str {
        "module"
    }

    fn get_attr(&self, attr: &str) -> Option<PyValue> {
        let f: fn(Vec<PyValue>) -> Result<PyValue> = match attr {
            "sqrt" => math_sqrt,
            "sin" => |a| unary(a, f64::sin),
            "cos" => |a| unary(a, f64::cos),
            "tan" => |a| unary(a, f64::tan),
            "asin" => |a| unary(a, f64::asin),
            "acos" => |a| unary(a, f64::acos),
            "atan" => |a| unary(a, f64::atan),
            "atan2" => math_atan2,
            "sinh" => |a| unary(a, f64::sinh),
            "cosh" => |a| unary(a, f64::cosh),
            "tanh" => |a| unary(a, f64::tanh),
            "exp" => |a| unary(a, f64::exp),
            "log" => math_log,
            "log2" => |a| unary(a, f64::log2),
            "log10" => |a| unary(a, f64::log10),
            "floor" => |a| unary_to_int(a, f64::floor),
            "ceil" => |a| unary_to_int(a, f64::ceil),
            "fabs" => |a| unary(a, f64::abs),
            "trunc" => |a| unary_to_int(a, f64::trunc),
            "pow" => math_pow,
            "hypot" => math_hypot,
            "gcd" => math_gcd,
            "degrees" => |a| unary(a, f64::to_degrees),
            "radians" => |a| unary(a, f64::to_radians),
            "isnan" => |a| unary_to_bool(a, f64::is_nan),
            "isinf" => |a| unary_to_bool(a, f64::is_infinite),
            "pi" | "e" | "tau" | "inf" | "nan" => return Some(math_constant(attr)),
            _ => return None,
        };
        Some(PyValue::Native(NamedNative {
            name: format!("math.{attr}"),
            info: None,
            func: Rc::new(f),
        }))
    }

    fn repr(&self) -> String {
        "<module 'math'>".to_string()
    }
}

fn math_constant(name: &str) -> PyValue {
    PyValue::Float(match name {
        "pi" => std::f64::consts::PI,
        "e" => std::f64::consts::E,
        "tau" => std::f64::consts::TAU,
        "inf" => f64::INFINITY,
        "nan" => f64::NAN,
        _ => unreachable!(),
    })
}

fn one_arg(args: &[PyValue], name: &str) -> Result<f64> {
    match args {
        [v] => v
            .as_float()
            .ok_or_else(|| Error::Type(format!("{name}() argument must be a number"))),
        _ => Err(Error::Type(format!("{name}() takes exactly one argument"))),
    }
}

fn unary(args: Vec<PyValue>, f: fn(f64) -> f64) -> Result<PyValue> {
    Ok(PyValue::Float(f(one_arg(&args, "math function")?)))
}

fn unary_to_int(args: Vec<PyValue>, f: fn(f64) -> f64) -> Result<PyValue> {
    Ok(PyValue::Int(f(one_arg(&args, "math function")?) as i64))
}

fn unary_to_bool(args: Vec<PyValue>, f: fn(f64) -> bool) -> Result<PyValue> {
    Ok(PyValue::Bool(f(one_arg(&args, "math function")?)))
}

fn math_sqrt(args: Vec<PyValue>) -> Result<PyValue> {
    let x = one_arg(&args, "sqrt")?;
    if x < 0.0 {
        return Err(Error::Value("math domain error".to_string()));
    }
    Ok(PyValue::Float(x.sqrt()))
}

fn math_log(args: Vec<PyValue>) -> Result<PyValue> {
    match args.len() {
        1 => Ok(PyValue::Float(one_arg(&args[..1], "log")?.ln())),
        2 => {
            let x = args[0].as_float().ok_or_else(|| Error::Type("log() argument must be a number".to_string()))?;
            let base = args[1].as_float().ok_or_else(|| Error::Type("log() argument must be a number".to_string()))?;
            Ok(PyValue::Float(x.log(base)))
        }
        _ => Err(Error::Type("log() takes 1 or 2 arguments".to_string())),
    }
}

fn math_atan2(args: Vec<PyValue>) -> Result<PyValue> {
    match args.as_slice() {
        [y, x] => {
            let y = y.as_float().ok_or_else(|| Error::Type("atan2() arguments must be numbers".to_string()))?;
            let x = x.as_float().ok_or_else(|| Error::Type("atan2() arguments must be numbers".to_string()))?;
            Ok(PyValue::Float(y.atan2(x)))
        }
        _ => Err(Error::Type("atan2() takes exactly two arguments".to_string())),
    }
}

fn math_hypot(args: Vec<PyValue>) -> Result<PyValue> {
    let mut sum_sq = 0.0;
    for v in &args {
        let f = v.as_float().ok_or_else(|| Error::Type("hypot() arguments must be numbers".to_string()))?;
        sum_sq += f * f;
    }
    Ok(PyValue::Float(sum_sq.sqrt()))
}

fn math_pow(args: Vec<PyValue>) -> Result<PyValue> {
    match args.as_slice() {
        [a, b] => {
            let a = a.as_float().ok_or_else(|| Error::Type("pow() arguments must be numbers".to_string()))?;
            let b = b.as_float().ok_or_else(|| Error::Type("pow() arguments must be numbers".to_string()))?;
            Ok(PyValue::Float(a.powf(b)))
        }
        _ => Err(Error::Type("pow() takes exactly two arguments".to_string())),
    }
}

fn math_gcd(args: Vec<PyValue>) -> Result<PyValue> {
    let ints: Result<Vec<i64>> = args
        .iter()
        .map(|v| v.as_int().ok_or_else(|| Error::Type("gcd() arguments must be integers".to_string())))
        .collect();
    let ints = ints?;
    let mut result = 0i64;
    for n in ints {
        result = gcd(result, n.abs());
    }
    Ok(PyValue::Int(result))
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Builds the `math` module value, bound into the global scope under the
/// name `"math"` when `Config::nodes.import_stmt`/`importfrom` admits it,
/// or preloaded unconditionally alongside the rest of the builtins.
pub fn math_module() -> PyValue {
    PyValue::Host(Rc::new(MathModule))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_of_negative_is_a_value_error() {
        let module = math_module();
        if let PyValue::Host(h) = module {
            let sqrt = h.get_attr("sqrt").unwrap();
            if let PyValue::Native(n) = sqrt {
                let err = (n.func)(vec![PyValue::Int(-1)]).unwrap_err();
                assert_eq!(err.kind(), "ValueError");
            }
        }
    }

    #[test]
    fn pi_constant_is_bound() {
        let module = math_module();
        if let PyValue::Host(h) = module {
            let pi = h.get_attr("pi").unwrap();
            assert!(matches!(pi, PyValue::Float(f) if (f - std::f64::consts::PI).abs() < 1e-12));
        }
    }

    #[test]
    fn gcd_reduces_multiple_arguments() {
        let module = math_module();
        if let PyValue::Host(h) = module {
            let gcd_fn = h.get_attr("gcd").unwrap();
            if let PyValue::Native(n) = gcd_fn {
                let r = (n.func)(vec![PyValue::Int(12), PyValue::Int(18), PyValue::Int(24)]).unwrap();
                assert!(matches!(r, PyValue::Int(6)));
            }
        }
    }
}
