//! Binary, unary, and comparison operator semantics.
//!
//! Arithmetic and bitwise operators dispatch on the runtime types of their
//! operands; the length/magnitude-bounded operators (`+` on strings, `*`
//! repetition, `**`, `<<`) delegate to `crate::safety` so a script can't use
//! them to exhaust memory or CPU.

use rustpython_ast::{CmpOp, Operator, UnaryOp};

use crate::error::{Error, Result};
use crate::safety;
use crate::value::PyValue;

pub fn apply_binop(op: &Operator, left: &PyValue, right: &PyValue) -> Result<PyValue> {
    match op {
        Operator::Add => safety::safe_add(left, right),
        Operator::Sub => numeric_binop(left, right, |a, b| a - b, |a, b| a - b),
        Operator::Mult => safety::safe_mul(left, right),
        Operator::Div => {
            let a = as_number(left)?;
            let b = as_number(right)?;
            if b == 0.0 {
                Err(Error::ZeroDivision("division by zero".to_string()))
            } else {
                Ok(PyValue::Float(a / b))
            }
        }
        Operator::FloorDiv => {
            let a = as_number(left)?;
            let b = as_number(right)?;
            if b == 0.0 {
                Err(Error::ZeroDivision("division by zero".to_string()))
            } else {
                let result = (a / b).floor();
                if matches!(left, PyValue::Int(_)) && matches!(right, PyValue::Int(_)) {
                    Ok(PyValue::Int(result as i64))
                } else {
                    Ok(PyValue::Float(result))
                }
            }
        }
        Operator::Mod => match (left, right) {
            (PyValue::Int(a), PyValue::Int(b)) => {
                if *b == 0 {
                    Err(Error::ZeroDivision("integer modulo by zero".to_string()))
                } else {
                    Ok(PyValue::Int(a.rem_euclid(*b)))
                }
            }
            (PyValue::Str(fmt), _) => Ok(PyValue::Str(percent_format(fmt, right))),
            _ => {
                let a = as_number(left)?;
                let b = as_number(right)?;
                if b == 0.0 {
                    Err(Error::ZeroDivision("float modulo".to_string()))
                } else {
                    Ok(PyValue::Float(a.rem_euclid(b)))
                }
            }
        },
        Operator::Pow => safety::safe_pow(left, right),
        Operator::BitOr => int_binop(left, right, |a, b| a | b),
        Operator::BitXor => int_binop(left, right, |a, b| a ^ b),
        Operator::BitAnd => int_binop(left, right, |a, b| a & b),
        Operator::LShift => safety::safe_lshift(left, right),
        Operator::RShift => int_binop(left, right, |a, b| a >> b),
        Operator::MatMult => Err(Error::NotImplemented("matrix multiplication".to_string())),
    }
}

pub fn apply_unaryop(op: UnaryOp, operand: PyValue) -> Result<PyValue> {
    match op {
        UnaryOp::Not => Ok(PyValue::Bool(!operand.is_truthy())),
        UnaryOp::USub => match operand {
            PyValue::Int(i) => Ok(PyValue::Int(-i)),
            PyValue::Float(f) => Ok(PyValue::Float(-f)),
            PyValue::Bool(b) => Ok(PyValue::Int(-(b as i64))),
            other => Err(Error::Type(format!(
                "bad operand type for unary -: '{}'",
                other.type_name()
            ))),
        },
        UnaryOp::UAdd => match operand {
            PyValue::Int(_) | PyValue::Float(_) => Ok(operand),
            PyValue::Bool(b) => Ok(PyValue::Int(b as i64)),
            other => Err(Error::Type(format!(
                "bad operand type for unary +: '{}'",
                other.type_name()
            ))),
        },
        UnaryOp::Invert => match operand {
            PyValue::Int(i) => Ok(PyValue::Int(!i)),
            PyValue::Bool(b) => Ok(PyValue::Int(!(b as i64))),
            other => Err(Error::Type(format!(
                "bad operand type for unary ~: '{}'",
                other.type_name()
            ))),
        },
    }
}

/// Applies one step of a (possibly chained) comparison.
pub fn apply_cmpop(op: &CmpOp, left: &PyValue, right: &PyValue) -> Result<bool> {
    match op {
        CmpOp::Eq => Ok(left.py_eq(right)),
        CmpOp::NotEq => Ok(!left.py_eq(right)),
        CmpOp::Lt => compare_values(left, right, |a, b| a < b, |a, b| a < b),
        CmpOp::LtE => compare_values(left, right, |a, b| a <= b, |a, b| a <= b),
        CmpOp::Gt => compare_values(left, right, |a, b| a > b, |a, b| a > b),
        CmpOp::GtE => compare_values(left, right, |a, b| a >= b, |a, b| a >= b),
        CmpOp::In => membership(left, right),
        CmpOp::NotIn => membership(left, right).map(|b| !b),
        CmpOp::Is => Ok(is_same(left, right)),
        CmpOp::IsNot => Ok(!is_same(left, right)),
    }
}

fn is_same(left: &PyValue, right: &PyValue) -> bool {
    match (left, right) {
        (PyValue::None, PyValue::None) => true,
        (PyValue::Bool(a), PyValue::Bool(b)) => a == b,
        _ => false,
    }
}

fn membership(needle: &PyValue, haystack: &PyValue) -> Result<bool> {
    match haystack {
        PyValue::List(items) | PyValue::Tuple(items) | PyValue::Set(items) => {
            Ok(items.iter().any(|v| v.py_eq(needle)))
        }
        PyValue::Str(s) => match needle {
            PyValue::Str(sub) => Ok(s.contains(sub.as_str())),
            other => Err(Error::Type(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        PyValue::Dict(pairs) => Ok(pairs.iter().any(|(k, _)| k.py_eq(needle))),
        other => Err(Error::Type(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn numeric_binop<F, G>(left: &PyValue, right: &PyValue, int_op: F, float_op: G) -> Result<PyValue>
where
    F: Fn(i64, i64) -> i64,
    G: Fn(f64, f64) -> f64,
{
    match (left, right) {
        (PyValue::Int(a), PyValue::Int(b)) => Ok(PyValue::Int(int_op(*a, *b))),
        _ => Ok(PyValue::Float(float_op(as_number(left)?, as_number(right)?))),
    }
}

fn int_binop<F>(left: &PyValue, right: &PyValue, op: F) -> Result<PyValue>
where
    F: Fn(i64, i64) -> i64,
{
    let a = left
        .as_int()
        .ok_or_else(|| Error::Type(format!("unsupported operand type: '{}'", left.type_name())))?;
    let b = right
        .as_int()
        .ok_or_else(|| Error::Type(format!("unsupported operand type: '{}'", right.type_name())))?;
    Ok(PyValue::Int(op(a, b)))
}

fn as_number(v: &PyValue) -> Result<f64> {
    v.as_float()
        .ok_or_else(|| Error::Type(format!("unsupported operand type: '{}'", v.type_name())))
}

pub fn compare_values<F, G>(left: &PyValue, right: &PyValue, int_cmp: F, float_cmp: G) -> Result<bool>
where
    F: Fn(i64, i64) -> bool,
    G: Fn(f64, f64) -> bool,
{
    match (left, right) {
        (PyValue::Int(a), PyValue::Int(b)) => Ok(int_cmp(*a, *b)),
        (PyValue::Str(a), PyValue::Str(b)) => Ok(match a.cmp(b) {
            std::cmp::Ordering::Less => int_cmp(0, 1),
            std::cmp::Ordering::Equal => int_cmp(0, 0),
            std::cmp::Ordering::Greater => int_cmp(1, 0),
        }),
        _ => Ok(float_cmp(as_number(left)?, as_number(right)?)),
    }
}

/// Minimal `%`-style string formatting: `"%s" % value` / `"%s %s" % (a, b)`.
/// Only the `%s` conversion is supported; anything richer should use an
/// f-string.
fn percent_format(fmt: &str, arg: &PyValue) -> String {
    let values: Vec<PyValue> = match arg {
        PyValue::Tuple(items) => items.clone(),
        other => vec![other.clone()],
    };
    let mut out = String::new();
    let mut values = values.into_iter();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' && chars.peek() == Some(&'s') {
            chars.next();
            if let Some(v) = values.next() {
                out.push_str(&v.py_str());
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_dispatches_to_safety_module() {
        let r = apply_binop(&Operator::Add, &PyValue::Int(2), &PyValue::Int(3)).unwrap();
        assert!(matches!(r, PyValue::Int(5)));
    }

    #[test]
    fn floor_div_by_zero_raises_zero_division() {
        let err = apply_binop(&Operator::FloorDiv, &PyValue::Int(1), &PyValue::Int(0)).unwrap_err();
        assert_eq!(err.kind(), "ZeroDivisionError");
    }

    #[test]
    fn chained_in_checks_membership() {
        let haystack = PyValue::List(vec![PyValue::Int(1), PyValue::Int(2)]);
        assert!(apply_cmpop(&CmpOp::In, &PyValue::Int(2), &haystack).unwrap());
        assert!(!apply_cmpop(&CmpOp::In, &PyValue::Int(9), &haystack).unwrap());
    }

    #[test]
    fn is_none_only_matches_none() {
        assert!(apply_cmpop(&CmpOp::Is, &PyValue::None, &PyValue::None).unwrap());
        assert!(!apply_cmpop(&CmpOp::Is, &PyValue::Int(0), &PyValue::None).unwrap());
    }
}
