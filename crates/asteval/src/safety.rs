//! Safety primitives: bounded arithmetic and the attribute-access safelist.
//!
//! These guard against the two classes of abuse a sandboxed evaluator has
//! to worry about: denial-of-service via unbounded arithmetic (`2**huge`,
//! `"x"*huge`), and escape via attribute walking (`().__class__.__bases__`
//! style chains that reach process internals).

use crate::error::{Error, Result};
use crate::value::PyValue;

pub const MAX_EXPONENT: i64 = 10_000;
pub const MAX_STR_LEN: usize = 2 << 17; // 256 KiB
pub const MAX_SHIFT: i64 = 1_000;
pub const MAX_OPEN_BUFFER: i64 = 2 << 17;

pub const RESERVED_WORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield", "exec", "eval", "execfile", "__import__", "__package__",
    "__fstring__",
];

/// Attribute names that are unsafe for every object, regardless of type.
pub const UNSAFE_ATTRS: &[&str] = &[
    "__subclasses__",
    "__bases__",
    "__globals__",
    "__code__",
    "__reduce__",
    "__reduce_ex__",
    "__mro__",
    "__closure__",
    "__func__",
    "__self__",
    "__module__",
    "__dict__",
    "__class__",
    "__call__",
    "__get__",
    "__getattribute__",
    "__subclasshook__",
    "__new__",
    "__init__",
    "func_globals",
    "func_code",
    "func_closure",
    "im_class",
    "im_func",
    "im_self",
    "gi_code",
    "gi_frame",
    "f_locals",
    "__asteval__",
    "mro",
];

/// Attribute names unsafe only for particular value types.
pub fn unsafe_for_type(value: &PyValue, attr: &str) -> bool {
    matches!(value, PyValue::Str(_)) && (attr == "format" || attr == "format_map")
}

/// Universal denylist check shared by attribute read, assignment, and
/// deletion: every dunder plus the explicit `UNSAFE_ATTRS` list.
pub fn is_unsafe_attr_name(attr: &str) -> bool {
    UNSAFE_ATTRS.contains(&attr) || (attr.starts_with("__") && attr.ends_with("__") && attr.len() > 4)
}

/// `a ** b`, rejecting exponents large enough to be a denial-of-service.
pub fn safe_pow(base: &PyValue, exp: &PyValue) -> Result<PyValue> {
    if let Some(e) = exp.as_int() {
        if e > MAX_EXPONENT {
            return Err(Error::Runtime(format!(
                "Invalid exponent, max exponent is {MAX_EXPONENT}"
            )));
        }
    }
    match (base, exp) {
        (PyValue::Int(a), PyValue::Int(b)) if *b >= 0 => Ok(PyValue::Int(a.pow(*b as u32))),
        _ => {
            let a = base
                .as_float()
                .ok_or_else(|| Error::Type(format!("unsupported operand type for **: '{}'", base.type_name())))?;
            let b = exp
                .as_float()
                .ok_or_else(|| Error::Type(format!("unsupported operand type for **: '{}'", exp.type_name())))?;
            Ok(PyValue::Float(a.powf(b)))
        }
    }
}

/// String/list repetition or numeric multiplication, rejecting a
/// projected result length over `MAX_STR_LEN`.
pub fn safe_mul(a: &PyValue, b: &PyValue) -> Result<PyValue> {
    match (a, b) {
        (PyValue::Str(s), PyValue::Int(n)) | (PyValue::Int(n), PyValue::Str(s)) => {
            let n = (*n).max(0) as usize;
            if s.len().saturating_mul(n) > MAX_STR_LEN {
                return Err(Error::Runtime(format!(
                    "String length exceeded, max string length is {MAX_STR_LEN}"
                )));
            }
            Ok(PyValue::Str(s.repeat(n)))
        }
        (PyValue::List(items), PyValue::Int(n)) | (PyValue::Int(n), PyValue::List(items)) => {
            let n = (*n).max(0) as usize;
            if items.len().saturating_mul(n) > MAX_STR_LEN {
                return Err(Error::Runtime(format!(
                    "String length exceeded, max string length is {MAX_STR_LEN}"
                )));
            }
            let mut out = Vec::with_capacity(items.len() * n);
            for _ in 0..n {
                out.extend(items.iter().cloned());
            }
            Ok(PyValue::List(out))
        }
        _ => numeric_mul(a, b),
    }
}

fn numeric_mul(a: &PyValue, b: &PyValue) -> Result<PyValue> {
    match (a, b) {
        (PyValue::Int(x), PyValue::Int(y)) => Ok(PyValue::Int(x.wrapping_mul(*y))),
        _ => {
            let x = a
                .as_float()
                .ok_or_else(|| Error::Type(format!("unsupported operand type for *: '{}'", a.type_name())))?;
            let y = b
                .as_float()
                .ok_or_else(|| Error::Type(format!("unsupported operand type for *: '{}'", b.type_name())))?;
            Ok(PyValue::Float(x * y))
        }
    }
}

/// `a + b`, rejecting string concatenation whose result exceeds
/// `MAX_STR_LEN`.
pub fn safe_add(a: &PyValue, b: &PyValue) -> Result<PyValue> {
    match (a, b) {
        (PyValue::Str(x), PyValue::Str(y)) => {
            if x.len() + y.len() > MAX_STR_LEN {
                return Err(Error::Runtime(format!(
                    "String length exceeded, max string length is {MAX_STR_LEN}"
                )));
            }
            Ok(PyValue::Str(format!("{x}{y}")))
        }
        (PyValue::List(x), PyValue::List(y)) => {
            let mut out = x.clone();
            out.extend(y.iter().cloned());
            Ok(PyValue::List(out))
        }
        (PyValue::Tuple(x), PyValue::Tuple(y)) => {
            let mut out = x.clone();
            out.extend(y.iter().cloned());
            Ok(PyValue::Tuple(out))
        }
        (PyValue::Int(x), PyValue::Int(y)) => Ok(PyValue::Int(x.wrapping_add(*y))),
        _ => {
            let x = a
                .as_float()
                .ok_or_else(|| Error::Type(format!("unsupported operand type for +: '{}'", a.type_name())))?;
            let y = b
                .as_float()
                .ok_or_else(|| Error::Type(format!("unsupported operand type for +: '{}'", b.type_name())))?;
            Ok(PyValue::Float(x + y))
        }
    }
}

/// `a << b`, rejecting shift amounts large enough to blow up memory.
pub fn safe_lshift(a: &PyValue, b: &PyValue) -> Result<PyValue> {
    let shift = b
        .as_int()
        .ok_or_else(|| Error::Type("unsupported operand type for <<".to_string()))?;
    if shift > MAX_SHIFT {
        return Err(Error::Runtime(format!(
            "Invalid left shift, max left shift is {MAX_SHIFT}"
        )));
    }
    let base = a
        .as_int()
        .ok_or_else(|| Error::Type("unsupported operand type for <<".to_string()))?;
    Ok(PyValue::Int(base.wrapping_shl(shift as u32)))
}

/// Safe `getattr`: applies the universal denylist, the dunder rule, the
/// per-type denylist, and (unless `allow_unsafe_modules`) rejects values
/// that resolve to one of the unsafe host modules.
pub fn safe_getattr(
    obj: &dyn crate::value::HostObject,
    attr: &str,
    allow_unsafe_modules: bool,
) -> Result<PyValue> {
    if is_unsafe_attr_name(attr) {
        return Err(Error::Attribute(format!(
            "no safe attribute '{attr}' for {}",
            obj.repr()
        )));
    }

    match obj.get_attr(attr) {
        Some(value) => {
            if unsafe_for_type(&value, attr) {
                return Err(Error::Attribute(format!(
                    "no safe attribute '{attr}' for {}",
                    obj.repr()
                )));
            }
            if !allow_unsafe_modules && is_unsafe_module_name(obj.type_name()) {
                return Err(Error::Attribute(format!(
                    "no safe attribute '{attr}' for {}",
                    obj.repr()
                )));
            }
            Ok(value)
        }
        None => Err(Error::Attribute(format!(
            "'{}' object has no attribute '{attr}'",
            obj.type_name()
        ))),
    }
}

/// The conceptual "filesystem / process-control surface" modules that
/// `safe_getattr` refuses to hand back unless unsafe modules are allowed.
const UNSAFE_MODULES: &[&str] = &["io", "os", "sys", "ctypes"];

fn is_unsafe_module_name(name: &str) -> bool {
    UNSAFE_MODULES.contains(&name)
}

/// Read-only version of `open()`: rejects write modes and oversized
/// buffering.
pub fn safe_open(mode: &str, buffering: i64) -> Result<()> {
    if !matches!(mode, "r" | "rb" | "rU") {
        return Err(Error::Runtime(
            "Invalid open file mode, must be 'r', 'rb', or 'rU'".to_string(),
        ));
    }
    if buffering > MAX_OPEN_BUFFER {
        return Err(Error::Runtime(format!(
            "Invalid buffering value, max buffer size is {MAX_OPEN_BUFFER}"
        )));
    }
    Ok(())
}

/// Whether `name` is a legal identifier and not a reserved word.
pub fn valid_symbol_name(name: &str) -> bool {
    if RESERVED_WORDS.contains(&name) {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow_within_bound_succeeds() {
        assert!(safe_pow(&PyValue::Int(2), &PyValue::Int(MAX_EXPONENT)).is_ok());
    }

    #[test]
    fn pow_over_bound_raises_runtime_error() {
        let err = safe_pow(&PyValue::Int(2), &PyValue::Int(MAX_EXPONENT + 1)).unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
        assert!(err.message().contains("MAX_EXPONENT") || err.message().contains("exponent"));
    }

    #[test]
    fn lshift_over_bound_raises() {
        let err = safe_lshift(&PyValue::Int(1), &PyValue::Int(MAX_SHIFT + 1)).unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
    }

    #[test]
    fn string_mul_over_bound_raises() {
        let big = (MAX_STR_LEN + 1) as i64;
        let err = safe_mul(&PyValue::Str("x".into()), &PyValue::Int(big)).unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
    }

    #[test]
    fn string_add_over_bound_raises() {
        let a = PyValue::Str("x".repeat(MAX_STR_LEN));
        let b = PyValue::Str("y".repeat(2));
        let err = safe_add(&a, &b).unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
    }

    #[test]
    fn open_rejects_write_modes() {
        assert!(safe_open("wb", 0).is_err());
        assert!(safe_open("r", 0).is_ok());
    }

    #[test]
    fn valid_symbol_name_rejects_keywords_and_bad_chars() {
        assert!(valid_symbol_name("foo_bar"));
        assert!(!valid_symbol_name("class"));
        assert!(!valid_symbol_name("1abc"));
        assert!(!valid_symbol_name("a-b"));
    }
}
