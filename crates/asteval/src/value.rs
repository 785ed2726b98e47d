//! Runtime value representation. "No such symbol" and "bound to `None`"
//! are distinguished the ordinary way, with `Option<&PyValue>` from
//! `SymbolTable::get`. A procedure that falls off the end of its body and
//! one that executes a bare `return`/`return None` are not distinguished
//! either: `call_procedure` maps both to `PyValue::None`, matching Python,
//! where the two are observationally identical. Neither case calls for a
//! dedicated sentinel type.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::procedure::Procedure;
use crate::tool::ToolInfo;

/// A callable registered by the host, reachable from script code.
pub type NativeFn = Rc<dyn Fn(Vec<PyValue>) -> Result<PyValue, crate::error::Error>>;

/// The runtime value type every expression evaluates to.
///
/// Integers are represented as `i64`. The distilled requirements call
/// arbitrary precision "desirable"; this crate keeps a fixed-width integer
/// because introducing a bignum dependency would be the only dependency in
/// the whole crate not already present in the corpus it was grown from (see
/// DESIGN.md).
#[derive(Clone)]
pub enum PyValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Ellipsis,
    List(Vec<PyValue>),
    Tuple(Vec<PyValue>),
    /// Association list rather than a hash map: `PyValue` is not `Hash`
    /// (floats and containers aren't hashable in a total way), and
    /// insertion order is explicitly irrelevant per the data model, so a
    /// `Vec` of pairs is the simplest faithful representation.
    Dict(Vec<(PyValue, PyValue)>),
    Set(Vec<PyValue>),
    Function(Rc<Procedure>),
    Native(NamedNative),
    /// An opaque value passed through from the host; attribute access on
    /// it is mediated entirely by `safe_getattr`.
    Host(Rc<dyn HostObject>),
}

/// A host-provided callable plus the metadata needed to describe it.
#[derive(Clone)]
pub struct NamedNative {
    pub name: String,
    pub info: Option<ToolInfo>,
    pub func: NativeFn,
}

/// Capability surface for opaque host objects exposed to script code.
///
/// `safe_getattr` interposes on every attribute read; implementors only
/// need to answer "does this attribute exist, and what's its value,"
/// the denylist check happens in `crate::safety`.
pub trait HostObject {
    fn type_name(&self) -> &str;
    fn get_attr(&self, name: &str) -> Option<PyValue>;
    fn repr(&self) -> String {
        format!("<{} object>", self.type_name())
    }

    /// Enter the context-manager protocol for a `with` statement. `None`
    /// means this object has no such protocol, which the evaluator turns
    /// into a `TypeError` before the `with` body runs.
    fn enter(&self) -> Option<crate::error::Result<PyValue>> {
        None
    }

    /// Exit the context-manager protocol, called in reverse entry order,
    /// even if the `with` body raised. Only invoked on objects whose
    /// `enter` returned `Some`.
    fn exit(&self) -> crate::error::Result<()> {
        Ok(())
    }

    /// Set an attribute (`obj.attr = value`). `None` means this object
    /// doesn't support attribute assignment.
    fn set_attr(&self, name: &str, value: PyValue) -> Option<crate::error::Result<()>> {
        let _ = (name, value);
        None
    }

    /// Delete an attribute (`del obj.attr`). `None` means this object
    /// doesn't support attribute deletion.
    fn del_attr(&self, name: &str) -> Option<crate::error::Result<()>> {
        let _ = name;
        None
    }
}

/// Error produced when converting a `PyValue` to a concrete Rust type fails.
#[derive(Debug, Clone)]
pub struct TypeError {
    pub expected: String,
    pub got: String,
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, got {}", self.expected, self.got)
    }
}

impl std::error::Error for TypeError {}

/// Converts a `PyValue` into a concrete Rust type, used by the `#[tool]`
/// macro to bind script-provided arguments to native function parameters.
pub trait FromPyValue: Sized {
    fn from_py_value(value: &PyValue) -> Result<Self, TypeError>;
}

impl FromPyValue for PyValue {
    fn from_py_value(value: &PyValue) -> Result<Self, TypeError> {
        Ok(value.clone())
    }
}

impl FromPyValue for String {
    fn from_py_value(value: &PyValue) -> Result<Self, TypeError> {
        match value {
            PyValue::Str(s) => Ok(s.clone()),
            other => Err(TypeError {
                expected: "str".into(),
                got: other.type_name().into(),
            }),
        }
    }
}

macro_rules! impl_from_py_value_int {
    ($($t:ty),*) => {
        $(impl FromPyValue for $t {
            fn from_py_value(value: &PyValue) -> Result<Self, TypeError> {
                match value {
                    PyValue::Int(i) => Ok(*i as $t),
                    PyValue::Bool(b) => Ok(*b as $t),
                    other => Err(TypeError { expected: "int".into(), got: other.type_name().into() }),
                }
            }
        })*
    };
}
impl_from_py_value_int!(i64, i32, i16, i8, isize, u64, u32, u16, u8, usize);

macro_rules! impl_from_py_value_float {
    ($($t:ty),*) => {
        $(impl FromPyValue for $t {
            fn from_py_value(value: &PyValue) -> Result<Self, TypeError> {
                match value {
                    PyValue::Float(f) => Ok(*f as $t),
                    PyValue::Int(i) => Ok(*i as $t),
                    other => Err(TypeError { expected: "float".into(), got: other.type_name().into() }),
                }
            }
        })*
    };
}
impl_from_py_value_float!(f64, f32);

impl FromPyValue for bool {
    fn from_py_value(value: &PyValue) -> Result<Self, TypeError> {
        match value {
            PyValue::Bool(b) => Ok(*b),
            other => Err(TypeError {
                expected: "bool".into(),
                got: other.type_name().into(),
            }),
        }
    }
}

impl<T: FromPyValue> FromPyValue for Option<T> {
    fn from_py_value(value: &PyValue) -> Result<Self, TypeError> {
        match value {
            PyValue::None => Ok(None),
            other => T::from_py_value(other).map(Some),
        }
    }
}

impl<T: FromPyValue> FromPyValue for Vec<T> {
    fn from_py_value(value: &PyValue) -> Result<Self, TypeError> {
        match value {
            PyValue::List(items) | PyValue::Tuple(items) => {
                items.iter().map(T::from_py_value).collect()
            }
            other => Err(TypeError {
                expected: "list".into(),
                got: other.type_name().into(),
            }),
        }
    }
}

impl<T: FromPyValue> FromPyValue for HashMap<String, T> {
    fn from_py_value(value: &PyValue) -> Result<Self, TypeError> {
        match value {
            PyValue::Dict(pairs) => pairs
                .iter()
                .map(|(k, v)| {
                    let key = String::from_py_value(k)?;
                    let val = T::from_py_value(v)?;
                    Ok((key, val))
                })
                .collect(),
            other => Err(TypeError {
                expected: "dict".into(),
                got: other.type_name().into(),
            }),
        }
    }
}

impl FromPyValue for () {
    fn from_py_value(_value: &PyValue) -> Result<Self, TypeError> {
        Ok(())
    }
}

impl From<PyValue> for PyValue {
    fn from(v: PyValue) -> Self {
        v
    }
}

macro_rules! impl_into_pyvalue {
    ($t:ty, $variant:ident) => {
        impl From<$t> for PyValue {
            fn from(v: $t) -> Self {
                PyValue::$variant(v.into())
            }
        }
    };
}
impl_into_pyvalue!(String, Str);
impl_into_pyvalue!(bool, Bool);
impl_into_pyvalue!(i64, Int);
impl_into_pyvalue!(f64, Float);

impl From<&str> for PyValue {
    fn from(v: &str) -> Self {
        PyValue::Str(v.to_string())
    }
}

impl From<()> for PyValue {
    fn from(_: ()) -> Self {
        PyValue::None
    }
}

impl<T: Into<PyValue>> From<Option<T>> for PyValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(x) => x.into(),
            None => PyValue::None,
        }
    }
}

impl<T: Into<PyValue>> From<Vec<T>> for PyValue {
    fn from(v: Vec<T>) -> Self {
        PyValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl PyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PyValue::None => "NoneType",
            PyValue::Bool(_) => "bool",
            PyValue::Int(_) => "int",
            PyValue::Float(_) => "float",
            PyValue::Str(_) => "str",
            PyValue::Bytes(_) => "bytes",
            PyValue::Ellipsis => "ellipsis",
            PyValue::List(_) => "list",
            PyValue::Tuple(_) => "tuple",
            PyValue::Dict(_) => "dict",
            PyValue::Set(_) => "set",
            PyValue::Function(_) => "function",
            PyValue::Native(_) => "builtin_function_or_method",
            PyValue::Host(_) => "object",
        }
    }

    /// Python truthiness: the rule every `if`/`while`/`and`/`or` relies on.
    pub fn is_truthy(&self) -> bool {
        match self {
            PyValue::None => false,
            PyValue::Bool(b) => *b,
            PyValue::Int(i) => *i != 0,
            PyValue::Float(f) => *f != 0.0,
            PyValue::Str(s) => !s.is_empty(),
            PyValue::Bytes(b) => !b.is_empty(),
            PyValue::Ellipsis => true,
            PyValue::List(v) | PyValue::Tuple(v) | PyValue::Set(v) => !v.is_empty(),
            PyValue::Dict(v) => !v.is_empty(),
            PyValue::Function(_) | PyValue::Native(_) | PyValue::Host(_) => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PyValue::Int(i) => Some(*i),
            PyValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PyValue::Float(f) => Some(*f),
            PyValue::Int(i) => Some(*i as f64),
            PyValue::Bool(b) => Some(*b as i64 as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Python equality (`==`), used both by `compare` and by `in`/dict
    /// lookup. Numeric types compare across `int`/`float`/`bool`.
    pub fn py_eq(&self, other: &PyValue) -> bool {
        use PyValue::*;
        match (self, other) {
            (None, None) => true,
            (Ellipsis, Ellipsis) => true,
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (List(a), List(b)) | (Tuple(a), Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            (Set(a), Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.py_eq(y)))
            }
            (Dict(a), Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(k2, v2)| k.py_eq(k2) && v.py_eq(v2))
                    })
            }
            _ => match (self.as_float(), other.as_float()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Python `repr()`.
    pub fn py_repr(&self) -> String {
        match self {
            PyValue::None => "None".to_string(),
            PyValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            PyValue::Int(i) => i.to_string(),
            PyValue::Float(f) => format_float(*f),
            PyValue::Str(s) => format!("{:?}", s),
            PyValue::Bytes(b) => format!("b{:?}", String::from_utf8_lossy(b)),
            PyValue::Ellipsis => "Ellipsis".to_string(),
            PyValue::List(items) => {
                format!(
                    "[{}]",
                    items.iter().map(PyValue::py_repr).collect::<Vec<_>>().join(", ")
                )
            }
            PyValue::Tuple(items) => {
                if items.len() == 1 {
                    format!("({},)", items[0].py_repr())
                } else {
                    format!(
                        "({})",
                        items.iter().map(PyValue::py_repr).collect::<Vec<_>>().join(", ")
                    )
                }
            }
            PyValue::Set(items) => {
                if items.is_empty() {
                    "set()".to_string()
                } else {
                    format!(
                        "{{{}}}",
                        items.iter().map(PyValue::py_repr).collect::<Vec<_>>().join(", ")
                    )
                }
            }
            PyValue::Dict(pairs) => format!(
                "{{{}}}",
                pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.py_repr(), v.py_repr()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            PyValue::Function(p) => format!("<function {}>", p.name),
            PyValue::Native(n) => format!("<built-in function {}>", n.name),
            PyValue::Host(h) => h.repr(),
        }
    }

    /// Python `str()`: like `repr()` except bare strings are unquoted —
    /// the distinction `print()` relies on.
    pub fn py_str(&self) -> String {
        match self {
            PyValue::Str(s) => s.clone(),
            other => other.py_repr(),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if f.is_nan() {
        return "nan".to_string();
    }
    if f == f.trunc() && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// Structural equality, in terms of `py_eq`'s Python `==` semantics.
/// Callables and host objects never compare equal, even to themselves,
/// since the data model gives them no identity to compare by.
impl PartialEq for PyValue {
    fn eq(&self, other: &Self) -> bool {
        self.py_eq(other)
    }
}

impl fmt::Display for PyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.py_str())
    }
}

impl fmt::Debug for PyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.py_repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_python() {
        assert!(!PyValue::Int(0).is_truthy());
        assert!(PyValue::Int(1).is_truthy());
        assert!(!PyValue::Str(String::new()).is_truthy());
        assert!(!PyValue::List(vec![]).is_truthy());
        assert!(PyValue::List(vec![PyValue::None]).is_truthy());
    }

    #[test]
    fn equality_crosses_numeric_types() {
        assert!(PyValue::Int(1).py_eq(&PyValue::Bool(true)));
        assert!(PyValue::Int(2).py_eq(&PyValue::Float(2.0)));
        assert!(!PyValue::Int(2).py_eq(&PyValue::Str("2".into())));
    }

    #[test]
    fn repr_quotes_strings_str_does_not() {
        let v = PyValue::Str("hi".to_string());
        assert_eq!(v.py_repr(), "\"hi\"");
        assert_eq!(v.py_str(), "hi");
    }

    #[test]
    fn float_repr_has_decimal_point() {
        assert_eq!(PyValue::Float(3.0).py_repr(), "3.0");
    }

    #[test]
    fn from_py_value_round_trips_common_types() {
        let v = PyValue::Int(42);
        assert_eq!(i64::from_py_value(&v).unwrap(), 42);
        let v = PyValue::None;
        assert_eq!(Option::<i64>::from_py_value(&v).unwrap(), None);
    }
}
