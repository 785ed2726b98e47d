//! Preloaded built-in functions.
//!
//! Covers the numeric/string/container built-ins named in the embedding
//! surface: type conversions, sequence helpers, and the small set of
//! inspection functions (`isinstance`, `type`, `repr`, `hash`). `print` is
//! handled by the interpreter directly, since it needs access to the
//! configured writer rather than pre-evaluated arguments alone.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::operators::compare_values;
use crate::safety;
use crate::value::{HostObject, NamedNative, PyValue};

fn check_args(name: &str, args: &[PyValue], n: usize) -> Result<()> {
    if args.len() != n {
        return Err(Error::Type(format!(
            "{name}() takes exactly {n} argument(s) ({} given)",
            args.len()
        )));
    }
    Ok(())
}

fn to_iterable_items(val: &PyValue) -> Result<Vec<PyValue>> {
    match val {
        PyValue::List(items) | PyValue::Tuple(items) | PyValue::Set(items) => Ok(items.clone()),
        PyValue::Dict(pairs) => Ok(pairs.iter().map(|(k, _)| k.clone()).collect()),
        PyValue::Str(s) => Ok(s.chars().map(|c| PyValue::Str(c.to_string())).collect()),
        other => Err(Error::Type(format!("'{}' object is not iterable", other.type_name()))),
    }
}

/// Dispatches a preloaded builtin by name. Returns `None` if `name` isn't
/// one of the built-ins this crate preloads, so the caller can fall back to
/// a symbol-table lookup.
pub fn try_builtin(name: &str, args: Vec<PyValue>) -> Option<Result<PyValue>> {
    Some(match name {
        "len" => builtin_len(args),
        "str" => builtin_str(args),
        "int" => builtin_int(args),
        "float" => builtin_float(args),
        "bool" => builtin_bool(args),
        "list" => builtin_list(args),
        "tuple" => builtin_tuple(args),
        "set" => builtin_set(args),
        "dict" => builtin_dict(args),
        "range" => builtin_range(args),
        "abs" => builtin_abs(args),
        "min" => builtin_minmax(args, true),
        "max" => builtin_minmax(args, false),
        "sum" => builtin_sum(args),
        "sorted" => builtin_sorted(args),
        "reversed" => builtin_reversed(args),
        "enumerate" => builtin_enumerate(args),
        "zip" => builtin_zip(args),
        "any" => builtin_any(args),
        "all" => builtin_all(args),
        "isinstance" => builtin_isinstance(args),
        "type" => builtin_type(args),
        "repr" => builtin_repr(args),
        "bin" => builtin_radix(args, 2, "0b"),
        "hex" => builtin_radix(args, 16, "0x"),
        "oct" => builtin_radix(args, 8, "0o"),
        "divmod" => builtin_divmod(args),
        "pow" => builtin_pow(args),
        "round" => builtin_round(args),
        "chr" => builtin_chr(args),
        "ord" => builtin_ord(args),
        "hash" => builtin_hash(args),
        "format" => builtin_format(args),
        "open" => builtin_open(args),
        _ => return None,
    })
}

fn builtin_len(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("len", &args, 1)?;
    Ok(PyValue::Int(to_iterable_items(&args[0])?.len() as i64))
}

fn builtin_str(args: Vec<PyValue>) -> Result<PyValue> {
    Ok(PyValue::Str(args.first().map(PyValue::py_str).unwrap_or_default()))
}

fn builtin_int(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("int", &args, 1)?;
    match &args[0] {
        PyValue::Int(i) => Ok(PyValue::Int(*i)),
        PyValue::Bool(b) => Ok(PyValue::Int(*b as i64)),
        PyValue::Float(f) => Ok(PyValue::Int(*f as i64)),
        PyValue::Str(s) => s
            .trim()
            .parse()
            .map(PyValue::Int)
            .map_err(|_| Error::Value(format!("invalid literal for int() with base 10: '{s}'"))),
        other => Err(Error::Type(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_float(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("float", &args, 1)?;
    match &args[0] {
        PyValue::Float(f) => Ok(PyValue::Float(*f)),
        PyValue::Int(i) => Ok(PyValue::Float(*i as f64)),
        PyValue::Bool(b) => Ok(PyValue::Float(*b as i64 as f64)),
        PyValue::Str(s) => s
            .trim()
            .parse()
            .map(PyValue::Float)
            .map_err(|_| Error::Value(format!("could not convert string to float: '{s}'"))),
        other => Err(Error::Type(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_bool(args: Vec<PyValue>) -> Result<PyValue> {
    Ok(PyValue::Bool(args.first().map(PyValue::is_truthy).unwrap_or(false)))
}

fn builtin_list(args: Vec<PyValue>) -> Result<PyValue> {
    match args.first() {
        None => Ok(PyValue::List(Vec::new())),
        Some(v) => Ok(PyValue::List(to_iterable_items(v)?)),
    }
}

fn builtin_tuple(args: Vec<PyValue>) -> Result<PyValue> {
    match args.first() {
        None => Ok(PyValue::Tuple(Vec::new())),
        Some(v) => Ok(PyValue::Tuple(to_iterable_items(v)?)),
    }
}

fn builtin_set(args: Vec<PyValue>) -> Result<PyValue> {
    let items = match args.first() {
        None => Vec::new(),
        Some(v) => to_iterable_items(v)?,
    };
    let mut out: Vec<PyValue> = Vec::new();
    for item in items {
        if !out.iter().any(|x| x.py_eq(&item)) {
            out.push(item);
        }
    }
    Ok(PyValue::Set(out))
}

fn builtin_dict(args: Vec<PyValue>) -> Result<PyValue> {
    match args.first() {
        None => Ok(PyValue::Dict(Vec::new())),
        Some(PyValue::Dict(pairs)) => Ok(PyValue::Dict(pairs.clone())),
        Some(other) => Err(Error::Type(format!(
            "dict() argument must be a dict, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_range(args: Vec<PyValue>) -> Result<PyValue> {
    let ints: Result<Vec<i64>> = args
        .iter()
        .map(|v| v.as_int().ok_or_else(|| Error::Type("range() arguments must be integers".to_string())))
        .collect();
    let ints = ints?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(Error::Type("range() takes 1 to 3 arguments".to_string())),
    };
    if step == 0 {
        return Err(Error::Value("range() arg 3 must not be zero".to_string()));
    }
    let mut items = Vec::new();
    let mut i = start;
    if step > 0 {
        while i < stop {
            items.push(PyValue::Int(i));
            i += step;
        }
    } else {
        while i > stop {
            items.push(PyValue::Int(i));
            i += step;
        }
    }
    Ok(PyValue::List(items))
}

fn builtin_abs(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("abs", &args, 1)?;
    match &args[0] {
        PyValue::Int(i) => Ok(PyValue::Int(i.abs())),
        PyValue::Float(f) => Ok(PyValue::Float(f.abs())),
        PyValue::Bool(b) => Ok(PyValue::Int(*b as i64)),
        other => Err(Error::Type(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_minmax(args: Vec<PyValue>, want_min: bool) -> Result<PyValue> {
    let items = if args.len() == 1 {
        to_iterable_items(&args[0])?
    } else {
        args
    };
    let mut it = items.into_iter();
    let mut best = it
        .next()
        .ok_or_else(|| Error::Value(if want_min { "min() arg is an empty sequence" } else { "max() arg is an empty sequence" }.to_string()))?;
    for item in it {
        let better = if want_min {
            compare_values(&item, &best, |a, b| a < b, |a, b| a < b)?
        } else {
            compare_values(&item, &best, |a, b| a > b, |a, b| a > b)?
        };
        if better {
            best = item;
        }
    }
    Ok(best)
}

fn builtin_sum(args: Vec<PyValue>) -> Result<PyValue> {
    if args.is_empty() {
        return Err(Error::Type("sum() takes at least 1 argument".to_string()));
    }
    let items = to_iterable_items(&args[0])?;
    let mut start = args.get(1).cloned().unwrap_or(PyValue::Int(0));
    for item in items {
        start = crate::operators::apply_binop(&rustpython_ast::Operator::Add, &start, &item)?;
    }
    Ok(start)
}

fn builtin_sorted(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("sorted", &args, 1)?;
    let mut items = to_iterable_items(&args[0])?;
    let mut err = None;
    items.sort_by(|a, b| {
        match compare_values(a, b, |x, y| x < y, |x, y| x < y) {
            Ok(true) => std::cmp::Ordering::Less,
            Ok(false) => std::cmp::Ordering::Greater,
            Err(e) => {
                err.get_or_insert(e);
                std::cmp::Ordering::Equal
            }
        }
    });
    if let Some(e) = err {
        return Err(e);
    }
    Ok(PyValue::List(items))
}

fn builtin_reversed(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("reversed", &args, 1)?;
    let mut items = to_iterable_items(&args[0])?;
    items.reverse();
    Ok(PyValue::List(items))
}

fn builtin_enumerate(args: Vec<PyValue>) -> Result<PyValue> {
    if args.is_empty() || args.len() > 2 {
        return Err(Error::Type("enumerate() takes 1 or 2 arguments".to_string()));
    }
    let start = args.get(1).and_then(PyValue::as_int).unwrap_or(0);
    let items = to_iterable_items(&args[0])?;
    Ok(PyValue::List(
        items
            .into_iter()
            .enumerate()
            .map(|(i, v)| PyValue::Tuple(vec![PyValue::Int(start + i as i64), v]))
            .collect(),
    ))
}

fn builtin_zip(args: Vec<PyValue>) -> Result<PyValue> {
    let sequences: Result<Vec<Vec<PyValue>>> = args.iter().map(to_iterable_items).collect();
    let sequences = sequences?;
    let len = sequences.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(PyValue::Tuple(sequences.iter().map(|s| s[i].clone()).collect()));
    }
    Ok(PyValue::List(out))
}

fn builtin_any(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("any", &args, 1)?;
    Ok(PyValue::Bool(to_iterable_items(&args[0])?.iter().any(PyValue::is_truthy)))
}

fn builtin_all(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("all", &args, 1)?;
    Ok(PyValue::Bool(to_iterable_items(&args[0])?.iter().all(PyValue::is_truthy)))
}

fn builtin_isinstance(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("isinstance", &args, 2)?;
    let type_name = match &args[1] {
        PyValue::Str(s) => s.clone(),
        PyValue::Native(n) => n.name.clone(),
        other => other.type_name().to_string(),
    };
    Ok(PyValue::Bool(args[0].type_name() == type_name))
}

fn builtin_type(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("type", &args, 1)?;
    Ok(PyValue::Str(args[0].type_name().to_string()))
}

fn builtin_repr(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("repr", &args, 1)?;
    Ok(PyValue::Str(args[0].py_repr()))
}

fn builtin_radix(args: Vec<PyValue>, radix: u32, prefix: &str) -> Result<PyValue> {
    check_args("bin/hex/oct", &args, 1)?;
    let i = args[0]
        .as_int()
        .ok_or_else(|| Error::Type("argument must be an int".to_string()))?;
    let sign = if i < 0 { "-" } else { "" };
    let digits = match radix {
        2 => format!("{:b}", i.unsigned_abs()),
        8 => format!("{:o}", i.unsigned_abs()),
        16 => format!("{:x}", i.unsigned_abs()),
        _ => unreachable!(),
    };
    Ok(PyValue::Str(format!("{sign}{prefix}{digits}")))
}

fn builtin_divmod(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("divmod", &args, 2)?;
    match (&args[0], &args[1]) {
        (PyValue::Int(a), PyValue::Int(b)) => {
            if *b == 0 {
                Err(Error::ZeroDivision("integer division or modulo by zero".to_string()))
            } else {
                Ok(PyValue::Tuple(vec![
                    PyValue::Int(a.div_euclid(*b)),
                    PyValue::Int(a.rem_euclid(*b)),
                ]))
            }
        }
        _ => {
            let a = args[0]
                .as_float()
                .ok_or_else(|| Error::Type("unsupported operand type for divmod()".to_string()))?;
            let b = args[1]
                .as_float()
                .ok_or_else(|| Error::Type("unsupported operand type for divmod()".to_string()))?;
            Ok(PyValue::Tuple(vec![
                PyValue::Float((a / b).floor()),
                PyValue::Float(a.rem_euclid(b)),
            ]))
        }
    }
}

fn builtin_pow(args: Vec<PyValue>) -> Result<PyValue> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::Type("pow() takes 2 or 3 arguments".to_string()));
    }
    let result = crate::safety::safe_pow(&args[0], &args[1])?;
    if let Some(modulus) = args.get(2) {
        match (&result, modulus) {
            (PyValue::Int(r), PyValue::Int(m)) if *m != 0 => Ok(PyValue::Int(r.rem_euclid(*m))),
            _ => Err(Error::Type("pow() 3rd argument requires integers".to_string())),
        }
    } else {
        Ok(result)
    }
}

fn builtin_round(args: Vec<PyValue>) -> Result<PyValue> {
    if args.is_empty() || args.len() > 2 {
        return Err(Error::Type("round() takes 1 or 2 arguments".to_string()));
    }
    let x = args[0]
        .as_float()
        .ok_or_else(|| Error::Type("type must be a number".to_string()))?;
    match args.get(1) {
        None => Ok(PyValue::Int(x.round() as i64)),
        Some(n) => {
            let n = n.as_int().ok_or_else(|| Error::Type("ndigits must be an int".to_string()))?;
            let factor = 10f64.powi(n as i32);
            Ok(PyValue::Float((x * factor).round() / factor))
        }
    }
}

fn builtin_chr(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("chr", &args, 1)?;
    let i = args[0].as_int().ok_or_else(|| Error::Type("an integer is required".to_string()))?;
    char::from_u32(i as u32)
        .map(|c| PyValue::Str(c.to_string()))
        .ok_or_else(|| Error::Value(format!("chr() arg not in range: {i}")))
}

fn builtin_ord(args: Vec<PyValue>) -> Result<PyValue> {
    check_args("ord", &args, 1)?;
    match &args[0] {
        PyValue::Str(s) if s.chars().count() == 1 => Ok(PyValue::Int(s.chars().next().unwrap() as i64)),
        _ => Err(Error::Type("ord() expected a character".to_string())),
    }
}

fn builtin_hash(args: Vec<PyValue>) -> Result<PyValue> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    check_args("hash", &args, 1)?;
    let mut hasher = DefaultHasher::new();
    match &args[0] {
        PyValue::Str(s) => s.hash(&mut hasher),
        PyValue::Int(i) => return Ok(PyValue::Int(*i)),
        PyValue::Bool(b) => return Ok(PyValue::Int(*b as i64)),
        other => {
            return Err(Error::Type(format!(
                "unhashable type: '{}'",
                other.type_name()
            )))
        }
    }
    Ok(PyValue::Int(hasher.finish() as i64))
}

/// Read-only file handle for the `open()` builtin. Content is slurped
/// eagerly at open time; there is no lazy streaming since the safety
/// policy only ever allows read modes.
struct FileHandle {
    name: String,
    content: String,
}

impl HostObject for FileHandle {
    fn type_name(&self) -> &str {
        "file"
    }

    fn get_attr(&self, attr: &str) -> Option<PyValue> {
        match attr {
            "name" => Some(PyValue::Str(self.name.clone())),
            "closed" => Some(PyValue::Bool(false)),
            "read" => {
                let content = self.content.clone();
                Some(native("read", move |_| Ok(PyValue::Str(content.clone()))))
            }
            "readline" => {
                let first_line = self.content.lines().next().unwrap_or_default().to_string();
                Some(native("readline", move |_| Ok(PyValue::Str(first_line.clone()))))
            }
            "readlines" => {
                let lines: Vec<PyValue> = self
                    .content
                    .lines()
                    .map(|l| PyValue::Str(l.to_string()))
                    .collect();
                Some(native("readlines", move |_| Ok(PyValue::List(lines.clone()))))
            }
            "close" => Some(native("close", |_| Ok(PyValue::None))),
            _ => None,
        }
    }

    fn repr(&self) -> String {
        format!("<file '{}' mode 'r'>", self.name)
    }
}

fn native(name: &str, f: impl Fn(Vec<PyValue>) -> Result<PyValue> + 'static) -> PyValue {
    PyValue::Native(NamedNative {
        name: name.to_string(),
        info: None,
        func: Rc::new(f),
    })
}

fn builtin_open(args: Vec<PyValue>) -> Result<PyValue> {
    if args.is_empty() || args.len() > 3 {
        return Err(Error::Type("open() takes 1 to 3 arguments".to_string()));
    }
    let path = args[0]
        .as_str()
        .ok_or_else(|| Error::Type("open() argument 'file' must be str".to_string()))?
        .to_string();
    let mode = args
        .get(1)
        .and_then(PyValue::as_str)
        .unwrap_or("r")
        .to_string();
    let buffering = args.get(2).and_then(PyValue::as_int).unwrap_or(-1);
    safety::safe_open(&mode, buffering)?;

    let content = std::fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(format!("[Errno 2] No such file or directory: '{path}'"))
        } else {
            Error::Runtime(e.to_string())
        }
    })?;
    Ok(PyValue::Host(Rc::new(FileHandle { name: path, content })))
}

fn builtin_format(args: Vec<PyValue>) -> Result<PyValue> {
    if args.is_empty() || args.len() > 2 {
        return Err(Error::Type("format() takes 1 or 2 arguments".to_string()));
    }
    let spec = args.get(1).and_then(PyValue::as_str).unwrap_or("");
    Ok(PyValue::Str(crate::format_spec::format_value(&args[0], spec)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_of_list_and_string() {
        assert!(matches!(
            try_builtin("len", vec![PyValue::Str("abc".into())]),
            Some(Ok(PyValue::Int(3)))
        ));
    }

    #[test]
    fn sum_with_start_value() {
        let items = PyValue::List(vec![PyValue::Int(1), PyValue::Int(2), PyValue::Int(3)]);
        let r = try_builtin("sum", vec![items, PyValue::Int(10)]).unwrap().unwrap();
        assert!(matches!(r, PyValue::Int(16)));
    }

    #[test]
    fn unknown_name_returns_none() {
        assert!(try_builtin("not_a_builtin", vec![]).is_none());
    }

    #[test]
    fn divmod_matches_python_floor_semantics() {
        let r = try_builtin("divmod", vec![PyValue::Int(-7), PyValue::Int(2)]).unwrap().unwrap();
        assert!(matches!(r, PyValue::Tuple(ref t) if matches!(t[0], PyValue::Int(-4)) && matches!(t[1], PyValue::Int(1))));
    }

    #[test]
    fn open_rejects_write_mode() {
        let err = try_builtin("open", vec![PyValue::Str("whatever.txt".into()), PyValue::Str("wb".into())])
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
    }

    #[test]
    fn format_applies_the_given_spec() {
        let r = try_builtin("format", vec![PyValue::Float(3.14159), PyValue::Str(".2f".into())])
            .unwrap()
            .unwrap();
        assert!(matches!(r, PyValue::Str(s) if s == "3.14"));
    }

    #[test]
    fn open_reads_file_contents() {
        let path = std::env::temp_dir().join("asteval_builtins_open_test.txt");
        std::fs::write(&path, "hello\nworld").unwrap();
        let r = try_builtin("open", vec![PyValue::Str(path.to_string_lossy().to_string())])
            .unwrap()
            .unwrap();
        match r {
            PyValue::Host(h) => {
                let read_fn = h.get_attr("read").unwrap();
                if let PyValue::Native(n) = read_fn {
                    let content = (n.func)(vec![]).unwrap();
                    assert!(matches!(content, PyValue::Str(s) if s == "hello\nworld"));
                } else {
                    panic!("expected native callable");
                }
            }
            _ => panic!("expected host file object"),
        }
        std::fs::remove_file(&path).ok();
    }
}
