//! Python-style slicing for lists, tuples, and strings.

use crate::error::{Error, Result};
use crate::value::PyValue;

/// Slice a list with Python semantics: positive/negative indices, step
/// (including negative/reverse).
pub fn slice_list(items: &[PyValue], lower: Option<i64>, upper: Option<i64>, step: Option<i64>) -> Result<PyValue> {
    Ok(PyValue::List(slice_indices(items.len(), lower, upper, step)?
        .into_iter()
        .map(|i| items[i].clone())
        .collect()))
}

/// Same semantics as `slice_list`, wrapped as a `Tuple`.
pub fn slice_tuple(items: &[PyValue], lower: Option<i64>, upper: Option<i64>, step: Option<i64>) -> Result<PyValue> {
    Ok(PyValue::Tuple(slice_indices(items.len(), lower, upper, step)?
        .into_iter()
        .map(|i| items[i].clone())
        .collect()))
}

/// Slice a string with Python semantics, respecting Unicode char
/// boundaries (indices count `char`s, not bytes).
pub fn slice_string(s: &str, lower: Option<i64>, upper: Option<i64>, step: Option<i64>) -> Result<PyValue> {
    let chars: Vec<char> = s.chars().collect();
    Ok(PyValue::Str(
        slice_indices(chars.len(), lower, upper, step)?
            .into_iter()
            .map(|i| chars[i])
            .collect(),
    ))
}

/// Splice `replacement` into `items` at the given slice. A unit step
/// (the common case, `a[1:3] = [...]`) behaves like a true splice: the
/// replacement can be any length, growing or shrinking the list. Any
/// other step requires an exact length match, Python's rule for
/// "extended slice" assignment.
pub fn assign_slice_list(
    items: &mut Vec<PyValue>,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
    replacement: Vec<PyValue>,
) -> Result<()> {
    let step_val = step.unwrap_or(1);
    if step_val == 0 {
        return Err(Error::Value("slice step cannot be zero".to_string()));
    }
    if step_val == 1 {
        let len_i = items.len() as i64;
        let normalize = |i: i64| if i < 0 { i + len_i } else { i };
        let clamp = |i: i64| i.max(0).min(len_i);
        let start = clamp(lower.map(normalize).unwrap_or(0));
        let stop = clamp(upper.map(normalize).unwrap_or(len_i)).max(start);
        items.splice(start as usize..stop as usize, replacement);
        Ok(())
    } else {
        let indices = slice_indices(items.len(), lower, upper, step)?;
        if indices.len() != replacement.len() {
            return Err(Error::Value(format!(
                "attempt to assign sequence of size {} to extended slice of size {}",
                replacement.len(),
                indices.len()
            )));
        }
        for (idx, value) in indices.into_iter().zip(replacement) {
            items[idx] = value;
        }
        Ok(())
    }
}

/// Resolve a Python slice `(lower, upper, step)` against a sequence of
/// `len` to an ordered list of concrete indices to take.
fn slice_indices(len: usize, lower: Option<i64>, upper: Option<i64>, step: Option<i64>) -> Result<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(Error::Value("slice step cannot be zero".to_string()));
    }
    let len_i = len as i64;

    let clamp = |i: i64, lo: i64, hi: i64| i.max(lo).min(hi);
    let normalize = |i: i64| if i < 0 { i + len_i } else { i };

    if step > 0 {
        let start = clamp(lower.map(normalize).unwrap_or(0), 0, len_i);
        let stop = clamp(upper.map(normalize).unwrap_or(len_i), 0, len_i);
        let mut out = Vec::new();
        let mut i = start;
        while i < stop {
            out.push(i as usize);
            i += step;
        }
        Ok(out)
    } else {
        let default_start = len_i - 1;
        let start = clamp(lower.map(normalize).unwrap_or(default_start), -1, len_i - 1);
        let stop = match upper {
            Some(u) => clamp(normalize(u), -1, len_i - 1),
            None => -1,
        };
        let mut out = Vec::new();
        let mut i = start;
        while i > stop && i >= 0 {
            out.push(i as usize);
            i += step;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(vals: &[i64]) -> Vec<PyValue> {
        vals.iter().map(|v| PyValue::Int(*v)).collect()
    }

    #[test]
    fn forward_slice_matches_python() {
        let items = list_of(&[0, 1, 2, 3, 4]);
        let sliced = slice_list(&items, Some(1), Some(4), None).unwrap();
        assert_eq!(sliced.py_repr(), "[1, 2, 3]");
    }

    #[test]
    fn negative_step_reverses() {
        let items = list_of(&[0, 1, 2, 3, 4]);
        let sliced = slice_list(&items, None, None, Some(-1)).unwrap();
        assert_eq!(sliced.py_repr(), "[4, 3, 2, 1, 0]");
    }

    #[test]
    fn negative_indices_wrap() {
        let items = list_of(&[0, 1, 2, 3, 4]);
        let sliced = slice_list(&items, Some(-2), None, None).unwrap();
        assert_eq!(sliced.py_repr(), "[3, 4]");
    }

    #[test]
    fn string_slice_is_char_aware() {
        let sliced = slice_string("héllo", Some(1), Some(3), None).unwrap();
        assert_eq!(sliced.py_repr(), "\"él\"");
    }

    #[test]
    fn zero_step_is_an_error() {
        let items = list_of(&[0, 1, 2]);
        assert!(slice_list(&items, None, None, Some(0)).is_err());
    }

    #[test]
    fn simple_slice_assignment_can_change_length() {
        let mut items = list_of(&[0, 1, 2, 3, 4]);
        assign_slice_list(&mut items, Some(1), Some(3), None, list_of(&[9, 9, 9])).unwrap();
        assert_eq!(PyValue::List(items).py_repr(), "[0, 9, 9, 9, 3, 4]");
    }

    #[test]
    fn empty_range_inserts_at_start() {
        let mut items = list_of(&[1, 2, 3]);
        assign_slice_list(&mut items, Some(1), Some(0), None, list_of(&[9])).unwrap();
        assert_eq!(PyValue::List(items).py_repr(), "[1, 9, 2, 3]");
    }

    #[test]
    fn extended_slice_requires_exact_length() {
        let mut items = list_of(&[0, 1, 2, 3, 4]);
        let err = assign_slice_list(&mut items, None, None, Some(2), list_of(&[9])).unwrap_err();
        assert_eq!(err.kind(), "ValueError");
    }

    #[test]
    fn extended_slice_assigns_in_place() {
        let mut items = list_of(&[0, 1, 2, 3, 4]);
        assign_slice_list(&mut items, None, None, Some(2), list_of(&[9, 9, 9])).unwrap();
        assert_eq!(PyValue::List(items).py_repr(), "[9, 1, 9, 3, 9]");
    }
}
