//! `Procedure`: a user-defined function captured at `def` time.
//!
//! Immutable once built. Holds its parameter spec and body AST; invocation
//! (symbol-table push/execute/pop) happens in `crate::interpreter`, which is
//! the only piece that also owns an `Interpreter` to run statements against.
//! This module only implements the argument-binding algorithm, which needs
//! no access to the interpreter at all.

use rustpython_ast::Stmt;

use crate::error::{Error, Result};
use crate::value::PyValue;

/// A captured user-defined function.
pub struct Procedure {
    pub name: String,
    pub doc: Option<String>,
    /// Positional parameter names, in declaration order.
    pub params: Vec<String>,
    /// Parameters with a default value, in declaration order. A name here
    /// never also appears in `params`.
    pub defaults: Vec<(String, PyValue)>,
    pub vararg: Option<String>,
    pub varkw: Option<String>,
    pub body: Vec<Stmt>,
    pub source: String,
    pub lineno: usize,
}

impl Procedure {
    /// Binds positional `args` and keyword `kwargs` to this procedure's
    /// parameters, following the same order of checks as the interpreter
    /// this crate is grown from: move-missing-positionals-from-kwargs,
    /// reject-multiple-values, reject-too-few, overflow-into-defaults,
    /// bind-positionals, bind-vararg, bind-defaults, bind-varkw.
    ///
    /// Returns the local bindings to install in the callee's scope.
    pub fn bind_arguments(
        &self,
        mut args: Vec<PyValue>,
        mut kwargs: Vec<(String, PyValue)>,
    ) -> Result<Vec<(String, PyValue)>> {
        // Step 1: if short on positionals, pull matching names out of kwargs.
        if args.len() < self.params.len() {
            for name in &self.params[args.len()..] {
                if let Some(pos) = kwargs.iter().position(|(k, _)| k == name) {
                    let (_, v) = kwargs.remove(pos);
                    args.push(v);
                    if args.len() == self.params.len() {
                        break;
                    }
                } else {
                    break;
                }
            }
        }

        // Step 2: a name can't be bound both positionally and by keyword.
        for name in self.params.iter().take(args.len()) {
            if kwargs.iter().any(|(k, _)| k == name) {
                return Err(Error::Type(format!(
                    "{}() got multiple values for argument '{}'",
                    self.name, name
                )));
            }
        }

        // Step 3: still short? not enough arguments.
        if args.len() < self.params.len() {
            return Err(Error::Type(format!(
                "{}() missing {} required positional argument(s)",
                self.name,
                self.params.len() - args.len()
            )));
        }

        // Step 4: surplus positionals with no *vararg spill into defaults.
        let surplus = args.len() - self.params.len();
        if surplus > 0 && self.vararg.is_none() {
            if surplus > self.defaults.len() {
                return Err(Error::Type(format!("{}() takes too many arguments", self.name)));
            }
        }

        let mut locals = Vec::with_capacity(self.params.len() + self.defaults.len() + 2);

        // Step 5: consume one positional per declared parameter name.
        let mut args = args.into_iter();
        for name in &self.params {
            locals.push((name.clone(), args.next().expect("checked above")));
        }

        // Remaining positionals: either overflow into defaults (no vararg)
        // or collect into *vararg.
        let remaining: Vec<PyValue> = args.collect();

        // Step 6: *vararg binds the untouched remainder as a tuple.
        let remaining = if let Some(vararg) = &self.vararg {
            locals.push((vararg.clone(), PyValue::Tuple(remaining)));
            Vec::new()
        } else {
            remaining
        };

        // Step 7: keyword defaults, positionally-overflowed values first,
        // then kwargs, then the declared default.
        let mut overflow = remaining.into_iter();
        for (name, default) in &self.defaults {
            let value = if let Some(v) = overflow.next() {
                v
            } else if let Some(pos) = kwargs.iter().position(|(k, _)| k == name) {
                kwargs.remove(pos).1
            } else {
                default.clone()
            };
            locals.push((name.clone(), value));
        }

        // Step 8: **varkw binds whatever keyword arguments are left over.
        if let Some(varkw) = &self.varkw {
            let dict = kwargs
                .into_iter()
                .map(|(k, v)| (PyValue::Str(k), v))
                .collect();
            locals.push((varkw.clone(), PyValue::Dict(dict)));
        } else if !kwargs.is_empty() {
            let names: Vec<&str> = kwargs.iter().map(|(k, _)| k.as_str()).collect();
            return Err(Error::Type(format!(
                "{}() got unexpected keyword argument(s): {}",
                self.name,
                names.join(", ")
            )));
        }

        Ok(locals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(params: &[&str], defaults: &[(&str, PyValue)], vararg: Option<&str>, varkw: Option<&str>) -> Procedure {
        Procedure {
            name: "f".to_string(),
            doc: None,
            params: params.iter().map(|s| s.to_string()).collect(),
            defaults: defaults.iter().map(|(n, v)| (n.to_string(), v.clone())).collect(),
            vararg: vararg.map(str::to_string),
            varkw: varkw.map(str::to_string),
            body: Vec::new(),
            source: String::new(),
            lineno: 1,
        }
    }

    #[test]
    fn positional_binding_in_order() {
        let p = proc(&["x", "y"], &[], None, None);
        let locals = p.bind_arguments(vec![PyValue::Int(1), PyValue::Int(2)], vec![]).unwrap();
        assert_eq!(locals[0].0, "x");
        assert_eq!(locals[1].0, "y");
    }

    #[test]
    fn keyword_fills_missing_positional() {
        let p = proc(&["x", "y"], &[], None, None);
        let locals = p
            .bind_arguments(vec![PyValue::Int(1)], vec![("y".to_string(), PyValue::Int(2))])
            .unwrap();
        assert!(matches!(locals[1].1, PyValue::Int(2)));
    }

    #[test]
    fn default_used_when_not_supplied() {
        let p = proc(&["x"], &[("k", PyValue::Int(9))], None, None);
        let locals = p.bind_arguments(vec![PyValue::Int(1)], vec![]).unwrap();
        assert!(matches!(locals[1].1, PyValue::Int(9)));
    }

    #[test]
    fn too_few_arguments_is_a_type_error() {
        let p = proc(&["x", "y"], &[], None, None);
        let err = p.bind_arguments(vec![PyValue::Int(1)], vec![]).unwrap_err();
        assert_eq!(err.kind(), "TypeError");
    }

    #[test]
    fn multiple_values_for_keyword_is_rejected() {
        let p = proc(&["x"], &[], None, None);
        let err = p
            .bind_arguments(vec![PyValue::Int(1)], vec![("x".to_string(), PyValue::Int(2))])
            .unwrap_err();
        assert_eq!(err.kind(), "TypeError");
    }

    #[test]
    fn vararg_collects_remaining_positionals() {
        let p = proc(&["x"], &[], Some("rest"), None);
        let locals = p
            .bind_arguments(vec![PyValue::Int(1), PyValue::Int(2), PyValue::Int(3)], vec![])
            .unwrap();
        assert!(matches!(&locals[1], (n, PyValue::Tuple(items)) if n == "rest" && items.len() == 2));
    }

    #[test]
    fn varkw_collects_extra_keywords() {
        let p = proc(&["x"], &[], None, Some("kws"));
        let locals = p
            .bind_arguments(vec![PyValue::Int(1)], vec![("extra".to_string(), PyValue::Int(5))])
            .unwrap();
        assert!(matches!(&locals[1], (n, PyValue::Dict(pairs)) if n == "kws" && pairs.len() == 1));
    }

    #[test]
    fn unexpected_keyword_without_varkw_is_rejected() {
        let p = proc(&["x"], &[], None, None);
        let err = p
            .bind_arguments(vec![PyValue::Int(1)], vec![("extra".to_string(), PyValue::Int(5))])
            .unwrap_err();
        assert_eq!(err.kind(), "TypeError");
    }
}
