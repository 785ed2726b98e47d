//! The symbol table: a flat map, or a named group with a search-path of
//! sibling groups, plus the readonly and no-deepcopy bookkeeping the rest
//! of the evaluator consults.

use std::collections::{HashMap, HashSet};

use crate::value::PyValue;

/// One named scope. In flat mode the interpreter holds exactly one;
/// nested mode chains several together via `search_groups`.
#[derive(Clone, Default)]
pub struct Group {
    pub name: String,
    symbols: HashMap<String, PyValue>,
    /// Names of sibling groups consulted, in order, on a lookup miss.
    pub search_groups: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: HashMap::new(),
            search_groups: Vec::new(),
        }
    }

    pub fn get_local(&self, name: &str) -> Option<&PyValue> {
        self.symbols.get(name)
    }

    pub fn set_local(&mut self, name: impl Into<String>, value: PyValue) {
        self.symbols.insert(name.into(), value);
    }

    pub fn remove_local(&mut self, name: &str) -> Option<PyValue> {
        self.symbols.remove(name)
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.symbols.keys()
    }
}

/// The interpreter's binding store.
///
/// Flat mode (the default) is a single `Group`. Nested mode keeps a stack
/// of groups; `get` walks the innermost frame, then the named search
/// groups of the top-of-stack frame (mirroring Python asteval's `Group`
/// with `_searchgroups`), which is how a `Procedure` call sees its own
/// locals plus the caller's globals without flattening the two together.
pub struct SymbolTable {
    nested: bool,
    /// Stack of frames; index 0 is the outermost (global) frame.
    frames: Vec<Group>,
    pub readonly_symbols: HashSet<String>,
    pub no_deepcopy: HashSet<String>,
}

impl SymbolTable {
    pub fn flat() -> Self {
        Self {
            nested: false,
            frames: vec![Group::new("_main")],
            readonly_symbols: HashSet::new(),
            no_deepcopy: HashSet::new(),
        }
    }

    pub fn nested() -> Self {
        Self {
            nested: true,
            frames: vec![Group::new("_main")],
            readonly_symbols: HashSet::new(),
            no_deepcopy: HashSet::new(),
        }
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    fn current(&self) -> &Group {
        self.frames.last().expect("symbol table always has a frame")
    }

    fn current_mut(&mut self) -> &mut Group {
        self.frames.last_mut().expect("symbol table always has a frame")
    }

    /// `get(name) -> Value | Empty`. In nested mode, walks the current
    /// group then each of its search groups in order.
    pub fn get(&self, name: &str) -> Option<&PyValue> {
        if let Some(v) = self.current().get_local(name) {
            return Some(v);
        }
        if self.nested {
            let search = self.current().search_groups.clone();
            for group_name in &search {
                if let Some(group) = self.frames.iter().rev().find(|g| &g.name == group_name)
                    && let Some(v) = group.get_local(name)
                {
                    return Some(v);
                }
            }
        }
        None
    }

    /// `set(name, value)`, honoring the readonly set. Always targets the
    /// innermost frame.
    pub fn set(&mut self, name: impl Into<String>, value: PyValue) -> crate::error::Result<()> {
        let name = name.into();
        if self.readonly_symbols.contains(&name) {
            return Err(crate::error::Error::Name(format!(
                "'{name}' is read-only and cannot be assigned to"
            )));
        }
        self.current_mut().set_local(name, value);
        Ok(())
    }

    /// Like `set`, but bypasses the readonly check. For host-side bindings:
    /// the host may need to populate a name it has also marked readonly
    /// against script assignment.
    pub fn force_set(&mut self, name: impl Into<String>, value: PyValue) {
        self.current_mut().set_local(name, value);
    }

    pub fn remove(&mut self, name: &str) -> Option<PyValue> {
        self.current_mut().remove_local(name)
    }

    pub fn update(&mut self, entries: impl IntoIterator<Item = (String, PyValue)>) {
        for (k, v) in entries {
            self.current_mut().set_local(k, v);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names bound in the current (innermost) frame.
    pub fn local_names(&self) -> Vec<String> {
        self.current().keys().cloned().collect()
    }

    /// Flat-mode snapshot/restore pair used by procedure calls: clone the
    /// whole current frame, overlay locals, then restore verbatim — the
    /// flat-mode simulation of a pushed scope described in the data model.
    pub fn snapshot(&self) -> Group {
        self.current().clone()
    }

    pub fn restore(&mut self, snapshot: Group) {
        *self.current_mut() = snapshot;
    }

    /// Nested-mode scope push: add a new named frame whose search path
    /// is `search_groups`, make it current.
    pub fn push_group(&mut self, name: impl Into<String>, search_groups: Vec<String>) {
        let mut group = Group::new(name);
        group.search_groups = search_groups;
        self.frames.push(group);
    }

    /// Nested-mode scope pop: drop the innermost frame.
    pub fn pop_group(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// All frame names currently on the stack, outermost first — used to
    /// build a child procedure frame's search-group list in nested mode.
    pub fn frame_names(&self) -> Vec<String> {
        self.frames.iter().map(|g| g.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_get_set_round_trips() {
        let mut t = SymbolTable::flat();
        t.set("x", PyValue::Int(1)).unwrap();
        assert!(matches!(t.get("x"), Some(PyValue::Int(1))));
        assert!(t.get("missing").is_none());
    }

    #[test]
    fn readonly_rejects_assignment() {
        let mut t = SymbolTable::flat();
        t.set("x", PyValue::Int(1)).unwrap();
        t.readonly_symbols.insert("x".to_string());
        let err = t.set("x", PyValue::Int(2)).unwrap_err();
        assert_eq!(err.kind(), "NameError");
        assert!(matches!(t.get("x"), Some(PyValue::Int(1))));
    }

    #[test]
    fn nested_search_group_fallback() {
        let mut t = SymbolTable::nested();
        t.set("g", PyValue::Int(7)).unwrap();
        t.push_group("local", vec!["_main".to_string()]);
        assert!(matches!(t.get("g"), Some(PyValue::Int(7))));
        t.set("g", PyValue::Int(9)).unwrap();
        assert!(matches!(t.get("g"), Some(PyValue::Int(9))));
        t.pop_group();
        assert!(matches!(t.get("g"), Some(PyValue::Int(7))));
    }

    #[test]
    fn snapshot_restore_undoes_local_mutation() {
        let mut t = SymbolTable::flat();
        t.set("x", PyValue::Int(1)).unwrap();
        let snap = t.snapshot();
        t.set("x", PyValue::Int(2)).unwrap();
        t.restore(snap);
        assert!(matches!(t.get("x"), Some(PyValue::Int(1))));
    }
}
