//! The tree-walking evaluator: node dispatch, scope management, control
//! flow, and the embedding surface (`eval`/`parse`/`run`).

use std::collections::HashSet;
use std::io::Write;
use std::rc::Rc;
use std::time::Instant;

use rustpython_ast::{
    Alias, BoolOp, Comprehension, Constant, ExceptHandler, Expr, ExprContext, Keyword, Stmt,
};
use rustpython_parser::{parse, Mode};

use crate::builtins;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::exception::ExceptionHolder;
use crate::format_spec;
use crate::modules;
use crate::operators::{apply_binop, apply_cmpop, apply_unaryop};
use crate::procedure::Procedure;
use crate::safety;
use crate::slice;
use crate::symtable::SymbolTable;
use crate::value::{HostObject, NamedNative, PyValue};

/// How a statement or block finished, threaded up through `exec_stmt` and
/// `exec_block` instead of relying on exceptions for control transfer.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(PyValue),
}

/// The tree-walking evaluator.
pub struct Interpreter {
    symtable: SymbolTable,
    config: Config,
    errors: Vec<ExceptionHolder>,
    call_depth: usize,
    cycles: u64,
    start: Option<Instant>,
    source: String,
    disabled_nodes: HashSet<String>,
    writer: Box<dyn Write>,
    err_writer: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        let symtable = if config.nested_symtable {
            SymbolTable::nested()
        } else {
            SymbolTable::flat()
        };
        let mut interp = Self {
            symtable,
            config,
            errors: Vec::new(),
            call_depth: 0,
            cycles: 0,
            start: None,
            source: String::new(),
            disabled_nodes: HashSet::new(),
            writer: Box::new(std::io::stdout()),
            err_writer: Box::new(std::io::stderr()),
        };
        interp.preload();
        interp
    }

    /// Redirects `print`'s backing writer, e.g. to capture output in tests
    /// or route it to a host-owned buffer instead of real stdout.
    pub fn with_writer(mut self, writer: Box<dyn Write>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_err_writer(mut self, writer: Box<dyn Write>) -> Self {
        self.err_writer = writer;
        self
    }

    fn preload(&mut self) {
        let _ = self.symtable.set("math", modules::math_module());
        for &kind in EXCEPTION_KINDS {
            self.bind_native(kind, None, move |args: Vec<PyValue>| {
                let message = args.first().map(PyValue::py_str).unwrap_or_default();
                Ok(PyValue::Str(format!("{kind}: {message}")))
            });
        }
        if self.config.builtins_readonly {
            self.symtable.readonly_symbols.insert("math".to_string());
            for &kind in EXCEPTION_KINDS {
                self.symtable.readonly_symbols.insert(kind.to_string());
            }
        }
        self.symtable
            .readonly_symbols
            .extend(self.config.readonly_symbols.iter().cloned());
    }

    /// Registers a host callable under `name`, reachable from script code.
    /// The lower-ceremony path: no declared signature, just a closure.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<PyValue>) -> Result<PyValue> + 'static,
    {
        self.bind_native(name, None, f);
    }

    /// Registers a host callable with a declared `ToolInfo` signature,
    /// surfaced to `describe_tools` and to script-facing documentation.
    pub fn register_tool<F>(&mut self, info: crate::tool::ToolInfo, f: F)
    where
        F: Fn(Vec<PyValue>) -> Result<PyValue> + 'static,
    {
        let name = info.name.clone();
        self.bind_native(name, Some(info), f);
    }

    /// Registers a type implementing the `Tool` trait (typically produced
    /// by the `#[tool]` attribute macro), adapting its infallible
    /// `call(args) -> PyValue` into the native-function `Result` shape.
    pub fn register_tool_type<T: crate::tool::Tool>(&mut self) {
        let info = T::info();
        self.bind_native(info.name.clone(), Some(info.clone()), |args| Ok(T::call(args)));
    }

    fn bind_native<F>(&mut self, name: impl Into<String>, info: Option<crate::tool::ToolInfo>, f: F)
    where
        F: Fn(Vec<PyValue>) -> Result<PyValue> + 'static,
    {
        let name = name.into();
        let native = PyValue::Native(NamedNative {
            name: name.clone(),
            info,
            func: Rc::new(f),
        });
        let _ = self.symtable.set(name.clone(), native);
        self.symtable.no_deepcopy.insert(name);
    }

    /// Binds a plain value into the global scope, e.g. host-provided
    /// inputs for the script to read.
    pub fn set_symbol(&mut self, name: impl Into<String>, value: PyValue) {
        self.symtable.force_set(name, value);
    }

    pub fn get_symbol(&self, name: &str) -> Option<&PyValue> {
        self.symtable.get(name)
    }

    /// Names introduced after construction — the preloaded `math`/tool
    /// bindings are excluded via `no_deepcopy`.
    pub fn user_defined_symbols(&self) -> Vec<String> {
        self.symtable
            .local_names()
            .into_iter()
            .filter(|n| !self.symtable.no_deepcopy.contains(n))
            .collect()
    }

    pub fn errors(&self) -> &[ExceptionHolder] {
        &self.errors
    }

    pub fn error_msg(&self) -> String {
        self.errors
            .iter()
            .map(ExceptionHolder::short)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn remove_nodehandler(&mut self, kind: &str) {
        self.disabled_nodes.insert(kind.to_string());
    }

    pub fn set_nodehandler(&mut self, kind: &str) {
        self.disabled_nodes.remove(kind);
    }

    fn node_enabled(&self, kind: &str) -> bool {
        !self.disabled_nodes.contains(kind)
    }

    /// Parses `text` without running it.
    pub fn parse(&self, text: &str) -> Result<Vec<Stmt>> {
        if text.len() > self.config.max_statement_length {
            return Err(Error::Runtime(format!(
                "source exceeds max_statement_length ({} > {})",
                text.len(),
                self.config.max_statement_length
            )));
        }
        let module = parse(text, Mode::Module, "<sandbox>")
            .map_err(|e| Error::Syntax(e.to_string()))?
            .into_module()
            .map_err(|_| Error::Syntax("expected a module".to_string()))?;
        Ok(module.body)
    }

    /// Parses then runs `text`. On error, renders to the err-writer unless
    /// `show_errors` is false; re-raises to the caller only if
    /// `raise_errors` is true.
    pub fn eval(&mut self, text: &str, show_errors: bool, raise_errors: bool) -> Result<Option<PyValue>> {
        tracing::debug!(len = text.len(), "eval: starting");
        self.source = text.to_string();
        self.errors.clear();
        self.start = Some(Instant::now());
        self.cycles = 0;

        let body = match self.parse(text) {
            Ok(body) => body,
            Err(e) => {
                self.push_error(e.clone(), None);
                if show_errors {
                    let _ = writeln!(self.err_writer, "{}", self.error_msg());
                }
                return if raise_errors { Err(e) } else { Ok(None) };
            }
        };

        match self.run(&body, raise_errors) {
            Ok(v) => Ok(v),
            Err(e) => {
                if show_errors {
                    let _ = writeln!(self.err_writer, "{}", self.error_msg());
                }
                if raise_errors {
                    Err(e)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Runs an already-parsed body; returns the value of the last
    /// expression statement, if any.
    /// Runs `body` in a single pass over its statements: every statement
    /// executes exactly once, and the value reported back is the literal
    /// last top-level statement's value when (and only when) that last
    /// statement is a bare expression — `None` otherwise, matching the
    /// underlying evaluator's own "fell through a module body" semantics.
    pub fn run(&mut self, body: &[Stmt], with_raise: bool) -> Result<Option<PyValue>> {
        tracing::debug!(statements = body.len(), "run: starting");
        let mut last = None;
        let mut flow_result: Result<Flow> = Ok(Flow::Normal);
        for (i, stmt) in body.iter().enumerate() {
            if i + 1 == body.len()
                && let Stmt::Expr(e) = stmt
            {
                flow_result = self.tick().and_then(|_| self.eval_expr(&e.value)).map(|v| {
                    last = Some(v);
                    Flow::Normal
                });
                break;
            }
            match self.exec_stmt(stmt) {
                Ok(Flow::Normal) => {}
                Ok(other) => {
                    flow_result = Ok(other);
                    break;
                }
                Err(e) => {
                    flow_result = Err(e);
                    break;
                }
            }
        }
        match flow_result {
            Ok(Flow::Normal) => {}
            Ok(Flow::Return(v)) => last = Some(v),
            Ok(Flow::Break) | Ok(Flow::Continue) => {
                let e = Error::Runtime("'break'/'continue' outside loop".to_string());
                self.push_error(e.clone(), None);
                if with_raise {
                    return Err(e);
                }
            }
            Err(e) => {
                self.push_error(e.clone(), None);
                if with_raise {
                    return Err(e);
                }
            }
        }
        Ok(last)
    }

    fn push_error(&mut self, error: Error, expr: Option<String>) {
        let mut holder = ExceptionHolder::new(error);
        if let Some(e) = expr {
            holder = holder.with_expr(e);
        }
        if !self.errors.iter().any(|h| h.duplicates(&holder)) {
            self.errors.push(holder);
        }
    }

    fn tick(&mut self) -> Result<()> {
        self.cycles += 1;
        if self.cycles > self.config.max_cycles {
            return Err(Error::Runtime("exceeded max evaluation cycles".to_string()));
        }
        if let Some(start) = self.start
            && start.elapsed() > self.config.wallclock_budget
        {
            return Err(Error::Runtime("exceeded wall-clock time budget".to_string()));
        }
        Ok(())
    }

    // ---- statements ---------------------------------------------------

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow> {
        for stmt in body {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        self.tick()?;
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(&e.value)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign(a) => {
                let value = self.eval_expr(&a.value)?;
                for target in &a.targets {
                    self.assign(target, value.clone())?;
                }
                Ok(Flow::Normal)
            }
            Stmt::AugAssign(a) => {
                if !self.config.nodes.augassign {
                    return Err(Error::NotImplemented("augmented assignment is disabled".to_string()));
                }
                let current = self.eval_expr(&a.target)?;
                let rhs = self.eval_expr(&a.value)?;
                let result = apply_binop(&a.op, &current, &rhs)?;
                self.assign(&a.target, result)?;
                Ok(Flow::Normal)
            }
            Stmt::Delete(d) => {
                if !self.config.nodes.delete {
                    return Err(Error::NotImplemented("del is disabled".to_string()));
                }
                for target in &d.targets {
                    self.delete(target)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Pass(_) => Ok(Flow::Normal),
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Return(r) => {
                let value = match &r.value {
                    Some(e) => self.eval_expr(e)?,
                    None => PyValue::None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If(s) => {
                if self.eval_expr(&s.test)?.is_truthy() {
                    self.exec_block(&s.body)
                } else {
                    self.exec_block(&s.orelse)
                }
            }
            Stmt::While(s) => self.exec_loop(|me| Ok(me.eval_expr(&s.test)?.is_truthy()), &s.body, &s.orelse),
            Stmt::For(s) => {
                let iterable = self.eval_expr(&s.iter)?;
                let items = self.to_iterable(&iterable)?;
                let mut broke = false;
                for item in items {
                    self.assign(&s.target, item)?;
                    match self.exec_block(&s.body)? {
                        Flow::Break => {
                            broke = true;
                            break;
                        }
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                if !broke {
                    return self.exec_block(&s.orelse);
                }
                Ok(Flow::Normal)
            }
            Stmt::FunctionDef(def) => {
                if !self.config.nodes.functiondef {
                    return Err(Error::NotImplemented("function definitions are disabled".to_string()));
                }
                let proc = self.build_procedure(def)?;
                let _ = self.symtable.set(def.name.to_string(), PyValue::Function(Rc::new(proc)));
                Ok(Flow::Normal)
            }
            Stmt::Assert(a) => {
                if !self.config.nodes.assert_stmt {
                    return Err(Error::NotImplemented("assert is disabled".to_string()));
                }
                let test = self.eval_expr(&a.test)?;
                if !test.is_truthy() {
                    let message = match &a.msg {
                        Some(m) => self.eval_expr(m)?.py_str(),
                        None => String::new(),
                    };
                    return Err(Error::Assertion(message));
                }
                Ok(Flow::Normal)
            }
            Stmt::Raise(r) => {
                if !self.config.nodes.raise_stmt {
                    return Err(Error::NotImplemented("raise is disabled".to_string()));
                }
                match &r.exc {
                    Some(exc) => {
                        let value = self.eval_expr(exc)?;
                        let message = value.py_str();
                        Err(classify_raised(&message))
                    }
                    None => Err(Error::Runtime("No active exception to re-raise".to_string())),
                }
            }
            Stmt::Try(t) => {
                if !self.config.nodes.try_stmt {
                    return Err(Error::NotImplemented("try is disabled".to_string()));
                }
                self.exec_try(&t.body, &t.handlers, &t.orelse, &t.finalbody)
            }
            Stmt::With(w) => {
                if !self.config.nodes.with_stmt {
                    return Err(Error::NotImplemented("with is disabled".to_string()));
                }
                self.exec_with(&w.items, &w.body)
            }
            Stmt::Import(s) => {
                if !self.config.nodes.import_stmt {
                    return Err(Error::Import("import is disabled".to_string()));
                }
                self.exec_import(&s.names)
            }
            Stmt::ImportFrom(s) => {
                if !self.config.nodes.importfrom {
                    return Err(Error::Import("from-import is disabled".to_string()));
                }
                self.exec_import_from(s.module.as_deref(), &s.names)
            }
            other => Err(Error::NotImplemented(format!("statement not supported: {other:?}"))),
        }
    }

    fn exec_loop(
        &mut self,
        mut test: impl FnMut(&mut Self) -> Result<bool>,
        body: &[Stmt],
        orelse: &[Stmt],
    ) -> Result<Flow> {
        let mut broke = false;
        while test(self)? {
            match self.exec_block(body)? {
                Flow::Break => {
                    broke = true;
                    break;
                }
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Continue | Flow::Normal => {}
            }
        }
        if !broke {
            return self.exec_block(orelse);
        }
        Ok(Flow::Normal)
    }

    fn exec_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finalbody: &[Stmt],
    ) -> Result<Flow> {
        let result = self.exec_block(body);
        let outcome = match result {
            Ok(flow) => {
                let else_flow = self.exec_block(orelse)?;
                match (flow, else_flow) {
                    (Flow::Normal, f) => Ok(f),
                    (f, _) => Ok(f),
                }
            }
            Err(error) => {
                let mut handled = None;
                for handler in handlers {
                    let ExceptHandler::ExceptHandler(h) = handler;
                    let matches = match &h.type_ {
                        Some(expr) => {
                            let name = exception_type_name(expr);
                            error.matches(&name)
                        }
                        None => true,
                    };
                    if matches {
                        if let Some(bind) = &h.name {
                            let _ = self.symtable.set(bind.to_string(), PyValue::Str(error.message()));
                        }
                        handled = Some(self.exec_block(&h.body));
                        break;
                    }
                }
                match handled {
                    Some(r) => r,
                    None => Err(error),
                }
            }
        };
        let final_flow = self.exec_block(finalbody)?;
        match (outcome, final_flow) {
            (Err(e), Flow::Normal) => Err(e),
            (Err(_), f) => Ok(f),
            (Ok(Flow::Normal), f) => Ok(f),
            (Ok(f), _) => Ok(f),
        }
    }

    fn exec_with(&mut self, items: &[rustpython_ast::WithItem], body: &[Stmt]) -> Result<Flow> {
        let mut entered: Vec<Rc<dyn HostObject>> = Vec::new();
        let mut enter_err = None;
        for item in items {
            let value = self.eval_expr(&item.context_expr)?;
            let host = match &value {
                PyValue::Host(h) => h.clone(),
                other => {
                    enter_err = Some(Error::Type(format!(
                        "'{}' object does not support the context manager protocol",
                        other.type_name()
                    )));
                    break;
                }
            };
            match host.enter() {
                Some(Ok(bound)) => {
                    entered.push(host);
                    if let Some(target) = &item.optional_vars {
                        self.assign(target, bound)?;
                    }
                }
                Some(Err(e)) => {
                    enter_err = Some(e);
                    break;
                }
                None => {
                    enter_err = Some(Error::Type(format!(
                        "'{}' object does not support the context manager protocol",
                        host.type_name()
                    )));
                    break;
                }
            }
        }
        if let Some(e) = enter_err {
            for host in entered.iter().rev() {
                let _ = host.exit();
            }
            return Err(e);
        }

        let body_result = self.exec_block(body);
        let mut exit_err = None;
        for host in entered.iter().rev() {
            if let Err(e) = host.exit()
                && exit_err.is_none()
                && body_result.is_ok()
            {
                exit_err = Some(e);
            }
        }
        match exit_err {
            Some(e) => Err(e),
            None => body_result,
        }
    }

    fn exec_import(&mut self, names: &[Alias]) -> Result<Flow> {
        for alias in names {
            let module_name = alias.name.to_string();
            let value = self.resolve_module(&module_name)?;
            let bound = alias.asname.as_ref().map(|a| a.to_string()).unwrap_or(module_name);
            let _ = self.symtable.set(bound, value);
        }
        Ok(Flow::Normal)
    }

    fn exec_import_from(&mut self, module: Option<&str>, names: &[Alias]) -> Result<Flow> {
        let module_name = module.ok_or_else(|| Error::Import("relative imports are not supported".to_string()))?;
        let module_value = self.resolve_module(module_name)?;
        let host = match &module_value {
            PyValue::Host(h) => h.clone(),
            _ => return Err(Error::Import(format!("no module named '{module_name}'"))),
        };
        for alias in names {
            let attr = alias.name.to_string();
            let value = host
                .get_attr(&attr)
                .ok_or_else(|| Error::Import(format!("cannot import name '{attr}' from '{module_name}'")))?;
            let bound = alias.asname.as_ref().map(|a| a.to_string()).unwrap_or(attr);
            let _ = self.symtable.set(bound, value);
        }
        Ok(Flow::Normal)
    }

    fn resolve_module(&self, name: &str) -> Result<PyValue> {
        match name {
            "math" => Ok(modules::math_module()),
            _ => Err(Error::Import(format!("no module named '{name}'"))),
        }
    }

    // ---- assignment -----------------------------------------------------

    fn assign(&mut self, target: &Expr, value: PyValue) -> Result<()> {
        match target {
            Expr::Name(n) => {
                if !safety::valid_symbol_name(&n.id) {
                    return Err(Error::Syntax(format!("invalid identifier '{}'", n.id)));
                }
                self.symtable.set(n.id.to_string(), value)
            }
            Expr::Attribute(a) => {
                if safety::is_unsafe_attr_name(&a.attr) {
                    return Err(Error::Attribute(format!("no safe attribute '{}'", a.attr)));
                }
                let obj = self.eval_expr(&a.value)?;
                match &obj {
                    PyValue::Host(host) => match host.set_attr(&a.attr, value) {
                        Some(res) => res,
                        None => Err(Error::Attribute(format!(
                            "'{}' object attribute '{}' is read-only",
                            host.type_name(),
                            a.attr
                        ))),
                    },
                    other => Err(Error::Attribute(format!(
                        "'{}' object has no attribute '{}'",
                        other.type_name(),
                        a.attr
                    ))),
                }
            }
            Expr::Subscript(sub) => {
                let base_name = match sub.value.as_ref() {
                    Expr::Name(n) => n.id.to_string(),
                    _ => return Err(Error::Runtime("subscript assignment target must be a name".to_string())),
                };
                let mut base = self
                    .symtable
                    .get(&base_name)
                    .cloned()
                    .ok_or_else(|| Error::Name(base_name.clone()))?;
                self.assign_subscript(&mut base, &sub.slice, value)?;
                self.symtable.set(base_name, base)
            }
            Expr::Tuple(t) => self.unpack(&t.elts, value),
            Expr::List(l) => self.unpack(&l.elts, value),
            Expr::Starred(s) => self.assign(&s.value, value),
            other => Err(Error::NotImplemented(format!("assignment target not supported: {other:?}"))),
        }
    }

    fn unpack(&mut self, targets: &[Expr], value: PyValue) -> Result<()> {
        let items = self.to_iterable(&value)?;
        if items.len() != targets.len() {
            return Err(Error::Value("too many values to unpack".to_string()));
        }
        for (target, item) in targets.iter().zip(items) {
            self.assign(target, item)?;
        }
        Ok(())
    }

    fn assign_subscript(&mut self, base: &mut PyValue, slice_expr: &Expr, value: PyValue) -> Result<()> {
        if let Expr::Slice(s) = slice_expr {
            let lower = s.lower.as_deref().map(|e| self.eval_expr(e)).transpose()?.and_then(|v| v.as_int());
            let upper = s.upper.as_deref().map(|e| self.eval_expr(e)).transpose()?.and_then(|v| v.as_int());
            let step = s.step.as_deref().map(|e| self.eval_expr(e)).transpose()?.and_then(|v| v.as_int());
            let replacement = self.to_iterable(&value)?;
            return match base {
                PyValue::List(items) => slice::assign_slice_list(items, lower, upper, step, replacement),
                other => Err(Error::Type(format!(
                    "'{}' object does not support slice assignment",
                    other.type_name()
                ))),
            };
        }
        match base {
            PyValue::List(items) => {
                let index = self.eval_expr(slice_expr)?;
                let idx = index
                    .as_int()
                    .ok_or_else(|| Error::Type("list indices must be integers".to_string()))?;
                let resolved = normalize_index(idx, items.len())?;
                items[resolved] = value;
                Ok(())
            }
            PyValue::Dict(pairs) => {
                let key = self.eval_expr(slice_expr)?;
                if let Some(entry) = pairs.iter_mut().find(|(k, _)| k.py_eq(&key)) {
                    entry.1 = value;
                } else {
                    pairs.push((key, value));
                }
                Ok(())
            }
            other => Err(Error::Type(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))),
        }
    }

    fn delete(&mut self, target: &Expr) -> Result<()> {
        match target {
            Expr::Name(n) => {
                self.symtable
                    .remove(&n.id)
                    .map(|_| ())
                    .ok_or_else(|| Error::Name(n.id.to_string()))
            }
            Expr::Attribute(a) => {
                if safety::is_unsafe_attr_name(&a.attr) {
                    return Err(Error::Attribute(format!("no safe attribute '{}'", a.attr)));
                }
                let obj = self.eval_expr(&a.value)?;
                match &obj {
                    PyValue::Host(host) => match host.del_attr(&a.attr) {
                        Some(res) => res,
                        None => Err(Error::Attribute(format!(
                            "'{}' object attribute '{}' cannot be deleted",
                            host.type_name(),
                            a.attr
                        ))),
                    },
                    other => Err(Error::Attribute(format!(
                        "'{}' object has no attribute '{}'",
                        other.type_name(),
                        a.attr
                    ))),
                }
            }
            other => Err(Error::NotImplemented(format!("del target not supported: {other:?}"))),
        }
    }

    // ---- expressions ------------------------------------------------------

    fn eval_expr(&mut self, expr: &Expr) -> Result<PyValue> {
        self.tick()?;
        match expr {
            Expr::Constant(c) => self.eval_constant(&c.value),
            Expr::Name(n) => match n.ctx {
                ExprContext::Load => self
                    .symtable
                    .get(&n.id)
                    .cloned()
                    .ok_or_else(|| Error::Name(n.id.to_string())),
                _ => Ok(PyValue::Str(n.id.to_string())),
            },
            Expr::List(l) => {
                let items = self.eval_exprs_with_starred(&l.elts)?;
                Ok(PyValue::List(items))
            }
            Expr::Tuple(t) => {
                let items = self.eval_exprs_with_starred(&t.elts)?;
                Ok(PyValue::Tuple(items))
            }
            Expr::Set(s) => {
                let mut items = Vec::new();
                for item in self.eval_exprs_with_starred(&s.elts)? {
                    if !items.iter().any(|x: &PyValue| x.py_eq(&item)) {
                        items.push(item);
                    }
                }
                Ok(PyValue::Set(items))
            }
            Expr::Dict(d) => {
                let mut pairs = Vec::new();
                for (key, value) in d.keys.iter().zip(d.values.iter()) {
                    match key {
                        Some(k) => {
                            let key = self.eval_expr(k)?;
                            let value = self.eval_expr(value)?;
                            pairs.push((key, value));
                        }
                        None => {
                            // `**other` dict-unpacking.
                            let spread = self.eval_expr(value)?;
                            if let PyValue::Dict(other) = spread {
                                pairs.extend(other);
                            } else {
                                return Err(Error::Type("dict unpacking requires a dict".to_string()));
                            }
                        }
                    }
                }
                Ok(PyValue::Dict(pairs))
            }
            Expr::BinOp(b) => {
                let left = self.eval_expr(&b.left)?;
                let right = self.eval_expr(&b.right)?;
                apply_binop(&b.op, &left, &right)
            }
            Expr::UnaryOp(u) => {
                let operand = self.eval_expr(&u.operand)?;
                apply_unaryop(u.op, operand)
            }
            Expr::BoolOp(b) => {
                let short_circuit_on = matches!(b.op, BoolOp::Or);
                let mut last = PyValue::None;
                for value_expr in &b.values {
                    last = self.eval_expr(value_expr)?;
                    if last.is_truthy() == short_circuit_on {
                        return Ok(last);
                    }
                }
                Ok(last)
            }
            Expr::Compare(c) => {
                let mut left = self.eval_expr(&c.left)?;
                for (op, right_expr) in c.ops.iter().zip(c.comparators.iter()) {
                    let right = self.eval_expr(right_expr)?;
                    if !apply_cmpop(op, &left, &right)? {
                        return Ok(PyValue::Bool(false));
                    }
                    left = right;
                }
                Ok(PyValue::Bool(true))
            }
            Expr::IfExp(i) => {
                if self.eval_expr(&i.test)?.is_truthy() {
                    self.eval_expr(&i.body)
                } else {
                    self.eval_expr(&i.orelse)
                }
            }
            Expr::Attribute(a) => {
                let obj = self.eval_expr(&a.value)?;
                self.get_attribute(&obj, &a.attr)
            }
            Expr::Subscript(s) => {
                let base = self.eval_expr(&s.value)?;
                self.subscript(&base, &s.slice)
            }
            Expr::Slice(s) => {
                let lower = s.lower.as_deref().map(|e| self.eval_expr(e)).transpose()?.and_then(|v| v.as_int());
                let upper = s.upper.as_deref().map(|e| self.eval_expr(e)).transpose()?.and_then(|v| v.as_int());
                let step = s.step.as_deref().map(|e| self.eval_expr(e)).transpose()?.and_then(|v| v.as_int());
                // Slices are only meaningful inside a subscript; returning a
                // tuple here lets `subscript` recover the three operands.
                Ok(PyValue::Tuple(vec![
                    lower.map(PyValue::Int).unwrap_or(PyValue::None),
                    upper.map(PyValue::Int).unwrap_or(PyValue::None),
                    step.map(PyValue::Int).unwrap_or(PyValue::None),
                ]))
            }
            Expr::Call(c) => self.eval_call(c),
            Expr::ListComp(lc) => {
                if !self.config.nodes.listcomp {
                    return Err(Error::NotImplemented("list comprehensions are disabled".to_string()));
                }
                self.eval_comprehension(&lc.generators, |me| me.eval_expr(&lc.elt))
                    .map(PyValue::List)
            }
            Expr::SetComp(sc) => {
                if !self.config.nodes.setcomp {
                    return Err(Error::NotImplemented("set comprehensions are disabled".to_string()));
                }
                let items = self.eval_comprehension(&sc.generators, |me| me.eval_expr(&sc.elt))?;
                let mut out: Vec<PyValue> = Vec::new();
                for item in items {
                    if !out.iter().any(|x| x.py_eq(&item)) {
                        out.push(item);
                    }
                }
                Ok(PyValue::Set(out))
            }
            Expr::DictComp(dc) => {
                if !self.config.nodes.dictcomp {
                    return Err(Error::NotImplemented("dict comprehensions are disabled".to_string()));
                }
                let pairs = self.eval_comprehension(&dc.generators, |me| {
                    let key = me.eval_expr(&dc.key)?;
                    let value = me.eval_expr(&dc.value)?;
                    Ok(PyValue::Tuple(vec![key, value]))
                })?;
                Ok(PyValue::Dict(
                    pairs
                        .into_iter()
                        .map(|p| match p {
                            PyValue::Tuple(mut kv) => (kv.remove(0), kv.remove(0)),
                            _ => unreachable!(),
                        })
                        .collect(),
                ))
            }
            Expr::JoinedStr(j) => {
                if !self.config.nodes.formattedvalue {
                    return Err(Error::NotImplemented("f-strings are disabled".to_string()));
                }
                let mut out = String::new();
                for part in &j.values {
                    out.push_str(&self.eval_expr(part)?.py_str());
                }
                Ok(PyValue::Str(out))
            }
            Expr::FormattedValue(f) => {
                if !self.config.nodes.formattedvalue {
                    return Err(Error::NotImplemented("f-strings are disabled".to_string()));
                }
                let value = self.eval_expr(&f.value)?;
                let spec = match &f.format_spec {
                    Some(spec_expr) => self.eval_expr(spec_expr)?.py_str(),
                    None => String::new(),
                };
                Ok(PyValue::Str(format_spec::format_value(&value, &spec)?))
            }
            Expr::Starred(s) => self.eval_expr(&s.value),
            other => Err(Error::NotImplemented(format!("expression not supported: {other:?}"))),
        }
    }

    fn eval_exprs_with_starred(&mut self, exprs: &[Expr]) -> Result<Vec<PyValue>> {
        let mut out = Vec::new();
        for e in exprs {
            if let Expr::Starred(s) = e {
                let spread = self.eval_expr(&s.value)?;
                out.extend(self.to_iterable(&spread)?);
            } else {
                out.push(self.eval_expr(e)?);
            }
        }
        Ok(out)
    }

    fn eval_constant(&self, constant: &Constant) -> Result<PyValue> {
        Ok(match constant {
            Constant::None => PyValue::None,
            Constant::Bool(b) => PyValue::Bool(*b),
            Constant::Int(i) => {
                let val: i64 = i
                    .try_into()
                    .map_err(|_| Error::Overflow("integer literal too large".to_string()))?;
                PyValue::Int(val)
            }
            Constant::Float(f) => PyValue::Float(*f),
            Constant::Str(s) => PyValue::Str(s.clone()),
            Constant::Bytes(b) => PyValue::Bytes(b.clone()),
            Constant::Ellipsis => PyValue::Ellipsis,
            Constant::Tuple(items) => {
                let values: Result<Vec<PyValue>> = items.iter().map(|c| self.eval_constant(c)).collect();
                PyValue::Tuple(values?)
            }
            Constant::Complex { .. } => {
                return Err(Error::NotImplemented("complex number literals".to_string()))
            }
        })
    }

    fn get_attribute(&self, obj: &PyValue, attr: &str) -> Result<PyValue> {
        match obj {
            PyValue::Host(host) => safety::safe_getattr(host.as_ref(), attr, self.config.allow_unsafe_modules),
            _ => Err(Error::Attribute(format!(
                "'{}' object has no attribute '{attr}'",
                obj.type_name()
            ))),
        }
    }

    fn subscript(&mut self, base: &PyValue, slice_expr: &Expr) -> Result<PyValue> {
        if let Expr::Slice(_) = slice_expr {
            let triple = self.eval_expr(slice_expr)?;
            let (lower, upper, step) = match triple {
                PyValue::Tuple(t) => (t[0].as_int(), t[1].as_int(), t[2].as_int()),
                _ => unreachable!(),
            };
            return match base {
                PyValue::List(items) => slice::slice_list(items, lower, upper, step),
                PyValue::Tuple(items) => slice::slice_tuple(items, lower, upper, step),
                PyValue::Str(s) => slice::slice_string(s, lower, upper, step),
                other => Err(Error::Type(format!("'{}' object is not subscriptable", other.type_name()))),
            };
        }

        let index = self.eval_expr(slice_expr)?;
        match base {
            PyValue::List(items) => {
                let i = index.as_int().ok_or_else(|| Error::Type("list indices must be integers".to_string()))?;
                let resolved = normalize_index(i, items.len())?;
                Ok(items[resolved].clone())
            }
            PyValue::Tuple(items) => {
                let i = index.as_int().ok_or_else(|| Error::Type("tuple indices must be integers".to_string()))?;
                let resolved = normalize_index(i, items.len())?;
                Ok(items[resolved].clone())
            }
            PyValue::Str(s) => {
                let i = index.as_int().ok_or_else(|| Error::Type("string indices must be integers".to_string()))?;
                let chars: Vec<char> = s.chars().collect();
                let resolved = normalize_index(i, chars.len())?;
                Ok(PyValue::Str(chars[resolved].to_string()))
            }
            PyValue::Dict(pairs) => pairs
                .iter()
                .find(|(k, _)| k.py_eq(&index))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Error::Key(index.py_repr())),
            other => Err(Error::Type(format!("'{}' object is not subscriptable", other.type_name()))),
        }
    }

    fn to_iterable(&self, value: &PyValue) -> Result<Vec<PyValue>> {
        match value {
            PyValue::List(items) | PyValue::Tuple(items) | PyValue::Set(items) => Ok(items.clone()),
            PyValue::Dict(pairs) => Ok(pairs.iter().map(|(k, _)| k.clone()).collect()),
            PyValue::Str(s) => Ok(s.chars().map(|c| PyValue::Str(c.to_string())).collect()),
            other => Err(Error::Type(format!("'{}' object is not iterable", other.type_name()))),
        }
    }

    /// Runs nested `for`/`if` generators, saving and restoring any outer
    /// bindings the comprehension's target names shadow so the
    /// comprehension has no side effects on the enclosing scope.
    fn eval_comprehension(
        &mut self,
        generators: &[Comprehension],
        mut emit: impl FnMut(&mut Self) -> Result<PyValue>,
    ) -> Result<Vec<PyValue>> {
        let target_names = generators.iter().flat_map(collect_names).collect::<Vec<_>>();
        let saved: Vec<(String, Option<PyValue>)> = target_names
            .iter()
            .map(|n| (n.clone(), self.symtable.get(n).cloned()))
            .collect();

        let mut out = Vec::new();
        self.comprehend(generators, 0, &mut emit, &mut out)?;

        for (name, value) in saved {
            match value {
                Some(v) => {
                    let _ = self.symtable.set(name, v);
                }
                None => {
                    self.symtable.remove(&name);
                }
            }
        }
        Ok(out)
    }

    fn comprehend(
        &mut self,
        generators: &[Comprehension],
        depth: usize,
        emit: &mut impl FnMut(&mut Self) -> Result<PyValue>,
        out: &mut Vec<PyValue>,
    ) -> Result<()> {
        let Some(gen) = generators.get(depth) else {
            out.push(emit(self)?);
            return Ok(());
        };
        let source = self.eval_expr(&gen.iter)?;
        let items = self.to_iterable(&source)?;
        for item in items {
            self.tick()?;
            self.assign(&gen.target, item)?;
            let mut keep = true;
            for cond in &gen.ifs {
                if !self.eval_expr(cond)?.is_truthy() {
                    keep = false;
                    break;
                }
            }
            if keep {
                self.comprehend(generators, depth + 1, emit, out)?;
            }
        }
        Ok(())
    }

    // ---- calls ------------------------------------------------------------

    fn eval_call(&mut self, call: &rustpython_ast::ExprCall) -> Result<PyValue> {
        let callee_name = match call.func.as_ref() {
            Expr::Name(n) => Some(n.id.to_string()),
            _ => None,
        };

        if let Some(name) = &callee_name
            && name == "print"
        {
            if !self.config.nodes.print {
                return Err(Error::NotImplemented("print is disabled".to_string()));
            }
            return self.call_print(&call.args);
        }

        let args = self.eval_exprs_with_starred(&call.args)?;
        let kwargs = self.eval_keywords(&call.keywords)?;

        if let Some(name) = &callee_name
            && self.symtable.get(name).is_none()
            && let Some(result) = builtins::try_builtin(name, args.clone())
        {
            return result;
        }

        let callee = self.eval_expr(&call.func)?;
        self.invoke(callee, args, kwargs)
    }

    fn eval_keywords(&mut self, keywords: &[Keyword]) -> Result<Vec<(String, PyValue)>> {
        let mut out: Vec<(String, PyValue)> = Vec::new();
        for kw in keywords {
            let value = self.eval_expr(&kw.value)?;
            match &kw.arg {
                Some(name) => {
                    if out.iter().any(|(k, _)| k == name.as_str()) {
                        return Err(Error::Syntax(format!("keyword argument repeated: {name}")));
                    }
                    out.push((name.to_string(), value));
                }
                None => {
                    if let PyValue::Dict(pairs) = value {
                        for (k, v) in pairs {
                            if let PyValue::Str(key) = k {
                                out.push((key, v));
                            }
                        }
                    } else {
                        return Err(Error::Type("argument after ** must be a dict".to_string()));
                    }
                }
            }
        }
        Ok(out)
    }

    fn call_print(&mut self, args: &[Expr]) -> Result<PyValue> {
        let values: Result<Vec<String>> = args.iter().map(|e| Ok(self.eval_expr(e)?.py_str())).collect();
        let line = values?.join(" ");
        writeln!(self.writer, "{line}").map_err(|e| Error::Runtime(e.to_string()))?;
        self.writer.flush().map_err(|e| Error::Runtime(e.to_string()))?;
        Ok(PyValue::None)
    }

    fn invoke(&mut self, callee: PyValue, args: Vec<PyValue>, kwargs: Vec<(String, PyValue)>) -> Result<PyValue> {
        match callee {
            PyValue::Native(native) => {
                if !kwargs.is_empty() {
                    return Err(Error::Type(format!(
                        "{}() does not accept keyword arguments",
                        native.name
                    )));
                }
                (native.func)(args).map_err(|e| match e {
                    Error::Runtime(m) => Error::Runtime(format!("{}: {m}", native.name)),
                    other => other,
                })
            }
            PyValue::Function(proc) => self.call_procedure(&proc, args, kwargs),
            other => Err(Error::Type(format!("'{}' object is not callable", other.type_name()))),
        }
    }

    fn build_procedure(&self, def: &rustpython_ast::StmtFunctionDef) -> Result<Procedure> {
        let args = &def.args;
        let mut params = Vec::new();
        let mut defaults = Vec::new();
        for a in args.posonlyargs.iter().chain(args.args.iter()) {
            match &a.default {
                Some(expr) => defaults.push((a.def.arg.to_string(), self.eval_constant_expr(expr)?)),
                None => params.push(a.def.arg.to_string()),
            }
        }
        for a in &args.kwonlyargs {
            let default = match &a.default {
                Some(expr) => self.eval_constant_expr(expr)?,
                None => PyValue::None,
            };
            defaults.push((a.def.arg.to_string(), default));
        }
        let doc = def.body.first().and_then(|s| match s {
            Stmt::Expr(e) => match e.value.as_ref() {
                Expr::Constant(c) => match &c.value {
                    Constant::Str(s) => Some(s.clone()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        });
        Ok(Procedure {
            name: def.name.to_string(),
            doc,
            params,
            defaults,
            vararg: args.vararg.as_ref().map(|a| a.arg.to_string()),
            varkw: args.kwarg.as_ref().map(|a| a.arg.to_string()),
            body: def.body.clone(),
            source: self.source.clone(),
            lineno: 0,
        })
    }

    /// Evaluates a default-value expression at `def` time. Only literal
    /// constants and names already bound in the defining scope are legal.
    fn eval_constant_expr(&self, expr: &Expr) -> Result<PyValue> {
        match expr {
            Expr::Constant(c) => self.eval_constant(&c.value),
            Expr::Name(n) => self.symtable.get(&n.id).cloned().ok_or_else(|| Error::Name(n.id.to_string())),
            Expr::UnaryOp(u) if matches!(u.op, rustpython_ast::UnaryOp::USub) => {
                let inner = self.eval_constant_expr(&u.operand)?;
                apply_unaryop(u.op, inner)
            }
            other => Err(Error::NotImplemented(format!(
                "default argument expression not supported: {other:?}"
            ))),
        }
    }

    fn call_procedure(&mut self, proc: &Rc<Procedure>, args: Vec<PyValue>, kwargs: Vec<(String, PyValue)>) -> Result<PyValue> {
        if self.call_depth >= self.config.max_recursion_depth {
            return Err(Error::Recursion(format!(
                "maximum recursion depth exceeded in '{}'",
                proc.name
            )));
        }
        let locals = proc.bind_arguments(args, kwargs)?;

        tracing::debug!(name = %proc.name, depth = self.call_depth + 1, "calling procedure");
        self.call_depth += 1;
        let snapshot = self.symtable.snapshot();
        self.symtable.update(locals);

        let result = self.exec_block(&proc.body);

        self.symtable.restore(snapshot);
        self.call_depth -= 1;
        tracing::debug!(name = %proc.name, "returned from procedure");

        match result? {
            Flow::Return(v) => Ok(v),
            _ => Ok(PyValue::None),
        }
    }
}

fn normalize_index(i: i64, len: usize) -> Result<usize> {
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved as usize >= len {
        Err(Error::Index("index out of range".to_string()))
    } else {
        Ok(resolved as usize)
    }
}

fn collect_names(gen: &Comprehension) -> Vec<String> {
    fn walk(expr: &Expr, out: &mut Vec<String>) {
        match expr {
            Expr::Name(n) => out.push(n.id.to_string()),
            Expr::Tuple(t) => t.elts.iter().for_each(|e| walk(e, out)),
            Expr::List(l) => l.elts.iter().for_each(|e| walk(e, out)),
            _ => {}
        }
    }
    let mut out = Vec::new();
    walk(&gen.target, &mut out);
    out
}

/// Canonical exception-class names bound by `preload` to native
/// constructors, so `raise ValueError('boom')` resolves `ValueError` as a
/// callable instead of falling through to a bogus `NameError`. Each
/// constructor renders a `classify_raised`-compatible `"Kind: message"`
/// string.
const EXCEPTION_KINDS: &[&str] = &[
    "BaseException",
    "Exception",
    "SyntaxError",
    "NameError",
    "TypeError",
    "AttributeError",
    "ValueError",
    "KeyError",
    "IndexError",
    "ZeroDivisionError",
    "AssertionError",
    "ImportError",
    "NotImplementedError",
    "RuntimeError",
    "RecursionError",
    "OverflowError",
    "MemoryError",
    "FileNotFoundError",
];

/// Best-effort classification of a `raise <expr>` target into one of the
/// host exception kinds, keyed by the conventional `NameError(...)` /
/// `ValueError(...)` call-style spelling scripts use.
fn classify_raised(message: &str) -> Error {
    let (kind, rest) = message.split_once(':').unwrap_or(("Exception", message));
    let rest = rest.trim().to_string();
    match kind.trim() {
        "SyntaxError" => Error::Syntax(rest),
        "NameError" => Error::Name(rest),
        "TypeError" => Error::Type(rest),
        "ValueError" => Error::Value(rest),
        "KeyError" => Error::Key(rest),
        "IndexError" => Error::Index(rest),
        "ZeroDivisionError" => Error::ZeroDivision(rest),
        "AssertionError" => Error::Assertion(rest),
        "ImportError" => Error::Import(rest),
        "AttributeError" => Error::Attribute(rest),
        "NotImplementedError" => Error::NotImplemented(rest),
        "RecursionError" => Error::Recursion(rest),
        "OverflowError" => Error::Overflow(rest),
        "MemoryError" => Error::Memory(rest),
        "FileNotFoundError" => Error::FileNotFound(rest),
        "RuntimeError" | "Exception" | "BaseException" => Error::Runtime(rest),
        _ => Error::Runtime(message.to_string()),
    }
}

fn exception_type_name(expr: &Expr) -> String {
    match expr {
        Expr::Name(n) => n.id.to_string(),
        Expr::Tuple(t) => t
            .elts
            .iter()
            .map(exception_type_name)
            .collect::<Vec<_>>()
            .join("|"),
        _ => "Exception".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_ok(src: &str) -> PyValue {
        let mut interp = Interpreter::new(Config::default());
        interp.eval(src, false, true).unwrap().unwrap_or(PyValue::None)
    }

    #[test]
    fn arithmetic_and_assignment() {
        let v = eval_ok("x = 1 + 2 * 3\nx");
        assert!(matches!(v, PyValue::Int(7)));
    }

    #[test]
    fn list_comprehension_does_not_leak_target() {
        let mut interp = Interpreter::new(Config::default());
        interp.eval("squares = [i * i for i in [1, 2, 3]]", false, true).unwrap();
        assert!(interp.get_symbol("i").is_none());
        assert!(matches!(interp.get_symbol("squares"), Some(PyValue::List(l)) if l.len() == 3));
    }

    #[test]
    fn function_with_default_argument() {
        let mut interp = Interpreter::new(Config::default());
        interp
            .eval("def greet(name, greeting='hi'):\n    return greeting + ' ' + name\nresult = greet('Ada')", false, true)
            .unwrap();
        assert!(matches!(interp.get_symbol("result"), Some(PyValue::Str(s)) if s == "hi Ada"));
    }

    #[test]
    fn try_except_binds_exception_name() {
        let mut interp = Interpreter::new(Config::default());
        interp
            .eval(
                "caught = None\ntry:\n    1 / 0\nexcept ZeroDivisionError as e:\n    caught = e",
                false,
                true,
            )
            .unwrap();
        assert!(matches!(interp.get_symbol("caught"), Some(PyValue::Str(_))));
    }

    #[test]
    fn dict_subscript_assignment_and_lookup() {
        let v = eval_ok("d = {'a': 1}\nd['b'] = 2\nd['b']");
        assert!(matches!(v, PyValue::Int(2)));
    }

    #[test]
    fn safe_pow_overflow_surfaces_as_runtime_error() {
        let mut interp = Interpreter::new(Config::default());
        let err = interp.eval("2 ** 100000", false, true).unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
    }

    #[test]
    fn open_with_write_mode_is_rejected() {
        let mut interp = Interpreter::new(Config::default());
        let err = interp.eval("open('x', 'wb')", false, true).unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
    }

    #[test]
    fn run_does_not_double_evaluate_trailing_expression() {
        let mut interp = Interpreter::new(Config::default());
        interp.eval("calls = []", false, true).unwrap();
        let v = interp.eval("calls.append(1)\nlen(calls)", false, true).unwrap();
        assert!(matches!(v, Some(PyValue::Int(1))));
    }

    #[test]
    fn list_slice_assignment_can_grow_the_list() {
        let v = eval_ok("a = [0, 1, 2, 3, 4]\na[1:3] = [9, 9, 9, 9]\na");
        assert!(matches!(&v, PyValue::List(l) if l.len() == 6));
    }

    #[test]
    fn extended_slice_assignment_requires_matching_length() {
        let mut interp = Interpreter::new(Config::default());
        let err = interp.eval("a = [0, 1, 2, 3]\na[::2] = [9]", false, true).unwrap_err();
        assert_eq!(err.kind(), "ValueError");
    }

    /// Minimal context-manager `HostObject` used to exercise `with`'s
    /// enter/exit sequencing and the attribute set/del capabilities.
    struct Resource {
        log: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
        name: &'static str,
        fail_exit: bool,
    }

    impl HostObject for Resource {
        fn type_name(&self) -> &str {
            "Resource"
        }
        fn get_attr(&self, name: &str) -> Option<PyValue> {
            match name {
                "tag" => Some(PyValue::Str(self.name.to_string())),
                _ => None,
            }
        }
        fn enter(&self) -> Option<Result<PyValue>> {
            self.log.borrow_mut().push(format!("enter:{}", self.name));
            Some(Ok(PyValue::Str(self.name.to_string())))
        }
        fn exit(&self) -> Result<()> {
            self.log.borrow_mut().push(format!("exit:{}", self.name));
            if self.fail_exit {
                Err(Error::Runtime(format!("{} failed to close", self.name)))
            } else {
                Ok(())
            }
        }
        fn set_attr(&self, name: &str, _value: PyValue) -> Option<Result<()>> {
            self.log.borrow_mut().push(format!("set:{name}"));
            Some(Ok(()))
        }
        fn del_attr(&self, name: &str) -> Option<Result<()>> {
            self.log.borrow_mut().push(format!("del:{name}"));
            Some(Ok(()))
        }
    }

    #[test]
    fn with_statement_enters_and_exits_in_reverse_order() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut interp = Interpreter::new(Config::default());
        interp.set_symbol(
            "a",
            PyValue::Host(std::rc::Rc::new(Resource { log: log.clone(), name: "a", fail_exit: false })),
        );
        interp.set_symbol(
            "b",
            PyValue::Host(std::rc::Rc::new(Resource { log: log.clone(), name: "b", fail_exit: false })),
        );
        interp
            .eval("with a as x, b as y:\n    tags = x + y", false, true)
            .unwrap();
        assert!(matches!(interp.get_symbol("tags"), Some(PyValue::Str(s)) if s == "ab"));
        assert_eq!(
            *log.borrow(),
            vec!["enter:a".to_string(), "enter:b".to_string(), "exit:b".to_string(), "exit:a".to_string()]
        );
    }

    #[test]
    fn with_statement_rejects_object_without_context_protocol() {
        let mut interp = Interpreter::new(Config::default());
        let err = interp.eval("with math:\n    pass", false, true).unwrap_err();
        assert_eq!(err.kind(), "TypeError");
    }

    #[test]
    fn with_statement_exits_even_when_body_raises() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut interp = Interpreter::new(Config::default());
        interp.set_symbol(
            "a",
            PyValue::Host(std::rc::Rc::new(Resource { log: log.clone(), name: "a", fail_exit: false })),
        );
        let err = interp.eval("with a as x:\n    raise ValueError('boom')", false, true).unwrap_err();
        assert_eq!(err.kind(), "ValueError");
        assert_eq!(*log.borrow(), vec!["enter:a".to_string(), "exit:a".to_string()]);
    }

    #[test]
    fn host_attribute_assignment_and_deletion_route_through_host_object() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut interp = Interpreter::new(Config::default());
        interp.set_symbol(
            "res",
            PyValue::Host(std::rc::Rc::new(Resource { log: log.clone(), name: "res", fail_exit: false })),
        );
        interp.eval("res.count = 1\ndel res.count", false, true).unwrap();
        assert_eq!(*log.borrow(), vec!["set:count".to_string(), "del:count".to_string()]);
    }
}
