//! Evaluator configuration: which statement/expression kinds are enabled,
//! resource limits, and the readonly-symbol policy.
//!
//! Mirrors the self-consuming `with_*` builder style used elsewhere in this
//! crate's configuration objects: construct a `Config::default()` (or
//! `Config::minimal()`), then chain `with_*` calls.

use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_MAX_STATEMENT_LENGTH: usize = 50_000;
pub const HARD_MAX_STATEMENT_LENGTH: usize = 100_000_000;
pub const DEFAULT_WALLCLOCK_BUDGET: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_CYCLES: u64 = 1_000_000;
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 256;

/// Which optional statement/expression kinds the evaluator accepts.
///
/// `if`/`for`/`while`/assignment/calls/binops are always enabled; this only
/// gates the advanced surface listed in the data model's options table.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeConfig {
    pub functiondef: bool,
    pub listcomp: bool,
    pub setcomp: bool,
    pub dictcomp: bool,
    pub augassign: bool,
    pub assert_stmt: bool,
    pub delete: bool,
    pub raise_stmt: bool,
    pub print: bool,
    pub import_stmt: bool,
    pub importfrom: bool,
    pub formattedvalue: bool,
    pub try_stmt: bool,
    pub with_stmt: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            functiondef: true,
            listcomp: true,
            setcomp: true,
            dictcomp: true,
            augassign: true,
            assert_stmt: true,
            delete: true,
            raise_stmt: true,
            print: true,
            import_stmt: false,
            importfrom: false,
            formattedvalue: true,
            try_stmt: true,
            with_stmt: true,
        }
    }
}

impl NodeConfig {
    /// Every advanced node kind disabled; only literals, names, arithmetic,
    /// comparisons, and plain `if` survive.
    pub fn minimal() -> Self {
        Self {
            functiondef: false,
            listcomp: false,
            setcomp: false,
            dictcomp: false,
            augassign: false,
            assert_stmt: false,
            delete: false,
            raise_stmt: false,
            print: false,
            import_stmt: false,
            importfrom: false,
            formattedvalue: false,
            try_stmt: false,
            with_stmt: false,
        }
    }
}

/// Top-level evaluator configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub nodes: NodeConfig,
    pub nested_symtable: bool,
    pub max_statement_length: usize,
    pub builtins_readonly: bool,
    pub readonly_symbols: HashSet<String>,
    pub allow_unsafe_modules: bool,
    pub wallclock_budget: Duration,
    pub max_cycles: u64,
    pub max_recursion_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nodes: NodeConfig::default(),
            nested_symtable: false,
            max_statement_length: DEFAULT_MAX_STATEMENT_LENGTH,
            builtins_readonly: false,
            readonly_symbols: HashSet::new(),
            allow_unsafe_modules: false,
            wallclock_budget: DEFAULT_WALLCLOCK_BUDGET,
            max_cycles: DEFAULT_MAX_CYCLES,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl Config {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Every advanced statement disabled, matching `NodeConfig::minimal()`.
    pub fn minimal() -> Self {
        Self {
            nodes: NodeConfig::minimal(),
            ..Self::default()
        }
    }

    pub fn with_nested_symtable(mut self, nested: bool) -> Self {
        self.nested_symtable = nested;
        self
    }

    pub fn with_max_statement_length(mut self, len: usize) -> Self {
        self.max_statement_length = len.min(HARD_MAX_STATEMENT_LENGTH);
        self
    }

    pub fn with_builtins_readonly(mut self, readonly: bool) -> Self {
        self.builtins_readonly = readonly;
        self
    }

    pub fn with_readonly_symbols(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.readonly_symbols = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allow_unsafe_modules(mut self, allow: bool) -> Self {
        self.allow_unsafe_modules = allow;
        self
    }

    pub fn with_wallclock_budget(mut self, budget: Duration) -> Self {
        self.wallclock_budget = budget;
        self
    }

    pub fn with_max_cycles(mut self, max: u64) -> Self {
        self.max_cycles = max;
        self
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_import(mut self, enabled: bool) -> Self {
        self.nodes.import_stmt = enabled;
        self.nodes.importfrom = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_disables_advanced_nodes() {
        let cfg = Config::minimal();
        assert!(!cfg.nodes.functiondef);
        assert!(!cfg.nodes.try_stmt);
    }

    #[test]
    fn default_leaves_import_disabled() {
        let cfg = Config::default();
        assert!(!cfg.nodes.import_stmt);
    }

    #[test]
    fn max_statement_length_is_capped_at_hard_limit() {
        let cfg = Config::builder().with_max_statement_length(usize::MAX);
        assert_eq!(cfg.max_statement_length, HARD_MAX_STATEMENT_LENGTH);
    }
}
