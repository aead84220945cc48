//! Synthetic name generation.

use std::collections::HashSet;

use crate::ast::*;

use super::rewrite::{self, Rewrite};

/// Prefix of names produced by identifier renaming.
pub const RENAME_PREFIX: &str = "obf_";

/// Prefix of names given to inserted dead declarations.
pub const DEAD_CODE_PREFIX: &str = "unused_";

/// Produces fresh identifiers `<prefix><n>` with `n` counting up from 1.
///
/// A generated name is never handed out twice, and never coincides with a
/// name passed to [`NameGenerator::reserve`].
#[derive(Debug, Clone)]
pub struct NameGenerator {
    prefix: &'static str,
    counter: u64,
    used: HashSet<String>,
}

impl NameGenerator {
    /// Create a generator with an empty used-name set.
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: 0,
            used: HashSet::new(),
        }
    }

    /// Next unused name.
    pub fn fresh(&mut self) -> String {
        loop {
            self.counter += 1;
            let name = format!("{}{}", self.prefix, self.counter);
            if self.used.insert(name.clone()) {
                return name;
            }
        }
    }

    /// Mark `name` as taken.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.used.insert(name.into());
    }

    /// Whether `name` was generated or reserved.
    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Forget every generated and reserved name and restart the counter.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.used.clear();
    }

    /// Reserve every identifier that occurs in `program`.
    ///
    /// Takes and returns the program unchanged.
    pub fn reserve_names_in(&mut self, program: Program) -> Program {
        NameCollector(self).rewrite_program(program, &())
    }
}

/// Reserves declared and referenced names as it walks.
struct NameCollector<'a>(&'a mut NameGenerator);

impl Rewrite for NameCollector<'_> {
    type Context = ();

    fn rewrite_function_def(&mut self, node: FunctionDef, cx: &()) -> FunctionDef {
        self.0.reserve(node.name.node.as_str());
        rewrite::walk_function_def(self, node, cx)
    }

    fn rewrite_param(&mut self, node: Param, cx: &()) -> Param {
        self.0.reserve(node.name.node.as_str());
        rewrite::walk_param(self, node, cx)
    }

    fn rewrite_var_decl(&mut self, node: VarDecl, cx: &()) -> VarDecl {
        self.0.reserve(node.name.node.as_str());
        rewrite::walk_var_decl(self, node, cx)
    }

    fn rewrite_ident(&mut self, node: Loc<String>, _cx: &()) -> Loc<String> {
        self.0.reserve(node.node.as_str());
        node
    }
}
