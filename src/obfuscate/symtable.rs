//! Symbol tables of the renaming pass.

use std::collections::HashMap;

/// Maps original names to their replacements within one scope.
///
/// A name maps to itself when it must keep its spelling but still hide an
/// outer binding.
#[derive(Debug, Default, Clone)]
pub struct ScopeTable {
    names: HashMap<String, String>,
}

impl ScopeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `ident` to `replacement` unless it is already bound.
    ///
    /// Returns `true` if the binding was added.
    pub fn declare(&mut self, ident: &str, replacement: impl FnOnce() -> String) -> bool {
        if self.names.contains_key(ident) {
            return false;
        }
        self.names.insert(ident.to_string(), replacement());
        true
    }

    /// Replacement of `ident`, if bound.
    pub fn get(&self, ident: &str) -> Option<&str> {
        self.names.get(ident).map(String::as_str)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table has no binding.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Local scope chained to the global one.
///
/// Lookups try the local table first.
pub struct ScopeChain<'a> {
    local: Option<&'a ScopeTable>,
    global: &'a ScopeTable,
}

impl<'a> ScopeChain<'a> {
    /// Chain `local`, when present, in front of `global`.
    pub fn new(local: Option<&'a ScopeTable>, global: &'a ScopeTable) -> Self {
        Self { local, global }
    }

    /// Resolve `ident` local-first, then global.
    pub fn resolve(&self, ident: &str) -> Option<&'a str> {
        self.local
            .and_then(|local| local.get(ident))
            .or_else(|| self.global.get(ident))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_declaration_wins() {
        let mut table = ScopeTable::new();
        assert!(table.is_empty());
        assert!(table.declare("x", || "obf_1".into()));
        assert!(!table.declare("x", || unreachable!()));
        assert_eq!(table.get("x"), Some("obf_1"));
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
    }

    #[test]
    fn local_shadows_global() {
        let mut global = ScopeTable::new();
        global.declare("f", || "obf_1".into());
        global.declare("g", || "obf_2".into());
        let mut local = ScopeTable::new();
        local.declare("f", || "f".into());

        let chain = ScopeChain::new(Some(&local), &global);
        assert_eq!(chain.resolve("f"), Some("f"));
        assert_eq!(chain.resolve("g"), Some("obf_2"));
        assert_eq!(chain.resolve("h"), None);

        let chain = ScopeChain::new(None, &global);
        assert_eq!(chain.resolve("f"), Some("obf_1"));
    }
}
