//! Identifier renaming.
//!
//! Every user function, parameter and local variable gets a synthetic
//! `obf_<n>` name. The pass runs in two sweeps over the tree: the first one
//! builds a global table for function names and one local table per
//! function, the second one rewrites declarations and resolves every
//! identifier reference local-first, then global.

use std::collections::HashMap;

use nolog::*;

use crate::ast::*;

use super::error::{ObfuscationWarning, PassError};
use super::names::{NameGenerator, RENAME_PREFIX};
use super::rewrite::{self, Rewrite};
use super::symtable::{ScopeChain, ScopeTable};
use super::Pass;

/// Names that keep their spelling everywhere.
pub const EXCLUDED: [&str; 3] = ["main", "printf", "scanf"];

/// Rename functions, parameters and local variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameIdentifiers {
    /// Rename user functions.
    pub functions: bool,
    /// Rename function parameters.
    pub params: bool,
    /// Rename local variables.
    pub locals: bool,
    /// Fail instead of warning on an assignment whose target is not an
    /// identifier.
    pub strict: bool,
}

impl Default for RenameIdentifiers {
    fn default() -> Self {
        Self {
            functions: true,
            params: true,
            locals: true,
            strict: false,
        }
    }
}

impl RenameIdentifiers {
    /// Rename all identifiers of `program`.
    ///
    /// Returns the renamed tree and the warnings raised on the way.
    pub fn run(&self, program: Program) -> Result<(Program, Vec<ObfuscationWarning>), PassError> {
        let mut renamer = Renamer::new(*self);
        let program = renamer.names.reserve_names_in(program);
        let program = renamer.rewrite_program(program, &RenameCx::new(Phase::Collect));
        trace!("RENAME " => "{} global names, {} functions", renamer.globals.len(), renamer.locals.len());
        let program = renamer.rewrite_program(program, &RenameCx::new(Phase::Apply));

        if self.strict {
            if let Some(ObfuscationWarning::InvalidAssignmentTarget { line }) =
                renamer.warnings.first()
            {
                return Err(PassError::InvalidAssignmentTarget { line: *line });
            }
        }
        Ok((program, renamer.warnings))
    }
}

impl Pass for RenameIdentifiers {
    fn name(&self) -> &'static str {
        "rename_identifiers"
    }

    fn apply(
        &self,
        program: Program,
        warnings: &mut Vec<ObfuscationWarning>,
    ) -> Result<Program, PassError> {
        let (program, mut raised) = self.run(program)?;
        warnings.append(&mut raised);
        Ok(program)
    }
}

/// Position of a function in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FunctionId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Build the symbol tables; the tree passes through unchanged.
    Collect,
    /// Rewrite names using the tables.
    Apply,
}

#[derive(Debug, Clone, Copy)]
struct RenameCx {
    phase: Phase,
    function: Option<FunctionId>,
}

impl RenameCx {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            function: None,
        }
    }
}

/// State of one renaming run.
struct Renamer {
    options: RenameIdentifiers,
    names: NameGenerator,
    globals: ScopeTable,
    locals: HashMap<FunctionId, ScopeTable>,
    warnings: Vec<ObfuscationWarning>,
}

impl Renamer {
    fn new(options: RenameIdentifiers) -> Self {
        Self {
            options,
            names: NameGenerator::new(RENAME_PREFIX),
            globals: ScopeTable::new(),
            locals: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Bind a parameter or local of the current function.
    ///
    /// A disabled category binds the name to itself, which still hides a
    /// function of the same name.
    fn declare_local(&mut self, cx: &RenameCx, ident: &str, enabled: bool) {
        let Some(function) = cx.function else {
            return;
        };
        if EXCLUDED.contains(&ident) {
            return;
        }
        let names = &mut self.names;
        let table = self.locals.entry(function).or_default();
        table.declare(ident, || {
            if enabled {
                names.fresh()
            } else {
                ident.to_string()
            }
        });
    }

    fn local(&self, cx: &RenameCx) -> Option<&ScopeTable> {
        cx.function.and_then(|id| self.locals.get(&id))
    }

    fn scope(&self, cx: &RenameCx) -> ScopeChain<'_> {
        ScopeChain::new(self.local(cx), &self.globals)
    }
}

/// Replace `ident` with what `resolve` maps it to, if anything.
fn rename<'a>(resolve: impl Fn(&str) -> Option<&'a str>, ident: Loc<String>) -> Loc<String> {
    ident.map(|name| match resolve(&name) {
        Some(renamed) => renamed.to_string(),
        None => name,
    })
}

impl Rewrite for Renamer {
    type Context = RenameCx;

    fn rewrite_program(&mut self, node: Program, cx: &RenameCx) -> Program {
        let decls = node
            .decls
            .into_iter()
            .enumerate()
            .map(|(i, decl)| {
                let cx = RenameCx {
                    function: Some(FunctionId(i)),
                    ..*cx
                };
                decl.map(|decl| self.rewrite_function_def(decl, &cx))
            })
            .collect();
        Program { decls }
    }

    fn rewrite_function_def(&mut self, node: FunctionDef, cx: &RenameCx) -> FunctionDef {
        match cx.phase {
            Phase::Collect => {
                let name = node.name.node.as_str();
                if self.options.functions && !EXCLUDED.contains(&name) {
                    let names = &mut self.names;
                    self.globals.declare(name, || names.fresh());
                }
                if let Some(function) = cx.function {
                    self.locals.entry(function).or_default();
                }
                rewrite::walk_function_def(self, node, cx)
            }
            Phase::Apply => {
                let node = FunctionDef {
                    name: rename(|name| self.globals.get(name), node.name),
                    ..node
                };
                trace!(->[0] "RENAME " => "function `{}`", node.name);
                rewrite::walk_function_def(self, node, cx)
            }
        }
    }

    fn rewrite_param(&mut self, node: Param, cx: &RenameCx) -> Param {
        match cx.phase {
            Phase::Collect => {
                self.declare_local(cx, &node.name.node, self.options.params);
                node
            }
            Phase::Apply => {
                let local = self.local(cx);
                Param {
                    name: rename(|name| local.and_then(|table| table.get(name)), node.name),
                    ..node
                }
            }
        }
    }

    fn rewrite_var_decl(&mut self, node: VarDecl, cx: &RenameCx) -> VarDecl {
        let node = match cx.phase {
            Phase::Collect => {
                self.declare_local(cx, &node.name.node, self.options.locals);
                node
            }
            Phase::Apply => {
                let local = self.local(cx);
                VarDecl {
                    name: rename(|name| local.and_then(|table| table.get(name)), node.name),
                    ..node
                }
            }
        };
        rewrite::walk_var_decl(self, node, cx)
    }

    fn rewrite_assignment(&mut self, node: Assignment, cx: &RenameCx) -> Assignment {
        if cx.phase == Phase::Apply && !matches!(*node.lval, Expr::Ident(_)) {
            let line = node.lval.line();
            warn!("RENAME " => "assignment target is not an identifier (line {:?})", line);
            self.warnings
                .push(ObfuscationWarning::InvalidAssignmentTarget { line });
        }
        rewrite::walk_assignment(self, node, cx)
    }

    fn rewrite_ident(&mut self, node: Loc<String>, cx: &RenameCx) -> Loc<String> {
        match cx.phase {
            Phase::Collect => node,
            Phase::Apply => {
                let scope = self.scope(cx);
                rename(|name| scope.resolve(name), node)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::{HashMap, HashSet};

    use proptest::prelude::*;

    use super::*;
    use crate::ast::arbitrary::arb_program;

    fn rename_source(pass: RenameIdentifiers, source: &str) -> String {
        let program = crate::parse(source).unwrap();
        let (program, warnings) = pass.run(program).unwrap();
        assert!(warnings.is_empty());
        program.to_string()
    }

    #[test]
    fn renames_function_params_and_locals() {
        let output = rename_source(
            RenameIdentifiers::default(),
            "int add(int a, int b) { int c = a + b; return c; }",
        );
        assert_eq!(
            output,
            "int obf_1(int obf_2, int obf_3) {\n    int obf_4 = obf_2 + obf_3;\n    return obf_4;\n}\n"
        );
    }

    #[test]
    fn keeps_excluded_names() {
        let output = rename_source(
            RenameIdentifiers::default(),
            r#"int f(int x) { return x; }
            int main() { int y = f(1); printf("%d", y); scanf("%d", y); return main(); }"#,
        );
        assert_eq!(
            output,
            "int obf_1(int obf_2) {\n    return obf_2;\n}\n\n\
             int main() {\n    int obf_3 = obf_1(1);\n    printf(\"%d\", obf_3);\n    \
             scanf(\"%d\", obf_3);\n    return main();\n}\n"
        );
    }

    #[test]
    fn locals_shadow_functions() {
        let output = rename_source(
            RenameIdentifiers::default(),
            "int f() { return 1; } int g(int f) { return f; } int h() { return f(); }",
        );
        assert!(output.contains("int obf_2(int obf_3) {\n    return obf_3;"), "{output}");
        assert!(output.contains("int obf_4() {\n    return obf_1();"), "{output}");
    }

    #[test]
    fn names_declared_later_in_function_are_local_everywhere() {
        let output = rename_source(
            RenameIdentifiers::default(),
            "int x() { return 0; } int main() { x = 1; { int x = 2; } return x; }",
        );
        // the local table is per function, so `x` resolves to the local
        // before its declaration too
        assert_eq!(
            output,
            "int obf_1() {\n    return 0;\n}\n\n\
             int main() {\n    obf_2 = 1;\n    {\n        int obf_2 = 2;\n    }\n    return obf_2;\n}\n"
        );
    }

    #[test]
    fn disabled_categories_still_shadow() {
        let pass = RenameIdentifiers {
            params: false,
            ..Default::default()
        };
        let output = rename_source(pass, "int f() { return 1; } int g(int f) { int y = f; return f(); }");
        assert_eq!(
            output,
            "int obf_1() {\n    return 1;\n}\n\n\
             int obf_2(int f) {\n    int obf_3 = f;\n    return f();\n}\n"
        );
    }

    #[test]
    fn disabling_everything_is_identity() {
        let pass = RenameIdentifiers {
            functions: false,
            params: false,
            locals: false,
            strict: false,
        };
        let source = "int f(int a) { int b = a; return f(b); }";
        let output = rename_source(pass, source);
        assert_eq!(output, crate::parse(source).unwrap().to_string());
    }

    #[test]
    fn avoids_names_already_in_program() {
        let output = rename_source(
            RenameIdentifiers::default(),
            "int obf_1() { return 0; } int f() { return obf_1(); }",
        );
        assert_eq!(
            output,
            "int obf_2() {\n    return 0;\n}\n\nint obf_3() {\n    return obf_2();\n}\n"
        );
    }

    #[test]
    fn warns_on_non_identifier_target() {
        let program =
            crate::parse("int main() {\n    int a;\n    a + 1 = 2;\n    (a) = 3;\n    return a;\n}")
                .unwrap();
        let (program, warnings) = RenameIdentifiers::default().run(program).unwrap();
        assert_eq!(
            warnings,
            [ObfuscationWarning::InvalidAssignmentTarget { line: Some(3) }]
        );
        let output = program.to_string();
        assert!(output.contains("(obf_1 + 1) = 2;"), "{output}");
        assert!(output.contains("obf_1 = 3;"), "{output}");
    }

    #[test]
    fn strict_mode_fails() {
        let program = crate::parse("int main() { 1 = 2; return 0; }").unwrap();
        let pass = RenameIdentifiers {
            strict: true,
            ..Default::default()
        };
        assert!(matches!(
            pass.run(program),
            Err(PassError::InvalidAssignmentTarget { line: Some(1) })
        ));
    }

    #[test]
    fn pass_is_reusable() {
        let pass = RenameIdentifiers::default();
        let program = crate::parse("int f(int a) { return a; }").unwrap();
        let first = pass.run(program.clone()).unwrap().0;
        let second = pass.run(program).unwrap().0;
        assert_eq!(first, second);
    }

    #[test]
    fn loop_variables_and_params_resolve_in_every_clause() {
        let output = rename_source(
            RenameIdentifiers::default(),
            "int sum(int n) { int s = 0; for (int i = 0; i < n; i = i + 1) { \
             while (s < i) { if (n) s = s + i; else s = s - n; } } return sum(s); }",
        );
        assert_eq!(
            output,
            "int obf_1(int obf_2) {\n    int obf_3 = 0;\n    \
             for (int obf_4 = 0; obf_4 < obf_2; obf_4 = obf_4 + 1) {\n        \
             while (obf_3 < obf_4) {\n            if (obf_2)\n                \
             obf_3 = obf_3 + obf_4;\n            else\n                \
             obf_3 = obf_3 - obf_2;\n        }\n    }\n    return obf_1(obf_3);\n}\n"
        );
    }

    /// Declared names of each function, in declaration order.
    #[derive(Default)]
    struct Declared(Vec<(String, Vec<String>)>);

    impl Rewrite for Declared {
        type Context = ();

        fn rewrite_function_def(&mut self, node: FunctionDef, cx: &()) -> FunctionDef {
            self.0.push((node.name.node.clone(), Vec::new()));
            rewrite::walk_function_def(self, node, cx)
        }

        fn rewrite_param(&mut self, node: Param, _cx: &()) -> Param {
            if let Some((_, names)) = self.0.last_mut() {
                names.push(node.name.node.clone());
            }
            node
        }

        fn rewrite_var_decl(&mut self, node: VarDecl, cx: &()) -> VarDecl {
            if let Some((_, names)) = self.0.last_mut() {
                names.push(node.name.node.clone());
            }
            rewrite::walk_var_decl(self, node, cx)
        }
    }

    fn declared(program: &Program) -> Vec<(String, Vec<String>)> {
        let mut declared = Declared::default();
        declared.rewrite_program(program.clone(), &());
        declared.0
    }

    /// Identifier references (including call targets) in traversal order,
    /// tagged with the index of the enclosing function.
    #[derive(Default)]
    struct References {
        function: usize,
        found: Vec<(usize, String)>,
    }

    impl Rewrite for References {
        type Context = ();

        fn rewrite_function_def(&mut self, node: FunctionDef, cx: &()) -> FunctionDef {
            let node = rewrite::walk_function_def(self, node, cx);
            self.function += 1;
            node
        }

        fn rewrite_ident(&mut self, node: Loc<String>, _cx: &()) -> Loc<String> {
            self.found.push((self.function, node.node.clone()));
            node
        }
    }

    fn references(program: &Program) -> Vec<(usize, String)> {
        let mut references = References::default();
        references.rewrite_program(program.clone(), &());
        references.found
    }

    proptest! {
        #[test]
        fn synthetic_names_are_unique(program in arb_program()) {
            let (renamed, _) = RenameIdentifiers::default().run(program.clone()).unwrap();
            let before = declared(&program);
            let after = declared(&renamed);

            // (function, original name) -> synthetic name
            let mut bindings = HashMap::new();
            for ((func, names), (new_func, new_names)) in before.iter().zip(&after) {
                if EXCLUDED.contains(&func.as_str()) {
                    prop_assert_eq!(func, new_func);
                } else {
                    prop_assert!(new_func.starts_with(RENAME_PREFIX));
                    bindings.insert((None, func.clone()), new_func.clone());
                }
                for (name, new_name) in names.iter().zip(new_names) {
                    prop_assert!(new_name.starts_with(RENAME_PREFIX));
                    let previous = bindings.insert((Some(func.clone()), name.clone()), new_name.clone());
                    // repeated declarations in one function share one name
                    if let Some(previous) = previous {
                        prop_assert_eq!(&previous, new_name);
                    }
                }
            }
            let distinct: HashSet<_> = bindings.values().collect();
            prop_assert_eq!(distinct.len(), bindings.len());
        }

        #[test]
        fn references_resolve_local_first(program in arb_program()) {
            let (renamed, _) = RenameIdentifiers::default().run(program.clone()).unwrap();

            // original name -> synthetic name, globally and per function
            let mut global = HashMap::new();
            let mut locals = Vec::new();
            for ((func, names), (new_func, new_names)) in
                declared(&program).into_iter().zip(declared(&renamed))
            {
                global.entry(func).or_insert(new_func);
                let mut local = HashMap::new();
                for (name, new_name) in names.into_iter().zip(new_names) {
                    local.entry(name).or_insert(new_name);
                }
                locals.push(local);
            }

            let before = references(&program);
            let after = references(&renamed);
            prop_assert_eq!(before.len(), after.len());
            for ((func, name), (new_func, new_name)) in before.iter().zip(&after) {
                prop_assert_eq!(func, new_func);
                let expected = locals[*func]
                    .get(name)
                    .or_else(|| global.get(name))
                    .unwrap_or(name);
                prop_assert_eq!(new_name, expected, "`{}` in function {}", name, func);
                if EXCLUDED.contains(&name.as_str()) && !locals[*func].contains_key(name) {
                    prop_assert_eq!(new_name, name);
                }
            }
        }

        #[test]
        fn renamed_program_round_trips(program in arb_program()) {
            let (renamed, _) = RenameIdentifiers::default().run(program).unwrap();
            let reparsed = crate::parse(&renamed.to_string()).unwrap();
            prop_assert_eq!(reparsed, renamed);
        }
    }
}
