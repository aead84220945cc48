//! Dead declaration insertion.
//!
//! After each statement of every block, except a `return`, a declaration
//! `int unused_<n> = <random>;` is inserted with a fixed probability. The
//! declared variables are never read, so the program behaves the same.

use nolog::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ast::*;

use super::error::{ConfigError, ObfuscationWarning, PassError};
use super::names::{NameGenerator, DEAD_CODE_PREFIX};
use super::rewrite::Rewrite;
use super::Pass;

/// Smallest initializer value of an inserted declaration.
pub const MIN_VALUE: i64 = -10000;
/// Largest initializer value of an inserted declaration.
pub const MAX_VALUE: i64 = 10000;

/// Insert unused variable declarations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadCodeInsertion {
    probability: f64,
    seed: Option<u64>,
}

impl Default for DeadCodeInsertion {
    fn default() -> Self {
        Self {
            probability: 0.25,
            seed: None,
        }
    }
}

impl DeadCodeInsertion {
    /// Insert after a statement with the given probability.
    pub fn new(probability: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::InvalidProbability(probability));
        }
        Ok(Self {
            probability,
            seed: None,
        })
    }

    /// Draw from a generator seeded with `seed`, making every run insert the
    /// same declarations.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    /// Insertion probability.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Insert declarations into every block of `program`.
    pub fn run(&self, program: Program) -> Program {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut inserter = Inserter {
            probability: self.probability,
            rng,
            names: NameGenerator::new(DEAD_CODE_PREFIX),
            inserted: 0,
        };
        let program = inserter.names.reserve_names_in(program);
        let program = inserter.rewrite_program(program, &());
        trace!("DEAD " => "inserted {} declarations", inserter.inserted);
        program
    }
}

impl Pass for DeadCodeInsertion {
    fn name(&self) -> &'static str {
        "dead_code"
    }

    fn apply(
        &self,
        program: Program,
        _warnings: &mut Vec<ObfuscationWarning>,
    ) -> Result<Program, PassError> {
        Ok(self.run(program))
    }
}

/// State of one insertion run.
struct Inserter {
    probability: f64,
    rng: StdRng,
    names: NameGenerator,
    inserted: usize,
}

impl Inserter {
    fn dead_decl(&mut self) -> Stmt {
        let value = self.rng.gen_range(MIN_VALUE..=MAX_VALUE);
        self.inserted += 1;
        Stmt::VarDecl(VarDecl {
            ty: Type::Int.unlocated(),
            name: self.names.fresh().unlocated(),
            init: Some(Expr::Literal(Literal::Number(value.unlocated()))),
        })
    }
}

impl Rewrite for Inserter {
    type Context = ();

    fn rewrite_block(&mut self, node: Block, cx: &()) -> Block {
        let mut stmts = Vec::with_capacity(node.stmts.len());
        for stmt in node.stmts {
            let stmt = stmt.map(|stmt| self.rewrite_stmt(stmt, cx));
            let is_return = matches!(stmt.node, Stmt::Return(_));
            stmts.push(stmt);
            if !is_return && self.rng.gen_bool(self.probability) {
                stmts.push(self.dead_decl().unlocated());
            }
        }
        Block { stmts }
    }

    fn rewrite_expr(&mut self, node: Expr, _cx: &()) -> Expr {
        node
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::obfuscate::rewrite::{self, Rewrite};

    /// Walks statements, recording each block's statement list.
    #[derive(Default)]
    struct Blocks(Vec<Vec<Stmt>>);

    impl Rewrite for Blocks {
        type Context = ();

        fn rewrite_block(&mut self, node: Block, cx: &()) -> Block {
            self.0
                .push(node.stmts.iter().map(|stmt| stmt.node.clone()).collect());
            rewrite::walk_block(self, node, cx)
        }
    }

    fn blocks(program: &Program) -> Vec<Vec<Stmt>> {
        let mut blocks = Blocks::default();
        blocks.rewrite_program(program.clone(), &());
        blocks.0
    }

    fn is_dead(stmt: &Stmt) -> bool {
        matches!(stmt, Stmt::VarDecl(decl) if decl.name.node.starts_with(DEAD_CODE_PREFIX))
    }

    fn count_dead(program: &Program) -> usize {
        blocks(program).iter().flatten().filter(|stmt| is_dead(stmt)).count()
    }

    const SOURCE: &str = "int f(int a) {
        int b = a;
        while (b) { b = b - 1; if (b) { return b; } else { b = 0; } }
        for (int i = 0; i < a; i = i + 1) { a = a + i; }
        { int c = 1; }
        return b;
    }";

    #[test]
    fn rejects_out_of_range_probability() {
        assert_eq!(
            DeadCodeInsertion::new(1.5),
            Err(ConfigError::InvalidProbability(1.5))
        );
        assert!(DeadCodeInsertion::new(-0.1).is_err());
        assert!(DeadCodeInsertion::new(f64::NAN).is_err());
        assert!(DeadCodeInsertion::new(0.0).is_ok());
        assert!(DeadCodeInsertion::new(1.0).is_ok());
    }

    #[test]
    fn default_options() {
        let pass = DeadCodeInsertion::default();
        assert_eq!(pass.probability(), 0.25);
        assert_eq!(pass.seed(), None);

        let pass = DeadCodeInsertion::new(0.5).unwrap().with_seed(3);
        assert_eq!(pass.probability(), 0.5);
        assert_eq!(pass.seed(), Some(3));
    }

    #[test]
    fn zero_probability_keeps_program() {
        let program = crate::parse(SOURCE).unwrap();
        let pass = DeadCodeInsertion::new(0.0).unwrap().with_seed(7);
        assert_eq!(pass.run(program.clone()), program);
    }

    #[test]
    fn full_probability_inserts_after_every_non_return() {
        let program = crate::parse(SOURCE).unwrap();
        let pass = DeadCodeInsertion::new(1.0).unwrap().with_seed(7);
        let output = pass.run(program.clone());

        for stmts in blocks(&output) {
            let mut iter = stmts.iter().peekable();
            while let Some(stmt) = iter.next() {
                if is_dead(stmt) {
                    continue;
                }
                let next = iter.peek().copied();
                if matches!(stmt, Stmt::Return(_)) {
                    assert!(!next.is_some_and(is_dead), "dead code after return");
                } else {
                    assert!(next.is_some_and(is_dead), "missing dead code after {stmt:?}");
                }
            }
        }
        // function body: 4 of 5; while body: 2 of 2; then and else: 0 + 1;
        // for body: 1; nested block: 1
        assert_eq!(count_dead(&output), 4 + 2 + 1 + 1 + 1);
    }

    #[test]
    fn inserted_declarations_are_well_formed() {
        let program = crate::parse(SOURCE).unwrap();
        let output = DeadCodeInsertion::new(1.0).unwrap().with_seed(3).run(program);
        let mut seen = std::collections::HashSet::new();
        for stmt in blocks(&output).into_iter().flatten() {
            let Stmt::VarDecl(decl) = stmt else { continue };
            if !decl.name.node.starts_with(DEAD_CODE_PREFIX) {
                continue;
            }
            assert_eq!(decl.ty.node, Type::Int);
            assert!(seen.insert(decl.name.node.clone()), "duplicate name");
            match decl.init {
                Some(Expr::Literal(Literal::Number(n))) => {
                    assert!((MIN_VALUE..=MAX_VALUE).contains(&n.node))
                }
                other => panic!("unexpected initializer {other:?}"),
            }
        }
        assert!(!seen.is_empty());
    }

    #[test]
    fn for_clauses_and_expressions_untouched() {
        let program = crate::parse(SOURCE).unwrap();
        let output = DeadCodeInsertion::new(1.0).unwrap().with_seed(1).run(program);
        let text = output.to_string();
        assert!(text.contains("for (int i = 0; i < a; i = i + 1) {"), "{text}");
    }

    #[test]
    fn avoids_existing_names() {
        let program = crate::parse("int main() { int unused_1 = 0; return unused_1; }").unwrap();
        let output = DeadCodeInsertion::new(1.0).unwrap().with_seed(1).run(program);
        let text = output.to_string();
        assert!(text.contains("int unused_2 = "), "{text}");
        assert_eq!(text.matches("int unused_1 = 0;").count(), 1, "{text}");
    }

    #[test]
    fn same_seed_same_output() {
        let program = crate::parse(SOURCE).unwrap();
        let pass = DeadCodeInsertion::default().with_seed(42);
        assert_eq!(pass.run(program.clone()), pass.run(program));
    }

    #[test]
    fn insertion_rate_tracks_probability() {
        let body = "x = x + 1;\n".repeat(200);
        let program = crate::parse(&format!("int main() {{ int x = 0;\n{body} }}")).unwrap();
        let pass = DeadCodeInsertion::new(0.25).unwrap();
        let total: usize = (0..10)
            .map(|seed| count_dead(&pass.with_seed(seed).run(program.clone())))
            .sum();
        // 201 candidates per run; mean 502.5 over 10 runs, sd ~19
        assert!((400..=600).contains(&total), "{total}");
    }
}
