//! Arbitrary AST generator.
//!
//! Generated trees carry no line information and always re-parse to
//! themselves once emitted: numbers are non-negative (a leading `-` is a
//! unary operator), and branches of control statements are blocks, which
//! keeps `else` from binding to the wrong `if`.

use proptest::prelude::*;

use super::*;

/// Variable names used by generated programs.
const VARS: &[&str] = &["a", "b", "c", "x", "y", "n"];

/// Callee names; includes library functions and a name that is also a
/// variable.
const CALLEES: &[&str] = &["f0", "f1", "f2", "main", "printf", "scanf", "a"];

/// Characters that appear in char and string literals.
const CHARS: &[char] = &['a', 'Z', '0', ' ', '\'', '"', '\\', '\n', '\t', '\r', '%'];

/// Generate an arbitrary program: up to three user functions `f0`, `f1`,
/// `f2`, followed by `main`.
pub fn arb_program() -> impl Strategy<Value = Program> {
    (1..4usize)
        .prop_flat_map(|n| {
            (0..n)
                .map(|i| format!("f{i}"))
                .chain(std::iter::once("main".to_string()))
                .map(arb_function_def)
                .collect::<Vec<_>>()
        })
        .prop_map(|decls| Program {
            decls: decls.into_iter().map(NonLocated::unlocated).collect(),
        })
}

/// Generate an arbitrary function definition with the given name.
pub fn arb_function_def(name: String) -> impl Strategy<Value = FunctionDef> {
    (
        arb_type(),
        prop::collection::vec(arb_param(), 0..3),
        prop::collection::vec(arb_stmt(), 0..5),
    )
        .prop_map(move |(ret_ty, params, stmts)| FunctionDef {
            ret_ty: ret_ty.unlocated(),
            name: name.clone().unlocated(),
            params: params.into_iter().map(NonLocated::unlocated).collect(),
            body: block_of(stmts).unlocated(),
        })
}

/// Generate an arbitrary parameter.
pub fn arb_param() -> impl Strategy<Value = Param> {
    (arb_type(), arb_var()).prop_map(|(ty, name)| Param {
        ty: ty.unlocated(),
        name,
    })
}

/// Generate an arbitrary type.
pub fn arb_type() -> impl Strategy<Value = Type> {
    prop_oneof![Just(Type::Int), Just(Type::Char), Just(Type::Bool)]
}

fn block_of(stmts: Vec<Stmt>) -> Block {
    Block {
        stmts: stmts.into_iter().map(NonLocated::unlocated).collect(),
    }
}

/// Generate an arbitrary statement.
pub fn arb_stmt() -> impl Strategy<Value = Stmt> {
    let leaf = prop_oneof![
        arb_var_decl().prop_map(Stmt::VarDecl),
        arb_expr().prop_map(Stmt::Expr),
        proptest::option::of(arb_expr()).prop_map(|expr| Stmt::Return(Return { expr })),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        let block = prop::collection::vec(inner, 0..4).prop_map(block_of);
        let branch = block.clone().prop_map(|block| Box::new(Stmt::Block(block).unlocated()));
        prop_oneof![
            block.prop_map(Stmt::Block),
            (
                arb_expr(),
                branch.clone(),
                proptest::option::of(branch.clone())
            )
                .prop_map(|(cond, then, els)| Stmt::If(If { cond, then, els })),
            (arb_expr(), branch.clone()).prop_map(|(cond, body)| Stmt::While(While { cond, body })),
            (
                proptest::option::of(arb_for_init()),
                proptest::option::of(arb_expr()),
                proptest::option::of(arb_expr()),
                branch,
            )
                .prop_map(|(init, cond, update, body)| Stmt::For(For {
                    init,
                    cond,
                    update,
                    body,
                })),
        ]
    })
}

/// Generate an arbitrary variable declaration.
pub fn arb_var_decl() -> impl Strategy<Value = VarDecl> {
    (arb_type(), arb_var(), proptest::option::of(arb_expr())).prop_map(|(ty, name, init)| {
        VarDecl {
            ty: ty.unlocated(),
            name,
            init,
        }
    })
}

fn arb_for_init() -> impl Strategy<Value = ForInit> {
    prop_oneof![
        arb_var_decl().prop_map(|decl| ForInit::VarDecl(decl.unlocated())),
        arb_expr().prop_map(ForInit::Expr),
    ]
}

/// Generate an arbitrary expression.
///
/// Assignment targets are always plain identifiers.
pub fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        arb_var().prop_map(Expr::Ident),
        arb_literal().prop_map(Expr::Literal),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (arb_unary_op(), inner.clone()).prop_map(|(op, expr)| Expr::Unary(UnaryExpr {
                op: op.unlocated(),
                expr: Box::new(expr),
            })),
            (arb_binary_op(), inner.clone(), inner.clone()).prop_map(|(op, lhs, rhs)| {
                Expr::Binary(BinaryExpr {
                    op: op.unlocated(),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }),
            (arb_var(), inner.clone()).prop_map(|(lval, rval)| {
                Expr::Assign(
                    Assignment {
                        lval: Box::new(Expr::Ident(lval)),
                        rval: Box::new(rval),
                    }
                    .unlocated(),
                )
            }),
            (
                prop::sample::select(CALLEES),
                prop::collection::vec(inner, 0..3)
            )
                .prop_map(|(name, args)| {
                    Expr::Call(
                        FunctionCall {
                            name: name.to_string().unlocated(),
                            args,
                        }
                        .unlocated(),
                    )
                }),
        ]
    })
}

/// Generate an arbitrary variable name.
pub fn arb_var() -> impl Strategy<Value = Loc<String>> {
    prop::sample::select(VARS).prop_map(|name| name.to_string().unlocated())
}

/// Generate an arbitrary literal.
pub fn arb_literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        (0..10000i64).prop_map(|n| Literal::Number(n.unlocated())),
        prop::sample::select(CHARS).prop_map(|c| Literal::Char(c.unlocated())),
        prop::collection::vec(prop::sample::select(CHARS), 0..6)
            .prop_map(|chars| Literal::Str(chars.into_iter().collect::<String>().unlocated())),
        any::<bool>().prop_map(|b| Literal::Bool(b.unlocated())),
    ]
}

/// Generate an arbitrary unary operator.
pub fn arb_unary_op() -> impl Strategy<Value = UnaryOp> {
    prop_oneof![Just(UnaryOp::Pos), Just(UnaryOp::Neg), Just(UnaryOp::Not)]
}

/// Generate an arbitrary binary operator.
pub fn arb_binary_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Add),
        Just(BinaryOp::Sub),
        Just(BinaryOp::Mul),
        Just(BinaryOp::Div),
        Just(BinaryOp::Mod),
        Just(BinaryOp::Eq),
        Just(BinaryOp::Ne),
        Just(BinaryOp::Lt),
        Just(BinaryOp::Le),
        Just(BinaryOp::Gt),
        Just(BinaryOp::Ge),
        Just(BinaryOp::LAnd),
        Just(BinaryOp::LOr),
    ]
}
