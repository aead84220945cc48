//! Tree rewriting framework.
//!
//! [`Rewrite`] has one handler per node kind. Every handler consumes a node
//! and returns its replacement, which may be the same node with children
//! replaced or an entirely new subtree. The default handlers delegate to the
//! matching `walk_*` function, which rebuilds the node with every child
//! rewritten and leaves non-tree fields alone. A pass overrides only the
//! handlers it needs and calls `walk_*` from them when it still wants the
//! structural recursion.
//!
//! Identifier handling is split in two: [`Rewrite::rewrite_ident`] sees
//! identifier *references* (plain identifiers in expressions and call
//! targets), while declared names belong to the declaring node and are only
//! reachable from its handler.

use crate::ast::*;

/// A tree rewriter.
///
/// `Context` is a pass-defined value threaded through the traversal. A
/// handler that wants a different context for its children builds a new
/// one and passes it down.
pub trait Rewrite {
    /// Per-traversal parameters.
    type Context;

    /// Rewrite a whole program.
    fn rewrite_program(&mut self, node: Program, cx: &Self::Context) -> Program {
        walk_program(self, node, cx)
    }

    /// Rewrite a function definition.
    fn rewrite_function_def(&mut self, node: FunctionDef, cx: &Self::Context) -> FunctionDef {
        walk_function_def(self, node, cx)
    }

    /// Rewrite a function parameter.
    fn rewrite_param(&mut self, node: Param, cx: &Self::Context) -> Param {
        walk_param(self, node, cx)
    }

    /// Rewrite a type. Types are leaves.
    fn rewrite_type(&mut self, node: Type, _cx: &Self::Context) -> Type {
        node
    }

    /// Rewrite a block, either a function body or a nested `{ }`.
    fn rewrite_block(&mut self, node: Block, cx: &Self::Context) -> Block {
        walk_block(self, node, cx)
    }

    /// Rewrite any statement. Dispatches on the statement kind.
    fn rewrite_stmt(&mut self, node: Stmt, cx: &Self::Context) -> Stmt {
        walk_stmt(self, node, cx)
    }

    /// Rewrite a variable declaration.
    fn rewrite_var_decl(&mut self, node: VarDecl, cx: &Self::Context) -> VarDecl {
        walk_var_decl(self, node, cx)
    }

    /// Rewrite an `if` statement.
    fn rewrite_if(&mut self, node: If, cx: &Self::Context) -> If {
        walk_if(self, node, cx)
    }

    /// Rewrite a `while` statement.
    fn rewrite_while(&mut self, node: While, cx: &Self::Context) -> While {
        walk_while(self, node, cx)
    }

    /// Rewrite a `for` statement.
    fn rewrite_for(&mut self, node: For, cx: &Self::Context) -> For {
        walk_for(self, node, cx)
    }

    /// Rewrite a `return` statement.
    fn rewrite_return(&mut self, node: Return, cx: &Self::Context) -> Return {
        walk_return(self, node, cx)
    }

    /// Rewrite any expression. Dispatches on the expression kind.
    fn rewrite_expr(&mut self, node: Expr, cx: &Self::Context) -> Expr {
        walk_expr(self, node, cx)
    }

    /// Rewrite an assignment.
    fn rewrite_assignment(&mut self, node: Assignment, cx: &Self::Context) -> Assignment {
        walk_assignment(self, node, cx)
    }

    /// Rewrite a function call.
    fn rewrite_call(&mut self, node: FunctionCall, cx: &Self::Context) -> FunctionCall {
        walk_call(self, node, cx)
    }

    /// Rewrite a binary operation.
    fn rewrite_binary(&mut self, node: BinaryExpr, cx: &Self::Context) -> BinaryExpr {
        walk_binary(self, node, cx)
    }

    /// Rewrite a unary operation.
    fn rewrite_unary(&mut self, node: UnaryExpr, cx: &Self::Context) -> UnaryExpr {
        walk_unary(self, node, cx)
    }

    /// Rewrite an identifier reference. Identifiers are leaves.
    fn rewrite_ident(&mut self, node: Loc<String>, _cx: &Self::Context) -> Loc<String> {
        node
    }

    /// Rewrite a literal. Literals are leaves.
    fn rewrite_literal(&mut self, node: Literal, _cx: &Self::Context) -> Literal {
        node
    }
}

/// Rewrite every function of a program.
pub fn walk_program<R: Rewrite + ?Sized>(r: &mut R, node: Program, cx: &R::Context) -> Program {
    Program {
        decls: node
            .decls
            .into_iter()
            .map(|decl| decl.map(|decl| r.rewrite_function_def(decl, cx)))
            .collect(),
    }
}

/// Rewrite the signature types, parameters and body of a function. The name is kept.
pub fn walk_function_def<R: Rewrite + ?Sized>(
    r: &mut R,
    node: FunctionDef,
    cx: &R::Context,
) -> FunctionDef {
    FunctionDef {
        ret_ty: node.ret_ty.map(|ty| r.rewrite_type(ty, cx)),
        name: node.name,
        params: node
            .params
            .into_iter()
            .map(|param| param.map(|param| r.rewrite_param(param, cx)))
            .collect(),
        body: node.body.map(|body| r.rewrite_block(body, cx)),
    }
}

/// Rewrite the type of a parameter. The name is kept.
pub fn walk_param<R: Rewrite + ?Sized>(r: &mut R, node: Param, cx: &R::Context) -> Param {
    Param {
        ty: node.ty.map(|ty| r.rewrite_type(ty, cx)),
        name: node.name,
    }
}

/// Rewrite every statement of a block, in order.
pub fn walk_block<R: Rewrite + ?Sized>(r: &mut R, node: Block, cx: &R::Context) -> Block {
    Block {
        stmts: node
            .stmts
            .into_iter()
            .map(|stmt| stmt.map(|stmt| r.rewrite_stmt(stmt, cx)))
            .collect(),
    }
}

/// Dispatch a statement to the handler of its kind.
pub fn walk_stmt<R: Rewrite + ?Sized>(r: &mut R, node: Stmt, cx: &R::Context) -> Stmt {
    match node {
        Stmt::VarDecl(decl) => Stmt::VarDecl(r.rewrite_var_decl(decl, cx)),
        Stmt::Expr(expr) => Stmt::Expr(r.rewrite_expr(expr, cx)),
        Stmt::Block(block) => Stmt::Block(r.rewrite_block(block, cx)),
        Stmt::If(stmt) => Stmt::If(r.rewrite_if(stmt, cx)),
        Stmt::While(stmt) => Stmt::While(r.rewrite_while(stmt, cx)),
        Stmt::For(stmt) => Stmt::For(r.rewrite_for(stmt, cx)),
        Stmt::Return(stmt) => Stmt::Return(r.rewrite_return(stmt, cx)),
    }
}

/// Rewrite the type and initializer of a declaration. The name is kept.
pub fn walk_var_decl<R: Rewrite + ?Sized>(r: &mut R, node: VarDecl, cx: &R::Context) -> VarDecl {
    VarDecl {
        ty: node.ty.map(|ty| r.rewrite_type(ty, cx)),
        name: node.name,
        init: node.init.map(|init| r.rewrite_expr(init, cx)),
    }
}

fn rewrite_boxed<R: Rewrite + ?Sized>(
    r: &mut R,
    stmt: Box<Loc<Stmt>>,
    cx: &R::Context,
) -> Box<Loc<Stmt>> {
    Box::new((*stmt).map(|stmt| r.rewrite_stmt(stmt, cx)))
}

/// Rewrite condition and branches of an `if`.
pub fn walk_if<R: Rewrite + ?Sized>(r: &mut R, node: If, cx: &R::Context) -> If {
    If {
        cond: r.rewrite_expr(node.cond, cx),
        then: rewrite_boxed(r, node.then, cx),
        els: node.els.map(|els| rewrite_boxed(r, els, cx)),
    }
}

/// Rewrite condition and body of a `while`.
pub fn walk_while<R: Rewrite + ?Sized>(r: &mut R, node: While, cx: &R::Context) -> While {
    While {
        cond: r.rewrite_expr(node.cond, cx),
        body: rewrite_boxed(r, node.body, cx),
    }
}

/// Rewrite the present clauses and the body of a `for`.
pub fn walk_for<R: Rewrite + ?Sized>(r: &mut R, node: For, cx: &R::Context) -> For {
    For {
        init: node.init.map(|init| match init {
            ForInit::VarDecl(decl) => ForInit::VarDecl(decl.map(|decl| r.rewrite_var_decl(decl, cx))),
            ForInit::Expr(expr) => ForInit::Expr(r.rewrite_expr(expr, cx)),
        }),
        cond: node.cond.map(|cond| r.rewrite_expr(cond, cx)),
        update: node.update.map(|update| r.rewrite_expr(update, cx)),
        body: rewrite_boxed(r, node.body, cx),
    }
}

/// Rewrite the returned value, if any.
pub fn walk_return<R: Rewrite + ?Sized>(r: &mut R, node: Return, cx: &R::Context) -> Return {
    Return {
        expr: node.expr.map(|expr| r.rewrite_expr(expr, cx)),
    }
}

/// Dispatch an expression to the handler of its kind.
pub fn walk_expr<R: Rewrite + ?Sized>(r: &mut R, node: Expr, cx: &R::Context) -> Expr {
    match node {
        Expr::Assign(assign) => Expr::Assign(assign.map(|assign| r.rewrite_assignment(assign, cx))),
        Expr::Call(call) => Expr::Call(call.map(|call| r.rewrite_call(call, cx))),
        Expr::Binary(binary) => Expr::Binary(r.rewrite_binary(binary, cx)),
        Expr::Unary(unary) => Expr::Unary(r.rewrite_unary(unary, cx)),
        Expr::Ident(ident) => Expr::Ident(r.rewrite_ident(ident, cx)),
        Expr::Literal(lit) => Expr::Literal(r.rewrite_literal(lit, cx)),
    }
}

fn rewrite_boxed_expr<R: Rewrite + ?Sized>(r: &mut R, expr: Box<Expr>, cx: &R::Context) -> Box<Expr> {
    Box::new(r.rewrite_expr(*expr, cx))
}

/// Rewrite both sides of an assignment.
pub fn walk_assignment<R: Rewrite + ?Sized>(
    r: &mut R,
    node: Assignment,
    cx: &R::Context,
) -> Assignment {
    Assignment {
        lval: rewrite_boxed_expr(r, node.lval, cx),
        rval: rewrite_boxed_expr(r, node.rval, cx),
    }
}

/// Rewrite the callee reference and the arguments of a call.
pub fn walk_call<R: Rewrite + ?Sized>(r: &mut R, node: FunctionCall, cx: &R::Context) -> FunctionCall {
    FunctionCall {
        name: r.rewrite_ident(node.name, cx),
        args: node
            .args
            .into_iter()
            .map(|arg| r.rewrite_expr(arg, cx))
            .collect(),
    }
}

/// Rewrite both operands. The operator is kept.
pub fn walk_binary<R: Rewrite + ?Sized>(r: &mut R, node: BinaryExpr, cx: &R::Context) -> BinaryExpr {
    BinaryExpr {
        op: node.op,
        lhs: rewrite_boxed_expr(r, node.lhs, cx),
        rhs: rewrite_boxed_expr(r, node.rhs, cx),
    }
}

/// Rewrite the operand. The operator is kept.
pub fn walk_unary<R: Rewrite + ?Sized>(r: &mut R, node: UnaryExpr, cx: &R::Context) -> UnaryExpr {
    UnaryExpr {
        op: node.op,
        expr: rewrite_boxed_expr(r, node.expr, cx),
    }
}
