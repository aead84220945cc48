//! MiniC source emitter.
//!
//! Every node renders itself through [`Display`]. Statements end with a
//! newline and nested blocks are indented by four spaces per level.
//!
//! Parentheses are never stored in the tree, so they are put back
//! conservatively: an operand that is itself a binary operation is always
//! parenthesized, whatever the relative precedence of the two operators.
//! The output may carry redundant parentheses but always re-parses to the
//! same tree.

use std::fmt::{Display, Formatter, Result, Write};

use indenter::indented;

use super::escape::{write_escaped_char, write_escaped_str};
use super::*;

const INDENT: &str = "    ";

/// Render a program as MiniC source text.
pub fn emit(program: &Program) -> String {
    program.to_string()
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for (i, decl) in self.decls.iter().enumerate() {
            if i != 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", decl)?;
        }
        Ok(())
    }
}

impl Display for FunctionDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} {}(", self.ret_ty, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") {}", self.body)
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Char => write!(f, "char"),
            Type::Bool => write!(f, "bool"),
        }
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "{{")?;
        for stmt in &self.stmts {
            let mut f = indented(f).with_str(INDENT);
            write!(f, "{}", stmt)?;
        }
        write!(f, "}}")
    }
}

/// Declarations print without the terminating `;`, so that the same
/// rendering serves a statement and a `for` init clause.
impl Display for VarDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} {}", self.ty, self.name)?;
        if let Some(init) = &self.init {
            write!(f, " = {}", init)?;
        }
        Ok(())
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Stmt::VarDecl(decl) => writeln!(f, "{};", decl),
            Stmt::Expr(expr) => writeln!(f, "{};", expr),
            Stmt::Block(block) => writeln!(f, "{}", block),
            Stmt::If(stmt) => write!(f, "{}", stmt),
            Stmt::While(stmt) => write!(f, "{}", stmt),
            Stmt::For(stmt) => write!(f, "{}", stmt),
            Stmt::Return(stmt) => write!(f, "{}", stmt),
        }
    }
}

impl Display for If {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "if ({})", self.cond)?;
        fmt_branch(f, &self.then)?;
        let Some(els) = &self.els else {
            return end_branch(f, &self.then);
        };

        if is_block(&self.then) {
            write!(f, " else")?;
        } else {
            write!(f, "else")?;
        }
        match &els.node {
            // `else if` stays on one line; the nested `if` ends its own line.
            Stmt::If(nested) => write!(f, " {}", nested),
            _ => {
                fmt_branch(f, els)?;
                end_branch(f, els)
            }
        }
    }
}

impl Display for While {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "while ({})", self.cond)?;
        fmt_branch(f, &self.body)?;
        end_branch(f, &self.body)
    }
}

impl Display for For {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "for (")?;
        match &self.init {
            Some(ForInit::VarDecl(decl)) => write!(f, "{}", decl)?,
            Some(ForInit::Expr(expr)) => write!(f, "{}", expr)?,
            None => {}
        }
        write!(f, ";")?;
        if let Some(cond) = &self.cond {
            write!(f, " {}", cond)?;
        }
        write!(f, ";")?;
        if let Some(update) = &self.update {
            write!(f, " {}", update)?;
        }
        write!(f, ")")?;
        fmt_branch(f, &self.body)?;
        end_branch(f, &self.body)
    }
}

impl Display for Return {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.expr {
            Some(expr) => writeln!(f, "return {};", expr),
            None => writeln!(f, "return;"),
        }
    }
}

fn is_block(stmt: &Loc<Stmt>) -> bool {
    matches!(stmt.node, Stmt::Block(_))
}

/// Write the body of a control statement.
///
/// A block opens on the current line; any other statement moves to the
/// next line, one level deeper, and ends that line itself.
fn fmt_branch(f: &mut Formatter<'_>, body: &Loc<Stmt>) -> Result {
    match &body.node {
        Stmt::Block(block) => write!(f, " {}", block),
        stmt => {
            writeln!(f)?;
            write!(indented(f).with_str(INDENT), "{}", stmt)
        }
    }
}

/// Terminate the line after the last branch of a control statement.
fn end_branch(f: &mut Formatter<'_>, body: &Loc<Stmt>) -> Result {
    if is_block(body) {
        writeln!(f)?;
    }
    Ok(())
}

impl Expr {
    /// Whether the expression needs parentheses as an operand.
    fn needs_parens(&self) -> bool {
        matches!(self, Expr::Binary(_) | Expr::Assign(_))
    }

    fn fmt_operand(&self, f: &mut Formatter<'_>) -> Result {
        if self.needs_parens() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Expr::Assign(assign) => write!(f, "{}", assign),
            Expr::Call(call) => write!(f, "{}", call),
            Expr::Binary(BinaryExpr { op, lhs, rhs }) => {
                lhs.fmt_operand(f)?;
                write!(f, " {} ", op)?;
                rhs.fmt_operand(f)
            }
            Expr::Unary(UnaryExpr { op, expr }) => {
                write!(f, "{}", op)?;
                expr.fmt_operand(f)
            }
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::Literal(lit) => write!(f, "{}", lit),
        }
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        self.lval.fmt_operand(f)?;
        write!(f, " = {}", self.rval)
    }
}

impl Display for FunctionCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Char(c) => {
                f.write_char('\'')?;
                write_escaped_char(f, c.node)?;
                f.write_char('\'')
            }
            Literal::Str(s) => {
                f.write_char('"')?;
                write_escaped_str(f, &s.node)?;
                f.write_char('"')
            }
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            UnaryOp::Pos => write!(f, "+"),
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::Ne => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Le => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Ge => write!(f, ">="),
            BinaryOp::LAnd => write!(f, "&&"),
            BinaryOp::LOr => write!(f, "||"),
        }
    }
}
