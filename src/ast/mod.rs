//! Abstract Syntax Tree.
#![allow(missing_docs)]

pub(crate) mod display;
pub mod escape;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;

/// Program
///
/// ```text
/// Program ::= {FunctionDef}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub decls: Vec<Loc<FunctionDef>>,
}

/// Function Definition
///
/// ```text
/// FunctionDef ::= Type IDENT "(" [Params] ")" Block
/// Params      ::= Param {"," Param}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub ret_ty: Loc<Type>,
    pub name: Loc<String>,
    pub params: Vec<Loc<Param>>,
    pub body: Loc<Block>,
}

/// Function Parameter
///
/// ```text
/// Param ::= Type IDENT
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: Loc<Type>,
    pub name: Loc<String>,
}

/// Basic Type
///
/// ```text
/// Type ::= "int" | "char" | "bool"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Char,
    Bool,
}

/// Block
///
/// ```text
/// Block ::= "{" {Stmt} "}"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub stmts: Vec<Loc<Stmt>>,
}

/// Statement
///
/// ```text
///   Stmt ::= MatchedStmt
///          | OpenStmt
///   MatchedStmt ::= VarDecl ";"
///          | Expr ";"
///          | "return" [Expr] ";"
///          | Block
///          | "if" "(" Expr ")" MatchedStmt "else" MatchedStmt
///          | "while" "(" Expr ")" MatchedStmt
///          | ForHead MatchedStmt
///   OpenStmt ::= "if" "(" Expr ")" Stmt
///          | "if" "(" Expr ")" MatchedStmt "else" OpenStmt
///          | "while" "(" Expr ")" OpenStmt
///          | ForHead OpenStmt
///   ForHead ::= "for" "(" [ForInit] ";" [Expr] ";" [Expr] ")"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    VarDecl(VarDecl),
    Expr(Expr),
    Block(Block),
    If(If),
    While(While),
    For(For),
    Return(Return),
}

/// Variable Declaration
///
/// ```text
/// VarDecl ::= Type IDENT ["=" Expr]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub ty: Loc<Type>,
    pub name: Loc<String>,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub cond: Expr,
    pub then: Box<Loc<Stmt>>,
    pub els: Option<Box<Loc<Stmt>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct While {
    pub cond: Expr,
    pub body: Box<Loc<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct For {
    pub init: Option<ForInit>,
    pub cond: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Box<Loc<Stmt>>,
}

/// Init clause of a `for` loop.
///
/// ```text
/// ForInit ::= VarDecl | Expr
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForInit {
    VarDecl(Loc<VarDecl>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Return {
    pub expr: Option<Expr>,
}

/// Expression
///
/// ```text
/// Expr       ::= LOrExpr "=" Expr | LOrExpr
/// LOrExpr    ::= LAndExpr | LOrExpr "||" LAndExpr
/// LAndExpr   ::= EqExpr | LAndExpr "&&" EqExpr
/// EqExpr     ::= RelExpr | EqExpr ("==" | "!=") RelExpr
/// RelExpr    ::= AddExpr | RelExpr ("<" | ">" | "<=" | ">=") AddExpr
/// AddExpr    ::= MulExpr | AddExpr ("+" | "-") MulExpr
/// MulExpr    ::= UnaryExpr | MulExpr ("*" | "/" | "%") UnaryExpr
/// UnaryExpr  ::= PrimaryExpr | UnaryOp UnaryExpr
/// PrimaryExpr ::= "(" Expr ")" | IDENT | CallExpr | Literal
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Assign(Loc<Assignment>),
    Call(Loc<FunctionCall>),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Ident(Loc<String>),
    Literal(Literal),
}

impl Located for Expr {
    fn line(&self) -> Option<u32> {
        match self {
            Expr::Assign(assign) => assign.line(),
            Expr::Call(call) => call.line(),
            Expr::Binary(binary) => binary.lhs.line().or(binary.op.line()),
            Expr::Unary(unary) => unary.op.line(),
            Expr::Ident(ident) => ident.line(),
            Expr::Literal(lit) => lit.line(),
        }
    }
}

/// Assignment
///
/// The grammar accepts any expression on the left, but only an identifier
/// is a valid target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub lval: Box<Expr>,
    pub rval: Box<Expr>,
}

/// Function Call Expression
///
/// ```text
/// CallExpr ::= IDENT "(" [Args] ")"
/// Args     ::= Expr {"," Expr}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: Loc<String>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    pub op: Loc<BinaryOp>,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpr {
    pub op: Loc<UnaryOp>,
    pub expr: Box<Expr>,
}

/// Literal
///
/// ```text
/// Literal ::= INT_CONST | CHAR_CONST | STRING_CONST | "true" | "false"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(Loc<i64>),
    Char(Loc<char>),
    Str(Loc<String>),
    Bool(Loc<bool>),
}

impl Located for Literal {
    fn line(&self) -> Option<u32> {
        match self {
            Literal::Number(n) => n.line(),
            Literal::Char(c) => c.line(),
            Literal::Str(s) => s.line(),
            Literal::Bool(b) => b.line(),
        }
    }
}

/// Unary Operator
///
/// ```text
/// UnaryOp ::= "+" | "-" | "!"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
}

/// Binary Operator
///
/// ```text
/// BinaryOp ::= "+" | "-" | "*" | "/" | "%" | "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LAnd,
    LOr,
}

impl NonLocated for Program {}
impl NonLocated for FunctionDef {}
impl NonLocated for Param {}
impl NonLocated for Type {}
impl NonLocated for Block {}
impl NonLocated for Stmt {}
impl NonLocated for VarDecl {}
impl NonLocated for Assignment {}
impl NonLocated for FunctionCall {}
impl NonLocated for UnaryOp {}
impl NonLocated for BinaryOp {}
impl NonLocated for i64 {}
impl NonLocated for char {}
impl NonLocated for bool {}
impl NonLocated for String {}

/// Syntax unit with line information.
pub trait Located {
    /// Source line of the syntax unit, starting from 1.
    fn line(&self) -> Option<u32>;
}

/// AST nodes that do not themselves contain line information
/// and thus should be enclosed within the [`Loc<T>`] struct.
pub trait NonLocated {
    /// Attach a source line to the syntax unit.
    fn at_line(self, line: Option<u32>) -> Loc<Self>
    where
        Self: Sized,
    {
        Loc { line, node: self }
    }

    /// Wrap a syntax unit that has no source position, e.g. one created
    /// by an obfuscation pass.
    fn unlocated(self) -> Loc<Self>
    where
        Self: Sized,
    {
        self.at_line(None)
    }
}

/// Attach a source line to a syntax unit.
///
/// The line is diagnostic only: two `Loc`s compare equal whenever their
/// nodes do, so whole trees can be compared regardless of where they came
/// from.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Loc<T> {
    /// Source line, starting from 1.
    pub line: Option<u32>,
    /// Inner syntax unit.
    pub node: T,
}

impl<T> Loc<T> {
    /// Create a located syntax unit.
    pub fn new(line: Option<u32>, node: T) -> Self {
        Self { line, node }
    }

    /// Transform the inner syntax unit, keeping the line.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loc<U> {
        Loc {
            line: self.line,
            node: f(self.node),
        }
    }
}

impl<T: PartialEq> PartialEq for Loc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T> Located for Loc<T> {
    fn line(&self) -> Option<u32> {
        self.line
    }
}

impl<T> std::fmt::Display for Loc<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.node)
    }
}

/// Maps byte offsets of a source text to line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Index the line starts of `source`.
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// Line containing the byte at `offset`, starting from 1.
    pub fn line(&self, offset: usize) -> Option<u32> {
        let line = self.starts.partition_point(|&start| start <= offset);
        u32::try_from(line).ok()
    }
}
