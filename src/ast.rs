//! Abstract syntax tree.
//!
//! One `enum` per node category instead of a tag-dispatched base record
//! (`spec.md` §9, "AST polymorphism"): `Decl`, `Stmt`, `Expr`. No node
//! carries a parent back-reference — per §9's "Parent links" note, the
//! link isn't load-bearing for any pass here, so it's simply not
//! represented; a pass that needs ancestry threads it through its own
//! recursion instead.

/// The root of a compiled translation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Function(FunctionDecl),
    Variable(VariableDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub return_type: String,
    pub name: String,
    /// (type, name) pairs in declaration order.
    pub params: Vec<(String, String)>,
    /// `None` for a forward declaration (`int f(int x);`).
    pub body: Option<CompoundStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub type_name: String,
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStmt {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Compound(CompoundStmt),
    /// An expression statement; `None` represents a bare `;`.
    Expression(Option<Expr>),
    /// A local variable declaration appearing in statement position.
    VarDecl(VariableDecl),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
}

/// The initializer clause of a `for` header: either a declaration or an
/// expression statement, scoped to the loop per `spec.md` §4.3.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Decl(VariableDecl),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Identifier(String),
    /// Decimal text, kept as a string so the parser never has to reject
    /// an overlong literal; codegen parses it when emitting.
    NumberLiteral(String),
    /// Includes the surrounding quotes, per `spec.md` §3.
    StringLiteral(String),
    /// Invariant I1: `target` is always `Expr::Identifier` by
    /// construction (see `parser::Parser::parse_assignment`).
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Expr {
    /// The identifier name if this expression is a valid assignment
    /// target, per invariant I1.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier(name) => Some(name),
            _ => None,
        }
    }
}
