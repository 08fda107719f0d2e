//! Syntax tree produced by the parser.
//!
//! Every node carries the [`Pos`] of its first token (for operations, the
//! operator). Declarations, statements and expressions are closed enums.

use std::rc::Rc;

use crate::position::Pos;
use crate::token::{LitKind, Operator, OverloadOp, Token};

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub pos: Pos,
    /// Name following the `module` keyword.
    pub space_name: Name,
    pub decls: Vec<Decl>,
}

/// Parenthesized cluster of declarations sharing one keyword:
/// `var ( a = 1; b int )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub pos: Pos,
    pub tok: Token,
}

/// Identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub pos: Pos,
    pub value: String,
}

impl Name {
    #[must_use]
    pub fn new(pos: Pos, value: impl Into<String>) -> Self {
        Self {
            pos,
            value: value.into(),
        }
    }
}

/// Literal as written in the source, quotes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicLit {
    pub pos: Pos,
    pub value: String,
    pub kind: LitKind,
    /// The scanner reported an error for this literal.
    pub bad: bool,
}

/// `name type` in parameter lists and `oper` operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub pos: Pos,
    pub name: Name,
    pub ty: Expr,
}

// ----------------------------------------------------------------------------
// Declarations

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// `import "path"`; `path` is absent when it could not be parsed.
    Import {
        pos: Pos,
        group: Option<Rc<Group>>,
        path: Option<BasicLit>,
    },
    /// `type Name [=] Type`
    Type {
        pos: Pos,
        group: Option<Rc<Group>>,
        name: Name,
        alias: bool,
        ty: Expr,
    },
    /// `var name = value`, `var name Type` or `var name Type = value`
    Var {
        pos: Pos,
        group: Option<Rc<Group>>,
        name: Name,
        ty: Option<Expr>,
        value: Option<Expr>,
    },
    /// `func name(params) [Result] [Body]`
    Func {
        pos: Pos,
        group: Option<Rc<Group>>,
        name: Name,
        params: Vec<Field>,
        result: Option<Expr>,
        body: Option<BlockStmt>,
    },
    /// `oper (l T) add (r T) Result Body`
    Oper {
        pos: Pos,
        group: Option<Rc<Group>>,
        lhs: Field,
        op: OverloadOp,
        rhs: Field,
        result: Expr,
        /// Absent only after a reported error.
        body: Option<BlockStmt>,
    },
}

impl Decl {
    #[must_use]
    pub const fn pos(&self) -> &Pos {
        match self {
            Self::Import { pos, .. }
            | Self::Type { pos, .. }
            | Self::Var { pos, .. }
            | Self::Func { pos, .. }
            | Self::Oper { pos, .. } => pos,
        }
    }

    #[must_use]
    pub const fn group(&self) -> Option<&Rc<Group>> {
        match self {
            Self::Import { group, .. }
            | Self::Type { group, .. }
            | Self::Var { group, .. }
            | Self::Func { group, .. }
            | Self::Oper { group, .. } => group.as_ref(),
        }
    }
}

// ----------------------------------------------------------------------------
// Statements

/// `{ stmts }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStmt {
    pub pos: Pos,
    pub stmts: Vec<Stmt>,
    /// Position of the closing brace.
    pub rbrace: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Block(BlockStmt),
    If {
        pos: Pos,
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: BlockStmt,
        /// Either another [`Stmt::If`] or a [`Stmt::Block`].
        els: Option<Box<Stmt>>,
    },
    While {
        pos: Pos,
        cond: Expr,
        body: BlockStmt,
    },
    For {
        pos: Pos,
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: BlockStmt,
    },
    Return {
        pos: Pos,
        result: Option<Expr>,
    },
    Break {
        pos: Pos,
    },
    Empty {
        pos: Pos,
    },
    Expr {
        pos: Pos,
        x: Expr,
    },
    /// `lhs = rhs`, or `lhs op= rhs` when `op` is set.
    Assign {
        pos: Pos,
        op: Option<Operator>,
        lhs: Expr,
        rhs: Expr,
    },
    /// `x++` (op `Add`) or `x--` (op `Sub`).
    IncDec {
        pos: Pos,
        op: Operator,
        x: Expr,
    },
    /// `lhs := rhs`
    Define {
        pos: Pos,
        lhs: Expr,
        rhs: Expr,
    },
    Decl {
        pos: Pos,
        decls: Vec<Decl>,
    },
}

impl Stmt {
    #[must_use]
    pub const fn pos(&self) -> &Pos {
        match self {
            Self::Block(b) => &b.pos,
            Self::If { pos, .. }
            | Self::While { pos, .. }
            | Self::For { pos, .. }
            | Self::Return { pos, .. }
            | Self::Break { pos }
            | Self::Empty { pos }
            | Self::Expr { pos, .. }
            | Self::Assign { pos, .. }
            | Self::IncDec { pos, .. }
            | Self::Define { pos, .. }
            | Self::Decl { pos, .. } => pos,
        }
    }
}

// ----------------------------------------------------------------------------
// Expressions

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Name(Name),
    BasicLit(BasicLit),
    /// Unary when `y` is absent.
    Operation {
        pos: Pos,
        op: Operator,
        x: Box<Expr>,
        y: Option<Box<Expr>>,
    },
    /// `x.sel`
    Selector {
        pos: Pos,
        x: Box<Expr>,
        sel: Name,
    },
    /// `x[index]`
    Index {
        pos: Pos,
        x: Box<Expr>,
        index: Box<Expr>,
    },
    /// `fun(args)`
    Call {
        pos: Pos,
        fun: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `[]elem`
    SliceType {
        pos: Pos,
        elem: Box<Expr>,
    },
    /// `[]elem{elems}`
    SliceLit {
        pos: Pos,
        elem: Box<Expr>,
        elems: Vec<Expr>,
    },
    /// `(x)`
    Paren {
        pos: Pos,
        x: Box<Expr>,
    },
    /// Placeholder for an expression that could not be parsed.
    Bad {
        pos: Pos,
    },
}

impl Expr {
    #[must_use]
    pub const fn pos(&self) -> &Pos {
        match self {
            Self::Name(n) => &n.pos,
            Self::BasicLit(l) => &l.pos,
            Self::Operation { pos, .. }
            | Self::Selector { pos, .. }
            | Self::Index { pos, .. }
            | Self::Call { pos, .. }
            | Self::SliceType { pos, .. }
            | Self::SliceLit { pos, .. }
            | Self::Paren { pos, .. }
            | Self::Bad { pos } => pos,
        }
    }

    /// Strips any number of enclosing parentheses.
    #[must_use]
    pub fn unparen(&self) -> &Self {
        let mut x = self;
        while let Self::Paren { x: inner, .. } = x {
            x = inner;
        }
        x
    }

    #[must_use]
    pub const fn is_bad(&self) -> bool {
        matches!(self, Self::Bad { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PosBase;

    fn pos(line: u32, col: u32) -> Pos {
        Pos::new(PosBase::file("t.jd"), line, col)
    }

    #[test]
    fn unparen_strips_nesting() {
        let name = Expr::Name(Name::new(pos(1, 3), "x"));
        let wrapped = Expr::Paren {
            pos: pos(1, 1),
            x: Box::new(Expr::Paren {
                pos: pos(1, 2),
                x: Box::new(name.clone()),
            }),
        };
        assert_eq!(wrapped.unparen(), &name);
        assert_eq!(wrapped.pos().col(), 1);
    }

    #[test]
    fn decl_group_backreference() {
        let group = Rc::new(Group {
            pos: pos(2, 1),
            tok: Token::Var,
        });
        let d = Decl::Var {
            pos: pos(2, 6),
            group: Some(Rc::clone(&group)),
            name: Name::new(pos(2, 6), "a"),
            ty: None,
            value: None,
        };
        assert!(Rc::ptr_eq(d.group().expect("group"), &group));
        assert_eq!(d.pos().line(), 2);
    }
}
