//! Pretty-printer that renders a syntax tree back into canonical source.
//!
//! Produces tab-indented output with a blank line between top-level
//! declarations. Expressions get the minimal parentheses their operator
//! precedences require; explicit [`Expr::Paren`] nodes are kept.

use std::rc::Rc;

use crate::ast::{BlockStmt, Decl, Expr, Field, File, Stmt};
use crate::token::{Operator, Token};

/// Format a parsed file.
#[must_use]
pub fn format(file: &File) -> String {
    let mut out = String::new();
    out.push_str("module ");
    out.push_str(&file.space_name.value);
    out.push('\n');
    let mut rest = file.decls.as_slice();
    while !rest.is_empty() {
        out.push('\n');
        let n = write_decls(&mut out, rest, 0);
        out.push('\n');
        rest = &rest[n..];
    }
    out
}

/// Format a single expression.
#[must_use]
pub fn format_expr(x: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, x);
    out
}

/// Format a single statement; nested blocks are indented with tabs.
#[must_use]
pub fn format_stmt(s: &Stmt) -> String {
    let mut out = String::new();
    write_stmt(&mut out, s, 0);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

// ----------------------------------------------------------------------------
// Declarations

/// Writes the first declaration of `decls`, together with the rest of its
/// group if it has one. Returns the number of declarations written.
fn write_decls(out: &mut String, decls: &[Decl], depth: usize) -> usize {
    let Some(first) = decls.first() else {
        return 0;
    };
    let Some(group) = first.group() else {
        out.push_str(keyword(first));
        out.push(' ');
        write_spec(out, first, depth);
        return 1;
    };

    let n = decls
        .iter()
        .take_while(|d| d.group().is_some_and(|g| Rc::ptr_eq(g, group)))
        .count();
    out.push_str(group.tok.as_str());
    out.push_str(" (\n");
    for d in &decls[..n] {
        indent(out, depth + 1);
        write_spec(out, d, depth + 1);
        out.push('\n');
    }
    indent(out, depth);
    out.push(')');
    n
}

const fn keyword(d: &Decl) -> &'static str {
    match d {
        Decl::Import { .. } => "import",
        Decl::Type { .. } => "type",
        Decl::Var { .. } => "var",
        Decl::Func { .. } => "func",
        Decl::Oper { .. } => "oper",
    }
}

/// A declaration without its keyword.
fn write_spec(out: &mut String, d: &Decl, depth: usize) {
    match d {
        Decl::Import { path, .. } => {
            out.push_str(path.as_ref().map_or("\"\"", |p| p.value.as_str()));
        }
        Decl::Type {
            name, alias, ty, ..
        } => {
            out.push_str(&name.value);
            out.push_str(if *alias { " = " } else { " " });
            write_expr(out, ty);
        }
        Decl::Var {
            name, ty, value, ..
        } => {
            out.push_str(&name.value);
            if let Some(ty) = ty {
                out.push(' ');
                write_expr(out, ty);
            }
            if let Some(value) = value {
                out.push_str(" = ");
                write_expr(out, value);
            }
        }
        Decl::Func {
            name,
            params,
            result,
            body,
            ..
        } => {
            out.push_str(&name.value);
            out.push('(');
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_field(out, p);
            }
            out.push(')');
            if let Some(result) = result {
                out.push(' ');
                write_expr(out, result);
            }
            if let Some(body) = body {
                out.push(' ');
                write_block(out, body, depth);
            }
        }
        Decl::Oper {
            lhs,
            op,
            rhs,
            result,
            body,
            ..
        } => {
            out.push('(');
            write_field(out, lhs);
            out.push_str(") ");
            out.push_str(op.as_str());
            out.push_str(" (");
            write_field(out, rhs);
            out.push_str(") ");
            write_expr(out, result);
            if let Some(body) = body {
                out.push(' ');
                write_block(out, body, depth);
            }
        }
    }
}

fn write_field(out: &mut String, f: &Field) {
    out.push_str(&f.name.value);
    out.push(' ');
    write_expr(out, &f.ty);
}

// ----------------------------------------------------------------------------
// Statements

fn write_block(out: &mut String, b: &BlockStmt, depth: usize) {
    out.push_str("{\n");
    for s in &b.stmts {
        indent(out, depth + 1);
        write_stmt(out, s, depth + 1);
        out.push('\n');
    }
    indent(out, depth);
    out.push('}');
}

/// Writes `s` starting at the current column; continuation lines are
/// indented to `depth`.
fn write_stmt(out: &mut String, s: &Stmt, depth: usize) {
    match s {
        Stmt::Block(b) => write_block(out, b, depth),
        Stmt::If {
            init,
            cond,
            then,
            els,
            ..
        } => {
            out.push_str("if ");
            if let Some(init) = init {
                write_stmt(out, init, depth);
                out.push_str("; ");
            }
            write_expr(out, cond);
            out.push(' ');
            write_block(out, then, depth);
            if let Some(els) = els {
                out.push_str(" else ");
                write_stmt(out, els, depth);
            }
        }
        Stmt::While { cond, body, .. } => {
            out.push_str("while ");
            write_expr(out, cond);
            out.push(' ');
            write_block(out, body, depth);
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
            ..
        } => {
            out.push_str("for ");
            match (init, cond, post) {
                (None, None, None) => {}
                (None, Some(cond), None) => {
                    write_expr(out, cond);
                    out.push(' ');
                }
                _ => {
                    if let Some(init) = init {
                        write_stmt(out, init, depth);
                    }
                    out.push(';');
                    if let Some(cond) = cond {
                        out.push(' ');
                        write_expr(out, cond);
                    }
                    out.push(';');
                    if let Some(post) = post {
                        out.push(' ');
                        write_stmt(out, post, depth);
                    }
                    out.push(' ');
                }
            }
            write_block(out, body, depth);
        }
        Stmt::Return { result, .. } => {
            out.push_str("return");
            if let Some(x) = result {
                out.push(' ');
                write_expr(out, x);
            }
        }
        Stmt::Break { .. } => out.push_str("break"),
        Stmt::Empty { .. } => out.push(';'),
        Stmt::Expr { x, .. } => write_expr(out, x),
        Stmt::Assign { op, lhs, rhs, .. } => {
            write_expr(out, lhs);
            match op {
                Some(op) => {
                    out.push(' ');
                    out.push_str(op.as_str());
                    out.push_str("= ");
                }
                None => out.push_str(" = "),
            }
            write_expr(out, rhs);
        }
        Stmt::IncDec { op, x, .. } => {
            write_expr(out, x);
            out.push_str(op.as_str());
            out.push_str(op.as_str());
        }
        Stmt::Define { lhs, rhs, .. } => {
            write_expr(out, lhs);
            out.push_str(" := ");
            write_expr(out, rhs);
        }
        Stmt::Decl { decls, .. } => {
            if decls.is_empty() {
                out.push_str(Token::Var.as_str());
                out.push_str(" ()");
            }
            let mut rest = decls.as_slice();
            while !rest.is_empty() {
                let n = write_decls(out, rest, depth);
                rest = &rest[n..];
                if !rest.is_empty() {
                    out.push_str("; ");
                }
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Expressions

/// Precedence of `x` if it is a binary operation.
const fn binary_prec(x: &Expr) -> Option<u8> {
    match x {
        Expr::Operation {
            op, y: Some(_), ..
        } => Some(op.precedence()),
        _ => None,
    }
}

fn write_paren(out: &mut String, x: &Expr, paren: bool) {
    if paren {
        out.push('(');
        write_expr(out, x);
        out.push(')');
    } else {
        write_expr(out, x);
    }
}

/// Operand of a selector, index or call.
fn write_primary(out: &mut String, x: &Expr) {
    write_paren(out, x, matches!(x, Expr::Operation { .. }));
}

fn write_list(out: &mut String, xs: &[Expr]) {
    for (i, x) in xs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, x);
    }
}

fn write_expr(out: &mut String, x: &Expr) {
    match x {
        Expr::Name(n) => out.push_str(&n.value),
        Expr::BasicLit(l) => out.push_str(&l.value),
        Expr::Operation { op, x, y: None, .. } => {
            out.push_str(op.as_str());
            let operand = format_expr(x);
            // keep "- -x" from scanning as "--"
            if matches!(op, Operator::Add | Operator::Sub) && operand.starts_with(['+', '-']) {
                out.push(' ');
            }
            if binary_prec(x).is_some() {
                out.push('(');
                out.push_str(&operand);
                out.push(')');
            } else {
                out.push_str(&operand);
            }
        }
        Expr::Operation {
            op, x, y: Some(y), ..
        } => {
            let prec = op.precedence();
            write_paren(out, x, binary_prec(x).is_some_and(|p| p < prec));
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_paren(out, y, binary_prec(y).is_some_and(|p| p <= prec));
        }
        Expr::Selector { x, sel, .. } => {
            write_primary(out, x);
            out.push('.');
            out.push_str(&sel.value);
        }
        Expr::Index { x, index, .. } => {
            write_primary(out, x);
            out.push('[');
            write_expr(out, index);
            out.push(']');
        }
        Expr::Call { fun, args, .. } => {
            write_primary(out, fun);
            out.push('(');
            write_list(out, args);
            out.push(')');
        }
        Expr::SliceType { elem, .. } => {
            out.push_str("[]");
            write_expr(out, elem);
        }
        Expr::SliceLit { elem, elems, .. } => {
            out.push_str("[]");
            write_expr(out, elem);
            out.push('{');
            write_list(out, elems);
            out.push('}');
        }
        Expr::Paren { x, .. } => {
            out.push('(');
            write_expr(out, x);
            out.push(')');
        }
        Expr::Bad { .. } => out.push_str("BadExpr"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Name;
    use crate::position::{Pos, PosBase};

    fn pos() -> Pos {
        Pos::new(PosBase::file("t.jd"), 1, 1)
    }

    fn name(s: &str) -> Expr {
        Expr::Name(Name::new(pos(), s))
    }

    fn binary(op: Operator, x: Expr, y: Expr) -> Expr {
        Expr::Operation {
            pos: pos(),
            op,
            x: Box::new(x),
            y: Some(Box::new(y)),
        }
    }

    fn unary(op: Operator, x: Expr) -> Expr {
        Expr::Operation {
            pos: pos(),
            op,
            x: Box::new(x),
            y: None,
        }
    }

    #[test]
    fn minimal_parentheses() {
        let sum = binary(Operator::Add, name("a"), name("b"));
        let x = binary(Operator::Mul, sum.clone(), name("c"));
        assert_eq!(format_expr(&x), "(a + b) * c");

        let x = binary(Operator::Add, name("c"), binary(Operator::Mul, name("a"), name("b")));
        assert_eq!(format_expr(&x), "c + a * b");

        let x = binary(Operator::Sub, name("a"), binary(Operator::Sub, name("b"), name("c")));
        assert_eq!(format_expr(&x), "a - (b - c)");

        let x = binary(Operator::Sub, binary(Operator::Sub, name("a"), name("b")), name("c"));
        assert_eq!(format_expr(&x), "a - b - c");
    }

    #[test]
    fn unary_spacing() {
        let x = unary(Operator::Sub, unary(Operator::Sub, name("x")));
        assert_eq!(format_expr(&x), "- -x");
        let x = unary(Operator::Not, unary(Operator::Sub, name("x")));
        assert_eq!(format_expr(&x), "!-x");
        let x = unary(Operator::Mul, binary(Operator::Add, name("p"), name("q")));
        assert_eq!(format_expr(&x), "*(p + q)");
    }

    #[test]
    fn postfix_on_operation_is_parenthesized() {
        let x = Expr::Selector {
            pos: pos(),
            x: Box::new(unary(Operator::Sub, name("v"))),
            sel: Name::new(pos(), "len"),
        };
        assert_eq!(format_expr(&x), "(-v).len");
    }

    #[test]
    fn increments() {
        let s = Stmt::IncDec {
            pos: pos(),
            op: Operator::Sub,
            x: name("i"),
        };
        assert_eq!(format_stmt(&s), "i--");
    }
}
