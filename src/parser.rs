//! Recursive-descent parser with error recovery.
//!
//! The parser pulls one token at a time from the [`Scanner`] and builds the
//! [`ast`](crate::ast) tree. Every diagnostic goes through a single
//! [`ErrorHandler`]. With a handler the parser keeps going after errors,
//! skipping ahead to a token of a follow set; without one the first
//! diagnostic ends the run.

use std::io::Read;
use std::rc::Rc;

use crate::Error;
use crate::ast::{BasicLit, BlockStmt, Decl, Expr, Field, File, Group, Name, Stmt};
use crate::position::{COL_BASE, POS_MAX, Pos, PosBase};
use crate::printer;
use crate::scanner::{Report, Scanner};
use crate::token::{LitKind, Operator, OverloadOp, Token};

/// One diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{pos}: {msg}")]
pub struct SyntaxError {
    pub pos: Pos,
    pub msg: String,
}

/// Receives every diagnostic of a run, in source order.
pub type ErrorHandler<'h> = Box<dyn FnMut(&SyntaxError) + 'h>;

/// Tokens that may start a top-level declaration.
const DECL_FOLLOW: &[Token] = &[
    Token::Import,
    Token::Type,
    Token::Var,
    Token::Func,
    Token::Oper,
];

/// Recovery points after a statement at top level.
const STRAY_FOLLOW: &[Token] = &[
    Token::Import,
    Token::Type,
    Token::Var,
    Token::Func,
    Token::Oper,
    Token::Semi,
];

/// Extra synchronization points inside function bodies.
const STOP_SET: &[Token] = &[Token::If, Token::Var];

/// Parse a complete input.
///
/// Without a handler the first diagnostic aborts the run and is returned as
/// [`Error::Aborted`].
pub fn parse<R: Read>(
    base: Rc<PosBase>,
    src: R,
    errh: Option<ErrorHandler<'_>>,
) -> Result<File, Error> {
    Parser::new(base, src, errh, false).parse_file()
}

/// Parse a string, failing on the first diagnostic.
pub fn parse_str(filename: &str, src: &str) -> Result<File, Error> {
    parse(PosBase::file(filename), src.as_bytes(), None)
}

/// Parse a string and collect every diagnostic.
///
/// The result is only an error if the module header is missing.
pub fn parse_collect(filename: &str, src: &str) -> (Result<File, Error>, Vec<SyntaxError>) {
    let mut errors = Vec::new();
    let result = parse(
        PosBase::file(filename),
        src.as_bytes(),
        Some(Box::new(|err: &SyntaxError| errors.push(err.clone()))),
    );
    (result, errors)
}

pub struct Parser<'h, R> {
    scanner: Scanner<R>,
    /// Base of the physical file.
    file: Rc<PosBase>,
    /// Base in effect, replaced by line directives.
    base: Rc<PosBase>,
    errh: Option<ErrorHandler<'h>>,
    first: Option<SyntaxError>,
    errcnt: usize,
    /// Function nesting level, for error recovery.
    fnest: u32,

    verbose: bool,
    indent: String,
    trace_line: Option<u32>,
}

impl<'h, R: Read> Parser<'h, R> {
    /// Set up a parser over `src` and read its first token.
    ///
    /// `verbose` emits a trace of grammar rule entry and exit as `tracing`
    /// events at trace level.
    pub fn new(base: Rc<PosBase>, src: R, errh: Option<ErrorHandler<'h>>, verbose: bool) -> Self {
        let mut p = Self {
            scanner: Scanner::new(src),
            file: Rc::clone(&base),
            base,
            errh,
            first: None,
            errcnt: 0,
            fnest: 0,
            verbose,
            indent: String::new(),
            trace_line: None,
        };
        p.next();
        p
    }

    /// Parse the whole input.
    pub fn parse_file(&mut self) -> Result<File, Error> {
        if let Some(first) = self.abort_error() {
            return Err(Error::Aborted(first));
        }
        let file = self.traced("file", Self::file)?;
        match self.abort_error() {
            Some(first) => Err(Error::Aborted(first)),
            None => Ok(file),
        }
    }

    /// Number of diagnostics reported so far.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errcnt
    }

    #[must_use]
    pub const fn first_error(&self) -> Option<&SyntaxError> {
        self.first.as_ref()
    }

    /// A run without a handler ends at its first diagnostic.
    const fn aborted(&self) -> bool {
        self.errh.is_none() && self.first.is_some()
    }

    fn abort_error(&self) -> Option<SyntaxError> {
        if self.errh.is_none() {
            self.first.clone()
        } else {
            None
        }
    }

    // ------------------------------------------------------------------------
    // Token stream

    fn tok(&self) -> Token {
        if self.aborted() {
            Token::Eof
        } else {
            self.scanner.token()
        }
    }

    fn next(&mut self) {
        if self.aborted() {
            return;
        }
        self.scanner.next();
        for report in self.scanner.take_reports() {
            if self.aborted() {
                break;
            }
            match report {
                Report::Error(err) => {
                    let pos = self.pos_at(err.line, err.col);
                    self.error_at(pos, err.kind.to_string());
                }
                Report::Directive { line, col, text } => self.directive(line, col, &text),
            }
        }
    }

    fn got(&mut self, tok: Token) -> bool {
        if self.tok() == tok {
            self.next();
            return true;
        }
        false
    }

    fn want(&mut self, tok: Token) {
        if !self.got(tok) {
            self.syntax_error(&format!("expecting {}", tokstring(tok)));
        }
    }

    /// Accepts `=`, and `:=` with a complaint.
    fn got_assign(&mut self) -> bool {
        match self.tok() {
            Token::Define => {
                self.syntax_error("expecting =");
                self.next();
                true
            }
            Token::Assign => {
                self.next();
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Diagnostics

    fn pos(&self) -> Pos {
        self.pos_at(self.scanner.line(), self.scanner.col())
    }

    fn pos_at(&self, line: u32, col: u32) -> Pos {
        Pos::new(Rc::clone(&self.base), line, col)
    }

    fn error_at(&mut self, pos: Pos, msg: impl Into<String>) {
        let err = SyntaxError {
            pos,
            msg: msg.into(),
        };
        self.errcnt += 1;
        if let Some(handler) = self.errh.as_mut() {
            handler(&err);
        }
        if self.first.is_none() {
            self.first = Some(err);
        }
    }

    fn syntax_error(&mut self, msg: &str) {
        self.syntax_error_at(self.pos(), msg);
    }

    fn syntax_error_at(&mut self, pos: Pos, msg: &str) {
        if self.verbose {
            self.print(&format!("syntax error: {msg}"));
        }

        if self.tok() == Token::Eof && self.first.is_some() {
            return; // avoid meaningless follow-up errors
        }

        let clause = if msg.is_empty() {
            String::new()
        } else if msg.starts_with("in ") || msg.starts_with("at ") || msg.starts_with("after ")
        {
            format!(" {msg}")
        } else if msg.starts_with("expecting ") {
            format!(", {msg}")
        } else {
            // plain error, the current token is irrelevant
            self.error_at(pos, format!("syntax error: {msg}"));
            return;
        };

        let tok = self.describe();
        self.error_at(pos, format!("syntax error: unexpected {tok}{clause}"));
    }

    /// The current token as it appears in diagnostics.
    fn describe(&self) -> String {
        let op = self.scanner.op().map_or("", Operator::as_str);
        match self.tok() {
            Token::Name | Token::Semi => self.scanner.literal().to_string(),
            Token::Literal => format!("gotLiteral {}", self.scanner.literal()),
            Token::Op => op.to_string(),
            Token::AssignOp => format!("{op}="),
            Token::IncOp => format!("{op}{op}"),
            tok => tokstring(tok).to_string(),
        }
    }

    /// Skips tokens until one in `follow` (or end of input) is current.
    /// Inside function bodies the statement keywords of [`STOP_SET`] also
    /// stop. With an empty `follow`, exactly one token is skipped.
    fn advance(&mut self, follow: &[Token]) {
        if self.verbose {
            self.print(&format!("advance {follow:?}"));
        }
        loop {
            let tok = self.tok();
            if tok == Token::Eof
                || follow.contains(&tok)
                || (!follow.is_empty() && self.fnest > 0 && STOP_SET.contains(&tok))
            {
                break;
            }
            self.next();
            if follow.is_empty() {
                break;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Line directives

    fn directive(&mut self, line: u32, col: u32, text: &str) {
        let block = text.starts_with("/*");
        let body = comment_text(text);
        // //line must start the line, /*line may appear anywhere
        if !(col == COL_BASE || block) || !body.starts_with("line ") {
            return;
        }
        let pos = if block {
            if text.contains('\n') {
                return;
            }
            Pos::new(Rc::clone(&self.file), line, col + text.len() as u32)
        } else {
            Pos::new(Rc::clone(&self.file), line + 1, COL_BASE)
        };
        // +2 for the comment marker, +5 for "line "
        self.update_base(pos, line, col + 2 + 5, &body[5..]);
    }

    /// Installs the base described by `text` (`filename:line[:col]`) at
    /// `pos`. `tline` and `tcol` locate `text` for diagnostics.
    fn update_base(&mut self, pos: Pos, tline: u32, tcol: u32, text: &str) {
        let Some((i, n)) = trailing_digits(text) else {
            return; // not a line directive
        };
        let Some(n) = n else {
            let at = self.pos_at(tline, tcol + i as u32);
            self.error_at(at, format!("invalid line number: {}", &text[i..]));
            return;
        };

        let mut text = text;
        let mut i = i;
        let (line, col, has_col) = match trailing_digits(&text[..i - 1]) {
            Some((i2, Some(n2))) => {
                // filename:line:col
                if n == 0 || n > u64::from(POS_MAX) {
                    let at = self.pos_at(tline, tcol + i as u32);
                    self.error_at(at, format!("invalid column number: {}", &text[i..]));
                    return;
                }
                text = &text[..i - 1];
                i = i2;
                (n2, n, true)
            }
            _ => (n, 0, false),
        };

        if line == 0 || line > u64::from(POS_MAX) {
            let at = self.pos_at(tline, tcol + i as u32);
            self.error_at(at, format!("invalid line number: {}", &text[i..]));
            return;
        }

        // with a column, an empty filename keeps the current one
        let mut filename = text[..i - 1].to_string();
        if filename.is_empty() && has_col {
            filename = self.base.filename().to_string();
        }

        self.base = PosBase::line_base(&pos, filename, line as u32, col as u32);
    }

    // ------------------------------------------------------------------------
    // Tracing

    fn print(&mut self, msg: &str) {
        if !self.verbose {
            return;
        }
        let line = self.scanner.line();
        if self.trace_line == Some(line) {
            tracing::trace!("         {}{msg}", self.indent);
        } else {
            tracing::trace!("line {line:<4}{}{msg}", self.indent);
        }
        self.trace_line = Some(line);
    }

    fn traced<T>(&mut self, rule: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        if !self.verbose {
            return f(self);
        }
        self.print(&format!("{rule} ("));
        self.indent.push_str(". ");
        let x = f(self);
        self.indent.truncate(self.indent.len() - 2);
        self.print(")");
        x
    }

    // ------------------------------------------------------------------------
    // Declarations

    // SourceFile = "module" identifier ";" { TopLevelDecl ";" } .
    fn file(&mut self) -> Result<File, Error> {
        let pos = self.pos();
        if !self.got(Token::Module) {
            return Err(Error::MissingHeader {
                pos,
                found: self.describe(),
            });
        }
        let space_name = self.name();
        self.print(&format!("module: {}", space_name.value));
        self.want(Token::Semi);

        let mut decls = Vec::new();
        // imports are accepted anywhere but must come first
        let mut prev = Token::Import;
        while self.tok() != Token::Eof {
            let tok = self.tok();
            if tok == Token::Semi {
                self.next();
                continue;
            }
            if tok == Token::Import && prev != Token::Import {
                self.syntax_error("imports must appear before other declarations");
            }
            prev = tok;

            let before = self.errcnt;
            let kw_pos = self.pos();
            match tok {
                Token::Import => {
                    self.next();
                    self.append_group(&mut decls, tok, kw_pos, Self::import_decl);
                }
                Token::Type => {
                    self.next();
                    self.append_group(&mut decls, tok, kw_pos, Self::type_decl);
                }
                Token::Var => {
                    self.next();
                    self.append_group(&mut decls, tok, kw_pos, Self::var_decl);
                }
                Token::Func => {
                    self.next();
                    decls.extend(self.func_decl(kw_pos, None));
                }
                Token::Oper => {
                    self.next();
                    decls.extend(self.oper_decl(kw_pos, None));
                }
                _ => {
                    self.syntax_error("non-declaration statement outside function body");
                    self.advance(STRAY_FOLLOW);
                    continue;
                }
            }

            if self.tok() != Token::Eof && !self.got(Token::Semi) {
                if self.errcnt == before {
                    self.syntax_error("after top level declaration");
                }
                self.advance(DECL_FOLLOW);
            }
        }

        Ok(File {
            pos,
            space_name,
            decls,
        })
    }

    /// Parses one declaration of kind `kw`, or a parenthesized group of
    /// them sharing one [`Group`].
    fn append_group<F>(&mut self, list: &mut Vec<Decl>, kw: Token, kw_pos: Pos, mut f: F)
    where
        F: FnMut(&mut Self, Pos, Option<Rc<Group>>) -> Option<Decl>,
    {
        if self.tok() != Token::Lparen {
            list.extend(f(self, kw_pos, None));
            return;
        }
        let group = Rc::new(Group {
            pos: self.pos(),
            tok: kw,
        });
        self.next();
        self.list("grouped declaration", Token::Semi, Token::Rparen, |p| {
            let pos = p.pos();
            list.extend(f(p, pos, Some(Rc::clone(&group))));
            false
        });
    }

    // ImportSpec = string_lit .
    fn import_decl(&mut self, pos: Pos, group: Option<Rc<Group>>) -> Option<Decl> {
        self.traced("importDecl", |p| {
            let path = if p.tok() == Token::Literal {
                let mut lit = p.literal();
                if !lit.bad && lit.kind != LitKind::String {
                    p.syntax_error_at(lit.pos.clone(), "import path must be a string");
                    lit.bad = true;
                }
                Some(lit)
            } else {
                p.syntax_error("missing import path");
                p.advance(&[Token::Semi, Token::Rparen]);
                None
            };
            Some(Decl::Import { pos, group, path })
        })
    }

    // TypeSpec = identifier [ "=" ] Type .
    fn type_decl(&mut self, pos: Pos, group: Option<Rc<Group>>) -> Option<Decl> {
        self.traced("typeDecl", |p| {
            let name = p.name();
            let alias = p.got_assign();
            let ty = p.type_or_none().unwrap_or_else(|| {
                let bad = p.bad_expr();
                p.syntax_error("in type declaration");
                p.advance(&[Token::Semi, Token::Rparen]);
                bad
            });
            p.print(&format!("id: {}", name.value));
            Some(Decl::Type {
                pos,
                group,
                name,
                alias,
                ty,
            })
        })
    }

    // VarSpec = identifier ( Type [ "=" Expr ] | "=" Expr ) .
    fn var_decl(&mut self, pos: Pos, group: Option<Rc<Group>>) -> Option<Decl> {
        self.traced("varDecl", |p| {
            let name = p.name();
            p.print(&format!("id: {}", name.value));
            let (ty, value) = if p.got_assign() {
                (None, Some(p.expr()))
            } else if let Some(ty) = p.type_or_none() {
                let value = if p.got_assign() { Some(p.expr()) } else { None };
                (Some(ty), value)
            } else {
                p.syntax_error("expecting type");
                p.advance(&[Token::Semi, Token::Rparen]);
                return None;
            };
            Some(Decl::Var {
                pos,
                group,
                name,
                ty,
                value,
            })
        })
    }

    // FuncDecl = "func" identifier Params [ Type ] [ Block ] .
    fn func_decl(&mut self, pos: Pos, group: Option<Rc<Group>>) -> Option<Decl> {
        self.traced("funcDecl", |p| {
            if p.tok() != Token::Name {
                p.syntax_error("expecting name");
                p.advance(&[Token::Lbrace, Token::Semi]);
                return None;
            }
            let name = p.name();
            p.print(&format!("id: {}", name.value));
            let params = p.param_list();
            let result = p.type_or_none();
            let body = (p.tok() == Token::Lbrace).then(|| p.func_body());
            Some(Decl::Func {
                pos,
                group,
                name,
                params,
                result,
                body,
            })
        })
    }

    // OperDecl = "oper" "(" Param ")" OperName "(" Param ")" Type [ Block ] .
    // OperName = "add" | "sub" | "mul" | "div" | "mod" |
    //            "radd" | "rsub" | "rmul" | "rdiv" | "rmod" .
    fn oper_decl(&mut self, pos: Pos, group: Option<Rc<Group>>) -> Option<Decl> {
        self.traced("operDecl", |p| {
            let lhs = p.single_param("receiver")?;

            if p.tok() != Token::Name {
                p.syntax_error("expecting operator name");
                p.advance(&[Token::Lbrace, Token::Semi]);
                return None;
            }
            let name = p.name();
            let Some(op) = OverloadOp::from_name(&name.value) else {
                p.syntax_error_at(
                    name.pos.clone(),
                    &format!("invalid operator name {}", name.value),
                );
                p.advance(&[Token::Lbrace, Token::Semi]);
                return None;
            };
            p.print(&format!("oper: {op}"));

            let rhs = p.single_param("operand")?;
            let Some(result) = p.type_or_none() else {
                p.syntax_error("expecting type");
                p.advance(&[Token::Lbrace, Token::Semi]);
                return None;
            };
            let body = if p.tok() == Token::Lbrace {
                Some(p.func_body())
            } else {
                p.syntax_error("expecting {");
                None
            };
            Some(Decl::Oper {
                pos,
                group,
                lhs,
                op,
                rhs,
                result,
                body,
            })
        })
    }

    // Params = "(" [ Param { "," Param } [ "," ] ] ")" .
    fn param_list(&mut self) -> Vec<Field> {
        let mut params = Vec::new();
        if !self.got(Token::Lparen) {
            self.syntax_error("expecting (");
            return params;
        }
        self.list("parameter list", Token::Comma, Token::Rparen, |p| {
            params.extend(p.param());
            false
        });
        params
    }

    // Param = identifier Type .
    fn param(&mut self) -> Option<Field> {
        let pos = self.pos();
        if self.tok() != Token::Name {
            self.syntax_error("expecting parameter");
            self.advance(&[Token::Comma, Token::Rparen]);
            return None;
        }
        let name = self.name();
        let Some(ty) = self.type_or_none() else {
            self.syntax_error("expecting type");
            self.advance(&[Token::Comma, Token::Rparen]);
            return None;
        };
        Some(Field { pos, name, ty })
    }

    /// `"(" identifier Type ")"`; `what` names the identifier in
    /// diagnostics.
    fn single_param(&mut self, what: &str) -> Option<Field> {
        if !self.got(Token::Lparen) {
            self.syntax_error("expecting (");
            self.advance(&[Token::Lbrace, Token::Semi]);
            return None;
        }
        let pos = self.pos();
        if self.tok() != Token::Name {
            self.syntax_error(&format!("expecting {what}"));
            self.advance(&[Token::Lbrace, Token::Semi]);
            return None;
        }
        let name = self.name();
        let Some(ty) = self.type_or_none() else {
            self.syntax_error("expecting type");
            self.advance(&[Token::Lbrace, Token::Semi]);
            return None;
        };
        self.want(Token::Rparen);
        Some(Field { pos, name, ty })
    }

    fn func_body(&mut self) -> BlockStmt {
        self.fnest += 1;
        let body = self.block_stmt("");
        self.fnest -= 1;
        body
    }

    // ------------------------------------------------------------------------
    // Statements

    // Block = "{" StatementList "}" .
    fn block_stmt(&mut self, context: &str) -> BlockStmt {
        self.traced("blockStmt", |p| {
            let pos = p.pos();
            if !p.got(Token::Lbrace) {
                if context.is_empty() {
                    p.syntax_error("expecting {");
                } else {
                    p.syntax_error(&format!("expecting {{ after {context}"));
                }
                p.advance(&[Token::Name, Token::Rbrace]);
                let rbrace = p.pos();
                if p.got(Token::Rbrace) {
                    return BlockStmt {
                        pos,
                        stmts: Vec::new(),
                        rbrace,
                    };
                }
            }
            let stmts = p.stmt_list();
            let rbrace = p.pos();
            p.want(Token::Rbrace);
            BlockStmt { pos, stmts, rbrace }
        })
    }

    // StatementList = { Statement ";" } .
    fn stmt_list(&mut self) -> Vec<Stmt> {
        self.traced("stmtList", |p| {
            let mut stmts = Vec::new();
            while p.tok() != Token::Eof && p.tok() != Token::Rbrace {
                let Some(s) = p.stmt_or_none() else { break };
                stmts.push(s);
                // ";" is optional before "}"
                if !p.got(Token::Semi) && p.tok() != Token::Rbrace {
                    p.syntax_error("at end of statement");
                    p.advance(&[Token::Semi, Token::Rbrace]);
                    p.got(Token::Semi); // avoid spurious empty statement
                }
            }
            stmts
        })
    }

    fn stmt_or_none(&mut self) -> Option<Stmt> {
        self.traced("stmt", |p| {
            let stmt = match p.tok() {
                Token::Name
                | Token::Literal
                | Token::Lparen
                | Token::Lbrack
                | Token::Op
                | Token::Star => p.simple_stmt(),
                Token::Var | Token::Type => p.decl_stmt(),
                Token::Lbrace => Stmt::Block(p.block_stmt("")),
                Token::For => p.for_stmt(),
                Token::While => p.while_stmt(),
                Token::If => p.if_stmt(),
                Token::Return => {
                    let pos = p.pos();
                    p.next();
                    let result =
                        (!matches!(p.tok(), Token::Semi | Token::Rbrace)).then(|| p.expr());
                    Stmt::Return { pos, result }
                }
                Token::Break => {
                    let pos = p.pos();
                    p.next();
                    Stmt::Break { pos }
                }
                Token::Semi => Stmt::Empty { pos: p.pos() },
                _ => return None,
            };
            Some(stmt)
        })
    }

    // SimpleStmt = ExprStmt | IncDecStmt | Assignment | ShortVarDecl .
    fn simple_stmt(&mut self) -> Stmt {
        self.traced("simpleStmt", |p| {
            let lhs = p.expr();
            let pos = p.pos();
            match p.tok() {
                Token::Assign | Token::AssignOp => {
                    let op = if p.tok() == Token::AssignOp {
                        p.scanner.op()
                    } else {
                        None
                    };
                    p.next();
                    let rhs = p.expr();
                    Stmt::Assign { pos, op, lhs, rhs }
                }
                Token::IncOp => {
                    let op = p.scanner.op().unwrap_or(Operator::Add);
                    p.next();
                    Stmt::IncDec { pos, op, x: lhs }
                }
                Token::Define => {
                    p.next();
                    let rhs = p.expr();
                    Stmt::Define { pos, lhs, rhs }
                }
                _ => Stmt::Expr {
                    pos: lhs.pos().clone(),
                    x: lhs,
                },
            }
        })
    }

    fn decl_stmt(&mut self) -> Stmt {
        self.traced("declStmt", |p| {
            let pos = p.pos();
            let kw = p.tok();
            p.next();
            let mut decls = Vec::new();
            if kw == Token::Type {
                p.append_group(&mut decls, kw, pos.clone(), Self::type_decl);
            } else {
                p.append_group(&mut decls, kw, pos.clone(), Self::var_decl);
            }
            Stmt::Decl { pos, decls }
        })
    }

    fn if_stmt(&mut self) -> Stmt {
        self.traced("ifStmt", |p| {
            let pos = p.pos();
            let (init, cond, _) = p.header(Token::If);
            let cond = cond.unwrap_or_else(|| Expr::Bad { pos: pos.clone() });
            let then = p.block_stmt("if clause");
            let els = if p.got(Token::Else) {
                match p.tok() {
                    Token::If => Some(Box::new(p.if_stmt())),
                    Token::Lbrace => Some(Box::new(Stmt::Block(p.block_stmt("")))),
                    _ => {
                        p.syntax_error("else must be followed by if or statement block");
                        p.advance(&[Token::Name, Token::Rbrace]);
                        None
                    }
                }
            } else {
                None
            };
            Stmt::If {
                pos,
                init: init.map(Box::new),
                cond,
                then,
                els,
            }
        })
    }

    fn while_stmt(&mut self) -> Stmt {
        self.traced("whileStmt", |p| {
            let pos = p.pos();
            p.next();
            let cond = if p.tok() == Token::Lbrace {
                p.syntax_error("missing condition in while statement");
                p.bad_expr()
            } else {
                p.expr()
            };
            let body = p.block_stmt("while clause");
            Stmt::While { pos, cond, body }
        })
    }

    fn for_stmt(&mut self) -> Stmt {
        self.traced("forStmt", |p| {
            let pos = p.pos();
            let (init, cond, post) = p.header(Token::For);
            let body = p.block_stmt("for clause");
            Stmt::For {
                pos,
                init: init.map(Box::new),
                cond,
                post: post.map(Box::new),
                body,
            }
        })
    }

    /// Parses the clauses between `keyword` and the opening brace: a single
    /// condition for `if`, or `init; cond; post` for `for` (each optional).
    fn header(&mut self, keyword: Token) -> (Option<Stmt>, Option<Expr>, Option<Stmt>) {
        self.want(keyword);
        if self.tok() == Token::Lbrace {
            let mut cond = None;
            if keyword == Token::If {
                self.syntax_error("missing condition in if statement");
                cond = Some(self.bad_expr());
            }
            return (None, cond, None);
        }

        let mut init = None;
        if self.tok() != Token::Semi {
            // accept a var declaration but complain
            if self.got(Token::Var) {
                self.syntax_error(&format!(
                    "var declaration not allowed in {} initializer",
                    tokstring(keyword)
                ));
            }
            init = Some(self.simple_stmt());
        }

        let mut cond_stmt = None;
        let mut post = None;
        let mut semi: Option<(Pos, String)> = None;
        if self.tok() == Token::Lbrace {
            cond_stmt = init.take();
        } else {
            'clauses: {
                if self.tok() == Token::Semi {
                    semi = Some((self.pos(), self.scanner.literal().to_string()));
                    self.next();
                } else {
                    // asking for '{' rather than ';' gives a better message
                    self.want(Token::Lbrace);
                    if self.tok() != Token::Lbrace {
                        self.advance(&[Token::Lbrace, Token::Rbrace]);
                    }
                }
                if keyword == Token::For {
                    if self.tok() != Token::Semi {
                        if self.tok() == Token::Lbrace {
                            self.syntax_error("expecting for loop condition");
                            break 'clauses;
                        }
                        cond_stmt = Some(self.simple_stmt());
                    }
                    self.want(Token::Semi);
                    if self.tok() != Token::Lbrace {
                        let s = self.simple_stmt();
                        if let Stmt::Define { pos, .. } = &s {
                            self.syntax_error_at(
                                pos.clone(),
                                "cannot declare in post statement of for loop",
                            );
                        }
                        post = Some(s);
                    }
                } else if self.tok() != Token::Lbrace {
                    cond_stmt = Some(self.simple_stmt());
                }
            }
        }

        let cond = match cond_stmt {
            None => match semi {
                Some((pos, lit)) if keyword == Token::If => {
                    if lit == "semicolon" {
                        self.syntax_error_at(pos.clone(), "missing condition in if statement");
                    } else {
                        self.syntax_error_at(
                            pos.clone(),
                            &format!("unexpected {lit}, expecting {{ after if clause"),
                        );
                    }
                    Some(Expr::Bad { pos })
                }
                _ => None,
            },
            Some(Stmt::Expr { x, .. }) => Some(x),
            Some(s) => {
                self.syntax_error_at(
                    s.pos().clone(),
                    &format!("cannot use {} as value", printer::format_stmt(&s)),
                );
                None
            }
        };
        (init, cond, post)
    }

    // ------------------------------------------------------------------------
    // Expressions

    fn expr(&mut self) -> Expr {
        self.traced("expr", |p| p.binary_expr(0))
    }

    // Expr = UnaryExpr | Expr binary_op Expr .
    fn binary_expr(&mut self, prec: u8) -> Expr {
        // not traced, the nesting gets out of hand
        let mut x = self.unary_expr();
        while matches!(self.tok(), Token::Op | Token::Star) && self.scanner.prec() > prec {
            let Some(op) = self.scanner.op() else { break };
            let pos = self.pos();
            let tprec = self.scanner.prec();
            self.print(&format!("operator({op})"));
            self.next();
            let y = self.binary_expr(tprec);
            // a < b is kept as b > a
            let (op, x1, y1) = if op == Operator::Lss {
                (Operator::Gtr, y, x)
            } else {
                (op, x, y)
            };
            x = Expr::Operation {
                pos,
                op,
                x: Box::new(x1),
                y: Some(Box::new(y1)),
            };
        }
        x
    }

    // UnaryExpr = PrimaryExpr | unary_op UnaryExpr .
    fn unary_expr(&mut self) -> Expr {
        self.traced("unaryExpr", |p| {
            if matches!(p.tok(), Token::Op | Token::Star) {
                if let Some(
                    op @ (Operator::Mul | Operator::Add | Operator::Sub | Operator::Not),
                ) = p.scanner.op()
                {
                    let pos = p.pos();
                    p.next();
                    let x = p.unary_expr();
                    return Expr::Operation {
                        pos,
                        op,
                        x: Box::new(x),
                        y: None,
                    };
                }
            }
            p.pexpr()
        })
    }

    // PrimaryExpr = Operand | PrimaryExpr ( Selector | Index | Call ) .
    fn pexpr(&mut self) -> Expr {
        self.traced("pexpr", |p| {
            let mut x = p.operand();
            loop {
                let pos = p.pos();
                match p.tok() {
                    Token::Dot => {
                        p.next();
                        if p.tok() == Token::Name {
                            let sel = p.name();
                            x = Expr::Selector {
                                pos,
                                x: Box::new(x),
                                sel,
                            };
                        } else {
                            p.syntax_error("expecting name or (");
                            p.advance(&[Token::Semi, Token::Rparen]);
                        }
                    }
                    Token::Lbrack => {
                        p.next();
                        let index = p.expr();
                        p.want(Token::Rbrack);
                        x = Expr::Index {
                            pos,
                            x: Box::new(x),
                            index: Box::new(index),
                        };
                    }
                    Token::Lparen => {
                        p.next();
                        let args = p.arg_list();
                        x = Expr::Call {
                            pos,
                            fun: Box::new(x),
                            args,
                        };
                    }
                    _ => break,
                }
            }
            x
        })
    }

    // Operand = identifier | Literal | SliceLit | "(" Expr ")" .
    fn operand(&mut self) -> Expr {
        self.traced("operand", |p| match p.tok() {
            Token::Name => {
                let name = p.name();
                p.print(&format!("name({})", name.value));
                Expr::Name(name)
            }
            Token::Literal => {
                let lit = p.literal();
                p.print(&format!("literal({})", lit.value));
                Expr::BasicLit(lit)
            }
            Token::Lbrack => p.slice_type_or_lit(),
            Token::Lparen => {
                let pos = p.pos();
                p.next();
                let x = p.expr();
                p.want(Token::Rparen);
                Expr::Paren {
                    pos,
                    x: Box::new(x),
                }
            }
            _ => {
                let bad = p.bad_expr();
                p.syntax_error("expecting expression");
                p.advance(&[
                    Token::Rparen,
                    Token::Rbrack,
                    Token::Rbrace,
                    Token::Semi,
                    Token::Comma,
                ]);
                bad
            }
        })
    }

    // Arguments = [ Expr { "," Expr } [ "," ] ] ")" .
    fn arg_list(&mut self) -> Vec<Expr> {
        self.traced("argList", |p| {
            let mut args = Vec::new();
            p.list("argument list", Token::Comma, Token::Rparen, |p| {
                args.push(p.expr());
                false
            });
            args
        })
    }

    // SliceLit = SliceType "{" [ Expr { "," Expr } [ "," ] ] "}" .
    fn slice_type_or_lit(&mut self) -> Expr {
        let pos = self.pos();
        let elem = self.slice_elem();
        if self.tok() != Token::Lbrace {
            return Expr::SliceType { pos, elem };
        }
        self.next();
        let mut elems = Vec::new();
        self.list("slice literal", Token::Comma, Token::Rbrace, |p| {
            elems.push(p.expr());
            false
        });
        Expr::SliceLit { pos, elem, elems }
    }

    /// Parses a possibly empty, `sep`-separated list up to and including
    /// `close`; the opening token is already consumed. `f` parses one
    /// element and returns true to stop early.
    fn list(
        &mut self,
        context: &str,
        sep: Token,
        close: Token,
        mut f: impl FnMut(&mut Self) -> bool,
    ) {
        let mut done = false;
        while self.tok() != Token::Eof && self.tok() != close && !done {
            done = f(self);
            // sep is optional before close
            if !self.got(sep) && self.tok() != close {
                self.syntax_error(&format!(
                    "in {context}; possibly missing {} or {}",
                    tokstring(sep),
                    tokstring(close)
                ));
                self.advance(&[Token::Rparen, Token::Rbrack, Token::Rbrace]);
                if self.tok() != close {
                    return;
                }
            }
        }
        self.want(close);
    }

    // ------------------------------------------------------------------------
    // Types and common productions

    // Type = identifier | SliceType .
    fn type_or_none(&mut self) -> Option<Expr> {
        match self.tok() {
            Token::Name => Some(Expr::Name(self.name())),
            Token::Lbrack => Some(self.slice_type()),
            _ => None,
        }
    }

    // SliceType = "[" "]" Type .
    fn slice_type(&mut self) -> Expr {
        let pos = self.pos();
        let elem = self.slice_elem();
        Expr::SliceType { pos, elem }
    }

    /// `"[" "]" Type`, returning the element type.
    fn slice_elem(&mut self) -> Box<Expr> {
        self.traced("sliceType", |p| {
            p.next();
            p.want(Token::Rbrack);
            let elem = p.type_or_none().unwrap_or_else(|| {
                let bad = p.bad_expr();
                p.syntax_error("expecting type");
                bad
            });
            Box::new(elem)
        })
    }

    fn name(&mut self) -> Name {
        if self.tok() == Token::Name {
            let n = Name::new(self.pos(), self.scanner.literal());
            self.next();
            return n;
        }
        let n = Name::new(self.pos(), "_");
        self.syntax_error("expecting name");
        self.advance(&[]);
        n
    }

    /// The current literal; the caller has checked for [`Token::Literal`].
    fn literal(&mut self) -> BasicLit {
        let lit = BasicLit {
            pos: self.pos(),
            value: self.scanner.literal().to_string(),
            kind: self.scanner.kind(),
            bad: self.scanner.bad(),
        };
        self.next();
        lit
    }

    fn bad_expr(&self) -> Expr {
        Expr::Bad { pos: self.pos() }
    }
}

fn tokstring(tok: Token) -> &'static str {
    match tok {
        Token::Comma => "comma",
        Token::Semi => "semicolon or newline",
        _ => tok.as_str(),
    }
}

/// Comment body without the comment markers (and a trailing `\r`).
fn comment_text(text: &str) -> &str {
    if let Some(body) = text.strip_prefix("/*") {
        return body.strip_suffix("*/").unwrap_or(body);
    }
    let body = text.strip_prefix("//").unwrap_or(text);
    body.strip_suffix('\r').unwrap_or(body)
}

/// Looks for a `:digits` suffix, searching from the right since filenames
/// may contain colons. Returns the index just past the colon and the
/// number, if the suffix is one.
fn trailing_digits(text: &str) -> Option<(usize, Option<u64>)> {
    let i = text.rfind(':')?;
    let digits = &text[i + 1..];
    let n = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    };
    Some((i + 1, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(src: &str) -> (File, Vec<SyntaxError>) {
        let (result, errors) = parse_collect("t.jd", src);
        (result.expect("module header"), errors)
    }

    #[test]
    fn trailing_digits_from_the_right() {
        assert_eq!(trailing_digits("foo.jd:10"), Some((7, Some(10))));
        assert_eq!(trailing_digits("c:\\x.jd:3"), Some((8, Some(3))));
        assert_eq!(trailing_digits("foo.jd:x"), Some((7, None)));
        assert_eq!(trailing_digits("foo.jd:"), Some((7, None)));
        assert_eq!(trailing_digits("foo.jd"), None);
    }

    #[test]
    fn comment_text_strips_markers() {
        assert_eq!(comment_text("//line a:1"), "line a:1");
        assert_eq!(comment_text("//line a:1\r"), "line a:1");
        assert_eq!(comment_text("/*line a:1*/"), "line a:1");
    }

    #[test]
    fn tokstring_names_separators() {
        assert_eq!(tokstring(Token::Comma), "comma");
        assert_eq!(tokstring(Token::Semi), "semicolon or newline");
        assert_eq!(tokstring(Token::Rparen), ")");
    }

    #[test]
    fn advance_without_follow_skips_one() {
        let mut p = Parser::new(
            PosBase::file("t.jd"),
            "a b c".as_bytes(),
            Some(Box::new(|_: &SyntaxError| {})),
            false,
        );
        p.advance(&[]);
        assert_eq!(p.tok(), Token::Name);
        assert_eq!(p.scanner.literal(), "b");
    }

    #[test]
    fn advance_stops_at_follow() {
        let mut p = Parser::new(
            PosBase::file("t.jd"),
            "a b ) c".as_bytes(),
            Some(Box::new(|_: &SyntaxError| {})),
            false,
        );
        p.advance(&[Token::Rparen]);
        assert_eq!(p.tok(), Token::Rparen);
        p.advance(&[Token::Rparen]);
        assert_eq!(p.tok(), Token::Rparen);
    }

    #[test]
    fn advance_honors_stop_set_in_functions() {
        let mut p = Parser::new(
            PosBase::file("t.jd"),
            "a b if c }".as_bytes(),
            Some(Box::new(|_: &SyntaxError| {})),
            false,
        );
        p.fnest = 1;
        p.advance(&[Token::Rbrace]);
        assert_eq!(p.tok(), Token::If);
        p.fnest = 0;
        p.advance(&[Token::Rbrace]);
        assert_eq!(p.tok(), Token::Rbrace);
    }

    #[test]
    fn unexpected_token_rendering() {
        let (_, errors) = collect("module m\nfunc f() { x += }\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].msg,
            "syntax error: unexpected }, expecting expression"
        );

        let (_, errors) = collect("module m\nvar x int 5\n");
        assert_eq!(
            errors[0].msg,
            "syntax error: unexpected gotLiteral 5 after top level declaration"
        );

        let (_, errors) = collect("module m\nfunc f() { x ++ y }\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].msg,
            "syntax error: unexpected y at end of statement"
        );
    }

    #[test]
    fn first_error_and_count() {
        let mut errs = 0;
        let mut p = Parser::new(
            PosBase::file("t.jd"),
            "module m\n5\n6\n".as_bytes(),
            Some(Box::new(|_: &SyntaxError| errs += 1)),
            false,
        );
        let file = p.parse_file().expect("file");
        assert!(file.decls.is_empty());
        assert_eq!(p.error_count(), 2);
        assert_eq!(
            p.first_error().map(|e| e.msg.as_str()),
            Some("syntax error: non-declaration statement outside function body")
        );
        drop(p);
        assert_eq!(errs, 2);
    }

    #[test]
    fn aborts_without_handler() {
        let err = parse_str("t.jd", "module m\nvar = 1\nvar y = }\n").unwrap_err();
        let Error::Aborted(first) = err else {
            panic!("expected abort, got {err:?}");
        };
        assert_eq!(first.pos.line(), 2);
        assert_eq!(first.msg, "syntax error: unexpected =, expecting name");
    }

    #[test]
    fn verbose_trace_does_not_change_result() {
        let src = "module m\nfunc f(a int) int { if a < 1 { return a }; return 0 }\n";
        let quiet = parse_str("t.jd", src).expect("quiet");
        let loud = Parser::new(PosBase::file("t.jd"), src.as_bytes(), None, true)
            .parse_file()
            .expect("verbose");
        assert_eq!(quiet, loud);
    }
}
