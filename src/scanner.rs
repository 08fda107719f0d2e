use std::fmt;
use std::io::Read;

use crate::source::Source;
use crate::token::{LitKind, Operator, Token};

/// Classifies a lexical error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A NUL byte in the source.
    InvalidNul,
    /// Bytes that are not valid UTF-8.
    InvalidUtf8,
    /// Byte order mark anywhere but at the very start.
    InvalidBom,
    /// The reader failed.
    Io(String),
    /// The reader kept returning without data or error.
    NoProgress,
    /// Character that cannot start any token.
    InvalidCharacter(char),
    NewlineInString,
    UnterminatedString,
    UnterminatedRawString,
    NewlineInRune,
    UnterminatedRune,
    EmptyRune,
    MultiCharRune,
    UnknownEscape,
    /// Non-digit inside a numeric escape.
    InvalidEscapeDigit { found: char, escape: &'static str },
    /// Escape value above 255 (octal) or not a Unicode code point.
    EscapeOutOfRange,
    /// Prefixed integer such as `0x` without digits.
    NoDigits { literal: &'static str },
    InvalidDigit { digit: char, literal: &'static str },
    NoExponentDigits,
    UnterminatedComment,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNul => write!(f, "invalid NUL character"),
            Self::InvalidUtf8 => write!(f, "invalid UTF-8 encoding"),
            Self::InvalidBom => write!(f, "invalid BOM in the middle of the file"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::NoProgress => {
                write!(f, "I/O error: multiple Read calls return no data or error")
            }
            Self::InvalidCharacter(ch) => {
                write!(f, "invalid character U+{:04X} {ch:?}", u32::from(*ch))
            }
            Self::NewlineInString => write!(f, "newline in string"),
            Self::UnterminatedString => write!(f, "string not terminated"),
            Self::UnterminatedRawString => write!(f, "raw string literal not terminated"),
            Self::NewlineInRune => write!(f, "newline in rune literal"),
            Self::UnterminatedRune => write!(f, "rune literal not terminated"),
            Self::EmptyRune => {
                write!(f, "empty rune literal or unescaped ' in rune literal")
            }
            Self::MultiCharRune => write!(f, "more than one character in rune literal"),
            Self::UnknownEscape => write!(f, "unknown escape"),
            Self::InvalidEscapeDigit { found, escape } => {
                write!(f, "invalid character {found:?} in {escape} escape")
            }
            Self::EscapeOutOfRange => write!(f, "escape is invalid Unicode code point"),
            Self::NoDigits { literal } => write!(f, "{literal} literal has no digits"),
            Self::InvalidDigit { digit, literal } => {
                write!(f, "invalid digit {digit:?} in {literal} literal")
            }
            Self::NoExponentDigits => write!(f, "exponent has no digits"),
            Self::UnterminatedComment => write!(f, "comment not terminated"),
        }
    }
}

/// Error produced while decoding or scanning source text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {line}, column {col}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: u32,
    pub col: u32,
}

/// Out-of-band notifications produced while scanning, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Error(LexError),
    /// A comment that may be a line directive; `text` is the complete
    /// comment including its `//` or `/* */` markers.
    Directive { line: u32, col: u32, text: String },
}

/// A scanned token with its text and start position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    /// Source text for names and literals, the separator reason for
    /// [`Token::Semi`], the spelling for everything else.
    pub text: String,
    pub line: u32,
    pub col: u32,
}

/// Tokenize a complete source string.
///
/// Scanning never stops at an error: every lexical error is returned next
/// to the tokens, which end with [`Token::Eof`].
#[must_use]
pub fn tokenize(input: &str) -> (Vec<Lexeme>, Vec<LexError>) {
    let mut scanner = Scanner::new(input.as_bytes());
    let mut lexemes = Vec::new();
    let mut errors = Vec::new();
    loop {
        scanner.next();
        errors.extend(scanner.take_reports().into_iter().filter_map(|r| match r {
            Report::Error(e) => Some(e),
            Report::Directive { .. } => None,
        }));
        let token = scanner.token();
        let text = match token {
            Token::Name | Token::Literal | Token::Semi => scanner.literal().to_string(),
            Token::Op | Token::Star => scanner.op().map_or("", Operator::as_str).to_string(),
            Token::AssignOp => format!("{}=", scanner.op().map_or("", Operator::as_str)),
            Token::IncOp => {
                let op = scanner.op().map_or("", Operator::as_str);
                format!("{op}{op}")
            }
            other => other.as_str().to_string(),
        };
        lexemes.push(Lexeme {
            token,
            text,
            line: scanner.line(),
            col: scanner.col(),
        });
        if token == Token::Eof {
            return (lexemes, errors);
        }
    }
}

/// Pull-based scanner over a byte stream.
///
/// The scanner always holds exactly one current token; [`Scanner::next`]
/// replaces it with the following one. Lexical errors and directive
/// comments are queued and retrieved with [`Scanner::take_reports`].
pub struct Scanner<R> {
    source: Source<R>,
    /// Whether a newline or end of input terminates the current statement.
    nlsemi: bool,

    // current token
    line: u32,
    col: u32,
    tok: Token,
    lit: String,
    kind: LitKind,
    bad: bool,
    op: Option<Operator>,
    prec: u8,
}

impl<R: Read> Scanner<R> {
    pub fn new(input: R) -> Self {
        let mut source = Source::new(input);
        source.nextch();
        Self {
            source,
            nlsemi: false,
            line: 0,
            col: 0,
            tok: Token::Eof,
            lit: String::new(),
            kind: LitKind::Int,
            bad: false,
            op: None,
            prec: 0,
        }
    }

    pub const fn token(&self) -> Token {
        self.tok
    }

    /// Text of the current name or literal, or the reason of a
    /// [`Token::Semi`] (`"semicolon"`, `"newline"` or `"EOF"`).
    pub fn literal(&self) -> &str {
        &self.lit
    }

    pub const fn kind(&self) -> LitKind {
        self.kind
    }

    /// Whether the current literal is malformed.
    pub const fn bad(&self) -> bool {
        self.bad
    }

    pub const fn op(&self) -> Option<Operator> {
        self.op
    }

    pub const fn prec(&self) -> u8 {
        self.prec
    }

    pub const fn line(&self) -> u32 {
        self.line
    }

    pub const fn col(&self) -> u32 {
        self.col
    }

    /// Raw bytes of the current token.
    pub fn segment(&self) -> &[u8] {
        self.source.segment()
    }

    pub fn take_reports(&mut self) -> Vec<Report> {
        self.source.take_reports()
    }

    /// Advance to the next token.
    #[allow(clippy::too_many_lines)]
    pub fn next(&mut self) {
        let nlsemi = self.nlsemi;
        self.nlsemi = false;
        self.op = None;
        self.prec = 0;
        self.bad = false;

        loop {
            self.source.stop();
            while matches!(self.source.ch(), Some(' ' | '\t' | '\r'))
                || (self.source.ch() == Some('\n') && !nlsemi)
            {
                self.source.nextch();
            }

            (self.line, self.col) = self.source.pos();
            self.source.start();

            let Some(ch) = self.source.ch() else {
                if nlsemi {
                    self.semi("EOF");
                } else {
                    self.tok = Token::Eof;
                    self.lit.clear();
                }
                return;
            };

            if is_letter(ch) || (!ch.is_ascii() && ch.is_alphabetic()) {
                self.source.nextch();
                self.ident();
                return;
            }

            match ch {
                '\n' => {
                    self.source.nextch();
                    self.semi("newline");
                }
                '0'..='9' => self.number(false),
                '"' => self.std_string(),
                '`' => self.raw_string(),
                '\'' => self.rune(),
                '(' => self.punct(Token::Lparen),
                '[' => self.punct(Token::Lbrack),
                '{' => self.punct(Token::Lbrace),
                ')' => {
                    self.punct(Token::Rparen);
                    self.nlsemi = true;
                }
                ']' => {
                    self.punct(Token::Rbrack);
                    self.nlsemi = true;
                }
                '}' => {
                    self.punct(Token::Rbrace);
                    self.nlsemi = true;
                }
                ',' => self.punct(Token::Comma),
                ';' => {
                    self.source.nextch();
                    self.semi("semicolon");
                }
                ':' => {
                    self.source.nextch();
                    if self.source.ch() == Some('=') {
                        self.source.nextch();
                        self.tok = Token::Define;
                    } else {
                        self.tok = Token::Colon;
                    }
                }
                '.' => {
                    self.source.nextch();
                    if self.source.ch().is_some_and(|c| c.is_ascii_digit()) {
                        self.number(true);
                        return;
                    }
                    if self.source.ch() == Some('.') {
                        self.source.nextch();
                        if self.source.ch() == Some('.') {
                            self.source.nextch();
                            self.tok = Token::DotDotDot;
                            return;
                        }
                        // only one '.' belongs to this token
                        self.source.rewind();
                        self.source.nextch();
                    }
                    self.tok = Token::Dot;
                }
                '+' | '-' => {
                    self.source.nextch();
                    let op = if ch == '+' { Operator::Add } else { Operator::Sub };
                    if self.source.ch() == Some(ch) {
                        self.source.nextch();
                        self.set_op(op);
                        self.tok = Token::IncOp;
                        self.nlsemi = true;
                    } else {
                        self.assign_op(op);
                    }
                }
                '*' => {
                    self.source.nextch();
                    self.set_op(Operator::Mul);
                    if self.source.ch() == Some('=') {
                        self.source.nextch();
                        self.tok = Token::AssignOp;
                    } else {
                        self.tok = Token::Star;
                    }
                }
                '/' => {
                    self.source.nextch();
                    if self.source.ch() == Some('/') {
                        self.source.nextch();
                        self.line_comment();
                        continue;
                    }
                    if self.source.ch() == Some('*') {
                        self.source.nextch();
                        self.full_comment();
                        if self.source.pos().0 != self.line && nlsemi {
                            // a multi-line comment acts like a newline
                            self.semi("newline");
                            return;
                        }
                        continue;
                    }
                    self.assign_op(Operator::Div);
                }
                '%' => {
                    self.source.nextch();
                    self.assign_op(Operator::Rem);
                }
                '&' => {
                    self.source.nextch();
                    if self.source.ch() == Some('&') {
                        self.source.nextch();
                        self.binary_op(Operator::AndAnd);
                    } else if self.source.ch() == Some('^') {
                        self.source.nextch();
                        self.assign_op(Operator::AndNot);
                    } else {
                        self.assign_op(Operator::And);
                    }
                }
                '|' => {
                    self.source.nextch();
                    if self.source.ch() == Some('|') {
                        self.source.nextch();
                        self.binary_op(Operator::OrOr);
                    } else {
                        self.assign_op(Operator::Or);
                    }
                }
                '^' => {
                    self.source.nextch();
                    self.assign_op(Operator::Xor);
                }
                '<' | '>' => {
                    self.source.nextch();
                    let (cmp, cmp_eq, shift) = if ch == '<' {
                        (Operator::Lss, Operator::Leq, Operator::Shl)
                    } else {
                        (Operator::Gtr, Operator::Geq, Operator::Shr)
                    };
                    if self.source.ch() == Some('=') {
                        self.source.nextch();
                        self.binary_op(cmp_eq);
                    } else if self.source.ch() == Some(ch) {
                        self.source.nextch();
                        self.assign_op(shift);
                    } else {
                        self.binary_op(cmp);
                    }
                }
                '=' => {
                    self.source.nextch();
                    if self.source.ch() == Some('=') {
                        self.source.nextch();
                        self.binary_op(Operator::Eql);
                    } else {
                        self.tok = Token::Assign;
                    }
                }
                '!' => {
                    self.source.nextch();
                    if self.source.ch() == Some('=') {
                        self.source.nextch();
                        self.binary_op(Operator::Neq);
                    } else {
                        self.binary_op(Operator::Not);
                    }
                }
                _ => {
                    self.source
                        .error_at(self.line, self.col, LexErrorKind::InvalidCharacter(ch));
                    self.source.nextch();
                    continue;
                }
            }
            return;
        }
    }

    fn punct(&mut self, tok: Token) {
        self.source.nextch();
        self.tok = tok;
    }

    fn semi(&mut self, reason: &str) {
        self.tok = Token::Semi;
        self.lit.clear();
        self.lit.push_str(reason);
    }

    const fn set_op(&mut self, op: Operator) {
        self.op = Some(op);
        self.prec = op.precedence();
    }

    const fn binary_op(&mut self, op: Operator) {
        self.set_op(op);
        self.tok = Token::Op;
    }

    /// `op` or `op=`, depending on the next character.
    fn assign_op(&mut self, op: Operator) {
        self.set_op(op);
        if self.source.ch() == Some('=') {
            self.source.nextch();
            self.tok = Token::AssignOp;
        } else {
            self.tok = Token::Op;
        }
    }

    fn ident(&mut self) {
        while let Some(c) = self.source.ch() {
            if is_letter(c) || c.is_ascii_digit() || (!c.is_ascii() && c.is_alphanumeric()) {
                self.source.nextch();
            } else {
                break;
            }
        }
        self.lit = self.segment_text();
        match Token::keyword(&self.lit) {
            Some(kw) => {
                self.nlsemi = matches!(kw, Token::Break | Token::Return);
                self.tok = kw;
            }
            None => {
                self.nlsemi = true;
                self.tok = Token::Name;
            }
        }
    }

    fn number(&mut self, seen_point: bool) {
        let mut ok = true;
        let mut kind = LitKind::Int;
        let mut base = 10;
        let mut literal = "decimal";
        let mut invalid = None;

        if !seen_point {
            if self.source.ch() == Some('0') {
                self.source.nextch();
                let prefix = match self.source.ch().map(|c| c.to_ascii_lowercase()) {
                    Some('x') => Some((16, "hexadecimal")),
                    Some('o') => Some((8, "octal")),
                    Some('b') => Some((2, "binary")),
                    _ => None,
                };
                if let Some((b, name)) = prefix {
                    self.source.nextch();
                    base = b;
                    literal = name;
                    let (count, bad) = self.digits(base);
                    invalid = bad;
                    if count == 0 {
                        self.error(LexErrorKind::NoDigits { literal });
                        ok = false;
                    }
                }
            }
            if base == 10 {
                invalid = self.digits(10).1;
                if self.source.ch() == Some('.') {
                    kind = LitKind::Float;
                    self.source.nextch();
                    self.digits(10);
                }
            }
        } else {
            kind = LitKind::Float;
            self.digits(10);
        }

        if base == 10 && matches!(self.source.ch(), Some('e' | 'E')) {
            kind = LitKind::Float;
            self.source.nextch();
            if matches!(self.source.ch(), Some('+' | '-')) {
                self.source.nextch();
            }
            if self.digits(10).0 == 0 {
                self.error(LexErrorKind::NoExponentDigits);
                ok = false;
            }
        }

        if let Some(digit) = invalid.filter(|_| kind == LitKind::Int) {
            self.error(LexErrorKind::InvalidDigit { digit, literal });
            ok = false;
        }

        self.set_literal(kind, ok);
    }

    /// Consumes digits and `_` separators. Returns the number of digits and
    /// the first digit that is not valid in `base`, if any.
    fn digits(&mut self, base: u32) -> (usize, Option<char>) {
        let mut count = 0;
        let mut invalid = None;
        while let Some(c) = self.source.ch() {
            if c == '_' {
                self.source.nextch();
                continue;
            }
            let digit = if base <= 10 { c.to_digit(10) } else { c.to_digit(base) };
            let Some(d) = digit else { break };
            if d >= base && invalid.is_none() {
                invalid = Some(c);
            }
            count += 1;
            self.source.nextch();
        }
        (count, invalid)
    }

    fn std_string(&mut self) {
        let mut ok = true;
        self.source.nextch();
        loop {
            match self.source.ch() {
                Some('"') => {
                    self.source.nextch();
                    break;
                }
                Some('\\') => {
                    self.source.nextch();
                    if !self.escape('"') {
                        ok = false;
                    }
                }
                Some('\n') => {
                    self.error(LexErrorKind::NewlineInString);
                    ok = false;
                    break;
                }
                None => {
                    self.error(LexErrorKind::UnterminatedString);
                    ok = false;
                    break;
                }
                Some(_) => self.source.nextch(),
            }
        }
        self.set_literal(LitKind::String, ok);
    }

    fn raw_string(&mut self) {
        let mut ok = true;
        self.source.nextch();
        loop {
            match self.source.ch() {
                Some('`') => {
                    self.source.nextch();
                    break;
                }
                None => {
                    self.error(LexErrorKind::UnterminatedRawString);
                    ok = false;
                    break;
                }
                Some(_) => self.source.nextch(),
            }
        }
        self.set_literal(LitKind::String, ok);
    }

    fn rune(&mut self) {
        let mut ok = true;
        self.source.nextch();
        let mut n = 0;
        loop {
            match self.source.ch() {
                Some('\'') => {
                    if ok {
                        if n == 0 {
                            self.error(LexErrorKind::EmptyRune);
                            ok = false;
                        } else if n != 1 {
                            self.error(LexErrorKind::MultiCharRune);
                            ok = false;
                        }
                    }
                    self.source.nextch();
                    break;
                }
                Some('\\') => {
                    self.source.nextch();
                    if !self.escape('\'') {
                        ok = false;
                    }
                    n += 1;
                }
                Some('\n') => {
                    if ok {
                        self.error(LexErrorKind::NewlineInRune);
                        ok = false;
                    }
                    break;
                }
                None => {
                    if ok {
                        self.error(LexErrorKind::UnterminatedRune);
                        ok = false;
                    }
                    break;
                }
                Some(_) => {
                    self.source.nextch();
                    n += 1;
                }
            }
        }
        self.set_literal(LitKind::Rune, ok);
    }

    /// Validates one escape sequence; the backslash is already consumed.
    fn escape(&mut self, quote: char) -> bool {
        let (n, base, max, escape): (u32, u32, u32, &'static str) = match self.source.ch() {
            None => return true, // reported by the caller
            Some(c) if c == quote || matches!(c, 'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\') => {
                self.source.nextch();
                return true;
            }
            Some('0'..='7') => (3, 8, 255, "octal"),
            Some('x') => {
                self.source.nextch();
                (2, 16, 255, "hexadecimal")
            }
            Some('u') => {
                self.source.nextch();
                (4, 16, u32::from(char::MAX), "Unicode")
            }
            Some('U') => {
                self.source.nextch();
                (8, 16, u32::from(char::MAX), "Unicode")
            }
            Some(_) => {
                self.escape_error(LexErrorKind::UnknownEscape);
                return false;
            }
        };

        let mut x: u32 = 0;
        for _ in 0..n {
            let Some(c) = self.source.ch() else {
                return true; // reported by the caller
            };
            let Some(d) = c.to_digit(base) else {
                self.escape_error(LexErrorKind::InvalidEscapeDigit { found: c, escape });
                return false;
            };
            x = x.saturating_mul(base).saturating_add(d);
            self.source.nextch();
        }

        if x > max || (base == 16 && (0xd800..0xe000).contains(&x)) {
            self.escape_error(LexErrorKind::EscapeOutOfRange);
            return false;
        }
        true
    }

    fn line_comment(&mut self) {
        // "//" consumed; directives must follow immediately
        if !self.directive_prefix() {
            self.source.stop();
            self.skip_line();
            return;
        }
        self.skip_line();
        self.directive();
    }

    fn full_comment(&mut self) {
        // "/*" consumed
        if !self.directive_prefix() {
            self.source.stop();
            self.skip_comment();
            return;
        }
        if self.skip_comment() {
            self.directive();
        }
    }

    /// Consumes `line ` if it comes next; reports whether it did.
    fn directive_prefix(&mut self) -> bool {
        for m in "line ".chars() {
            if self.source.ch() != Some(m) {
                return false;
            }
            self.source.nextch();
        }
        true
    }

    fn directive(&mut self) {
        let text = String::from_utf8_lossy(self.source.segment()).into_owned();
        self.source.report(Report::Directive {
            line: self.line,
            col: self.col,
            text,
        });
    }

    fn skip_line(&mut self) {
        // the newline stays: it may terminate a statement
        while self.source.ch().is_some_and(|c| c != '\n') {
            self.source.nextch();
        }
    }

    fn skip_comment(&mut self) -> bool {
        while self.source.ch().is_some() {
            while self.source.ch() == Some('*') {
                self.source.nextch();
                if self.source.ch() == Some('/') {
                    self.source.nextch();
                    return true;
                }
            }
            self.source.nextch();
        }
        self.error(LexErrorKind::UnterminatedComment);
        false
    }

    fn set_literal(&mut self, kind: LitKind, ok: bool) {
        self.nlsemi = true;
        self.tok = Token::Literal;
        self.lit = self.segment_text();
        self.kind = kind;
        self.bad = !ok;
    }

    /// Text of the current token. NUL bytes were reported and skipped by
    /// the source, so they are left out here as well.
    fn segment_text(&self) -> String {
        String::from_utf8_lossy(self.source.segment()).replace('\0', "")
    }

    /// Reports at the start of the current token.
    fn error(&mut self, kind: LexErrorKind) {
        self.source.error_at(self.line, self.col, kind);
    }

    /// Reports at the current character.
    fn escape_error(&mut self, kind: LexErrorKind) {
        self.source.error(kind);
    }
}

const fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).0.iter().map(|l| l.token).collect()
    }

    #[test]
    fn module_header() {
        assert_eq!(
            tokens("module m; var x = 1;"),
            vec![
                Token::Module,
                Token::Name,
                Token::Semi,
                Token::Var,
                Token::Name,
                Token::Assign,
                Token::Literal,
                Token::Semi,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn newline_becomes_semi_after_operand() {
        let (lexemes, errors) = tokenize("x\ny");
        assert!(errors.is_empty());
        assert_eq!(lexemes[1].token, Token::Semi);
        assert_eq!(lexemes[1].text, "newline");
        assert_eq!(lexemes[3].token, Token::Semi);
        assert_eq!(lexemes[3].text, "EOF");
    }

    #[test]
    fn newline_skipped_after_operator() {
        assert_eq!(
            tokens("a +\nb"),
            vec![Token::Name, Token::Op, Token::Name, Token::Semi, Token::Eof]
        );
    }

    #[test]
    fn operators_carry_precedence() {
        let mut s = Scanner::new("a * b + c".as_bytes());
        s.next();
        s.next();
        assert_eq!(s.token(), Token::Star);
        assert_eq!(s.op(), Some(Operator::Mul));
        assert_eq!(s.prec(), 5);
        s.next();
        s.next();
        assert_eq!(s.token(), Token::Op);
        assert_eq!(s.op(), Some(Operator::Add));
        assert_eq!(s.prec(), 4);
    }

    #[test]
    fn assign_and_inc_ops() {
        let (lexemes, _) = tokenize("x += 1; y++; z <<= 2; w := 3");
        let texts: Vec<_> = lexemes.iter().map(|l| l.text.as_str()).collect();
        assert!(texts.contains(&"+="));
        assert!(texts.contains(&"++"));
        assert!(texts.contains(&"<<="));
        assert!(lexemes.iter().any(|l| l.token == Token::Define));
    }

    #[test]
    fn dot_sequences() {
        assert_eq!(
            tokens("a..b"),
            vec![
                Token::Name,
                Token::Dot,
                Token::Dot,
                Token::Name,
                Token::Semi,
                Token::Eof
            ]
        );
        assert_eq!(tokens("...")[0], Token::DotDotDot);
        let (lexemes, _) = tokenize(".5");
        assert_eq!(lexemes[0].token, Token::Literal);
    }

    #[test]
    fn dot_columns_after_rewind() {
        let (lexemes, _) = tokenize("a..b");
        assert_eq!(lexemes[1].col, 2);
        assert_eq!(lexemes[2].col, 3);
        assert_eq!(lexemes[3].col, 4);
    }

    #[test]
    fn literal_kinds() {
        let mut s = Scanner::new("42 0x1F 3.14 1e9 'a' \"hi\\n\" `raw`".as_bytes());
        let mut kinds = Vec::new();
        loop {
            s.next();
            if s.token() != Token::Literal {
                break;
            }
            assert!(!s.bad(), "{} should be well formed", s.literal());
            kinds.push(s.kind());
        }
        assert_eq!(
            kinds,
            vec![
                LitKind::Int,
                LitKind::Int,
                LitKind::Float,
                LitKind::Float,
                LitKind::Rune,
                LitKind::String,
                LitKind::String,
            ]
        );
    }

    #[test]
    fn bad_literals() {
        let (_, errors) = tokenize("0x 08_9b 1e+ 'ab' '' \"a\\q\"");
        let kinds: Vec<_> = errors.into_iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&LexErrorKind::NoDigits {
            literal: "hexadecimal"
        }));
        assert!(kinds.contains(&LexErrorKind::NoExponentDigits));
        assert!(kinds.contains(&LexErrorKind::MultiCharRune));
        assert!(kinds.contains(&LexErrorKind::EmptyRune));
        assert!(kinds.contains(&LexErrorKind::UnknownEscape));
    }

    #[test]
    fn invalid_binary_digit() {
        let (_, errors) = tokenize("0b102");
        assert_eq!(
            errors[0].kind,
            LexErrorKind::InvalidDigit {
                digit: '2',
                literal: "binary"
            }
        );
    }

    #[test]
    fn unterminated_string() {
        let (_, errors) = tokenize("\"abc\nx");
        assert_eq!(errors[0].kind, LexErrorKind::NewlineInString);
        assert_eq!((errors[0].line, errors[0].col), (1, 1));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("a // trailing\n/* block */ b"),
            vec![Token::Name, Token::Semi, Token::Name, Token::Semi, Token::Eof]
        );
    }

    #[test]
    fn multiline_comment_acts_as_newline() {
        let (lexemes, _) = tokenize("a /* x\n y */ b");
        assert_eq!(lexemes[1].token, Token::Semi);
        assert_eq!(lexemes[1].text, "newline");
    }

    #[test]
    fn unterminated_comment() {
        let (_, errors) = tokenize("a /* never closed");
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedComment);
    }

    #[test]
    fn directive_comments_are_reported() {
        let mut s = Scanner::new("//line foo.jd:10\nx /*line bar.jd:3:4*/ y".as_bytes());
        let mut directives = Vec::new();
        loop {
            s.next();
            for r in s.take_reports() {
                if let Report::Directive { line, col, text } = r {
                    directives.push((line, col, text));
                }
            }
            if s.token() == Token::Eof {
                break;
            }
        }
        assert_eq!(
            directives,
            vec![
                (1, 1, "//line foo.jd:10".to_string()),
                (2, 3, "/*line bar.jd:3:4*/".to_string()),
            ]
        );
    }

    #[test]
    fn ordinary_comments_are_not_directives() {
        let mut s = Scanner::new("// lines of text\n/* linear */ x".as_bytes());
        s.next();
        assert!(s.take_reports().is_empty());
    }

    #[test]
    fn keywords_and_nlsemi() {
        let (lexemes, _) = tokenize("return\nbreak\nelse\n");
        let toks: Vec<_> = lexemes.iter().map(|l| l.token).collect();
        assert_eq!(
            toks,
            vec![
                Token::Return,
                Token::Semi,
                Token::Break,
                Token::Semi,
                Token::Else,
                Token::Eof
            ]
        );
    }

    #[test]
    fn invalid_character_is_skipped() {
        let (lexemes, errors) = tokenize("a @ b");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::InvalidCharacter('@'));
        assert_eq!(lexemes[1].token, Token::Name);
        assert_eq!(lexemes[1].text, "b");
    }

    #[test]
    fn unicode_identifiers() {
        let (lexemes, errors) = tokenize("größe := 1");
        assert!(errors.is_empty());
        assert_eq!(lexemes[0].text, "größe");
    }

    #[test]
    fn positions() {
        let (lexemes, _) = tokenize("module m\nvar x");
        assert_eq!((lexemes[0].line, lexemes[0].col), (1, 1));
        assert_eq!((lexemes[1].line, lexemes[1].col), (1, 8));
        assert_eq!((lexemes[3].line, lexemes[3].col), (2, 1));
        assert_eq!((lexemes[4].line, lexemes[4].col), (2, 5));
    }
}
