use std::fmt;

/// Token classes produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Eof,

    // names and literals
    Name,
    Literal,

    // operators and operations
    /// Binary or unary operator; see [`Operator`].
    Op,
    /// `op=`
    AssignOp,
    /// `++` or `--`
    IncOp,
    /// `=`
    Assign,
    /// `:=`
    Define,
    /// `*`, kept apart from [`Token::Op`] because it is also a prefix.
    Star,

    // delimiters
    Lparen,
    Lbrack,
    Lbrace,
    Rparen,
    Rbrack,
    Rbrace,
    Comma,
    Semi,
    Colon,
    Dot,
    DotDotDot,

    // keywords
    Break,
    Else,
    For,
    Func,
    If,
    Import,
    Module,
    Oper,
    Return,
    Type,
    Var,
    While,
}

impl Token {
    /// Look up the keyword spelled `name`.
    #[must_use]
    pub fn keyword(name: &str) -> Option<Self> {
        let tok = match name {
            "break" => Self::Break,
            "else" => Self::Else,
            "for" => Self::For,
            "func" => Self::Func,
            "if" => Self::If,
            "import" => Self::Import,
            "module" => Self::Module,
            "oper" => Self::Oper,
            "return" => Self::Return,
            "type" => Self::Type,
            "var" => Self::Var,
            "while" => Self::While,
            _ => return None,
        };
        Some(tok)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Name => "name",
            Self::Literal => "literal",
            Self::Op => "op",
            Self::AssignOp => "op=",
            Self::IncOp => "opop",
            Self::Assign => "=",
            Self::Define => ":=",
            Self::Star => "*",
            Self::Lparen => "(",
            Self::Lbrack => "[",
            Self::Lbrace => "{",
            Self::Rparen => ")",
            Self::Rbrack => "]",
            Self::Rbrace => "}",
            Self::Comma => ",",
            Self::Semi => ";",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::DotDotDot => "...",
            Self::Break => "break",
            Self::Else => "else",
            Self::For => "for",
            Self::Func => "func",
            Self::If => "if",
            Self::Import => "import",
            Self::Module => "module",
            Self::Oper => "oper",
            Self::Return => "return",
            Self::Type => "type",
            Self::Var => "var",
            Self::While => "while",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a basic literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LitKind {
    Int,
    Float,
    Rune,
    String,
}

/// Operators carried by [`Token::Op`], [`Token::AssignOp`],
/// [`Token::IncOp`] and [`Token::Star`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `!`
    Not,

    /// `||`
    OrOr,

    /// `&&`
    AndAnd,

    // comparison
    Eql,
    Neq,
    Lss,
    Leq,
    Gtr,
    Geq,

    // additive
    Add,
    Sub,
    Or,
    Xor,

    // multiplicative
    Mul,
    Div,
    Rem,
    And,
    AndNot,
    Shl,
    Shr,
}

impl Operator {
    /// Binding strength for binary use; 0 for operators that are never
    /// binary.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Not => 0,
            Self::OrOr => 1,
            Self::AndAnd => 2,
            Self::Eql | Self::Neq | Self::Lss | Self::Leq | Self::Gtr | Self::Geq => 3,
            Self::Add | Self::Sub | Self::Or | Self::Xor => 4,
            Self::Mul | Self::Div | Self::Rem | Self::And | Self::AndNot | Self::Shl | Self::Shr => {
                5
            }
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::OrOr => "||",
            Self::AndAnd => "&&",
            Self::Eql => "==",
            Self::Neq => "!=",
            Self::Lss => "<",
            Self::Leq => "<=",
            Self::Gtr => ">",
            Self::Geq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::AndNot => "&^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator names accepted by `oper` declarations.
///
/// The `r`-prefixed forms are used when the user type is the right
/// operand (`1 + v` dispatches to `radd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverloadOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    RAdd,
    RSub,
    RMul,
    RDiv,
    RMod,
}

impl OverloadOp {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "add" => Self::Add,
            "sub" => Self::Sub,
            "mul" => Self::Mul,
            "div" => Self::Div,
            "mod" => Self::Mod,
            "radd" => Self::RAdd,
            "rsub" => Self::RSub,
            "rmul" => Self::RMul,
            "rdiv" => Self::RDiv,
            "rmod" => Self::RMod,
            _ => return None,
        };
        Some(op)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::RAdd => "radd",
            Self::RSub => "rsub",
            Self::RMul => "rmul",
            Self::RDiv => "rdiv",
            Self::RMod => "rmod",
        }
    }

    #[must_use]
    pub const fn is_reversed(self) -> bool {
        matches!(
            self,
            Self::RAdd | Self::RSub | Self::RMul | Self::RDiv | Self::RMod
        )
    }

    /// The binary operator this name overloads.
    #[must_use]
    pub const fn operator(self) -> Operator {
        match self {
            Self::Add | Self::RAdd => Operator::Add,
            Self::Sub | Self::RSub => Operator::Sub,
            Self::Mul | Self::RMul => Operator::Mul,
            Self::Div | Self::RDiv => Operator::Div,
            Self::Mod | Self::RMod => Operator::Rem,
        }
    }
}

impl fmt::Display for OverloadOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(Token::keyword("module"), Some(Token::Module));
        assert_eq!(Token::keyword("oper"), Some(Token::Oper));
        assert_eq!(Token::keyword("modules"), None);
        assert_eq!(Token::keyword("while"), Some(Token::While));
    }

    #[test]
    fn precedence_levels() {
        assert!(Operator::Mul.precedence() > Operator::Add.precedence());
        assert!(Operator::Add.precedence() > Operator::Lss.precedence());
        assert!(Operator::Lss.precedence() > Operator::AndAnd.precedence());
        assert!(Operator::AndAnd.precedence() > Operator::OrOr.precedence());
        assert_eq!(Operator::Not.precedence(), 0);
    }

    #[test]
    fn overload_names() {
        assert_eq!(OverloadOp::from_name("radd"), Some(OverloadOp::RAdd));
        assert!(OverloadOp::RAdd.is_reversed());
        assert_eq!(OverloadOp::Mod.operator(), Operator::Rem);
        assert_eq!(OverloadOp::from_name("pow"), None);
    }
}
