//! Scanner, parser and printer for the jindo language.
//!
//! Source bytes are decoded incrementally from any [`std::io::Read`],
//! classified into tokens with Go-style automatic statement separators, and
//! parsed by an error-tolerant recursive-descent parser into a typed syntax
//! tree.
//!
//! # Quick start
//!
//! ## Parse and re-format a file
//!
//! ```
//! use jindo_syntax::{format, parse_str};
//!
//! let file = parse_str("hello.jd", "module m; var x = 1;").unwrap();
//! assert_eq!(file.space_name.value, "m");
//! assert_eq!(format(&file), "module m\n\nvar x = 1\n");
//! ```
//!
//! ## Collect every diagnostic
//!
//! ```
//! use jindo_syntax::parse_collect;
//!
//! let (file, errors) = parse_collect("bad.jd", "module m\n5\nvar y = 2\n");
//! assert_eq!(file.unwrap().decls.len(), 1);
//! assert_eq!(errors.len(), 1);
//! assert!(errors[0].msg.contains("non-declaration statement"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod parser;
pub mod position;
pub mod printer;
pub mod scanner;
pub mod source;
pub mod token;

pub use ast::{BasicLit, BlockStmt, Decl, Expr, Field, File, Group, Name, Stmt};
pub use parser::{ErrorHandler, Parser, SyntaxError, parse, parse_collect, parse_str};
pub use position::{Pos, PosBase};
pub use printer::{format, format_expr, format_stmt};
pub use scanner::{LexError, LexErrorKind, Lexeme, Report, Scanner, tokenize};
pub use token::{LitKind, Operator, OverloadOp, Token};

/// Fatal outcome of a parse run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The file does not start with `module name`.
    #[error("{pos}: expecting module header, found {found}")]
    MissingHeader { pos: Pos, found: String },
    /// A diagnostic was raised while no handler was registered.
    #[error("{0}")]
    Aborted(#[from] SyntaxError),
}
