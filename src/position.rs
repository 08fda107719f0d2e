//! Source positions and position bases.
//!
//! A [`Pos`] records the physical line and column of a token together with
//! the [`PosBase`] in effect when it was scanned. Line directives install a
//! new line base, so the *relative* position reported to users can differ
//! from the physical one.

use std::fmt;
use std::rc::Rc;

/// First line number.
pub const LINE_BASE: u32 = 1;
/// First column number.
pub const COL_BASE: u32 = 1;
/// Largest line or column accepted in a line directive.
pub const POS_MAX: u32 = 1 << 30;

/// Origin that positions are reported relative to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PosBase {
    filename: String,
    anchor_line: u32,
    anchor_col: u32,
    line: u32,
    col: u32,
}

impl PosBase {
    /// Base for a physical file; relative and physical positions coincide.
    #[must_use]
    pub fn file(filename: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            filename: filename.into(),
            anchor_line: LINE_BASE,
            anchor_col: COL_BASE,
            line: LINE_BASE,
            col: COL_BASE,
        })
    }

    /// Base introduced by a line directive: the physical position `at`
    /// reports as `filename:line:col`. A `col` of 0 means the column is
    /// unknown.
    #[must_use]
    pub fn line_base(at: &Pos, filename: impl Into<String>, line: u32, col: u32) -> Rc<Self> {
        Rc::new(Self {
            filename: filename.into(),
            anchor_line: at.line,
            anchor_col: at.col,
            line,
            col,
        })
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Logical line at the anchor.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Logical column at the anchor, 0 if unknown.
    #[must_use]
    pub const fn col(&self) -> u32 {
        self.col
    }
}

/// Physical position plus the base it is reported against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    base: Rc<PosBase>,
    line: u32,
    col: u32,
}

impl Pos {
    #[must_use]
    pub const fn new(base: Rc<PosBase>, line: u32, col: u32) -> Self {
        Self { base, line, col }
    }

    #[must_use]
    pub const fn base(&self) -> &Rc<PosBase> {
        &self.base
    }

    /// Physical line.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Physical column (in bytes).
    #[must_use]
    pub const fn col(&self) -> u32 {
        self.col
    }

    #[must_use]
    pub fn rel_filename(&self) -> &str {
        self.base.filename()
    }

    #[must_use]
    pub fn rel_line(&self) -> u32 {
        let b = &self.base;
        b.line + self.line.saturating_sub(b.anchor_line)
    }

    /// Relative column; 0 if the base column is unknown.
    #[must_use]
    pub fn rel_col(&self) -> u32 {
        let b = &self.base;
        if b.col == 0 {
            return 0;
        }
        if self.line == b.anchor_line {
            return b.col + self.col.saturating_sub(b.anchor_col);
        }
        self.col
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, col) = (self.rel_line(), self.rel_col());
        if col == 0 {
            write!(f, "{}:{line}", self.rel_filename())
        } else {
            write!(f, "{}:{line}:{col}", self.rel_filename())
        }
    }
}
