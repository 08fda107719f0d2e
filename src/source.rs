//! Incremental source buffer.
//!
//! Reads bytes from an [`io::Read`] on demand and decodes them one code point
//! at a time, tracking the (0-based) line and column of the current
//! character. The buffer is terminated by a sentinel byte so the common ASCII
//! case needs a single comparison per character.
//!
//! ```text
//!   buf [...read...|...segment...|ch|...unread...|s|...free...]
//!                  ^             ^  ^            ^
//!                  |             |  |            |
//!                  b             r-chw  r        e
//! ```

use std::io::{self, Read};

use crate::position::{COL_BASE, LINE_BASE};
use crate::scanner::{LexError, LexErrorKind, Report};

/// Terminates the valid bytes in the buffer. It is a UTF-8 continuation
/// byte, so it never decodes as a character by itself.
const SENTINEL: u8 = 0x80;

/// Maximum width of a UTF-8 encoded code point.
const UTF_MAX: usize = 4;

const BOM: char = '\u{feff}';

/// Minimum buffer size.
pub const MIN_BUFFER_SIZE: usize = 4 << 10;

/// Largest buffer size that is still doubled; beyond it the buffer grows
/// linearly by this amount.
pub const MAX_DOUBLING_SIZE: usize = 1 << 20;

/// Read attempts per fill before reporting that the reader makes no
/// progress.
const READ_ATTEMPTS: usize = 10;

/// Buffer growth policy: jump to `min`, double up to `max`, then add `max`.
#[must_use]
pub const fn grow(size: usize, min: usize, max: usize) -> usize {
    if size < min {
        return min;
    }
    if size <= max {
        return size << 1;
    }
    size + max
}

/// Next buffer size after `size` under the default limits.
#[must_use]
pub const fn next_size(size: usize) -> usize {
    grow(size, MIN_BUFFER_SIZE, MAX_DOUBLING_SIZE)
}

/// Pending condition of the underlying reader.
#[derive(Debug)]
enum ReadState {
    Eof,
    NoProgress,
    Failed(io::Error),
}

pub(crate) struct Source<R> {
    input: R,
    reports: Vec<Report>,

    buf: Vec<u8>,
    read_state: Option<ReadState>,
    /// Start of the active segment, if any.
    b: Option<usize>,
    /// Read offset.
    r: usize,
    /// End of valid bytes; `buf[e]` is the sentinel.
    e: usize,
    line: u32,
    col: u32,
    /// Most recently decoded character, `None` at end of input.
    ch: Option<char>,
    /// Width of `ch` in bytes.
    chw: usize,
}

impl<R: Read> Source<R> {
    pub(crate) fn new(input: R) -> Self {
        let mut buf = vec![0; next_size(0)];
        buf[0] = SENTINEL;
        Self {
            input,
            reports: Vec::new(),
            buf,
            read_state: None,
            b: None,
            r: 0,
            e: 0,
            line: 0,
            col: 0,
            ch: Some(' '),
            chw: 0,
        }
    }

    pub(crate) const fn ch(&self) -> Option<char> {
        self.ch
    }

    /// 1-based position of `ch`.
    pub(crate) const fn pos(&self) -> (u32, u32) {
        (LINE_BASE + self.line, COL_BASE + self.col)
    }

    pub(crate) fn error(&mut self, kind: LexErrorKind) {
        let (line, col) = self.pos();
        self.error_at(line, col, kind);
    }

    pub(crate) fn error_at(&mut self, line: u32, col: u32, kind: LexErrorKind) {
        self.reports.push(Report::Error(LexError { kind, line, col }));
    }

    pub(crate) fn report(&mut self, report: Report) {
        self.reports.push(report);
    }

    pub(crate) fn take_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }

    /// Starts a new active segment at `ch` (inclusive).
    pub(crate) const fn start(&mut self) {
        self.b = Some(self.r - self.chw);
    }

    pub(crate) const fn stop(&mut self) {
        self.b = None;
    }

    /// Bytes of the active segment, excluding `ch`.
    pub(crate) fn segment(&self) -> &[u8] {
        match self.b {
            Some(b) => &self.buf[b..self.r - self.chw],
            None => &[],
        }
    }

    /// Moves the read position back to the start of the active segment and
    /// re-reads its first character. The segment must not contain a
    /// newline, or the line/column bookkeeping goes wrong.
    ///
    /// # Panics
    ///
    /// Panics if no segment is active.
    pub(crate) fn rewind(&mut self) {
        let Some(b) = self.b else {
            panic!("rewind called without an active segment");
        };
        self.col = self.col.wrapping_sub((self.r - b) as u32);
        self.r = b;
        self.nextch();
    }

    /// Decodes the next character into `ch`.
    pub(crate) fn nextch(&mut self) {
        loop {
            self.col = self.col.wrapping_add(self.chw as u32);
            if self.ch == Some('\n') {
                self.line += 1;
                self.col = 0;
            }

            // fast path: ASCII
            let byte = self.buf[self.r];
            if byte < SENTINEL {
                self.r += 1;
                self.chw = 1;
                self.ch = Some(char::from(byte));
                if byte == 0 {
                    self.error(LexErrorKind::InvalidNul);
                    continue;
                }
                return;
            }

            while self.e - self.r < UTF_MAX
                && !full_rune(&self.buf[self.r..self.e])
                && self.read_state.is_none()
            {
                self.fill();
            }

            if self.r == self.e {
                match self.read_state.take() {
                    Some(ReadState::Eof) => self.read_state = Some(ReadState::Eof),
                    Some(ReadState::NoProgress) => self.error(LexErrorKind::NoProgress),
                    Some(ReadState::Failed(err)) => self.error(LexErrorKind::Io(err.to_string())),
                    None => {}
                }
                self.ch = None;
                self.chw = 0;
                return;
            }

            let (ch, width) = decode_rune(&self.buf[self.r..self.e]);
            self.r += width;
            self.chw = width;

            let Some(ch) = ch else {
                self.ch = Some(char::REPLACEMENT_CHARACTER);
                self.error(LexErrorKind::InvalidUtf8);
                continue;
            };
            self.ch = Some(ch);

            // a BOM is only allowed as the very first character
            if ch == BOM {
                if self.line > 0 || self.col > 0 {
                    self.error(LexErrorKind::InvalidBom);
                }
                continue;
            }
            return;
        }
    }

    /// Reads more bytes into the buffer. Returns with at least one more
    /// byte available or with `read_state` set.
    fn fill(&mut self) {
        // keep the active segment, or everything from the read offset
        let mut b = self.r;
        if let Some(start) = self.b {
            b = start;
            self.b = Some(0);
        }
        let len = self.e - b;

        if len * 2 > self.buf.len() {
            let mut grown = vec![0; next_size(self.buf.len())];
            grown[..len].copy_from_slice(&self.buf[b..self.e]);
            self.buf = grown;
        } else if b > 0 {
            self.buf.copy_within(b..self.e, 0);
        }
        self.r -= b;
        self.e -= b;

        for _ in 0..READ_ATTEMPTS {
            // leave room for the sentinel
            let end = self.buf.len() - 1;
            match self.input.read(&mut self.buf[self.e..end]) {
                Ok(0) => {
                    self.read_state = Some(ReadState::Eof);
                    self.buf[self.e] = SENTINEL;
                    return;
                }
                Ok(n) => {
                    self.e += n;
                    self.buf[self.e] = SENTINEL;
                    return;
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                    ) => {}
                Err(err) => {
                    self.read_state = Some(ReadState::Failed(err));
                    self.buf[self.e] = SENTINEL;
                    return;
                }
            }
        }

        self.buf[self.e] = SENTINEL;
        self.read_state = Some(ReadState::NoProgress);
    }
}

/// Encoded width announced by a UTF-8 leading byte, 0 if it cannot start a
/// character.
const fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 0,
    }
}

/// Reports whether `bytes` starts with a complete character or with an
/// encoding error that no further byte could repair.
fn full_rune(bytes: &[u8]) -> bool {
    let Some(&lead) = bytes.first() else {
        return false;
    };
    let width = utf8_width(lead);
    if width == 0 || bytes.len() >= width {
        return true;
    }
    bytes[1..].iter().any(|&c| c & 0xc0 != 0x80)
}

/// Decodes the first character of `bytes`. Invalid input decodes as `None`
/// with width 1.
fn decode_rune(bytes: &[u8]) -> (Option<char>, usize) {
    let width = utf8_width(bytes[0]);
    if width == 0 || bytes.len() < width {
        return (None, 1);
    }
    std::str::from_utf8(&bytes[..width])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or((None, 1), |ch| (Some(ch), width))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader handing out at most `chunk` bytes per call.
    struct Chunked<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Chunked<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Stalled;

    impl Read for Stalled {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::WouldBlock.into())
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    fn chars<R: Read>(src: &mut Source<R>) -> Vec<char> {
        let mut out = Vec::new();
        loop {
            src.nextch();
            match src.ch() {
                Some(c) => out.push(c),
                None => return out,
            }
        }
    }

    fn errors<R: Read>(src: &mut Source<R>) -> Vec<LexError> {
        src.take_reports()
            .into_iter()
            .filter_map(|r| match r {
                Report::Error(e) => Some(e),
                Report::Directive { .. } => None,
            })
            .collect()
    }

    #[test]
    fn decodes_multibyte_across_reads() {
        let text = "héllo, 世界 🦀";
        let mut src = Source::new(Chunked {
            data: text.as_bytes(),
            chunk: 1,
        });
        assert_eq!(chars(&mut src), text.chars().collect::<Vec<_>>());
        assert!(errors(&mut src).is_empty());
    }

    #[test]
    fn tracks_lines_and_columns() {
        let mut src = Source::new("ab\ncd".as_bytes());
        src.nextch();
        assert_eq!(src.pos(), (1, 1));
        src.nextch();
        assert_eq!(src.pos(), (1, 2));
        src.nextch(); // '\n'
        assert_eq!(src.pos(), (1, 3));
        src.nextch();
        assert_eq!(src.ch(), Some('c'));
        assert_eq!(src.pos(), (2, 1));
    }

    #[test]
    fn columns_count_bytes() {
        let mut src = Source::new("é!".as_bytes());
        src.nextch();
        src.nextch();
        assert_eq!(src.ch(), Some('!'));
        assert_eq!(src.pos(), (1, 3));
    }

    #[test]
    fn nul_is_reported_and_skipped() {
        let mut src = Source::new("a\0b".as_bytes());
        assert_eq!(chars(&mut src), vec!['a', 'b']);
        let errs = errors(&mut src);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, LexErrorKind::InvalidNul);
        assert_eq!((errs[0].line, errs[0].col), (1, 2));
    }

    #[test]
    fn invalid_utf8_resynchronizes() {
        let mut src = Source::new(&b"a\xffb\xe4\xb8"[..]);
        assert_eq!(chars(&mut src), vec!['a', 'b']);
        let errs = errors(&mut src);
        assert_eq!(errs.len(), 3);
        assert!(errs.iter().all(|e| e.kind == LexErrorKind::InvalidUtf8));
        assert_eq!(errs[0].col, 2);
        assert_eq!(errs[1].col, 4);
    }

    #[test]
    fn leading_bom_is_accepted() {
        let mut src = Source::new("\u{feff}ab".as_bytes());
        assert_eq!(chars(&mut src), vec!['a', 'b']);
        assert!(errors(&mut src).is_empty());
    }

    #[test]
    fn bom_in_the_middle_is_an_error() {
        let mut src = Source::new("a\u{feff}b".as_bytes());
        assert_eq!(chars(&mut src), vec!['a', 'b']);
        let errs = errors(&mut src);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, LexErrorKind::InvalidBom);
        assert_eq!(errs[0].col, 2);
    }

    #[test]
    fn segment_survives_buffer_growth() {
        let long = "a".repeat(3 * MIN_BUFFER_SIZE);
        let text = format!("b{long}c");
        let mut src = Source::new(Chunked {
            data: text.as_bytes(),
            chunk: 100,
        });
        src.nextch();
        assert_eq!(src.ch(), Some('b'));
        src.start();
        while src.ch() != Some('c') {
            src.nextch();
        }
        assert_eq!(src.segment(), format!("b{long}").as_bytes());
    }

    #[test]
    fn rewind_returns_to_segment_start() {
        let mut src = Source::new("..x".as_bytes());
        src.nextch();
        src.start();
        src.nextch();
        src.nextch();
        assert_eq!(src.ch(), Some('x'));
        src.rewind();
        assert_eq!(src.ch(), Some('.'));
        assert_eq!(src.pos(), (1, 1));
        src.nextch();
        assert_eq!(src.ch(), Some('.'));
        assert_eq!(src.pos(), (1, 2));
    }

    #[test]
    #[should_panic(expected = "active segment")]
    fn rewind_requires_segment() {
        let mut src = Source::new("x".as_bytes());
        src.nextch();
        src.rewind();
    }

    #[test]
    fn stalled_reader_reports_no_progress() {
        let mut src = Source::new(Stalled);
        src.nextch();
        assert_eq!(src.ch(), None);
        let errs = errors(&mut src);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, LexErrorKind::NoProgress);
    }

    #[test]
    fn failing_reader_reports_io_error() {
        let mut src = Source::new(Broken);
        src.nextch();
        assert_eq!(src.ch(), None);
        let errs = errors(&mut src);
        assert_eq!(errs[0].kind, LexErrorKind::Io("disk on fire".to_string()));
    }

    #[test]
    fn growth_policy() {
        assert_eq!(next_size(0), MIN_BUFFER_SIZE);
        assert_eq!(next_size(MIN_BUFFER_SIZE), 2 * MIN_BUFFER_SIZE);
        assert_eq!(next_size(MAX_DOUBLING_SIZE), 2 * MAX_DOUBLING_SIZE);
        assert_eq!(
            next_size(2 * MAX_DOUBLING_SIZE),
            3 * MAX_DOUBLING_SIZE
        );
    }
}
