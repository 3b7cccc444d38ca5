//! Argument tokenizer.
//!
//! A single left-to-right scan over the bytes after the command name with
//! four states:
//! - idle, between arguments
//! - filename, a bare path token
//! - flag, text after a `-`
//! - quoted string, with backslash escapes
//!
//! Bytes that cannot start an argument are dropped. A token closed by a
//! boundary byte hands that byte back to the idle rules.

use crate::core::path::{is_name_char, is_path_char};

// =============================================================================
// Argument Types
// =============================================================================

/// Typed payload of an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    /// Bare path token; never empty, only path characters.
    Filename(String),
    /// Flag text without the leading `-`; never empty.
    Flag(String),
    /// Decoded content of a `"..."` string; may be empty.
    Quoted(Vec<u8>),
}

/// One argument together with its position in the argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub index: usize,
    pub kind: ArgKind,
}

impl Argument {
    pub fn filename(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            kind: ArgKind::Filename(text.into()),
        }
    }

    pub fn flag(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            kind: ArgKind::Flag(text.into()),
        }
    }

    pub fn quoted(index: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            index,
            kind: ArgKind::Quoted(bytes.into()),
        }
    }

    pub fn as_filename(&self) -> Option<&str> {
        match &self.kind {
            ArgKind::Filename(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<&str> {
        match &self.kind {
            ArgKind::Flag(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_quoted(&self) -> Option<&[u8]> {
        match &self.kind {
            ArgKind::Quoted(b) => Some(b),
            _ => None,
        }
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Filename,
    Flag,
    Quoted { escape: bool },
}

fn is_flag_char(c: u8) -> bool {
    is_name_char(c)
}

/// Tokenizer over a fixed input buffer.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    state: State,
    token: Vec<u8>,
    args: Vec<Argument>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer that starts scanning at `start`.
    pub fn new(input: &'a [u8], start: usize) -> Self {
        Self {
            input,
            pos: start.min(input.len()),
            state: State::Idle,
            token: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Scan the rest of the input and return the arguments in order.
    pub fn tokenize(mut self) -> Vec<Argument> {
        while let Some(&c) = self.input.get(self.pos) {
            self.pos += 1;
            self.step(c);
        }
        self.finish();
        self.args
    }

    fn step(&mut self, c: u8) {
        match self.state {
            State::Idle => self.start_token(c),
            State::Filename => {
                if is_path_char(c) {
                    self.token.push(c);
                } else {
                    self.close();
                    self.start_token(c);
                }
            }
            State::Flag => {
                if is_flag_char(c) {
                    self.token.push(c);
                } else {
                    self.close();
                    self.start_token(c);
                }
            }
            State::Quoted { escape: true } => {
                match c {
                    b'"' | b'\\' => self.token.push(c),
                    b'n' => self.token.push(b'\n'),
                    b'r' => self.token.push(b'\r'),
                    b't' => self.token.push(b'\t'),
                    other => self.token.extend_from_slice(&[b'\\', other]),
                }
                self.state = State::Quoted { escape: false };
            }
            State::Quoted { escape: false } => match c {
                b'\\' => self.state = State::Quoted { escape: true },
                b'"' => self.close(),
                _ => self.token.push(c),
            },
        }
    }

    /// Idle rules: decide what, if anything, `c` opens.
    fn start_token(&mut self, c: u8) {
        self.state = match c {
            b'"' => State::Quoted { escape: false },
            b'-' => State::Flag,
            c if is_path_char(c) => {
                self.token.push(c);
                State::Filename
            }
            _ => State::Idle,
        };
    }

    /// Emit the pending token. Empty filenames and flags are dropped; quoted
    /// strings are always emitted.
    fn close(&mut self) {
        let token = std::mem::take(&mut self.token);
        let index = self.args.len();
        let arg = match self.state {
            State::Idle => None,
            State::Filename | State::Flag if token.is_empty() => None,
            // Only path characters were pushed, so the bytes are ASCII.
            State::Filename => Some(Argument::filename(index, ascii(token))),
            State::Flag => Some(Argument::flag(index, ascii(token))),
            State::Quoted { .. } => Some(Argument::quoted(index, token)),
        };
        self.args.extend(arg);
        self.state = State::Idle;
    }

    fn finish(&mut self) {
        if self.state == (State::Quoted { escape: true }) {
            self.token.push(b'\\');
        }
        self.close();
    }
}

fn ascii(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Tokenize `buffer` from `start` to the end.
pub fn tokenize(buffer: &[u8], start: usize) -> Vec<Argument> {
    Lexer::new(buffer, start).tokenize()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lex(s: &str) -> Vec<Argument> {
        tokenize(s.as_bytes(), 0)
    }

    #[test]
    fn test_flag_quoted_filename() {
        assert_eq!(
            lex(r#"-rf "a\"b" file.txt"#),
            vec![
                Argument::flag(0, "rf"),
                Argument::quoted(1, b"a\"b".to_vec()),
                Argument::filename(2, "file.txt"),
            ]
        );
    }

    #[test]
    fn test_escape_newline() {
        let args = lex(r#""a\nb""#);
        assert_eq!(args, vec![Argument::quoted(0, b"a\nb".to_vec())]);
        assert_eq!(args[0].as_quoted().unwrap().len(), 3);
    }

    #[test]
    fn test_unknown_escape_is_kept() {
        assert_eq!(lex(r#""\q""#), vec![Argument::quoted(0, b"\\q".to_vec())]);
    }

    #[test]
    fn test_all_escapes() {
        assert_eq!(
            lex(r#""\r\t\\""#),
            vec![Argument::quoted(0, b"\r\t\\".to_vec())]
        );
    }

    #[test]
    fn test_empty_quoted_is_emitted() {
        assert_eq!(
            lex(r#""" x"#),
            vec![Argument::quoted(0, Vec::new()), Argument::filename(1, "x")]
        );
    }

    #[test]
    fn test_lone_dash_is_dropped() {
        assert_eq!(lex("- a"), vec![Argument::filename(0, "a")]);
    }

    #[test]
    fn test_unterminated_quote_is_flushed() {
        assert_eq!(lex(r#""abc"#), vec![Argument::quoted(0, b"abc".to_vec())]);
        assert_eq!(lex(r#"""#), vec![Argument::quoted(0, Vec::new())]);
    }

    #[test]
    fn test_trailing_backslash_is_literal() {
        assert_eq!(lex(r#""ab\"#), vec![Argument::quoted(0, b"ab\\".to_vec())]);
    }

    #[test]
    fn test_boundary_reenters_idle() {
        // The quote that ends the filename opens a string right away.
        assert_eq!(
            lex(r#"name"text""#),
            vec![
                Argument::filename(0, "name"),
                Argument::quoted(1, b"text".to_vec()),
            ]
        );
        // A `-` inside a filename is a path character, not a flag opener.
        assert_eq!(lex("a-b"), vec![Argument::filename(0, "a-b")]);
    }

    #[test]
    fn test_junk_is_discarded() {
        assert_eq!(
            lex("  ~a_b  "),
            vec![Argument::filename(0, "a"), Argument::filename(1, "b")]
        );
    }

    #[test]
    fn test_numeric_flags_and_paths() {
        assert_eq!(
            lex("-c32 -f-1 ../dir/x.bin"),
            vec![
                Argument::flag(0, "c32"),
                Argument::flag(1, "f-1"),
                Argument::filename(2, "../dir/x.bin"),
            ]
        );
    }

    #[test]
    fn test_start_offset() {
        assert_eq!(tokenize(b"ls dir", 2), vec![Argument::filename(0, "dir")]);
        assert!(tokenize(b"ls", 10).is_empty());
    }

    proptest! {
        #[test]
        fn prop_bare_tokens_never_empty(input in proptest::collection::vec(any::<u8>(), 0..64)) {
            let args = tokenize(&input, 0);
            for (i, arg) in args.iter().enumerate() {
                prop_assert_eq!(arg.index, i);
                match &arg.kind {
                    ArgKind::Filename(s) => {
                        prop_assert!(!s.is_empty());
                        prop_assert!(s.bytes().all(is_path_char));
                    }
                    ArgKind::Flag(s) => prop_assert!(!s.is_empty()),
                    ArgKind::Quoted(_) => {}
                }
            }
        }
    }
}
