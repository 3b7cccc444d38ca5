//! Command line parsing.
//!
//! A raw line becomes a [`Command`]: a lower-cased name followed by typed
//! [`Argument`]s produced by the [`lexer`]. Handlers query the arguments
//! through the helpers on [`Command`] instead of walking the list.

mod lexer;

pub use lexer::{ArgKind, Argument, Lexer, tokenize};

use std::fmt;

use crate::core::path::is_name_char;

// =============================================================================
// Command
// =============================================================================

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Argument>,
}

impl Command {
    /// Parse one input line (without its line terminator).
    ///
    /// The name is the leading run of name characters; the arguments are
    /// tokenized from the first byte after it.
    pub fn parse(line: &[u8]) -> Self {
        let name_len = line.iter().take_while(|&&c| is_name_char(c)).count();
        let name = String::from_utf8_lossy(&line[..name_len]).to_ascii_lowercase();
        let args = if name_len == 0 {
            Vec::new()
        } else {
            tokenize(line, name_len)
        };
        Self { name, args }
    }

    /// Whether any flag argument contains `letter`, so `-rf` sets both
    /// `r` and `f`.
    pub fn has_flag(&self, letter: char) -> bool {
        self.flags().any(|f| f.contains(letter))
    }

    /// Value of the first flag spelled `<letter><number>`, e.g. `-c32` or
    /// `-f-1`.
    pub fn numeric_flag(&self, letter: char) -> Option<i64> {
        self.flags().find_map(|f| {
            let rest = f.strip_prefix(letter)?;
            let first = rest.chars().next()?;
            if !first.is_ascii_digit() && first != '-' {
                return None;
            }
            Some(leading_int(rest))
        })
    }

    /// Position of the first filename argument at or after `start`.
    pub fn filename_index(&self, start: usize) -> Option<usize> {
        self.args
            .iter()
            .skip(start)
            .find(|a| a.as_filename().is_some())
            .map(|a| a.index)
    }

    /// Text of the first filename argument at or after `start`.
    pub fn filename(&self, start: usize) -> Option<&str> {
        self.filename_index(start)
            .and_then(|i| self.args[i].as_filename())
    }

    pub fn count_filenames(&self) -> usize {
        self.args.iter().filter(|a| a.as_filename().is_some()).count()
    }

    /// Quoted string arguments in input order.
    pub fn quoted_strings(&self) -> impl Iterator<Item = &[u8]> {
        self.args.iter().filter_map(Argument::as_quoted)
    }

    fn flags(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(Argument::as_flag)
    }
}

/// Parse a signed integer prefix the way a lenient `toInt` would: digits
/// after an optional `-`, stopping at the first other character.
fn leading_int(s: &str) -> i64 {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });
    if negative { -value } else { value }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            match &arg.kind {
                ArgKind::Filename(s) => write!(f, " {}", s)?,
                ArgKind::Flag(s) => write!(f, " -{}", s)?,
                ArgKind::Quoted(bytes) => {
                    f.write_str(" \"")?;
                    for &b in bytes {
                        match b {
                            b'"' => f.write_str("\\\"")?,
                            b'\\' => f.write_str("\\\\")?,
                            b'\n' => f.write_str("\\n")?,
                            b'\r' => f.write_str("\\r")?,
                            b'\t' => f.write_str("\\t")?,
                            0x20..=0x7e => write!(f, "{}", b as char)?,
                            _ => write!(f, "\\x{:02x}", b)?,
                        }
                    }
                    f.write_str("\"")?;
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(s: &str) -> Command {
        Command::parse(s.as_bytes())
    }

    #[test]
    fn test_name_is_lowercased() {
        let c = cmd("LS /Data");
        assert_eq!(c.name, "ls");
        assert_eq!(c.args, vec![Argument::filename(0, "/Data")]);
    }

    #[test]
    fn test_name_stops_at_first_non_name_char() {
        let c = cmd("cat/etc");
        assert_eq!(c.name, "cat");
        assert_eq!(c.filename(0), Some("/etc"));
    }

    #[test]
    fn test_no_name() {
        let c = cmd("  ls");
        assert_eq!(c.name, "");
        assert!(c.args.is_empty());
    }

    #[test]
    fn test_has_flag_combined_letters() {
        let c = cmd("rm -rf dir");
        assert!(c.has_flag('r'));
        assert!(c.has_flag('f'));
        assert!(!c.has_flag('l'));
        // `-rf` does not start with a digit after `f`, so no numeric value.
        assert_eq!(c.numeric_flag('f'), None);
    }

    #[test]
    fn test_numeric_flags() {
        let c = cmd("cat -c32 -f-1 -l7x -n file");
        assert_eq!(c.numeric_flag('c'), Some(32));
        assert_eq!(c.numeric_flag('f'), Some(-1));
        assert_eq!(c.numeric_flag('l'), Some(7));
        assert_eq!(c.numeric_flag('n'), None);
        assert_eq!(c.numeric_flag('b'), None);
    }

    #[test]
    fn test_filename_lookup() {
        let c = cmd(r#"tee -a "one" first.txt "two" second.txt"#);
        assert_eq!(c.count_filenames(), 2);
        assert_eq!(c.filename_index(0), Some(2));
        assert_eq!(c.filename(3), Some("second.txt"));
        assert_eq!(c.filename(5), None);
        let strings: Vec<_> = c.quoted_strings().collect();
        assert_eq!(strings, vec![&b"one"[..], &b"two"[..]]);
    }

    #[test]
    fn test_display_reescapes() {
        let c = cmd(r#"tee -n "a\"b\n" f.txt"#);
        assert_eq!(c.to_string(), r#"tee -n "a\"b\n" f.txt"#);
    }
}
