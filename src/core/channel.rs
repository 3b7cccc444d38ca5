//! Bounded line input.
//!
//! Lines are collected into a buffer of fixed capacity. A line that does not
//! fit is dropped as a whole instead of being cut and executed.

use std::io::{self, BufRead};

/// One unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A non-empty line without its terminator.
    Line(Vec<u8>),
    /// A line that did not fit the buffer; already discarded.
    TooLong,
    /// The channel is closed.
    End,
}

/// Reads LF terminated lines from a byte channel.
pub struct LineChannel<R: BufRead> {
    reader: R,
    capacity: usize,
}

impl<R: BufRead> LineChannel<R> {
    pub fn new(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            capacity: capacity.max(1),
        }
    }

    /// Next line, skipping empty ones. A trailing CR is removed.
    pub fn next_input(&mut self) -> io::Result<Input> {
        loop {
            let mut line = Vec::with_capacity(self.capacity);
            let mut overflow = false;
            let mut saw_data = false;
            loop {
                let available = self.reader.fill_buf()?;
                if available.is_empty() {
                    if !saw_data {
                        return Ok(Input::End);
                    }
                    break;
                }
                saw_data = true;
                let (part, consumed, done) = match available.iter().position(|&b| b == b'\n') {
                    Some(i) => (&available[..i], i + 1, true),
                    None => (available, available.len(), false),
                };
                if !overflow {
                    // One byte over is kept until it is known whether it is a CR.
                    if line.len() + part.len() > self.capacity {
                        overflow = true;
                        line.clear();
                    } else {
                        line.extend_from_slice(part);
                    }
                }
                self.reader.consume(consumed);
                if done {
                    break;
                }
            }

            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if overflow || line.len() >= self.capacity {
                log::debug!("dropped input line longer than {} bytes", self.capacity);
                return Ok(Input::TooLong);
            }
            if !line.is_empty() {
                return Ok(Input::Line(line));
            }
        }
    }
}
