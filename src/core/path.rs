//! Virtual working-path model.
//!
//! A [`VirtualPath`] is a normalized list of segments. It never contains
//! empty, `.` or `..` segments and always renders with a leading `/`.

use std::fmt;

/// Characters allowed inside a single path segment.
pub fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'.'
}

/// Characters allowed anywhere in a user supplied path.
pub fn is_path_char(c: u8) -> bool {
    is_name_char(c) || c == b'/'
}

/// A non-empty string made only of path characters.
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && path.bytes().all(is_path_char)
}

/// Normalized absolute location inside the mounted filesystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// The filesystem root, `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path as if it were typed at the root.
    pub fn parse(path: &str) -> Self {
        Self::root().resolve(path)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing directory. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// A child entry of this path. `name` must be a single valid segment.
    pub fn join(&self, name: &str) -> Self {
        self.resolve(name.trim_start_matches('/'))
    }

    /// Returns a new path with `user_path` applied on top of this one.
    ///
    /// An empty or malformed `user_path` yields an unchanged copy. A leading
    /// `/` replaces every segment; anything else is appended.
    pub fn resolve(&self, user_path: &str) -> Self {
        let mut path = self.clone();
        path.adjust(user_path);
        path
    }

    /// Applies `user_path` in place. See [`VirtualPath::resolve`].
    ///
    /// Each `..` removes itself together with the closest real segment
    /// before it.
    pub fn adjust(&mut self, user_path: &str) {
        if !is_valid_path(user_path) {
            return;
        }
        if user_path.starts_with('/') {
            self.segments.clear();
        }
        for part in user_path.split('/') {
            match part {
                "" | "." => {}
                // A `..` with nothing before it only removes itself.
                ".." => {
                    self.segments.pop();
                }
                _ => self.segments.push(part.to_string()),
            }
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
