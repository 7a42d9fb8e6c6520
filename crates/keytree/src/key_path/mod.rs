//! composite configuration keys
//!
//! A [KeyPath] is a single text buffer such as `server.host(1)[@port]` which describes a path of
//! [Segment]s through a configuration tree.
//!
//! | **syntax**   | **meaning**                                     |
//! |--------------|-------------------------------------------------|
//! | `a.b`        | segment `b` nested in segment `a`               |
//! | `a..b`       | a single segment named `a.b` (escaped `.`)      |
//! | `a[@b]`      | element `a` with attribute `b`                  |
//! | `a(2)`       | the third `a` element (index `2`)               |
//!
//! Malformed decoration never fails: an unmatched `[@` or non-numeric `(...)` is plain text.
mod iter;
pub use iter::{KeyPathIter, Segment};

use std::fmt::Formatter;

/// Separates segments
pub const DELIMITER: char = '.';
/// A literal `.` inside a segment name
pub const ESCAPED_DELIMITER: &str = "..";
/// Opens an attribute segment
pub const ATTRIBUTE_START: &str = "[@";
/// Closes an attribute segment
pub const ATTRIBUTE_END: &str = "]";
/// Opens the index of an element segment
pub const INDEX_START: char = '(';
/// Closes the index of an element segment
pub const INDEX_END: char = ')';

/// Misuse of a [KeyPathIter]
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPathError {
    #[error("No more key segments")]
    Exhausted,
    #[error("Key path iterators are read-only")]
    Unsupported,
}

/// Owned, mutable composite key
///
/// The buffer never ends in an unescaped [DELIMITER]. Equality and hashing use the normalized text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub struct KeyPath {
    buffer: String,
}

impl KeyPath {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a key from text, dropping trailing unescaped delimiters
    pub fn parse(text: impl Into<String>) -> Self {
        let mut key = Self {
            buffer: text.into(),
        };
        key.remove_trailing_delimiters();
        key
    }

    /// Append a name, inserting a delimiter where needed
    ///
    /// `name` may itself contain delimiters. No delimiter is inserted in front of an attribute
    /// key (`[@...]`).
    pub fn append(&mut self, name: &str) -> &mut Self {
        if !self.buffer.is_empty() && !self.has_trailing_delimiter() && !is_attribute_key(name) {
            self.buffer.push(DELIMITER);
        }

        self.buffer.push_str(name);
        self.remove_trailing_delimiters();
        self
    }

    pub fn append_index(&mut self, index: usize) -> &mut Self {
        self.buffer.push(INDEX_START);
        self.buffer.push_str(&index.to_string());
        self.buffer.push(INDEX_END);
        self
    }

    pub fn append_attribute(&mut self, name: &str) -> &mut Self {
        self.buffer.push_str(&construct_attribute_key(name));
        self
    }

    /// Append a parsed segment so that it tokenizes back to the same segment
    pub fn append_segment(&mut self, segment: &Segment) -> &mut Self {
        if segment.is_attribute {
            return self.append_attribute(&segment.name);
        }

        self.append(&escape_delimiters(&segment.name));
        if let Some(index) = segment.index {
            self.append_index(index);
        }
        self
    }

    /// Cut the buffer down to `len` bytes
    ///
    /// Rounds down to a character boundary. Longer lengths are ignored.
    pub fn truncate(&mut self, len: usize) -> &mut Self {
        if len < self.buffer.len() {
            let mut boundary = len;
            while !self.buffer.is_char_boundary(boundary) {
                boundary -= 1;
            }
            self.buffer.truncate(boundary);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Is the whole key a single attribute (`[@name]`)?
    pub fn is_attribute_key(&self) -> bool {
        is_attribute_key(&self.buffer)
    }

    pub fn iter(&self) -> KeyPathIter<'_> {
        KeyPathIter::new(&self.buffer)
    }

    /// Longest prefix on which both keys agree segment by segment
    ///
    /// Two segments agree when name, index and attribute-ness are all equal.
    pub fn common_key(&self, other: &KeyPath) -> KeyPath {
        let mut result = KeyPath::empty();
        for (mine, theirs) in self.iter().zip(other.iter()) {
            if mine != theirs {
                break;
            }
            result.append_segment(&mine);
        }
        result
    }

    /// Remainder of `other` beyond its common prefix with `self`
    ///
    /// `other` is equivalent to `self.common_key(other)` followed by this key.
    pub fn difference_key(&self, other: &KeyPath) -> KeyPath {
        let shared = self
            .iter()
            .zip(other.iter())
            .take_while(|(mine, theirs)| mine == theirs)
            .count();

        let mut cursor = other.iter();
        for _ in 0..shared {
            cursor.advance();
        }

        let rest = &other.buffer[cursor.position()..];
        let rest = &rest[leading_delimiters(rest)..];
        if rest.is_empty() {
            return KeyPath::empty();
        }

        KeyPath::parse(rest)
    }

    /// An odd number of trailing delimiters ends in an unescaped one
    fn has_trailing_delimiter(&self) -> bool {
        let count = self
            .buffer
            .chars()
            .rev()
            .take_while(|c| *c == DELIMITER)
            .count();
        count % 2 != 0
    }

    fn remove_trailing_delimiters(&mut self) {
        while self.has_trailing_delimiter() {
            self.buffer.pop();
        }
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.buffer)
    }
}

impl std::str::FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(KeyPath::parse(s))
    }
}

impl From<&str> for KeyPath {
    fn from(value: &str) -> Self {
        KeyPath::parse(value)
    }
}

impl From<String> for KeyPath {
    fn from(value: String) -> Self {
        KeyPath::parse(value)
    }
}

impl From<KeyPath> for String {
    fn from(value: KeyPath) -> Self {
        value.buffer
    }
}

impl<'k> IntoIterator for &'k KeyPath {
    type Item = Segment;
    type IntoIter = KeyPathIter<'k>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Does `text` look like `[@name]`?
pub fn is_attribute_key(text: &str) -> bool {
    text.starts_with(ATTRIBUTE_START) && text.ends_with(ATTRIBUTE_END)
}

/// `name` -> `[@name]`
pub fn construct_attribute_key(name: &str) -> String {
    format!("{ATTRIBUTE_START}{name}{ATTRIBUTE_END}")
}

/// `[@name]` -> `name`, anything else is returned unchanged
pub fn attribute_name(text: &str) -> &str {
    if !is_attribute_key(text) {
        return text;
    }

    &text[ATTRIBUTE_START.len()..text.len() - ATTRIBUTE_END.len()]
}

/// Byte length of the unescaped delimiters at the start of `text`
///
/// A leading [ESCAPED_DELIMITER] is the start of a name and is not counted.
fn leading_delimiters(text: &str) -> usize {
    let mut offset = 0;
    while text[offset..].starts_with(DELIMITER) && !text[offset..].starts_with(ESCAPED_DELIMITER) {
        offset += DELIMITER.len_utf8();
    }
    offset
}

/// Double every delimiter so `name` stays a single segment
pub fn escape_delimiters(name: &str) -> String {
    name.replace(DELIMITER, ESCAPED_DELIMITER)
}
