use super::{
    construct_attribute_key, leading_delimiters, KeyPathError, ATTRIBUTE_END, ATTRIBUTE_START,
    DELIMITER, INDEX_END, INDEX_START,
};
use std::borrow::Cow;

/// One component of a [super::KeyPath]
///
/// An attribute segment never carries an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Segment {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub is_attribute: bool,
}

impl Segment {
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
            is_attribute: false,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
            is_attribute: false,
        }
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
            is_attribute: true,
        }
    }

    /// Name with attribute markers (`[@name]`) for attributes, the plain name otherwise
    pub fn decorated_name(&self) -> Cow<'_, str> {
        if self.is_attribute {
            Cow::Owned(construct_attribute_key(&self.name))
        } else {
            Cow::Borrowed(&self.name)
        }
    }
}

/// Read-only cursor over the segments of a [super::KeyPath]
///
/// Cloning yields an independent cursor at the same position.
#[derive(Debug, Clone)]
pub struct KeyPathIter<'k> {
    buffer: &'k str,
    start: usize,
    end: usize,
    current: Option<Segment>,
}

impl<'k> KeyPathIter<'k> {
    pub(crate) fn new(buffer: &'k str) -> Self {
        Self {
            buffer,
            start: 0,
            end: 0,
            current: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.end < self.buffer.len()
    }

    /// Advance to the next segment and return its name
    pub fn next_key(&mut self, decorated: bool) -> Result<Cow<'_, str>, KeyPathError> {
        if !self.has_next() {
            return Err(KeyPathError::Exhausted);
        }

        self.advance();
        self.current_key(decorated)
    }

    /// Name of the segment returned by the last [Self::next_key]
    pub fn current_key(&self, decorated: bool) -> Result<Cow<'_, str>, KeyPathError> {
        let segment = self.current.as_ref().ok_or(KeyPathError::Exhausted)?;

        if decorated {
            Ok(segment.decorated_name())
        } else {
            Ok(Cow::Borrowed(&segment.name))
        }
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        self.current.as_ref()
    }

    pub fn is_attribute(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.is_attribute)
    }

    pub fn has_index(&self) -> bool {
        self.index().is_some()
    }

    pub fn index(&self) -> Option<usize> {
        self.current.as_ref().and_then(|s| s.index)
    }

    /// Key paths cannot be modified through their iterator
    pub fn remove(&mut self) -> Result<(), KeyPathError> {
        Err(KeyPathError::Unsupported)
    }

    /// Byte offset just past the current segment
    pub(crate) fn position(&self) -> usize {
        self.end
    }

    pub(crate) fn advance(&mut self) -> &Segment {
        let len = self.buffer.len();

        // skip separators, an escaped delimiter starts the name
        self.start = self.end + leading_delimiters(&self.buffer[self.end..]);

        let segment = if self.start >= len {
            self.end = len;
            Segment::element("")
        } else if let Some((name, end)) = self.attribute_at(self.start) {
            self.end = end;
            Segment::attribute(name)
        } else {
            let (name, end) = self.element_at(self.start);
            self.end = end;
            match split_index(&name) {
                Some((base, index)) => Segment::indexed(base, index),
                None => Segment::element(name),
            }
        };

        tracing::trace!(start = self.start, end = self.end, ?segment, "segment parsed");
        self.current.insert(segment)
    }

    /// A well-formed `[@name]` starting at `start`
    fn attribute_at(&self, start: usize) -> Option<(&'k str, usize)> {
        let buffer = self.buffer;
        let rest = buffer[start..].strip_prefix(ATTRIBUTE_START)?;
        let close = rest.find(ATTRIBUTE_END)?;

        let name_start = start + ATTRIBUTE_START.len();
        let name_end = name_start + close;
        Some((&buffer[name_start..name_end], name_end + ATTRIBUTE_END.len()))
    }

    /// An element name up to the next unescaped delimiter or attribute
    fn element_at(&self, start: usize) -> (String, usize) {
        let limit = self.buffer[start..]
            .match_indices(ATTRIBUTE_START)
            .map(|(offset, _)| start + offset)
            .find(|&pos| pos > start && self.attribute_at(pos).is_some())
            .unwrap_or(self.buffer.len());

        let text = &self.buffer[start..limit];
        let mut name = String::with_capacity(text.len());
        let mut chars = text.char_indices().peekable();
        while let Some((offset, c)) = chars.next() {
            if c == DELIMITER && chars.next_if(|(_, next)| *next == DELIMITER).is_none() {
                return (name, start + offset);
            }
            name.push(c);
        }

        (name, limit)
    }
}

/// `name(12)` -> `("name", 12)`
///
/// Only a trailing, all-digit index counts. Anything else stays part of the name.
fn split_index(name: &str) -> Option<(&str, usize)> {
    let inner = name.strip_suffix(INDEX_END)?;
    let open = inner.rfind(INDEX_START)?;
    if open == 0 {
        return None;
    }

    let digits = &inner[open + INDEX_START.len_utf8()..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some((&name[..open], digits.parse().ok()?))
}

impl Iterator for KeyPathIter<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }

        Some(self.advance().clone())
    }
}

impl std::iter::FusedIterator for KeyPathIter<'_> {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key_path::KeyPath;
    use pretty_assertions::assert_eq;

    fn segments(text: &str) -> Vec<Segment> {
        KeyPath::parse(text).iter().collect()
    }

    #[test]
    fn plain_segments() {
        assert_eq!(
            segments("a.b.c"),
            vec![
                Segment::element("a"),
                Segment::element("b"),
                Segment::element("c")
            ]
        );
        assert_eq!(segments(""), vec![]);
    }

    #[test]
    fn escaped_delimiter() {
        let key = KeyPath::parse("a..b");
        let mut it = key.iter();

        assert_eq!(it.next_key(false).unwrap(), "a.b");
        assert!(!it.has_next());
    }

    #[test]
    fn escaped_delimiter_before_separator() {
        assert_eq!(
            segments("a...b"),
            vec![Segment::element("a."), Segment::element("b")]
        );
    }

    #[test]
    fn consecutive_leading_delimiters_are_skipped() {
        assert_eq!(segments(".a"), vec![Segment::element("a")]);
        assert_eq!(
            segments("a.[@b]"),
            vec![Segment::element("a"), Segment::attribute("b")]
        );
    }

    #[test]
    fn escaped_leading_delimiter() {
        assert_eq!(segments("..a"), vec![Segment::element(".a")]);
        assert_eq!(segments(".."), vec![Segment::element(".")]);
        assert_eq!(
            segments("..a...b"),
            vec![Segment::element(".a."), Segment::element("b")]
        );
        assert_eq!(
            segments("a[@x]..b"),
            vec![
                Segment::element("a"),
                Segment::attribute("x"),
                Segment::element(".b")
            ]
        );
    }

    #[test]
    fn index() {
        let mut key = KeyPath::empty();
        key.append("a").append_index(3);

        let mut it = key.iter();
        it.next_key(false).unwrap();
        assert_eq!(it.current_key(false).unwrap(), "a");
        assert!(it.has_index());
        assert_eq!(it.index(), Some(3));
        assert!(!it.is_attribute());
    }

    #[test]
    fn non_numeric_index_is_literal() {
        assert_eq!(
            segments("f(x).g().(1).h(1)2"),
            vec![
                Segment::element("f(x)"),
                Segment::element("g()"),
                Segment::element("(1)"),
                Segment::element("h(1)2"),
            ]
        );
    }

    #[test]
    fn oversized_index_is_literal() {
        let text = "a(99999999999999999999999999)";
        assert_eq!(segments(text), vec![Segment::element(text)]);
    }

    #[test]
    fn attributes() {
        assert_eq!(
            segments("a.b[@c].[@d]"),
            vec![
                Segment::element("a"),
                Segment::element("b"),
                Segment::attribute("c"),
                Segment::attribute("d"),
            ]
        );
    }

    #[test]
    fn attribute_is_opaque() {
        assert_eq!(
            segments("a[@x.y(1)].b"),
            vec![
                Segment::element("a"),
                Segment::attribute("x.y(1)"),
                Segment::element("b"),
            ]
        );
    }

    #[test]
    fn unmatched_attribute_marker_is_literal() {
        assert_eq!(
            segments("a[@b.c"),
            vec![Segment::element("a[@b"), Segment::element("c")]
        );
        assert_eq!(segments("[@b"), vec![Segment::element("[@b")]);
    }

    #[test]
    fn indexed_element_with_attribute() {
        assert_eq!(
            segments("a(2)[@b]"),
            vec![Segment::indexed("a", 2), Segment::attribute("b")]
        );
    }

    #[test]
    fn decorated_names() {
        let key = KeyPath::parse("a.[@b]");
        let mut it = key.iter();

        assert_eq!(it.next_key(true).unwrap(), "a");
        assert_eq!(it.next_key(true).unwrap(), "[@b]");
        assert!(it.is_attribute());
        assert!(!it.has_index());
        assert_eq!(it.current_key(false).unwrap(), "b");
        assert_eq!(it.current_key(true).unwrap(), "[@b]");
        assert_eq!(it.current_segment(), Some(&Segment::attribute("b")));
    }

    #[test]
    fn current_segment() {
        let key = KeyPath::parse("a(3).b");
        let mut it = key.iter();
        assert_eq!(it.current_segment(), None);

        it.next_key(false).unwrap();
        assert_eq!(it.current_segment(), Some(&Segment::indexed("a", 3)));
        it.next_key(false).unwrap();
        assert_eq!(it.current_segment(), Some(&Segment::element("b")));
    }

    #[test]
    fn exhausted() {
        let key = KeyPath::parse("a");
        let mut it = key.iter();

        assert_eq!(it.current_key(false), Err(KeyPathError::Exhausted));
        it.next_key(false).unwrap();
        assert_eq!(it.next_key(false), Err(KeyPathError::Exhausted));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn remove_is_unsupported() {
        let key = KeyPath::parse("a.b");
        let mut it = key.iter();
        it.next_key(false).unwrap();

        assert_eq!(it.remove(), Err(KeyPathError::Unsupported));
        assert_eq!(it.next_key(false).unwrap(), "b");
    }

    #[test]
    fn clone_is_independent() {
        let key = KeyPath::parse("a.b.c");
        let mut first = key.iter();
        first.next_key(false).unwrap();

        let mut second = first.clone();
        assert_eq!(second.next_key(false).unwrap(), "b");
        assert_eq!(second.next_key(false).unwrap(), "c");

        assert_eq!(first.current_key(false).unwrap(), "a");
        assert_eq!(first.next_key(false).unwrap(), "b");
    }

    #[test]
    fn trailing_delimiter_after_truncate_yields_empty_name() {
        let mut key = KeyPath::parse("a.b");
        key.truncate(2);

        assert_eq!(
            key.iter().collect::<Vec<_>>(),
            vec![Segment::element("a"), Segment::element("")]
        );
    }
}
