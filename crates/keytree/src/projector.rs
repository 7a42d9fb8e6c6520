//! flat-to-tree projection
//!
//! [TreeProjector] walks an ordered list of fully qualified keys and reports the implied tree to an
//! [EventSink]. Each key is compared with its predecessor: elements below the shared prefix are
//! closed, new ancestors are opened and the leaf is emitted together with its value.
//!
//! | **key** | **value**    | **events**                                            |
//! |---------|--------------|-------------------------------------------------------|
//! | `a.b`   | `"1"`        | `start(a)`, `start(b, "1")`, `end(b)`                  |
//! | `a.c`   | `["2", "3"]` | `start(c, "2")`, `end(c)`, `start(c, "3")`, `end(c)`   |
//! | (done)  |              | `end(a)`                                              |
//!
//! ```
//! use keytree::projector::TreeProjector;
//! use keytree::sink::EventRecorder;
//! use keytree::value::Value;
//!
//! let pairs = vec![
//!     ("a.b", Value::from("1")),
//!     ("a.c", Value::from(vec!["2", "3"])),
//! ];
//!
//! let mut recorder = EventRecorder::new();
//! TreeProjector::new().process(pairs, &mut recorder);
//!
//! assert_eq!(
//!     recorder.to_string(),
//!     "elementStart(a, null)
//! elementStart(b, \"1\")
//! elementEnd(b)
//! elementStart(c, \"2\")
//! elementEnd(c)
//! elementStart(c, \"3\")
//! elementEnd(c)
//! elementEnd(a)
//! "
//! );
//! ```
//!
//! Keys are never reordered. Siblings must be contiguous to end up in the same parent element.
use crate::key_path::{KeyPath, Segment};
use crate::sink::EventSink;
use crate::value::Value;
use std::borrow::Borrow;
use std::collections::HashSet;

/// Ordered flat properties
pub type Properties = indexmap::IndexMap<String, Value>;

/// An ordered key store that can look up arbitrary keys
pub trait PropertySource {
    /// All keys in projection order
    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_>;
    fn property(&self, key: &str) -> Option<&Value>;
}

impl PropertySource for Properties {
    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(indexmap::IndexMap::keys(self).map(String::as_str))
    }

    fn property(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

static NULL: Value = Value::Null;

/// Turns ordered (key, value) pairs into balanced element events
///
/// Holds no state between calls; every `process*` call starts from an empty key.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeProjector;

impl TreeProjector {
    pub fn new() -> Self {
        Self
    }

    /// Project `pairs` into `sink`
    ///
    /// Intermediate elements are opened without a value.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn process<I, K, V, S>(&self, pairs: I, sink: &mut S)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Borrow<Value>,
        S: EventSink + ?Sized,
    {
        let mut run = Run::default();
        for (key, value) in pairs {
            run.step(key.as_ref(), value.borrow(), sink, |_| None);
        }
        run.finish(sink);
    }

    /// Project every key of `source` into `sink`
    ///
    /// An intermediate element receives the value stored under its own key. Such keys are
    /// remembered and skipped when the source lists them later on. A scalar parent key that is
    /// directly followed by one of its children is held back and becomes the value of the
    /// element the child opens.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn process_source<P, S>(&self, source: &P, sink: &mut S)
    where
        P: PropertySource + ?Sized,
        S: EventSink + ?Sized,
    {
        let mut run = Run::default();
        let mut opened: HashSet<String> = Default::default();
        let mut deferred: Option<(KeyPath, &Value)> = None;
        let mut keys = source.keys().peekable();

        while let Some(key) = keys.next() {
            if opened.contains(key) {
                tracing::trace!(key, "already emitted as intermediate element");
                continue;
            }

            let value = source.property(key).unwrap_or(&NULL);
            let current = KeyPath::parse(key);
            let next = keys.peek().filter(|next| !opened.contains(**next));
            if !matches!(value, Value::List(_))
                && next.is_some_and(|next| run.reopens(&current, next))
            {
                tracing::trace!(key, "value passed on to the element of the next key");
                deferred = Some((current, value));
                continue;
            }

            run.step(key, value, sink, |partial| {
                opened.insert(partial.to_string());
                match &deferred {
                    Some((parent, value)) if parent.as_str() == partial => Some(*value),
                    _ => source.property(partial),
                }
            });
            deferred = None;
        }
        run.finish(sink);
    }
}

/// Loop state of a single projection
#[derive(Default)]
struct Run {
    previous: KeyPath,
    segments: Vec<Segment>,
}

impl Run {
    fn step<'v, S, L>(&mut self, key: &str, value: &Value, sink: &mut S, mut lookup: L)
    where
        S: EventSink + ?Sized,
        L: FnMut(&str) -> Option<&'v Value>,
    {
        let current = KeyPath::parse(key);
        let segments: Vec<Segment> = current.iter().collect();
        let Some((leaf, ancestors)) = segments.split_last() else {
            tracing::warn!(key, "key without segments skipped");
            return;
        };

        // the previous leaf is always closed already and the current leaf must be opened
        let shared = self
            .previous
            .common_key(&current)
            .iter()
            .count()
            .min(self.segments.len().saturating_sub(1))
            .min(ancestors.len());
        tracing::trace!(key, previous = %self.previous, shared, "projecting key");

        self.close(shared, sink);

        let mut partial = KeyPath::empty();
        for segment in &segments[..shared] {
            partial.append_segment(segment);
        }
        for (depth, segment) in (shared + 1..).zip(&ancestors[shared..]) {
            partial.append_segment(segment);
            // the previous leaf already carried its value
            let value = if segments[..depth] == self.segments[..] {
                None
            } else {
                lookup(partial.as_str()).filter(|value| !value.is_null())
            };
            sink.element_start(&segment.decorated_name(), value);
        }

        emit_value(sink, &leaf.decorated_name(), value);

        self.previous = current;
        self.segments = segments;
    }

    /// Will stepping to `next` open `parent` as a new intermediate element?
    fn reopens(&self, parent: &KeyPath, next: &str) -> bool {
        let parent: Vec<Segment> = parent.iter().collect();
        let next: Vec<Segment> = KeyPath::parse(next).iter().collect();

        let open = self.segments.len() > parent.len() && self.segments.starts_with(&parent);
        !parent.is_empty()
            && next.len() > parent.len()
            && next.starts_with(&parent)
            && !open
            && self.segments != parent
    }

    /// Close everything below `shared` except the previous leaf
    fn close<S: EventSink + ?Sized>(&self, shared: usize, sink: &mut S) {
        for segment in self.segments[shared..].iter().rev().skip(1) {
            sink.element_end(&segment.decorated_name());
        }
    }

    fn finish<S: EventSink + ?Sized>(self, sink: &mut S) {
        self.close(0, sink);
    }
}

/// Lists become repeated siblings, everything else a single element
fn emit_value<S: EventSink + ?Sized>(sink: &mut S, name: &str, value: &Value) {
    match value {
        Value::List(values) => {
            for value in values {
                emit_value(sink, name, value);
            }
        }
        Value::Null => {
            sink.element_start(name, None);
            sink.element_end(name);
        }
        value => {
            sink.element_start(name, Some(value));
            sink.element_end(name);
        }
    }
}
