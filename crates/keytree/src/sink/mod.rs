//! element event receivers
mod recorder;
mod tree_builder;
pub use recorder::{Event, EventRecorder};
pub use tree_builder::{Node, TreeBuilder};

use crate::value::Value;

/// Receives the element events of a projected tree
///
/// Every `element_start` is eventually matched by an `element_end` with the same name.
pub trait EventSink {
    fn element_start(&mut self, name: &str, value: Option<&Value>);
    fn element_end(&mut self, name: &str);
}

// blanket impl for mutable references
impl<S> EventSink for &mut S
where
    S: EventSink + ?Sized,
{
    fn element_start(&mut self, name: &str, value: Option<&Value>) {
        (**self).element_start(name, value)
    }

    fn element_end(&mut self, name: &str) {
        (**self).element_end(name)
    }
}
