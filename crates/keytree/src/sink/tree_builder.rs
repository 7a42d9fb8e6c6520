use super::EventSink;
use crate::key_path;
use crate::value::Value;
use serde::{ser::SerializeMap, Serialize};
use std::borrow::Cow;

/// Element of a projected tree
///
/// Attributes are children whose name is decorated (`[@name]`).
#[derive(derive_new::new, Debug, Default, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub value: Option<Value>,
    #[new(default)]
    pub children: Vec<Node>,
}

impl Node {
    pub fn is_attribute(&self) -> bool {
        key_path::is_attribute_key(&self.name)
    }

    /// First child with the given (decorated) name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All children with the given (decorated) name, in insertion order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |child| child.name == name)
    }

    fn output_key(&self) -> Cow<'_, str> {
        if self.is_attribute() {
            Cow::Owned(format!("@{}", key_path::attribute_name(&self.name)))
        } else {
            Cow::Borrowed(&self.name)
        }
    }
}

/// Leaves serialize as their value, inner nodes as a map
///
/// Repeated child names become a sequence, attributes use `@name` and the own value of an inner
/// node is stored as `$value`.
impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if self.children.is_empty() {
            return self.value.serialize(serializer);
        }

        let mut groups: indexmap::IndexMap<Cow<'_, str>, Vec<&Node>> = Default::default();
        for child in &self.children {
            groups.entry(child.output_key()).or_default().push(child);
        }

        let mut ser = serializer.serialize_map(Some(groups.len() + self.value.is_some() as usize))?;
        if let Some(value) = &self.value {
            ser.serialize_entry("$value", value)?;
        }
        for (key, nodes) in &groups {
            match nodes.as_slice() {
                [single] => ser.serialize_entry(key, single)?,
                many => ser.serialize_entry(key, many)?,
            }
        }
        ser.end()
    }
}

/// Sink that assembles the events into a [Node] tree
#[derive(derive_new::new, Debug, Default)]
pub struct TreeBuilder {
    #[new(default)]
    root: Node,
    #[new(default)]
    open: Vec<Node>,
}

impl TreeBuilder {
    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Close whatever is still open and return the (unnamed) root
    pub fn finish(mut self) -> Node {
        if !self.open.is_empty() {
            tracing::warn!(open = self.open.len(), "elements left open");
        }

        while !self.open.is_empty() {
            self.close();
        }

        self.root
    }

    fn close(&mut self) {
        let Some(node) = self.open.pop() else {
            return;
        };

        self.open.last_mut().unwrap_or(&mut self.root).children.push(node);
    }
}

impl EventSink for TreeBuilder {
    fn element_start(&mut self, name: &str, value: Option<&Value>) {
        self.open.push(Node::new(name.to_string(), value.cloned()));
    }

    fn element_end(&mut self, name: &str) {
        match self.open.last() {
            None => {
                tracing::warn!(name, "unmatched element end ignored");
                return;
            }
            Some(node) if node.name != name => {
                tracing::warn!(expected = %node.name, name, "mismatched element end");
            }
            Some(_) => {}
        }

        self.close();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn builds_nested_nodes() {
        let mut builder = TreeBuilder::new();
        builder.element_start("a", None);
        builder.element_start("b", Some(&Value::from("1")));
        builder.element_end("b");
        assert_eq!(builder.depth(), 1);
        builder.element_end("a");

        let root = builder.finish();
        let a = root.child("a").unwrap();
        assert_eq!(a.value, None);
        assert_eq!(a.child("b").unwrap().value, Some(Value::from("1")));
    }

    #[test]
    fn repeated_elements_stay_in_order() {
        let mut builder = TreeBuilder::new();
        builder.element_start("a", None);
        for value in ["1", "2"] {
            builder.element_start("c", Some(&Value::from(value)));
            builder.element_end("c");
        }
        builder.element_start("d", None);
        builder.element_end("d");
        builder.element_end("a");

        let root = builder.finish();
        let a = root.child("a").unwrap();
        let values: Vec<_> = a
            .children_named("c")
            .map(|child| child.value.clone())
            .collect();
        assert_eq!(values, vec![Some(Value::from("1")), Some(Value::from("2"))]);
        assert_eq!(a.children_named("d").count(), 1);
        assert_eq!(a.children_named("x").count(), 0);
    }

    #[test]
    fn finish_closes_open_elements() {
        let mut builder = TreeBuilder::new();
        builder.element_start("a", None);
        builder.element_start("b", None);

        let root = builder.finish();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children[0].name, "b");
    }

    #[test]
    fn unmatched_end_is_ignored() {
        let mut builder = TreeBuilder::new();
        builder.element_end("a");
        assert_eq!(builder.finish(), Node::default());
    }

    #[test]
    fn serializes_repeated_children_and_attributes() {
        let mut root = Node::new(String::new(), None);
        let mut a = Node::new("a".to_string(), Some(Value::from("text")));
        a.children.push(Node::new("[@id]".to_string(), Some(Value::Integer(7))));
        a.children.push(Node::new("c".to_string(), Some(Value::from("2"))));
        a.children.push(Node::new("c".to_string(), Some(Value::from("3"))));
        a.children.push(Node::new("d".to_string(), None));
        root.children.push(a);

        assert_eq!(
            serde_json::to_value(&root).unwrap(),
            json!({
                "a": {
                    "$value": "text",
                    "@id": 7,
                    "c": ["2", "3"],
                    "d": null,
                }
            })
        );
    }

    #[test]
    fn attribute_nodes() {
        assert!(Node::new("[@x]".to_string(), None).is_attribute());
        assert!(!Node::new("x".to_string(), None).is_attribute());
    }
}
