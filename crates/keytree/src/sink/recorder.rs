use super::EventSink;
use crate::value::Value;
use std::fmt::Formatter;

/// An owned element event
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Start { name: String, value: Option<Value> },
    End { name: String },
}

impl Event {
    pub fn start(name: impl Into<String>, value: Option<Value>) -> Self {
        Event::Start {
            name: name.into(),
            value,
        }
    }

    pub fn end(name: impl Into<String>) -> Self {
        Event::End { name: name.into() }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Start { name, value: None } => write!(f, "elementStart({name}, null)"),
            Event::Start {
                name,
                value: Some(value),
            } => write!(f, "elementStart({name}, {value})"),
            Event::End { name } => write!(f, "elementEnd({name})"),
        }
    }
}

/// Sink that keeps every event in order
#[derive(derive_new::new, Debug, Default, Clone, PartialEq)]
pub struct EventRecorder {
    #[new(default)]
    events: Vec<Event>,
}

impl EventRecorder {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl EventSink for EventRecorder {
    fn element_start(&mut self, name: &str, value: Option<&Value>) {
        self.events.push(Event::start(name, value.cloned()));
    }

    fn element_end(&mut self, name: &str) {
        self.events.push(Event::end(name));
    }
}

/// One event per line
impl std::fmt::Display for EventRecorder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "{event}")?;
        }
        Ok(())
    }
}
