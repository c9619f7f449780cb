//! Tokenized element streams.
//!
//! The drivers never see bytes. They read [`XmlEvent`]s from an
//! [`EventSource`] and write through an [`XmlSink`]. [`EventBuffer`] is the
//! in-memory implementation of both.

use std::collections::VecDeque;

use crate::base::QName;
use crate::model::{Attribute, ModelError};

/// A start tag with its resolved name and attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct StartTag {
    pub name: QName,
    pub attributes: Vec<Attribute>,
}

impl StartTag {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, local: &str, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(local, value));
        self
    }
}

/// One token of a namespace-resolved element stream.
#[derive(Clone, Debug, PartialEq)]
pub enum XmlEvent {
    Start(StartTag),
    Text(String),
    End(QName),
}

impl XmlEvent {
    pub fn start(name: QName) -> Self {
        Self::Start(StartTag::new(name))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn end(name: QName) -> Self {
        Self::End(name)
    }
}

/// Supplies tokens to the parse driver.
pub trait EventSource {
    /// The next token, or `None` at end of input.
    fn next_event(&mut self) -> Result<Option<XmlEvent>, ModelError>;
}

/// Receives tokens from the generate driver.
pub trait XmlSink {
    fn start_element(&mut self, name: &QName, attributes: &[Attribute]) -> Result<(), ModelError>;

    fn text(&mut self, text: &str) -> Result<(), ModelError>;

    fn end_element(&mut self, name: &QName) -> Result<(), ModelError>;
}

/// An in-memory token stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventBuffer {
    events: VecDeque<XmlEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: XmlEvent) {
        self.events.push_back(event);
    }

    /// Builder form of [`EventBuffer::push`].
    pub fn with(mut self, event: XmlEvent) -> Self {
        self.push(event);
        self
    }

    pub fn events(&self) -> impl Iterator<Item = &XmlEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_vec(self) -> Vec<XmlEvent> {
        self.events.into()
    }
}

impl FromIterator<XmlEvent> for EventBuffer {
    fn from_iter<I: IntoIterator<Item = XmlEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl EventSource for EventBuffer {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, ModelError> {
        Ok(self.events.pop_front())
    }
}

impl XmlSink for EventBuffer {
    fn start_element(&mut self, name: &QName, attributes: &[Attribute]) -> Result<(), ModelError> {
        self.push(XmlEvent::Start(StartTag {
            name: name.clone(),
            attributes: attributes.to_vec(),
        }));
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ModelError> {
        self.push(XmlEvent::text(text));
        Ok(())
    }

    fn end_element(&mut self, name: &QName) -> Result<(), ModelError> {
        self.push(XmlEvent::end(name.clone()));
        Ok(())
    }
}

/// Replay buffered tokens into a sink.
pub fn replay(events: EventBuffer, sink: &mut impl XmlSink) -> Result<(), ModelError> {
    for event in events.into_vec() {
        match event {
            XmlEvent::Start(tag) => sink.start_element(&tag.name, &tag.attributes)?,
            XmlEvent::Text(text) => sink.text(&text)?,
            XmlEvent::End(name) => sink.end_element(&name)?,
        }
    }
    Ok(())
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, ModelError> {
        (**self).next_event()
    }
}

impl<S: XmlSink + ?Sized> XmlSink for &mut S {
    fn start_element(&mut self, name: &QName, attributes: &[Attribute]) -> Result<(), ModelError> {
        (**self).start_element(name, attributes)
    }

    fn text(&mut self, text: &str) -> Result<(), ModelError> {
        (**self).text(text)
    }

    fn end_element(&mut self, name: &QName) -> Result<(), ModelError> {
        (**self).end_element(name)
    }
}
