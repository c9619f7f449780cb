//! Verbatim capture of undeclared markup.

use std::borrow::Cow;

use super::error::ModelError;
use super::extension::{Attribute, Content, Extension};
use crate::base::QName;

/// A node inside an [`OpaqueElement`].
#[derive(Clone, Debug, PartialEq)]
pub enum OpaqueNode {
    Element(OpaqueElement),
    Text(String),
}

/// An element captured as-is under a parent that accepts arbitrary
/// extensions. Attributes, text and nested elements are kept in document
/// order and written back unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpaqueElement {
    name: QName,
    attributes: Vec<Attribute>,
    children: Vec<OpaqueNode>,
}

impl OpaqueElement {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(OpaqueNode::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: OpaqueElement) -> Self {
        self.children.push(OpaqueNode::Element(child));
        self
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| &attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn children(&self) -> &[OpaqueNode] {
        &self.children
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                OpaqueNode::Text(text) => Some(text.as_str()),
                OpaqueNode::Element(_) => None,
            })
            .collect()
    }
}

impl Extension for OpaqueElement {
    fn element_name(&self) -> QName {
        self.name.clone()
    }

    fn attributes(&self) -> Vec<Attribute> {
        self.attributes.clone()
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        self.attributes.push(attribute.clone());
        Ok(())
    }

    fn process_text(&mut self, text: &str) -> Result<(), ModelError> {
        self.children.push(OpaqueNode::Text(text.to_string()));
        Ok(())
    }

    fn content(&self) -> Vec<Content<'_>> {
        self.children
            .iter()
            .map(|node| match node {
                OpaqueNode::Element(element) => Content::Child(element),
                OpaqueNode::Text(text) => Content::Text(Cow::Borrowed(text)),
            })
            .collect()
    }

    fn child_element(&self, name: &QName) -> Option<Box<dyn Extension>> {
        Some(Box::new(OpaqueElement::new(name.clone())))
    }

    fn accept_child(&mut self, child: Box<dyn Extension>) -> Result<(), ModelError> {
        match super::extension::downcast::<OpaqueElement>(child) {
            Some(element) => {
                self.children.push(OpaqueNode::Element(element));
                Ok(())
            }
            None => Err(ModelError::invalid_content(format!(
                "opaque element {} only holds opaque children",
                self.name
            ))),
        }
    }
}
