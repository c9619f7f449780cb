//! The `Extension` trait and its typed companion `ExtensionKind`.
//!
//! Every value that can appear as a child element of an extensible entity
//! implements [`Extension`]. The trait is object safe: the parse driver
//! builds values through descriptors without knowing their concrete type,
//! feeds them attributes, text and children, and attaches the finished
//! `Box<dyn Extension>` to its parent's [`ExtensionPoint`].
//!
//! Types that can be declared in a profile additionally implement
//! [`ExtensionKind`], which fixes their element name and cardinality.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use super::descriptor::ExtensionDescriptor;
use super::error::ModelError;
use super::point::ExtensionPoint;
use super::profile::ExtensionProfile;
use crate::base::{QName, TypeKey};

// ============================================================================
// ATTRIBUTES AND CONTENT
// ============================================================================

/// One attribute of an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    /// Create an unqualified attribute.
    pub fn new(local: &str, value: impl Into<String>) -> Self {
        Self {
            name: QName::local(local),
            value: value.into(),
        }
    }

    /// Create a namespace-qualified attribute.
    pub fn qualified(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// Whether this is the unqualified attribute `local`.
    pub fn is(&self, local: &str) -> bool {
        !self.name.is_qualified() && self.name.local_name() == local
    }
}

/// Content written between an element's start and end tags, before any
/// attached extensions.
pub enum Content<'a> {
    Text(Cow<'a, str>),
    Child(&'a dyn Extension),
}

impl fmt::Debug for Content<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Child(child) => f.debug_tuple("Child").field(&child.element_name()).finish(),
        }
    }
}

// ============================================================================
// OBJECT PLUMBING
// ============================================================================

/// Downcasting and cloning for extension trait objects.
///
/// Implemented automatically for every `Extension + Clone`.
pub trait ExtensionBase: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_box(&self) -> Box<dyn Extension>;
}

impl<T: Extension + Clone> ExtensionBase for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_box(&self) -> Box<dyn Extension> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Extension> {
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}

// ============================================================================
// EXTENSION
// ============================================================================

/// A value that serializes as one namespace-qualified element.
///
/// The default methods describe an empty leaf element that ignores unknown
/// attributes and rejects text and children. Implementors override the hooks
/// they need.
pub trait Extension: ExtensionBase + fmt::Debug + Send + Sync {
    /// The element this value is written as.
    fn element_name(&self) -> QName;

    /// Runtime identity of the concrete type.
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }

    /// Attributes to write, in order.
    fn attributes(&self) -> Vec<Attribute> {
        Vec::new()
    }

    /// Consume one attribute of the start tag. Unknown attributes are ignored.
    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        let _ = attribute;
        Ok(())
    }

    /// Consume character content.
    fn process_text(&mut self, text: &str) -> Result<(), ModelError> {
        if text.trim().is_empty() {
            Ok(())
        } else {
            Err(ModelError::invalid_content(format!(
                "unexpected text in {}",
                self.element_name()
            )))
        }
    }

    /// Text and intrinsic children to write, in document order.
    fn content(&self) -> Vec<Content<'_>> {
        Vec::new()
    }

    /// Offer a child element before profile dispatch.
    ///
    /// Returning a value claims the element: the driver parses it into that
    /// value and hands it back through [`Extension::accept_child`].
    fn child_element(&self, name: &QName) -> Option<Box<dyn Extension>> {
        let _ = name;
        None
    }

    /// Receive a child previously claimed by [`Extension::child_element`].
    fn accept_child(&mut self, child: Box<dyn Extension>) -> Result<(), ModelError> {
        Err(ModelError::invalid_content(format!(
            "{} does not accept child {}",
            self.element_name(),
            child.element_name()
        )))
    }

    /// Validate at end of element.
    fn process_end(&mut self) -> Result<(), ModelError> {
        Ok(())
    }

    /// The container for profile-dispatched children, if this value has one.
    fn extension_point(&self) -> Option<&ExtensionPoint> {
        None
    }

    /// Mutable access to the container. Fails once the value is locked.
    ///
    /// Implementations hand out their point through
    /// [`ExtensionPoint::unlocked`].
    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        Ok(None)
    }

    /// Make this value and everything attached below it immutable.
    fn lock(&mut self) {
        if let Ok(Some(point)) = self.extension_point_mut() {
            point.lock();
        }
    }

    fn is_locked(&self) -> bool {
        self.extension_point().is_some_and(ExtensionPoint::is_locked)
    }
}

/// An extension type with a fixed element name, declarable in a profile.
pub trait ExtensionKind: Extension + Default + Clone {
    const NAMESPACE: &'static str;
    const LOCAL_NAME: &'static str;
    /// Whether the element may appear more than once under one parent.
    const REPEATABLE: bool = false;

    fn qname() -> QName {
        QName::new(Self::NAMESPACE, Self::LOCAL_NAME)
    }

    /// The default descriptor for this type.
    fn descriptor() -> ExtensionDescriptor {
        ExtensionDescriptor::of::<Self>()
    }

    /// Register the child kinds this type accepts.
    ///
    /// Runs once per profile, the first time the type is declared.
    fn declare_extensions(profile: &mut ExtensionProfile) -> Result<(), ModelError> {
        let _ = profile;
        Ok(())
    }
}

/// Downcast a borrowed extension.
pub fn downcast_ref<T: Extension>(value: &dyn Extension) -> Option<&T> {
    value.as_any().downcast_ref::<T>()
}

/// Downcast a boxed extension, consuming it.
pub fn downcast<T: Extension>(value: Box<dyn Extension>) -> Option<T> {
    value.into_any().downcast::<T>().ok().map(|typed| *typed)
}
