//! Static metadata for one extension kind.

use std::fmt;

use super::error::ModelError;
use super::extension::{Extension, ExtensionKind};
use super::opaque::OpaqueElement;
use super::profile::ExtensionProfile;
use crate::base::{QName, TypeKey};

/// Builds an empty value for an element about to be parsed.
pub type Constructor = fn(&QName) -> Box<dyn Extension>;

/// Registers the nested declarations of a target type.
pub type Declarer = fn(&mut ExtensionProfile) -> Result<(), ModelError>;

/// Describes one extension kind: the element it is parsed from, the type it
/// materializes into and whether it may repeat under its parent.
#[derive(Clone)]
pub struct ExtensionDescriptor {
    name: QName,
    target: TypeKey,
    repeatable: bool,
    required: bool,
    construct: Constructor,
    declare: Declarer,
}

fn construct_default<T: ExtensionKind>(_: &QName) -> Box<dyn Extension> {
    Box::new(T::default())
}

fn construct_opaque(name: &QName) -> Box<dyn Extension> {
    Box::new(OpaqueElement::new(name.clone()))
}

fn declare_nothing(_: &mut ExtensionProfile) -> Result<(), ModelError> {
    Ok(())
}

impl ExtensionDescriptor {
    /// The descriptor for `T`, named after its element.
    pub fn of<T: ExtensionKind>() -> Self {
        Self {
            name: T::qname(),
            target: TypeKey::of::<T>(),
            repeatable: T::REPEATABLE,
            required: false,
            construct: construct_default::<T>,
            declare: T::declare_extensions,
        }
    }

    /// A descriptor capturing `name` verbatim as an [`OpaqueElement`].
    pub fn opaque(name: QName) -> Self {
        Self {
            name,
            target: TypeKey::of::<OpaqueElement>(),
            repeatable: true,
            required: false,
            construct: construct_opaque,
            declare: declare_nothing,
        }
    }

    /// Bind `T` under a different element name.
    pub fn with_name(mut self, name: QName) -> Self {
        self.name = name;
        self
    }

    /// Mark the extension as mandatory under its parent.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allow at most one value under the parent, even for a repeatable type.
    pub fn single(mut self) -> Self {
        self.repeatable = false;
        self
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether this descriptor captures raw markup.
    pub fn is_opaque(&self) -> bool {
        self.target == TypeKey::of::<OpaqueElement>()
    }

    /// Build an empty value for the element `name`.
    pub fn construct(&self, name: &QName) -> Box<dyn Extension> {
        (self.construct)(name)
    }

    pub(crate) fn declarer(&self) -> Declarer {
        self.declare
    }

    /// Whether two descriptors bind the same name to the same type with the
    /// same cardinality.
    pub fn same_binding(&self, other: &Self) -> bool {
        self.name == other.name
            && self.target == other.target
            && self.repeatable == other.repeatable
            && self.required == other.required
    }
}

impl fmt::Display for ExtensionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        match (self.repeatable, self.required) {
            (true, true) => write!(f, " (repeatable, required)"),
            (true, false) => write!(f, " (repeatable)"),
            (false, true) => write!(f, " (required)"),
            (false, false) => Ok(()),
        }
    }
}

impl fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("repeatable", &self.repeatable)
            .field("required", &self.required)
            .finish()
    }
}
