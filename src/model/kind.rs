//! Category markers and kind adaptation.
//!
//! A generically parsed entity carries category markers. A [`KindRegistry`]
//! maps markers to typed views and narrows an entity to the most specific
//! registered view whose marker it carries.
//!
//! ```text
//!            Entry (generic)
//!               │ markers: {kind#event}
//!               ▼
//!   adaptors: EventEntry (kind#event)
//!             CalendarEventEntry (kind#event, specializes EventEntry)
//!             ContactEntry (kind#contact)
//!               │
//!               ▼
//!   CalendarEventEntry   (narrowest match wins)
//! ```
//!
//! Each adaptor names at most one type it specializes, so registered kinds
//! form a forest. Two matching adaptors on different branches are
//! reported as [`ModelError::AmbiguousAdaptation`].

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, trace};

use super::error::ModelError;
use super::extension::{Attribute, Extension, ExtensionKind};
use super::profile::ExtensionProfile;
use crate::base::{QName, TypeKey, namespaces};

// ============================================================================
// CATEGORY
// ============================================================================

/// A `(scheme, term)` classification tag, written as `atom:category`.
///
/// Equality and hashing ignore the label.
#[derive(Clone, Debug, Default)]
pub struct Category {
    scheme: Option<SmolStr>,
    term: SmolStr,
    label: Option<SmolStr>,
}

impl Category {
    pub fn new(scheme: Option<&str>, term: &str) -> Self {
        Self {
            scheme: scheme.map(SmolStr::new),
            term: SmolStr::new(term),
            label: None,
        }
    }

    /// A kind marker: `term` under the kind scheme.
    pub fn kind(term: &str) -> Self {
        Self::new(Some(namespaces::KIND_SCHEME), term)
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(SmolStr::new(label));
        self
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_kind(&self) -> bool {
        self.scheme() == Some(namespaces::KIND_SCHEME)
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme && self.term == other.term
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scheme.hash(state);
        self.term.hash(state);
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scheme {
            Some(scheme) => write!(f, "{scheme} {}", self.term),
            None => f.write_str(&self.term),
        }
    }
}

impl Extension for Category {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = Vec::with_capacity(3);
        if let Some(scheme) = &self.scheme {
            attributes.push(Attribute::new("scheme", scheme.as_str()));
        }
        attributes.push(Attribute::new("term", self.term.as_str()));
        if let Some(label) = &self.label {
            attributes.push(Attribute::new("label", label.as_str()));
        }
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        let value = SmolStr::new(&attribute.value);
        match attribute.name.local_name() {
            "scheme" if !attribute.name.is_qualified() => self.scheme = Some(value),
            "term" if !attribute.name.is_qualified() => self.term = value,
            "label" if !attribute.name.is_qualified() => self.label = Some(value),
            _ => {}
        }
        Ok(())
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        if self.term.is_empty() {
            return Err(ModelError::missing_attribute(Self::qname(), "term"));
        }
        Ok(())
    }
}

impl ExtensionKind for Category {
    const NAMESPACE: &'static str = namespaces::ATOM;
    const LOCAL_NAME: &'static str = "category";
    const REPEATABLE: bool = true;
}

// ============================================================================
// KIND TRAITS
// ============================================================================

/// An entity that carries category markers and can be adapted.
pub trait Categorized: Extension + Sized {
    fn categories(&self) -> &[Category];

    fn has_category(&self, category: &Category) -> bool {
        self.categories().contains(category)
    }
}

/// A typed view over a generic entity `B`, selected by its kind marker.
pub trait EntityKind<B: Categorized>: Extension {
    /// The marker identifying this kind.
    fn kind_category() -> Category
    where
        Self: Sized;

    /// The kind this one narrows, if any.
    fn specializes() -> Option<TypeKey>
    where
        Self: Sized,
    {
        None
    }

    /// Every kind this one narrows, nearest first, registered or not.
    ///
    /// Defaults to [`EntityKind::specializes`] alone. A kind deeper in a
    /// chain overrides it, so the registry relates it to a registered
    /// ancestor even when the kinds in between are not registered.
    fn lineage() -> Vec<TypeKey>
    where
        Self: Sized,
    {
        Self::specializes().into_iter().collect()
    }

    /// Declare this kind's extensions under `parent`.
    ///
    /// Called with the kind's own type when it is parsed directly, and with
    /// the generic entity type when the registry prepares a profile for
    /// adaptation.
    fn declare_kind(profile: &mut ExtensionProfile, parent: TypeKey) -> Result<(), ModelError>
    where
        Self: Sized,
    {
        let _ = (profile, parent);
        Ok(())
    }

    /// Wrap a generic entity. Already-parsed extensions move along unchanged.
    fn from_base(base: B) -> Self
    where
        Self: Sized;

    fn base(&self) -> &B;

    fn base_mut(&mut self) -> &mut B;

    fn into_base(self: Box<Self>) -> B;
}

// ============================================================================
// REGISTRY
// ============================================================================

type AdaptFn<B> = fn(B) -> Box<dyn EntityKind<B>>;
type DeclareFn = fn(&mut ExtensionProfile, TypeKey) -> Result<(), ModelError>;

fn adapt_as<B: Categorized, K: EntityKind<B>>(base: B) -> Box<dyn EntityKind<B>> {
    Box::new(K::from_base(base))
}

struct Adaptor<B> {
    marker: Category,
    key: TypeKey,
    lineage: Vec<TypeKey>,
    /// Kinds this one narrows, its own lineage plus that of registered
    /// ancestors.
    ancestors: Vec<TypeKey>,
    adapt: AdaptFn<B>,
    declare: DeclareFn,
}

/// The outcome of [`KindRegistry::adapt`].
pub enum Adapted<B: Categorized> {
    /// The entity narrowed to a registered kind.
    Kind(Box<dyn EntityKind<B>>),
    /// No adaptor matched; the entity is handed back unchanged.
    Generic(B),
}

impl<B: Categorized> Adapted<B> {
    /// The selected kind, if any.
    pub fn kind_key(&self) -> Option<TypeKey> {
        match self {
            Self::Kind(kind) => Some(kind.type_key()),
            Self::Generic(_) => None,
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(_))
    }

    /// Borrow the adapted view as `K`.
    pub fn kind<K: EntityKind<B>>(&self) -> Option<&K> {
        match self {
            Self::Kind(kind) => kind.as_any().downcast_ref::<K>(),
            Self::Generic(_) => None,
        }
    }

    /// Take the adapted view as `K`. `None` when another kind (or none) was
    /// selected; check with [`Adapted::kind`] first to keep the entity.
    pub fn into_kind<K: EntityKind<B>>(self) -> Option<K> {
        match self {
            Self::Kind(kind) => kind.into_any().downcast::<K>().ok().map(|typed| *typed),
            Self::Generic(_) => None,
        }
    }

    /// The generic entity underneath.
    pub fn base(&self) -> &B {
        match self {
            Self::Kind(kind) => kind.base(),
            Self::Generic(base) => base,
        }
    }

    pub fn into_base(self) -> B {
        match self {
            Self::Kind(kind) => kind.into_base(),
            Self::Generic(base) => base,
        }
    }
}

impl<B: Categorized> fmt::Debug for Adapted<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Self::Generic(base) => f.debug_tuple("Generic").field(base).finish(),
        }
    }
}

/// Maps category markers to the typed views that adapt them.
pub struct KindRegistry<B: Categorized> {
    adaptors: Vec<Adaptor<B>>,
}

impl<B: Categorized> Default for KindRegistry<B> {
    fn default() -> Self {
        Self {
            adaptors: Vec::new(),
        }
    }
}

impl<B: Categorized> KindRegistry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `K` under its kind marker.
    ///
    /// Registering the same kind twice is a no-op.
    pub fn register<K: EntityKind<B>>(&mut self) -> &mut Self {
        let key = TypeKey::of::<K>();
        if self.adaptors.iter().any(|adaptor| adaptor.key == key) {
            return self;
        }
        debug!("register kind {key} for {}", K::kind_category());
        self.adaptors.push(Adaptor {
            marker: K::kind_category(),
            key,
            lineage: K::lineage(),
            ancestors: Vec::new(),
            adapt: adapt_as::<B, K>,
            declare: K::declare_kind,
        });
        self.link_ancestors();
        self
    }

    fn link_ancestors(&mut self) {
        let lineages: FxHashMap<TypeKey, Vec<TypeKey>> = self
            .adaptors
            .iter()
            .map(|adaptor| (adaptor.key, adaptor.lineage.clone()))
            .collect();
        for adaptor in &mut self.adaptors {
            let mut ancestors = Vec::new();
            let mut pending = adaptor.lineage.clone();
            while let Some(key) = pending.pop() {
                if key == adaptor.key || ancestors.contains(&key) {
                    continue;
                }
                ancestors.push(key);
                if let Some(lineage) = lineages.get(&key) {
                    pending.extend(lineage.iter().copied());
                }
            }
            adaptor.ancestors = ancestors;
        }
    }

    /// Declare every registered kind's extensions on the generic type `B`,
    /// so a generically parsed entity already holds typed extensions.
    pub fn declare_kinds(&self, profile: &mut ExtensionProfile) -> Result<(), ModelError> {
        let base = TypeKey::of::<B>();
        for adaptor in &self.adaptors {
            (adaptor.declare)(profile, base)?;
        }
        Ok(())
    }

    /// Registered `(marker, kind)` pairs in registration order.
    pub fn adaptors(&self) -> impl Iterator<Item = (&Category, TypeKey)> {
        self.adaptors
            .iter()
            .map(|adaptor| (&adaptor.marker, adaptor.key))
    }

    pub fn len(&self) -> usize {
        self.adaptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adaptors.is_empty()
    }

    /// Index of the narrowest adaptor matching `base`'s markers.
    fn select(&self, base: &B) -> Result<Option<usize>, ModelError> {
        let markers: FxHashSet<&Category> = base.categories().iter().collect();
        if markers.is_empty() {
            return Ok(None);
        }

        let mut best: Option<usize> = None;
        for (index, adaptor) in self.adaptors.iter().enumerate() {
            if !markers.contains(&adaptor.marker) {
                continue;
            }
            trace!("kind {} matches", adaptor.key);
            let Some(current) = best.map(|i| &self.adaptors[i]) else {
                best = Some(index);
                continue;
            };
            if adaptor.ancestors.contains(&current.key) {
                best = Some(index);
            } else if !current.ancestors.contains(&adaptor.key) {
                return Err(ModelError::AmbiguousAdaptation {
                    first: current.key.to_string(),
                    second: adaptor.key.to_string(),
                });
            }
        }
        Ok(best)
    }

    /// Narrow `base` to the most specific registered kind it carries.
    pub fn adapt(&self, base: B) -> Result<Adapted<B>, ModelError> {
        match self.select(&base)? {
            Some(index) => {
                let adaptor = &self.adaptors[index];
                debug!("adapted {} to {}", base.element_name(), adaptor.key);
                Ok(Adapted::Kind((adaptor.adapt)(base)))
            }
            None => {
                trace!("no kind for {}", base.element_name());
                Ok(Adapted::Generic(base))
            }
        }
    }
}

impl<B: Categorized> fmt::Debug for KindRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.adaptors.iter().map(|adaptor| (&adaptor.marker, adaptor.key)))
            .finish()
    }
}
