//! Extension profiles: which child kinds each parent type accepts.
//!
//! A profile maps `(parent type, qualified name)` to an
//! [`ExtensionDescriptor`]. It is filled once, before any traversal, and is
//! read-only while documents are parsed or generated against it. A finished
//! profile is `Send + Sync` and is meant to be shared.
//!
//! ## Resolution order
//!
//! ```text
//! resolve(parent, name)
//!   1. parent's own declarations
//!   2. declarations of parent's supertypes, nearest first
//!   3. arbitrary-extension fallback (parent or any supertype)
//!   4. not found
//! ```

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{debug, trace};

use super::descriptor::ExtensionDescriptor;
use super::error::ModelError;
use super::extension::ExtensionKind;
use crate::base::{QName, TypeKey};

/// Declarations scoped to one parent type.
#[derive(Debug, Default)]
struct Declarations {
    /// Descriptors by element name (IndexMap keeps declaration order).
    by_name: IndexMap<QName, Arc<ExtensionDescriptor>>,
    /// Whether undeclared elements are captured as opaque content.
    arbitrary: bool,
}

/// The schema for a family of documents.
#[derive(Debug, Default)]
pub struct ExtensionProfile {
    parents: FxHashMap<TypeKey, Declarations>,
    /// Subtype -> supertype links for inherited declarations.
    supertypes: FxHashMap<TypeKey, TypeKey>,
    /// Types whose own `declare_extensions` already ran.
    declared_types: FxHashSet<TypeKey>,
}

impl ExtensionProfile {
    /// Create an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the profile for documents rooted at `T`.
    pub fn for_root<T: ExtensionKind>() -> Result<Self, ModelError> {
        let mut profile = Self::new();
        profile.ensure_declared::<T>()?;
        Ok(profile)
    }

    // ── Declaration ─────────────────────────────────────────────────

    /// Register `descriptor` as a child kind of `parent`.
    ///
    /// Re-declaring the identical binding is a no-op. Binding an already
    /// declared name to a different type fails. The first declaration of an
    /// extensible target type also runs that type's own declarations.
    pub fn declare(
        &mut self,
        parent: TypeKey,
        descriptor: ExtensionDescriptor,
    ) -> Result<(), ModelError> {
        if !descriptor.name().is_valid() {
            return Err(ModelError::invalid_declaration(format!(
                "'{}' is not a valid element name",
                descriptor.name().local_name()
            )));
        }

        let declarations = self.parents.entry(parent).or_default();
        if let Some(existing) = declarations.by_name.get(descriptor.name()) {
            if existing.same_binding(&descriptor) {
                trace!("{} already declared in {parent}", descriptor.name());
                return Ok(());
            }
            return Err(ModelError::DuplicateDeclaration {
                parent: parent.to_string(),
                name: descriptor.name().clone(),
                existing: existing.to_string(),
                requested: descriptor.to_string(),
            });
        }

        debug!(
            "declare {} -> {} in {parent} (repeatable: {})",
            descriptor.name(),
            descriptor.target(),
            descriptor.is_repeatable()
        );
        let target = descriptor.target();
        let declarer = descriptor.declarer();
        declarations
            .by_name
            .insert(descriptor.name().clone(), Arc::new(descriptor));

        if self.declared_types.insert(target) {
            trace!("auto-declaring nested profile of {target}");
            declarer(self)?;
        }
        Ok(())
    }

    /// Register `T` as a child kind of `P` with its default descriptor.
    pub fn declare_for<P: 'static, T: ExtensionKind>(&mut self) -> Result<(), ModelError> {
        self.declare(TypeKey::of::<P>(), T::descriptor())
    }

    /// Accept any undeclared element under `parent` as opaque content.
    pub fn declare_arbitrary_extension(&mut self, parent: TypeKey) {
        debug!("{parent} accepts arbitrary extensions");
        self.parents.entry(parent).or_default().arbitrary = true;
    }

    /// Let `subtype` inherit the declarations of `supertype`.
    pub fn declare_supertype(
        &mut self,
        subtype: TypeKey,
        supertype: TypeKey,
    ) -> Result<(), ModelError> {
        if self.lineage(supertype).any(|key| key == subtype) {
            return Err(ModelError::invalid_declaration(format!(
                "{subtype} cannot specialize {supertype}: cycle"
            )));
        }
        match self.supertypes.get(&subtype) {
            Some(existing) if *existing != supertype => {
                Err(ModelError::invalid_declaration(format!(
                    "{subtype} already specializes {existing}, not {supertype}"
                )))
            }
            _ => {
                self.supertypes.insert(subtype, supertype);
                Ok(())
            }
        }
    }

    /// Run `T::declare_extensions` unless it already ran for this profile.
    pub fn ensure_declared<T: ExtensionKind>(&mut self) -> Result<(), ModelError> {
        if self.declared_types.insert(TypeKey::of::<T>()) {
            T::declare_extensions(self)?;
        }
        Ok(())
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// `parent` followed by its supertypes, nearest first.
    pub fn lineage(&self, parent: TypeKey) -> impl Iterator<Item = TypeKey> + '_ {
        std::iter::successors(Some(parent), |key| self.supertypes.get(key).copied())
    }

    /// Find the descriptor for `name` under `parent`.
    ///
    /// Falls back to a synthesized opaque descriptor when `parent` (or a
    /// supertype) accepts arbitrary extensions.
    pub fn resolve(&self, parent: TypeKey, name: &QName) -> Option<Arc<ExtensionDescriptor>> {
        for key in self.lineage(parent) {
            if let Some(descriptor) = self
                .parents
                .get(&key)
                .and_then(|declarations| declarations.by_name.get(name))
            {
                trace!("resolved {name} in {parent} via {key}");
                return Some(Arc::clone(descriptor));
            }
        }
        if self.accepts_arbitrary(parent) {
            trace!("resolved {name} in {parent} as opaque content");
            return Some(Arc::new(ExtensionDescriptor::opaque(name.clone())));
        }
        trace!("no declaration for {name} in {parent}");
        None
    }

    /// Whether `parent` or a supertype captures undeclared elements.
    pub fn accepts_arbitrary(&self, parent: TypeKey) -> bool {
        self.lineage(parent).any(|key| {
            self.parents
                .get(&key)
                .is_some_and(|declarations| declarations.arbitrary)
        })
    }

    /// Whether `name` is explicitly declared for `parent` or a supertype.
    pub fn is_declared(&self, parent: TypeKey, name: &QName) -> bool {
        self.lineage(parent).any(|key| {
            self.parents
                .get(&key)
                .is_some_and(|declarations| declarations.by_name.contains_key(name))
        })
    }

    /// Descriptors declared directly on `parent`, in declaration order.
    pub fn declarations(&self, parent: TypeKey) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.parents
            .get(&parent)
            .into_iter()
            .flat_map(|declarations| declarations.by_name.values().map(Arc::as_ref))
    }

    /// Required descriptors visible from `parent`, including inherited ones.
    pub fn required(&self, parent: TypeKey) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.lineage(parent)
            .flat_map(|key| self.declarations(key))
            .filter(|descriptor| descriptor.is_required())
    }

    /// Number of parent types with declarations.
    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }
}
