//! Typed entry kinds and the standard registry.
//!
//! Each kind is a thin view over an [`Entry`]: it owns the entry (and with
//! it the already-parsed extension point) and adds typed accessors. The
//! `entry_kind!` macro generates the delegation; each kind supplies its
//! marker term and a function declaring its extensions.

use std::sync::{Arc, LazyLock};

use super::atom::{Entry, Feed};
use super::calendar::{CalendarEventEntry, EventEntry};
use super::contacts::ContactEntry;
use super::photos::PhotoEntry;
use crate::model::{ExtensionProfile, KindRegistry, ModelError, ProfileCache};

/// Kind terms under [`KIND_SCHEME`](crate::base::namespaces::KIND_SCHEME).
pub mod terms {
    pub const EVENT: &str = "http://schemas.google.com/g/2005#event";
    pub const CONTACT: &str = "http://schemas.google.com/contact/2008#contact";
    pub const PHOTO: &str = "http://schemas.google.com/photos/2007#photo";
}

/// Define a typed view over [`Entry`].
///
/// ```ignore
/// entry_kind! {
///     /// A calendar event.
///     EventEntry, term = terms::EVENT, declare = declare_event_extensions
/// }
/// ```
///
/// With `specializes = Parent`, the kind narrows another registered kind and
/// inherits its profile declarations.
macro_rules! entry_kind {
    (
        $(#[$meta:meta])*
        $kind:ident, term = $term:expr, declare = $declare:path
    ) => {
        $crate::data::kinds::entry_kind!(
            @define $(#[$meta])* $kind, $term, $declare, $crate::data::Entry, None, Vec::new()
        );
    };
    (
        $(#[$meta:meta])*
        $kind:ident, term = $term:expr, declare = $declare:path, specializes = $parent:ty
    ) => {
        $crate::data::kinds::entry_kind!(
            @define $(#[$meta])* $kind, $term, $declare, $parent,
            Some($crate::base::TypeKey::of::<$parent>()),
            {
                let mut lineage = vec![$crate::base::TypeKey::of::<$parent>()];
                lineage.extend(
                    <$parent as $crate::model::EntityKind<$crate::data::Entry>>::lineage(),
                );
                lineage
            }
        );
    };
    (
        @define $(#[$meta:meta])* $kind:ident, $term:expr, $declare:path, $parent:ty,
        $specializes:expr, $lineage:expr
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $kind {
            entry: $crate::data::Entry,
        }

        impl $kind {
            /// A new entry carrying this kind's marker.
            pub fn new() -> Self {
                Self {
                    entry: $crate::data::Entry::new().with_kind(
                        <Self as $crate::model::EntityKind<$crate::data::Entry>>::kind_category(),
                    ),
                }
            }

            pub fn entry(&self) -> &$crate::data::Entry {
                &self.entry
            }

            pub fn into_entry(self) -> $crate::data::Entry {
                self.entry
            }

            /// Lock and return `self`.
            pub fn into_locked(self) -> Self {
                Self {
                    entry: self.entry.into_locked(),
                }
            }
        }

        impl Default for $kind {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $kind {
            type Target = $crate::data::Entry;

            fn deref(&self) -> &Self::Target {
                &self.entry
            }
        }

        impl std::ops::DerefMut for $kind {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.entry
            }
        }

        impl $crate::model::Extension for $kind {
            fn element_name(&self) -> $crate::base::QName {
                <Self as $crate::model::ExtensionKind>::qname()
            }

            fn attributes(&self) -> Vec<$crate::model::Attribute> {
                $crate::model::Extension::attributes(&self.entry)
            }

            fn process_attribute(
                &mut self,
                attribute: &$crate::model::Attribute,
            ) -> Result<(), $crate::model::ModelError> {
                $crate::model::Extension::process_attribute(&mut self.entry, attribute)
            }

            fn process_text(&mut self, text: &str) -> Result<(), $crate::model::ModelError> {
                $crate::model::Extension::process_text(&mut self.entry, text)
            }

            fn content(&self) -> Vec<$crate::model::Content<'_>> {
                $crate::model::Extension::content(&self.entry)
            }

            fn child_element(
                &self,
                name: &$crate::base::QName,
            ) -> Option<Box<dyn $crate::model::Extension>> {
                $crate::model::Extension::child_element(&self.entry, name)
            }

            fn accept_child(
                &mut self,
                child: Box<dyn $crate::model::Extension>,
            ) -> Result<(), $crate::model::ModelError> {
                $crate::model::Extension::accept_child(&mut self.entry, child)
            }

            fn process_end(&mut self) -> Result<(), $crate::model::ModelError> {
                $crate::model::Extension::process_end(&mut self.entry)
            }

            fn extension_point(&self) -> Option<&$crate::model::ExtensionPoint> {
                $crate::model::Extension::extension_point(&self.entry)
            }

            fn extension_point_mut(
                &mut self,
            ) -> Result<Option<&mut $crate::model::ExtensionPoint>, $crate::model::ModelError> {
                $crate::model::Extension::extension_point_mut(&mut self.entry)
            }
        }

        impl $crate::model::ExtensionKind for $kind {
            const NAMESPACE: &'static str = $crate::base::namespaces::ATOM;
            const LOCAL_NAME: &'static str = "entry";
            const REPEATABLE: bool = true;

            fn declare_extensions(
                profile: &mut $crate::model::ExtensionProfile,
            ) -> Result<(), $crate::model::ModelError> {
                profile.declare_supertype(
                    $crate::base::TypeKey::of::<Self>(),
                    $crate::base::TypeKey::of::<$parent>(),
                )?;
                profile.ensure_declared::<$parent>()?;
                $declare(profile, $crate::base::TypeKey::of::<Self>())
            }
        }

        impl $crate::model::EntityKind<$crate::data::Entry> for $kind {
            fn kind_category() -> $crate::model::Category {
                $crate::model::Category::kind($term)
            }

            fn specializes() -> Option<$crate::base::TypeKey> {
                $specializes
            }

            fn lineage() -> Vec<$crate::base::TypeKey> {
                $lineage
            }

            fn declare_kind(
                profile: &mut $crate::model::ExtensionProfile,
                parent: $crate::base::TypeKey,
            ) -> Result<(), $crate::model::ModelError> {
                $declare(profile, parent)
            }

            fn from_base(base: $crate::data::Entry) -> Self {
                Self { entry: base }
            }

            fn base(&self) -> &$crate::data::Entry {
                &self.entry
            }

            fn base_mut(&mut self) -> &mut $crate::data::Entry {
                &mut self.entry
            }

            fn into_base(self: Box<Self>) -> $crate::data::Entry {
                self.entry
            }
        }
    };
}

pub(crate) use entry_kind;

// ============================================================================
// STANDARD REGISTRY
// ============================================================================

/// A registry with every kind this crate defines.
pub fn standard_registry() -> KindRegistry<Entry> {
    let mut registry = KindRegistry::new();
    registry
        .register::<EventEntry>()
        .register::<CalendarEventEntry>()
        .register::<ContactEntry>()
        .register::<PhotoEntry>();
    registry
}

/// Build a profile for feeds whose entries are parsed generically and
/// adapted afterwards.
///
/// Every kind in `registry` has its extensions declared on [`Entry`], so the
/// generic parse already produces typed extensions.
pub fn feed_profile(registry: &KindRegistry<Entry>) -> Result<ExtensionProfile, ModelError> {
    let mut profile = ExtensionProfile::for_root::<Feed>()?;
    profile.ensure_declared::<Entry>()?;
    registry.declare_kinds(&mut profile)?;
    Ok(profile)
}

static STANDARD: LazyLock<ProfileCache> = LazyLock::new(ProfileCache::new);

/// The shared profile for feeds over [`standard_registry`].
pub fn standard_feed_profile() -> Result<Arc<ExtensionProfile>, ModelError> {
    STANDARD.get_or_build(crate::base::TypeKey::of::<Feed>(), || {
        feed_profile(&standard_registry())
    })
}
