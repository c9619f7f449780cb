//! Shared, lazily built profiles.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

use super::error::ModelError;
use super::extension::ExtensionKind;
use super::profile::ExtensionProfile;
use crate::base::TypeKey;

/// Builds each profile once and hands out shared read-only copies.
///
/// Lookups take a read lock; a miss builds the profile outside the lock and
/// keeps whichever copy was stored first.
#[derive(Debug, Default)]
pub struct ProfileCache {
    profiles: RwLock<FxHashMap<TypeKey, Arc<ExtensionProfile>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The profile stored under `key`, building it with `build` on a miss.
    pub fn get_or_build(
        &self,
        key: TypeKey,
        build: impl FnOnce() -> Result<ExtensionProfile, ModelError>,
    ) -> Result<Arc<ExtensionProfile>, ModelError> {
        if let Some(profile) = self.profiles.read().get(&key) {
            return Ok(Arc::clone(profile));
        }

        let built = Arc::new(build()?);
        debug!("built profile for {key}: {} parent types", built.parent_count());
        let mut profiles = self.profiles.write();
        Ok(Arc::clone(profiles.entry(key).or_insert(built)))
    }

    /// The profile for documents rooted at `T`.
    pub fn profile_for<T: ExtensionKind>(&self) -> Result<Arc<ExtensionProfile>, ModelError> {
        self.get_or_build(TypeKey::of::<T>(), ExtensionProfile::for_root::<T>)
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }

    pub fn clear(&self) {
        self.profiles.write().clear();
    }
}
