//! # atomext
//!
//! Schema-driven extensible Atom entries: extension profiles, typed
//! extension points, kind adaptation, and a profile-driven parse/generate
//! driver.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! data      → Atom entry/feed, calendar, contacts, media, geo, photos
//!   ↓
//! xml       → Parse/generate driver, event streams, quick-xml adapters
//!   ↓
//! model     → Extension traits, profiles, extension points, kind registry
//!   ↓
//! base      → Primitives (QName, TypeKey, namespace URIs)
//! ```

// ============================================================================
// MODULES (dependency order: base → model → xml → data)
// ============================================================================

/// Foundation types: QName, TypeKey, namespaces
pub mod base;

/// Extension model: profiles, extension points, adaptation
pub mod model;

/// Parse/generate driver over tokenized element streams
pub mod xml;

/// Domain types built on the model
pub mod data;

// Re-export foundation types
pub use base::{QName, TypeKey};

// Re-export the core model
pub use model::{
    Adapted, Category, EntityKind, Extension, ExtensionDescriptor, ExtensionKind, ExtensionPoint,
    ExtensionProfile, KindRegistry, ModelError, ProfileCache,
};
