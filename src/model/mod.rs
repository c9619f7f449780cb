//! The extensible-entity model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ ExtensionProfile                                         │
//! │  (parent TypeKey, QName) -> ExtensionDescriptor          │
//! │  + arbitrary-extension flags, supertype links            │
//! └───────────────┬──────────────────────────────────────────┘
//!                 │ resolve / construct
//!                 ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ ExtensionPoint (one per extensible entity)               │
//! │  TypeKey -> Single(value) | Repeated([values])           │
//! └───────────────┬──────────────────────────────────────────┘
//!                 │ categories
//!                 ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ KindRegistry                                             │
//! │  Category -> typed view, narrowest match wins            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Values attach to a point by concrete type. The profile only matters when
//! values come from a document: the parse driver refuses elements that no
//! declaration (or arbitrary-extension fallback) covers, while the typed API
//! on [`ExtensionPoint`] accepts any [`ExtensionKind`].

mod cache;
mod descriptor;
mod error;
mod extension;
mod kind;
mod opaque;
mod point;
mod profile;

pub use cache::ProfileCache;
pub use descriptor::{Constructor, Declarer, ExtensionDescriptor};
pub use error::ModelError;
pub use extension::{
    Attribute, Content, Extension, ExtensionBase, ExtensionKind, downcast, downcast_ref,
};
pub use kind::{Adapted, Categorized, Category, EntityKind, KindRegistry};
pub use opaque::{OpaqueElement, OpaqueNode};
pub use point::ExtensionPoint;
pub use profile::ExtensionProfile;
