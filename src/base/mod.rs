//! Foundation types for atomext.
//!
//! This module provides the primitives used throughout the crate:
//! - [`QName`] - Namespace-qualified element and attribute names
//! - [`TypeKey`] - Opaque runtime identity of a Rust type, used as a registry key
//! - [`namespaces`] - Well-known namespace URIs
//!
//! This module has NO dependencies on other atomext modules.

pub mod namespaces;
mod qname;
mod type_key;

pub use qname::{QName, is_ncname};
pub use type_key::TypeKey;
