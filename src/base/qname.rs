//! Namespace-qualified names.

use smol_str::SmolStr;
use std::fmt;

/// A namespace-qualified XML name.
///
/// An empty namespace means "no namespace" (the usual case for attributes).
/// Displayed in Clark notation: `{uri}local`, or just `local` when unqualified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: SmolStr,
    local: SmolStr,
}

impl QName {
    /// Create a qualified name.
    pub fn new(namespace: impl Into<SmolStr>, local: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Create a name with no namespace.
    pub fn local(local: impl Into<SmolStr>) -> Self {
        Self::new("", local)
    }

    /// Parse Clark notation (`{uri}local` or `local`).
    pub fn from_clark(text: &str) -> Option<Self> {
        match text.strip_prefix('{') {
            Some(rest) => {
                let (namespace, local) = rest.split_once('}')?;
                Some(Self::new(namespace, local))
            }
            None => Some(Self::local(text)),
        }
    }

    /// The namespace URI (empty if unqualified).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local part of the name.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Whether the name carries a namespace.
    pub fn is_qualified(&self) -> bool {
        !self.namespace.is_empty()
    }

    /// Whether the local part is a well-formed NCName.
    pub fn is_valid(&self) -> bool {
        is_ncname(&self.local)
    }

    /// Whether this name is `local` in `namespace`.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// Check that `name` is a non-colonized XML name.
///
/// Approximates the XML production with Unicode identifier classes, plus the
/// `-` and `.` characters XML allows after the first position.
pub fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || unicode_ident::is_xid_start(first))
        && chars.all(|c| c == '-' || c == '.' || unicode_ident::is_xid_continue(c))
}
