//! Contacts and instant-messaging addresses.

use crate::base::{QName, TypeKey, namespaces};
use crate::model::{Attribute, EntityKind, Extension, ExtensionKind, ExtensionProfile, ModelError};

use super::kinds::{entry_kind, terms};
use super::value::parse_bool;

/// `gd:im`: an instant-messaging address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Im {
    address: String,
    label: Option<String>,
    protocol: Option<String>,
    rel: Option<String>,
    primary: bool,
}

impl Im {
    pub const AIM: &'static str = "http://schemas.google.com/g/2005#AIM";
    pub const JABBER: &'static str = "http://schemas.google.com/g/2005#JABBER";
    pub const SKYPE: &'static str = "http://schemas.google.com/g/2005#SKYPE";

    pub const HOME: &'static str = "http://schemas.google.com/g/2005#home";
    pub const WORK: &'static str = "http://schemas.google.com/g/2005#work";
    pub const OTHER: &'static str = "http://schemas.google.com/g/2005#other";

    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Self::default()
        }
    }

    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.protocol = Some(protocol.to_string());
        self
    }

    pub fn with_rel(mut self, rel: &str) -> Self {
        self.rel = Some(rel.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn rel(&self) -> Option<&str> {
        self.rel.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }
}

impl Extension for Im {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = vec![Attribute::new("address", self.address.as_str())];
        let optional = [
            ("label", &self.label),
            ("protocol", &self.protocol),
            ("rel", &self.rel),
        ];
        attributes.extend(optional.into_iter().filter_map(|(name, value)| {
            value.as_deref().map(|value| Attribute::new(name, value))
        }));
        if self.primary {
            attributes.push(Attribute::new("primary", "true"));
        }
        attributes
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.name.is_qualified() {
            return Ok(());
        }
        match attribute.name.local_name() {
            "address" => self.address = attribute.value.clone(),
            "label" => self.label = Some(attribute.value.clone()),
            "protocol" => self.protocol = Some(attribute.value.clone()),
            "rel" => self.rel = Some(attribute.value.clone()),
            "primary" => self.primary = parse_bool("gd:im", attribute)?,
            _ => {}
        }
        Ok(())
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        if self.address.is_empty() {
            return Err(ModelError::missing_attribute(Self::qname(), "address"));
        }
        if self.label.is_some() && self.rel.is_some() {
            return Err(ModelError::invalid_attribute(
                "gd:im takes a label or a rel, not both",
            ));
        }
        Ok(())
    }
}

impl ExtensionKind for Im {
    const NAMESPACE: &'static str = namespaces::GD;
    const LOCAL_NAME: &'static str = "im";
    const REPEATABLE: bool = true;
}

fn declare_contact_extensions(
    profile: &mut ExtensionProfile,
    parent: TypeKey,
) -> Result<(), ModelError> {
    profile.declare(parent, Im::descriptor())
}

entry_kind! {
    /// An entry marked with the contact kind.
    ContactEntry, term = terms::CONTACT, declare = declare_contact_extensions
}

impl ContactEntry {
    pub fn ims(&self) -> impl Iterator<Item = &Im> {
        self.base().point().repeating_extension::<Im>()
    }

    pub fn add_im(&mut self, im: Im) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.add_extension(im)
    }

    /// The address flagged primary, or the first one.
    pub fn primary_im(&self) -> Option<&Im> {
        self.ims()
            .find(|im| im.is_primary())
            .or_else(|| self.ims().next())
    }

    pub fn remove_im(&mut self, im: &Im) -> Result<bool, ModelError> {
        self.base_mut().point_mut()?.remove_extension_value(im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_im_requires_address() {
        let mut im = Im::default();
        im.process_attribute(&Attribute::new("protocol", Im::JABBER))
            .unwrap();
        assert!(matches!(
            im.process_end(),
            Err(ModelError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn test_im_label_and_rel_exclusive() {
        let mut im = Im::new("me@example.com")
            .with_rel(Im::HOME)
            .with_label("chat");
        assert!(im.process_end().is_err());
    }

    #[test]
    fn test_im_attributes() {
        let im = Im::new("me@example.com")
            .with_protocol(Im::SKYPE)
            .primary();
        let names: Vec<_> = im
            .attributes()
            .into_iter()
            .map(|attribute| attribute.name.local_name().to_string())
            .collect();
        assert_eq!(names, vec!["address", "protocol", "primary"]);
    }

    #[test]
    fn test_contact_ims() {
        let mut contact = ContactEntry::new();
        contact.add_im(Im::new("a@example.com")).unwrap();
        contact.add_im(Im::new("b@example.com").primary()).unwrap();

        assert_eq!(contact.ims().count(), 2);
        assert_eq!(
            contact.primary_im().map(Im::address),
            Some("b@example.com")
        );

        assert!(contact.remove_im(&Im::new("a@example.com")).unwrap());
        assert_eq!(contact.ims().count(), 1);
        assert!(!contact.remove_im(&Im::new("a@example.com")).unwrap());
    }
}
