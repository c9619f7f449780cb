//! Atom entries and feeds.
//!
//! `atom:id`, `atom:title`, `atom:updated` and `atom:category` are intrinsic
//! children: the entry claims them before profile dispatch, so they never
//! appear in the extension point. Everything else is an extension.

use std::borrow::Cow;

use crate::base::{QName, TypeKey, namespaces};
use crate::model::{
    Adapted, Attribute, Categorized, Category, Content, Extension, ExtensionKind, ExtensionPoint,
    ExtensionProfile, KindRegistry, ModelError, downcast,
};

// ============================================================================
// TEXT CONSTRUCTS
// ============================================================================

/// A simple text element such as `atom:title`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextElement {
    name: QName,
    text: String,
    content_type: Option<String>,
}

impl TextElement {
    pub fn new(name: QName, text: impl Into<String>) -> Self {
        Self {
            name,
            text: text.into(),
            content_type: None,
        }
    }

    /// Set the `type` attribute (`text`, `html`, `xhtml`).
    pub fn with_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

impl Extension for TextElement {
    fn element_name(&self) -> QName {
        self.name.clone()
    }

    fn attributes(&self) -> Vec<Attribute> {
        self.content_type
            .iter()
            .map(|value| Attribute::new("type", value.as_str()))
            .collect()
    }

    fn process_attribute(&mut self, attribute: &Attribute) -> Result<(), ModelError> {
        if attribute.is("type") {
            self.content_type = Some(attribute.value.clone());
        }
        Ok(())
    }

    fn process_text(&mut self, text: &str) -> Result<(), ModelError> {
        self.text.push_str(text);
        Ok(())
    }

    fn content(&self) -> Vec<Content<'_>> {
        vec![Content::Text(Cow::Borrowed(&self.text))]
    }
}

fn atom(local: &str) -> QName {
    QName::new(namespaces::ATOM, local)
}

// ============================================================================
// SHARED METADATA
// ============================================================================

/// The intrinsic children shared by entries and feeds.
#[derive(Clone, Debug, Default)]
struct AtomMetadata {
    id: Option<TextElement>,
    title: Option<TextElement>,
    updated: Option<TextElement>,
    categories: Vec<Category>,
}

impl AtomMetadata {
    fn claims(name: &QName) -> Option<Box<dyn Extension>> {
        if name.namespace() != namespaces::ATOM {
            return None;
        }
        match name.local_name() {
            "id" | "title" | "updated" => Some(Box::new(TextElement::new(name.clone(), ""))),
            "category" => Some(Box::new(Category::default())),
            _ => None,
        }
    }

    fn accept(&mut self, child: Box<dyn Extension>) -> Result<(), ModelError> {
        let name = child.element_name();
        if name == Category::qname() {
            if let Some(category) = downcast::<Category>(child) {
                self.insert_category(category);
            }
            return Ok(());
        }
        let Some(text) = downcast::<TextElement>(child) else {
            return Err(ModelError::invalid_content(format!("unexpected child {name}")));
        };
        let slot = match name.local_name() {
            "id" => &mut self.id,
            "title" => &mut self.title,
            "updated" => &mut self.updated,
            _ => return Err(ModelError::invalid_content(format!("unexpected child {name}"))),
        };
        if slot.is_some() {
            return Err(ModelError::cardinality(name.to_string(), "appears more than once"));
        }
        *slot = Some(text);
        Ok(())
    }

    fn content(&self) -> Vec<Content<'_>> {
        let texts = [&self.id, &self.title, &self.updated];
        texts
            .into_iter()
            .flatten()
            .map(|text| Content::Child(text as &dyn Extension))
            .chain(
                self.categories
                    .iter()
                    .map(|category| Content::Child(category as &dyn Extension)),
            )
            .collect()
    }

    /// Add a category unless an equal one is present.
    fn insert_category(&mut self, category: Category) -> bool {
        if self.categories.contains(&category) {
            return false;
        }
        self.categories.push(category);
        true
    }
}

/// Accessors for the intrinsic children, implemented by entries and feeds.
macro_rules! atom_metadata_accessors {
    () => {
        pub fn id(&self) -> Option<&str> {
            self.metadata.id.as_ref().map(TextElement::text)
        }

        pub fn set_id(&mut self, id: &str) -> Result<(), ModelError> {
            self.point.check_mutable()?;
            self.metadata.id = Some(TextElement::new(atom("id"), id));
            Ok(())
        }

        pub fn title(&self) -> Option<&str> {
            self.metadata.title.as_ref().map(TextElement::text)
        }

        pub fn set_title(&mut self, title: &str) -> Result<(), ModelError> {
            self.point.check_mutable()?;
            self.metadata.title = Some(TextElement::new(atom("title"), title).with_type("text"));
            Ok(())
        }

        pub fn updated(&self) -> Option<&str> {
            self.metadata.updated.as_ref().map(TextElement::text)
        }

        pub fn set_updated(&mut self, timestamp: &str) -> Result<(), ModelError> {
            self.point.check_mutable()?;
            self.metadata.updated = Some(TextElement::new(atom("updated"), timestamp));
            Ok(())
        }

        /// Add a category. Returns `false` if an equal one was already present.
        pub fn add_category(&mut self, category: Category) -> Result<bool, ModelError> {
            self.point.check_mutable()?;
            Ok(self.metadata.insert_category(category))
        }

        pub fn remove_category(&mut self, category: &Category) -> Result<bool, ModelError> {
            self.point.check_mutable()?;
            let before = self.metadata.categories.len();
            self.metadata.categories.retain(|existing| existing != category);
            Ok(self.metadata.categories.len() != before)
        }

        pub fn point(&self) -> &ExtensionPoint {
            &self.point
        }

        /// Mutable access to the extension point. Fails once locked.
        pub fn point_mut(&mut self) -> Result<&mut ExtensionPoint, ModelError> {
            self.point.unlocked()
        }

        /// Lock and return `self`.
        pub fn into_locked(mut self) -> Self {
            self.point.lock();
            self
        }
    };
}

// ============================================================================
// ENTRY
// ============================================================================

/// A generic Atom entry.
///
/// Typed views ([`EventEntry`](super::EventEntry) and friends) wrap an
/// `Entry`; [`KindRegistry::adapt`] picks the narrowest one from the
/// entry's kind categories.
#[derive(Clone, Debug, Default)]
pub struct Entry {
    metadata: AtomMetadata,
    point: ExtensionPoint,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    atom_metadata_accessors!();

    /// Add a category on a value that cannot be locked yet.
    pub(crate) fn with_kind(mut self, category: Category) -> Self {
        self.metadata.insert_category(category);
        self
    }
}

impl Extension for Entry {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn content(&self) -> Vec<Content<'_>> {
        self.metadata.content()
    }

    fn child_element(&self, name: &QName) -> Option<Box<dyn Extension>> {
        AtomMetadata::claims(name)
    }

    fn accept_child(&mut self, child: Box<dyn Extension>) -> Result<(), ModelError> {
        self.metadata.accept(child)
    }

    fn extension_point(&self) -> Option<&ExtensionPoint> {
        Some(&self.point)
    }

    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        self.point.unlocked().map(Some)
    }
}

impl ExtensionKind for Entry {
    const NAMESPACE: &'static str = namespaces::ATOM;
    const LOCAL_NAME: &'static str = "entry";
    const REPEATABLE: bool = true;
}

impl Categorized for Entry {
    fn categories(&self) -> &[Category] {
        &self.metadata.categories
    }
}

// ============================================================================
// FEED
// ============================================================================

/// An Atom feed holding repeatable entries.
#[derive(Clone, Debug, Default)]
pub struct Feed {
    metadata: AtomMetadata,
    point: ExtensionPoint,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    atom_metadata_accessors!();

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.point.repeating_extension::<Entry>()
    }

    pub fn add_entry(&mut self, entry: Entry) -> Result<(), ModelError> {
        self.point.add_extension(entry)
    }

    /// Detach every entry and adapt each to its narrowest registered kind.
    pub fn adapt_entries(
        &mut self,
        registry: &KindRegistry<Entry>,
    ) -> Result<Vec<Adapted<Entry>>, ModelError> {
        self.point
            .take_extensions::<Entry>()?
            .into_iter()
            .map(|entry| registry.adapt(entry))
            .collect()
    }
}

impl Extension for Feed {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn content(&self) -> Vec<Content<'_>> {
        self.metadata.content()
    }

    fn child_element(&self, name: &QName) -> Option<Box<dyn Extension>> {
        AtomMetadata::claims(name)
    }

    fn accept_child(&mut self, child: Box<dyn Extension>) -> Result<(), ModelError> {
        self.metadata.accept(child)
    }

    fn extension_point(&self) -> Option<&ExtensionPoint> {
        Some(&self.point)
    }

    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        self.point.unlocked().map(Some)
    }
}

impl ExtensionKind for Feed {
    const NAMESPACE: &'static str = namespaces::ATOM;
    const LOCAL_NAME: &'static str = "feed";

    fn declare_extensions(profile: &mut ExtensionProfile) -> Result<(), ModelError> {
        profile.declare(TypeKey::of::<Feed>(), Entry::descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_metadata_roundtrip_through_children() {
        let mut entry = Entry::new();
        let child = entry.child_element(&atom("title")).unwrap();
        let mut title = downcast::<TextElement>(child).unwrap();
        title.process_text("Standup").unwrap();
        entry.accept_child(Box::new(title)).unwrap();

        assert_eq!(entry.title(), Some("Standup"));
        assert!(entry.child_element(&atom("link")).is_none());
    }

    #[test]
    fn test_duplicate_categories_collapse() {
        let mut entry = Entry::new();
        assert!(entry.add_category(Category::kind("a")).unwrap());
        assert!(!entry.add_category(Category::kind("a").with_label("A")).unwrap());
        assert_eq!(entry.categories().len(), 1);
    }

    #[test]
    fn test_locked_entry_rejects_metadata_changes() {
        let mut entry = Entry::new().into_locked();
        assert!(entry.is_locked());
        assert!(entry.set_title("x").is_err());
        assert!(entry.add_category(Category::kind("a")).is_err());
    }

    #[test]
    fn test_content_order() {
        let mut entry = Entry::new();
        entry.add_category(Category::kind("a")).unwrap();
        entry.set_title("t").unwrap();
        entry.set_id("urn:1").unwrap();

        let names: Vec<_> = entry
            .content()
            .iter()
            .map(|content| match content {
                Content::Child(child) => child.element_name().local_name().to_string(),
                Content::Text(_) => String::new(),
            })
            .collect();
        assert_eq!(names, vec!["id", "title", "category"]);
    }

    #[test]
    fn test_second_title_rejected() {
        let mut entry = Entry::new();
        entry
            .accept_child(Box::new(TextElement::new(atom("title"), "a")))
            .unwrap();
        assert!(
            entry
                .accept_child(Box::new(TextElement::new(atom("title"), "b")))
                .is_err()
        );
    }

    #[test]
    fn test_feed_declares_entries() {
        let profile = ExtensionProfile::for_root::<Feed>().unwrap();
        assert!(profile.is_declared(TypeKey::of::<Feed>(), &Entry::qname()));
    }
}
