#![allow(clippy::unwrap_used)]
//! Kind adaptation tests.

use atomext::base::TypeKey;
use atomext::data::{
    CalendarEventEntry, ContactEntry, Entry, EventData, EventEntry, Im, When, standard_registry,
    terms,
};
use atomext::model::{
    Adapted, Category, EntityKind, Extension, ExtensionPoint, KindRegistry, ModelError,
};
use atomext::{ExtensionKind, QName};
use rstest::rstest;

fn entry_with(categories: &[Category]) -> Entry {
    let mut entry = Entry::new();
    for category in categories {
        entry.add_category(category.clone()).unwrap();
    }
    entry
}

/// A second contact view that does not specialize `ContactEntry`.
#[derive(Clone, Debug, Default)]
struct RivalContact {
    entry: Entry,
}

impl Extension for RivalContact {
    fn element_name(&self) -> QName {
        Entry::qname()
    }

    fn extension_point(&self) -> Option<&ExtensionPoint> {
        Some(self.entry.point())
    }

    fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
        self.entry.point_mut().map(Some)
    }
}

impl EntityKind<Entry> for RivalContact {
    fn kind_category() -> Category {
        Category::kind(terms::CONTACT)
    }

    fn from_base(base: Entry) -> Self {
        Self { entry: base }
    }

    fn base(&self) -> &Entry {
        &self.entry
    }

    fn base_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    fn into_base(self: Box<Self>) -> Entry {
        self.entry
    }
}

const TIERED: &str = "http://example.com/#tiered";

/// Kinds nested `DEPTH` levels below `Tier<0>`, all sharing one marker.
#[derive(Clone, Debug, Default)]
struct Tier<const DEPTH: u8> {
    entry: Entry,
}

impl<const DEPTH: u8> Extension for Tier<DEPTH> {
    fn element_name(&self) -> QName {
        Entry::qname()
    }
}

impl<const DEPTH: u8> EntityKind<Entry> for Tier<DEPTH> {
    fn kind_category() -> Category {
        Category::kind(TIERED)
    }

    fn specializes() -> Option<TypeKey> {
        match DEPTH {
            0 => None,
            1 => Some(TypeKey::of::<Tier<0>>()),
            _ => Some(TypeKey::of::<Tier<1>>()),
        }
    }

    fn lineage() -> Vec<TypeKey> {
        match DEPTH {
            0 => Vec::new(),
            1 => vec![TypeKey::of::<Tier<0>>()],
            _ => vec![TypeKey::of::<Tier<1>>(), TypeKey::of::<Tier<0>>()],
        }
    }

    fn from_base(base: Entry) -> Self {
        Self { entry: base }
    }

    fn base(&self) -> &Entry {
        &self.entry
    }

    fn base_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    fn into_base(self: Box<Self>) -> Entry {
        self.entry
    }
}

#[test]
fn test_narrowest_kind_wins() {
    let registry = standard_registry();
    let adapted = registry
        .adapt(entry_with(&[Category::kind(terms::EVENT)]))
        .unwrap();

    assert_eq!(adapted.kind_key(), Some(TypeKey::of::<CalendarEventEntry>()));
    assert!(adapted.kind::<CalendarEventEntry>().is_some());
    assert!(adapted.kind::<EventEntry>().is_none());
}

#[rstest]
#[case::subtype_first(true)]
#[case::supertype_first(false)]
fn test_registration_order_does_not_matter(#[case] subtype_first: bool) {
    let mut registry = KindRegistry::<Entry>::new();
    if subtype_first {
        registry
            .register::<CalendarEventEntry>()
            .register::<EventEntry>();
    } else {
        registry
            .register::<EventEntry>()
            .register::<CalendarEventEntry>();
    }

    let adapted = registry
        .adapt(entry_with(&[Category::kind(terms::EVENT)]))
        .unwrap();
    assert_eq!(adapted.kind_key(), Some(TypeKey::of::<CalendarEventEntry>()));
}

#[rstest]
#[case::middle_unregistered(false)]
#[case::all_registered(true)]
fn test_unregistered_middle_kind_keeps_chain(#[case] with_middle: bool) {
    let mut registry = KindRegistry::<Entry>::new();
    registry.register::<Tier<2>>().register::<Tier<0>>();
    if with_middle {
        registry.register::<Tier<1>>();
    }

    let adapted = registry
        .adapt(entry_with(&[Category::kind(TIERED)]))
        .unwrap();
    assert_eq!(adapted.kind_key(), Some(TypeKey::of::<Tier<2>>()));
}

#[test]
fn test_entry_without_markers_is_returned_unchanged() {
    let mut entry = Entry::new();
    entry.set_title("Plain").unwrap();
    entry.point_mut().unwrap().add_extension(When::new("2026-10-17")).unwrap();

    let adapted = standard_registry().adapt(entry).unwrap();
    assert!(adapted.is_generic());
    assert_eq!(adapted.kind_key(), None);

    let entry = adapted.into_base();
    assert_eq!(entry.title(), Some("Plain"));
    assert_eq!(entry.point().repeating_extension::<When>().count(), 1);
}

#[test]
fn test_unregistered_marker_stays_generic() {
    let entry = entry_with(&[Category::kind("http://example.com/#unknown")]);
    let adapted = standard_registry().adapt(entry).unwrap();
    assert!(adapted.is_generic());
}

#[test]
fn test_non_kind_category_is_not_a_marker() {
    let entry = entry_with(&[Category::new(None, terms::EVENT)]);
    assert!(standard_registry().adapt(entry).unwrap().is_generic());
}

#[test]
fn test_unrelated_kinds_on_one_marker_are_ambiguous() {
    let mut registry = standard_registry();
    registry.register::<RivalContact>();

    let result = registry.adapt(entry_with(&[Category::kind(terms::CONTACT)]));
    assert!(matches!(
        result,
        Err(ModelError::AmbiguousAdaptation { .. })
    ));

    let event = registry
        .adapt(entry_with(&[Category::kind(terms::EVENT)]))
        .unwrap();
    assert!(event.kind::<CalendarEventEntry>().is_some());
}

#[test]
fn test_two_unrelated_markers_are_ambiguous() {
    let entry = entry_with(&[Category::kind(terms::EVENT), Category::kind(terms::CONTACT)]);
    assert!(matches!(
        standard_registry().adapt(entry),
        Err(ModelError::AmbiguousAdaptation { .. })
    ));
}

#[test]
fn test_adaptation_moves_parsed_extensions() {
    let mut entry = entry_with(&[Category::kind(terms::EVENT)]);
    entry.point_mut().unwrap().add_extension(When::new("a")).unwrap();
    entry.point_mut().unwrap().add_extension(When::new("b")).unwrap();

    let event: CalendarEventEntry = standard_registry()
        .adapt(entry)
        .unwrap()
        .into_kind()
        .unwrap();
    let starts: Vec<_> = event.times().map(When::start_time).collect();
    assert_eq!(starts, vec!["a", "b"]);
}

#[test]
fn test_contact_adaptation_keeps_ims() {
    let mut entry = entry_with(&[Category::kind(terms::CONTACT)]);
    entry
        .point_mut()
        .unwrap()
        .add_extension(Im::new("me@example.com"))
        .unwrap();

    let contact: ContactEntry = standard_registry()
        .adapt(entry)
        .unwrap()
        .into_kind()
        .unwrap();
    assert_eq!(contact.ims().map(Im::address).collect::<Vec<_>>(), vec!["me@example.com"]);
}

#[test]
fn test_into_kind_with_wrong_type_is_none() {
    let adapted = standard_registry()
        .adapt(entry_with(&[Category::kind(terms::CONTACT)]))
        .unwrap();
    assert!(matches!(adapted, Adapted::Kind(_)));
    assert!(adapted.into_kind::<EventEntry>().is_none());
}
