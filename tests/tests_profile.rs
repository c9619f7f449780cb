#![allow(clippy::unwrap_used)]
//! Extension profile tests: declaration, resolution and sharing.

use std::sync::Arc;

use atomext::base::namespaces;
use atomext::data::{
    CalendarEventEntry, Entry, EventEntry, EventStatus, Feed, Im, MediaGroup, MediaThumbnail,
    Reminder, Sequence, When,
};
use atomext::model::{
    ExtensionDescriptor, ExtensionKind, ExtensionProfile, ModelError, ProfileCache,
};
use atomext::{QName, TypeKey};
use rstest::rstest;

#[test]
fn test_identical_redeclaration_is_noop() {
    let mut profile = ExtensionProfile::new();
    let event = TypeKey::of::<EventEntry>();
    profile.declare(event, When::descriptor()).unwrap();
    profile.declare(event, When::descriptor()).unwrap();
    assert_eq!(profile.declarations(event).count(), 1);
}

#[test]
fn test_conflicting_declaration_fails() {
    let mut profile = ExtensionProfile::new();
    let event = TypeKey::of::<EventEntry>();
    profile.declare(event, When::descriptor()).unwrap();

    let conflicting = Sequence::descriptor().with_name(When::qname());
    assert!(matches!(
        profile.declare(event, conflicting),
        Err(ModelError::DuplicateDeclaration { .. })
    ));
}

#[test]
fn test_redeclaring_with_other_cardinality_fails() {
    let mut profile = ExtensionProfile::new();
    let event = TypeKey::of::<EventEntry>();
    profile.declare(event, EventStatus::descriptor()).unwrap();

    match profile.declare(event, EventStatus::descriptor().required()) {
        Err(ModelError::DuplicateDeclaration {
            existing, requested, ..
        }) => {
            assert!(!existing.contains("required"));
            assert!(requested.ends_with("(required)"));
        }
        other => panic!("expected DuplicateDeclaration, got {other:?}"),
    }
    assert!(profile.declare(event, When::descriptor().single()).is_ok());
    assert!(profile.declare(event, When::descriptor()).is_err());
    assert_eq!(profile.required(event).count(), 0);
}

#[rstest]
#[case("")]
#[case("1when")]
#[case("a b")]
fn test_invalid_names_rejected(#[case] local: &str) {
    let mut profile = ExtensionProfile::new();
    let descriptor = When::descriptor().with_name(QName::new(namespaces::GD, local));
    assert!(matches!(
        profile.declare(TypeKey::of::<EventEntry>(), descriptor),
        Err(ModelError::Invalid { .. })
    ));
}

#[test]
fn test_resolve_checks_own_then_inherited() {
    let profile = ExtensionProfile::for_root::<CalendarEventEntry>().unwrap();
    let calendar = TypeKey::of::<CalendarEventEntry>();

    let sequence = profile.resolve(calendar, &Sequence::qname()).unwrap();
    assert_eq!(sequence.target(), TypeKey::of::<Sequence>());

    let status = profile.resolve(calendar, &EventStatus::qname()).unwrap();
    assert_eq!(status.target(), TypeKey::of::<EventStatus>());
    assert!(!status.is_repeatable());

    let when = profile.resolve(calendar, &When::qname()).unwrap();
    assert!(when.is_repeatable());

    assert!(
        profile
            .resolve(TypeKey::of::<EventEntry>(), &Sequence::qname())
            .is_none()
    );
}

#[test]
fn test_resolve_miss_and_arbitrary_fallback() {
    let mut profile = ExtensionProfile::for_root::<EventEntry>().unwrap();
    let event = TypeKey::of::<EventEntry>();
    let unknown = QName::new("urn:vendor", "flag");

    assert!(profile.resolve(event, &unknown).is_none());

    profile.declare_arbitrary_extension(TypeKey::of::<Entry>());
    let descriptor = profile.resolve(event, &unknown).unwrap();
    assert!(descriptor.is_opaque());
    assert_eq!(descriptor.name(), &unknown);
    assert!(!profile.is_declared(event, &unknown));
}

#[test]
fn test_nested_profiles_are_auto_declared() {
    let profile = ExtensionProfile::for_root::<Feed>().unwrap();
    assert!(profile.is_declared(TypeKey::of::<Feed>(), &Entry::qname()));

    let profile = ExtensionProfile::for_root::<EventEntry>().unwrap();
    assert!(profile.is_declared(TypeKey::of::<When>(), &Reminder::qname()));
}

#[test]
fn test_supertype_cycle_rejected() {
    let mut profile = ExtensionProfile::new();
    let a = TypeKey::of::<EventEntry>();
    let b = TypeKey::of::<CalendarEventEntry>();
    profile.declare_supertype(b, a).unwrap();
    assert!(profile.declare_supertype(a, b).is_err());
    assert!(profile.declare_supertype(b, TypeKey::of::<Feed>()).is_err());
}

#[test]
fn test_required_descriptors_are_inherited() {
    let mut profile = ExtensionProfile::new();
    let event = TypeKey::of::<EventEntry>();
    let calendar = TypeKey::of::<CalendarEventEntry>();
    profile
        .declare(event, ExtensionDescriptor::of::<EventStatus>().required())
        .unwrap();
    profile.declare(calendar, Sequence::descriptor()).unwrap();
    profile.declare_supertype(calendar, event).unwrap();

    let required: Vec<_> = profile
        .required(calendar)
        .map(|descriptor| descriptor.name().clone())
        .collect();
    assert_eq!(required, vec![EventStatus::qname()]);
}

#[test]
fn test_declarations_keep_order() {
    let profile = ExtensionProfile::for_root::<MediaGroup>().unwrap();
    let names: Vec<_> = profile
        .declarations(TypeKey::of::<MediaGroup>())
        .map(|descriptor| descriptor.name().local_name().to_string())
        .collect();
    assert_eq!(names, vec!["content", "title", "thumbnail", "keywords", "credit"]);
    assert!(profile.is_declared(TypeKey::of::<MediaGroup>(), &MediaThumbnail::qname()));
}

#[test]
fn test_cache_builds_each_root_once() {
    let cache = ProfileCache::new();
    let first = cache.profile_for::<EventEntry>().unwrap();
    let second = cache.profile_for::<EventEntry>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    cache.profile_for::<Feed>().unwrap();
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_cache_shared_across_threads() {
    let cache = Arc::new(ProfileCache::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || cache.profile_for::<CalendarEventEntry>().unwrap())
        })
        .collect();
    let profiles: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(profiles.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert!(!profiles[0].is_declared(TypeKey::of::<CalendarEventEntry>(), &Im::qname()));
}
