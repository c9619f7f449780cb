#![allow(clippy::unwrap_used)]
//! Extension point tests: cardinality, removal and locking.

use atomext::QName;
use atomext::data::{
    EventData, EventEntry, EventStatus, MediaContent, MediaGroup, PhotoEntry, Reminder, When,
};
use atomext::model::{Extension, ExtensionPoint, ModelError, OpaqueElement};
use rstest::rstest;

// ============================================================================
// Cardinality
// ============================================================================

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
fn test_repeatable_keeps_every_value_in_order(#[case] count: usize) {
    let mut point = ExtensionPoint::new();
    for index in 0..count {
        point
            .add_extension(When::new(&format!("2026-10-{:02}", index + 1)))
            .unwrap();
    }

    let starts: Vec<_> = point
        .repeating_extension::<When>()
        .map(|when| when.start_time().to_string())
        .collect();
    let expected: Vec<_> = (0..count)
        .map(|index| format!("2026-10-{:02}", index + 1))
        .collect();
    assert_eq!(starts, expected);
}

#[test]
fn test_singleton_set_replaces() {
    let mut point = ExtensionPoint::new();
    point
        .set_extension(EventStatus::new(EventStatus::TENTATIVE))
        .unwrap();
    point
        .set_extension(EventStatus::new(EventStatus::CONFIRMED))
        .unwrap();

    assert_eq!(point.len(), 1);
    assert_eq!(
        point.extension::<EventStatus>().map(EventStatus::value),
        Some(EventStatus::CONFIRMED)
    );
}

#[test]
fn test_set_on_repeatable_kind_fails() {
    let mut point = ExtensionPoint::new();
    assert!(matches!(
        point.set_extension(When::new("2026-10-17")),
        Err(ModelError::Cardinality { .. })
    ));
    assert!(matches!(
        point.add_extension(EventStatus::new(EventStatus::CONFIRMED)),
        Err(ModelError::Cardinality { .. })
    ));
    assert!(point.is_empty());
}

#[test]
fn test_absent_repeatable_reads_empty() {
    let point = ExtensionPoint::new();
    assert_eq!(point.repeating_extension::<When>().count(), 0);
    assert!(point.extension::<EventStatus>().is_none());
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn test_remove_by_type_and_by_value() {
    let mut point = ExtensionPoint::new();
    point.add_extension(When::new("a")).unwrap();
    point.add_extension(When::new("b")).unwrap();
    point.add_extension(When::new("c")).unwrap();

    assert!(point.remove_extension_value(&When::new("b")).unwrap());
    let starts: Vec<_> = point
        .repeating_extension::<When>()
        .map(When::start_time)
        .collect();
    assert_eq!(starts, vec!["a", "c"]);

    assert_eq!(point.remove_extension::<When>().unwrap(), 2);
    assert!(!point.contains::<When>());
}

#[test]
fn test_remove_absent_is_noop() {
    let mut point = ExtensionPoint::new();
    assert_eq!(point.remove_extension::<When>().unwrap(), 0);
    assert!(!point.remove_extension_value(&When::new("x")).unwrap());
}

// ============================================================================
// Locking
// ============================================================================

#[test]
fn test_lock_blocks_every_mutator() {
    let mut point = ExtensionPoint::new();
    point.add_extension(When::new("a")).unwrap();
    point.lock();

    let immutable = |result: Result<(), ModelError>| {
        matches!(result, Err(ModelError::ImmutableState { .. }))
    };
    assert!(immutable(point.add_extension(When::new("b"))));
    assert!(immutable(
        point.set_extension(EventStatus::new(EventStatus::CONFIRMED))
    ));
    assert!(immutable(
        point.add_opaque(OpaqueElement::new(QName::new("urn:x", "y")))
    ));
    assert!(immutable(point.remove_extension::<When>().map(|_| ())));
    assert!(immutable(point.take_extensions::<When>().map(|_| ())));
    assert!(immutable(point.extension_mut::<When>().map(|_| ())));
    assert_eq!(point.repeating_extension::<When>().count(), 1);
}

#[test]
fn test_lock_reaches_nested_points() {
    let mut event = EventEntry::new();
    event.add_time(When::new("2026-10-17")).unwrap();
    event.add_reminder(Reminder::minutes(10)).unwrap();
    let mut event = event.into_locked();

    assert!(event.times().all(Extension::is_locked));
    assert!(matches!(
        event.add_reminder(Reminder::minutes(5)),
        Err(ModelError::ImmutableState { .. })
    ));
}

#[test]
fn test_lock_reaches_media_group() {
    let mut group = MediaGroup::new();
    group.add_content(MediaContent::new("a.jpg")).unwrap();
    let mut photo = PhotoEntry::new();
    photo.set_media_group(group).unwrap();

    let mut photo = photo.into_locked();
    assert!(matches!(
        photo.point_mut(),
        Err(ModelError::ImmutableState { .. })
    ));
    assert!(photo.media_group().is_some_and(Extension::is_locked));
}

#[test]
fn test_locked_point_cannot_be_replaced() {
    let mut event = EventEntry::new();
    event.add_time(When::new("t1")).unwrap();
    let mut event = event.into_locked();

    assert!(event.point_mut().is_err());
    assert!(matches!(
        event.extension_point_mut(),
        Err(ModelError::ImmutableState { .. })
    ));
    assert!(event.add_time(When::new("t3")).is_err());
    assert!(event.point().is_locked());
    assert_eq!(
        event.times().map(When::start_time).collect::<Vec<_>>(),
        vec!["t1"]
    );
}

#[test]
fn test_locked_entry_is_shareable() {
    let mut event = EventEntry::new();
    event.add_time(When::new("2026-10-17")).unwrap();
    let shared = std::sync::Arc::new(event.into_locked());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = std::sync::Arc::clone(&shared);
            std::thread::spawn(move || shared.times().count())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
}
