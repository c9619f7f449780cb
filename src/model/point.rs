//! The runtime container for attached extensions.
//!
//! ```text
//! ExtensionPoint
//!   slots: IndexMap<TypeKey, Slot>       (first-attach order)
//!     When      -> Repeated [when#1, when#2, when#3]
//!     EventStatus -> Single  status
//!     Opaque    -> Repeated [<x:foo/>, <y:bar/>]
//!   locked: bool
//! ```
//!
//! Values are keyed by their concrete type. Singleton kinds hold one value,
//! repeatable kinds an ordered sequence. Locking freezes the container and
//! every container reachable through its values.

use indexmap::IndexMap;
use std::slice;

use super::descriptor::ExtensionDescriptor;
use super::error::ModelError;
use super::extension::{Extension, ExtensionKind, downcast, downcast_ref};
use super::opaque::OpaqueElement;
use crate::base::TypeKey;

#[derive(Clone, Debug)]
enum Slot {
    Single(Box<dyn Extension>),
    Repeated(Vec<Box<dyn Extension>>),
}

impl Slot {
    fn values(&self) -> &[Box<dyn Extension>] {
        match self {
            Slot::Single(value) => slice::from_ref(value),
            Slot::Repeated(values) => values,
        }
    }

    fn values_mut(&mut self) -> &mut [Box<dyn Extension>] {
        match self {
            Slot::Single(value) => slice::from_mut(value),
            Slot::Repeated(values) => values,
        }
    }

    fn into_values(self) -> Vec<Box<dyn Extension>> {
        match self {
            Slot::Single(value) => vec![value],
            Slot::Repeated(values) => values,
        }
    }
}

/// Holds the extensions attached to one extensible entity.
#[derive(Clone, Debug, Default)]
pub struct ExtensionPoint {
    slots: IndexMap<TypeKey, Slot>,
    locked: bool,
}

impl ExtensionPoint {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// The singleton value of type `T`, if attached.
    pub fn extension<T: Extension>(&self) -> Option<&T> {
        self.values(TypeKey::of::<T>())
            .first()
            .and_then(|value| downcast_ref::<T>(&**value))
    }

    /// Mutable access to the singleton value of type `T`.
    pub fn extension_mut<T: Extension>(&mut self) -> Result<Option<&mut T>, ModelError> {
        self.check_mutable()?;
        Ok(self
            .slots
            .get_mut(&TypeKey::of::<T>())
            .and_then(|slot| slot.values_mut().first_mut())
            .and_then(|value| value.as_any_mut().downcast_mut::<T>()))
    }

    /// All values of type `T` in insertion order. Empty when none are attached.
    pub fn repeating_extension<T: Extension>(&self) -> impl Iterator<Item = &T> {
        self.values(TypeKey::of::<T>())
            .iter()
            .filter_map(|value| downcast_ref::<T>(&**value))
    }

    /// Mutable access to all values of type `T`.
    pub fn repeating_extension_mut<T: Extension>(
        &mut self,
    ) -> Result<impl Iterator<Item = &mut T>, ModelError> {
        self.check_mutable()?;
        Ok(self
            .slots
            .get_mut(&TypeKey::of::<T>())
            .into_iter()
            .flat_map(|slot| slot.values_mut().iter_mut())
            .filter_map(|value| value.as_any_mut().downcast_mut::<T>()))
    }

    /// Opaque elements captured under an arbitrary-extension parent.
    pub fn opaque(&self) -> impl Iterator<Item = &OpaqueElement> {
        self.repeating_extension::<OpaqueElement>()
    }

    /// Every attached value: types in first-attach order, values in
    /// insertion order within a type.
    pub fn extensions(&self) -> impl Iterator<Item = &dyn Extension> {
        self.slots
            .values()
            .flat_map(Slot::values)
            .map(|value| &**value)
    }

    pub fn contains<T: Extension>(&self) -> bool {
        self.contains_key(TypeKey::of::<T>())
    }

    pub fn contains_key(&self, key: TypeKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Total number of attached values.
    pub fn len(&self) -> usize {
        self.slots.values().map(|slot| slot.values().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn values(&self, key: TypeKey) -> &[Box<dyn Extension>] {
        self.slots.get(&key).map(Slot::values).unwrap_or_default()
    }

    // ========================================================================
    // MUTATORS
    // ========================================================================

    /// Store `value` as the singleton of its type, replacing any previous one.
    pub fn set_extension<T: ExtensionKind>(&mut self, value: T) -> Result<(), ModelError> {
        self.check_mutable()?;
        if T::REPEATABLE {
            return Err(ModelError::cardinality(
                T::qname().to_string(),
                "repeatable kind cannot be set, use add_extension",
            ));
        }
        self.slots
            .insert(TypeKey::of::<T>(), Slot::Single(Box::new(value)));
        Ok(())
    }

    /// Append `value` to the sequence of its repeatable type.
    pub fn add_extension<T: ExtensionKind>(&mut self, value: T) -> Result<(), ModelError> {
        self.check_mutable()?;
        if !T::REPEATABLE {
            return Err(ModelError::cardinality(
                T::qname().to_string(),
                "singleton kind cannot be added, use set_extension",
            ));
        }
        self.push(TypeKey::of::<T>(), Box::new(value));
        Ok(())
    }

    /// Append an opaque element.
    pub fn add_opaque(&mut self, element: OpaqueElement) -> Result<(), ModelError> {
        self.check_mutable()?;
        self.push(TypeKey::of::<OpaqueElement>(), Box::new(element));
        Ok(())
    }

    /// Remove every value of type `T`. Returns how many were removed.
    pub fn remove_extension<T: Extension>(&mut self) -> Result<usize, ModelError> {
        self.check_mutable()?;
        Ok(self
            .slots
            .shift_remove(&TypeKey::of::<T>())
            .map_or(0, |slot| slot.values().len()))
    }

    /// Detach and return every value of type `T`, in order.
    pub fn take_extensions<T: Extension>(&mut self) -> Result<Vec<T>, ModelError> {
        self.check_mutable()?;
        Ok(self
            .slots
            .shift_remove(&TypeKey::of::<T>())
            .map(Slot::into_values)
            .unwrap_or_default()
            .into_iter()
            .filter_map(downcast::<T>)
            .collect())
    }

    /// Remove the first attached value equal to `value`.
    pub fn remove_extension_value<T: Extension + PartialEq>(
        &mut self,
        value: &T,
    ) -> Result<bool, ModelError> {
        self.check_mutable()?;
        let key = TypeKey::of::<T>();
        let Some(slot) = self.slots.get_mut(&key) else {
            return Ok(false);
        };
        let Some(index) = slot
            .values()
            .iter()
            .position(|attached| downcast_ref::<T>(&**attached) == Some(value))
        else {
            return Ok(false);
        };

        let now_empty = match slot {
            Slot::Single(_) => true,
            Slot::Repeated(values) => {
                values.remove(index);
                values.is_empty()
            }
        };
        if now_empty {
            self.slots.shift_remove(&key);
        }
        Ok(true)
    }

    /// Attach a parsed value under the rules of its descriptor.
    pub(crate) fn attach(
        &mut self,
        descriptor: &ExtensionDescriptor,
        value: Box<dyn Extension>,
    ) -> Result<(), ModelError> {
        self.check_mutable()?;
        let key = descriptor.target();
        if descriptor.is_repeatable() {
            self.push(key, value);
            return Ok(());
        }
        if self.slots.contains_key(&key) {
            return Err(ModelError::cardinality(
                descriptor.name().to_string(),
                "singleton kind appears more than once",
            ));
        }
        self.slots.insert(key, Slot::Single(value));
        Ok(())
    }

    fn push(&mut self, key: TypeKey, value: Box<dyn Extension>) {
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Slot::Repeated(Vec::new()));
        if let Slot::Single(_) = slot {
            let previous = std::mem::replace(slot, Slot::Repeated(Vec::new()));
            *slot = Slot::Repeated(previous.into_values());
        }
        if let Slot::Repeated(values) = slot {
            values.push(value);
        }
    }

    // ========================================================================
    // LOCKING
    // ========================================================================

    /// Freeze this container and every container nested below it.
    pub fn lock(&mut self) {
        self.locked = true;
        for slot in self.slots.values_mut() {
            for value in slot.values_mut() {
                value.lock();
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// `self`, or `ImmutableState` if locked.
    pub fn unlocked(&mut self) -> Result<&mut Self, ModelError> {
        self.check_mutable()?;
        Ok(self)
    }

    /// Fail with `ImmutableState` if locked.
    pub fn check_mutable(&self) -> Result<(), ModelError> {
        if self.locked {
            Err(ModelError::immutable("extension point"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::QName;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Status(String);

    impl Extension for Status {
        fn element_name(&self) -> QName {
            Self::qname()
        }
    }

    impl ExtensionKind for Status {
        const NAMESPACE: &'static str = "urn:test";
        const LOCAL_NAME: &'static str = "status";
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Time(u32);

    impl Extension for Time {
        fn element_name(&self) -> QName {
            Self::qname()
        }
    }

    impl ExtensionKind for Time {
        const NAMESPACE: &'static str = "urn:test";
        const LOCAL_NAME: &'static str = "when";
        const REPEATABLE: bool = true;
    }

    #[derive(Clone, Debug, Default)]
    struct Nested {
        point: ExtensionPoint,
    }

    impl Extension for Nested {
        fn element_name(&self) -> QName {
            Self::qname()
        }

        fn extension_point(&self) -> Option<&ExtensionPoint> {
            Some(&self.point)
        }

        fn extension_point_mut(&mut self) -> Result<Option<&mut ExtensionPoint>, ModelError> {
            self.point.unlocked().map(Some)
        }
    }

    impl ExtensionKind for Nested {
        const NAMESPACE: &'static str = "urn:test";
        const LOCAL_NAME: &'static str = "nested";
    }

    #[test]
    fn test_set_replaces_singleton() {
        let mut point = ExtensionPoint::new();
        point.set_extension(Status("a".into())).unwrap();
        point.set_extension(Status("b".into())).unwrap();

        assert_eq!(point.len(), 1);
        assert_eq!(point.extension::<Status>(), Some(&Status("b".into())));
    }

    #[test]
    fn test_add_preserves_order() {
        let mut point = ExtensionPoint::new();
        for n in 1..=3 {
            point.add_extension(Time(n)).unwrap();
        }
        let times: Vec<u32> = point.repeating_extension::<Time>().map(|t| t.0).collect();
        assert_eq!(times, vec![1, 2, 3]);
    }

    #[test]
    fn test_cardinality_misuse_rejected() {
        let mut point = ExtensionPoint::new();
        assert!(matches!(
            point.set_extension(Time(1)),
            Err(ModelError::Cardinality { .. })
        ));
        assert!(matches!(
            point.add_extension(Status::default()),
            Err(ModelError::Cardinality { .. })
        ));
    }

    #[test]
    fn test_repeating_extension_empty_when_absent() {
        let point = ExtensionPoint::new();
        assert_eq!(point.repeating_extension::<Time>().count(), 0);
        assert!(point.extension::<Status>().is_none());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut point = ExtensionPoint::new();
        assert_eq!(point.remove_extension::<Time>().unwrap(), 0);
        assert!(!point.remove_extension_value(&Time(9)).unwrap());
    }

    #[test]
    fn test_remove_single_value() {
        let mut point = ExtensionPoint::new();
        point.add_extension(Time(1)).unwrap();
        point.add_extension(Time(2)).unwrap();

        assert!(point.remove_extension_value(&Time(1)).unwrap());
        let left: Vec<u32> = point.repeating_extension::<Time>().map(|t| t.0).collect();
        assert_eq!(left, vec![2]);

        assert!(point.remove_extension_value(&Time(2)).unwrap());
        assert!(!point.contains::<Time>());
    }

    #[test]
    fn test_locked_point_rejects_mutation() {
        let mut point = ExtensionPoint::new();
        point.add_extension(Time(1)).unwrap();
        point.lock();

        assert!(matches!(
            point.add_extension(Time(2)),
            Err(ModelError::ImmutableState { .. })
        ));
        assert!(point.remove_extension::<Time>().is_err());
        assert!(point.extension_mut::<Time>().is_err());
        assert_eq!(point.repeating_extension::<Time>().count(), 1);
    }

    #[test]
    fn test_lock_propagates_to_nested_points() {
        let mut nested = Nested::default();
        nested.point.set_extension(Status::default()).unwrap();

        let mut point = ExtensionPoint::new();
        point.set_extension(nested).unwrap();
        point.lock();

        let inner = point.extension::<Nested>().unwrap();
        assert!(inner.is_locked());
        assert!(inner.point.check_mutable().is_err());
    }

    #[test]
    fn test_attach_rejects_second_singleton() {
        let mut point = ExtensionPoint::new();
        let descriptor = Status::descriptor();
        point
            .attach(&descriptor, Box::new(Status::default()))
            .unwrap();
        assert!(
            point
                .attach(&descriptor, Box::new(Status::default()))
                .is_err()
        );
    }
}
