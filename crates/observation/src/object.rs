use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Type-erased, non-owning handle to a subject or observer.
pub(crate) type WeakObject = Weak<dyn Any + Send + Sync>;

/// Identity of an object taking part in observation.
///
/// Derived from the address of the object's `Arc` allocation, so it is stable
/// for as long as the object lives and identical for every clone of the `Arc`.
/// The registry keeps a weak handle next to every key, which keeps the allocation
/// reserved, so a key cannot be reused by another object while it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey(usize);

impl ObjectKey {
    /// Identity of the object behind `object`.
    #[must_use]
    pub fn of<T: ?Sized>(object: &Arc<T>) -> Self {
        Self(Arc::as_ptr(object).cast::<()>().addr())
    }

    /// Identity of the object behind a weak handle.
    ///
    /// Works inside `Arc::new_cyclic`, before the object is fully constructed,
    /// which is how an object obtains a [`crate::Lifeline`] for itself.
    #[must_use]
    pub fn from_weak<T: ?Sized>(object: &Weak<T>) -> Self {
        Self(Weak::as_ptr(object).cast::<()>().addr())
    }

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

pub(crate) fn downgrade<T: Send + Sync + 'static>(object: &Arc<T>) -> WeakObject {
    let weak: Weak<T> = Arc::downgrade(object);
    weak
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_shared_by_clones_and_weak_handles() {
        let object = Arc::new(String::from("subject"));
        let clone = Arc::clone(&object);
        let weak = Arc::downgrade(&object);

        assert_eq!(ObjectKey::of(&object), ObjectKey::of(&clone));
        assert_eq!(ObjectKey::of(&object), ObjectKey::from_weak(&weak));
        assert_eq!(ObjectKey::of(&object), ObjectKey::from_weak(&downgrade(&object)));
    }

    #[test]
    fn test_erased_handle_tracks_object_lifetime() {
        let object = Arc::new(vec![1_u8, 2, 3]);
        let erased = downgrade(&object);

        assert_eq!(erased.strong_count(), 1);
        assert!(erased.upgrade().and_then(|o| o.downcast::<Vec<u8>>().ok()).is_some());

        drop(object);
        assert!(erased.upgrade().is_none());
    }

    #[test]
    fn test_distinct_objects_have_distinct_keys() {
        let a = Arc::new(());
        let b = Arc::new(());
        assert_ne!(ObjectKey::of(&a), ObjectKey::of(&b));
    }

    #[test]
    fn test_key_available_during_cyclic_construction() {
        struct Node {
            key: ObjectKey,
        }

        let node = Arc::new_cyclic(|weak: &Weak<Node>| Node { key: ObjectKey::from_weak(weak) });
        assert_eq!(node.key, ObjectKey::of(&node));
    }
}
