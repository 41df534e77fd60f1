use crate::error::ObservationError;
use crate::registry::{DispatchReport, ObservationRegistry};
use crate::value::Value;
use parking_lot::{Mutex, ReentrantMutex};
use std::borrow::Cow;
use std::sync::Arc;

/// A property whose setter reports changes to an [`ObservationRegistry`].
///
/// The registry never detects mutation by itself; embedding an
/// `ObservedProperty` in a subject is the explicit setter instrumentation that
/// feeds it.
///
/// Changes of one property are dispatched one at a time: concurrent setters on
/// other threads wait until the current notification finished, so observers see
/// a consistent `old -> new` chain. A callback may read the property, and may set
/// it again from the dispatching thread.
///
/// # Example
/// ```rust
/// use kvo_observation::{ObservationRegistry, ObservedProperty};
/// use std::sync::Arc;
///
/// struct User {
///     name: ObservedProperty<String>,
/// }
///
/// # fn main() -> Result<(), kvo_observation::ObservationError> {
/// let registry = ObservationRegistry::new();
/// let user = Arc::new(User { name: ObservedProperty::new("name", "Bob".to_owned()) });
/// let view = Arc::new(());
///
/// registry.subscribe(&user, "name", &view, |_, _, new, old| {
///     assert_eq!((new.as_str(), old.as_str()), (Some("Alice"), Some("Bob")));
///     Ok(())
/// })?;
///
/// let report = user.name.set(&registry, &user, "Alice".to_owned())?;
/// assert_eq!(report.map(|r| r.invoked), Some(1));
/// assert!(user.name.set(&registry, &user, "Alice".to_owned())?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ObservedProperty<T> {
    key: Cow<'static, str>,
    value: Mutex<T>,
    dispatch: ReentrantMutex<()>,
}

impl<T> ObservedProperty<T>
where
    T: Clone + PartialEq + Into<Value>,
{
    pub fn new(key: impl Into<Cow<'static, str>>, initial: T) -> Self {
        Self { key: key.into(), value: Mutex::new(initial), dispatch: ReentrantMutex::new(()) }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Stores `value` and notifies observers of `subject`, unless it equals the current value.
    ///
    /// Returns `None` when the value was unchanged and nothing was dispatched.
    ///
    /// # Errors
    /// Propagates the error of [`ObservationRegistry::notify`]. The new value is
    /// stored even when a callback fails.
    pub fn set<S: ?Sized>(
        &self,
        registry: &ObservationRegistry,
        subject: &Arc<S>,
        value: T,
    ) -> Result<Option<DispatchReport>, ObservationError> {
        let _dispatching = self.dispatch.lock();
        let old = {
            let mut current = self.value.lock();
            if *current == value {
                return Ok(None);
            }
            std::mem::replace(&mut *current, value.clone())
        };

        registry.notify(subject, &self.key, &value.into(), &old.into()).map(Some)
    }

    /// Stores `value` and notifies observers of `subject` even if it is unchanged.
    ///
    /// # Errors
    /// Propagates the error of [`ObservationRegistry::notify`].
    pub fn replace<S: ?Sized>(
        &self,
        registry: &ObservationRegistry,
        subject: &Arc<S>,
        value: T,
    ) -> Result<DispatchReport, ObservationError> {
        let _dispatching = self.dispatch.lock();
        let old = std::mem::replace(&mut *self.value.lock(), value.clone());
        registry.notify(subject, &self.key, &value.into(), &old.into())
    }
}
