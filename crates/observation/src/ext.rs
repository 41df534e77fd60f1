use crate::error::{CallbackError, ObservationError};
use crate::registry::{DispatchReport, ObservationRegistry};
use crate::value::Value;
use std::sync::Arc;

/// Observation methods available on every shared object.
///
/// Lets the observed object itself be the receiver, mirroring
/// "add observer for key" / "remove observer for key" APIs.
///
/// ```rust
/// use kvo_observation::{ObservationRegistry, ObserveExt};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), kvo_observation::ObservationError> {
/// let registry = ObservationRegistry::new();
/// let user = Arc::new(());
/// let controller = Arc::new(());
///
/// user.add_observer(&registry, &controller, "name", |_, _, _, _| Ok(()))?;
/// assert_eq!(user.notify_change(&registry, "name", "Alice", "Bob")?.invoked, 1);
/// assert!(user.remove_observer(&registry, &controller, "name"));
/// # Ok(())
/// # }
/// ```
pub trait ObserveExt {
    /// See [`ObservationRegistry::subscribe`].
    ///
    /// # Errors
    /// Returns [`ObservationError::InvalidArgument`] if `key` is empty or blank.
    fn add_observer<O, F>(
        &self,
        registry: &ObservationRegistry,
        observer: &Arc<O>,
        key: impl Into<String>,
        callback: F,
    ) -> Result<(), ObservationError>
    where
        O: Send + Sync + 'static,
        F: Fn(&Arc<O>, &str, &Value, &Value) -> Result<(), CallbackError> + Send + Sync + 'static;

    /// See [`ObservationRegistry::unsubscribe`].
    fn remove_observer<O: ?Sized>(
        &self,
        registry: &ObservationRegistry,
        observer: &Arc<O>,
        key: &str,
    ) -> bool;

    /// See [`ObservationRegistry::notify`].
    ///
    /// # Errors
    /// Propagates callback failures according to the registry's dispatch policy.
    fn notify_change(
        &self,
        registry: &ObservationRegistry,
        key: &str,
        new: impl Into<Value>,
        old: impl Into<Value>,
    ) -> Result<DispatchReport, ObservationError>;
}

impl<S: Send + Sync + 'static> ObserveExt for Arc<S> {
    fn add_observer<O, F>(
        &self,
        registry: &ObservationRegistry,
        observer: &Arc<O>,
        key: impl Into<String>,
        callback: F,
    ) -> Result<(), ObservationError>
    where
        O: Send + Sync + 'static,
        F: Fn(&Arc<O>, &str, &Value, &Value) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        registry.subscribe(self, key, observer, callback)
    }

    fn remove_observer<O: ?Sized>(
        &self,
        registry: &ObservationRegistry,
        observer: &Arc<O>,
        key: &str,
    ) -> bool {
        registry.unsubscribe(self, key, observer)
    }

    fn notify_change(
        &self,
        registry: &ObservationRegistry,
        key: &str,
        new: impl Into<Value>,
        old: impl Into<Value>,
    ) -> Result<DispatchReport, ObservationError> {
        registry.notify(self, key, &new.into(), &old.into())
    }
}
