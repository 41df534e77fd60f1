//! # Observation
//!
//! Thread-safe key-value observation: register callbacks for changes of a named
//! property on a shared object, and dispatch them when the change is reported.
//!
//! ## Overview
//!
//! An [`ObservationRegistry`] maps `(subject, key)` pairs to an ordered list of
//! observer callbacks. Subjects and observers are plain `Arc`s; the registry only
//! holds weak handles to them, so it never extends their lifetime.
//!
//! ## Features
//!
//! * **Typed callbacks**: `Fn(&Arc<Observer>, key, new, old)`; values travel as [`Value`].
//! * **Last write wins**: subscribing the same triple twice replaces the callback.
//! * **Reentrant dispatch**: callbacks run outside the lock over a snapshot.
//! * **Lifecycle**: explicit [`ObservationRegistry::dispose`], [`Lifeline`] drop guards,
//!   and pruning of expired handles.
//! * **Failure policy**: fail fast or isolate failing observers ([`DispatchPolicy`]).
//!
//! Detecting that a property changed is the caller's job: call
//! [`ObservationRegistry::notify`] from the setter, or use [`ObservedProperty`].
//!
//! # Example
//!
//! ```rust
//! use kvo_observation::{ObservationError, ObservationRegistry, ObserveExt, Value};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct User;
//! struct Controller {
//!     renders: AtomicUsize,
//! }
//!
//! fn main() -> Result<(), ObservationError> {
//!     let registry = ObservationRegistry::new();
//!     let user = Arc::new(User);
//!     let controller = Arc::new(Controller { renders: AtomicUsize::new(0) });
//!
//!     user.add_observer(&registry, &controller, "name", |controller, _key, new, _old| {
//!         assert_eq!(new, &Value::from("Alice"));
//!         controller.renders.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     })?;
//!
//!     user.notify_change(&registry, "name", "Alice", "Bob")?;
//!     assert_eq!(controller.renders.load(Ordering::SeqCst), 1);
//!
//!     user.remove_observer(&registry, &controller, "name");
//!     user.notify_change(&registry, "name", "Carol", "Alice")?;
//!     assert_eq!(controller.renders.load(Ordering::SeqCst), 1);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod ext;
mod object;
mod property;
mod registry;
mod value;

pub use config::{DispatchPolicy, RegistryConfig, load_config};
pub use error::{CallbackError, ObservationError, ObservationErrorExt};
pub use ext::ObserveExt;
pub use object::ObjectKey;
pub use property::ObservedProperty;
pub use registry::{DispatchReport, Lifeline, ObservationRegistry, SubscriptionState};
pub use value::Value;
