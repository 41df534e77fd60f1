use crate::config::{DispatchPolicy, RegistryConfig};
use crate::error::{CallbackError, ObservationError};
use crate::object::{ObjectKey, WeakObject, downgrade};
use crate::value::Value;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Weak};
use tracing::{debug, trace, warn};

// Yields `None` once the observer is gone.
type ErasedCallback =
    Arc<dyn Fn(&str, &Value, &Value) -> Option<Result<(), CallbackError>> + Send + Sync>;

type Subjects = FxHashMap<ObjectKey, SubjectEntry>;

/// Subject count below which `subscribe` never sweeps for expired entries.
const SWEEP_THRESHOLD: usize = 64;

static GLOBAL: LazyLock<ObservationRegistry> = LazyLock::new(ObservationRegistry::new);

/// Lifecycle of a single subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    /// Registered and receiving notifications.
    Active,
    /// Unsubscribed, disposed or purged. Terminal.
    Removed,
}

/// Outcome of a single [`ObservationRegistry::notify`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Callbacks that were invoked.
    pub invoked: usize,
    /// Invoked callbacks that returned an error. Only non-zero under [`DispatchPolicy::Isolate`].
    pub failed: usize,
    /// Subscriptions dropped during the call because their subject or observer expired.
    pub pruned: usize,
}

impl DispatchReport {
    /// Callbacks that completed successfully.
    #[must_use]
    pub const fn delivered(&self) -> usize {
        self.invoked - self.failed
    }
}

struct Subscription {
    observer: ObjectKey,
    handle: WeakObject,
    callback: ErasedCallback,
}

impl Subscription {
    fn is_expired(&self) -> bool {
        self.handle.strong_count() == 0
    }
}

struct SubjectEntry {
    handle: WeakObject,
    keys: FxHashMap<String, Vec<Subscription>>,
}

impl SubjectEntry {
    fn new(handle: WeakObject) -> Self {
        Self { handle, keys: FxHashMap::default() }
    }

    fn is_expired(&self) -> bool {
        self.handle.strong_count() == 0
    }

    fn len(&self) -> usize {
        self.keys.values().map(Vec::len).sum()
    }

    fn into_subscriptions(self) -> impl Iterator<Item = Subscription> {
        self.keys.into_values().flatten()
    }

    /// Moves every subscription matching `remove` into `removed`, dropping emptied keys.
    fn drain_where(
        &mut self,
        removed: &mut Vec<Subscription>,
        mut remove: impl FnMut(&Subscription) -> bool,
    ) {
        self.keys.retain(|_, subscriptions| {
            removed.extend(subscriptions.extract_if(.., |s| remove(s)));
            !subscriptions.is_empty()
        });
    }
}

struct Inner {
    subjects: Mutex<Subjects>,
    /// Subject count at which the next `subscribe` sweeps expired entries.
    sweep_at: AtomicUsize,
    config: RegistryConfig,
}

impl Inner {
    fn new(config: RegistryConfig) -> Self {
        Self {
            subjects: Mutex::default(),
            sweep_at: AtomicUsize::new(SWEEP_THRESHOLD),
            config,
        }
    }

    // Removed subscriptions are returned instead of dropped: their callbacks may own
    // objects whose lifelines re-enter the registry, and the lock is not reentrant.
    fn dispose(&self, object: ObjectKey) -> Vec<Subscription> {
        let mut removed = Vec::new();
        let mut subjects = self.subjects.lock();

        if let Some(entry) = subjects.remove(&object) {
            removed.extend(entry.into_subscriptions());
        }
        subjects.retain(|_, entry| {
            entry.drain_where(&mut removed, |s| s.observer == object);
            !entry.keys.is_empty()
        });
        drop(subjects);

        removed
    }
}

/// Moves every subscription whose subject or observer has expired into `removed`.
fn sweep_expired(subjects: &mut Subjects, removed: &mut Vec<Subscription>) {
    subjects.retain(|_, entry| {
        if entry.is_expired() {
            removed.extend(std::mem::take(&mut entry.keys).into_values().flatten());
            return false;
        }
        entry.drain_where(removed, Subscription::is_expired);
        !entry.keys.is_empty()
    });
}

/// A thread-safe registry of key-value observations.
///
/// Maps `(subject, key)` pairs to an ordered list of observer callbacks. Neither
/// subjects nor observers are kept alive by the registry: both are held through
/// weak handles, and subscriptions disappear on [`unsubscribe`](Self::unsubscribe),
/// [`dispose`](Self::dispose), when a [`Lifeline`] is dropped, or when an expired
/// handle is discovered. Subscribing also sweeps expired entries whenever the
/// number of subjects has doubled since the last sweep, so objects dropped
/// without a lifeline do not accumulate.
///
/// Cloning is cheap and yields a handle to the same registry.
///
/// Change detection is not part of the registry: whatever mutates a property is
/// expected to call [`notify`](Self::notify) (see [`crate::ObservedProperty`]).
#[derive(Clone)]
pub struct ObservationRegistry {
    inner: Arc<Inner>,
}

impl ObservationRegistry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self { inner: Arc::new(Inner::new(config)) }
    }

    /// Process-wide registry, created on first use.
    ///
    /// Prefer an explicit instance per subsystem; this exists for code that wants
    /// "every object is observable" ergonomics without threading a registry through.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Registers `callback` for changes of `key` on `subject`, on behalf of `observer`.
    ///
    /// Subscribing the same `(subject, key, observer)` triple again replaces the
    /// previous callback; the subscription keeps its original dispatch position.
    ///
    /// # Errors
    /// Returns [`ObservationError::InvalidArgument`] if `key` is empty or blank.
    ///
    /// # Examples
    /// ```rust
    /// use kvo_observation::{ObservationRegistry, Value};
    /// use std::sync::Arc;
    ///
    /// # fn main() -> Result<(), kvo_observation::ObservationError> {
    /// let registry = ObservationRegistry::new();
    /// let user = Arc::new("user");
    /// let controller = Arc::new("controller");
    ///
    /// registry.subscribe(&user, "name", &controller, |_, key, new, _| {
    ///     assert_eq!(key, "name");
    ///     assert_eq!(new, &Value::from("Alice"));
    ///     Ok(())
    /// })?;
    /// let report = registry.notify(&user, "name", &"Alice".into(), &"Bob".into())?;
    /// assert_eq!(report.invoked, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<S, O, F>(
        &self,
        subject: &Arc<S>,
        key: impl Into<String>,
        observer: &Arc<O>,
        callback: F,
    ) -> Result<(), ObservationError>
    where
        S: Send + Sync + 'static,
        O: Send + Sync + 'static,
        F: Fn(&Arc<O>, &str, &Value, &Value) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        let key = validate_key(key.into())?;
        let subject_id = ObjectKey::of(subject);
        let observer_id = ObjectKey::of(observer);

        let target = Arc::downgrade(observer);
        let dispatch: ErasedCallback = Arc::new(
            move |key: &str, new: &Value, old: &Value| -> Option<Result<(), CallbackError>> {
                let observer = target.upgrade()?;
                Some(callback(&observer, key, new, old))
            },
        );
        let subscription =
            Subscription { observer: observer_id, handle: downgrade(observer), callback: dispatch };

        let mut discarded = Vec::new();
        let replaced = {
            let mut subjects = self.inner.subjects.lock();
            let entry =
                subjects.entry(subject_id).or_insert_with(|| SubjectEntry::new(downgrade(subject)));

            let subscriptions = entry.keys.entry(key.clone()).or_default();
            let replaced = match subscriptions.iter_mut().find(|s| s.observer == observer_id) {
                Some(existing) => {
                    discarded.push(std::mem::replace(existing, subscription));
                    true
                },
                None => {
                    subscriptions.push(subscription);
                    false
                },
            };

            if subjects.len() >= self.inner.sweep_at.load(Ordering::Relaxed) {
                let before = discarded.len();
                sweep_expired(&mut subjects, &mut discarded);
                let next = (subjects.len() * 2).max(SWEEP_THRESHOLD);
                self.inner.sweep_at.store(next, Ordering::Relaxed);
                debug!(
                    removed = discarded.len() - before,
                    next_sweep = next,
                    "Expired subscriptions swept"
                );
            }
            replaced
        };
        drop(discarded);

        trace!(
            subject = %subject_id,
            observer = %observer_id,
            key = %key,
            replaced,
            "Observer subscribed"
        );
        Ok(())
    }

    /// Removes the subscription of `observer` for `key` on `subject`.
    ///
    /// Removing a subscription that does not exist is a no-op. Returns whether a
    /// subscription was removed.
    pub fn unsubscribe<S: ?Sized, O: ?Sized>(
        &self,
        subject: &Arc<S>,
        key: &str,
        observer: &Arc<O>,
    ) -> bool {
        let subject_id = ObjectKey::of(subject);
        let observer_id = ObjectKey::of(observer);

        let removed = {
            let mut subjects = self.inner.subjects.lock();
            let Some(entry) = subjects.get_mut(&subject_id) else {
                return false;
            };
            let removed = entry.keys.get_mut(key).and_then(|subscriptions| {
                let index = subscriptions.iter().position(|s| s.observer == observer_id)?;
                Some(subscriptions.remove(index))
            });
            if entry.keys.get(key).is_some_and(Vec::is_empty) {
                entry.keys.remove(key);
            }
            if entry.keys.is_empty() {
                subjects.remove(&subject_id);
            }
            removed
        };

        let found = removed.is_some();
        trace!(subject = %subject_id, observer = %observer_id, key, found, "Observer unsubscribed");
        found
    }

    /// Dispatches a change of `key` on `subject` to every matching observer.
    ///
    /// Callbacks run synchronously on the calling thread, in subscription order,
    /// over a snapshot taken under the registry lock. A callback may subscribe,
    /// unsubscribe or notify re-entrantly; changes it makes apply to later
    /// notifications, not to the one in progress.
    ///
    /// # Errors
    /// Under [`DispatchPolicy::FailFast`] the first callback error is returned as
    /// [`ObservationError::Callback`] and the remaining callbacks are skipped. Under
    /// [`DispatchPolicy::Isolate`] failures are logged and counted instead.
    pub fn notify<S: ?Sized>(
        &self,
        subject: &Arc<S>,
        key: &str,
        new: &Value,
        old: &Value,
    ) -> Result<DispatchReport, ObservationError> {
        let subject_id = ObjectKey::of(subject);
        let (snapshot, pruned) = self.snapshot(subject_id, key);
        let mut report = DispatchReport { pruned, ..DispatchReport::default() };

        for (observer_id, callback) in snapshot {
            let Some(outcome) = callback(key, new, old) else {
                continue;
            };
            report.invoked += 1;

            if let Err(source) = outcome {
                match self.inner.config.dispatch {
                    DispatchPolicy::FailFast => {
                        return Err(ObservationError::Callback {
                            source,
                            context: Some(format!("key '{key}' on subject {subject_id}").into()),
                        });
                    },
                    DispatchPolicy::Isolate => {
                        report.failed += 1;
                        warn!(
                            subject = %subject_id,
                            observer = %observer_id,
                            key,
                            error = %source,
                            "Observer callback failed; continuing dispatch"
                        );
                    },
                }
            }
        }

        trace!(
            subject = %subject_id,
            key,
            new = new.type_name(),
            invoked = report.invoked,
            failed = report.failed,
            pruned = report.pruned,
            "Change dispatched"
        );
        Ok(report)
    }

    /// Removes every subscription in which `object` is the subject or the observer.
    ///
    /// Returns the number of subscriptions removed.
    pub fn dispose<T: ?Sized>(&self, object: &Arc<T>) -> usize {
        self.dispose_key(ObjectKey::of(object))
    }

    /// Same as [`dispose`](Self::dispose), by identity.
    pub fn dispose_key(&self, object: ObjectKey) -> usize {
        let removed = self.inner.dispose(object).len();
        debug!(object = %object, removed, "Object disposed");
        removed
    }

    /// Creates a guard that disposes `object` from this registry when dropped.
    ///
    /// Store it inside the object, so destroying the object cleans up every
    /// subscription it takes part in. The guard does not keep the registry alive.
    ///
    /// # Examples
    /// ```rust
    /// use kvo_observation::{Lifeline, ObjectKey, ObservationRegistry};
    /// use std::sync::Arc;
    ///
    /// struct Controller {
    ///     _lifeline: Lifeline,
    /// }
    ///
    /// let registry = ObservationRegistry::new();
    /// let user = Arc::new(());
    /// let controller = Arc::new_cyclic(|weak| Controller {
    ///     _lifeline: registry.lifeline(ObjectKey::from_weak(weak)),
    /// });
    ///
    /// registry.subscribe(&user, "name", &controller, |_, _, _, _| Ok(())).unwrap();
    /// assert_eq!(registry.len(), 1);
    ///
    /// drop(controller);
    /// assert!(registry.is_empty());
    /// ```
    pub fn lifeline(&self, object: ObjectKey) -> Lifeline {
        Lifeline { registry: Arc::downgrade(&self.inner), object }
    }

    /// Sweeps the registry for subscriptions whose subject or observer has expired.
    ///
    /// Returns the number of subscriptions removed.
    pub fn purge_expired(&self) -> usize {
        let mut removed = Vec::new();
        sweep_expired(&mut self.inner.subjects.lock(), &mut removed);

        let count = removed.len();
        drop(removed);
        if count > 0 {
            debug!(removed = count, "Expired subscriptions purged");
        }
        count
    }

    /// Removes every subscription. Returns the number removed.
    pub fn clear(&self) -> usize {
        let subjects = std::mem::take(&mut *self.inner.subjects.lock());
        let count = subjects.values().map(SubjectEntry::len).sum();
        drop(subjects);
        debug!(removed = count, "Registry cleared");
        count
    }

    /// State of the `(subject, key, observer)` subscription.
    ///
    /// A subscription whose observer has expired but was not purged yet is reported
    /// as removed, since it can no longer be dispatched.
    #[must_use]
    pub fn state<S: ?Sized, O: ?Sized>(
        &self,
        subject: &Arc<S>,
        key: &str,
        observer: &Arc<O>,
    ) -> SubscriptionState {
        let observer_id = ObjectKey::of(observer);
        let subjects = self.inner.subjects.lock();
        let active = subjects
            .get(&ObjectKey::of(subject))
            .and_then(|entry| entry.keys.get(key))
            .is_some_and(|subs| subs.iter().any(|s| s.observer == observer_id && !s.is_expired()));

        if active { SubscriptionState::Active } else { SubscriptionState::Removed }
    }

    /// Number of subscriptions registered for `key` on `subject`.
    #[must_use]
    pub fn subscriber_count<S: ?Sized>(&self, subject: &Arc<S>, key: &str) -> usize {
        self.inner
            .subjects
            .lock()
            .get(&ObjectKey::of(subject))
            .and_then(|entry| entry.keys.get(key))
            .map_or(0, Vec::len)
    }

    /// Keys currently observed on `subject`, sorted.
    #[must_use]
    pub fn observed_keys<S: ?Sized>(&self, subject: &Arc<S>) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .subjects
            .lock()
            .get(&ObjectKey::of(subject))
            .map(|entry| entry.keys.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }

    /// Total number of registered subscriptions, including not yet purged expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.subjects.lock().values().map(SubjectEntry::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.subjects.lock().is_empty()
    }

    /// Clones the callbacks registered for `(subject, key)`, pruning expired entries.
    fn snapshot(
        &self,
        subject: ObjectKey,
        key: &str,
    ) -> (Vec<(ObjectKey, ErasedCallback)>, usize) {
        let mut removed = Vec::new();
        let snapshot = {
            let mut subjects = self.inner.subjects.lock();
            let Some(entry) = subjects.get_mut(&subject) else {
                return (Vec::new(), 0);
            };

            let snapshot = entry.keys.get_mut(key).map_or_else(Vec::new, |subscriptions| {
                if self.inner.config.prune_on_notify {
                    removed.extend(subscriptions.extract_if(.., |s| s.is_expired()));
                }
                subscriptions.iter().map(|s| (s.observer, Arc::clone(&s.callback))).collect()
            });
            if entry.keys.get(key).is_some_and(Vec::is_empty) {
                entry.keys.remove(key);
            }
            if entry.keys.is_empty() {
                subjects.remove(&subject);
            }
            snapshot
        };

        let pruned = removed.len();
        drop(removed);
        (snapshot, pruned)
    }
}

impl Default for ObservationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObservationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subjects = self.inner.subjects.lock();
        f.debug_struct("ObservationRegistry")
            .field("subjects", &subjects.len())
            .field("subscriptions", &subjects.values().map(SubjectEntry::len).sum::<usize>())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Drop guard that disposes an object from a registry.
///
/// Created by [`ObservationRegistry::lifeline`]. Holds only a weak reference to the
/// registry; if the registry is gone by the time the guard drops, nothing happens.
#[derive(Debug)]
#[must_use = "Dropping a lifeline immediately disposes the object from the registry."]
pub struct Lifeline {
    registry: Weak<Inner>,
    object: ObjectKey,
}

impl Lifeline {
    #[must_use]
    pub const fn object(&self) -> ObjectKey {
        self.object
    }
}

impl Drop for Lifeline {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            let removed = inner.dispose(self.object);
            debug!(object = %self.object, removed = removed.len(), "Lifeline released");
        }
    }
}

fn validate_key(key: String) -> Result<String, ObservationError> {
    if key.trim().is_empty() {
        return Err(ObservationError::InvalidArgument {
            message: "observation key must not be empty".into(),
            context: Some(format!("key {key:?}").into()),
        });
    }
    Ok(key)
}
