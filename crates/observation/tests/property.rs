use kvo_observation::{ObservationRegistry, ObserveExt, Value};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

proptest! {
    #[test]
    fn single_subscription_is_invoked_exactly_once(
        key in "[a-z]{1,12}",
        new in any::<i64>(),
        old in any::<i64>(),
    ) {
        let registry = ObservationRegistry::new();
        let subject = Arc::new(());
        let observer = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        subject
            .add_observer(&registry, &observer, key.clone(), move |observer, key, new, old| {
                observer.fetch_add(1, Ordering::SeqCst);
                sink.lock().push((key.to_owned(), new.clone(), old.clone()));
                Ok(())
            })
            .unwrap();

        let report = subject.notify_change(&registry, &key, new, old).unwrap();

        prop_assert_eq!(report.invoked, 1);
        prop_assert_eq!(observer.load(Ordering::SeqCst), 1);
        prop_assert_eq!(seen.lock().clone(), vec![(key, Value::Int(new), Value::Int(old))]);
    }

    #[test]
    fn unsubscribed_keys_never_dispatch(
        keys in proptest::collection::btree_set("[a-z]{1,8}", 1..8),
    ) {
        let registry = ObservationRegistry::new();
        let subject = Arc::new(());
        let observer = Arc::new(AtomicUsize::new(0));

        for key in &keys {
            subject
                .add_observer(&registry, &observer, key.as_str(), |observer, _, _, _| {
                    observer.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }
        prop_assert_eq!(registry.len(), keys.len());

        for key in &keys {
            prop_assert!(subject.remove_observer(&registry, &observer, key));
            subject.notify_change(&registry, key, Value::Null, Value::Null).unwrap();
        }

        prop_assert_eq!(observer.load(Ordering::SeqCst), 0);
        prop_assert!(registry.is_empty());
    }
}
