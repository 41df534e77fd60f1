use anyhow::{Context, ensure};
use kvo_observation::{ObjectKey, ObservationRegistry, ObserveExt, SubscriptionState, Value};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct User;

/// Collects the changes it was told about.
#[derive(Debug, Default)]
struct Controller {
    seen: Mutex<Vec<(String, Value, Value)>>,
}

/// Runs the user/controller scenario and prints every recorded callback.
///
/// # Errors
/// Returns an error if subscribing or dispatching fails, or if the controller is
/// still notified after it unsubscribed.
pub fn run_demo(
    registry: &ObservationRegistry,
    name: String,
    previous: String,
) -> anyhow::Result<()> {
    let user = Arc::new(User);
    let controller = Arc::new(Controller::default());

    user.add_observer(registry, &controller, "name", |controller, key, new, old| {
        controller.seen.lock().push((key.to_owned(), new.clone(), old.clone()));
        Ok(())
    })
    .context("Failed to subscribe the controller")?;

    println!(
        "controller {} observes 'name' on user {}",
        ObjectKey::of(&controller),
        ObjectKey::of(&user)
    );

    let report = user.notify_change(registry, "name", name.as_str(), previous.as_str())?;
    for (key, new, old) in controller.seen.lock().iter() {
        println!("{key}: {old} -> {new}");
    }
    println!("dispatch: invoked={} failed={} pruned={}", report.invoked, report.failed, report.pruned);

    user.remove_observer(registry, &controller, "name");
    ensure!(
        registry.state(&user, "name", &controller) == SubscriptionState::Removed,
        "controller is still subscribed"
    );

    let report = user.notify_change(registry, "name", previous, name)?;
    ensure!(report.invoked == 0, "controller was notified after unsubscribing");
    println!("after unsubscribe: invoked={}", report.invoked);

    Ok(())
}
