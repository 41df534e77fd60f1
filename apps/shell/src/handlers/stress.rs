use anyhow::{bail, ensure};
use kvo_observation::{ObservationRegistry, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug)]
struct Subject;

#[derive(Debug, Default)]
struct Counter(AtomicUsize);

/// Hammers one subject from `threads` threads and checks the delivery totals.
///
/// A long-lived witness observer stays subscribed throughout and must see every
/// notification; each thread churns its own short-lived subscription.
///
/// # Errors
/// Returns an error if any registry call fails or the totals do not add up.
pub fn run_stress(
    registry: &ObservationRegistry,
    threads: usize,
    iterations: usize,
) -> anyhow::Result<()> {
    let subject = Arc::new(Subject);
    let witness = Arc::new(Counter::default());
    registry.subscribe(&subject, "counter", &witness, |witness, _, _, _| {
        witness.0.fetch_add(1, Ordering::Relaxed);
        Ok(())
    })?;

    let started = Instant::now();
    let delivered = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..threads)
            .map(|_| scope.spawn(|| churn(registry, &subject, iterations)))
            .collect();

        workers.into_iter().try_fold(0_usize, |total, worker| -> anyhow::Result<usize> {
            match worker.join() {
                Ok(delivered) => Ok(total + delivered?),
                Err(_) => bail!("stress worker panicked"),
            }
        })
    })?;
    let elapsed = started.elapsed();

    let expected = threads * iterations;
    let observed = witness.0.load(Ordering::Relaxed);
    ensure!(observed == expected, "witness saw {observed} of {expected} notifications");
    ensure!(registry.len() == 1, "{} subscriptions left behind", registry.len());

    println!(
        "threads={threads} iterations={iterations} notifications={expected} delivered={delivered} \
         elapsed={elapsed:?}"
    );
    Ok(())
}

fn churn(
    registry: &ObservationRegistry,
    subject: &Arc<Subject>,
    iterations: usize,
) -> anyhow::Result<usize> {
    let own = Arc::new(Counter::default());
    let mut delivered = 0;

    for i in 0..iterations {
        registry.subscribe(subject, "counter", &own, |own, _, _, _| {
            own.0.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })?;
        let value = Value::from(i64::try_from(i)?);
        let report = registry.notify(subject, "counter", &value, &Value::Null)?;
        delivered += report.delivered();
        registry.unsubscribe(subject, "counter", &own);
    }

    ensure!(
        own.0.load(Ordering::Relaxed) >= iterations,
        "thread observer missed its own notifications"
    );
    Ok(delivered)
}
