#![allow(dead_code, unreachable_pub)]

use kvo_observation::{CallbackError, ObjectKey, Value};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct User;

#[derive(Debug, Default)]
pub struct Controller;

/// A single callback invocation as seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub tag: &'static str,
    pub observer: ObjectKey,
    pub key: String,
    pub new: Value,
    pub old: Value,
}

/// Collects callback invocations, shared between callbacks and assertions.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records every invocation under `tag`.
    pub fn callback<O: Send + Sync + 'static>(
        &self,
        tag: &'static str,
    ) -> impl Fn(&Arc<O>, &str, &Value, &Value) -> Result<(), CallbackError> + Send + Sync + 'static
    {
        let calls = Arc::clone(&self.calls);
        move |observer, key, new, old| {
            calls.lock().push(Call {
                tag,
                observer: ObjectKey::of(observer),
                key: key.to_owned(),
                new: new.clone(),
                old: old.clone(),
            });
            Ok(())
        }
    }

    /// A callback that records the invocation and then fails.
    pub fn failing<O: Send + Sync + 'static>(
        &self,
        tag: &'static str,
    ) -> impl Fn(&Arc<O>, &str, &Value, &Value) -> Result<(), CallbackError> + Send + Sync + 'static
    {
        let record = self.callback::<O>(tag);
        move |observer, key, new, old| {
            record(observer, key, new, old)?;
            Err(format!("{tag} rejected {key}").into())
        }
    }

    pub fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(|c| c.tag).collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }
}
