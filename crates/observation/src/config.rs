use crate::error::{ObservationError, ObservationErrorExt};
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Prefix of environment overrides, e.g. `KVO__DISPATCH=isolate`.
const ENV_PREFIX: &str = "KVO";
const ENV_SEPARATOR: &str = "__";

/// What `notify` does when an observer callback returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Stop at the first failing callback and return its error to the caller of `notify`.
    #[default]
    FailFast,
    /// Log each failure, keep notifying the remaining observers, and count the
    /// failures in the dispatch report.
    Isolate,
}

/// Runtime settings of an [`crate::ObservationRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub dispatch: DispatchPolicy,
    /// Drop subscriptions whose observer has expired while snapshotting a notification.
    pub prune_on_notify: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { dispatch: DispatchPolicy::FailFast, prune_on_notify: true }
    }
}

impl RegistryConfig {
    #[must_use]
    pub const fn with_dispatch(mut self, dispatch: DispatchPolicy) -> Self {
        self.dispatch = dispatch;
        self
    }

    #[must_use]
    pub const fn with_prune_on_notify(mut self, enabled: bool) -> Self {
        self.prune_on_notify = enabled;
        self
    }
}

/// Loads a configuration structure from an optional file plus environment overrides.
///
/// Layers, lowest priority first:
/// 1. **File**: `path`, when given. The format is inferred from the extension
///    (`.toml`, `.json`, `.yaml`, ...) and the file is required.
/// 2. **Environment**: variables prefixed with `KVO__`; nested keys are separated
///    by double underscores (`KVO__PRUNE_ON_NOTIFY=false` maps to `prune_on_notify`).
///
/// Fields missing from every layer fall back to the `serde` defaults of `T`.
///
/// # Errors
/// Returns [`ObservationError::Config`] if the file is missing or malformed, or if
/// the merged sources do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use kvo_observation::{RegistryConfig, load_config};
///
/// let cfg: RegistryConfig = load_config(None::<&str>).unwrap_or_default();
/// assert!(cfg.prune_on_notify);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ObservationError>
where
    T: DeserializeOwned,
{
    let mut builder = Config::builder();

    if let Some(path) = path {
        let path = path.as_ref();
        info!("Loading registry config from {}", path.display());
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR).try_parsing(true),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
