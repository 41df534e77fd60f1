use std::borrow::Cow;

/// Error type returned by observer callbacks.
///
/// Any `std::error::Error + Send + Sync` converts into it with `?` or `.into()`,
/// and so does a plain `&str`/`String` message.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during observation registry operations.
#[kvo_derive::kvo_error]
pub enum ObservationError {
    /// A subscription was requested with an empty or blank key.
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An observer callback failed while the registry was dispatching a change.
    #[error("Observer callback failed{}: {source}", format_context(.context))]
    Callback { source: CallbackError, context: Option<Cow<'static, str>> },

    /// Registry configuration could not be loaded or deserialized.
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    /// Registry invariant violated.
    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
