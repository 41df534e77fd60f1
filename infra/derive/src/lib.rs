#![allow(unreachable_pub)]

//! # Macros
//!
//! Procedural macros for the KVO workspace.
//!
//! Every library crate in the workspace declares a single error enum through
//! [`macro@kvo_error`], so error types look and behave the same everywhere.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! kvo-derive.workspace = true
//! thiserror.workspace = true
//! ```

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait adding `.context()`
///   to `Result<T, Name>` and to `Result<T, Source>` for every variant with a source.
/// * **Conversions**: Implements `From<Source>` for variants holding a `source` field
///   (or a field marked `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant exists.
/// * **Formatting Helper**: A module-private `format_context` function for use in
///   `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Applies to enums only.
/// 2. Variants must use named fields; tuple and unit variants are rejected.
/// 3. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 4. Variants with a source must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use kvo_derive::kvo_error;
/// use std::borrow::Cow;
///
/// #[kvo_error]
/// pub enum StoreError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read() -> Result<String, StoreError> {
///     let text = std::fs::read_to_string("store.txt").context("Reading store")?;
///     if text.is_empty() {
///         return Err("empty store".into());
///     }
///     Ok(text)
/// }
/// ```
#[proc_macro_attribute]
pub fn kvo_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).into()
}
