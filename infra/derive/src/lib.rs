#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for confkit.
//! This crate provides the attribute macro behind every error enum in the workspace and the
//! derive that turns a plain struct into a declared, validated parameter set.
//!
//! ## Usage
//! Depend on the `confkit` facade; it re-exports both macros:
//! ```toml
//! [dependencies]
//! confkit = { path = "../crates/confkit" }
//! ```
//!
//! See each macro’s docstring for examples; they are `ignore`d to avoid compiling in this crate,
//! but should be copied into consuming crates’ tests/examples as needed.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// This macro reduces boilerplate by transforming a standard enum into a fully-featured
/// error type integrated with the confkit crates.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `#[source]` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Introspection**: Generates `kind()` (the variant name) and `parameter()` (the value of a
///   `parameter` field, when the variant has one).
/// * **Internal Fallback**: Provides specialized `From<&str>` and `From<String>` implementations
///   if an `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Every variant must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]` (compatible with `thiserror`).
/// 4. Tuple or unit variants are rejected.
/// 5. The enum must not derive `Debug` or `Error` itself; the macro adds both.
///
/// # Example
///
/// ```rust,ignore
/// use confkit_derive::confkit_error;
/// use std::borrow::Cow;
/// use std::sync::Arc;
///
/// #[confkit_error]
/// pub enum SettingsError {
///     #[error("Rejected '{parameter}'{}: {message}", format_context(.context))]
///     Rejected { parameter: Arc<str>, message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &str) -> Result<String, SettingsError> {
///     std::fs::read_to_string(path).context("Reading settings file")
/// }
/// ```
#[proc_macro_attribute]
pub fn confkit_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Derive macro declaring a typed parameter set.
///
/// Every named field becomes one parameter, named after the field. Arguments of the
/// `#[param(...)]` attribute are forwarded verbatim to the `confkit::Constraints` builder:
/// a bare flag such as `lockable` becomes `.lockable()`, a `key = expr` pair becomes
/// `.key(expr)`. The reserved `name = "..."` pair renames the parameter.
///
/// # Generated Items
///
/// * `confkit::Parameters::declare`, declaring each field in field order.
/// * `confkit::Parameters::registry`, built once per process and shared afterwards.
/// * `confkit::Parameters::extract`, reading each field through `confkit::FromValue`.
///
/// # Errors
/// Emits a compile-time error for enums, tuple structs, generic structs, and malformed
/// `#[param]` arguments.
///
/// # Example
///
/// ```rust,ignore
/// use confkit::Parameters;
///
/// #[derive(Debug, Parameters)]
/// struct Server {
///     #[param(default = 4583, make_int, min = 1, max = 65535, lockable)]
///     port: i64,
///     #[param(name = "bind", default = "0.0.0.0", not_empty)]
///     address: String,
///     ssl_cert: Option<String>,
/// }
/// ```
#[proc_macro_derive(Parameters, attributes(param))]
pub fn derive_parameters(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::params::expand_derive(input).into()
}
