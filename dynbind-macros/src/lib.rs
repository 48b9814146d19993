//! Procedural macros for dynbind.
//!
//! - `#[expose]` - expose the methods of an inherent impl block
//! - `#[derive(ExposeAttributes)]` - expose the public fields of a struct

use proc_macro::TokenStream;

mod attributes;
mod expose;
mod options;

/// Implement `ExposeMethods` for the self type of an inherent impl block.
///
/// Every `pub fn` taking `&self`, without generic parameters and not
/// returning a reference, is exposed. Methods returning tuples are still
/// listed but skipped at exposure time.
///
/// # Attributes
///
/// - `#[expose(interface = "Name")]` - default interface name
/// - `#[dynbind(skip)]` on a method - do not expose it
/// - `#[dynbind(name = "other")]` on a method - expose it under another name
///
/// # Example
///
/// ```rust,ignore
/// struct Calc;
///
/// #[dynbind::expose(interface = "Math")]
/// impl Calc {
///     pub fn add(&self, a: i64, b: i64) -> i64 {
///         a + b
///     }
///
///     #[dynbind(skip)]
///     pub fn reset(&self) {}
/// }
/// ```
#[proc_macro_attribute]
pub fn expose(attr: TokenStream, item: TokenStream) -> TokenStream {
    expose::expose_impl(attr, item)
}

/// Derive `ExposeAttributes`: every `pub` field becomes a read-only attribute.
///
/// Field types must be `Clone` and returnable from a binding.
///
/// # Attributes
///
/// - `#[dynbind(interface = "Name")]` on the struct - default interface name
/// - `#[dynbind(skip)]` on a field - do not expose it
/// - `#[dynbind(name = "other")]` on a field - expose it under another name
#[proc_macro_derive(ExposeAttributes, attributes(dynbind))]
pub fn derive_expose_attributes(input: TokenStream) -> TokenStream {
    attributes::derive_impl(input)
}
