//! Tether Proc Macros
//!
//! This crate provides the procedural macros that turn plain Rust functions
//! and types into declarations the tether registry can bind.
//!
//! # Macros
//!
//! - `#[tether::function]` - Generate a `NativeMethodDecl` for a function
//! - `#[derive(NativeObject)]` - Implement `NativeObject` for a type
//!
//! # Example
//!
//! ```ignore
//! #[tether::function]
//! pub fn tether_str_repeat(input: String, #[optional("2")] times: i64) -> String {
//!     input.repeat(times.max(0) as usize)
//! }
//!
//! let decl = tether::decl!(tether_str_repeat);
//! ```

use proc_macro::TokenStream;

mod attrs;
mod derive_object;
mod function;

/// Derive `NativeObject` for a type so it can be handed to the guest.
///
/// # Attributes
///
/// - `#[tether(name = "...")]` - Override the guest class name (default: the Rust name)
///
/// # Example
///
/// ```ignore
/// #[derive(NativeObject)]
/// #[tether(name = "Counter")]
/// pub struct NativeCounter {
///     value: AtomicI64,
/// }
/// ```
#[proc_macro_derive(NativeObject, attributes(tether))]
pub fn derive_native_object(input: TokenStream) -> TokenStream {
    derive_object::derive_object_impl(input)
}

/// Mark a function for binding.
///
/// Emits the function unchanged plus a hidden `__tether_<name>_decl()`
/// returning its `NativeMethodDecl`, including a type-erased invoker.
///
/// # Function Attributes
///
/// - `name = "..."` - Guest name override
/// - `null_as_false` - A `None` result reaches the guest as `false`
///
/// # Parameter Attributes
///
/// - `#[optional]` - May be omitted; the function sees `Value::Default` or the lane's zero
/// - `#[optional("text")]` - May be omitted; `text` is parsed as the default value
/// - `#[reference]` - Receives the call site's storage (`Var`)
/// - `#[not_null]` - Coercion failures on this parameter are hard errors
///
/// A leading `&mut Context` parameter receives the execution context; a
/// trailing `Vec<Value>` or `Vec<Var>` parameter collects the remaining
/// arguments. A `Result<T, NativeError>` return reports failure to the
/// caller; any other `Result` makes the function unbindable.
///
/// # Example
///
/// ```ignore
/// #[tether::function(null_as_false)]
/// pub fn strpos(haystack: String, needle: String) -> Option<i64> {
///     haystack.find(&needle).map(|i| i as i64)
/// }
/// ```
#[proc_macro_attribute]
pub fn function(attr: TokenStream, item: TokenStream) -> TokenStream {
    function::function_impl(attr, item)
}
