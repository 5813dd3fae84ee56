//! Procedural macros for `cellcore` built-in payload types.

use proc_macro::TokenStream;
use quote::quote;

extern crate proc_macro;

#[macro_use]
extern crate proc_macro_error;

mod builtin_type;

/// Derives [`HolderBody`] for a payload type that already implements
/// `Clone + PartialEq + Hash + std::fmt::Display`.
///
/// The generated impl delegates every vtable operation to the type's own
/// trait impls, so a built-in payload only has to provide the ordinary
/// derives it would need anyway:
///
/// ```ignore
/// #[derive(Clone, PartialEq, Hash, BuiltinType)]
/// struct PlBool(bool);
///
/// impl std::fmt::Display for PlBool {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{}", if self.0 { "true" } else { "false" })
///     }
/// }
/// ```
#[proc_macro_error]
#[proc_macro_derive(BuiltinType)]
pub fn derive_builtin_type(input: TokenStream) -> TokenStream {
    builtin_type::derive(input)
}

fn crate_path() -> proc_macro2::TokenStream {
    quote! { cellcore }
}
