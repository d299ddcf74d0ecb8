//! Implementation of the `#[derive(NativeObject)]` macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

use crate::attrs::TypeAttrs;

pub fn derive_object_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_object_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_object_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let attrs = TypeAttrs::from_attrs(&input.attrs)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "native objects cannot be generic",
        ));
    }

    // Determine the guest class name
    let class_name = attrs.name.unwrap_or_else(|| name.to_string());

    Ok(quote! {
        impl ::tether_core::NativeObject for #name {
            fn class_name() -> &'static str {
                #class_name
            }
        }
    })
}
