//! Implementation of the `#[tether::function]` attribute macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{FnArg, GenericArgument, ItemFn, Pat, PathArguments, ReturnType, Type, parse_macro_input};

use crate::attrs::{FunctionAttrs, PARAM_HELPERS, ParamAttrs};

pub fn function_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = match syn::parse::<FunctionAttrsParser>(attr) {
        Ok(parser) => parser.0,
        Err(err) => return err.to_compile_error().into(),
    };

    let input = parse_macro_input!(item as ItemFn);

    match function_inner(&attrs, &input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Wrapper to parse FunctionAttrs
struct FunctionAttrsParser(FunctionAttrs);

impl syn::parse::Parse for FunctionAttrsParser {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        FunctionAttrs::parse(input).map(FunctionAttrsParser)
    }
}

/// Parameter info extracted from function inputs.
struct ParamInfo {
    name: String,
    ty: Box<Type>,
    attrs: ParamAttrs,
    is_context: bool,
}

/// How the return type reports failure.
enum ReturnShape<'a> {
    Unit,
    Plain(&'a Type),
    Runtime(&'a Type),
    Checked(&'a Type, &'a Type),
}

fn function_inner(attrs: &FunctionAttrs, input: &ItemFn) -> syn::Result<TokenStream2> {
    let fn_name = &input.sig.ident;
    let fn_vis = &input.vis;

    if !input.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.sig.generics,
            "bound functions cannot be generic",
        ));
    }

    let decl_fn_name = format_ident!("__tether_{}_decl", fn_name);

    let params = extract_params(&input.sig.inputs)?;
    let shape = return_shape(&input.sig.output);

    // Metadata per parameter
    let param_tokens: Vec<_> = params
        .iter()
        .map(|p| {
            let name = &p.name;
            let ty = &p.ty;
            let native_type = if p.is_context {
                quote! { ::tether_core::NativeType::CONTEXT }
            } else {
                quote! { <#ty as ::tether_core::NativeTyped>::native_type() }
            };
            let optional = match &p.attrs.optional {
                None => quote! { None },
                Some(None) => quote! { Some(None) },
                Some(Some(text)) => quote! { Some(Some(#text)) },
            };
            let by_ref = p.attrs.reference;
            let not_null = p.attrs.not_null;

            quote! {
                ::tether_core::ParamDecl {
                    name: #name,
                    native_type: #native_type,
                    rust_type: stringify!(#ty),
                    optional: #optional,
                    by_ref: #by_ref,
                    not_null: #not_null,
                }
            }
        })
        .collect();

    // Invoker: pull each argument in order, call, convert the result
    let mut extract = Vec::new();
    let mut call_args = Vec::new();
    for (i, p) in params.iter().enumerate() {
        if p.is_context {
            call_args.push(quote! { __ctx });
        } else {
            let local = format_ident!("__arg{}", i);
            let ty = &p.ty;
            extract.push(quote! { let #local: #ty = __args.next()?; });
            call_args.push(quote! { #local });
        }
    }
    let call = quote! { #fn_name(#(#call_args),*) };
    let bind_args = if extract.is_empty() {
        quote! { let _ = __args; }
    } else {
        quote! { let mut __args = ::tether_core::NativeArgs::new(__args); }
    };

    let (returns, failure, invoke_result) = match shape {
        ReturnShape::Unit => (
            quote! { ::tether_core::NativeType::VOID },
            quote! { ::tether_core::FailureMode::Infallible },
            quote! {
                #call;
                Ok(::tether_core::NativeValue::Void)
            },
        ),
        ReturnShape::Plain(ty) => (
            quote! { <#ty as ::tether_core::NativeTyped>::native_type() },
            quote! { ::tether_core::FailureMode::Infallible },
            quote! { Ok(::tether_core::IntoNative::into_native(#call)) },
        ),
        ReturnShape::Runtime(ty) => (
            quote! { <#ty as ::tether_core::NativeTyped>::native_type() },
            quote! { ::tether_core::FailureMode::Runtime },
            quote! { Ok(::tether_core::IntoNative::into_native(#call?)) },
        ),
        ReturnShape::Checked(ty, err) => (
            quote! { <#ty as ::tether_core::NativeTyped>::native_type() },
            quote! { ::tether_core::FailureMode::Checked(stringify!(#err)) },
            quote! {
                let __result = #call.map_err(|_| {
                    ::tether_core::NativeError::checked(stringify!(#err), "checked failure")
                })?;
                Ok(::tether_core::IntoNative::into_native(__result))
            },
        ),
    };

    let exposed_name = match &attrs.name {
        Some(name) => quote! { Some(#name) },
        None => quote! { None },
    };
    let null_as_false = attrs.null_as_false;

    // Helper attributes are ours; strip them from the emitted function
    let filtered_inputs = filter_param_attrs(&input.sig.inputs);
    let fn_attrs = &input.attrs;
    let sig = &input.sig;
    let fn_constness = &sig.constness;
    let fn_asyncness = &sig.asyncness;
    let fn_unsafety = &sig.unsafety;
    let fn_output = &sig.output;
    let fn_block = &input.block;

    if let Some(asyncness) = fn_asyncness {
        return Err(syn::Error::new_spanned(asyncness, "bound functions cannot be async"));
    }

    Ok(quote! {
        #(#fn_attrs)*
        #fn_vis #fn_constness #fn_unsafety fn #fn_name(#filtered_inputs) #fn_output
        #fn_block

        #[doc(hidden)]
        #fn_vis fn #decl_fn_name() -> ::tether_core::NativeMethodDecl {
            ::tether_core::NativeMethodDecl {
                name: stringify!(#fn_name),
                exposed_name: #exposed_name,
                rust_path: concat!(module_path!(), "::", stringify!(#fn_name)),
                declared_on: ::tether_core::DeclaredOn::Module,
                params: vec![#(#param_tokens),*],
                returns: #returns,
                null_as_false: #null_as_false,
                failure: #failure,
                invoker: ::tether_core::NativeFn::new(
                    |__ctx: &mut ::tether_core::Context,
                     __args: ::std::vec::Vec<::tether_core::NativeValue>| {
                        #bind_args
                        #(#extract)*
                        #invoke_result
                    },
                ),
            }
        }
    })
}

/// Extract parameter names, types and helper attributes from function inputs.
fn extract_params(inputs: &syn::punctuated::Punctuated<FnArg, syn::token::Comma>) -> syn::Result<Vec<ParamInfo>> {
    let mut params = Vec::new();

    for (i, arg) in inputs.iter().enumerate() {
        match arg {
            FnArg::Receiver(recv) => {
                return Err(syn::Error::new_spanned(
                    recv,
                    "bound functions take the receiver as an explicit Arc<T> parameter",
                ));
            }
            FnArg::Typed(pat_type) => {
                let name = match pat_type.pat.as_ref() {
                    Pat::Ident(ident) => ident.ident.to_string(),
                    _ => "_".to_string(),
                };

                let attrs = ParamAttrs::from_attrs(&pat_type.attrs)?;
                let is_context = is_context(&pat_type.ty);

                if is_context && i != 0 {
                    return Err(syn::Error::new_spanned(
                        &pat_type.ty,
                        "the context must be the first parameter",
                    ));
                }
                if attrs.reference && !accepts_reference(&pat_type.ty) {
                    return Err(syn::Error::new_spanned(
                        &pat_type.ty,
                        "#[reference] parameters must be Var, Value or a Vec tail",
                    ));
                }

                params.push(ParamInfo {
                    name,
                    ty: pat_type.ty.clone(),
                    attrs,
                    is_context,
                });
            }
        }
    }

    Ok(params)
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(path) => path.path.segments.last(),
        _ => None,
    }
}

/// `&mut Context` (or `&Context`).
fn is_context(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => last_segment(&reference.elem).is_some_and(|seg| seg.ident == "Context"),
        _ => false,
    }
}

fn accepts_reference(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|seg| seg.ident == "Var" || seg.ident == "Value" || seg.ident == "Vec")
}

fn return_shape(output: &ReturnType) -> ReturnShape<'_> {
    let ty = match output {
        ReturnType::Default => return ReturnShape::Unit,
        ReturnType::Type(_, ty) => ty.as_ref(),
    };

    let Some(seg) = last_segment(ty) else {
        return ReturnShape::Plain(ty);
    };
    if seg.ident != "Result" {
        return ReturnShape::Plain(ty);
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return ReturnShape::Plain(ty);
    };

    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    let Some(ok) = types.next() else {
        return ReturnShape::Plain(ty);
    };
    match types.next() {
        Some(err) if last_segment(err).is_some_and(|seg| seg.ident == "NativeError") => ReturnShape::Runtime(ok),
        Some(err) => ReturnShape::Checked(ok, err),
        // a single-argument alias is assumed to carry NativeError
        None => ReturnShape::Runtime(ok),
    }
}

/// Filter our helper attributes from function parameters.
fn filter_param_attrs(inputs: &syn::punctuated::Punctuated<FnArg, syn::token::Comma>) -> TokenStream2 {
    let filtered: Vec<_> = inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Receiver(recv) => quote! { #recv },
            FnArg::Typed(pat_type) => {
                let filtered_attrs: Vec<_> = pat_type
                    .attrs
                    .iter()
                    .filter(|attr| !PARAM_HELPERS.iter().any(|helper| attr.path().is_ident(helper)))
                    .collect();
                let pat = &pat_type.pat;
                let ty = &pat_type.ty;
                let colon = &pat_type.colon_token;
                quote! {
                    #(#filtered_attrs)*
                    #pat #colon #ty
                }
            }
        })
        .collect();

    quote! { #(#filtered),* }
}
