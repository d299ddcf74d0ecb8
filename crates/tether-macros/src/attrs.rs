//! Attribute parsing utilities for tether macros.

use syn::{
    Attribute, Expr, ExprLit, Ident, Lit, LitStr, Token,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

/// Parsed `#[tether(...)]` attributes on a type.
#[derive(Debug, Default)]
pub struct TypeAttrs {
    /// Override name for the guest (default: Rust type name)
    pub name: Option<String>,
}

impl TypeAttrs {
    /// Parse attributes from a list of `#[tether(...)]` attributes.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("tether") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else {
                    return Err(meta.error(format!(
                        "unknown tether attribute: {}",
                        meta.path.get_ident().map(|i| i.to_string()).unwrap_or_default()
                    )));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

/// Parsed `#[tether::function(...)]` attributes.
#[derive(Debug, Default)]
pub struct FunctionAttrs {
    /// Guest name override
    pub name: Option<String>,
    /// Map a `None` result to `false`
    pub null_as_false: bool,
}

impl FunctionAttrs {
    /// Parse function attributes from the attribute token stream.
    pub fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut result = Self::default();

        if input.is_empty() {
            return Ok(result);
        }

        let items = Punctuated::<FunctionAttrItem, Token![,]>::parse_terminated(input)?;

        for item in items {
            match item {
                FunctionAttrItem::Ident(ident) => match ident.to_string().as_str() {
                    "null_as_false" => result.null_as_false = true,
                    other => {
                        return Err(syn::Error::new(
                            ident.span(),
                            format!("unknown function attribute: {}", other),
                        ));
                    }
                },
                FunctionAttrItem::NameValue { name, value } => match name.to_string().as_str() {
                    "name" => match value {
                        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => result.name = Some(s.value()),
                        _ => {
                            return Err(syn::Error::new(name.span(), "name must be a string literal"));
                        }
                    },
                    other => {
                        return Err(syn::Error::new(
                            name.span(),
                            format!("unknown function attribute: {}", other),
                        ));
                    }
                },
            }
        }

        Ok(result)
    }
}

/// Individual function attribute item.
enum FunctionAttrItem {
    /// Simple identifier (e.g., `null_as_false`)
    Ident(Ident),
    /// Name = value (e.g., `name = "strlen"`)
    NameValue { name: Ident, value: Expr },
}

impl Parse for FunctionAttrItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ident: Ident = input.parse()?;

        if input.peek(Token![=]) {
            let _: Token![=] = input.parse()?;
            let value: Expr = input.parse()?;
            Ok(FunctionAttrItem::NameValue { name: ident, value })
        } else {
            Ok(FunctionAttrItem::Ident(ident))
        }
    }
}

/// Helper attributes accepted on function parameters.
pub const PARAM_HELPERS: &[&str] = &["optional", "reference", "not_null"];

/// Parsed helper attributes on one parameter.
#[derive(Debug, Default)]
pub struct ParamAttrs {
    /// `Some(None)` for `#[optional]`, `Some(Some(text))` for `#[optional("text")]`
    pub optional: Option<Option<String>>,
    pub reference: bool,
    pub not_null: bool,
}

impl ParamAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            let path = attr.path();
            if path.is_ident("optional") {
                result.optional = match &attr.meta {
                    syn::Meta::Path(_) => Some(None),
                    _ => {
                        let lit: LitStr = attr.parse_args()?;
                        Some(Some(lit.value()))
                    }
                };
            } else if path.is_ident("reference") {
                attr.meta.require_path_only()?;
                result.reference = true;
            } else if path.is_ident("not_null") {
                attr.meta.require_path_only()?;
                result.not_null = true;
            }
        }

        Ok(result)
    }
}
