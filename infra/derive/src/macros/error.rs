use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, FieldsNamed, Ident, Type, Variant};

/// What the generated impls need to know about one variant.
struct VariantShape<'a> {
    ident: &'a Ident,
    source: Option<&'a Field>,
    has_parameter: bool,
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    let name = &input.ident;
    let ext = format_ident!("{}Ext", name);

    let Data::Enum(data) = &input.data else {
        return quote! { compile_error!("confkit_error can only be applied to enums"); };
    };

    let shapes = match data.variants.iter().map(shape_of).collect::<syn::Result<Vec<_>>>() {
        Ok(shapes) => shapes,
        Err(err) => return err.to_compile_error(),
    };

    let context_impl = context_trait(name, &ext, &shapes);
    let source_impls = shapes.iter().filter_map(|shape| source_impl(name, &ext, shape));
    let internal_impls = internal_impls(name, &shapes);
    let introspection = introspection(name, &shapes);

    quote! {
        #[derive(Debug, ::thiserror::Error)]
        #input

        #context_impl
        #(#source_impls)*
        #internal_impls
        #introspection

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
        }
    }
}

/// Every variant has named fields and a `context: Option<Cow<'static, str>>`.
fn shape_of(variant: &Variant) -> syn::Result<VariantShape<'_>> {
    let Fields::Named(fields) = &variant.fields else {
        return Err(syn::Error::new_spanned(
            variant,
            "confkit_error requires named fields for source/context handling",
        ));
    };

    match field_named(fields, "context") {
        Some(field) if !is_context_type(&field.ty) => {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "context field must be Option<Cow<'static, str>>",
            ));
        }
        Some(_) => {}
        None => {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "confkit_error requires `context: Option<Cow<'static, str>>` on every variant",
            ));
        }
    }

    let source = field_named(fields, "source").or_else(|| {
        fields.named.iter().find(|f| {
            f.attrs.iter().any(|attr| attr.path().is_ident("source") || attr.path().is_ident("from"))
        })
    });

    Ok(VariantShape { ident: &variant.ident, source, has_parameter: field_named(fields, "parameter").is_some() })
}

fn field_named<'a>(fields: &'a FieldsNamed, wanted: &str) -> Option<&'a Field> {
    fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|ident| ident == wanted))
}

fn is_context_type(ty: &Type) -> bool {
    let rendered = quote!(#ty).to_string().replace(' ', "");
    let inner = rendered.trim_start_matches("std::option::").trim_start_matches("core::option::");
    matches!(
        inner,
        "Option<Cow<'static,str>>"
            | "Option<std::borrow::Cow<'static,str>>"
            | "Option<alloc::borrow::Cow<'static,str>>"
    )
}

fn context_trait(name: &Ident, ext: &Ident, shapes: &[VariantShape<'_>]) -> TokenStream {
    let arms = shapes.iter().map(|shape| {
        let ident = shape.ident;
        quote! { #name::#ident { context: c, .. } => *c = Some(context.into()), }
    });

    quote! {
        pub trait #ext<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut e| {
                    match &mut e {
                        #( #arms )*
                    }
                    e
                })
            }
        }
    }
}

/// `From` and `...Ext::context` for the wrapped error type of a source variant.
fn source_impl(name: &Ident, ext: &Ident, shape: &VariantShape<'_>) -> Option<TokenStream> {
    let field = shape.source?;
    let field_ident = field.ident.as_ref()?;
    let ty = &field.ty;
    let ident = shape.ident;

    Some(quote! {
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field_ident: #ty) -> Self { Self::#ident { #field_ident, context: None } }
        }

        impl<T> #ext<T> for std::result::Result<T, #ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|#field_ident| #name::#ident { #field_ident, context: Some(context.into()) })
            }
        }
    })
}

/// Plain messages become `Internal` when the enum has such a variant.
fn internal_impls(name: &Ident, shapes: &[VariantShape<'_>]) -> TokenStream {
    if !shapes.iter().any(|shape| shape.ident == "Internal") {
        return quote!();
    }

    quote! {
        impl From<&'static str> for #name {
            #[inline]
            fn from(s: &'static str) -> Self { Self::Internal { message: std::borrow::Cow::Borrowed(s), context: None } }
        }

        impl From<String> for #name {
            #[inline]
            fn from(s: String) -> Self { Self::Internal { message: std::borrow::Cow::Owned(s), context: None } }
        }
    }
}

/// `kind()` names the variant; `parameter()` exposes the offending parameter, if any.
fn introspection(name: &Ident, shapes: &[VariantShape<'_>]) -> TokenStream {
    let kind_arms = shapes.iter().map(|shape| {
        let ident = shape.ident;
        let label = ident.to_string();
        quote! { Self::#ident { .. } => #label, }
    });
    let parameter_arms = shapes.iter().filter(|shape| shape.has_parameter).map(|shape| {
        let ident = shape.ident;
        quote! {
            Self::#ident { parameter, .. } => Some(::core::convert::AsRef::<str>::as_ref(parameter)),
        }
    });

    quote! {
        #[automatically_derived]
        impl #name {
            /// Returns the variant name of this error.
            #[must_use]
            pub const fn kind(&self) -> &'static str {
                match self {
                    #( #kind_arms )*
                }
            }

            /// Returns the parameter this error refers to, if it refers to one.
            #[must_use]
            #[allow(unreachable_patterns)]
            pub fn parameter(&self) -> Option<&str> {
                match self {
                    #( #parameter_arms )*
                    _ => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn rejects_tuple_variants() {
        let input: DeriveInput = parse_quote! {
            pub enum DemoError {
                #[error("IO error: {0}")]
                Io(std::io::Error),
            }
        };
        let out = expand_derive(input).to_string();
        assert!(out.contains("compile_error"));
        assert!(out.contains("requires named fields"));
    }

    #[test]
    fn rejects_variants_without_context() {
        let input: DeriveInput = parse_quote! {
            pub enum DemoError {
                #[error("IO error: {source}")]
                Io { source: std::io::Error },
            }
        };
        let out = expand_derive(input).to_string();
        assert!(out.contains("on every variant"));
    }

    #[test]
    fn rejects_wrong_context_type() {
        let input: DeriveInput = parse_quote! {
            pub enum DemoError {
                #[error("Bad")]
                Bad { context: Option<String> },
            }
        };
        let out = expand_derive(input).to_string();
        assert!(out.contains("context field must be"));
    }

    #[test]
    fn generates_parameter_accessor_only_for_parameter_variants() {
        let input: DeriveInput = parse_quote! {
            pub enum DemoError {
                #[error("Locked")]
                Locked { parameter: std::sync::Arc<str>, context: Option<Cow<'static, str>> },
                #[error("Internal")]
                Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
            }
        };
        let out = expand_derive(input).to_string();
        assert!(out.contains("fn parameter"));
        assert!(out.contains("fn kind"));
        assert!(out.contains("\"Locked\""));
        assert!(out.contains("\"Internal\""));
    }
}
