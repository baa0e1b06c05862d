use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Expr, Field, Fields, LitStr, Meta, Token};

struct ParamField<'a> {
    field: &'a Field,
    name: String,
    calls: Vec<TokenStream>,
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &input.generics,
            "Parameters cannot be derived for generic types: the registry is cached per type",
        )
        .to_compile_error();
    }

    let Data::Struct(data) = &input.data else {
        return syn::Error::new_spanned(ident, "Parameters can only be derived for structs")
            .to_compile_error();
    };
    let Fields::Named(fields) = &data.fields else {
        return syn::Error::new_spanned(
            &data.fields,
            "Parameters requires named fields: each field name is a parameter name",
        )
        .to_compile_error();
    };

    let params: Vec<ParamField<'_>> = match fields.named.iter().map(parse_field).collect() {
        Ok(params) => params,
        Err(err) => return err.to_compile_error(),
    };
    if let Err(err) = reject_duplicate_names(&params) {
        return err.to_compile_error();
    }

    let declarations = params.iter().map(|p| {
        let name = &p.name;
        let calls = &p.calls;
        quote! {
            registry.declare(#name, ::confkit::Constraints::new() #(#calls)*);
        }
    });

    let extractions = params.iter().map(|p| {
        let field = &p.field.ident;
        let ty = &p.field.ty;
        let name = &p.name;
        quote! { #field: configuration.get_as::<#ty>(#name)? }
    });

    quote! {
        #[automatically_derived]
        impl ::confkit::Parameters for #ident {
            fn declare(registry: &mut ::confkit::RegistryBuilder) {
                #(#declarations)*
            }

            fn registry() -> ::std::sync::Arc<::confkit::ParameterRegistry> {
                static REGISTRY: ::std::sync::OnceLock<::std::sync::Arc<::confkit::ParameterRegistry>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(REGISTRY.get_or_init(|| {
                    let mut registry = ::confkit::ParameterRegistry::builder();
                    <Self as ::confkit::Parameters>::declare(&mut registry);
                    registry.build()
                }))
            }

            fn extract(
                configuration: &::confkit::Configuration,
            ) -> ::std::result::Result<Self, ::confkit::ConfigError> {
                ::std::result::Result::Ok(Self { #(#extractions,)* })
            }
        }
    }
}

/// Two fields under one name would read the same parameter.
fn reject_duplicate_names(params: &[ParamField<'_>]) -> syn::Result<()> {
    let mut seen = FxHashSet::default();
    for param in params {
        if !seen.insert(param.name.as_str()) {
            return Err(syn::Error::new_spanned(
                param.field,
                format!("parameter `{}` is declared by more than one field", param.name),
            ));
        }
    }
    Ok(())
}

fn parse_field(field: &Field) -> syn::Result<ParamField<'_>> {
    let mut name = field.ident.as_ref().map(|ident| ident.unraw().to_string()).unwrap_or_default();
    let mut calls = Vec::new();

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("param")) {
        // A bare `#[param]` declares the parameter without constraints.
        if matches!(attr.meta, Meta::Path(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let Some(key) = meta.path.get_ident().cloned() else {
                return Err(meta.error("expected a constraint name such as `not_nil` or `min = 1`"));
            };

            if key == "name" {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().trim().is_empty() {
                    return Err(syn::Error::new_spanned(lit, "parameter name cannot be empty"));
                }
                name = lit.value();
                return Ok(());
            }

            if meta.input.peek(Token![=]) {
                let expr: Expr = meta.value()?.parse()?;
                calls.push(quote! { .#key(#expr) });
            } else {
                calls.push(quote! { .#key() });
            }
            Ok(())
        })?;
    }

    Ok(ParamField { field, name, calls })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn forwards_flags_and_pairs_to_the_builder() {
        let input: DeriveInput = parse_quote! {
            struct Server {
                #[param(default = 4583, make_int, min = 1, lockable)]
                port: i64,
            }
        };
        let out = expand_derive(input).to_string();
        assert!(out.contains(". default (4583)"));
        assert!(out.contains(". make_int ()"));
        assert!(out.contains(". min (1)"));
        assert!(out.contains(". lockable ()"));
        assert!(out.contains("\"port\""));
    }

    #[test]
    fn renames_and_unraws_parameter_names() {
        let input: DeriveInput = parse_quote! {
            struct Names {
                #[param(name = "bind")]
                address: String,
                r#type: String,
            }
        };
        let out = expand_derive(input).to_string();
        assert!(out.contains("\"bind\""));
        assert!(out.contains("\"type\""));
        assert!(!out.contains("\"address\""));
    }

    #[test]
    fn rejects_generics_and_tuple_structs() {
        let generic: DeriveInput = parse_quote! { struct Wrapper<T> { value: T } };
        assert!(expand_derive(generic).to_string().contains("compile_error"));

        let tuple: DeriveInput = parse_quote! { struct Pair(i64, i64); };
        assert!(expand_derive(tuple).to_string().contains("requires named fields"));
    }

    #[test]
    fn rejects_fields_sharing_a_name() {
        let input: DeriveInput = parse_quote! {
            struct Clash {
                #[param(name = "port")]
                listen: i64,
                port: i64,
            }
        };
        assert!(expand_derive(input).to_string().contains("declared by more than one field"));
    }

    #[test]
    fn rejects_empty_names() {
        let input: DeriveInput = parse_quote! {
            struct Empty {
                #[param(name = " ")]
                value: String,
            }
        };
        assert!(expand_derive(input).to_string().contains("parameter name cannot be empty"));
    }
}
