//! `#[derive(Params)]` implementation
//!
//! This module contains the actual implementation of the `Params` derive
//! macro. It uses `syn` to parse the struct definition, and `quote` to
//! generate the trait implementation at compile time.
//!
//! # Macro Expansion Process
//!
//! 1. **Parse**: Parse the input as a `syn::DeriveInput`
//! 2. **Configure**: Read `#[params(...)]` for the structure and crate path
//! 3. **Check**: Reject enums, unions, unit structs and by-name tuple structs
//! 4. **Generate**: Emit `impl Params` with by-name or by-position bodies
//!
//! # Code Generation Example
//!
//! Input:
//! ```ignore
//! #[derive(Params)]
//! struct Move(i64, i64);
//! ```
//!
//! Generated output:
//! ```ignore
//! impl ::jbind_core::Params for Move {
//!     const KIND: ::jbind_core::ParamsKind = ::jbind_core::ParamsKind::Positional;
//!
//!     fn to_params(&self) -> ::jbind_core::Result<::jbind_core::ParamsValue> {
//!         Ok(::jbind_core::ParamsValue::Positional(vec![
//!             ::jbind_core::params::encode_element(&self.0)?,
//!             ::jbind_core::params::encode_element(&self.1)?,
//!         ]))
//!     }
//!
//!     fn from_params(params: ::jbind_core::ParamsValue) -> ::jbind_core::Result<Self> {
//!         let mut elements = ::jbind_core::params::positional_elements(params, 2)?.into_iter();
//!         Ok(Move(
//!             ::jbind_core::params::decode_element(elements.next())?,
//!             ::jbind_core::params::decode_element(elements.next())?,
//!         ))
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Path};

/// Structure selected for the derived type
#[derive(Clone, Copy, PartialEq, Eq)]
enum Structure {
    Named,
    Positional,
}

/// Options read from `#[params(...)]`
struct Options {
    structure: Option<Structure>,
    krate: Path,
}

impl Options {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut options = Options {
            structure: None,
            krate: syn::parse_quote!(::jbind_core),
        };

        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("params")) {
            attr.parse_nested_meta(|meta| {
                let structure = if meta.path.is_ident("named") {
                    Structure::Named
                } else if meta.path.is_ident("positional") {
                    Structure::Positional
                } else if meta.path.is_ident("crate") {
                    let path: LitStr = meta.value()?.parse()?;
                    options.krate = path.parse()?;
                    return Ok(());
                } else {
                    return Err(meta.error("expected `named`, `positional` or `crate = \"...\"`"));
                };

                // Both structures at once would be ambiguous
                if options.structure.is_some_and(|chosen| chosen != structure) {
                    return Err(meta.error("`named` and `positional` are mutually exclusive"));
                }
                options.structure = Some(structure);
                Ok(())
            })?;
        }

        Ok(options)
    }
}

/// Implementation of the `Params` derive macro
///
/// Called by the compiler for every `#[derive(Params)]`. Errors are turned
/// into `compile_error!` invocations pointing at the offending tokens.
pub fn derive_params_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let options = Options::parse(input)?;
    let krate = &options.krate;

    // Only structs with at least one field can carry params
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(data) => {
            return Err(syn::Error::new_spanned(
                data.enum_token,
                "Params can only be derived for structs",
            ))
        }
        Data::Union(data) => {
            return Err(syn::Error::new_spanned(
                data.union_token,
                "Params can only be derived for structs",
            ))
        }
    };

    let structure = match (fields, options.structure) {
        (Fields::Unit, _) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Params cannot be derived for unit structs; omit params instead",
            ))
        }
        (Fields::Unnamed(_), Some(Structure::Named)) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "tuple structs have no field names and cannot travel by-name",
            ))
        }
        (_, Some(structure)) => structure,
        (Fields::Named(_), None) => Structure::Named,
        (Fields::Unnamed(_), None) => Structure::Positional,
    };

    let name = &input.ident;

    // Generic payloads only implement serde for some arguments; bound them
    let mut generics = input.generics.clone();
    if !generics.params.is_empty() {
        let (_, ty_generics, _) = input.generics.split_for_impl();
        let bounded: Vec<syn::Type> = match structure {
            Structure::Named => vec![syn::parse_quote!(#name #ty_generics)],
            Structure::Positional => fields.iter().map(|field| field.ty.clone()).collect(),
        };
        let predicates = &mut generics.make_where_clause().predicates;
        for ty in bounded {
            predicates.push(syn::parse_quote!(#ty: #krate::params::Payload));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let (kind, to_params, from_params) = match structure {
        Structure::Named => (
            quote! { #krate::ParamsKind::Named },
            quote! { #krate::params::encode_named(self) },
            quote! { #krate::params::decode_named(params) },
        ),
        Structure::Positional => {
            let (encode, decode) = positional_bodies(krate, fields);
            (quote! { #krate::ParamsKind::Positional }, encode, decode)
        }
    };

    let expanded = quote! {
        impl #impl_generics #krate::Params for #name #ty_generics #where_clause {
            const KIND: #krate::ParamsKind = #kind;

            fn to_params(&self) -> #krate::Result<#krate::ParamsValue> {
                #to_params
            }

            fn from_params(params: #krate::ParamsValue) -> #krate::Result<Self> {
                #from_params
            }
        }
    };

    Ok(expanded)
}

/// Element-wise encode and decode bodies, in field declaration order
fn positional_bodies(krate: &Path, fields: &Fields) -> (TokenStream2, TokenStream2) {
    let arity = fields.len();
    let elements = format_ident!("elements");

    match fields {
        Fields::Named(named) => {
            let idents: Vec<_> = named.named.iter().filter_map(|f| f.ident.as_ref()).collect();
            let encode = quote! {
                Ok(#krate::ParamsValue::Positional(vec![
                    #(#krate::params::encode_element(&self.#idents)?,)*
                ]))
            };
            let decode = quote! {
                let mut #elements = #krate::params::positional_elements(params, #arity)?.into_iter();
                Ok(Self {
                    #(#idents: #krate::params::decode_element(#elements.next())?,)*
                })
            };
            (encode, decode)
        }
        _ => {
            let indexes: Vec<_> = (0..arity).map(syn::Index::from).collect();
            let slots = indexes.iter().map(|_| {
                quote! { #krate::params::decode_element(#elements.next())? }
            });
            let encode = quote! {
                Ok(#krate::ParamsValue::Positional(vec![
                    #(#krate::params::encode_element(&self.#indexes)?,)*
                ]))
            };
            let decode = quote! {
                let mut #elements = #krate::params::positional_elements(params, #arity)?.into_iter();
                Ok(Self(#(#slots,)*))
            };
            (encode, decode)
        }
    }
}
