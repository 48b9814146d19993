//! The `ExposeAttributes` derive macro.

use crate::options;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Visibility, parse_macro_input};

/// Implementation of `#[derive(ExposeAttributes)]`.
pub fn derive_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "ExposeAttributes can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "ExposeAttributes can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let struct_opts = match options::parse(&input.attrs) {
        Ok(opts) => opts,
        Err(err) => return err.to_compile_error().into(),
    };

    let mut registrations: Vec<TokenStream2> = Vec::new();
    for field in fields {
        let opts = match options::parse(&field.attrs) {
            Ok(opts) => opts,
            Err(err) => return err.to_compile_error().into(),
        };
        if opts.skip || !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }

        let Some(ident) = &field.ident else {
            continue;
        };
        let attr_name = opts.name.unwrap_or_else(|| ident.to_string());
        registrations.push(quote! {
            set.attribute(#attr_name, |object: &Self| ::std::clone::Clone::clone(&object.#ident));
        });
    }

    let interface_fn = struct_opts.interface.map(|interface| {
        quote! {
            fn interface_name() -> ::std::string::String {
                ::std::string::String::from(#interface)
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::dynbind::ExposeAttributes for #name #ty_generics #where_clause {
            #interface_fn

            fn attributes(set: &mut ::dynbind::AttributeSet<Self>) {
                #(#registrations)*
            }
        }
    };

    TokenStream::from(expanded)
}
