//! The `#[expose]` attribute macro.
//!
//! Implements `ExposeMethods` for the self type of an inherent impl block.
//! Every `pub fn` taking `&self`, without generics and not returning a
//! reference, is exposed under its own name.

use crate::options;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, ReturnType, Token, Type, Visibility,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Arguments for the `#[expose]` macro.
pub(crate) struct ExposeArgs {
    pub interface: Option<String>,
}

impl Parse for ExposeArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut interface = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "interface" => {
                    let lit: LitStr = input.parse()?;
                    interface = Some(lit.value());
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(ExposeArgs { interface })
    }
}

/// Whether `method` can be exposed at all.
fn is_exposable(method: &ImplItemFn) -> bool {
    let sig = &method.sig;

    let takes_shared_self = matches!(
        sig.inputs.first(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    );
    let returns_reference = matches!(
        &sig.output,
        ReturnType::Type(_, ty) if matches!(**ty, Type::Reference(_))
    );

    matches!(method.vis, Visibility::Public(_))
        && takes_shared_self
        && sig.generics.params.is_empty()
        && sig.asyncness.is_none()
        && !returns_reference
}

/// Implementation of the `#[expose]` macro.
pub fn expose_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ExposeArgs);
    let mut input = parse_macro_input!(item as ItemImpl);

    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new_spanned(path, "#[expose] must be placed on an inherent impl block")
            .to_compile_error()
            .into();
    }
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &input.generics,
            "#[expose] does not support generic impl blocks",
        )
        .to_compile_error()
        .into();
    }

    let mut registrations: Vec<TokenStream2> = Vec::new();
    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };

        let opts = match options::parse(&method.attrs) {
            Ok(opts) => opts,
            Err(err) => return err.to_compile_error().into(),
        };
        method.attrs.retain(|a| !options::is_helper(a));

        if opts.skip || !is_exposable(method) {
            continue;
        }

        let ident = &method.sig.ident;
        let name = opts.name.unwrap_or_else(|| ident.to_string());
        registrations.push(quote! {
            set.method(#name, Self::#ident);
        });
    }

    let self_ty = &input.self_ty;
    let interface_fn = args.interface.map(|interface| {
        quote! {
            fn interface_name() -> ::std::string::String {
                ::std::string::String::from(#interface)
            }
        }
    });

    let expanded = quote! {
        #input

        impl ::dynbind::ExposeMethods for #self_ty {
            #interface_fn

            fn methods(set: &mut ::dynbind::MethodSet<Self>) {
                #(#registrations)*
            }
        }
    };

    TokenStream::from(expanded)
}
