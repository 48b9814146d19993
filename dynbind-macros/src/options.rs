//! `#[dynbind(...)]` helper attribute parsing.

use syn::{Attribute, LitStr};

/// Options of one item, field or method.
#[derive(Default)]
pub(crate) struct Options {
    pub skip: bool,
    pub name: Option<String>,
    pub interface: Option<String>,
}

/// Whether `attr` is a `#[dynbind(...)]` helper.
pub(crate) fn is_helper(attr: &Attribute) -> bool {
    attr.path().is_ident("dynbind")
}

/// Collect the options of every `#[dynbind(...)]` attribute in `attrs`.
pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Options> {
    let mut options = Options::default();

    for attr in attrs.iter().filter(|a| is_helper(a)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                options.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("interface") {
                let lit: LitStr = meta.value()?.parse()?;
                options.interface = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unknown dynbind attribute, expected `skip`, `name` or `interface`"))
            }
        })?;
    }

    Ok(options)
}
