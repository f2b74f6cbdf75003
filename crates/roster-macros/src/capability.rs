use proc_macro2::TokenStream;
use quote::quote;
use syn::{ItemTrait, LitStr};

/// Implementation of `#[capability]` / `#[capability("group-name")]`.
///
/// Emits the trait unchanged plus a `CapabilityMeta` impl for `dyn Trait`.
/// Without an argument the group is the trait's own identifier.
pub fn expand_capability(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item_trait: ItemTrait = match syn::parse2(item) {
        Ok(trait_item) => trait_item,
        Err(err) => return err.to_compile_error(),
    };

    let trait_name = &item_trait.ident;

    let group = if attr.is_empty() {
        LitStr::new(&trait_name.to_string(), trait_name.span())
    } else {
        match syn::parse2::<LitStr>(attr) {
            Ok(group) if group.value().is_empty() => {
                return syn::Error::new(group.span(), "capability group name must not be empty")
                    .to_compile_error();
            }
            Ok(group) => group,
            Err(err) => return err.to_compile_error(),
        }
    };

    if !item_trait.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &item_trait.generics,
            "generic traits cannot be used as capabilities",
        )
        .to_compile_error();
    }

    quote! {
        #item_trait

        impl ::roster::core::CapabilityMeta for dyn #trait_name {
            const GROUP: &'static str = #group;
        }
    }
}
