use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    Ident, Item, LitStr, Path, Token,
    parse::{Parse, ParseStream, Result},
};

// ─── Input AST ───────────────────────────────────────────────────────────────

/// Parsed `#[component(Capability, group = "…", transient, factory = path)]`.
struct ComponentArgs {
    capability: Path,
    group: Option<LitStr>,
    singleton: bool,
    factory: Option<Path>,
}

impl Parse for ComponentArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let capability: Path = input.parse()?;
        let mut args = ComponentArgs {
            capability,
            group: None,
            singleton: true,
            factory: None,
        };

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key: Ident = input.parse()?;
            match key.to_string().as_str() {
                "group" => {
                    input.parse::<Token![=]>()?;
                    args.group = Some(input.parse()?);
                }
                "factory" => {
                    input.parse::<Token![=]>()?;
                    args.factory = Some(input.parse()?);
                }
                "singleton" => args.singleton = true,
                "transient" => args.singleton = false,
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!(
                            "unknown component option `{other}`; expected group, factory, singleton, or transient"
                        ),
                    ));
                }
            }
        }
        Ok(args)
    }
}

// ─── Code generation ─────────────────────────────────────────────────────────

/// `StripeProcessor` → `__ROSTER_COMPONENT_STRIPEPROCESSOR`.
fn static_ident(type_name: &Ident) -> Ident {
    Ident::new(
        &format!("__ROSTER_COMPONENT_{}", type_name.to_string().to_uppercase()),
        Span::call_site(),
    )
}

/// Implementation of the `#[component(...)]` attribute.
///
/// Leaves the annotated type unchanged and appends a
/// `ComponentRegistration` to the `COMPONENTS` distributed slice.
pub fn expand_component(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args: ComponentArgs = match syn::parse2(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error(),
    };
    let item: Item = match syn::parse2(item) {
        Ok(item) => item,
        Err(err) => return err.to_compile_error(),
    };

    let (type_name, generics) = match &item {
        Item::Struct(s) => (&s.ident, &s.generics),
        Item::Enum(e) => (&e.ident, &e.generics),
        other => {
            return syn::Error::new_spanned(other, "#[component] applies to structs and enums")
                .to_compile_error();
        }
    };
    if !generics.params.is_empty() {
        return syn::Error::new_spanned(generics, "#[component] types cannot be generic")
            .to_compile_error();
    }

    let core = quote! { ::roster::core };
    let cap = &args.capability;
    let singleton = args.singleton;
    let type_str = type_name.to_string();
    let static_name = static_ident(type_name);

    let group = match &args.group {
        Some(group) => quote! { #group },
        None => quote! { <dyn #cap as #core::CapabilityMeta>::GROUP },
    };

    let construct = match &args.factory {
        Some(factory) => quote! {
            #factory()
                .map(|value| ::std::sync::Arc::new(value) as ::std::sync::Arc<dyn #cap>)
                .map_err(::std::convert::Into::into)
        },
        None => quote! {
            ::std::result::Result::Ok(
                ::std::sync::Arc::new(<#type_name as ::std::default::Default>::default())
                    as ::std::sync::Arc<dyn #cap>,
            )
        },
    };

    quote! {
        #item

        #[#core::linkme::distributed_slice(#core::COMPONENTS)]
        #[linkme(crate = #core::linkme)]
        static #static_name: #core::ComponentRegistration = #core::ComponentRegistration {
            type_name: #type_str,
            group: #group,
            singleton: #singleton,
            source: ::std::file!(),
            register: |container: &#core::Container| {
                container
                    .register_component::<dyn #cap, _>(#group, || #construct, #singleton)
                    .map(|key| ::std::string::ToString::to_string(&key))
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(attr: TokenStream, item: TokenStream) -> String {
        expand_component(attr, item).to_string()
    }

    #[test]
    fn test_default_singleton_registration() {
        let out = expand(quote! { PaymentProcessor }, quote! { #[derive(Default)] pub struct Stripe; });

        assert!(out.contains("static __ROSTER_COMPONENT_STRIPE"));
        assert!(out.contains("singleton : true"));
        assert!(out.contains("< dyn PaymentProcessor as :: roster :: core :: CapabilityMeta > :: GROUP"));
        assert!(out.contains("< Stripe as :: std :: default :: Default > :: default ()"));
        assert!(out.contains(":: std :: file ! ()"));
    }

    #[test]
    fn test_options() {
        let out = expand(
            quote! { PaymentProcessor, group = "legacy", transient, factory = PayPal::from_env },
            quote! { pub struct PayPal { id: String } },
        );

        assert!(out.contains("group : \"legacy\""));
        assert!(out.contains("singleton : false"));
        assert!(out.contains("PayPal :: from_env ()"));
    }

    #[test]
    fn test_errors() {
        let unknown = expand(quote! { Cap, eager }, quote! { struct A; });
        assert!(unknown.contains("unknown component option"));

        let generic = expand(quote! { Cap }, quote! { struct B<T>(T); });
        assert!(generic.contains("cannot be generic"));

        let function = expand(quote! { Cap }, quote! { fn c() {} });
        assert!(function.contains("applies to structs and enums"));
    }
}
