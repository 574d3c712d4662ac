//! `#[derive(Event)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Ident, Member, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
};

/// Contents of `extends(Parent, via = field)`.
struct Extends {
    parent: Type,
    via: Member,
}

impl Parse for Extends {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let parent: Type = input.parse()?;
        if input.is_empty() {
            return Err(input.error("expected `, via = field` after the supertype"));
        }
        input.parse::<Token![,]>()?;

        let key: Ident = input.parse()?;
        if key != "via" {
            return Err(syn::Error::new(key.span(), "expected `via = field`"));
        }
        input.parse::<Token![=]>()?;
        let via: Member = input.parse()?;

        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
        Ok(Extends { parent, via })
    }
}

/// All `#[event(..)]` attributes of one item.
#[derive(Default)]
struct EventArgs {
    implements: Vec<Type>,
    extends: Option<Extends>,
}

impl EventArgs {
    fn from_attributes(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut args = EventArgs::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("event")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("implements") {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                    args.implements.extend(types);
                    Ok(())
                } else if meta.path.is_ident("extends") {
                    if args.extends.is_some() {
                        return Err(meta.error("an event extends at most one supertype"));
                    }
                    let content;
                    syn::parenthesized!(content in meta.input);
                    args.extends = Some(content.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `implements(..)` or `extends(..)`"))
                }
            })?;
        }
        Ok(args)
    }
}

/// Implementation of `#[derive(Event)]`.
pub fn derive_event_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let args = EventArgs::from_attributes(&input.attrs)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    if args.extends.is_some() && !matches!(input.data, Data::Struct(_)) {
        return Err(syn::Error::new_spanned(
            name,
            "`extends` needs a struct field to share the supertype from",
        ));
    }

    let interfaces = args.implements.iter().map(|interface| {
        quote! {
            lineage.implements::<#interface>(
                |event: ::std::sync::Arc<Self>| -> ::std::sync::Arc<#interface> { event },
            );
        }
    });

    let superclass = args.extends.as_ref().map(|Extends { parent, via }| {
        quote! {
            lineage.extends::<#parent>(
                |event: ::std::sync::Arc<Self>| -> ::std::sync::Arc<#parent> {
                    ::lightbus::IntoShared::<#parent>::into_shared(&event.#via)
                },
            );
        }
    });

    let body = if args.implements.is_empty() && args.extends.is_none() {
        quote! {}
    } else {
        quote! {
            fn lineage(lineage: &mut ::lightbus::Lineage<Self>) {
                #(#interfaces)*
                #superclass
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::lightbus::Event for #name #ty_generics #where_clause {
            #body
        }
    })
}
