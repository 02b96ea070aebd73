//! Code generation for entity structs

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::parsing::EntityInfo;

/// `<Name>Partial`: every field optional, absent fields left out when serialized
pub fn generate_partial(info: &EntityInfo) -> TokenStream {
    let name = &info.name;
    let vis = &info.vis;
    let partial = format_ident!("{}Partial", name);
    let doc = format!(
        "Subset of [`{}`] fields, used as a filter or as update values",
        name
    );

    let fields = info.fields.iter().map(|field| {
        let ident = &field.ident;
        let vis = &field.vis;
        let ty = &field.ty;
        let external = &field.external_name;
        quote! {
            #[serde(rename = #external, skip_serializing_if = "Option::is_none")]
            #vis #ident: Option<#ty>,
        }
    });

    let setters = info.fields.iter().map(|field| {
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
            pub fn #ident(mut self, value: impl Into<#ty>) -> Self {
                self.#ident = Some(value.into());
                self
            }
        }
    });

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Default, serde::Serialize)]
        #vis struct #partial {
            #(#fields)*
        }

        impl #partial {
            pub fn new() -> Self {
                Self::default()
            }

            #(#setters)*
        }
    }
}

pub fn generate_entity_impl(info: &EntityInfo) -> TokenStream {
    let name = &info.name;
    let partial = format_ident!("{}Partial", name);
    let field_names = info.fields.iter().map(|f| &f.external_name);
    let conflict_keys = info.conflict_keys().map(|f| &f.external_name);

    let table_name_fn = match &info.table_name {
        Some(table) => quote! {
            fn table_name() -> Option<&'static str> {
                Some(#table)
            }
        },
        None => quote! {},
    };

    quote! {
        impl model_core::entity::Entity for #name {
            type Partial = #partial;

            fn field_names() -> &'static [&'static str] {
                &[#(#field_names),*]
            }

            #table_name_fn

            fn conflict_keys() -> &'static [&'static str] {
                &[#(#conflict_keys),*]
            }
        }
    }
}
