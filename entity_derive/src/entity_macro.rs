use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error};

use crate::parsing::container_rename_all;

pub fn entity_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let generics = &input.generics;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Error::new_spanned(name, "entity can only be used on structs")
                .to_compile_error()
                .into()
        }
    };

    let rename_all = match container_rename_all(attrs) {
        Ok(Some(_)) => quote! {},
        Ok(None) => quote! { #[serde(rename_all = "camelCase")] },
        Err(e) => return e.to_compile_error().into(),
    };

    let expanded = quote! {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, Entity)]
        #rename_all
        #(#attrs)*
        #vis struct #name #generics #fields
    };

    TokenStream::from(expanded)
}
