//! Procedural macros for typed table entities
//!
//! This crate provides the `Entity` derive, which generates the `Partial`
//! companion struct and the `model_core::entity::Entity` implementation, and
//! the `#[entity]` attribute that adds every derive a model needs.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod entity_macro;
mod generation;
mod parsing;

use entity_macro::entity_attribute;
use generation::{generate_entity_impl, generate_partial};
use parsing::parse_entity;

/// Derive macro for the `Entity` trait
///
/// Field names follow serde: `#[serde(rename = "...")]` wins, then the
/// container's `#[serde(rename_all = "...")]`, then the Rust identifier.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Entity)]
/// #[serde(rename_all = "camelCase")]
/// #[table(name = "users")]
/// pub struct User {
///     #[conflict_key]
///     pub email: String,
///     pub first_name: String,
/// }
///
/// // Generated alongside:
/// let filter = UserPartial::new().first_name("Jo");
/// ```
#[proc_macro_derive(Entity, attributes(table, conflict_key))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let info = match parse_entity(&input) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let partial = generate_partial(&info);
    let entity_impl = generate_entity_impl(&info);

    let expanded = quote::quote! {
        #partial
        #entity_impl
    };

    TokenStream::from(expanded)
}

/// Convenience attribute that adds every derive an entity needs
///
/// Adds `Debug, Clone, PartialEq, Serialize, Deserialize, Entity` and, unless
/// the struct already sets one, `#[serde(rename_all = "camelCase")]`.
///
/// ```rust,ignore
/// #[entity]
/// #[table(name = "users")]
/// pub struct User {
///     #[conflict_key]
///     pub email: String,
///     pub first_name: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_attribute(attr, item)
}
