//! Parsing utilities for entity structs
//!
//! Reads the `#[table]` and `#[conflict_key]` attributes, and the subset of
//! `#[serde]` attributes that decides each field's external name.

use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Error, Fields, Ident, LitStr, Result, Token, Type, Visibility};

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Compile-time twin of `model_core::validation::ValidatedTableName::new`
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;

    if name.len() > 63 {
        return Err(format!(
            "Name '{}' is too long: {} characters (max 63)",
            name,
            name.len()
        ));
    }

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(format!(
            "Name '{}' must start with a letter or underscore",
            name
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Name '{}' contains invalid characters: only alphanumeric characters and underscores are allowed", name));
    }

    if is_reserved_keyword(name) {
        return Err(format!("Name '{}' is a reserved SQL keyword", name));
    }

    Ok(())
}

/// Same list as the runtime validation module
fn is_reserved_keyword(name: &str) -> bool {
    const RESERVED_KEYWORDS: &[&str] = &[
        // SQL Standard keywords
        "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "INNER",
        "LEFT", "RIGHT", "FULL", "OUTER", "ON", "AS", "AND", "OR", "NOT", "NULL",
        "TRUE", "FALSE", "CASE", "WHEN", "THEN", "ELSE", "END", "IF", "EXISTS",
        "IN", "LIKE", "BETWEEN", "ORDER", "BY", "GROUP", "HAVING", "LIMIT",
        "OFFSET", "UNION", "ALL", "DISTINCT", "CREATE", "DROP", "ALTER", "TABLE",
        "INDEX", "VIEW", "DATABASE", "SCHEMA", "PRIMARY", "KEY", "FOREIGN",
        "REFERENCES", "UNIQUE", "CHECK", "DEFAULT", "CONSTRAINT", "COLUMN",
        "RENAME", "TO", "RETURNING", "CONFLICT",
        // PostgreSQL specific keywords
        "USER", "ANALYSE", "ANALYZE", "ARRAY", "ASYMMETRIC", "BOTH", "CAST",
        "COLLATE", "CURRENT_DATE", "CURRENT_USER", "DEFERRABLE", "DO", "FETCH",
        "FOR", "GRANT", "INITIALLY", "INTERSECT", "INTO", "LATERAL", "LEADING",
        "ONLY", "PLACING", "SESSION_USER", "SOME", "SYMMETRIC", "TRAILING",
        "USING", "VARIADIC", "WINDOW", "WITH",
    ];

    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}

/// serde's `rename_all` rules, applied to a snake_case field identifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(rule: &str) -> Option<Self> {
        Some(match rule {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            _ => return None,
        })
    }

    pub fn apply_to_field(self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Pascal => {
                let mut pascal = String::new();
                let mut capitalize = true;
                for ch in field.chars() {
                    if ch == '_' {
                        capitalize = true;
                    } else if capitalize {
                        pascal.push(ch.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        pascal.push(ch);
                    }
                }
                pascal
            }
            RenameRule::Camel => {
                let pascal = RenameRule::Pascal.apply_to_field(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
        }
    }
}

#[derive(Debug)]
pub struct EntityField {
    pub ident: Ident,
    pub vis: Visibility,
    pub ty: Type,
    /// Serialized name, as callers and the model see it
    pub external_name: String,
    pub conflict_key: bool,
}

#[derive(Debug)]
pub struct EntityInfo {
    pub name: Ident,
    pub vis: Visibility,
    pub table_name: Option<String>,
    pub fields: Vec<EntityField>,
}

impl EntityInfo {
    pub fn conflict_keys(&self) -> impl Iterator<Item = &EntityField> {
        self.fields.iter().filter(|f| f.conflict_key)
    }
}

pub fn parse_entity(input: &DeriveInput) -> Result<EntityInfo> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields_named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(Error::new_spanned(
                    &input.ident,
                    "Entity can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs",
            ))
        }
    };

    let table_name = parse_table_attribute(&input.attrs)?;
    let rename_all = container_rename_all(&input.attrs)?;

    let mut fields = Vec::new();
    for field in &fields_named.named {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;

        let serde = parse_field_serde(&field.attrs)?;
        if serde.flatten {
            return Err(Error::new_spanned(
                ident,
                "flattened fields are not supported; entities are flat records",
            ));
        }

        let conflict_key = has_attribute(&field.attrs, "conflict_key");
        if serde.skip {
            if conflict_key {
                return Err(Error::new_spanned(
                    ident,
                    "a skipped field cannot be a conflict key",
                ));
            }
            continue;
        }

        let rust_name = ident.unraw().to_string();
        let external_name = match (serde.rename, rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply_to_field(&rust_name),
            (None, None) => rust_name,
        };

        fields.push(EntityField {
            ident: ident.clone(),
            vis: field.vis.clone(),
            ty: field.ty.clone(),
            external_name,
            conflict_key,
        });
    }

    Ok(EntityInfo {
        name: input.ident.clone(),
        vis: input.vis.clone(),
        table_name,
        fields,
    })
}

/// `#[table(name = "...")]`, validated
fn parse_table_attribute(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut table_name = None;

    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    validate_table_name_syn(&value.value(), value.span())?;
                    table_name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute; expected `name = \"...\"`"))
                }
            })?;
        }
    }

    Ok(table_name)
}

/// The container's `#[serde(rename_all = "...")]`, if any
pub fn container_rename_all(attrs: &[Attribute]) -> Result<Option<RenameRule>> {
    let mut rule = None;

    for attr in attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    let value: LitStr = meta.value()?.parse()?;
                    rule = Some(RenameRule::parse(&value.value()).ok_or_else(|| {
                        Error::new(value.span(), "unknown rename_all rule")
                    })?);
                    Ok(())
                } else {
                    skip_meta_value(&meta)
                }
            })?;
        }
    }

    Ok(rule)
}

#[derive(Debug, Default)]
struct FieldSerde {
    rename: Option<String>,
    skip: bool,
    flatten: bool,
}

fn parse_field_serde(attrs: &[Attribute]) -> Result<FieldSerde> {
    let mut serde = FieldSerde::default();

    for attr in attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    serde.rename = Some(value.value());
                    Ok(())
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    serde.skip = true;
                    Ok(())
                } else if meta.path.is_ident("flatten") {
                    serde.flatten = true;
                    Ok(())
                } else {
                    skip_meta_value(&meta)
                }
            })?;
        }
    }

    Ok(serde)
}

/// Consume whatever follows a serde key we do not interpret
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: proc_macro2::TokenStream = content.parse()?;
    }
    Ok(())
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
