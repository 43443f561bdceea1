// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Procedural macros for funcy record descriptors
//!
//! `#[derive(Record)]` implements `funcy_core::Reflect` for a struct with named
//! fields, producing a `TypeDesc::Record` whose field names match what serde
//! reads, so coerced maps deserialize straight into the struct.
//!
//! Recognised attributes:
//! - `#[record(name = "...")]` on the struct overrides the record name
//! - `#[record(readonly)]` on a field rejects it in input maps
//! - `#[serde(rename = "...")]`, `#[serde(rename_all = "...")]` choose field names
//! - `#[serde(skip)]` / `#[serde(skip_deserializing)]` make a field read-only
//!
//! Every other field type must itself implement `Reflect`. A field may refer
//! back to its own struct (`Option<Box<Self>>`, `Vec<Self>`); the inner
//! occurrence is described as a reference to the enclosing record.
//! `#[serde(flatten)]` is rejected.

use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{DeriveInput, parse_macro_input};

/// Field attributes for Record derive
#[derive(Debug, FromField)]
#[darling(attributes(record), forward_attrs(serde))]
struct RecordFieldArgs {
    ident: Option<syn::Ident>,
    ty: syn::Type,
    /// Forwarded serde attributes (rename, skip, default)
    attrs: Vec<syn::Attribute>,
    #[darling(default)]
    readonly: bool,
}

/// Container attributes for Record derive
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(record), forward_attrs(serde))]
struct RecordContainerArgs {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<(), RecordFieldArgs>,
    attrs: Vec<syn::Attribute>,
    #[darling(default)]
    name: Option<String>,
}

/// What serde says about one field.
#[derive(Debug, Default)]
struct SerdeField {
    rename: Option<String>,
    skipped: bool,
    default: bool,
    flatten: bool,
}

/// What serde says about the struct itself.
#[derive(Debug, Default)]
struct SerdeContainer {
    rename_all: Option<String>,
    default: bool,
}

/// Derive `funcy_core::Reflect` for a struct with named fields.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_record(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.write_errors()),
    }
}

fn expand_record(input: &DeriveInput) -> darling::Result<proc_macro2::TokenStream> {
    let args = RecordContainerArgs::from_derive_input(input)?;

    if !args.generics.params.is_empty() {
        return Err(darling::Error::custom("Record cannot be derived for generic structs")
            .with_span(&args.generics));
    }

    let struct_name = &args.ident;
    let record_name = args.name.clone().unwrap_or_else(|| struct_name.to_string());

    let fields = match args.data {
        darling::ast::Data::Struct(fields) if fields.style == darling::ast::Style::Struct => {
            fields.fields
        }
        _ => {
            return Err(darling::Error::custom(
                "Record can only be derived for structs with named fields",
            )
            .with_span(struct_name));
        }
    };

    let container = serde_container(&args.attrs)?;

    let mut field_descs = Vec::with_capacity(fields.len());
    for field in &fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        let serde = serde_field(&field.attrs)?;

        if serde.flatten {
            return Err(
                darling::Error::custom("Record does not support #[serde(flatten)]").with_span(ident),
            );
        }

        let rust_name = ident.to_string();
        let rust_name = rust_name.strip_prefix("r#").unwrap_or(&rust_name);
        let wire_name = match (&serde.rename, &container.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => apply_rename_rule(rule, rust_name),
            (None, None) => rust_name.to_string(),
        };

        // serde must be able to fill a field that input never sets
        let defaulted = serde.default || container.default;
        if field.readonly && !serde.skipped && !defaulted && !is_option(&field.ty) {
            return Err(darling::Error::custom(format!(
                "readonly field `{}` must be Option<T> or carry #[serde(default)]",
                rust_name
            ))
            .with_span(ident));
        }

        field_descs.push(field_desc_tokens(&wire_name, field, &serde));
    }

    Ok(quote! {
        impl ::funcy_core::Reflect for #struct_name {
            fn describe() -> ::funcy_core::TypeDesc {
                ::funcy_core::types::describe_record(#record_name, |record| {
                    record #(#field_descs)*
                })
            }
        }
    })
}

/// `.with_field(..)` call adding one field to the record under construction.
fn field_desc_tokens(
    wire_name: &str,
    field: &RecordFieldArgs,
    serde: &SerdeField,
) -> proc_macro2::TokenStream {
    let ty = &field.ty;
    let ty_desc = if serde.skipped {
        quote! { ::funcy_core::TypeDesc::Any }
    } else {
        quote! { <#ty as ::funcy_core::Reflect>::describe() }
    };
    let writable = !(serde.skipped || field.readonly);

    quote! {
        .with_field(::funcy_core::FieldDesc::new(#wire_name, #ty_desc, #writable))
    }
}

/// Read `rename`, `skip`, `skip_deserializing`, `default` and `flatten` from
/// a field's serde attributes.
fn serde_field(attrs: &[syn::Attribute]) -> syn::Result<SerdeField> {
    let mut field = SerdeField::default();
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(syn::Token![=]) {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    field.rename = Some(lit.value());
                } else {
                    // rename(serialize = "..", deserialize = "..")
                    meta.parse_nested_meta(|nested| {
                        if nested.path.is_ident("deserialize") {
                            let lit: syn::LitStr = nested.value()?.parse()?;
                            field.rename = Some(lit.value());
                        } else {
                            skip_meta_value(&nested)?;
                        }
                        Ok(())
                    })?;
                }
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing") {
                field.skipped = true;
            } else if meta.path.is_ident("default") {
                field.default = true;
                skip_meta_value(&meta)?;
            } else if meta.path.is_ident("flatten") {
                field.flatten = true;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        })?;
    }
    Ok(field)
}

/// Read container-level `#[serde(rename_all = "...")]` and `#[serde(default)]`.
fn serde_container(attrs: &[syn::Attribute]) -> syn::Result<SerdeContainer> {
    let mut container = SerdeContainer::default();
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                let lit: syn::LitStr = meta.value()?.parse()?;
                if !RENAME_RULES.contains(&lit.value().as_str()) {
                    return Err(meta.error(format!("unsupported rename_all rule \"{}\"", lit.value())));
                }
                container.rename_all = Some(lit.value());
            } else if meta.path.is_ident("default") {
                container.default = true;
                skip_meta_value(&meta)?;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        })?;
    }
    Ok(container)
}

/// Consume whatever follows a serde key we don't care about.
fn skip_meta_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| skip_meta_value(&nested))?;
    }
    Ok(())
}

const RENAME_RULES: &[&str] = &[
    "lowercase",
    "UPPERCASE",
    "PascalCase",
    "camelCase",
    "snake_case",
    "SCREAMING_SNAKE_CASE",
    "kebab-case",
    "SCREAMING-KEBAB-CASE",
];

/// Apply a serde `rename_all` rule to a snake_case field name.
fn apply_rename_rule(rule: &str, field: &str) -> String {
    let pascal = || -> String {
        field
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect()
    };

    match rule {
        "lowercase" => field.to_ascii_lowercase(),
        "UPPERCASE" => field.to_ascii_uppercase(),
        "PascalCase" => pascal(),
        "camelCase" => {
            let pascal = pascal();
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        "SCREAMING_SNAKE_CASE" => field.to_ascii_uppercase(),
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.replace('_', "-").to_ascii_uppercase(),
        _ => field.to_string(),
    }
}

fn is_option(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
