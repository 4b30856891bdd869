//! Parsing of `#[serix(...)]` attributes

use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Attribute, Ident, LitInt, LitStr, Token};

/// Attributes on the struct itself.
#[derive(Default)]
pub struct ContainerAttrs {
    /// The type implements `SelfCodec` and encodes itself.
    pub custom: bool,
    /// The type implements `ContextAware` and receives the call context after decoding.
    pub context: bool,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("serix")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("custom") {
                    out.custom = true;
                } else if meta.path.is_ident("context") {
                    out.context = true;
                } else {
                    return Err(meta.error("unknown serix container attribute"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

/// Annotation of one field. Fields without a `#[serix(...)]` attribute have none.
#[derive(Default)]
pub struct FieldAttrs {
    pub position: u32,
    pub optional: bool,
    pub inlined: bool,
    pub omit_empty: bool,
    map_key: Option<LitStr>,
    description: Option<LitStr>,
    length_prefix: Option<Ident>,
    min_len: Option<LitInt>,
    max_len: Option<LitInt>,
    lexical_order: bool,
    no_duplicates: bool,
    unique_types: bool,
    must_occur: Vec<LitInt>,
}

impl FieldAttrs {
    /// Parses the `serix` attribute of a field, if it has one.
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Option<Self>> {
        let mut found = None;
        for attr in attrs.iter().filter(|a| a.path().is_ident("serix")) {
            if found.is_some() {
                return Err(syn::Error::new_spanned(attr, "duplicate serix attribute"));
            }
            found = Some(Self::parse_one(attr)?);
        }
        Ok(found)
    }

    fn parse_one(attr: &Attribute) -> syn::Result<Self> {
        let mut out = Self::default();
        let mut position = None;
        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("position") {
                let lit: LitInt = meta.value()?.parse()?;
                position = Some(lit.base10_parse::<u32>()?);
            } else if path.is_ident("optional") {
                out.optional = true;
            } else if path.is_ident("inlined") {
                out.inlined = true;
            } else if path.is_ident("omit_empty") {
                out.omit_empty = true;
            } else if path.is_ident("map_key") {
                out.map_key = Some(meta.value()?.parse()?);
            } else if path.is_ident("description") {
                out.description = Some(meta.value()?.parse()?);
            } else if path.is_ident("length_prefix") {
                let width: Ident = meta.value()?.parse()?;
                if !matches!(width.to_string().as_str(), "u8" | "u16" | "u32" | "u64") {
                    return Err(syn::Error::new_spanned(
                        width,
                        "expected one of `u8`, `u16`, `u32`, `u64`",
                    ));
                }
                out.length_prefix = Some(width);
            } else if path.is_ident("min_len") {
                let lit: LitInt = meta.value()?.parse()?;
                lit.base10_parse::<usize>()?;
                out.min_len = Some(lit);
            } else if path.is_ident("max_len") {
                let lit: LitInt = meta.value()?.parse()?;
                lit.base10_parse::<usize>()?;
                out.max_len = Some(lit);
            } else if path.is_ident("lexical_order") {
                out.lexical_order = true;
            } else if path.is_ident("no_duplicates") {
                out.no_duplicates = true;
            } else if path.is_ident("unique_types") {
                out.unique_types = true;
            } else if path.is_ident("must_occur") {
                let content;
                syn::parenthesized!(content in meta.input);
                let codes = Punctuated::<LitInt, Token![,]>::parse_terminated(&content)?;
                for code in &codes {
                    code.base10_parse::<u32>()?;
                }
                out.must_occur.extend(codes);
            } else {
                return Err(meta.error("unknown serix field attribute"));
            }
            Ok(())
        })?;
        out.position = position
            .ok_or_else(|| syn::Error::new_spanned(attr, "missing `position = N` in serix attribute"))?;
        Ok(out)
    }

    fn has_rules(&self) -> bool {
        self.min_len.is_some()
            || self.max_len.is_some()
            || self.no_duplicates
            || self.unique_types
            || !self.must_occur.is_empty()
    }

    /// Expression building the `TypeSettings` configured by this annotation.
    pub fn settings(&self) -> TokenStream {
        let mut expr = quote! { ::serix::TypeSettings::new() };
        if let Some(key) = &self.map_key {
            expr = quote! { #expr.with_map_key(#key) };
        }
        if let Some(text) = &self.description {
            expr = quote! { #expr.with_description(#text) };
        }
        if let Some(width) = &self.length_prefix {
            let variant = match width.to_string().as_str() {
                "u8" => quote! { Uint8 },
                "u16" => quote! { Uint16 },
                "u32" => quote! { Uint32 },
                _ => quote! { Uint64 },
            };
            expr = quote! { #expr.with_length_prefix(::serix::LengthPrefix::#variant) };
        }
        if self.lexical_order {
            expr = quote! { #expr.with_lexical_ordering(true) };
        }
        if self.has_rules() {
            let mut rules = quote! { ::serix::ArrayRules::new() };
            if let Some(min) = &self.min_len {
                rules = quote! { #rules.with_min(#min) };
            }
            if let Some(max) = &self.max_len {
                rules = quote! { #rules.with_max(#max) };
            }
            if !self.must_occur.is_empty() {
                let codes = &self.must_occur;
                rules = quote! { #rules.with_must_occur([#(#codes),*]) };
            }
            if self.no_duplicates {
                rules = quote! {
                    #rules.with_validation_mode(::serix::ValidationMode::NO_DUPLICATES)
                };
            }
            if self.unique_types {
                rules = quote! {
                    #rules.with_validation_mode(::serix::ValidationMode::AT_MOST_ONE_OF_EACH_TYPE)
                };
            }
            if self.lexical_order {
                rules = quote! {
                    #rules.with_validation_mode(::serix::ValidationMode::LEXICAL_ORDERING)
                };
            }
            expr = quote! { #expr.with_array_rules(#rules) };
        }
        expr
    }
}
