//! Derive macros for `serix::Encode` and `serix::Decode`
//!
//! Only the fields carrying a `#[serix(position = N, ...)]` attribute take part in
//! encoding; the others are filled with `Default::default()` when decoding.

extern crate proc_macro;

mod attr;
mod decode;
mod encode;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Ident, Type};

use attr::FieldAttrs;

#[proc_macro_derive(Encode, attributes(serix))]
pub fn encode_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    encode::impl_encode(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[proc_macro_derive(Decode, attributes(serix))]
pub fn decode_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    decode::impl_decode(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

pub(crate) struct Field<'a> {
    /// Declaration index
    pub index: usize,
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub attrs: Option<FieldAttrs>,
}

/// Collects the named fields of a struct along with their annotations.
pub(crate) fn struct_fields(ast: &DeriveInput) -> syn::Result<Vec<Field<'_>>> {
    let named = match &ast.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { named, .. }),
            ..
        }) => named,
        _ => {
            return Err(syn::Error::new_spanned(
                &ast.ident,
                "serix derives are only implemented for structs with named fields; \
                 use #[serix(custom)] for other types",
            ))
        }
    };
    named
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let ident = field
                .ident
                .as_ref()
                .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
            Ok(Field {
                index,
                ident,
                ty: &field.ty,
                attrs: FieldAttrs::parse(&field.attrs)?,
            })
        })
        .collect()
}

/// Copy of the generics of `ast` with `bound` required of every annotated field type.
pub(crate) fn bounded_generics(
    ast: &DeriveInput,
    fields: &[Field<'_>],
    bound: proc_macro2::TokenStream,
) -> syn::Generics {
    let mut generics = ast.generics.clone();
    if generics.params.is_empty() {
        return generics;
    }
    let clause = generics.make_where_clause();
    for field in fields.iter().filter(|f| f.attrs.is_some()) {
        let ty = field.ty;
        clause.predicates.push(syn::parse_quote! { #ty: #bound });
    }
    generics
}
