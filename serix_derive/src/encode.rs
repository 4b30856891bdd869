use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::attr::ContainerAttrs;
use crate::{bounded_generics, struct_fields};

pub fn impl_encode(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::parse(&ast.attrs)?;
    if container.custom {
        return Ok(impl_custom(ast));
    }

    let name = &ast.ident;
    let fields = struct_fields(ast)?;
    let generics = bounded_generics(ast, &fields, quote! { ::serix::Encode });
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let annotated = fields.iter().filter_map(|f| f.attrs.as_ref().map(|a| (f, a)));
    let specs = annotated.clone().map(|(field, attrs)| {
        let index = field.index;
        let fname = field.ident.to_string();
        let ty = field.ty;
        let position = attrs.position;
        let optional = attrs.optional;
        let inlined = attrs.inlined;
        let omit_empty = attrs.omit_empty;
        let settings = attrs.settings();
        quote! {
            ::serix::FieldSpec {
                index: #index,
                name: #fname,
                position: #position,
                optional: #optional,
                inlined: #inlined,
                omit_empty: #omit_empty,
                kind: <#ty as ::serix::Encode>::KIND,
                type_name: ::std::any::type_name::<#ty>(),
                settings: #settings,
            }
        }
    });
    let arms = annotated.map(|(field, _)| {
        let index = field.index;
        let ident = field.ident;
        quote! { #index => visitor.visit(&self.#ident), }
    });

    Ok(quote! {
        impl #impl_generics ::serix::Encode for #name #ty_generics #where_clause {
            const KIND: ::serix::Kind = ::serix::Kind::Struct;

            fn encode_bin(
                &self,
                s: &::serix::Session<'_>,
                ts: &::serix::TypeSettings,
                buf: &mut ::std::vec::Vec<u8>,
            ) -> ::serix::Result<()> {
                ::serix::binary::encode_struct(self, s, ts, buf)
            }

            fn encode_map(
                &self,
                s: &::serix::Session<'_>,
                ts: &::serix::TypeSettings,
            ) -> ::serix::Result<::serix::Value> {
                ::serix::map::encode_struct(self, s, ts)
            }

            fn encode_inlined_bin(
                &self,
                s: &::serix::Session<'_>,
                buf: &mut ::std::vec::Vec<u8>,
            ) -> ::serix::Result<()> {
                ::serix::binary::encode_fields(self, s, buf)
            }

            fn encode_inlined_map(
                &self,
                s: &::serix::Session<'_>,
                out: &mut ::serix::OrderedMap,
            ) -> ::serix::Result<()> {
                ::serix::map::encode_fields(self, s, out)
            }
        }

        impl #impl_generics ::serix::Struct for #name #ty_generics #where_clause {
            fn field_specs() -> ::std::vec::Vec<::serix::FieldSpec> {
                ::std::vec![#(#specs),*]
            }

            fn visit_field<V: ::serix::FieldVisitor>(
                &self,
                index: usize,
                visitor: &mut V,
            ) -> ::serix::Result<()> {
                match index {
                    #(#arms)*
                    _ => Ok(()),
                }
            }
        }
    })
}

fn impl_custom(ast: &DeriveInput) -> TokenStream {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    quote! {
        impl #impl_generics ::serix::Encode for #name #ty_generics #where_clause {
            const KIND: ::serix::Kind = ::serix::Kind::Custom;

            fn encode_bin(
                &self,
                s: &::serix::Session<'_>,
                ts: &::serix::TypeSettings,
                buf: &mut ::std::vec::Vec<u8>,
            ) -> ::serix::Result<()> {
                ::serix::custom::encode_bin(self, s, ts, buf)
            }

            fn encode_map(
                &self,
                s: &::serix::Session<'_>,
                ts: &::serix::TypeSettings,
            ) -> ::serix::Result<::serix::Value> {
                ::serix::custom::encode_map(self, s, ts)
            }
        }
    }
}
