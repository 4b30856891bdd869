use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::DeriveInput;

use crate::attr::ContainerAttrs;
use crate::{bounded_generics, struct_fields};

pub fn impl_decode(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::parse(&ast.attrs)?;
    if container.custom {
        return Ok(impl_custom(ast));
    }

    let name = &ast.ident;
    let fields = struct_fields(ast)?;
    let generics = bounded_generics(ast, &fields, quote! { ::serix::Decode });
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let annotated: Vec<_> = fields.iter().filter(|f| f.attrs.is_some()).collect();
    let locals: Vec<_> = annotated
        .iter()
        .map(|f| format_ident!("__serix_{}", f.ident))
        .collect();
    let decls = annotated.iter().zip(&locals).map(|(field, local)| {
        let ty = field.ty;
        quote! { let mut #local: ::std::option::Option<#ty> = ::std::option::Option::None; }
    });
    let arms = annotated.iter().zip(&locals).map(|(field, local)| {
        let index = field.index;
        let ty = field.ty;
        quote! { #index => #local = ::std::option::Option::Some(source.field::<#ty>(desc)?), }
    });
    let inits = fields.iter().map(|field| {
        let ident = field.ident;
        match annotated.iter().position(|f| f.index == field.index) {
            Some(ix) => {
                let local = &locals[ix];
                let fname = ident.to_string();
                quote! {
                    #ident: #local.ok_or_else(|| ::serix::DataError::MissingKey {
                        key: ::std::string::String::from(#fname),
                    })?,
                }
            }
            None => quote! { #ident: ::std::default::Default::default(), },
        }
    });
    let set_context = container.context.then(|| {
        quote! { ::serix::ContextAware::set_context(&mut value, source.context()); }
    });

    Ok(quote! {
        impl #impl_generics ::serix::Decode for #name #ty_generics #where_clause {
            fn decode_bin(
                s: &::serix::Session<'_>,
                ts: &::serix::TypeSettings,
                p: &mut ::serix::ByteParser<'_>,
            ) -> ::serix::Result<Self> {
                ::serix::binary::decode_struct::<Self>(s, ts, p)
            }

            fn decode_map(
                s: &::serix::Session<'_>,
                ts: &::serix::TypeSettings,
                v: &::serix::Value,
            ) -> ::serix::Result<Self> {
                ::serix::map::decode_struct::<Self>(s, ts, v)
            }

            fn decode_inlined_bin(
                s: &::serix::Session<'_>,
                p: &mut ::serix::ByteParser<'_>,
            ) -> ::serix::Result<Self> {
                ::serix::binary::decode_fields::<Self>(s, p)
            }

            fn decode_inlined_map(
                s: &::serix::Session<'_>,
                obj: &::serix::OrderedMap,
            ) -> ::serix::Result<Self> {
                ::serix::map::decode_fields::<Self>(s, obj)
            }
        }

        impl #impl_generics ::serix::StructDecode for #name #ty_generics #where_clause {
            #[allow(unused_mut)]
            fn build<S: ::serix::FieldSource>(source: &mut S) -> ::serix::Result<Self> {
                #(#decls)*
                let fields = source.fields();
                for desc in fields.iter() {
                    match desc.index {
                        #(#arms)*
                        _ => {}
                    }
                }
                let mut value = Self { #(#inits)* };
                #set_context
                ::std::result::Result::Ok(value)
            }
        }
    })
}

fn impl_custom(ast: &DeriveInput) -> TokenStream {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    quote! {
        impl #impl_generics ::serix::Decode for #name #ty_generics #where_clause {
            fn decode_bin(
                s: &::serix::Session<'_>,
                ts: &::serix::TypeSettings,
                p: &mut ::serix::ByteParser<'_>,
            ) -> ::serix::Result<Self> {
                ::serix::custom::decode_bin(s, ts, p)
            }

            fn decode_map(
                s: &::serix::Session<'_>,
                ts: &::serix::TypeSettings,
                v: &::serix::Value,
            ) -> ::serix::Result<Self> {
                ::serix::custom::decode_map(s, ts, v)
            }
        }
    }
}
