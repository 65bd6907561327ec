use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::attr::{field_name, named_fields, parse_bind, Direction};

pub fn args_impl(input: &DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut fields = Vec::new();
    let mut writable = Vec::new();

    for field in &named_fields(input, "Args").named {
        let bind = parse_bind(&field.attrs)?;
        if bind.skip {
            continue;
        }

        let Some(field_ident) = &field.ident else {
            continue;
        };

        let ty = &field.ty;
        let field_str = field_name(field_ident);
        let name = bind.rename.clone().unwrap_or_else(|| field_str.clone());

        let explicit = match (bind.direction, bind.size) {
            (None, None) => quote! {},
            (direction, size) => {
                let direction = match direction.unwrap_or(Direction::In) {
                    Direction::In => quote! { ::rowmap::Direction::In },
                    Direction::Out => quote! { ::rowmap::Direction::Out },
                    Direction::InOut => quote! { ::rowmap::Direction::InOut },
                };
                let size = size.map(|size| quote! { .size(#size) });

                quote! { .bind(::rowmap::Bind::new(#direction) #size) }
            }
        };

        fields.push(quote! {
            ::rowmap::ArgField::new(#name, &self.#field_ident).field(#field_str) #explicit
        });

        // Explicit inputs are never written back.
        if bind.direction != Some(Direction::In) {
            writable.push(quote! {
                #field_str => {
                    self.#field_ident = <#ty as ::rowmap::FromValue>::from_value(value)?;
                    ::std::result::Result::Ok(true)
                }
            });
        }
    }

    Ok(quote! {
        impl #impl_generics ::rowmap::Args for #ident #ty_generics #where_clause {
            fn fields(&self) -> ::std::vec::Vec<::rowmap::ArgField> {
                ::std::vec![#(#fields),*]
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                field: &str,
                value: ::rowmap::Value,
            ) -> ::std::result::Result<bool, ::rowmap::CoerceError> {
                match field {
                    #(#writable)*
                    _ => ::std::result::Result::Ok(false),
                }
            }
        }
    })
}
