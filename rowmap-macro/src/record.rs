use convert_case::Casing;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::attr::{field_name, named_fields, parse_record, parse_rename_all};

pub fn record_impl(input: &DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let rename_all = parse_rename_all(&input.attrs)?;

    let mut arms = Vec::new();

    for field in &named_fields(input, "Record").named {
        let record = parse_record(&field.attrs)?;
        if record.skip {
            continue;
        }

        let Some(field_ident) = &field.ident else {
            continue;
        };

        let ty = &field.ty;
        let column = match (record.rename, rename_all) {
            (Some(rename), _) => rename,
            (None, Some(case)) => field_name(field_ident).to_case(case),
            (None, None) => field_name(field_ident),
        };

        arms.push(quote! {
            if column.eq_ignore_ascii_case(#column) {
                self.#field_ident = <#ty as ::rowmap::FromValue>::from_value(value)?;
                return ::std::result::Result::Ok(true);
            }
        });
    }

    Ok(quote! {
        impl #impl_generics ::rowmap::Record for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn set_column(
                &mut self,
                column: &str,
                value: ::rowmap::Value,
            ) -> ::std::result::Result<bool, ::rowmap::CoerceError> {
                #(#arms)*

                ::std::result::Result::Ok(false)
            }
        }
    })
}
