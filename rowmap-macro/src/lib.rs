#![forbid(unsafe_code)]

extern crate proc_macro;

#[macro_use]
extern crate proc_macro_error;

mod args;
mod attr;
mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Implements `rowmap::Args` for a struct with named fields.
///
/// Each field becomes a parameter named after it. Field attributes:
///
/// - `#[bind(out, size = 200)]`, `#[bind(inout)]`, `#[bind(input)]` set the
///   direction explicitly, bypassing the `__out`/`__inout` naming convention;
/// - `#[bind(rename = "Name")]` names the parameter;
/// - `#[bind(skip)]` leaves the field out.
///
/// Fields that can receive an output value must implement `FromValue` as
/// well as `ToValue`; mark borrowed inputs such as `&str` with
/// `#[bind(input)]`.
#[proc_macro_error]
#[proc_macro_derive(Args, attributes(bind))]
pub fn args_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match args::args_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Implements `rowmap::Record` for a struct with named fields.
///
/// Columns match fields by name ignoring ASCII case. Use
/// `#[record(rename_all = "PascalCase")]` on the struct, or
/// `#[record(rename = "Column")]` and `#[record(skip)]` on fields.
#[proc_macro_error]
#[proc_macro_derive(Record, attributes(record))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record::record_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
