#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Not an issue in a macro crate"
)]
//! `sid!` procedural macro: checks a SID literal at compile time and expands
//! to a `win_sddl::Sid` value.
mod core;
use core::sid_impl;
use proc_macro::TokenStream;

use syn::{LitStr, parse_macro_input};

/// Builds a `Sid` from a canonical (`"S-1-5-32-544"`) or alias (`"BA"`)
/// literal. Malformed literals are compile errors.
#[proc_macro]
pub fn sid(input: TokenStream) -> TokenStream {
    let lit = parse_macro_input!(input as LitStr);
    match sid_impl(&lit) {
        Ok(token_stream) => token_stream,
        Err(err) => err.to_compile_error(),
    }
    .into()
}
