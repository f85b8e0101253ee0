//! Derive macro for `stackheap::Message`.
//!
//! Refer to the [`stackheap`](https://docs.rs/stackheap) crate for examples.
use {
    proc_macro::TokenStream,
    syn::{parse_macro_input, DeriveInput},
};

mod common;
mod message;

/// Implement `Message` for a struct with named fields.
///
/// Fields are laid out in declaration order. Each field's JSON key is its
/// name in PascalCase unless set with `#[stackheap(key = "...")]`.
///
/// The struct may have at most one lifetime parameter, which decoded
/// borrowed fields (`Cow<'a, ..>`) are tied to. Type and const parameters
/// are not supported.
#[proc_macro_derive(Message, attributes(stackheap))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match message::generate(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.write_errors().into(),
    }
}
