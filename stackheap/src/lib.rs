//! stackheap encodes typed records in two wire forms that carry the same
//! logical value:
//!
//! - a compact binary "stack + heap" layout, where fixed-width fields sit at
//!   static offsets and variable-length sequences are appended after them and
//!   referenced by `(offset, count)` handles (see [`layout`]),
//! - minified JSON (see [`json`]).
//!
//! The exact size of either encoding is computed before encoding, so every
//! encode fills one buffer allocated once, and binary decoding hands out
//! borrowed views into the input instead of copying byte data.
//!
//! # Quickstart
//!
//! ```
//! use {stackheap::Message, std::borrow::Cow};
//!
//! #[derive(Message, Debug, PartialEq)]
//! struct GetPosts<'a> {
//!     #[stackheap(key = "ID")]
//!     id: [u8; 32],
//!     #[stackheap(key = "IDs")]
//!     ids: Cow<'a, [[u8; 32]]>,
//!     offset: u64,
//!     limit: u64,
//! }
//!
//! let request = GetPosts {
//!     id: [1; 32],
//!     ids: Cow::Owned(vec![[2; 32], [3; 32]]),
//!     offset: 0,
//!     limit: 20,
//! };
//!
//! // 32 + 8 + 8 + 8 stack bytes, then 2 * 32 heap bytes.
//! let bytes = request.to_binary();
//! assert_eq!(bytes.len(), GetPosts::STACK_LEN as usize + 64);
//! let decoded = GetPosts::decode_binary(&bytes).unwrap();
//! assert_eq!(decoded, request);
//! // The ids are a view into `bytes`.
//! assert!(matches!(decoded.ids, Cow::Borrowed(_)));
//!
//! let json = request.encode_json();
//! assert_eq!(json.len(), request.json_len());
//! assert!(json.starts_with(br#"{"ID":"AQEB"#));
//! assert!(json.ends_with(br#","Offset":0,"Limit":20}"#));
//! assert_eq!(GetPosts::decode_json(&json).unwrap(), request);
//! ```
//!
//! # Field types
//!
//! | type                       | stack bytes | heap bytes      |
//! |----------------------------|-------------|-----------------|
//! | `u8` ..= `u64`, `i8` ..= `i64` | width   | -               |
//! | [`enumeration!`] enums     | repr width  | -               |
//! | `[u8; N]`                  | `N`         | -               |
//! | `Cow<'a, [[u8; N]]>`       | 8           | `N` per element |
//! | `Cow<'a, [u8]>`            | 8           | 1 per byte      |
//! | `Cow<'a, str>`             | 8           | 1 per byte      |
//! | `Vec<T>` of the scalars    | 8           | width per element |
//!
//! # JSON keys
//!
//! A field's JSON key defaults to its name in PascalCase (`quiddity_id`
//! becomes `QuiddityId`). Set it explicitly with
//! `#[stackheap(key = "QuiddityID")]`.
//!
//! A fixed byte array renders as base64 unless marked
//! `#[stackheap(json = "numbers")]`, which renders it as an array of decimal
//! numbers (see [`json::numbers`]).
//!
//! # Features
//!
//! - `std` (default): implement `std::error::Error` for [`Error`]. Without it
//!   the crate is `no_std` and needs only `alloc`.
//! - `derive` (default): re-export `#[derive(Message)]`.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;
// Lets the derive's `stackheap::` paths resolve inside this crate.
extern crate self as stackheap;

pub mod error;
pub use error::{Error, Result};
pub mod json;
pub mod layout;
mod message;
pub use message::Message;
pub mod scalar;
pub mod schema;

#[cfg(feature = "derive")]
pub use stackheap_derive::Message;
