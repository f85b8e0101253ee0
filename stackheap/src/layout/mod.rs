//! Binary "stack + heap" layout.
//!
//! An encoded message is one contiguous buffer split in two regions:
//!
//! ```text
//! 0                      STACK_LEN                      STACK_LEN + heap_len
//! ├──────── stack ───────────┼──────────────── heap ─────────────────┤
//! │ scalars, byte arrays,    │ elements of every sequence field,     │
//! │ (offset, count) handles  │ packed in declaration order           │
//! ```
//!
//! Stack fields sit at static offsets taken from the message's
//! [`FIELDS`](crate::Message::FIELDS) table. Each sequence field owns an
//! 8-byte handle in the stack region: a little-endian `u32` offset into the
//! buffer followed by a little-endian `u32` element count.
//!
//! Decoding never copies fixed-size byte elements: sequences of byte arrays,
//! raw bytes and text are returned as [`Cow::Borrowed`](alloc::borrow::Cow)
//! views into the input buffer, so a decoded message cannot outlive the
//! buffer it was decoded from. Scalar sequences are copied, since every
//! element needs a little-endian conversion.
use crate::{error::Result, schema::FieldKind};

mod impls;
mod io;

pub use io::{Reader, Writer};

/// A field type that can live in a message's binary layout.
pub trait LayoutField<'de>: Sized {
    const KIND: FieldKind;
    /// Bytes the field occupies in the stack region.
    const STACK_LEN: u32;
    /// Size of one heap element for [`FieldKind::Sequence`] fields.
    const ELEM_SIZE: u32 = 0;

    /// Bytes the field occupies in the heap region.
    #[inline(always)]
    fn heap_len(&self) -> u32 {
        0
    }

    /// Write the field at stack `offset`, appending any heap data at the
    /// writer's heap cursor.
    fn write(&self, writer: &mut Writer<'_>, offset: u32);

    /// Read the field from stack `offset`.
    fn read(reader: &Reader<'de>, offset: u32) -> Result<Self>;
}

/// Heap bytes needed for `count` elements of `elem_size` bytes.
///
/// # Panics
///
/// If the sequence cannot be addressed by a `u32` heap handle.
#[inline]
pub fn sequence_heap_len(count: usize, elem_size: u32) -> u32 {
    match count
        .checked_mul(elem_size as usize)
        .and_then(|len| u32::try_from(len).ok())
    {
        Some(len) => len,
        None => panic!("sequence of {count} elements overflows the u32 heap region"),
    }
}

/// Accumulate per-field heap lengths.
///
/// # Panics
///
/// If the heap region would exceed `u32::MAX` bytes.
#[inline]
pub fn add_heap_len(total: u32, field: u32) -> u32 {
    match total.checked_add(field) {
        Some(total) => total,
        None => panic!("heap region overflows u32"),
    }
}
