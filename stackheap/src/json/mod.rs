//! Minified JSON codec.
//!
//! A message renders as a single object, fields in declaration order, with no
//! insignificant whitespace:
//!
//! ```text
//! {"ID":"AAEC...","IDs":["AwQF...","BgcI..."],"Offset":0,"Limit":20}
//! ```
//!
//! Value renderings by field type:
//!
//! | field                 | JSON                                   |
//! |-----------------------|----------------------------------------|
//! | integer, enumeration  | decimal integer                        |
//! | `[u8; N]`             | quoted standard base64 (padded)        |
//! | `[u8; N]`, `numbers`  | array of decimal integers, see [`numbers`] |
//! | `Cow<[u8]>`           | quoted standard base64 (padded)        |
//! | `Cow<[[u8; N]]>`      | array of quoted base64 strings         |
//! | `Vec<T>` of scalars   | array of decimal integers              |
//! | `Cow<str>`            | JSON string                            |
//!
//! The exact output length is known before encoding: [`JsonField::json_len`]
//! sums each value's rendered width, and the message adds its keys, braces
//! and commas from its descriptor table.
//!
//! Decoding is one forward scan over the input with no intermediate token
//! tree. Keys are dispatched through the descriptor table (see
//! [`JsonDecoder::member_key`]), unknown members are skipped, and every
//! declared field must be present.
use crate::error::Result;

mod decoder;
mod encoder;
mod impls;
pub mod numbers;

pub use {decoder::JsonDecoder, encoder::JsonEncoder};

/// A field type with a JSON rendering.
pub trait JsonField<'de>: Sized {
    /// Exact number of bytes [`write_json`](JsonField::write_json) emits.
    fn json_len(&self) -> usize;

    fn write_json(&self, encoder: &mut JsonEncoder<'_>);

    fn read_json(decoder: &mut JsonDecoder<'de>) -> Result<Self>;
}

/// Length of the decimal rendering of `value`.
pub const fn unsigned_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 10 {
        value /= 10;
        len += 1;
    }
    len
}

/// Length of the decimal rendering of `value`, sign included.
pub const fn signed_len(value: i64) -> usize {
    unsigned_len(value.unsigned_abs()) + (value < 0) as usize
}

/// Length of the padded base64 encoding of `len` bytes, quotes excluded.
pub const fn base64_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Length of a JSON array whose elements render to `values_len` bytes in
/// total: brackets plus `count - 1` commas.
pub const fn array_len(count: usize, values_len: usize) -> usize {
    2 + values_len + count.saturating_sub(1)
}

/// Bytes `byte` occupies inside a JSON string.
#[inline(always)]
pub(crate) const fn escaped_byte_len(byte: u8) -> usize {
    match byte {
        b'"' | b'\\' | b'\n' | b'\r' | b'\t' | 0x08 | 0x0c => 2,
        0x00..=0x1f => 6,
        _ => 1,
    }
}

/// Length of `text` rendered as a JSON string, quotes excluded.
pub fn escaped_len(text: &str) -> usize {
    text.bytes().map(escaped_byte_len).sum()
}

#[cfg(test)]
mod tests {
    use {super::*, proptest::prelude::*};

    #[test]
    fn base64_widths() {
        assert_eq!(base64_len(0), 0);
        assert_eq!(base64_len(1), 4);
        assert_eq!(base64_len(16), 24);
        assert_eq!(base64_len(32), 44);
    }

    #[test]
    fn array_widths() {
        assert_eq!(array_len(0, 0), 2);
        // [1,22,333]
        assert_eq!(array_len(3, 6), 10);
    }

    #[test]
    fn escaped_widths() {
        assert_eq!(escaped_len("plain"), 5);
        assert_eq!(escaped_len("a\"b\\c"), 7);
        assert_eq!(escaped_len("\n\u{1}"), 8);
        assert_eq!(escaped_len("ß"), 2);
    }

    proptest! {
        #[test]
        fn decimal_widths(u in any::<u64>(), i in any::<i64>()) {
            prop_assert_eq!(unsigned_len(u), u.to_string().len());
            prop_assert_eq!(signed_len(i), i.to_string().len());
        }
    }
}
