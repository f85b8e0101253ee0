//! Fixed byte arrays rendered as arrays of decimal numbers, `[1,2,255]`,
//! instead of a base64 string.
//!
//! Selected per field with `#[stackheap(json = "numbers")]`; the binary
//! layout is unchanged.
use {
    super::{array_len, unsigned_len, JsonDecoder, JsonEncoder},
    crate::{
        error::{json_syntax, Result},
        scalar::Scalar,
    },
};

#[inline]
pub fn json_len<const N: usize>(bytes: &[u8; N]) -> usize {
    let values: usize = bytes.iter().map(|byte| unsigned_len(u64::from(*byte))).sum();
    array_len(N, values)
}

#[inline]
pub fn write_json<const N: usize>(bytes: &[u8; N], encoder: &mut JsonEncoder<'_>) {
    encoder.array(bytes.as_slice(), |encoder, byte| {
        encoder.write_u64(u64::from(*byte))
    });
}

/// Read an array of exactly `N` integers, each at most 255.
///
/// A value above 255 is `IntegerOverflow` at that value; an array of the
/// wrong length is `JsonSyntax` at its opening bracket.
pub fn read_json<const N: usize>(decoder: &mut JsonDecoder<'_>) -> Result<[u8; N]> {
    let start = decoder.position();
    let values = decoder.array(u8::read_decimal)?;
    <[u8; N]>::try_from(values).map_err(|_| json_syntax(start))
}
