//! The [`Message`] contract.
use {
    crate::{
        error::Result,
        json::{JsonDecoder, JsonEncoder},
        layout::{Reader, Writer},
        schema::{self, FieldDescriptor},
    },
    alloc::{vec, vec::Vec},
};

/// A typed record with a binary and a JSON wire form.
///
/// Both forms carry the same logical value. The output size of either is
/// known before encoding, so each encode fills a buffer allocated once.
///
/// Implement with `#[derive(Message)]`; the derive generates [`FIELDS`] and
/// the field-level hooks, and every codec operation is a provided method.
///
/// `'de` is the lifetime of the buffer a record is decoded from. Decoded
/// sequences of bytes, byte arrays and text borrow from that buffer.
///
/// [`FIELDS`]: Message::FIELDS
pub trait Message<'de>: Sized {
    /// The field descriptor table, in declaration order.
    const FIELDS: &'static [FieldDescriptor];
    /// Size of the stack region.
    const STACK_LEN: u32 = schema::stack_len(Self::FIELDS);
    /// Bytes of the JSON rendering that do not depend on field values.
    const JSON_OVERHEAD: usize = schema::json_overhead(Self::FIELDS);

    /// Bytes the record's sequence fields occupy in the heap region.
    fn heap_len(&self) -> u32;

    /// Write every field into `writer`, in declaration order.
    fn write_fields(&self, writer: &mut Writer<'_>);

    /// Read every field from `reader`.
    fn read_fields(reader: &Reader<'de>) -> Result<Self>;

    /// Sum of the rendered widths of every field value.
    fn json_values_len(&self) -> usize;

    /// Render the record as a JSON object.
    fn write_json(&self, encoder: &mut JsonEncoder<'_>);

    /// Read the record from a JSON object. Bytes following the object are
    /// left unread.
    fn read_json(decoder: &mut JsonDecoder<'de>) -> Result<Self>;

    #[inline]
    fn stack_len(&self) -> u32 {
        Self::STACK_LEN
    }

    /// Exact size of the binary encoding: `STACK_LEN + heap_len()`.
    #[inline]
    fn binary_len(&self) -> usize {
        Self::STACK_LEN as usize + self.heap_len() as usize
    }

    /// Encode into the front of `dst`, returning the number of bytes written.
    ///
    /// # Panics
    ///
    /// If `dst` is shorter than [`binary_len`](Message::binary_len).
    fn encode_binary(&self, dst: &mut [u8]) -> usize {
        let mut writer = Writer::new(dst, Self::STACK_LEN, self.heap_len());
        self.write_fields(&mut writer);
        writer.finish()
    }

    /// Encode into a freshly allocated buffer of exactly
    /// [`binary_len`](Message::binary_len) bytes.
    fn to_binary(&self) -> Vec<u8> {
        let mut buf = vec![0; self.binary_len()];
        self.encode_binary(&mut buf);
        buf
    }

    /// Decode a record from its binary encoding.
    ///
    /// Bytes past the last heap field are ignored.
    fn decode_binary(src: &'de [u8]) -> Result<Self> {
        let reader = Reader::new(src, Self::STACK_LEN)?;
        Self::read_fields(&reader)
    }

    /// Exact size of the JSON encoding.
    #[inline]
    fn json_len(&self) -> usize {
        Self::JSON_OVERHEAD + self.json_values_len()
    }

    fn encode_json(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_json_into(&mut out);
        out
    }

    /// Append the JSON encoding to `out`.
    fn encode_json_into(&self, out: &mut Vec<u8>) {
        let len = self.json_len();
        out.reserve_exact(len);
        let start = out.len();
        self.write_json(&mut JsonEncoder::new(out));
        debug_assert_eq!(out.len() - start, len, "json_len disagrees with the output");
    }

    /// Decode a record from a minified JSON object spanning all of `src`.
    fn decode_json(src: &'de [u8]) -> Result<Self> {
        let mut decoder = JsonDecoder::new(src);
        let value = Self::read_json(&mut decoder)?;
        decoder.finish()?;
        Ok(value)
    }
}
