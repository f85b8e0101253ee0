use {
    super::{base64_len, escaped_byte_len},
    crate::schema::FieldDescriptor,
    alloc::vec::Vec,
    base64::{engine::general_purpose::STANDARD, Engine},
};

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Appends minified JSON to a byte vector.
///
/// The encoder only appends: callers reserve the exact output length up front
/// so rendering a message never reallocates.
pub struct JsonEncoder<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> JsonEncoder<'a> {
    #[inline]
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out }
    }

    #[inline]
    pub fn begin_object(&mut self) {
        self.out.push(b'{');
    }

    /// Emit `"Key":` for `field`, preceded by a comma unless it is the first
    /// field.
    #[inline]
    pub fn key(&mut self, field: &FieldDescriptor) {
        if field.index > 0 {
            self.out.push(b',');
        }
        self.out.push(b'"');
        self.out.extend_from_slice(field.key.as_bytes());
        self.out.extend_from_slice(b"\":");
    }

    #[inline]
    pub fn end_object(&mut self) {
        self.out.push(b'}');
    }

    pub fn write_u64(&mut self, mut value: u64) {
        let mut digits = [0u8; 20];
        let mut start = digits.len();
        loop {
            start -= 1;
            digits[start] = b'0' + (value % 10) as u8;
            value /= 10;
            if value == 0 {
                break;
            }
        }
        self.out.extend_from_slice(&digits[start..]);
    }

    pub fn write_i64(&mut self, value: i64) {
        if value < 0 {
            self.out.push(b'-');
        }
        self.write_u64(value.unsigned_abs());
    }

    /// Emit `bytes` as a quoted, padded standard base64 string.
    pub fn base64(&mut self, bytes: &[u8]) {
        self.out.push(b'"');
        let start = self.out.len();
        self.out.resize(start + base64_len(bytes.len()), 0);
        match STANDARD.encode_slice(bytes, &mut self.out[start..]) {
            Ok(written) => debug_assert_eq!(written, base64_len(bytes.len())),
            Err(_) => unreachable!("base64 output is sized from the input length"),
        }
        self.out.push(b'"');
    }

    /// Emit `text` as a quoted JSON string.
    ///
    /// `"` and `\` are backslash-escaped, as are control characters (short
    /// forms where JSON has one, `\u00XX` otherwise). Everything else,
    /// non-ASCII included, is copied verbatim.
    pub fn string(&mut self, text: &str) {
        self.out.push(b'"');
        let bytes = text.as_bytes();
        let mut run = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if escaped_byte_len(byte) == 1 {
                continue;
            }
            self.out.extend_from_slice(&bytes[run..i]);
            run = i + 1;
            match byte {
                b'"' => self.out.extend_from_slice(b"\\\""),
                b'\\' => self.out.extend_from_slice(b"\\\\"),
                b'\n' => self.out.extend_from_slice(b"\\n"),
                b'\r' => self.out.extend_from_slice(b"\\r"),
                b'\t' => self.out.extend_from_slice(b"\\t"),
                0x08 => self.out.extend_from_slice(b"\\b"),
                0x0c => self.out.extend_from_slice(b"\\f"),
                _ => self.out.extend_from_slice(&[
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[(byte >> 4) as usize],
                    HEX[(byte & 0xf) as usize],
                ]),
            }
        }
        self.out.extend_from_slice(&bytes[run..]);
        self.out.push(b'"');
    }

    /// Emit `items` as a JSON array, rendering each element with `write`.
    pub fn array<T>(&mut self, items: &[T], mut write: impl FnMut(&mut Self, &T)) {
        self.out.push(b'[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(b',');
            }
            write(self, item);
        }
        self.out.push(b']');
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            json::escaped_len,
            schema::{table, FieldSpec},
        },
        proptest::prelude::*,
    };

    fn render(f: impl FnOnce(&mut JsonEncoder<'_>)) -> Vec<u8> {
        let mut out = Vec::new();
        f(&mut JsonEncoder::new(&mut out));
        out
    }

    #[test]
    fn keys_are_comma_separated() {
        let fields = table([FieldSpec::of::<u8>("Offset"), FieldSpec::of::<u8>("Limit")]);
        let out = render(|e| {
            e.begin_object();
            e.key(&fields[0]);
            e.write_u64(0);
            e.key(&fields[1]);
            e.write_i64(-20);
            e.end_object();
        });
        assert_eq!(out, br#"{"Offset":0,"Limit":-20}"#);
    }

    #[test]
    fn base64_is_quoted_and_padded() {
        assert_eq!(render(|e| e.base64(b"")), br#""""#);
        assert_eq!(render(|e| e.base64(b"A")), br#""QQ==""#);
        assert_eq!(render(|e| e.base64(b"ABC")), br#""QUJD""#);
    }

    #[test]
    fn strings_escape_quotes_backslashes_and_controls() {
        assert_eq!(
            render(|e| e.string("say \"hi\"\\\n\u{1}ß")),
            r#""say \"hi\"\\\n\u0001ß""#.as_bytes()
        );
    }

    #[test]
    fn arrays_have_no_trailing_comma() {
        assert_eq!(render(|e| e.array(&[1u64, 2, 3], |e, v| e.write_u64(*v))), b"[1,2,3]");
        assert_eq!(render(|e| e.array::<u64>(&[], |e, v| e.write_u64(*v))), b"[]");
    }

    proptest! {
        #[test]
        fn string_is_valid_json(text in any::<String>()) {
            let out = render(|e| e.string(&text));
            prop_assert_eq!(out.len(), escaped_len(&text) + 2);
            let parsed: String = serde_json::from_slice(&out).unwrap();
            prop_assert_eq!(parsed, text);
        }

        #[test]
        fn base64_matches_engine(bytes in proptest::collection::vec(any::<u8>(), 0..100)) {
            let out = render(|e| e.base64(&bytes));
            let expected = STANDARD.encode(&bytes);
            prop_assert_eq!(&out[1..out.len() - 1], expected.as_bytes());
        }
    }
}
