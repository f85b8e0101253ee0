use {
    super::base64_len,
    crate::{
        error::{integer_overflow, invalid_base64, json_syntax, Result},
        schema::{find_key, FieldDescriptor},
    },
    alloc::{borrow::Cow, string::String, vec::Vec},
    base64::{engine::general_purpose::STANDARD, Engine},
    core::str,
};

/// Forward-only reader over a minified JSON document.
///
/// Positions reported in errors are byte offsets into the input.
#[derive(Debug, Clone)]
pub struct JsonDecoder<'de> {
    buf: &'de [u8],
    pos: usize,
}

impl<'de> JsonDecoder<'de> {
    #[inline]
    pub fn new(buf: &'de [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    #[inline]
    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() != Some(byte) {
            return Err(json_syntax(self.pos));
        }
        self.pos += 1;
        Ok(())
    }

    /// Consume the opening `{` of an object. Returns whether a member
    /// follows; an empty object is consumed whole.
    pub fn begin_object(&mut self) -> Result<bool> {
        self.expect(b'{')?;
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(false);
        }
        Ok(true)
    }

    /// Consume a member key and its colon.
    ///
    /// Returns the index into `fields` of the matching field, or `None` for a
    /// key no field declares. Matching dispatches on the key's leading bytes
    /// and then confirms the full key with its closing `":`, so keys that
    /// merely share a prefix with a declared key are reported as unknown.
    pub fn member_key(&mut self, fields: &[FieldDescriptor]) -> Result<Option<usize>> {
        self.expect(b'"')?;
        if let Some(index) = find_key(fields, &self.buf[self.pos..]) {
            self.pos += fields[index].key_skip as usize;
            return Ok(Some(index));
        }
        self.skip_string_body()?;
        self.expect(b':')?;
        Ok(None)
    }

    /// After a member value: consume `,` and return `true` when another
    /// member follows, or consume `}` and return `false` at the end of the
    /// object.
    pub fn iteration_check(&mut self) -> Result<bool> {
        match self.peek() {
            Some(b',') => {
                self.pos += 1;
                Ok(true)
            }
            Some(b'}') => {
                self.pos += 1;
                Ok(false)
            }
            _ => Err(json_syntax(self.pos)),
        }
    }

    /// Require that the whole input has been consumed.
    pub fn finish(&self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(json_syntax(self.pos));
        }
        Ok(())
    }

    /// Skip past the closing quote of a string whose opening quote has been
    /// consumed.
    fn skip_string_body(&mut self) -> Result<()> {
        while let Some(byte) = self.peek() {
            self.pos += 1;
            match byte {
                b'"' => return Ok(()),
                b'\\' => self.pos += 1,
                _ => {}
            }
        }
        Err(json_syntax(self.buf.len()))
    }

    /// Skip one value of any type.
    ///
    /// Strings are skipped with escape awareness, arrays and objects by
    /// matching each closing bracket against the innermost open one
    /// (ignoring brackets inside strings), and literals up to the next
    /// delimiter. Contents between brackets are not validated further.
    pub fn skip_value(&mut self) -> Result<()> {
        let start = self.pos;
        match self.peek() {
            Some(b'"') => {
                self.pos += 1;
                self.skip_string_body()
            }
            Some(b'[' | b'{') => {
                let mut open = Vec::new();
                while let Some(byte) = self.peek() {
                    match byte {
                        b'"' => {
                            self.pos += 1;
                            self.skip_string_body()?;
                            continue;
                        }
                        b'[' => open.push(b']'),
                        b'{' => open.push(b'}'),
                        b']' | b'}' => {
                            if open.pop() != Some(byte) {
                                return Err(json_syntax(self.pos));
                            }
                            if open.is_empty() {
                                self.pos += 1;
                                return Ok(());
                            }
                        }
                        _ => {}
                    }
                    self.pos += 1;
                }
                Err(json_syntax(self.buf.len()))
            }
            _ => {
                while let Some(byte) = self.peek() {
                    if matches!(byte, b',' | b'}' | b']' | b'"' | b'[' | b'{') {
                        break;
                    }
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(json_syntax(start));
                }
                Ok(())
            }
        }
    }

    /// Read an unsigned decimal integer. Leading zeros are rejected.
    pub fn read_u64(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(byte @ b'0'..=b'9') = self.peek() {
            if self.pos > start && value == 0 {
                return Err(json_syntax(self.pos));
            }
            value = value
                .checked_mul(10)
                .and_then(|value| value.checked_add(u64::from(byte - b'0')))
                .ok_or_else(|| integer_overflow(start))?;
            self.pos += 1;
        }
        if self.pos == start {
            return Err(json_syntax(start));
        }
        Ok(value)
    }

    /// Read a signed decimal integer.
    pub fn read_i64(&mut self) -> Result<i64> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        let magnitude = self.read_u64().map_err(|error| match error {
            crate::Error::IntegerOverflow(_) => integer_overflow(start),
            error => error,
        })?;
        let value = if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        value.ok_or_else(|| integer_overflow(start))
    }

    /// Read a quoted string that must not contain escapes, returning its
    /// contents.
    fn raw_string(&mut self) -> Result<&'de [u8]> {
        self.expect(b'"')?;
        let start = self.pos;
        let len = self.buf[start..]
            .iter()
            .position(|byte| *byte == b'"')
            .ok_or_else(|| json_syntax(self.buf.len()))?;
        self.pos = start + len + 1;
        Ok(&self.buf[start..start + len])
    }

    /// Read a quoted base64 string decoding to exactly `N` bytes.
    ///
    /// The string is taken verbatim up to the next `"`: JSON escapes such as
    /// `\/` are not unescaped and make the value invalid base64.
    pub fn base64_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let start = self.pos;
        let text = self.raw_string()?;
        if text.len() != base64_len(N) {
            return Err(invalid_base64(start));
        }

        // Decode whole groups straight into the array and the padded final
        // group, if any, through a 3 byte scratch.
        let mut out = [0u8; N];
        let whole = N / 3 * 3;
        let (head, tail) = text.split_at(whole / 3 * 4);
        let decoded = STANDARD
            .decode_slice(head, &mut out[..whole])
            .map_err(|_| invalid_base64(start))?;
        if decoded != whole {
            return Err(invalid_base64(start));
        }
        if !tail.is_empty() {
            let mut scratch = [0u8; 3];
            let decoded = STANDARD
                .decode_slice(tail, &mut scratch)
                .map_err(|_| invalid_base64(start))?;
            if decoded != N - whole {
                return Err(invalid_base64(start));
            }
            out[whole..].copy_from_slice(&scratch[..decoded]);
        }
        Ok(out)
    }

    /// Read a quoted base64 string of any length.
    ///
    /// Like [`base64_array`](Self::base64_array), escapes are not supported.
    pub fn base64_bytes(&mut self) -> Result<Vec<u8>> {
        let start = self.pos;
        let text = self.raw_string()?;
        STANDARD.decode(text).map_err(|_| invalid_base64(start))
    }

    /// Read a JSON array, decoding each element with `read`.
    pub fn array<T>(&mut self, mut read: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(read(self)?);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(json_syntax(self.pos)),
            }
        }
    }

    /// Read a JSON string.
    ///
    /// A string without escapes is borrowed from the input; otherwise it is
    /// unescaped into an owned `String`. Raw control characters and lone
    /// surrogates are rejected.
    pub fn string(&mut self) -> Result<Cow<'de, str>> {
        self.expect(b'"')?;
        let start = self.pos;
        let mut owned: Option<String> = None;
        let mut run = start;
        loop {
            let Some(byte) = self.peek() else {
                return Err(json_syntax(self.buf.len()));
            };
            match byte {
                b'"' => {
                    let tail = str::from_utf8(&self.buf[run..self.pos])?;
                    self.pos += 1;
                    return Ok(match owned {
                        Some(mut text) => {
                            text.push_str(tail);
                            Cow::Owned(text)
                        }
                        None => Cow::Borrowed(tail),
                    });
                }
                b'\\' => {
                    let text = owned.get_or_insert_with(String::new);
                    text.push_str(str::from_utf8(&self.buf[run..self.pos])?);
                    self.pos += 1;
                    let ch = self.escape()?;
                    text.push(ch);
                    run = self.pos;
                }
                0x00..=0x1f => return Err(json_syntax(self.pos)),
                _ => self.pos += 1,
            }
        }
    }

    /// Decode the escape sequence following a backslash.
    fn escape(&mut self) -> Result<char> {
        let start = self.pos - 1;
        let byte = self.peek().ok_or_else(|| json_syntax(start))?;
        self.pos += 1;
        let ch = match byte {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let unit = self.hex4()?;
                let code = match unit {
                    0xd800..=0xdbff => {
                        if self.buf.get(self.pos..self.pos + 2) != Some(&b"\\u"[..]) {
                            return Err(json_syntax(start));
                        }
                        self.pos += 2;
                        let low = self.hex4()?;
                        if !(0xdc00..=0xdfff).contains(&low) {
                            return Err(json_syntax(start));
                        }
                        0x10000 + ((u32::from(unit) - 0xd800) << 10) + (u32::from(low) - 0xdc00)
                    }
                    0xdc00..=0xdfff => return Err(json_syntax(start)),
                    unit => u32::from(unit),
                };
                char::from_u32(code).ok_or_else(|| json_syntax(start))?
            }
            _ => return Err(json_syntax(start)),
        };
        Ok(ch)
    }

    fn hex4(&mut self) -> Result<u16> {
        let digits = self
            .buf
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| json_syntax(self.pos))?;
        let mut unit = 0u16;
        for &digit in digits {
            let nibble = match digit {
                b'0'..=b'9' => digit - b'0',
                b'a'..=b'f' => digit - b'a' + 10,
                b'A'..=b'F' => digit - b'A' + 10,
                _ => return Err(json_syntax(self.pos)),
            };
            unit = unit << 4 | u16::from(nibble);
        }
        self.pos += 4;
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            error::Error,
            schema::{table, FieldSpec},
        },
        proptest::prelude::*,
    };

    #[test]
    fn unsigned_integers() {
        assert_eq!(JsonDecoder::new(b"0").read_u64(), Ok(0));
        assert_eq!(JsonDecoder::new(b"1234,").read_u64(), Ok(1234));
        assert_eq!(
            JsonDecoder::new(b"18446744073709551615").read_u64(),
            Ok(u64::MAX)
        );
        assert_eq!(
            JsonDecoder::new(b"18446744073709551616").read_u64(),
            Err(Error::IntegerOverflow(0))
        );
        assert_eq!(JsonDecoder::new(b"007").read_u64(), Err(Error::JsonSyntax(1)));
        assert_eq!(JsonDecoder::new(b"x").read_u64(), Err(Error::JsonSyntax(0)));
        assert_eq!(JsonDecoder::new(b"").read_u64(), Err(Error::JsonSyntax(0)));
    }

    #[test]
    fn signed_integers() {
        assert_eq!(JsonDecoder::new(b"-42").read_i64(), Ok(-42));
        assert_eq!(JsonDecoder::new(b"-0").read_i64(), Ok(0));
        assert_eq!(
            JsonDecoder::new(b"-9223372036854775808").read_i64(),
            Ok(i64::MIN)
        );
        assert_eq!(
            JsonDecoder::new(b"9223372036854775808").read_i64(),
            Err(Error::IntegerOverflow(0))
        );
        assert_eq!(JsonDecoder::new(b"-").read_i64(), Err(Error::JsonSyntax(1)));
    }

    #[test]
    fn fixed_base64() {
        let mut decoder = JsonDecoder::new(br#""QUJDRA==""#);
        assert_eq!(decoder.base64_array::<4>(), Ok(*b"ABCD"));
        assert!(decoder.finish().is_ok());

        assert_eq!(
            JsonDecoder::new(br#""QUJD""#).base64_array::<3>(),
            Ok(*b"ABC")
        );
        // Wrong length for the array.
        assert_eq!(
            JsonDecoder::new(br#""QUJD""#).base64_array::<4>(),
            Err(Error::InvalidBase64(0))
        );
        // Decodes to 2 bytes, not 1.
        assert_eq!(
            JsonDecoder::new(br#""QUI=""#).base64_array::<1>(),
            Err(Error::InvalidBase64(0))
        );
        assert_eq!(
            JsonDecoder::new(br#""Q!==""#).base64_array::<1>(),
            Err(Error::InvalidBase64(0))
        );
        // Escapes are not unescaped inside base64 values.
        assert_eq!(
            JsonDecoder::new(br#""\/w==""#).base64_array::<1>(),
            Err(Error::InvalidBase64(0))
        );
        assert_eq!(
            JsonDecoder::new(br#""AQIe\/w==""#).base64_bytes(),
            Err(Error::InvalidBase64(0))
        );
    }

    #[test]
    fn member_keys_dispatch_through_table() {
        let fields = table([
            FieldSpec::of::<u8>("ID"),
            FieldSpec::of::<u8>("IDs"),
            FieldSpec::of::<u8>("Title"),
            FieldSpec::of::<u8>("Text"),
        ]);
        let mut decoder = JsonDecoder::new(br#"{"Text":1,"IDx":[1,"]"],"ID":2,"Title":3}"#);
        assert_eq!(decoder.begin_object(), Ok(true));

        assert_eq!(decoder.member_key(&fields), Ok(Some(3)));
        assert_eq!(decoder.read_u64(), Ok(1));
        assert_eq!(decoder.iteration_check(), Ok(true));

        assert_eq!(decoder.member_key(&fields), Ok(None));
        assert_eq!(decoder.skip_value(), Ok(()));
        assert_eq!(decoder.iteration_check(), Ok(true));

        assert_eq!(decoder.member_key(&fields), Ok(Some(0)));
        assert_eq!(decoder.read_u64(), Ok(2));
        assert_eq!(decoder.iteration_check(), Ok(true));

        assert_eq!(decoder.member_key(&fields), Ok(Some(2)));
        assert_eq!(decoder.read_u64(), Ok(3));
        assert_eq!(decoder.iteration_check(), Ok(false));
        assert_eq!(decoder.finish(), Ok(()));
    }

    #[test]
    fn skip_nested_values() {
        for input in [
            &br#""a\"}""#[..],
            b"[1,[2,{}],\"]\"]",
            br#"{"a":{"b":[]}}"#,
            b"true",
            b"-1.5e3",
            b"null",
        ] {
            let mut decoder = JsonDecoder::new(input);
            assert_eq!(decoder.skip_value(), Ok(()), "{input:?}");
            assert_eq!(decoder.finish(), Ok(()), "{input:?}");
        }
        assert!(JsonDecoder::new(b"[1,2").skip_value().is_err());
        assert!(JsonDecoder::new(b"\"open").skip_value().is_err());
        assert!(JsonDecoder::new(b",").skip_value().is_err());
        assert_eq!(JsonDecoder::new(b"[}").skip_value(), Err(Error::JsonSyntax(1)));
        assert_eq!(JsonDecoder::new(b"[{]}").skip_value(), Err(Error::JsonSyntax(2)));
        assert_eq!(JsonDecoder::new(b"{]").skip_value(), Err(Error::JsonSyntax(1)));
    }

    #[test]
    fn iteration_check_rejects_other_bytes() {
        let mut decoder = JsonDecoder::new(b";");
        assert_eq!(decoder.iteration_check(), Err(Error::JsonSyntax(0)));
    }

    #[test]
    fn plain_strings_are_borrowed() {
        let input = r#""hello ß""#;
        let mut decoder = JsonDecoder::new(input.as_bytes());
        let text = decoder.string().unwrap();
        assert!(matches!(text, Cow::Borrowed("hello ß")));
    }

    #[test]
    fn escaped_strings_are_owned() {
        let mut decoder = JsonDecoder::new(r#""a\"b\\c\/\né😀""#.as_bytes());
        let text = decoder.string().unwrap();
        assert!(matches!(text, Cow::Owned(_)));
        assert_eq!(text, "a\"b\\c/\né😀");
    }

    #[test]
    fn invalid_strings() {
        for input in [
            &br#""\ud83d""#[..],
            br#""\ude00""#,
            br#""\x""#,
            br#""\u12""#,
            b"\"a\nb\"",
            b"\"open",
        ] {
            assert!(
                matches!(JsonDecoder::new(input).string(), Err(Error::JsonSyntax(_))),
                "{input:?}"
            );
        }
        assert!(matches!(
            JsonDecoder::new(b"\"\xff\"").string(),
            Err(Error::InvalidUtf8Encoding(_))
        ));
    }

    #[test]
    fn arrays() {
        assert_eq!(
            JsonDecoder::new(b"[1,2,3]").array(|d| d.read_u64()),
            Ok(alloc::vec![1, 2, 3])
        );
        assert_eq!(JsonDecoder::new(b"[]").array(|d| d.read_u64()), Ok(alloc::vec![]));
        assert_eq!(
            JsonDecoder::new(b"[1,2,]").array(|d| d.read_u64()),
            Err(Error::JsonSyntax(5))
        );
        assert_eq!(
            JsonDecoder::new(b"[1 2]").array(|d| d.read_u64()),
            Err(Error::JsonSyntax(2))
        );
    }

    proptest! {
        #[test]
        fn strings_read_what_serde_json_writes(text in any::<String>()) {
            let input = serde_json::to_vec(&text).unwrap();
            let mut decoder = JsonDecoder::new(&input);
            prop_assert_eq!(decoder.string().unwrap(), text.as_str());
            prop_assert!(decoder.finish().is_ok());
        }

        #[test]
        fn base64_arrays_read_what_the_engine_writes(bytes in any::<[u8; 32]>()) {
            let input = alloc::format!("\"{}\"", STANDARD.encode(bytes));
            prop_assert_eq!(JsonDecoder::new(input.as_bytes()).base64_array::<32>(), Ok(bytes));
        }
    }
}
