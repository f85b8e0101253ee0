use {
    super::{array_len, base64_len, escaped_len, JsonDecoder, JsonEncoder, JsonField},
    crate::{error::Result, scalar::Scalar},
    alloc::{borrow::Cow, vec::Vec},
};

impl<'de, const N: usize> JsonField<'de> for [u8; N] {
    #[inline]
    fn json_len(&self) -> usize {
        base64_len(N) + 2
    }

    #[inline]
    fn write_json(&self, encoder: &mut JsonEncoder<'_>) {
        encoder.base64(self);
    }

    #[inline]
    fn read_json(decoder: &mut JsonDecoder<'de>) -> Result<Self> {
        decoder.base64_array()
    }
}

impl<'de: 'a, 'a, const N: usize> JsonField<'de> for Cow<'a, [[u8; N]]> {
    #[inline]
    fn json_len(&self) -> usize {
        array_len(self.len(), self.len() * (base64_len(N) + 2))
    }

    fn write_json(&self, encoder: &mut JsonEncoder<'_>) {
        encoder.array(&**self, |encoder, item| encoder.base64(item));
    }

    fn read_json(decoder: &mut JsonDecoder<'de>) -> Result<Self> {
        decoder
            .array(|decoder| decoder.base64_array::<N>())
            .map(Cow::Owned)
    }
}

impl<'de: 'a, 'a> JsonField<'de> for Cow<'a, [u8]> {
    #[inline]
    fn json_len(&self) -> usize {
        base64_len(self.len()) + 2
    }

    #[inline]
    fn write_json(&self, encoder: &mut JsonEncoder<'_>) {
        encoder.base64(self);
    }

    #[inline]
    fn read_json(decoder: &mut JsonDecoder<'de>) -> Result<Self> {
        decoder.base64_bytes().map(Cow::Owned)
    }
}

impl<'de: 'a, 'a> JsonField<'de> for Cow<'a, str> {
    #[inline]
    fn json_len(&self) -> usize {
        escaped_len(self) + 2
    }

    #[inline]
    fn write_json(&self, encoder: &mut JsonEncoder<'_>) {
        encoder.string(self);
    }

    #[inline]
    fn read_json(decoder: &mut JsonDecoder<'de>) -> Result<Self> {
        decoder.string()
    }
}

impl<'de, T: Scalar> JsonField<'de> for Vec<T> {
    fn json_len(&self) -> usize {
        let values: usize = self.iter().map(|value| value.decimal_len()).sum();
        array_len(self.len(), values)
    }

    fn write_json(&self, encoder: &mut JsonEncoder<'_>) {
        encoder.array(self.as_slice(), |encoder, value| value.write_decimal(encoder));
    }

    fn read_json(decoder: &mut JsonDecoder<'de>) -> Result<Self> {
        decoder.array(T::read_decimal)
    }
}
