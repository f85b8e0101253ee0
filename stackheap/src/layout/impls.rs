use {
    super::{sequence_heap_len, LayoutField, Reader, Writer},
    crate::{
        error::Result,
        scalar::Scalar,
        schema::{FieldKind, HANDLE_LEN},
    },
    alloc::{borrow::Cow, vec::Vec},
    core::str,
};

/// Element count of a heap field.
///
/// # Panics
///
/// If `len` does not fit the handle's `u32` count.
#[inline]
fn count(len: usize) -> u32 {
    match u32::try_from(len) {
        Ok(count) => count,
        Err(_) => panic!("sequence of {len} elements overflows the u32 heap handle count"),
    }
}

impl<'de, const N: usize> LayoutField<'de> for [u8; N] {
    const KIND: FieldKind = FieldKind::ByteArray;
    const STACK_LEN: u32 = {
        assert!(N <= u32::MAX as usize, "byte array field wider than u32::MAX");
        N as u32
    };

    #[inline]
    fn write(&self, writer: &mut Writer<'_>, offset: u32) {
        writer.stack(offset, Self::STACK_LEN).copy_from_slice(self);
    }

    #[inline]
    fn read(reader: &Reader<'de>, offset: u32) -> Result<Self> {
        reader.array(offset)
    }
}

impl<'de: 'a, 'a, const N: usize> LayoutField<'de> for Cow<'a, [[u8; N]]> {
    const KIND: FieldKind = FieldKind::Sequence;
    const STACK_LEN: u32 = HANDLE_LEN;
    const ELEM_SIZE: u32 = {
        assert!(N > 0, "sequence elements must not be zero-sized");
        assert!(N <= u32::MAX as usize, "sequence element wider than u32::MAX");
        N as u32
    };

    #[inline]
    fn heap_len(&self) -> u32 {
        sequence_heap_len(self.len(), Self::ELEM_SIZE)
    }

    #[inline]
    fn write(&self, writer: &mut Writer<'_>, offset: u32) {
        writer
            .heap(offset, count(self.len()), Self::ELEM_SIZE)
            .copy_from_slice(self.as_flattened());
    }

    /// Borrows the elements from the input buffer without copying.
    #[inline]
    fn read(reader: &Reader<'de>, offset: u32) -> Result<Self> {
        let (bytes, _) = reader.heap(offset, Self::ELEM_SIZE)?;
        let (items, rest) = bytes.as_chunks::<N>();
        debug_assert!(rest.is_empty());
        Ok(Cow::Borrowed(items))
    }
}

impl<'de: 'a, 'a> LayoutField<'de> for Cow<'a, [u8]> {
    const KIND: FieldKind = FieldKind::Sequence;
    const STACK_LEN: u32 = HANDLE_LEN;
    const ELEM_SIZE: u32 = 1;

    #[inline]
    fn heap_len(&self) -> u32 {
        sequence_heap_len(self.len(), 1)
    }

    #[inline]
    fn write(&self, writer: &mut Writer<'_>, offset: u32) {
        writer.heap(offset, count(self.len()), 1).copy_from_slice(self);
    }

    #[inline]
    fn read(reader: &Reader<'de>, offset: u32) -> Result<Self> {
        let (bytes, _) = reader.heap(offset, 1)?;
        Ok(Cow::Borrowed(bytes))
    }
}

impl<'de: 'a, 'a> LayoutField<'de> for Cow<'a, str> {
    const KIND: FieldKind = FieldKind::Sequence;
    const STACK_LEN: u32 = HANDLE_LEN;
    const ELEM_SIZE: u32 = 1;

    #[inline]
    fn heap_len(&self) -> u32 {
        sequence_heap_len(self.len(), 1)
    }

    #[inline]
    fn write(&self, writer: &mut Writer<'_>, offset: u32) {
        writer
            .heap(offset, count(self.len()), 1)
            .copy_from_slice(self.as_bytes());
    }

    #[inline]
    fn read(reader: &Reader<'de>, offset: u32) -> Result<Self> {
        let (bytes, _) = reader.heap(offset, 1)?;
        Ok(Cow::Borrowed(str::from_utf8(bytes)?))
    }
}

/// Scalar sequences are copied on decode, converting each element from
/// little-endian.
impl<'de, T: Scalar> LayoutField<'de> for Vec<T> {
    const KIND: FieldKind = FieldKind::Sequence;
    const STACK_LEN: u32 = HANDLE_LEN;
    const ELEM_SIZE: u32 = T::SIZE;

    #[inline]
    fn heap_len(&self) -> u32 {
        sequence_heap_len(self.len(), T::SIZE)
    }

    fn write(&self, writer: &mut Writer<'_>, offset: u32) {
        let dst = writer.heap(offset, count(self.len()), T::SIZE);
        for (chunk, value) in dst.chunks_exact_mut(T::SIZE as usize).zip(self) {
            value.put_le(chunk);
        }
    }

    fn read(reader: &Reader<'de>, offset: u32) -> Result<Self> {
        let (bytes, _) = reader.heap(offset, T::SIZE)?;
        bytes.chunks_exact(T::SIZE as usize).map(T::get_le).collect()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::error::Error,
        alloc::vec,
        proptest::prelude::*,
    };

    /// Encode `value` as the only field of a message, returning the buffer.
    fn encode<'de, T: LayoutField<'de>>(value: &T) -> Vec<u8> {
        let mut buf = vec![0u8; (T::STACK_LEN + value.heap_len()) as usize];
        let mut writer = Writer::new(&mut buf, T::STACK_LEN, value.heap_len());
        value.write(&mut writer, 0);
        writer.finish();
        buf
    }

    fn decode<'de, T: LayoutField<'de>>(buf: &'de [u8]) -> Result<T> {
        T::read(&Reader::new(buf, T::STACK_LEN)?, 0)
    }

    #[test]
    fn byte_array_is_verbatim_on_stack() {
        assert_eq!(encode(&[7u8; 16]), [7u8; 16]);
        assert_eq!(decode::<[u8; 4]>(&[1, 2, 3, 4]), Ok([1, 2, 3, 4]));
    }

    #[test]
    fn id_sequence_is_borrowed_from_buffer() {
        let ids: Cow<[[u8; 32]]> = Cow::Owned(vec![[1; 32], [2; 32], [3; 32]]);
        let buf = encode(&ids);
        assert_eq!(buf.len(), 8 + 96);
        assert_eq!(&buf[..8], &[8, 0, 0, 0, 3, 0, 0, 0]);

        let decoded = decode::<Cow<[[u8; 32]]>>(&buf).unwrap();
        let Cow::Borrowed(items) = decoded else {
            panic!("expected a borrowed view");
        };
        assert_eq!(items, &ids[..]);
        assert_eq!(items.as_ptr().cast::<u8>(), buf[8..].as_ptr());
    }

    #[test]
    fn text_is_borrowed_and_validated() {
        let text: Cow<str> = Cow::Borrowed("héllo");
        let buf = encode(&text);
        let decoded = decode::<Cow<str>>(&buf).unwrap();
        assert!(matches!(decoded, Cow::Borrowed("héllo")));

        let mut bad = buf.clone();
        bad[8] = 0xff;
        assert!(matches!(
            decode::<Cow<str>>(&bad),
            Err(Error::InvalidUtf8Encoding(_))
        ));
    }

    #[test]
    fn scalar_sequence_is_little_endian() {
        let buf = encode(&vec![1u32, 0x0a0b0c0d]);
        assert_eq!(&buf[8..], &[1, 0, 0, 0, 0x0d, 0x0c, 0x0b, 0x0a]);
        assert_eq!(decode::<Vec<u32>>(&buf), Ok(vec![1, 0x0a0b0c0d]));
    }

    #[test]
    fn empty_sequences_point_at_heap_start() {
        let buf = encode(&Vec::<u64>::new());
        assert_eq!(buf, [8, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode::<Vec<u64>>(&buf), Ok(vec![]));
        assert_eq!(decode::<Cow<[u8]>>(&buf).unwrap(), &b""[..]);
    }

    proptest! {
        #[test]
        fn byte_sequences_read_back(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let value: Cow<[u8]> = Cow::Owned(bytes);
            let buf = encode(&value);
            prop_assert_eq!(buf.len(), 8 + value.len());
            prop_assert_eq!(decode::<Cow<[u8]>>(&buf).unwrap(), value);
        }

        #[test]
        fn scalar_sequences_read_back(values in proptest::collection::vec(any::<i16>(), 0..64)) {
            let buf = encode(&values);
            prop_assert_eq!(decode::<Vec<i16>>(&buf), Ok(values));
        }
    }
}
