//! Fixed-width scalars shared by both codecs.
//!
//! A [`Scalar`] is stored in the stack region as little-endian bytes and
//! rendered in JSON as a bare decimal integer. Integers implement it out of
//! the box; enumerations get it from [`enumeration!`](crate::enumeration).
use crate::{
    error::{integer_overflow, Result},
    json::{signed_len, unsigned_len, JsonDecoder, JsonEncoder},
};

/// A fixed-width value with a little-endian binary form and a decimal JSON
/// form.
pub trait Scalar: Copy {
    /// Width in bytes.
    const SIZE: u32;

    /// Write `self` into `dst`, which is exactly [`Self::SIZE`] bytes.
    fn put_le(self, dst: &mut [u8]);

    /// Read a value from `src`, which is exactly [`Self::SIZE`] bytes.
    fn get_le(src: &[u8]) -> Result<Self>;

    /// Length of the decimal rendering of `self`.
    fn decimal_len(self) -> usize;

    fn write_decimal(self, encoder: &mut JsonEncoder<'_>);

    fn read_decimal(decoder: &mut JsonDecoder<'_>) -> Result<Self>;
}

macro_rules! impl_int {
    ($type:ty, unsigned) => {
        impl_int!($type, u64, unsigned_len, write_u64, read_u64);
    };
    ($type:ty, signed) => {
        impl_int!($type, i64, signed_len, write_i64, read_i64);
    };
    ($type:ty, $wide:ty, $len:ident, $write:ident, $read:ident) => {
        impl Scalar for $type {
            const SIZE: u32 = size_of::<$type>() as u32;

            #[inline(always)]
            fn put_le(self, dst: &mut [u8]) {
                dst.copy_from_slice(&self.to_le_bytes());
            }

            #[inline(always)]
            fn get_le(src: &[u8]) -> Result<Self> {
                let mut bytes = [0u8; size_of::<$type>()];
                bytes.copy_from_slice(src);
                Ok(<$type>::from_le_bytes(bytes))
            }

            #[inline]
            fn decimal_len(self) -> usize {
                $len(self as $wide)
            }

            #[inline]
            fn write_decimal(self, encoder: &mut JsonEncoder<'_>) {
                encoder.$write(self as $wide);
            }

            #[inline]
            #[allow(clippy::useless_conversion)]
            fn read_decimal(decoder: &mut JsonDecoder<'_>) -> Result<Self> {
                let pos = decoder.position();
                <$type>::try_from(decoder.$read()?).map_err(|_| integer_overflow(pos))
            }
        }

        crate::__scalar_field!($type);
    };
}

impl_int!(u8, unsigned);
impl_int!(u16, unsigned);
impl_int!(u32, unsigned);
impl_int!(u64, unsigned);
impl_int!(i8, signed);
impl_int!(i16, signed);
impl_int!(i32, signed);
impl_int!(i64, signed);

/// Implement the binary and JSON field traits for a [`Scalar`].
#[doc(hidden)]
#[macro_export]
macro_rules! __scalar_field {
    ($type:ty) => {
        impl<'de> $crate::layout::LayoutField<'de> for $type {
            const KIND: $crate::schema::FieldKind = $crate::schema::FieldKind::Scalar;
            const STACK_LEN: u32 = <$type as $crate::scalar::Scalar>::SIZE;

            #[inline]
            fn write(&self, writer: &mut $crate::layout::Writer<'_>, offset: u32) {
                writer.put(offset, *self);
            }

            #[inline]
            fn read(reader: &$crate::layout::Reader<'de>, offset: u32) -> $crate::Result<Self> {
                reader.get(offset)
            }
        }

        impl<'de> $crate::json::JsonField<'de> for $type {
            #[inline]
            fn json_len(&self) -> usize {
                <$type as $crate::scalar::Scalar>::decimal_len(*self)
            }

            #[inline]
            fn write_json(&self, encoder: &mut $crate::json::JsonEncoder<'_>) {
                <$type as $crate::scalar::Scalar>::write_decimal(*self, encoder);
            }

            #[inline]
            fn read_json(decoder: &mut $crate::json::JsonDecoder<'de>) -> $crate::Result<Self> {
                <$type as $crate::scalar::Scalar>::read_decimal(decoder)
            }
        }
    };
}

/// Declare a field-less enum stored as an unsigned integer.
///
/// The enum gets `#[repr]` of the given integer type, `from_repr` /
/// `to_repr` conversions, and the traits to be used as a message field or
/// as the element of a `Vec` field. Decoding a discriminant that names no
/// variant fails with [`Error::InvalidEnumValue`](crate::Error::InvalidEnumValue).
///
/// ```
/// stackheap::enumeration! {
///     /// ISO 639 language, as numbered by the directory service.
///     pub enum Language: u32 {
///         English = 0,
///         Persian = 1,
///         German = 4,
///     }
/// }
///
/// assert_eq!(Language::from_repr(4), Some(Language::German));
/// assert_eq!(Language::from_repr(2), None);
/// assert_eq!(Language::Persian.to_repr(), 1);
/// ```
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant = $value,
            )+
        }

        impl $name {
            /// The variant with discriminant `value`, if any.
            #[inline]
            pub const fn from_repr(value: $repr) -> ::core::option::Option<Self> {
                match value {
                    $($value => ::core::option::Option::Some(Self::$variant),)+
                    _ => ::core::option::Option::None,
                }
            }

            #[inline]
            pub const fn to_repr(self) -> $repr {
                self as $repr
            }
        }

        impl $crate::scalar::Scalar for $name {
            const SIZE: u32 = <$repr as $crate::scalar::Scalar>::SIZE;

            #[inline]
            fn put_le(self, dst: &mut [u8]) {
                <$repr as $crate::scalar::Scalar>::put_le(self.to_repr(), dst);
            }

            #[inline]
            fn get_le(src: &[u8]) -> $crate::Result<Self> {
                let value = <$repr as $crate::scalar::Scalar>::get_le(src)?;
                Self::from_repr(value)
                    .ok_or_else(|| $crate::error::invalid_enum_value(value as u64))
            }

            #[inline]
            fn decimal_len(self) -> usize {
                <$repr as $crate::scalar::Scalar>::decimal_len(self.to_repr())
            }

            #[inline]
            fn write_decimal(self, encoder: &mut $crate::json::JsonEncoder<'_>) {
                <$repr as $crate::scalar::Scalar>::write_decimal(self.to_repr(), encoder);
            }

            #[inline]
            fn read_decimal(decoder: &mut $crate::json::JsonDecoder<'_>) -> $crate::Result<Self> {
                let value = <$repr as $crate::scalar::Scalar>::read_decimal(decoder)?;
                Self::from_repr(value)
                    .ok_or_else(|| $crate::error::invalid_enum_value(value as u64))
            }
        }

        $crate::__scalar_field!($name);
    };
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::error::Error,
        alloc::vec::Vec,
        proptest::prelude::*,
    };

    crate::enumeration! {
        enum Color: u16 {
            Red = 1,
            Green = 2,
            Blue = 0x0400,
        }
    }

    fn le<T: Scalar>(value: T) -> Vec<u8> {
        let mut buf = alloc::vec![0u8; T::SIZE as usize];
        value.put_le(&mut buf);
        buf
    }

    fn decimal<T: Scalar>(value: T) -> Vec<u8> {
        let mut out = Vec::new();
        value.write_decimal(&mut JsonEncoder::new(&mut out));
        out
    }

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(le(0x0102_0304u32), [4, 3, 2, 1]);
        assert_eq!(le(-2i16), [0xfe, 0xff]);
        assert_eq!(u64::get_le(&[1, 0, 0, 0, 0, 0, 0, 0]), Ok(1));
    }

    #[test]
    fn enumeration_is_stored_as_repr() {
        assert_eq!(Color::SIZE, 2);
        assert_eq!(le(Color::Blue), [0x00, 0x04]);
        assert_eq!(Color::get_le(&[2, 0]), Ok(Color::Green));
        assert_eq!(Color::get_le(&[3, 0]), Err(Error::InvalidEnumValue(3)));
    }

    #[test]
    fn enumeration_renders_as_integer() {
        assert_eq!(decimal(Color::Blue), b"1024");
        assert_eq!(Color::Blue.decimal_len(), 4);

        let mut decoder = JsonDecoder::new(b"7");
        assert_eq!(
            Color::read_decimal(&mut decoder),
            Err(Error::InvalidEnumValue(7))
        );
    }

    #[test]
    fn narrow_integer_rejects_wide_value() {
        let mut decoder = JsonDecoder::new(b"256");
        assert_eq!(u8::read_decimal(&mut decoder), Err(Error::IntegerOverflow(0)));

        let mut decoder = JsonDecoder::new(b"-129");
        assert_eq!(i8::read_decimal(&mut decoder), Err(Error::IntegerOverflow(0)));

        let mut decoder = JsonDecoder::new(b"-1");
        assert_eq!(u32::read_decimal(&mut decoder), Err(Error::JsonSyntax(0)));
    }

    proptest! {
        #[test]
        fn decimal_matches_display(u in any::<u64>(), i in any::<i64>(), s in any::<i8>()) {
            prop_assert_eq!(decimal(u), u.to_string().into_bytes());
            prop_assert_eq!(u.decimal_len(), u.to_string().len());
            prop_assert_eq!(decimal(i), i.to_string().into_bytes());
            prop_assert_eq!(i.decimal_len(), i.to_string().len());
            prop_assert_eq!(decimal(s), s.to_string().into_bytes());
        }

        #[test]
        fn decimal_reads_back(u in any::<u32>(), i in any::<i64>()) {
            let text = decimal(u);
            prop_assert_eq!(u32::read_decimal(&mut JsonDecoder::new(&text)), Ok(u));
            let text = decimal(i);
            prop_assert_eq!(i64::read_decimal(&mut JsonDecoder::new(&text)), Ok(i));
        }

        #[test]
        fn little_endian_reads_back(u in any::<u64>(), i in any::<i32>()) {
            prop_assert_eq!(u64::get_le(&le(u)), Ok(u));
            prop_assert_eq!(i32::get_le(&le(i)), Ok(i));
        }
    }
}
