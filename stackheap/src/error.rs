//! Error types and helpers.
use {core::str::Utf8Error, thiserror::Error};

/// Recoverable decode failures.
///
/// Every variant describes malformed input. Encoding never returns an error:
/// an undersized destination buffer is a caller bug and panics instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Input of {len} bytes is shorter than the {needed} byte stack region")]
    TruncatedInput { needed: u32, len: usize },
    #[error(
        "Heap handle (offset {offset}, count {count}) lies outside the heap region \
         [{heap_start}, {len})"
    )]
    InvalidHeapHandle {
        offset: u32,
        count: u32,
        heap_start: u32,
        len: usize,
    },
    #[error("JSON syntax error at byte {0}")]
    JsonSyntax(usize),
    #[error("Invalid base64 value at byte {0}")]
    InvalidBase64(usize),
    #[error("Integer at byte {0} does not fit the field type")]
    IntegerOverflow(usize),
    #[error("Invalid enum value: {0}")]
    InvalidEnumValue(u64),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    InvalidUtf8Encoding(#[from] Utf8Error),
}

pub type Result<T> = core::result::Result<T, Error>;

#[cold]
pub const fn truncated_input(needed: u32, len: usize) -> Error {
    Error::TruncatedInput { needed, len }
}

#[cold]
pub const fn invalid_heap_handle(offset: u32, count: u32, heap_start: u32, len: usize) -> Error {
    Error::InvalidHeapHandle {
        offset,
        count,
        heap_start,
        len,
    }
}

#[cold]
pub const fn json_syntax(pos: usize) -> Error {
    Error::JsonSyntax(pos)
}

#[cold]
pub const fn invalid_base64(pos: usize) -> Error {
    Error::InvalidBase64(pos)
}

#[cold]
pub const fn integer_overflow(pos: usize) -> Error {
    Error::IntegerOverflow(pos)
}

#[cold]
pub const fn invalid_enum_value(value: u64) -> Error {
    Error::InvalidEnumValue(value)
}

#[cold]
pub const fn missing_field(key: &'static str) -> Error {
    Error::MissingField(key)
}

#[cold]
pub const fn invalid_utf8_encoding(error: Utf8Error) -> Error {
    Error::InvalidUtf8Encoding(error)
}
