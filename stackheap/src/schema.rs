//! Declarative field descriptors.
//!
//! Every [`Message`](crate::Message) carries a `FIELDS` table built in const
//! context from one [`FieldSpec`] per struct field. The table is the single
//! source of truth for both codecs:
//!
//! - the binary codec reads each field's static stack `offset` from it,
//! - the JSON codec reads each field's key, the discriminating key prefix and
//!   the number of bytes to skip past `Key":` from it.
//!
//! ```
//! use stackheap::schema::{table, FieldKind, FieldSpec};
//!
//! const FIELDS: [stackheap::schema::FieldDescriptor; 3] = table([
//!     FieldSpec::of::<[u8; 32]>("QuiddityID"),
//!     FieldSpec::of::<u64>("Offset"),
//!     FieldSpec::of::<u64>("Limit"),
//! ]);
//!
//! assert_eq!(FIELDS[0].kind, FieldKind::ByteArray);
//! assert_eq!(FIELDS[1].offset, 32);
//! assert_eq!(FIELDS[2].offset, 40);
//! assert_eq!(stackheap::schema::stack_len(&FIELDS), 48);
//! ```
use crate::layout::LayoutField;

/// Size in bytes of a heap handle: a little-endian `u32` offset followed by a
/// little-endian `u32` element count.
pub const HANDLE_LEN: u32 = 8;

/// How a field is laid out in the binary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed-width little-endian integer or enumeration.
    Scalar,
    /// Fixed-size byte array, copied verbatim.
    ByteArray,
    /// Variable-length sequence of fixed-size elements, stored in the heap
    /// region and referenced by a [`HANDLE_LEN`] byte handle.
    Sequence,
}

/// A field as declared, before its offset is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub stack_len: u32,
    pub elem_size: u32,
}

impl FieldSpec {
    /// Describe a field of type `T` rendered under the JSON key `key`.
    pub const fn of<'de, T: LayoutField<'de>>(key: &'static str) -> Self {
        Self {
            key,
            kind: T::KIND,
            stack_len: T::STACK_LEN,
            elem_size: T::ELEM_SIZE,
        }
    }
}

/// A field with its position in the stack region and its JSON key metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Position in declaration order.
    pub index: u32,
    /// JSON key.
    pub key: &'static str,
    pub kind: FieldKind,
    /// Static byte offset of the field (or its heap handle) in the stack region.
    pub offset: u32,
    /// Bytes the field occupies in the stack region.
    pub stack_len: u32,
    /// Element size for [`FieldKind::Sequence`], zero otherwise.
    pub elem_size: u32,
    /// Number of leading key bytes that tell this key apart from every other
    /// key of the same table.
    pub prefix_len: u32,
    /// Bytes following the key's opening quote up to the value: the key, its
    /// closing quote and the colon.
    pub key_skip: u32,
}

impl FieldDescriptor {
    const EMPTY: Self = Self {
        index: 0,
        key: "",
        kind: FieldKind::Scalar,
        offset: 0,
        stack_len: 0,
        elem_size: 0,
        prefix_len: 0,
        key_skip: 0,
    };

    /// Whether `rest`, positioned just after a key's opening quote, holds this
    /// field's key followed by `":`.
    ///
    /// The discriminating prefix is compared first, so a mismatching key is
    /// usually rejected on its first byte.
    #[inline]
    pub fn matches_key(&self, rest: &[u8]) -> bool {
        let key = self.key.as_bytes();
        let prefix = self.prefix_len as usize;
        rest.len() >= self.key_skip as usize
            && rest[..prefix] == key[..prefix]
            && rest[prefix..key.len()] == key[prefix..]
            && rest[key.len()] == b'"'
            && rest[key.len() + 1] == b':'
    }
}

/// Find the field whose key starts `rest` (positioned just after the key's
/// opening quote).
#[inline]
pub fn find_key(fields: &[FieldDescriptor], rest: &[u8]) -> Option<usize> {
    let first = *rest.first()?;
    fields
        .iter()
        .position(|field| field.key.as_bytes()[0] == first && field.matches_key(rest))
}

/// Look up a descriptor by JSON key.
pub fn field<'a>(fields: &'a [FieldDescriptor], key: &str) -> Option<&'a FieldDescriptor> {
    fields.iter().find(|field| field.key == key)
}

/// Size in bytes of the stack region described by `fields`.
pub const fn stack_len(fields: &[FieldDescriptor]) -> u32 {
    match fields.last() {
        Some(last) => last.offset + last.stack_len,
        None => 0,
    }
}

/// Bytes of a JSON object rendering of `fields` excluding the values: the
/// braces, every `"Key":` fragment and the separating commas.
pub const fn json_overhead(fields: &[FieldDescriptor]) -> usize {
    let mut len = 2;
    let mut i = 0;
    while i < fields.len() {
        // `"` + key + `":`
        len += fields[i].key.len() + 3;
        if i > 0 {
            len += 1;
        }
        i += 1;
    }
    len
}

const fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    let mut i = 0;
    while i < a.len() && i < b.len() && a[i] == b[i] {
        i += 1;
    }
    i
}

const fn same_key(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && common_prefix_len(a, b) == a.len()
}

const fn check_key(key: &[u8]) {
    assert!(!key.is_empty(), "JSON key must not be empty");
    let mut i = 0;
    while i < key.len() {
        let byte = key[i];
        assert!(
            byte >= 0x20 && byte != b'"' && byte != b'\\',
            "JSON key must not need escaping"
        );
        i += 1;
    }
}

/// Build the descriptor table for a message from its fields in declaration
/// order.
///
/// Assigns stack offsets by packing fields back to back from offset zero, and
/// computes each key's discriminating prefix against every other key.
///
/// # Panics
///
/// When evaluated in const context, the following are compile errors:
/// - an empty key, or a key containing `"`, `\` or control characters,
/// - two fields with the same key,
/// - a stack region larger than `u32::MAX` bytes.
pub const fn table<const N: usize>(specs: [FieldSpec; N]) -> [FieldDescriptor; N] {
    let mut out = [FieldDescriptor::EMPTY; N];
    let mut offset: u32 = 0;
    let mut i = 0;
    while i < N {
        let spec = specs[i];
        let key = spec.key.as_bytes();
        check_key(key);

        let mut shared = 0;
        let mut j = 0;
        while j < N {
            if j != i {
                let other = specs[j].key.as_bytes();
                assert!(!same_key(key, other), "duplicate JSON key");
                let common = common_prefix_len(key, other);
                if common > shared {
                    shared = common;
                }
            }
            j += 1;
        }
        let prefix_len = if shared + 1 < key.len() {
            shared + 1
        } else {
            key.len()
        };

        out[i] = FieldDescriptor {
            index: i as u32,
            key: spec.key,
            kind: spec.kind,
            offset,
            stack_len: spec.stack_len,
            elem_size: spec.elem_size,
            prefix_len: prefix_len as u32,
            key_skip: key.len() as u32 + 2,
        };
        offset = match offset.checked_add(spec.stack_len) {
            Some(offset) => offset,
            None => panic!("stack region overflows u32"),
        };
        i += 1;
    }
    out
}
