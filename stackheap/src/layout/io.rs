//! [`Reader`] and [`Writer`] over a binary message buffer.
use {
    crate::{
        error::{invalid_heap_handle, truncated_input, Result},
        scalar::Scalar,
        schema::HANDLE_LEN,
    },
    core::ops::Range,
};

/// Writes a message into a caller-provided buffer.
///
/// Stack fields are written at explicit offsets. Heap data is appended at a
/// cursor that starts at the end of the stack region and only moves forward.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    stack_len: u32,
    heap_pos: u32,
    end: u32,
}

impl<'a> Writer<'a> {
    /// # Panics
    ///
    /// If `buf` is shorter than `stack_len + heap_len`.
    pub fn new(buf: &'a mut [u8], stack_len: u32, heap_len: u32) -> Self {
        let Some(end) = stack_len.checked_add(heap_len) else {
            panic!("message of {stack_len} + {heap_len} bytes overflows u32");
        };
        assert!(
            buf.len() >= end as usize,
            "destination holds {} bytes, message needs {end} (stack {stack_len} + heap {heap_len})",
            buf.len(),
        );
        Self {
            buf,
            stack_len,
            heap_pos: stack_len,
            end,
        }
    }

    #[inline]
    fn stack_range(&self, offset: u32, len: u32) -> Range<usize> {
        let end = offset + len;
        assert!(
            end <= self.stack_len,
            "stack slot {offset}..{end} overruns the {} byte stack region",
            self.stack_len
        );
        offset as usize..end as usize
    }

    /// The `len` byte stack slot at `offset`.
    #[inline]
    pub fn stack(&mut self, offset: u32, len: u32) -> &mut [u8] {
        let range = self.stack_range(offset, len);
        &mut self.buf[range]
    }

    /// Write a little-endian scalar at stack `offset`.
    #[inline]
    pub fn put<T: Scalar>(&mut self, offset: u32, value: T) {
        value.put_le(self.stack(offset, T::SIZE));
    }

    /// Reserve `count * elem_size` heap bytes at the heap cursor, record the
    /// `(cursor, count)` handle at stack `offset`, and return the reserved
    /// bytes for the caller to fill.
    ///
    /// # Panics
    ///
    /// If the data would run past `stack_len + heap_len`, i.e. the message's
    /// `heap_len` undercounted.
    pub fn heap(&mut self, offset: u32, count: u32, elem_size: u32) -> &mut [u8] {
        let start = self.heap_pos;
        let stop = count
            .checked_mul(elem_size)
            .and_then(|len| start.checked_add(len))
            .filter(|stop| *stop <= self.end);
        let Some(stop) = stop else {
            panic!(
                "heap field of {count} x {elem_size} bytes at {start} overruns the message end {}",
                self.end
            );
        };

        let handle = self.stack(offset, HANDLE_LEN);
        handle[..4].copy_from_slice(&start.to_le_bytes());
        handle[4..].copy_from_slice(&count.to_le_bytes());

        self.heap_pos = stop;
        &mut self.buf[start as usize..stop as usize]
    }

    /// Finish the message and return the number of bytes written.
    ///
    /// # Panics
    ///
    /// If fewer heap bytes were written than announced.
    pub fn finish(self) -> usize {
        assert_eq!(
            self.heap_pos, self.end,
            "heap_len announced {} heap bytes, {} were written",
            self.end - self.stack_len,
            self.heap_pos - self.stack_len
        );
        self.end as usize
    }
}

/// Reads fields out of an encoded message.
///
/// Construction checks the buffer covers the stack region, so reads at
/// offsets from the message's descriptor table succeed. Heap handles are
/// validated individually.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'de> {
    buf: &'de [u8],
    stack_len: u32,
}

impl<'de> Reader<'de> {
    pub fn new(buf: &'de [u8], stack_len: u32) -> Result<Self> {
        if buf.len() < stack_len as usize {
            return Err(truncated_input(stack_len, buf.len()));
        }
        Ok(Self { buf, stack_len })
    }

    #[inline]
    pub fn as_slice(&self) -> &'de [u8] {
        self.buf
    }

    /// The `len` byte stack slot at `offset`.
    #[inline]
    pub fn stack(&self, offset: u32, len: u32) -> Result<&'de [u8]> {
        let end = offset.saturating_add(len);
        if end > self.stack_len {
            return Err(truncated_input(end, self.buf.len()));
        }
        Ok(&self.buf[offset as usize..end as usize])
    }

    /// Copy the `N` byte stack slot at `offset`.
    #[inline]
    pub fn array<const N: usize>(&self, offset: u32) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.stack(offset, N as u32)?);
        Ok(out)
    }

    /// Read a little-endian scalar at stack `offset`.
    #[inline]
    pub fn get<T: Scalar>(&self, offset: u32) -> Result<T> {
        T::get_le(self.stack(offset, T::SIZE)?)
    }

    /// Resolve the heap handle at stack `offset` into the bytes it references
    /// and its element count.
    ///
    /// A non-empty handle must reference bytes inside `[stack_len, len)`. An
    /// empty handle may point anywhere in `[stack_len, len]`, which covers the
    /// encoder's convention of recording the cursor position.
    pub fn heap(&self, offset: u32, elem_size: u32) -> Result<(&'de [u8], u32)> {
        let handle = self.array::<8>(offset)?;
        let [o0, o1, o2, o3, c0, c1, c2, c3] = handle;
        let start = u32::from_le_bytes([o0, o1, o2, o3]);
        let count = u32::from_le_bytes([c0, c1, c2, c3]);

        let len = u64::from(count) * u64::from(elem_size);
        let stop = u64::from(start) + len;
        if start < self.stack_len || stop > self.buf.len() as u64 {
            return Err(invalid_heap_handle(
                start,
                count,
                self.stack_len,
                self.buf.len(),
            ));
        }
        Ok((&self.buf[start as usize..stop as usize], count))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::error::Error};

    #[test]
    fn writer_packs_heap_fields_after_stack() {
        let mut buf = [0u8; 8 + 8 + 6];
        let mut writer = Writer::new(&mut buf, 16, 6);
        writer.heap(0, 2, 2).copy_from_slice(&[1, 2, 3, 4]);
        writer.heap(8, 1, 2).copy_from_slice(&[5, 6]);
        assert_eq!(writer.finish(), 22);

        assert_eq!(&buf[..8], &[16, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(&buf[8..16], &[20, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(&buf[16..], &[1, 2, 3, 4, 5, 6]);

        let reader = Reader::new(&buf, 16).unwrap();
        assert_eq!(reader.heap(0, 2).unwrap(), (&[1, 2, 3, 4][..], 2));
        assert_eq!(reader.heap(8, 2).unwrap(), (&[5, 6][..], 1));
    }

    #[test]
    fn empty_heap_field_records_cursor() {
        let mut buf = [0u8; 8];
        let mut writer = Writer::new(&mut buf, 8, 0);
        assert!(writer.heap(0, 0, 32).is_empty());
        assert_eq!(writer.finish(), 8);
        assert_eq!(buf, [8, 0, 0, 0, 0, 0, 0, 0]);

        let reader = Reader::new(&buf, 8).unwrap();
        assert_eq!(reader.heap(0, 32).unwrap(), (&[][..], 0));
    }

    #[test]
    #[should_panic(expected = "destination holds")]
    fn undersized_destination_panics() {
        let mut buf = [0u8; 10];
        let _ = Writer::new(&mut buf, 8, 4);
    }

    #[test]
    #[should_panic(expected = "overruns the message end")]
    fn undercounted_heap_len_panics() {
        let mut buf = [0u8; 64];
        let mut writer = Writer::new(&mut buf, 8, 4);
        writer.heap(0, 2, 4);
    }

    #[test]
    #[should_panic(expected = "heap_len announced")]
    fn overcounted_heap_len_panics() {
        let mut buf = [0u8; 64];
        let mut writer = Writer::new(&mut buf, 8, 4);
        writer.heap(0, 0, 4);
        writer.finish();
    }

    #[test]
    fn reader_rejects_short_buffer() {
        assert_eq!(
            Reader::new(&[0; 7], 8).unwrap_err(),
            Error::TruncatedInput { needed: 8, len: 7 }
        );
    }

    #[test]
    fn reader_rejects_handle_past_end() {
        // offset 8, count 3, element size 4: needs 20 bytes, buffer has 16.
        let buf = [8, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let reader = Reader::new(&buf, 8).unwrap();
        assert!(matches!(
            reader.heap(0, 4),
            Err(Error::InvalidHeapHandle {
                offset: 8,
                count: 3,
                ..
            })
        ));
    }

    #[test]
    fn reader_rejects_handle_into_stack() {
        let buf = [0, 0, 0, 0, 1, 0, 0, 0, 9, 9, 9, 9];
        let reader = Reader::new(&buf, 8).unwrap();
        assert!(matches!(
            reader.heap(0, 1),
            Err(Error::InvalidHeapHandle { offset: 0, .. })
        ));
    }

    #[test]
    fn reader_rejects_empty_handle_past_end() {
        let buf = [9, 0, 0, 0, 0, 0, 0, 0];
        let reader = Reader::new(&buf, 8).unwrap();
        assert!(reader.heap(0, 1).is_err());
    }

    #[test]
    fn reader_rejects_overflowing_count() {
        let buf = [8, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 1];
        let reader = Reader::new(&buf, 8).unwrap();
        assert!(reader.heap(0, 0xffff_ffff).is_err());
    }
}
