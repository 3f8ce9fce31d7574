//! # Character Streams
//!
//! The parser reads code units from an `InputStream` and the writer emits
//! code units to an `OutputStream`. Both traits are deliberately minimal,
//! so anything from a memory buffer to a socket can serve as source or
//! sink. This module provides the in-memory streams as well as adapters
//! that serialize code units of a UTF encoding into bytes.

use crate::encoding::{ByteEncoding, Char, UtfType};

/// ## Input Streams
///
/// A source of code units with a single unit of lookahead. `'src` is the
/// lifetime of the underlying buffer, which only matters for streams that
/// support in-place decoding.
pub trait InputStream<'src> {
    /// Code unit yielded by the stream.
    type Ch: Char;

    /// Yield the next code unit without consuming it, or `None` at the
    /// end of the input.
    fn peek(&self) -> Option<Self::Ch>;

    /// Consume and yield the next code unit, or `None` at the end of the
    /// input.
    fn take(&mut self) -> Option<Self::Ch>;

    /// Yield the number of code units consumed so far.
    fn tell(&self) -> usize;

    /// Yield the encoding of the stream content, for streams that decide
    /// it at runtime.
    fn source_type(&self) -> UtfType {
        UtfType::Utf8
    }

    /// ## Start In-Place Decoding
    ///
    /// Start writing decoded code units of type `T` back into the source
    /// buffer, at the current read position. Yields `false` if the stream
    /// does not support this for `T`, in which case the caller must decode
    /// into a separate buffer.
    fn begin_in_place<T: Char>(&mut self) -> bool {
        false
    }

    /// Write one decoded code unit into the source buffer. Only valid
    /// between `begin_in_place()` and `end_in_place()`.
    fn put_in_place<T: Char>(&mut self, _c: T) {
        core::unreachable!();
    }

    /// ## Finish In-Place Decoding
    ///
    /// Finish the decoded span started with `begin_in_place()` and yield
    /// it. The span stays valid for the lifetime of the source buffer.
    fn end_in_place<T: Char>(&mut self) -> &'src [T] {
        core::unreachable!();
    }
}

/// ## Output Streams
///
/// A sink of code units.
pub trait OutputStream {
    /// Code unit accepted by the stream.
    type Ch: Char;

    /// Append a code unit.
    fn put(&mut self, c: Self::Ch);

    /// Flush any buffered data to the underlying sink.
    fn flush(&mut self) {
    }

    /// Yield the encoding the stream expects, for streams that decide it
    /// at runtime.
    fn target_type(&self) -> UtfType {
        UtfType::Utf8
    }
}

impl<'src, I: InputStream<'src> + ?Sized> InputStream<'src> for &mut I {
    type Ch = I::Ch;

    fn peek(&self) -> Option<Self::Ch> {
        (**self).peek()
    }

    fn take(&mut self) -> Option<Self::Ch> {
        (**self).take()
    }

    fn tell(&self) -> usize {
        (**self).tell()
    }

    fn source_type(&self) -> UtfType {
        (**self).source_type()
    }

    fn begin_in_place<T: Char>(&mut self) -> bool {
        (**self).begin_in_place::<T>()
    }

    fn put_in_place<T: Char>(&mut self, c: T) {
        (**self).put_in_place(c)
    }

    fn end_in_place<T: Char>(&mut self) -> &'src [T] {
        (**self).end_in_place()
    }
}

impl<O: OutputStream + ?Sized> OutputStream for &mut O {
    type Ch = O::Ch;

    fn put(&mut self, c: Self::Ch) {
        (**self).put(c)
    }

    fn flush(&mut self) {
        (**self).flush()
    }

    fn target_type(&self) -> UtfType {
        (**self).target_type()
    }
}

/// ## Read-Only String Stream
///
/// Reads code units from a borrowed slice.
#[derive(Clone, Debug)]
pub struct StringStream<'a, C = u8> {
    src: &'a [C],
    pos: usize,
}

impl<'a, C: Char> StringStream<'a, C> {
    /// ## Create String Stream
    pub fn new(src: &'a [C]) -> Self {
        Self {
            src: src,
            pos: 0,
        }
    }
}

impl<'a> StringStream<'a, u8> {
    /// ## Create String Stream from UTF-8
    pub fn from_str(src: &'a str) -> Self {
        Self::new(src.as_bytes())
    }
}

impl<'src, 'a, C: Char> InputStream<'src> for StringStream<'a, C> {
    type Ch = C;

    fn peek(&self) -> Option<C> {
        self.src.get(self.pos).copied()
    }

    fn take(&mut self) -> Option<C> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn tell(&self) -> usize {
        self.pos
    }
}

/// ## In-Place String Stream
///
/// Reads bytes from a mutable buffer and supports decoding strings back
/// into that same buffer. Decoded spans are always written at or before
/// the read position, so no unread data is ever overwritten. Once a span
/// is finished, the buffer up to the read position is split off and the
/// span is handed out with the full lifetime of the buffer.
#[derive(Debug)]
pub struct InsituStringStream<'a> {
    rest: &'a mut [u8],
    base: usize,
    pos: usize,
    span: Option<(usize, usize)>,
}

impl<'a> InsituStringStream<'a> {
    /// ## Create In-Place String Stream
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            rest: buf,
            base: 0,
            pos: 0,
            span: None,
        }
    }
}

impl<'a> InputStream<'a> for InsituStringStream<'a> {
    type Ch = u8;

    fn peek(&self) -> Option<u8> {
        self.rest.get(self.pos).copied()
    }

    fn take(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn tell(&self) -> usize {
        self.base + self.pos
    }

    fn begin_in_place<T: Char>(&mut self) -> bool {
        if T::WIDTH != 1 {
            return false;
        }
        self.span = Some((self.pos, self.pos));
        true
    }

    fn put_in_place<T: Char>(&mut self, c: T) {
        let Some((_, end)) = self.span.as_mut() else {
            core::panic!("in-place write outside of a decoded span");
        };
        assert!(*end < self.pos);
        self.rest[*end] = c.to_u32() as u8;
        *end += 1;
    }

    fn end_in_place<T: Char>(&mut self) -> &'a [T] {
        let (start, end) = self.span.take().unwrap_or((self.pos, self.pos));
        let rest = core::mem::take(&mut self.rest);
        let (head, tail) = rest.split_at_mut(self.pos);
        self.rest = tail;
        self.base += self.pos;
        self.pos = 0;

        let head: &'a [u8] = head;
        T::from_bytes(&head[start..end]).unwrap_or(&[])
    }
}

/// ## String Buffer
///
/// A growable output stream backed by a vector of code units.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct StringBuffer<C = u8> {
    buf: alloc::vec::Vec<C>,
}

impl<C: Char> StringBuffer<C> {
    /// ## Create String Buffer
    pub fn new() -> Self {
        Self {
            buf: alloc::vec::Vec::new(),
        }
    }

    /// ## Create String Buffer with Capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: alloc::vec::Vec::with_capacity(capacity),
        }
    }

    /// Yield the buffered code units.
    pub fn as_slice(&self) -> &[C] {
        &self.buf
    }

    /// Yield the number of buffered code units.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop all buffered code units, but retain the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Yield the underlying vector.
    pub fn into_vec(self) -> alloc::vec::Vec<C> {
        self.buf
    }
}

impl StringBuffer<u8> {
    /// ## View as UTF-8
    ///
    /// Yield the buffer as string slice, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.buf).ok()
    }
}

impl<C: Char> OutputStream for StringBuffer<C> {
    type Ch = C;

    fn put(&mut self, c: C) {
        self.buf.push(c);
    }
}

// Fixed-size sink for the code units of a single code point. Used to
// stage transcoded output before it is committed to its final location.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Units<C> {
    buf: [C; 4],
    len: usize,
}

impl<C: Char> Units<C> {
    pub(crate) fn as_slice(&self) -> &[C] {
        &self.buf[..self.len]
    }
}

impl<C: Char> OutputStream for Units<C> {
    type Ch = C;

    fn put(&mut self, c: C) {
        // Code points never exceed four code units. Anything beyond stems
        // from garbage input, which is rejected by the caller anyway.
        if let Some(v) = self.buf.get_mut(self.len) {
            *v = c;
            self.len += 1;
        }
    }
}

/// ## Encoded Input Stream
///
/// Reads code units of the byte-oriented encoding `E` from a byte stream.
/// A leading byte-order mark is skipped. Offsets are reported in code
/// units of `E`, not counting the byte-order mark.
#[derive(Clone, Debug)]
pub struct EncodedInputStream<E: ByteEncoding, I> {
    is: I,
    current: Option<E::Ch>,
    count: usize,
}

impl<'src, E: ByteEncoding, I: InputStream<'src, Ch = u8>> EncodedInputStream<E, I> {
    /// ## Create Encoded Input Stream
    pub fn new(mut is: I) -> Self {
        let current = E::take_bom(&mut is);
        Self {
            is: is,
            current: current,
            count: 0,
        }
    }

    /// Yield the underlying byte stream.
    pub fn into_inner(self) -> I {
        self.is
    }
}

impl<'src, E: ByteEncoding, I: InputStream<'src, Ch = u8>> InputStream<'src> for EncodedInputStream<E, I> {
    type Ch = E::Ch;

    fn peek(&self) -> Option<E::Ch> {
        self.current
    }

    fn take(&mut self) -> Option<E::Ch> {
        let c = self.current?;
        self.current = E::take_unit(&mut self.is);
        self.count += 1;
        Some(c)
    }

    fn tell(&self) -> usize {
        self.count
    }
}

/// ## Encoded Output Stream
///
/// Writes code units of the byte-oriented encoding `E` to a byte stream,
/// optionally preceded by a byte-order mark.
#[derive(Clone, Debug)]
pub struct EncodedOutputStream<E: ByteEncoding, O> {
    os: O,
    _encoding: core::marker::PhantomData<E>,
}

impl<E: ByteEncoding, O: OutputStream<Ch = u8>> EncodedOutputStream<E, O> {
    /// ## Create Encoded Output Stream
    pub fn new(mut os: O, bom: bool) -> Self {
        if bom {
            E::put_bom(&mut os);
        }
        Self {
            os: os,
            _encoding: core::marker::PhantomData,
        }
    }

    /// Yield the underlying byte stream.
    pub fn into_inner(self) -> O {
        self.os
    }
}

impl<E: ByteEncoding, O: OutputStream<Ch = u8>> OutputStream for EncodedOutputStream<E, O> {
    type Ch = E::Ch;

    fn put(&mut self, c: E::Ch) {
        E::put_unit(&mut self.os, c);
    }

    fn flush(&mut self) {
        self.os.flush();
    }
}

/// ## Auto-Detecting Input Stream
///
/// Reads a byte stream in any of the UTF encodings and yields its code
/// units as `u32`. The encoding is detected from the byte-order mark, or,
/// lacking one, from the pattern of zero bytes in the first four bytes,
/// given that JSON texts start with ASCII characters. If neither gives a
/// clear answer, the encoding passed by the caller is used.
///
/// Combine with `AutoUtf` as source encoding of the reader.
#[derive(Clone, Debug)]
pub struct AutoUtfInputStream<I> {
    is: I,
    head: [u8; 4],
    head_pos: usize,
    head_len: usize,
    kind: UtfType,
    bom: bool,
    current: Option<u32>,
    count: usize,
}

impl<'src, I: InputStream<'src, Ch = u8>> AutoUtfInputStream<I> {
    /// ## Create Auto-Detecting Input Stream
    ///
    /// Create a new stream over the byte stream `is`, using `fallback` as
    /// encoding if detection is inconclusive.
    pub fn with(mut is: I, fallback: UtfType) -> Self {
        let mut head = [0u8; 4];
        let mut head_len = 0;
        while head_len < 4 {
            match is.take() {
                Some(v) => {
                    head[head_len] = v;
                    head_len += 1;
                },
                None => break,
            }
        }

        let mut this = Self {
            is: is,
            head: head,
            head_pos: 0,
            head_len: head_len,
            kind: fallback,
            bom: false,
            current: None,
            count: 0,
        };
        this.detect();
        this.current = this.read_unit();
        this
    }

    /// ## Create Auto-Detecting Input Stream
    ///
    /// Like `Self::with()` with UTF-8 as fallback.
    pub fn new(is: I) -> Self {
        Self::with(is, UtfType::Utf8)
    }

    fn detect(&mut self) {
        let (h, n) = (self.head, self.head_len);
        let skip = if n >= 4 && h == [0x00, 0x00, 0xfe, 0xff] {
            self.kind = UtfType::Utf32Be;
            4
        } else if n >= 4 && h == [0xff, 0xfe, 0x00, 0x00] {
            self.kind = UtfType::Utf32Le;
            4
        } else if n >= 2 && h[0] == 0xfe && h[1] == 0xff {
            self.kind = UtfType::Utf16Be;
            2
        } else if n >= 2 && h[0] == 0xff && h[1] == 0xfe {
            self.kind = UtfType::Utf16Le;
            2
        } else if n >= 3 && h[0] == 0xef && h[1] == 0xbb && h[2] == 0xbf {
            self.kind = UtfType::Utf8;
            3
        } else {
            0
        };

        if skip > 0 {
            self.bom = true;
            self.head_pos = skip;
            return;
        }

        if n < 4 {
            return;
        }

        let pattern = (h[0] != 0) as u8
            | ((h[1] != 0) as u8) << 1
            | ((h[2] != 0) as u8) << 2
            | ((h[3] != 0) as u8) << 3;
        match pattern {
            0x08 => self.kind = UtfType::Utf32Be,
            0x0a => self.kind = UtfType::Utf16Be,
            0x01 => self.kind = UtfType::Utf32Le,
            0x05 => self.kind = UtfType::Utf16Le,
            0x0f => self.kind = UtfType::Utf8,
            _ => {},
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        if self.head_pos < self.head_len {
            let v = self.head[self.head_pos];
            self.head_pos += 1;
            Some(v)
        } else {
            self.is.take()
        }
    }

    fn read_unit(&mut self) -> Option<u32> {
        let mut v = [0u8; 4];
        let width = self.kind.width();
        for b in v[..width].iter_mut() {
            *b = self.next_byte()?;
        }
        Some(match self.kind {
            UtfType::Utf8 => v[0] as u32,
            UtfType::Utf16Le => u16::from_le_bytes([v[0], v[1]]) as u32,
            UtfType::Utf16Be => u16::from_be_bytes([v[0], v[1]]) as u32,
            UtfType::Utf32Le => u32::from_le_bytes(v),
            UtfType::Utf32Be => u32::from_be_bytes(v),
        })
    }

    /// Yield the detected encoding.
    pub fn utf_type(&self) -> UtfType {
        self.kind
    }

    /// Check whether the input started with a byte-order mark.
    pub fn has_bom(&self) -> bool {
        self.bom
    }
}

impl<'src, I: InputStream<'src, Ch = u8>> InputStream<'src> for AutoUtfInputStream<I> {
    type Ch = u32;

    fn peek(&self) -> Option<u32> {
        self.current
    }

    fn take(&mut self) -> Option<u32> {
        let c = self.current?;
        self.current = self.read_unit();
        self.count += 1;
        Some(c)
    }

    fn tell(&self) -> usize {
        self.count
    }

    fn source_type(&self) -> UtfType {
        self.kind
    }
}

/// ## Declared-Encoding Output Stream
///
/// Writes `u32` code units to a byte stream in the encoding chosen at
/// runtime. Combine with `AutoUtf` as target encoding of the writer.
#[derive(Clone, Debug)]
pub struct AutoUtfOutputStream<O> {
    os: O,
    kind: UtfType,
}

impl<O: OutputStream<Ch = u8>> AutoUtfOutputStream<O> {
    /// ## Create Declared-Encoding Output Stream
    pub fn new(mut os: O, kind: UtfType, bom: bool) -> Self {
        if bom {
            match kind {
                UtfType::Utf8 => crate::encoding::Utf8::put_bom(&mut os),
                UtfType::Utf16Le => crate::encoding::Utf16Le::put_bom(&mut os),
                UtfType::Utf16Be => crate::encoding::Utf16Be::put_bom(&mut os),
                UtfType::Utf32Le => crate::encoding::Utf32Le::put_bom(&mut os),
                UtfType::Utf32Be => crate::encoding::Utf32Be::put_bom(&mut os),
            }
        }
        Self {
            os: os,
            kind: kind,
        }
    }

    /// Yield the declared encoding.
    pub fn utf_type(&self) -> UtfType {
        self.kind
    }

    /// Yield the underlying byte stream.
    pub fn into_inner(self) -> O {
        self.os
    }
}

impl<O: OutputStream<Ch = u8>> OutputStream for AutoUtfOutputStream<O> {
    type Ch = u32;

    fn put(&mut self, c: u32) {
        match self.kind {
            UtfType::Utf8 => self.os.put(c as u8),
            UtfType::Utf16Le => (c as u16).to_le_bytes().into_iter().for_each(|b| self.os.put(b)),
            UtfType::Utf16Be => (c as u16).to_be_bytes().into_iter().for_each(|b| self.os.put(b)),
            UtfType::Utf32Le => c.to_le_bytes().into_iter().for_each(|b| self.os.put(b)),
            UtfType::Utf32Be => c.to_be_bytes().into_iter().for_each(|b| self.os.put(b)),
        }
    }

    fn flush(&mut self) {
        self.os.flush();
    }

    fn target_type(&self) -> UtfType {
        self.kind
    }
}
