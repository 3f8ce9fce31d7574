//! # Minified Writer
//!
//! The writer is a `Handler` that serializes the events it receives as
//! minified JSON text. It tracks the nesting of containers and enforces
//! that the events form exactly one well-formed document. Sequencing
//! errors are bugs of the caller and cause a panic, since any input that
//! reaches a writer through the reader is already well-formed.
//!
//! Strings are transcoded from the source encoding `SE` of the events into
//! the target encoding `TE` of the output stream. Code points the target
//! cannot represent are written as `\uXXXX` escapes.

use crate::encoding::{Char, Encoding, Transcoder, Utf8};
use crate::handler::{Handler, Text};
use crate::num::dtoa;
use crate::stream::{InputStream, OutputStream, StringStream};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[derive(Clone, Copy, Debug)]
struct Level {
    value_count: usize,
    in_array: bool,
}

/// ## Writer
///
/// Serializes events of strings encoded in `SE` into minified JSON text
/// encoded in `TE`, written to the output stream `O`. The stream is
/// flushed once the root value is complete.
#[derive(Debug)]
pub struct Writer<O, SE: Encoding = Utf8, TE: Encoding = Utf8> {
    os: O,
    levels: alloc::vec::Vec<Level>,
    has_root: bool,
    precision: Option<usize>,
    _encodings: core::marker::PhantomData<(SE, TE)>,
}

// Yield the character following the backslash of a string escape, or
// `u` for control characters without a short escape.
fn escape(c: u32) -> Option<u8> {
    match c {
        0x08 => Some(b'b'),
        0x09 => Some(b't'),
        0x0a => Some(b'n'),
        0x0c => Some(b'f'),
        0x0d => Some(b'r'),
        0x22 => Some(b'"'),
        0x5c => Some(b'\\'),
        0x00..=0x1f => Some(b'u'),
        _ => None,
    }
}

impl<O, SE, TE> Writer<O, SE, TE>
where
    O: OutputStream<Ch = TE::Ch>,
    SE: Encoding,
    TE: Encoding,
{
    /// ## Create Writer
    ///
    /// Create a new writer serializing into `os`. Doubles are written in
    /// their shortest round-trip representation.
    pub fn new(os: O) -> Self {
        Self {
            os: os,
            levels: alloc::vec::Vec::new(),
            has_root: false,
            precision: None,
            _encodings: core::marker::PhantomData,
        }
    }

    /// ## Reset Writer
    ///
    /// Prepare the writer for a new document written to `os`, and yield
    /// the previous output stream. Internal buffers are retained.
    pub fn reset(&mut self, os: O) -> O {
        self.levels.clear();
        self.has_root = false;
        core::mem::replace(&mut self.os, os)
    }

    /// Yield the output stream.
    pub fn into_inner(self) -> O {
        self.os
    }

    /// Borrow the output stream.
    pub fn stream(&self) -> &O {
        &self.os
    }

    /// ## Check for Completion
    ///
    /// Yield whether a complete root value has been written. No further
    /// events are accepted afterwards, until the writer is reset.
    pub fn is_complete(&self) -> bool {
        self.has_root && self.levels.is_empty()
    }

    /// ## Set Double Precision
    ///
    /// Limit doubles to `digits` significant digits, or restore the
    /// shortest round-trip representation with `None`.
    pub fn set_double_precision(&mut self, digits: Option<usize>) {
        self.precision = digits;
    }

    /// ## Write Double with Precision
    ///
    /// Write a single double limited to `digits` significant digits,
    /// regardless of the configured precision.
    pub fn double_with_precision(&mut self, v: f64, digits: usize) -> bool {
        let previous = core::mem::replace(&mut self.precision, Some(digits));
        let r = self.write_double(v);
        self.precision = previous;
        r
    }

    /// ## Open Scoped Object
    ///
    /// Start an object and yield a guard which ends it when dropped. The
    /// guard dereferences to the writer, so members are written through it.
    pub fn object(&mut self) -> ObjectGuard<'_, O, SE, TE> {
        self.start_object();
        ObjectGuard { writer: self }
    }

    /// ## Open Scoped Array
    ///
    /// Start an array and yield a guard which ends it when dropped.
    pub fn array(&mut self) -> ArrayGuard<'_, O, SE, TE> {
        self.start_array();
        ArrayGuard { writer: self }
    }

    fn count(&self) -> usize {
        self.levels.last().map_or(0, |l| l.value_count)
    }

    fn put(&mut self, c: u8) {
        self.os.put(O::Ch::from_u32(c as u32));
    }

    fn put_all(&mut self, v: &[u8]) {
        for c in v {
            self.put(*c);
        }
    }

    fn prefix(&mut self, string: bool) {
        match self.levels.last_mut() {
            None => {
                assert!(!self.has_root, "value written after the document was complete");
                self.has_root = true;
            },
            Some(level) => {
                let separator = if level.value_count == 0 {
                    None
                } else if level.in_array || level.value_count % 2 == 0 {
                    Some(b',')
                } else {
                    Some(b':')
                };

                assert!(
                    level.in_array || level.value_count % 2 == 1 || string,
                    "object member name is not a string",
                );

                level.value_count += 1;
                if let Some(c) = separator {
                    self.put(c);
                }
            },
        }
    }

    fn end(&mut self, in_array: bool) {
        let Some(level) = self.levels.pop() else {
            core::panic!("container closed outside of any container");
        };
        assert!(level.in_array == in_array, "container closed with the wrong kind");
        assert!(level.value_count % 2 == 0 || in_array, "object member without a value");

        self.put(if in_array { b']' } else { b'}' });
        if self.levels.is_empty() {
            self.os.flush();
        }
    }

    fn write_double(&mut self, v: f64) -> bool {
        if !v.is_finite() {
            return false;
        }

        self.prefix(false);
        let mut b = dtoa::Buffer::new();
        match self.precision {
            None => b.format(v),
            Some(p) => b.format_with_precision(v, p),
        }
        .map_or(false, |s| {
            self.put_all(s);
            true
        })
    }

    fn escape_unicode(&mut self, v: u32) {
        self.put_all(b"\\u");
        for shift in [12, 8, 4, 0] {
            self.put(HEX[((v >> shift) & 0xf) as usize]);
        }
    }

    fn write_string(&mut self, v: &[SE::Ch]) -> bool {
        self.put(b'"');

        let mut is = StringStream::new(v);
        while let Some(c) = is.peek() {
            let c = c.to_u32();

            if !TE::SUPPORT_UNICODE && c >= 0x80 {
                let Some(cp) = SE::decode(&mut is) else {
                    return false;
                };
                if cp >= 0x10000 {
                    let s = cp - 0x10000;
                    self.escape_unicode(0xd800 + (s >> 10));
                    self.escape_unicode(0xdc00 + (s & 0x3ff));
                } else {
                    self.escape_unicode(cp);
                }
            } else if let Some(e) = escape(c) {
                is.take();
                if e == b'u' {
                    self.escape_unicode(c);
                } else {
                    self.put(b'\\');
                    self.put(e);
                }
            } else if !Transcoder::<SE, TE>::transcode(&mut is, &mut self.os) {
                return false;
            }
        }

        self.put(b'"');
        true
    }
}

impl<O, SE, TE> Writer<O, SE, TE>
where
    O: OutputStream<Ch = TE::Ch>,
    SE: Encoding<Ch = u8>,
    TE: Encoding,
{
    /// Write a string value from a string slice.
    pub fn string_str(&mut self, v: &str) -> bool {
        self.prefix(true);
        self.write_string(v.as_bytes())
    }

    /// Write an object member name from a string slice.
    pub fn key_str(&mut self, v: &str) -> bool {
        self.string_str(v)
    }
}

impl<'src, O, SE, TE> Handler<'src, SE::Ch> for Writer<O, SE, TE>
where
    O: OutputStream<Ch = TE::Ch>,
    SE: Encoding,
    TE: Encoding,
{
    fn null(&mut self) -> bool {
        self.prefix(false);
        self.put_all(b"null");
        true
    }

    fn bool(&mut self, v: bool) -> bool {
        self.prefix(false);
        self.put_all(if v { b"true" } else { b"false" });
        true
    }

    fn int(&mut self, v: i32) -> bool {
        self.prefix(false);
        self.put_all(itoa::Buffer::new().format(v).as_bytes());
        true
    }

    fn uint(&mut self, v: u32) -> bool {
        self.prefix(false);
        self.put_all(itoa::Buffer::new().format(v).as_bytes());
        true
    }

    fn int64(&mut self, v: i64) -> bool {
        self.prefix(false);
        self.put_all(itoa::Buffer::new().format(v).as_bytes());
        true
    }

    fn uint64(&mut self, v: u64) -> bool {
        self.prefix(false);
        self.put_all(itoa::Buffer::new().format(v).as_bytes());
        true
    }

    fn double(&mut self, v: f64) -> bool {
        self.write_double(v)
    }

    fn string(&mut self, v: Text<'src, '_, SE::Ch>) -> bool {
        self.prefix(true);
        self.write_string(v.as_slice())
    }

    fn start_object(&mut self) -> bool {
        self.prefix(false);
        self.levels.push(Level { value_count: 0, in_array: false });
        self.put(b'{');
        true
    }

    fn key(&mut self, v: Text<'src, '_, SE::Ch>) -> bool {
        self.string(v)
    }

    fn end_object(&mut self, _members: usize) -> bool {
        self.end(false);
        true
    }

    fn start_array(&mut self) -> bool {
        self.prefix(false);
        self.levels.push(Level { value_count: 0, in_array: true });
        self.put(b'[');
        true
    }

    fn end_array(&mut self, _elements: usize) -> bool {
        self.end(true);
        true
    }
}

macro_rules! guard {
    ($name:ident, $end:ident, $per:literal) => {
        impl<'w, O, SE, TE> core::ops::Deref for $name<'w, O, SE, TE>
        where
            O: OutputStream<Ch = TE::Ch>,
            SE: Encoding,
            TE: Encoding,
        {
            type Target = Writer<O, SE, TE>;

            fn deref(&self) -> &Self::Target {
                self.writer
            }
        }

        impl<'w, O, SE, TE> core::ops::DerefMut for $name<'w, O, SE, TE>
        where
            O: OutputStream<Ch = TE::Ch>,
            SE: Encoding,
            TE: Encoding,
        {
            fn deref_mut(&mut self) -> &mut Self::Target {
                self.writer
            }
        }

        impl<'w, O, SE, TE> Drop for $name<'w, O, SE, TE>
        where
            O: OutputStream<Ch = TE::Ch>,
            SE: Encoding,
            TE: Encoding,
        {
            fn drop(&mut self) {
                let n = self.writer.count() / $per;
                self.writer.$end(n);
            }
        }
    };
}

/// ## Scoped Object
///
/// Guard of an object opened with `Writer::object()`. The object is
/// ended when the guard is dropped.
pub struct ObjectGuard<'w, O, SE, TE>
where
    O: OutputStream<Ch = TE::Ch>,
    SE: Encoding,
    TE: Encoding,
{
    writer: &'w mut Writer<O, SE, TE>,
}

/// ## Scoped Array
///
/// Guard of an array opened with `Writer::array()`. The array is ended
/// when the guard is dropped.
pub struct ArrayGuard<'w, O, SE, TE>
where
    O: OutputStream<Ch = TE::Ch>,
    SE: Encoding,
    TE: Encoding,
{
    writer: &'w mut Writer<O, SE, TE>,
}

guard!(ObjectGuard, end_object, 2);
guard!(ArrayGuard, end_array, 1);
