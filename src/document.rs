//! # Documents
//!
//! A `Document` is the root `Value` of a tree together with the allocator
//! of the tree and the result of the last parse. It is a `Handler`
//! itself: events push values onto a construction stack, and the end of
//! each container folds its children into a single value. Once the root
//! is complete, it is moved out of the stack into the document.

use crate::allocator::{Allocator, CrtAllocator};
use crate::value::{Member, Value};
use alloc::vec::Vec;
use osi_json::{
    encoding::{Encoding, Utf8},
    error::ParseError,
    handler::{Handler, Text},
    reader::{self, Flag, Reader},
    stream::{InputStream, InsituStringStream, StringStream},
};

/// ## Document
///
/// Root of a value tree, dereferencing to the root value. String
/// references in the tree borrow from buffers living for `'a`.
#[derive(Debug)]
pub struct Document<'a, A: Allocator = CrtAllocator> {
    root: Value<'a>,
    allocator: A,
    stack: Vec<Value<'a>>,
    error: Option<ParseError>,
}

impl<'a, A: Allocator + Default> Document<'a, A> {
    /// Create an empty document with a default allocator.
    pub fn new() -> Self {
        Self::with_allocator(A::default())
    }
}

impl<'a, A: Allocator + Default> Default for Document<'a, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, A: Allocator> Document<'a, A> {
    /// Create an empty document using `allocator` for its tree.
    pub fn with_allocator(allocator: A) -> Self {
        Self {
            root: Value::Null,
            allocator: allocator,
            stack: Vec::new(),
            error: None,
        }
    }

    /// Borrow the allocator of the tree.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Borrow the allocator of the tree mutably, to build values that are
    /// inserted into it.
    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }

    /// Borrow the root value and the allocator at the same time.
    pub fn split_mut(&mut self) -> (&mut Value<'a>, &mut A) {
        (&mut self.root, &mut self.allocator)
    }

    /// ## Last Parse Error
    ///
    /// Yield the error of the last parse, or `None` if it succeeded or no
    /// parse happened yet.
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    pub fn has_parse_error(&self) -> bool {
        self.error.is_some()
    }

    /// Exchange trees, allocators and parse results of two documents.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(&mut self.root, &mut other.root);
        core::mem::swap(&mut self.allocator, &mut other.allocator);
        core::mem::swap(&mut self.error, &mut other.error);
    }

    fn clear_stack(&mut self) {
        if A::NEED_FREE {
            while let Some(mut v) = self.stack.pop() {
                v.release(&mut self.allocator);
            }
        } else {
            self.stack.clear();
        }
    }

    /// ## Parse Stream
    ///
    /// Replace the tree with the document read from `is`, whose code units
    /// are encoded in `SE`. Strings are transcoded to UTF-8. On failure,
    /// the document is left `Null` and the error is retained.
    pub fn parse_stream<SE, I>(&mut self, flags: Flag, is: &mut I) -> Result<(), ParseError>
    where
        SE: Encoding,
        I: InputStream<'a>,
    {
        self.root.release(&mut self.allocator);
        self.clear_stack();

        let r = Reader::<SE, Utf8>::new().parse(flags, is, self);
        match r {
            Ok(()) => {
                debug_assert_eq!(self.stack.len(), 1);
                if let Some(root) = self.stack.pop() {
                    self.root = root;
                }
                tracing::trace!(kind = ?self.root.kind(), "document parsed");
                self.error = None;
            },
            Err(e) => {
                self.clear_stack();
                self.error = Some(e);
            },
        }
        r
    }

    /// ## Parse Text
    ///
    /// Replace the tree with the document in `text`. All strings are
    /// copied into the tree.
    pub fn parse(&mut self, flags: Flag, text: &str) -> Result<(), ParseError> {
        let mut is = StringStream::from_str(text);
        self.parse_stream::<Utf8, _>(flags & !reader::FLAG_IN_PLACE, &mut is)
    }

    /// ## Parse In Place
    ///
    /// Replace the tree with the document in `buf`, decoding strings in
    /// place. Strings of the tree refer into `buf`, which is clobbered in
    /// the process.
    pub fn parse_insitu(&mut self, flags: Flag, buf: &'a mut [u8]) -> Result<(), ParseError> {
        let mut is = InsituStringStream::new(buf);
        self.parse_stream::<Utf8, _>(flags | reader::FLAG_IN_PLACE, &mut is)
    }
}

impl<'a, A: Allocator> core::ops::Deref for Document<'a, A> {
    type Target = Value<'a>;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}

impl<'a, A: Allocator> core::ops::DerefMut for Document<'a, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.root
    }
}

impl<'a, A: Allocator> Handler<'a> for Document<'a, A> {
    fn null(&mut self) -> bool {
        self.stack.push(Value::Null);
        true
    }

    fn bool(&mut self, v: bool) -> bool {
        self.stack.push(Value::from(v));
        true
    }

    fn int(&mut self, v: i32) -> bool {
        self.stack.push(Value::from(v));
        true
    }

    fn uint(&mut self, v: u32) -> bool {
        self.stack.push(Value::from(v));
        true
    }

    fn int64(&mut self, v: i64) -> bool {
        self.stack.push(Value::from(v));
        true
    }

    fn uint64(&mut self, v: u64) -> bool {
        self.stack.push(Value::from(v));
        true
    }

    fn double(&mut self, v: f64) -> bool {
        self.stack.push(Value::from(v));
        true
    }

    fn string(&mut self, v: Text<'a, '_>) -> bool {
        let v = match v {
            Text::Ref(v) => Value::string_ref(v),
            Text::Copy(v) => Value::string_copy(v, &mut self.allocator),
        };
        self.stack.push(v);
        true
    }

    fn key(&mut self, v: Text<'a, '_>) -> bool {
        self.string(v)
    }

    fn end_object(&mut self, members: usize) -> bool {
        let at = self.stack.len() - 2 * members;
        let mut v = Vec::new();
        self.allocator.reserve(&mut v, members);

        let mut children = self.stack.drain(at..);
        while let (Some(name), Some(value)) = (children.next(), children.next()) {
            v.push(Member::new(name, value));
        }
        drop(children);

        self.stack.push(Value::Object(v));
        true
    }

    fn end_array(&mut self, elements: usize) -> bool {
        let at = self.stack.len() - elements;
        let mut v = Vec::new();
        self.allocator.reserve(&mut v, elements);
        v.extend(self.stack.drain(at..));

        self.stack.push(Value::Array(v));
        true
    }
}
