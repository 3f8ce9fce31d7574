//! # Event Handlers
//!
//! The parser reports the structure of a JSON text as a sequence of events
//! to a `Handler`. The same protocol is consumed by the writer and
//! produced by DOM traversals, so any producer can be plugged into any
//! consumer.
//!
//! Every event returns a boolean. Returning `false` asks the producer to
//! stop immediately. The parser reports this as
//! `ParseErrorCode::Termination`.

use crate::encoding::Char;

/// ## String Payload
///
/// Strings and member names are passed to handlers either as reference
/// into the source buffer, which stays valid for `'src`, or as transient
/// copy, which is only valid for the duration of the call and has to be
/// copied by handlers that want to retain it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Text<'src, 'tmp, C = u8> {
    /// String data borrowed from the source buffer.
    Ref(&'src [C]),
    /// String data in a transient buffer.
    Copy(&'tmp [C]),
}

impl<'src, 'tmp, C> Text<'src, 'tmp, C> {
    /// ## Access Code Units
    pub fn as_slice(&self) -> &[C] {
        match *self {
            Text::Ref(v) => v,
            Text::Copy(v) => v,
        }
    }

    /// ## Check for Copies
    ///
    /// Yield whether the payload is a transient copy that must not be
    /// retained.
    pub fn is_copy(&self) -> bool {
        matches!(self, Text::Copy(_))
    }

    /// Yield the number of code units.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Check whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// ## Handler Protocol
///
/// Receiver of JSON events. All events default to `Self::fallback()`,
/// which accepts the event, so implementations only need to provide the
/// events they care about.
///
/// Objects are reported as `start_object()`, followed by a `key()` and a
/// value for each member, followed by `end_object()` with the number of
/// members. Arrays are reported as `start_array()`, followed by the
/// elements, followed by `end_array()` with the number of elements.
pub trait Handler<'src, C: Char = u8> {
    /// Default behavior of all events that are not overridden.
    fn fallback(&mut self) -> bool {
        true
    }

    /// JSON `null`.
    fn null(&mut self) -> bool {
        self.fallback()
    }

    /// JSON `true` or `false`.
    fn bool(&mut self, _v: bool) -> bool {
        self.fallback()
    }

    /// ## Signed 32-bit Integer
    ///
    /// Number within the range of `i32`. The reader only reports numbers
    /// with a leading minus sign this way, and passes all others to
    /// `Self::uint()`.
    /// Other producers, like DOM traversals, may pass any value in range.
    fn int(&mut self, _v: i32) -> bool {
        self.fallback()
    }

    /// Number that fits into `u32`. Producers other than the reader may
    /// prefer `Self::int()` for values that fit both.
    fn uint(&mut self, _v: u32) -> bool {
        self.fallback()
    }

    /// Number that fits into `i64`, but none of the narrower types.
    fn int64(&mut self, _v: i64) -> bool {
        self.fallback()
    }

    /// Number that fits into `u64`, but none of the narrower types.
    fn uint64(&mut self, _v: u64) -> bool {
        self.fallback()
    }

    /// Number with a fraction, an exponent, or beyond the 64-bit range.
    fn double(&mut self, _v: f64) -> bool {
        self.fallback()
    }

    /// JSON string value.
    fn string(&mut self, _v: Text<'src, '_, C>) -> bool {
        self.fallback()
    }

    /// Start of a JSON object.
    fn start_object(&mut self) -> bool {
        self.fallback()
    }

    /// Name of an object member. Defaults to `Self::string()`.
    fn key(&mut self, v: Text<'src, '_, C>) -> bool {
        self.string(v)
    }

    /// End of a JSON object with `members` members.
    fn end_object(&mut self, _members: usize) -> bool {
        self.fallback()
    }

    /// Start of a JSON array.
    fn start_array(&mut self) -> bool {
        self.fallback()
    }

    /// End of a JSON array with `elements` elements.
    fn end_array(&mut self, _elements: usize) -> bool {
        self.fallback()
    }
}

impl<'src, C: Char, H: Handler<'src, C> + ?Sized> Handler<'src, C> for &mut H {
    fn fallback(&mut self) -> bool { (**self).fallback() }
    fn null(&mut self) -> bool { (**self).null() }
    fn bool(&mut self, v: bool) -> bool { (**self).bool(v) }
    fn int(&mut self, v: i32) -> bool { (**self).int(v) }
    fn uint(&mut self, v: u32) -> bool { (**self).uint(v) }
    fn int64(&mut self, v: i64) -> bool { (**self).int64(v) }
    fn uint64(&mut self, v: u64) -> bool { (**self).uint64(v) }
    fn double(&mut self, v: f64) -> bool { (**self).double(v) }
    fn string(&mut self, v: Text<'src, '_, C>) -> bool { (**self).string(v) }
    fn start_object(&mut self) -> bool { (**self).start_object() }
    fn key(&mut self, v: Text<'src, '_, C>) -> bool { (**self).key(v) }
    fn end_object(&mut self, members: usize) -> bool { (**self).end_object(members) }
    fn start_array(&mut self) -> bool { (**self).start_array() }
    fn end_array(&mut self, elements: usize) -> bool { (**self).end_array(elements) }
}

/// ## Events
///
/// A single handler event as value. Used by `EventFn` to route events
/// into a closure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event<'src, 'tmp, C = u8> {
    Null,
    Bool(bool),
    Int(i32),
    Uint(u32),
    Int64(i64),
    Uint64(u64),
    Double(f64),
    String(Text<'src, 'tmp, C>),
    StartObject,
    Key(Text<'src, 'tmp, C>),
    EndObject(usize),
    StartArray,
    EndArray(usize),
}

/// ## Closure Handler
///
/// Wraps a closure taking `Event` values and returning a
/// `core::ops::ControlFlow`. Any `Break` stops the producer.
pub struct EventFn<F>(pub F);

impl<'src, C, F> Handler<'src, C> for EventFn<F>
where
    C: Char,
    F: for<'tmp> FnMut(Event<'src, 'tmp, C>) -> core::ops::ControlFlow<()>,
{
    fn null(&mut self) -> bool { (self.0)(Event::Null).is_continue() }
    fn bool(&mut self, v: bool) -> bool { (self.0)(Event::Bool(v)).is_continue() }
    fn int(&mut self, v: i32) -> bool { (self.0)(Event::Int(v)).is_continue() }
    fn uint(&mut self, v: u32) -> bool { (self.0)(Event::Uint(v)).is_continue() }
    fn int64(&mut self, v: i64) -> bool { (self.0)(Event::Int64(v)).is_continue() }
    fn uint64(&mut self, v: u64) -> bool { (self.0)(Event::Uint64(v)).is_continue() }
    fn double(&mut self, v: f64) -> bool { (self.0)(Event::Double(v)).is_continue() }
    fn string(&mut self, v: Text<'src, '_, C>) -> bool { (self.0)(Event::String(v)).is_continue() }
    fn start_object(&mut self) -> bool { (self.0)(Event::StartObject).is_continue() }
    fn key(&mut self, v: Text<'src, '_, C>) -> bool { (self.0)(Event::Key(v)).is_continue() }
    fn end_object(&mut self, members: usize) -> bool { (self.0)(Event::EndObject(members)).is_continue() }
    fn start_array(&mut self) -> bool { (self.0)(Event::StartArray).is_continue() }
    fn end_array(&mut self, elements: usize) -> bool { (self.0)(Event::EndArray(elements)).is_continue() }
}
