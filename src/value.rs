//! # Values
//!
//! A `Value` is a node of an in-memory JSON tree. Containers exclusively
//! own their children, so a tree is released as a whole when its root is
//! dropped. Values are never duplicated implicitly. Assignment moves, and
//! duplicating a subtree is spelled out via `Value::copy_from()`.
//!
//! Strings are either references into a buffer that outlives the tree,
//! or owned copies allocated through an `Allocator`. Both may contain
//! arbitrary bytes, including NUL.
//!
//! Accessors for a specific kind panic if the value is of another kind.
//! Use the `is_*()` queries first if the kind is not known.

use crate::allocator::Allocator;
use alloc::{boxed::Box, vec::Vec};
use osi_json::handler::{Handler, Text};

/// Capacity of arrays and objects on their first insertion.
pub const INITIAL_CAPACITY: usize = 16;

pub type NumberFlag = u8;

pub const NUMBER_INT: NumberFlag =      0x01;
pub const NUMBER_UINT: NumberFlag =     0x02;
pub const NUMBER_INT64: NumberFlag =    0x04;
pub const NUMBER_UINT64: NumberFlag =   0x08;
pub const NUMBER_DOUBLE: NumberFlag =   0x10;

/// ## Value Kinds
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Kind {
    Null,
    False,
    True,
    Object,
    Array,
    String,
    Number,
}

#[derive(Clone, Copy, Debug)]
enum Repr {
    Int(i64),
    Uint(u64),
    Double(f64),
}

/// ## Numbers
///
/// A number remembers every integer type its value fits into, so the
/// narrowest accessor succeeds. Negative integers are stored as `i64`,
/// non-negative ones as `u64`.
#[derive(Clone, Copy, Debug)]
pub struct Number {
    flags: NumberFlag,
    repr: Repr,
}

/// ## Strings
#[derive(Debug)]
pub enum Str<'a> {
    /// Borrowed from a buffer that outlives the tree.
    Ref(&'a [u8]),
    /// Allocated through the allocator of the tree.
    Owned(Box<[u8]>),
}

/// ## Object Members
///
/// A name and value pair. The name is always a string.
#[derive(Debug)]
pub struct Member<'a> {
    name: Value<'a>,
    value: Value<'a>,
}

/// ## Values
///
/// A node of a JSON tree. Object members are kept in insertion order
/// until a removal moves the last member into the freed slot.
#[derive(Debug, Default)]
pub enum Value<'a> {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Str<'a>),
    Array(Vec<Value<'a>>),
    Object(Vec<Member<'a>>),
}

fn grow<T, A: Allocator>(v: &mut Vec<T>, alloc: &mut A) {
    if v.len() == v.capacity() {
        let capacity = match v.capacity() {
            0 => INITIAL_CAPACITY,
            n => n * 2,
        };
        alloc.reserve(v, capacity);
    }
}

impl Number {
    /// Create a number from a signed integer.
    pub fn from_i64(v: i64) -> Self {
        if v >= 0 {
            return Self::from_u64(v as u64);
        }

        let mut flags = NUMBER_INT64;
        if v >= i32::MIN as i64 {
            flags |= NUMBER_INT;
        }
        Self { flags: flags, repr: Repr::Int(v) }
    }

    /// Create a number from an unsigned integer.
    pub fn from_u64(v: u64) -> Self {
        let mut flags = NUMBER_UINT64;
        if v <= i64::MAX as u64 {
            flags |= NUMBER_INT64;
        }
        if v <= u32::MAX as u64 {
            flags |= NUMBER_UINT;
        }
        if v <= i32::MAX as u64 {
            flags |= NUMBER_INT;
        }
        Self { flags: flags, repr: Repr::Uint(v) }
    }

    /// Create a number from a double.
    pub fn from_f64(v: f64) -> Self {
        Self { flags: NUMBER_DOUBLE, repr: Repr::Double(v) }
    }

    /// Yield the type flags of the number.
    pub fn flags(&self) -> NumberFlag {
        self.flags
    }

    /// ## Convert to Double
    ///
    /// Yield the number as double. Integers beyond 2^53 lose precision.
    pub fn as_f64(&self) -> f64 {
        match self.repr {
            Repr::Int(v) => v as f64,
            Repr::Uint(v) => v as f64,
            Repr::Double(v) => v,
        }
    }

    fn integer(&self, flag: NumberFlag) -> i128 {
        assert!(self.flags & flag != 0, "number does not fit the requested type");
        match self.repr {
            Repr::Int(v) => v as i128,
            Repr::Uint(v) => v as i128,
            Repr::Double(_) => core::unreachable!(),
        }
    }

    fn accept<'a, H: Handler<'a> + ?Sized>(&self, handler: &mut H) -> bool {
        match self.repr {
            Repr::Double(v) => handler.double(v),
            Repr::Int(v) if self.flags & NUMBER_INT != 0 => handler.int(v as i32),
            Repr::Int(v) => handler.int64(v),
            Repr::Uint(v) if self.flags & NUMBER_INT != 0 => handler.int(v as i32),
            Repr::Uint(v) if self.flags & NUMBER_UINT != 0 => handler.uint(v as u32),
            Repr::Uint(v) if self.flags & NUMBER_INT64 != 0 => handler.int64(v as i64),
            Repr::Uint(v) => handler.uint64(v),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self.repr, other.repr) {
            (Repr::Int(a), Repr::Int(b)) => a == b,
            (Repr::Uint(a), Repr::Uint(b)) => a == b,
            (Repr::Double(_), _) | (_, Repr::Double(_)) => self.as_f64() == other.as_f64(),
            _ => false,
        }
    }
}

impl<'a> Str<'a> {
    /// Borrow the string content.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Str::Ref(v) => v,
            Str::Owned(v) => v,
        }
    }

    fn text(&self) -> Text<'a, '_> {
        match *self {
            Str::Ref(v) => Text::Ref(v),
            Str::Owned(ref v) => Text::Copy(&v[..]),
        }
    }
}

impl<'a> Member<'a> {
    pub(crate) fn new(name: Value<'a>, value: Value<'a>) -> Self {
        Self {
            name: name,
            value: value,
        }
    }

    /// Borrow the member name.
    pub fn name(&self) -> &Value<'a> {
        &self.name
    }

    /// Borrow the member value.
    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    /// Borrow the member value mutably.
    pub fn value_mut(&mut self) -> &mut Value<'a> {
        &mut self.value
    }

    /// Split the member into name and value.
    pub fn into_parts(self) -> (Value<'a>, Value<'a>) {
        (self.name, self.value)
    }
}

impl<'a> Value<'a> {
    /// Create an empty object.
    pub fn object() -> Self {
        Value::Object(Vec::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// ## Create String Reference
    ///
    /// Create a string that refers to `v` without copying it.
    pub fn string_ref(v: &'a [u8]) -> Self {
        Value::String(Str::Ref(v))
    }

    /// ## Create String Copy
    ///
    /// Create a string that owns a copy of `v`, allocated from `alloc`.
    pub fn string_copy<A: Allocator>(v: &[u8], alloc: &mut A) -> Self {
        let mut block = alloc.malloc(v.len());
        block.copy_from_slice(v);
        Value::String(Str::Owned(block))
    }

    /// Yield the kind of the value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(false) => Kind::False,
            Value::Bool(true) => Kind::True,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// ## Kind Queries
    ///
    /// Check whether the value is of a specific kind. These never panic.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check whether the value is `true` or `false`.
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Check whether the value is `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Check whether the value is `false`.
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }

    /// Check whether the value is an object.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check whether the value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Check whether the value is a string.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check whether the value is a number of any type.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// ## Number Flags
    ///
    /// Yield the type flags of a number, or 0 if the value is not a
    /// number.
    pub fn number_flags(&self) -> NumberFlag {
        match self {
            Value::Number(n) => n.flags,
            _ => 0,
        }
    }

    /// ## Number Type Queries
    ///
    /// Check whether the value is a number that fits the respective type.
    /// A number may fit several types at once. Non-numbers fit none.
    pub fn is_int(&self) -> bool {
        self.number_flags() & NUMBER_INT != 0
    }

    /// Check whether the value is a number that fits `u32`.
    pub fn is_uint(&self) -> bool {
        self.number_flags() & NUMBER_UINT != 0
    }

    /// Check whether the value is a number that fits `i64`.
    pub fn is_int64(&self) -> bool {
        self.number_flags() & NUMBER_INT64 != 0
    }

    /// Check whether the value is a number that fits `u64`.
    pub fn is_uint64(&self) -> bool {
        self.number_flags() & NUMBER_UINT64 != 0
    }

    /// Check whether the value is a number with a fraction or exponent.
    pub fn is_double(&self) -> bool {
        self.number_flags() & NUMBER_DOUBLE != 0
    }

    /// Move the value out, leaving `Null` behind.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Exchange two values.
    pub fn swap(&mut self, other: &mut Self) -> &mut Self {
        core::mem::swap(self, other);
        self
    }

    /// ## Release Value
    ///
    /// Reset the value to `Null`, handing all owned strings of the subtree
    /// back to `alloc` if it needs to be told about released blocks.
    pub fn release<A: Allocator>(&mut self, alloc: &mut A) {
        let v = self.take();
        if A::NEED_FREE {
            v.free_with(alloc);
        }
    }

    fn free_with<A: Allocator>(self, alloc: &mut A) {
        match self {
            Value::String(Str::Owned(block)) => alloc.free(block),
            Value::Array(elements) => {
                for v in elements {
                    v.free_with(alloc);
                }
            },
            Value::Object(members) => {
                for m in members {
                    m.name.free_with(alloc);
                    m.value.free_with(alloc);
                }
            },
            _ => {},
        }
    }

    /// ## Setters
    ///
    /// Replace the value with a new value of the respective kind. The
    /// previous content is dropped. Containers start out empty.
    pub fn set_null(&mut self) -> &mut Self {
        *self = Value::Null;
        self
    }

    /// Turn the value into a boolean.
    pub fn set_bool(&mut self, v: bool) -> &mut Self {
        *self = Value::Bool(v);
        self
    }

    /// Turn the value into a number from an `i32`.
    pub fn set_int(&mut self, v: i32) -> &mut Self {
        *self = Value::from(v);
        self
    }

    /// Turn the value into a number from a `u32`.
    pub fn set_uint(&mut self, v: u32) -> &mut Self {
        *self = Value::from(v);
        self
    }

    /// Turn the value into a number from an `i64`.
    pub fn set_int64(&mut self, v: i64) -> &mut Self {
        *self = Value::from(v);
        self
    }

    /// Turn the value into a number from a `u64`.
    pub fn set_uint64(&mut self, v: u64) -> &mut Self {
        *self = Value::from(v);
        self
    }

    /// Turn the value into a double.
    pub fn set_double(&mut self, v: f64) -> &mut Self {
        *self = Value::from(v);
        self
    }

    /// Turn the value into an empty object.
    pub fn set_object(&mut self) -> &mut Self {
        *self = Value::object();
        self
    }

    /// Turn the value into an empty array.
    pub fn set_array(&mut self) -> &mut Self {
        *self = Value::array();
        self
    }

    /// Turn the value into a reference to `v`.
    pub fn set_string_ref(&mut self, v: &'a [u8]) -> &mut Self {
        *self = Value::string_ref(v);
        self
    }

    /// ## Set String Copy
    ///
    /// Turn the value into an owned copy of `v`. The block of a previously
    /// owned string is reused.
    pub fn set_string_copy<A: Allocator>(&mut self, v: &[u8], alloc: &mut A) -> &mut Self {
        let mut block = match self.take() {
            Value::String(Str::Owned(block)) => alloc.realloc(block, v.len()),
            previous => {
                if A::NEED_FREE {
                    previous.free_with(alloc);
                }
                alloc.malloc(v.len())
            },
        };
        block.copy_from_slice(v);
        *self = Value::String(Str::Owned(block));
        self
    }

    /// ## Boolean Access
    ///
    /// Yield the boolean. Panics if the value is not a boolean.
    pub fn get_bool(&self) -> bool {
        match *self {
            Value::Bool(v) => v,
            _ => core::panic!("value is not a boolean"),
        }
    }

    fn number(&self) -> &Number {
        match self {
            Value::Number(n) => n,
            _ => core::panic!("value is not a number"),
        }
    }

    /// ## Integer Access
    ///
    /// Yield the number as the respective integer type. Panics if the value
    /// is not a number, or does not fit the type. No conversion between
    /// integers and doubles takes place.
    pub fn get_int(&self) -> i32 {
        self.number().integer(NUMBER_INT) as i32
    }

    /// Yield the number as `u32`.
    pub fn get_uint(&self) -> u32 {
        self.number().integer(NUMBER_UINT) as u32
    }

    /// Yield the number as `i64`.
    pub fn get_int64(&self) -> i64 {
        self.number().integer(NUMBER_INT64) as i64
    }

    /// Yield the number as `u64`.
    pub fn get_uint64(&self) -> u64 {
        self.number().integer(NUMBER_UINT64) as u64
    }

    /// Yield any number as double.
    pub fn get_double(&self) -> f64 {
        self.number().as_f64()
    }

    /// Borrow the content of a string.
    pub fn get_string(&self) -> &[u8] {
        match self {
            Value::String(s) => s.as_bytes(),
            _ => core::panic!("value is not a string"),
        }
    }

    /// Borrow the content of a string, if it is valid UTF-8.
    pub fn get_str(&self) -> Option<&str> {
        core::str::from_utf8(self.get_string()).ok()
    }

    fn text(&self) -> Text<'a, '_> {
        match self {
            Value::String(s) => s.text(),
            _ => core::panic!("value is not a string"),
        }
    }

    fn members_vec(&self) -> &Vec<Member<'a>> {
        match self {
            Value::Object(v) => v,
            _ => core::panic!("value is not an object"),
        }
    }

    fn members_vec_mut(&mut self) -> &mut Vec<Member<'a>> {
        match self {
            Value::Object(v) => v,
            _ => core::panic!("value is not an object"),
        }
    }

    /// ## Object Size
    ///
    /// Yield the number of members. Panics if the value is not an object.
    pub fn member_count(&self) -> usize {
        self.members_vec().len()
    }

    /// Yield the number of members the object holds without growing.
    pub fn member_capacity(&self) -> usize {
        self.members_vec().capacity()
    }

    /// Iterate over the members in storage order.
    pub fn members(&self) -> core::slice::Iter<'_, Member<'a>> {
        self.members_vec().iter()
    }

    /// Iterate mutably over the members in storage order.
    pub fn members_mut(&mut self) -> core::slice::IterMut<'_, Member<'a>> {
        self.members_vec_mut().iter_mut()
    }

    /// ## Find Member
    ///
    /// Yield the position of the first member called `name`. Names are
    /// compared byte-wise by a linear scan.
    pub fn find_member<N: AsRef<[u8]> + ?Sized>(&self, name: &N) -> Option<usize> {
        let name = name.as_ref();
        self.members_vec().iter().position(|m| m.name.get_string() == name)
    }

    /// Check whether a member called `name` exists.
    pub fn has_member<N: AsRef<[u8]> + ?Sized>(&self, name: &N) -> bool {
        self.find_member(name).is_some()
    }

    /// ## Member Lookup
    ///
    /// Borrow the value of the first member called `name`, if any.
    pub fn get_member<N: AsRef<[u8]> + ?Sized>(&self, name: &N) -> Option<&Value<'a>> {
        let i = self.find_member(name)?;
        Some(&self.members_vec()[i].value)
    }

    /// Borrow the value of the first member called `name` mutably.
    pub fn get_member_mut<N: AsRef<[u8]> + ?Sized>(&mut self, name: &N) -> Option<&mut Value<'a>> {
        let i = self.find_member(name)?;
        Some(&mut self.members_vec_mut()[i].value)
    }

    /// ## Add Member
    ///
    /// Append a member, taking ownership of `name` and `value`. The member
    /// storage grows by doubling. Duplicate names are not detected.
    pub fn add_member<A: Allocator>(
        &mut self,
        name: Value<'a>,
        value: Value<'a>,
        alloc: &mut A,
    ) -> &mut Self {
        assert!(name.is_string(), "object member name is not a string");

        let members = self.members_vec_mut();
        grow(members, alloc);
        members.push(Member::new(name, value));
        self
    }

    /// ## Remove Member
    ///
    /// Remove the first member called `name` by moving the last member
    /// into its slot. Yields whether a member was removed.
    pub fn remove_member<N: AsRef<[u8]> + ?Sized>(&mut self, name: &N) -> bool {
        match self.find_member(name) {
            Some(i) => {
                self.remove_member_at(i);
                true
            },
            None => false,
        }
    }

    /// Remove the member at `index` by moving the last member into its
    /// slot.
    pub fn remove_member_at(&mut self, index: usize) -> Member<'a> {
        self.members_vec_mut().swap_remove(index)
    }

    /// ## Erase Member
    ///
    /// Remove the first member called `name`, keeping the order of all
    /// other members. Yields whether a member was removed.
    pub fn erase_member<N: AsRef<[u8]> + ?Sized>(&mut self, name: &N) -> bool {
        match self.find_member(name) {
            Some(i) => {
                self.erase_member_at(i);
                true
            },
            None => false,
        }
    }

    /// Remove the member at `index`, keeping the order of all other
    /// members.
    pub fn erase_member_at(&mut self, index: usize) -> Member<'a> {
        self.members_vec_mut().remove(index)
    }

    /// Remove all members, retaining the capacity.
    pub fn remove_all_members(&mut self) {
        self.members_vec_mut().clear();
    }

    fn elements_vec(&self) -> &Vec<Value<'a>> {
        match self {
            Value::Array(v) => v,
            _ => core::panic!("value is not an array"),
        }
    }

    fn elements_vec_mut(&mut self) -> &mut Vec<Value<'a>> {
        match self {
            Value::Array(v) => v,
            _ => core::panic!("value is not an array"),
        }
    }

    /// Yield the number of array elements.
    pub fn len(&self) -> usize {
        self.elements_vec().len()
    }

    /// Check whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements_vec().is_empty()
    }

    /// Yield the number of elements the array holds without growing.
    pub fn capacity(&self) -> usize {
        self.elements_vec().capacity()
    }

    /// Iterate over the array elements.
    pub fn elements(&self) -> core::slice::Iter<'_, Value<'a>> {
        self.elements_vec().iter()
    }

    /// Iterate mutably over the array elements.
    pub fn elements_mut(&mut self) -> core::slice::IterMut<'_, Value<'a>> {
        self.elements_vec_mut().iter_mut()
    }

    /// Borrow the element at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&Value<'a>> {
        self.elements_vec().get(index)
    }

    /// Grow the array to hold at least `capacity` elements.
    pub fn reserve<A: Allocator>(&mut self, capacity: usize, alloc: &mut A) -> &mut Self {
        alloc.reserve(self.elements_vec_mut(), capacity);
        self
    }

    /// ## Append Element
    ///
    /// Append `v` to the array, taking ownership of it. The element
    /// storage grows by doubling.
    pub fn push_back<A: Allocator>(&mut self, v: Value<'a>, alloc: &mut A) -> &mut Self {
        let elements = self.elements_vec_mut();
        grow(elements, alloc);
        elements.push(v);
        self
    }

    /// Remove and yield the last element.
    pub fn pop_back(&mut self) -> Option<Value<'a>> {
        self.elements_vec_mut().pop()
    }

    /// Remove the element at `index`, shifting all following elements.
    pub fn erase(&mut self, index: usize) -> Value<'a> {
        self.elements_vec_mut().remove(index)
    }

    /// Remove all elements, retaining the capacity.
    pub fn clear(&mut self) {
        self.elements_vec_mut().clear();
    }

    /// ## Deep Copy
    ///
    /// Replace the value with a copy of `src`. Owned strings and all
    /// container storage are duplicated through `alloc`. String references
    /// stay references.
    pub fn copy_from<A: Allocator>(&mut self, src: &Value<'a>, alloc: &mut A) -> &mut Self {
        let v = Self::duplicate(src, alloc);
        self.release(alloc);
        *self = v;
        self
    }

    fn duplicate<A: Allocator>(src: &Value<'a>, alloc: &mut A) -> Value<'a> {
        match src {
            Value::Null => Value::Null,
            Value::Bool(v) => Value::Bool(*v),
            Value::Number(n) => Value::Number(*n),
            Value::String(Str::Ref(v)) => Value::String(Str::Ref(*v)),
            Value::String(Str::Owned(v)) => Value::string_copy(v, alloc),
            Value::Array(elements) => {
                let mut copy = Vec::new();
                alloc.reserve(&mut copy, elements.len());
                for v in elements {
                    copy.push(Self::duplicate(v, alloc));
                }
                Value::Array(copy)
            },
            Value::Object(members) => {
                let mut copy = Vec::new();
                alloc.reserve(&mut copy, members.len());
                for m in members {
                    copy.push(Member::new(
                        Self::duplicate(&m.name, alloc),
                        Self::duplicate(&m.value, alloc),
                    ));
                }
                Value::Object(copy)
            },
        }
    }

    /// ## Traverse Value
    ///
    /// Report the subtree to `handler` depth-first, as the reader would
    /// report its text. Yields `false` as soon as the handler refuses an
    /// event.
    pub fn accept<H: Handler<'a> + ?Sized>(&self, handler: &mut H) -> bool {
        match self {
            Value::Null => handler.null(),
            Value::Bool(v) => handler.bool(*v),
            Value::Number(n) => n.accept(handler),
            Value::String(s) => handler.string(s.text()),
            Value::Array(elements) => {
                if !handler.start_array() {
                    return false;
                }
                for v in elements {
                    if !v.accept(handler) {
                        return false;
                    }
                }
                handler.end_array(elements.len())
            },
            Value::Object(members) => {
                if !handler.start_object() {
                    return false;
                }
                for m in members {
                    if !handler.key(m.name.text()) || !m.value.accept(handler) {
                        return false;
                    }
                }
                handler.end_object(members.len())
            },
        }
    }
}

impl<'a> From<bool> for Value<'a> {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl<'a> From<i32> for Value<'a> {
    fn from(v: i32) -> Self {
        Value::Number(Number::from_i64(v as i64))
    }
}

impl<'a> From<u32> for Value<'a> {
    fn from(v: u32) -> Self {
        Value::Number(Number::from_u64(v as u64))
    }
}

impl<'a> From<i64> for Value<'a> {
    fn from(v: i64) -> Self {
        Value::Number(Number::from_i64(v))
    }
}

impl<'a> From<u64> for Value<'a> {
    fn from(v: u64) -> Self {
        Value::Number(Number::from_u64(v))
    }
}

impl<'a> From<f64> for Value<'a> {
    fn from(v: f64) -> Self {
        Value::Number(Number::from_f64(v))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::string_ref(v.as_bytes())
    }
}

impl<'a, 'b> PartialEq<Value<'b>> for Value<'a> {
    fn eq(&self, other: &Value<'b>) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a.as_bytes() == b.as_bytes(),
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            },
            // Repeated names pair up by their order of occurrence.
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().enumerate().all(|(i, m)| {
                        let name = m.name.get_string();
                        let nth = a[..i].iter().filter(|p| p.name.get_string() == name).count();
                        b.iter()
                            .filter(|p| p.name.get_string() == name)
                            .nth(nth)
                            .map_or(false, |p| m.value == p.value)
                    })
            },
            _ => false,
        }
    }
}

impl<'a> core::ops::Index<&str> for Value<'a> {
    type Output = Value<'a>;

    fn index(&self, name: &str) -> &Self::Output {
        match self.get_member(name) {
            Some(v) => v,
            None => core::panic!("no member called {:?}", name),
        }
    }
}

impl<'a> core::ops::IndexMut<&str> for Value<'a> {
    fn index_mut(&mut self, name: &str) -> &mut Self::Output {
        match self.get_member_mut(name) {
            Some(v) => v,
            None => core::panic!("no member called {:?}", name),
        }
    }
}

impl<'a> core::ops::Index<usize> for Value<'a> {
    type Output = Value<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.elements_vec()[index]
    }
}

impl<'a> core::ops::IndexMut<usize> for Value<'a> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.elements_vec_mut()[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{CrtAllocator, MemoryPoolAllocator};
    use alloc::string::String;
    use osi_json::{
        encoding::Utf8,
        handler::{Event, EventFn},
        stream::StringBuffer,
        writer::Writer,
    };
    use test_case::test_case;

    fn write(v: &Value<'_>) -> String {
        let mut w = Writer::<_, Utf8, Utf8>::new(StringBuffer::new());
        assert!(v.accept(&mut w));
        assert!(w.is_complete());
        String::from(w.into_inner().as_str().unwrap())
    }

    fn sample<'a, A: Allocator>(alloc: &mut A) -> Value<'a> {
        let mut list = Value::array();
        list.push_back(Value::from(1u32), alloc)
            .push_back(Value::from(-2i32), alloc)
            .push_back(Value::from(0.5), alloc);

        let mut v = Value::object();
        v.add_member(Value::from("name"), Value::string_copy(b"osi", alloc), alloc)
            .add_member(Value::from("list"), list, alloc)
            .add_member(Value::from("flag"), Value::from(true), alloc)
            .add_member(Value::from("none"), Value::Null, alloc);
        v
    }

    // Kind Test
    //
    // Verify the kind queries of all value kinds.
    #[test]
    fn value_kinds() {
        let mut v = Value::default();
        assert!(v.is_null());
        assert_eq!(v.kind(), Kind::Null);

        v.set_bool(false);
        assert!(v.is_bool() && v.is_false() && !v.is_true());
        assert_eq!(v.kind(), Kind::False);
        v.set_bool(true);
        assert_eq!(v.kind(), Kind::True);
        assert!(v.get_bool());

        v.set_double(0.25);
        assert!(v.is_number() && v.is_double() && !v.is_int());
        assert_eq!(v.get_double(), 0.25);

        v.set_object();
        assert!(v.is_object());
        assert_eq!(v.member_count(), 0);
        v.set_array();
        assert!(v.is_array() && v.is_empty());
        v.set_string_ref(b"x");
        assert!(v.is_string());
        assert_eq!(v.kind(), Kind::String);
        v.set_null();
        assert!(v.is_null());
    }

    // Number Flags Test
    //
    // Verify integers carry every type they fit into.
    #[test_case(Value::from(5u64), NUMBER_INT | NUMBER_UINT | NUMBER_INT64 | NUMBER_UINT64 ; "small")]
    #[test_case(Value::from(-1i32), NUMBER_INT | NUMBER_INT64 ; "negative")]
    #[test_case(Value::from(0x8000_0000u32), NUMBER_UINT | NUMBER_INT64 | NUMBER_UINT64 ; "above i32")]
    #[test_case(Value::from(-0x8000_0001i64), NUMBER_INT64 ; "below i32")]
    #[test_case(Value::from(0x1_0000_0000i64), NUMBER_INT64 | NUMBER_UINT64 ; "above u32")]
    #[test_case(Value::from(1u64 << 63), NUMBER_UINT64 ; "above i64")]
    #[test_case(Value::from(i64::MIN), NUMBER_INT64 ; "i64 min")]
    #[test_case(Value::from(1.0), NUMBER_DOUBLE ; "double")]
    fn value_number_flags(v: Value<'static>, flags: NumberFlag) {
        assert_eq!(v.number_flags(), flags);
    }

    // Number Accessor Test
    //
    // Verify integer accessors and the conversion to double.
    #[test]
    fn value_number_access() {
        let v = Value::from(7u64);
        assert_eq!(v.get_int(), 7);
        assert_eq!(v.get_uint(), 7);
        assert_eq!(v.get_int64(), 7);
        assert_eq!(v.get_uint64(), 7);
        assert_eq!(v.get_double(), 7.0);

        let v = Value::from(-3i64);
        assert_eq!(v.get_int(), -3);
        assert_eq!(v.get_int64(), -3);

        let v = Value::from(u64::MAX);
        assert_eq!(v.get_double(), 18446744073709551615.0);
    }

    // Number Equality Test
    //
    // Verify numbers compare as doubles only if either side is a double.
    #[test]
    fn value_number_equality() {
        assert_eq!(Value::from(1u32), Value::from(1.0));
        assert_eq!(Value::from(1i64), Value::from(1u64));
        assert_eq!(Value::from(-1i32), Value::from(-1i64));
        assert_ne!(Value::from(-1i32), Value::from(u64::MAX));
        assert_ne!(Value::from(1u32), Value::from(1.5));
        assert_ne!(Value::from(0u32), Value::Null);
    }

    // Misuse Tests
    //
    // Verify accessors of the wrong kind panic.
    #[test]
    #[should_panic]
    fn value_wrong_accessor() {
        Value::from(true).get_int();
    }

    #[test]
    #[should_panic]
    fn value_narrow_accessor() {
        Value::from(-1i32).get_uint();
    }

    #[test]
    #[should_panic]
    fn value_non_string_name() {
        let mut a = CrtAllocator;
        Value::object().add_member(Value::from(1u32), Value::Null, &mut a);
    }

    #[test]
    #[should_panic]
    fn value_missing_member() {
        let _ = &Value::object()["missing"];
    }

    // String Test
    //
    // Verify referenced and owned strings, embedded NUL and reuse of owned
    // blocks.
    #[test]
    fn value_strings() {
        let mut a = MemoryPoolAllocator::new(1024);
        let text = String::from("ab\0cd");

        let r = Value::string_ref(text.as_bytes());
        assert_eq!(r.get_string(), b"ab\0cd");
        assert!(matches!(r, Value::String(Str::Ref(_))));

        let mut v = Value::string_copy(text.as_bytes(), &mut a);
        assert!(matches!(v, Value::String(Str::Owned(_))));
        assert_eq!(v.get_string().len(), 5);
        assert_eq!(a.size(), 5);
        assert_eq!(v, r);

        v.set_string_copy(b"xyz", &mut a);
        assert_eq!(v.get_str(), Some("xyz"));
        assert_eq!(a.size(), 5);

        v.set_string_copy(b"\xff", &mut a);
        assert_eq!(v.get_str(), None);
    }

    // Member Test
    //
    // Verify lookup, growth and both removal flavors of objects.
    #[test]
    fn value_members() {
        let mut a = CrtAllocator;
        let mut v = Value::object();
        let names = ["a", "b", "c", "d"];

        for (i, name) in names.iter().enumerate() {
            v.add_member(Value::from(*name), Value::from(i as u32), &mut a);
        }
        assert_eq!(v.member_count(), 4);
        assert!(v.member_capacity() >= INITIAL_CAPACITY);
        assert_eq!(v.find_member("c"), Some(2));
        assert_eq!(v.find_member(b"e"), None);
        assert!(v.has_member("d"));
        assert_eq!(v["b"].get_uint(), 1);

        *v.get_member_mut("b").unwrap() = Value::from(true);
        assert!(v["b"].get_bool());
        v["c"].set_null();
        assert!(v.get_member("c").unwrap().is_null());

        assert!(v.remove_member("b"));
        assert!(!v.remove_member("b"));
        let order: alloc::vec::Vec<_> = v.members().map(|m| m.name().get_string()).collect();
        assert_eq!(order, [b"a", b"d", b"c"]);

        assert!(v.erase_member("a"));
        let order: alloc::vec::Vec<_> = v.members().map(|m| m.name().get_string()).collect();
        assert_eq!(order, [b"d", b"c"]);

        let (name, value) = v.erase_member_at(0).into_parts();
        assert_eq!(name.get_string(), b"d");
        assert_eq!(value.get_uint(), 3);

        for m in v.members_mut() {
            m.value_mut().set_int(-1);
        }
        assert_eq!(v["c"].get_int(), -1);

        v.remove_all_members();
        assert_eq!(v.member_count(), 0);
    }

    // Last Member Removal Test
    //
    // Verify removing the final member leaves the order of the others
    // untouched.
    #[test]
    fn value_remove_last_member() {
        let mut a = CrtAllocator;
        let mut v = Value::object();
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            v.add_member(Value::from(*name), Value::from(i as u32), &mut a);
        }

        assert!(v.remove_member("d"));
        assert_eq!(v.member_count(), 3);
        let order: alloc::vec::Vec<_> = v.members().map(|m| m.name().get_string()).collect();
        assert_eq!(order, [b"a", b"b", b"c"]);

        let (name, value) = v.remove_member_at(2).into_parts();
        assert_eq!(name.get_string(), b"c");
        assert_eq!(value.get_uint(), 2);
        assert_eq!(v.member_count(), 2);
        assert_eq!(v["a"].get_uint(), 0);
        assert_eq!(v["b"].get_uint(), 1);
    }

    // Growth Test
    //
    // Verify containers double their capacity.
    #[test]
    fn value_growth() {
        let mut a = CrtAllocator;
        let mut v = Value::array();
        for i in 0..INITIAL_CAPACITY {
            v.push_back(Value::from(i as u32), &mut a);
        }
        assert_eq!(v.len(), INITIAL_CAPACITY);
        assert!(v.capacity() >= INITIAL_CAPACITY);

        v.push_back(Value::Null, &mut a);
        assert!(v.capacity() >= 2 * INITIAL_CAPACITY);

        let mut w = Value::array();
        w.reserve(100, &mut a);
        assert!(w.capacity() >= 100);
    }

    // Array Test
    //
    // Verify element access and removal.
    #[test]
    fn value_elements() {
        let mut a = CrtAllocator;
        let mut v = Value::array();
        for i in 0..5u32 {
            v.push_back(Value::from(i), &mut a);
        }

        assert_eq!(v[4].get_uint(), 4);
        assert!(v.get(5).is_none());
        assert_eq!(v.pop_back().map(|v| v.get_uint()), Some(4));
        assert_eq!(v.erase(1).get_uint(), 1);
        let values: alloc::vec::Vec<_> = v.elements().map(|v| v.get_uint()).collect();
        assert_eq!(values, [0, 2, 3]);

        v[0].set_bool(true);
        for e in v.elements_mut().skip(1) {
            e.set_null();
        }
        assert_eq!(write(&v), "[true,null,null]");

        let capacity = v.capacity();
        v.clear();
        assert!(v.is_empty());
        assert_eq!(v.capacity(), capacity);
    }

    // Move Test
    //
    // Verify moving values out leaves `Null` behind.
    #[test]
    fn value_move() {
        let mut a = CrtAllocator;
        let mut v = sample(&mut a);
        let mut list = v["list"].take();
        assert!(v["list"].is_null());
        assert_eq!(list.len(), 3);

        let mut other = Value::from(1u32);
        other.swap(&mut list);
        assert!(list.is_number());
        assert!(other.is_array());
    }

    // Deep Copy Test
    //
    // Verify copies are independent of their source and equal to it.
    #[test]
    fn value_copy() {
        let mut a = CrtAllocator;
        let src = sample(&mut a);

        let mut pool = MemoryPoolAllocator::default();
        let mut copy = Value::from(false);
        copy.copy_from(&src, &mut pool);
        assert_eq!(copy, src);
        assert!(pool.size() > 0);

        copy["list"][0].set_uint(9);
        copy["name"].set_string_copy(b"json", &mut pool);
        assert_ne!(copy, src);
        assert_eq!(src["list"][0].get_uint(), 1);
        assert_eq!(src["name"].get_str(), Some("osi"));
    }

    // Structural Equality Test
    //
    // Verify objects compare irrespective of member order.
    #[test]
    fn value_equality() {
        let mut a = CrtAllocator;
        let mut x = Value::object();
        x.add_member(Value::from("a"), Value::from(1u32), &mut a)
            .add_member(Value::from("b"), Value::from("s"), &mut a);
        let mut y = Value::object();
        y.add_member(Value::string_copy(b"b", &mut a), Value::string_copy(b"s", &mut a), &mut a)
            .add_member(Value::from("a"), Value::from(1.0), &mut a);
        assert_eq!(x, y);

        y.add_member(Value::from("c"), Value::Null, &mut a);
        assert_ne!(x, y);

        let mut p = Value::array();
        p.push_back(Value::from(1u32), &mut a).push_back(Value::from(2u32), &mut a);
        let mut q = Value::array();
        q.push_back(Value::from(2u32), &mut a).push_back(Value::from(1u32), &mut a);
        assert_ne!(p, q);
    }

    // Duplicate Name Equality Test
    //
    // Verify equality stays symmetric and reflexive if an object repeats
    // a name, pairing repeated names in order.
    #[test]
    fn value_equality_duplicates() {
        let mut a = CrtAllocator;
        let mut x = Value::object();
        x.add_member(Value::from("a"), Value::from(1u32), &mut a)
            .add_member(Value::from("a"), Value::from(2u32), &mut a);
        let mut y = Value::object();
        y.add_member(Value::from("a"), Value::from(1u32), &mut a)
            .add_member(Value::from("b"), Value::from(2u32), &mut a);
        assert_ne!(x, y);
        assert_ne!(y, x);

        let mut z = Value::object();
        z.add_member(Value::from("a"), Value::from(1u32), &mut a)
            .add_member(Value::from("a"), Value::from(1u32), &mut a);
        assert_ne!(x, z);
        assert_ne!(z, x);

        let mut w = Value::object();
        w.add_member(Value::from("a"), Value::from(1u32), &mut a)
            .add_member(Value::from("c"), Value::Null, &mut a)
            .add_member(Value::from("a"), Value::from(2u32), &mut a);
        x.add_member(Value::from("c"), Value::Null, &mut a);
        assert_eq!(x, w);
        assert_eq!(w, x);
        assert_eq!(x, x);
    }

    // Integer Event Test
    //
    // Verify integers are reported through the narrowest event, preferring
    // signed events for values that fit both.
    #[test_case(Value::from(5u32), "int 5")]
    #[test_case(Value::from(-5i32), "int -5")]
    #[test_case(Value::from(u32::MAX), "uint 4294967295")]
    #[test_case(Value::from(1u64 << 40), "int64 1099511627776")]
    #[test_case(Value::from(i64::MIN), "int64 -9223372036854775808")]
    #[test_case(Value::from(u64::MAX), "uint64 18446744073709551615")]
    fn value_accept_integers(v: Value<'static>, expect: &str) {
        let mut got = String::new();
        let mut h = EventFn(|e: Event<'_, '_, u8>| {
            got = match e {
                Event::Int(v) => alloc::format!("int {}", v),
                Event::Uint(v) => alloc::format!("uint {}", v),
                Event::Int64(v) => alloc::format!("int64 {}", v),
                Event::Uint64(v) => alloc::format!("uint64 {}", v),
                _ => String::from("other"),
            };
            core::ops::ControlFlow::Continue(())
        });
        assert!(v.accept(&mut h));
        drop(h);
        assert_eq!(got, expect);
    }

    // Traversal Test
    //
    // Verify a tree is reported in member order and that refusals stop the
    // traversal.
    #[test]
    fn value_accept() {
        let mut a = CrtAllocator;
        let mut v = sample(&mut a);
        v.add_member(Value::from("big"), Value::from(u64::MAX), &mut a)
            .add_member(Value::from("neg"), Value::from(i64::MIN), &mut a);

        assert_eq!(
            write(&v),
            r#"{"name":"osi","list":[1,-2,0.5],"flag":true,"none":null,"big":18446744073709551615,"neg":-9223372036854775808}"#,
        );

        let mut events = 0;
        let mut h = EventFn(|_: Event<'_, '_, u8>| {
            events += 1;
            match events {
                4 => core::ops::ControlFlow::Break(()),
                _ => core::ops::ControlFlow::Continue(()),
            }
        });
        assert!(!v.accept(&mut h));
        assert_eq!(events, 4);
    }

    // Release Test
    //
    // Verify releasing hands owned strings back and resets the value.
    #[test]
    fn value_release() {
        let mut pool = MemoryPoolAllocator::default();
        let mut v = sample(&mut pool);
        let size = pool.size();
        v.release(&mut pool);
        assert!(v.is_null());
        assert_eq!(pool.size(), size);

        let mut a = CrtAllocator;
        let mut v = sample(&mut a);
        v.release(&mut a);
        assert!(v.is_null());
    }
}
