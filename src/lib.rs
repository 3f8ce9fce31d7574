//! # JSON Document Object Model
//!
//! This crate provides an in-memory tree of JSON values on top of the
//! streaming engine of `osi-json`. Documents are built by handing a
//! `Document` to the reader as handler, and serialized by traversing a
//! tree into a writer.
//!
//! The streaming engine is re-exported as `json`.

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;
extern crate core;

pub use osi_json as json;

pub mod allocator;
pub mod document;
pub mod value;

pub use document::Document;
pub use value::{Kind, Member, Value};
