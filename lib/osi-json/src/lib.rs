//! # Standalone JSON Streaming Engine
//!
//! This crate implements an event-driven JSON reader and writer. The
//! reader consumes JSON text from an input stream and reports its
//! structure as a sequence of events to a `Handler`. The writer is a
//! `Handler` itself, which serializes the events it receives as minified
//! JSON text. Both are generic over the encodings of their source and
//! target, and transcode between them on the fly.
//!
//! The reader either recurses along the nesting of the document, or runs
//! an explicit state machine that can be stepped one event at a time and
//! handles arbitrarily deep documents.
//!
//! ## Compatibility
//!
//! RFC 8259 is quite lenient regarding allowed escape sequences in JSON
//! Strings. Effectively, JSON Strings can encode data that cannot be
//! represented in `UTF-8` or `UTF-16` (in particular, it allows unpaired
//! Unicode Surrogates). Fortunately, the RFC notes that implementations are
//! free to reject any such input [^rfc_surrogate]. This
//! crate opts to do so and rejects any JSON Strings that encode anything but
//! valid Unicode Scalar Values [^unicode_scalar].
//!
//! Any value is accepted as document root, unless the legacy behavior of
//! requiring an object or array is requested.
//!
//! [^unicode_scalar]: <https://www.unicode.org/glossary/#unicode_scalar_value>
//! [^rfc_surrogate]: <https://datatracker.ietf.org/doc/html/rfc8259#section-8.2>

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;
extern crate core;

pub mod encoding;
pub mod error;
pub mod handler;
pub mod num;
pub mod reader;
pub mod stream;
pub mod token;
pub mod writer;
