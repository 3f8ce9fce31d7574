//! # Numeric Conversions
//!
//! Conversions between decimal text and machine numbers, as needed by the
//! reader and writer. Parsing decimals into doubles comes in a fast,
//! slightly inexact flavor and a correctly rounded flavor backed by
//! arbitrary-precision integers.

pub mod bigint;
pub mod dtoa;
pub mod pow10;
pub mod strtod;
