//! # Streaming Reader
//!
//! The reader parses JSON text from an input stream and reports its
//! structure as events to a `Handler`. Nothing is materialized by the
//! reader itself, apart from a scratch buffer for decoded strings.
//!
//! Parsing either happens recursively, with one native call frame per
//! nested container, or iteratively, driven by the explicit state machine
//! of `crate::token`. Both modes accept the same language and report the
//! same events and errors. The iterative mode can also be stepped manually
//! via `Reader::iterative_next()`.
//!
//! Any error stops the parse right away. No event is reported after an
//! error was detected, and handlers can abort a parse at any event by
//! returning `false`.

use crate::encoding::{Char, Encoding, Transcoder, Utf8};
use crate::error::{ParseError, ParseErrorCode};
use crate::handler::{Handler, Text};
use crate::num::strtod;
use crate::stream::{InputStream, Units};
use crate::token::{self, State, Token};

/// ## Reader Flags
///
/// A set of flags that modify the behavior of a single parse. Flags can be
/// combined with `|` and are passed to every parse call.
pub type Flag = u32;

/// ## Default Behavior
///
/// Recursive parsing, unvalidated input, a single root value of any kind
/// that must be followed by nothing but whitespace.
pub const FLAG_DEFAULT: Flag =              0x00000000;

/// ## Decode In Place
///
/// Decode strings back into the input buffer and report them as
/// references into it. Requires a stream that supports in-place decoding
/// with byte-wide code units on both sides. Other streams silently fall
/// back to decoding into a scratch buffer.
pub const FLAG_IN_PLACE: Flag =             0x00000001;

/// ## Validate Encoding
///
/// Validate the encoding of string content, even if source and target
/// encoding are identical.
pub const FLAG_VALIDATE_ENCODING: Flag =    0x00000002;

/// ## Iterative Parsing
///
/// Drive the grammar with an explicit state machine rather than native
/// recursion. Nesting depth is then only bound by memory.
pub const FLAG_ITERATIVE: Flag =            0x00000004;

/// ## Stop When Done
///
/// Stop right after the root value, without checking that the rest of the
/// input is empty. Allows parsing concatenated documents from a single
/// stream.
pub const FLAG_STOP_WHEN_DONE: Flag =       0x00000008;

/// ## Full Precision
///
/// Convert decimals to correctly rounded doubles. Without this flag,
/// doubles can be off by a few ULPs.
pub const FLAG_FULL_PRECISION: Flag =       0x00000010;

/// ## Strict Root
///
/// Reject documents whose root is neither an object nor an array.
pub const FLAG_STRICT_ROOT: Flag =          0x00000020;

// Significant digits retained for full-precision conversions.
const MAX_DIGITS: usize = 780;
// Exponents beyond this are out of range in every conversion.
const MAX_EXPONENT: i32 = 100_000;

// Open container of the iterative parser.
#[derive(Clone, Copy, Debug)]
struct Frame {
    object: bool,
    count: usize,
}

// Digits of a number that does not fit into a 64-bit integer. `mantissa`
// holds up to 19 leading significant digits scaled by `10^exp`, `digits`
// up to `MAX_DIGITS` of them scaled by `10^digits_exp`.
#[derive(Default)]
struct Decimal {
    mantissa: u64,
    significant: usize,
    exp: i32,
    digits_exp: i32,
}

/// ## Streaming Reader
///
/// Parses JSON text encoded in `SE` and reports strings encoded in `TE`.
/// A reader can be used for any number of parses. It retains its internal
/// buffers between parses, and remembers the error of the last one.
#[derive(Debug)]
pub struct Reader<SE: Encoding = Utf8, TE: Encoding = Utf8> {
    scratch: alloc::vec::Vec<TE::Ch>,
    digits: alloc::vec::Vec<u8>,
    frames: alloc::vec::Vec<Frame>,
    state: State,
    error: Option<ParseError>,
    _encodings: core::marker::PhantomData<SE>,
}

// Yield the next code unit as ASCII character. Anything beyond ASCII is
// reported as `0xff`, which is never significant to the grammar.
fn peek<'src, I: InputStream<'src>>(is: &I) -> Option<u8> {
    is.peek().map(|c| match c.to_u32() {
        v @ 0..=0x7f => v as u8,
        _ => 0xff,
    })
}

fn skip_whitespace<'src, I: InputStream<'src>>(is: &mut I) {
    while let Some(b' ' | b'\t' | b'\r' | b'\n') = peek(is) {
        is.take();
    }
}

fn raise<T>(code: ParseErrorCode, offset: usize) -> Result<T, ParseError> {
    Err(ParseError::new(code, offset))
}

// Turn a handler refusal into an error at the start of the refused token.
fn check(accepted: bool, offset: usize) -> Result<(), ParseError> {
    if accepted {
        Ok(())
    } else {
        tracing::debug!(offset = offset, "handler requested termination");
        raise(ParseErrorCode::Termination, offset)
    }
}

fn parse_hex4<'src, I: InputStream<'src>>(is: &mut I) -> Result<u32, ParseError> {
    let mut v = 0u32;
    for _ in 0..4 {
        let d = match peek(is) {
            Some(c @ b'0'..=b'9') => c - b'0',
            Some(c @ b'a'..=b'f') => c - b'a' + 10,
            Some(c @ b'A'..=b'F') => c - b'A' + 10,
            _ => return raise(ParseErrorCode::StringUnicodeEscapeInvalidHex, is.tell()),
        };
        is.take();
        v = (v << 4) | d as u32;
    }
    Ok(v)
}

impl<SE: Encoding, TE: Encoding> Reader<SE, TE> {
    /// ## Create Reader
    pub fn new() -> Self {
        Self {
            scratch: alloc::vec::Vec::new(),
            digits: alloc::vec::Vec::new(),
            frames: alloc::vec::Vec::new(),
            state: State::Start,
            error: None,
            _encodings: core::marker::PhantomData,
        }
    }

    /// ## Last Error
    ///
    /// Yield the error of the last parse, or `None` if it succeeded. The
    /// error is cleared whenever a new parse starts.
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    fn record(&mut self, e: ParseError) {
        tracing::debug!(code = ?e.code(), offset = e.offset(), "parse failed");
        self.error = Some(e);
    }

    /// ## Parse Document
    ///
    /// Parse a single JSON document from `is` and report it to `handler`.
    /// Yields the error that stopped the parse, if any. On error, the
    /// stream is left at an unspecified position.
    pub fn parse<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
    ) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        self.error = None;
        tracing::trace!(flags = flags, iterative = flags & FLAG_ITERATIVE != 0, "parse");

        if flags & FLAG_ITERATIVE != 0 {
            self.iterative_init();
            while self.iterative_next(flags, is, handler) {}
            return match self.error {
                Some(e) => Err(e),
                None => Ok(()),
            };
        }

        let r = self.parse_document(flags, is, handler);
        if let Err(e) = r {
            self.record(e);
        }
        r
    }

    fn parse_document<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
    ) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        skip_whitespace(is);

        match peek(is) {
            None => return raise(ParseErrorCode::DocumentEmpty, is.tell()),
            Some(b'{' | b'[') => {},
            Some(_) if flags & FLAG_STRICT_ROOT != 0 => {
                return raise(ParseErrorCode::DocumentRootNotObjectOrArray, is.tell());
            },
            Some(_) => {},
        }

        self.parse_value(flags, is, handler)?;

        if flags & FLAG_STOP_WHEN_DONE == 0 {
            skip_whitespace(is);
            if peek(is).is_some() {
                return raise(ParseErrorCode::DocumentRootNotSingular, is.tell());
            }
        }

        Ok(())
    }

    fn parse_value<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
    ) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        match peek(is) {
            Some(b'{') => self.parse_object(flags, is, handler),
            Some(b'[') => self.parse_array(flags, is, handler),
            _ => self.parse_scalar(flags, is, handler, false),
        }
    }

    fn parse_scalar<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
        key: bool,
    ) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        let start = is.tell();
        match peek(is) {
            Some(b'"') => self.parse_string(flags, is, handler, key),
            Some(b'n') => {
                Self::parse_literal(is, b"null")?;
                check(handler.null(), start)
            },
            Some(b't') => {
                Self::parse_literal(is, b"true")?;
                check(handler.bool(true), start)
            },
            Some(b'f') => {
                Self::parse_literal(is, b"false")?;
                check(handler.bool(false), start)
            },
            _ => self.parse_number(flags, is, handler),
        }
    }

    fn parse_literal<'src, I>(is: &mut I, word: &[u8]) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
    {
        for c in word {
            if peek(is) != Some(*c) {
                return raise(ParseErrorCode::ValueInvalid, is.tell());
            }
            is.take();
        }
        Ok(())
    }

    fn parse_object<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
    ) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        let start = is.tell();
        is.take();
        check(handler.start_object(), start)?;

        skip_whitespace(is);
        if peek(is) == Some(b'}') {
            let at = is.tell();
            is.take();
            return check(handler.end_object(0), at);
        }

        let mut members = 0;
        loop {
            if peek(is) != Some(b'"') {
                return raise(ParseErrorCode::ObjectMissName, is.tell());
            }
            self.parse_string(flags, is, handler, true)?;

            skip_whitespace(is);
            if peek(is) != Some(b':') {
                return raise(ParseErrorCode::ObjectMissColon, is.tell());
            }
            is.take();

            skip_whitespace(is);
            self.parse_value(flags, is, handler)?;
            members += 1;

            skip_whitespace(is);
            match peek(is) {
                Some(b',') => {
                    is.take();
                    skip_whitespace(is);
                },
                Some(b'}') => {
                    let at = is.tell();
                    is.take();
                    return check(handler.end_object(members), at);
                },
                _ => return raise(ParseErrorCode::ObjectMissCommaOrCurlyBracket, is.tell()),
            }
        }
    }

    fn parse_array<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
    ) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        let start = is.tell();
        is.take();
        check(handler.start_array(), start)?;

        skip_whitespace(is);
        if peek(is) == Some(b']') {
            let at = is.tell();
            is.take();
            return check(handler.end_array(0), at);
        }

        let mut elements = 0;
        loop {
            self.parse_value(flags, is, handler)?;
            elements += 1;

            skip_whitespace(is);
            match peek(is) {
                Some(b',') => {
                    is.take();
                    skip_whitespace(is);
                },
                Some(b']') => {
                    let at = is.tell();
                    is.take();
                    return check(handler.end_array(elements), at);
                },
                _ => return raise(ParseErrorCode::ArrayMissCommaOrSquareBracket, is.tell()),
            }
        }
    }

    // Append decoded code units to the current string.
    fn commit<'src, I: InputStream<'src>>(
        &mut self,
        in_place: bool,
        is: &mut I,
        units: &[TE::Ch],
    ) {
        if in_place {
            for c in units {
                is.put_in_place(*c);
            }
        } else {
            self.scratch.extend_from_slice(units);
        }
    }

    fn parse_escape<'src, I>(is: &mut I, at: usize) -> Result<u32, ParseError>
    where
        I: InputStream<'src>,
    {
        let cp = match peek(is) {
            Some(b'"') => 0x22,
            Some(b'\\') => 0x5c,
            Some(b'/') => 0x2f,
            Some(b'b') => 0x08,
            Some(b'f') => 0x0c,
            Some(b'n') => 0x0a,
            Some(b'r') => 0x0d,
            Some(b't') => 0x09,
            Some(b'u') => {
                is.take();
                let lead = parse_hex4(is)?;
                return match lead {
                    0xd800..=0xdbff => {
                        if peek(is) != Some(b'\\') {
                            return raise(ParseErrorCode::StringUnicodeSurrogateInvalid, at);
                        }
                        is.take();
                        if peek(is) != Some(b'u') {
                            return raise(ParseErrorCode::StringUnicodeSurrogateInvalid, at);
                        }
                        is.take();
                        match parse_hex4(is)? {
                            trail @ 0xdc00..=0xdfff => {
                                Ok(0x10000 + ((lead - 0xd800) << 10) + (trail - 0xdc00))
                            },
                            _ => raise(ParseErrorCode::StringUnicodeSurrogateInvalid, at),
                        }
                    },
                    0xdc00..=0xdfff => raise(ParseErrorCode::StringUnicodeSurrogateInvalid, at),
                    v => Ok(v),
                };
            },
            _ => return raise(ParseErrorCode::StringEscapeInvalid, at),
        };

        is.take();
        Ok(cp)
    }

    fn parse_string<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
        key: bool,
    ) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        let start = is.tell();
        let in_place = flags & FLAG_IN_PLACE != 0
            && <SE::Ch as Char>::WIDTH == 1
            && is.begin_in_place::<TE::Ch>();

        is.take();
        self.scratch.clear();

        loop {
            let at = is.tell();
            let mut units = Units::<TE::Ch>::default();

            match peek(is) {
                None => return raise(ParseErrorCode::StringMissQuotationMark, at),
                Some(b'"') => {
                    is.take();
                    break;
                },
                Some(b'\\') => {
                    is.take();
                    let cp = Self::parse_escape(is, at)?;
                    if !TE::SUPPORT_UNICODE && cp > 0x7f {
                        return raise(ParseErrorCode::StringInvalidEncoding, at);
                    }
                    TE::encode(&mut units, cp);
                },
                Some(0x00..=0x1f) => return raise(ParseErrorCode::StringEscapeInvalid, at),
                Some(_) => {
                    let ok = if flags & FLAG_VALIDATE_ENCODING != 0 {
                        Transcoder::<SE, TE>::validate(is, &mut units)
                    } else {
                        Transcoder::<SE, TE>::transcode(is, &mut units)
                    };
                    if !ok {
                        return raise(ParseErrorCode::StringInvalidEncoding, at);
                    }
                },
            }

            self.commit(in_place, is, units.as_slice());
        }

        let accepted = if in_place {
            let v = Text::Ref(is.end_in_place::<TE::Ch>());
            if key { handler.key(v) } else { handler.string(v) }
        } else {
            let v = Text::Copy(self.scratch.as_slice());
            if key { handler.key(v) } else { handler.string(v) }
        };
        check(accepted, start)
    }

    // Add a significant digit to a number in double mode.
    fn push_digit(&mut self, d: &mut Decimal, c: u8, fraction: bool, full: bool) {
        if d.mantissa == 0 && c == b'0' {
            // Leading zeros only shift the fraction.
            d.exp -= 1;
            d.digits_exp -= 1;
            return;
        }

        if d.significant < 19 {
            d.mantissa = d.mantissa * 10 + (c - b'0') as u64;
            d.significant += 1;
            if fraction {
                d.exp -= 1;
            }
        } else if !fraction {
            d.exp = d.exp.saturating_add(1);
        }

        if full {
            if self.digits.len() < MAX_DIGITS {
                self.digits.push(c);
                if fraction {
                    d.digits_exp -= 1;
                }
            } else if !fraction {
                d.digits_exp = d.digits_exp.saturating_add(1);
            }
        }
    }

    fn parse_number<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
    ) -> Result<(), ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        let start = is.tell();
        let full = flags & FLAG_FULL_PRECISION != 0;

        let minus = peek(is) == Some(b'-');
        if minus {
            is.take();
        }

        // Integer part, accumulated in the narrowest fitting integer. The
        // thresholds allow exactly `i32::MIN`/`u32::MAX` and
        // `i64::MIN`/`u64::MAX` respectively.
        let (limit32, last32) = if minus { (214748364, 8) } else { (429496729, 5) };
        let (limit64, last64) = if minus {
            (922337203685477580, 8)
        } else {
            (1844674407370955161, 5)
        };

        let mut i = 0u64;
        let mut wide = false;
        let mut decimal: Option<Decimal> = None;
        self.digits.clear();

        match peek(is) {
            Some(b'0') => {
                is.take();
            },
            Some(b'1'..=b'9') => {
                while let Some(c @ b'0'..=b'9') = peek(is) {
                    is.take();
                    let v = (c - b'0') as u64;

                    if let Some(d) = decimal.as_mut() {
                        self.push_digit(d, c, false, full);
                        continue;
                    }

                    if !wide && (i > limit32 || (i == limit32 && v > last32)) {
                        wide = true;
                    }
                    if wide && (i > limit64 || (i == limit64 && v > last64)) {
                        let mut d = self.widen(i, full);
                        self.push_digit(&mut d, c, false, full);
                        decimal = Some(d);
                        continue;
                    }

                    i = i * 10 + v;
                }
            },
            _ => return raise(ParseErrorCode::ValueInvalid, is.tell()),
        }

        // Fraction part.
        if peek(is) == Some(b'.') {
            is.take();
            if !matches!(peek(is), Some(b'0'..=b'9')) {
                return raise(ParseErrorCode::NumberMissFraction, is.tell());
            }

            let mut d = match decimal.take() {
                Some(d) => d,
                None => self.widen(i, full),
            };
            while let Some(c @ b'0'..=b'9') = peek(is) {
                is.take();
                self.push_digit(&mut d, c, true, full);
            }
            decimal = Some(d);
        }

        // Exponent part.
        let mut exp = 0i32;
        if let Some(b'e' | b'E') = peek(is) {
            is.take();
            if decimal.is_none() {
                decimal = Some(self.widen(i, full));
            }

            let negative = match peek(is) {
                Some(b'-') => {
                    is.take();
                    true
                },
                Some(b'+') => {
                    is.take();
                    false
                },
                _ => false,
            };

            if !matches!(peek(is), Some(b'0'..=b'9')) {
                return raise(ParseErrorCode::NumberMissExponent, is.tell());
            }
            while let Some(c @ b'0'..=b'9') = peek(is) {
                is.take();
                if exp < MAX_EXPONENT {
                    exp = exp * 10 + (c - b'0') as i32;
                }
            }
            if negative {
                exp = -exp;
            }
        }

        let accepted = match decimal {
            None if !wide => {
                if minus {
                    handler.int((i as u32 as i32).wrapping_neg())
                } else {
                    handler.uint(i as u32)
                }
            },
            None => {
                if minus {
                    handler.int64(0i64.wrapping_sub(i as i64))
                } else {
                    handler.uint64(i)
                }
            },
            Some(d) => {
                let v = if full {
                    strtod::full_precision(&self.digits, d.digits_exp.saturating_add(exp))
                } else {
                    strtod::normal_precision(d.mantissa as f64, d.exp.saturating_add(exp))
                };
                if v.is_infinite() {
                    return raise(ParseErrorCode::NumberTooBig, start);
                }
                handler.double(if minus { -v } else { v })
            },
        };

        check(accepted, start)
    }

    // Switch a number to double mode, carrying over the integer digits
    // accumulated so far.
    fn widen(&mut self, i: u64, full: bool) -> Decimal {
        let mut d = Decimal::default();
        if i > 0 {
            let mut b = itoa::Buffer::new();
            let v = b.format(i).as_bytes();
            d.mantissa = i;
            d.significant = v.len();
            if full {
                self.digits.extend_from_slice(v);
            }
        }
        d
    }

    /// ## Initialize Iterative Parsing
    ///
    /// Reset the reader for a new document parsed with
    /// `Self::iterative_next()`.
    pub fn iterative_init(&mut self) {
        self.frames.clear();
        self.state = State::Start;
        self.error = None;
    }

    /// ## Iterative Parsing Completed
    ///
    /// Check whether iterative parsing has finished, either successfully
    /// or with an error.
    pub fn iterative_complete(&self) -> bool {
        matches!(self.state, State::Finish | State::Error)
    }

    fn fail(&mut self, e: ParseError) -> bool {
        self.state = State::Error;
        self.record(e);
        false
    }

    /// ## Parse Next Token
    ///
    /// Advance iterative parsing by one event. Delimiters are consumed
    /// along the way without reporting anything. Yields `false` once
    /// parsing has finished or failed, in which case `Self::error()` tells
    /// the two apart. The caller must pass the same flags, stream and
    /// handler to every step of a parse.
    pub fn iterative_next<'src, I, H>(
        &mut self,
        flags: Flag,
        is: &mut I,
        handler: &mut H,
    ) -> bool
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        loop {
            match self.state {
                State::Error => return false,
                State::Finish => {
                    if flags & FLAG_STOP_WHEN_DONE == 0 {
                        skip_whitespace(is);
                        if peek(is).is_some() {
                            let e = ParseError::new(
                                ParseErrorCode::DocumentRootNotSingular,
                                is.tell(),
                            );
                            return self.fail(e);
                        }
                    }
                    return false;
                },
                _ => {},
            }

            skip_whitespace(is);
            let at = is.tell();
            let lookahead = peek(is).map(Token::classify);

            if self.state == State::Start
                && flags & FLAG_STRICT_ROOT != 0
                && lookahead.is_some()
                && !matches!(lookahead, Some(Token::LeftBracket | Token::LeftCurlyBracket))
            {
                let e = ParseError::new(ParseErrorCode::DocumentRootNotObjectOrArray, at);
                return self.fail(e);
            }

            let next = match lookahead {
                Some(t) => token::predict(self.state, t),
                None => State::Error,
            };
            if next == State::Error {
                let e = ParseError::new(token::error(self.state, lookahead), at);
                return self.fail(e);
            }

            match self.transit(flags, next, at, is, handler) {
                Ok(true) => return true,
                Ok(false) => {},
                Err(e) => return self.fail(e),
            }
        }
    }

    // Count a completed value in the innermost container and yield the
    // state following it.
    fn complete_value(&mut self) -> State {
        match self.frames.last_mut() {
            None => State::Finish,
            Some(f) => {
                f.count += 1;
                if f.object { State::MemberValue } else { State::Element }
            },
        }
    }

    // Perform the action of entering `next`. Yields whether an event was
    // reported.
    fn transit<'src, I, H>(
        &mut self,
        flags: Flag,
        next: State,
        at: usize,
        is: &mut I,
        handler: &mut H,
    ) -> Result<bool, ParseError>
    where
        I: InputStream<'src>,
        H: Handler<'src, TE::Ch>,
    {
        match next {
            State::ObjectInitial | State::ArrayInitial => {
                let object = next == State::ObjectInitial;
                is.take();
                check(
                    if object { handler.start_object() } else { handler.start_array() },
                    at,
                )?;
                self.frames.push(Frame { object: object, count: 0 });
                self.state = next;
            },
            State::ObjectFinish | State::ArrayFinish => {
                is.take();
                let count = self.frames.pop().map_or(0, |f| f.count);
                check(
                    if next == State::ObjectFinish {
                        handler.end_object(count)
                    } else {
                        handler.end_array(count)
                    },
                    at,
                )?;
                self.state = self.complete_value();
            },
            State::MemberKey => {
                self.parse_string(flags, is, handler, true)?;
                self.state = next;
            },
            State::KeyValueDelimiter | State::MemberDelimiter | State::ElementDelimiter => {
                is.take();
                self.state = next;
                return Ok(false);
            },
            _ => {
                self.parse_scalar(flags, is, handler, false)?;
                self.state = self.complete_value();
            },
        }

        Ok(true)
    }
}

impl<SE: Encoding, TE: Encoding> Default for Reader<SE, TE> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Ascii, AutoUtf, Utf16, Utf16Le};
    use crate::handler::{Event, EventFn};
    use crate::stream::{AutoUtfInputStream, EncodedInputStream, InsituStringStream, StringStream};
    use alloc::{format, string::String, vec::Vec};
    use test_case::test_case;

    // Records all events in a textual form.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        refuse: Option<&'static str>,
    }

    impl Recorder {
        fn push(&mut self, v: String) -> bool {
            let ok = self.refuse.map_or(true, |r| !v.starts_with(r));
            self.events.push(v);
            ok
        }
    }

    impl<'src> Handler<'src> for Recorder {
        fn null(&mut self) -> bool { self.push(format!("null")) }
        fn bool(&mut self, v: bool) -> bool { self.push(format!("bool {}", v)) }
        fn int(&mut self, v: i32) -> bool { self.push(format!("int {}", v)) }
        fn uint(&mut self, v: u32) -> bool { self.push(format!("uint {}", v)) }
        fn int64(&mut self, v: i64) -> bool { self.push(format!("int64 {}", v)) }
        fn uint64(&mut self, v: u64) -> bool { self.push(format!("uint64 {}", v)) }
        fn double(&mut self, v: f64) -> bool { self.push(format!("double {:?}", v)) }
        fn string(&mut self, v: Text<'src, '_>) -> bool {
            self.push(format!("string {}", String::from_utf8_lossy(v.as_slice())))
        }
        fn key(&mut self, v: Text<'src, '_>) -> bool {
            self.push(format!("key {}", String::from_utf8_lossy(v.as_slice())))
        }
        fn start_object(&mut self) -> bool { self.push(format!("{{")) }
        fn end_object(&mut self, n: usize) -> bool { self.push(format!("}} {}", n)) }
        fn start_array(&mut self) -> bool { self.push(format!("[")) }
        fn end_array(&mut self, n: usize) -> bool { self.push(format!("] {}", n)) }
    }

    fn events(flags: Flag, input: &str) -> Result<Vec<String>, ParseError> {
        let mut h = Recorder::default();
        let mut is = StringStream::from_str(input);
        Reader::<Utf8, Utf8>::new().parse(flags, &mut is, &mut h)?;
        Ok(h.events)
    }

    fn both(input: &str) -> Result<Vec<String>, ParseError> {
        let recursive = events(FLAG_DEFAULT, input);
        let iterative = events(FLAG_ITERATIVE, input);
        assert_eq!(recursive, iterative, "{}", input);
        recursive
    }

    // Empty Container Test
    //
    // Verify empty containers produce exactly a start and an end event.
    #[test]
    fn reader_empty_containers() {
        assert_eq!(both("{}").unwrap(), ["{", "} 0"]);
        assert_eq!(both("[]").unwrap(), ["[", "] 0"]);
        assert_eq!(both(" [ ] ").unwrap(), ["[", "] 0"]);
    }

    // Document Test
    //
    // Verify a nested document is reported in document order, in both
    // parsing modes.
    #[test]
    fn reader_document() {
        let v = both(r#"{ "a" : [1, -2, 3.5, true, false, null], "b": {"c": "d"}, "e": [] }"#).unwrap();
        assert_eq!(
            v,
            [
                "{",
                "key a",
                "[",
                "uint 1",
                "int -2",
                "double 3.5",
                "bool true",
                "bool false",
                "null",
                "] 6",
                "key b",
                "{",
                "key c",
                "string d",
                "} 1",
                "key e",
                "[",
                "] 0",
                "} 3",
            ],
        );

        assert_eq!(both("\"x\"").unwrap(), ["string x"]);
        assert_eq!(both(" 7 ").unwrap(), ["uint 7"]);
    }

    // Error Test
    //
    // Verify error codes and offsets of malformed input, and that both
    // parsing modes agree on them.
    #[test_case("", ParseErrorCode::DocumentEmpty, 0 ; "empty")]
    #[test_case("  \n", ParseErrorCode::DocumentEmpty, 3 ; "whitespace only")]
    #[test_case("{} x", ParseErrorCode::DocumentRootNotSingular, 3 ; "not singular")]
    #[test_case("[] []", ParseErrorCode::DocumentRootNotSingular, 3 ; "two roots")]
    #[test_case("{1}", ParseErrorCode::ObjectMissName, 1 ; "miss name")]
    #[test_case("{\"a\":1,}", ParseErrorCode::ObjectMissName, 7 ; "trailing member comma")]
    #[test_case("{\"a\" 1}", ParseErrorCode::ObjectMissColon, 5 ; "miss colon")]
    #[test_case("{\"a\":1 \"b\"}", ParseErrorCode::ObjectMissCommaOrCurlyBracket, 7 ; "miss curly")]
    #[test_case("[1 2]", ParseErrorCode::ArrayMissCommaOrSquareBracket, 3 ; "miss comma")]
    #[test_case("[1", ParseErrorCode::ArrayMissCommaOrSquareBracket, 2 ; "unclosed array")]
    #[test_case("[1,]", ParseErrorCode::ValueInvalid, 3 ; "trailing element comma")]
    #[test_case("[,]", ParseErrorCode::ValueInvalid, 1 ; "leading comma")]
    #[test_case("[nulL]", ParseErrorCode::ValueInvalid, 4 ; "literal mismatch")]
    #[test_case("tru", ParseErrorCode::ValueInvalid, 3 ; "literal truncated")]
    #[test_case("x", ParseErrorCode::ValueInvalid, 0 ; "unknown")]
    #[test_case("-", ParseErrorCode::ValueInvalid, 1 ; "lone minus")]
    #[test_case("-a", ParseErrorCode::ValueInvalid, 1 ; "minus letter")]
    #[test_case("1.", ParseErrorCode::NumberMissFraction, 2 ; "miss fraction")]
    #[test_case("1.e5", ParseErrorCode::NumberMissFraction, 2 ; "miss fraction digits")]
    #[test_case("1e", ParseErrorCode::NumberMissExponent, 2 ; "miss exponent")]
    #[test_case("1e+", ParseErrorCode::NumberMissExponent, 3 ; "miss exponent digits")]
    #[test_case("[1e309]", ParseErrorCode::NumberTooBig, 1 ; "too big")]
    #[test_case("-1e400", ParseErrorCode::NumberTooBig, 0 ; "too big negative")]
    #[test_case("\"abc", ParseErrorCode::StringMissQuotationMark, 4 ; "unclosed string")]
    #[test_case("\"\\x\"", ParseErrorCode::StringEscapeInvalid, 1 ; "escape invalid")]
    #[test_case("\"a\tb\"", ParseErrorCode::StringEscapeInvalid, 2 ; "raw control")]
    #[test_case("\"\\u12g4\"", ParseErrorCode::StringUnicodeEscapeInvalidHex, 5 ; "bad hex")]
    #[test_case("\"\\uD800\"", ParseErrorCode::StringUnicodeSurrogateInvalid, 1 ; "lone lead")]
    #[test_case("\"\\uD800\\u0041\"", ParseErrorCode::StringUnicodeSurrogateInvalid, 1 ; "bad trail")]
    #[test_case("\"x\\uDC00\"", ParseErrorCode::StringUnicodeSurrogateInvalid, 2 ; "lone trail")]
    fn reader_errors(input: &str, code: ParseErrorCode, offset: usize) {
        assert_eq!(both(input), Err(ParseError::new(code, offset)));
    }

    // Termination Test
    //
    // Verify a refusing handler aborts the parse at the refused token,
    // and that no events follow.
    #[test]
    fn reader_termination() {
        for flags in [FLAG_DEFAULT, FLAG_ITERATIVE] {
            let mut h = Recorder { refuse: Some("{"), ..Default::default() };
            let mut is = StringStream::from_str("[1, {}]");
            let mut r = Reader::<Utf8, Utf8>::new();
            assert_eq!(
                r.parse(flags, &mut is, &mut h),
                Err(ParseError::new(ParseErrorCode::Termination, 4)),
            );
            assert_eq!(r.error(), Some(ParseError::new(ParseErrorCode::Termination, 4)));
            assert_eq!(h.events, ["[", "uint 1", "{"]);

            let mut is = StringStream::from_str("[]");
            assert!(r.parse(flags, &mut is, &mut Recorder::default()).is_ok());
            assert_eq!(r.error(), None);
        }
    }

    // Number Type Test
    //
    // Verify numbers are reported in the narrowest fitting type.
    #[test_case("0", "uint 0")]
    #[test_case("-0", "int 0")]
    #[test_case("123", "uint 123")]
    #[test_case("-123", "int -123")]
    #[test_case("2147483647", "uint 2147483647")]
    #[test_case("2147483648", "uint 2147483648")]
    #[test_case("-2147483648", "int -2147483648")]
    #[test_case("-2147483649", "int64 -2147483649")]
    #[test_case("4294967295", "uint 4294967295")]
    #[test_case("4294967296", "uint64 4294967296")]
    #[test_case("-9223372036854775808", "int64 -9223372036854775808")]
    #[test_case("-9223372036854775809", "double -9.223372036854776e18")]
    #[test_case("18446744073709551615", "uint64 18446744073709551615")]
    #[test_case("18446744073709551616", "double 1.8446744073709552e19")]
    #[test_case("-0.0", "double -0.0")]
    #[test_case("1.5", "double 1.5")]
    #[test_case("1E2", "double 100.0")]
    #[test_case("25e-1", "double 2.5")]
    #[test_case("0.000001", "double 1e-6")]
    #[test_case("1e-400", "double 0.0")]
    fn reader_numbers(input: &str, expect: &str) {
        assert_eq!(both(input).unwrap(), [expect]);
    }

    // Precision Test
    //
    // Verify full-precision parsing is bit-exact against an independent
    // parser on hard cases, including long inputs.
    #[test]
    fn reader_full_precision() {
        let mut long = String::from("0.");
        long.extend(core::iter::repeat('0').take(300));
        long.push_str("1234567890123456789012345678901234567890e-8");

        for v in [
            "2.2250738585072011e-308",
            "2.2250738585072012e-308",
            "4.9406564584124654e-324",
            "1.7976931348623157e308",
            "1.7864e-45",
            "0.1",
            "123456789012345678901234567890",
            "3.14159265358979323846264338327950288",
            "9007199254740993.0",
            "0.12345678901234567890123456",
            "1.2345678901234567890123456789012345678901234567890123e-10",
            long.as_str(),
        ] {
            let mut got = None;
            let mut h = EventFn(|e: Event<'_, '_>| {
                if let Event::Double(v) = e {
                    got = Some(v);
                }
                core::ops::ControlFlow::Continue(())
            });
            let mut is = StringStream::from_str(v);
            Reader::<Utf8, Utf8>::new()
                .parse(FLAG_FULL_PRECISION, &mut is, &mut h)
                .unwrap();
            drop(h);

            let expect: f64 = serde_json::from_str(v).unwrap();
            assert_eq!(got.map(f64::to_bits), Some(expect.to_bits()), "{}", v);
            assert_eq!(got.map(f64::to_bits), v.parse::<f64>().ok().map(f64::to_bits));
        }
    }

    // Unicode Escape Test
    //
    // Verify surrogate pairs are combined and encoded into the target.
    #[test]
    fn reader_surrogates() {
        let mut got = Vec::new();
        let mut h = EventFn(|e: Event<'_, '_>| {
            if let Event::String(v) = e {
                got.extend_from_slice(v.as_slice());
            }
            core::ops::ControlFlow::Continue(())
        });
        let mut is = StringStream::from_str(r#""\uD834\uDD1E\u00e9\n""#);
        Reader::<Utf8, Utf8>::new().parse(FLAG_DEFAULT, &mut is, &mut h).unwrap();
        drop(h);
        assert_eq!(got, [0xf0, 0x9d, 0x84, 0x9e, 0xc3, 0xa9, 0x0a]);

        let mut got = Vec::new();
        let mut h = EventFn(|e: Event<'_, '_, u16>| {
            if let Event::String(v) = e {
                got.extend_from_slice(v.as_slice());
            }
            core::ops::ControlFlow::Continue(())
        });
        let mut is = StringStream::from_str("\"\\uD834\\uDD1E\u{e9}\"");
        Reader::<Utf8, Utf16>::new().parse(FLAG_DEFAULT, &mut is, &mut h).unwrap();
        drop(h);
        assert_eq!(got, [0xd834, 0xdd1e, 0xe9]);
    }

    // Encoding Validation Test
    //
    // Verify invalid UTF-8 is only rejected when validation is requested,
    // and non-ASCII is rejected for ASCII targets.
    #[test]
    fn reader_validation() {
        let input = b"\"a\xc0\x80\"";

        let mut is = StringStream::new(&input[..]);
        let r = Reader::<Utf8, Utf8>::new().parse(FLAG_DEFAULT, &mut is, &mut Recorder::default());
        assert!(r.is_ok());

        for flags in [FLAG_VALIDATE_ENCODING, FLAG_VALIDATE_ENCODING | FLAG_ITERATIVE] {
            let mut is = StringStream::new(&input[..]);
            let r = Reader::<Utf8, Utf8>::new().parse(flags, &mut is, &mut Recorder::default());
            assert_eq!(r, Err(ParseError::new(ParseErrorCode::StringInvalidEncoding, 2)));
        }

        let mut is = StringStream::from_str("\"\u{e9}\"");
        let r = Reader::<Utf8, Ascii>::new().parse(FLAG_DEFAULT, &mut is, &mut Recorder::default());
        assert_eq!(r, Err(ParseError::new(ParseErrorCode::StringInvalidEncoding, 1)));

        let mut is = StringStream::from_str("\"\\u00e9\"");
        let r = Reader::<Utf8, Ascii>::new().parse(FLAG_DEFAULT, &mut is, &mut Recorder::default());
        assert_eq!(r, Err(ParseError::new(ParseErrorCode::StringInvalidEncoding, 1)));
    }

    // In-Place Test
    //
    // Verify strings are decoded into the input buffer and reported as
    // references into it.
    #[test]
    fn reader_in_place() {
        for flags in [FLAG_IN_PLACE, FLAG_IN_PLACE | FLAG_ITERATIVE] {
            let mut buf = Vec::from(&br#"{"k\n": ["a\"b", "\u00e9"]}"#[..]);
            let mut strings: Vec<(bool, Vec<u8>)> = Vec::new();
            {
                let mut h = EventFn(|e: Event<'_, '_>| {
                    match e {
                        Event::Key(v) | Event::String(v) => {
                            strings.push((v.is_copy(), v.as_slice().to_vec()));
                        },
                        _ => {},
                    }
                    core::ops::ControlFlow::Continue(())
                });
                let mut is = InsituStringStream::new(&mut buf);
                Reader::<Utf8, Utf8>::new().parse(flags, &mut is, &mut h).unwrap();
            }

            assert_eq!(
                strings,
                [
                    (false, b"k\n".to_vec()),
                    (false, b"a\"b".to_vec()),
                    (false, "\u{e9}".as_bytes().to_vec()),
                ],
            );
        }
    }

    // Stop When Done Test
    //
    // Verify concatenated documents can be parsed one after another.
    #[test]
    fn reader_stop_when_done() {
        for flags in [FLAG_STOP_WHEN_DONE, FLAG_STOP_WHEN_DONE | FLAG_ITERATIVE] {
            let mut r = Reader::<Utf8, Utf8>::new();
            let mut is = StringStream::from_str("[1] {\"a\":2} 3");

            let mut h = Recorder::default();
            r.parse(flags, &mut is, &mut h).unwrap();
            r.parse(flags, &mut is, &mut h).unwrap();
            r.parse(flags, &mut is, &mut h).unwrap();
            assert_eq!(h.events, ["[", "uint 1", "] 1", "{", "key a", "uint 2", "} 1", "uint 3"]);

            assert_eq!(
                r.parse(flags, &mut is, &mut h),
                Err(ParseError::new(ParseErrorCode::DocumentEmpty, 13)),
            );
        }
    }

    // Strict Root Test
    //
    // Verify scalar roots are rejected in strict mode.
    #[test]
    fn reader_strict_root() {
        for flags in [FLAG_STRICT_ROOT, FLAG_STRICT_ROOT | FLAG_ITERATIVE] {
            assert_eq!(
                events(flags, " 1"),
                Err(ParseError::new(ParseErrorCode::DocumentRootNotObjectOrArray, 1)),
            );
            assert_eq!(events(flags, "[1]").unwrap(), ["[", "uint 1", "] 1"]);
            assert_eq!(
                events(flags, ""),
                Err(ParseError::new(ParseErrorCode::DocumentEmpty, 0)),
            );
        }
    }

    // Iterative Stepping Test
    //
    // Verify each step reports a single event, and completion is tracked.
    #[test]
    fn reader_iterative_steps() {
        let mut r = Reader::<Utf8, Utf8>::new();
        let mut h = Recorder::default();
        let mut is = StringStream::from_str("[1, {\"a\": null}]");

        r.iterative_init();
        let mut steps = 0;
        while r.iterative_next(FLAG_DEFAULT, &mut is, &mut h) {
            steps += 1;
            assert_eq!(h.events.len(), steps);
        }

        assert_eq!(steps, 7);
        assert!(r.iterative_complete());
        assert_eq!(r.error(), None);

        r.iterative_init();
        assert!(!r.iterative_complete());
    }

    // Deep Nesting Test
    //
    // Verify the iterative mode copes with nesting that exceeds what is
    // sensible for native recursion.
    #[test]
    fn reader_deep_nesting() {
        let depth = 100_000;
        let mut input = String::new();
        input.extend(core::iter::repeat('[').take(depth));
        input.extend(core::iter::repeat(']').take(depth));

        let mut count = 0usize;
        let mut h = EventFn(|_: Event<'_, '_>| {
            count += 1;
            core::ops::ControlFlow::Continue(())
        });
        let mut is = StringStream::from_str(&input);
        Reader::<Utf8, Utf8>::new().parse(FLAG_ITERATIVE, &mut is, &mut h).unwrap();
        drop(h);
        assert_eq!(count, 2 * depth);
    }

    // Encoded Input Test
    //
    // Verify documents in UTF-16 are parsed through encoded and detecting
    // streams, with offsets counted in code units.
    #[test]
    fn reader_encoded_input() {
        let text = "{\"\u{e9}\": [1, \"\u{1d11e}\"]}";
        let mut bytes = Vec::new();
        for u in text.encode_utf16() {
            bytes.extend_from_slice(&u.to_le_bytes());
        }

        let mut h = Recorder::default();
        let mut is = EncodedInputStream::<Utf16Le, _>::new(StringStream::new(&bytes[..]));
        Reader::<Utf16Le, Utf8>::new().parse(FLAG_VALIDATE_ENCODING, &mut is, &mut h).unwrap();
        assert_eq!(h.events, ["{", "key \u{e9}", "[", "uint 1", "string \u{1d11e}", "] 2", "} 1"]);

        let mut h = Recorder::default();
        let mut is = AutoUtfInputStream::new(StringStream::new(&bytes[..]));
        Reader::<AutoUtf, Utf8>::new().parse(FLAG_DEFAULT, &mut is, &mut h).unwrap();
        assert_eq!(h.events, ["{", "key \u{e9}", "[", "uint 1", "string \u{1d11e}", "] 2", "} 1"]);

        let bad: Vec<u8> = "[1 2]".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let mut is = AutoUtfInputStream::new(StringStream::new(&bad[..]));
        assert_eq!(
            Reader::<AutoUtf, Utf8>::new().parse(FLAG_DEFAULT, &mut is, &mut Recorder::default()),
            Err(ParseError::new(ParseErrorCode::ArrayMissCommaOrSquareBracket, 3)),
        );
    }
}
