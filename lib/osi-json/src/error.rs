//! # Parse Errors
//!
//! Every failed parse is described by a `ParseError`, which pairs an error
//! code with the offset into the input where the problem was detected.
//! Offsets are counted in code units of the input stream, starting at the
//! beginning of the stream that was handed to the parse call.

/// ## Error Codes
///
/// Enumeration of all errors the parser can report. The English text of
/// each code is available via `ParseErrorCode::message()`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ParseErrorCode {
    /// The document is empty.
    DocumentEmpty,
    /// The document root must be either object or array.
    DocumentRootNotObjectOrArray,
    /// The document root must not follow by other values.
    DocumentRootNotSingular,
    /// Invalid value.
    ValueInvalid,
    /// Missing a name for object member.
    ObjectMissName,
    /// Missing a colon after a name of object member.
    ObjectMissColon,
    /// Missing a comma or `}` after an object member.
    ObjectMissCommaOrCurlyBracket,
    /// Missing a comma or `]` after an array element.
    ArrayMissCommaOrSquareBracket,
    /// Incorrect hex digit after `\u` escape in string.
    StringUnicodeEscapeInvalidHex,
    /// The surrogate pair in string is invalid.
    StringUnicodeSurrogateInvalid,
    /// Invalid escape character in string.
    StringEscapeInvalid,
    /// Missing a closing quotation mark in string.
    StringMissQuotationMark,
    /// Invalid encoding in string.
    StringInvalidEncoding,
    /// Number too big to be stored in double.
    NumberTooBig,
    /// Miss fraction part in number.
    NumberMissFraction,
    /// Miss exponent in number.
    NumberMissExponent,
    /// Parsing was terminated by the handler.
    Termination,
    /// Unspecific syntax error.
    UnspecificSyntaxError,
}

/// ## Parse Error
///
/// A parse error code together with the input offset it was raised at.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct ParseError {
    code: ParseErrorCode,
    offset: usize,
}

impl ParseErrorCode {
    /// ## Error Message
    ///
    /// Yield a human-readable English description of the error code.
    pub fn message(self) -> &'static str {
        match self {
            ParseErrorCode::DocumentEmpty => "The document is empty.",
            ParseErrorCode::DocumentRootNotObjectOrArray => "The document root must be either object or array.",
            ParseErrorCode::DocumentRootNotSingular => "The document root must not follow by other values.",
            ParseErrorCode::ValueInvalid => "Invalid value.",
            ParseErrorCode::ObjectMissName => "Missing a name for object member.",
            ParseErrorCode::ObjectMissColon => "Missing a colon after a name of object member.",
            ParseErrorCode::ObjectMissCommaOrCurlyBracket => "Missing a comma or '}' after an object member.",
            ParseErrorCode::ArrayMissCommaOrSquareBracket => "Missing a comma or ']' after an array element.",
            ParseErrorCode::StringUnicodeEscapeInvalidHex => "Incorrect hex digit after \\u escape in string.",
            ParseErrorCode::StringUnicodeSurrogateInvalid => "The surrogate pair in string is invalid.",
            ParseErrorCode::StringEscapeInvalid => "Invalid escape character in string.",
            ParseErrorCode::StringMissQuotationMark => "Missing a closing quotation mark in string.",
            ParseErrorCode::StringInvalidEncoding => "Invalid encoding in string.",
            ParseErrorCode::NumberTooBig => "Number too big to be stored in double.",
            ParseErrorCode::NumberMissFraction => "Miss fraction part in number.",
            ParseErrorCode::NumberMissExponent => "Miss exponent in number.",
            ParseErrorCode::Termination => "Terminate parsing due to Handler error.",
            ParseErrorCode::UnspecificSyntaxError => "Unspecific syntax error.",
        }
    }
}

impl core::fmt::Display for ParseErrorCode {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter<'_>,
    ) -> Result<(), core::fmt::Error> {
        fmt.write_str(self.message())
    }
}

impl ParseError {
    /// ## Create Parse Error
    ///
    /// Create a new parse error with the given code, raised at the given
    /// input offset.
    pub fn new(code: ParseErrorCode, offset: usize) -> Self {
        Self {
            code: code,
            offset: offset,
        }
    }

    /// ## Error Code
    pub fn code(&self) -> ParseErrorCode {
        self.code
    }

    /// ## Error Offset
    ///
    /// Yield the offset in input code units at which the error was raised.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl core::fmt::Debug for ParseError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter<'_>,
    ) -> Result<(), core::fmt::Error> {
        write!(fmt, "ParseError({:?} @ {})", self.code, self.offset)
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter<'_>,
    ) -> Result<(), core::fmt::Error> {
        write!(fmt, "{} (offset {})", self.code.message(), self.offset)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {
}
