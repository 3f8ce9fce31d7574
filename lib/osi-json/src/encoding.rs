//! # Unicode Encodings
//!
//! Codecs that convert between Unicode Scalar Values and the code units of
//! a given encoding scheme. All codecs operate on the abstract streams of
//! the `stream` module, and thus are decoupled from the JSON grammar.
//!
//! Every codec provides three operations:
//!
//! * `encode()` writes a code point as a sequence of code units.
//! * `decode()` reads a sequence of code units and yields the code point,
//!   or `None` if the input is not valid in this encoding.
//! * `validate()` copies the code units of a single code point verbatim,
//!   while verifying that they form a valid sequence. This avoids
//!   reassembling the code point if no transcoding is needed.
//!
//! Codecs never raise errors themselves. Callers are expected to turn a
//! failed decode into a proper diagnostic.

use crate::stream::{InputStream, OutputStream};

/// ## Code Units
///
/// This trait is implemented by the integer types that serve as code units
/// of an encoding. Conversions are lossy by design: `from_u32()` truncates
/// to the width of the code unit.
pub trait Char: Copy + Default + Eq + Ord + core::fmt::Debug + 'static {
    /// Width of a code unit in bytes.
    const WIDTH: usize;

    /// Create a code unit from the low bits of `v`.
    fn from_u32(v: u32) -> Self;

    /// Widen the code unit.
    fn to_u32(self) -> u32;

    /// Reinterpret a byte slice as slice of code units, if the code unit is
    /// a single byte wide.
    fn from_bytes(v: &[u8]) -> Option<&[Self]>;
}

impl Char for u8 {
    const WIDTH: usize = 1;

    fn from_u32(v: u32) -> Self {
        v as u8
    }

    fn to_u32(self) -> u32 {
        self as u32
    }

    fn from_bytes(v: &[u8]) -> Option<&[Self]> {
        Some(v)
    }
}

impl Char for u16 {
    const WIDTH: usize = 2;

    fn from_u32(v: u32) -> Self {
        v as u16
    }

    fn to_u32(self) -> u32 {
        self as u32
    }

    fn from_bytes(_v: &[u8]) -> Option<&[Self]> {
        None
    }
}

impl Char for u32 {
    const WIDTH: usize = 4;

    fn from_u32(v: u32) -> Self {
        v
    }

    fn to_u32(self) -> u32 {
        self
    }

    fn from_bytes(_v: &[u8]) -> Option<&[Self]> {
        None
    }
}

/// ## Encoding Scheme
///
/// A codec for a Unicode encoding scheme. `Ch` is the natural code unit of
/// the encoding, but all operations accept streams of any code-unit width
/// and truncate or widen as required.
pub trait Encoding {
    /// Code unit of the encoding.
    type Ch: Char;

    /// Identifier of the code-unit sequence format. Encodings sharing an
    /// identifier produce identical code-unit sequences for identical
    /// input, and thus can be transcoded by copying. Zero is reserved for
    /// encodings that must never be copied verbatim.
    const ID: u32;

    /// Whether the encoding can represent any Unicode Scalar Value.
    const SUPPORT_UNICODE: bool = true;

    /// Write `codepoint` to the output stream.
    fn encode<O: OutputStream + ?Sized>(os: &mut O, codepoint: u32);

    /// Read a single code point from the input stream.
    fn decode<'src, I: InputStream<'src> + ?Sized>(is: &mut I) -> Option<u32>;

    /// Copy the code units of a single code point while validating them.
    fn validate<'src, I, O>(is: &mut I, os: &mut O) -> bool
    where
        I: InputStream<'src> + ?Sized,
        O: OutputStream + ?Sized;
}

/// ## Byte-Oriented Encodings
///
/// Encodings that define how their code units are serialized into bytes,
/// including the byte-order mark.
pub trait ByteEncoding: Encoding {
    /// Read one code unit from a byte stream.
    fn take_unit<'src, I>(is: &mut I) -> Option<Self::Ch>
    where
        I: InputStream<'src, Ch = u8> + ?Sized;

    /// Write one code unit to a byte stream.
    fn put_unit<O>(os: &mut O, c: Self::Ch)
    where
        O: OutputStream<Ch = u8> + ?Sized;

    /// Skip a byte-order mark, if present, and yield the first code unit
    /// following it.
    fn take_bom<'src, I>(is: &mut I) -> Option<Self::Ch>
    where
        I: InputStream<'src, Ch = u8> + ?Sized,
    {
        let c = Self::take_unit(is)?;
        if c.to_u32() == 0xfeff {
            Self::take_unit(is)
        } else {
            Some(c)
        }
    }

    /// Write the byte-order mark of the encoding.
    fn put_bom<O>(os: &mut O)
    where
        O: OutputStream<Ch = u8> + ?Sized,
    {
        Self::put_unit(os, Self::Ch::from_u32(0xfeff));
    }
}

fn put<O: OutputStream + ?Sized>(os: &mut O, v: u32) {
    os.put(O::Ch::from_u32(v));
}

// Map a code unit into the UTF-8 byte-class table. Each class carries bits
// for the continuation ranges (0x10: 80-8F, 0x40: 90-9F, 0x20: A0-BF) and
// the sequence type for lead bytes.
fn utf8_class(c: u32) -> u8 {
    const CLASS: [u8; 256] = {
        let mut v = [0u8; 256];
        let mut i = 0x80;
        while i < 0x100 {
            v[i] = match i {
                0x80..=0x8f => 0x10,
                0x90..=0x9f => 0x40,
                0xa0..=0xbf => 0x20,
                0xc0..=0xc1 => 8,
                0xc2..=0xdf => 2,
                0xe0 => 10,
                0xe1..=0xec => 3,
                0xed => 4,
                0xee..=0xef => 3,
                0xf0 => 11,
                0xf1..=0xf3 => 6,
                0xf4 => 5,
                _ => 8,
            };
            i += 1;
        }
        v
    };

    CLASS[(c & 0xff) as usize]
}

/// ## UTF-8
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Utf8;

impl Encoding for Utf8 {
    type Ch = u8;
    const ID: u32 = 1;

    fn encode<O: OutputStream + ?Sized>(os: &mut O, codepoint: u32) {
        if codepoint <= 0x7f {
            put(os, codepoint);
        } else if codepoint <= 0x7ff {
            put(os, 0xc0 | (codepoint >> 6));
            put(os, 0x80 | (codepoint & 0x3f));
        } else if codepoint <= 0xffff {
            put(os, 0xe0 | (codepoint >> 12));
            put(os, 0x80 | ((codepoint >> 6) & 0x3f));
            put(os, 0x80 | (codepoint & 0x3f));
        } else {
            assert!(codepoint <= 0x10ffff);
            put(os, 0xf0 | (codepoint >> 18));
            put(os, 0x80 | ((codepoint >> 12) & 0x3f));
            put(os, 0x80 | ((codepoint >> 6) & 0x3f));
            put(os, 0x80 | (codepoint & 0x3f));
        }
    }

    fn decode<'src, I: InputStream<'src> + ?Sized>(is: &mut I) -> Option<u32> {
        let c = is.take()?.to_u32();
        if c & 0x80 == 0 {
            return Some(c);
        }

        let class = utf8_class(c);
        let mut cp = (0xffu32 >> class) & c;
        let mut ok = true;
        let mut tail = |is: &mut I, mask: u8| -> Option<()> {
            let c = is.take()?.to_u32();
            cp = (cp << 6) | (c & 0x3f);
            ok &= c <= 0xff && (utf8_class(c) & mask) != 0;
            Some(())
        };

        match class {
            2 => {
                tail(is, 0x70)?;
            },
            3 => {
                tail(is, 0x70)?;
                tail(is, 0x70)?;
            },
            4 => {
                tail(is, 0x50)?;
                tail(is, 0x70)?;
            },
            5 => {
                tail(is, 0x10)?;
                tail(is, 0x70)?;
                tail(is, 0x70)?;
            },
            6 => {
                tail(is, 0x70)?;
                tail(is, 0x70)?;
                tail(is, 0x70)?;
            },
            10 => {
                tail(is, 0x20)?;
                tail(is, 0x70)?;
            },
            11 => {
                tail(is, 0x60)?;
                tail(is, 0x70)?;
                tail(is, 0x70)?;
            },
            _ => return None,
        }

        ok.then_some(cp)
    }

    fn validate<'src, I, O>(is: &mut I, os: &mut O) -> bool
    where
        I: InputStream<'src> + ?Sized,
        O: OutputStream + ?Sized,
    {
        let copy = |is: &mut I, os: &mut O| -> Option<u32> {
            let c = is.take()?.to_u32();
            put(os, c);
            Some(c)
        };
        let tail = |is: &mut I, os: &mut O, mask: u8| -> bool {
            match copy(is, os) {
                Some(c) => c <= 0xff && (utf8_class(c) & mask) != 0,
                None => false,
            }
        };

        let Some(c) = copy(is, os) else {
            return false;
        };
        if c & 0x80 == 0 {
            return true;
        }

        match utf8_class(c) {
            2 => tail(is, os, 0x70),
            3 => tail(is, os, 0x70) & tail(is, os, 0x70),
            4 => tail(is, os, 0x50) & tail(is, os, 0x70),
            5 => tail(is, os, 0x10) & tail(is, os, 0x70) & tail(is, os, 0x70),
            6 => tail(is, os, 0x70) & tail(is, os, 0x70) & tail(is, os, 0x70),
            10 => tail(is, os, 0x20) & tail(is, os, 0x70),
            11 => tail(is, os, 0x60) & tail(is, os, 0x70) & tail(is, os, 0x70),
            _ => false,
        }
    }
}

impl ByteEncoding for Utf8 {
    fn take_unit<'src, I>(is: &mut I) -> Option<u8>
    where
        I: InputStream<'src, Ch = u8> + ?Sized,
    {
        is.take()
    }

    fn put_unit<O>(os: &mut O, c: u8)
    where
        O: OutputStream<Ch = u8> + ?Sized,
    {
        os.put(c);
    }

    fn take_bom<'src, I>(is: &mut I) -> Option<u8>
    where
        I: InputStream<'src, Ch = u8> + ?Sized,
    {
        let c = is.take()?;
        if c != 0xef {
            return Some(c);
        }
        let c = is.take()?;
        if c != 0xbb {
            return Some(c);
        }
        let c = is.take()?;
        if c != 0xbf {
            return Some(c);
        }
        is.take()
    }

    fn put_bom<O>(os: &mut O)
    where
        O: OutputStream<Ch = u8> + ?Sized,
    {
        os.put(0xef);
        os.put(0xbb);
        os.put(0xbf);
    }
}

/// ## UTF-16
///
/// UTF-16 over native 16-bit code units. See `Utf16Le` and `Utf16Be` for
/// the byte-serialized variants.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Utf16;

impl Encoding for Utf16 {
    type Ch = u16;
    const ID: u32 = 2;

    fn encode<O: OutputStream + ?Sized>(os: &mut O, codepoint: u32) {
        if codepoint <= 0xffff {
            assert!(!(0xd800..=0xdfff).contains(&codepoint));
            put(os, codepoint);
        } else {
            assert!(codepoint <= 0x10ffff);
            let v = codepoint - 0x10000;
            put(os, (v >> 10) | 0xd800);
            put(os, (v & 0x3ff) | 0xdc00);
        }
    }

    fn decode<'src, I: InputStream<'src> + ?Sized>(is: &mut I) -> Option<u32> {
        let c = is.take()?.to_u32();
        if !(0xd800..=0xdfff).contains(&c) {
            return Some(c);
        }
        if c > 0xdbff {
            return None;
        }

        let t = is.take()?.to_u32();
        if !(0xdc00..=0xdfff).contains(&t) {
            return None;
        }
        Some((((c & 0x3ff) << 10) | (t & 0x3ff)) + 0x10000)
    }

    fn validate<'src, I, O>(is: &mut I, os: &mut O) -> bool
    where
        I: InputStream<'src> + ?Sized,
        O: OutputStream + ?Sized,
    {
        let Some(c) = is.take() else {
            return false;
        };
        os.put(O::Ch::from_u32(c.to_u32()));
        let c = c.to_u32();
        if !(0xd800..=0xdfff).contains(&c) {
            return true;
        }
        if c > 0xdbff {
            return false;
        }

        let Some(t) = is.take() else {
            return false;
        };
        os.put(O::Ch::from_u32(t.to_u32()));
        (0xdc00..=0xdfff).contains(&t.to_u32())
    }
}

/// ## UTF-32
///
/// UTF-32 over native 32-bit code units. See `Utf32Le` and `Utf32Be` for
/// the byte-serialized variants.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Utf32;

impl Encoding for Utf32 {
    type Ch = u32;
    const ID: u32 = 3;

    fn encode<O: OutputStream + ?Sized>(os: &mut O, codepoint: u32) {
        assert!(codepoint <= 0x10ffff);
        put(os, codepoint);
    }

    fn decode<'src, I: InputStream<'src> + ?Sized>(is: &mut I) -> Option<u32> {
        let c = is.take()?.to_u32();
        (c <= 0x10ffff).then_some(c)
    }

    fn validate<'src, I, O>(is: &mut I, os: &mut O) -> bool
    where
        I: InputStream<'src> + ?Sized,
        O: OutputStream + ?Sized,
    {
        match is.take() {
            Some(c) => {
                put(os, c.to_u32());
                c.to_u32() <= 0x10ffff
            },
            None => false,
        }
    }
}

/// ## ASCII
///
/// The 7-bit subset of Unicode. Writers targeting ASCII escape everything
/// else.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ascii;

impl Encoding for Ascii {
    type Ch = u8;
    const ID: u32 = 4;
    const SUPPORT_UNICODE: bool = false;

    fn encode<O: OutputStream + ?Sized>(os: &mut O, codepoint: u32) {
        assert!(codepoint <= 0x7f);
        put(os, codepoint);
    }

    fn decode<'src, I: InputStream<'src> + ?Sized>(is: &mut I) -> Option<u32> {
        let c = is.take()?.to_u32();
        (c <= 0x7f).then_some(c)
    }

    fn validate<'src, I, O>(is: &mut I, os: &mut O) -> bool
    where
        I: InputStream<'src> + ?Sized,
        O: OutputStream + ?Sized,
    {
        match is.take() {
            Some(c) => {
                put(os, c.to_u32());
                c.to_u32() <= 0x7f
            },
            None => false,
        }
    }
}

impl ByteEncoding for Ascii {
    fn take_unit<'src, I>(is: &mut I) -> Option<u8>
    where
        I: InputStream<'src, Ch = u8> + ?Sized,
    {
        is.take()
    }

    fn put_unit<O>(os: &mut O, c: u8)
    where
        O: OutputStream<Ch = u8> + ?Sized,
    {
        os.put(c);
    }

    fn take_bom<'src, I>(is: &mut I) -> Option<u8>
    where
        I: InputStream<'src, Ch = u8> + ?Sized,
    {
        is.take()
    }

    fn put_bom<O>(_os: &mut O)
    where
        O: OutputStream<Ch = u8> + ?Sized,
    {
    }
}

// Byte-serialized variants share the codec of their native counterpart and
// only differ in how code units map to bytes.
macro_rules! byte_order {
    ($name:ident, $native:ident, $ch:ty, $width:literal, $from:ident, $to:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name;

        impl Encoding for $name {
            type Ch = $ch;
            const ID: u32 = $native::ID;

            fn encode<O: OutputStream + ?Sized>(os: &mut O, codepoint: u32) {
                $native::encode(os, codepoint)
            }

            fn decode<'src, I: InputStream<'src> + ?Sized>(is: &mut I) -> Option<u32> {
                $native::decode(is)
            }

            fn validate<'src, I, O>(is: &mut I, os: &mut O) -> bool
            where
                I: InputStream<'src> + ?Sized,
                O: OutputStream + ?Sized,
            {
                $native::validate(is, os)
            }
        }

        impl ByteEncoding for $name {
            fn take_unit<'src, I>(is: &mut I) -> Option<$ch>
            where
                I: InputStream<'src, Ch = u8> + ?Sized,
            {
                let mut v = [0u8; $width];
                for b in v.iter_mut() {
                    *b = is.take()?;
                }
                Some(<$ch>::$from(v))
            }

            fn put_unit<O>(os: &mut O, c: $ch)
            where
                O: OutputStream<Ch = u8> + ?Sized,
            {
                for b in c.$to() {
                    os.put(b);
                }
            }
        }
    };
}

byte_order!(Utf16Le, Utf16, u16, 2, from_le_bytes, to_le_bytes, "## UTF-16 Little Endian");
byte_order!(Utf16Be, Utf16, u16, 2, from_be_bytes, to_be_bytes, "## UTF-16 Big Endian");
byte_order!(Utf32Le, Utf32, u32, 4, from_le_bytes, to_le_bytes, "## UTF-32 Little Endian");
byte_order!(Utf32Be, Utf32, u32, 4, from_be_bytes, to_be_bytes, "## UTF-32 Big Endian");

/// ## Runtime Encoding Types
///
/// The encodings `AutoUtf` can dispatch to. The discriminants index the
/// dispatch tables.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum UtfType {
    #[default]
    Utf8 = 0,
    Utf16Le = 1,
    Utf16Be = 2,
    Utf32Le = 3,
    Utf32Be = 4,
}

impl UtfType {
    /// ## Code Unit Width
    ///
    /// Yield the number of bytes a single code unit occupies.
    pub fn width(self) -> usize {
        match self {
            UtfType::Utf8 => 1,
            UtfType::Utf16Le | UtfType::Utf16Be => 2,
            UtfType::Utf32Le | UtfType::Utf32Be => 4,
        }
    }
}

/// ## Runtime-Selected Encoding
///
/// Dispatches to one of the UTF codecs based on the type reported by the
/// stream it operates on (see `InputStream::source_type()` and
/// `OutputStream::target_type()`). Code units are carried as `u32`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AutoUtf;

impl Encoding for AutoUtf {
    type Ch = u32;
    const ID: u32 = 0;

    fn encode<O: OutputStream + ?Sized>(os: &mut O, codepoint: u32) {
        let table: [fn(&mut O, u32); 5] = [
            Utf8::encode::<O>,
            Utf16::encode::<O>,
            Utf16::encode::<O>,
            Utf32::encode::<O>,
            Utf32::encode::<O>,
        ];
        table[os.target_type() as usize](os, codepoint)
    }

    fn decode<'src, I: InputStream<'src> + ?Sized>(is: &mut I) -> Option<u32> {
        let table: [fn(&mut I) -> Option<u32>; 5] = [
            Utf8::decode::<I>,
            Utf16::decode::<I>,
            Utf16::decode::<I>,
            Utf32::decode::<I>,
            Utf32::decode::<I>,
        ];
        table[is.source_type() as usize](is)
    }

    fn validate<'src, I, O>(is: &mut I, os: &mut O) -> bool
    where
        I: InputStream<'src> + ?Sized,
        O: OutputStream + ?Sized,
    {
        let table: [fn(&mut I, &mut O) -> bool; 5] = [
            Utf8::validate::<I, O>,
            Utf16::validate::<I, O>,
            Utf16::validate::<I, O>,
            Utf32::validate::<I, O>,
            Utf32::validate::<I, O>,
        ];
        table[is.source_type() as usize](is, os)
    }
}

/// ## Transcoder
///
/// Converts single code points from the source encoding `S` into the
/// target encoding `T`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Transcoder<S, T> {
    _encodings: core::marker::PhantomData<(S, T)>,
}

impl<S: Encoding, T: Encoding> Transcoder<S, T> {
    // Source and target produce identical code-unit sequences, so code
    // units can be copied without decoding.
    const RAW: bool = S::ID != 0 && S::ID == T::ID;

    /// ## Transcode Code Point
    ///
    /// Decode one code point from the input and encode it into the output.
    /// Fails if the input is not valid in the source encoding, or if the
    /// code point cannot be represented in the target encoding.
    ///
    /// If source and target are the same encoding, a single code unit is
    /// copied verbatim without any validation.
    pub fn transcode<'src, I, O>(is: &mut I, os: &mut O) -> bool
    where
        I: InputStream<'src> + ?Sized,
        O: OutputStream + ?Sized,
    {
        if Self::RAW {
            return match is.take() {
                Some(c) => {
                    os.put(O::Ch::from_u32(c.to_u32()));
                    true
                },
                None => false,
            };
        }

        match S::decode(is) {
            Some(cp) if T::SUPPORT_UNICODE || cp <= 0x7f => {
                T::encode(os, cp);
                true
            },
            _ => false,
        }
    }

    /// ## Validate Code Point
    ///
    /// Like `transcode()`, but always validates the input. If source and
    /// target are the same encoding, the code units are copied verbatim
    /// after validation.
    pub fn validate<'src, I, O>(is: &mut I, os: &mut O) -> bool
    where
        I: InputStream<'src> + ?Sized,
        O: OutputStream + ?Sized,
    {
        if Self::RAW {
            return S::validate(is, os);
        }

        match S::decode(is) {
            Some(cp) if T::SUPPORT_UNICODE || cp <= 0x7f => {
                T::encode(os, cp);
                true
            },
            _ => false,
        }
    }

    /// ## Transcode Code-Unit Slice
    ///
    /// Transcode an entire slice of source code units into the output
    /// stream, validating the input. Yields the index of the first code
    /// unit of the offending sequence on failure.
    pub fn transcode_string<O>(
        src: &[S::Ch],
        os: &mut O,
    ) -> Result<(), usize>
    where
        O: OutputStream + ?Sized,
    {
        let mut is = crate::stream::StringStream::new(src);
        while is.peek().is_some() {
            let at = is.tell();
            if !Self::validate(&mut is, os) {
                return Err(at);
            }
        }
        Ok(())
    }
}
