//! # Double Formatting
//!
//! Formats finite doubles as JSON numbers. Digit generation is delegated
//! to the shortest round-trip representation of `core::fmt`, and the
//! resulting digits are laid out in JSON style: plain decimals for
//! moderate exponents, always with a fractional part, and scientific
//! notation without a `+` sign otherwise.

const CAPACITY: usize = 32;
const MAX_PRECISION: usize = 17;

#[derive(Clone, Copy)]
struct Scratch {
    bytes: [u8; CAPACITY],
    len: usize,
}

impl Scratch {
    fn new() -> Self {
        Self {
            bytes: [0; CAPACITY],
            len: 0,
        }
    }

    fn push(&mut self, v: u8) {
        self.bytes[self.len] = v;
        self.len += 1;
    }

    fn extend(&mut self, v: &[u8]) {
        self.bytes[self.len..self.len + v.len()].copy_from_slice(v);
        self.len += v.len();
    }

    fn zeros(&mut self, n: usize) {
        for _ in 0..n {
            self.push(b'0');
        }
    }

    fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl core::fmt::Write for Scratch {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        if self.len + s.len() > CAPACITY {
            return Err(core::fmt::Error);
        }
        self.extend(s.as_bytes());
        Ok(())
    }
}

/// ## Double Buffer
///
/// Scratch space for a single formatted double. Formatting yields a view
/// into the buffer, which stays valid until the next call.
#[derive(Clone, Copy)]
pub struct Buffer {
    out: Scratch,
}

impl Buffer {
    /// Create a new, empty buffer.
    pub fn new() -> Self {
        Self {
            out: Scratch::new(),
        }
    }

    /// ## Format Shortest Representation
    ///
    /// Format `v` with the shortest digit sequence that parses back to the
    /// same double. Yields `None` for infinities and NaN, which have no
    /// JSON representation.
    pub fn format(&mut self, v: f64) -> Option<&[u8]> {
        self.format_inner(v, None)
    }

    /// ## Format with Precision
    ///
    /// Format `v` rounded to `precision` significant digits. Trailing zeros
    /// are dropped. The precision is clamped to `1..=17`.
    pub fn format_with_precision(&mut self, v: f64, precision: usize) -> Option<&[u8]> {
        self.format_inner(v, Some(precision.clamp(1, MAX_PRECISION)))
    }

    fn format_inner(&mut self, v: f64, precision: Option<usize>) -> Option<&[u8]> {
        use core::fmt::Write;

        if !v.is_finite() {
            return None;
        }

        let mut raw = Scratch::new();
        match precision {
            None => write!(raw, "{:e}", v).ok()?,
            Some(p) => write!(raw, "{:.*e}", p - 1, v).ok()?,
        }

        let raw = raw.as_slice();
        let (negative, raw) = match raw {
            [b'-', rest @ ..] => (true, rest),
            _ => (false, raw),
        };
        let e = raw.iter().position(|c| *c == b'e')?;
        let (mantissa, exponent) = (&raw[..e], &raw[e + 1..]);

        let mut digits = Scratch::new();
        for c in mantissa.iter().filter(|c| c.is_ascii_digit()) {
            digits.push(*c);
        }
        while digits.len > 1 && digits.bytes[digits.len - 1] == b'0' {
            digits.len -= 1;
        }

        let exponent = match exponent {
            [b'-', rest @ ..] => -parse_exponent(rest),
            _ => parse_exponent(exponent),
        };

        self.out = Scratch::new();
        if negative {
            self.out.push(b'-');
        }
        self.prettify(digits.as_slice(), exponent - (digits.len as i32 - 1));

        Some(self.out.as_slice())
    }

    // Lay out `digits * 10^k`.
    fn prettify(&mut self, digits: &[u8], k: i32) {
        let n = digits.len() as i32;
        let kk = n + k;

        if k >= 0 && kk <= 21 {
            self.out.extend(digits);
            self.out.zeros(k as usize);
            self.out.extend(b".0");
        } else if kk > 0 && kk <= 21 {
            self.out.extend(&digits[..kk as usize]);
            self.out.push(b'.');
            self.out.extend(&digits[kk as usize..]);
        } else if kk > -6 && kk <= 0 {
            self.out.extend(b"0.");
            self.out.zeros((-kk) as usize);
            self.out.extend(digits);
        } else {
            self.out.push(digits[0]);
            if n > 1 {
                self.out.push(b'.');
                self.out.extend(&digits[1..]);
            }
            self.out.push(b'e');
            self.exponent(kk - 1);
        }
    }

    fn exponent(&mut self, e: i32) {
        if e < 0 {
            self.out.push(b'-');
        }
        let mut b = itoa::Buffer::new();
        self.out.extend(b.format(e.unsigned_abs()).as_bytes());
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_exponent(v: &[u8]) -> i32 {
    v.iter().fold(0i32, |acc, c| acc * 10 + (c - b'0') as i32)
}
