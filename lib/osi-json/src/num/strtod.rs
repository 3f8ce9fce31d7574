//! # Decimal to Double Conversion
//!
//! Two conversions are provided. `normal_precision()` scales a decimal
//! significand with a single floating-point operation and is accurate to a
//! few ULPs. `full_precision()` starts from such an approximation and then
//! corrects it with exact big-integer comparisons, yielding the correctly
//! rounded double (round-half-to-even).

use super::bigint::BigInteger;
use super::pow10::pow10;

const MAX_DECIMAL_DIGITS: usize = 780;
const MIN_DECIMAL_EXP: i32 = -324;
const MAX_DECIMAL_EXP: i32 = 309;
const MAX_ADJUSTMENTS: usize = 64;

const SIGNIFICAND_MASK: u64 = 0x000f_ffff_ffff_ffff;
const EXPONENT_MASK: u64 = 0x7ff0_0000_0000_0000;
const HIDDEN_BIT: u64 = 0x0010_0000_0000_0000;
const EXPONENT_BIAS: i32 = 0x3ff + 52;

fn biased_exponent(bits: u64) -> i32 {
    ((bits & EXPONENT_MASK) >> 52) as i32
}

fn integer_significand(bits: u64) -> u64 {
    match biased_exponent(bits) {
        0 => bits & SIGNIFICAND_MASK,
        _ => (bits & SIGNIFICAND_MASK) | HIDDEN_BIT,
    }
}

fn integer_exponent(bits: u64) -> i32 {
    match biased_exponent(bits) {
        0 => 1 - EXPONENT_BIAS,
        e => e - EXPONENT_BIAS,
    }
}

fn next_positive(d: f64) -> f64 {
    f64::from_bits(d.to_bits() + 1)
}

fn previous_positive(d: f64) -> f64 {
    match d.to_bits() {
        0 => d,
        v => f64::from_bits(v - 1),
    }
}

fn scale(d: f64, exp: i32) -> f64 {
    if exp < -308 {
        0.0
    } else if exp >= 0 {
        d * pow10(exp as usize)
    } else {
        d / pow10((-exp) as usize)
    }
}

/// ## Scale Significand
///
/// Compute `significand * 10^exp` with plain floating-point arithmetic.
/// Exponents below `-308` are applied in two steps, so intermediate powers
/// do not underflow. The result is within a few ULPs of the exact value.
pub fn normal_precision(significand: f64, exp: i32) -> f64 {
    if exp > 308 {
        if significand == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else if exp < -308 {
        scale(scale(significand, -308), exp + 308)
    } else {
        scale(significand, exp)
    }
}

// Compare the distance between the decimal `d * 10^d_exp` and the double
// `b` against half an ULP of `b`. All three quantities are scaled to
// integers sharing a common denominator. Also yields whether the decimal
// lies below `b`.
fn check_within_half_ulp(b: f64, d: &BigInteger, d_exp: i32) -> (core::cmp::Ordering, bool) {
    let bits = b.to_bits();
    let b_int = integer_significand(bits);
    let b_exp = integer_exponent(bits);
    let h_exp = b_exp - 1;

    let (mut ds2, mut ds5) = (0i32, 0i32);
    let (mut bs2, mut bs5) = (0i32, 0i32);
    let (mut hs2, mut hs5) = (0i32, 0i32);

    if d_exp >= 0 {
        ds2 += d_exp;
        ds5 += d_exp;
    } else {
        bs2 -= d_exp;
        bs5 -= d_exp;
        hs2 -= d_exp;
        hs5 -= d_exp;
    }

    if b_exp >= 0 {
        bs2 += b_exp;
    } else {
        ds2 -= b_exp;
        hs2 -= b_exp;
    }

    if h_exp >= 0 {
        hs2 += h_exp;
    } else {
        ds2 -= h_exp;
        bs2 -= h_exp;
    }

    let common = ds2.min(bs2).min(hs2);
    ds2 -= common;
    bs2 -= common;
    hs2 -= common;

    let mut ds = d.clone();
    ds.mul_pow5(ds5 as u32).shl(ds2 as u32);
    let mut bs = BigInteger::new(b_int);
    bs.mul_pow5(bs5 as u32).shl(bs2 as u32);
    let mut hs = BigInteger::new(1);
    hs.mul_pow5(hs5 as u32).shl(hs2 as u32);

    let (mut delta, below) = ds.difference(&bs);

    // Right below a power of two the spacing of doubles halves.
    if below
        && bits & SIGNIFICAND_MASK == 0
        && biased_exponent(bits) > 1
    {
        delta.shl(1);
    }

    (delta.cmp(&hs), below)
}

/// ## Correctly Rounded Conversion
///
/// Compute the double nearest to `digits * 10^exp`, where `digits` is a
/// sequence of ASCII decimal digits. Ties are rounded to the even
/// significand. At most 780 significant digits are considered. Values
/// beyond the double range yield infinity.
pub fn full_precision(digits: &[u8], exp: i32) -> f64 {
    let start = digits
        .iter()
        .position(|c| *c != b'0')
        .unwrap_or(digits.len());
    let mut digits = &digits[start..];
    let mut exp = exp;

    while let [rest @ .., b'0'] = digits {
        digits = rest;
        exp = exp.saturating_add(1);
    }

    if digits.is_empty() {
        return 0.0;
    }

    if digits.len() > MAX_DECIMAL_DIGITS {
        exp = exp.saturating_add((digits.len() - MAX_DECIMAL_DIGITS) as i32);
        digits = &digits[..MAX_DECIMAL_DIGITS];
    }

    let len = digits.len() as i32;
    if len.saturating_add(exp) <= MIN_DECIMAL_EXP {
        return 0.0;
    }
    if len.saturating_add(exp) > MAX_DECIMAL_EXP {
        return f64::INFINITY;
    }

    let leading = digits.len().min(19);
    let m = digits[..leading]
        .iter()
        .fold(0u64, |acc, c| acc * 10 + (c - b'0') as u64);

    // Exact significands with exactly representable powers of ten need no
    // correction.
    if len <= 15 {
        let m = m as f64;
        if (-22..=22).contains(&exp) {
            return normal_precision(m, exp);
        }
        if exp > 22 && len + (exp - 22) <= 15 {
            return m * pow10((exp - 22) as usize) * pow10(22);
        }
    }

    let mut approx = normal_precision(m as f64, exp + (len - leading as i32));
    if approx.is_infinite() {
        approx = f64::MAX;
    }

    let d = BigInteger::from_decimal(digits);
    for _ in 0..MAX_ADJUSTMENTS {
        let (cmp, below) = check_within_half_ulp(approx, &d, exp);
        let step = match cmp {
            core::cmp::Ordering::Less => false,
            core::cmp::Ordering::Equal => integer_significand(approx.to_bits()) & 1 == 1,
            core::cmp::Ordering::Greater => true,
        };

        if !step {
            break;
        }

        approx = if below {
            previous_positive(approx)
        } else {
            next_positive(approx)
        };

        if approx.is_infinite() {
            break;
        }
    }

    approx
}
