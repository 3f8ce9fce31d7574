//! # Arbitrary-Precision Integers
//!
//! A minimal unsigned big integer, sufficient to compare decimal numbers
//! against the exact value of doubles. Digits are 64-bit words in little
//! endian order. The capacity is fixed and covers the largest values the
//! decimal-to-double conversion ever produces.

/// Maximum number of bits a `BigInteger` can hold.
pub const BIT_COUNT: usize = 3328;

const CAPACITY: usize = BIT_COUNT / 64;
const DECIMALS_PER_WORD: usize = 19;

/// ## Big Integer
#[derive(Clone)]
pub struct BigInteger {
    digits: [u64; CAPACITY],
    count: usize,
}

impl BigInteger {
    /// ## Create from Integer
    pub fn new(v: u64) -> Self {
        let mut digits = [0u64; CAPACITY];
        digits[0] = v;
        Self {
            digits: digits,
            count: 1,
        }
    }

    /// ## Create from Decimal Digits
    ///
    /// Create a big integer from a sequence of ASCII decimal digits. The
    /// digits are consumed in chunks of 19, the maximum that fits into a
    /// single word.
    pub fn from_decimal(decimals: &[u8]) -> Self {
        let mut v = Self::new(0);
        for chunk in decimals.chunks(DECIMALS_PER_WORD) {
            let n = chunk.iter().fold(0u64, |acc, c| acc * 10 + (c - b'0') as u64);
            if v.is_zero() {
                v = Self::new(n);
            } else {
                v.mul_pow5(chunk.len() as u32);
                v.shl(chunk.len() as u32);
                v.add_u64(n);
            }
        }
        v
    }

    fn push(&mut self, v: u64) {
        assert!(self.count < CAPACITY);
        self.digits[self.count] = v;
        self.count += 1;
    }

    /// ## Add Integer
    pub fn add_u64(&mut self, v: u64) -> &mut Self {
        let (sum, mut carry) = self.digits[0].overflowing_add(v);
        self.digits[0] = sum;
        let mut i = 1;
        while carry && i < self.count {
            let (sum, c) = self.digits[i].overflowing_add(1);
            self.digits[i] = sum;
            carry = c;
            i += 1;
        }
        if carry {
            self.push(1);
        }
        self
    }

    /// ## Multiply by Integer
    pub fn mul_u64(&mut self, v: u64) -> &mut Self {
        if v == 0 {
            *self = Self::new(0);
            return self;
        }
        if v == 1 {
            return self;
        }

        let mut carry = 0u64;
        for d in self.digits[..self.count].iter_mut() {
            let p = (*d as u128) * (v as u128) + carry as u128;
            *d = p as u64;
            carry = (p >> 64) as u64;
        }
        if carry > 0 {
            self.push(carry);
        }
        self
    }

    /// ## Multiply by 32-bit Integer
    pub fn mul_u32(&mut self, v: u32) -> &mut Self {
        if v == 0 {
            *self = Self::new(0);
            return self;
        }
        if v == 1 {
            return self;
        }

        let mut carry = 0u64;
        for d in self.digits[..self.count].iter_mut() {
            let lo = (*d & 0xffff_ffff) * v as u64 + carry;
            let hi = (*d >> 32) * v as u64 + (lo >> 32);
            *d = (hi << 32) | (lo & 0xffff_ffff);
            carry = hi >> 32;
        }
        if carry > 0 {
            self.push(carry);
        }
        self
    }

    /// ## Shift Left
    pub fn shl(&mut self, shift: u32) -> &mut Self {
        if self.is_zero() || shift == 0 {
            return self;
        }

        let offset = (shift / 64) as usize;
        let inner = shift % 64;
        assert!(self.count + offset <= CAPACITY);

        if inner == 0 {
            self.digits.copy_within(0..self.count, offset);
            self.count += offset;
        } else {
            let mut top = 0u64;
            if self.count + offset < CAPACITY {
                top = self.digits[self.count - 1] >> (64 - inner);
            } else {
                assert!(self.digits[self.count - 1] >> (64 - inner) == 0);
            }
            for i in (1..self.count).rev() {
                self.digits[i + offset] = (self.digits[i] << inner) | (self.digits[i - 1] >> (64 - inner));
            }
            self.digits[offset] = self.digits[0] << inner;
            self.count += offset;
            if top != 0 {
                self.push(top);
            }
        }

        self.digits[..offset].fill(0);
        self
    }

    /// ## Multiply by Power of Five
    pub fn mul_pow5(&mut self, mut exp: u32) -> &mut Self {
        const POW5: [u32; 13] = [
            1, 5, 25, 125, 625, 3125, 15625, 78125, 390625, 1953125,
            9765625, 48828125, 244140625,
        ];
        // 5^27 and 5^13 are the largest powers fitting a word and a half word.
        const POW5_27: u64 = 7450580596923828125;
        const POW5_13: u32 = 1220703125;

        if exp == 0 {
            return self;
        }
        while exp >= 27 {
            self.mul_u64(POW5_27);
            exp -= 27;
        }
        while exp >= 13 {
            self.mul_u32(POW5_13);
            exp -= 13;
        }
        if exp > 0 {
            self.mul_u32(POW5[exp as usize]);
        }
        self
    }

    /// ## Absolute Difference
    ///
    /// Yield `|self - rhs|`, together with whether `self < rhs`.
    pub fn difference(&self, rhs: &Self) -> (Self, bool) {
        let (a, b, less) = match self.cmp(rhs) {
            core::cmp::Ordering::Less => (rhs, self, true),
            _ => (self, rhs, false),
        };

        let mut out = Self::new(0);
        let mut borrow = false;
        for i in 0..a.count {
            let sub = if i < b.count { b.digits[i] } else { 0 };
            let (d, b1) = a.digits[i].overflowing_sub(sub);
            let (d, b2) = d.overflowing_sub(borrow as u64);
            out.digits[i] = d;
            borrow = b1 || b2;
        }
        out.count = a.count;
        while out.count > 1 && out.digits[out.count - 1] == 0 {
            out.count -= 1;
        }

        (out, less)
    }

    /// ## Compare Magnitude
    pub fn cmp(&self, rhs: &Self) -> core::cmp::Ordering {
        self.count.cmp(&rhs.count).then_with(|| {
            self.digits[..self.count]
                .iter()
                .rev()
                .cmp(rhs.digits[..rhs.count].iter().rev())
        })
    }

    /// Check whether the value is zero.
    pub fn is_zero(&self) -> bool {
        self.count == 1 && self.digits[0] == 0
    }

    /// Yield the number of significant words.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Yield the word at position `index`, counting from the least
    /// significant one.
    pub fn digit(&self, index: usize) -> u64 {
        assert!(index < self.count);
        self.digits[index]
    }
}

impl core::fmt::Debug for BigInteger {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter<'_>,
    ) -> Result<(), core::fmt::Error> {
        fmt.debug_list().entries(self.digits[..self.count].iter()).finish()
    }
}

impl PartialEq for BigInteger {
    fn eq(&self, rhs: &Self) -> bool {
        self.cmp(rhs) == core::cmp::Ordering::Equal
    }
}

impl Eq for BigInteger {
}
