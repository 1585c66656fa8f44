//! Sign-magnitude big integers with optional fixed-precision truncation

use std::cmp::Ordering;
use std::fmt;

use crate::error::{BigIntError, Result};
use crate::limbs::{self, BASE, MAX10, MAX10_LEN, MAX_DIGIT};

/// An arbitrary-precision signed integer.
///
/// The magnitude is a little-endian vector of 31-bit limbs. A fixed
/// precision, once set, truncates every derived value to that many bits and
/// pads byte output to the matching width. Results inherit the precision of
/// the receiver (the left operand).
#[derive(Debug, Clone, Default)]
pub struct BigInt {
    pub(crate) limbs: Vec<u32>,
    pub(crate) negative: bool,
    pub(crate) precision: Option<u32>,
}

impl PartialEq for BigInt {
    fn eq(&self, other: &Self) -> bool {
        // precision is a formatting property, not part of the value
        self.limbs == other.limbs && self.negative == other.negative
    }
}

impl Eq for BigInt {}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => limbs::mag_cmp(&self.limbs, &other.limbs),
            (true, true) => limbs::mag_cmp(&other.limbs, &self.limbs),
        }
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

impl BigInt {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self {
            limbs: vec![1],
            negative: false,
            precision: None,
        }
    }

    pub fn from_u64(value: u64) -> Self {
        let mut limbs = Vec::new();
        let mut rest = value;
        while rest != 0 {
            limbs.push((rest & MAX_DIGIT as u64) as u32);
            rest >>= BASE;
        }
        Self {
            limbs,
            negative: false,
            precision: None,
        }
    }

    /// Parse unsigned big-endian bytes. Empty input is zero.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self {
            limbs: limbs::bytes_to_limbs(bytes),
            negative: false,
            precision: None,
        }
    }

    /// Parse two's-complement big-endian bytes.
    pub fn from_signed_bytes_be(bytes: &[u8]) -> Self {
        if bytes.first().map_or(false, |&b| b & 0x80 != 0) {
            let inverted: Vec<u8> = bytes.iter().map(|b| !b).collect();
            let mut value = Self::from_bytes_be(&inverted).add(&Self::one());
            value.negative = true;
            value
        } else {
            Self::from_bytes_be(bytes)
        }
    }

    /// Parse hexadecimal digits with an optional sign and `0x` prefix.
    pub fn from_hex(input: &str) -> Result<Self> {
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        let digits = digits.strip_prefix("0x").unwrap_or(digits);

        let mut nibbles = Vec::with_capacity(digits.len() + 1);
        for c in digits.chars() {
            let nibble = c
                .to_digit(16)
                .ok_or(BigIntError::InvalidDigit { digit: c, base: 16 })?;
            nibbles.push(nibble as u8);
        }
        if nibbles.len() % 2 == 1 {
            nibbles.insert(0, 0);
        }
        let bytes: Vec<u8> = nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect();

        let mut value = Self::from_bytes_be(&bytes);
        value.negative = negative && !value.is_zero();
        Ok(value)
    }

    /// Parse decimal digits with an optional sign, nine digits per chunk.
    pub fn from_decimal(input: &str) -> Result<Self> {
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        for c in digits.chars() {
            if !c.is_ascii_digit() {
                return Err(BigIntError::InvalidDigit { digit: c, base: 10 });
            }
        }
        if digits.is_empty() {
            return Ok(Self::zero());
        }

        let chunk_base = Self::from_u64(MAX10 as u64);
        let mut value = Self::zero();
        let mut pos = 0;
        let mut take = (digits.len() - 1) % MAX10_LEN + 1;
        while pos < digits.len() {
            let mut chunk = 0u64;
            for c in digits[pos..pos + take].chars() {
                chunk = chunk * 10 + c.to_digit(10).unwrap_or(0) as u64;
            }
            value = if pos == 0 {
                Self::from_u64(chunk)
            } else {
                value.mul(&chunk_base).add(&Self::from_u64(chunk))
            };
            pos += take;
            take = MAX10_LEN;
        }
        value.negative = negative && !value.is_zero();
        Ok(value)
    }

    /// Magnitude as minimal big-endian bytes; with a fixed precision set, the
    /// output is padded or truncated to `ceil(precision / 8)` bytes.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let bytes = limbs::limbs_to_bytes(&self.limbs);
        match self.precision {
            None => bytes,
            Some(bits) => fit_width(bytes, (bits as usize + 7) >> 3),
        }
    }

    /// Minimal two's-complement big-endian bytes.
    pub fn to_signed_bytes_be(&self) -> Vec<u8> {
        if self.is_zero() {
            return match self.precision {
                Some(bits) => vec![0u8; (bits as usize + 7) >> 3],
                None => Vec::new(),
            };
        }
        if self.negative {
            let mut bytes = limbs::limbs_to_bytes(&limbs::mag_sub(&self.limbs, &[1]));
            if bytes.is_empty() {
                bytes.push(0);
            }
            if bytes[0] & 0x80 != 0 {
                bytes.insert(0, 0);
            }
            for byte in &mut bytes {
                *byte = !*byte;
            }
            bytes
        } else {
            let mut bytes = limbs::limbs_to_bytes(&self.limbs);
            if bytes[0] & 0x80 != 0 {
                bytes.insert(0, 0);
            }
            bytes
        }
    }

    /// Magnitude as lowercase hex, empty for zero.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes_be())
    }

    pub fn to_decimal(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut groups = Vec::new();
        let mut rest = self.limbs.clone();
        while !limbs::mag_is_zero(&rest) {
            let (quotient, remainder) = limbs::mag_div_rem_digit(&rest, MAX10);
            groups.push(remainder);
            rest = quotient;
        }
        let mut out = String::new();
        if self.negative {
            out.push('-');
        }
        for (i, group) in groups.iter().rev().enumerate() {
            if i == 0 {
                out.push_str(&group.to_string());
            } else {
                out.push_str(&format!("{:09}", group));
            }
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Bits in the magnitude; zero for zero.
    pub fn bit_length(&self) -> u32 {
        limbs::mag_bit_length(&self.limbs)
    }

    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    /// Fix the value's width. Every derived value is truncated to `bits`
    /// bits and byte output is padded to the matching width.
    pub fn set_precision(&mut self, bits: u32) {
        self.precision = Some(bits);
        self.limbs = mask_to_width(std::mem::take(&mut self.limbs), bits);
        if self.limbs.is_empty() {
            self.negative = false;
        }
    }

    pub fn abs(&self) -> Self {
        let mut out = self.clone();
        out.negative = false;
        out
    }

    pub fn neg(&self) -> Self {
        let mut out = self.clone();
        if !out.is_zero() {
            out.negative = !out.negative;
        }
        out
    }

    pub fn add(&self, other: &Self) -> Self {
        let (limbs, negative) =
            signed_add(&self.limbs, self.negative, &other.limbs, other.negative);
        self.make(limbs, negative)
    }

    pub fn sub(&self, other: &Self) -> Self {
        let (limbs, negative) =
            signed_add(&self.limbs, self.negative, &other.limbs, !other.negative);
        self.make(limbs, negative)
    }

    pub fn mul(&self, other: &Self) -> Self {
        let product = limbs::mag_mul(&self.limbs, &other.limbs);
        self.make(product, self.negative != other.negative)
    }

    pub fn square(&self) -> Self {
        self.make(limbs::mag_square(&self.limbs), false)
    }

    /// Quotient and common residue: the remainder is always in
    /// `[0, |divisor|)` and `quotient * divisor + remainder == self`.
    pub fn div_rem(&self, divisor: &Self) -> Result<(Self, Self)> {
        if divisor.is_zero() {
            return Err(BigIntError::DivisionByZero);
        }
        let (mut q_mag, mut r_mag) = limbs::mag_div_rem(&self.limbs, &divisor.limbs);
        if self.negative && !limbs::mag_is_zero(&r_mag) {
            // first positive residue: the quotient moves one step away from zero
            r_mag = limbs::mag_sub(&divisor.limbs, &r_mag);
            q_mag = limbs::mag_add(&q_mag, &[1]);
        }
        let quotient = self.make(q_mag, self.negative != divisor.negative);
        let remainder = self.make(r_mag, false);
        Ok((quotient, remainder))
    }

    /// The common residue alone.
    pub fn rem_euclid(&self, modulus: &Self) -> Result<Self> {
        Ok(self.div_rem(modulus)?.1)
    }

    pub fn and(&self, other: &Self) -> Self {
        let len = self.limbs.len().min(other.limbs.len());
        let limbs = (0..len).map(|i| self.limbs[i] & other.limbs[i]).collect();
        self.make(limbs, self.negative)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.make(or_mags(&self.limbs, &other.limbs), self.negative)
    }

    pub fn xor(&self, other: &Self) -> Self {
        let len = self.limbs.len().max(other.limbs.len());
        let limbs = (0..len)
            .map(|i| {
                self.limbs.get(i).copied().unwrap_or(0) ^ other.limbs.get(i).copied().unwrap_or(0)
            })
            .collect();
        self.make(limbs, self.negative)
    }

    /// Complement within the value's own bit length, extended with leading
    /// ones up to the fixed precision when one is set. NOT of zero is zero.
    pub fn not(&self) -> Self {
        if self.is_zero() {
            return self.make(Vec::new(), false);
        }
        let width = self.bit_length();
        let mut complement = limbs::mag_sub(&ones_mag(width), &self.limbs);
        if let Some(bits) = self.precision {
            if bits > width {
                let upper = limbs::mag_shl(&ones_mag(bits - width), width);
                complement = limbs::mag_add(&complement, &upper);
            }
        }
        self.make(complement, false)
    }

    pub fn shl(&self, shift: u32) -> Self {
        self.make(limbs::mag_shl(&self.limbs, shift), self.negative)
    }

    pub fn shr(&self, shift: u32) -> Self {
        self.make(limbs::mag_shr(&self.limbs, shift), self.negative)
    }

    /// Rotate within the fixed precision, or the value's own bit length when
    /// no precision is set. Negative shifts rotate the other way.
    pub fn rotate_left(&self, shift: i64) -> Self {
        let width = self.rotation_width();
        if width == 0 {
            return self.clone();
        }
        let shift = shift.rem_euclid(width as i64) as u32;
        if shift == 0 {
            return self.clone();
        }
        let left = mask_to_width(limbs::mag_shl(&self.limbs, shift), width);
        let right = limbs::mag_shr(&self.limbs, width - shift);
        self.make(or_mags(&left, &right), self.negative)
    }

    pub fn rotate_right(&self, shift: i64) -> Self {
        let width = self.rotation_width();
        if width == 0 {
            return self.clone();
        }
        self.rotate_left(-shift.rem_euclid(width as i64))
    }

    fn rotation_width(&self) -> u32 {
        match self.precision {
            Some(bits) => bits,
            None => self.bit_length(),
        }
    }

    /// Build a result that inherits this value's precision.
    pub(crate) fn make(&self, mut limbs: Vec<u32>, negative: bool) -> Self {
        limbs::trim(&mut limbs);
        if let Some(bits) = self.precision {
            limbs = mask_to_width(limbs, bits);
        }
        let negative = negative && !limbs.is_empty();
        Self {
            limbs,
            negative,
            precision: self.precision,
        }
    }
}

pub(crate) fn signed_add(x: &[u32], x_neg: bool, y: &[u32], y_neg: bool) -> (Vec<u32>, bool) {
    if x_neg == y_neg {
        return (limbs::mag_add(x, y), x_neg);
    }
    match limbs::mag_cmp(x, y) {
        Ordering::Equal => (Vec::new(), false),
        Ordering::Greater => (limbs::mag_sub(x, y), x_neg),
        Ordering::Less => (limbs::mag_sub(y, x), y_neg),
    }
}

fn or_mags(x: &[u32], y: &[u32]) -> Vec<u32> {
    let len = x.len().max(y.len());
    let mut out: Vec<u32> = (0..len)
        .map(|i| x.get(i).copied().unwrap_or(0) | y.get(i).copied().unwrap_or(0))
        .collect();
    limbs::trim(&mut out);
    out
}

/// `2^bits - 1` as a magnitude.
pub(crate) fn ones_mag(bits: u32) -> Vec<u32> {
    let full = (bits / BASE) as usize;
    let partial = bits % BASE;
    let mut mag = vec![MAX_DIGIT; full];
    if partial != 0 {
        mag.push((1u32 << partial) - 1);
    }
    mag
}

/// Keep only the low `bits` bits of a magnitude.
fn mask_to_width(mut mag: Vec<u32>, bits: u32) -> Vec<u32> {
    let keep = ((bits + BASE - 1) / BASE) as usize;
    if mag.len() > keep {
        mag.truncate(keep);
    }
    let partial = bits % BASE;
    if partial != 0 && mag.len() == keep {
        let last = mag.len() - 1;
        mag[last] &= (1 << partial) - 1;
    }
    limbs::trim(&mut mag);
    mag
}

fn fit_width(bytes: Vec<u8>, width: usize) -> Vec<u8> {
    match bytes.len().cmp(&width) {
        Ordering::Equal => bytes,
        Ordering::Less => {
            let mut padded = vec![0u8; width - bytes.len()];
            padded.extend_from_slice(&bytes);
            padded
        }
        Ordering::Greater => bytes[bytes.len() - width..].to_vec(),
    }
}
