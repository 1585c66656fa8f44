//! Modular exponentiation and inverses
//!
//! Exponentiation runs a sliding-window ladder over a pluggable reduction
//! strategy. Barrett reduction is the default and works for any modulus;
//! Montgomery is available for odd moduli and rejects even ones.

use std::cmp::Ordering;

use crate::bigint::{ones_mag, signed_add, BigInt};
use crate::error::{BigIntError, Result};
use crate::limbs::{self, MAX_DIGIT};

/// Window widths step up as the exponent crosses these bit lengths.
const WINDOW_RANGES: [u32; 6] = [7, 25, 81, 241, 673, 1793];

/// Reduction strategy used between multiplications inside `mod_pow_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    /// Precomputed-reciprocal reduction, sound for any modulus.
    #[default]
    Barrett,
    /// REDC with a per-digit inverse. The modulus must be odd.
    Montgomery,
    /// Bit masking. The caller guarantees the modulus is a power of two.
    PowerOfTwo,
    /// Plain division at every step.
    Classic,
    /// No reduction at all; the result is the raw power.
    None,
}

impl BigInt {
    /// `self ^ exponent mod modulus` with the default Barrett reduction.
    pub fn mod_pow(&self, exponent: &Self, modulus: &Self) -> Result<Self> {
        self.mod_pow_with(exponent, modulus, Reduction::default())
    }

    /// Modular exponentiation with an explicit reduction strategy.
    ///
    /// Negative exponents invert the base first. A negative or oversized
    /// base is replaced by its common residue. When the receiver has a
    /// fixed precision and the mask value is below the modulus, the mask
    /// value takes the modulus' place.
    pub fn mod_pow_with(
        &self,
        exponent: &Self,
        modulus: &Self,
        reduction: Reduction,
    ) -> Result<Self> {
        let selected = self.select_modulus(modulus);
        if selected.is_zero() {
            return Err(BigIntError::DivisionByZero);
        }
        if exponent.is_negative() {
            let inverse = self.mod_inverse(&selected)?;
            return inverse.mod_pow_with(&exponent.abs(), &selected, reduction);
        }
        if self.is_negative() || self.cmp(&selected) == Ordering::Greater {
            let residue = self.rem_euclid(&selected)?;
            return residue.mod_pow_with(exponent, &selected, reduction);
        }
        if reduction == Reduction::Montgomery && selected.limbs[0] & 1 == 0 {
            return Err(BigIntError::EvenModulus);
        }
        let result = sliding_window(&self.limbs, &exponent.limbs, &selected.limbs, reduction);
        Ok(self.make(result, false))
    }

    fn select_modulus(&self, modulus: &Self) -> Self {
        if let Some(bits) = self.precision {
            let mask = Self {
                limbs: ones_mag(bits),
                negative: false,
                precision: None,
            };
            if mask.cmp(modulus) == Ordering::Less {
                return mask;
            }
        }
        modulus.abs()
    }

    /// Modular multiplicative inverse in `[0, modulus)`.
    pub fn mod_inverse(&self, modulus: &Self) -> Result<Self> {
        let n = modulus.abs();
        if n.is_zero() {
            return Err(BigIntError::DivisionByZero);
        }
        if self.negative {
            let inverse = self.abs().mod_inverse(&n)?;
            return Ok(n.sub(&inverse));
        }
        let (gcd, x, _) = self.extended_gcd(&n);
        if gcd != Self::one() {
            return Err(BigIntError::NoModularInverse);
        }
        x.rem_euclid(&n)
    }

    /// Binary extended GCD. Returns `(gcd, x, y)` with
    /// `x * self + y * other == gcd` and a non-negative gcd.
    pub fn extended_gcd(&self, other: &Self) -> (Self, Self, Self) {
        if self.is_zero() && other.is_zero() {
            return (Self::zero(), Self::zero(), Self::zero());
        }
        if self.is_zero() {
            let y = if other.negative { Self::one().neg() } else { Self::one() };
            return (other.abs(), Self::zero(), y);
        }
        if other.is_zero() {
            let x = if self.negative { Self::one().neg() } else { Self::one() };
            return (self.abs(), x, Self::zero());
        }

        let mut x = self.abs();
        let mut y = other.abs();
        x.precision = None;
        y.precision = None;

        // factor the shared powers of two out into g
        let mut g = Self::one();
        while x.limbs[0] & 1 == 0 && y.limbs[0] & 1 == 0 {
            x = x.shr(1);
            y = y.shr(1);
            g = g.shl(1);
        }

        let mut u = x.clone();
        let mut v = y.clone();
        let mut a = Self::one();
        let mut b = Self::zero();
        let mut c = Self::zero();
        let mut d = Self::one();
        while !u.is_zero() {
            while u.limbs[0] & 1 == 0 {
                u = u.shr(1);
                if is_odd(&a) || is_odd(&b) {
                    a = a.add(&y);
                    b = b.sub(&x);
                }
                a = a.shr(1);
                b = b.shr(1);
            }
            while v.limbs[0] & 1 == 0 {
                v = v.shr(1);
                if is_odd(&c) || is_odd(&d) {
                    c = c.add(&y);
                    d = d.sub(&x);
                }
                c = c.shr(1);
                d = d.shr(1);
            }
            if u.cmp(&v) != Ordering::Less {
                u = u.sub(&v);
                a = a.sub(&c);
                b = b.sub(&d);
            } else {
                v = v.sub(&u);
                c = c.sub(&a);
                d = d.sub(&b);
            }
        }

        let gcd = g.mul(&v);
        let bez_x = if self.negative { c.neg() } else { c };
        let bez_y = if other.negative { d.neg() } else { d };
        (gcd, bez_x, bez_y)
    }
}

fn is_odd(value: &BigInt) -> bool {
    value.limbs.first().copied().unwrap_or(0) & 1 == 1
}

fn sliding_window(
    base: &[u32],
    exponent: &[u32],
    modulus: &[u32],
    reduction: Reduction,
) -> Vec<u32> {
    let reducer = reducer_for(reduction, modulus);
    let e_length = limbs::mag_bit_length(exponent);

    let mut window_size = 1u32;
    for range in WINDOW_RANGES {
        if e_length > range {
            window_size += 1;
        } else {
            break;
        }
    }

    // position 0 is the exponent's most significant bit
    let bit_at = |i: u32| i < e_length && limbs::mag_bit(exponent, e_length - 1 - i);

    let mut powers: Vec<Vec<u32>> = vec![Vec::new(); (1usize << window_size) + 1];
    powers[1] = reducer.prepare(base.to_vec());
    powers[2] = reducer.square(&powers[1]);
    let squared = powers[2].clone();
    for i in 1..(1usize << (window_size - 1)) {
        let previous = powers[2 * i - 1].clone();
        powers[2 * i + 1] = reducer.multiply(&previous, &squared);
    }

    let mut result = reducer.prepare(vec![1]);
    let mut i = 0u32;
    while i < e_length {
        if !bit_at(i) {
            result = reducer.square(&result);
            i += 1;
            continue;
        }
        let mut j = window_size - 1;
        while j > 0 && !bit_at(i + j) {
            j -= 1;
        }
        for _ in 0..=j {
            result = reducer.square(&result);
        }
        let mut index = 0usize;
        for t in i..=i + j {
            index = (index << 1) | bit_at(t) as usize;
        }
        result = reducer.multiply(&result, &powers[index]);
        i += j + 1;
    }
    reducer.finish(result)
}

fn reducer_for(reduction: Reduction, modulus: &[u32]) -> Box<dyn Reduce> {
    match reduction {
        Reduction::Barrett => Box::new(BarrettReducer::new(modulus)),
        Reduction::Montgomery => Box::new(MontgomeryReducer::new(modulus)),
        Reduction::PowerOfTwo => Box::new(PowerOfTwoReducer::new(modulus)),
        Reduction::Classic => Box::new(ClassicReducer {
            modulus: modulus.to_vec(),
        }),
        Reduction::None => Box::new(NoReducer),
    }
}

/// One reduction strategy, fixed to a single modulus.
trait Reduce {
    /// Bring a value into the strategy's working form.
    fn prepare(&self, mag: Vec<u32>) -> Vec<u32>;
    fn multiply(&self, x: &[u32], y: &[u32]) -> Vec<u32>;
    fn square(&self, x: &[u32]) -> Vec<u32>;
    /// Bring a working-form value back to a plain residue.
    fn finish(&self, mag: Vec<u32>) -> Vec<u32>;
}

// ---------------------------------------------------------------------------
// Barrett

struct BarrettReducer {
    modulus: Vec<u32>,
    /// `base^cutoff / m` and `base^cutoff mod m`, for moduli of five limbs up.
    fold: Option<(Vec<u32>, Vec<u32>)>,
    /// `base^(2 m_len) / m`, for the unfolded path.
    regular: Option<Vec<u32>>,
}

impl BarrettReducer {
    fn new(modulus: &[u32]) -> Self {
        let m_len = modulus.len();
        let fold = (m_len >= 5).then(|| {
            let cutoff = m_len + (m_len >> 1);
            limbs::mag_div_rem(&limbs::shift_limbs(&[1], cutoff), modulus)
        });
        let regular = (m_len < 5 || m_len & 1 == 1)
            .then(|| limbs::mag_div_rem(&limbs::shift_limbs(&[1], 2 * m_len), modulus).0);
        Self {
            modulus: modulus.to_vec(),
            fold,
            regular,
        }
    }

    fn reduce(&self, x: Vec<u32>) -> Vec<u32> {
        let m_len = self.modulus.len();
        if x.len() > 2 * m_len {
            return limbs::mag_div_rem(&x, &self.modulus).1;
        }
        let Some((reciprocal, residue)) = &self.fold else {
            return self.regular_reduce(x);
        };

        // fold the top limbs down through base^cutoff == residue (mod m)
        let cutoff = m_len + (m_len >> 1);
        let folded = if x.len() > cutoff {
            let mut lsd = x[..cutoff].to_vec();
            limbs::trim(&mut lsd);
            limbs::mag_add(&lsd, &limbs::mag_mul(&x[cutoff..], residue))
        } else {
            x
        };
        if m_len & 1 == 1 {
            return self.regular_reduce(folded);
        }

        let tail = slice_from(&folded, m_len - 1);
        let tail = limbs::mag_mul(&tail, reciprocal);
        let tail = slice_from(&tail, (m_len >> 1) + 1);
        let estimate = limbs::mag_mul(&tail, &self.modulus);

        let (mut out, mut out_neg) = signed_sub(&folded, false, &estimate, false);
        while cmp_signed(&out, out_neg, &self.modulus) != Ordering::Less {
            let step = signed_sub(&out, out_neg, &self.modulus, false);
            out = step.0;
            out_neg = step.1;
        }
        out
    }

    fn regular_reduce(&self, x: Vec<u32>) -> Vec<u32> {
        let n_len = self.modulus.len();
        if x.len() > 2 * n_len {
            return limbs::mag_div_rem(&x, &self.modulus).1;
        }
        let Some(reciprocal) = &self.regular else {
            return limbs::mag_div_rem(&x, &self.modulus).1;
        };

        let tail = slice_from(&x, n_len - 1);
        let product = limbs::mag_mul(&tail, reciprocal);
        let estimate = slice_from(&product, n_len + 1);

        let mut head: Vec<u32> = x.iter().take(n_len + 1).copied().collect();
        limbs::trim(&mut head);
        let lower = limbs::mag_mul_lower(&estimate, &self.modulus, n_len + 1);

        let mut result = head;
        if limbs::mag_cmp(&result, &lower) == Ordering::Less {
            result = limbs::mag_add(&result, &limbs::shift_limbs(&[1], n_len + 1));
        }
        let mut out = limbs::mag_sub(&result, &lower);
        while limbs::mag_cmp(&out, &self.modulus) != Ordering::Less {
            out = limbs::mag_sub(&out, &self.modulus);
        }
        out
    }
}

impl Reduce for BarrettReducer {
    fn prepare(&self, mut mag: Vec<u32>) -> Vec<u32> {
        limbs::trim(&mut mag);
        self.reduce(mag)
    }

    fn multiply(&self, x: &[u32], y: &[u32]) -> Vec<u32> {
        self.reduce(limbs::mag_mul(x, y))
    }

    fn square(&self, x: &[u32]) -> Vec<u32> {
        self.reduce(limbs::mag_square(x))
    }

    fn finish(&self, mag: Vec<u32>) -> Vec<u32> {
        self.reduce(mag)
    }
}

// ---------------------------------------------------------------------------
// Montgomery

struct MontgomeryReducer {
    modulus: Vec<u32>,
    /// `(-modulus[0])^-1 mod 2^31`
    inverse: u32,
}

impl MontgomeryReducer {
    fn new(modulus: &[u32]) -> Self {
        Self {
            modulus: modulus.to_vec(),
            inverse: montgomery_digit_inverse(modulus[0]),
        }
    }

    fn redc(&self, mut x: Vec<u32>) -> Vec<u32> {
        let k = self.modulus.len();
        for i in 0..k {
            let limb = x.get(i).copied().unwrap_or(0);
            let digit = ((limb as u64 * self.inverse as u64) & MAX_DIGIT as u64) as u32;
            let addend = limbs::shift_limbs(&limbs::mag_mul(&[digit], &self.modulus), i);
            x = limbs::mag_add(&x, &addend);
        }
        let mut reduced: Vec<u32> = x.into_iter().skip(k).collect();
        limbs::trim(&mut reduced);
        if limbs::mag_cmp(&reduced, &self.modulus) != Ordering::Less {
            reduced = limbs::mag_sub(&reduced, &self.modulus);
        }
        reduced
    }
}

impl Reduce for MontgomeryReducer {
    fn prepare(&self, mag: Vec<u32>) -> Vec<u32> {
        let shifted = limbs::shift_limbs(&mag, self.modulus.len());
        limbs::mag_div_rem(&shifted, &self.modulus).1
    }

    fn multiply(&self, x: &[u32], y: &[u32]) -> Vec<u32> {
        self.redc(limbs::mag_mul(x, y))
    }

    fn square(&self, x: &[u32]) -> Vec<u32> {
        self.redc(limbs::mag_square(x))
    }

    fn finish(&self, mag: Vec<u32>) -> Vec<u32> {
        self.redc(mag)
    }
}

/// Newton's iteration for `(-n0)^-1 mod 2^31`; `n0` must be odd.
fn montgomery_digit_inverse(n0: u32) -> u32 {
    let x = (n0 as u64).wrapping_neg() & 0xFFFF_FFFF;
    let mut result = x & 0x3;
    result = result.wrapping_mul(2u64.wrapping_sub(x.wrapping_mul(result))) & 0xF;
    result = result.wrapping_mul(2u64.wrapping_sub((x & 0xFF).wrapping_mul(result))) & 0xFF;
    result = result.wrapping_mul(2u64.wrapping_sub((x & 0xFFFF).wrapping_mul(result)) & 0xFFFF)
        & 0xFFFF;
    result = result
        .wrapping_mul(2u64.wrapping_sub(x.wrapping_mul(result) & MAX_DIGIT as u64))
        & MAX_DIGIT as u64;
    result as u32
}

// ---------------------------------------------------------------------------
// Power-of-two, classic, none

struct PowerOfTwoReducer {
    mask: Vec<u32>,
}

impl PowerOfTwoReducer {
    fn new(modulus: &[u32]) -> Self {
        Self {
            mask: limbs::mag_sub(modulus, &[1]),
        }
    }

    fn reduce(&self, x: &[u32]) -> Vec<u32> {
        let len = x.len().min(self.mask.len());
        let mut out: Vec<u32> = (0..len).map(|i| x[i] & self.mask[i]).collect();
        limbs::trim(&mut out);
        out
    }
}

impl Reduce for PowerOfTwoReducer {
    fn prepare(&self, mag: Vec<u32>) -> Vec<u32> {
        self.reduce(&mag)
    }

    fn multiply(&self, x: &[u32], y: &[u32]) -> Vec<u32> {
        self.reduce(&limbs::mag_mul(x, y))
    }

    fn square(&self, x: &[u32]) -> Vec<u32> {
        self.reduce(&limbs::mag_square(x))
    }

    fn finish(&self, mag: Vec<u32>) -> Vec<u32> {
        self.reduce(&mag)
    }
}

struct ClassicReducer {
    modulus: Vec<u32>,
}

impl Reduce for ClassicReducer {
    fn prepare(&self, mag: Vec<u32>) -> Vec<u32> {
        limbs::mag_div_rem(&mag, &self.modulus).1
    }

    fn multiply(&self, x: &[u32], y: &[u32]) -> Vec<u32> {
        limbs::mag_div_rem(&limbs::mag_mul(x, y), &self.modulus).1
    }

    fn square(&self, x: &[u32]) -> Vec<u32> {
        limbs::mag_div_rem(&limbs::mag_square(x), &self.modulus).1
    }

    fn finish(&self, mag: Vec<u32>) -> Vec<u32> {
        limbs::mag_div_rem(&mag, &self.modulus).1
    }
}

struct NoReducer;

impl Reduce for NoReducer {
    fn prepare(&self, mag: Vec<u32>) -> Vec<u32> {
        mag
    }

    fn multiply(&self, x: &[u32], y: &[u32]) -> Vec<u32> {
        limbs::mag_mul(x, y)
    }

    fn square(&self, x: &[u32]) -> Vec<u32> {
        limbs::mag_square(x)
    }

    fn finish(&self, mag: Vec<u32>) -> Vec<u32> {
        mag
    }
}

fn slice_from(mag: &[u32], start: usize) -> Vec<u32> {
    if mag.len() > start {
        mag[start..].to_vec()
    } else {
        Vec::new()
    }
}

fn signed_sub(x: &[u32], x_neg: bool, y: &[u32], y_neg: bool) -> (Vec<u32>, bool) {
    signed_add(x, x_neg, y, !y_neg)
}

fn cmp_signed(x: &[u32], x_neg: bool, modulus: &[u32]) -> Ordering {
    if x_neg && !limbs::mag_is_zero(x) {
        return Ordering::Less;
    }
    limbs::mag_cmp(x, modulus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigInt {
        BigInt::from_decimal(s).unwrap()
    }

    fn pow_mod(base: &str, exponent: &str, modulus: &str) -> String {
        dec(base)
            .mod_pow(&dec(exponent), &dec(modulus))
            .unwrap()
            .to_decimal()
    }

    #[test]
    fn test_mod_pow_known_vectors() {
        assert_eq!(pow_mod("65", "17", "3233"), "2790");
        assert_eq!(pow_mod("4", "13", "497"), "445");
        assert_eq!(pow_mod("2", "10", "1000"), "24");
        assert_eq!(pow_mod("3", "1000", "7"), "4");
        assert_eq!(pow_mod("5", "0", "13"), "1");
        assert_eq!(pow_mod("0", "5", "13"), "0");
    }

    #[test]
    fn test_strategies_agree_on_odd_modulus() {
        let base = dec("123456789");
        let exponent = dec("65537");
        let modulus = dec("2305843009213693951"); // 2^61 - 1
        let barrett = base.mod_pow_with(&exponent, &modulus, Reduction::Barrett).unwrap();
        let montgomery = base
            .mod_pow_with(&exponent, &modulus, Reduction::Montgomery)
            .unwrap();
        let classic = base.mod_pow_with(&exponent, &modulus, Reduction::Classic).unwrap();
        assert_eq!(barrett, montgomery);
        assert_eq!(barrett, classic);
    }

    #[test]
    fn test_montgomery_rejects_even_modulus() {
        let result = dec("3").mod_pow_with(&dec("5"), &dec("100"), Reduction::Montgomery);
        assert_eq!(result, Err(BigIntError::EvenModulus));
    }

    #[test]
    fn test_power_of_two_reduction() {
        let modulus = dec("256");
        let value = dec("3")
            .mod_pow_with(&dec("10"), &modulus, Reduction::PowerOfTwo)
            .unwrap();
        assert_eq!(value.to_decimal(), "169"); // 59049 mod 256
    }

    #[test]
    fn test_no_reduction_returns_raw_power() {
        let value = dec("2")
            .mod_pow_with(&dec("10"), &dec("7"), Reduction::None)
            .unwrap();
        assert_eq!(value.to_decimal(), "1024");
    }

    #[test]
    fn test_fold_paths_on_wide_moduli() {
        // six limbs: the folded tail path; 2^320 == (-7)^2 mod (2^160 + 7)
        let even = BigInt::one().shl(160).add(&dec("7"));
        let result = BigInt::one().shl(80).mod_pow(&dec("4"), &even).unwrap();
        assert_eq!(result.to_decimal(), "49");

        // five limbs: fold then the regular tail; 2^280 == (-3)^2 mod (2^140 + 3)
        let odd = BigInt::one().shl(140).add(&dec("3"));
        let result = BigInt::one().shl(70).mod_pow(&dec("4"), &odd).unwrap();
        assert_eq!(result.to_decimal(), "9");

        let montgomery = BigInt::one()
            .shl(70)
            .mod_pow_with(&dec("4"), &odd, Reduction::Montgomery)
            .unwrap();
        assert_eq!(result, montgomery);
    }

    #[test]
    fn test_negative_exponent_inverts() {
        assert_eq!(pow_mod("3", "-1", "7"), "5");
        assert_eq!(pow_mod("3", "-2", "7"), "4");
    }

    #[test]
    fn test_negative_base_reduces_first() {
        assert_eq!(pow_mod("-2", "3", "5"), "2");
    }

    #[test]
    fn test_mask_substitutes_smaller_modulus() {
        let mut base = dec("16");
        base.set_precision(8);
        let result = base.mod_pow(&dec("2"), &dec("1000")).unwrap();
        assert_eq!(result.to_decimal(), "1"); // 256 mod 255
    }

    #[test]
    fn test_mod_pow_zero_modulus() {
        assert_eq!(
            dec("3").mod_pow(&dec("4"), &BigInt::zero()),
            Err(BigIntError::DivisionByZero)
        );
    }

    #[test]
    fn test_mod_inverse() {
        assert_eq!(dec("3").mod_inverse(&dec("7")).unwrap().to_decimal(), "5");
        assert_eq!(dec("10").mod_inverse(&dec("17")).unwrap().to_decimal(), "12");
        assert_eq!(dec("-3").mod_inverse(&dec("7")).unwrap().to_decimal(), "2");
        assert_eq!(
            dec("6").mod_inverse(&dec("9")),
            Err(BigIntError::NoModularInverse)
        );
        assert_eq!(
            dec("5").mod_inverse(&BigInt::zero()),
            Err(BigIntError::DivisionByZero)
        );
    }

    #[test]
    fn test_extended_gcd_keeps_shared_twos() {
        let (gcd, x, y) = dec("4").extended_gcd(&dec("2"));
        assert_eq!(gcd.to_decimal(), "2");
        assert_eq!(x.mul(&dec("4")).add(&y.mul(&dec("2"))), gcd);
    }

    #[test]
    fn test_extended_gcd_bezout_identity() {
        let cases = [
            ("240", "46"),
            ("-240", "46"),
            ("240", "-46"),
            ("17", "31"),
            ("0", "5"),
            ("5", "0"),
            ("0", "0"),
            ("1000000007", "998244353"),
        ];
        for (a, b) in cases {
            let (gcd, x, y) = dec(a).extended_gcd(&dec(b));
            assert!(!gcd.is_negative());
            assert_eq!(
                x.mul(&dec(a)).add(&y.mul(&dec(b))),
                gcd,
                "bezout identity for ({a}, {b})"
            );
        }
    }

    #[test]
    fn test_digit_inverse_is_negated_inverse() {
        // n0 * inv == -1 mod 2^31
        for n0 in [1u32, 3, 5, 7, 1_234_567_891, 0x7FFF_FFFF] {
            let inv = montgomery_digit_inverse(n0);
            let product = (n0 as u64 * inv as u64) & MAX_DIGIT as u64;
            assert_eq!(product, MAX_DIGIT as u64, "n0 = {n0}");
        }
    }
}
