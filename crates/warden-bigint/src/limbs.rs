//! Magnitude arithmetic on little-endian vectors of 31-bit limbs
//!
//! Every value here is an unsigned magnitude: limb `i` carries bits
//! `31*i .. 31*i+30`. Intermediate products of two limbs fit in a `u64`,
//! which is what keeps the schoolbook loops single-width.

use std::cmp::Ordering;

/// Bits per limb.
pub(crate) const BASE: u32 = 31;

/// 2^31, as a u64 for carry arithmetic.
pub(crate) const BASE_FULL: u64 = 0x8000_0000;

/// Largest value a limb may hold.
pub(crate) const MAX_DIGIT: u32 = 0x7FFF_FFFF;

/// High bit of a full limb, used to normalize divisors.
pub(crate) const MSB: u32 = 0x4000_0000;

/// Below twice this limb count, multiplication stays schoolbook.
pub(crate) const KARATSUBA_CUTOFF: usize = 25;

/// Largest power of ten per decimal chunk (10^9).
pub(crate) const MAX10: u32 = 1_000_000_000;

/// Digits per decimal chunk.
pub(crate) const MAX10_LEN: usize = 9;

/// Drop most-significant zero limbs.
pub(crate) fn trim(value: &mut Vec<u32>) {
    while let Some(&0) = value.last() {
        value.pop();
    }
}

fn effective_len(value: &[u32]) -> usize {
    let mut len = value.len();
    while len > 0 && value[len - 1] == 0 {
        len -= 1;
    }
    len
}

/// Compare two magnitudes, tolerating untrimmed inputs.
pub(crate) fn mag_cmp(x: &[u32], y: &[u32]) -> Ordering {
    let x_len = effective_len(x);
    let y_len = effective_len(y);
    if x_len != y_len {
        return x_len.cmp(&y_len);
    }
    for i in (0..x_len).rev() {
        if x[i] != y[i] {
            return x[i].cmp(&y[i]);
        }
    }
    Ordering::Equal
}

pub(crate) fn mag_is_zero(value: &[u32]) -> bool {
    effective_len(value) == 0
}

pub(crate) fn mag_add(x: &[u32], y: &[u32]) -> Vec<u32> {
    let (long, short) = if x.len() >= y.len() { (x, y) } else { (y, x) };
    let mut sum = Vec::with_capacity(long.len() + 1);
    let mut carry = 0u64;
    for (i, &limb) in long.iter().enumerate() {
        let temp = limb as u64 + short.get(i).copied().unwrap_or(0) as u64 + carry;
        sum.push((temp & (BASE_FULL - 1)) as u32);
        carry = temp >> BASE;
    }
    if carry != 0 {
        sum.push(carry as u32);
    }
    trim(&mut sum);
    sum
}

/// Subtract `y` from `x`. Requires `x >= y`.
pub(crate) fn mag_sub(x: &[u32], y: &[u32]) -> Vec<u32> {
    debug_assert!(mag_cmp(x, y) != Ordering::Less);
    let mut diff = Vec::with_capacity(x.len());
    let mut borrow = 0i64;
    for (i, &limb) in x.iter().enumerate() {
        let mut temp = limb as i64 - borrow - y.get(i).copied().unwrap_or(0) as i64;
        if temp < 0 {
            temp += BASE_FULL as i64;
            borrow = 1;
        } else {
            borrow = 0;
        }
        diff.push(temp as u32);
    }
    trim(&mut diff);
    diff
}

pub(crate) fn mag_mul(x: &[u32], y: &[u32]) -> Vec<u32> {
    if x.is_empty() || y.is_empty() {
        return Vec::new();
    }
    if x.len().min(y.len()) < 2 * KARATSUBA_CUTOFF {
        schoolbook_mul(x, y)
    } else {
        karatsuba_mul(x, y)
    }
}

fn schoolbook_mul(x_in: &[u32], y_in: &[u32]) -> Vec<u32> {
    if x_in.is_empty() || y_in.is_empty() {
        return Vec::new();
    }
    let (x, y) = if x_in.len() < y_in.len() {
        (y_in, x_in)
    } else {
        (x_in, y_in)
    };
    let mut product = vec![0u32; x.len() + y.len()];

    let mut carry = 0u64;
    for j in 0..x.len() {
        let temp = x[j] as u64 * y[0] as u64 + carry;
        product[j] = (temp & (BASE_FULL - 1)) as u32;
        carry = temp >> BASE;
    }
    product[x.len()] = carry as u32;

    for i in 1..y.len() {
        carry = 0;
        for j in 0..x.len() {
            let k = i + j;
            let temp = product[k] as u64 + x[j] as u64 * y[i] as u64 + carry;
            product[k] = (temp & (BASE_FULL - 1)) as u32;
            carry = temp >> BASE;
        }
        product[i + x.len()] = carry as u32;
    }

    trim(&mut product);
    product
}

fn split_trimmed(value: &[u32], at: usize) -> (Vec<u32>, Vec<u32>) {
    let mut low = value[..at].to_vec();
    trim(&mut low);
    let mut high = value[at..].to_vec();
    trim(&mut high);
    (low, high)
}

fn karatsuba_mul(x: &[u32], y: &[u32]) -> Vec<u32> {
    let m = (x.len() / 2).min(y.len() / 2);
    if m < KARATSUBA_CUTOFF {
        return schoolbook_mul(x, y);
    }
    let (x0, x1) = split_trimmed(x, m);
    let (y0, y1) = split_trimmed(y, m);

    let z2 = karatsuba_mul(&x1, &y1);
    let z0 = karatsuba_mul(&x0, &y0);
    let z1 = {
        let xs = mag_add(&x1, &x0);
        let ys = mag_add(&y1, &y0);
        mag_sub(&karatsuba_mul(&xs, &ys), &mag_add(&z2, &z0))
    };

    let mut result = shift_limbs(&z2, 2 * m);
    result = mag_add(&result, &shift_limbs(&z1, m));
    mag_add(&result, &z0)
}

pub(crate) fn mag_square(value: &[u32]) -> Vec<u32> {
    if value.is_empty() {
        return Vec::new();
    }
    if value.len() < 2 * KARATSUBA_CUTOFF {
        base_square(value)
    } else {
        karatsuba_square(value)
    }
}

fn base_square(value: &[u32]) -> Vec<u32> {
    let mut square = vec![0u32; 2 * value.len()];
    let max_index = value.len() - 1;

    for i in 0..=max_index {
        let i2 = i << 1;
        let temp = square[i2] as u64 + value[i] as u64 * value[i] as u64;
        square[i2] = (temp & (BASE_FULL - 1)) as u32;
        let mut carry = temp >> BASE;

        let mut k = i2 + 1;
        for j in (i + 1)..=max_index {
            let temp = square[k] as u64 + 2 * value[j] as u64 * value[i] as u64 + carry;
            square[k] = (temp & (BASE_FULL - 1)) as u32;
            carry = temp >> BASE;
            k += 1;
        }
        // tail carry can occupy 32 bits until the next row folds it back in
        square[i + max_index + 1] = carry as u32;
    }

    trim(&mut square);
    square
}

fn karatsuba_square(value: &[u32]) -> Vec<u32> {
    let m = value.len() / 2;
    if m < KARATSUBA_CUTOFF {
        return base_square(value);
    }
    let (x0, x1) = split_trimmed(value, m);

    let z2 = karatsuba_square(&x1);
    let z0 = karatsuba_square(&x0);
    let z1 = {
        let xs = mag_add(&x1, &x0);
        mag_sub(&karatsuba_square(&xs), &mag_add(&z2, &z0))
    };

    let mut result = shift_limbs(&z2, 2 * m);
    result = mag_add(&result, &shift_limbs(&z1, m));
    mag_add(&result, &z0)
}

/// Long multiplication truncated at `stop` limbs, for Barrett reduction.
pub(crate) fn mag_mul_lower(x_in: &[u32], y_in: &[u32], stop: usize) -> Vec<u32> {
    if x_in.is_empty() || y_in.is_empty() {
        return Vec::new();
    }
    let (x, y) = if x_in.len() < y_in.len() {
        (y_in, x_in)
    } else {
        (x_in, y_in)
    };
    let mut product = vec![0u32; x.len() + y.len()];

    let mut carry = 0u64;
    for j in 0..x.len() {
        let temp = x[j] as u64 * y[0] as u64 + carry;
        product[j] = (temp & (BASE_FULL - 1)) as u32;
        carry = temp >> BASE;
    }
    if x.len() < stop {
        product[x.len()] = carry as u32;
    }

    for i in 1..y.len() {
        carry = 0;
        let mut k = i;
        for j in 0..x.len() {
            if k >= stop {
                break;
            }
            let temp = product[k] as u64 + x[j] as u64 * y[i] as u64 + carry;
            product[k] = (temp & (BASE_FULL - 1)) as u32;
            carry = temp >> BASE;
            k += 1;
        }
        if k < stop {
            product[k] = carry as u32;
        }
    }

    trim(&mut product);
    product
}

/// Multiply by `2^(31 * count)` by prepending zero limbs.
pub(crate) fn shift_limbs(value: &[u32], count: usize) -> Vec<u32> {
    if mag_is_zero(value) {
        return Vec::new();
    }
    let mut shifted = vec![0u32; count + value.len()];
    shifted[count..].copy_from_slice(value);
    shifted
}

pub(crate) fn mag_shl(value: &[u32], shift: u32) -> Vec<u32> {
    if mag_is_zero(value) {
        return Vec::new();
    }
    let limb_shift = (shift / BASE) as usize;
    let bit_shift = shift % BASE;
    let mut shifted = vec![0u32; limb_shift];
    let mut carry = 0u64;
    for &limb in value {
        let temp = ((limb as u64) << bit_shift) | carry;
        shifted.push((temp & (BASE_FULL - 1)) as u32);
        carry = temp >> BASE;
    }
    if carry != 0 {
        shifted.push(carry as u32);
    }
    trim(&mut shifted);
    shifted
}

pub(crate) fn mag_shr(value: &[u32], shift: u32) -> Vec<u32> {
    let limb_shift = (shift / BASE) as usize;
    let bit_shift = shift % BASE;
    if limb_shift >= value.len() {
        return Vec::new();
    }
    let kept = &value[limb_shift..];
    let mut shifted = vec![0u32; kept.len()];
    let mut carry = 0u32;
    for i in (0..kept.len()).rev() {
        shifted[i] = (kept[i] >> bit_shift) | carry;
        carry = if bit_shift == 0 {
            0
        } else {
            (kept[i] & ((1 << bit_shift) - 1)) << (BASE - bit_shift)
        };
    }
    trim(&mut shifted);
    shifted
}

/// Quotient and remainder against a single limb.
pub(crate) fn mag_div_rem_digit(x: &[u32], divisor: u32) -> (Vec<u32>, u32) {
    debug_assert!(divisor != 0);
    let mut quotient = vec![0u32; x.len()];
    let mut carry = 0u64;
    for i in (0..x.len()).rev() {
        let temp = carry * BASE_FULL + x[i] as u64;
        quotient[i] = (temp / divisor as u64) as u32;
        carry = temp % divisor as u64;
    }
    trim(&mut quotient);
    (quotient, carry as u32)
}

/// Schoolbook long division (HAC 14.20). Requires a non-zero divisor.
pub(crate) fn mag_div_rem(x_in: &[u32], y_in: &[u32]) -> (Vec<u32>, Vec<u32>) {
    debug_assert!(!mag_is_zero(y_in));
    if effective_len(y_in) == 1 {
        let (quotient, remainder) = mag_div_rem_digit(x_in, y_in[0]);
        let remainder = if remainder == 0 {
            Vec::new()
        } else {
            vec![remainder]
        };
        return (quotient, remainder);
    }

    match mag_cmp(x_in, y_in) {
        Ordering::Less => {
            let mut remainder = x_in.to_vec();
            trim(&mut remainder);
            return (Vec::new(), remainder);
        }
        Ordering::Equal => return (vec![1], Vec::new()),
        Ordering::Greater => {}
    }

    // normalize so the divisor's top limb has its high bit set
    let mut shift = 0u32;
    let mut msb = y_in[effective_len(y_in) - 1];
    while msb & MSB == 0 {
        msb <<= 1;
        shift += 1;
    }
    let mut x = mag_shl(x_in, shift);
    let y = mag_shl(y_in, shift);

    let x_top = x.len() - 1;
    let y_top = y.len() - 1;
    let mut quotient = vec![0u32; x_top - y_top + 1];

    let widened = shift_limbs(&y, x_top - y_top);
    while mag_cmp(&x, &widened) != Ordering::Less {
        quotient[x_top - y_top] += 1;
        x = mag_sub(&x, &widened);
    }

    let x_max = if x.is_empty() { 0 } else { x.len() - 1 };
    for i in (y_top + 1..=x_max).rev() {
        let x_window = [
            x.get(i).copied().unwrap_or(0),
            x.get(i - 1).copied().unwrap_or(0),
            x.get(i - 2).copied().unwrap_or(0),
        ];
        let y_window = [y[y_top], if y_top > 0 { y[y_top - 1] } else { 0 }];
        let q_index = i - y_top - 1;

        let mut trial = if x_window[0] == y_window[0] {
            MAX_DIGIT
        } else {
            ((x_window[0] as u64 * BASE_FULL + x_window[1] as u64) / y_window[0] as u64) as u32
        };

        // correct the trial quotient against the top three limbs
        let rhs = [x_window[2], x_window[1], x_window[0]];
        let y_pair = [y_window[1], y_window[0]];
        let mut lhs = mag_mul(&[trial], &y_pair);
        while mag_cmp(&lhs, &rhs) == Ordering::Greater {
            trial -= 1;
            lhs = mag_mul(&[trial], &y_pair);
        }

        let subtrahend = shift_limbs(&mag_mul(&[trial], &y), q_index);
        if mag_cmp(&x, &subtrahend) == Ordering::Less {
            // overshot by one
            let back = shift_limbs(&y, q_index);
            x = mag_sub(&mag_add(&x, &back), &subtrahend);
            trial -= 1;
        } else {
            x = mag_sub(&x, &subtrahend);
        }
        quotient[q_index] = trial;
    }

    let remainder = mag_shr(&x, shift);
    trim(&mut quotient);
    (quotient, remainder)
}

/// Bits needed to represent the magnitude. Zero for zero.
pub(crate) fn mag_bit_length(value: &[u32]) -> u32 {
    let len = effective_len(value);
    if len == 0 {
        return 0;
    }
    (len as u32 - 1) * BASE + (32 - value[len - 1].leading_zeros())
}

pub(crate) fn mag_bit(value: &[u32], index: u32) -> bool {
    let limb = (index / BASE) as usize;
    value
        .get(limb)
        .map_or(false, |&l| (l >> (index % BASE)) & 1 == 1)
}

/// Big-endian bytes to limbs.
pub(crate) fn bytes_to_limbs(bytes: &[u8]) -> Vec<u32> {
    let mut limbs = Vec::with_capacity(bytes.len() / 3);
    let mut acc = 0u64;
    let mut acc_bits = 0u32;
    for &byte in bytes.iter().rev() {
        acc |= (byte as u64) << acc_bits;
        acc_bits += 8;
        if acc_bits >= BASE {
            limbs.push((acc & (BASE_FULL - 1)) as u32);
            acc >>= BASE;
            acc_bits -= BASE;
        }
    }
    if acc != 0 {
        limbs.push(acc as u32);
    }
    trim(&mut limbs);
    limbs
}

/// Limbs to minimal big-endian bytes. Zero becomes an empty string.
pub(crate) fn limbs_to_bytes(limbs: &[u32]) -> Vec<u8> {
    let mut little = Vec::with_capacity(limbs.len() * 4);
    let mut acc = 0u64;
    let mut acc_bits = 0u32;
    for &limb in limbs {
        acc |= (limb as u64) << acc_bits;
        acc_bits += BASE;
        while acc_bits >= 8 {
            little.push((acc & 0xFF) as u8);
            acc >>= 8;
            acc_bits -= 8;
        }
    }
    while acc != 0 {
        little.push((acc & 0xFF) as u8);
        acc >>= 8;
    }
    while let Some(&0) = little.last() {
        little.pop();
    }
    little.reverse();
    little
}
