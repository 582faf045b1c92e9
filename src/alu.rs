//! # Arithmetic/Logic Unit
//!
//! Pure functions over cell operands. Each returns the result cell together
//! with a [`FlagUpdate`] describing which flags the operation writes; the
//! control unit applies both in one tick.
//!
//! Cells are stored unsigned. For flag purposes they are read as
//! two's-complement (`0x80..=0xFF` is negative).
//!
//! Two flag asymmetries are part of the processor's contract and are kept on
//! purpose:
//!
//! - INC sets `overflow` when it wraps past 0xFF, DEC never touches `overflow`.
//! - DIV/MOD by zero set `overflow` and yield 0, while the triple-precision
//!   TDIV/TMOD treat a zero divisor as a fatal fault.

use crate::Fault;

/// Largest value representable in three cells.
pub const TRIPLE_MAX: u32 = 0x00FF_FFFF;

/// Which flags an operation writes. `None` leaves the flag untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagUpdate {
    pub zero: Option<bool>,
    pub negative: Option<bool>,
    pub overflow: Option<bool>,
}

impl FlagUpdate {
    /// Zero and negative from `value`, overflow as given.
    fn from_result(value: u8, overflow: Option<bool>) -> Self {
        Self {
            zero: Some(value == 0),
            negative: Some(value & 0x80 != 0),
            overflow,
        }
    }
}

/// Reads a cell as a signed two's-complement value.
pub fn signed(value: u8) -> i16 {
    value as i8 as i16
}

/// Reduces a signed result into a cell, reporting signed-range overflow.
fn reduce(result: i32) -> (u8, bool) {
    let overflow = !(-128..=127).contains(&result);
    (result as u8, overflow)
}

fn signed_op(result: i32) -> (u8, FlagUpdate) {
    let (value, overflow) = reduce(result);
    (value, FlagUpdate::from_result(value, Some(overflow)))
}

/// SUM: `a + b` with signed overflow detection.
///
/// ```
/// use stack8::alu::sum;
///
/// let (value, flags) = sum(0x7F, 0x01);
/// assert_eq!(value, 0x80);
/// assert_eq!(flags.overflow, Some(true));
/// assert_eq!(flags.negative, Some(true));
/// ```
pub fn sum(a: u8, b: u8) -> (u8, FlagUpdate) {
    signed_op(signed(a) as i32 + signed(b) as i32)
}

/// SUB: `a - b` with signed overflow detection.
pub fn sub(a: u8, b: u8) -> (u8, FlagUpdate) {
    signed_op(signed(a) as i32 - signed(b) as i32)
}

/// MUL: signed product, overflow judged on the unreduced product.
pub fn mul(a: u8, b: u8) -> (u8, FlagUpdate) {
    signed_op(signed(a) as i32 * signed(b) as i32)
}

/// DIV: signed quotient truncated toward zero.
///
/// A zero divisor is not fatal: the result is 0 with `overflow` set.
pub fn div(a: u8, b: u8) -> (u8, FlagUpdate) {
    if b == 0 {
        return divide_by_zero();
    }
    signed_op(signed(a) as i32 / signed(b) as i32)
}

/// MOD: signed remainder, sign follows the dividend.
///
/// A zero divisor is not fatal: the result is 0 with `overflow` set.
pub fn rem(a: u8, b: u8) -> (u8, FlagUpdate) {
    if b == 0 {
        return divide_by_zero();
    }
    signed_op(signed(a) as i32 % signed(b) as i32)
}

fn divide_by_zero() -> (u8, FlagUpdate) {
    (
        0,
        FlagUpdate {
            zero: Some(true),
            negative: Some(false),
            overflow: Some(true),
        },
    )
}

/// INC: wraps 0xFF to 0x00 and sets `overflow` only when it wraps.
pub fn inc(value: u8) -> (u8, FlagUpdate) {
    let (result, wrapped) = value.overflowing_add(1);
    (result, FlagUpdate::from_result(result, wrapped.then_some(true)))
}

/// DEC: wraps 0x00 to 0xFF and never writes `overflow`.
pub fn dec(value: u8) -> (u8, FlagUpdate) {
    let result = value.wrapping_sub(1);
    (result, FlagUpdate::from_result(result, None))
}

/// CMP: flags for `a` against `b`, without producing a result.
///
/// `zero` is set iff the cells are identical. `negative` is set iff `a < b`
/// as signed values; signs are compared first so no subtraction overflow can
/// flip the answer at the range boundary. `overflow` is untouched.
///
/// ```
/// use stack8::alu::compare;
///
/// // -128 < 127 even though -128 - 127 overflows
/// assert_eq!(compare(0x80, 0x7F).negative, Some(true));
/// assert_eq!(compare(0x05, 0x05).zero, Some(true));
/// ```
pub fn compare(a: u8, b: u8) -> FlagUpdate {
    let a_negative = a & 0x80 != 0;
    let b_negative = b & 0x80 != 0;
    let less = if a_negative != b_negative {
        a_negative
    } else {
        a < b
    };
    FlagUpdate {
        zero: Some(a == b),
        negative: Some(less),
        overflow: None,
    }
}

/// Joins three cells (high, mid, low) into a 24-bit value.
pub fn join_triple(high: u8, mid: u8, low: u8) -> u32 {
    u32::from_be_bytes([0, high, mid, low])
}

/// Splits a 24-bit value into three cells (high, mid, low).
pub fn split_triple(value: u32) -> (u8, u8, u8) {
    let [_, high, mid, low] = value.to_be_bytes();
    (high, mid, low)
}

fn triple_flags(value: u32) -> FlagUpdate {
    FlagUpdate {
        zero: Some(value == 0),
        negative: Some(value & 0x0080_0000 != 0),
        overflow: Some(false),
    }
}

/// TDIV: unsigned 24-bit quotient. A zero divisor is fatal.
///
/// ```
/// use stack8::alu::triple_div;
/// use stack8::Fault;
///
/// assert_eq!(triple_div(100_000, 7).unwrap().0, 14_285);
/// assert_eq!(triple_div(1, 0), Err(Fault::TripleDivideByZero));
/// ```
pub fn triple_div(a: u32, b: u32) -> Result<(u32, FlagUpdate), Fault> {
    let (a, b) = (a & TRIPLE_MAX, b & TRIPLE_MAX);
    let quotient = a.checked_div(b).ok_or(Fault::TripleDivideByZero)?;
    Ok((quotient, triple_flags(quotient)))
}

/// TMOD: unsigned 24-bit remainder. A zero divisor is fatal.
pub fn triple_mod(a: u32, b: u32) -> Result<(u32, FlagUpdate), Fault> {
    let (a, b) = (a & TRIPLE_MAX, b & TRIPLE_MAX);
    let remainder = a.checked_rem(b).ok_or(Fault::TripleDivideByZero)?;
    Ok((remainder, triple_flags(remainder)))
}
