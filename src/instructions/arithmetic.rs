//! # Arithmetic Instructions
//!
//! Binary operations read `a` (the cell below the top) and `b` (the top),
//! leave `f(a, b)` in place of both and update the flags, all in one tick.
//! The triple-precision TDIV/TMOD move one cell per tick.

use crate::alu::{self, FlagUpdate};
use crate::{ControlUnit, Fault, MemoryBus};

/// Shared body of SUM, SUB, MUL, DIV and MOD.
fn execute_binary<M: MemoryBus>(
    cu: &mut ControlUnit<M>,
    op: fn(u8, u8) -> (u8, FlagUpdate),
) -> Result<(), Fault> {
    let b = cu.data.tos();
    let a = cu.data.peek_next()?;

    let (value, flags) = op(a, b);
    cu.data.collapse(value)?;
    cu.apply_flags(flags);
    cu.tick();

    Ok(())
}

/// SUM ( a b -- a+b )
pub(crate) fn execute_sum<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    execute_binary(cu, alu::sum)
}

/// SUB ( a b -- a-b )
pub(crate) fn execute_sub<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    execute_binary(cu, alu::sub)
}

/// MUL ( a b -- a*b )
pub(crate) fn execute_mul<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    execute_binary(cu, alu::mul)
}

/// DIV ( a b -- a/b ). Division by zero yields 0 and sets overflow.
pub(crate) fn execute_div<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    execute_binary(cu, alu::div)
}

/// MOD ( a b -- a%b ). Division by zero yields 0 and sets overflow.
pub(crate) fn execute_mod<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    execute_binary(cu, alu::rem)
}

/// INC ( a -- a+1 )
///
/// Wraps 0xFF to 0x00. Overflow is set on the wrap and otherwise left as it
/// was; nothing here ever clears it.
pub(crate) fn execute_inc<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let (value, flags) = alu::inc(cu.data.top()?);
    cu.data.set_tos(value);
    cu.apply_flags(flags);
    cu.tick();
    Ok(())
}

/// DEC ( a -- a-1 )
///
/// Wraps 0x00 to 0xFF without touching overflow.
pub(crate) fn execute_dec<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let (value, flags) = alu::dec(cu.data.top()?);
    cu.data.set_tos(value);
    cu.apply_flags(flags);
    cu.tick();
    Ok(())
}

/// CMP ( a b -- a b )
///
/// Sets zero iff `a == b` and negative iff `a < b` (signed). The stack is not
/// modified and overflow is left alone.
pub(crate) fn execute_cmp<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let b = cu.data.tos();
    let a = cu.data.peek_next()?;
    cu.apply_flags(alu::compare(a, b));
    cu.tick();
    Ok(())
}

/// Pops one triple (high byte on top), one cell per tick.
fn pop_triple<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<u32, Fault> {
    let high = cu.data.pop()?;
    cu.tick();
    let mid = cu.data.pop()?;
    cu.tick();
    let low = cu.data.pop()?;
    cu.tick();
    Ok(alu::join_triple(high, mid, low))
}

/// Pushes one triple low byte first so the high byte ends on top.
fn push_triple<M: MemoryBus>(cu: &mut ControlUnit<M>, value: u32) {
    let (high, mid, low) = alu::split_triple(value);
    for cell in [low, mid, high] {
        cu.data.push(cell);
        cu.tick();
    }
}

/// Shared body of TDIV and TMOD.
///
/// Stack layout, top on the right:
///
/// ```text
///   ( aL aM aH bL bM bH -- rL rM rH )
/// ```
///
/// `a` is the dividend and `b` the divisor. Ticks: 6 pops, 1 divide, 3 pushes.
fn execute_triple<M: MemoryBus>(
    cu: &mut ControlUnit<M>,
    op: fn(u32, u32) -> Result<(u32, FlagUpdate), Fault>,
) -> Result<(), Fault> {
    let divisor = pop_triple(cu)?;
    let dividend = pop_triple(cu)?;

    let (result, flags) = op(dividend, divisor)?;
    cu.apply_flags(flags);
    cu.tick();

    push_triple(cu, result);
    Ok(())
}

/// TDIV: 24-bit unsigned quotient. A zero divisor is fatal.
pub(crate) fn execute_tdiv<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    execute_triple(cu, alu::triple_div)
}

/// TMOD: 24-bit unsigned remainder. A zero divisor is fatal.
pub(crate) fn execute_tmod<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    execute_triple(cu, alu::triple_mod)
}
