//! # Branch Instructions
//!
//! This module implements the PC-relative jumps:
//! - JMPR: always taken
//! - JZ: taken if the zero flag is set
//! - JL: taken if the negative flag is set (after CMP: `a < b`)
//! - JO: taken if the overflow flag is set
//!
//! The displacement is added to `pc` after the fetch advanced it, so an
//! offset of 0 falls through and -1 loops on the jump itself. Flags are read,
//! never consumed. Taken or not, a branch costs one tick.

use crate::{ControlUnit, Fault, MemoryBus};

/// Computes `pc + displacement`, failing outside the 16-bit space.
fn relative_target(pc: u16, displacement: i32) -> Result<u16, Fault> {
    let target = pc as i64 + displacement as i64;
    u16::try_from(target).map_err(|_| Fault::AddressOutOfRange(target))
}

fn branch_if<M: MemoryBus>(
    cu: &mut ControlUnit<M>,
    condition: bool,
    displacement: i32,
) -> Result<(), Fault> {
    if condition {
        cu.pc = relative_target(cu.pc, displacement)?;
    }
    cu.tick();
    Ok(())
}

/// JMPR: unconditional relative jump.
pub(crate) fn execute_jmpr<M: MemoryBus>(
    cu: &mut ControlUnit<M>,
    displacement: i32,
) -> Result<(), Fault> {
    branch_if(cu, true, displacement)
}

/// JZ: jump if zero.
pub(crate) fn execute_jz<M: MemoryBus>(
    cu: &mut ControlUnit<M>,
    displacement: i32,
) -> Result<(), Fault> {
    let condition = cu.flag_z;
    branch_if(cu, condition, displacement)
}

/// JL: jump if less (negative flag).
pub(crate) fn execute_jl<M: MemoryBus>(
    cu: &mut ControlUnit<M>,
    displacement: i32,
) -> Result<(), Fault> {
    let condition = cu.flag_n;
    branch_if(cu, condition, displacement)
}

/// JO: jump if overflow.
pub(crate) fn execute_jo<M: MemoryBus>(
    cu: &mut ControlUnit<M>,
    displacement: i32,
) -> Result<(), Fault> {
    let condition = cu.flag_v;
    branch_if(cu, condition, displacement)
}
