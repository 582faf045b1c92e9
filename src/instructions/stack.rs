//! # Stack Operations
//!
//! This module implements the data-stack shuffles and the transfers between
//! the data stack and the return stack.
//!
//! OVER and ROT have no datapath of their own: they run as a fixed sequence
//! of the one-tick primitives, parking a cell on the return stack in between.
//! A trace therefore shows the return stack briefly grow by one.

use crate::{ControlUnit, Fault, MemoryBus};

/// DUP ( a -- a a )
pub(crate) fn execute_dup<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let top = cu.data.top()?;
    cu.data.push(top);
    cu.tick();
    Ok(())
}

/// DROP ( a -- )
pub(crate) fn execute_drop<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    cu.data.pop()?;
    cu.tick();
    Ok(())
}

/// SWAP ( a b -- b a ), a single primitive.
pub(crate) fn execute_swap<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    cu.data.swap()?;
    cu.tick();
    Ok(())
}

/// TOR ( a -- ) ( R: -- a )
pub(crate) fn execute_tor<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let value = cu.data.pop()?;
    cu.rstack.push(value);
    cu.tick();
    Ok(())
}

/// RFROM ( -- a ) ( R: a -- )
pub(crate) fn execute_rfrom<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let value = cu.rstack.pop()?;
    cu.data.push(value);
    cu.tick();
    Ok(())
}

/// OVER ( a b -- a b a )
///
/// Micro-sequence: TOR, DUP, RFROM, SWAP.
pub(crate) fn execute_over<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    // Check up front so a short stack does not leave a cell parked
    cu.data.peek_next()?;

    execute_tor(cu)?;
    execute_dup(cu)?;
    execute_rfrom(cu)?;
    execute_swap(cu)
}

/// ROT ( a b c -- b c a )
///
/// Micro-sequence: TOR, SWAP, RFROM, SWAP.
pub(crate) fn execute_rot<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    // Three cells are needed: tos, data[sp] and data[sp - 1]
    let sp = cu.data.sp();
    if cu.data.is_empty() || sp == 0xFFFF || sp == 0x0000 {
        return Err(Fault::StackUnderflow(cu.data.id()));
    }

    execute_tor(cu)?;
    execute_swap(cu)?;
    execute_rfrom(cu)?;
    execute_swap(cu)
}

/// TRUE ( -- 0xFF ). Flags are not affected.
pub(crate) fn execute_true<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    cu.data.push(0xFF);
    cu.tick();
    Ok(())
}

/// FALSE ( -- 0x00 ). Flags are not affected.
pub(crate) fn execute_false<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    cu.data.push(0x00);
    cu.tick();
    Ok(())
}
