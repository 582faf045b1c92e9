//! # I/O Instructions
//!
//! PRINT appends to the output buffer; READ takes from the input buffer.
//! The input buffer is stored reversed, so popping its tail yields bytes in
//! the order the operator supplied them.

use crate::{ControlUnit, Fault, MemoryBus};

/// PRINT ( c -- )
pub(crate) fn execute_print<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let value = cu.data.pop()?;
    cu.output.push(value);
    cu.tick();
    Ok(())
}

/// READ ( -- c ). Fails when the input is exhausted.
pub(crate) fn execute_read<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let value = cu.input.pop().ok_or(Fault::InputUnderflow)?;
    cu.data.push(value);
    cu.tick();
    Ok(())
}
