//! # Load and Store Instructions
//!
//! This module implements byte-memory access:
//! - LOAD: push the cell at an address taken from the LOAD table
//! - GET: push the cell at an address taken from the data stack
//! - SET: store a cell at an address taken from the data stack
//!
//! Addresses travel over the 8-bit datapath one half per tick through the
//! latched `ad` register of byte memory.

use crate::addressing::TableKind;
use crate::instructions::control::{fetch_target, Latch};
use crate::{ControlUnit, Fault, MemoryBus};

/// LOAD slot ( -- RAM[table[slot]] )
///
/// Ticks: 4 for the table walk, 1 for the push.
pub(crate) fn execute_load<M: MemoryBus>(cu: &mut ControlUnit<M>, slot: u8) -> Result<(), Fault> {
    fetch_target(cu, TableKind::Load, slot, Latch::RamAddress)?;

    let value = cu.ram.load();
    cu.data.push(value);
    cu.tick();

    Ok(())
}

/// Pops an address low byte first, latching each half on its own tick.
fn latch_address_from_stack<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let low = cu.data.pop()?;
    cu.ram.latch_low(low);
    cu.tick();

    let high = cu.data.pop()?;
    cu.ram.latch_high(high);
    cu.tick();

    Ok(())
}

/// GET ( high low -- RAM[high:low] )
pub(crate) fn execute_get<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    latch_address_from_stack(cu)?;

    let value = cu.ram.load();
    cu.data.push(value);
    cu.tick();

    Ok(())
}

/// SET ( value high low -- )
pub(crate) fn execute_set<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    latch_address_from_stack(cu)?;

    let value = cu.data.pop()?;
    cu.ram.store(value);
    cu.tick();

    Ok(())
}
