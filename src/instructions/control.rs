//! # Control Flow Instructions
//!
//! This module implements table-indirect control flow and termination:
//! - JMPA: absolute jump through the JMP table
//! - CALL: subroutine call through the CALL table
//! - RET: return from subroutine
//! - HLT: stop the fetch loop
//!
//! ## Table walk
//!
//! A table-indirect target is fetched over the narrow internal bus:
//!
//! ```text
//!   tick 1  imem.address = table.base + slot * 2
//!   tick 2  target.high  = imem[address]
//!   tick 3  imem.address += 1
//!   tick 4  target.low   = imem[address]
//! ```
//!
//! The target register is `pc` for JMPA and CALL, and the byte-memory
//! address register for LOAD.

use crate::addressing::TableKind;
use crate::imem::Word;
use crate::{ControlUnit, Fault, MemoryBus};

/// Register that receives a table-walk target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Latch {
    ProgramCounter,
    RamAddress,
}

/// Reads the table byte at the instruction-memory address register.
fn table_byte<M: MemoryBus>(cu: &ControlUnit<M>) -> Result<u8, Fault> {
    match cu.imem.load() {
        Word::Data(byte) => Ok(*byte),
        Word::Instruction(_) => Err(Fault::NotTableData(cu.imem.address())),
    }
}

fn latch_half<M: MemoryBus>(cu: &mut ControlUnit<M>, latch: Latch, byte: u8, high: bool) {
    match (latch, high) {
        (Latch::ProgramCounter, true) => cu.pc = (cu.pc & 0x00FF) | ((byte as u16) << 8),
        (Latch::ProgramCounter, false) => cu.pc = (cu.pc & 0xFF00) | byte as u16,
        (Latch::RamAddress, true) => cu.ram.latch_high(byte),
        (Latch::RamAddress, false) => cu.ram.latch_low(byte),
    }
}

/// Walks `slot` of the given table into the target register (4 ticks).
pub(crate) fn fetch_target<M: MemoryBus>(
    cu: &mut ControlUnit<M>,
    table: TableKind,
    slot: u8,
    latch: Latch,
) -> Result<(), Fault> {
    cu.imem.latch(table.slot_address(slot));
    cu.tick();

    let high = table_byte(cu)?;
    latch_half(cu, latch, high, true);
    cu.tick();

    cu.imem.increment_address()?;
    cu.tick();

    let low = table_byte(cu)?;
    latch_half(cu, latch, low, false);
    cu.tick();

    Ok(())
}

/// JMPA slot: `pc = JMP[slot]`.
pub(crate) fn execute_jmpa<M: MemoryBus>(cu: &mut ControlUnit<M>, slot: u8) -> Result<(), Fault> {
    fetch_target(cu, TableKind::Jump, slot, Latch::ProgramCounter)
}

/// CALL slot: save the return address, then `pc = CALL[slot]`.
///
/// The return address is the already-advanced `pc`, pushed high byte first
/// so that RET can pop the low byte first.
///
/// Ticks: 2 for the return address, 4 for the table walk.
pub(crate) fn execute_call<M: MemoryBus>(cu: &mut ControlUnit<M>, slot: u8) -> Result<(), Fault> {
    let [high, low] = cu.pc.to_be_bytes();

    cu.rstack.push(high);
    cu.tick();

    cu.rstack.push(low);
    cu.tick();

    fetch_target(cu, TableKind::Call, slot, Latch::ProgramCounter)
}

/// RET: restore `pc` from the return stack, low byte first.
pub(crate) fn execute_ret<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    let low = cu.rstack.pop()?;
    latch_half(cu, Latch::ProgramCounter, low, false);
    cu.tick();

    let high = cu.rstack.pop()?;
    latch_half(cu, Latch::ProgramCounter, high, true);
    cu.tick();

    Ok(())
}

/// HLT: normal termination.
pub(crate) fn execute_hlt<M: MemoryBus>(cu: &mut ControlUnit<M>) -> Result<(), Fault> {
    cu.halt();
    cu.tick();
    Ok(())
}
