//! # Address Tables
//!
//! LOAD, CALL and JMPA never carry a 16-bit target. Their offset selects a
//! two-byte slot in one of three tables at the bottom of instruction memory,
//! and the control unit fetches the target from the slot one byte per tick.
//!
//! ## Layout
//!
//! ```text
//!   0x0000..0x0040   LOAD table  (byte-memory addresses)
//!   0x0040..0x0080   CALL table  (function entry points)
//!   0x0080..0x00C0   JMP table   (absolute jump targets)
//!   0x00C0..         program instructions
//! ```
//!
//! Each slot stores its target high byte first. Only five offset bits are
//! available per instruction, so each table holds at most 32 slots; running
//! out is an image-assembly error reported before any code is produced.

use std::fmt;

/// Number of slots per table (5 offset bits).
pub const TABLE_CAPACITY: usize = 32;

/// Bytes per table (two per slot).
pub const TABLE_BYTES: usize = TABLE_CAPACITY * 2;

/// Identifies one of the three address tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Byte-memory addresses read by LOAD.
    Load,
    /// Function entry points read by CALL.
    Call,
    /// Absolute jump targets read by JMPA.
    Jump,
}

impl TableKind {
    /// All tables in instruction-memory order.
    pub const ALL: [TableKind; 3] = [TableKind::Load, TableKind::Call, TableKind::Jump];

    /// Instruction-memory address of the table's first byte.
    pub fn base(self) -> u16 {
        match self {
            TableKind::Load => 0x0000,
            TableKind::Call => 0x0040,
            TableKind::Jump => 0x0080,
        }
    }

    /// Instruction-memory address of the high byte of `slot`.
    pub fn slot_address(self, slot: u8) -> u16 {
        self.base() + (slot as u16) * 2
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Load => write!(f, "LOAD"),
            TableKind::Call => write!(f, "CALL"),
            TableKind::Jump => write!(f, "JMP"),
        }
    }
}

/// Image-assembly errors raised by the table allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// Every slot of the table is already reserved.
    #[error("{table} address table is full ({capacity} slots)")]
    Full { table: TableKind, capacity: usize },

    /// A write targeted a slot that was never reserved.
    #[error("{table} address table slot {slot} was not reserved")]
    SlotNotReserved { table: TableKind, slot: u8 },
}

/// A fixed-capacity table of two-byte target slots.
///
/// # Examples
///
/// ```
/// use stack8::{AddressTable, TableKind};
///
/// let mut table = AddressTable::new(TableKind::Call);
/// let slot = table.reserve().unwrap();
/// table.write(slot, 0x01F4).unwrap();
///
/// assert_eq!(slot, 0);
/// assert_eq!(table.bytes()[0..2], [0x01, 0xF4]);
/// assert_eq!(table.target(slot), Some(0x01F4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTable {
    kind: TableKind,
    bytes: [u8; TABLE_BYTES],
    reserved: usize,
}

impl AddressTable {
    /// Creates an empty table with every slot zeroed.
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            bytes: [0; TABLE_BYTES],
            reserved: 0,
        }
    }

    /// Which table this is.
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Number of slots handed out so far.
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Hands out the next free slot index.
    pub fn reserve(&mut self) -> Result<u8, TableError> {
        if self.reserved >= TABLE_CAPACITY {
            return Err(TableError::Full {
                table: self.kind,
                capacity: TABLE_CAPACITY,
            });
        }
        let slot = self.reserved as u8;
        self.reserved += 1;
        Ok(slot)
    }

    /// Stores `target` into a reserved slot, high byte first.
    pub fn write(&mut self, slot: u8, target: u16) -> Result<(), TableError> {
        if slot as usize >= self.reserved {
            return Err(TableError::SlotNotReserved {
                table: self.kind,
                slot,
            });
        }
        let [high, low] = target.to_be_bytes();
        self.bytes[slot as usize * 2] = high;
        self.bytes[slot as usize * 2 + 1] = low;
        Ok(())
    }

    /// Returns the target stored in a reserved slot.
    pub fn target(&self, slot: u8) -> Option<u16> {
        if slot as usize >= self.reserved {
            return None;
        }
        let index = slot as usize * 2;
        Some(u16::from_be_bytes([self.bytes[index], self.bytes[index + 1]]))
    }

    /// Raw table contents as laid out in instruction memory.
    pub fn bytes(&self) -> &[u8; TABLE_BYTES] {
        &self.bytes
    }
}

/// The LOAD, CALL and JMP tables of one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTables {
    load: AddressTable,
    call: AddressTable,
    jump: AddressTable,
}

impl AddressTables {
    /// Creates three empty tables.
    pub fn new() -> Self {
        Self {
            load: AddressTable::new(TableKind::Load),
            call: AddressTable::new(TableKind::Call),
            jump: AddressTable::new(TableKind::Jump),
        }
    }

    /// Returns the table of the given kind.
    pub fn get(&self, kind: TableKind) -> &AddressTable {
        match kind {
            TableKind::Load => &self.load,
            TableKind::Call => &self.call,
            TableKind::Jump => &self.jump,
        }
    }

    /// Returns the table of the given kind mutably.
    pub fn get_mut(&mut self, kind: TableKind) -> &mut AddressTable {
        match kind {
            TableKind::Load => &mut self.load,
            TableKind::Call => &mut self.call,
            TableKind::Jump => &mut self.jump,
        }
    }

    /// Reserves a slot in the table of the given kind.
    pub fn reserve(&mut self, kind: TableKind) -> Result<u8, TableError> {
        self.get_mut(kind).reserve()
    }

    /// Writes a target into a reserved slot of the table of the given kind.
    pub fn write(&mut self, kind: TableKind, slot: u8, target: u16) -> Result<(), TableError> {
        self.get_mut(kind).write(slot, target)
    }

    /// All table bytes in instruction-memory order (LOAD, CALL, JMP).
    pub fn to_bytes(&self) -> Vec<u8> {
        TableKind::ALL
            .iter()
            .flat_map(|kind| self.get(*kind).bytes().iter().copied())
            .collect()
    }
}

impl Default for AddressTables {
    fn default() -> Self {
        Self::new()
    }
}
