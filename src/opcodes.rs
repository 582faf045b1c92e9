//! # Opcode Metadata Table
//!
//! This module contains the opcode enumeration and the metadata table that
//! serves as the single source of truth for instruction information.
//!
//! Each opcode entry includes:
//! - Mnemonic (the name used in program images)
//! - Operand class (no operand, PC-relative, or table-indirect)
//! - Execute-phase tick cost (the fetch tick is not included)

use std::fmt;

use crate::addressing::TableKind;

/// How an instruction's `offset` field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandClass {
    /// No operand; any offset in the record is ignored.
    Implicit,

    /// Signed displacement added to the already-advanced `pc` when taken.
    Relative,

    /// Slot index (0..=31) into the given address table.
    TableIndirect(TableKind),
}

impl OperandClass {
    /// Returns true if instructions of this class must carry an offset.
    pub fn requires_offset(self) -> bool {
        !matches!(self, OperandClass::Implicit)
    }
}

/// Every instruction the control unit can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Sum,
    Sub,
    Mul,
    Div,
    Mod,
    Dup,
    Drop,
    Swap,
    Over,
    Rot,
    Tor,
    Rfrom,
    Get,
    Set,
    Print,
    Read,
    Inc,
    Dec,
    Cmp,
    True,
    False,
    Ret,
    Hlt,
    Tmod,
    Tdiv,
    Jmpr,
    Jz,
    Jl,
    Jo,
    Load,
    Call,
    Jmpa,
}

/// Metadata for a single opcode.
///
/// # Examples
///
/// ```
/// use stack8::{Opcode, OperandClass, TableKind};
///
/// let call = Opcode::Call.metadata();
/// assert_eq!(call.mnemonic, "CALL");
/// assert_eq!(call.class, OperandClass::TableIndirect(TableKind::Call));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeMetadata {
    /// The opcode this entry describes.
    pub opcode: Opcode,

    /// Instruction mnemonic as written in program images.
    pub mnemonic: &'static str,

    /// Operand encoding.
    pub class: OperandClass,

    /// Ticks spent in the execute phase.
    ///
    /// Conditional jumps cost the same whether taken or not.
    pub base_ticks: u8,
}

const fn entry(
    opcode: Opcode,
    mnemonic: &'static str,
    class: OperandClass,
    base_ticks: u8,
) -> OpcodeMetadata {
    OpcodeMetadata {
        opcode,
        mnemonic,
        class,
        base_ticks,
    }
}

use OperandClass::{Implicit, Relative, TableIndirect};

/// Opcode metadata indexed by `Opcode as usize`.
pub const OPCODE_TABLE: [OpcodeMetadata; 32] = [
    entry(Opcode::Sum, "SUM", Implicit, 1),
    entry(Opcode::Sub, "SUB", Implicit, 1),
    entry(Opcode::Mul, "MUL", Implicit, 1),
    entry(Opcode::Div, "DIV", Implicit, 1),
    entry(Opcode::Mod, "MOD", Implicit, 1),
    entry(Opcode::Dup, "DUP", Implicit, 1),
    entry(Opcode::Drop, "DROP", Implicit, 1),
    entry(Opcode::Swap, "SWAP", Implicit, 1),
    entry(Opcode::Over, "OVER", Implicit, 4),
    entry(Opcode::Rot, "ROT", Implicit, 4),
    entry(Opcode::Tor, "TOR", Implicit, 1),
    entry(Opcode::Rfrom, "RFROM", Implicit, 1),
    entry(Opcode::Get, "GET", Implicit, 3),
    entry(Opcode::Set, "SET", Implicit, 3),
    entry(Opcode::Print, "PRINT", Implicit, 1),
    entry(Opcode::Read, "READ", Implicit, 1),
    entry(Opcode::Inc, "INC", Implicit, 1),
    entry(Opcode::Dec, "DEC", Implicit, 1),
    entry(Opcode::Cmp, "CMP", Implicit, 1),
    entry(Opcode::True, "TRUE", Implicit, 1),
    entry(Opcode::False, "FALSE", Implicit, 1),
    entry(Opcode::Ret, "RET", Implicit, 2),
    entry(Opcode::Hlt, "HLT", Implicit, 1),
    entry(Opcode::Tmod, "TMOD", Implicit, 10),
    entry(Opcode::Tdiv, "TDIV", Implicit, 10),
    entry(Opcode::Jmpr, "JMPR", Relative, 1),
    entry(Opcode::Jz, "JZ", Relative, 1),
    entry(Opcode::Jl, "JL", Relative, 1),
    entry(Opcode::Jo, "JO", Relative, 1),
    entry(Opcode::Load, "LOAD", TableIndirect(TableKind::Load), 5),
    entry(Opcode::Call, "CALL", TableIndirect(TableKind::Call), 6),
    entry(Opcode::Jmpa, "JMPA", TableIndirect(TableKind::Jump), 4),
];

impl Opcode {
    /// Looks up an opcode by its exact (upper-case) mnemonic.
    ///
    /// ```
    /// use stack8::Opcode;
    ///
    /// assert_eq!(Opcode::from_mnemonic("TDIV"), Some(Opcode::Tdiv));
    /// assert_eq!(Opcode::from_mnemonic("tdiv"), None);
    /// ```
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        OPCODE_TABLE
            .iter()
            .find(|m| m.mnemonic == mnemonic)
            .map(|m| m.opcode)
    }

    /// Returns this opcode's table entry.
    pub fn metadata(self) -> &'static OpcodeMetadata {
        &OPCODE_TABLE[self as usize]
    }

    /// Returns the mnemonic used in program images.
    pub fn mnemonic(self) -> &'static str {
        self.metadata().mnemonic
    }

    /// Returns the operand class.
    pub fn class(self) -> OperandClass {
        self.metadata().class
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
