//! # stack8 Processor Simulator
//!
//! A tick-accurate simulator for a small stack-oriented processor with 8-bit
//! cells, two hardware stacks and table-indirect control flow.
//!
//! This crate provides the processor model (stacks, byte memory, instruction
//! memory with its three address tables, ALU and control unit), the JSON
//! program image that compilers targeting the processor must produce, and a
//! builder that produces such images.
//!
//! ## Quick Start
//!
//! ```rust
//! use stack8::{ControlUnit, Opcode, ProgramBuilder};
//!
//! let mut builder = ProgramBuilder::new();
//! builder.load_constant(5).unwrap();
//! builder.load_constant(3).unwrap();
//! builder.emit(Opcode::Sum);
//! builder.emit(Opcode::Hlt);
//! let image = builder.build().unwrap();
//!
//! let mut cu = ControlUnit::from_image(&image).unwrap();
//! cu.run().unwrap();
//!
//! assert_eq!(cu.data_stack().tos(), 8);
//! assert!(!cu.flag_z());
//! ```
//!
//! ## Architecture
//!
//! - **Cells** are 8-bit; arithmetic treats them as two's-complement only for
//!   flag computation.
//! - **Byte memory** and **instruction memory** are two independent 64K spaces.
//! - **LOAD, CALL and JMPA** never carry an address. They carry a slot index
//!   into one of three 32-entry address tables at the bottom of instruction
//!   memory, and the target is fetched one byte per tick.
//! - **Observers**: every micro-operation is one tick, and an optional
//!   [`TraceSink`] receives a [`Snapshot`] after each tick.
//!
//! ## Modules
//!
//! - `stack` - memory-backed push-down stack with cached top of stack
//! - `memory` - `MemoryBus` trait, flat memory and the latched `Ram`
//! - `opcodes` - opcode enumeration and metadata table
//! - `addressing` - the LOAD/CALL/JMP address tables
//! - `imem` - instruction memory
//! - `alu` - 8-bit and triple-precision arithmetic
//! - `cpu` - the control unit and its fetch-decode-execute loop
//! - `image` - program image format
//! - `trace` - per-tick observers
//! - `simulation` - run harness with I/O and limits
//! - `assembler` - program image builder
//! - `disassembler` - image listings

pub mod addressing;
pub mod alu;
pub mod assembler;
pub mod cpu;
pub mod disassembler;
pub mod image;
pub mod imem;
pub mod memory;
pub mod opcodes;
pub mod simulation;
pub mod stack;
pub mod trace;

#[cfg(feature = "wasm")]
pub mod wasm;

// Internal instruction implementations (not part of public API)
mod instructions;

pub use addressing::{AddressTable, AddressTables, TableError, TableKind, TABLE_CAPACITY};
pub use assembler::{BuildError, Label, ProgramBuilder};
pub use cpu::{ControlUnit, StepOutcome, PROGRAM_START};
pub use disassembler::listing;
pub use image::{ImageError, ImageWord, InstructionRecord, ProgramImage};
pub use imem::{DebugInfo, Instruction, InstructionMemory, Word};
pub use memory::{FlatMemory, MemoryBus, Ram};
pub use opcodes::{Opcode, OpcodeMetadata, OperandClass, OPCODE_TABLE};
pub use simulation::{RunReport, Simulation, SimulationConfig, SimulationError};
pub use stack::{Stack, StackId};
pub use trace::{Snapshot, TextTrace, TraceLog, TraceRecord, TraceSink};

/// A fatal condition raised by a component of the processor.
///
/// Components (stacks, memories, the decoder) report a bare `Fault`; the
/// control unit wraps it into an [`ExecutionError`] carrying the location of
/// the failing instruction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// Pop or peek below the empty sentinel of a stack.
    #[error("{0} stack underflow")]
    StackUnderflow(StackId),

    /// A value outside the legal cell range (-128..=255) was stored.
    #[error("value {0} does not fit in a cell")]
    ValueOutOfRange(i32),

    /// An instruction-memory or byte-memory address left 0x0000..=0xFFFF.
    #[error("address {0} is outside the 16-bit address space")]
    AddressOutOfRange(i64),

    /// The instruction record names an opcode the decoder does not know.
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),

    /// The program counter reached a raw data byte instead of an instruction.
    #[error("data byte 0x{0:02X} cannot be executed")]
    NotAnInstruction(u8),

    /// An address table slot holds an instruction instead of a target byte.
    #[error("address table entry at 0x{0:04X} does not hold a data byte")]
    NotTableData(u16),

    /// A relative or table-indirect instruction carries no offset.
    #[error("{0} requires an offset operand")]
    MissingOffset(&'static str),

    /// A table-indirect offset does not fit in the 5-bit slot index.
    #[error("{mnemonic} offset {offset} is outside the address table")]
    OffsetOutOfRange {
        mnemonic: &'static str,
        offset: i32,
    },

    /// TDIV or TMOD with a zero divisor.
    #[error("triple-precision division by zero")]
    TripleDivideByZero,

    /// READ with an exhausted input buffer.
    #[error("read from empty input buffer")]
    InputUnderflow,

    /// The host-imposed tick budget ran out before HLT.
    #[error("tick budget of {0} exhausted")]
    TickBudgetExhausted(u64),

    /// The host-imposed instruction budget ran out before HLT.
    #[error("instruction budget of {0} exhausted")]
    InstructionBudgetExhausted(u64),
}

/// Errors that terminate execution.
///
/// Carries the address of the instruction that was executing when the fault
/// occurred together with its debug metadata, so a host can point at the
/// originating source token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{fault} at 0x{address:04X}{}", describe_token(.debug))]
pub struct ExecutionError {
    /// What went wrong.
    pub fault: Fault,

    /// Instruction-memory address of the failing instruction.
    pub address: u16,

    /// Debug metadata of the failing instruction, if the image carried any.
    pub debug: Option<DebugInfo>,
}

impl ExecutionError {
    /// Creates an error for the instruction at `address`.
    pub fn new(fault: Fault, address: u16, debug: Option<DebugInfo>) -> Self {
        Self {
            fault,
            address,
            debug,
        }
    }
}

fn describe_token(debug: &Option<DebugInfo>) -> String {
    match debug {
        Some(info) => format!(" (token #{} `{}`)", info.token_index, info.token_text),
        None => String::new(),
    }
}

/// Converts a host-side value into a cell.
///
/// Accepts the unsigned range 0..=255 and, as a convenience for signed
/// literals, -128..=-1 which is stored in two's complement.
///
/// # Examples
///
/// ```
/// use stack8::{to_cell, Fault};
///
/// assert_eq!(to_cell(200), Ok(200));
/// assert_eq!(to_cell(-1), Ok(0xFF));
/// assert_eq!(to_cell(256), Err(Fault::ValueOutOfRange(256)));
/// ```
pub fn to_cell(value: i32) -> Result<u8, Fault> {
    if (-128..=255).contains(&value) {
        Ok(value as u8)
    } else {
        Err(Fault::ValueOutOfRange(value))
    }
}
