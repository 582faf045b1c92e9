//! # Instruction Implementations
//!
//! This module contains the opcode handlers, organized by category. Each
//! handler is a standalone function that takes a mutable reference to the
//! control unit (plus the decoded operand, if any) and accounts one tick per
//! micro-operation through `ControlUnit::tick`.
//!
//! ## Categories
//!
//! - **arithmetic**: ALU operations (SUM, SUB, MUL, DIV, MOD, INC, DEC, CMP, TDIV, TMOD)
//! - **stack**: Stack manipulation (DUP, DROP, SWAP, OVER, ROT, TOR, RFROM, TRUE, FALSE)
//! - **load_store**: Byte memory access (LOAD, GET, SET)
//! - **branches**: PC-relative jumps (JMPR, JZ, JL, JO)
//! - **control**: Table-indirect control flow and termination (JMPA, CALL, RET, HLT)
//! - **io**: Input/output buffers (READ, PRINT)

pub mod arithmetic;
pub mod branches;
pub mod control;
pub mod io;
pub mod load_store;
pub mod stack;
