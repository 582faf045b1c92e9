//! # Disassembler
//!
//! Renders a program image as a readable listing: the address-table slots
//! the program refers to, then the instruction stream with every relative
//! and table-indirect operand resolved to its real target.
//!
//! ```text
//! ; LOAD table
//!   LOAD[0]  = 0x0000
//! ; CALL table
//!   CALL[0]  = 0x00C4
//! ; program
//! 0x00C0  LOAD  0       ; ram 0x0000
//! 0x00C1  CALL  0       ; -> 0x00C4
//! 0x00C2  HLT
//! ```

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::addressing::{TableKind, TABLE_CAPACITY};
use crate::image::{ImageError, ProgramImage};
use crate::imem::{DebugInfo, Word};
use crate::{Opcode, OperandClass, PROGRAM_START};

/// Resolved destination of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Instruction-memory address (jumps and calls).
    Code(u16),
    /// Byte-memory address (LOAD).
    Data(u16),
}

/// One entry of the program region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedWord {
    /// Instruction-memory address.
    pub address: u16,

    /// Mnemonic as written in the image, or `.byte` for raw bytes.
    pub mnemonic: String,

    /// Offset operand, or the value of a raw byte.
    pub operand: Option<i32>,

    /// Where the operand leads, if it can be resolved.
    pub target: Option<Target>,

    pub debug: Option<DebugInfo>,
}

/// Reads the target stored in a table slot of `words`.
fn slot_target(words: &[Word], table: TableKind, slot: i32) -> Option<u16> {
    if !(0..TABLE_CAPACITY as i32).contains(&slot) {
        return None;
    }
    let index = table.slot_address(slot as u8) as usize;
    match (words.get(index), words.get(index + 1)) {
        (Some(Word::Data(high)), Some(Word::Data(low))) => Some(u16::from_be_bytes([*high, *low])),
        (None, None) => Some(0),
        _ => None,
    }
}

/// Decodes the program region of an image.
pub fn decode(image: &ProgramImage) -> Result<Vec<ListedWord>, ImageError> {
    let words = image.words()?;

    let listed = words
        .iter()
        .enumerate()
        .skip(PROGRAM_START as usize)
        .map(|(index, word)| {
            let address = index as u16;
            match word {
                Word::Data(value) => ListedWord {
                    address,
                    mnemonic: ".byte".to_string(),
                    operand: Some(*value as i32),
                    target: None,
                    debug: None,
                },
                Word::Instruction(instruction) => {
                    let offset = instruction.offset();
                    let target = match (instruction.opcode().map(|op| op.class()), offset) {
                        (Some(OperandClass::Relative), Some(offset)) => {
                            u16::try_from(index as i64 + 1 + offset as i64)
                                .ok()
                                .map(Target::Code)
                        }
                        (Some(OperandClass::TableIndirect(TableKind::Load)), Some(offset)) => {
                            slot_target(&words, TableKind::Load, offset).map(Target::Data)
                        }
                        (Some(OperandClass::TableIndirect(table)), Some(offset)) => {
                            slot_target(&words, table, offset).map(Target::Code)
                        }
                        _ => None,
                    };
                    ListedWord {
                        address,
                        mnemonic: instruction.mnemonic().to_string(),
                        operand: offset,
                        target,
                        debug: instruction.debug().cloned(),
                    }
                }
            }
        })
        .collect();

    Ok(listed)
}

/// Formats a single program entry.
pub fn format_word(word: &ListedWord) -> String {
    let mut line = format!("0x{:04X}  {:<5}", word.address, word.mnemonic);
    if let Some(operand) = word.operand {
        if word.mnemonic == ".byte" {
            let _ = write!(line, " 0x{:02X}", operand);
        } else {
            let _ = write!(line, " {:<6}", operand);
        }
    }

    let mut notes = Vec::new();
    match word.target {
        Some(Target::Code(address)) => notes.push(format!("-> 0x{:04X}", address)),
        Some(Target::Data(address)) => notes.push(format!("ram 0x{:04X}", address)),
        None => {}
    }
    if let Some(debug) = &word.debug {
        notes.push(format!("#{} {}", debug.token_index, debug.token_text));
    }

    if notes.is_empty() {
        line.trim_end().to_string()
    } else {
        format!("{:<22}; {}", line, notes.join("  "))
    }
}

/// Renders the full listing of an image.
///
/// # Examples
///
/// ```
/// use stack8::{listing, Opcode, ProgramBuilder};
///
/// let mut builder = ProgramBuilder::new();
/// builder.load_constant(42).unwrap();
/// builder.emit(Opcode::Hlt);
///
/// let text = listing(&builder.build().unwrap()).unwrap();
/// assert!(text.contains("LOAD[0]  = 0x0000"));
/// assert!(text.contains("0x00C1  HLT"));
/// ```
pub fn listing(image: &ProgramImage) -> Result<String, ImageError> {
    let words = image.words()?;
    let program = decode(image)?;

    let mut out = String::new();
    for table in TableKind::ALL {
        // Slots referenced by the program, plus any slot holding a target
        let mut slots: BTreeSet<u8> = program
            .iter()
            .filter(|word| {
                Opcode::from_mnemonic(&word.mnemonic)
                    .map(|op| op.class() == OperandClass::TableIndirect(table))
                    .unwrap_or(false)
            })
            .filter_map(|word| word.operand)
            .filter(|slot| (0..TABLE_CAPACITY as i32).contains(slot))
            .map(|slot| slot as u8)
            .collect();
        slots.extend(
            (0..TABLE_CAPACITY as u8)
                .filter(|slot| slot_target(&words, table, *slot as i32).unwrap_or(0) != 0),
        );

        if slots.is_empty() {
            continue;
        }
        let _ = writeln!(out, "; {} table", table);
        for slot in slots {
            let name = format!("{}[{}]", table, slot);
            match slot_target(&words, table, slot as i32) {
                Some(target) => {
                    let _ = writeln!(out, "  {:<8} = 0x{:04X}", name, target);
                }
                None => {
                    let _ = writeln!(out, "  {:<8} = ?", name);
                }
            }
        }
    }

    let _ = writeln!(out, "; program");
    for word in &program {
        let _ = writeln!(out, "{}", format_word(word));
    }

    Ok(out)
}
