//! # Program Image
//!
//! The program image is the contract between a compiler and the simulator:
//! the full instruction-memory contents (address tables first, then the
//! program) and the initial byte-memory contents.
//!
//! ## JSON format
//!
//! ```json
//! {
//!   "instructions": [
//!     {"value": 0}, {"value": 10}, ...,
//!     {"opcode": "LOAD", "offset": 0, "debug": {"token_index": 0, "token_text": "x"}},
//!     {"opcode": "HLT"}
//!   ],
//!   "data": [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 42]
//! }
//! ```
//!
//! Records 0..0xC0 are raw table bytes (LOAD, CALL, JMP tables in that
//! order); program instructions follow from [`PROGRAM_START`]. Missing
//! records and missing data bytes default to 0. Byte values may be given
//! as -128..=255; negatives are stored in two's complement.
//!
//! Mnemonics are not checked here. An unknown opcode is reported when the
//! control unit reaches it, together with its debug metadata.
//!
//! [`PROGRAM_START`]: crate::PROGRAM_START

use std::io;

use serde::{Deserialize, Serialize};

use crate::imem::{DebugInfo, Instruction, InstructionMemory, Word};
use crate::{to_cell, FlatMemory};

/// Number of addressable cells in either memory.
const SPACE: usize = 0x10000;

/// Errors raised while reading or loading a program image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("malformed program image: {0}")]
    Json(#[from] serde_json::Error),

    #[error("program image has {0} instruction records, instruction memory holds 65536")]
    TooManyInstructions(usize),

    #[error("program image has {0} data bytes, byte memory holds 65536")]
    TooManyData(usize),

    #[error("data byte {index} has value {value}, expected -128..=255")]
    DataOutOfRange { index: usize, value: i32 },

    #[error("raw instruction-memory byte at 0x{address:04X} has value {value}, expected -128..=255")]
    TableByteOutOfRange { address: usize, value: i32 },
}

/// One serialized instruction-memory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageWord {
    /// An instruction record.
    Instruction(InstructionRecord),
    /// A raw byte, as found in the address tables.
    Data { value: i32 },
}

impl ImageWord {
    /// Shorthand for a raw byte record.
    pub fn data(value: u8) -> Self {
        ImageWord::Data {
            value: value as i32,
        }
    }
}

/// Serialized form of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRecord {
    pub opcode: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

impl From<&Instruction> for InstructionRecord {
    fn from(instruction: &Instruction) -> Self {
        Self {
            opcode: instruction.mnemonic().to_string(),
            offset: instruction.offset(),
            debug: instruction.debug().cloned(),
        }
    }
}

impl From<&InstructionRecord> for Instruction {
    fn from(record: &InstructionRecord) -> Self {
        Instruction::parse(record.opcode.clone(), record.offset).with_debug(record.debug.clone())
    }
}

/// A complete program: instruction memory contents plus initial byte memory.
///
/// # Examples
///
/// ```
/// use stack8::{ControlUnit, ProgramImage};
///
/// let mut json = String::from(r#"{"instructions": ["#);
/// for _ in 0..0xC0 {
///     json.push_str(r#"{"value": 0},"#);
/// }
/// json.push_str(r#"{"opcode": "TRUE"}, {"opcode": "HLT"}], "data": []}"#);
///
/// let image = ProgramImage::from_json(&json).unwrap();
/// let mut cu = ControlUnit::from_image(&image).unwrap();
/// cu.run().unwrap();
/// assert_eq!(cu.data_stack().tos(), 0xFF);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramImage {
    /// Instruction-memory records from address 0 upward.
    #[serde(default)]
    pub instructions: Vec<ImageWord>,

    /// Byte-memory contents from address 0 upward.
    #[serde(default)]
    pub data: Vec<i32>,
}

impl ProgramImage {
    /// Creates an empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an image from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ImageError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses an image from a JSON stream.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, ImageError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serializes the image as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ImageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks sizes and byte ranges without building the memories.
    pub fn validate(&self) -> Result<(), ImageError> {
        self.words()?;
        self.data_bytes()?;
        Ok(())
    }

    /// Decodes the instruction records into memory words.
    pub fn words(&self) -> Result<Vec<Word>, ImageError> {
        if self.instructions.len() > SPACE {
            return Err(ImageError::TooManyInstructions(self.instructions.len()));
        }
        self.instructions
            .iter()
            .enumerate()
            .map(|(address, word)| match word {
                ImageWord::Instruction(record) => Ok(Word::Instruction(record.into())),
                ImageWord::Data { value } => to_cell(*value)
                    .map(Word::Data)
                    .map_err(|_| ImageError::TableByteOutOfRange {
                        address,
                        value: *value,
                    }),
            })
            .collect()
    }

    /// Converts the data section into cells.
    pub fn data_bytes(&self) -> Result<Vec<u8>, ImageError> {
        if self.data.len() > SPACE {
            return Err(ImageError::TooManyData(self.data.len()));
        }
        self.data
            .iter()
            .enumerate()
            .map(|(index, value)| {
                to_cell(*value).map_err(|_| ImageError::DataOutOfRange {
                    index,
                    value: *value,
                })
            })
            .collect()
    }

    /// Builds fresh instruction and byte memories holding this image.
    pub fn to_memories(&self) -> Result<(InstructionMemory, FlatMemory), ImageError> {
        let words = self.words()?;
        let bytes = self.data_bytes()?;
        Ok((
            InstructionMemory::with_words(words),
            FlatMemory::with_image(&bytes),
        ))
    }
}
