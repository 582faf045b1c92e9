//! # Instruction Memory
//!
//! A flat 64K array of words. A word is either a decoded instruction record
//! or a raw byte; the address tables at the bottom of the space hold raw
//! bytes, the program above them holds instructions.
//!
//! Instruction memory has its own address register, used by the control unit
//! when it walks a table slot (latch, read high byte, increment, read low
//! byte). Program fetches go through `pc` instead.

use serde::{Deserialize, Serialize};

use crate::{Fault, Opcode};

/// Source-level metadata attached to an instruction for diagnostics.
///
/// Never affects execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Index of the originating token in the source token stream.
    pub token_index: usize,

    /// Text of the originating token.
    #[serde(default)]
    pub token_text: String,
}

impl DebugInfo {
    pub fn new(token_index: usize, token_text: impl Into<String>) -> Self {
        Self {
            token_index,
            token_text: token_text.into(),
        }
    }
}

/// One instruction record.
///
/// The mnemonic is kept as written so that an unknown opcode is reported by
/// the decoder at run time, with its debug metadata, rather than when the
/// image is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    mnemonic: String,
    opcode: Option<Opcode>,
    offset: Option<i32>,
    debug: Option<DebugInfo>,
}

impl Instruction {
    /// Creates a record for a known opcode.
    pub fn new(opcode: Opcode, offset: Option<i32>) -> Self {
        Self {
            mnemonic: opcode.mnemonic().to_string(),
            opcode: Some(opcode),
            offset,
            debug: None,
        }
    }

    /// Creates a record from image text; the mnemonic may be unknown.
    pub fn parse(mnemonic: impl Into<String>, offset: Option<i32>) -> Self {
        let mnemonic = mnemonic.into();
        let opcode = Opcode::from_mnemonic(&mnemonic);
        Self {
            mnemonic,
            opcode,
            offset,
            debug: None,
        }
    }

    /// Attaches debug metadata.
    pub fn with_debug(mut self, debug: Option<DebugInfo>) -> Self {
        self.debug = debug;
        self
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// The decoded opcode, or `None` if the mnemonic is unknown.
    pub fn opcode(&self) -> Option<Opcode> {
        self.opcode
    }

    pub fn offset(&self) -> Option<i32> {
        self.offset
    }

    pub fn debug(&self) -> Option<&DebugInfo> {
        self.debug.as_ref()
    }
}

/// A single instruction-memory word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Word {
    /// A raw byte (address table contents, or unused memory).
    Data(u8),
    /// An instruction record.
    Instruction(Instruction),
}

impl Default for Word {
    fn default() -> Self {
        Word::Data(0)
    }
}

/// Flat 64K instruction store with a table-walk address register.
///
/// # Examples
///
/// ```
/// use stack8::{InstructionMemory, Word};
///
/// let mut imem = InstructionMemory::new();
/// imem.write(0x0040, Word::Data(0x01));
/// imem.write(0x0041, Word::Data(0x2C));
///
/// imem.latch(0x0040);
/// assert_eq!(imem.load(), &Word::Data(0x01));
/// imem.increment_address().unwrap();
/// assert_eq!(imem.load(), &Word::Data(0x2C));
/// ```
#[derive(Debug, Clone)]
pub struct InstructionMemory {
    words: Vec<Word>,
    address: u16,
}

impl InstructionMemory {
    /// Creates a memory filled with zero data bytes.
    pub fn new() -> Self {
        Self {
            words: vec![Word::default(); 0x10000],
            address: 0x0000,
        }
    }

    /// Creates a memory holding `words` from address 0 upward.
    ///
    /// Words beyond 65536 are ignored; image validation rejects them earlier.
    pub fn with_words(words: impl IntoIterator<Item = Word>) -> Self {
        let mut memory = Self::new();
        for (slot, word) in memory.words.iter_mut().zip(words) {
            *slot = word;
        }
        memory
    }

    /// Returns the word at `addr`.
    pub fn read(&self, addr: u16) -> &Word {
        &self.words[addr as usize]
    }

    /// Replaces the word at `addr`.
    pub fn write(&mut self, addr: u16, word: Word) {
        self.words[addr as usize] = word;
    }

    /// Returns the table-walk address register.
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Sets the table-walk address register.
    pub fn latch(&mut self, addr: u16) {
        self.address = addr;
    }

    /// Advances the table-walk address register; it does not wrap.
    pub fn increment_address(&mut self) -> Result<(), Fault> {
        self.address = self
            .address
            .checked_add(1)
            .ok_or(Fault::AddressOutOfRange(0x10000))?;
        Ok(())
    }

    /// Returns the word at the table-walk address register.
    pub fn load(&self) -> &Word {
        self.read(self.address)
    }

    /// Returns the debug metadata of the instruction at `addr`, if any.
    pub fn debug_at(&self, addr: u16) -> Option<&DebugInfo> {
        match self.read(addr) {
            Word::Instruction(instruction) => instruction.debug(),
            Word::Data(_) => None,
        }
    }
}

impl Default for InstructionMemory {
    fn default() -> Self {
        Self::new()
    }
}
