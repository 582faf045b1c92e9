//! # Program Builder
//!
//! Produces [`ProgramImage`]s the way a compiler targeting the processor
//! must: table-indirect instructions get a reserved slot in the LOAD, CALL
//! or JMP table, the slot receives the 16-bit target, and the instruction
//! carries only the slot index.
//!
//! Labels may be used before they are bound. Table slots and relative
//! offsets that refer to a label are resolved by [`ProgramBuilder::build`].
//!
//! ```
//! use stack8::{ControlUnit, Opcode, ProgramBuilder};
//!
//! let mut builder = ProgramBuilder::new();
//! let square = builder.new_label();
//!
//! builder.load_constant(7).unwrap();
//! builder.call(square).unwrap();
//! builder.emit(Opcode::Hlt);
//!
//! builder.bind(square).unwrap();
//! builder.emit(Opcode::Dup);
//! builder.emit(Opcode::Mul);
//! builder.emit(Opcode::Ret);
//!
//! let mut cu = ControlUnit::from_image(&builder.build().unwrap()).unwrap();
//! cu.run().unwrap();
//! assert_eq!(cu.data_stack().tos(), 49);
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::addressing::{AddressTables, TableError, TableKind};
use crate::image::{ImageWord, InstructionRecord, ProgramImage};
use crate::imem::{DebugInfo, Instruction};
use crate::{to_cell, Fault, Opcode, PROGRAM_START};

/// Handle to a program location that may be bound later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(usize);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Errors raised while assembling an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("label {0} is used but never bound")]
    UnboundLabel(Label),

    #[error("label {label} is already bound to 0x{address:04X}")]
    LabelRebound { label: Label, address: u16 },

    #[error(transparent)]
    Value(#[from] Fault),

    #[error("program of {0} instructions does not fit in instruction memory")]
    ProgramTooLarge(usize),

    #[error("byte memory is full")]
    DataFull,
}

/// Incremental builder for program images.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    tables: AddressTables,
    program: Vec<Instruction>,
    data: Vec<u8>,

    /// Bound address per label
    labels: Vec<Option<u16>>,

    /// Table slots whose target is a label
    label_slots: HashMap<(TableKind, Label), u8>,

    /// Program indices of relative jumps whose target is a label
    relative_fixups: Vec<(usize, Label)>,

    /// LOAD slot per byte-memory address
    load_slots: HashMap<u16, u8>,

    /// Data address per constant value
    constants: HashMap<u8, u16>,

    /// Debug metadata attached to emitted instructions
    token: Option<DebugInfo>,
}

impl ProgramBuilder {
    /// Creates a builder with empty tables, program and data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the next emitted instruction will occupy, or `None` once
    /// instruction memory is full.
    pub fn here(&self) -> Option<u16> {
        u16::try_from(PROGRAM_START as usize + self.program.len()).ok()
    }

    fn next_address(&self) -> Result<u16, BuildError> {
        self.here()
            .ok_or(BuildError::ProgramTooLarge(self.program.len() + 1))
    }

    /// Sets the source token attached to subsequently emitted instructions.
    pub fn set_token(&mut self, token: Option<DebugInfo>) {
        self.token = token;
    }

    /// Emits an instruction without operand. Returns its address.
    ///
    /// Past the end of instruction memory the instruction is still recorded
    /// and `None` is returned; [`ProgramBuilder::build`] then fails.
    pub fn emit(&mut self, opcode: Opcode) -> Option<u16> {
        self.push(Instruction::new(opcode, None))
    }

    /// Emits an instruction with a raw offset. Returns its address.
    ///
    /// The offset is not checked; out-of-range offsets fail when executed.
    pub fn emit_with_offset(&mut self, opcode: Opcode, offset: i32) -> Option<u16> {
        self.push(Instruction::new(opcode, Some(offset)))
    }

    fn push(&mut self, instruction: Instruction) -> Option<u16> {
        let address = self.here();
        self.program.push(instruction.with_debug(self.token.clone()));
        address
    }

    // ========== Tables ==========

    /// Reserves a slot in the given table.
    pub fn reserve_slot(&mut self, table: TableKind) -> Result<u8, TableError> {
        self.tables.reserve(table)
    }

    /// Writes a concrete target into a reserved slot.
    pub fn write_slot(&mut self, table: TableKind, slot: u8, target: u16) -> Result<(), TableError> {
        self.tables.write(table, slot, target)
    }

    /// The address tables as built so far.
    pub fn tables(&self) -> &AddressTables {
        &self.tables
    }

    /// Slot of `table` that targets `label`, reserved on first use.
    fn label_slot(&mut self, table: TableKind, label: Label) -> Result<u8, TableError> {
        if let Some(slot) = self.label_slots.get(&(table, label)) {
            return Ok(*slot);
        }
        let slot = self.tables.reserve(table)?;
        self.label_slots.insert((table, label), slot);
        Ok(slot)
    }

    // ========== Labels ==========

    /// Creates an unbound label.
    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Binds `label` to the address of the next emitted instruction.
    pub fn bind(&mut self, label: Label) -> Result<u16, BuildError> {
        let here = self.next_address()?;
        let bound = self
            .labels
            .get_mut(label.0)
            .ok_or(BuildError::UnboundLabel(label))?;
        match *bound {
            Some(address) => Err(BuildError::LabelRebound { label, address }),
            None => {
                *bound = Some(here);
                Ok(here)
            }
        }
    }

    /// Address a label is bound to.
    pub fn label_address(&self, label: Label) -> Option<u16> {
        self.labels.get(label.0).copied().flatten()
    }

    /// Emits `CALL` through a CALL-table slot targeting `label`.
    pub fn call(&mut self, label: Label) -> Result<u16, BuildError> {
        let address = self.next_address()?;
        let slot = self.label_slot(TableKind::Call, label)?;
        self.emit_with_offset(Opcode::Call, slot as i32);
        Ok(address)
    }

    /// Emits `JMPA` through a JMP-table slot targeting `label`.
    pub fn jump_absolute(&mut self, label: Label) -> Result<u16, BuildError> {
        let address = self.next_address()?;
        let slot = self.label_slot(TableKind::Jump, label)?;
        self.emit_with_offset(Opcode::Jmpa, slot as i32);
        Ok(address)
    }

    /// Emits a relative jump (JMPR, JZ, JL or JO) to `label`.
    pub fn jump_relative(&mut self, opcode: Opcode, label: Label) -> Option<u16> {
        let index = self.program.len();
        let address = self.emit_with_offset(opcode, 0);
        self.relative_fixups.push((index, label));
        address
    }

    // ========== Data ==========

    /// Appends cells to the byte-memory image. Returns the first address.
    pub fn allocate_data(&mut self, cells: &[u8]) -> Result<u16, BuildError> {
        let start = self.data.len();
        if start + cells.len() > 0x10000 {
            return Err(BuildError::DataFull);
        }
        let address = u16::try_from(start).map_err(|_| BuildError::DataFull)?;
        self.data.extend_from_slice(cells);
        Ok(address)
    }

    /// Emits `LOAD` of the cell at `address`, reusing its LOAD slot.
    pub fn load_address(&mut self, address: u16) -> Result<u16, BuildError> {
        let at = self.next_address()?;
        let slot = match self.load_slots.get(&address) {
            Some(slot) => *slot,
            None => {
                let slot = self.tables.reserve(TableKind::Load)?;
                self.tables.write(TableKind::Load, slot, address)?;
                self.load_slots.insert(address, slot);
                slot
            }
        };
        self.emit_with_offset(Opcode::Load, slot as i32);
        Ok(at)
    }

    /// Emits `LOAD` of a constant, pushing `value` at run time.
    ///
    /// Each distinct value gets one data cell and one LOAD slot, however
    /// often it is loaded. Accepts -128..=255. On error the builder is left
    /// as it was before the call.
    pub fn load_constant(&mut self, value: i32) -> Result<u16, BuildError> {
        let cell = to_cell(value)?;
        if let Some(address) = self.constants.get(&cell).copied() {
            return self.load_address(address);
        }

        let address = self.allocate_data(&[cell])?;
        match self.load_address(address) {
            Ok(at) => {
                self.constants.insert(cell, address);
                Ok(at)
            }
            Err(err) => {
                self.data.truncate(address as usize);
                Err(err)
            }
        }
    }

    // ========== Output ==========

    /// Resolves labels and produces the image.
    pub fn build(&self) -> Result<ProgramImage, BuildError> {
        let limit = 0x10000 - PROGRAM_START as usize;
        if self.program.len() > limit {
            return Err(BuildError::ProgramTooLarge(self.program.len()));
        }

        let mut tables = self.tables.clone();
        for ((table, label), slot) in &self.label_slots {
            let target = self.resolve(*label)?;
            tables.write(*table, *slot, target)?;
        }

        let mut program = self.program.clone();
        for (index, label) in &self.relative_fixups {
            let target = self.resolve(*label)? as i32;
            let next = PROGRAM_START as i32 + *index as i32 + 1;
            let original = &program[*index];
            if let Some(opcode) = original.opcode() {
                program[*index] = Instruction::new(opcode, Some(target - next))
                    .with_debug(original.debug().cloned());
            }
        }

        let mut instructions: Vec<ImageWord> =
            tables.to_bytes().into_iter().map(ImageWord::data).collect();
        instructions.extend(
            program
                .iter()
                .map(|instruction| ImageWord::Instruction(InstructionRecord::from(instruction))),
        );

        Ok(ProgramImage {
            instructions,
            data: self.data.iter().map(|cell| *cell as i32).collect(),
        })
    }

    fn resolve(&self, label: Label) -> Result<u16, BuildError> {
        self.label_address(label)
            .ok_or(BuildError::UnboundLabel(label))
    }
}
