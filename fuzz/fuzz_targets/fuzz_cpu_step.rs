//! Fuzz target for control-unit execution.
//!
//! Builds an arbitrary instruction stream and address tables, then runs it
//! under a tick budget. Every fault must surface as an error, never a panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stack8::{
    ControlUnit, FlatMemory, Instruction, InstructionMemory, Word, OPCODE_TABLE, PROGRAM_START,
};

/// One program word
#[derive(Debug, Arbitrary)]
enum FuzzWord {
    /// Index into the opcode table, plus an optional offset
    Instruction(u8, Option<i8>),
    /// A raw byte placed in the program region
    Data(u8),
}

/// Complete fuzz input
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Contents of the three address tables (0x0000..0x00C0)
    tables: Vec<u8>,
    /// Words placed from the program start
    program: Vec<FuzzWord>,
    /// Operator input bytes
    input: Vec<u8>,
    /// Initial byte memory contents from address 0
    memory: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let mut imem = InstructionMemory::new();
    for (i, &byte) in input.tables.iter().take(PROGRAM_START as usize).enumerate() {
        imem.write(i as u16, Word::Data(byte));
    }
    for (i, word) in input.program.iter().take(256).enumerate() {
        let word = match *word {
            FuzzWord::Instruction(index, offset) => {
                let metadata = &OPCODE_TABLE[index as usize % OPCODE_TABLE.len()];
                Word::Instruction(Instruction::new(
                    metadata.opcode,
                    offset.map(|offset| offset as i32),
                ))
            }
            FuzzWord::Data(byte) => Word::Data(byte),
        };
        imem.write(PROGRAM_START + i as u16, word);
    }

    let memory = FlatMemory::with_image(&input.memory[..input.memory.len().min(0x10000)]);
    let mut cu = ControlUnit::new(imem, memory);
    cu.set_input(&input.input);

    // Errors are expected; panics are bugs
    let _ = cu.run_for_ticks(10_000);

    let ticks = cu.ticks();
    let _ = cu.step();
    if cu.fault().is_some() || cu.is_halted() {
        // Stopped machines stay stopped
        assert_eq!(cu.run_for_ticks(100).unwrap_or(0), 0);
        assert!(cu.ticks() <= ticks + 20);
    }
});
