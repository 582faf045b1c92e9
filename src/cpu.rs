//! # Control Unit
//!
//! This module contains the `ControlUnit` struct representing the processor
//! state and the fetch-decode-execute loop.
//!
//! ## State
//!
//! The control unit owns:
//! - **Program counter** (PC): 16-bit instruction-memory address of the next instruction
//! - **Flags**: zero, negative, overflow (individual bool fields)
//! - **Data and return stacks**
//! - **Byte memory** with its latched address register
//! - **Instruction memory** with the three address tables
//! - **I/O buffers** consumed by READ and produced by PRINT
//! - **Tick counter**: one tick per micro-operation
//!
//! ## Execution Model
//!
//! ```text
//!   FETCH   read the record at pc, pc += 1         (1 tick)
//!   DECODE  classify the operand, validate offset
//!   EXECUTE run the opcode handler                 (base_ticks)
//! ```
//!
//! - `step()`: execute one instruction
//! - `run()`: execute until HLT or a fault
//! - `run_for_ticks()`: execute until a tick budget is consumed
//! - `run_with_limits()`: execute until HLT, failing if a budget runs out
//!
//! A fault stops the control unit for good: later `step()` calls return the
//! same error.

use crate::addressing::TABLE_CAPACITY;
use crate::alu::FlagUpdate;
use crate::image::{ImageError, ProgramImage};
use crate::imem::{InstructionMemory, Word};
use crate::instructions::{arithmetic, branches, control, io, load_store, stack as stack_ops};
use crate::trace::{Snapshot, TraceSink};
use crate::{ExecutionError, Fault, FlatMemory, MemoryBus, Opcode, OperandClass, Ram, Stack, StackId};

/// Instruction-memory address of the first program instruction.
pub const PROGRAM_START: u16 = 0x00C0;

/// Result of a successful `step()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction completed and the fetch loop may continue.
    Running,
    /// HLT was executed; the fetch loop is over.
    Halted,
}

/// Decoded operand of the instruction being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    None,
    Relative(i32),
    Slot(u8),
}

impl Operand {
    fn displacement(self) -> i32 {
        match self {
            Operand::Relative(displacement) => displacement,
            _ => 0,
        }
    }

    fn slot(self) -> u8 {
        match self {
            Operand::Slot(slot) => slot,
            _ => 0,
        }
    }
}

/// Processor state and execution context.
///
/// Generic over the byte-memory backend via the `MemoryBus` trait.
///
/// # Examples
///
/// ```
/// use stack8::{ControlUnit, Opcode, ProgramBuilder, PROGRAM_START};
///
/// let mut builder = ProgramBuilder::new();
/// builder.emit(Opcode::True);
/// builder.emit(Opcode::Hlt);
///
/// let mut cu = ControlUnit::from_image(&builder.build().unwrap()).unwrap();
/// assert_eq!(cu.pc(), PROGRAM_START);
///
/// cu.run().unwrap();
/// assert!(cu.is_halted());
/// assert_eq!(cu.data_stack().tos(), 0xFF);
/// ```
pub struct ControlUnit<M: MemoryBus = FlatMemory> {
    /// Program counter (address of next instruction)
    pub(crate) pc: u16,

    /// Zero flag
    pub(crate) flag_z: bool,

    /// Negative flag (signed less-than for CMP)
    pub(crate) flag_n: bool,

    /// Overflow flag
    pub(crate) flag_v: bool,

    /// Total micro-operations executed
    pub(crate) ticks: u64,

    /// Instructions completed
    pub(crate) instructions: u64,

    pub(crate) data: Stack,
    pub(crate) rstack: Stack,
    pub(crate) ram: Ram<M>,
    pub(crate) imem: InstructionMemory,

    /// Pending input, stored reversed so READ pops from the tail
    pub(crate) input: Vec<u8>,

    /// Bytes produced by PRINT
    pub(crate) output: Vec<u8>,

    /// Address and opcode of the instruction currently executing
    current: u16,
    current_opcode: Option<Opcode>,

    halted: bool,
    fault: Option<ExecutionError>,
    trace: Option<Box<dyn TraceSink>>,
}

impl ControlUnit<FlatMemory> {
    /// Builds a fresh control unit from a program image.
    pub fn from_image(image: &ProgramImage) -> Result<Self, ImageError> {
        let (imem, memory) = image.to_memories()?;
        Ok(Self::new(imem, memory))
    }
}

impl<M: MemoryBus> ControlUnit<M> {
    /// Creates a control unit over the given memories.
    ///
    /// `pc` starts at [`PROGRAM_START`], both stacks are empty and all flags
    /// are clear.
    pub fn new(imem: InstructionMemory, memory: M) -> Self {
        Self {
            pc: PROGRAM_START,
            flag_z: false,
            flag_n: false,
            flag_v: false,
            ticks: 0,
            instructions: 0,
            data: Stack::new(StackId::Data),
            rstack: Stack::new(StackId::Return),
            ram: Ram::new(memory),
            imem,
            input: Vec::new(),
            output: Vec::new(),
            current: PROGRAM_START,
            current_opcode: None,
            halted: false,
            fault: None,
            trace: None,
        }
    }

    /// Executes one instruction.
    ///
    /// # Returns
    ///
    /// - `Ok(StepOutcome::Running)` if the instruction completed
    /// - `Ok(StepOutcome::Halted)` if HLT ran now or earlier
    /// - `Err(ExecutionError)` on a fatal fault, now or earlier
    pub fn step(&mut self) -> Result<StepOutcome, ExecutionError> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        if self.halted {
            return Ok(StepOutcome::Halted);
        }

        let address = self.pc;
        self.current = address;
        self.current_opcode = None;

        let result = self
            .fetch()
            .and_then(|(opcode, operand)| self.execute(opcode, operand));

        match result {
            Ok(()) => {
                self.instructions += 1;
                if self.halted {
                    if let Some(sink) = self.trace.as_mut() {
                        sink.on_halt(self.ticks);
                    }
                    Ok(StepOutcome::Halted)
                } else {
                    Ok(StepOutcome::Running)
                }
            }
            Err(fault) => Err(self.fail(fault, address)),
        }
    }

    /// Runs until HLT. Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, ExecutionError> {
        self.run_with_limits(None, None)
    }

    /// Runs until HLT, aborting with a fatal error if a budget runs out.
    ///
    /// Budgets are checked between instructions and count from the state at
    /// the time of the call.
    pub fn run_with_limits(
        &mut self,
        tick_limit: Option<u64>,
        instruction_limit: Option<u64>,
    ) -> Result<u64, ExecutionError> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }

        let start_ticks = self.ticks;
        let start_instructions = self.instructions;

        loop {
            if let Some(limit) = tick_limit {
                if !self.halted && self.ticks - start_ticks >= limit {
                    return Err(self.fail(Fault::TickBudgetExhausted(limit), self.pc));
                }
            }
            if let Some(limit) = instruction_limit {
                if !self.halted && self.instructions - start_instructions >= limit {
                    return Err(self.fail(Fault::InstructionBudgetExhausted(limit), self.pc));
                }
            }
            if self.step()? == StepOutcome::Halted {
                return Ok(self.instructions - start_instructions);
            }
        }
    }

    /// Runs until HLT or until at least `tick_budget` ticks were consumed.
    ///
    /// Running out of budget is not an error here; it is meant for hosts that
    /// slice execution into frames. Returns the ticks actually consumed.
    pub fn run_for_ticks(&mut self, tick_budget: u64) -> Result<u64, ExecutionError> {
        let start_ticks = self.ticks;
        let target_ticks = start_ticks.saturating_add(tick_budget);

        while self.ticks < target_ticks {
            if self.step()? == StepOutcome::Halted {
                break;
            }
        }

        Ok(self.ticks - start_ticks)
    }

    fn fail(&mut self, fault: Fault, address: u16) -> ExecutionError {
        let err = ExecutionError::new(fault, address, self.imem.debug_at(address).cloned());
        if let Some(sink) = self.trace.as_mut() {
            sink.on_fault(&err);
        }
        self.fault = Some(err.clone());
        err
    }

    /// Reads the record at `pc`, advances `pc` and decodes the operand.
    fn fetch(&mut self) -> Result<(Opcode, Operand), Fault> {
        let address = self.pc;
        let (opcode, offset) = match self.imem.read(address) {
            Word::Instruction(instruction) => {
                let opcode = instruction
                    .opcode()
                    .ok_or_else(|| Fault::UnknownOpcode(instruction.mnemonic().to_string()))?;
                (opcode, instruction.offset())
            }
            Word::Data(byte) => return Err(Fault::NotAnInstruction(*byte)),
        };

        self.pc = address
            .checked_add(1)
            .ok_or(Fault::AddressOutOfRange(0x10000))?;
        self.current_opcode = Some(opcode);
        self.tick();

        Ok((opcode, decode(opcode, offset)?))
    }

    fn execute(&mut self, opcode: Opcode, operand: Operand) -> Result<(), Fault> {
        match opcode {
            Opcode::Sum => arithmetic::execute_sum(self),
            Opcode::Sub => arithmetic::execute_sub(self),
            Opcode::Mul => arithmetic::execute_mul(self),
            Opcode::Div => arithmetic::execute_div(self),
            Opcode::Mod => arithmetic::execute_mod(self),
            Opcode::Inc => arithmetic::execute_inc(self),
            Opcode::Dec => arithmetic::execute_dec(self),
            Opcode::Cmp => arithmetic::execute_cmp(self),
            Opcode::Tdiv => arithmetic::execute_tdiv(self),
            Opcode::Tmod => arithmetic::execute_tmod(self),
            Opcode::Dup => stack_ops::execute_dup(self),
            Opcode::Drop => stack_ops::execute_drop(self),
            Opcode::Swap => stack_ops::execute_swap(self),
            Opcode::Over => stack_ops::execute_over(self),
            Opcode::Rot => stack_ops::execute_rot(self),
            Opcode::Tor => stack_ops::execute_tor(self),
            Opcode::Rfrom => stack_ops::execute_rfrom(self),
            Opcode::True => stack_ops::execute_true(self),
            Opcode::False => stack_ops::execute_false(self),
            Opcode::Get => load_store::execute_get(self),
            Opcode::Set => load_store::execute_set(self),
            Opcode::Load => load_store::execute_load(self, operand.slot()),
            Opcode::Print => io::execute_print(self),
            Opcode::Read => io::execute_read(self),
            Opcode::Jmpr => branches::execute_jmpr(self, operand.displacement()),
            Opcode::Jz => branches::execute_jz(self, operand.displacement()),
            Opcode::Jl => branches::execute_jl(self, operand.displacement()),
            Opcode::Jo => branches::execute_jo(self, operand.displacement()),
            Opcode::Jmpa => control::execute_jmpa(self, operand.slot()),
            Opcode::Call => control::execute_call(self, operand.slot()),
            Opcode::Ret => control::execute_ret(self),
            Opcode::Hlt => control::execute_hlt(self),
        }
    }

    /// Accounts one micro-operation and reports the state to the trace sink.
    pub(crate) fn tick(&mut self) {
        self.ticks += 1;
        if let Some(sink) = self.trace.as_mut() {
            let snapshot = Snapshot {
                tick: self.ticks,
                instruction: self.instructions,
                pc: self.pc,
                address: self.current,
                mnemonic: self.current_opcode.map(Opcode::mnemonic),
                data_sp: self.data.sp(),
                data_tos: self.data.tos(),
                return_sp: self.rstack.sp(),
                return_tos: self.rstack.tos(),
                zero: self.flag_z,
                negative: self.flag_n,
                overflow: self.flag_v,
                debug: self.imem.debug_at(self.current),
            };
            sink.on_tick(&snapshot);
        }
    }

    /// Writes the flags an ALU operation reports, leaving the others alone.
    pub(crate) fn apply_flags(&mut self, update: FlagUpdate) {
        if let Some(zero) = update.zero {
            self.flag_z = zero;
        }
        if let Some(negative) = update.negative {
            self.flag_n = negative;
        }
        if let Some(overflow) = update.overflow {
            self.flag_v = overflow;
        }
    }

    /// Marks the fetch loop as finished.
    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }

    // ========== Observers ==========

    /// Returns the program counter value.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Returns true if the Zero flag is set.
    pub fn flag_z(&self) -> bool {
        self.flag_z
    }

    /// Returns true if the Negative flag is set.
    pub fn flag_n(&self) -> bool {
        self.flag_n
    }

    /// Returns true if the Overflow flag is set.
    pub fn flag_v(&self) -> bool {
        self.flag_v
    }

    /// Returns the total number of ticks since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns the number of instructions completed since construction.
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    /// Returns true once HLT has executed.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns the fault that stopped the control unit, if any.
    pub fn fault(&self) -> Option<&ExecutionError> {
        self.fault.as_ref()
    }

    pub fn data_stack(&self) -> &Stack {
        &self.data
    }

    pub fn return_stack(&self) -> &Stack {
        &self.rstack
    }

    pub fn ram(&self) -> &Ram<M> {
        &self.ram
    }

    pub fn imem(&self) -> &InstructionMemory {
        &self.imem
    }

    /// Bytes written by PRINT, in execution order.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Takes the bytes written by PRINT so far, leaving the buffer empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Number of input bytes READ has not consumed yet.
    pub fn input_remaining(&self) -> usize {
        self.input.len()
    }

    // ========== Setup ==========

    /// Replaces the pending input with `bytes` in operator order.
    ///
    /// The first byte of `bytes` is the first one READ returns.
    pub fn set_input(&mut self, bytes: &[u8]) {
        self.input = bytes.iter().rev().copied().collect();
    }

    /// Appends bytes after the pending input, in operator order.
    pub fn feed_input(&mut self, bytes: &[u8]) {
        let mut pending: Vec<u8> = bytes.iter().rev().copied().collect();
        pending.extend_from_slice(&self.input);
        self.input = pending;
    }

    /// Installs an observer that receives a snapshot after every tick.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    /// Removes and returns the installed observer.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    /// Sets the program counter.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn set_flag_z(&mut self, value: bool) {
        self.flag_z = value;
    }

    pub fn set_flag_n(&mut self, value: bool) {
        self.flag_n = value;
    }

    pub fn set_flag_v(&mut self, value: bool) {
        self.flag_v = value;
    }

    pub fn data_stack_mut(&mut self) -> &mut Stack {
        &mut self.data
    }

    pub fn return_stack_mut(&mut self) -> &mut Stack {
        &mut self.rstack
    }

    pub fn ram_mut(&mut self) -> &mut Ram<M> {
        &mut self.ram
    }
}

/// Validates the offset against the opcode's operand class.
fn decode(opcode: Opcode, offset: Option<i32>) -> Result<Operand, Fault> {
    match opcode.class() {
        OperandClass::Implicit => Ok(Operand::None),
        OperandClass::Relative => offset
            .map(Operand::Relative)
            .ok_or(Fault::MissingOffset(opcode.mnemonic())),
        OperandClass::TableIndirect(_) => {
            let offset = offset.ok_or(Fault::MissingOffset(opcode.mnemonic()))?;
            if (0..TABLE_CAPACITY as i32).contains(&offset) {
                Ok(Operand::Slot(offset as u8))
            } else {
                Err(Fault::OffsetOutOfRange {
                    mnemonic: opcode.mnemonic(),
                    offset,
                })
            }
        }
    }
}
