//! # Tick Tracing
//!
//! The control unit reports its state after every micro-operation to an
//! optional [`TraceSink`]. Golden-trace tests collect the reports with
//! [`TraceLog`]; the command-line runner prints them with [`TextTrace`].
//!
//! Without a sink installed, ticking only increments the counter.

use std::cell::RefCell;
use std::fmt;
use std::io;
use std::rc::Rc;

use crate::{DebugInfo, ExecutionError};

/// Processor state after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot<'a> {
    /// Tick number, starting at 1.
    pub tick: u64,

    /// Sequence number of the executing instruction, starting at 0.
    pub instruction: u64,

    pub pc: u16,

    /// Address of the instruction being executed.
    pub address: u16,

    /// Mnemonic of the instruction being executed.
    pub mnemonic: Option<&'static str>,

    pub data_sp: u16,
    pub data_tos: u8,
    pub return_sp: u16,
    pub return_tos: u8,

    pub zero: bool,
    pub negative: bool,
    pub overflow: bool,

    /// Debug metadata of the instruction being executed.
    pub debug: Option<&'a DebugInfo>,
}

impl Snapshot<'_> {
    /// Copies the snapshot into an owned record.
    pub fn to_record(&self) -> TraceRecord {
        TraceRecord {
            tick: self.tick,
            instruction: self.instruction,
            pc: self.pc,
            address: self.address,
            mnemonic: self.mnemonic,
            data_sp: self.data_sp,
            data_tos: self.data_tos,
            return_sp: self.return_sp,
            return_tos: self.return_tos,
            zero: self.zero,
            negative: self.negative,
            overflow: self.overflow,
            token_index: self.debug.map(|info| info.token_index),
        }
    }
}

impl fmt::Display for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick={:<6} pc=0x{:04X} {:<5} ds[sp=0x{:04X} tos=0x{:02X}] rs[sp=0x{:04X} tos=0x{:02X}] {}{}{}",
            self.tick,
            self.pc,
            self.mnemonic.unwrap_or("-"),
            self.data_sp,
            self.data_tos,
            self.return_sp,
            self.return_tos,
            if self.zero { 'Z' } else { '-' },
            if self.negative { 'N' } else { '-' },
            if self.overflow { 'V' } else { '-' },
        )?;
        if let Some(info) = self.debug {
            write!(f, " #{} {}", info.token_index, info.token_text)?;
        }
        Ok(())
    }
}

/// Observer of control-unit execution.
///
/// # Examples
///
/// ```
/// use stack8::{Snapshot, TraceSink};
///
/// #[derive(Default)]
/// struct MaxDepth {
///     deepest: u16,
/// }
///
/// impl TraceSink for MaxDepth {
///     fn on_tick(&mut self, snapshot: &Snapshot<'_>) {
///         self.deepest = self.deepest.max(snapshot.data_sp.wrapping_add(2));
///     }
/// }
/// ```
pub trait TraceSink {
    /// Called after every tick.
    fn on_tick(&mut self, snapshot: &Snapshot<'_>);

    /// Called once when HLT completes.
    fn on_halt(&mut self, _ticks: u64) {}

    /// Called once when a fatal fault stops execution.
    fn on_fault(&mut self, _error: &ExecutionError) {}
}

/// Shared sinks let the installer keep a handle for inspection after the run.
impl<T: TraceSink> TraceSink for Rc<RefCell<T>> {
    fn on_tick(&mut self, snapshot: &Snapshot<'_>) {
        self.borrow_mut().on_tick(snapshot);
    }

    fn on_halt(&mut self, ticks: u64) {
        self.borrow_mut().on_halt(ticks);
    }

    fn on_fault(&mut self, error: &ExecutionError) {
        self.borrow_mut().on_fault(error);
    }
}

/// Owned copy of a [`Snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub tick: u64,
    pub instruction: u64,
    pub pc: u16,
    pub address: u16,
    pub mnemonic: Option<&'static str>,
    pub data_sp: u16,
    pub data_tos: u8,
    pub return_sp: u16,
    pub return_tos: u8,
    pub zero: bool,
    pub negative: bool,
    pub overflow: bool,
    pub token_index: Option<usize>,
}

/// Collects every tick in memory.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use stack8::{ControlUnit, Opcode, ProgramBuilder, TraceLog};
///
/// let mut builder = ProgramBuilder::new();
/// builder.emit(Opcode::False);
/// builder.emit(Opcode::Hlt);
///
/// let log = Rc::new(RefCell::new(TraceLog::new()));
/// let mut cu = ControlUnit::from_image(&builder.build().unwrap()).unwrap();
/// cu.set_trace_sink(Box::new(Rc::clone(&log)));
/// cu.run().unwrap();
///
/// let log = log.borrow();
/// assert_eq!(log.records().len(), 4);
/// assert_eq!(log.halted_at(), Some(4));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    records: Vec<TraceRecord>,
    halted_at: Option<u64>,
    fault: Option<ExecutionError>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All ticks in order.
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Tick count at HLT, if the run halted.
    pub fn halted_at(&self) -> Option<u64> {
        self.halted_at
    }

    /// The fault that stopped the run, if any.
    pub fn fault(&self) -> Option<&ExecutionError> {
        self.fault.as_ref()
    }

    /// Ticks spent on each executed instruction, as `(address, ticks)`.
    pub fn ticks_per_instruction(&self) -> Vec<(u16, u64)> {
        let mut spans: Vec<(u64, u16, u64)> = Vec::new();
        for record in &self.records {
            match spans.last_mut() {
                Some((sequence, _, count)) if *sequence == record.instruction => *count += 1,
                _ => spans.push((record.instruction, record.address, 1)),
            }
        }
        spans
            .into_iter()
            .map(|(_, address, count)| (address, count))
            .collect()
    }
}

impl TraceSink for TraceLog {
    fn on_tick(&mut self, snapshot: &Snapshot<'_>) {
        self.records.push(snapshot.to_record());
    }

    fn on_halt(&mut self, ticks: u64) {
        self.halted_at = Some(ticks);
    }

    fn on_fault(&mut self, error: &ExecutionError) {
        self.fault = Some(error.clone());
    }
}

/// Writes one line per tick to an `io::Write`.
///
/// Write errors do not interrupt the simulation; the first one is kept and
/// returned by [`TextTrace::finish`].
pub struct TextTrace<W: io::Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: io::Write> TextTrace<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) {
        if self.error.is_none() {
            if let Err(err) = self.writer.write_fmt(line) {
                self.error = Some(err);
            }
        }
    }

    /// Takes the first write error, if any, while the trace stays installed.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Flushes the writer and reports the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> TraceSink for TextTrace<W> {
    fn on_tick(&mut self, snapshot: &Snapshot<'_>) {
        self.emit(format_args!("{}\n", snapshot));
    }

    fn on_halt(&mut self, ticks: u64) {
        self.emit(format_args!("halted after {} ticks\n", ticks));
    }

    fn on_fault(&mut self, error: &ExecutionError) {
        self.emit(format_args!("fault: {}\n", error));
    }
}
