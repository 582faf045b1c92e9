//! # Byte Memory
//!
//! This module provides the `MemoryBus` trait that decouples the data memory
//! from its backing store, a flat 64K implementation, and `Ram`, which adds the
//! latched address register the control unit drives.
//!
//! ## Narrow address bus
//!
//! The processor moves 8-bit cells, so a 16-bit byte-memory address is
//! assembled in the `ad` register from two halves written on separate ticks:
//!
//! ```text
//!   latch_high(0x12)   ad = 0x12__
//!   latch_low(0x34)    ad = 0x1234
//!   load()             -> data[0x1234]
//! ```

use crate::{to_cell, Fault};

/// Memory bus trait for reading and writing cells by 16-bit address.
///
/// # Examples
///
/// ```
/// use stack8::{MemoryBus, FlatMemory};
///
/// let mut mem = FlatMemory::new();
/// mem.write(0x1234, 0x42);
/// assert_eq!(mem.read(0x1234), 0x42);
/// ```
///
/// ## Implementing Custom Memory
///
/// ```
/// use stack8::MemoryBus;
///
/// struct LoggingMemory {
///     cells: Vec<u8>,
///     writes: Vec<(u16, u8)>,
/// }
///
/// impl MemoryBus for LoggingMemory {
///     fn read(&self, addr: u16) -> u8 {
///         self.cells[addr as usize]
///     }
///
///     fn write(&mut self, addr: u16, value: u8) {
///         self.writes.push((addr, value));
///         self.cells[addr as usize] = value;
///     }
/// }
/// ```
pub trait MemoryBus {
    /// Reads the cell at the specified address.
    fn read(&self, addr: u16) -> u8;

    /// Writes a cell at the specified address.
    fn write(&mut self, addr: u16, value: u8);
}

/// Simple 64KB flat memory, all cells initialized to zero.
pub struct FlatMemory {
    data: Box<[u8; 65536]>,
}

impl FlatMemory {
    /// Creates a new FlatMemory instance with all bytes initialized to zero.
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 65536]),
        }
    }

    /// Creates memory pre-loaded with `image` starting at address 0.
    ///
    /// Bytes beyond 65536 are ignored; image validation rejects them earlier.
    pub fn with_image(image: &[u8]) -> Self {
        let mut memory = Self::new();
        let len = image.len().min(memory.data.len());
        memory.data[..len].copy_from_slice(&image[..len]);
        memory
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus for FlatMemory {
    fn read(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.data[addr as usize] = value;
    }
}

/// Byte memory with a latched 16-bit address register.
///
/// # Examples
///
/// ```
/// use stack8::{FlatMemory, MemoryBus, Ram};
///
/// let mut ram = Ram::new(FlatMemory::new());
/// ram.latch_high(0x08);
/// ram.latch_low(0x01);
/// ram.store(0x7F);
///
/// assert_eq!(ram.address(), 0x0801);
/// assert_eq!(ram.bus().read(0x0801), 0x7F);
/// assert_eq!(ram.load(), 0x7F);
/// ```
pub struct Ram<M: MemoryBus = FlatMemory> {
    bus: M,
    ad: u16,
}

impl<M: MemoryBus> Ram<M> {
    /// Wraps a memory bus; the address register starts at 0x0000.
    pub fn new(bus: M) -> Self {
        Self { bus, ad: 0x0000 }
    }

    /// Returns the latched address register.
    pub fn address(&self) -> u16 {
        self.ad
    }

    /// Replaces the high half of the address register.
    pub fn latch_high(&mut self, high: u8) {
        self.ad = (self.ad & 0x00FF) | ((high as u16) << 8);
    }

    /// Replaces the low half of the address register.
    pub fn latch_low(&mut self, low: u8) {
        self.ad = (self.ad & 0xFF00) | low as u16;
    }

    /// Reads the cell at the latched address.
    pub fn load(&self) -> u8 {
        self.bus.read(self.ad)
    }

    /// Writes a cell at the latched address.
    pub fn store(&mut self, value: u8) {
        self.bus.write(self.ad, value);
    }

    /// Writes a host value at the latched address, accepting -128..=255.
    pub fn store_value(&mut self, value: i32) -> Result<(), Fault> {
        let cell = to_cell(value)?;
        self.store(cell);
        Ok(())
    }

    /// Returns a reference to the backing bus.
    pub fn bus(&self) -> &M {
        &self.bus
    }

    /// Returns a mutable reference to the backing bus.
    pub fn bus_mut(&mut self) -> &mut M {
        &mut self.bus
    }
}
