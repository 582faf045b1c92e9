//! # Hardware Stacks
//!
//! The processor has two identical push-down stacks: the data stack used by
//! arithmetic and the return stack used by CALL/RET and the TOR/RFROM
//! transfers.
//!
//! Each stack keeps its top element in a separate `tos` register and the rest
//! in a 64K cell array addressed by `sp`. The invariant is:
//!
//! - `tos` holds the logical top element
//! - `data[sp]` holds the element immediately below it
//!
//! `sp` wraps modulo 65536 in both directions. A fresh stack has `sp` at the
//! empty sentinel 0xFFFE; after the first push `sp` is 0xFFFF and `data[sp]`
//! holds the meaningless previous `tos`, so reading "the element below" is
//! only legal once at least two values were pushed.

use std::fmt;

use crate::{to_cell, Fault};

/// Stack pointer value of a stack with nothing pushed.
pub const EMPTY_SP: u16 = 0xFFFE;

/// Stack pointer value of a stack holding exactly one element.
const SINGLE_SP: u16 = 0xFFFF;

/// Identifies which of the two hardware stacks a fault refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackId {
    /// The data (parameter) stack.
    Data,
    /// The return stack.
    Return,
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackId::Data => write!(f, "data"),
            StackId::Return => write!(f, "return"),
        }
    }
}

/// Memory-backed circular push-down stack with a cached top-of-stack register.
///
/// # Examples
///
/// ```
/// use stack8::{Stack, StackId};
///
/// let mut stack = Stack::new(StackId::Data);
/// stack.push(1);
/// stack.push(2);
///
/// assert_eq!(stack.tos(), 2);
/// assert_eq!(stack.peek_next(), Ok(1));
/// assert_eq!(stack.pop(), Ok(2));
/// assert_eq!(stack.pop(), Ok(1));
/// assert!(stack.pop().is_err());
/// ```
pub struct Stack {
    id: StackId,
    data: Box<[u8; 65536]>,
    sp: u16,
    tos: u8,
}

impl Stack {
    /// Creates an empty stack.
    pub fn new(id: StackId) -> Self {
        Self {
            id,
            data: Box::new([0; 65536]),
            sp: EMPTY_SP,
            tos: 0,
        }
    }

    /// Which stack this is.
    pub fn id(&self) -> StackId {
        self.id
    }

    /// Returns the stack pointer register.
    pub fn sp(&self) -> u16 {
        self.sp
    }

    /// Returns the cached top-of-stack register.
    pub fn tos(&self) -> u8 {
        self.tos
    }

    /// Returns true if nothing has been pushed (the pointer sits on the sentinel).
    pub fn is_empty(&self) -> bool {
        self.sp == EMPTY_SP
    }

    /// Sets the stack pointer register directly.
    pub fn set_sp(&mut self, sp: u16) {
        self.sp = sp;
    }

    /// Overwrites the top-of-stack register without moving `sp`.
    pub fn set_tos(&mut self, value: u8) {
        self.tos = value;
    }

    /// Reads the backing cell at `index` (diagnostics only).
    pub fn cell(&self, index: u16) -> u8 {
        self.data[index as usize]
    }

    /// Advances `sp` by one, wrapping from 0xFFFF to 0x0000.
    pub fn advance_sp(&mut self) {
        self.sp = self.sp.wrapping_add(1);
    }

    /// Retreats `sp` by one, wrapping from 0x0000 to 0xFFFF.
    pub fn retreat_sp(&mut self) {
        self.sp = self.sp.wrapping_sub(1);
    }

    /// Copies `tos` into the cell at `sp`.
    pub fn spill_tos(&mut self) {
        self.data[self.sp as usize] = self.tos;
    }

    /// Pushes a cell: advance `sp`, spill the old `tos` below, store `value` on top.
    pub fn push(&mut self, value: u8) {
        self.advance_sp();
        self.spill_tos();
        self.tos = value;
    }

    /// Pushes a host value, accepting -128..=255.
    pub fn push_value(&mut self, value: i32) -> Result<(), Fault> {
        let cell = to_cell(value)?;
        self.push(cell);
        Ok(())
    }

    /// Pops the top cell: return `tos`, reload it from `data[sp]`, retreat `sp`.
    pub fn pop(&mut self) -> Result<u8, Fault> {
        if self.sp == EMPTY_SP {
            return Err(Fault::StackUnderflow(self.id));
        }
        let value = self.tos;
        self.tos = self.data[self.sp as usize];
        self.retreat_sp();
        Ok(value)
    }

    /// Returns the top element, failing if nothing was pushed.
    pub fn top(&self) -> Result<u8, Fault> {
        if self.sp == EMPTY_SP {
            return Err(Fault::StackUnderflow(self.id));
        }
        Ok(self.tos)
    }

    /// Returns the element immediately below the top without popping.
    pub fn peek_next(&self) -> Result<u8, Fault> {
        if self.sp == EMPTY_SP || self.sp == SINGLE_SP {
            return Err(Fault::StackUnderflow(self.id));
        }
        Ok(self.data[self.sp as usize])
    }

    /// Replaces the two top elements with `value`.
    ///
    /// Used by binary operations: the result lands in `tos` and the operand
    /// below it is discarded by retreating `sp`.
    pub fn collapse(&mut self, value: u8) -> Result<(), Fault> {
        self.peek_next()?;
        self.tos = value;
        self.retreat_sp();
        Ok(())
    }

    /// Exchanges `tos` with the element below it in one step.
    pub fn swap(&mut self) -> Result<(), Fault> {
        let next = self.peek_next()?;
        self.data[self.sp as usize] = self.tos;
        self.tos = next;
        Ok(())
    }

    /// Returns the live contents from bottom to top (diagnostics only).
    ///
    /// Only meaningful while the stack has not wrapped past 0xFFFF.
    pub fn contents(&self) -> Vec<u8> {
        match self.sp {
            EMPTY_SP => Vec::new(),
            SINGLE_SP => vec![self.tos],
            sp => {
                let mut cells: Vec<u8> = self.data[..=sp as usize].to_vec();
                cells.push(self.tos);
                cells
            }
        }
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("id", &self.id)
            .field("sp", &format_args!("0x{:04X}", self.sp))
            .field("tos", &format_args!("0x{:02X}", self.tos))
            .finish()
    }
}
