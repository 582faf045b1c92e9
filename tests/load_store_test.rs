//! Tests for byte-memory access: LOAD, GET and SET.
//!
//! LOAD takes its address from a LOAD-table slot; GET and SET pop the
//! address from the data stack, low byte on top.

use stack8::{ControlUnit, Fault, MemoryBus, Opcode, ProgramBuilder, StackId};

fn setup(build: impl FnOnce(&mut ProgramBuilder)) -> ControlUnit {
    let mut builder = ProgramBuilder::new();
    build(&mut builder);
    ControlUnit::from_image(&builder.build().unwrap()).unwrap()
}

/// Runs `opcode` over `cells` pushed onto the data stack.
fn with_stack(opcode: Opcode, cells: &[u8]) -> ControlUnit {
    let mut cu = setup(|b| {
        b.emit(opcode);
        b.emit(Opcode::Hlt);
    });
    for cell in cells {
        cu.data_stack_mut().push(*cell);
    }
    cu
}

// ========== LOAD ==========

#[test]
fn test_load_constant() {
    let mut cu = setup(|b| {
        b.load_constant(42).unwrap();
        b.emit(Opcode::Hlt);
    });

    cu.step().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![42]);
    assert_eq!(cu.ram().address(), 0x0000);
    // Fetch, four table-walk ticks, push
    assert_eq!(cu.ticks(), 6);
}

#[test]
fn test_load_reads_current_memory() {
    let mut cu = setup(|b| {
        b.load_address(0x1234).unwrap();
        b.emit(Opcode::Hlt);
    });
    cu.ram_mut().bus_mut().write(0x1234, 0x99);

    cu.run().unwrap();

    assert_eq!(cu.data_stack().tos(), 0x99);
    assert_eq!(cu.ram().address(), 0x1234);
}

#[test]
fn test_load_does_not_touch_flags() {
    let mut cu = setup(|b| {
        b.load_constant(0).unwrap();
        b.emit(Opcode::Hlt);
    });
    cu.set_flag_n(true);

    cu.run().unwrap();

    assert!(!cu.flag_z());
    assert!(cu.flag_n());
}

#[test]
fn test_load_negative_constant() {
    let mut cu = setup(|b| {
        b.load_constant(-3).unwrap();
        b.emit(Opcode::Hlt);
    });

    cu.run().unwrap();

    assert_eq!(cu.data_stack().tos(), 0xFD);
}

#[test]
fn test_load_offset_out_of_table() {
    let mut cu = setup(|b| {
        b.emit_with_offset(Opcode::Load, -1);
    });

    assert_eq!(
        cu.step().unwrap_err().fault,
        Fault::OffsetOutOfRange {
            mnemonic: "LOAD",
            offset: -1
        }
    );
}

// ========== GET ==========

#[test]
fn test_get_reads_address_from_stack() {
    let mut cu = with_stack(Opcode::Get, &[0x12, 0x34]);
    cu.ram_mut().bus_mut().write(0x1234, 0x56);

    cu.step().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![0x56]);
    assert_eq!(cu.ram().address(), 0x1234);
    // Fetch, latch low, latch high, push
    assert_eq!(cu.ticks(), 4);
}

#[test]
fn test_get_needs_two_cells() {
    let mut cu = with_stack(Opcode::Get, &[0x34]);

    assert_eq!(
        cu.step().unwrap_err().fault,
        Fault::StackUnderflow(StackId::Data)
    );
}

// ========== SET ==========

#[test]
fn test_set_stores_value() {
    let mut cu = with_stack(Opcode::Set, &[0x77, 0xBE, 0xEF]);

    cu.step().unwrap();

    assert_eq!(cu.ram().bus().read(0xBEEF), 0x77);
    assert!(cu.data_stack().is_empty());
    assert_eq!(cu.ticks(), 4);
}

#[test]
fn test_set_then_get() {
    let mut cu = setup(|b| {
        b.load_constant(0x2A).unwrap();
        b.load_constant(0x01).unwrap();
        b.load_constant(0x00).unwrap();
        b.emit(Opcode::Set);
        b.load_constant(0x01).unwrap();
        b.load_constant(0x00).unwrap();
        b.emit(Opcode::Get);
        b.emit(Opcode::Hlt);
    });

    cu.run().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![0x2A]);
    assert_eq!(cu.ram().bus().read(0x0100), 0x2A);
}

#[test]
fn test_set_missing_value_faults() {
    let mut cu = with_stack(Opcode::Set, &[0x00, 0x10]);

    assert_eq!(
        cu.step().unwrap_err().fault,
        Fault::StackUnderflow(StackId::Data)
    );
    assert_eq!(cu.ram().bus().read(0x0010), 0x00);
}
