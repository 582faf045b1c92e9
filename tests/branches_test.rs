//! Tests for the PC-relative jumps JMPR, JZ, JL and JO.
//!
//! The displacement is relative to the address after the jump. Taken or
//! not, a jump costs one execute tick.

use stack8::{ControlUnit, Fault, Opcode, ProgramBuilder};

fn setup(build: impl FnOnce(&mut ProgramBuilder)) -> ControlUnit {
    let mut builder = ProgramBuilder::new();
    build(&mut builder);
    ControlUnit::from_image(&builder.build().unwrap()).unwrap()
}

// ========== JMPR ==========

#[test]
fn test_jmpr_skips_forward() {
    let mut cu = setup(|b| {
        b.emit_with_offset(Opcode::Jmpr, 1);
        b.emit(Opcode::True);
        b.emit(Opcode::Hlt);
    });

    cu.step().unwrap();
    assert_eq!(cu.pc(), 0x00C2);
    assert_eq!(cu.ticks(), 2);

    cu.run().unwrap();
    assert!(cu.data_stack().is_empty());
}

#[test]
fn test_jmpr_zero_falls_through() {
    let mut cu = setup(|b| {
        b.emit_with_offset(Opcode::Jmpr, 0);
        b.emit(Opcode::Hlt);
    });

    cu.step().unwrap();

    assert_eq!(cu.pc(), 0x00C1);
}

#[test]
fn test_jmpr_minus_one_loops_on_itself() {
    let mut cu = setup(|b| {
        b.emit_with_offset(Opcode::Jmpr, -1);
    });

    assert_eq!(cu.run_for_ticks(10), Ok(10));

    assert_eq!(cu.pc(), 0x00C0);
    assert_eq!(cu.instructions(), 5);
}

#[test]
fn test_jmpr_below_zero_faults() {
    let mut cu = setup(|b| {
        b.emit_with_offset(Opcode::Jmpr, -0xC2);
    });

    let err = cu.step().unwrap_err();

    assert_eq!(err.fault, Fault::AddressOutOfRange(-1));
    assert_eq!(err.address, 0x00C0);
}

#[test]
fn test_jmpr_past_top_faults() {
    let mut cu = setup(|b| {
        b.emit_with_offset(Opcode::Jmpr, 0x10000);
    });

    assert_eq!(
        cu.step().unwrap_err().fault,
        Fault::AddressOutOfRange(0x100C1)
    );
}

#[test]
fn test_relative_jump_requires_offset() {
    for opcode in [Opcode::Jmpr, Opcode::Jz, Opcode::Jl, Opcode::Jo] {
        let mut cu = setup(|b| {
            b.emit(opcode);
        });

        assert_eq!(
            cu.step().unwrap_err().fault,
            Fault::MissingOffset(opcode.mnemonic()),
        );
    }
}

// ========== Conditional jumps ==========

/// Runs `opcode +1` over a skipped TRUE with the given flags preset.
fn conditional(opcode: Opcode, z: bool, n: bool, v: bool) -> ControlUnit {
    let mut cu = setup(|b| {
        b.emit_with_offset(opcode, 1);
        b.emit(Opcode::True);
        b.emit(Opcode::Hlt);
    });
    cu.set_flag_z(z);
    cu.set_flag_n(n);
    cu.set_flag_v(v);
    cu.run().unwrap();
    cu
}

#[test]
fn test_jz_taken_and_not_taken() {
    let taken = conditional(Opcode::Jz, true, false, false);
    assert!(taken.data_stack().is_empty());

    let not_taken = conditional(Opcode::Jz, false, true, true);
    assert_eq!(not_taken.data_stack().contents(), vec![0xFF]);
}

#[test]
fn test_jl_reads_negative_flag() {
    assert!(conditional(Opcode::Jl, false, true, false)
        .data_stack()
        .is_empty());
    assert!(!conditional(Opcode::Jl, true, false, true)
        .data_stack()
        .is_empty());
}

#[test]
fn test_jo_reads_overflow_flag() {
    assert!(conditional(Opcode::Jo, false, false, true)
        .data_stack()
        .is_empty());
    assert!(!conditional(Opcode::Jo, true, true, false)
        .data_stack()
        .is_empty());
}

#[test]
fn test_jumps_do_not_consume_flags() {
    let cu = conditional(Opcode::Jz, true, true, true);

    assert!(cu.flag_z());
    assert!(cu.flag_n());
    assert!(cu.flag_v());
}

#[test]
fn test_taken_and_not_taken_cost_the_same() {
    let taken = conditional(Opcode::Jz, true, false, false);
    let not_taken = conditional(Opcode::Jz, false, false, false);

    // JZ + HLT versus JZ + TRUE + HLT
    assert_eq!(taken.ticks(), 4);
    assert_eq!(not_taken.ticks(), 6);
}

// ========== Loops ==========

#[test]
fn test_countdown_loop() {
    let mut cu = setup(|b| {
        let top = b.new_label();
        let end = b.new_label();
        b.load_constant(3).unwrap();
        b.bind(top).unwrap();
        b.emit(Opcode::Dec);
        b.jump_relative(Opcode::Jz, end);
        b.jump_relative(Opcode::Jmpr, top);
        b.bind(end).unwrap();
        b.emit(Opcode::Hlt);
    });

    let executed = cu.run().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![0]);
    // LOAD, 3 x DEC, 3 x JZ, 2 x JMPR, HLT
    assert_eq!(executed, 10);
}
