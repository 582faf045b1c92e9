//! Tests for the 8-bit arithmetic instructions SUM, SUB, MUL, DIV and MOD.
//!
//! Tests cover:
//! - Operand order (`a` below the top, `b` on top)
//! - Modulo-256 reduction of results
//! - Signed overflow, zero and negative flags
//! - Non-fatal division by zero
//! - Underflow on a short stack

use stack8::{ControlUnit, Fault, Opcode, ProgramBuilder, StackId};

/// Runs `opcode` once over `[a, b]` and returns the control unit.
fn binary(opcode: Opcode, a: u8, b: u8) -> ControlUnit {
    let mut builder = ProgramBuilder::new();
    builder.emit(opcode);
    builder.emit(Opcode::Hlt);
    let mut cu = ControlUnit::from_image(&builder.build().unwrap()).unwrap();
    cu.data_stack_mut().push(a);
    cu.data_stack_mut().push(b);
    cu.step().unwrap();
    cu
}

// ========== SUM ==========

#[test]
fn test_sum_basic() {
    let cu = binary(Opcode::Sum, 5, 3);

    assert_eq!(cu.data_stack().contents(), vec![8]);
    assert!(!cu.flag_z());
    assert!(!cu.flag_n());
    assert!(!cu.flag_v());
    assert_eq!(cu.ticks(), 2);
}

#[test]
fn test_sum_signed_overflow() {
    let cu = binary(Opcode::Sum, 0x7F, 0x01);

    assert_eq!(cu.data_stack().tos(), 0x80);
    assert!(cu.flag_v());
    assert!(cu.flag_n());
    assert!(!cu.flag_z());
}

#[test]
fn test_sum_unsigned_wrap_is_not_overflow() {
    // -1 + 1 = 0 in signed terms
    let cu = binary(Opcode::Sum, 0xFF, 0x01);

    assert_eq!(cu.data_stack().tos(), 0x00);
    assert!(cu.flag_z());
    assert!(!cu.flag_v());
}

#[test]
fn test_sum_negative_overflow() {
    // -128 + -128 = -256
    let cu = binary(Opcode::Sum, 0x80, 0x80);

    assert_eq!(cu.data_stack().tos(), 0x00);
    assert!(cu.flag_z());
    assert!(cu.flag_v());
}

#[test]
fn test_sum_keeps_deeper_cells() {
    let mut builder = ProgramBuilder::new();
    builder.emit(Opcode::Sum);
    builder.emit(Opcode::Hlt);
    let mut cu = ControlUnit::from_image(&builder.build().unwrap()).unwrap();
    for cell in [1, 2, 3] {
        cu.data_stack_mut().push(cell);
    }

    cu.run().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![1, 5]);
}

// ========== SUB ==========

#[test]
fn test_sub_operand_order() {
    let cu = binary(Opcode::Sub, 3, 5);

    assert_eq!(cu.data_stack().tos(), 0xFE);
    assert!(cu.flag_n());
    assert!(!cu.flag_v());
}

#[test]
fn test_sub_equal_sets_zero() {
    let cu = binary(Opcode::Sub, 42, 42);

    assert_eq!(cu.data_stack().tos(), 0);
    assert!(cu.flag_z());
    assert!(!cu.flag_n());
}

#[test]
fn test_sub_signed_overflow() {
    // -128 - 1 = -129
    let cu = binary(Opcode::Sub, 0x80, 0x01);

    assert_eq!(cu.data_stack().tos(), 0x7F);
    assert!(cu.flag_v());
    assert!(!cu.flag_n());
}

// ========== MUL ==========

#[test]
fn test_mul_basic() {
    let cu = binary(Opcode::Mul, 6, 7);

    assert_eq!(cu.data_stack().tos(), 42);
    assert!(!cu.flag_v());
}

#[test]
fn test_mul_overflow_into_sign() {
    let cu = binary(Opcode::Mul, 16, 8);

    assert_eq!(cu.data_stack().tos(), 0x80);
    assert!(cu.flag_v());
    assert!(cu.flag_n());
}

#[test]
fn test_mul_negative_operands() {
    // -1 * -1 = 1
    let cu = binary(Opcode::Mul, 0xFF, 0xFF);
    assert_eq!(cu.data_stack().tos(), 1);
    assert!(!cu.flag_v());

    // -16 * 2 = -32, in range although the unsigned product exceeds 0xFF
    let cu = binary(Opcode::Mul, 0xF0, 0x02);
    assert_eq!(cu.data_stack().tos(), 0xE0);
    assert!(!cu.flag_v());
    assert!(cu.flag_n());
}

// ========== DIV / MOD ==========

#[test]
fn test_div_truncates() {
    let cu = binary(Opcode::Div, 7, 2);
    assert_eq!(cu.data_stack().tos(), 3);

    // -7 / 2 truncates toward zero
    let cu = binary(Opcode::Div, 0xF9, 2);
    assert_eq!(cu.data_stack().tos(), 0xFD);
    assert!(cu.flag_n());
}

#[test]
fn test_mod_sign_follows_dividend() {
    let cu = binary(Opcode::Mod, 7, 3);
    assert_eq!(cu.data_stack().tos(), 1);

    let cu = binary(Opcode::Mod, 0xF9, 2);
    assert_eq!(cu.data_stack().tos(), 0xFF);
}

#[test]
fn test_div_min_by_minus_one_overflows() {
    // -128 / -1 = 128
    let cu = binary(Opcode::Div, 0x80, 0xFF);

    assert_eq!(cu.data_stack().tos(), 0x80);
    assert!(cu.flag_v());
}

#[test]
fn test_div_by_zero_is_not_fatal() {
    let mut builder = ProgramBuilder::new();
    builder.emit(Opcode::Div);
    builder.emit(Opcode::True);
    builder.emit(Opcode::Hlt);
    let mut cu = ControlUnit::from_image(&builder.build().unwrap()).unwrap();
    cu.data_stack_mut().push(9);
    cu.data_stack_mut().push(0);

    cu.run().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![0, 0xFF]);
    assert!(cu.flag_v());
    assert!(cu.flag_z());
    assert!(cu.is_halted());
}

#[test]
fn test_mod_by_zero_is_not_fatal() {
    let cu = binary(Opcode::Mod, 9, 0);

    assert_eq!(cu.data_stack().contents(), vec![0]);
    assert!(cu.flag_v());
    assert!(cu.fault().is_none());
}

// ========== Underflow ==========

#[test]
fn test_binary_ops_need_two_cells() {
    for opcode in [Opcode::Sum, Opcode::Sub, Opcode::Mul, Opcode::Div, Opcode::Mod] {
        let mut builder = ProgramBuilder::new();
        builder.emit(opcode);
        let mut cu = ControlUnit::from_image(&builder.build().unwrap()).unwrap();
        cu.data_stack_mut().push(1);

        let err = cu.run().unwrap_err();
        assert_eq!(err.fault, Fault::StackUnderflow(StackId::Data), "{}", opcode);
        assert_eq!(cu.data_stack().contents(), vec![1], "{}", opcode);
    }
}
