//! Tests for the data-stack shuffles and the data/return stack transfers.
//!
//! Tests cover:
//! - DUP, DROP, SWAP, OVER, ROT results and underflow
//! - TOR/RFROM moving cells between the stacks
//! - TRUE/FALSE leaving the flags alone
//! - Tick costs, including the OVER/ROT micro-sequences

use stack8::{ControlUnit, Fault, Opcode, ProgramBuilder, StackId, StepOutcome};

/// Builds a control unit running `opcodes` with `cells` already on the data stack.
fn setup(opcodes: &[Opcode], cells: &[u8]) -> ControlUnit {
    let mut builder = ProgramBuilder::new();
    for opcode in opcodes {
        builder.emit(*opcode);
    }
    let mut cu = ControlUnit::from_image(&builder.build().unwrap()).unwrap();
    for cell in cells {
        cu.data_stack_mut().push(*cell);
    }
    cu
}

// ========== DUP / DROP / SWAP ==========

#[test]
fn test_dup_copies_top() {
    let mut cu = setup(&[Opcode::Dup, Opcode::Hlt], &[7]);

    assert_eq!(cu.step(), Ok(StepOutcome::Running));

    assert_eq!(cu.data_stack().contents(), vec![7, 7]);
    assert_eq!(cu.ticks(), 2);
    assert_eq!(cu.pc(), 0x00C1);
}

#[test]
fn test_dup_empty_stack_faults() {
    let mut cu = setup(&[Opcode::Dup, Opcode::Hlt], &[]);

    let err = cu.step().unwrap_err();
    assert_eq!(err.fault, Fault::StackUnderflow(StackId::Data));
    assert_eq!(err.address, 0x00C0);
}

#[test]
fn test_drop_removes_top() {
    let mut cu = setup(&[Opcode::Drop, Opcode::Hlt], &[1, 2]);

    cu.run().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![1]);
    assert_eq!(cu.data_stack().tos(), 1);
}

#[test]
fn test_drop_last_element_empties_stack() {
    let mut cu = setup(&[Opcode::Drop, Opcode::Hlt], &[9]);

    cu.run().unwrap();

    assert!(cu.data_stack().is_empty());
    assert_eq!(cu.data_stack().sp(), 0xFFFE);
}

#[test]
fn test_swap_exchanges_top_two() {
    let mut cu = setup(&[Opcode::Swap, Opcode::Hlt], &[1, 2]);

    cu.step().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![2, 1]);
    assert_eq!(cu.ticks(), 2);
}

#[test]
fn test_swap_single_element_faults() {
    let mut cu = setup(&[Opcode::Swap, Opcode::Hlt], &[1]);

    assert_eq!(
        cu.run().unwrap_err().fault,
        Fault::StackUnderflow(StackId::Data)
    );
}

// ========== OVER / ROT ==========

#[test]
fn test_over_copies_second() {
    let mut cu = setup(&[Opcode::Over, Opcode::Hlt], &[1, 2]);

    cu.step().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![1, 2, 1]);
    assert!(cu.return_stack().is_empty());
    // Fetch plus TOR, DUP, RFROM, SWAP
    assert_eq!(cu.ticks(), 5);
}

#[test]
fn test_over_short_stack_leaves_state_untouched() {
    let mut cu = setup(&[Opcode::Over, Opcode::Hlt], &[4]);

    let err = cu.step().unwrap_err();

    assert_eq!(err.fault, Fault::StackUnderflow(StackId::Data));
    assert_eq!(cu.data_stack().contents(), vec![4]);
    assert!(cu.return_stack().is_empty());
}

#[test]
fn test_rot_rotates_third_to_top() {
    let mut cu = setup(&[Opcode::Rot, Opcode::Hlt], &[1, 2, 3]);

    cu.step().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![2, 3, 1]);
    assert!(cu.return_stack().is_empty());
    assert_eq!(cu.ticks(), 5);
}

#[test]
fn test_rot_keeps_deeper_cells() {
    let mut cu = setup(&[Opcode::Rot, Opcode::Rot, Opcode::Hlt], &[9, 1, 2, 3]);

    cu.run().unwrap();

    // Two rotations: (1 2 3) -> (2 3 1) -> (3 1 2)
    assert_eq!(cu.data_stack().contents(), vec![9, 3, 1, 2]);
}

#[test]
fn test_rot_two_elements_faults() {
    let mut cu = setup(&[Opcode::Rot, Opcode::Hlt], &[1, 2]);

    let err = cu.step().unwrap_err();

    assert_eq!(err.fault, Fault::StackUnderflow(StackId::Data));
    assert_eq!(cu.data_stack().contents(), vec![1, 2]);
    assert!(cu.return_stack().is_empty());
}

// ========== TOR / RFROM ==========

#[test]
fn test_tor_moves_to_return_stack() {
    let mut cu = setup(&[Opcode::Tor, Opcode::Hlt], &[5, 6]);

    cu.step().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![5]);
    assert_eq!(cu.return_stack().contents(), vec![6]);
    assert_eq!(cu.ticks(), 2);
}

#[test]
fn test_rfrom_moves_back() {
    let mut cu = setup(&[Opcode::Tor, Opcode::Tor, Opcode::Rfrom, Opcode::Hlt], &[5, 6]);

    cu.run().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![5]);
    assert_eq!(cu.return_stack().contents(), vec![6]);
}

#[test]
fn test_rfrom_empty_return_stack_faults() {
    let mut cu = setup(&[Opcode::Rfrom, Opcode::Hlt], &[1]);

    assert_eq!(
        cu.step().unwrap_err().fault,
        Fault::StackUnderflow(StackId::Return)
    );
}

#[test]
fn test_tor_empty_data_stack_faults() {
    let mut cu = setup(&[Opcode::Tor, Opcode::Hlt], &[]);

    assert_eq!(
        cu.step().unwrap_err().fault,
        Fault::StackUnderflow(StackId::Data)
    );
    assert!(cu.return_stack().is_empty());
}

// ========== TRUE / FALSE ==========

#[test]
fn test_true_false_push_constants() {
    let mut cu = setup(&[Opcode::True, Opcode::False, Opcode::Hlt], &[]);

    cu.run().unwrap();

    assert_eq!(cu.data_stack().contents(), vec![0xFF, 0x00]);
}

#[test]
fn test_true_false_leave_flags_alone() {
    let mut cu = setup(&[Opcode::False, Opcode::True, Opcode::Hlt], &[]);
    cu.set_flag_z(false);
    cu.set_flag_n(true);
    cu.set_flag_v(true);

    cu.run().unwrap();

    assert!(!cu.flag_z());
    assert!(cu.flag_n());
    assert!(cu.flag_v());
}
