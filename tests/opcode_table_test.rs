//! Consistency checks for the opcode metadata table.

use std::collections::HashSet;

use stack8::{Opcode, OperandClass, TableKind, OPCODE_TABLE};

#[test]
fn test_mnemonics_are_unique_and_upper_case() {
    let mut seen = HashSet::new();
    for metadata in OPCODE_TABLE.iter() {
        assert!(seen.insert(metadata.mnemonic), "duplicate {}", metadata.mnemonic);
        assert_eq!(metadata.mnemonic, metadata.mnemonic.to_uppercase());
    }
    assert_eq!(seen.len(), 32);
}

#[test]
fn test_mnemonic_lookup_round_trips() {
    for metadata in OPCODE_TABLE.iter() {
        assert_eq!(Opcode::from_mnemonic(metadata.mnemonic), Some(metadata.opcode));
        assert_eq!(metadata.opcode.to_string(), metadata.mnemonic);
    }
    assert_eq!(Opcode::from_mnemonic("PUSH"), None);
    assert_eq!(Opcode::from_mnemonic(""), None);
}

#[test]
fn test_operand_classes() {
    let relative: Vec<Opcode> = OPCODE_TABLE
        .iter()
        .filter(|m| m.class == OperandClass::Relative)
        .map(|m| m.opcode)
        .collect();
    assert_eq!(relative, vec![Opcode::Jmpr, Opcode::Jz, Opcode::Jl, Opcode::Jo]);

    assert_eq!(Opcode::Load.class(), OperandClass::TableIndirect(TableKind::Load));
    assert_eq!(Opcode::Call.class(), OperandClass::TableIndirect(TableKind::Call));
    assert_eq!(Opcode::Jmpa.class(), OperandClass::TableIndirect(TableKind::Jump));

    let implicit = OPCODE_TABLE
        .iter()
        .filter(|m| m.class == OperandClass::Implicit)
        .count();
    assert_eq!(implicit, 25);
}

#[test]
fn test_requires_offset() {
    for metadata in OPCODE_TABLE.iter() {
        assert_eq!(
            metadata.class.requires_offset(),
            metadata.class != OperandClass::Implicit,
            "{}",
            metadata.mnemonic
        );
    }
}

#[test]
fn test_tick_costs() {
    let cost = |opcode: Opcode| opcode.metadata().base_ticks;

    assert_eq!(cost(Opcode::Sum), 1);
    assert_eq!(cost(Opcode::Ret), 2);
    assert_eq!(cost(Opcode::Get), 3);
    assert_eq!(cost(Opcode::Over), 4);
    assert_eq!(cost(Opcode::Jmpa), 4);
    assert_eq!(cost(Opcode::Load), 5);
    assert_eq!(cost(Opcode::Call), 6);
    assert_eq!(cost(Opcode::Tdiv), 10);
    assert!(OPCODE_TABLE.iter().all(|m| m.base_ticks >= 1));
}
