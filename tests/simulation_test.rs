//! Tests for the simulation harness: fresh runs, limits and reports.

use std::cell::RefCell;
use std::rc::Rc;

use stack8::{
    Fault, ImageError, Opcode, ProgramBuilder, ProgramImage, Simulation, SimulationConfig,
    SimulationError, TraceLog,
};

/// Reads a byte and prints it twice.
fn doubler() -> ProgramImage {
    let mut builder = ProgramBuilder::new();
    builder.emit(Opcode::Read);
    builder.emit(Opcode::Dup);
    builder.emit(Opcode::Print);
    builder.emit(Opcode::Print);
    builder.emit(Opcode::Hlt);
    builder.build().unwrap()
}

fn spin() -> ProgramImage {
    let mut builder = ProgramBuilder::new();
    builder.emit_with_offset(Opcode::Jmpr, -1);
    builder.build().unwrap()
}

#[test]
fn test_run_report() {
    let simulation = Simulation::new(doubler()).unwrap();

    let report = simulation.run(b"q").unwrap();

    assert_eq!(report.output, b"qq");
    assert_eq!(report.instructions, 5);
    assert_eq!(report.ticks, 10);
    assert!(report.data_stack.is_empty());
}

#[test]
fn test_runs_do_not_share_state() {
    let mut builder = ProgramBuilder::new();
    builder.load_address(0x0010).unwrap();
    builder.emit(Opcode::Inc);
    builder.emit(Opcode::Dup);
    builder.emit(Opcode::Print);
    builder.load_constant(0x00).unwrap();
    builder.load_constant(0x10).unwrap();
    builder.emit(Opcode::Set);
    builder.emit(Opcode::Hlt);
    let simulation = Simulation::new(builder.build().unwrap()).unwrap();

    // Each run starts from the image, so the stored counter never carries over
    assert_eq!(simulation.run(&[]).unwrap().output, vec![1]);
    assert_eq!(simulation.run(&[]).unwrap().output, vec![1]);
}

#[test]
fn test_invalid_image_rejected_up_front() {
    let image = ProgramImage {
        instructions: vec![],
        data: vec![-129],
    };

    assert!(matches!(
        Simulation::new(image),
        Err(ImageError::DataOutOfRange {
            index: 0,
            value: -129
        })
    ));
}

#[test]
fn test_tick_limit_is_fatal() {
    let simulation = Simulation::new(spin())
        .unwrap()
        .with_config(SimulationConfig::default().with_tick_limit(100));

    match simulation.run(&[]) {
        Err(SimulationError::Execution { error, output }) => {
            assert_eq!(error.fault, Fault::TickBudgetExhausted(100));
            assert_eq!(error.address, 0x00C0);
            assert!(output.is_empty());
        }
        other => panic!("expected tick budget fault, got {:?}", other),
    }
}

#[test]
fn test_limits_allow_programs_that_fit() {
    let simulation = Simulation::new(doubler())
        .unwrap()
        .with_config(
            SimulationConfig::default()
                .with_tick_limit(10)
                .with_instruction_limit(5),
        );

    assert_eq!(simulation.run(b"z").unwrap().output, b"zz");
}

#[test]
fn test_execution_error_keeps_partial_output() {
    let simulation = Simulation::new(doubler()).unwrap();

    let err = simulation.run(&[]).unwrap_err();

    assert_eq!(err.to_string(), "read from empty input buffer at 0x00C0");
    match err {
        SimulationError::Execution { output, .. } => assert!(output.is_empty()),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_run_traced() {
    let simulation = Simulation::new(doubler()).unwrap();
    let log = Rc::new(RefCell::new(TraceLog::new()));

    let report = simulation
        .run_traced(b"a", Box::new(Rc::clone(&log)))
        .unwrap();

    assert_eq!(log.borrow().records().len() as u64, report.ticks);
    assert_eq!(log.borrow().halted_at(), Some(report.ticks));
}

#[test]
fn test_config_from_json() {
    let config: SimulationConfig =
        serde_json::from_str(r#"{"tick_limit": 5000, "instruction_limit": 100}"#).unwrap();
    assert_eq!(config.tick_limit, Some(5000));
    assert_eq!(config.instruction_limit, Some(100));

    let config: SimulationConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, SimulationConfig::default());
}

#[test]
fn test_control_unit_is_fresh() {
    let simulation = Simulation::new(doubler()).unwrap();

    let cu = simulation.control_unit(b"xy").unwrap();

    assert_eq!(cu.input_remaining(), 2);
    assert_eq!(cu.ticks(), 0);
    assert_eq!(simulation.image(), &doubler());
}
