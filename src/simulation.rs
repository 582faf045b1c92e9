//! # Simulation Harness
//!
//! Runs a program image against operator input. Every run starts from a
//! fresh control unit built from the image, so runs never share state.
//!
//! ```
//! use stack8::{Opcode, ProgramBuilder, Simulation};
//!
//! let mut builder = ProgramBuilder::new();
//! builder.emit(Opcode::Read);
//! builder.emit(Opcode::Print);
//! builder.emit(Opcode::Hlt);
//!
//! let simulation = Simulation::new(builder.build().unwrap()).unwrap();
//! assert_eq!(simulation.run(b"x").unwrap().output, b"x");
//! assert_eq!(simulation.run(b"y").unwrap().output, b"y");
//! ```

use serde::{Deserialize, Serialize};

use crate::image::{ImageError, ProgramImage};
use crate::trace::TraceSink;
use crate::{ControlUnit, ExecutionError};

/// Limits applied to each run. The default is unlimited.
///
/// Running out of a budget aborts the run like any other fatal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Maximum ticks before the run is aborted.
    pub tick_limit: Option<u64>,

    /// Maximum instructions before the run is aborted.
    pub instruction_limit: Option<u64>,
}

impl SimulationConfig {
    pub fn with_tick_limit(mut self, limit: u64) -> Self {
        self.tick_limit = Some(limit);
        self
    }

    pub fn with_instruction_limit(mut self, limit: u64) -> Self {
        self.instruction_limit = Some(limit);
        self
    }
}

/// Outcome of a run that reached HLT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Bytes written by PRINT, in execution order.
    pub output: Vec<u8>,

    /// Total ticks, fetches included.
    pub ticks: u64,

    /// Instructions executed, HLT included.
    pub instructions: u64,

    /// Data stack contents at HLT, bottom to top.
    pub data_stack: Vec<u8>,
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The run stopped on a fatal fault. `output` holds what was printed
    /// before it.
    #[error("{error}")]
    Execution {
        #[source]
        error: ExecutionError,
        output: Vec<u8>,
    },
}

/// A validated program image together with its run limits.
#[derive(Debug, Clone)]
pub struct Simulation {
    image: ProgramImage,
    config: SimulationConfig,
}

impl Simulation {
    /// Validates `image` and creates an unlimited simulation.
    pub fn new(image: ProgramImage) -> Result<Self, ImageError> {
        image.validate()?;
        Ok(Self {
            image,
            config: SimulationConfig::default(),
        })
    }

    /// Replaces the run limits.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn image(&self) -> &ProgramImage {
        &self.image
    }

    /// Builds a fresh control unit loaded with the image and `input`.
    pub fn control_unit(&self, input: &[u8]) -> Result<ControlUnit, ImageError> {
        let mut cu = ControlUnit::from_image(&self.image)?;
        cu.set_input(input);
        Ok(cu)
    }

    /// Runs the program to HLT on a fresh control unit.
    pub fn run(&self, input: &[u8]) -> Result<RunReport, SimulationError> {
        let cu = self.control_unit(input)?;
        self.finish(cu)
    }

    /// Runs the program with `sink` observing every tick.
    pub fn run_traced(
        &self,
        input: &[u8],
        sink: Box<dyn TraceSink>,
    ) -> Result<RunReport, SimulationError> {
        let mut cu = self.control_unit(input)?;
        cu.set_trace_sink(sink);
        self.finish(cu)
    }

    fn finish(&self, mut cu: ControlUnit) -> Result<RunReport, SimulationError> {
        match cu.run_with_limits(self.config.tick_limit, self.config.instruction_limit) {
            Ok(instructions) => Ok(RunReport {
                output: cu.take_output(),
                ticks: cu.ticks(),
                instructions,
                data_stack: cu.data_stack().contents(),
            }),
            Err(error) => Err(SimulationError::Execution {
                error,
                output: cu.take_output(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fault, Opcode, ProgramBuilder};

    fn echo_forever() -> ProgramImage {
        let mut builder = ProgramBuilder::new();
        builder.emit(Opcode::Read);
        builder.emit(Opcode::Print);
        builder.emit_with_offset(Opcode::Jmpr, -3);
        builder.build().unwrap()
    }

    #[test]
    fn test_config_deserializes_partially() {
        let config: SimulationConfig = serde_json::from_str(r#"{"tick_limit": 100}"#).unwrap();
        assert_eq!(config, SimulationConfig::default().with_tick_limit(100));
    }

    #[test]
    fn test_input_underflow_keeps_partial_output() {
        let simulation = Simulation::new(echo_forever()).unwrap();
        match simulation.run(b"ok") {
            Err(SimulationError::Execution { error, output }) => {
                assert_eq!(error.fault, Fault::InputUnderflow);
                assert_eq!(output, b"ok");
            }
            other => panic!("expected input underflow, got {:?}", other),
        }
    }

    #[test]
    fn test_instruction_limit_aborts() {
        let simulation = Simulation::new(echo_forever())
            .unwrap()
            .with_config(SimulationConfig::default().with_instruction_limit(4));
        match simulation.run(b"abcdef") {
            Err(SimulationError::Execution { error, output }) => {
                // READ PRINT JMPR READ
                assert_eq!(error.fault, Fault::InstructionBudgetExhausted(4));
                assert_eq!(output, b"a");
            }
            other => panic!("expected budget fault, got {:?}", other),
        }
    }
}
