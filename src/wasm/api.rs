//! WASM API for the stack8 simulator.
//!
//! Provides JavaScript-callable interfaces for loading program images,
//! stepping the control unit, and inspecting stacks, flags and output.

use crate::{
    listing, ControlUnit, ExecutionError, ImageError, MemoryBus, ProgramImage, StepOutcome,
};
use wasm_bindgen::prelude::*;

/// JavaScript-compatible error wrapper
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsError {
    message: String,
}

#[wasm_bindgen]
impl JsError {
    #[wasm_bindgen(constructor)]
    pub fn new(message: &str) -> JsError {
        JsError {
            message: message.to_string(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl From<ImageError> for JsError {
    fn from(err: ImageError) -> Self {
        JsError::new(&err.to_string())
    }
}

impl From<ExecutionError> for JsError {
    fn from(err: ExecutionError) -> Self {
        JsError::new(&err.to_string())
    }
}

/// Stack8 processor exposed to JavaScript
#[wasm_bindgen]
pub struct Stack8Machine {
    image: ProgramImage,
    cu: ControlUnit,
}

#[wasm_bindgen]
impl Stack8Machine {
    /// Create a machine from a JSON program image
    #[wasm_bindgen(constructor)]
    pub fn new(image_json: &str) -> Result<Stack8Machine, JsError> {
        let image = ProgramImage::from_json(image_json)?;
        let cu = ControlUnit::from_image(&image)?;
        Ok(Stack8Machine { image, cu })
    }

    /// Execute a single instruction. Returns true once HLT has run.
    pub fn step(&mut self) -> Result<bool, JsError> {
        match self.cu.step()? {
            StepOutcome::Halted => Ok(true),
            StepOutcome::Running => Ok(false),
        }
    }

    /// Run to HLT and return the number of instructions executed
    pub fn run(&mut self) -> Result<f64, JsError> {
        Ok(self.cu.run()? as f64)
    }

    /// Execute whole instructions until the tick budget is spent
    pub fn run_for_ticks(&mut self, ticks: u32) -> Result<f64, JsError> {
        Ok(self.cu.run_for_ticks(ticks as u64)? as f64)
    }

    /// Reload the image, discarding all run state
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.cu = ControlUnit::from_image(&self.image)?;
        Ok(())
    }

    /// Append operator input bytes
    pub fn feed_input(&mut self, bytes: &[u8]) {
        self.cu.feed_input(bytes);
    }

    /// Drain the bytes printed since the last call
    pub fn take_output(&mut self) -> Vec<u8> {
        self.cu.take_output()
    }

    /// Program listing with resolved jump targets
    pub fn listing(&self) -> Result<String, JsError> {
        Ok(listing(&self.image)?)
    }

    // Register getters
    #[wasm_bindgen(getter)]
    pub fn pc(&self) -> u16 {
        self.cu.pc()
    }

    #[wasm_bindgen(getter)]
    pub fn ticks(&self) -> f64 {
        self.cu.ticks() as f64 // Convert u64 to f64 for JavaScript
    }

    #[wasm_bindgen(getter)]
    pub fn instructions(&self) -> f64 {
        self.cu.instructions() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn halted(&self) -> bool {
        self.cu.is_halted()
    }

    /// Message of the fault that stopped the machine, if any
    #[wasm_bindgen(getter)]
    pub fn fault(&self) -> Option<String> {
        self.cu.fault().map(|err| err.to_string())
    }

    // Flag getters
    #[wasm_bindgen(getter)]
    pub fn flag_z(&self) -> bool {
        self.cu.flag_z()
    }

    #[wasm_bindgen(getter)]
    pub fn flag_n(&self) -> bool {
        self.cu.flag_n()
    }

    #[wasm_bindgen(getter)]
    pub fn flag_v(&self) -> bool {
        self.cu.flag_v()
    }

    // Stack getters
    #[wasm_bindgen(getter)]
    pub fn data_sp(&self) -> u16 {
        self.cu.data_stack().sp()
    }

    #[wasm_bindgen(getter)]
    pub fn data_tos(&self) -> u8 {
        self.cu.data_stack().tos()
    }

    #[wasm_bindgen(getter)]
    pub fn return_sp(&self) -> u16 {
        self.cu.return_stack().sp()
    }

    #[wasm_bindgen(getter)]
    pub fn return_tos(&self) -> u8 {
        self.cu.return_stack().tos()
    }

    /// Data stack contents, bottom to top
    pub fn data_stack(&self) -> Vec<u8> {
        self.cu.data_stack().contents()
    }

    /// Return stack contents, bottom to top
    pub fn return_stack(&self) -> Vec<u8> {
        self.cu.return_stack().contents()
    }

    /// Read a byte of byte memory
    pub fn read_memory(&self, addr: u16) -> u8 {
        self.cu.ram().bus().read(addr)
    }

    /// Read a 256-byte page of byte memory (for efficient display)
    pub fn get_memory_page(&self, page: u8) -> Vec<u8> {
        let start = (page as u16) << 8;
        (0..256).map(|i| self.cu.ram().bus().read(start + i)).collect()
    }
}
