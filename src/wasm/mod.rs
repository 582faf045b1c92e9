//! WebAssembly bindings for the stack8 simulator.
//!
//! This module exposes the control unit to JavaScript so a browser page can
//! load a program image, feed operator input and single-step the processor.

#[cfg(feature = "wasm")]
pub mod api;

#[cfg(feature = "wasm")]
pub use api::Stack8Machine;
