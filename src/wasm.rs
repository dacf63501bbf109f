//! WASM bindings for Disruption Core.
//!
//! This module provides JavaScript-friendly bindings for use in web browsers
//! with Web Audio API's AudioWorklet.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmDisruption } from 'disruption_core';
//!
//! await init();
//!
//! const pedal = new WasmDisruption(48000);
//! pedal.set_drive(0.8);
//!
//! // In AudioWorkletProcessor.process():
//! const input = inputBuffer.getChannelData(0);
//! const output = outputBuffer.getChannelData(0);
//! pedal.process_block(input, output);
//! ```

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::controls::Parameters;
use crate::error::DisruptionError;
use crate::processor::{ProcessSpec, Processor, ProcessorConfig, DEFAULT_BLOCK_SIZE};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(error: DisruptionError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Mono distortion pedal for a Web Audio AudioWorklet.
#[wasm_bindgen]
pub struct WasmDisruption {
    processor: Processor,
    params: Arc<Parameters>,
}

#[wasm_bindgen]
impl WasmDisruption {
    /// Create a mono pedal at the given sample rate.
    ///
    /// # Example
    /// ```javascript
    /// const pedal = new WasmDisruption(48000);
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f32) -> Result<WasmDisruption, JsValue> {
        Self::with_config(sample_rate, crate::stages::MAX_ITERATIONS, crate::stages::CONVERGENCE_THRESHOLD)
    }

    /// Create a pedal with custom clipping solver settings.
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `max_iterations` - Maximum Newton-Raphson iterations (at most 50)
    /// * `tolerance` - Residual threshold in amperes (default: 1e-7)
    #[wasm_bindgen]
    pub fn with_config(
        sample_rate: f32,
        max_iterations: usize,
        tolerance: f64,
    ) -> Result<WasmDisruption, JsValue> {
        let config = ProcessorConfig::new()
            .with_max_iterations(max_iterations)
            .with_tolerance(tolerance);
        let mut processor = Processor::new(config);
        processor
            .prepare(ProcessSpec::new(f64::from(sample_rate), DEFAULT_BLOCK_SIZE, 1))
            .map_err(to_js)?;
        let params = processor.parameters();

        Ok(WasmDisruption { processor, params })
    }

    /// Process a block of mono samples into `output`.
    ///
    /// Only `min(input.len(), output.len())` samples are processed.
    ///
    /// # Example (AudioWorklet)
    /// ```javascript
    /// class DisruptionProcessor extends AudioWorkletProcessor {
    ///   process(inputs, outputs) {
    ///     const input = inputs[0][0];
    ///     const output = outputs[0][0];
    ///     if (input && output) {
    ///       this.pedal.process_block(input, output);
    ///     }
    ///     return true;
    ///   }
    /// }
    /// ```
    #[wasm_bindgen]
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        let len = input.len().min(output.len());
        let block = &mut output[..len];
        block.copy_from_slice(&input[..len]);
        self.processor.process_block(&mut [block]);
    }

    /// Process a block of mono samples, returning a new Float32Array.
    #[wasm_bindgen]
    pub fn process_block_alloc(&mut self, input: &[f32]) -> Vec<f32> {
        let mut output = input.to_vec();
        self.processor.process_block(&mut [&mut output[..]]);
        output
    }

    /// Renegotiate the sample rate. Stage memories are kept.
    #[wasm_bindgen]
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), JsValue> {
        let spec = ProcessSpec::new(f64::from(sample_rate), DEFAULT_BLOCK_SIZE, 1);
        self.processor.prepare(spec).map_err(to_js)
    }

    #[wasm_bindgen(getter)]
    pub fn sample_rate(&self) -> f32 {
        self.processor.spec().sample_rate as f32
    }

    #[wasm_bindgen]
    pub fn set_drive(&self, value: f32) {
        self.params.set_drive(value);
    }

    #[wasm_bindgen]
    pub fn set_level(&self, value: f32) {
        self.params.set_level(value);
    }

    #[wasm_bindgen]
    pub fn set_bypass(&self, bypass: bool) {
        self.params.set_bypass(bypass);
    }

    #[wasm_bindgen]
    pub fn set_tremolo(&self, on: bool) {
        self.params.set_tremolo_on(on);
    }

    /// Tremolo rate in Hz, clamped to 0.1..10.
    #[wasm_bindgen]
    pub fn set_tremolo_rate(&self, hz: f32) {
        self.params.set_tremolo_rate(hz);
    }

    /// Current warm-start diode voltage. Useful for metering.
    #[wasm_bindgen]
    pub fn diode_voltage(&self) -> f64 {
        self.processor.diode_voltage()
    }

    /// Serialize the tremolo settings into a 5-byte blob.
    #[wasm_bindgen]
    pub fn save_state(&self) -> Vec<u8> {
        self.processor.save_state().to_vec()
    }

    /// Restore tremolo settings from a blob produced by `save_state`.
    #[wasm_bindgen]
    pub fn load_state(&self, bytes: &[u8]) -> Result<(), JsValue> {
        self.processor.load_state(bytes).map_err(to_js)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get the default sample rate.
#[wasm_bindgen]
pub fn default_sample_rate() -> f32 {
    crate::DEFAULT_SAMPLE_RATE
}
