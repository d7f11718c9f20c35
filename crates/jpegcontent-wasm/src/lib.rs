//! jpegcontent WASM - WebAssembly bindings for jpegcontent
//!
//! This crate exposes the jpegcontent-core document model to
//! JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `document` - the JPEG document wrapper and header probes
//! - `types` - serde types returned to JavaScript as plain objects
//! - `logger` - forwards `log` records to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsJpegDocument, read_jpeg_size } from '@jpegcontent/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const { width, height } = read_jpeg_size(bytes);
//!
//! const doc = new JsJpegDocument();
//! doc.load(bytes);
//! doc.apply_transformation(8);
//! const saved = doc.save();
//! ```

use wasm_bindgen::prelude::*;

mod document;
mod logger;
mod types;

#[cfg(test)]
mod test_fixtures;

// Re-export public types
pub use document::{read_jpeg_orientation, read_jpeg_size, DocumentState, JsJpegDocument};
pub use types::{ExifSummary, ImageInfo};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(log::LevelFilter::Info);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
