//! JPEG document bindings.
//!
//! [`JsJpegDocument`] is the JavaScript face of a loaded JPEG: it forwards
//! orientation changes to the content manager and, on save, marks the image
//! upright, refreshes the embedded thumbnail and reports failures through
//! an error string.
//!
//! # Example
//!
//! ```typescript
//! import { JsJpegDocument } from '@jpegcontent/wasm';
//!
//! const doc = new JsJpegDocument();
//! doc.load(new Uint8Array(await file.arrayBuffer()));
//! doc.apply_transformation(6); // rotate 90 degrees clockwise
//! const saved = doc.save();
//! ```

use jpegcontent_core::thumbnail::render_thumbnail;
use jpegcontent_core::{ContentError, ContentOptions, JpegContent, Orientation};
use log::warn;
use wasm_bindgen::prelude::*;

use crate::types::{orientation_from_u8, ExifSummary, ImageInfo};

/// Document state behind [`JsJpegDocument`], usable without a JavaScript runtime.
#[derive(Debug, Default)]
pub struct DocumentState {
    content: JpegContent,
    error: String,
}

impl DocumentState {
    pub fn new(options: ContentOptions) -> Self {
        Self {
            content: JpegContent::with_options(options),
            error: String::new(),
        }
    }

    pub fn content(&self) -> &JpegContent {
        &self.content
    }

    pub fn load(&mut self, bytes: &[u8]) -> Result<(), ContentError> {
        let result = self.content.load(bytes);
        self.record(result)
    }

    pub fn raw_data(&self) -> &[u8] {
        self.content.raw_data()
    }

    pub fn apply_transformation(&mut self, orientation: Orientation) {
        self.content.transform(orientation);
    }

    /// Save with the orientation tag reset and a fresh thumbnail.
    pub fn save(&mut self) -> Result<Vec<u8>, ContentError> {
        self.content.reset_orientation();
        if self.content.thumbnail().is_some() {
            self.refresh_thumbnail();
        }
        let result = self.content.save_to_vec();
        self.record(result)
    }

    fn refresh_thumbnail(&mut self) {
        let max_edge = self.content.options().thumbnail_max_edge;
        match render_thumbnail(
            self.content.raw_data(),
            self.content.pending_transform(),
            max_edge,
        ) {
            Ok(thumbnail) => self.content.set_thumbnail(&thumbnail),
            Err(e) => warn!("keeping the old thumbnail: {}", e),
        }
    }

    fn record<T>(&mut self, result: Result<T, ContentError>) -> Result<T, ContentError> {
        match &result {
            Ok(_) => self.error.clear(),
            Err(e) => self.error = e.to_string(),
        }
        result
    }

    /// Why the last load or save failed; empty after a success.
    pub fn error_string(&self) -> &str {
        &self.error
    }
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// A JPEG document for JavaScript.
#[wasm_bindgen]
pub struct JsJpegDocument {
    state: DocumentState,
}

#[wasm_bindgen]
impl JsJpegDocument {
    /// Create an empty document. `options` may be omitted or a partial
    /// `{ thumbnail_quality, thumbnail_max_edge }` object.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsJpegDocument, JsValue> {
        let options: ContentOptions = if options.is_undefined() || options.is_null() {
            ContentOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(to_js_error)?
        };
        Ok(JsJpegDocument {
            state: DocumentState::new(options),
        })
    }

    pub fn load(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.state.load(bytes).map_err(to_js_error)
    }

    /// Current encoded bytes (a copy).
    pub fn raw_data(&self) -> Vec<u8> {
        self.state.raw_data().to_vec()
    }

    /// Queue a transform, given as an Exif orientation value (1-8).
    pub fn apply_transformation(&mut self, orientation: u8) {
        self.state
            .apply_transformation(orientation_from_u8(orientation));
    }

    /// Save and return the new bytes.
    pub fn save(&mut self) -> Result<Vec<u8>, JsValue> {
        self.state.save().map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn error_string(&self) -> String {
        self.state.error_string().to_string()
    }

    /// Displayed width, after orientation
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.state.content().size().width
    }

    /// Displayed height, after orientation
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.state.content().size().height
    }

    #[wasm_bindgen(getter)]
    pub fn orientation(&self) -> u8 {
        self.state.content().orientation() as u8
    }

    #[wasm_bindgen(getter)]
    pub fn comment(&self) -> String {
        self.state.content().comment().to_string()
    }

    #[wasm_bindgen(setter)]
    pub fn set_comment(&mut self, comment: String) {
        self.state.content.set_comment(comment);
    }

    /// Metadata as a plain JavaScript object.
    pub fn exif_summary(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&ExifSummary::from_content(self.state.content()))
            .map_err(to_js_error)
    }

    /// True if the last save had to pad out truncated image data.
    #[wasm_bindgen(getter)]
    pub fn was_truncated(&self) -> bool {
        self.state.content().was_truncated()
    }
}

/// Stored `{ width, height, orientation }` of a JPEG, read from its header only.
#[wasm_bindgen]
pub fn read_jpeg_size(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = ImageInfo::probe(bytes).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&info).map_err(to_js_error)
}

/// Exif orientation of a JPEG (0 when it has none).
#[wasm_bindgen]
pub fn read_jpeg_orientation(bytes: &[u8]) -> Result<u8, JsValue> {
    ImageInfo::probe(bytes)
        .map(|info| info.orientation)
        .map_err(to_js_error)
}
