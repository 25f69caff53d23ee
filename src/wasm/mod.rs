//! WASM bindings for the paginator

pub mod flat_buffer;

use crate::document::BoxTree;
use crate::error::Error;
use crate::layout::PaginationOptions;
use crate::{Paginator, Rect};
use flat_buffer::PageBuffer;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js(err: Error) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// WASM-exposed paginator wrapper.
///
/// Results are encoded into a [`PageBuffer`]; JS reads them through the
/// pointer accessors without copying.
#[wasm_bindgen]
pub struct WasmPaginator {
    paginator: Paginator,
    tree: Option<BoxTree>,
    buffer: PageBuffer,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create a paginator with default options (US Letter content area)
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmPaginator, JsValue> {
        Self::with_options("{}")
    }

    /// Create a paginator from a camelCase options object
    #[wasm_bindgen(js_name = withOptions)]
    pub fn with_options(options_json: &str) -> Result<WasmPaginator, JsValue> {
        let options = PaginationOptions::from_json(options_json).map_err(to_js)?;
        let paginator = Paginator::new(options).map_err(to_js)?;
        Ok(Self {
            paginator,
            tree: None,
            buffer: PageBuffer::new(),
        })
    }

    /// Replace options; call `paginate` or `repaginate` to apply them
    #[wasm_bindgen(js_name = setOptions)]
    pub fn set_options(&mut self, options_json: &str) -> Result<(), JsValue> {
        let options = PaginationOptions::from_json(options_json).map_err(to_js)?;
        self.paginator.set_options(options).map_err(to_js)
    }

    /// Paginate a JSON array of measured boxes; returns the page count
    pub fn paginate(&mut self, boxes_json: &str) -> Result<usize, JsValue> {
        let tree = BoxTree::from_json(boxes_json).map_err(to_js)?;
        self.paginator.paginate(&tree).map_err(to_js)?;
        self.tree = Some(tree);
        self.encode();
        Ok(self.paginator.page_count())
    }

    /// Paginate new measurements and return the page diff as JSON
    pub fn repaginate(&mut self, boxes_json: &str) -> Result<String, JsValue> {
        let tree = BoxTree::from_json(boxes_json).map_err(to_js)?;
        let diff = self.paginator.repaginate(&tree).map_err(to_js)?;
        self.tree = Some(tree);
        self.encode();
        serde_json::to_string(&diff).map_err(|e| to_js(e.into()))
    }

    /// Get page count
    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.paginator.page_count()
    }

    /// Last result as JSON
    #[wasm_bindgen(js_name = getResultJson)]
    pub fn get_result_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.paginator.result()).map_err(|e| to_js(e.into()))
    }

    /// Display list for a viewport as JSON
    #[wasm_bindgen(js_name = getDisplayListJson)]
    pub fn get_display_list_json(&self, viewport_y: f32, viewport_height: f32) -> Result<String, JsValue> {
        let Some(tree) = &self.tree else {
            return Ok("{\"pages\":[]}".to_string());
        };
        let width = self.paginator.constraints().page_width;
        let viewport = Rect::new(0.0, viewport_y, width, viewport_height);
        let display = self.paginator.build_display_list(tree, Some(viewport));
        serde_json::to_string(&display).map_err(|e| to_js(e.into()))
    }

    /// Get layout constraints as JSON
    #[wasm_bindgen(js_name = getLayoutConstraints)]
    pub fn get_layout_constraints(&self) -> Result<String, JsValue> {
        let constraints = self.paginator.constraints();
        let js = LayoutConstraintsJS {
            page_width: constraints.page_width,
            page_height: constraints.page_height,
            margin_top: constraints.margin_top,
            margin_bottom: constraints.margin_bottom,
            margin_left: constraints.margin_left,
            margin_right: constraints.margin_right,
            content_width: constraints.content_width(),
            content_height: constraints.content_height(),
        };
        serde_json::to_string(&js).map_err(|e| to_js(e.into()))
    }

    #[wasm_bindgen(js_name = u32Ptr)]
    pub fn u32_ptr(&self) -> u32 {
        self.buffer.u32_ptr()
    }

    #[wasm_bindgen(js_name = u32Len)]
    pub fn u32_len(&self) -> u32 {
        self.buffer.u32_len()
    }

    #[wasm_bindgen(js_name = f32Ptr)]
    pub fn f32_ptr(&self) -> u32 {
        self.buffer.f32_ptr()
    }

    #[wasm_bindgen(js_name = f32Len)]
    pub fn f32_len(&self) -> u32 {
        self.buffer.f32_len()
    }
}

impl WasmPaginator {
    fn encode(&mut self) {
        self.buffer
            .write_result(self.paginator.result(), self.paginator.version());
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConstraintsJS {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub content_width: f32,
    pub content_height: f32,
}
