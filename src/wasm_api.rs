//! WASM API: `#[wasm_bindgen]` exports for editor-side hosts.
//!
//! This module is only compiled when targeting `wasm32`. It provides:
//! - `init_registry` / `destroy_registry`: lifecycle
//! - `load_blocks`: run a full pass over JSON-supplied batches
//! - `editor_payload` / `block_schema` / `canonical_ids`: discovery
//! - `render_block`: dispatch through a JS renderer callback

use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::core::config::LoaderConfig;
use crate::core::definition::Attributes;
use crate::core::registry::BlockRegistry;
use crate::runtime::merge::merge_with_report;
use crate::runtime::source::DocumentBatch;

// ── Global state ────────────────────────────────────────────────────────────

struct WasmRegistry {
    registry: BlockRegistry,
    template_kind: String,
}

thread_local! {
    static REGISTRY: RefCell<Option<WasmRegistry>> = RefCell::new(None);
}

fn with_registry<R>(f: impl FnOnce(&WasmRegistry) -> R) -> Result<R, String> {
    REGISTRY.with(|cell| match cell.borrow().as_ref() {
        Some(state) => Ok(f(state)),
        None => Err("Registry not initialized. Call init_registry() first.".into()),
    })
}

// ── JSON interchange types ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoadRequestJson {
    /// Definitions documents in discovery order
    #[serde(default)]
    files: Vec<String>,
    /// Published record contents in natural order
    #[serde(default)]
    records: Vec<String>,
}

#[derive(Serialize)]
struct LoadResponse {
    generation: u64,
    registered: Vec<String>,
    skipped: Vec<String>,
    rejected: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn json_err(msg: impl Into<String>) -> String {
    serde_json::to_string(&ErrorResponse { error: msg.into() }).unwrap_or_default()
}

// ── Exported functions ──────────────────────────────────────────────────────

/// Initialize with a TOML config; an empty string uses the defaults.
#[wasm_bindgen]
pub fn init_registry(config_toml: &str) -> String {
    console_error_panic_hook::set_once();

    let config: LoaderConfig = match config_toml.parse() {
        Ok(c) => c,
        Err(e) => return json_err(format!("{}", e)),
    };

    REGISTRY.with(|cell| {
        *cell.borrow_mut() = Some(WasmRegistry {
            registry: BlockRegistry::with_normalizer(config.normalizer()),
            template_kind: config.template_kind,
        });
    });
    "{}".into()
}

#[wasm_bindgen]
pub fn destroy_registry() {
    REGISTRY.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

#[wasm_bindgen]
pub fn load_blocks(request_json: &str) -> String {
    let request: LoadRequestJson = match serde_json::from_str(request_json) {
        Ok(r) => r,
        Err(e) => return json_err(format!("Invalid load request JSON: {}", e)),
    };

    let batches: Vec<DocumentBatch> = request
        .files
        .into_iter()
        .enumerate()
        .map(|(i, payload)| DocumentBatch::file(format!("file:{}", i), payload))
        .chain(
            request
                .records
                .into_iter()
                .enumerate()
                .map(|(i, payload)| DocumentBatch::record(format!("record:{}", i), payload)),
        )
        .collect();

    let outcome = with_registry(|state| {
        let (table, merge) = merge_with_report(&batches);
        let registration = state.registry.register_all(&table);
        LoadResponse {
            generation: registration.generation,
            registered: registration.registered,
            skipped: merge.skipped,
            rejected: registration.rejected.into_iter().map(|(key, _)| key).collect(),
        }
    });

    match outcome {
        Ok(response) => serde_json::to_string(&response).unwrap_or_default(),
        Err(e) => json_err(e),
    }
}

/// Merged definitions behind the current generation, for the editor script
#[wasm_bindgen]
pub fn editor_payload() -> String {
    match with_registry(|state| state.registry.snapshot().definitions().to_json()) {
        Ok(payload) => payload.to_string(),
        Err(e) => json_err(e),
    }
}

#[wasm_bindgen]
pub fn canonical_ids() -> String {
    match with_registry(|state| state.registry.canonical_ids()) {
        Ok(ids) => serde_json::to_string(&ids).unwrap_or_default(),
        Err(e) => json_err(e),
    }
}

#[wasm_bindgen]
pub fn block_schema(canonical_id: &str) -> String {
    match with_registry(|state| state.registry.lookup(canonical_id)) {
        Ok(Ok(block)) => block.schema.to_json().to_string(),
        Ok(Err(e)) => json_err(e.to_string()),
        Err(e) => json_err(e),
    }
}

/// Render a registered block through `renderer(name, attributesJson, kind)`.
///
/// JS callbacks cannot cross threads, so this resolves the block itself
/// instead of going through a `Dispatcher`.
#[wasm_bindgen]
pub fn render_block(
    canonical_id: &str,
    attributes_json: &str,
    renderer: &js_sys::Function,
) -> Result<String, JsValue> {
    let attributes: Attributes = serde_json::from_str(attributes_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid attributes JSON: {}", e)))?;

    let (block, kind) = with_registry(|state| {
        state
            .registry
            .lookup(canonical_id)
            .map(|block| (block, state.template_kind.clone()))
    })
    .map_err(|e| JsValue::from_str(&e))?
    .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let output = renderer.call3(
        &JsValue::NULL,
        &JsValue::from_str(&block.definition.name),
        &JsValue::from_str(&serde_json::Value::Object(attributes).to_string()),
        &JsValue::from_str(&kind),
    )?;
    Ok(output.as_string().unwrap_or_default())
}
