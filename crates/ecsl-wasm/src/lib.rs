use ecsl_core::config::Config;
use js_sys::Reflect;
use wasm_bindgen::prelude::*;

/// Parse ECSL source and return the document tree as a JS object.
#[wasm_bindgen]
pub fn parse(source: &str, options: JsValue) -> Result<JsValue, JsError> {
    let config = config_from(&options);
    let doc = ecsl_core::parse_str(source, &config.parser).map_err(|e| to_js_error(source, &e))?;
    serde_wasm_bindgen::to_value(&doc).map_err(|e| JsError::new(&e.to_string()))
}

/// Parse ECSL source and render it back as normalized markup.
#[wasm_bindgen]
pub fn format(source: &str, options: JsValue) -> Result<String, JsError> {
    let config = config_from(&options);
    ecsl_core::format(source, &config).map_err(|e| to_js_error(source, &e))
}

fn to_js_error(source: &str, err: &ecsl_core::Error) -> JsError {
    let (line, column) = ecsl_core::tokenizer::location(source, err.offset());
    JsError::new(&format!("{line}:{column}: {err}"))
}

/// Read the JS options object into a Config. Missing or mistyped keys keep
/// their defaults.
fn config_from(options: &JsValue) -> Config {
    let mut config = Config::default();
    if options.is_undefined() || options.is_null() {
        return config;
    }

    if let Some(v) = get_number(options, "maxDepth") {
        config.parser.max_depth = v as usize;
    }
    if let Some(v) = get_bool(options, "strictClosingTags") {
        config.parser.strict_closing_tags = v;
    }
    if let Some(v) = get_number(options, "maxNodes") {
        config.parser.max_nodes = v as usize;
    }
    if let Some(v) = get_number(options, "indent") {
        config.render.indent = v as usize;
    }
    config
}

fn get_number(obj: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn get_bool(obj: &JsValue, key: &str) -> Option<bool> {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_bool())
}
