use base64::engine::general_purpose::STANDARD as BASE64_STD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info};

use crate::utils::log_helpers::truncate_log;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Decodes a base64 PDF and returns its text with whitespace runs collapsed.
pub fn extract_text_from_base64(b64: &str) -> Result<String, String> {
    let result = decode_and_extract(b64);
    match &result {
        Ok(text) => info!(
            "[PDF] text extracted: length={}, preview={}",
            text.len(),
            truncate_log(text, 200)
        ),
        Err(err) => error!("[PDF] extraction error: {}", err),
    }
    result.map_err(|e| format!("Failed to extract text from PDF: {e}"))
}

fn decode_and_extract(b64: &str) -> Result<String, String> {
    let compact: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64_STD
        .decode(compact.as_bytes())
        .map_err(|_| "Invalid base64 data".to_string())?;

    let doc = lopdf::Document::load_mem(&bytes).map_err(|e| e.to_string())?;
    let pages: Vec<u32> = doc.get_pages().keys().cloned().collect();
    let text = doc.extract_text(&pages).map_err(|e| e.to_string())?;

    Ok(collapse_whitespace(&text))
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}
