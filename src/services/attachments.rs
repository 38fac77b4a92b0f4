use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{error, info};

use crate::models::chat_history::FileMetadata;
use crate::services::openrouter::payload::{IMAGE_MIME_TYPES, MIME_PDF};
use crate::services::openrouter::FileUpload;
use crate::services::pdf_text;

static BASE64_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9/\r\n+]*={0,2}$").expect("base64 regex"));

/// Prompt and file ready to relay, plus the metadata recorded in history.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPrompt {
    pub prompt: String,
    pub file: Option<FileUpload>,
    pub metadata: Option<FileMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Failed to process PDF: {0}")]
    Pdf(String),
    #[error("{0}")]
    Invalid(String),
}

/// Inlines PDF text into the prompt and validates any remaining image upload.
pub fn prepare_prompt(
    prompt: &str,
    file: Option<FileUpload>,
    max_file_size: u64,
) -> Result<PreparedPrompt, UploadError> {
    let metadata = file.as_ref().map(|f| FileMetadata {
        name: f.name.clone(),
        mime_type: f.mime_type.clone(),
    });

    let mut prompt = prompt.to_string();
    let mut file = file;

    if let Some(pdf) = file.as_ref().filter(|f| f.mime_type == MIME_PDF) {
        let text = pdf_text::extract_text_from_base64(&pdf.base64).map_err(|e| {
            error!("[UPLOAD] PDF extraction failed: {}", e);
            UploadError::Pdf(e)
        })?;
        info!("[UPLOAD] PDF processed: extracted_length={}", text.len());
        prompt = with_pdf_content(&pdf.name, &text, &prompt);
        file = None;
    }

    if let Some(image) = file.as_ref() {
        validate_image(image, max_file_size)?;
    }

    Ok(PreparedPrompt {
        prompt,
        file,
        metadata,
    })
}

pub fn with_pdf_content(name: &str, text: &str, prompt: &str) -> String {
    format!(
        "[PDF Content: {}]\n\n{}\n\n---End of PDF content---\n\n{}",
        name, text, prompt
    )
}

pub fn validate_image(file: &FileUpload, max_file_size: u64) -> Result<(), UploadError> {
    if file.base64.is_empty() {
        return Err(UploadError::Invalid("File base64 data is empty".to_string()));
    }
    if !BASE64_BODY.is_match(&file.base64) {
        return Err(UploadError::Invalid("Invalid base64 data".to_string()));
    }

    let estimated_size = file.base64.len() as f64 * 0.75;
    if estimated_size > max_file_size as f64 {
        return Err(UploadError::Invalid(format!(
            "File is too large. Maximum size is {}MB.",
            max_file_size / (1024 * 1024)
        )));
    }

    if !IMAGE_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(UploadError::Invalid(format!(
            "Unsupported file type: {}",
            file.mime_type
        )));
    }

    info!(
        "[UPLOAD] file validation passed: type={}, name={}, estimated_size={}",
        file.mime_type, file.name, estimated_size
    );
    Ok(())
}
