use serde_json::{json, Value};

use super::error::OpenRouterError;
use super::types::{AssistantMessage, ChatMessage, FileUpload, SendOptions};

pub const MIME_PDF: &str = "application/pdf";
pub const IMAGE_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// Builds the `/chat/completions` body.
///
/// With a file attached, the last user message is moved to the end and its
/// content becomes a parts array: the prompt text followed by the file part.
pub fn build_request_body(
    model_id: &str,
    messages: &[ChatMessage],
    options: &SendOptions,
) -> Result<Value, OpenRouterError> {
    let mut out: Vec<Value> = Vec::with_capacity(messages.len() + 1);

    match options.file.as_ref() {
        Some(file) => {
            if file.base64.is_empty() {
                return Err(OpenRouterError::InvalidRequest(
                    "Base64 file data is empty".to_string(),
                ));
            }

            let last_user = messages.iter().rposition(|m| m.role == "user");
            for (idx, message) in messages.iter().enumerate() {
                if Some(idx) != last_user {
                    out.push(plain_message(message));
                }
            }

            let mut parts: Vec<Value> = Vec::with_capacity(2);
            if let Some(idx) = last_user {
                parts.push(json!({"type": "text", "text": messages[idx].content}));
            }
            parts.push(file_part(model_id, file)?);
            out.push(json!({"role": "user", "content": parts}));
        }
        None => {
            out.extend(messages.iter().map(plain_message));
        }
    }

    let mut body = json!({
        "model": model_id,
        "messages": out,
    });
    if let Some(temperature) = options.temperature {
        body["temperature"] = json!(temperature);
    }
    Ok(body)
}

fn plain_message(message: &ChatMessage) -> Value {
    let role = if message.role.trim().is_empty() {
        "user"
    } else {
        message.role.as_str()
    };
    json!({"role": role, "content": message.content})
}

/// Provider-specific content part for an attached file.
pub fn file_part(model_id: &str, file: &FileUpload) -> Result<Value, OpenRouterError> {
    if file.mime_type == MIME_PDF {
        if model_id.contains("gemini") || model_id.contains("google") {
            return Ok(json!({
                "type": "file_data",
                "file_data": {
                    "mime_type": MIME_PDF,
                    "data": file.base64
                }
            }));
        }
        // Claude and every other provider take the document block.
        return Ok(json!({
            "type": "document",
            "source": {
                "type": "base64",
                "media_type": MIME_PDF,
                "data": file.base64
            }
        }));
    }

    if IMAGE_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Ok(json!({
            "type": "image_url",
            "image_url": {
                "url": format!("data:{};base64,{}", file.mime_type, file.base64)
            }
        }));
    }

    Err(OpenRouterError::InvalidRequest(format!(
        "Unsupported file type: {}",
        file.mime_type
    )))
}

/// Interprets an upstream completion response.
pub fn parse_completion(status: u16, raw: &str) -> Result<AssistantMessage, OpenRouterError> {
    if status != 200 {
        let detail = serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|val| val.get("error").map(describe_error))
            .unwrap_or_else(|| raw.to_string());
        return Err(OpenRouterError::Api(detail));
    }

    let val: Value = serde_json::from_str(raw).map_err(|_| OpenRouterError::InvalidJson)?;

    if let Some(err) = val.get("error") {
        return Err(OpenRouterError::Api(describe_error(err)));
    }

    let message = val
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or(OpenRouterError::NoChoices)?;

    let role = message
        .get("role")
        .and_then(|v| v.as_str())
        .unwrap_or("assistant")
        .to_string();
    let content = content_text(message.get("content").unwrap_or(&Value::Null));

    Ok(AssistantMessage { role, content })
}

fn describe_error(err: &Value) -> String {
    if let Some(text) = err.as_str() {
        return text.to_string();
    }
    err.get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.to_string())
}

fn content_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(mime: &str) -> FileUpload {
        FileUpload {
            name: "file".to_string(),
            mime_type: mime.to_string(),
            base64: "QUJD".to_string(),
        }
    }

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::new("user", "first question"),
            ChatMessage::new("assistant", "first answer"),
            ChatMessage::new("user", "what is in this file?"),
        ]
    }

    #[test]
    fn forwards_messages_unchanged_without_file() {
        let body = build_request_body("openai/gpt-4", &history(), &SendOptions::default()).unwrap();
        assert_eq!(body["model"], "openai/gpt-4");
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][2]["content"], "what is in this file?");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn blank_role_defaults_to_user() {
        let messages = vec![ChatMessage::new("", "hi")];
        let body = build_request_body("m", &messages, &SendOptions::default()).unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn moves_last_user_message_into_parts_with_file() {
        let options = SendOptions {
            file: Some(upload("image/png")),
            temperature: None,
        };
        let body = build_request_body("openai/gpt-4o", &history(), &options).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["content"], "first answer");

        let parts = messages[2]["content"].as_array().unwrap();
        assert_eq!(parts[0], json!({"type": "text", "text": "what is in this file?"}));
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,QUJD");
    }

    #[test]
    fn file_without_user_message_has_only_file_part() {
        let messages = vec![ChatMessage::new("system", "be brief")];
        let options = SendOptions {
            file: Some(upload("image/gif")),
            temperature: None,
        };
        let body = build_request_body("m", &messages, &options).unwrap();
        let parts = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0]["type"], "image_url");
    }

    #[test]
    fn pdf_part_depends_on_provider() {
        let pdf = upload(MIME_PDF);
        let claude = file_part("anthropic/claude-3-opus", &pdf).unwrap();
        assert_eq!(claude["type"], "document");
        assert_eq!(claude["source"]["media_type"], MIME_PDF);

        let gemini = file_part("google/gemini-pro-1.5", &pdf).unwrap();
        assert_eq!(gemini["type"], "file_data");
        assert_eq!(gemini["file_data"]["data"], "QUJD");

        let generic = file_part("mistralai/mistral-large", &pdf).unwrap();
        assert_eq!(generic, claude);
    }

    #[test]
    fn rejects_empty_or_unsupported_files() {
        let mut empty = upload("image/png");
        empty.base64.clear();
        let options = SendOptions {
            file: Some(empty),
            temperature: None,
        };
        let err = build_request_body("m", &history(), &options).unwrap_err();
        assert_eq!(err.to_string(), "Base64 file data is empty");

        let err = file_part("m", &upload("text/csv")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: text/csv");
    }

    #[test]
    fn includes_temperature_when_requested() {
        let options = SendOptions {
            file: None,
            temperature: Some(0.3),
        };
        let body = build_request_body("m", &history(), &options).unwrap();
        assert_eq!(body["temperature"], json!(0.3));
    }

    #[test]
    fn parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Bonjour !"}}]}"#;
        let message = parse_completion(200, raw).unwrap();
        assert_eq!(message.role, "assistant");
        assert_eq!(message.content, "Bonjour !");
    }

    #[test]
    fn null_content_becomes_empty() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(parse_completion(200, raw).unwrap().content, "");
    }

    #[test]
    fn reports_upstream_errors() {
        let err = parse_completion(401, r#"{"error":{"message":"No auth credentials found"}}"#).unwrap_err();
        assert_eq!(err.to_string(), "OpenRouter API Error: No auth credentials found");

        let err = parse_completion(400, r#"{"error":"model is required"}"#).unwrap_err();
        assert_eq!(err.to_string(), "OpenRouter API Error: model is required");

        let err = parse_completion(502, "Bad gateway").unwrap_err();
        assert_eq!(err.to_string(), "OpenRouter API Error: Bad gateway");

        let err = parse_completion(200, r#"{"error":{"code":429}}"#).unwrap_err();
        assert_eq!(err.to_string(), r#"OpenRouter API Error: {"code":429}"#);

        assert!(matches!(parse_completion(200, "<html>"), Err(OpenRouterError::InvalidJson)));
        assert!(matches!(
            parse_completion(200, r#"{"choices":[]}"#),
            Err(OpenRouterError::NoChoices)
        ));
    }
}
