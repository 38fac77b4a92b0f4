use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::types::ModelSource;

const FILE_KEYWORDS: [&str; 12] = [
    "vision",
    "image",
    "multimodal",
    "document",
    "file",
    "upload",
    "process-image",
    "process-document",
    "image-understanding",
    "visual",
    "picture",
    "photo",
];

const TEXT_ONLY_MODELS: [&str; 5] = ["gpt-3.5", "text-davinci", "text-curie", "text-babbage", "text-ada"];

/// Upstream prices are quoted per million tokens.
const TOKENS_PER_QUOTE: f64 = 1_000_000.0;

pub const DEFAULT_INPUT_PRICE: f64 = 0.000001;
pub const DEFAULT_OUTPUT_PRICE: f64 = 0.000002;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogModel {
    pub id: String,
    pub label: String,
    pub description: String,
    pub is_free: bool,
    pub total_price: f64,
    #[serde(rename = "canProcessFiles")]
    pub can_process_files: bool,
    #[serde(rename = "pdfSupport")]
    pub pdf_support: &'static str,
    pub capabilities: Value,
}

/// Per-token prices used for cost estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT_PRICE,
            output: DEFAULT_OUTPUT_PRICE,
        }
    }
}

pub fn format_model(raw: &Value) -> CatalogModel {
    let id = raw.get("id").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let description = raw
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let capabilities = raw
        .get("capabilities")
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| json!([]));

    let pricing = raw.get("pricing").map(pricing_of).unwrap_or(ModelPricing {
        input: 0.0,
        output: 0.0,
    });
    let can_process_files = can_process_files(&id, description, &capabilities);

    CatalogModel {
        is_free: id.contains(":free"),
        total_price: (pricing.input + pricing.output) * TOKENS_PER_QUOTE,
        label: model_label(&id),
        description: escape_html(description),
        pdf_support: pdf_support(&id, description, can_process_files),
        can_process_files,
        capabilities,
        id,
    }
}

/// Paid models first, then the most expensive first.
pub fn sort_models(models: &mut [CatalogModel]) {
    models.sort_by(|a, b| match (a.is_free, b.is_free) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => b
            .total_price
            .partial_cmp(&a.total_price)
            .unwrap_or(Ordering::Equal),
    });
}

pub async fn list_models<S: ModelSource + ?Sized>(source: &S) -> Result<Vec<CatalogModel>, String> {
    let raw = source.fetch_models().await.map_err(|e| e.to_string())?;
    let mut models: Vec<CatalogModel> = raw.iter().map(format_model).collect();
    sort_models(&mut models);
    info!("[CATALOG] formatted {} models", models.len());
    Ok(models)
}

/// Looks up per-token prices for `model_id`, falling back to the defaults.
/// Upstream quotes are scaled down to a single token.
pub async fn lookup_pricing<S: ModelSource + ?Sized>(source: Option<&S>, model_id: &str) -> ModelPricing {
    let Some(source) = source else {
        warn!("[CATALOG] no api key, using default pricing for {}", model_id);
        return ModelPricing::default();
    };
    match source.fetch_models().await {
        Ok(models) => {
            let found = models
                .iter()
                .find(|m| m.get("id").and_then(|v| v.as_str()) == Some(model_id))
                .and_then(|m| m.get("pricing"))
                .filter(|p| p.is_object());
            match found {
                Some(pricing) => {
                    let quoted = pricing_of(pricing);
                    ModelPricing {
                        input: quoted.input / TOKENS_PER_QUOTE,
                        output: quoted.output / TOKENS_PER_QUOTE,
                    }
                }
                None => {
                    warn!("[CATALOG] model {} not in pricing data, using default", model_id);
                    ModelPricing::default()
                }
            }
        }
        Err(err) => {
            warn!("[CATALOG] pricing fetch failed: {}", err);
            ModelPricing::default()
        }
    }
}

fn pricing_of(pricing: &Value) -> ModelPricing {
    let pick = |primary: &str, fallback: &str| {
        pricing
            .get(primary)
            .filter(|v| !v.is_null())
            .or_else(|| pricing.get(fallback))
            .map(price_value)
            .unwrap_or(0.0)
    };
    ModelPricing {
        input: pick("prompt", "input"),
        output: pick("completion", "output"),
    }
}

fn price_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn model_label(id: &str) -> String {
    let parts: Vec<&str> = id.split('/').collect();
    let name = parts.last().copied().unwrap_or("").replace(['-', '_'], " ");
    let name = upper_words(&name);
    let label = if !parts[0].is_empty() {
        format!("{} - {}", parts[0], name)
    } else {
        name
    };
    label.replace(":free", "")
}

fn upper_words(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }
    out
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn can_process_files(id: &str, description: &str, capabilities: &Value) -> bool {
    let id = id.to_lowercase();
    if TEXT_ONLY_MODELS.iter().any(|m| id.contains(m)) {
        return false;
    }

    let haystack = format!("{} {} {}", description, id, capabilities).to_lowercase();
    if FILE_KEYWORDS.iter().any(|k| haystack.contains(k)) {
        return true;
    }

    id.contains("claude-3")
        || id.contains("gpt-4-vision")
        || id.contains("gpt-4-turbo")
        || (id.contains("gemini") && id.contains("pro"))
}

pub fn pdf_support(id: &str, description: &str, can_process_files: bool) -> &'static str {
    if !can_process_files {
        return "none";
    }
    if id.contains("claude") {
        "native"
    } else if id.contains("gemini") || id.contains("google") {
        "limited"
    } else if description.to_lowercase().contains("vision") {
        "possible"
    } else {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::openrouter::error::OpenRouterError;
    use crate::services::openrouter::types::RelayBoxFuture;
    use crate::services::summary::pricing::{calculate_cost, MIN_COST};

    struct StaticModels(Result<Vec<Value>, ()>);

    impl ModelSource for StaticModels {
        fn fetch_models<'a>(&'a self) -> RelayBoxFuture<'a, Result<Vec<Value>, OpenRouterError>> {
            let out = self
                .0
                .clone()
                .map_err(|_| OpenRouterError::Api("boom".to_string()));
            Box::pin(async move { out })
        }
    }

    #[test]
    fn labels_models_readably() {
        assert_eq!(model_label("anthropic/claude-3_opus"), "anthropic - Claude 3 Opus");
        assert_eq!(model_label("meta-llama/llama-3-8b-instruct:free"), "meta-llama - Llama 3 8b Instruct");
        assert_eq!(model_label("standalone-model"), "standalone-model - Standalone Model");
        assert_eq!(model_label("/orphan"), "Orphan");
    }

    #[test]
    fn formats_prices_and_flags() {
        let model = format_model(&json!({
            "id": "openai/gpt-4o",
            "description": "GPT-4o <b>omni</b> & \"vision\"",
            "pricing": {"prompt": "0.000005", "completion": "0.000015"},
            "capabilities": ["tools"]
        }));
        assert!(!model.is_free);
        assert!((model.total_price - 20.0).abs() < 1e-9);
        assert_eq!(
            model.description,
            "GPT-4o &lt;b&gt;omni&lt;/b&gt; &amp; &quot;vision&quot;"
        );
        assert!(model.can_process_files);
        assert_eq!(model.pdf_support, "possible");
        assert_eq!(model.capabilities, json!(["tools"]));
    }

    #[test]
    fn missing_pricing_and_capabilities_default() {
        let model = format_model(&json!({"id": "x/y:free", "pricing": {"input": 0.000001}}));
        assert!(model.is_free);
        assert!((model.total_price - 1.0).abs() < 1e-9);
        assert_eq!(model.capabilities, json!([]));
        assert_eq!(model.description, "");
    }

    #[test]
    fn decides_file_support() {
        let empty = json!([]);
        assert!(!can_process_files("openai/gpt-3.5-turbo", "vision model", &empty));
        assert!(can_process_files("anthropic/claude-3-haiku", "", &empty));
        assert!(can_process_files("google/gemini-pro", "", &empty));
        assert!(can_process_files("openai/gpt-4-turbo", "", &empty));
        assert!(can_process_files("acme/chat", "", &json!(["image-understanding"])));
        assert!(!can_process_files("mistralai/mistral-7b", "A fast text model", &empty));

        assert_eq!(pdf_support("anthropic/claude-3-haiku", "", true), "native");
        assert_eq!(pdf_support("google/gemini-pro", "", true), "limited");
        assert_eq!(pdf_support("acme/chat", "handles uploads", true), "none");
        assert_eq!(pdf_support("anthropic/claude-2", "", false), "none");
    }

    #[test]
    fn sorts_paid_before_free_by_price_desc() {
        let mut models: Vec<CatalogModel> = [
            json!({"id": "a/free:free", "pricing": {"prompt": "0", "completion": "0"}}),
            json!({"id": "b/cheap", "pricing": {"prompt": "0.000001", "completion": "0.000001"}}),
            json!({"id": "c/pricey", "pricing": {"prompt": "0.00001", "completion": "0.00003"}}),
        ]
        .iter()
        .map(format_model)
        .collect();
        sort_models(&mut models);
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c/pricey", "b/cheap", "a/free:free"]);
    }

    #[tokio::test]
    async fn pricing_lookup_falls_back_to_defaults() {
        let source = StaticModels(Ok(vec![json!({
            "id": "openai/gpt-4o",
            "pricing": {"prompt": "0.000005", "completion": "0.000015"}
        })]));

        let found = lookup_pricing(Some(&source), "openai/gpt-4o").await;
        assert_eq!(
            found,
            ModelPricing {
                input: 0.000005 / 1_000_000.0,
                output: 0.000015 / 1_000_000.0
            }
        );

        let unknown = lookup_pricing(Some(&source), "acme/unknown").await;
        assert_eq!(unknown, ModelPricing::default());

        let failing = StaticModels(Err(()));
        assert_eq!(lookup_pricing(Some(&failing), "openai/gpt-4o").await, ModelPricing::default());

        assert_eq!(
            lookup_pricing::<StaticModels>(None, "openai/gpt-4o").await,
            ModelPricing::default()
        );
    }

    #[tokio::test]
    async fn looked_up_prices_keep_small_costs_at_floor() {
        let source = StaticModels(Ok(vec![json!({
            "id": "openai/gpt-4",
            "pricing": {"prompt": "0.00003", "completion": "0.00006"}
        })]));
        let pricing = lookup_pricing(Some(&source), "openai/gpt-4").await;
        assert_eq!(calculate_cost(1000, &pricing), MIN_COST);
    }
}
