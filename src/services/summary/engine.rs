use sqlx::SqlitePool;
use tracing::info;

use crate::models::chat_history::ChatHistory;
use crate::models::message::{ROLE_SYSTEM, ROLE_USER};
use crate::models::summary::{Summary, SUMMARY_TYPE_INTELLIGENT};
use crate::repositories::{chat_histories, summaries};
use crate::services::openrouter::catalog::{lookup_pricing, ModelPricing};
use crate::services::openrouter::{ChatMessage, ChatRelay, ModelSource, OpenRouterError, SendOptions};

use super::pricing::{calculate_cost, estimated_summary_tokens};
use super::prompt::{resume_with_summary, resume_with_thread, summary_system_prompt, summary_user_message};
use super::thread::{build_thread_context, current_index};
use super::token_budget::estimate_token_count;
use super::types::{
    ConversationThread, CostEstimates, CreatedSummary, ResumeContext, ResumeInfo, ResumePrompt,
    StoredSummary, SummaryError, SummaryList, SummaryListItem, SummaryPolicy, ThreadEntry,
    TokenEstimates,
};

const ENTRY_NOT_FOUND: &str = "Chat history entry not found";
const SUMMARY_NOT_FOUND: &str = "Summary not found";

/// True once a thread is long enough that resuming from a summary pays off.
pub fn summary_recommended(message_count: usize, complete_tokens: i64, policy: &SummaryPolicy) -> bool {
    if policy.recommend_messages > 0 && message_count as i64 >= policy.recommend_messages {
        return true;
    }
    policy.recommend_tokens > 0 && complete_tokens >= policy.recommend_tokens
}

async fn load_entry(pool: &SqlitePool, id: i64) -> Result<ChatHistory, SummaryError> {
    chat_histories::get_chat_history_by_id(pool, id)
        .await
        .map_err(SummaryError::Storage)?
        .ok_or(SummaryError::NotFound(ENTRY_NOT_FOUND))
}

async fn load_thread(pool: &SqlitePool, entry: &ChatHistory) -> Result<Vec<ChatHistory>, SummaryError> {
    chat_histories::list_thread(pool, entry)
        .await
        .map_err(SummaryError::Storage)
}

async fn pricing_for<C: ModelSource + ?Sized>(client: Option<&C>, model_id: &str) -> ModelPricing {
    lookup_pricing(client, model_id).await
}

pub async fn conversation_thread(pool: &SqlitePool, id: i64) -> Result<ConversationThread, SummaryError> {
    let entry = load_entry(pool, id).await?;
    let thread = load_thread(pool, &entry).await?;

    Ok(ConversationThread {
        current_message_index: current_index(&thread, entry.id),
        messages: thread
            .into_iter()
            .map(|e| ThreadEntry {
                id: e.id,
                prompt: e.prompt,
                response: e.response,
                created_at: e.created_at,
            })
            .collect(),
        title: entry.title,
        model: entry.model,
    })
}

pub async fn resume_info<C: ModelSource + ?Sized>(
    pool: &SqlitePool,
    id: i64,
    client: Option<&C>,
    policy: &SummaryPolicy,
) -> Result<ResumeInfo, SummaryError> {
    let entry = load_entry(pool, id).await?;
    let thread = load_thread(pool, &entry).await?;
    let context = build_thread_context(&thread, entry.id).ok_or(SummaryError::NotInThread)?;

    let pricing = pricing_for(client, &entry.model).await;
    let complete_tokens = estimate_token_count(&context.text);
    let complete_cost = calculate_cost(complete_tokens, &pricing);

    info!(
        "[SUMMARY] resume info: id={}, context_length={}, messages={}, tokens={}, cost={}",
        entry.id,
        context.text.len(),
        context.message_count,
        complete_tokens,
        complete_cost
    );

    let stored = summaries::get_summary_by_chat_history(pool, entry.id)
        .await
        .map_err(SummaryError::Storage)?;

    let (summary_tokens, summary_id, summary_estimated) = match stored {
        Some(summary) => (summary.tokens_count.unwrap_or(0), Some(summary.id), None),
        None => (estimated_summary_tokens(complete_tokens), None, Some(true)),
    };

    Ok(ResumeInfo {
        id: entry.id,
        title: entry.title,
        model: entry.model,
        message_count: context.message_count,
        context_length: context.text.len(),
        token_estimates: TokenEstimates {
            complete: complete_tokens,
            summary: summary_tokens,
        },
        costs: CostEstimates {
            complete: complete_cost,
            summary: calculate_cost(summary_tokens, &pricing),
        },
        has_summary: summary_id.is_some(),
        summary_id,
        summary_estimated,
        summary_recommended: summary_recommended(context.message_count, complete_tokens, policy),
    })
}

/// Returns the stored summary for the entry, generating one first if needed.
pub async fn create_summary<C: ChatRelay + ModelSource + ?Sized>(
    pool: &SqlitePool,
    id: i64,
    client: Option<&C>,
    policy: &SummaryPolicy,
) -> Result<CreatedSummary, SummaryError> {
    let entry = load_entry(pool, id).await?;

    let existing = summaries::get_summary_by_chat_history(pool, entry.id)
        .await
        .map_err(SummaryError::Storage)?;
    if let Some(summary) = existing {
        let pricing = pricing_for(client, &entry.model).await;
        return Ok(created_from(summary, &pricing));
    }

    let client = client.ok_or(OpenRouterError::MissingApiKey)?;
    let thread = load_thread(pool, &entry).await?;
    let context = build_thread_context(&thread, entry.id).ok_or(SummaryError::NotInThread)?;
    let title = entry.title.clone().unwrap_or_default();

    info!(
        "[SUMMARY] creating summary: id={}, messages={}, context_length={}",
        entry.id,
        context.message_count,
        context.text.len()
    );

    let messages = vec![
        ChatMessage::new(ROLE_SYSTEM, summary_system_prompt(&title, context.message_count)),
        ChatMessage::new(ROLE_USER, summary_user_message(&context.text)),
    ];
    let options = SendOptions {
        file: None,
        temperature: Some(policy.temperature),
    };
    let reply = client.send_message(&entry.model, messages, options).await?;

    let tokens_count = estimate_token_count(&reply.content);
    let summary = Summary::new(entry.id, reply.content, tokens_count, SUMMARY_TYPE_INTELLIGENT);
    let stored = summaries::create_summary(pool, &summary)
        .await
        .map_err(SummaryError::Storage)?;

    let pricing = pricing_for(Some(client), &entry.model).await;
    let created = created_from(stored, &pricing);
    info!(
        "[SUMMARY] summary created: tokens={}, cost={}",
        created.tokens_count, created.cost
    );
    Ok(created)
}

fn created_from(summary: Summary, pricing: &ModelPricing) -> CreatedSummary {
    let tokens_count = summary.tokens_count.unwrap_or(0);
    CreatedSummary {
        success: true,
        cost: calculate_cost(tokens_count, pricing),
        summary: summary.summary_text,
        tokens_count,
        id: summary.id,
    }
}

pub async fn get_summary<C: ModelSource + ?Sized>(
    pool: &SqlitePool,
    chat_history_id: i64,
    client: Option<&C>,
) -> Result<StoredSummary, SummaryError> {
    let summary = summaries::get_summary_by_chat_history(pool, chat_history_id)
        .await
        .map_err(SummaryError::Storage)?
        .ok_or(SummaryError::NotFound(SUMMARY_NOT_FOUND))?;

    let entry = chat_histories::get_chat_history_by_id(pool, chat_history_id)
        .await
        .map_err(SummaryError::Storage)?;
    let pricing = match entry {
        Some(entry) => pricing_for(client, &entry.model).await,
        None => ModelPricing::default(),
    };

    let tokens_count = summary.tokens_count.unwrap_or(0);
    Ok(StoredSummary {
        id: summary.id,
        summary: summary.summary_text,
        tokens_count,
        cost: calculate_cost(tokens_count, &pricing),
        summary_type: summary.summary_type,
    })
}

pub async fn list_summaries(pool: &SqlitePool) -> Result<SummaryList, SummaryError> {
    let rows = summaries::list_summaries(pool)
        .await
        .map_err(SummaryError::Storage)?;
    let items: Vec<SummaryListItem> = rows
        .into_iter()
        .map(|s| SummaryListItem {
            summary_text_length: s.summary_text.len(),
            id: s.id,
            chat_history_id: s.chat_history_id,
            summary_type: s.summary_type,
            tokens_count: s.tokens_count,
            created_at: s.created_at,
        })
        .collect();
    Ok(SummaryList {
        count: items.len(),
        summaries: items,
    })
}

/// Text a user pastes into a new chat to pick a thread back up.
pub async fn resume_prompt(
    pool: &SqlitePool,
    id: i64,
    context: Option<&str>,
) -> Result<ResumePrompt, SummaryError> {
    let mode = ResumeContext::parse(context)
        .ok_or_else(|| SummaryError::InvalidContext(context.unwrap_or_default().to_string()))?;

    let prompt = match mode {
        ResumeContext::Complete => {
            let entry = load_entry(pool, id).await?;
            let thread = load_thread(pool, &entry).await?;
            let text = build_thread_context(&thread, entry.id)
                .map(|c| c.text)
                .unwrap_or_default();
            resume_with_thread(&text)
        }
        ResumeContext::Summary => {
            let summary = summaries::get_summary_by_chat_history(pool, id)
                .await
                .map_err(SummaryError::Storage)?
                .ok_or(SummaryError::NotFound(SUMMARY_NOT_FOUND))?;
            let title = chat_histories::get_chat_history_by_id(pool, id)
                .await
                .map_err(SummaryError::Storage)?
                .and_then(|e| e.title)
                .unwrap_or_default();
            resume_with_summary(&summary.summary_text, &title)
        }
    };

    Ok(ResumePrompt {
        context: mode.as_str(),
        prompt,
    })
}
