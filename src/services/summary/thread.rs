use crate::models::chat_history::ChatHistory;

/// Transcript of a thread from its first entry up to a selected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadContext {
    pub text: String,
    pub message_count: usize,
}

/// Returns `None` when `selected_id` is not part of `entries`.
pub fn build_thread_context(entries: &[ChatHistory], selected_id: i64) -> Option<ThreadContext> {
    let mut text = String::new();
    let mut message_count = 0usize;

    for entry in entries {
        text.push_str("USER: ");
        text.push_str(&entry.prompt);
        text.push_str("\n\nASSISTANT: ");
        text.push_str(&entry.response);
        text.push_str("\n\n");
        message_count += 1;

        if entry.id == selected_id {
            return Some(ThreadContext { text, message_count });
        }
    }
    None
}

/// Position of `selected_id` in the thread, -1 when absent.
pub fn current_index(entries: &[ChatHistory], selected_id: i64) -> i64 {
    entries
        .iter()
        .position(|e| e.id == selected_id)
        .map(|i| i as i64)
        .unwrap_or(-1)
}

#[cfg(test)]
pub(crate) fn entry(id: i64, prompt: &str, response: &str) -> ChatHistory {
    ChatHistory {
        id,
        prompt: prompt.to_string(),
        model: "openai/gpt-4".to_string(),
        response: response.to_string(),
        title: Some("Thread".to_string()),
        file_metadata: None,
        conversation_id: Some(1),
        created_at: format!("2024-05-01T10:00:0{}.000000Z", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_selected_entry() {
        let entries = vec![entry(1, "hi", "hello"), entry(2, "how?", "fine"), entry(3, "bye", "ciao")];
        let context = build_thread_context(&entries, 2).unwrap();
        assert_eq!(context.message_count, 2);
        assert_eq!(
            context.text,
            "USER: hi\n\nASSISTANT: hello\n\nUSER: how?\n\nASSISTANT: fine\n\n"
        );
    }

    #[test]
    fn missing_selection_yields_none() {
        let entries = vec![entry(1, "hi", "hello")];
        assert!(build_thread_context(&entries, 9).is_none());
        assert!(build_thread_context(&[], 1).is_none());
    }

    #[test]
    fn reports_current_index() {
        let entries = vec![entry(4, "a", "b"), entry(7, "c", "d")];
        assert_eq!(current_index(&entries, 7), 1);
        assert_eq!(current_index(&entries, 5), -1);
    }
}
