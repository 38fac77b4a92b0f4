pub fn summary_system_prompt(title: &str, message_count: usize) -> String {
    format!(
        "You are an expert AI summarization assistant. Create a CONCISE summary that captures the essential information needed to continue this conversation.

The conversation title is: \"{title}\".

This conversation contains {message_count} messages.

Focus on:
- Key topics and decisions made
- Important technical details, names, and specifications
- Current state of the discussion
- Any unresolved questions

Be concise but complete. Aim for 150-250 words maximum.
Use clear, structured paragraphs."
    )
}

pub fn summary_user_message(thread_text: &str) -> String {
    format!("Summarize this conversation:\n\n{}", thread_text)
}

pub fn resume_with_thread(thread_text: &str) -> String {
    format!(
        "--- Previous conversation ---\n\n{}--- End of previous conversation ---\n\nContinue this conversation based on the above context:",
        thread_text
    )
}

pub fn resume_with_summary(summary_text: &str, title: &str) -> String {
    if summary_text.trim().is_empty() {
        return format!(
            "--- The summary was empty, please provide context ---\n\nThis conversation was about: {}\n\nPlease enter your question to continue:",
            title
        );
    }
    format!(
        "--- Summary of previous conversation ---\n\n{}\n\n--- End of summary ---\n\nContinue this conversation based on the above summary:",
        summary_text
    )
}
