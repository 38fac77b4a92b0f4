use tracing::{error, info};

/// Cuts `value` to at most `max_len` bytes on a char boundary.
pub fn truncate_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }

    let mut end = max_len;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = value[..end].to_string();
    out.push_str("...[truncated]");
    out
}

pub fn log_relay_request(model: &str, has_file: bool, file_type: &str, message_count: usize) {
    info!(
        "[RELAY] request: model={}, hasFile={}, fileType={}, messages={}",
        model, has_file, file_type, message_count
    );
}

pub fn log_relay_response(status: u16, body: &str) {
    info!(
        "[RELAY] response: status={}, preview={}",
        status,
        truncate_log(body, 500)
    );
}

pub fn log_relay_error(model: &str, err: &str) {
    error!("[RELAY] error: model={}, error={}", model, err);
}

#[cfg(test)]
mod tests {
    use super::truncate_log;

    #[test]
    fn truncate_log_adds_suffix_when_exceeding_limit() {
        let value = truncate_log("abcdefgh", 4);
        assert_eq!(value, "abcd...[truncated]");
        assert_eq!(truncate_log("abc", 4), "abc");
    }

    #[test]
    fn truncate_log_respects_char_boundaries() {
        assert_eq!(truncate_log("héllo", 2), "h...[truncated]");
    }
}
