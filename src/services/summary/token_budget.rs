use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z'-]*").expect("word regex"));

/// Heuristic token count: the larger of bytes/4 and 0.75 per word, at least 1.
pub fn estimate_token_count(text: &str) -> i64 {
    let char_based = (text.len() / 4) as i64;
    let word_based = (count_words(text) as f64 * 0.75).floor() as i64;
    char_based.max(word_based).max(1)
}

fn count_words(text: &str) -> usize {
    let stripped = TAG.replace_all(text, "");
    WORD.find_iter(&stripped).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_returns_zero() {
        assert_eq!(estimate_token_count(""), 1);
        assert_eq!(estimate_token_count("hi"), 1);
    }

    #[test]
    fn uses_byte_length_for_dense_text() {
        assert_eq!(estimate_token_count(&"x".repeat(400)), 100);
    }

    #[test]
    fn word_estimate_wins_for_short_words() {
        // 12 words, 23 bytes.
        let text = "a b c d e f g h i j k l";
        assert_eq!(estimate_token_count(text), 9);
    }

    #[test]
    fn ignores_markup_when_counting_words() {
        assert_eq!(count_words("<p>don't stop-gap</p> <br/>"), 2);
        assert_eq!(count_words("123 456 -- ''"), 0);
    }
}
