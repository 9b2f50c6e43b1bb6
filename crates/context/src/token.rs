//! Token estimates for formatted context.
//!
//! Sections are sized with a bytes-over-four heuristic rather than a real
//! tokenizer. It tracks BPE counts on English text closely enough to compare
//! a compact section against its JSON form.

/// Approximate token count of `text`: UTF-8 bytes divided by four, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toonctx_codec::{EncodeOptions, encode, to_json};

    #[test]
    fn empty_text_costs_nothing() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn partial_tokens_round_up() {
        assert_eq!(estimate_tokens("## Facts"), 2);
        assert_eq!(estimate_tokens("## Facts\n"), 3);
    }

    #[test]
    fn multibyte_text_counts_bytes() {
        // Each of these characters is three bytes.
        assert_eq!(estimate_tokens("会話履歴"), 3);
    }

    #[test]
    fn compact_table_is_cheaper_than_json() {
        let rows: Vec<_> = (0..20)
            .map(|i| json!({"from": format!("user{i}"), "text": "see you at the station", "time": "12:00:00"}))
            .collect();
        let value = json!(rows);

        let compact = estimate_tokens(&encode(&value, &EncodeOptions::tab()).unwrap());
        let minified = estimate_tokens(&value.to_string());
        assert!(compact < minified);
        assert!(minified < estimate_tokens(&to_json(&value)));
    }

    #[test]
    fn section_estimate_matches_length() {
        let section = format!("## Conversation\n{}", "Alice\thi there\t\"12:00:00\"\n".repeat(100));
        assert_eq!(estimate_tokens(&section), section.len().div_ceil(4));
        assert_eq!(section.len(), 16 + 26 * 100);
        assert_eq!(estimate_tokens(&section), 654);
    }
}
