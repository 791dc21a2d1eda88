//! Request assembly: truncate both texts and fill in the prompt template.
//!
//! Pure string formatting. The budget is counted in characters (Unicode
//! scalar values), never bytes, so a cut never lands inside a multi-byte
//! character such as `€` or `ë`.

use crate::config::ComparisonConfig;
use crate::prompts;
use serde::{Deserialize, Serialize};

/// Everything the generation service needs for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
}

/// Characters kept and dropped for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Truncation {
    pub kept_chars: usize,
    pub dropped_chars: usize,
}

/// The first `budget` characters of `text`, unaltered.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn truncation(text: &str, budget: usize) -> Truncation {
    let total = text.chars().count();
    let kept = total.min(budget);
    Truncation {
        kept_chars: kept,
        dropped_chars: total - kept,
    }
}

/// Assemble the request for two extracted texts.
///
/// Returns the request plus the truncation applied to the left and right
/// documents, in that order.
pub fn assemble_request(
    left: &str,
    right: &str,
    config: &ComparisonConfig,
) -> (ComparisonRequest, Truncation, Truncation) {
    let budget = config.max_chars;

    let system_prompt = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| prompts::system_prompt(config.mode));

    let user_message = prompts::user_message(
        &config.left_label,
        truncate_chars(left, budget),
        &config.right_label,
        truncate_chars(right, budget),
    );

    let request = ComparisonRequest {
        system_prompt,
        user_message,
        model: config.effective_model().to_string(),
        temperature: config.effective_temperature(),
        max_tokens: config.max_tokens,
    };

    (request, truncation(left, budget), truncation(right, budget))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComparisonMode;

    #[test]
    fn truncate_keeps_exact_prefix() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let s = "€€€ëë";
        assert_eq!(truncate_chars(s, 4), "€€€ë");
        assert_eq!(truncate_chars(s, 4).chars().count(), 4);
    }

    #[test]
    fn request_contains_exactly_the_budget() {
        let config = ComparisonConfig::builder().max_chars(5_000).build().unwrap();
        let left: String = "L".repeat(7_000);
        let right = "short right";
        let (req, lt, rt) = assemble_request(&left, right, &config);

        let expected = format!("\n{}\n", "L".repeat(5_000));
        assert!(req.user_message.contains(&expected));
        assert!(!req.user_message.contains(&"L".repeat(5_001)));
        assert!(req.user_message.contains("short right"));
        assert_eq!(lt, Truncation { kept_chars: 5_000, dropped_chars: 2_000 });
        assert_eq!(rt.dropped_chars, 0);
    }

    #[test]
    fn mode_selects_prompt_and_temperature() {
        let config = ComparisonConfig::builder()
            .mode(ComparisonMode::Summary)
            .model("gpt-4o")
            .build()
            .unwrap();
        let (req, _, _) = assemble_request("a", "b", &config);
        assert_eq!(req.system_prompt, prompts::system_prompt(ComparisonMode::Summary));
        assert_eq!(req.temperature, 0.3);
        assert_eq!(req.model, "gpt-4o");
    }

    #[test]
    fn custom_system_prompt_overrides_mode() {
        let config = ComparisonConfig::builder()
            .system_prompt("Be brief.")
            .build()
            .unwrap();
        let (req, _, _) = assemble_request("a", "b", &config);
        assert_eq!(req.system_prompt, "Be brief.");
    }

    #[test]
    fn labels_appear_in_user_message() {
        let config = ComparisonConfig::builder()
            .labels("Polis A", "Polis B")
            .build()
            .unwrap();
        let (req, _, _) = assemble_request("x", "y", &config);
        assert!(req.user_message.contains("Polis A (volledige tekst"));
        assert!(req.user_message.contains("Polis B (volledige tekst"));
    }
}
