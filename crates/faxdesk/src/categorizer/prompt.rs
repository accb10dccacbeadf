use crate::fax::FaxCategory;

/// Maximum characters of document text sent for categorization.
pub const CATEGORIZE_SNIPPET_CHARS: usize = 4000;
/// Maximum characters of document text sent for summarization.
pub const SUMMARY_SNIPPET_CHARS: usize = 3000;

/// Returns at most the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the categorization prompt listing every category.
pub fn categorize_prompt(text: &str) -> String {
    let categories: String = FaxCategory::ALL
        .iter()
        .map(|c| format!("- {}: {}\n", c.as_str(), c.description()))
        .collect();

    format!(
        "You are a medical office fax categorization assistant. Analyze the following fax \
         document and categorize it into ONE of these categories:\n\n\
         {categories}\n\
         Also assess your confidence level (0.0 to 1.0) in this categorization.\n\n\
         Return STRICT JSON with exactly these keys:\n\
         {{\"category\": \"one_of_the_categories\", \"confidence\": 0.85, \"reason\": \"Brief explanation\"}}\n\n\
         Fax Document:\n{snippet}\n",
        categories = categories,
        snippet = truncate_chars(text, CATEGORIZE_SNIPPET_CHARS),
    )
}

pub fn summary_prompt(text: &str) -> String {
    format!(
        "Summarize this fax document in 2-3 sentences. Focus on:\n\
         - Who sent it / who it's about\n\
         - Main purpose or request\n\
         - Any urgent items or deadlines\n\n\
         Fax content:\n{}\n\nSummary:",
        truncate_chars(text, SUMMARY_SNIPPET_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_categorize_prompt_lists_all_categories() {
        let prompt = categorize_prompt("Referral for cardiology consult");
        for category in FaxCategory::ALL {
            assert!(prompt.contains(&format!("- {}:", category.as_str())));
        }
        assert!(prompt.contains("STRICT JSON"));
        assert!(prompt.contains("Referral for cardiology consult"));
    }

    #[test]
    fn test_categorize_prompt_truncates_document() {
        let long = "x".repeat(5000) + "TAIL";
        let prompt = categorize_prompt(&long);
        assert!(!prompt.contains("TAIL"));
        assert!(prompt.contains(&"x".repeat(4000)));
    }

    #[test]
    fn test_summary_prompt_truncates_document() {
        let long = "y".repeat(3500) + "TAIL";
        assert!(!summary_prompt(&long).contains("TAIL"));
    }
}
