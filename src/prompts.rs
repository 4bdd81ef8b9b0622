//! Prompts for chunk summarisation.
//!
//! Callers can override the system prompt via
//! [`crate::config::SummarizerConfig::system_prompt`]; the constant here is
//! used only when no override is provided. The user message is always built
//! by [`summary_user_prompt`] so the chunk text is embedded the same way for
//! every backend.

/// Default system prompt sent with every chunk.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates well-structured, detailed summaries. \
Format your summaries using Markdown with a clear hierarchy: # for the main title, ## for sections, \
### for subsections and - for bullet points. Use nested lists with proper indentation for sub-items. \
Use **bold** for key terms and `backticks` for code or keyboard shortcuts. \
Put a horizontal rule (---) between major sections. \
Ensure all information is organised in a clear, hierarchical structure.";

/// Build the user message for one chunk.
pub fn summary_user_prompt(chunk: &str) -> String {
    format!(
        "Please provide a comprehensive summary of the following document. \
Structure it with proper Markdown formatting:\n\
1. Use # for the main title\n\
2. Use ## for major sections\n\
3. Use ### for subsections\n\
4. Use - for bullet points\n\
5. Use nested lists with proper indentation for sub-items\n\
6. Use ** for bold text\n\
7. Use ` for code/keyboard shortcuts\n\
8. Use --- between major sections\n\
9. Ensure proper spacing and hierarchy\n\
\n\
Document to summarize:\n\n{chunk}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_embeds_chunk_at_end() {
        let p = summary_user_prompt("THE CHUNK");
        assert!(p.ends_with("Document to summarize:\n\nTHE CHUNK"));
    }

    #[test]
    fn system_prompt_asks_for_structure() {
        for needle in ["#", "- for bullet", "**bold**", "---"] {
            assert!(SUMMARY_SYSTEM_PROMPT.contains(needle), "missing {needle}");
        }
    }
}
