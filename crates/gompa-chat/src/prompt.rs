//! Persona prompt and message assembly.

use crate::types::{ChatMessage, SearchResult};

pub const SYSTEM_PROMPT: &str = "You are an expert travel guide assistant \
specialized in Sikkim monasteries and Buddhist culture.
You provide accurate, helpful, and engaging information about:
- Sikkim monasteries (Rumtek, Enchey, Pemayangtse, etc.)
- Buddhist heritage and culture
- Travel tips and logistics for visiting Sikkim
- Local attractions and accommodations
- Best times to visit and weather information

Always provide accurate information. If you're unsure about something, \
suggest the user contact local tourism boards or visit the monastery's official website.
Be friendly, engaging, and helpful. Keep responses concise but informative.";

pub const RETRIEVAL_INSTRUCTION: &str = "When web search results are included, \
prefer the retrieved snippets for factual answers and cite the source URLs when appropriate. \
If the retrieved content contradicts the model's knowledge, prefer the retrieved content.";

/// Render search results as a numbered block, one blank line between entries.
pub fn format_search_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n{}\n{}", i + 1, r.title, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the message array for a completion call.
///
/// With context: the system prompt gains the retrieval instruction and a
/// user message carrying the search results precedes the real question.
pub fn build_messages(user_message: &str, context: Option<&[SearchResult]>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(3);

    match context {
        Some(results) => {
            messages.push(ChatMessage::system(format!(
                "{}\n\n{}",
                SYSTEM_PROMPT, RETRIEVAL_INSTRUCTION
            )));
            messages.push(ChatMessage::user(format!(
                "Search results:\n{}",
                format_search_results(results)
            )));
        }
        None => messages.push(ChatMessage::system(SYSTEM_PROMPT)),
    }

    messages.push(ChatMessage::user(user_message));
    messages
}
