use crate::models::SearchHit;

/// Stands in for the context block when retrieval found nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No matching company or dashboard data found.";

pub fn build_context(hits: &[SearchHit]) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if context.is_empty() {
        NO_CONTEXT_PLACEHOLDER.to_string()
    } else {
        context
    }
}

pub fn render_prompt(context: &str, query: &str) -> String {
    format!(
        r#"You are SAI, a corporate assistant who chats like a real person: friendly, confident and professional, never robotic.

How to reply:
- Greetings or small talk: answer warmly in one or two lines.
- Questions about the company, its documents or dashboard figures: use the context below. Give a one-line summary, then the key points as short bullets, and quote numbers naturally.
- Off-topic or personal questions: decline politely and offer something related to the company data instead.

Formatting rules:
- At most 5 short lines.
- Put a line break between ideas and use bullets or dashes for lists.
- Never repeat the user's message word for word.

Relevant context:
{context}

User message:
"{query}"

Reply as SAI now. Keep it human, helpful and concise."#
    )
}
