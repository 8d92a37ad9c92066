use crate::error::Result;
use crate::utils::truncate_chars;

use super::client::CompletionClient;
use super::message::ChatMessage;

pub const SUMMARY_TEXT_LIMIT: usize = 4000;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that creates concise summaries of text content.";

pub fn summary_messages(text: &str) -> Vec<ChatMessage> {
    let excerpt = truncate_chars(text, SUMMARY_TEXT_LIMIT);
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Please provide a concise summary of this text:\n\n{excerpt}"
        )),
    ]
}

pub async fn summarize(client: &CompletionClient, text: &str) -> Result<String> {
    client.call_api(&summary_messages(text)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::message::Role;

    #[test]
    fn summary_prompt_keeps_first_4000_chars() {
        let text = format!("{}{}", "s".repeat(SUMMARY_TEXT_LIMIT), "TAIL");
        let messages = summary_messages(&text);

        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.ends_with(&"s".repeat(SUMMARY_TEXT_LIMIT)));
        assert!(!messages[1].content.contains("TAIL"));
    }

    #[test]
    fn short_text_is_sent_whole() {
        let messages = summary_messages("tiny page");
        assert_eq!(
            messages[1].content,
            "Please provide a concise summary of this text:\n\ntiny page"
        );
    }
}
