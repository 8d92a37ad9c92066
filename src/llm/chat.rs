use crate::error::Result;
use crate::utils::truncate_chars;

use super::client::CompletionClient;
use super::message::ChatMessage;

pub const CHAT_CONTEXT_LIMIT: usize = 2000;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that can answer questions about web content.";

pub fn chat_messages(user_message: &str, context: &str) -> Vec<ChatMessage> {
    let system = if context.is_empty() {
        SYSTEM_PROMPT.to_string()
    } else {
        format!(
            "{SYSTEM_PROMPT} Here's some context from the webpage: {}",
            truncate_chars(context, CHAT_CONTEXT_LIMIT)
        )
    };

    vec![ChatMessage::system(system), ChatMessage::user(user_message)]
}

/// Single-turn answer; pass `""` as `context` to ask without page text.
pub async fn chat(client: &CompletionClient, user_message: &str, context: &str) -> Result<String> {
    client.call_api(&chat_messages(user_message, context)).await
}
