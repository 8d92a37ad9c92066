use crate::error::Result;
use crate::utils::truncate_chars;

use super::client::CompletionClient;
use super::message::ChatMessage;

pub const KEY_POINTS_TEXT_LIMIT: usize = 4000;

const SYSTEM_PROMPT: &str = r#"
You are a helpful assistant that extracts key points from text.
Return them as a bulleted list.
"#;

pub fn key_points_messages(text: &str) -> Vec<ChatMessage> {
    let excerpt = truncate_chars(text, KEY_POINTS_TEXT_LIMIT);
    vec![
        ChatMessage::system(SYSTEM_PROMPT.trim()),
        ChatMessage::user(format!(
            "Extract the key points from this text:\n\n{excerpt}"
        )),
    ]
}

/// Bullet formatting is left to the model and not checked.
pub async fn extract_key_points(client: &CompletionClient, text: &str) -> Result<String> {
    client.call_api(&key_points_messages(text)).await
}
