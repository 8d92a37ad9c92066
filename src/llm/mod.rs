pub mod chat;
pub mod client;
pub mod key_points;
pub mod message;
pub mod quiz;
pub mod secrets;
pub mod summary;

pub use chat::chat;
pub use client::{ClientConfig, CompletionClient, ensure_client};
pub use key_points::extract_key_points;
pub use message::{ChatMessage, Role};
pub use quiz::{QuizItem, QuizOutcome, generate_quiz};
pub use secrets::{API_KEY_ENV, CredentialPrompter, CredentialStore, TerminalPrompter};
pub use summary::summarize;
