pub mod ask;
pub mod extract;
pub mod key;
pub mod quiz;

use anyhow::{Context, Result};

use crate::error::Error;
use crate::extract::get_extracted_text;
use crate::llm::{
    API_KEY_ENV, ClientConfig, CompletionClient, CredentialStore, TerminalPrompter, ensure_client,
};
use crate::store::LocalStore;

pub fn credential_store(store: &LocalStore) -> CredentialStore<TerminalPrompter> {
    CredentialStore::new(store.clone(), TerminalPrompter).with_env_override(API_KEY_ENV)
}

/// Resolves the API key, prompting on first use, and builds a client for
/// one command invocation.
pub fn ai_client(store: &LocalStore, config: ClientConfig) -> Result<CompletionClient> {
    ensure_client(&credential_store(store), config).map_err(|err| {
        let context = if matches!(err, Error::MissingCredential) {
            "AI features require API key"
        } else {
            "Failed to initialize AI client"
        };
        anyhow::Error::new(err).context(context)
    })
}

pub fn extracted_text(store: &LocalStore) -> Result<String> {
    get_extracted_text(store).context("Nothing to work with yet")
}
