use std::env;

use dialoguer::{Password, theme::ColorfulTheme};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::palette::Palette;
use crate::store::{API_KEY_KEY, LocalStore};
use crate::utils::{strip_controls_and_escapes, trim_line};

pub const API_KEY_ENV: &str = "PAGEQUIZ_LLAMA_API_KEY";

const PROMPT_MESSAGE: &str = "Please enter your Llama API key (it will be stored locally):";
const MASK: &str = "***";
const MASK_PREFIX_CHARS: usize = 10;
const MASK_SUFFIX_CHARS: usize = 5;

/// Asks the operator for a credential. `Ok(None)` means they declined.
pub trait CredentialPrompter {
    fn ask(&self, message: &str) -> Result<Option<String>>;
}

/// Hidden-input prompt on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl CredentialPrompter for TerminalPrompter {
    fn ask(&self, message: &str) -> Result<Option<String>> {
        // stdout may carry `--json` output
        eprintln!("{}", prompt_banner(message));
        let raw_password = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("API Key")
            .allow_empty_password(true)
            .interact()?;

        let password = strip_controls_and_escapes(&raw_password);
        Ok(trim_line(&password).map(str::to_string))
    }
}

fn prompt_banner(message: &str) -> String {
    format!(
        "\n{}\n{}",
        Palette::paint(Palette::SUCCESS, message),
        Palette::dim("AI features are optional, leave the field blank to skip.")
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    LocalStore,
}

impl CredentialSource {
    pub fn description(&self) -> &'static str {
        match self {
            CredentialSource::Environment => "environment variable",
            CredentialSource::LocalStore => "local store",
        }
    }
}

#[derive(Debug)]
pub struct CredentialLookup {
    pub api_key: String,
    pub source: CredentialSource,
}

/// Owns the single API key kept under `llamaApiKey`.
#[derive(Debug, Clone)]
pub struct CredentialStore<P> {
    store: LocalStore,
    prompter: P,
    env_override: Option<&'static str>,
}

impl<P: CredentialPrompter> CredentialStore<P> {
    pub fn new(store: LocalStore, prompter: P) -> Self {
        Self {
            store,
            prompter,
            env_override: None,
        }
    }

    /// A non-blank value in `var` wins over the stored key.
    pub fn with_env_override(mut self, var: &'static str) -> Self {
        self.env_override = Some(var);
        self
    }

    pub fn lookup(&self) -> Result<Option<CredentialLookup>> {
        if let Some(var) = self.env_override
            && let Ok(value) = env::var(var)
            && let Some(api_key) = trim_line(&value)
        {
            return Ok(Some(CredentialLookup {
                api_key: api_key.to_string(),
                source: CredentialSource::Environment,
            }));
        }

        let stored: Option<String> = self.store.get(API_KEY_KEY)?;
        Ok(stored
            .as_deref()
            .and_then(trim_line)
            .map(|api_key| CredentialLookup {
                api_key: api_key.to_string(),
                source: CredentialSource::LocalStore,
            }))
    }

    pub fn get_or_prompt(&self) -> Result<String> {
        if let Some(lookup) = self.lookup()? {
            debug!(source = lookup.source.description(), "using configured API key");
            return Ok(lookup.api_key);
        }

        let answer = self.prompter.ask(PROMPT_MESSAGE)?;
        let Some(api_key) = answer.as_deref().and_then(trim_line) else {
            return Err(Error::MissingCredential);
        };

        self.set(api_key)?;
        info!("stored new API key");
        Ok(api_key.to_string())
    }

    pub fn set(&self, value: &str) -> Result<()> {
        let trimmed = trim_line(value).ok_or(Error::EmptyCredential)?;
        self.store.set(API_KEY_KEY, trimmed)
    }

    /// Returns whether a stored key was removed.
    pub fn clear(&self) -> Result<bool> {
        let removed = self.store.remove(API_KEY_KEY)?;
        if removed {
            info!("cleared stored API key");
        }
        Ok(removed)
    }

    /// The configured key, masked, with where it came from.
    pub fn view(&self) -> Result<Option<(String, CredentialSource)>> {
        Ok(self
            .lookup()?
            .map(|lookup| (mask_credential(&lookup.api_key), lookup.source)))
    }
}

/// First 10 and last 5 chars around a fixed mask. Keys too short to keep
/// both ends hidden are masked completely.
pub fn mask_credential(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= MASK_PREFIX_CHARS + MASK_SUFFIX_CHARS {
        return MASK.to_string();
    }

    let prefix: String = chars[..MASK_PREFIX_CHARS].iter().collect();
    let suffix: String = chars[chars.len() - MASK_SUFFIX_CHARS..].iter().collect();
    format!("{prefix}{MASK}{suffix}")
}
