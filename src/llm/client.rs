use std::env;
use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::message::{ChatMessage, CompletionRequest, CompletionResponse};
use super::secrets::{CredentialPrompter, CredentialStore};

pub const DEFAULT_BASE_URL: &str = "https://api.llama.com/compat/v1/";
pub const DEFAULT_MODEL: &str = "Llama-4-Maverick-17B-128E-Instruct-FP8";
pub const MAX_TOKENS: u32 = 1000;
pub const TEMPERATURE: f64 = 0.7;

pub const API_BASE_ENV: &str = "PAGEQUIZ_API_BASE";
pub const MODEL_ENV: &str = "PAGEQUIZ_MODEL";
pub const TIMEOUT_ENV: &str = "PAGEQUIZ_TIMEOUT_SECS";

const COMPLETIONS_PATH: &str = "chat/completions";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// `None` waits on the endpoint indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = env::var(API_BASE_ENV)
            && !base_url.trim().is_empty()
        {
            config.base_url = base_url.trim().to_string();
        }
        if let Ok(model) = env::var(MODEL_ENV)
            && !model.trim().is_empty()
        {
            config.model = model.trim().to_string();
        }
        if let Ok(raw) = env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Some(Duration::from_secs(secs)),
                _ => warn!(value = %raw, "ignoring invalid {}", TIMEOUT_ENV),
            }
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn completions_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), COMPLETIONS_PATH)
    }
}

/// Chat-completion client bound to one API key. Cheap to clone.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_key: String,
    config: ClientConfig,
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("api_key", &"[REDACTED]")
            .field("config", &self.config)
            .finish()
    }
}

impl CompletionClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, ClientConfig::default())
    }

    pub fn with_config(api_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// One POST to the completions endpoint; returns the first choice's
    /// content. Failures are returned as-is, nothing is retried.
    pub async fn call_api(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "completion request failed");
            return Err(Error::UpstreamHttp {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|err| Error::UpstreamProtocol(format!("invalid JSON body: {err}")))?;

        let content = parsed.into_first_content().ok_or_else(|| {
            Error::UpstreamProtocol("missing choices[0].message.content".to_string())
        })?;
        debug!(chars = content.chars().count(), "received completion");
        Ok(content)
    }
}

/// Builds a client from the configured key, prompting for one if needed.
pub fn ensure_client<P: CredentialPrompter>(
    credentials: &CredentialStore<P>,
    config: ClientConfig,
) -> Result<CompletionClient> {
    let api_key = credentials.get_or_prompt()?;
    CompletionClient::with_config(api_key, config)
}
