use std::path::PathBuf;

use thiserror::Error;

use crate::llm::secrets::API_KEY_ENV;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "API key is required for AI features. Set {} or run `pagequiz key --set <KEY>`.",
        API_KEY_ENV
    )]
    MissingCredential,

    #[error("Cannot store an empty API key")]
    EmptyCredential,

    #[error("API request failed: {status}")]
    UpstreamHttp { status: u16 },

    #[error("Unexpected response from the completion endpoint: {0}")]
    UpstreamProtocol(String),

    #[error("Failed to reach the completion endpoint")]
    Transport(#[from] reqwest::Error),

    #[error("No extracted text found. Run `pagequiz extract <SOURCE>` first!")]
    NoExtractedText,

    #[error("Failed to fetch {url}: HTTP {status}")]
    PageFetch { url: String, status: u16 },

    #[error("Failed to reach {url}")]
    PageUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to access local store at {}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse local store at {}", path.display())]
    StoreFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not determine project directory")]
    DataDir,

    #[error("Terminal prompt failed")]
    Prompt(#[from] dialoguer::Error),
}

impl Error {
    /// Whether the operator can fix this by running `pagequiz extract` or
    /// `pagequiz key` instead of retrying.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Error::MissingCredential | Error::EmptyCredential | Error::NoExtractedText
        )
    }
}
