//! Error taxonomy shared by the collaborators.
//!
//! The pipeline never propagates these past a collaborator boundary: each
//! variant is turned into a degraded result (empty list, original title,
//! empty synthesis) and logged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BriefError {
    /// Network or service failure while talking to a provider, translator or LLM.
    #[error("transport error: {0}")]
    Transport(String),

    /// A collaborator answered, but the answer could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Missing credentials, identifiers or an invalid rule table.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for BriefError {
    fn from(e: reqwest::Error) -> Self {
        BriefError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BriefError>;
