use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("malformed artifact {path:?}: {reason}")]
    MalformedArtifact { path: PathBuf, reason: String },
    #[error("other: {0}")]
    Other(String),
}

impl FeatureError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
