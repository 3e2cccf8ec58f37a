//! Error types for fragment tree operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fragspec operations.
pub type FragResult<T> = Result<T, FragError>;

/// Errors that can occur while bundling or syncing a fragment tree.
///
/// Every variant is fatal: a malformed tree is a configuration mistake on the
/// operator's side, and a local filesystem failure will not go away by retrying.
#[derive(Error, Debug)]
pub enum FragError {
    #[error("Duplicate fragment key \"{key}\": {first:?} and {second:?}")]
    DuplicateKey {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("All {section} should be defined inside {dir:?}, found inline {section} in the root document as well")]
    InlineCollision { section: String, dir: PathBuf },

    #[error("Code sample for non-existing operation: \"{path}\", {verb} ({file:?})")]
    MissingOperation {
        path: String,
        verb: String,
        file: PathBuf,
    },

    #[error("Reference cycle detected at {0}")]
    ReferenceCycle(String),

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Path \"{path}\" can not be encoded as a file name with separator '{separator}'")]
    UnrepresentablePath { path: String, separator: char },

    #[error("Invalid fragment key: \"{0}\"")]
    InvalidKey(String),

    #[error("Invalid glob pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Can not parse document both in JSON ({json}) and YAML ({yaml})")]
    Parse { json: String, yaml: String },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl FragError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error stems from a malformed tree or configuration rather
    /// than from the environment.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKey { .. }
                | Self::InlineCollision { .. }
                | Self::MissingOperation { .. }
                | Self::ReferenceCycle(_)
                | Self::UnresolvedReference(_)
                | Self::UnrepresentablePath { .. }
                | Self::InvalidKey(_)
                | Self::InvalidPattern { .. }
                | Self::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(FragError::ReferenceCycle("#/headers/A".into()).is_configuration());
        assert!(FragError::InvalidKey("a/b".into()).is_configuration());

        let io = FragError::io("spec/paths", std::io::Error::other("disk full"));
        assert!(!io.is_configuration());
        assert!(io.to_string().contains("spec/paths"));
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = FragError::MissingOperation {
            path: "/users".into(),
            verb: "post".into(),
            file: PathBuf::from("code_samples/curl/users/post.sh"),
        };
        let message = err.to_string();
        assert!(message.contains("/users"));
        assert!(message.contains("post"));
    }
}
