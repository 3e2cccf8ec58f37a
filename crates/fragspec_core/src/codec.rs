//! Mapping between API paths and file-name-safe identifiers.

use crate::error::{FragError, FragResult};

/// Encodes `/users/{id}` as `users@{id}` and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCodec {
    separator: char,
}

impl Default for PathCodec {
    fn default() -> Self {
        Self { separator: '@' }
    }
}

impl PathCodec {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Turn an API path into a file name stem.
    ///
    /// Paths must start with `/` and must not contain the separator, otherwise
    /// the mapping would stop being reversible. The root path `/` would encode
    /// to an empty file name and is rejected as well.
    pub fn encode(&self, path: &str) -> FragResult<String> {
        if path.contains(self.separator) || path == "/" {
            return Err(FragError::UnrepresentablePath {
                path: path.to_string(),
                separator: self.separator,
            });
        }
        let stripped = path
            .strip_prefix('/')
            .ok_or_else(|| FragError::InvalidKey(path.to_string()))?;

        Ok(stripped.replace('/', &self.separator.to_string()))
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(&self, identifier: &str) -> String {
        let mut path = String::with_capacity(identifier.len() + 1);
        path.push('/');
        path.extend(
            identifier
                .chars()
                .map(|c| if c == self.separator { '/' } else { c }),
        );
        path
    }
}
