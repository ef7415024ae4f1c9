use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ProfileError {
    // Storage Errors
    #[error("Failed to read profile storage at {location}: {source}")]
    StorageRead {
        location: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Failed to write profile storage at {location}: {source}")]
    StorageWrite {
        location: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Profile storage is not valid JSON: {message}")]
    Serialization { message: String },
    #[error("Profile storage unavailable: {message}")]
    StorageUnavailable { message: String },

    // Cookie Sink Errors
    #[error("Cannot build a cookie URL from {input:?}")]
    InvalidCookieUrl { input: String },
    #[error("Failed to remove cookie {name:?} at {url}: {message}")]
    CookieRemoveFailed {
        url: String,
        name: String,
        message: String,
    },
    #[error("Failed to set cookie {name:?} at {url}: {message}")]
    CookieSetFailed {
        url: String,
        name: String,
        message: String,
    },

    // Profile CRUD Errors
    #[error("Profile {name:?} already exists for {domain}")]
    ProfileExists { domain: String, name: String },
    #[error("Profile {name:?} does not exist for {domain}")]
    ProfileNotFound { domain: String, name: String },
    #[error("Malformed Netscape cookie line {line}")]
    InvalidNetscapeLine { line: usize },
}

impl ProfileError {
    pub fn as_i32(&self) -> i32 {
        match self {
            ProfileError::StorageRead { .. } => -100,
            ProfileError::StorageWrite { .. } => -101,
            ProfileError::Serialization { .. } => -102,
            ProfileError::StorageUnavailable { .. } => -103,

            ProfileError::InvalidCookieUrl { .. } => -200,
            ProfileError::CookieRemoveFailed { .. } => -201,
            ProfileError::CookieSetFailed { .. } => -202,

            ProfileError::ProfileExists { .. } => -300,
            ProfileError::ProfileNotFound { .. } => -301,
            ProfileError::InvalidNetscapeLine { .. } => -302,
        }
    }

    /// True for failures of the profile storage itself, the only errors that
    /// abort a switch.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            ProfileError::StorageRead { .. }
                | ProfileError::StorageWrite { .. }
                | ProfileError::Serialization { .. }
                | ProfileError::StorageUnavailable { .. }
        )
    }

    pub fn storage_read(location: impl Into<String>, source: io::Error) -> Self {
        ProfileError::StorageRead {
            location: location.into(),
            source: Arc::new(source),
        }
    }

    pub fn storage_write(location: impl Into<String>, source: io::Error) -> Self {
        ProfileError::StorageWrite {
            location: location.into(),
            source: Arc::new(source),
        }
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        ProfileError::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn invalid_cookie_url(input: impl Into<String>) -> Self {
        ProfileError::InvalidCookieUrl {
            input: input.into(),
        }
    }

    pub fn cookie_remove_failed(
        url: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ProfileError::CookieRemoveFailed {
            url: url.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn cookie_set_failed(
        url: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ProfileError::CookieSetFailed {
            url: url.into(),
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        ProfileError::Serialization {
            message: err.to_string(),
        }
    }
}
