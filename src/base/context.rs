//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `ProfileError` variants.

use crate::base::profileerror::ProfileError;
use std::io;
use std::path::Path;

/// Extension trait for adding storage context to IO Results.
pub trait IoResultExt<T> {
    /// Add read context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use cookieprofiles::base::context::IoResultExt;
    ///
    /// let text = tokio::fs::read_to_string(&path).await
    ///     .read_context(&path)?;
    /// // Error: "Failed to read profile storage at /tmp/profiles.json: ..."
    /// ```
    fn read_context(self, path: &Path) -> Result<T, ProfileError>;

    /// Add write context to an IO error.
    fn write_context(self, path: &Path) -> Result<T, ProfileError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn read_context(self, path: &Path) -> Result<T, ProfileError> {
        self.map_err(|e| ProfileError::storage_read(path.display().to_string(), e))
    }

    fn write_context(self, path: &Path) -> Result<T, ProfileError> {
        self.map_err(|e| ProfileError::storage_write(path.display().to_string(), e))
    }
}
