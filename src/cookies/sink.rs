//! Cookie sink abstraction.
//!
//! The switcher never reads cookies back; it only issues removals and writes
//! against a [`CookieSink`]. A browser embedding implements the trait over its
//! cookie API; [`CookieJar`](crate::cookies::jar::CookieJar) is the in-memory
//! implementation.

use crate::base::profileerror::ProfileError;
use crate::cookies::definition::CookieSetRequest;
use std::{future::Future, pin::Pin, sync::Arc};
use url::Url;

/// Alias for the `Future` returned by a cookie sink operation.
pub type Pending<'a> = Pin<Box<dyn Future<Output = Result<(), ProfileError>> + Send + 'a>>;

/// Write-only access to a cookie jar.
///
/// # Contract
///
/// - `remove` is idempotent: removing an absent cookie resolves to `Ok(())`.
/// - `set` receives a definition without `hostOnly`/`session` attributes.
/// - Completions may arrive in any order; callers do not rely on it.
pub trait CookieSink: Send + Sync {
    /// Remove the cookie `name` that would be sent to `url`.
    fn remove(&self, url: Url, name: String) -> Pending<'_>;

    /// Install a cookie.
    fn set(&self, request: CookieSetRequest) -> Pending<'_>;
}

/// Blanket implementation for Arc-wrapped sinks.
impl<S: CookieSink + ?Sized> CookieSink for Arc<S> {
    fn remove(&self, url: Url, name: String) -> Pending<'_> {
        (**self).remove(url, name)
    }

    fn set(&self, request: CookieSetRequest) -> Pending<'_> {
        (**self).set(request)
    }
}
