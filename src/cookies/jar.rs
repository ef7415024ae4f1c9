use crate::base::profileerror::ProfileError;
use crate::cookies::definition::{CookieSetRequest, SameSite};
use crate::cookies::sink::{CookieSink, Pending};
use dashmap::DashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// A cookie as held by the jar, with its derived attributes resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub same_site: SameSite,
}

impl JarCookie {
    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        match self.expiration_time {
            Some(expiry) => expiry < current_time,
            None => false,
        }
    }

    /// True if this cookie would be sent to `url`.
    fn matches_url(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        CookieJar::domain_matches(&self.domain, host, self.host_only)
            && CookieJar::path_matches(&self.path, url.path())
            && (!self.secure || url.scheme() == "https")
    }
}

/// In-memory cookie jar implementing [`CookieSink`].
///
/// Cookies are indexed by their domain (host for host-only cookies). Lookups
/// and removals follow RFC 6265 domain and path matching, so removing
/// `sid` at `https://b2b.example.com/` also removes a `.example.com` cookie.
#[derive(Clone)]
pub struct CookieJar {
    // Store: Map<Domain, List<Cookie>>
    store: Arc<DashMap<String, Vec<JarCookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Apply a write request.
    ///
    /// A definition with an explicit domain becomes a domain cookie; one
    /// without becomes host-only on the request URL's host. Writing an
    /// already-expired cookie deletes any cookie it would replace.
    pub fn set_cookie(&self, request: CookieSetRequest) -> Result<(), ProfileError> {
        let (url, definition) = request.into_parts();
        let host = url
            .host_str()
            .ok_or_else(|| ProfileError::cookie_set_failed(url.as_str(), &definition.name, "URL has no host"))?
            .to_lowercase();

        let (domain, host_only) = if definition.host().is_empty() {
            (host.clone(), true)
        } else {
            (definition.host().to_lowercase(), false)
        };

        if !Self::domain_matches(&domain, &host, host_only) {
            return Err(ProfileError::cookie_set_failed(
                url.as_str(),
                &definition.name,
                format!("domain {} does not match host {}", domain, host),
            ));
        }

        if definition.secure && url.scheme() != "https" {
            return Err(ProfileError::cookie_set_failed(
                url.as_str(),
                &definition.name,
                "secure cookie requires an https URL",
            ));
        }

        let now = OffsetDateTime::now_utc();
        let cookie = JarCookie {
            expiration_time: definition.expiration_time(),
            name: definition.name,
            value: definition.value,
            domain,
            path: definition.path,
            creation_time: now,
            secure: definition.secure,
            http_only: definition.http_only,
            host_only,
            same_site: definition.same_site.unwrap_or(SameSite::Unspecified),
        };

        let mut entry = self.store.entry(cookie.domain.clone()).or_default();

        // Remove existing if name/path match
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);

        if cookie.is_expired(now) {
            return Ok(());
        }

        // Enforce per-domain limit with LRU eviction
        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            if let Some(oldest_idx) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.creation_time)
                .map(|(i, _)| i)
            {
                entry.remove(oldest_idx);
            } else {
                break;
            }
        }

        entry.push(cookie);
        Ok(())
    }

    /// Remove every cookie named `name` that would be sent to `url`.
    /// Returns how many were removed.
    pub fn remove_cookie(&self, url: &Url, name: &str) -> usize {
        let host = url.host_str().unwrap_or("").to_lowercase();
        let mut removed = 0;

        for domain in Self::get_matching_domains(&host) {
            if let Some(mut entry) = self.store.get_mut(&domain) {
                let before = entry.len();
                entry.retain(|c| c.name != name || !c.matches_url(url));
                removed += before - entry.len();
            }
        }

        removed
    }

    /// Get cookies matching the URL with proper domain suffix matching.
    pub fn cookies_for_url(&self, url: &Url) -> Vec<JarCookie> {
        let mut result = Vec::new();
        let host = url.host_str().unwrap_or("").to_lowercase();
        let now = OffsetDateTime::now_utc();

        for domain in Self::get_matching_domains(&host) {
            if let Some(entry) = self.store.get(&domain) {
                result.extend(
                    entry
                        .iter()
                        .filter(|c| c.matches_url(url) && !c.is_expired(now))
                        .cloned(),
                );
            }
        }

        // Sort by path length (longest first) then creation time
        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });

        result
    }

    /// The first cookie named `name` that would be sent to `url`.
    pub fn get(&self, url: &Url, name: &str) -> Option<JarCookie> {
        self.cookies_for_url(url).into_iter().find(|c| c.name == name)
    }

    /// Check if cookie domain matches request host.
    /// Implements RFC 6265 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        if host_only {
            return cookie_domain.eq_ignore_ascii_case(request_host);
        }

        let cookie_domain = cookie_domain.trim_start_matches('.');

        if request_host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        // request_host must end with ".cookie_domain"
        if request_host.len() > cookie_domain.len() {
            let split = request_host.len() - cookie_domain.len();
            if let (Some(suffix), Some(before)) =
                (request_host.get(split..), request_host.get(..split))
            {
                return suffix.eq_ignore_ascii_case(cookie_domain) && before.ends_with('.');
            }
        }

        false
    }

    /// Check if request path matches cookie path.
    /// Implements RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if let Some(rest) = request_path.strip_prefix(cookie_path) {
            return cookie_path.ends_with('/') || rest.starts_with('/');
        }

        false
    }

    /// Get all domains to check for a given host.
    /// Returns the host itself and all parent domains.
    fn get_matching_domains(host: &str) -> Vec<String> {
        let mut domains = vec![host.to_string()];

        // "foo.bar.example.com" also checks "bar.example.com" and "example.com"
        let parts: Vec<&str> = host.split('.').collect();
        for i in 1..parts.len().saturating_sub(1) {
            domains.push(parts[i..].join("."));
        }

        domains
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_cookie_count() == 0
    }

    /// Clear all cookies.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Iterate over all cookies.
    pub fn iter_all_cookies(&self) -> impl Iterator<Item = JarCookie> + '_ {
        self.store.iter().flat_map(|entry| entry.value().clone())
    }
}

impl CookieSink for CookieJar {
    fn remove(&self, url: Url, name: String) -> Pending<'_> {
        Box::pin(async move {
            let removed = self.remove_cookie(&url, &name);
            tracing::trace!(url = %url, name = %name, removed, "cookie removal");
            Ok(())
        })
    }

    fn set(&self, request: CookieSetRequest) -> Pending<'_> {
        Box::pin(async move { self.set_cookie(request) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::definition::CookieDefinition;

    fn install(jar: &CookieJar, cookie: CookieDefinition) -> Result<(), ProfileError> {
        jar.set_cookie(CookieSetRequest::from_definition(&cookie)?)
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let jar = CookieJar::new();
        install(&jar, CookieDefinition::new("sid", "abc", "example.com")).unwrap();

        let cookie = jar.get(&url("http://example.com/"), "sid").unwrap();
        assert_eq!(cookie.value, "abc");
        assert!(!cookie.host_only);
    }

    #[test]
    fn test_domain_cookie_visible_on_subdomain() {
        let jar = CookieJar::new();
        install(&jar, CookieDefinition::new("sid", "abc", ".example.com")).unwrap();

        assert!(jar.get(&url("http://b2b.example.com/"), "sid").is_some());
        assert!(jar.get(&url("http://other.com/"), "sid").is_none());
    }

    #[test]
    fn test_set_replaces_same_name_and_path() {
        let jar = CookieJar::new();
        install(&jar, CookieDefinition::new("sid", "old", "example.com")).unwrap();
        install(&jar, CookieDefinition::new("sid", "new", "example.com")).unwrap();

        assert_eq!(jar.total_cookie_count(), 1);
        assert_eq!(jar.get(&url("http://example.com/"), "sid").unwrap().value, "new");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let jar = CookieJar::new();
        install(&jar, CookieDefinition::new("sid", "abc", "example.com")).unwrap();

        assert_eq!(jar.remove_cookie(&url("http://example.com/"), "sid"), 1);
        assert_eq!(jar.remove_cookie(&url("http://example.com/"), "sid"), 0);
        assert!(jar.is_empty());
    }

    #[test]
    fn test_remove_via_subdomain_url() {
        let jar = CookieJar::new();
        install(&jar, CookieDefinition::new("sid", "abc", "example.com")).unwrap();

        assert_eq!(jar.remove_cookie(&url("https://b2b.example.com/"), "sid"), 1);
    }

    #[test]
    fn test_secure_cookie_needs_https_for_removal() {
        let jar = CookieJar::new();
        install(
            &jar,
            CookieDefinition::new("sid", "abc", "example.com").with_secure(true),
        )
        .unwrap();

        assert_eq!(jar.remove_cookie(&url("http://example.com/"), "sid"), 0);
        assert_eq!(jar.remove_cookie(&url("https://example.com/"), "sid"), 1);
    }

    #[test]
    fn test_expired_write_deletes() {
        let jar = CookieJar::new();
        install(&jar, CookieDefinition::new("sid", "abc", "example.com")).unwrap();
        install(
            &jar,
            CookieDefinition::new("sid", "", "example.com").with_expiration(1.0),
        )
        .unwrap();

        assert!(jar.is_empty());
    }

    #[test]
    fn test_path_matching() {
        let jar = CookieJar::new();
        install(&jar, CookieDefinition::new("root", "1", "example.com")).unwrap();
        install(
            &jar,
            CookieDefinition::new("foo", "1", "example.com").with_path("/foo"),
        )
        .unwrap();
        install(
            &jar,
            CookieDefinition::new("baz", "1", "example.com").with_path("/baz"),
        )
        .unwrap();

        let cookies = jar.cookies_for_url(&url("http://example.com/foo/bar"));
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "foo");
        assert!(!cookies.iter().any(|c| c.name == "baz"));
    }

    #[test]
    fn test_per_domain_limit() {
        let jar = CookieJar::new();
        for i in 0..(MAX_COOKIES_PER_DOMAIN + 5) {
            install(
                &jar,
                CookieDefinition::new(format!("c{}", i), "v", "example.com"),
            )
            .unwrap();
        }
        assert_eq!(jar.total_cookie_count(), MAX_COOKIES_PER_DOMAIN);
    }

    #[test]
    fn test_domain_matches() {
        assert!(CookieJar::domain_matches("example.com", "a.example.com", false));
        assert!(!CookieJar::domain_matches("example.com", "badexample.com", false));
        assert!(!CookieJar::domain_matches("example.com", "a.example.com", true));
    }
}
