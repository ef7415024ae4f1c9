//! URL → registrable domain.

use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};

/// Second-level suffix that keeps three labels instead of two.
const SECOND_LEVEL_SUFFIX: [&str; 2] = ["co", "uk"];

/// A registrable domain used as the key into the profile store.
///
/// This is a lightweight wrapper around the domain string. It is not
/// validated: an unparseable page URL resolves to itself so it still has a
/// stable key.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain {
    name: Box<str>,
}

impl Domain {
    /// Creates a new [`Domain`] from any string-like type.
    #[inline]
    pub fn new(name: impl Into<Box<str>>) -> Self {
        Self { name: name.into() }
    }

    /// View the domain as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Domain {
    fn from(value: &str) -> Self {
        Domain::new(value)
    }
}

impl From<String> for Domain {
    fn from(value: String) -> Self {
        Domain::new(value)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.name, f)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

/// Extract the host from `url`.
///
/// The host is whatever follows the first `://`, minus an optional `www.` or
/// `www<digit>.` prefix, up to the first `/` or `:`. Returns `None` when
/// there is no scheme separator or the host is empty.
pub fn host_name(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let rest = strip_www_prefix(rest);
    let end = rest.find(|c| c == '/' || c == ':').unwrap_or(rest.len());
    let host = &rest[..end];
    (!host.is_empty()).then_some(host)
}

fn strip_www_prefix(rest: &str) -> &str {
    let bytes = rest.as_bytes();
    if bytes.len() < 4 || !bytes[..3].eq_ignore_ascii_case(b"www") {
        return rest;
    }
    let mut idx = 3;
    if bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    match bytes.get(idx) {
        Some(b'.') => &rest[idx + 1..],
        _ => rest,
    }
}

/// Resolve a page URL to its registrable [`Domain`].
///
/// `sub.example.com` → `example.com`, `www.example.co.uk` → `example.co.uk`.
/// Input without an extractable host is returned unchanged.
pub fn resolve(url: &str) -> Domain {
    let Some(host) = host_name(url) else {
        return Domain::new(url);
    };

    let labels: Vec<&str> = host.split('.').collect();
    let keep = if labels.len() > 2 && ends_with_second_level_suffix(&labels) {
        3
    } else {
        2
    };

    let start = labels.len().saturating_sub(keep);
    Domain::new(labels[start..].join("."))
}

fn ends_with_second_level_suffix(labels: &[&str]) -> bool {
    let n = labels.len();
    n >= 2
        && labels[n - 2].eq_ignore_ascii_case(SECOND_LEVEL_SUFFIX[0])
        && labels[n - 1].eq_ignore_ascii_case(SECOND_LEVEL_SUFFIX[1])
}
