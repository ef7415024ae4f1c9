//! Cookie definitions and the cookie sink.
//!
//! - **Definitions**: [`CookieDefinition`](definition::CookieDefinition), the
//!   user-authored cookie stored inside a profile
//! - **Sink**: [`CookieSink`](sink::CookieSink), the write-only jar the
//!   switcher drives
//! - **Jar**: [`CookieJar`](jar::CookieJar), an in-memory sink with RFC 6265
//!   matching
//! - **Netscape**: import/export of profile cookies in curl/wget format
//!
//! # Example
//!
//! ```rust
//! use cookieprofiles::cookies::definition::{CookieDefinition, CookieSetRequest};
//! use cookieprofiles::cookies::jar::CookieJar;
//! use url::Url;
//!
//! let jar = CookieJar::new();
//! let cookie = CookieDefinition::new("sid", "abc", ".example.com").with_secure(true);
//! jar.set_cookie(CookieSetRequest::from_definition(&cookie)?)?;
//!
//! let url = Url::parse("https://b2b.example.com/").unwrap();
//! assert_eq!(jar.get(&url, "sid").unwrap().value, "abc");
//! # Ok::<(), cookieprofiles::base::profileerror::ProfileError>(())
//! ```

pub mod definition;
pub mod jar;
pub mod netscape;
pub mod sink;
