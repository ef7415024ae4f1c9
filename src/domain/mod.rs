//! Registrable-domain resolution.
//!
//! Every profile lookup is keyed by a [`Domain`], the registrable part of the
//! page host (`example.com`, `example.co.uk`). The resolver knows a single
//! second-level country-code suffix (`co.uk`) and falls back to the raw
//! input when no host can be extracted.
//!
//! # Example
//!
//! ```rust
//! use cookieprofiles::domain::resolve;
//!
//! assert_eq!(resolve("https://www.shop.example.co.uk/cart").as_str(), "example.co.uk");
//! assert_eq!(resolve("http://sub.example.com:8080/").as_str(), "example.com");
//! assert_eq!(resolve("not a url").as_str(), "not a url");
//! ```

mod resolve;

pub use resolve::{host_name, resolve, Domain};
