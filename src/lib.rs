//! # cookieprofiles
//!
//! Named cookie profiles per web domain, with atomic switching.
//!
//! A profile is a user-authored list of cookie definitions. Switching a
//! domain to a profile clears every cookie name that any of the domain's
//! profiles defines, installs the target profile's cookies, and only then
//! records the target as active. Stored profile definitions are never
//! rewritten by a switch.
//!
//! ## Features
//!
//! - **Domain Resolution**: page URL → registrable domain, with `co.uk` support
//! - **Atomic Switching**: removals before installs, persistence last
//! - **Per-Domain Locking**: concurrent operations on one domain never clobber
//!   each other's updates
//! - **Pluggable Backends**: [`ProfileStorage`](profiles::storage::ProfileStorage)
//!   for persistence, [`CookieSink`](cookies::sink::CookieSink) for the jar
//! - **Import/Export**: whole-store JSON and per-profile Netscape files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cookieprofiles::manager::ProfileManager;
//! use cookieprofiles::profiles::storage::JsonFileStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cookieprofiles::base::profileerror::ProfileError> {
//!     let manager = ProfileManager::builder()
//!         .storage(JsonFileStorage::new("profiles.json"))
//!         .build();
//!
//!     let domain = manager.resolve_domain("https://www.example.com/");
//!     manager.create_profile(&domain, "Staging").await?;
//!     let report = manager.switch_to(&domain, "Staging").await?;
//!     println!("{} removals, {} installs", report.removals_issued, report.installs_issued);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`domain`] - Registrable-domain resolution
//! - [`cookies`] - Cookie definitions, the cookie sink and an in-memory jar
//! - [`profiles`] - Records, storage, the profile store and the switcher
//! - [`manager`] - The UI-facing profile manager

pub mod base;
pub mod cookies;
pub mod domain;
pub mod manager;
pub mod profiles;
