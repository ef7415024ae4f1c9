//! Cookie profiles per domain.
//!
//! - **Record**: [`DomainRecord`](record::DomainRecord), the persisted unit of
//!   one domain: its profiles plus which one is active
//! - **Storage**: [`ProfileStorage`](storage::ProfileStorage) moves the whole
//!   blob in and out of durable storage
//! - **Store**: [`ProfileStore`](store::ProfileStore) serializes
//!   load → mutate → persist cycles per domain and owns profile CRUD
//! - **Switcher**: [`ProfileSwitcher`](switcher::ProfileSwitcher) clears the
//!   managed cookie set and installs the target profile
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cookieprofiles::cookies::definition::CookieDefinition;
//! use cookieprofiles::cookies::jar::CookieJar;
//! use cookieprofiles::domain::Domain;
//! use cookieprofiles::profiles::config::ProfileConfig;
//! use cookieprofiles::profiles::storage::MemoryProfileStorage;
//! use cookieprofiles::profiles::store::ProfileStore;
//! use cookieprofiles::profiles::switcher::ProfileSwitcher;
//!
//! # tokio_test_block_on(async {
//! let store = Arc::new(ProfileStore::new(
//!     Arc::new(MemoryProfileStorage::new()),
//!     ProfileConfig::default(),
//! ));
//! let domain = Domain::from("example.com");
//! store
//!     .set_profile_cookies(&domain, "Admin", vec![CookieDefinition::new("role", "admin", ".example.com")])
//!     .await?;
//!
//! let jar = Arc::new(CookieJar::new());
//! let switcher = ProfileSwitcher::new(store.clone(), jar.clone());
//! switcher.switch_to(&domain, "Admin").await?;
//! assert_eq!(jar.total_cookie_count(), 1);
//! # Ok::<(), cookieprofiles::base::profileerror::ProfileError>(())
//! # }).unwrap();
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod managed;
pub mod record;
pub mod storage;
pub mod store;
pub mod switcher;
