//! Profile store: locking, persistence and CRUD over domain records.
//!
//! Every load → mutate → persist cycle on a domain runs under that domain's
//! async mutex. Writing a record back is a read-modify-write of the whole
//! blob under a second, store-wide mutex, so updates to different domains
//! never overwrite each other either.

use crate::base::profileerror::ProfileError;
use crate::cookies::definition::CookieDefinition;
use crate::cookies::netscape;
use crate::domain::Domain;
use crate::profiles::config::ProfileConfig;
use crate::profiles::managed::record_managed_names;
use crate::profiles::record::{DomainRecord, ProfileBlob};
use crate::profiles::storage::ProfileStorage;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held for the duration of one domain's load → mutate → persist cycle.
///
/// Dropping the last guard of a domain with no waiters also drops its lock
/// entry, so the registry only holds domains that are in use.
pub struct DomainGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<Domain, Arc<Mutex<()>>>,
    domain: Domain,
}

impl Drop for DomainGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The guard and every waiter hold a clone; only the registry's is left.
        self.locks
            .remove_if(&self.domain, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct ProfileStore {
    storage: Arc<dyn ProfileStorage>,
    config: ProfileConfig,
    domain_locks: DashMap<Domain, Arc<Mutex<()>>>,
    blob_lock: Mutex<()>,
}

impl ProfileStore {
    pub fn new(storage: Arc<dyn ProfileStorage>, config: ProfileConfig) -> Self {
        Self {
            storage,
            config,
            domain_locks: DashMap::new(),
            blob_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// The record used for a domain that has none yet.
    pub fn default_record(&self) -> DomainRecord {
        DomainRecord::default_record(&self.config.default_profile_name)
    }

    /// Acquire the per-domain critical section.
    pub async fn lock_domain(&self, domain: &Domain) -> DomainGuard<'_> {
        let lock = self.domain_locks.entry(domain.clone()).or_default().clone();
        DomainGuard {
            guard: Some(lock.lock_owned().await),
            locks: &self.domain_locks,
            domain: domain.clone(),
        }
    }

    /// Domains with a held or awaited lock.
    pub fn tracked_domains(&self) -> usize {
        self.domain_locks.len()
    }

    pub async fn load_blob(&self) -> Result<ProfileBlob, ProfileError> {
        self.storage.load().await.map_err(|e| {
            tracing::error!(error = %e, "failed to load profile storage");
            e
        })
    }

    pub async fn load_record(&self, domain: &Domain) -> Result<Option<DomainRecord>, ProfileError> {
        let mut blob = self.load_blob().await?;
        Ok(blob.remove(domain))
    }

    /// The stored record, or the default record (not persisted).
    pub async fn record_or_default(&self, domain: &Domain) -> Result<DomainRecord, ProfileError> {
        Ok(self
            .load_record(domain)
            .await?
            .unwrap_or_else(|| self.default_record()))
    }

    /// Write one record back. Callers hold the domain's guard.
    pub async fn persist_record(
        &self,
        domain: &Domain,
        record: DomainRecord,
    ) -> Result<(), ProfileError> {
        let _blob = self.blob_lock.lock().await;
        let mut blob = self.load_blob().await?;
        blob.insert(domain.clone(), record);
        self.storage.save(blob).await.map_err(|e| {
            tracing::error!(domain = %domain, error = %e, "failed to persist profile record");
            e
        })?;
        tracing::debug!(domain = %domain, "persisted profile record");
        Ok(())
    }

    /// Run `f` on the domain's record inside its critical section and persist
    /// the result if anything changed.
    async fn modify<T, F>(&self, domain: &Domain, f: F) -> Result<T, ProfileError>
    where
        F: FnOnce(&mut DomainRecord) -> Result<T, ProfileError>,
    {
        let _guard = self.lock_domain(domain).await;
        let before = self.record_or_default(domain).await?;
        let mut record = before.clone();
        let value = f(&mut record)?;
        if record != before {
            self.persist_record(domain, record).await?;
        }
        Ok(value)
    }

    /// Add an empty profile. Blank names are ignored (`Ok(false)`).
    pub async fn create_profile(&self, domain: &Domain, name: &str) -> Result<bool, ProfileError> {
        let policy = self.config.collision_policy;
        let created = self
            .modify(domain, |record| record.create_profile(domain, name, policy))
            .await?;
        if created {
            tracing::debug!(domain = %domain, profile = %name.trim(), "created profile");
        }
        Ok(created)
    }

    /// Rename a profile, keeping its cookies. Does not touch any cookie jar.
    pub async fn rename_profile(
        &self,
        domain: &Domain,
        old: &str,
        new: &str,
    ) -> Result<bool, ProfileError> {
        let policy = self.config.collision_policy;
        let renamed = self
            .modify(domain, |record| record.rename_profile(domain, old, new, policy))
            .await?;
        if renamed {
            tracing::debug!(domain = %domain, from = %old, to = %new.trim(), "renamed profile");
        }
        Ok(renamed)
    }

    /// Replace a profile's cookie list, creating the profile if needed.
    pub async fn set_profile_cookies(
        &self,
        domain: &Domain,
        name: &str,
        cookies: Vec<CookieDefinition>,
    ) -> Result<(), ProfileError> {
        self.modify(domain, |record| {
            record.profile_data.insert(name, cookies);
            Ok(())
        })
        .await
    }

    /// Add a cookie to an existing profile. A cookie with the same name,
    /// domain and path is replaced in place.
    pub async fn add_cookie(
        &self,
        domain: &Domain,
        name: &str,
        cookie: CookieDefinition,
    ) -> Result<(), ProfileError> {
        self.modify(domain, |record| {
            let cookies = record
                .profile_data
                .get_mut(name)
                .ok_or_else(|| ProfileError::ProfileNotFound {
                    domain: domain.to_string(),
                    name: name.to_string(),
                })?;

            let existing = cookies.iter().position(|c| {
                c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path
            });
            match existing {
                Some(idx) => cookies[idx] = cookie,
                None => cookies.push(cookie),
            }
            Ok(())
        })
        .await
    }

    /// Remove every cookie named `cookie_name` from a profile.
    /// Returns whether anything was removed.
    pub async fn remove_cookie(
        &self,
        domain: &Domain,
        name: &str,
        cookie_name: &str,
    ) -> Result<bool, ProfileError> {
        self.modify(domain, |record| {
            let Some(cookies) = record.profile_data.get_mut(name) else {
                return Ok(false);
            };
            let before = cookies.len();
            cookies.retain(|c| c.name != cookie_name);
            Ok(cookies.len() != before)
        })
        .await
    }

    /// Profile names in insertion order, and the active profile.
    pub async fn list_profiles(&self, domain: &Domain) -> Result<(Vec<String>, String), ProfileError> {
        let record = self.record_or_default(domain).await?;
        Ok((record.profile_names(), record.current_profile))
    }

    /// A profile's cookies; empty for an unknown profile.
    pub async fn profile_cookies(
        &self,
        domain: &Domain,
        name: &str,
    ) -> Result<Vec<CookieDefinition>, ProfileError> {
        let record = self.record_or_default(domain).await?;
        Ok(record.cookies(name).to_vec())
    }

    /// Names cleared on every switch for `domain`.
    pub async fn managed_names(&self, domain: &Domain) -> Result<BTreeSet<String>, ProfileError> {
        Ok(self
            .load_record(domain)
            .await?
            .map(|record| record_managed_names(&record))
            .unwrap_or_default())
    }

    /// The whole store as pretty-printed JSON.
    pub async fn export_json(&self) -> Result<String, ProfileError> {
        let blob = self.load_blob().await?;
        Ok(serde_json::to_string_pretty(&blob)?)
    }

    /// Replace the records of every domain present in `json`.
    /// Domains absent from `json` are kept. Returns the number of domains
    /// written.
    pub async fn import_json(&self, json: &str) -> Result<usize, ProfileError> {
        let incoming: ProfileBlob = serde_json::from_str(json)?;
        let count = incoming.len();
        for (domain, record) in incoming {
            let _guard = self.lock_domain(&domain).await;
            self.persist_record(&domain, record).await?;
        }
        tracing::debug!(domains = count, "imported profile store");
        Ok(count)
    }

    /// A profile's cookies in Netscape format.
    pub async fn export_netscape(&self, domain: &Domain, name: &str) -> Result<String, ProfileError> {
        let cookies = self.profile_cookies(domain, name).await?;
        Ok(netscape::export_netscape(&cookies))
    }

    /// Replace a profile's cookies with the contents of a Netscape cookie
    /// file. Returns the number of cookies imported.
    pub async fn import_netscape(
        &self,
        domain: &Domain,
        name: &str,
        content: &str,
    ) -> Result<usize, ProfileError> {
        let cookies = netscape::import_netscape(content)?;
        let count = cookies.len();
        self.set_profile_cookies(domain, name, cookies).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::config::CollisionPolicy;
    use crate::profiles::storage::MemoryProfileStorage;

    fn store() -> (ProfileStore, Arc<MemoryProfileStorage>) {
        let storage = Arc::new(MemoryProfileStorage::new());
        (
            ProfileStore::new(storage.clone(), ProfileConfig::default()),
            storage,
        )
    }

    fn domain() -> Domain {
        Domain::from("example.com")
    }

    #[tokio::test]
    async fn test_unknown_domain_reads_default_without_persisting() {
        let (store, storage) = store();
        let (names, current) = store.list_profiles(&domain()).await.unwrap();

        assert_eq!(names, ["Profile 1"]);
        assert_eq!(current, "Profile 1");
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_persists_default_plus_new() {
        let (store, storage) = store();
        assert!(store.create_profile(&domain(), "  Work ").await.unwrap());

        let blob = storage.load().await.unwrap();
        assert_eq!(blob[&domain()].profile_names(), ["Profile 1", "Work"]);
    }

    #[tokio::test]
    async fn test_blank_create_does_not_persist() {
        let (store, storage) = store();
        assert!(!store.create_profile(&domain(), "").await.unwrap());
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reject_policy() {
        let storage = Arc::new(MemoryProfileStorage::new());
        let config = ProfileConfig::new().collision_policy(CollisionPolicy::Reject);
        let store = ProfileStore::new(storage, config);

        let err = store.create_profile(&domain(), "Profile 1").await.unwrap_err();
        assert!(matches!(err, ProfileError::ProfileExists { .. }));
    }

    #[tokio::test]
    async fn test_add_cookie_replaces_same_identity() {
        let (store, _) = store();
        let d = domain();
        store
            .add_cookie(&d, "Profile 1", CookieDefinition::new("sid", "1", "example.com"))
            .await
            .unwrap();
        store
            .add_cookie(&d, "Profile 1", CookieDefinition::new("sid", "2", "example.com"))
            .await
            .unwrap();

        let cookies = store.profile_cookies(&d, "Profile 1").await.unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "2");
    }

    #[tokio::test]
    async fn test_add_cookie_unknown_profile() {
        let (store, _) = store();
        let err = store
            .add_cookie(&domain(), "Ghost", CookieDefinition::new("sid", "1", "example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::ProfileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_cookie() {
        let (store, _) = store();
        let d = domain();
        store
            .set_profile_cookies(
                &d,
                "Profile 1",
                vec![
                    CookieDefinition::new("a", "1", "example.com"),
                    CookieDefinition::new("b", "1", "example.com"),
                ],
            )
            .await
            .unwrap();

        assert!(store.remove_cookie(&d, "Profile 1", "a").await.unwrap());
        assert!(!store.remove_cookie(&d, "Profile 1", "a").await.unwrap());
        assert_eq!(
            store.managed_names(&d).await.unwrap().into_iter().collect::<Vec<_>>(),
            ["b"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_creates_on_different_domains_all_land() {
        let (store, storage) = store();
        let store = Arc::new(store);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let d = Domain::from(format!("site{}.com", i));
                store.create_profile(&d, "Extra").await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        assert_eq!(storage.load().await.unwrap().len(), 16);
        assert_eq!(store.tracked_domains(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_creates_on_same_domain_all_land() {
        let (store, storage) = store();
        let store = Arc::new(store);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.create_profile(&domain(), &format!("P{}", i)).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let blob = storage.load().await.unwrap();
        assert_eq!(blob[&domain()].profile_data.len(), 17);
        assert_eq!(store.tracked_domains(), 0);
    }

    #[tokio::test]
    async fn test_lock_entry_outlives_guard_while_awaited() {
        let (store, _) = store();
        let store = Arc::new(store);

        let guard = store.lock_domain(&domain()).await;
        assert_eq!(store.tracked_domains(), 1);

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let _guard = store.lock_domain(&domain()).await;
                store.tracked_domains()
            })
        };
        tokio::task::yield_now().await;
        drop(guard);

        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(store.tracked_domains(), 0);
    }

    #[tokio::test]
    async fn test_json_export_import() {
        let (source, _) = store();
        source.create_profile(&domain(), "Work").await.unwrap();
        let json = source.export_json().await.unwrap();

        let (target, _) = store();
        assert_eq!(target.import_json(&json).await.unwrap(), 1);
        let (names, _) = target.list_profiles(&domain()).await.unwrap();
        assert_eq!(names, ["Profile 1", "Work"]);
    }

    #[tokio::test]
    async fn test_netscape_import_replaces_profile() {
        let (store, _) = store();
        let content = ".example.com\tTRUE\t/\tFALSE\t0\tsid\tabc\n";
        assert_eq!(
            store
                .import_netscape(&domain(), "Imported", content)
                .await
                .unwrap(),
            1
        );

        let exported = store.export_netscape(&domain(), "Imported").await.unwrap();
        assert!(exported.contains("\tsid\tabc"));
    }
}
