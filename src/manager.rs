//! The profile manager: the surface a UI drives.

use crate::base::profileerror::ProfileError;
use crate::cookies::definition::CookieDefinition;
use crate::cookies::jar::CookieJar;
use crate::cookies::sink::CookieSink;
use crate::domain::{self, Domain};
use crate::profiles::config::ProfileConfig;
use crate::profiles::storage::{MemoryProfileStorage, ProfileStorage};
use crate::profiles::store::ProfileStore;
use crate::profiles::switcher::{ProfileSwitcher, SwitchReport, SwitchState};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Refreshes whatever consumes the cookies (e.g. reloads the current tab).
///
/// Invoked only after a switch has been persisted.
pub trait ReloadHook: Send + Sync {
    fn reload(&self, domain: &Domain, profile: &str);
}

impl<F> ReloadHook for F
where
    F: Fn(&Domain, &str) + Send + Sync,
{
    fn reload(&self, domain: &Domain, profile: &str) {
        self(domain, profile)
    }
}

/// Cookie profile manager.
///
/// # Example
///
/// ```rust,ignore
/// let manager = ProfileManager::builder()
///     .storage(JsonFileStorage::new("profiles.json"))
///     .reload_hook(|domain: &Domain, profile: &str| println!("{domain} -> {profile}"))
///     .build();
///
/// let domain = manager.resolve_domain("https://www.example.com/login");
/// manager.create_profile(&domain, "Admin").await?;
/// manager.switch_to(&domain, "Admin").await?;
/// ```
pub struct ProfileManager {
    store: Arc<ProfileStore>,
    switcher: ProfileSwitcher,
    reload_hook: Option<Arc<dyn ReloadHook>>,
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileManager {
    /// In-memory storage, an in-memory cookie jar and default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ProfileManagerBuilder {
        ProfileManagerBuilder::default()
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    pub fn config(&self) -> &ProfileConfig {
        self.store.config()
    }

    /// Domain key for a page URL.
    pub fn resolve_domain(&self, url: &str) -> Domain {
        domain::resolve(url)
    }

    pub fn switch_state(&self, domain: &Domain) -> SwitchState {
        self.switcher.state(domain)
    }

    /// Make `profile` active for `domain`, then fire the reload hook.
    pub async fn switch_to(&self, domain: &Domain, profile: &str) -> Result<SwitchReport, ProfileError> {
        let report = self.switcher.switch_to(domain, profile).await?;
        self.notify(&report);
        Ok(report)
    }

    pub async fn create_profile(&self, domain: &Domain, name: &str) -> Result<bool, ProfileError> {
        self.store.create_profile(domain, name).await
    }

    /// Rename a profile. Installed cookies are left alone.
    pub async fn rename_profile(
        &self,
        domain: &Domain,
        old: &str,
        new: &str,
    ) -> Result<bool, ProfileError> {
        self.store.rename_profile(domain, old, new).await
    }

    /// Delete a profile. Deleting the active profile switches to the
    /// fallback and fires the reload hook.
    pub async fn remove_profile(
        &self,
        domain: &Domain,
        name: &str,
    ) -> Result<Option<SwitchReport>, ProfileError> {
        let report = self.switcher.remove_profile(domain, name).await?;
        if let Some(report) = &report {
            self.notify(report);
        }
        Ok(report)
    }

    pub async fn get_managed_names(&self, domain: &Domain) -> Result<BTreeSet<String>, ProfileError> {
        self.store.managed_names(domain).await
    }

    /// Profile names in insertion order, and the active profile.
    pub async fn list_profiles(&self, domain: &Domain) -> Result<(Vec<String>, String), ProfileError> {
        self.store.list_profiles(domain).await
    }

    pub async fn profile_cookies(
        &self,
        domain: &Domain,
        profile: &str,
    ) -> Result<Vec<CookieDefinition>, ProfileError> {
        self.store.profile_cookies(domain, profile).await
    }

    pub async fn set_profile_cookies(
        &self,
        domain: &Domain,
        profile: &str,
        cookies: Vec<CookieDefinition>,
    ) -> Result<(), ProfileError> {
        self.store.set_profile_cookies(domain, profile, cookies).await
    }

    pub async fn add_cookie(
        &self,
        domain: &Domain,
        profile: &str,
        cookie: CookieDefinition,
    ) -> Result<(), ProfileError> {
        self.store.add_cookie(domain, profile, cookie).await
    }

    pub async fn remove_cookie(
        &self,
        domain: &Domain,
        profile: &str,
        name: &str,
    ) -> Result<bool, ProfileError> {
        self.store.remove_cookie(domain, profile, name).await
    }

    pub async fn export_json(&self) -> Result<String, ProfileError> {
        self.store.export_json().await
    }

    pub async fn import_json(&self, json: &str) -> Result<usize, ProfileError> {
        self.store.import_json(json).await
    }

    pub async fn export_netscape(&self, domain: &Domain, profile: &str) -> Result<String, ProfileError> {
        self.store.export_netscape(domain, profile).await
    }

    pub async fn import_netscape(
        &self,
        domain: &Domain,
        profile: &str,
        content: &str,
    ) -> Result<usize, ProfileError> {
        self.store.import_netscape(domain, profile, content).await
    }

    fn notify(&self, report: &SwitchReport) {
        if let Some(hook) = &self.reload_hook {
            tracing::debug!(domain = %report.domain, profile = %report.profile, "reloading consumer");
            hook.reload(&report.domain, &report.profile);
        }
    }
}

/// Builder for [`ProfileManager`].
#[derive(Default)]
pub struct ProfileManagerBuilder {
    storage: Option<Arc<dyn ProfileStorage>>,
    sink: Option<Arc<dyn CookieSink>>,
    config: Option<ProfileConfig>,
    reload_hook: Option<Arc<dyn ReloadHook>>,
}

impl ProfileManagerBuilder {
    /// Set profile storage. Defaults to [`MemoryProfileStorage`].
    pub fn storage<S: ProfileStorage + 'static>(mut self, storage: S) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Set the cookie sink. Defaults to a fresh [`CookieJar`].
    pub fn sink<C: CookieSink + 'static>(mut self, sink: C) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn config(mut self, config: ProfileConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn reload_hook<H: ReloadHook + 'static>(mut self, hook: H) -> Self {
        self.reload_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> ProfileManager {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryProfileStorage::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(CookieJar::new()));
        let store = Arc::new(ProfileStore::new(storage, self.config.unwrap_or_default()));

        ProfileManager {
            switcher: ProfileSwitcher::new(store.clone(), sink),
            store,
            reload_hook: self.reload_hook,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_reload_hook_fires_after_switch() {
        let reloads = Arc::new(AtomicUsize::new(0));
        let counter = reloads.clone();
        let manager = ProfileManager::builder()
            .reload_hook(move |_: &Domain, _: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        let domain = manager.resolve_domain("https://www.example.com/");

        manager.create_profile(&domain, "Other").await.unwrap();
        assert_eq!(reloads.load(Ordering::SeqCst), 0);

        manager.switch_to(&domain, "Other").await.unwrap();
        assert_eq!(reloads.load(Ordering::SeqCst), 1);

        manager.rename_profile(&domain, "Other", "Renamed").await.unwrap();
        assert_eq!(reloads.load(Ordering::SeqCst), 1);

        manager.remove_profile(&domain, "Renamed").await.unwrap();
        assert_eq!(reloads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_manager_lists_default_profile() {
        let manager = ProfileManager::new();
        let domain = manager.resolve_domain("http://shop.example.co.uk/");
        assert_eq!(domain.as_str(), "example.co.uk");

        let (names, current) = manager.list_profiles(&domain).await.unwrap();
        assert_eq!(names, [manager.config().default_profile_name.clone()]);
        assert_eq!(current, "Profile 1");
    }
}
