//! Atomic profile switching.
//!
//! A switch clears every managed cookie name of the domain, installs the
//! target profile's cookies, then records the target as active. All
//! removals complete before the first install is issued, and the record is
//! persisted only after every install has completed.

use crate::base::profileerror::ProfileError;
use crate::cookies::definition::CookieSetRequest;
use crate::cookies::sink::CookieSink;
use crate::domain::Domain;
use crate::profiles::managed::record_managed_names;
use crate::profiles::record::DomainRecord;
use crate::profiles::store::ProfileStore;
use dashmap::DashSet;
use futures::future::join_all;
use std::sync::Arc;
use url::Url;

/// Observable switch state of one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    Idle,
    Switching,
}

/// What one switch did.
#[derive(Debug, Clone)]
pub struct SwitchReport {
    pub domain: Domain,
    /// The profile now recorded as active.
    pub profile: String,
    pub previous_profile: String,
    pub removals_issued: usize,
    pub installs_issued: usize,
    /// Per-item failures. These never abort a switch.
    pub failures: Vec<ProfileError>,
}

impl SwitchReport {
    /// `true` when every removal and install succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Marks a domain as switching until dropped.
struct SwitchingGuard<'a> {
    switching: &'a DashSet<Domain>,
    domain: Domain,
}

impl Drop for SwitchingGuard<'_> {
    fn drop(&mut self) {
        self.switching.remove(&self.domain);
    }
}

pub struct ProfileSwitcher {
    store: Arc<ProfileStore>,
    sink: Arc<dyn CookieSink>,
    switching: DashSet<Domain>,
}

impl ProfileSwitcher {
    pub fn new(store: Arc<ProfileStore>, sink: Arc<dyn CookieSink>) -> Self {
        Self {
            store,
            sink,
            switching: DashSet::new(),
        }
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    pub fn state(&self, domain: &Domain) -> SwitchState {
        if self.switching.contains(domain) {
            SwitchState::Switching
        } else {
            SwitchState::Idle
        }
    }

    /// Make `target` the active profile of `domain`.
    ///
    /// An unknown domain starts from the default record and an unknown
    /// target installs nothing; neither is an error. Only loading or
    /// persisting the record fails the call.
    pub async fn switch_to(&self, domain: &Domain, target: &str) -> Result<SwitchReport, ProfileError> {
        let _guard = self.store.lock_domain(domain).await;
        let record = self.store.record_or_default(domain).await?;
        self.switch_locked(domain, record, target).await
    }

    /// Delete a profile.
    ///
    /// A domain with no stored record is left untouched. When the deleted
    /// profile was active, the removal is persisted and the domain is switched
    /// to the fallback profile inside the same critical section; the report
    /// of that switch is returned. That switch clears the post-removal
    /// managed set only.
    pub async fn remove_profile(
        &self,
        domain: &Domain,
        name: &str,
    ) -> Result<Option<SwitchReport>, ProfileError> {
        let _guard = self.store.lock_domain(domain).await;
        let Some(mut record) = self.store.load_record(domain).await? else {
            return Ok(None);
        };
        let removal = record.remove_profile(name);

        if removal.removed.is_none() && !removal.was_active {
            return Ok(None);
        }

        self.store.persist_record(domain, record.clone()).await?;
        tracing::debug!(domain = %domain, profile = %name, active = removal.was_active, "removed profile");

        if !removal.was_active {
            return Ok(None);
        }

        let report = self
            .switch_locked(domain, record, &removal.fallback)
            .await?;
        Ok(Some(report))
    }

    /// Caller holds the domain's guard.
    async fn switch_locked(
        &self,
        domain: &Domain,
        mut record: DomainRecord,
        target: &str,
    ) -> Result<SwitchReport, ProfileError> {
        let _state = self.enter(domain);

        let managed = record_managed_names(&record);

        let mut report = SwitchReport {
            domain: domain.clone(),
            profile: target.to_string(),
            previous_profile: record.current_profile.clone(),
            removals_issued: 0,
            installs_issued: 0,
            failures: Vec::new(),
        };

        tracing::debug!(
            domain = %domain,
            from = %report.previous_profile,
            to = %target,
            managed = managed.len(),
            "switching profile"
        );

        let urls = self.removal_urls(domain, &mut report.failures);
        let removals: Vec<_> = urls
            .iter()
            .flat_map(|url| {
                managed
                    .iter()
                    .map(move |name| self.sink.remove(url.clone(), name.clone()))
            })
            .collect();
        report.removals_issued = removals.len();
        for result in join_all(removals).await {
            if let Err(e) = result {
                tracing::warn!(domain = %domain, error = %e, "cookie removal failed");
                report.failures.push(e);
            }
        }

        let mut installs = Vec::new();
        for cookie in record.cookies(target) {
            match CookieSetRequest::from_definition(cookie) {
                Ok(request) => installs.push(self.sink.set(request)),
                Err(e) => {
                    tracing::warn!(domain = %domain, cookie = %cookie.name, error = %e, "skipping cookie");
                    report.failures.push(e);
                }
            }
        }
        report.installs_issued = installs.len();
        for result in join_all(installs).await {
            if let Err(e) = result {
                tracing::warn!(domain = %domain, error = %e, "cookie install failed");
                report.failures.push(e);
            }
        }

        record.current_profile = target.to_string();
        self.store.persist_record(domain, record).await?;

        tracing::debug!(
            domain = %domain,
            profile = %target,
            removals = report.removals_issued,
            installs = report.installs_issued,
            failures = report.failures.len(),
            "switched profile"
        );
        Ok(report)
    }

    /// Every `scheme://host/` a managed name is removed from.
    fn removal_urls(&self, domain: &Domain, failures: &mut Vec<ProfileError>) -> Vec<Url> {
        let config = self.store.config();
        let hosts = config.removal_hosts(domain.as_str());
        let mut urls = Vec::with_capacity(config.removal_schemes.len() * hosts.len());

        for scheme in &config.removal_schemes {
            for host in &hosts {
                let raw = format!("{}://{}/", scheme, host);
                match Url::parse(&raw) {
                    Ok(url) => urls.push(url),
                    Err(_) => {
                        tracing::warn!(domain = %domain, url = %raw, "invalid removal url");
                        failures.push(ProfileError::invalid_cookie_url(raw));
                    }
                }
            }
        }
        urls
    }

    fn enter(&self, domain: &Domain) -> SwitchingGuard<'_> {
        self.switching.insert(domain.clone());
        SwitchingGuard {
            switching: &self.switching,
            domain: domain.clone(),
        }
    }
}
