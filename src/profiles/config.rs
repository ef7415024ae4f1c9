//! Profile store and switcher configuration.

/// What create/rename do when the target name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Replace the existing profile's cookies (the historical behavior).
    #[default]
    Overwrite,
    /// Fail with `ProfileError::ProfileExists`.
    Reject,
}

/// Configuration for [`ProfileStore`](crate::profiles::store::ProfileStore)
/// and [`ProfileSwitcher`](crate::profiles::switcher::ProfileSwitcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    /// Name of the single empty profile a new domain starts with
    pub default_profile_name: String,
    /// Subdomains cleared in addition to the bare domain on every switch
    pub subdomain_prefixes: Vec<String>,
    /// Schemes each managed cookie is removed under
    pub removal_schemes: Vec<String>,
    /// Create/rename behavior on a name collision
    pub collision_policy: CollisionPolicy,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_profile_name: "Profile 1".to_string(),
            subdomain_prefixes: vec!["b2b".to_string()],
            removal_schemes: vec!["http".to_string(), "https".to_string()],
            collision_policy: CollisionPolicy::Overwrite,
        }
    }
}

impl ProfileConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default profile name.
    pub fn default_profile_name(mut self, name: impl Into<String>) -> Self {
        self.default_profile_name = name.into();
        self
    }

    /// Replace the cleared subdomain prefixes.
    pub fn subdomain_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomain_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the removal schemes.
    pub fn removal_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.removal_schemes = schemes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the collision policy.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Hosts cleared for `domain`: the domain itself, then each prefixed
    /// subdomain.
    pub fn removal_hosts(&self, domain: &str) -> Vec<String> {
        std::iter::once(domain.to_string())
            .chain(
                self.subdomain_prefixes
                    .iter()
                    .map(|prefix| format!("{}.{}", prefix, domain)),
            )
            .collect()
    }
}
