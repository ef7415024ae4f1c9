//! Persisted profile data model.

use crate::base::profileerror::ProfileError;
use crate::cookies::definition::CookieDefinition;
use crate::domain::Domain;
use crate::profiles::config::CollisionPolicy;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The whole persisted store: one record per domain.
pub type ProfileBlob = BTreeMap<Domain, DomainRecord>;

/// Profile name → cookie list, in insertion order.
///
/// Serialized as a JSON object whose key order is the insertion order.
/// Removing the active profile falls back along this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileMap {
    entries: Vec<(String, Vec<CookieDefinition>)>,
    /// Profiles stored as `null` and not replaced since; written back as `null`.
    stored_null: BTreeSet<String>,
}

impl ProfileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&[CookieDefinition]> {
        self.position(name).map(|i| self.entries[i].1.as_slice())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<CookieDefinition>> {
        let idx = self.position(name)?;
        Some(&mut self.entries[idx].1)
    }

    /// Insert or replace. A replaced profile keeps its position; a new one is
    /// appended.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        cookies: Vec<CookieDefinition>,
    ) -> Option<Vec<CookieDefinition>> {
        let name = name.into();
        self.stored_null.remove(&name);
        match self.position(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, cookies)),
            None => {
                self.entries.push((name, cookies));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<CookieDefinition>> {
        let idx = self.position(name)?;
        self.stored_null.remove(name);
        Some(self.entries.remove(idx).1)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.entries.first().map(|(n, _)| n.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CookieDefinition])> + '_ {
        self.entries.iter().map(|(n, c)| (n.as_str(), c.as_slice()))
    }
}

impl Serialize for ProfileMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, cookies) in &self.entries {
            if cookies.is_empty() && self.stored_null.contains(name) {
                map.serialize_entry(name, &())?;
                continue;
            }
            map.serialize_entry(name, cookies)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProfileMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProfileMapVisitor;

        impl<'de> Visitor<'de> for ProfileMapVisitor {
            type Value = ProfileMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of profile names to cookie lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ProfileMap, A::Error> {
                let mut map = ProfileMap::new();
                while let Some((name, cookies)) =
                    access.next_entry::<String, Option<Vec<CookieDefinition>>>()?
                {
                    // null entries are left behind by older stores; read as empty
                    match cookies {
                        Some(cookies) => {
                            map.insert(name, cookies);
                        }
                        None => {
                            map.insert(name.clone(), Vec::new());
                            map.stored_null.insert(name);
                        }
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ProfileMapVisitor)
    }
}

/// Persisted state for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    #[serde(default)]
    pub current_profile: String,
    #[serde(default)]
    pub profile_data: ProfileMap,
}

/// What [`DomainRecord::remove_profile`] changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub removed: Option<Vec<CookieDefinition>>,
    pub was_active: bool,
    pub fallback: String,
}

impl DomainRecord {
    /// The record every read path uses for a domain that has none yet:
    /// a single empty profile, which is active.
    pub fn default_record(default_profile_name: &str) -> Self {
        let mut profile_data = ProfileMap::new();
        profile_data.insert(default_profile_name, Vec::new());
        Self {
            current_profile: default_profile_name.to_string(),
            profile_data,
        }
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profile_data.names().map(str::to_string).collect()
    }

    /// Cookies of `name`, or an empty slice for an unknown profile.
    pub fn cookies(&self, name: &str) -> &[CookieDefinition] {
        self.profile_data.get(name).unwrap_or(&[])
    }

    /// Add an empty profile. Returns `false` for a blank name.
    pub fn create_profile(
        &mut self,
        domain: &Domain,
        name: &str,
        policy: CollisionPolicy,
    ) -> Result<bool, ProfileError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        self.check_collision(domain, name, policy)?;
        self.profile_data.insert(name, Vec::new());
        Ok(true)
    }

    /// Move `old`'s cookies to `new`. Returns `false` for a blank `new` or
    /// `new == old`.
    pub fn rename_profile(
        &mut self,
        domain: &Domain,
        old: &str,
        new: &str,
        policy: CollisionPolicy,
    ) -> Result<bool, ProfileError> {
        let new = new.trim();
        if new.is_empty() || new == old {
            return Ok(false);
        }
        if !self.profile_data.contains(old) {
            return Err(ProfileError::ProfileNotFound {
                domain: domain.to_string(),
                name: old.to_string(),
            });
        }
        self.check_collision(domain, new, policy)?;

        let cookies = self.profile_data.remove(old).unwrap_or_default();
        self.profile_data.insert(new, cookies);
        if self.current_profile == old {
            self.current_profile = new.to_string();
        }
        Ok(true)
    }

    /// Delete `name`. If it was active, the first remaining profile (or the
    /// empty string) becomes active.
    pub fn remove_profile(&mut self, name: &str) -> Removal {
        let removed = self.profile_data.remove(name);
        let was_active = self.current_profile == name;
        if was_active {
            self.current_profile = self
                .profile_data
                .first_name()
                .unwrap_or_default()
                .to_string();
        }
        Removal {
            removed,
            was_active,
            fallback: self.current_profile.clone(),
        }
    }

    fn check_collision(
        &self,
        domain: &Domain,
        name: &str,
        policy: CollisionPolicy,
    ) -> Result<(), ProfileError> {
        if policy == CollisionPolicy::Reject && self.profile_data.contains(name) {
            return Err(ProfileError::ProfileExists {
                domain: domain.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
