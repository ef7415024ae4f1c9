//! Managed cookie names.
//!
//! A name is managed for a domain when any of the domain's profiles defines
//! it. The switcher clears the whole managed set on every switch, not just
//! the names of the outgoing or incoming profile.

use crate::domain::Domain;
use crate::profiles::record::{DomainRecord, ProfileBlob};
use std::collections::BTreeSet;

/// Union of cookie names across every profile of `domain`.
/// Empty for an unknown domain.
pub fn managed_names(blob: &ProfileBlob, domain: &Domain) -> BTreeSet<String> {
    blob.get(domain)
        .map(record_managed_names)
        .unwrap_or_default()
}

/// Union of cookie names across every profile of one record.
pub fn record_managed_names(record: &DomainRecord) -> BTreeSet<String> {
    record
        .profile_data
        .iter()
        .flat_map(|(_, cookies)| cookies.iter().map(|c| c.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::definition::CookieDefinition;

    fn cookie(name: &str) -> CookieDefinition {
        CookieDefinition::new(name, "v", "example.com")
    }

    #[test]
    fn test_union_over_all_profiles() {
        let mut record = DomainRecord::default_record("A");
        record.profile_data.insert("A", vec![cookie("x"), cookie("shared")]);
        record.profile_data.insert("B", vec![cookie("y"), cookie("shared")]);
        record.current_profile = "A".into();

        let mut blob = ProfileBlob::new();
        blob.insert(Domain::from("example.com"), record);

        let names = managed_names(&blob, &Domain::from("example.com"));
        assert_eq!(names.into_iter().collect::<Vec<_>>(), ["shared", "x", "y"]);
    }

    #[test]
    fn test_independent_of_active_profile() {
        let mut record = DomainRecord::default_record("A");
        record.profile_data.insert("B", vec![cookie("y")]);
        let before = record_managed_names(&record);

        record.current_profile = "B".into();
        assert_eq!(record_managed_names(&record), before);
    }

    #[test]
    fn test_unknown_domain_is_empty() {
        let blob = ProfileBlob::new();
        assert!(managed_names(&blob, &Domain::from("nowhere.com")).is_empty());
    }

    #[test]
    fn test_added_cookie_becomes_managed() {
        let mut record = DomainRecord::default_record("A");
        assert!(record_managed_names(&record).is_empty());

        record.profile_data.get_mut("A").unwrap().push(cookie("new"));
        assert!(record_managed_names(&record).contains("new"));
    }
}
