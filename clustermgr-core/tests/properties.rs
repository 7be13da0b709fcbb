//! Property-based tests for clustermgr core

use clustermgr_core::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn props_valid_names_are_accepted(name in "[A-Za-z0-9._%-]{1,100}") {
        let bucket = BucketName::new(&name).unwrap();
        prop_assert_eq!(bucket.as_str(), name.as_str());
    }

    #[test]
    fn props_names_with_foreign_characters_are_rejected(
        prefix in "[a-z]{0,10}",
        bad in "[ /:@!#]",
        suffix in "[a-z]{0,10}",
    ) {
        let name = format!("{}{}{}", prefix, bad, suffix);
        prop_assert!(BucketName::new(&name).is_err());
    }

    #[test]
    fn props_builder_enforces_quota_and_replica_bounds(
        quota in 0..1_000u64,
        replicas in 0..8u8,
    ) {
        let result = BucketSettings::builder(BucketName::new("props").unwrap())
            .quota_mb(quota)
            .replicas(replicas)
            .build();

        let acceptable = quota >= MIN_QUOTA_MB && replicas <= MAX_REPLICAS;
        prop_assert_eq!(result.is_ok(), acceptable);
    }
}

#[cfg(test)]
mod version_tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        let mut versions: Vec<ServerVersion> = ["7.0.0", "4.5.1-1", "6.6.2-enterprise", "4.5.0"]
            .iter()
            .map(|raw| ServerVersion::parse(raw).unwrap())
            .collect();
        versions.sort();

        assert_eq!(versions.first(), Some(&ServerVersion::new(4, 5, 0)));
        assert_eq!(versions.last(), Some(&ServerVersion::new(7, 0, 0)));
    }
}
