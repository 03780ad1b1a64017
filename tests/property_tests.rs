//! Property-based tests for the property transforms.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated property maps and rule sets.

use proptest::prelude::*;

use gitstamp::core::filter::PropertyFilter;
use gitstamp::core::stabilize::{is_volatile, stabilize};
use gitstamp::core::types::{Fingerprint, PropertyMap};

/// Strategy for property keys in the shape extractors produce.
fn property_key() -> impl Strategy<Value = String> {
    let segment = "[a-z]{1,8}";
    (
        prop_oneof![Just("git"), Just("stamp"), Just("other")],
        prop::collection::vec(segment, 1..4),
        prop::bool::weighted(0.2),
    )
        .prop_map(|(prefix, segments, build_time)| {
            let mut key = format!("{}.{}", prefix, segments.join("."));
            if build_time {
                key.push_str(".build.time");
            }
            key
        })
}

/// Strategy for property maps.
fn property_map() -> impl Strategy<Value = PropertyMap> {
    prop::collection::btree_map(property_key(), "[ -~]{0,20}", 0..20)
        .prop_map(PropertyMap::from)
}

/// Strategy for rules that always compile.
fn rule() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,4}".prop_map(|s| s),
        "[a-z]{1,4}".prop_map(|s| format!("^git\\.{}", s)),
        "[a-z]{1,4}".prop_map(|s| format!("{}.*", s)),
        Just("build\\.time$".to_string()),
    ]
}

fn rules() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(rule(), 0..4)
}

proptest! {
    #[test]
    fn filter_is_idempotent(props in property_map(), include in rules(), exclude in rules()) {
        let filter = PropertyFilter::new(&include, &exclude).unwrap();
        let once = filter.apply(props);
        let twice = filter.apply(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filter_only_removes(props in property_map(), include in rules(), exclude in rules()) {
        let filter = PropertyFilter::new(&include, &exclude).unwrap();
        let out = filter.apply(props.clone());
        for (key, value) in out.iter() {
            prop_assert_eq!(props.get(key), Some(value));
        }
    }

    #[test]
    fn exclude_wins(props in property_map(), rules in rules()) {
        // The same rules as both include and exclude leave nothing.
        let filter = PropertyFilter::new(&rules, &rules).unwrap();
        let out = filter.apply(props);
        if !rules.is_empty() {
            prop_assert!(out.is_empty());
        }
    }

    #[test]
    fn empty_rules_keep_everything(props in property_map()) {
        let filter = PropertyFilter::default();
        prop_assert_eq!(filter.apply(props.clone()), props);
    }

    #[test]
    fn stabilize_preserves_keys(props in property_map(), prefix in prop_oneof![Just(""), Just("git"), Just("stamp")]) {
        let out = stabilize(props.clone(), prefix);
        prop_assert_eq!(out.len(), props.len());
        prop_assert!(out.keys().eq(props.keys()));
        for (key, value) in out.iter() {
            if is_volatile(key, prefix) {
                prop_assert_eq!(value, "");
            } else {
                prop_assert_eq!(props.get(key), Some(value));
            }
        }
    }

    #[test]
    fn stabilize_is_idempotent(props in property_map()) {
        let once = stabilize(props, "git");
        prop_assert_eq!(stabilize(once.clone(), "git"), once);
    }

    #[test]
    fn fingerprint_deterministic(props in property_map()) {
        let mut entries: Vec<(&str, &str)> = props.iter().collect();
        entries.reverse();
        let rebuilt: PropertyMap = entries.into_iter().collect();
        prop_assert_eq!(Fingerprint::compute(&props), Fingerprint::compute(&rebuilt));
    }

    #[test]
    fn fingerprint_ignores_build_time(props in property_map(), a in "[0-9:]{1,8}", b in "[0-9:]{1,8}") {
        let mut first = props.clone();
        first.insert("git.build.time", a);
        let mut second = props;
        second.insert("git.build.time", b);

        prop_assert_eq!(
            Fingerprint::compute(&stabilize(first, "git")),
            Fingerprint::compute(&stabilize(second, "git"))
        );
    }
}
