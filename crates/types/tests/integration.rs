//! Integration tests for types

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::cmp::Ordering;
    use zi_types::*;

    fn version_text() -> impl Strategy<Value = String> {
        let dotted = prop::collection::vec(0u64..20, 1..4).prop_map(|numbers| {
            numbers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".")
        });
        let modifier = prop_oneof![Just("pre"), Just("rc"), Just(""), Just("post")];
        let suffix = (modifier, prop::option::of(0u64..5)).prop_map(|(word, number)| {
            match number {
                Some(n) => format!("-{word}{n}"),
                None if word.is_empty() => "-0".to_string(),
                None => format!("-{word}"),
            }
        });
        (dotted, prop::collection::vec(suffix, 0..3))
            .prop_map(|(head, suffixes)| format!("{head}{}", suffixes.concat()))
    }

    proptest! {
        #[test]
        fn test_version_order_is_antisymmetric(a in version_text(), b in version_text()) {
            let va = Version::parse(&a).unwrap();
            let vb = Version::parse(&b).unwrap();
            prop_assert_eq!(va.cmp(&vb), vb.cmp(&va).reverse());
            prop_assert_eq!(va.cmp(&vb) == Ordering::Equal, va == vb);
        }

        #[test]
        fn test_version_order_is_transitive(
            a in version_text(),
            b in version_text(),
            c in version_text(),
        ) {
            let mut versions = [
                Version::parse(&a).unwrap(),
                Version::parse(&b).unwrap(),
                Version::parse(&c).unwrap(),
            ];
            versions.sort();
            prop_assert!(versions[0] <= versions[1]);
            prop_assert!(versions[1] <= versions[2]);
            prop_assert!(versions[0] <= versions[2]);
        }

        #[test]
        fn test_version_display_reparses(text in version_text()) {
            let version = Version::parse(&text).unwrap();
            let reparsed = Version::parse(&version.to_string()).unwrap();
            prop_assert_eq!(reparsed, version);
        }

        #[test]
        fn test_range_contains_matches_in_range(
            low in version_text(),
            probe in version_text(),
        ) {
            let min = Version::parse(&low).unwrap();
            let candidate = Version::parse(&probe).unwrap();
            let range = VersionRange::at_least(min.clone());
            prop_assert_eq!(range.contains(&candidate), candidate >= min);
        }
    }

    #[test]
    fn test_implementation_round_trip_through_json() {
        let implementation = Implementation::new("sha256=abc", Version::parse("2.1").unwrap())
            .with_stability(Stability::Packaged)
            .with_arch("Linux-x86_64".parse().unwrap())
            .with_size(1024)
            .requires(
                Dependency::recommended("http://example.com/lib")
                    .with_range("1.0..".parse().unwrap()),
            )
            .with_command(
                "run",
                Command::new("bin/tool").with_runner(Dependency::essential(
                    "http://example.com/python",
                )),
            )
            .conflicts_with("http://example.com/old-tool");

        let json = serde_json::to_string(&implementation).unwrap();
        let back: Implementation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, implementation);
        assert_eq!(back.conflicts[0].as_str(), "http://example.com/old-tool");
    }

    #[test]
    fn test_default_policy() {
        let policy = Policy::default();
        assert_eq!(policy.stability_threshold, Stability::Stable);
        assert_eq!(policy.network_use, NetworkUse::Full);
        assert!(!policy.prefer_cached);
        assert!(policy.architecture.permits(&Arch::any()));
    }
}
