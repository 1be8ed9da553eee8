use proptest::prelude::*;
use strata_core::{Version, VersionRange};

fn version() -> impl Strategy<Value = Version> {
    (0u64..4, 0u64..4, 0u64..4, prop::option::of("[a-z]{1,4}")).prop_map(
        |(major, minor, patch, label)| {
            let version = Version::new(major, minor, patch);
            match label {
                Some(label) => version.with_label(label),
                None => version,
            }
        },
    )
}

proptest! {
    #[test]
    fn ordering_is_total_and_antisymmetric(a in version(), b in version()) {
        let forward = a.cmp(&b);
        let backward = b.cmp(&a);
        prop_assert_eq!(forward, backward.reverse());
        prop_assert_eq!(forward == std::cmp::Ordering::Equal, a == b);
    }

    #[test]
    fn numeric_parts_dominate_labels(a in version(), b in version()) {
        let numeric = (a.major, a.minor, a.patch).cmp(&(b.major, b.minor, b.patch));
        if numeric != std::cmp::Ordering::Equal {
            prop_assert_eq!(a.cmp(&b), numeric);
        } else {
            prop_assert_eq!(a.cmp(&b), a.label.cmp(&b.label));
        }
    }

    #[test]
    fn display_parses_back(a in version()) {
        prop_assert_eq!(a.to_string().parse::<Version>().unwrap(), a);
    }

    #[test]
    fn containment_matches_bound_comparisons(
        lo in version(),
        hi in version(),
        candidate in version(),
        min_inclusive in any::<bool>(),
        max_inclusive in any::<bool>(),
    ) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let Ok(range) = VersionRange::new(lo.clone(), hi.clone(), min_inclusive, max_inclusive) else {
            // Only point ranges with an exclusive bound are rejected.
            prop_assert_eq!(&lo, &hi);
            return Ok(());
        };

        let above = if min_inclusive { candidate >= lo } else { candidate > lo };
        let below = if max_inclusive { candidate <= hi } else { candidate < hi };
        prop_assert_eq!(range.contains(&candidate), above && below);
    }
}
