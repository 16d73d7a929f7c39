//! Property tests for accessor derivation

use acl_client::accessor_from_name;
use proptest::prelude::*;

proptest! {
    #[test]
    fn derivation_is_deterministic(name in ".{0,64}") {
        prop_assert_eq!(accessor_from_name(&name), accessor_from_name(&name));
    }

    #[test]
    fn distinct_names_get_distinct_accessors(a in "[a-z0-9-]{1,32}", b in "[a-z0-9-]{1,32}") {
        prop_assume!(a != b);
        prop_assert_ne!(accessor_from_name(&a), accessor_from_name(&b));
    }

    #[test]
    fn accessors_are_version_5(name in "\\PC{1,32}") {
        prop_assert_eq!(accessor_from_name(&name).get_version_num(), 5);
    }
}
