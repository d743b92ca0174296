use pairsync_fs::{NormalizedPath, pair_key};
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalized_paths_never_contain_backslashes(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));
        prop_assert_eq!(NormalizedPath::new(path.to_native()), path);
    }

    #[test]
    fn pair_key_is_symmetric(
        a in "/[a-z]{1,12}/[a-z]{1,12}\\.md",
        b in "/[a-z]{1,12}/[a-z]{1,12}\\.md",
    ) {
        let a = NormalizedPath::new(&a);
        let b = NormalizedPath::new(&b);
        prop_assert_eq!(pair_key(&a, &b), pair_key(&b, &a));
    }
}
