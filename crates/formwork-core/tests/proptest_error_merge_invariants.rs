//! Property-based invariant tests for error-map merging.
//!
//! 1. The merged key set is the union of both key sets.
//! 2. On a shared key the right-hand entry wins.
//! 3. Merging a map into itself is a no-op.
//! 4. Merging the empty map is a no-op on either side.

use formwork_core::{ErrorValue, ValidationErrors};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn error_value_strategy() -> impl Strategy<Value = ErrorValue> {
    prop_oneof![
        Just(ErrorValue::Flag),
        "[a-z ]{0,12}".prop_map(ErrorValue::Message),
        (0usize..64, 0usize..64)
            .prop_map(|(required, actual)| ErrorValue::Length { required, actual }),
    ]
}

fn errors_strategy() -> impl Strategy<Value = ValidationErrors> {
    prop::collection::vec(("[a-e]", error_value_strategy()), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Key union
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn merged_keys_are_union(a in errors_strategy(), b in errors_strategy()) {
        let merged = a.clone().merged(b.clone());
        for key in a.keys().chain(b.keys()) {
            prop_assert!(merged.contains(key), "missing {key}");
        }
        prop_assert!(merged.keys().all(|k| a.contains(k) || b.contains(k)));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Last writer wins
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn right_hand_side_wins(a in errors_strategy(), b in errors_strategy()) {
        let merged = a.clone().merged(b.clone());
        for (key, value) in &b {
            prop_assert_eq!(merged.get(key), Some(value));
        }
        for (key, value) in &a {
            if !b.contains(key) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3–4. Identities
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn self_merge_is_identity(a in errors_strategy()) {
        prop_assert_eq!(a.clone().merged(a.clone()), a);
    }

    #[test]
    fn empty_merge_is_identity(a in errors_strategy()) {
        prop_assert_eq!(a.clone().merged(ValidationErrors::new()), a.clone());
        prop_assert_eq!(ValidationErrors::new().merged(a.clone()), a);
    }
}
