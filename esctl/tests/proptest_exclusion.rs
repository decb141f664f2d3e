//! Property tests for drain and fill.
//!
//! Drain and fill must be idempotent, and filling a freshly drained node must
//! restore the previous exclusion list exactly.

mod common;

use common::FakeRemote;
use esctl::exclusion::EXCLUDE_NAME_KEY;
use esctl::ExclusionCoordinator;
use proptest::prelude::*;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn node_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}"
}

/// Distinct node names, in a stable order
fn node_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(node_name(), 0..8).prop_map(|set| set.into_iter().collect())
}

fn remote_with(names: &[String]) -> Arc<FakeRemote> {
    if names.is_empty() {
        Arc::new(FakeRemote::new())
    } else {
        Arc::new(FakeRemote::new().with_persistent(EXCLUDE_NAME_KEY, &names.join(",")))
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn drain_is_idempotent(names in node_list(), node in node_name()) {
        runtime().block_on(async {
            let remote = remote_with(&names);
            let coord = ExclusionCoordinator::new(remote.clone());

            let once = coord.drain(&node).await.unwrap();
            let twice = coord.drain(&node).await.unwrap();

            assert_eq!(once.excluded, twice.excluded);
            assert!(!twice.changed);
            assert_eq!(once.excluded.iter().filter(|n| **n == node).count(), 1);
        });
    }

    #[test]
    fn fill_is_idempotent(names in node_list(), node in node_name()) {
        runtime().block_on(async {
            let remote = remote_with(&names);
            let coord = ExclusionCoordinator::new(remote.clone());

            let once = coord.fill(&node).await.unwrap();
            let twice = coord.fill(&node).await.unwrap();

            assert_eq!(once.excluded, twice.excluded);
            assert!(!twice.changed);
            assert!(!once.excluded.contains(&node));
        });
    }

    #[test]
    fn fill_undoes_drain_on_clean_state(names in node_list(), node in node_name()) {
        prop_assume!(!names.contains(&node));

        runtime().block_on(async {
            let remote = remote_with(&names);
            let coord = ExclusionCoordinator::new(remote.clone());

            coord.drain(&node).await.unwrap();
            let restored = coord.fill(&node).await.unwrap();

            assert_eq!(restored.excluded, names);
            assert_eq!(coord.exclusion_set().await.unwrap().by_name, names);
        });
    }

    #[test]
    fn fill_all_empties_persistent_exclusions(names in node_list()) {
        runtime().block_on(async {
            let remote = remote_with(&names);
            let coord = ExclusionCoordinator::new(remote.clone());

            let remaining = coord.fill_all().await.unwrap();
            assert!(remaining.is_empty());
        });
    }
}
