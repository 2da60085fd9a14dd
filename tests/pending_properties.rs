//! Property tests for the pending-call registry.

use std::collections::BTreeSet;

use futures::FutureExt;
use proptest::prelude::*;
use serde_json::json;
use wirebridge::{CallError, PendingCalls, pending::Resolution};

fn id_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z0-9]{1,8}", 1..16).prop_map(|ids| ids.into_iter().collect())
}

proptest! {
    #[test]
    fn each_call_receives_its_own_result(ids in id_set(), seed in any::<u64>()) {
        let registry = PendingCalls::new();
        let calls: Vec<_> = ids
            .iter()
            .map(|id| registry.register(id.as_str()).expect("unique id"))
            .collect();
        prop_assert_eq!(registry.len(), ids.len());

        // Resolve in a rotated order so delivery does not follow registration.
        let offset = usize::try_from(seed % ids.len() as u64).expect("offset fits");
        for (n, id) in ids.iter().cycle().skip(offset).take(ids.len()).enumerate() {
            let resolution = if n % 2 == 0 {
                registry.resolve_success(id, json!(id))
            } else {
                registry.resolve_error(id, format!("err-{id}"))
            };
            prop_assert_eq!(resolution, Resolution::Delivered);
        }
        prop_assert!(registry.is_empty());

        for (id, call) in ids.iter().zip(calls) {
            match call.now_or_never().expect("resolved call is ready") {
                Ok(value) => prop_assert_eq!(value, json!(id)),
                Err(CallError::Remote(msg)) => prop_assert_eq!(msg, format!("err-{id}")),
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn second_resolution_is_unknown(id in "[a-z]{1,6}", value in any::<i64>()) {
        let registry = PendingCalls::new();
        let _call = registry.register(id.as_str()).expect("register");
        prop_assert_eq!(registry.resolve_success(&id, json!(value)), Resolution::Delivered);
        prop_assert_eq!(registry.resolve_success(&id, json!(value)), Resolution::Unknown);
        prop_assert_eq!(registry.resolve_error(&id, "late".to_owned()), Resolution::Unknown);
    }

    #[test]
    fn dropped_calls_leave_no_entries(ids in id_set(), keep in any::<u16>()) {
        let registry = PendingCalls::new();
        let mut kept = BTreeSet::new();
        let mut held = Vec::new();
        for (n, id) in ids.iter().enumerate() {
            let call = registry.register(id.as_str()).expect("unique id");
            if (keep >> (n % 16)) & 1 == 1 {
                kept.insert(id.clone());
                held.push(call);
            }
        }
        let remaining: BTreeSet<String> = registry.ids().into_iter().collect();
        prop_assert_eq!(remaining, kept);
        drop(held);
        prop_assert!(registry.is_empty());
    }
}
