//! Lock-free in-process view of the latest rendered values.
//!
//! The artifact files are the consumer-facing contract, but a process
//! embedding the daemon should not have to re-read its own output from disk.
//! `LocalView` keeps the most recent rendered document per handler behind an
//! `arc-swap`, updated after each successful write — an explicit shared read
//! accessor instead of ambient global state.

use crate::registry::HandlerKind;
use arc_swap::ArcSwap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared, lock-free snapshot of the latest rendered configuration values.
///
/// Reads never block; publishes swap the whole map atomically, so a reader
/// holding a snapshot is never affected by a concurrent update.
///
/// # Examples
///
/// ```rust
/// use confmirror::registry::HandlerKind;
/// use confmirror::view::LocalView;
///
/// let view = LocalView::new();
/// view.publish(HandlerKind::AllowList, serde_json::json!({"allow_list": {"u1": true}}));
///
/// let allow = view.get(HandlerKind::AllowList).unwrap();
/// assert_eq!(allow["allow_list"]["u1"], true);
/// ```
#[derive(Clone)]
pub struct LocalView {
    current: Arc<ArcSwap<HashMap<HandlerKind, Arc<Value>>>>,
}

impl LocalView {
    /// Create an empty view; entries appear after the first successful
    /// handling cycle per path.
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(HashMap::new())),
        }
    }

    /// Latest rendered document for `handler`, if any cycle has succeeded.
    pub fn get(&self, handler: HandlerKind) -> Option<Arc<Value>> {
        self.current.load().get(&handler).cloned()
    }

    /// Publish a newly rendered document for `handler`.
    ///
    /// Each handler has exactly one publisher (its watch task), but tasks for
    /// *different* handlers publish concurrently, so the map is replaced via
    /// a compare-and-swap loop rather than a plain load/store — a racing
    /// publish retries on top of the other's result instead of dropping it.
    pub fn publish(&self, handler: HandlerKind, value: Value) {
        let value = Arc::new(value);
        self.current.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(handler, Arc::clone(&value));
            next
        });
    }
}

impl Default for LocalView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_until_first_publish() {
        let view = LocalView::new();
        assert!(view.get(HandlerKind::AllowList).is_none());
    }

    #[test]
    fn publish_replaces_previous_value() {
        let view = LocalView::new();
        view.publish(HandlerKind::DenyList, json!({"deny_list": {"a": true}}));
        view.publish(
            HandlerKind::DenyList,
            json!({"deny_list": {"a": true, "b": true}}),
        );

        let deny = view.get(HandlerKind::DenyList).unwrap();
        assert_eq!(deny["deny_list"]["b"], true);
    }

    #[test]
    fn handlers_are_independent() {
        let view = LocalView::new();
        view.publish(HandlerKind::AllowList, json!({"allow_list": {}}));
        assert!(view.get(HandlerKind::AllowList).is_some());
        assert!(view.get(HandlerKind::DenyList).is_none());
    }

    #[test]
    fn clones_share_state() {
        let view = LocalView::new();
        let view2 = view.clone();
        view.publish(HandlerKind::AllowList, json!({"allow_list": {}}));
        assert!(view2.get(HandlerKind::AllowList).is_some());
    }

    #[test]
    fn concurrent_publishes_for_different_handlers_both_land() {
        // Handling cycles for different paths run concurrently; neither
        // handler's publish may overwrite the other's.
        for _ in 0..500 {
            let view = LocalView::new();
            let allow_view = view.clone();
            let deny_view = view.clone();

            let allow = std::thread::spawn(move || {
                allow_view.publish(HandlerKind::AllowList, json!({"allow_list": {"u1": true}}));
            });
            let deny = std::thread::spawn(move || {
                deny_view.publish(HandlerKind::DenyList, json!({"deny_list": {"d1": true}}));
            });
            allow.join().unwrap();
            deny.join().unwrap();

            assert!(view.get(HandlerKind::AllowList).is_some());
            assert!(view.get(HandlerKind::DenyList).is_some());
        }
    }

    #[test]
    fn snapshot_survives_concurrent_publish() {
        let view = LocalView::new();
        view.publish(HandlerKind::AllowList, json!({"allow_list": {"old": true}}));

        let snapshot = view.get(HandlerKind::AllowList).unwrap();
        view.publish(HandlerKind::AllowList, json!({"allow_list": {"new": true}}));

        // The held snapshot still reads the old document.
        assert_eq!(snapshot["allow_list"]["old"], true);
    }
}
