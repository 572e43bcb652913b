//! Per-publisher subscription table.

use tokio::sync::RwLock;

/// One (subscriber, event, callback) triple. Duplicates collapse to one
/// entry (§3 Subscription invariant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Address of the subscribing agent, in whatever form `Host::send`
    /// accepts (a bare agent id for local subscribers).
    pub subscriber_url: String,
    /// Event name this subscription matches. The literal `"*"` matches
    /// every event triggered on the publisher.
    pub event: String,
    /// Method invoked on the subscriber when a matching event fires.
    pub callback_method: String,
}

impl Subscription {
    /// Returns `true` if this subscription matches `event`, honoring the
    /// `"*"` wildcard.
    #[must_use]
    pub fn matches(&self, event: &str) -> bool {
        self.event == "*" || self.event == event
    }
}

/// The subscription table belonging to a single publisher agent.
#[derive(Default)]
pub struct SubscriptionTable {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl SubscriptionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `subscription`, deduplicating on the full triple.
    pub async fn subscribe(&self, subscription: Subscription) {
        let mut guard = self.subscriptions.write().await;
        if !guard.contains(&subscription) {
            guard.push(subscription);
        }
    }

    /// Removes `subscription` if present. Idempotent.
    pub async fn unsubscribe(&self, subscription: &Subscription) {
        self.subscriptions.write().await.retain(|existing| existing != subscription);
    }

    /// Returns every subscription matching `event`.
    pub async fn matching(&self, event: &str) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .await
            .iter()
            .filter(|subscription| subscription.matches(event))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(url: &str, event: &str) -> Subscription {
        Subscription {
            subscriber_url: url.to_owned(),
            event: event.to_owned(),
            callback_method: "onEvent".to_owned(),
        }
    }

    #[tokio::test]
    async fn duplicate_subscriptions_collapse() {
        let table = SubscriptionTable::new();
        table.subscribe(sub("s1", "ping")).await;
        table.subscribe(sub("s1", "ping")).await;
        assert_eq!(table.matching("ping").await.len(), 1);
    }

    #[tokio::test]
    async fn wildcard_matches_any_event() {
        let table = SubscriptionTable::new();
        table.subscribe(sub("s1", "*")).await;
        assert_eq!(table.matching("anything").await.len(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let table = SubscriptionTable::new();
        let entry = sub("s1", "ping");
        table.subscribe(entry.clone()).await;
        table.unsubscribe(&entry).await;
        table.unsubscribe(&entry).await;
        assert!(table.matching("ping").await.is_empty());
    }
}
