//! Cross-context signals: overlay writes made by another context and focus
//! regained by this one.
//!
//! A listener is a [`SignalSubscription`]. Dropping it deregisters the
//! listener, so whoever owns the subscription cannot leak it on any exit path.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, warn};

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Identifies one console context (a tab, in browser terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub fn next() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSignal {
    /// A storage slot was written by `source`.
    StorageChanged { key: String, source: ContextId },
    /// `context` came back to the foreground.
    FocusRegained { context: ContextId },
}

/// What a listener reacts to after filtering out signals that are not its own
/// business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTrigger {
    StorageChanged { source: ContextId },
    FocusRegained,
    /// The listener fell behind and dropped signals; treat as stale.
    Lagged(u64),
}

/// Broadcast channel shared by every context that opens the same storage.
#[derive(Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<ContextSignal>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl SignalBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, signal: ContextSignal) {
        debug!(?signal, "Publishing context signal");
        // No listeners is a normal state.
        let _ = self.sender.send(signal);
    }

    /// Registers a listener for `context` interested in writes to `key`.
    pub fn subscribe(&self, context: ContextId, key: impl Into<String>) -> SignalSubscription {
        let key = key.into();
        debug!(%context, key = %key, "Signal listener registered");
        SignalSubscription {
            receiver: self.sender.subscribe(),
            context,
            key,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub struct SignalSubscription {
    receiver: broadcast::Receiver<ContextSignal>,
    context: ContextId,
    key: String,
}

impl SignalSubscription {
    /// Waits for the next signal relevant to this listener. `None` once the
    /// bus is gone.
    pub async fn recv(&mut self) -> Option<SyncTrigger> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => {
                    if let Some(trigger) = self.relevant(signal) {
                        return Some(trigger);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(context = %self.context, skipped, "Signal listener lagged");
                    return Some(SyncTrigger::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn relevant(&self, signal: ContextSignal) -> Option<SyncTrigger> {
        match signal {
            // A context never reacts to its own writes.
            ContextSignal::StorageChanged { key, source } if key == self.key && source != self.context => {
                Some(SyncTrigger::StorageChanged { source })
            }
            ContextSignal::FocusRegained { context } if context == self.context => {
                Some(SyncTrigger::FocusRegained)
            }
            _ => None,
        }
    }
}

impl Drop for SignalSubscription {
    fn drop(&mut self) {
        debug!(context = %self.context, key = %self.key, "Signal listener deregistered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_ignores_own_writes_and_other_keys() {
        let bus = SignalBus::default();
        let me = ContextId::next();
        let other = ContextId::next();
        let mut subscription = bus.subscribe(me, "createdUsers");

        bus.publish(ContextSignal::StorageChanged { key: "createdUsers".into(), source: me });
        bus.publish(ContextSignal::StorageChanged { key: "token".into(), source: other });
        bus.publish(ContextSignal::FocusRegained { context: other });
        bus.publish(ContextSignal::StorageChanged { key: "createdUsers".into(), source: other });

        assert_eq!(
            subscription.recv().await,
            Some(SyncTrigger::StorageChanged { source: other })
        );
    }

    #[tokio::test]
    async fn focus_is_delivered_to_its_context() {
        let bus = SignalBus::default();
        let me = ContextId::next();
        let mut subscription = bus.subscribe(me, "createdUsers");

        bus.publish(ContextSignal::FocusRegained { context: me });

        assert_eq!(subscription.recv().await, Some(SyncTrigger::FocusRegained));
    }

    #[test]
    fn dropping_a_subscription_deregisters_it() {
        let bus = SignalBus::default();
        let subscription = bus.subscribe(ContextId::next(), "createdUsers");
        assert_eq!(bus.listener_count(), 1);
        drop(subscription);
        assert_eq!(bus.listener_count(), 0);
    }
}
