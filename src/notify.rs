use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

/// A user-facing outcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }
}

/// Fire-and-forget fan-out of notifications to whoever is displaying them.
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(32)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn notify(&self, notification: Notification) {
        debug!(kind = ?notification.kind, message = %notification.message, "Notification");
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_without_listeners_is_fine() {
        let notifier = Notifier::default();
        notifier.notify(Notification::success("nobody hears this"));

        let mut rx = notifier.subscribe();
        notifier.notify(Notification::error("boom"));
        assert_eq!(rx.recv().await.unwrap(), Notification::error("boom"));
    }

    #[test]
    fn serializes_kind_as_type() {
        let json = serde_json::to_value(Notification::success("ok")).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["message"], "ok");
        assert_eq!(serde_json::to_value(Notification::info("hi")).unwrap()["type"], "info");
        assert_eq!(
            serde_json::to_value(Notification::warning("careful")).unwrap()["type"],
            "warning"
        );
    }
}
