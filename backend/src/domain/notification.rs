use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use shared::{GuestContact, PresenceStatus};

/// Best-effort delivery failure. Never surfaced to the caller that triggered
/// the status change.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Outbound notification channel. The shipped implementation logs the
/// message; a real SMS/push integration plugs in here.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, contact: &GuestContact, message: &str) -> Result<(), DeliveryError>;
}

/// Notifier that writes the message to the log. Placeholder until a real
/// delivery integration is wired in.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, contact: &GuestContact, message: &str) -> Result<(), DeliveryError> {
        info!(
            "Notification sent to {} {}: {}",
            contact.kind(),
            contact.value(),
            message
        );
        Ok(())
    }
}

/// Event emitted for every presence transition.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub guest_id: String,
    pub child_name: String,
    pub guest_name: String,
    pub new_status: PresenceStatus,
    pub contact: GuestContact,
}

impl NotificationEvent {
    fn message(&self) -> String {
        format!(
            "Guest {} of {} is now checked {}",
            self.guest_name, self.child_name, self.new_status
        )
    }
}

/// Asynchronous dispatch queue decoupling status changes from delivery.
///
/// Enqueueing never blocks and never fails the caller. The worker attempts
/// one redelivery per event; after that the failure is logged and the event
/// dropped.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl NotificationQueue {
    /// Spawn the delivery worker and return its sending half.
    pub fn start(notifier: Arc<dyn Notifier>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<NotificationEvent>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let message = event.message();
                if let Err(e) = notifier.notify(&event.contact, &message).await {
                    warn!("Delivery failed for guest {}: {}, retrying", event.guest_id, e);
                    if let Err(e) = notifier.notify(&event.contact, &message).await {
                        warn!(
                            "Redelivery failed for guest {}: {}, dropping event",
                            event.guest_id, e
                        );
                    }
                }
            }
        });

        Self { tx }
    }

    /// Hand an event to the worker. Fire-and-forget.
    pub fn enqueue(&self, event: NotificationEvent) {
        if self.tx.send(event).is_err() {
            warn!("Notification worker is gone, dropping event");
        }
    }
}
