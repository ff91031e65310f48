//! # Domain Layer
//!
//! Business logic for accounts, presence tracking and history. Services are
//! cheap to clone and hold their repositories directly; every operation takes
//! the calling user's id explicitly rather than reading any ambient session
//! state.

pub mod account_service;
pub mod errors;
pub mod history_service;
pub mod notification;
pub mod presence_service;

pub use account_service::AccountService;
pub use errors::ServiceError;
pub use history_service::{HistoryFilter, HistoryService};
pub use notification::{LogNotifier, NotificationQueue, Notifier};
pub use presence_service::PresenceService;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, used for entity id generation.
pub(crate) fn epoch_millis() -> Result<u64, ServiceError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(anyhow::Error::from)?;
    Ok(elapsed.as_millis() as u64)
}
