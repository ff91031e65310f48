use chrono::NaiveDate;
use tracing::info;

use crate::domain::errors::ServiceError;
use crate::storage::TransitionRepository;
use shared::HistoryRecord;

/// Optional conjunctive filters for the history view.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Child name, matched case-insensitively
    pub child: Option<String>,
    /// Calendar day (YYYY-MM-DD) the transition timestamp must fall on
    pub date: Option<String>,
}

/// Read-only view over the presence transition log, across all of a user's
/// children.
#[derive(Clone)]
pub struct HistoryService {
    transitions: TransitionRepository,
}

impl HistoryService {
    pub fn new(transitions: TransitionRepository) -> Self {
        Self { transitions }
    }

    /// Build the filtered, time-ordered history for a user. Most recent
    /// first; ordering within equal timestamps is deterministic (log order).
    pub async fn build_history(
        &self,
        user_id: &str,
        filter: HistoryFilter,
    ) -> Result<Vec<HistoryRecord>, ServiceError> {
        if let Some(date) = &filter.date {
            NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                ServiceError::Validation("Date filter must be in YYYY-MM-DD format".to_string())
            })?;
        }

        let mut records = self.transitions.list_history(user_id).await?;

        if let Some(child) = &filter.child {
            let wanted = child.to_lowercase();
            records.retain(|r| r.child_name.to_lowercase() == wanted);
        }
        if let Some(date) = &filter.date {
            // Timestamps are RFC 3339, so the calendar day is the prefix
            records.retain(|r| r.timestamp.starts_with(date.as_str()));
        }

        info!("Built history for user {}: {} records", user_id, records.len());

        Ok(records)
    }
}
