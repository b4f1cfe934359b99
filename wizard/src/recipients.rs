//! Debounced lookup for the recipient picker.

use crate::config::WizardConfig;
use crate::sequence::RequestSequence;
use std::sync::Arc;
use std::time::Duration;
use stockflow_protocol::UserRef;
use stockflow_store::RemoteStepStore;
use stockflow_store::StoreError;

/// Type-ahead search over users.
///
/// Each keystroke calls [`search`](Self::search). A call waits out the
/// debounce window and only reaches the server if no newer call arrived in
/// the meantime; a result that comes back after a newer call was made is
/// discarded as well.
pub struct RecipientSearch {
    store: Arc<dyn RemoteStepStore>,
    debounce: Duration,
    min_chars: usize,
    sequence: RequestSequence,
}

impl RecipientSearch {
    pub fn new(store: Arc<dyn RemoteStepStore>, debounce: Duration, min_chars: usize) -> Self {
        Self {
            store,
            debounce,
            min_chars: min_chars.max(1),
            sequence: RequestSequence::new(),
        }
    }

    pub fn from_config(store: Arc<dyn RemoteStepStore>, config: &WizardConfig) -> Self {
        Self::new(
            store,
            config.recipient_search_debounce(),
            config.recipient_search_min_chars,
        )
    }

    /// Options for `query`, or `None` when a newer query superseded it.
    ///
    /// Queries shorter than the minimum return no options without a request.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<UserRef>>, StoreError> {
        let ticket = self.sequence.next_seq();
        let query = query.trim();
        if query.chars().count() < self.min_chars {
            return Ok(Some(Vec::new()));
        }

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.sequence.is_latest(ticket) {
            tracing::trace!(query, "recipient search superseded before sending");
            return Ok(None);
        }

        let users = self.store.search_users(query).await?;
        if !self.sequence.is_latest(ticket) {
            tracing::trace!(query, "dropping stale recipient results");
            return Ok(None);
        }
        tracing::debug!(query, count = users.len(), "recipient options");
        Ok(Some(users))
    }
}
