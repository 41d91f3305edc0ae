//! Listener request queue
//!
//! Submission-ordered store of listener requests. A request is pending
//! until the processor stamps it processed; admins may delete any request.
//!
//! Storage sits behind [`RequestStore`] so a durable backend can replace
//! [`MemoryRequestStore`] without touching the processor or the API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use requestline_common::models::ListenerRequest;
use requestline_common::time;

/// Submission rejections
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Missing or malformed input (not retried)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A pending request for the track already exists (not retried)
    #[error("Track already requested: {0}")]
    Conflict(String),
}

/// Storage backend for listener requests
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert `request` unless a pending request for the same track exists
    ///
    /// The check and the insert must be atomic with respect to other inserts.
    async fn insert_unique(&self, request: ListenerRequest) -> Result<(), QueueError>;

    async fn get(&self, id: Uuid) -> Option<ListenerRequest>;

    /// Pending requests, oldest first
    async fn pending(&self) -> Vec<ListenerRequest>;

    /// Every request, oldest first
    async fn all(&self) -> Vec<ListenerRequest>;

    /// Stamp `processed_at`; no-op when already processed or unknown
    async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>);

    /// Remove a request regardless of state; `false` when unknown
    async fn remove(&self, id: Uuid) -> bool;
}

/// Process-memory request store
#[derive(Default)]
pub struct MemoryRequestStore {
    requests: RwLock<Vec<ListenerRequest>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn insert_unique(&self, request: ListenerRequest) -> Result<(), QueueError> {
        // Held across check and push
        let mut requests = self.requests.write().await;

        if requests
            .iter()
            .any(|r| r.is_pending() && r.track_guid == request.track_guid)
        {
            return Err(QueueError::Conflict(request.track_guid));
        }

        requests.push(request);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Option<ListenerRequest> {
        self.requests.read().await.iter().find(|r| r.id == id).cloned()
    }

    async fn pending(&self) -> Vec<ListenerRequest> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect()
    }

    async fn all(&self) -> Vec<ListenerRequest> {
        self.requests.read().await.clone()
    }

    async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>) {
        let mut requests = self.requests.write().await;
        if let Some(request) = requests.iter_mut().find(|r| r.id == id) {
            if request.processed_at.is_none() {
                request.processed_at = Some(at);
            }
        }
    }

    async fn remove(&self, id: Uuid) -> bool {
        let mut requests = self.requests.write().await;
        match requests.iter().position(|r| r.id == id) {
            Some(index) => {
                requests.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Listener submission as received from the API
#[derive(Debug, Clone, Default)]
pub struct NewRequest {
    pub track_guid: String,
    pub requested_by: String,
    pub message: Option<String>,
    pub ip_address: Option<String>,
}

/// Validating front of a [`RequestStore`]
#[derive(Clone)]
pub struct RequestQueue {
    store: Arc<dyn RequestStore>,
    max_message_length: usize,
}

impl RequestQueue {
    pub fn new(store: Arc<dyn RequestStore>, max_message_length: usize) -> Self {
        Self {
            store,
            max_message_length,
        }
    }

    /// In-memory queue
    pub fn in_memory(max_message_length: usize) -> Self {
        Self::new(Arc::new(MemoryRequestStore::new()), max_message_length)
    }

    pub fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    /// Validate and enqueue a listener request
    ///
    /// # Errors
    /// - `Validation` when track or requester is blank, or the message
    ///   exceeds the configured length
    /// - `Conflict` when the track already has a pending request
    pub async fn submit(&self, new: NewRequest) -> Result<Uuid, QueueError> {
        let track_guid = new.track_guid.trim();
        if track_guid.is_empty() {
            return Err(QueueError::Validation("trackGuid is required".to_string()));
        }

        let requested_by = new.requested_by.trim();
        if requested_by.is_empty() {
            return Err(QueueError::Validation("requestedBy is required".to_string()));
        }

        let message = new
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        if let Some(message) = &message {
            let length = message.chars().count();
            if length > self.max_message_length {
                return Err(QueueError::Validation(format!(
                    "Message is {} characters, maximum is {}",
                    length, self.max_message_length
                )));
            }
        }

        let request = ListenerRequest {
            id: Uuid::new_v4(),
            track_guid: track_guid.to_string(),
            requested_by: requested_by.to_string(),
            message,
            ip_address: new.ip_address,
            requested_at: time::now(),
            processed_at: None,
        };
        let id = request.id;

        self.store.insert_unique(request).await?;

        info!(
            request_id = %id,
            track_guid = %track_guid,
            requested_by = %requested_by,
            "Request queued"
        );
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Option<ListenerRequest> {
        self.store.get(id).await
    }

    /// Pending requests in submission order
    pub async fn list_pending(&self) -> Vec<ListenerRequest> {
        self.store.pending().await
    }

    /// All requests, processed included, in submission order
    pub async fn list_all(&self) -> Vec<ListenerRequest> {
        self.store.all().await
    }

    /// Idempotent: unknown or already-processed ids are ignored
    pub async fn mark_processed(&self, id: Uuid) {
        self.store.mark_processed(id, time::now()).await;
    }

    /// Admin delete; `false` when the id is unknown
    pub async fn delete(&self, id: Uuid) -> bool {
        let removed = self.store.remove(id).await;
        debug!(request_id = %id, removed, "Delete request");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_request(track: &str, by: &str, message: Option<&str>) -> NewRequest {
        NewRequest {
            track_guid: track.to_string(),
            requested_by: by.to_string(),
            message: message.map(str::to_string),
            ip_address: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_pending_track_conflicts() {
        let queue = RequestQueue::in_memory(150);

        queue.submit(new_request("T1", "Alice", None)).await.unwrap();
        let second = queue.submit(new_request("T1", "Bob", None)).await;

        assert_eq!(second, Err(QueueError::Conflict("T1".to_string())));
        assert_eq!(queue.list_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_different_tracks_queue_concurrently() {
        let queue = RequestQueue::in_memory(150);

        queue.submit(new_request("T1", "Alice", None)).await.unwrap();
        queue.submit(new_request("T2", "Alice", None)).await.unwrap();

        assert_eq!(queue.list_pending().await.len(), 2);
    }

    #[tokio::test]
    async fn test_track_requestable_again_after_processing() {
        let queue = RequestQueue::in_memory(150);
        let id = queue.submit(new_request("T1", "Alice", None)).await.unwrap();

        queue.mark_processed(id).await;

        assert!(queue.list_pending().await.is_empty());
        queue.submit(new_request("T1", "Bob", None)).await.unwrap();
        assert_eq!(queue.list_pending().await.len(), 1);
        assert_eq!(queue.list_all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_track_requestable_again_after_delete() {
        let queue = RequestQueue::in_memory(150);
        let id = queue.submit(new_request("T1", "Alice", None)).await.unwrap();

        assert!(queue.delete(id).await);

        queue.submit(new_request("T1", "Bob", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_message_length_boundary() {
        let queue = RequestQueue::in_memory(5);

        let at_limit = queue.submit(new_request("T1", "Alice", Some("abcde"))).await;
        assert!(at_limit.is_ok());

        let over = queue.submit(new_request("T2", "Alice", Some("abcdef"))).await;
        assert!(matches!(over, Err(QueueError::Validation(_))));
    }

    #[tokio::test]
    async fn test_message_length_counts_characters() {
        let queue = RequestQueue::in_memory(3);
        assert!(queue.submit(new_request("T1", "Alice", Some("héé"))).await.is_ok());
    }

    #[tokio::test]
    async fn test_required_fields() {
        let queue = RequestQueue::in_memory(150);

        let no_track = queue.submit(new_request("  ", "Alice", None)).await;
        assert!(matches!(no_track, Err(QueueError::Validation(_))));

        let no_name = queue.submit(new_request("T1", "", None)).await;
        assert!(matches!(no_name, Err(QueueError::Validation(_))));

        assert!(queue.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_stored_as_absent() {
        let queue = RequestQueue::in_memory(150);
        let id = queue.submit(new_request("T1", " Alice ", Some("   "))).await.unwrap();

        let stored = queue.get(id).await.unwrap();
        assert_eq!(stored.message, None);
        assert_eq!(stored.requested_by, "Alice");
    }

    #[tokio::test]
    async fn test_mark_processed_is_idempotent() {
        let queue = RequestQueue::in_memory(150);
        let id = queue.submit(new_request("T1", "Alice", None)).await.unwrap();

        queue.mark_processed(id).await;
        let first = queue.get(id).await.unwrap().processed_at;
        queue.mark_processed(id).await;
        queue.mark_processed(Uuid::new_v4()).await;

        assert!(first.is_some());
        assert_eq!(queue.get(id).await.unwrap().processed_at, first);
    }

    #[tokio::test]
    async fn test_delete_regardless_of_state_and_unknown_id() {
        let queue = RequestQueue::in_memory(150);
        let pending = queue.submit(new_request("T1", "Alice", None)).await.unwrap();
        let processed = queue.submit(new_request("T2", "Alice", None)).await.unwrap();
        queue.mark_processed(processed).await;

        assert!(!queue.delete(Uuid::new_v4()).await);
        assert_eq!(queue.list_all().await.len(), 2);

        assert!(queue.delete(processed).await);
        assert!(queue.delete(pending).await);
        assert!(queue.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_pending_keeps_submission_order() {
        let queue = RequestQueue::in_memory(150);
        let a = queue.submit(new_request("T1", "A", None)).await.unwrap();
        let b = queue.submit(new_request("T2", "B", None)).await.unwrap();
        let c = queue.submit(new_request("T3", "C", None)).await.unwrap();
        queue.mark_processed(b).await;

        let ids: Vec<Uuid> = queue.list_pending().await.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_for_same_track() {
        let queue = RequestQueue::in_memory(150);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    queue
                        .submit(new_request("T1", &format!("listener {}", i), None))
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(queue.list_pending().await.len(), 1);
    }
}
