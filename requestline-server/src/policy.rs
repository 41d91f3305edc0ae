//! Request eligibility policy
//!
//! Consulted by the processor before a request is committed to a slot.
//! Rules such as per-track cooldowns or blocklists plug in here.

use async_trait::async_trait;

use crate::matcher::RequestSlot;

#[async_trait]
pub trait RequestPolicy: Send + Sync {
    /// Whether `track_guid` may be placed into `slot`
    async fn can_request_track(&self, track_guid: &str, slot: &RequestSlot) -> bool;
}

/// Accepts every pairing
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl RequestPolicy for AllowAll {
    async fn can_request_track(&self, _track_guid: &str, _slot: &RequestSlot) -> bool {
        true
    }
}
