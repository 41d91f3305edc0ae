//! Request processor
//!
//! One cycle: scan the playout log for open slots, walk pending requests
//! oldest first, and give each the first remaining slot its policy
//! accepts. Matching is greedy and one-to-one; requests left without a
//! slot stay pending for the next cycle.
//!
//! # Commit
//!
//! A commit is two independent upstream writes with no transaction:
//! 1. bind the requested track to the slot's track item
//! 2. overwrite the break note with the audit text
//!
//! If (1) fails the request stays pending. If (1) succeeds and (2) fails
//! the track is already scheduled, so the request is marked processed and
//! the audit note is queued for retry on later cycles. Nothing is rolled
//! back.
//!
//! Until its audit note lands, a booked break note still reads REQUEST
//! upstream and scans as an open slot. Such slots are withheld from
//! pairing: while the note is owed, and after it is abandoned for as long
//! as the break note stays in the scan window.

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use requestline_common::models::ListenerRequest;

use crate::matcher::{RequestSlot, SlotMatcher};
use crate::playout::{GatewayError, PlayoutLog};
use crate::policy::RequestPolicy;
use crate::queue::RequestQueue;

/// Break note duration written with the audit text
pub const AUDIT_NOTE_DURATION: &str = "00:00";

/// Attempts made for an audit note before it is dropped
pub const MAX_AUDIT_NOTE_ATTEMPTS: u32 = 5;

/// Cycle-level failure
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Slot discovery failed; every request stays pending
    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] GatewayError),
}

/// Result of committing one request to one slot
#[derive(Debug)]
pub enum CommitOutcome {
    /// Both writes succeeded
    Committed,
    /// Track written, audit note failed
    PartialCommit(GatewayError),
    /// Track write failed; nothing changed upstream as far as we know
    Failed(GatewayError),
}

/// Audit note still owed to a break note after a partial commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuditNote {
    pub request_id: Uuid,
    pub break_note_item_guid: String,
    pub text: String,
    pub attempts: u32,
}

/// Counters from one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Slots offered for pairing this cycle
    pub open_slots: usize,
    /// Scanned slots held back because their audit note never landed
    pub withheld_slots: usize,
    pub pending: usize,
    pub committed: usize,
    pub partial: usize,
    pub failed: usize,
    pub unmatched: usize,
    pub audit_notes_retried: usize,
    /// Another cycle was still running; this one did nothing
    pub skipped_busy: bool,
}

pub struct RequestProcessor {
    queue: RequestQueue,
    matcher: SlotMatcher,
    playout_log: Arc<dyn PlayoutLog>,
    policy: Arc<dyn RequestPolicy>,
    busy: Mutex<()>,
    audit_backlog: Mutex<Vec<PendingAuditNote>>,
    /// Break notes whose audit note was given up on
    abandoned_notes: Mutex<HashSet<String>>,
}

impl RequestProcessor {
    pub fn new(
        queue: RequestQueue,
        matcher: SlotMatcher,
        playout_log: Arc<dyn PlayoutLog>,
        policy: Arc<dyn RequestPolicy>,
    ) -> Self {
        Self {
            queue,
            matcher,
            playout_log,
            policy,
            busy: Mutex::new(()),
            audit_backlog: Mutex::new(Vec::new()),
            abandoned_notes: Mutex::new(HashSet::new()),
        }
    }

    /// Audit notes waiting for a retry
    pub async fn pending_audit_notes(&self) -> Vec<PendingAuditNote> {
        self.audit_backlog.lock().await.clone()
    }

    /// Run one processing cycle
    ///
    /// Returns immediately with `skipped_busy` if a cycle is in flight.
    pub async fn run_cycle(&self) -> Result<CycleReport, ProcessError> {
        let Ok(_running) = self.busy.try_lock() else {
            debug!("Previous request cycle still running, skipping tick");
            return Ok(CycleReport {
                skipped_busy: true,
                ..CycleReport::default()
            });
        };

        let mut report = CycleReport {
            audit_notes_retried: self.retry_audit_notes().await,
            ..CycleReport::default()
        };

        let scanned = self.matcher.find_open_slots().await?;
        let scanned_count = scanned.len();
        let mut slots = self.withhold_booked_slots(scanned).await;
        let pending = self.queue.list_pending().await;

        report.open_slots = slots.len();
        report.withheld_slots = scanned_count - slots.len();
        report.pending = pending.len();
        debug!(
            open_slots = report.open_slots,
            pending = report.pending,
            "Request cycle started"
        );

        for request in pending {
            let Some(index) = self.first_eligible_slot(&request, &slots).await else {
                report.unmatched += 1;
                debug!(request_id = %request.id, track_guid = %request.track_guid, "No open slot for request");
                continue;
            };

            // Consumed whatever the outcome: the upstream state of a failed write is unknown
            let slot = slots.remove(index);

            match self.commit(&request, &slot).await {
                CommitOutcome::Committed => report.committed += 1,
                CommitOutcome::PartialCommit(_) => report.partial += 1,
                CommitOutcome::Failed(_) => report.failed += 1,
            }
        }

        if report.committed + report.partial + report.failed > 0 {
            info!(
                committed = report.committed,
                partial = report.partial,
                failed = report.failed,
                unmatched = report.unmatched,
                "Request cycle finished"
            );
        }

        Ok(report)
    }

    async fn first_eligible_slot(
        &self,
        request: &ListenerRequest,
        slots: &[RequestSlot],
    ) -> Option<usize> {
        for (index, slot) in slots.iter().enumerate() {
            if self.policy.can_request_track(&request.track_guid, slot).await {
                return Some(index);
            }
        }
        None
    }

    /// Drop slots whose break note still carries a booking without its note
    async fn withhold_booked_slots(&self, slots: Vec<RequestSlot>) -> Vec<RequestSlot> {
        let backlog = self.audit_backlog.lock().await;
        let mut abandoned = self.abandoned_notes.lock().await;

        // Aired break notes leave the window and need no tracking
        abandoned.retain(|guid| slots.iter().any(|s| &s.break_note_item_guid == guid));

        slots
            .into_iter()
            .filter(|slot| {
                let owed = backlog
                    .iter()
                    .any(|note| note.break_note_item_guid == slot.break_note_item_guid);
                let held = owed || abandoned.contains(&slot.break_note_item_guid);
                if held {
                    debug!(
                        break_note = %slot.break_note_item_guid,
                        track_item = %slot.track_item_guid,
                        "Slot already booked, audit note missing"
                    );
                }
                !held
            })
            .collect()
    }

    /// Write track then audit note, and settle the request's state
    async fn commit(&self, request: &ListenerRequest, slot: &RequestSlot) -> CommitOutcome {
        if let Err(e) = self
            .playout_log
            .set_track_for_item(&slot.track_item_guid, &request.track_guid)
            .await
        {
            warn!(
                request_id = %request.id,
                track_item = %slot.track_item_guid,
                error = %e,
                "Track write failed, request stays pending"
            );
            return CommitOutcome::Failed(e);
        }

        let text = request.audit_note();
        let note_result = self
            .playout_log
            .set_break_note_for_item(&slot.break_note_item_guid, AUDIT_NOTE_DURATION, &text)
            .await;

        self.queue.mark_processed(request.id).await;

        match note_result {
            Ok(()) => {
                info!(
                    request_id = %request.id,
                    track_guid = %request.track_guid,
                    track_item = %slot.track_item_guid,
                    break_note = %slot.break_note_item_guid,
                    "Request scheduled"
                );
                CommitOutcome::Committed
            }
            Err(e) => {
                error!(
                    request_id = %request.id,
                    track_guid = %request.track_guid,
                    track_item = %slot.track_item_guid,
                    break_note = %slot.break_note_item_guid,
                    error = %e,
                    "Partial commit: track scheduled but audit note not written; will retry note"
                );
                if e.is_retryable() {
                    self.audit_backlog.lock().await.push(PendingAuditNote {
                        request_id: request.id,
                        break_note_item_guid: slot.break_note_item_guid.clone(),
                        text,
                        attempts: 1,
                    });
                } else {
                    self.abandon_note(&slot.break_note_item_guid).await;
                }
                CommitOutcome::PartialCommit(e)
            }
        }
    }

    /// Retry owed audit notes; returns how many were written
    async fn retry_audit_notes(&self) -> usize {
        let owed = std::mem::take(&mut *self.audit_backlog.lock().await);
        if owed.is_empty() {
            return 0;
        }

        let mut written = 0;
        let mut still_owed = Vec::new();

        for mut note in owed {
            match self
                .playout_log
                .set_break_note_for_item(&note.break_note_item_guid, AUDIT_NOTE_DURATION, &note.text)
                .await
            {
                Ok(()) => {
                    info!(request_id = %note.request_id, "Audit note written on retry");
                    written += 1;
                }
                Err(e) => {
                    note.attempts += 1;
                    if note.attempts >= MAX_AUDIT_NOTE_ATTEMPTS || !e.is_retryable() {
                        error!(
                            request_id = %note.request_id,
                            break_note = %note.break_note_item_guid,
                            attempts = note.attempts,
                            error = %e,
                            "Giving up on audit note"
                        );
                        self.abandon_note(&note.break_note_item_guid).await;
                    } else {
                        still_owed.push(note);
                    }
                }
            }
        }

        self.audit_backlog.lock().await.extend(still_owed);
        written
    }

    async fn abandon_note(&self, break_note_item_guid: &str) {
        self.abandoned_notes
            .lock()
            .await
            .insert(break_note_item_guid.to_string());
    }
}
