use crate::error::StoreError;
use async_trait::async_trait;
use chalkcast_core::{MeetingId, ParticipantId, SignalBody, SignalRow};

/// The addressed signal mailbox: an append-only table of immutable rows,
/// queried by recipient with a lower-bound cursor. This is the only channel
/// the two negotiation sides share; delivery is "eventually observed by the
/// next poll" and nothing stronger.
#[async_trait]
pub trait SignalMailbox: Send + Sync {
    /// Append one signal. The store assigns `created_at`, strictly
    /// increasing per meeting.
    async fn publish(
        &self,
        meeting: &MeetingId,
        from: &ParticipantId,
        to: &ParticipantId,
        body: &SignalBody,
    ) -> Result<(), StoreError>;

    /// All rows addressed to `to`, strictly after `since`, ascending by
    /// `created_at`.
    async fn signals_for(
        &self,
        meeting: &MeetingId,
        to: &ParticipantId,
        since: i64,
    ) -> Result<Vec<SignalRow>, StoreError>;

    /// Same, additionally restricted to one sender. Used by the host, which
    /// keeps an independent cursor per peer.
    async fn signals_from(
        &self,
        meeting: &MeetingId,
        to: &ParticipantId,
        from: &ParticipantId,
        since: i64,
    ) -> Result<Vec<SignalRow>, StoreError>;

    /// Bulk delete for meeting teardown. Polls after a clear return an empty
    /// list, not an error.
    async fn clear(&self, meeting: &MeetingId) -> Result<(), StoreError>;
}
