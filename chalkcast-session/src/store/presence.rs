use crate::error::StoreError;
use async_trait::async_trait;
use chalkcast_core::{MeetingId, Participant, ParticipantId};

/// Upsert-by-key registry of per-meeting presence rows. One row per
/// `(meeting, participant)`; the store stamps `last_seen` on every
/// heartbeat. Rows are removed explicitly on graceful leave; an ungraceful
/// disconnect just stops refreshing and falls out of `active` reads.
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    async fn heartbeat(
        &self,
        meeting: &MeetingId,
        record: &Participant,
    ) -> Result<(), StoreError>;

    /// Rows within the staleness window, filtered with the shared
    /// `chalkcast_core::is_active` helper.
    async fn active(&self, meeting: &MeetingId) -> Result<Vec<Participant>, StoreError>;

    async fn remove(&self, meeting: &MeetingId, id: &ParticipantId) -> Result<(), StoreError>;
}
