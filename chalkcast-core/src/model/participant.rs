use crate::model::ids::ParticipantId;
use serde::{Deserialize, Serialize};

/// Silence period after which a presence record stops counting as "in the
/// call". Shared by every read path that decides membership, so host and
/// participant can never disagree on the roster.
pub const STALE_AFTER_MS: i64 = 10_000;

/// One row of the presence registry. Refreshed by the owning client's
/// heartbeat; the registry never auto-deletes, staleness is a read-time
/// filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub is_host: bool,
    pub is_camera_on: bool,
    pub is_mic_on: bool,
    /// Epoch milliseconds of the last heartbeat.
    pub last_seen: i64,
}

impl Participant {
    pub fn is_active(&self, now_ms: i64) -> bool {
        is_active(self.last_seen, now_ms)
    }
}

/// Strict staleness check: a record whose silence equals the window exactly
/// is already stale.
pub fn is_active(last_seen_ms: i64, now_ms: i64) -> bool {
    now_ms - last_seen_ms < STALE_AFTER_MS
}
