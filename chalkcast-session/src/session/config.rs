use chalkcast_core::{Participant, ParticipantId};
use std::time::Duration;

/// Timing knobs of a session. Poll intervals are deliberately coarse; they
/// bound worst-case negotiation latency but keep the store traffic low.
/// Heartbeats run on their own period, decoupled from polling.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(2),
        }
    }
}

/// The local client's identity and media flags, as advertised through the
/// presence registry.
#[derive(Debug, Clone)]
pub struct LocalProfile {
    pub id: ParticipantId,
    pub name: String,
    pub camera_on: bool,
    pub mic_on: bool,
}

impl LocalProfile {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            camera_on: true,
            mic_on: true,
        }
    }

    pub(crate) fn presence_record(&self, is_host: bool, now_ms: i64) -> Participant {
        Participant {
            id: self.id.clone(),
            name: self.name.clone(),
            is_host,
            is_camera_on: self.camera_on,
            is_mic_on: self.mic_on,
            last_seen: now_ms,
        }
    }
}
