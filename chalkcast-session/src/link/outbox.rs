use crate::store::SignalMailbox;
use chalkcast_core::{MeetingId, ParticipantId, SignalBody};
use std::sync::Arc;
use tracing::error;

/// Sending half of the mailbox, bound to one meeting and one local
/// identity. Writes are fire-and-forget: a failed insert is logged and the
/// caller's state machine is left untouched, because the peer's next poll
/// cycle tolerates the gap.
#[derive(Clone)]
pub struct Outbox {
    mailbox: Arc<dyn SignalMailbox>,
    meeting: MeetingId,
    self_id: ParticipantId,
}

impl Outbox {
    pub fn new(mailbox: Arc<dyn SignalMailbox>, meeting: MeetingId, self_id: ParticipantId) -> Self {
        Self {
            mailbox,
            meeting,
            self_id,
        }
    }

    pub async fn send(&self, to: &ParticipantId, body: SignalBody) {
        if let Err(e) = self
            .mailbox
            .publish(&self.meeting, &self.self_id, to, &body)
            .await
        {
            error!("Failed to publish signal to {}: {}", to, e);
        }
    }
}
