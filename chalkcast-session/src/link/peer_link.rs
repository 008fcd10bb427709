use crate::link::outbox::Outbox;
use crate::transport::MediaTransport;
use chalkcast_core::{IceCandidate, ParticipantId, SignalBody};
use std::sync::Arc;
use tracing::{debug, warn};
use webrtc::track::track_local::TrackLocal;

/// Negotiation phase of one peer link. `Failed` and `Closed` are terminal;
/// every other transition is one-way and guarded, which is what makes
/// replayed or stale mailbox rows harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    Idle,
    OfferSent,
    Connected,
    Failed,
    Closed,
}

impl LinkPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, LinkPhase::Failed | LinkPhase::Closed)
    }
}

/// One negotiation state machine, owned exclusively by the session that
/// created it. All mutation happens on the owner's task, so transitions for
/// a given peer are strictly sequential.
pub struct PeerLink {
    peer_id: ParticipantId,
    phase: LinkPhase,
    /// A remote description may be applied exactly once per link; replayed
    /// offers and answers bounce off this flag.
    remote_described: bool,
    /// Mailbox read cursor for rows from this peer. Lives and dies with the
    /// link: a rejoining peer starts negotiation from scratch.
    cursor: i64,
    transport: Arc<dyn MediaTransport>,
}

impl PeerLink {
    pub fn new(peer_id: ParticipantId, transport: Arc<dyn MediaTransport>) -> Self {
        Self {
            peer_id,
            phase: LinkPhase::Idle,
            remote_described: false,
            cursor: 0,
            transport,
        }
    }

    pub fn peer_id(&self) -> &ParticipantId {
        &self.peer_id
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Advance the read cursor to a row timestamp we have observed. Applied
    /// for every row in a batch, including rows that get filtered out, so a
    /// batch is never reprocessed. Never moves backwards.
    pub fn advance_cursor(&mut self, created_at: i64) {
        if created_at > self.cursor {
            self.cursor = created_at;
        }
    }

    /// Host side: produce and mail an offer. Only valid from `Idle`; a link
    /// that already offered ignores the call, so re-evaluating the presence
    /// list can never double-offer.
    pub async fn create_offer(&mut self, outbox: &Outbox) {
        if self.phase != LinkPhase::Idle {
            debug!("Skipping duplicate offer to {} in {:?}", self.peer_id, self.phase);
            return;
        }

        match self.transport.create_offer().await {
            Ok(sdp) => {
                outbox.send(&self.peer_id, SignalBody::Offer { sdp }).await;
                self.phase = LinkPhase::OfferSent;
            }
            Err(e) => warn!("Failed to create offer for {}: {:?}", self.peer_id, e),
        }
    }

    /// Host side: apply the peer's answer. Valid only once, from
    /// `OfferSent`; a replayed answer row is a no-op.
    pub async fn apply_answer(&mut self, sdp: String) {
        if self.phase != LinkPhase::OfferSent || self.remote_described {
            debug!("Ignoring stale answer from {}", self.peer_id);
            return;
        }

        match self.transport.accept_answer(sdp).await {
            Ok(()) => {
                self.remote_described = true;
                self.phase = LinkPhase::Connected;
            }
            Err(e) => warn!("Failed to apply answer from {}: {:?}", self.peer_id, e),
        }
    }

    /// Participant side: apply the host's offer and mail back an answer.
    /// Valid only once, from `Idle`.
    pub async fn apply_offer(&mut self, sdp: String, outbox: &Outbox) {
        if self.phase != LinkPhase::Idle || self.remote_described {
            debug!("Ignoring repeated offer from {}", self.peer_id);
            return;
        }

        match self.transport.answer_offer(sdp).await {
            Ok(answer_sdp) => {
                self.remote_described = true;
                self.phase = LinkPhase::Connected;
                outbox
                    .send(&self.peer_id, SignalBody::Answer { sdp: answer_sdp })
                    .await;
            }
            Err(e) => warn!("Failed to answer offer from {}: {:?}", self.peer_id, e),
        }
    }

    /// Remote candidates are only meaningful once a remote description
    /// exists; earlier arrivals are dropped without error and without
    /// advancing negotiation state.
    pub async fn apply_candidate(&mut self, candidate: IceCandidate) {
        if !self.remote_described || self.phase.is_terminal() {
            debug!("Dropping early ICE candidate from {}", self.peer_id);
            return;
        }

        if let Err(e) = self.transport.add_remote_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {:?}", self.peer_id, e);
        }
    }

    /// Mail a locally gathered candidate to the peer. Allowed in any state
    /// prior to `Closed`.
    pub async fn send_local_candidate(&self, candidate: IceCandidate, outbox: &Outbox) {
        if self.phase == LinkPhase::Closed {
            return;
        }
        outbox
            .send(&self.peer_id, SignalBody::Ice(candidate))
            .await;
    }

    /// Swap an outgoing track in place, no renegotiation. No-op on terminal
    /// links and when no sender of the track's kind is attached.
    pub async fn replace_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) {
        if self.phase.is_terminal() {
            return;
        }
        if let Err(e) = self.transport.replace_local_track(track).await {
            warn!("Failed to replace track for {}: {:?}", self.peer_id, e);
        }
    }

    pub fn mark_failed(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = LinkPhase::Failed;
        }
    }

    /// Release the transport. Idempotent; reachable from exactly three
    /// teardown paths (presence loss, session shutdown, meeting end).
    pub async fn close(&mut self) {
        if self.phase == LinkPhase::Closed {
            return;
        }
        if let Err(e) = self.transport.close().await {
            warn!("Error closing transport for {}: {:?}", self.peer_id, e);
        }
        self.phase = LinkPhase::Closed;
    }
}
