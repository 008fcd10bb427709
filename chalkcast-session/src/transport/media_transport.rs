use crate::transport::transport_event::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use chalkcast_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;

/// Capability surface required from the media layer: create and apply
/// session descriptions, exchange ICE candidates, manage outgoing tracks.
/// Sessions only ever talk to this trait, so tests substitute a fake and
/// exercise the negotiation guards without a network stack.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Produce a local offer and install it as the local description.
    async fn create_offer(&self) -> Result<String>;

    /// Apply a remote offer, synthesize an answer and install it as the
    /// local description. Returns the answer SDP.
    async fn answer_offer(&self, offer_sdp: String) -> Result<String>;

    /// Apply the remote answer to a previously created offer.
    async fn accept_answer(&self, answer_sdp: String) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn add_local_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()>;

    /// Swap the outgoing track of the same kind in place, without
    /// renegotiation. No-op when no sender of that kind is attached.
    async fn replace_local_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds one transport per remote peer, wired to the owning session's
/// event channel.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>>;
}
