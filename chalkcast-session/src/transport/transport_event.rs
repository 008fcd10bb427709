use chalkcast_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Coarse connection state surfaced to the owning session. `Failed` and
/// `Closed` are terminal for the one link that reported them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Failed,
    Closed,
}

/// Push-style transport callbacks, funneled into the owning session's event
/// channel so all per-peer mutation stays on one task.
pub enum TransportEvent {
    /// A new local ICE candidate was gathered and should be mailed to the
    /// remote peer.
    CandidateReady(ParticipantId, IceCandidate),

    /// The underlying connection changed state.
    StateChanged(ParticipantId, LinkState),

    /// The remote side started sending a media track (participant side
    /// only; the host never receives media).
    RemoteTrack(ParticipantId, Arc<TrackRemote>),
}
