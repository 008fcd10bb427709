use std::sync::Arc;
use webrtc::track::track_local::TrackLocal;

/// Commands a running session accepts from the embedding application.
pub enum SessionCommand {
    /// Swap an outgoing media track of the same kind on every live link,
    /// without renegotiation.
    ReplaceTrack(Arc<dyn TrackLocal + Send + Sync>),

    /// Change the camera/mic flags carried by subsequent heartbeats.
    UpdateMedia { camera_on: bool, mic_on: bool },

    /// Leave the meeting: close every link, delete own presence, stop.
    Leave,

    /// Host only: mark the meeting ended and purge its mailbox, then leave.
    EndMeeting,
}
