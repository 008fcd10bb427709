mod focus;
mod ids;
mod meeting;
mod participant;
mod signal;

pub use focus::{FocusSample, FocusStatus};
pub use ids::{MeetingId, ParticipantId};
pub use meeting::MeetingStatus;
pub use participant::{Participant, STALE_AFTER_MS, is_active};
pub use signal::{IceCandidate, SignalBody, SignalRow};
