mod error;
pub mod focus;
pub mod link;
pub mod session;
pub mod store;
pub mod transport;

pub use error::StoreError;
pub use focus::{DistractionBoard, FocusSummary, FocusTally};
pub use link::{LinkPhase, Outbox, PeerLink};
pub use session::{
    HostSession, LocalProfile, ParticipantEvent, ParticipantHandle, ParticipantSession,
    SessionCommand, SessionConfig, SessionHandle,
};
pub use store::{MeetingLifecycle, PresenceRegistry, SignalMailbox};
pub use transport::{
    ConnectionWrapper, LinkState, MediaTransport, RtcTransportFactory, TransportConfig,
    TransportEvent, TransportFactory,
};
