mod outbox;
mod peer_link;

pub use outbox::Outbox;
pub use peer_link::{LinkPhase, PeerLink};
