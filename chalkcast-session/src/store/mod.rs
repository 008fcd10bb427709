mod lifecycle;
mod mailbox;
mod presence;

pub use lifecycle::MeetingLifecycle;
pub use mailbox::SignalMailbox;
pub use presence::PresenceRegistry;
