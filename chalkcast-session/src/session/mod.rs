mod command;
mod config;
mod host;
mod participant;

pub use command::SessionCommand;
pub use config::{LocalProfile, SessionConfig};
pub use host::{HostSession, SessionHandle};
pub use participant::{ParticipantEvent, ParticipantHandle, ParticipantSession};
