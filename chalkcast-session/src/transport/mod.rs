mod connection_wrapper;
mod media_transport;
mod transport_config;
mod transport_event;

pub use connection_wrapper::{ConnectionWrapper, RtcTransportFactory};
pub use media_transport::{MediaTransport, TransportFactory};
pub use transport_config::TransportConfig;
pub use transport_event::{LinkState, TransportEvent};
