use crate::transport::media_transport::{MediaTransport, TransportFactory};
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::{LinkState, TransportEvent};
use anyhow::Result;
use async_trait::async_trait;
use chalkcast_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// `webrtc`-rs backed implementation of the media capability. One instance
/// per remote peer; every push-style callback is converted into a
/// `TransportEvent` on the owning session's channel.
pub struct ConnectionWrapper {
    pub peer_id: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl ConnectionWrapper {
    pub async fn new(
        peer_id: ParticipantId,
        config: TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: config.ice_servers,
                credential: String::new(),
                username: String::new(),
            }],
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // Callbacks must be 'static, so each one gets its own clone of the
        // event sender and the peer id.

        let state_tx = event_tx.clone();
        let uid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", uid, s);
                    let mapped = match s {
                        RTCPeerConnectionState::Connecting => Some(LinkState::Connecting),
                        RTCPeerConnectionState::Connected => Some(LinkState::Connected),
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Disconnected => {
                            Some(LinkState::Failed)
                        }
                        RTCPeerConnectionState::Closed => Some(LinkState::Closed),
                        _ => None,
                    };
                    if let Some(state) = mapped {
                        let _ = tx.send(TransportEvent::StateChanged(uid, state)).await;
                    }
                })
            },
        ));

        // Trickle ICE: every gathered local candidate goes out through the
        // mailbox, addressed to this peer.
        let ice_tx = event_tx.clone();
        let uid_ice = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx.send(TransportEvent::CandidateReady(uid, candidate)).await;
            })
        }));

        let track_tx = event_tx.clone();
        let uid_track = peer_id.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _rx: Arc<RTCRtpReceiver>, _tr: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();

                Box::pin(async move {
                    info!("Remote track from {}: {}", uid, track.kind());
                    let _ = tx.send(TransportEvent::RemoteTrack(uid, track)).await;
                })
            },
        ));

        Ok(Self {
            peer_id,
            peer_connection,
        })
    }
}

#[async_trait]
impl MediaTransport for ConnectionWrapper {
    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn answer_offer(&self, offer_sdp: String) -> Result<String> {
        let offer = RTCSessionDescription::offer(offer_sdp)?;
        self.peer_connection.set_remote_description(offer).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn accept_answer(&self, answer_sdp: String) -> Result<()> {
        let answer = RTCSessionDescription::answer(answer_sdp)?;
        self.peer_connection.set_remote_description(answer).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn add_local_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()> {
        self.peer_connection.add_track(track).await?;
        Ok(())
    }

    async fn replace_local_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()> {
        for sender in self.peer_connection.get_senders().await {
            let Some(current) = sender.track().await else {
                continue;
            };
            if current.kind() == track.kind() {
                sender.replace_track(Some(track)).await?;
                return Ok(());
            }
        }
        // No sender of that kind is attached; nothing to swap.
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Production factory: one `ConnectionWrapper` per peer, all sharing the
/// session's ICE server configuration.
pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        peer_id: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>> {
        let wrapper = ConnectionWrapper::new(peer_id, self.config.clone(), events).await?;
        Ok(Arc::new(wrapper))
    }
}
