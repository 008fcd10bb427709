use crate::link::{Outbox, PeerLink};
use crate::session::command::SessionCommand;
use crate::session::config::{LocalProfile, SessionConfig};
use crate::session::host::SessionHandle;
use crate::store::{MeetingLifecycle, PresenceRegistry, SignalMailbox};
use crate::transport::{LinkState, MediaTransport, TransportEvent, TransportFactory};
use chalkcast_core::{MeetingId, ParticipantId, SignalBody, now_ms};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use webrtc::track::track_remote::TrackRemote;

/// Out-of-band notifications for the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantEvent {
    /// The host ended the meeting; the session has already torn itself
    /// down.
    MeetingEnded,
}

/// Handle to a running participant session, with the observable surface the
/// UI renders from: the coarse link state (for a "reconnecting" treatment
/// while no stream is up) and the host's media track once one arrives.
pub struct ParticipantHandle {
    session: SessionHandle,
    pub link_state: watch::Receiver<LinkState>,
    pub host_track: watch::Receiver<Option<Arc<TrackRemote>>>,
    pub events: mpsc::UnboundedReceiver<ParticipantEvent>,
}

impl ParticipantHandle {
    pub async fn update_media(&self, camera_on: bool, mic_on: bool) {
        self.session.update_media(camera_on, mic_on).await;
    }

    pub async fn leave(self) {
        self.session.leave().await;
    }
}

/// The spoke side of the star: exactly one negotiation state machine aimed
/// at the (initially unknown) host. A participant never initiates; it
/// heartbeats, polls its mailbox, and answers the offer the host mails it.
pub struct ParticipantSession {
    cfg: SessionConfig,
    meeting: MeetingId,
    profile: LocalProfile,
    /// Bound to the sender of the first observed offer and immutable from
    /// then on, so a second host row appearing mid-session changes nothing.
    host_id: Option<ParticipantId>,
    transport: Arc<dyn MediaTransport>,
    link: Option<PeerLink>,
    /// Session-held mailbox cursor. Unlike the host's per-link cursors it
    /// survives link resets: old rows stay consumed, and a host re-offer is
    /// always a newer row.
    cursor: i64,
    outbox: Outbox,
    mailbox: Arc<dyn SignalMailbox>,
    presence: Arc<dyn PresenceRegistry>,
    lifecycle: Arc<dyn MeetingLifecycle>,
    factory: Arc<dyn TransportFactory>,
    command_rx: mpsc::Receiver<SessionCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    link_state_tx: watch::Sender<LinkState>,
    host_track_tx: watch::Sender<Option<Arc<TrackRemote>>>,
    events_tx: mpsc::UnboundedSender<ParticipantEvent>,
}

impl ParticipantSession {
    pub async fn spawn(
        cfg: SessionConfig,
        meeting: MeetingId,
        profile: LocalProfile,
        mailbox: Arc<dyn SignalMailbox>,
        presence: Arc<dyn PresenceRegistry>,
        lifecycle: Arc<dyn MeetingLifecycle>,
        factory: Arc<dyn TransportFactory>,
    ) -> anyhow::Result<ParticipantHandle> {
        let (cmd_tx, command_rx) = mpsc::channel(100);
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (link_state_tx, link_state) = watch::channel(LinkState::Connecting);
        let (host_track_tx, host_track) = watch::channel(None);
        let (events_tx, events) = mpsc::unbounded_channel();

        // There is only one link, so the peer tag on transport events is
        // never consulted; the own id keeps logs readable.
        let transport = factory
            .create(profile.id.clone(), transport_tx.clone())
            .await?;

        let session = Self {
            outbox: Outbox::new(mailbox.clone(), meeting.clone(), profile.id.clone()),
            cfg,
            meeting,
            profile,
            host_id: None,
            transport,
            link: None,
            cursor: 0,
            mailbox,
            presence,
            lifecycle,
            factory,
            command_rx,
            transport_rx,
            transport_tx,
            link_state_tx,
            host_track_tx,
            events_tx,
        };

        let task = tokio::spawn(session.run());
        Ok(ParticipantHandle {
            session: SessionHandle::new(cmd_tx, task),
            link_state,
            host_track,
            events,
        })
    }

    async fn run(mut self) {
        info!(
            "Participant session started for {} in meeting {}",
            self.profile.id, self.meeting
        );

        let mut poll = tokio::time::interval(self.cfg.poll_interval);
        let mut heartbeat = tokio::time::interval(self.cfg.heartbeat_interval);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::UpdateMedia { camera_on, mic_on }) => {
                            self.profile.camera_on = camera_on;
                            self.profile.mic_on = mic_on;
                        }
                        Some(SessionCommand::ReplaceTrack(_)) => {
                            warn!("Participants do not send media; ignoring ReplaceTrack");
                        }
                        Some(SessionCommand::EndMeeting) => {
                            warn!("Only the host can end the meeting; ignoring");
                        }
                        Some(SessionCommand::Leave) | None => break,
                    }
                }

                evt = self.transport_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_transport_event(e).await;
                    }
                }

                _ = poll.tick() => {
                    if self.poll().await {
                        let _ = self.events_tx.send(ParticipantEvent::MeetingEnded);
                        break;
                    }
                }

                _ = heartbeat.tick() => {
                    self.heartbeat().await;
                }
            }
        }

        self.teardown().await;
        info!("Participant session stopped for {}", self.profile.id);
    }

    /// One poll cycle. Returns true when the meeting has ended and the
    /// session should stop.
    async fn poll(&mut self) -> bool {
        match self.lifecycle.status(&self.meeting).await {
            Ok(status) if status.ended => {
                info!("Meeting {} ended by the host", self.meeting);
                return true;
            }
            Ok(_) => {}
            Err(e) => error!("Status poll failed: {}", e),
        }

        let rows = match self
            .mailbox
            .signals_for(&self.meeting, &self.profile.id, self.cursor)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("Mailbox poll failed: {}", e);
                return false;
            }
        };

        for row in rows {
            // Cursor moves for every observed row, including ones filtered
            // out below, so nothing is delivered twice.
            if row.created_at > self.cursor {
                self.cursor = row.created_at;
            }

            if let Some(host) = &self.host_id {
                if &row.from_id != host {
                    debug!("Ignoring signal from non-host {}", row.from_id);
                    continue;
                }
            }

            match row.decode() {
                Ok(SignalBody::Offer { sdp }) => self.accept_offer(row.from_id, sdp).await,
                Ok(SignalBody::Ice(candidate)) => {
                    match self.link.as_mut() {
                        Some(link) => link.apply_candidate(candidate).await,
                        // No offer seen yet; the candidate is useless and
                        // the protocol never resends it to us directly.
                        None => debug!("Dropping ICE candidate before any offer"),
                    }
                }
                Ok(SignalBody::Answer { .. }) => {
                    warn!("Ignoring answer addressed to a participant");
                }
                Err(e) => warn!("Skipping malformed signal: {}", e),
            }
        }

        false
    }

    /// First offer wins the host binding; the link's own guards make any
    /// replayed offer a no-op.
    async fn accept_offer(&mut self, from: ParticipantId, sdp: String) {
        if self.host_id.is_none() {
            info!("Binding host to {}", from);
            self.host_id = Some(from.clone());
        }

        if self.link.is_none() {
            self.link = Some(PeerLink::new(from, self.transport.clone()));
        }

        if let Some(link) = self.link.as_mut() {
            link.apply_offer(sdp, &self.outbox).await;
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateReady(_, candidate) => {
                // Candidates are only gathered once a description is set,
                // which implies the host is bound and the link exists.
                if let Some(link) = self.link.as_ref() {
                    link.send_local_candidate(candidate, &self.outbox).await;
                }
            }

            TransportEvent::StateChanged(_, LinkState::Failed) => {
                warn!("Host link failed; resetting negotiation");
                self.reset_link().await;
            }

            TransportEvent::StateChanged(_, state) => {
                self.link_state_tx.send_replace(state);
            }

            TransportEvent::RemoteTrack(_, track) => {
                info!("Receiving host {} track", track.kind());
                self.host_track_tx.send_replace(Some(track));
            }
        }
    }

    /// Terminal transport failure: discard negotiation progress so a fresh
    /// offer from the host can be accepted. The session never re-requests a
    /// stream itself; the host's own roster cycle notices the dead link
    /// and re-offers.
    async fn reset_link(&mut self) {
        self.link_state_tx.send_replace(LinkState::Failed);
        self.host_track_tx.send_replace(None);

        if let Some(mut link) = self.link.take() {
            link.close().await;
        }

        match self
            .factory
            .create(self.profile.id.clone(), self.transport_tx.clone())
            .await
        {
            Ok(t) => self.transport = t,
            Err(e) => error!("Failed to rebuild transport: {:?}", e),
        }
    }

    async fn heartbeat(&self) {
        let record = self.profile.presence_record(false, now_ms());
        if let Err(e) = self.presence.heartbeat(&self.meeting, &record).await {
            error!("Heartbeat failed: {}", e);
        }
    }

    async fn teardown(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close().await;
        } else if let Err(e) = self.transport.close().await {
            warn!("Error closing transport: {:?}", e);
        }

        if let Err(e) = self
            .presence
            .remove(&self.meeting, &self.profile.id)
            .await
        {
            error!("Failed to remove own presence: {}", e);
        }
    }
}
