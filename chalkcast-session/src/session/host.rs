use crate::link::{Outbox, PeerLink};
use crate::session::command::SessionCommand;
use crate::session::config::{LocalProfile, SessionConfig};
use crate::store::{MeetingLifecycle, PresenceRegistry, SignalMailbox};
use crate::transport::{LinkState, TransportEvent, TransportFactory};
use chalkcast_core::{MeetingId, ParticipantId, SignalBody, now_ms};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use webrtc::track::track_local::TrackLocal;

/// Handle to a running session. Dropping the handle does not stop the
/// session; `leave` (or `end_meeting` for a host) does, and resolves only
/// after every owned transport is closed and every timer is gone.
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<SessionCommand>, task: JoinHandle<()>) -> Self {
        Self { cmd_tx, task }
    }

    pub async fn replace_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) {
        let _ = self.cmd_tx.send(SessionCommand::ReplaceTrack(track)).await;
    }

    pub async fn update_media(&self, camera_on: bool, mic_on: bool) {
        let _ = self
            .cmd_tx
            .send(SessionCommand::UpdateMedia { camera_on, mic_on })
            .await;
    }

    pub async fn leave(self) {
        let _ = self.cmd_tx.send(SessionCommand::Leave).await;
        let _ = self.task.await;
    }

    /// Host only: end the meeting for everyone, then stop.
    pub async fn end_meeting(self) {
        let _ = self.cmd_tx.send(SessionCommand::EndMeeting).await;
        let _ = self.task.await;
    }
}

/// The hub of the star: maintains exactly one `PeerLink` per currently
/// active non-host participant, multiplexing the host's local tracks to all
/// of them. One actor per meeting; every per-peer mutation runs on its
/// task, interleaving the poll timer, the heartbeat timer, transport events
/// and application commands.
pub struct HostSession {
    cfg: SessionConfig,
    meeting: MeetingId,
    profile: LocalProfile,
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
    links: HashMap<ParticipantId, PeerLink>,
    outbox: Outbox,
    mailbox: Arc<dyn SignalMailbox>,
    presence: Arc<dyn PresenceRegistry>,
    lifecycle: Arc<dyn MeetingLifecycle>,
    factory: Arc<dyn TransportFactory>,
    command_rx: mpsc::Receiver<SessionCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
}

impl HostSession {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        cfg: SessionConfig,
        meeting: MeetingId,
        profile: LocalProfile,
        tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
        mailbox: Arc<dyn SignalMailbox>,
        presence: Arc<dyn PresenceRegistry>,
        lifecycle: Arc<dyn MeetingLifecycle>,
        factory: Arc<dyn TransportFactory>,
    ) -> SessionHandle {
        let (cmd_tx, command_rx) = mpsc::channel(100);
        let (transport_tx, transport_rx) = mpsc::channel(256);

        let session = Self {
            outbox: Outbox::new(mailbox.clone(), meeting.clone(), profile.id.clone()),
            cfg,
            meeting,
            profile,
            tracks,
            links: HashMap::new(),
            mailbox,
            presence,
            lifecycle,
            factory,
            command_rx,
            transport_rx,
            transport_tx,
        };

        let task = tokio::spawn(session.run());
        SessionHandle::new(cmd_tx, task)
    }

    async fn run(mut self) {
        info!("Host session started for meeting {}", self.meeting);

        let mut poll = tokio::time::interval(self.cfg.poll_interval);
        let mut heartbeat = tokio::time::interval(self.cfg.heartbeat_interval);
        let mut end_meeting = false;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::ReplaceTrack(track)) => self.replace_track(track).await,
                        Some(SessionCommand::UpdateMedia { camera_on, mic_on }) => {
                            self.profile.camera_on = camera_on;
                            self.profile.mic_on = mic_on;
                        }
                        Some(SessionCommand::Leave) => break,
                        Some(SessionCommand::EndMeeting) => {
                            end_meeting = true;
                            break;
                        }
                        None => {
                            info!("Command channel closed. Shutting down host session.");
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_transport_event(e).await;
                    }
                }

                _ = poll.tick() => {
                    self.sync_roster().await;
                    self.poll_mailbox().await;
                }

                _ = heartbeat.tick() => {
                    self.heartbeat().await;
                }
            }
        }

        self.teardown(end_meeting).await;
        info!("Host session stopped for meeting {}", self.meeting);
    }

    /// Reconcile the owned link map against the active presence set. Links
    /// for vanished participants are closed and discarded, cursor included;
    /// a rejoin later starts negotiation from scratch with a fresh offer.
    async fn sync_roster(&mut self) {
        let roster = match self.presence.active(&self.meeting).await {
            Ok(r) => r,
            Err(e) => {
                error!("Presence read failed: {}", e);
                return;
            }
        };

        let active: HashSet<ParticipantId> = roster
            .iter()
            .filter(|p| !p.is_host && p.id != self.profile.id)
            .map(|p| p.id.clone())
            .collect();

        let gone: Vec<ParticipantId> = self
            .links
            .keys()
            .filter(|id| !active.contains(id))
            .cloned()
            .collect();
        for id in gone {
            if let Some(mut link) = self.links.remove(&id) {
                info!("Participant {} left the active set; closing link", id);
                link.close().await;
            }
        }

        for id in active {
            if self.links.contains_key(&id) {
                continue;
            }

            let transport = match self.factory.create(id.clone(), self.transport_tx.clone()).await
            {
                Ok(t) => t,
                Err(e) => {
                    error!("Failed to create transport for {}: {:?}", id, e);
                    continue;
                }
            };

            for track in &self.tracks {
                if let Err(e) = transport.add_local_track(track.clone()).await {
                    warn!("Failed to attach track for {}: {:?}", id, e);
                }
            }

            let mut link = PeerLink::new(id.clone(), transport);
            link.create_offer(&self.outbox).await;
            info!("Offering to new participant {}", id);
            self.links.insert(id, link);
        }
    }

    /// One mailbox query per live peer, each with its own cursor. A failed
    /// query for one peer never blocks the others.
    async fn poll_mailbox(&mut self) {
        let ids: Vec<ParticipantId> = self.links.keys().cloned().collect();

        for id in ids {
            let Some(since) = self.links.get(&id).map(|l| l.cursor()) else {
                continue;
            };

            let rows = match self
                .mailbox
                .signals_from(&self.meeting, &self.profile.id, &id, since)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    error!("Mailbox poll failed for {}: {}", id, e);
                    continue;
                }
            };

            let Some(link) = self.links.get_mut(&id) else {
                continue;
            };

            for row in rows {
                // The cursor moves for every observed row, even ones the
                // role filter below discards, so a batch is read only once.
                link.advance_cursor(row.created_at);

                match row.decode() {
                    Ok(SignalBody::Answer { sdp }) => link.apply_answer(sdp).await,
                    Ok(SignalBody::Ice(candidate)) => link.apply_candidate(candidate).await,
                    Ok(SignalBody::Offer { .. }) => {
                        warn!("Ignoring offer addressed to the host from {}", id);
                    }
                    Err(e) => warn!("Skipping malformed signal from {}: {}", id, e),
                }
            }
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateReady(peer_id, candidate) => {
                let Some(link) = self.links.get(&peer_id) else {
                    debug!("Candidate for unknown peer {}", peer_id);
                    return;
                };
                link.send_local_candidate(candidate, &self.outbox).await;
            }

            TransportEvent::StateChanged(peer_id, LinkState::Failed | LinkState::Closed) => {
                // Terminal for this one link only; siblings keep going.
                if let Some(mut link) = self.links.remove(&peer_id) {
                    warn!("Transport terminal for {}; discarding link", peer_id);
                    link.mark_failed();
                    link.close().await;
                }
            }

            TransportEvent::StateChanged(peer_id, state) => {
                debug!("Link {} is {:?}", peer_id, state);
            }

            // The host only sends media.
            TransportEvent::RemoteTrack(peer_id, _) => {
                debug!("Ignoring inbound track from {}", peer_id);
            }
        }
    }

    /// Swap the matching outgoing track on every live link. Intentionally
    /// does not renegotiate.
    async fn replace_track(&mut self, track: Arc<dyn TrackLocal + Send + Sync>) {
        if let Some(slot) = self.tracks.iter_mut().find(|t| t.kind() == track.kind()) {
            *slot = track.clone();
        } else {
            self.tracks.push(track.clone());
        }

        for link in self.links.values() {
            link.replace_track(track.clone()).await;
        }
    }

    async fn heartbeat(&self) {
        let record = self.profile.presence_record(true, now_ms());
        if let Err(e) = self.presence.heartbeat(&self.meeting, &record).await {
            error!("Heartbeat failed: {}", e);
        }
    }

    /// Runs on every exit path, before the task returns: no signal writes
    /// can happen once shutdown resolves.
    async fn teardown(&mut self, end_meeting: bool) {
        for (_, mut link) in self.links.drain() {
            link.close().await;
        }

        if end_meeting {
            if let Err(e) = self.lifecycle.end(&self.meeting).await {
                error!("Failed to mark meeting ended: {}", e);
            }
            if let Err(e) = self.mailbox.clear(&self.meeting).await {
                error!("Failed to clear mailbox: {}", e);
            }
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
