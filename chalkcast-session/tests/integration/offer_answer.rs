use std::time::Duration;

use chalkcast_core::{MeetingId, ParticipantId};
use chalkcast_session::{LinkState, LocalProfile, ParticipantSession, PresenceRegistry};

use crate::integration::{
    Stores, eventually, fast_config, init_tracing, register_participant, spawn_host,
    video_track,
};
use crate::utils::{FakeTransportFactory, TransportCall};

#[tokio::test]
async fn host_offers_and_participant_answers() {
    init_tracing();

    let stores = Stores::new();
    let meeting = MeetingId::from("m-cycle");
    let host_id = ParticipantId::from("h1");
    let p1 = ParticipantId::from("p1");

    let host_factory = FakeTransportFactory::new();
    let participant_factory = FakeTransportFactory::new();

    let participant = ParticipantSession::spawn(
        fast_config(),
        meeting.clone(),
        LocalProfile::new(p1.clone(), "p1"),
        stores.mailbox.clone(),
        stores.presence.clone(),
        stores.lifecycle.clone(),
        participant_factory.clone(),
    )
    .await
    .expect("Failed to spawn participant");

    let host = spawn_host(&stores, &meeting, &host_id, host_factory.clone());

    // Host observes p1's heartbeat and mails an offer.
    let host_transport = host_factory
        .wait_for_transport(&p1, 1, 2000)
        .await
        .expect("Host never created a transport for p1");
    assert!(
        eventually(2000, || {
            let mailbox = stores.mailbox.clone();
            let (m, h, p) = (meeting.clone(), host_id.clone(), p1.clone());
            async move { mailbox.count_kind(&m, &h, &p, "offer").await == 1 }
        })
        .await,
        "Host never wrote an offer"
    );

    // The host's local track was attached before the offer went out.
    assert_eq!(
        host_transport
            .count(|c| matches!(c, TransportCall::AddTrack(_)))
            .await,
        1
    );

    // p1 polls the offer and answers; the host applies the answer.
    assert!(
        eventually(2000, || {
            let mailbox = stores.mailbox.clone();
            let (m, h, p) = (meeting.clone(), host_id.clone(), p1.clone());
            async move { mailbox.count_kind(&m, &p, &h, "answer").await == 1 }
        })
        .await,
        "Participant never answered"
    );
    let participant_transport = participant_factory
        .wait_for_transport(&p1, 1, 2000)
        .await
        .expect("Participant has no transport");
    assert_eq!(participant_transport.offers_answered().await, 1);
    assert!(
        eventually(2000, || {
            let t = host_transport.clone();
            async move { t.answers_accepted().await == 1 }
        })
        .await,
        "Host never applied the answer"
    );

    // Re-evaluating the roster over many poll cycles never re-offers.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        stores.mailbox.count_kind(&meeting, &host_id, &p1, "offer").await,
        1
    );

    // ICE flows both ways through the mailbox.
    assert!(host_transport.emit_candidate(crate::integration::candidate(1)).await);
    assert!(participant_transport.emit_candidate(crate::integration::candidate(2)).await);
    assert!(
        eventually(2000, || {
            let (ht, pt) = (host_transport.clone(), participant_transport.clone());
            async move { ht.remote_candidates().await == 1 && pt.remote_candidates().await == 1 }
        })
        .await,
        "Candidates were not exchanged"
    );

    // The transport reporting connected surfaces on the observable state.
    participant_transport.emit_state(LinkState::Connected).await;
    let link_state = participant.link_state.clone();
    assert!(
        eventually(2000, || {
            let mut rx = link_state.clone();
            async move { *rx.borrow_and_update() == LinkState::Connected }
        })
        .await,
        "Link state never reached Connected"
    );

    // Graceful leave removes presence and closes transports.
    participant.leave().await;
    host.leave().await;
    assert!(!stores.presence.contains(&meeting, &host_id).await);
    assert!(!stores.presence.contains(&meeting, &p1).await);
    assert!(host_transport.closed().await);
    assert!(participant_transport.closed().await);
}

#[tokio::test]
async fn replace_track_swaps_in_place_without_renegotiation() {
    init_tracing();

    let stores = Stores::new();
    let meeting = MeetingId::from("m-tracks");
    let host_id = ParticipantId::from("h1");
    let p1 = ParticipantId::from("p1");

    let host_factory = FakeTransportFactory::new();
    let host = spawn_host(&stores, &meeting, &host_id, host_factory.clone());

    register_participant(&stores, &meeting, &p1).await;
    let transport = host_factory
        .wait_for_transport(&p1, 1, 2000)
        .await
        .expect("No transport for p1");

    host.replace_track(video_track()).await;

    assert!(
        eventually(2000, || {
            let t = transport.clone();
            async move {
                t.count(|c| matches!(c, TransportCall::ReplaceTrack(kind) if kind == "video"))
                    .await
                    == 1
            }
        })
        .await,
        "Track was never replaced"
    );

    // Still exactly one offer: replacement does not renegotiate.
    assert_eq!(
        stores.mailbox.count_kind(&meeting, &host_id, &p1, "offer").await,
        1
    );

    host.leave().await;
}

#[tokio::test]
async fn update_media_changes_heartbeat_flags() {
    init_tracing();

    let stores = Stores::new();
    let meeting = MeetingId::from("m-flags");
    let p1 = ParticipantId::from("p1");
    let factory = FakeTransportFactory::new();

    let participant = ParticipantSession::spawn(
        fast_config(),
        meeting.clone(),
        LocalProfile::new(p1.clone(), "p1"),
        stores.mailbox.clone(),
        stores.presence.clone(),
        stores.lifecycle.clone(),
        factory,
    )
    .await
    .expect("Failed to spawn participant");

    participant.update_media(false, true).await;

    assert!(
        eventually(2000, || {
            let presence = stores.presence.clone();
            let (m, p) = (meeting.clone(), p1.clone());
            async move {
                presence
                    .active(&m)
                    .await
                    .unwrap()
                    .iter()
                    .any(|r| r.id == p && !r.is_camera_on && r.is_mic_on)
            }
        })
        .await,
        "Heartbeat never carried the new flags"
    );

    participant.leave().await;
}
