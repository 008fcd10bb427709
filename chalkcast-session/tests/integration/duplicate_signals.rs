use serde_json::json;

use chalkcast_core::{MeetingId, ParticipantId, SignalBody};
use chalkcast_session::{LocalProfile, ParticipantSession, SignalMailbox};

use crate::integration::{
    Stores, candidate, eventually, fast_config, init_tracing, register_participant, spawn_host,
};
use crate::utils::FakeTransportFactory;

#[tokio::test]
async fn replayed_answer_is_applied_once() {
    init_tracing();

    let stores = Stores::new();
    let meeting = MeetingId::from("m-dup-answer");
    let host_id = ParticipantId::from("h1");
    let p1 = ParticipantId::from("p1");
    let factory = FakeTransportFactory::new();

    let host = spawn_host(&stores, &meeting, &host_id, factory.clone());
    register_participant(&stores, &meeting, &p1).await;
    let transport = factory.wait_for_transport(&p1, 1, 2000).await.expect("no link");

    for _ in 0..2 {
        stores
            .mailbox
            .publish(&meeting, &p1, &host_id, &SignalBody::Answer { sdp: "answer".into() })
            .await
            .unwrap();
    }

    assert!(
        eventually(2000, || {
            let t = transport.clone();
            async move { t.answers_accepted().await == 1 }
        })
        .await
    );

    // More polls never re-deliver the batch.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(transport.answers_accepted().await, 1);

    host.leave().await;
}

#[tokio::test]
async fn malformed_signal_does_not_abort_the_batch() {
    init_tracing();

    let stores = Stores::new();
    let meeting = MeetingId::from("m-malformed");
    let host_id = ParticipantId::from("h1");
    let p1 = ParticipantId::from("p1");
    let factory = FakeTransportFactory::new();

    let host = spawn_host(&stores, &meeting, &host_id, factory.clone());
    register_participant(&stores, &meeting, &p1).await;
    let transport = factory.wait_for_transport(&p1, 1, 2000).await.expect("no link");

    stores
        .mailbox
        .publish(&meeting, &p1, &host_id, &SignalBody::Answer { sdp: "answer".into() })
        .await
        .unwrap();
    // An unknown signal type sits in the middle of the batch.
    stores
        .mailbox
        .publish_raw(&meeting, &p1, &host_id, json!({ "type": "renegotiate", "payload": {} }))
        .await;
    stores
        .mailbox
        .publish(&meeting, &p1, &host_id, &SignalBody::Ice(candidate(1)))
        .await
        .unwrap();

    assert!(
        eventually(2000, || {
            let t = transport.clone();
            async move { t.answers_accepted().await == 1 && t.remote_candidates().await == 1 }
        })
        .await,
        "Batch processing stopped at the malformed row"
    );

    host.leave().await;
}

#[tokio::test]
async fn repeated_offer_is_answered_once_and_early_ice_is_dropped() {
    init_tracing();

    let stores = Stores::new();
    let meeting = MeetingId::from("m-dup-offer");
    let host_id = ParticipantId::from("h1");
    let p1 = ParticipantId::from("p1");
    let factory = FakeTransportFactory::new();

    // ICE before any offer: useless, dropped, never replayed.
    stores
        .mailbox
        .publish(&meeting, &host_id, &p1, &SignalBody::Ice(candidate(7)))
        .await
        .unwrap();
    stores
        .mailbox
        .publish(&meeting, &host_id, &p1, &SignalBody::Offer { sdp: "offer-1".into() })
        .await
        .unwrap();
    stores
        .mailbox
        .publish(&meeting, &host_id, &p1, &SignalBody::Offer { sdp: "offer-2".into() })
        .await
        .unwrap();

    let participant = ParticipantSession::spawn(
        fast_config(),
        meeting.clone(),
        LocalProfile::new(p1.clone(), "p1"),
        stores.mailbox.clone(),
        stores.presence.clone(),
        stores.lifecycle.clone(),
        factory.clone(),
    )
    .await
    .expect("Failed to spawn participant");

    let transport = factory.wait_for_transport(&p1, 1, 2000).await.expect("no transport");

    assert!(
        eventually(2000, || {
            let mailbox = stores.mailbox.clone();
            let (m, h, p) = (meeting.clone(), host_id.clone(), p1.clone());
            async move { mailbox.count_kind(&m, &p, &h, "answer").await == 1 }
        })
        .await,
        "Expected exactly one answer"
    );
    assert_eq!(transport.offers_answered().await, 1);
    assert_eq!(transport.remote_candidates().await, 0, "Early candidate was applied");

    // Extra polls change nothing.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(transport.offers_answered().await, 1);
    assert_eq!(stores.mailbox.count_kind(&meeting, &p1, &host_id, "answer").await, 1);

    participant.leave().await;
}
