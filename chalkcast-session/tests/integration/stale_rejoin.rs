use chalkcast_core::{MeetingId, ParticipantId, STALE_AFTER_MS};

use crate::integration::{Stores, eventually, init_tracing, register_participant, spawn_host};
use crate::utils::FakeTransportFactory;

#[tokio::test]
async fn stale_participant_gets_a_fresh_negotiation_on_rejoin() {
    init_tracing();

    let stores = Stores::new();
    let meeting = MeetingId::from("m-stale");
    let host_id = ParticipantId::from("h1");
    let p1 = ParticipantId::from("p1");
    let factory = FakeTransportFactory::new();

    let host = spawn_host(&stores, &meeting, &host_id, factory.clone());

    register_participant(&stores, &meeting, &p1).await;
    let first = factory
        .wait_for_transport(&p1, 1, 2000)
        .await
        .expect("No transport for p1");
    assert!(
        eventually(2000, || {
            let mailbox = stores.mailbox.clone();
            let (m, h, p) = (meeting.clone(), host_id.clone(), p1.clone());
            async move { mailbox.count_kind(&m, &h, &p, "offer").await == 1 }
        })
        .await
    );

    // p1 stops heartbeating past the staleness window; the host closes the
    // link and forgets the cursor.
    stores.presence.backdate(&meeting, &p1, STALE_AFTER_MS + 1_000).await;
    assert!(
        eventually(2000, || {
            let t = first.clone();
            async move { t.closed().await }
        })
        .await,
        "Host never closed the stale link"
    );

    // Heartbeats resume: a brand-new transport and a brand-new offer, not a
    // resumed negotiation.
    register_participant(&stores, &meeting, &p1).await;
    let second = factory
        .wait_for_transport(&p1, 2, 2000)
        .await
        .expect("Host never rebuilt the link");
    assert!(!second.closed().await);
    assert!(
        eventually(2000, || {
            let mailbox = stores.mailbox.clone();
            let (m, h, p) = (meeting.clone(), host_id.clone(), p1.clone());
            async move { mailbox.count_kind(&m, &h, &p, "offer").await == 2 }
        })
        .await,
        "No fresh offer after rejoin"
    );

    host.leave().await;
}

#[tokio::test]
async fn boundary_staleness_is_excluded() {
    init_tracing();

    let stores = Stores::new();
    let meeting = MeetingId::from("m-boundary");
    let p1 = ParticipantId::from("p1");

    register_participant(&stores, &meeting, &p1).await;
    // Exactly at the window: already stale, by the strict check.
    stores.presence.backdate(&meeting, &p1, STALE_AFTER_MS).await;

    use chalkcast_session::PresenceRegistry;
    let active = stores.presence.active(&meeting).await.unwrap();
    assert!(active.is_empty(), "Boundary record must be excluded");
}
