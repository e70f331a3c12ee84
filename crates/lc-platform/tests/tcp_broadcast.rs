use std::sync::Once;
use std::time::Duration;

use lc_core::ports::{BroadcastPublisherPort, BroadcastSubscriberPort};
use lc_core::{BroadcastMessage, NodeId};
use lc_platform::adapters::{TcpPublisher, TcpSubscriberConnector};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

async fn wait_for_subscribers(publisher: &TcpPublisher, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while publisher.subscriber_count() != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("subscriber count reached");
}

async fn bind_local() -> TcpPublisher {
    TcpPublisher::bind("127.0.0.1:0".parse().unwrap(), 1024 * 1024)
        .await
        .expect("bind publisher")
}

#[tokio::test]
async fn frames_reach_every_connected_subscriber() {
    init_tracing();
    let publisher = bind_local().await;
    let connector = TcpSubscriberConnector::new(1024 * 1024);

    let mut first = connector.connect(publisher.local_addr()).await.unwrap();
    let mut second = connector.connect(publisher.local_addr()).await.unwrap();
    wait_for_subscribers(&publisher, 2).await;

    let message = BroadcastMessage::new("line one\nline two", NodeId::new("alpha"));
    assert_eq!(publisher.publish(&message), 2);

    for rx in [&mut first, &mut second] {
        let frame = rx.recv().await.expect("frame");
        assert_eq!(BroadcastMessage::decode_bytes(&frame).unwrap(), message);
    }
}

#[tokio::test]
async fn late_subscriber_gets_nothing_retroactively() {
    init_tracing();
    let publisher = bind_local().await;
    let connector = TcpSubscriberConnector::new(1024 * 1024);

    assert_eq!(
        publisher.publish(&BroadcastMessage::new("early", NodeId::new("alpha"))),
        0
    );

    let mut rx = connector.connect(publisher.local_addr()).await.unwrap();
    wait_for_subscribers(&publisher, 1).await;
    publisher.publish(&BroadcastMessage::new("late", NodeId::new("alpha")));

    let frame = rx.recv().await.expect("frame");
    assert_eq!(frame, b"late alpha".to_vec());
}

#[tokio::test]
async fn dropping_the_receiver_disconnects() {
    init_tracing();
    let publisher = bind_local().await;
    let connector = TcpSubscriberConnector::new(1024 * 1024);

    let rx = connector.connect(publisher.local_addr()).await.unwrap();
    wait_for_subscribers(&publisher, 1).await;

    drop(rx);
    wait_for_subscribers(&publisher, 0).await;
}

#[tokio::test]
async fn closing_the_publisher_ends_the_stream() {
    init_tracing();
    let publisher = bind_local().await;
    let address = publisher.local_addr();
    let connector = TcpSubscriberConnector::new(1024 * 1024);

    let mut rx = connector.connect(address).await.unwrap();
    wait_for_subscribers(&publisher, 1).await;

    publisher.close();
    let ended = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("stream ends");
    assert!(ended.is_none());
}

#[tokio::test]
async fn connect_to_closed_port_fails() {
    init_tracing();
    let address = {
        let publisher = bind_local().await;
        publisher.local_addr()
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let connector =
        TcpSubscriberConnector::new(1024).with_connect_timeout(Duration::from_millis(500));
    assert!(connector.connect(address).await.is_err());
}
