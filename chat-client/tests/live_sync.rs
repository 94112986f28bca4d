use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;

use backend_bootstrap::{serve, AppContext};
use backend_domain::RoomId;
use backend_infrastructure::AppConfig;
use chat_client::{ChatApi, ClientError, ClientSyncAgent, ReconnectPolicy, SyncEvent, SyncState};

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    api: ChatApi,
    _shutdown: oneshot::Sender<()>,
}

async fn start_server(config: AppConfig) -> TestServer {
    let context = AppContext::from_config(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown, stop) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = serve(listener, context.state, async move {
            let _ = stop.await;
        })
        .await;
    });
    let api = ChatApi::new(&format!("http://{}", addr)).expect("api");
    TestServer {
        api,
        _shutdown: shutdown,
    }
}

fn quick_policy() -> ReconnectPolicy {
    ReconnectPolicy {
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(100),
        ..ReconnectPolicy::default()
    }
    .with_max_attempts(Some(3))
}

async fn room_with(api: &ChatApi, participants: &[&str]) -> RoomId {
    let participants: Vec<String> = participants.iter().map(|p| p.to_string()).collect();
    api.create_room(&participants).await.expect("create").id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn agent_follows_live_messages_once() {
    let server = start_server(AppConfig::default()).await;
    let room_id = room_with(&server.api, &["alice"]).await;
    server.api.send(room_id, "alice", "before").await.expect("send");

    let mut agent = ClientSyncAgent::new(server.api.clone(), room_id, "bob").with_policy(quick_policy());
    let initial: Vec<String> = agent
        .enter()
        .await
        .expect("enter")
        .iter()
        .map(|m| m.message.clone())
        .collect();
    assert_eq!(initial, vec!["before"]);
    assert_eq!(agent.state(), SyncState::Live);

    let sent = agent.send("hello").await.expect("send");
    assert_eq!(sent.sender, "bob");
    // no local echo before the feed delivers it
    assert_eq!(agent.messages().len(), 1);

    match timeout(WAIT, agent.next_event()).await {
        Ok(Ok(SyncEvent::Message(message))) => assert_eq!(message, sent),
        other => panic!("expected live message, got {other:?}"),
    }
    let history = server.api.history(room_id, None).await.expect("history");
    assert_eq!(agent.messages(), history.as_slice());

    agent.leave();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deleted_room_closes_the_view() {
    let server = start_server(AppConfig::default()).await;
    let room_id = room_with(&server.api, &["alice"]).await;
    let mut agent = ClientSyncAgent::new(server.api.clone(), room_id, "alice").with_policy(quick_policy());
    agent.enter().await.expect("enter");

    server.api.delete_room(room_id).await.expect("delete");

    let result = timeout(WAIT, agent.next_event()).await.expect("event");
    assert_eq!(result, Err(ClientError::RoomNotFound(room_id)));
    assert_eq!(agent.state(), SyncState::Closed);
    assert_eq!(agent.send("anyone?").await, Err(ClientError::Closed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn leave_stops_the_view() {
    let server = start_server(AppConfig::default()).await;
    let room_id = room_with(&server.api, &[]).await;
    let mut agent = ClientSyncAgent::new(server.api.clone(), room_id, "alice");
    agent.enter().await.expect("enter");

    agent.leave();
    agent.leave();

    assert_eq!(agent.state(), SyncState::Closed);
    assert_eq!(agent.next_event().await, Err(ClientError::Closed));
    assert!(matches!(agent.enter().await, Err(ClientError::Closed)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn entering_missing_room_reports_not_found() {
    let server = start_server(AppConfig::default()).await;
    let mut agent = ClientSyncAgent::new(server.api.clone(), RoomId(99), "alice");

    assert!(matches!(
        agent.enter().await,
        Err(ClientError::RoomNotFound(RoomId(99)))
    ));
    assert_eq!(agent.state(), SyncState::Closed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn api_maps_server_errors() {
    let server = start_server(AppConfig::default()).await;
    let room_id = room_with(&server.api, &["alice"]).await;

    assert!(matches!(
        server.api.send(room_id, "alice", "   ").await,
        Err(ClientError::InvalidInput(_))
    ));
    assert_eq!(
        server.api.history(RoomId(42), None).await,
        Err(ClientError::RoomNotFound(RoomId(42)))
    );
    assert_eq!(
        server.api.delete_room(RoomId(42)).await,
        Err(ClientError::RoomNotFound(RoomId(42)))
    );

    let joined = server.api.join_room(room_id, "carol").await.expect("join");
    assert_eq!(joined.participants, vec!["alice", "carol"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_converges_to_history() {
    let config = AppConfig {
        feed_capacity: 1,
        ..AppConfig::default()
    };
    let server = start_server(config).await;
    let room_id = room_with(&server.api, &["alice"]).await;
    let mut agent = ClientSyncAgent::new(server.api.clone(), room_id, "alice").with_policy(quick_policy());
    agent.enter().await.expect("enter");

    let mut sends = Vec::new();
    for n in 0..30 {
        let api = server.api.clone();
        sends.push(tokio::spawn(async move {
            api.send(room_id, "alice", &format!("m{n}")).await
        }));
    }
    for send in sends {
        send.await.expect("join").expect("send");
    }

    let drained = timeout(Duration::from_secs(10), async {
        while agent.messages().len() < 30 {
            agent.next_event().await.expect("event");
        }
    })
    .await;
    assert!(drained.is_ok(), "timeline stalled at {}", agent.messages().len());

    let seqs: Vec<u64> = agent.messages().iter().map(|m| m.seq).collect();
    assert_eq!(seqs, (1..=30).collect::<Vec<_>>());
}
