//! End to end: HTTP control plane, a real directory, the WebSocket feed and
//! alert mail, all against a bound server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use watchtower_db::Database;
use watchtower_server::auth::{TokenService, DEFAULT_TOKEN_TTL};
use watchtower_server::mailer::{MailError, MailMessage, Mailer};
use watchtower_server::{create_app, AppState};

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn spawn_server() -> (SocketAddr, Arc<AppState>, Arc<RecordingMailer>) {
    let db = Database::new_in_memory().await.unwrap();
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::with_parts(
        db,
        mailer.clone(),
        TokenService::new(b"live-secret", DEFAULT_TOKEN_TTL),
        None,
    );
    let app = create_app(state.clone(), "*");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state, mailer)
}

async fn connect(addr: SocketAddr, state: &AppState) -> WsStream {
    let before = state.fanout.subscriber_count();
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    // The subscription is registered after the upgrade completes server side.
    for _ in 0..100 {
        if state.fanout.subscriber_count() > before {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.fanout.subscriber_count(), before + 1);
    ws
}

/// Read frames until one reports `kind` for `path`.
async fn expect_change(ws: &mut WsStream, path: &Path, kind: &str) -> serde_json::Value {
    let path = path.to_string_lossy().into_owned();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let msg = ws.next().await.expect("socket open").expect("frame");
            if let Message::Text(_) = msg {
                let json: serde_json::Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
                if json["path"] == path.as_str() && json["changeKind"] == kind {
                    return json;
                }
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no {kind} event for {path}"))
}

async fn post_json(
    client: &reqwest::Client,
    url: String,
    body: serde_json::Value,
) -> reqwest::StatusCode {
    client.post(url).json(&body).send().await.unwrap().status()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_modify_delete_then_stop() {
    let (addr, state, mailer) = spawn_server().await;
    let client = reqwest::Client::new();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let status = post_json(
        &client,
        format!("http://{addr}/config"),
        serde_json::json!({
            "ownerIdentity": "ops@example.com",
            "path": root.to_string_lossy(),
            "trackedFiles": [],
            "interval": 100,
        }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::CREATED);

    let mut ws = connect(addr, &state).await;

    let status = post_json(&client, format!("http://{addr}/start"), serde_json::json!({})).await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let file = root.join("a.txt");
    std::fs::File::create(&file).unwrap();
    let created = expect_change(&mut ws, &file, "created").await;
    assert!(created["timestamp"].is_string());

    {
        use std::io::Write;
        let mut f = std::fs::OpenOptions::new().append(true).open(&file).unwrap();
        f.write_all(b"hello\n").unwrap();
    }
    expect_change(&mut ws, &file, "modified").await;

    std::fs::remove_file(&file).unwrap();
    expect_change(&mut ws, &file, "deleted").await;

    let changes: serde_json::Value = client
        .get(format!("http://{addr}/file-changes"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let changes = changes.as_array().unwrap();
    assert_eq!(changes[0]["changeKind"], "deleted");
    for kind in ["created", "modified", "deleted"] {
        assert!(
            changes.iter().any(|c| c["changeKind"] == kind),
            "missing stored {kind} event"
        );
    }

    let status = client
        .post(format!("http://{addr}/stop"))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let stored_before = state.db.count_change_events().await.unwrap();

    std::fs::File::create(root.join("after-stop.txt")).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(state.db.count_change_events().await.unwrap(), stored_before);
    let extra = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(extra.is_err(), "no frames expected after stop");

    let sent = mailer.sent.lock().unwrap();
    let expected = format!("File created on {}", file.display());
    assert!(sent.iter().all(|m| m.to == "ops@example.com"));
    assert!(sent.iter().any(|m| m.body.starts_with(&expected)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribers_only_see_events_after_connecting() {
    let (addr, state, _mailer) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let mut early = connect(addr, &state).await;
    state
        .sessions
        .start(watchtower_core::MonitorTarget::new(
            "ops@example.com",
            root.to_string_lossy(),
            vec![],
        ))
        .await
        .unwrap();

    let first = root.join("first.txt");
    std::fs::File::create(&first).unwrap();
    expect_change(&mut early, &first, "created").await;

    let mut late = connect(addr, &state).await;
    let second = root.join("second.txt");
    std::fs::File::create(&second).unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), late.next())
        .await
        .expect("frame within timeout")
        .expect("socket open")
        .expect("frame");
    let seen: serde_json::Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(seen["path"], second.to_string_lossy().as_ref());
    expect_change(&mut early, &second, "created").await;
}
