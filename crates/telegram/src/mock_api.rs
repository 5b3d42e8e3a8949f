//! In-process stand-in for the Telegram Bot API, for tests.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::StatusCode, http::Uri, routing::post},
    serde_json::{Value, json},
    teloxide::Bot,
    tokio::sync::oneshot,
};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct MockTelegramApi {
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
    next_message_id: Arc<AtomicI64>,
    updates: Arc<Mutex<VecDeque<Value>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    conflict: Arc<Mutex<bool>>,
}

impl MockTelegramApi {
    pub fn new() -> Self {
        Self {
            next_message_id: Arc::new(AtomicI64::new(500)),
            ..Default::default()
        }
    }

    /// Make every call to `method` (e.g. `"ForwardMessage"`) fail.
    pub fn fail(&self, method: &str) {
        self.failing.lock().unwrap().insert(method.to_string());
    }

    /// Hold every answer to `method` back for `delay`.
    pub fn delay(&self, method: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(method.to_string(), delay);
    }

    /// Answer `getUpdates` with a 409 conflict.
    pub fn conflict(&self) {
        *self.conflict.lock().unwrap() = true;
    }

    /// Queue a batch returned by the next `getUpdates` call.
    pub fn push_updates(&self, batch: Value) {
        self.updates.lock().unwrap().push_back(batch);
    }

    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .map(|r| r.body.clone())
            .collect()
    }

    /// Texts sent to `chat_id`, in order.
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.calls("SendMessage")
            .into_iter()
            .filter(|b| b["chat_id"] == chat_id)
            .filter_map(|b| b["text"].as_str().map(str::to_string))
            .collect()
    }

    /// Poll until `method` has been called `count` times or a second passes.
    pub async fn wait_for(&self, method: &str, count: usize) -> Vec<Value> {
        for _ in 0..100 {
            let calls = self.calls(method);
            if calls.len() >= count {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.calls(method)
    }
}

fn message_json(message_id: i64, chat_id: i64, text: &str) -> Value {
    json!({
        "message_id": message_id,
        "date": 0,
        "chat": { "id": chat_id, "type": "private", "first_name": "Someone" },
        "text": text,
    })
}

async fn handler(
    State(api): State<MockTelegramApi>,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    api.requests.lock().unwrap().push(CapturedRequest {
        method: method.clone(),
        body: body.clone(),
    });

    let delay = api.delays.lock().unwrap().get(&method).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if api.failing.lock().unwrap().contains(&method) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })),
        );
    }

    let result = match method.as_str() {
        "SendMessage" | "ForwardMessage" => {
            let id = api.next_message_id.fetch_add(1, Ordering::SeqCst);
            let chat_id = body["chat_id"].as_i64().unwrap_or_default();
            message_json(id, chat_id, body["text"].as_str().unwrap_or("forwarded"))
        },
        "GetMe" => json!({
            "id": 1,
            "is_bot": true,
            "first_name": "Courier",
            "username": "courier_bot"
        }),
        "GetUpdates" => {
            if *api.conflict.lock().unwrap() {
                return (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "ok": false,
                        "error_code": 409,
                        "description": "Conflict: terminated by other getUpdates request; make sure that only one bot instance is running"
                    })),
                );
            }
            api.updates.lock().unwrap().pop_front().unwrap_or_else(|| json!([]))
        },
        _ => json!(true),
    };
    (StatusCode::OK, Json(json!({ "ok": true, "result": result })))
}

/// A running mock server and a bot pointed at it.
pub struct MockServer {
    pub api: MockTelegramApi,
    pub bot: Bot,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockServer {
    pub async fn start() -> Self {
        let api = MockTelegramApi::new();
        let app = Router::new()
            .route("/{*path}", post(handler))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).unwrap();
        let bot = Bot::new("test-token").set_api_url(api_url);
        Self {
            api,
            bot,
            shutdown: Some(shutdown_tx),
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
