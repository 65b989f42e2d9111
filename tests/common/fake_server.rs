//! In-process HTTP server that replays scripted responses and records requests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A scripted response
#[derive(Debug, Clone)]
pub struct FakeResponse {
    pub status: StatusCode,
    pub body: String,
}

impl FakeResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self::new(status, "")
    }

    pub fn created(id: i64, presigned_url: &str) -> Self {
        Self::new(
            StatusCode::CREATED,
            serde_json::json!({
                "id": id,
                "project": "test-project",
                "test_run_url": format!("https://testnod.com/test_runs/{id}"),
                "presigned_url": presigned_url,
            })
            .to_string(),
        )
    }
}

/// A request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

struct ServerState {
    responses: Mutex<VecDeque<FakeResponse>>,
    fallback: FakeResponse,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct FakeServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl FakeServer {
    /// Serve `responses` in order, then `fallback` for every later request
    pub async fn start(responses: Vec<FakeResponse>, fallback: FakeResponse) -> Self {
        let state = Arc::new(ServerState {
            responses: Mutex::new(responses.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Always answer with `response`
    pub async fn always(response: FakeResponse) -> Self {
        Self::start(Vec::new(), response).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

async fn handle(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    });

    let response = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| state.fallback.clone());

    (response.status, response.body)
}

/// Answer one request with `201 Created` whose body ends before its declared
/// Content-Length, then close the connection. Returns the URL to call.
pub async fn truncated_created_response(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        drain_request(&mut stream).await;
        stream
            .write_all(
                b"HTTP/1.1 201 Created\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 100\r\n\
                  Connection: close\r\n\r\n\
                  {\"id\":1",
            )
            .await
            .unwrap();
        let _ = stream.shutdown().await;
    });

    format!("http://{addr}{path}")
}

/// Read one request, headers and body, off the stream
async fn drain_request(stream: &mut TcpStream) {
    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            return;
        }
        received.extend_from_slice(&chunk[..read]);

        let Some(header_end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&received[..header_end]).to_ascii_lowercase();
        let body_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        if received.len() >= header_end + 4 + body_length {
            return;
        }
    }
}
