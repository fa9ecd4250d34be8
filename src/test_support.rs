//! Shared fixtures for unit tests.

use crate::api::{RedemptionError, TicketRedeemer};
use crate::store::{KeyValueStore, StoreError, AUTH_TOKEN_KEY};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub(crate) fn token_with_claims(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

pub(crate) fn token_with_exp(exp: i64) -> String {
    token_with_claims(json!({ "exp": exp }))
}

#[derive(Default)]
pub(crate) struct FakeStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl FakeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_token(token: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap()
            .insert(AUTH_TOKEN_KEY.to_string(), token.to_string());
        store
    }

    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub(crate) fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub(crate) fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for FakeStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("read refused".to_string()));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        if self.fail_writes {
            return Err(StoreError::Backend("write refused".to_string()));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

struct Gate {
    entered: Notify,
    release: Notify,
}

pub(crate) struct FakeRedeemer {
    result: Mutex<Result<String, RedemptionError>>,
    tickets: Mutex<Vec<String>>,
    delay: Option<Duration>,
    gate: Option<Gate>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeRedeemer {
    fn with_result(result: Result<String, RedemptionError>) -> Self {
        Self {
            result: Mutex::new(result),
            tickets: Mutex::new(Vec::new()),
            delay: None,
            gate: None,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub(crate) fn succeeding(token: &str) -> Self {
        Self::with_result(Ok(token.to_string()))
    }

    pub(crate) fn failing(err: RedemptionError) -> Self {
        Self::with_result(Err(err))
    }

    pub(crate) fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    /// Blocks every redemption until [`FakeRedeemer::release`] is called.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        self
    }

    pub(crate) async fn wait_entered(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notified().await;
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.release.notify_one();
        }
    }

    pub(crate) fn set_result(&self, result: Result<String, RedemptionError>) {
        *self.result.lock().unwrap() = result;
    }

    pub(crate) fn calls(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }

    pub(crate) fn tickets(&self) -> Vec<String> {
        self.tickets.lock().unwrap().clone()
    }

    pub(crate) fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TicketRedeemer for FakeRedeemer {
    async fn redeem(&self, ticket: &str) -> Result<String, RedemptionError> {
        self.tickets.lock().unwrap().push(ticket.to_string());
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.result.lock().unwrap().clone()
    }
}

/// One-shot HTTP server on a loopback port.
///
/// Accepts a single connection, captures the raw request, then either answers
/// with a canned response or holds the connection open without answering.
pub(crate) struct LoopbackServer {
    pub(crate) base_url: String,
    request: JoinHandle<String>,
}

impl LoopbackServer {
    pub(crate) async fn respond(status_line: &str, body: &str) -> Self {
        let reply = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        Self::start(Some(reply), Duration::ZERO).await
    }

    pub(crate) async fn stall(delay: Duration) -> Self {
        Self::start(None, delay).await
    }

    async fn start(reply: Option<String>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let request = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            tokio::time::sleep(delay).await;
            if let Some(reply) = reply {
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
            request
        });
        Self {
            base_url: format!("http://{addr}"),
            request,
        }
    }

    /// The request head and body the client sent.
    pub(crate) async fn request(self) -> String {
        self.request.await.unwrap()
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
