//! In-process fake broker serving `/varz` and `/connz` for client and
//! sampler tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::task::JoinHandle;

use crate::model::fixtures::{connz_json, varz_json};

/// Connection limit the broker applies when none is configured.
const DEFAULT_CONNZ_LIMIT: i64 = 1024;

#[derive(Default)]
struct Shared {
    varz_fetches: AtomicI64,
    fail_status: AtomicU16,
    garbage: AtomicBool,
    last_connz_query: Mutex<Option<String>>,
}

impl Shared {
    fn override_response(&self) -> Option<Response> {
        if self.garbage.load(Ordering::SeqCst) {
            return Some((StatusCode::OK, "<html>not json</html>").into_response());
        }
        match self.fail_status.load(Ordering::SeqCst) {
            0 => None,
            code => Some(
                StatusCode::from_u16(code)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response(),
            ),
        }
    }
}

pub struct FakeBroker {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl FakeBroker {
    /// Binds an ephemeral port on 127.0.0.1 and starts serving.
    ///
    /// Every `/varz` fetch advances the counters, so consecutive samples see
    /// positive rates.
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new()
            .route("/varz", get(varz))
            .route("/connz", get(connz))
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared, task }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// All later requests answer with `code` and an empty body.
    pub fn fail_with_status(&self, code: u16) {
        self.shared.fail_status.store(code, Ordering::SeqCst);
    }

    /// All later requests answer 200 with a non-JSON body.
    pub fn serve_garbage(&self) {
        self.shared.garbage.store(true, Ordering::SeqCst);
    }

    pub fn varz_fetches(&self) -> i64 {
        self.shared.varz_fetches.load(Ordering::SeqCst)
    }

    pub fn last_connz_query(&self) -> Option<String> {
        self.shared.last_connz_query.lock().unwrap().clone()
    }
}

impl Drop for FakeBroker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn varz(State(shared): State<Arc<Shared>>) -> Response {
    if let Some(resp) = shared.override_response() {
        return resp;
    }
    let n = shared.varz_fetches.fetch_add(1, Ordering::SeqCst) + 1;
    let mut body = varz_json(n * 100, n * 50, n * 12_800, n * 6_400);
    let cores = std::thread::available_parallelism().map_or(1, |c| c.get());
    body["cores"] = cores.into();
    Json(body).into_response()
}

async fn connz(State(shared): State<Arc<Shared>>, RawQuery(query): RawQuery) -> Response {
    if let Some(resp) = shared.override_response() {
        return resp;
    }
    let limit = query
        .as_deref()
        .unwrap_or_default()
        .split('&')
        .find_map(|kv| kv.strip_prefix("limit="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CONNZ_LIMIT);
    *shared.last_connz_query.lock().unwrap() = query;
    Json(connz_json(limit)).into_response()
}

/// A localhost port with nothing listening on it.
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// A localhost listener that accepts connections and never answers them.
pub struct SilentListener {
    port: u16,
    task: JoinHandle<()>,
}

impl SilentListener {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        Self { port, task }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for SilentListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}
