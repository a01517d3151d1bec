use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;

use crate::error::{ClientError, Result};
use crate::model::{ConnInfo, Connz, Varz};
use crate::source::StatsSource;

/// Counter increments applied on every `/varz` fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Step {
    pub in_msgs: i64,
    pub out_msgs: i64,
    pub in_bytes: i64,
    pub out_bytes: i64,
}

#[derive(Debug, Default)]
struct Counters {
    in_msgs: i64,
    out_msgs: i64,
    in_bytes: i64,
    out_bytes: i64,
}

#[derive(Debug, Default)]
struct State {
    counters: Counters,
    varz_calls: u64,
}

/// In-memory [`StatsSource`].
#[derive(Debug)]
pub struct MockSource {
    step: Step,
    /// Fetch number (1-based) at which counters drop back to zero.
    reset_at: Option<u64>,
    /// Fetch number (1-based) from which every `/varz` fetch fails.
    fail_from: Option<u64>,
    delay: Duration,
    connections: Vec<ConnInfo>,
    state: Mutex<State>,
}

impl MockSource {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            reset_at: None,
            fail_from: None,
            delay: Duration::ZERO,
            connections: Vec::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Counters restart from zero on fetch `n`, as after a server restart.
    pub fn with_reset_at(mut self, n: u64) -> Self {
        self.reset_at = Some(n);
        self
    }

    /// Fetch `n` and every later `/varz` fetch fail with HTTP 503.
    pub fn failing_from(mut self, n: u64) -> Self {
        self.fail_from = Some(n);
        self
    }

    /// Every fetch takes `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_connections(mut self, connections: Vec<ConnInfo>) -> Self {
        self.connections = connections;
        self
    }

    pub fn varz_calls(&self) -> u64 {
        self.lock().varz_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_varz(&self) -> Result<Varz> {
        let mut state = self.lock();
        state.varz_calls += 1;
        let n = state.varz_calls;

        if self.fail_from.is_some_and(|from| n >= from) {
            return Err(ClientError::Status {
                url: "mock:///varz".to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }

        if self.reset_at == Some(n) {
            state.counters = Counters::default();
        } else if n > 1 {
            let c = &mut state.counters;
            c.in_msgs += self.step.in_msgs;
            c.out_msgs += self.step.out_msgs;
            c.in_bytes += self.step.in_bytes;
            c.out_bytes += self.step.out_bytes;
        }

        let c = &state.counters;
        Ok(Varz {
            server_id: "MOCK".to_string(),
            version: "0.0.0".to_string(),
            go: String::new(),
            host: "127.0.0.1".to_string(),
            port: 4222,
            auth_required: false,
            ssl_required: false,
            max_payload: 1024 * 1024,
            max_connections: 0,
            start: start_time(),
            now: Some(Utc::now()),
            uptime: format!("{}s", n),
            mem: 16 * 1024 * 1024,
            cores: 2,
            cpu: 1.5,
            connections: self.connections.len() as i64,
            total_connections: self.connections.len() as u64,
            routes: 0,
            remotes: 0,
            in_msgs: c.in_msgs,
            out_msgs: c.out_msgs,
            in_bytes: c.in_bytes,
            out_bytes: c.out_bytes,
            slow_consumers: 0,
            subscriptions: 0,
            http_req_stats: HashMap::new(),
        })
    }

    fn next_connz(&self) -> Connz {
        Connz {
            now: Some(Utc::now()),
            num_connections: self.connections.len() as i64,
            total: self.connections.len() as i64,
            offset: 0,
            limit: 1024,
            connections: self.connections.clone(),
        }
    }
}

fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

impl StatsSource for MockSource {
    async fn varz(&self) -> Result<Varz> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.next_varz()
    }

    async fn connz(&self) -> Result<Connz> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.next_connz())
    }
}
