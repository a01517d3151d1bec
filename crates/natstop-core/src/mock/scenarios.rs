//! Predefined broker behaviours for sampler tests.

use super::{MockSource, Step};
use crate::model::ConnInfo;

impl MockSource {
    /// A server with no traffic: every counter stays at zero.
    pub fn idle_server() -> Self {
        Self::new(Step::default())
    }

    /// A server pushing 1000 msgs / 128 KiB in and 500 msgs / 64 KiB out
    /// between consecutive fetches, with two clients attached.
    pub fn busy_server() -> Self {
        Self::new(Step {
            in_msgs: 1_000,
            out_msgs: 500,
            in_bytes: 128 * 1024,
            out_bytes: 64 * 1024,
        })
        .with_connections(vec![client(1, "publisher"), client(2, "subscriber")])
    }

    /// A busy server that restarts (counters back to zero) on fetch `n`.
    pub fn restarting_server(n: u64) -> Self {
        Self::busy_server().with_reset_at(n)
    }

    /// A busy server that stops answering on fetch `n`.
    pub fn dying_server(n: u64) -> Self {
        Self::busy_server().failing_from(n)
    }
}

fn client(cid: u64, name: &str) -> ConnInfo {
    ConnInfo {
        cid,
        ip: "127.0.0.1".to_string(),
        port: 50_000 + cid as u16,
        start: None,
        last_activity: None,
        uptime: String::new(),
        idle: String::new(),
        pending_bytes: 0,
        in_msgs: 0,
        out_msgs: 0,
        in_bytes: 0,
        out_bytes: 0,
        subscriptions: 1,
        name: name.to_string(),
        lang: "go".to_string(),
        version: "1.1.6".to_string(),
        subscriptions_list: Vec::new(),
    }
}
