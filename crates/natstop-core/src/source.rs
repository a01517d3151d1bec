//! Report source abstraction.
//!
//! The sampling loop only needs "give me the current reports". Live
//! sampling uses [`MonitorClient`](crate::client::MonitorClient); tests use
//! [`MockSource`](crate::mock::MockSource).

use std::future::Future;

use crate::error::Result;
use crate::model::{Connz, Varz};

/// Something that can produce the two monitoring reports on demand.
pub trait StatsSource: Send + Sync + 'static {
    /// Current runtime metrics.
    fn varz(&self) -> impl Future<Output = Result<Varz>> + Send;

    /// Current connection table.
    fn connz(&self) -> impl Future<Output = Result<Connz>> + Send;
}
