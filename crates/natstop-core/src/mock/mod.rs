//! Scripted report source for running the sampler without a broker.
//!
//! Provides a [`MockSource`] whose counters advance by a fixed step on every
//! `/varz` fetch, plus ready-made scenarios in [`scenarios`].

mod scenarios;
mod source;

pub use source::{MockSource, Step};
