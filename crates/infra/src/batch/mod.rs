//! Batch analysis of tickets.
//!
//! ## Design
//!
//! - One driver, one worker: items are processed strictly in input order and
//!   at most one item is in flight.
//! - Failures never escape the loop. Each one is classified; recoverable
//!   failures become synthetic results, fatal ones (bad credentials, exhausted
//!   quota) also stop the run.
//! - Requests are throttled to the configured requests-per-minute.
//! - Cancellation is cooperative: an in-flight item always completes, the
//!   signal only prevents the next item from being scheduled.
//!
//! ## Components
//!
//! - `BatchDriver`: the control loop
//! - `ResultSink`: where results accumulate (append or keyed upsert)
//! - `BatchObserver`: per-item result/progress callbacks
//! - `BatchRunHandle`: control of a run spawned onto the runtime

pub mod driver;
pub mod observer;
pub mod sink;

pub use driver::{BatchDriver, BatchRunHandle};
pub use observer::{BatchEvent, BatchObserver, ChannelObserver, NoopObserver};
pub use sink::{InMemoryResultSink, ResultSink, SinkStrategy};
