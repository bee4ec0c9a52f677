//! # RevFlow Queue
//!
//! The message queue core: a single-writer, single-reader state machine that
//! buffers telemetry messages in durable storage and hands them to a
//! pluggable consumer in FIFO batches.
//!
//! ## Non-negotiable Principles
//!
//! - A message is durable in storage before `emit` returns
//! - Batches are delivered in strict storage FIFO order
//! - At most one drain runs against a queue at any time
//! - Consumer failure never drops data; the batch stays for retry
//! - `emit` never surfaces an error to the producer
//!
//! ## Write Path
//!
//! ```text
//! emit -> storage.store -> trigger (count reached? no window?) -> drain
//!                                   otherwise -> next timer tick -> drain
//! ```

mod consumer;
mod error;
mod options;
mod queue;

#[cfg(test)]
mod tests;

pub use consumer::{MessageConsumer, RecordingConsumer};
pub use error::{ConsumeError, QueueError, QueueResult};
pub use options::{BatchingWindow, QueueOptions, DEFAULT_FETCH_LIMIT};
pub use queue::{MessageQueue, QueueState};
