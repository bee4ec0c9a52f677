//! # RevFlow Delivery
//!
//! Turns queue batches into durable, network-gated delivery jobs.
//!
//! [`DeliveryConsumer`] implements the queue's consumer contract by
//! scheduling one persistent [`SendBatchJob`] per batch: consume succeeds the
//! moment the job is durably scheduled, and the job owns delivery from then
//! on — buffered while offline, sent with exponential-backoff retries once
//! reachable. The queue's own retry (on scheduling failure) and the job's
//! retry (on network failure) are two deliberately separate layers.

mod consumer;
mod error;
mod job;
mod payload;
mod sender;

pub use consumer::DeliveryConsumer;
pub use error::{DeliveryError, DeliveryResult};
pub use job::{SendBatchCreator, SendBatchJob, SendBatchParams, SEND_BATCH_JOB_TYPE};
pub use payload::batch_payload;
pub use sender::{BatchSender, DeliveryConfig};
