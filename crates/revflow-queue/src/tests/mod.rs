//! Queue behavior tests.
//!
//! Batching laws, failure behavior, and restart recovery are pinned down here
//! against the real drain loop with small real-time windows.

mod failures;

use crate::{MessageQueue, QueueOptions, RecordingConsumer};
use revflow_events::{Message, MessageContext, MessageType};
use revflow_storage::MemoryStorage;
use std::sync::Arc;

/// Builds a track message with a fixed id for assertions.
pub(crate) fn message_with_id(id: &str) -> Message {
    let mut message =
        Message::new(MessageType::Track, MessageContext::default()).with_event("test_event");
    message.id = id.to_string();
    message
}

/// Builds a memory-backed queue plus its recording consumer.
pub(crate) fn memory_queue(options: QueueOptions) -> (MessageQueue, Arc<RecordingConsumer>) {
    let consumer = Arc::new(RecordingConsumer::new());
    let queue = MessageQueue::with_storage(
        "test",
        Arc::new(MemoryStorage::new()),
        options,
        consumer.clone(),
    );
    (queue, consumer)
}
