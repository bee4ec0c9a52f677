//! Cross-backend storage tests.
//!
//! The FIFO and durability contracts must hold identically for the SQLite
//! and memory backends, so the tests here run against `&dyn MessageStorage`
//! where the property is backend-independent.


use revflow_events::{Message, MessageContext, MessageType};

/// Builds a track message with a fixed id for assertions.
pub(crate) fn message_with_id(id: &str) -> Message {
    let mut message =
        Message::new(MessageType::Track, MessageContext::default()).with_event("test_event");
    message.id = id.to_string();
    message
}
