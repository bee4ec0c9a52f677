//! Batch envelope construction.

use chrono::{DateTime, Utc};
use revflow_events::timestamp::format_iso8601_millis;
use revflow_events::Message;
use serde_json::{json, Value};

/// Builds the `{"batch": [...]}` envelope.
///
/// Each message is serialized in its wire shape with a `sentAt` field stamped
/// from `sent_at` — the caller passes the current instant immediately before
/// the send, never a stored value.
pub fn batch_payload(
    messages: &[Message],
    sent_at: DateTime<Utc>,
) -> serde_json::Result<Value> {
    let sent_at = format_iso8601_millis(&sent_at);

    let mut entries = Vec::with_capacity(messages.len());
    for message in messages {
        let mut value = serde_json::to_value(message)?;
        if let Value::Object(fields) = &mut value {
            fields.insert("sentAt".to_string(), Value::String(sent_at.clone()));
        }
        entries.push(value);
    }

    Ok(json!({ "batch": entries }))
}
