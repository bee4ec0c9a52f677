//! The message type: the unit of telemetry.

use crate::context::MessageContext;
use crate::primitive::Primitive;
use crate::trait_update::TraitUpdate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The API version stamped onto every message.
pub const API_VERSION: &str = "1";

/// The kind of a telemetry message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Track,
    Identify,
    Alias,
}

impl MessageType {
    /// Returns the lowercase wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Track => "track",
            MessageType::Identify => "identify",
            MessageType::Alias => "alias",
        }
    }

    /// Parses a lowercase name into a message type.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "track" => Some(MessageType::Track),
            "identify" => Some(MessageType::Identify),
            "alias" => Some(MessageType::Alias),
            _ => None,
        }
    }
}

/// A single telemetry message.
///
/// Messages are immutable once stored: the queue appends them, fetches them
/// in FIFO order, and deletes them by id after successful delivery.
///
/// The serde representation is the wire representation: camelCase fields,
/// `type` for the kind, ISO-8601 millisecond timestamps, absent optionals
/// encoded as `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub user_id: Option<String>,
    pub anonymous_id: Option<String>,
    #[serde(with = "crate::timestamp::iso8601_millis")]
    pub timestamp: DateTime<Utc>,
    pub api_version: String,
    pub event: Option<String>,
    pub properties: Option<BTreeMap<String, Primitive>>,
    pub traits: Option<BTreeMap<String, TraitUpdate>>,
    pub context: MessageContext,
}

impl Message {
    /// Creates a new message with a random id and the current timestamp.
    pub fn new(message_type: MessageType, context: MessageContext) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message_type,
            user_id: None,
            anonymous_id: None,
            timestamp: Utc::now(),
            api_version: API_VERSION.to_string(),
            event: None,
            properties: None,
            traits: None,
            context,
        }
    }

    /// Sets the tracked event name.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Sets the user id.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the anonymous id.
    pub fn with_anonymous_id(mut self, anonymous_id: impl Into<String>) -> Self {
        self.anonymous_id = Some(anonymous_id.into());
        self
    }

    /// Sets event properties from raw JSON entries.
    ///
    /// Unsupported value types (null, arrays, objects) are silently dropped;
    /// if nothing survives filtering the field stays absent.
    pub fn with_properties(mut self, entries: serde_json::Map<String, serde_json::Value>) -> Self {
        self.properties = Primitive::filtered_map(entries);
        self
    }

    /// Sets trait updates for an identify message.
    pub fn with_traits(mut self, traits: BTreeMap<String, TraitUpdate>) -> Self {
        self.traits = if traits.is_empty() { None } else { Some(traits) };
        self
    }
}
