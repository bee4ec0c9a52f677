//! # RevFlow Events
//!
//! Core telemetry types shared by the queue, storage, and delivery layers.
//!
//! A [`Message`] is the unit of telemetry: immutable once constructed, with a
//! globally unique id, a wall-clock timestamp, and scalar-valued properties.
//! Wire encoding is camelCase JSON with ISO-8601 millisecond timestamps.
//!
//! ## Crate Structure
//!
//! - [`message`] - The message type and its kind enum
//! - [`primitive`] - Scalar property values
//! - [`trait_update`] - Trait mutation operators for identify calls
//! - [`context`] - App/device/OS context records
//! - [`timestamp`] - ISO-8601 millisecond serialization helpers

pub mod context;
pub mod message;
pub mod primitive;
pub mod timestamp;
pub mod trait_update;

pub use context::{AppInfo, DeviceInfo, LibraryInfo, MessageContext, OsInfo};
pub use message::{Message, MessageType, API_VERSION};
pub use primitive::Primitive;
pub use trait_update::{TraitOp, TraitUpdate};
