//! App/device/OS context records attached to every message.
//!
//! All sub-records are plain-string-valued. Population of these fields is the
//! host application's concern; the core only carries them to the wire.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Application identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub build: String,
    pub namespace: String,
}

/// Physical device identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
}

/// Operating system identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsInfo {
    pub name: String,
    pub version: String,
}

/// The SDK library identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
}

/// The full context record carried by every message.
///
/// `extra` is flattened into the context object on the wire, so host-supplied
/// custom fields appear alongside the standard ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContext {
    pub app: AppInfo,
    pub device: DeviceInfo,
    pub os: OsInfo,
    pub locale: String,
    pub timezone: String,
    pub library: LibraryInfo,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}
