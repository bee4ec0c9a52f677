//! Constraint gates: network reachability and charging state.
//!
//! The scheduler never probes the platform itself; the host feeds state into
//! these monitors and jobs wait on the derived `watch` channels.

use crate::info::NetworkKind;
use tokio::sync::watch;

/// Current network reachability as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkStatus {
    Offline,
    Cellular,
    Wifi,
}

impl NetworkStatus {
    /// Whether this status satisfies a required reachability level.
    pub fn satisfies(&self, required: NetworkKind) -> bool {
        match required {
            NetworkKind::Any | NetworkKind::Cellular => {
                matches!(self, NetworkStatus::Cellular | NetworkStatus::Wifi)
            }
            NetworkKind::Wifi => matches!(self, NetworkStatus::Wifi),
        }
    }
}

/// Source of network reachability state.
pub trait NetworkMonitor: Send + Sync {
    /// Current status.
    fn status(&self) -> NetworkStatus;

    /// A receiver that wakes on every status change.
    fn subscribe(&self) -> watch::Receiver<NetworkStatus>;
}

/// A network monitor fed by the host (or by tests).
pub struct HostNetworkMonitor {
    sender: watch::Sender<NetworkStatus>,
}

impl HostNetworkMonitor {
    /// Creates a monitor with an initial status.
    pub fn new(initial: NetworkStatus) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Creates a monitor that reports wifi; the default when the host wires
    /// nothing up.
    pub fn always_online() -> Self {
        Self::new(NetworkStatus::Wifi)
    }

    /// Updates the reported status, waking waiting jobs.
    pub fn set(&self, status: NetworkStatus) {
        let _ = self.sender.send(status);
    }
}

impl NetworkMonitor for HostNetworkMonitor {
    fn status(&self) -> NetworkStatus {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.sender.subscribe()
    }
}

/// Source of charging state.
pub trait ChargingMonitor: Send + Sync {
    /// Whether the device is currently on AC power.
    fn is_charging(&self) -> bool;

    /// A receiver that wakes on every charging change.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// A charging monitor fed by the host (or by tests).
pub struct HostChargingMonitor {
    sender: watch::Sender<bool>,
}

impl HostChargingMonitor {
    /// Creates a monitor with an initial charging state.
    pub fn new(initial: bool) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Creates a monitor that reports charging; the default when the host
    /// wires nothing up.
    pub fn always_charging() -> Self {
        Self::new(true)
    }

    /// Updates the charging state, waking waiting jobs.
    pub fn set(&self, charging: bool) {
        let _ = self.sender.send(charging);
    }
}

impl ChargingMonitor for HostChargingMonitor {
    fn is_charging(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}
