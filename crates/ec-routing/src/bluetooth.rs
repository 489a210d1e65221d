//! Bluetooth-local proxy check (§4.9 step 1): a local BLE central reports
//! whether it's already bridging this device into a mesh, in which case the
//! request is simply forwarded rather than routed by this node at all.

use async_trait::async_trait;

use crate::error::RoutingError;
use crate::request::RouteRequest;

#[derive(Debug, Clone, Copy, Default)]
pub struct BluetoothStatus {
    pub connected: bool,
    pub central_count: u32,
}

impl BluetoothStatus {
    pub fn is_active(&self) -> bool {
        self.connected || self.central_count > 0
    }
}

#[async_trait]
pub trait BluetoothLocalProxy: Send + Sync {
    async fn status(&self) -> BluetoothStatus;
    async fn forward(&self, request: &RouteRequest) -> Result<String, RoutingError>;
}

/// No local BLE proxy bridging this node; the waterfall always falls
/// through to local inference.
#[derive(Default)]
pub struct NullBluetoothProxy;

#[async_trait]
impl BluetoothLocalProxy for NullBluetoothProxy {
    async fn status(&self) -> BluetoothStatus {
        BluetoothStatus::default()
    }

    async fn forward(&self, _request: &RouteRequest) -> Result<String, RoutingError> {
        Err(RoutingError::BluetoothUnreachable(
            "no bluetooth-local proxy configured".to_string(),
        ))
    }
}
