//! The routing waterfall that decides where an inference task actually runs
//! (C9, §4.9): Bluetooth-local proxy, local inference, swarm coordinator,
//! offline stub — in that order, never failing the caller.

pub mod bluetooth;
pub mod engine;
pub mod error;
pub mod model;
pub mod request;
pub mod streaming;
pub mod swarm_client;

pub use bluetooth::{BluetoothLocalProxy, BluetoothStatus, NullBluetoothProxy};
pub use engine::RoutingEngine;
pub use error::RoutingError;
pub use model::{HttpModelProvider, ModelProvider, StubModelProvider};
pub use request::{offline_stub_answer, RouteDecision, RouteKind, RouteRequest};
pub use streaming::{route_stream, StreamChunk, StreamHandle, StreamProgress};
pub use swarm_client::{SwarmCoordinatorClient, SwarmOutcome};
