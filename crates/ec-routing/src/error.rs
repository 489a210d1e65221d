use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoutingError {
    #[error("bluetooth-local proxy unreachable: {0}")]
    BluetoothUnreachable(String),

    #[error("local inference unavailable: {0}")]
    InferenceUnavailable(String),

    #[error("swarm request failed: {0}")]
    SwarmUnavailable(String),

    #[error("swarm poll deadline exceeded")]
    Timeout,
}
