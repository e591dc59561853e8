use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("transport timed out waiting for the device")]
    TransportTimeout,

    #[error("unexpected device response (expected {expected:#04x}, {completed} step(s) completed)")]
    UnexpectedDeviceResponse { expected: u8, completed: usize },

    #[error("command byte update gave up after {attempts} contended attempts")]
    ContentionExhausted { attempts: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
