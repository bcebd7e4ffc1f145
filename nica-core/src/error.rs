use thiserror::Error;

/// Process-level failures: configuration and startup. Per-packet and
/// per-command failures never reach this type — they are reported as
/// a [`crate::gateway::GatewayStatus`] or a local counter increment, per
/// the dataplane's "no error crosses a pipeline boundary" rule.
#[derive(Error, Debug)]
pub enum NicaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No ikernels configured")]
    NoIkernels,

    #[error("ikernel id {0} out of range")]
    IkernelIdOutOfRange(u8),

    #[error("telemetry error: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, NicaError>;
