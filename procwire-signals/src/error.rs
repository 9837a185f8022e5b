//! Signal handling errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    /// The OS refused the signal registration
    #[error("Failed to register signal handler: {0}")]
    RegistrationFailed(String),

    /// The source can never deliver another event
    #[error("Signal source closed before an interrupt arrived")]
    SourceClosed,
}

impl From<std::io::Error> for SignalError {
    fn from(err: std::io::Error) -> Self {
        SignalError::RegistrationFailed(err.to_string())
    }
}
