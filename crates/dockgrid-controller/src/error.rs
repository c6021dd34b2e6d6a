//! Controller error types.

use thiserror::Error;

use crate::runtime::RuntimeError;

/// Result type alias for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors raised inside a controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A launch was requested for a service that was never registered.
    #[error("no profile registered for service: {0}")]
    MissingProfile(String),

    #[error("invalid profile for service {service}: {reason}")]
    InvalidProfile { service: String, reason: String },

    /// The host belongs to a swarm; this backend only drives plain hosts.
    #[error("container host is a cluster member (node {0})")]
    Clustered(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ControllerError {
    /// True for caller/ordering bugs, false for runtime failures.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ControllerError::MissingProfile(_) | ControllerError::InvalidProfile { .. }
        )
    }
}

/// The failure `set_target` reports, attributed to one service.
///
/// Callers batching many services log this and move on to the next one.
#[derive(Debug, Error)]
#[error("service {service}: {message}")]
pub struct ServiceControlError {
    pub service: String,
    pub message: String,
    #[source]
    pub source: ControllerError,
}

impl ServiceControlError {
    pub fn new(service: impl Into<String>, source: ControllerError) -> Self {
        Self {
            service: service.into(),
            message: source.to_string(),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.source.is_configuration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_cause_with_service_name() {
        let err = ServiceControlError::new(
            "extract",
            ControllerError::Runtime(RuntimeError::Other("connection refused".into())),
        );
        assert_eq!(err.service, "extract");
        assert_eq!(err.message, "connection refused");
        assert_eq!(err.to_string(), "service extract: connection refused");
        assert!(!err.is_configuration());
    }

    #[test]
    fn missing_profile_is_configuration() {
        let err = ServiceControlError::new(
            "extract",
            ControllerError::MissingProfile("extract".into()),
        );
        assert!(err.is_configuration());
        assert!(matches!(err.source, ControllerError::MissingProfile(_)));
    }
}
