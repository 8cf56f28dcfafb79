//! Error types for contactless hardware operations.
//!
//! This module defines error types specific to radio driver operations,
//! covering capability probing, session initialization, exclusive access
//! reservation, tag reads and release.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during contactless hardware operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Radio session initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Exclusive radio access could not be granted.
    #[error("Exclusive access error: {message}")]
    ExclusiveAccess { message: String },

    /// Tag reading error.
    #[error("Tag read error: {message}")]
    TagReadError { message: String },

    /// A pending request was aborted before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new exclusive access error.
    pub fn exclusive_access(message: impl Into<String>) -> Self {
        Self::ExclusiveAccess {
            message: message.into(),
        }
    }

    /// Create a new tag read error.
    pub fn tag_read(message: impl Into<String>) -> Self {
        Self::TagReadError {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("ACR122U");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: ACR122U");
    }

    #[test]
    fn test_unsupported_error() {
        let error = HardwareError::unsupported("NFC capability query");
        assert!(matches!(error, HardwareError::Unsupported { .. }));
        assert_eq!(
            error.to_string(),
            "Unsupported operation: NFC capability query"
        );
    }

    #[test]
    fn test_communication_error() {
        let error = HardwareError::communication("Tag was lost");
        assert!(matches!(error, HardwareError::CommunicationError { .. }));
        assert_eq!(error.to_string(), "Communication error: Tag was lost");
    }

    #[test]
    fn test_exclusive_access_error() {
        let error = HardwareError::exclusive_access("already held");
        assert_eq!(error.to_string(), "Exclusive access error: already held");
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            HardwareError::invalid_data("short response"),
            HardwareError::initialization_failed("adapter off"),
            HardwareError::tag_read("not held"),
            HardwareError::Cancelled,
            HardwareError::other("boom"),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
            let _ = format!("{:?}", error);
        }
    }
}
