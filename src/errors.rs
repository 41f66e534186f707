// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the depth bridge

use crate::backends::depth::{ErrorCode, RetrieveError};
use std::fmt;

/// Result type alias using BridgeError
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Main error type
#[derive(Debug, Clone)]
pub enum BridgeError {
    /// Depth camera errors
    Camera(CameraError),
    /// Request/reply socket errors
    Channel(String),
    /// JSON encoding or decoding errors
    Serialization(String),
    /// Configuration errors
    Config(String),
}

/// Depth camera errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Device could not be opened
    Open(ErrorCode),
    /// Capture failed
    Grab(ErrorCode),
    /// Measurement could not be copied out
    Retrieve(RetrieveError),
}

impl BridgeError {
    /// Short label of the failing stage, used in logs
    pub fn stage(&self) -> &'static str {
        match self {
            BridgeError::Camera(CameraError::Open(_)) => "open",
            BridgeError::Camera(CameraError::Grab(_)) => "grab",
            BridgeError::Camera(CameraError::Retrieve(_)) => "retrieve",
            BridgeError::Channel(_) => "channel",
            BridgeError::Serialization(_) => "serialization",
            BridgeError::Config(_) => "config",
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Camera(e) => write!(f, "Camera error: {}", e),
            BridgeError::Channel(msg) => write!(f, "Channel error: {}", msg),
            BridgeError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            BridgeError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Open(code) => write!(f, "Failed to open camera: {}", code),
            CameraError::Grab(code) => write!(f, "Grab failed: {}", code),
            CameraError::Retrieve(e) => write!(f, "Retrieve failed: {}", e),
        }
    }
}

impl std::error::Error for BridgeError {}
impl std::error::Error for CameraError {}

impl From<CameraError> for BridgeError {
    fn from(err: CameraError) -> Self {
        BridgeError::Camera(err)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl From<zeromq::ZmqError> for BridgeError {
    fn from(err: zeromq::ZmqError) -> Self {
        BridgeError::Channel(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_shows_code() {
        let err = BridgeError::from(CameraError::Open(ErrorCode::CameraNotDetected));
        assert_eq!(
            err.to_string(),
            "Camera error: Failed to open camera: CAMERA NOT DETECTED"
        );
        assert_eq!(err.stage(), "open");
    }

    #[test]
    fn test_json_error_conversion() {
        let err: BridgeError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }
}
