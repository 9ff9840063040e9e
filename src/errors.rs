use std::time::Duration;

/// Why the camera could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MediaAccessKind {
    /// The user or the OS refused camera access
    PermissionDenied,
    /// No capture device matched the constraints
    NoDevice,
    /// The backend failed for another reason
    Backend,
}

impl std::fmt::Display for MediaAccessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaAccessKind::PermissionDenied => write!(f, "permission denied"),
            MediaAccessKind::NoDevice => write!(f, "no device"),
            MediaAccessKind::Backend => write!(f, "backend failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    #[error("Media access error ({kind}): {message}")]
    MediaAccess {
        kind: MediaAccessKind,
        message: String,
    },
    #[error("Initialization timeout: stream metadata not ready after {0:?}")]
    InitializationTimeout(Duration),
    #[error("Capture error: {0}")]
    Capture(String),
    #[error("Quality sampling error: {0}")]
    QualitySampling(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Capture session already started")]
    AlreadyStarted,
    #[error("Capture session start was cancelled by stop()")]
    Cancelled,
}

impl CaptureError {
    pub fn permission_denied(message: impl Into<String>) -> Self {
        CaptureError::MediaAccess {
            kind: MediaAccessKind::PermissionDenied,
            message: message.into(),
        }
    }

    pub fn no_device(message: impl Into<String>) -> Self {
        CaptureError::MediaAccess {
            kind: MediaAccessKind::NoDevice,
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        CaptureError::MediaAccess {
            kind: MediaAccessKind::Backend,
            message: message.into(),
        }
    }

    /// Camera and device failures end the session; the caller decides whether
    /// to prompt for a retry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaptureError::MediaAccess { .. } | CaptureError::InitializationTimeout(_)
        )
    }
}
