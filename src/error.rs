//! Error kinds shared by the camera, codec, call and bridge modules.
//!
//! [`ErrorKind`] is the pure classification every failure site produces.
//! Turning a kind into user-facing side effects happens in exactly one
//! place, [`crate::bridge::report::Reporter`].

/// Classified failure of a capture or call operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Capture attempted while the camera session is not ready.
    #[error("camera is not ready")]
    NotReady,
    /// The platform could not hand out a camera provider.
    #[error("failed to acquire camera provider: {0}")]
    ProviderAcquisitionFailed(String),
    /// The still-capture use case could not be bound.
    #[error("failed to bind capture use case: {0}")]
    BindFailed(String),
    /// The hardware capture itself failed.
    #[error("photo capture failed: {0}")]
    CaptureFailed(String),
    /// A pixel plane was empty or missing.
    #[error("invalid image buffer: {0}")]
    InvalidBuffer(String),
    /// The frame uses a pixel layout the codec does not handle.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    /// Compression or transport encoding failed.
    #[error("image encoding failed: {0}")]
    EncodingFailed(String),
    /// No candidate phone number passed validation.
    #[error("invalid phone number")]
    InvalidPhoneNumber,
    /// Telephony permission is missing or was rejected by the platform.
    #[error("call permission denied")]
    CallPermissionDenied,
    /// The platform refused or failed to start the call.
    #[error("failed to issue call intent: {0}")]
    CallIntentFailed(String),
}

impl ErrorKind {
    /// Whether the UI layer should stop any automatic capture loop.
    ///
    /// True for every camera and codec failure.
    pub fn halts_auto_capture(&self) -> bool {
        matches!(
            self,
            Self::NotReady
                | Self::ProviderAcquisitionFailed(_)
                | Self::BindFailed(_)
                | Self::CaptureFailed(_)
                | Self::InvalidBuffer(_)
                | Self::UnsupportedFormat(_)
                | Self::EncodingFailed(_)
        )
    }
}

/// Errors produced by the command surface exposed to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The UI layer invoked a command name that is not in the table.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// The command exists but its arguments do not fit its signature.
    #[error("invalid arguments for {command}: {reason}")]
    InvalidArguments {
        /// Command name as invoked.
        command: String,
        /// Why the arguments were rejected.
        reason: String,
    },
    /// Two table entries share a name.
    #[error("command registered twice: {0}")]
    DuplicateCommand(String),
    /// A table entry has an empty name.
    #[error("command name is blank")]
    BlankCommandName,
    /// The inbound queue is full.
    #[error("bridge is busy, command dropped")]
    Busy,
    /// The UI-owning context has shut down.
    #[error("bridge is closed")]
    Closed,
    /// The capture worker thread could not be started.
    #[error("failed to start capture worker: {0}")]
    Spawn(String),
}
