//! Outbound events and transient notices for the UI layer.

use std::fmt;

/// Script-level event delivered to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A capture succeeded; the payload is a `data:image/jpeg;base64,` URL.
    PreviewImage(String),
    /// Capture is impossible right now; stop any automatic retry loop.
    StopAutoCapture,
}

impl UiEvent {
    /// Name of the UI-layer function this event invokes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PreviewImage(_) => "previewImage",
            Self::StopAutoCapture => "stopAutoCapture",
        }
    }

    /// Script that performs the invocation.
    ///
    /// `stopAutoCapture` only runs if the page defines it and its
    /// `isAutoCapturing` flag is set.
    pub fn to_script(&self) -> String {
        match self {
            Self::PreviewImage(data_url) => {
                format!("previewImage('{}')", escape_script_literal(data_url))
            }
            Self::StopAutoCapture => "if (typeof stopAutoCapture === 'function' \
                 && typeof isAutoCapturing !== 'undefined' \
                 && isAutoCapturing) stopAutoCapture();"
                .to_owned(),
        }
    }
}

/// Escape a value for a single-quoted script string literal.
pub fn escape_script_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Advisory, user-visible notice. Not part of the programmatic contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The camera session is bound.
    CameraReady,
    /// The user denied camera access.
    CameraPermissionDenied,
    /// A capture was requested before the session was ready.
    CameraNotReady,
    /// The camera provider could not be obtained.
    CameraProviderFailed,
    /// Binding the capture use case failed.
    CameraSetupFailed,
    /// The hardware capture failed with the given code or message.
    CaptureFailed(String),
    /// The captured frame could not be converted.
    ImageProcessingFailed,
    /// A call command arrived without a number.
    NoNumber,
    /// No candidate number validated.
    InvalidNumber,
    /// A call intent was issued for this number.
    CallInitiated(String),
    /// Telephony permission was requested.
    CallPermissionNeeded,
    /// The user granted telephony; the call must be retriggered.
    CallPermissionGranted,
    /// The user denied telephony.
    CallPermissionDenied,
    /// The platform rejected the intent for lack of permission.
    CallPermissionError,
    /// The platform failed to start the call.
    CallFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CameraReady => f.write_str("Camera ready."),
            Self::CameraPermissionDenied => {
                f.write_str("Camera permission denied. Cannot take photo.")
            }
            Self::CameraNotReady => f.write_str("Camera is initializing or permission denied."),
            Self::CameraProviderFailed => f.write_str("Failed to get camera provider."),
            Self::CameraSetupFailed => f.write_str("Failed to initialize camera."),
            Self::CaptureFailed(code) => write!(f, "Photo capture failed: {code}"),
            Self::ImageProcessingFailed => f.write_str("Failed to process captured image data."),
            Self::NoNumber => f.write_str("No valid phone number provided for call."),
            Self::InvalidNumber => {
                f.write_str("Could not initiate call. Check number format/permission.")
            }
            Self::CallInitiated(number) => write!(f, "Initiating emergency call to {number}..."),
            Self::CallPermissionNeeded => f.write_str("Call permission needed for emergency calls."),
            Self::CallPermissionGranted => {
                f.write_str("Call permission granted. Trigger call again if needed.")
            }
            Self::CallPermissionDenied => {
                f.write_str("Call permission denied. Cannot make emergency calls.")
            }
            Self::CallPermissionError => f.write_str("Call permission error."),
            Self::CallFailed => f.write_str("Could not initiate call."),
        }
    }
}
