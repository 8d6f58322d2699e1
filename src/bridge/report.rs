//! Single reporting sink for everything the UI layer sees.
//!
//! Failure sites only classify into an [`ErrorKind`]; [`Reporter::report`]
//! turns the kind into a log line, a notice, and (for camera and codec
//! failures) the halt-auto-capture event.

use tracing::{debug, warn};

use super::event::{Notice, UiEvent};
use crate::error::ErrorKind;
use crate::platform::UiSurface;

/// Notice shown for an error kind.
pub fn notice_for(kind: &ErrorKind) -> Notice {
    match kind {
        ErrorKind::NotReady => Notice::CameraNotReady,
        ErrorKind::ProviderAcquisitionFailed(_) => Notice::CameraProviderFailed,
        ErrorKind::BindFailed(_) => Notice::CameraSetupFailed,
        ErrorKind::CaptureFailed(code) => Notice::CaptureFailed(code.clone()),
        ErrorKind::InvalidBuffer(_)
        | ErrorKind::UnsupportedFormat(_)
        | ErrorKind::EncodingFailed(_) => Notice::ImageProcessingFailed,
        ErrorKind::InvalidPhoneNumber => Notice::InvalidNumber,
        ErrorKind::CallPermissionDenied => Notice::CallPermissionError,
        ErrorKind::CallIntentFailed(_) => Notice::CallFailed,
    }
}

/// Owns the UI surface. Only used from the UI-owning context.
pub struct Reporter {
    surface: Box<dyn UiSurface>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

impl Reporter {
    /// Wrap a surface.
    pub fn new(surface: Box<dyn UiSurface>) -> Self {
        Self { surface }
    }

    /// Deliver a programmatic event.
    pub fn emit(&mut self, event: &UiEvent) {
        debug!(event = event.name(), "emitting ui event");
        self.surface.emit(event);
    }

    /// Show a notice.
    pub fn notify(&mut self, notice: &Notice) {
        debug!(%notice, "showing notice");
        self.surface.notify(notice);
    }

    /// Log, notify, and halt auto-capture when the kind calls for it.
    pub fn report(&mut self, kind: &ErrorKind) {
        warn!(error = %kind, "operation failed");
        self.notify(&notice_for(kind));
        if kind.halts_auto_capture() {
            self.emit(&UiEvent::StopAutoCapture);
        }
    }
}
