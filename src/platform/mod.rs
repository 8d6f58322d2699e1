//! Platform abstractions: permissions, camera hardware, dialer, and UI surface.
//!
//! Everything the bridge needs from the device is reached through these
//! traits. [`sim`] provides a desktop implementation for the host binary.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::bridge::event::{Notice, UiEvent};
use crate::call::CallIntent;
use crate::codec::RawFrame;
use crate::permission::Capability;

pub mod sim;

/// Opaque handle to an acquired camera provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderHandle(pub u64);

/// Opaque handle to a bound still-capture use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UseCaseHandle(pub u64);

/// Capture latency/quality trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Favour shutter latency over image quality.
    #[default]
    MinimizeLatency,
}

/// Which sensor to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensFacing {
    /// Default rear-facing sensor.
    #[default]
    Back,
}

/// Fixed parameters for the still-capture use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureConfig {
    /// Capture mode.
    pub mode: CaptureMode,
    /// Sensor selection.
    pub lens: LensFacing,
}

/// Failure reported by a platform facility.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The facility is missing or refused to start.
    #[error("platform facility unavailable: {0}")]
    Unavailable(String),
    /// The hardware reported an error code.
    #[error("hardware error {code}: {message}")]
    Hardware {
        /// Platform error code.
        code: i32,
        /// Platform error message.
        message: String,
    },
    /// The platform rejected the operation for lack of permission.
    #[error("security exception: {0}")]
    Security(String),
    /// The call was interrupted before it produced a result.
    #[error("interrupted")]
    Interrupted,
}

/// OS permission query and prompt launcher.
///
/// `prompt` only launches the dialog; the answer is fed back through
/// [`crate::bridge::BridgeHandle::permission_result`].
pub trait PermissionPrompter: Send + Sync {
    /// Whether the OS currently reports the capability as granted.
    fn check(&self, capability: Capability) -> bool;

    /// Show the platform permission prompt.
    fn prompt(&self, capability: Capability);
}

/// Camera hardware as seen by the capture controller.
#[async_trait]
pub trait CameraHardware: Send + Sync {
    /// Acquire the process-wide camera provider. May take a long time.
    async fn acquire_provider(&self) -> Result<ProviderHandle, PlatformError>;

    /// Unbind every use case currently bound to `provider`.
    fn unbind_all(&self, provider: ProviderHandle);

    /// Build and bind a still-capture use case.
    fn bind(
        &self,
        provider: ProviderHandle,
        config: &CaptureConfig,
    ) -> Result<UseCaseHandle, PlatformError>;

    /// Take one picture. Blocks; only ever called from the capture worker.
    fn take_picture(&self, use_case: UseCaseHandle) -> Result<RawFrame, PlatformError>;

    /// Release the provider after its use cases were unbound.
    fn release(&self, provider: ProviderHandle);
}

/// Platform dialer.
pub trait Dialer: Send + Sync {
    /// Issue a direct-call intent.
    fn start_call(&self, intent: &CallIntent) -> Result<(), PlatformError>;
}

/// The embedded UI layer, driven only from the UI-owning context.
pub trait UiSurface: Send {
    /// Deliver a programmatic event (script invocation).
    fn emit(&mut self, event: &UiEvent);

    /// Show a transient, advisory notice.
    fn notify(&mut self, notice: &Notice);
}

impl fmt::Display for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider#{}", self.0)
    }
}

impl fmt::Display for UseCaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "use_case#{}", self.0)
    }
}
