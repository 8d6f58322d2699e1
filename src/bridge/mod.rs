//! Command/event bridge between the device and the embedded UI layer.
//!
//! [`spawn`] starts the UI-owning context: one Tokio task that owns the
//! capture controller, the call dispatcher and the UI surface, and
//! processes [`UiMessage`]s strictly one at a time. Every inbound command
//! and every platform callback is posted into that task's channel through
//! a [`BridgeHandle`], so UI-facing state is never touched concurrently
//! and outbound events leave from a single place.
//!
//! Long-running work never runs inside the loop: provider acquisition
//! and capture completion are awaited on helper tasks that post their
//! results back as messages.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub mod command;
pub mod event;
pub mod report;

use self::command::{Command, CommandTable, INITIATE_EMERGENCY_CALL, REQUEST_PHOTO_CAPTURE};
use self::event::{Notice, UiEvent};
use self::report::Reporter;
use crate::call::{CallDispatcher, CallOutcome};
use crate::camera::{BindOutcome, CaptureController, CaptureResult, DEFAULT_QUEUE_DEPTH};
use crate::error::{BridgeError, ErrorKind};
use crate::permission::{Capability, EnsureOutcome, PermissionGate};
use crate::platform::{
    CameraHardware, CaptureConfig, Dialer, PermissionPrompter, PlatformError, ProviderHandle,
    UiSurface,
};

/// Default inbound channel capacity.
pub const DEFAULT_COMMAND_BUFFER: usize = 32;

/// Platform collaborators the bridge drives.
pub struct BridgeDeps {
    /// Camera hardware.
    pub hardware: Arc<dyn CameraHardware>,
    /// OS permission facility.
    pub prompter: Arc<dyn PermissionPrompter>,
    /// Platform dialer.
    pub dialer: Arc<dyn Dialer>,
    /// Embedded UI layer.
    pub surface: Box<dyn UiSurface>,
}

/// Sizing and capture parameters.
#[derive(Debug, Clone, Copy)]
pub struct BridgeOptions {
    /// Inbound channel capacity.
    pub command_buffer: usize,
    /// Captures that may wait behind the one in flight.
    pub capture_queue_depth: usize,
    /// Still-capture parameters.
    pub capture: CaptureConfig,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            command_buffer: DEFAULT_COMMAND_BUFFER,
            capture_queue_depth: DEFAULT_QUEUE_DEPTH,
            capture: CaptureConfig::default(),
        }
    }
}

/// Work item for the UI-owning context.
#[derive(Debug)]
enum UiMessage {
    Command(Command),
    Start,
    Stop,
    PermissionResult {
        capability: Capability,
        granted: bool,
    },
    ProviderAcquired(Result<ProviderHandle, PlatformError>),
    CaptureCompleted(CaptureResult),
    Shutdown,
}

/// Cloneable entry point for the UI layer and platform callbacks.
///
/// Every method returns as soon as the message is queued; effects happen
/// later on the UI-owning context.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<UiMessage>,
    table: Arc<CommandTable>,
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("commands", &self.table.names())
            .finish_non_exhaustive()
    }
}

impl BridgeHandle {
    /// Invoke a command by name, as the UI layer does.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownCommand`], [`BridgeError::InvalidArguments`],
    /// [`BridgeError::Busy`] or [`BridgeError::Closed`].
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<(), BridgeError> {
        let command = self.table.resolve(name, args).inspect_err(|e| {
            warn!(command = name, error = %e, "rejected ui command");
        })?;
        debug!(command = name, "ui command accepted");
        self.post(UiMessage::Command(command))
    }

    /// `requestPhotoCapture()`.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub fn request_photo_capture(&self) -> Result<(), BridgeError> {
        self.invoke(REQUEST_PHOTO_CAPTURE, &[])
    }

    /// `initiateEmergencyCall(phoneNumber)`.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub fn initiate_emergency_call(&self, phone_number: Option<&str>) -> Result<(), BridgeError> {
        let arg = phone_number.map_or(Value::Null, |n| Value::String(n.to_owned()));
        self.invoke(INITIATE_EMERGENCY_CALL, &[arg])
    }

    /// Feed back the OS answer to a permission prompt.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Busy`] or [`BridgeError::Closed`].
    pub fn permission_result(
        &self,
        capability: Capability,
        granted: bool,
    ) -> Result<(), BridgeError> {
        self.post(UiMessage::PermissionResult {
            capability,
            granted,
        })
    }

    /// Check camera permission and bind the camera once granted.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Busy`] or [`BridgeError::Closed`].
    pub fn start(&self) -> Result<(), BridgeError> {
        self.post(UiMessage::Start)
    }

    /// Unbind the camera. Captures report not-ready until the next start.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Busy`] or [`BridgeError::Closed`].
    pub fn stop(&self) -> Result<(), BridgeError> {
        self.post(UiMessage::Stop)
    }

    /// Ask the UI-owning context to tear down and exit.
    ///
    /// Waits for queue space rather than failing when busy.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Closed`] if the context already exited.
    pub async fn shutdown(&self) -> Result<(), BridgeError> {
        self.tx
            .send(UiMessage::Shutdown)
            .await
            .map_err(|_| BridgeError::Closed)
    }

    /// Names of the commands the UI layer may invoke.
    pub fn command_names(&self) -> Vec<&'static str> {
        self.table.names()
    }

    fn post(&self, message: UiMessage) -> Result<(), BridgeError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => BridgeError::Busy,
            mpsc::error::TrySendError::Closed(_) => BridgeError::Closed,
        })
    }
}

/// Validate the command table, start the capture worker, and spawn the
/// UI-owning context. Must be called inside a Tokio runtime.
///
/// The context exits on [`BridgeHandle::shutdown`] or once every handle
/// has been dropped.
///
/// # Errors
///
/// Table validation errors or [`BridgeError::Spawn`].
pub fn spawn(
    deps: BridgeDeps,
    options: BridgeOptions,
) -> Result<(BridgeHandle, JoinHandle<()>), BridgeError> {
    let table = Arc::new(CommandTable::standard()?);
    let controller = CaptureController::new(
        deps.hardware,
        options.capture,
        options.capture_queue_depth,
    )
    .map_err(|e| BridgeError::Spawn(e.to_string()))?;

    let gate = Arc::new(PermissionGate::new(deps.prompter));
    let calls = CallDispatcher::new(Arc::clone(&gate), deps.dialer);

    let (tx, rx) = mpsc::channel(options.command_buffer.max(1));
    let context = UiContext {
        controller,
        gate,
        calls,
        reporter: Reporter::new(deps.surface),
        loopback: tx.downgrade(),
    };

    info!(commands = ?table.names(), "bridge starting");
    let join = tokio::spawn(context.run(rx));
    Ok((BridgeHandle { tx, table }, join))
}

/// State owned by the UI-owning context.
struct UiContext {
    controller: CaptureController,
    gate: Arc<PermissionGate>,
    calls: CallDispatcher,
    reporter: Reporter,
    loopback: mpsc::WeakSender<UiMessage>,
}

impl UiContext {
    async fn run(mut self, mut rx: mpsc::Receiver<UiMessage>) {
        debug!("ui context running");
        while let Some(message) = rx.recv().await {
            if matches!(message, UiMessage::Shutdown) {
                break;
            }
            self.handle(message);
        }
        self.controller.stop();
        info!("bridge stopped");
    }

    fn handle(&mut self, message: UiMessage) {
        match message {
            UiMessage::Command(Command::RequestPhotoCapture) => self.request_capture(),
            UiMessage::Command(Command::InitiateEmergencyCall { phone_number }) => {
                self.initiate_call(phone_number.as_deref());
            }
            UiMessage::Start => self.check_camera_permission(),
            UiMessage::Stop => self.controller.stop(),
            UiMessage::PermissionResult {
                capability,
                granted,
            } => self.permission_resolved(capability, granted),
            UiMessage::ProviderAcquired(acquired) => self.provider_acquired(acquired),
            UiMessage::CaptureCompleted(result) => self.capture_completed(result),
            UiMessage::Shutdown => {}
        }
    }

    fn check_camera_permission(&mut self) {
        match self.gate.ensure(Capability::Camera) {
            EnsureOutcome::AlreadyGranted => self.start_camera(),
            EnsureOutcome::Requested => debug!("waiting for camera permission"),
        }
    }

    fn start_camera(&mut self) {
        if !self.controller.begin_binding() {
            return;
        }
        let hardware = Arc::clone(self.controller.hardware());
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let acquired = hardware.acquire_provider().await;
            deliver(&loopback, UiMessage::ProviderAcquired(acquired)).await;
        });
    }

    fn provider_acquired(&mut self, acquired: Result<ProviderHandle, PlatformError>) {
        match self.controller.complete_binding(acquired) {
            Ok(BindOutcome::Ready) => self.reporter.notify(&Notice::CameraReady),
            Ok(BindOutcome::Discarded) => {}
            Err(kind) => self.reporter.report(&kind),
        }
    }

    fn request_capture(&mut self) {
        let pending = match self.controller.submit() {
            Ok(pending) => pending,
            Err(kind) => {
                self.reporter.report(&kind);
                return;
            }
        };
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let result = pending.await.unwrap_or_else(|_| CaptureResult::Failure {
                reason: ErrorKind::CaptureFailed("capture worker dropped the request".to_owned()),
            });
            deliver(&loopback, UiMessage::CaptureCompleted(result)).await;
        });
    }

    fn capture_completed(&mut self, result: CaptureResult) {
        match result {
            CaptureResult::Success { transport_image } => {
                debug!(len = transport_image.len(), "sending preview image to ui");
                self.reporter.emit(&UiEvent::PreviewImage(transport_image));
            }
            CaptureResult::Failure { reason } => self.reporter.report(&reason),
        }
    }

    fn initiate_call(&mut self, phone_number: Option<&str>) {
        let number = phone_number.map(str::trim).unwrap_or_default();
        if number.is_empty() {
            warn!("call command without a phone number");
            self.reporter.notify(&Notice::NoNumber);
            return;
        }

        let attempt = self.calls.dispatch(&[number]);
        match attempt.outcome {
            CallOutcome::Dispatched => {
                let dialed = attempt
                    .number
                    .map_or_else(|| number.to_owned(), |n| n.to_string());
                self.reporter.notify(&Notice::CallInitiated(dialed));
            }
            CallOutcome::PermissionPending => {
                self.reporter.notify(&Notice::CallPermissionNeeded);
            }
            CallOutcome::Rejected(kind) => self.reporter.report(&kind),
        }
    }

    fn permission_resolved(&mut self, capability: Capability, granted: bool) {
        self.gate.resolve(capability, granted);
        match (capability, granted) {
            (Capability::Camera, true) => self.start_camera(),
            (Capability::Camera, false) => {
                self.reporter.notify(&Notice::CameraPermissionDenied);
            }
            (Capability::Telephony, true) => {
                self.reporter.notify(&Notice::CallPermissionGranted);
            }
            (Capability::Telephony, false) => {
                self.reporter.notify(&Notice::CallPermissionDenied);
            }
        }
    }
}

/// Post a result back to the UI-owning context; a no-op once it is gone.
async fn deliver(loopback: &mpsc::WeakSender<UiMessage>, message: UiMessage) {
    let Some(tx) = loopback.upgrade() else {
        debug!("ui context gone, dropping result");
        return;
    };
    if tx.send(message).await.is_err() {
        debug!("ui context closed, dropping result");
    }
}
