//! Capture session controller.
//!
//! Owns the hardware session lifecycle:
//!
//! ```text
//! Uninitialized ──begin_binding──▶ Binding ──complete_binding(ok)──▶ Ready
//!       ▲                             │                                │
//!       │                             └──(error)──▶ Failed             │
//!       └──────────────── stop (Unbinding) ◀───────────────────────────┘
//! ```
//!
//! State is only mutated through `&mut self`, i.e. from the UI-owning
//! context. The capture worker reads a shared `ready` flag before each
//! hardware call and fails fast when it is clear.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::platform::{CameraHardware, CaptureConfig, PlatformError, ProviderHandle, UseCaseHandle};

mod worker;

use self::worker::{CaptureJob, CaptureWorker};

/// Default number of captures that may wait behind the one in flight.
pub const DEFAULT_QUEUE_DEPTH: usize = 4;

/// Lifecycle state of the hardware session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No provider, nothing bound.
    Uninitialized,
    /// Waiting for the provider; the use case is bound on arrival.
    Binding,
    /// Use case bound; captures allowed.
    Ready,
    /// Tearing down.
    Unbinding,
    /// The last binding attempt failed. A new attempt may start.
    Failed,
}

/// Outcome of one capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    /// Captured and encoded.
    Success {
        /// `data:image/jpeg;base64,...` value.
        transport_image: String,
    },
    /// Nothing to deliver.
    Failure {
        /// Why the capture produced nothing.
        reason: ErrorKind,
    },
}

impl CaptureResult {
    /// Whether the capture succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// What happened to a provider handed to [`CaptureController::complete_binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The use case is bound and the session is ready.
    Ready,
    /// The controller was no longer binding; the provider was released.
    Discarded,
}

/// Provider and use case of a bound session. Present only while `Ready`.
#[derive(Debug, Clone, Copy)]
struct BoundSession {
    provider: ProviderHandle,
    use_case: UseCaseHandle,
}

/// Owns the camera session and the capture worker.
pub struct CaptureController {
    hardware: Arc<dyn CameraHardware>,
    config: CaptureConfig,
    state: SessionState,
    session: Option<BoundSession>,
    ready: Arc<AtomicBool>,
    worker: CaptureWorker,
}

impl fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CaptureController {
    /// Create a controller in `Uninitialized` and start its worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn new(
        hardware: Arc<dyn CameraHardware>,
        config: CaptureConfig,
        queue_depth: usize,
    ) -> std::io::Result<Self> {
        let ready = Arc::new(AtomicBool::new(false));
        let worker = CaptureWorker::spawn(Arc::clone(&hardware), Arc::clone(&ready), queue_depth)?;
        Ok(Self {
            hardware,
            config,
            state: SessionState::Uninitialized,
            session: None,
            ready,
            worker,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether captures are currently accepted.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Hardware used for provider acquisition.
    pub fn hardware(&self) -> &Arc<dyn CameraHardware> {
        &self.hardware
    }

    /// Enter `Binding`. Returns `false` when a session is already bound or
    /// being bound, in which case no provider acquisition should start.
    pub fn begin_binding(&mut self) -> bool {
        match self.state {
            SessionState::Ready => {
                debug!("camera already ready, skipping start");
                false
            }
            SessionState::Binding | SessionState::Unbinding => {
                debug!(state = ?self.state, "camera start already in progress");
                false
            }
            SessionState::Uninitialized | SessionState::Failed => {
                info!("initializing camera provider");
                self.state = SessionState::Binding;
                true
            }
        }
    }

    /// Finish a binding attempt with the result of provider acquisition.
    ///
    /// On success, unbinds any previous use case, binds a fresh still
    /// capture use case and moves to `Ready`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ProviderAcquisitionFailed`] or [`ErrorKind::BindFailed`];
    /// the controller is left in `Failed` and may be started again.
    pub fn complete_binding(
        &mut self,
        acquired: Result<ProviderHandle, PlatformError>,
    ) -> Result<BindOutcome, ErrorKind> {
        if self.state != SessionState::Binding {
            if let Ok(provider) = acquired {
                warn!(state = ?self.state, %provider, "provider arrived after stop, releasing");
                self.hardware.release(provider);
            }
            return Ok(BindOutcome::Discarded);
        }

        let provider = match acquired {
            Ok(provider) => provider,
            Err(e) => {
                warn!(error = %e, "error getting camera provider");
                self.state = SessionState::Failed;
                return Err(ErrorKind::ProviderAcquisitionFailed(e.to_string()));
            }
        };
        debug!(%provider, "camera provider obtained");

        self.hardware.unbind_all(provider);
        match self.hardware.bind(provider, &self.config) {
            Ok(use_case) => {
                self.session = Some(BoundSession { provider, use_case });
                self.ready.store(true, Ordering::Release);
                self.state = SessionState::Ready;
                info!(%provider, %use_case, "camera bound, ready");
                Ok(BindOutcome::Ready)
            }
            Err(e) => {
                warn!(%provider, error = %e, "use case binding failed");
                self.hardware.release(provider);
                self.state = SessionState::Failed;
                Err(ErrorKind::BindFailed(e.to_string()))
            }
        }
    }

    /// Acquire, bind, and return once the session is ready or has failed.
    ///
    /// Convenience for callers that own the controller directly; the
    /// bridge splits this into [`begin_binding`](Self::begin_binding) and
    /// [`complete_binding`](Self::complete_binding) so the UI context
    /// never waits on the provider.
    ///
    /// # Errors
    ///
    /// Same as [`complete_binding`](Self::complete_binding).
    pub async fn start(&mut self) -> Result<BindOutcome, ErrorKind> {
        if !self.begin_binding() {
            return if self.is_ready() {
                Ok(BindOutcome::Ready)
            } else {
                Ok(BindOutcome::Discarded)
            };
        }
        let acquired = self.hardware.acquire_provider().await;
        self.complete_binding(acquired)
    }

    /// Queue one capture and return the channel its result arrives on.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotReady`] outside `Ready` (the worker is not touched),
    /// or [`ErrorKind::CaptureFailed`] if the queue is full or closed.
    pub fn submit(&self) -> Result<oneshot::Receiver<CaptureResult>, ErrorKind> {
        let session = match (self.state, self.session) {
            (SessionState::Ready, Some(session)) => session,
            _ => return Err(ErrorKind::NotReady),
        };

        let (reply, rx) = oneshot::channel();
        let request_id = Uuid::new_v4();
        debug!(%request_id, "queueing capture");
        self.worker.enqueue(CaptureJob {
            request_id,
            use_case: session.use_case,
            reply,
        })?;
        Ok(rx)
    }

    /// Capture one image and wait for the encoded result.
    pub async fn capture(&self) -> CaptureResult {
        let rx = match self.submit() {
            Ok(rx) => rx,
            Err(reason) => return CaptureResult::Failure { reason },
        };
        match rx.await {
            Ok(result) => result,
            Err(_) => CaptureResult::Failure {
                reason: ErrorKind::CaptureFailed("capture worker dropped the request".to_owned()),
            },
        }
    }

    /// Unbind the use case, release the provider, return to `Uninitialized`.
    pub fn stop(&mut self) {
        if self.state == SessionState::Uninitialized {
            return;
        }
        self.state = SessionState::Unbinding;
        self.ready.store(false, Ordering::Release);
        if let Some(session) = self.session.take() {
            info!(provider = %session.provider, "unbinding camera");
            self.hardware.unbind_all(session.provider);
            self.hardware.release(session.provider);
        }
        self.state = SessionState::Uninitialized;
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.stop();
    }
}
